//! Line-of-sight attenuation: the two-ray model.
//!
//! See ITM sections `<17>` to `<19>`.

use crate::path::PathParameters;
use crate::{Estimator, Line};
use num_complex::Complex64;

/// Line-of-sight estimator for one path.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LineOfSight {
    /// Weight given to the two-ray model against the diffraction line.
    weight: f64, // <wls>

    /// Diffraction extrapolation, which the two-ray model blends into.
    diffraction: Line,
}

impl LineOfSight {
    /// Prepares the estimator, given the diffraction line of the same path.
    ///
    /// See ITM section `<18>`.
    pub fn initialize(path: &PathParameters, diffraction: Line) -> Self {
        // T.A. 4.43
        let weight = 0.021
            / (0.021
                + path.environment.wave_number * path.terrain_irregularity
                    / 10e3f64.max(path.line_of_sight_distance));

        Self {
            weight,
            diffraction,
        }
    }
}

impl Estimator for LineOfSight {
    /// See ITM section `<19>`.
    fn evaluate(&mut self, path: &PathParameters, distance: f64) -> f64 {
        debug_assert!(distance > 0.0);

        let env = &path.environment;
        let he = path.effective_heights;

        let mut q = (1.0 - 0.8 * (-distance / 50e3).exp()) * path.terrain_irregularity;
        let s = 0.78 * q * (-(q / 16.0).powf(0.25)).exp();
        q = he.0 + he.1;
        let sps = q / (distance.powi(2) + q.powi(2)).sqrt();

        // T.A. 4.47
        let sps_c = Complex64::from(sps);
        let mut r = (sps_c - env.transfer_impedance) / (sps_c + env.transfer_impedance)
            * (-10.0f64.min(env.wave_number * s * sps)).exp();
        q = r.norm_sqr();

        // T.A. 4.48
        if q < 0.25 || q < sps {
            r = r * (sps / q).sqrt();
        }

        let alosv = self.diffraction.at(distance); // T.A. 4.45
        q = env.wave_number * he.0 * he.1 * 2.0 / distance; // T.A. 4.49

        // T.A. 4.50
        if q > 1.57 {
            q = 3.14 - 2.4649 / q;
        }

        // T.A. 4.51 and 4.44
        let qq = Complex64::new(q.cos(), -q.sin());
        (-4.343 * (qq + r).norm_sqr().ln() - alosv) * self.weight + alosv
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;
    use crate::terrain::Profile;
    use approx::assert_relative_eq;

    fn path(elevations: &[f64], heights: (f64, f64)) -> PathParameters {
        let profile = Profile::new(elevations, 100.0).unwrap();
        PathParameters::new(&profile, heights, &Settings::default())
    }

    #[test]
    fn smooth_ground_is_pure_two_ray() {
        let z = vec![0.0; 101];
        let p = path(&z, (30.0, 30.0));
        let diffraction = Line::new(0.0, 0.0);

        let los = LineOfSight::initialize(&p, diffraction);
        assert_relative_eq!(los.weight, 1.0, max_relative = 1e-6);
    }

    #[test]
    fn rough_ground_leans_on_diffraction() {
        let z: Vec<f64> = (0..101).map(|i| 60.0 * ((i as f64) * 0.7).sin()).collect();
        let p = path(&z, (30.0, 30.0));
        let diffraction = Line::new(50.0, 1e-3);

        let mut los = LineOfSight::initialize(&p, diffraction);
        assert!(los.weight < 0.9, "weight = {}", los.weight);
        assert!(los.evaluate(&p, 5000.0).is_finite());
    }

    #[test]
    fn two_ray_interference_near_the_transmitter() {
        let z = vec![0.0; 101];
        let p = path(&z, (30.0, 30.0));
        let mut los = LineOfSight::initialize(&p, Line::new(0.0, 0.0));

        // past the last two-ray peak the ground reflection cancels the direct
        // ray more and more
        let near = los.evaluate(&p, 2000.0);
        let far = los.evaluate(&p, 8000.0);
        assert!(far > near, "near {} far {}", near, far);
        assert!(near > -7.0);
    }
}
