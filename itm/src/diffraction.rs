//! Diffraction attenuation: knife edges blended with a smooth earth.
//!
//! See ITM sections `<10>` to `<14>`.

use crate::path::PathParameters;
use crate::Estimator;

/// Diffraction estimator for one path.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Diffraction {
    // "parts of Q" see T.A. 4.9
    wd1: f64,
    xd1: f64,

    /// Clutter attenuation.
    afo: f64,

    /// Inverse of the ground impedance magnitude.
    qk: f64,

    /// Height gain terms of both terminals.
    aht: f64,
    xht: f64,
}

impl Diffraction {
    /// See ITM section `<11>`.
    pub fn initialize(path: &PathParameters) -> Self {
        let env = &path.environment;
        let (hg, he, dl) = (path.heights, path.effective_heights, path.horizon_distances);

        let mut q = hg.0 * hg.1;
        let qk = he.0 * he.1 - q;

        // point-to-point paths only
        q += 10.0;

        let wd1 = (1.0 + qk / q).sqrt();
        let xd1 = path.horizon_distance + path.bending_angle / env.effective_curvature;

        // T.A. 4.10
        q = (1.0 - 0.8 * (-path.line_of_sight_distance / 50e3).exp()) * path.terrain_irregularity;
        q *= 0.78 * (-(q / 16.0).powf(0.25)).exp();
        let afo = 15.0f64.min(2.171 * (1.0 + 4.77e-4 * hg.0 * hg.1 * env.wave_number * q).ln());

        // T.A. 6.7
        let qk = 1.0 / env.transfer_impedance.norm();

        fn make_axht(dl: f64, he: f64, wn: f64, qk: f64) -> (f64, f64) {
            let a = 0.5 * dl.powi(2) / he;
            let wa = (a * wn).cbrt();
            let pk = qk / wa;
            let q = (1.607 - pk) * 151.0 * wa * dl / a;
            (q, height_gain(q, pk))
        }

        let (x0, a0) = make_axht(dl.0, he.0, env.wave_number, qk);
        let (x1, a1) = make_axht(dl.1, he.1, env.wave_number, qk);

        Self {
            wd1,
            xd1,
            afo,
            qk,
            aht: 20.0 + a0 + a1,
            xht: x0 + x1,
        }
    }
}

impl Estimator for Diffraction {
    /// See ITM section `<12>`.
    fn evaluate(&mut self, path: &PathParameters, distance: f64) -> f64 {
        debug_assert!(distance > 0.0);

        let env = &path.environment;
        let dl = path.horizon_distances;

        // T.A. 4.12
        let th = path.bending_angle + distance * env.effective_curvature;
        let ds = distance - path.horizon_distance;
        let mut q = 0.0795775 * env.wave_number * ds * th * th;

        // T.A. 4.14
        let adiffv = knife_edge(q * dl.0 / (ds + dl.0)) + knife_edge(q * dl.1 / (ds + dl.1));

        // T.A. 4.16
        let a = ds / th;
        let wa = (a * env.wave_number).cbrt();
        let pk = self.qk / wa; // T.A. 4.17
        q = (1.607 - pk) * 151.0 * wa * th + self.xht; // T.A. 4.18 and 6.2
        let ar = 0.05751 * q - 4.343 * q.ln() - self.aht; // T.A. 4.20
        q = (self.wd1 + self.xd1 / distance)
            * 6283.2f64.min(
                (1.0 - 0.8 * (-distance / 50e3).exp()) * path.terrain_irregularity * env.wave_number,
            );

        // T.A. 4.9
        let wd = 25.1 / (25.1 + q.sqrt());

        // T.A. 4.11
        ar * wd + (1.0 - wd) * adiffv + self.afo
    }
}

/// Attenuation on a single knife edge.
///
/// This is an approximation of a Fresnel integral, see T.A. 6.1 and ITM
/// section `<13>`.
fn knife_edge(v2: f64) -> f64 {
    if v2 < 5.76 {
        6.02 + 9.11 * v2.sqrt() - 1.27 * v2
    } else {
        12.953 + 4.343 * v2.ln()
    }
}

/// Height gain over a smooth spherical earth.
///
/// See T.A. 6.4 and ITM section `<14>`.
fn height_gain(x: f64, pk: f64) -> f64 {
    if x < 200.0 {
        let w = -pk.ln();

        if pk < 1.0e-5 || x * w.powi(3) > 5495.0 {
            // T.A. 6.5
            if x > 1.0 {
                17.372 * x.ln() - 117.0
            } else {
                -117.0
            }
        } else {
            // T.A. 6.6
            2.5e-5 * x.powi(2) / pk - 8.686 * w - 15.0
        }
    } else {
        // T.A. 6.3
        let fhtv = 0.05751 * x - 4.343 * x.ln();

        if x < 2000.0 {
            let w = 0.0134 * x * (-0.005 * x).exp();
            (1.0 - w) * fhtv + w * (17.372 * x.ln() - 117.0) // T.A. 6.4
        } else {
            fhtv
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;
    use crate::terrain::Profile;
    use approx::assert_abs_diff_eq;

    #[test]
    fn knife_edge_regimes_meet() {
        assert_abs_diff_eq!(knife_edge(0.0), 6.02);
        assert_abs_diff_eq!(knife_edge(5.76 - 1e-9), knife_edge(5.76), epsilon = 0.05);
        assert!(knife_edge(100.0) > knife_edge(10.0));
    }

    #[test]
    fn height_gain_blends_smoothly() {
        assert_abs_diff_eq!(height_gain(2000.0 - 1e-6, 0.1), height_gain(2000.0, 0.1), epsilon = 0.1);
        assert_eq!(height_gain(0.5, 1e-6), -117.0);
        assert!(height_gain(500.0, 0.1).is_finite());
    }

    #[test]
    fn attenuation_grows_past_the_horizon() {
        let z = vec![0.0; 401];
        let profile = Profile::new(&z, 100.0).unwrap();
        let path = PathParameters::new(&profile, (30.0, 10.0), &Settings::default());

        let mut diffraction = Diffraction::initialize(&path);
        let near = diffraction.evaluate(&path, 45e3);
        let far = diffraction.evaluate(&path, 90e3);

        assert!(near.is_finite());
        assert!(far > near, "near {} far {}", near, far);
    }
}
