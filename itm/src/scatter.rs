//! Tropospheric scatter attenuation.
//!
//! See ITM sections `<22>` to `<26>`, and TN101 for the approximation method.

use crate::environment::CARRIER_FREQUENCY;
use crate::formulae::fortran_dim;
use crate::path::PathParameters;
use crate::Estimator;

/// Returned when the geometry is too tight for scatter to be meaningful.
pub const NO_SCATTER: f64 = 1001.0;

/// Troposcatter estimator for one path.
///
/// Unlike the other estimators, evaluating it changes its state: the last
/// frequency gain is remembered and reused when a later evaluation runs out
/// of its validity range.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Scatter {
    /// Difference of the horizon distances.
    ad: f64,

    /// Ratio of the effective heights, on the side of the nearer horizon.
    rr: f64,

    /// Refractivity part of the scatter efficiency.
    etq: f64,

    /// Last frequency gain computed.
    h0s: f64,
}

impl Scatter {
    /// See ITM section `<23>`.
    pub fn initialize(path: &PathParameters) -> Self {
        let mut ad = path.horizon_distances.0 - path.horizon_distances.1;
        let mut rr = path.effective_heights.1 / path.effective_heights.0;

        if ad < 0.0 {
            ad = -ad;
            rr = 1.0 / rr;
        }

        // T.A. 4.67 (partial)
        let ens = path.environment.effective_refractivity;
        let etq = (5.67e-6 * ens - 2.32e-3) * ens + 0.031;

        Self {
            ad,
            rr,
            etq,
            h0s: -15.0,
        }
    }

    /// Frequency gain function, or `None` when both terminals sit too low
    /// under the scatter volume.
    fn frequency_gain(&self, path: &PathParameters, distance: f64) -> Option<f64> {
        let env = &path.environment;
        let he = path.effective_heights;

        // T.A. 4.61
        let th = path.elevation_angles.0 + path.elevation_angles.1 + distance * env.effective_curvature;

        // T.A. 4.62
        let mut r2 = 2.0 * env.wave_number * th;
        let r1 = r2 * he.0;
        r2 *= he.1;

        if r1 < 0.2 && r2 < 0.2 {
            return None;
        }

        let mut ss = (distance - self.ad) / (distance + self.ad); // T.A. 4.65

        // T.A. 4.66
        let mut q = self.rr / ss;
        ss = ss.max(0.1);
        q = q.max(0.1).min(10.0);
        let z0 = (distance - self.ad) * (distance + self.ad) * th * 0.25 / distance;

        // T.A. 4.67
        let temp = (z0 / 8.0e3).min(1.7).powi(6);
        let et = (self.etq * (-temp).exp() + 1.0) * z0 / 1.7556e3;
        let ett = et.max(1.0);

        let mut h0 = (h01(r1, ett) + h01(r2, ett)) * 0.5; // T.A. 6.12
        h0 += h0.min((1.38 - ett.ln()) * ss.ln() * q.ln() * 0.49); // T.A. 6.10 and 6.11
        h0 = fortran_dim(h0, 0.0);

        // T.A. 6.14
        if et < 1.0 {
            let temp = (1.0 + 1.4142 / r1) * (1.0 + 1.4142 / r2);
            h0 = et * h0 + (1.0 - et) * 4.343 * (temp.powi(2) * (r1 + r2) / (r1 + r2 + 2.8284)).ln();
        }

        Some(h0)
    }
}

impl Estimator for Scatter {
    /// See ITM section `<24>`.
    fn evaluate(&mut self, path: &PathParameters, distance: f64) -> f64 {
        debug_assert!(distance > 0.0);

        let env = &path.environment;

        let h0 = if self.h0s > 15.0 {
            self.h0s
        } else {
            let h0 = match self.frequency_gain(path, distance) {
                Some(h0) => h0,
                None => return NO_SCATTER,
            };

            // out of its range: reuse the previous one
            if h0 > 15.0 && self.h0s >= 0.0 {
                self.h0s
            } else {
                h0
            }
        };

        self.h0s = h0;

        // T.A. 4.60
        let th = path.bending_angle + distance * env.effective_curvature;

        // T.A. 4.63 and 6.8
        scatter_distance(th * distance)
            + 4.343 * (CARRIER_FREQUENCY * env.wave_number * th.powi(4)).ln()
            - 0.1 * (env.effective_refractivity - 301.0) * (-th * distance / 40e3).exp()
            + h0
    }
}

/// H01 function for scatter fields, interpolated between tabulated scatter
/// efficiencies.
///
/// See T.A. §6 and ITM section `<25>`.
fn h01(r: f64, et: f64) -> f64 {
    const A: [f64; 5] = [25.0, 80.0, 177.0, 395.0, 705.0];
    const B: [f64; 5] = [24.0, 45.0, 68.0, 80.0, 105.0];

    // nearest row; q is negative when et was rounded up
    let (it, q) = match et.round() {
        it if it >= 5.0 => (5, 0.0),
        it if it >= 1.0 => (it as usize, et - it),
        _ => (1, 0.0),
    };

    let x = (1.0 / r).powi(2);
    let h0fv = 4.343 * ((A[it - 1] * x + B[it - 1]) * x + 1.0).ln(); // T.A. 6.13

    if q == 0.0 {
        h0fv
    } else {
        (1.0 - q) * h0fv + q * 4.343 * ((A[it] * x + B[it]) * x + 1.0).ln()
    }
}

/// F(θd) function for scatter fields.
///
/// See T.A. 6.9 and ITM section `<26>`.
fn scatter_distance(td: f64) -> f64 {
    const A: [f64; 3] = [133.4, 104.6, 71.8];
    const B: [f64; 3] = [0.332e-3, 0.212e-3, 0.157e-3];
    const C: [f64; 3] = [-4.343, -1.086, 2.171];

    let i = if td <= 10e3 {
        0
    } else if td <= 70e3 {
        1
    } else {
        2
    };

    A[i] + B[i] * td + C[i] * td.ln()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;
    use crate::terrain::Profile;
    use approx::assert_relative_eq;

    fn beyond_horizon() -> Vec<f64> {
        vec![0.0; 401]
    }

    #[test]
    fn h01_interpolates_between_rows() {
        let low = h01(5.0, 2.0);
        let mid = h01(5.0, 2.5);
        let high = h01(5.0, 3.0);

        assert!(low < mid && mid < high, "{} {} {}", low, mid, high);
        assert_eq!(h01(5.0, 0.4), h01(5.0, 1.0));
        assert_eq!(h01(5.0, 7.0), h01(5.0, 5.0));
        assert_eq!(h01(5.0, 4.6), h01(5.0, 5.0));
    }

    #[test]
    fn h01_picks_the_nearest_row() {
        // 1.6 and 2.6 round up and extrapolate back from the next row pair
        assert_relative_eq!(h01(2.0, 1.6), 11.461_861_142_059_69, max_relative = 1e-9);
        assert_relative_eq!(h01(2.0, 2.6), 13.847_647_950_487_557, max_relative = 1e-9);
        assert_relative_eq!(h01(2.0, 3.0), 14.633_515_631_778_518, max_relative = 1e-9);
        assert_relative_eq!(h01(2.0, 4.6), 18.531_892_078_763_622, max_relative = 1e-9);
        assert_relative_eq!(h01(2.0, 0.4), 9.326_124_340_184_176, max_relative = 1e-9);
    }

    #[test]
    fn scatter_distance_is_piecewise() {
        assert!((scatter_distance(10e3) - scatter_distance(10e3 + 1.0)).abs() < 0.5);
        assert!(scatter_distance(100e3) > scatter_distance(50e3));
    }

    #[test]
    fn asymmetry_is_folded_to_the_near_side() {
        let z = beyond_horizon();
        let profile = Profile::new(&z, 100.0).unwrap();
        let path = PathParameters::new(&profile, (30.0, 10.0), &Settings::default());

        let scatter = Scatter::initialize(&path);
        assert!(scatter.ad >= 0.0);
        assert_eq!(scatter.h0s, -15.0);

        let reversed = PathParameters::new(&profile, (10.0, 30.0), &Settings::default());
        let other = Scatter::initialize(&reversed);
        assert!((scatter.ad - other.ad).abs() < 1e-6 * scatter.ad.max(1.0));
        assert!((scatter.rr - other.rr).abs() < 1e-9);
    }

    #[test]
    fn far_scatter_is_finite_and_remembered() {
        let z = beyond_horizon();
        let profile = Profile::new(&z, 100.0).unwrap();
        let path = PathParameters::new(&profile, (30.0, 10.0), &Settings::default());

        let mut scatter = Scatter::initialize(&path);
        let a6 = scatter.evaluate(&path, path.horizon_distance + 400e3);
        let a5 = scatter.evaluate(&path, path.horizon_distance + 200e3);

        assert!(a5 < NO_SCATTER && a6 < NO_SCATTER);
        assert!(a6 > a5, "a5 {} a6 {}", a5, a6);
        assert!(scatter.h0s >= 0.0);
    }

    #[test]
    fn terminals_on_the_ground_cannot_scatter() {
        let z = vec![0.0; 11];
        let profile = Profile::new(&z, 100.0).unwrap();
        let path = PathParameters::new(&profile, (0.5, 0.5), &Settings::default());

        let mut scatter = Scatter::initialize(&path);
        assert_eq!(scatter.evaluate(&path, 1.0), NO_SCATTER);
    }
}
