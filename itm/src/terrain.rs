//! Elevation profiles and the terrain parameters derived from them.

use crate::environment::Environment;
use crate::error::{ItmError, Result};
use crate::formulae::{least_squares_linear_fit, quantile};
use crate::settings::Settings;

/// Maximum number of samples accepted in an elevation profile.
pub const MAX_PROFILE_SAMPLES: usize = 16_384;

/// An elevation profile from the transmitter to the receiver.
///
/// Elevations are in metres above sea level, spaced every `interval` metres,
/// the first at the transmitter and the last at the receiver.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Profile<'a> {
    elevations: &'a [f64],
    interval: f64, // <xi>
}

/// Radio horizons as seen from each terminal.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Horizons {
    /// Distances from each terminal to its radio horizon.
    pub distances: (f64, f64), // <dl>

    /// Elevation angles of the horizons from each terminal at the heights of
    /// the antennas, in radians.
    pub angles: (f64, f64), // <the>
}

impl<'a> Profile<'a> {
    /// Wraps elevations spaced `interval` metres apart.
    ///
    /// Fails on profiles too long to be supported, too short to form a path,
    /// or containing non-finite values.
    pub fn new(elevations: &'a [f64], interval: f64) -> Result<Self> {
        if elevations.len() > MAX_PROFILE_SAMPLES {
            return Err(ItmError::ProfileTooLong {
                len: elevations.len(),
                max: MAX_PROFILE_SAMPLES,
            });
        }

        if !interval.is_finite() {
            return Err(ItmError::NonFinite("sample interval"));
        }

        if elevations.len() < 2 || interval <= 0.0 {
            return Err(ItmError::DegenerateProfile {
                len: elevations.len(),
                interval,
            });
        }

        if elevations.iter().any(|z| !z.is_finite()) {
            return Err(ItmError::NonFinite("elevation"));
        }

        Ok(Self {
            elevations,
            interval,
        })
    }

    /// The raw elevations.
    pub fn elevations(&self) -> &'a [f64] {
        self.elevations
    }

    /// Distance between two consecutive samples.
    pub fn interval(&self) -> f64 {
        self.interval
    }

    /// Number of intervals, one less than the number of samples.
    pub fn intervals(&self) -> usize {
        self.elevations.len() - 1
    }

    /// Distance from the first to the last sample.
    pub fn length(&self) -> f64 {
        self.intervals() as f64 * self.interval
    }

    /// Mean elevation of the path, ignoring the tenth of it nearest each end.
    pub fn reference_elevation(&self) -> f64 {
        let np = self.intervals();
        let skip = np / 10;
        let window = &self.elevations[skip..=(np - skip)];

        window.iter().sum::<f64>() / window.len() as f64
    }

    /// Use the elevation profile to find the two horizons.
    ///
    /// `heights` are the antenna heights above ground at each end, and
    /// `curvature` the effective curvature of the earth.
    ///
    /// We advance along the elevation profile looking both from the TX and
    /// from the RX at the same time, adjusting the elevations to the Earth's
    /// curvature. The RX horizon is only searched for once the TX has seen an
    /// obstruction. An unobstructed path ends up with both horizons at the
    /// full length and the angles of the direct line between antennas.
    ///
    /// See ITM section `<47>`.
    pub fn horizons(&self, heights: (f64, f64), curvature: f64) -> Horizons {
        let np = self.intervals();
        let length = self.length();

        // absolute heights of terminals
        let tx_z = self.elevations[0] + heights.0;
        let rx_z = self.elevations[np] + heights.1;

        let half_curve = curvature / 2.0;
        let vertical_delta = (rx_z - tx_z) / length;

        let mut angle_tx = vertical_delta - half_curve * length;
        let mut angle_rx = -vertical_delta - half_curve * length;
        let mut dist_tx = length;
        let mut dist_rx = length;

        if np >= 2 {
            let mut along_tx = 0.0;
            let mut along_rx = length;
            let mut wq = true;

            for &elevation in &self.elevations[1..np] {
                along_tx += self.interval;
                along_rx -= self.interval;

                let tx_delta = elevation - (half_curve * along_tx + angle_tx) * along_tx - tx_z;
                if tx_delta > 0.0 {
                    angle_tx += tx_delta / along_tx;
                    dist_tx = along_tx;
                    wq = false;
                }

                if wq {
                    continue;
                }

                let rx_delta = elevation - (half_curve * along_rx + angle_rx) * along_rx - rx_z;
                if rx_delta > 0.0 {
                    angle_rx += rx_delta / along_rx;
                    dist_rx = along_rx;
                }
            }
        }

        Horizons {
            distances: (dist_tx, dist_rx),
            angles: (angle_tx, angle_rx),
        }
    }

    /// Least-squares line through the samples between two distances, returned
    /// as its elevations at the transmitter and at the receiver.
    pub fn fit(&self, window: (f64, f64)) -> (f64, f64) {
        least_squares_linear_fit(self.interval, self.elevations, window)
    }

    /// Terrain irregularity: the interdecile range of elevations between two
    /// distances, once the general slope is taken out.
    ///
    /// The profile is resampled over the window, detrended, and the spread
    /// between the 10% and 90% ranks is scaled up for short windows, which
    /// can't show as much of the terrain. Windows under two intervals are
    /// taken to be smooth.
    ///
    /// See ITM section `<48>` ("delta h over x").
    pub fn irregularity(&self, window: (f64, f64)) -> f64 {
        let np = self.intervals();
        let z = self.elevations;

        let mut xa = window.0 / self.interval;
        let xb = window.1 / self.interval;

        if xb - xa < 2.0 {
            return 0.0;
        }

        let ka = ((0.1 * (xb - xa + 8.0)).round() as usize).max(4).min(25);
        let n = 10 * ka - 5;
        let kb = n - ka + 1;
        let sn = (n - 1) as f64;

        let step = (xb - xa) / sn;
        let mut k = (xa + 1.0).round() as usize;
        xa -= k as f64;

        let mut samples = Vec::with_capacity(n);
        for _ in 0..n {
            while xa > 0.0 && k < np {
                xa -= 1.0;
                k += 1;
            }

            samples.push(z[k] + (z[k] - z[k - 1]) * xa);
            xa += step;
        }

        let (mut trend, end) = least_squares_linear_fit(1.0, &samples, (0.0, sn));
        let slope = (end - trend) / sn;

        for s in samples.iter_mut() {
            *s -= trend;
            trend += slope;
        }

        let spread = quantile(&mut samples, ka - 1) - quantile(&mut samples, kb - 1);
        spread / (1.0 - 0.8 * (-(window.1 - window.0) / 50e3).exp())
    }

    /// Whether the antennas see each other over this profile.
    ///
    /// Runs the horizon search with the earth curvature of the path's
    /// atmosphere, and calls the path clear when the horizons overlap by a
    /// comfortable margin, i.e. sum to more than 1.9 times the length.
    pub fn is_line_of_sight(&self, heights: (f64, f64), settings: &Settings) -> bool {
        let environment = Environment::new(settings, self.reference_elevation());
        let horizons = self.horizons(heights, environment.effective_curvature);

        horizons.distances.0 + horizons.distances.1 > 1.9 * self.length()
    }
}
