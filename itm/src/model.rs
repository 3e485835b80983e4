//! The propagation model proper: picks and blends the three estimators.
//!
//! See ITM sections `<4>` to `<9>`, `<15>`, `<16>`, `<20>` and `<21>`.

use crate::diffraction::Diffraction;
use crate::error::{ItmError, Result};
use crate::formulae::fortran_dim;
use crate::line_of_sight::LineOfSight;
use crate::path::PathParameters;
use crate::scatter::Scatter;
use crate::settings::Settings;
use crate::terrain::Profile;
use crate::warning::Warning;
use crate::{Estimator, Line};
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use tracing::{debug, trace};

/// Propagation model instance.
///
/// Holds all state related to one instance of the Irregular Terrain Model, for
/// one particular transmitter, elevation profile from the transmitter outwards,
/// and set of options.
///
/// A `Model` instance can be used to query propagation at any distance from the
/// transmitter. All preliminary work that every query needs is done on
/// initialisation; the line of sight and scatter fits are done on the first
/// query that needs them, once. Propagation queries only need immutable
/// access and can therefore be done concurrently.
///
/// Nothing is shared between instances: there is no way to change the inputs
/// of a model, make a new one instead.
#[derive(Clone, Debug)]
pub struct Model {
    path: PathParameters,

    /// Warning level from the path alone, before any distance is queried.
    warning: Warning,

    /// Distance below which the effective heights are too far apart.
    min_distance: f64, // <dmin>

    /// Scale length of the diffraction fit.
    scale: f64, // <xae>

    /// Linear extrapolation of diffraction attenuation.
    diffraction: Line, // <aed>, <emd>

    line_of_sight: OnceLock<LineOfSightFit>,
    scatter: OnceLock<ScatterFit>,
}

/// Which mechanism the attenuation was derived from.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Region {
    LineOfSight,
    Diffraction,
    Scatter,
}

/// Result of an attenuation query.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Estimate {
    /// Reference attenuation relative to free space (dB), never negative.
    pub attenuation: f64,

    /// Mechanism the attenuation was derived from.
    pub region: Region,

    /// Worst range problem of the path and of the queried distance.
    pub warning: Warning,
}

/// Two-term fit of line of sight attenuation: a line plus a log term.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LineOfSightFit {
    pub ael: f64,
    pub ak1: f64,
    pub ak2: f64,
}

impl LineOfSightFit {
    /// T.A. 4.1
    pub fn at(&self, distance: f64) -> f64 {
        self.ael + self.ak1 * distance + self.ak2 * distance.ln()
    }
}

/// Linear fit of scatter attenuation, and where it takes over from
/// diffraction.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScatterFit {
    pub line: Line, // <aes>, <ems>
    pub crossover: f64, // <dx>
}

impl Model {
    /// Creates a new instance for a profile.
    ///
    ///  - `heights` is a tuple of the _height above ground_ in metres of the
    ///    terminals (antennas), transmitter then receiver.
    ///
    ///  - `settings` is an instance of the `Settings` struct, containing
    ///    atmospheric, surface, and radio parameter values.
    ///
    /// Upon construction, we prepare all values needed for the individual
    /// calculations, and perform bounds checking.
    ///
    /// The ITM has three different modes depending on the characteristics and
    /// distance modeled:
    ///
    ///  - If the _distance to site_ is less than line of sight, then path loss
    ///    is found from the Line-Of-Sight submodel, from optic horizon and the
    ///    two-ray model.
    ///
    ///  - If the _distance to site_ is larger than that, but still within the
    ///    radio horizon, then the Diffraction submodel is used, considering the
    ///    curvature of the Earth and knife-edge mechanisms.
    ///
    ///  - If the _distance to site_ is beyond the radio horizon, the Scatter
    ///    submodel is used, which computes constants for a linear relationship.
    pub fn new(profile: &Profile, heights: (f64, f64), settings: &Settings) -> Result<Self> {
        settings.check()?;
        check_heights(heights)?;

        if settings.frequency <= 0.0 {
            return Err(ItmError::NonPositiveFrequency(settings.frequency));
        }

        let path = PathParameters::new(profile, heights, settings);
        Ok(Self::from_path(path))
    }

    /// Prepares the diffraction fit of a path.
    ///
    /// See ITM section `<9>`, and T.A. 4.2 through 4.8.
    fn from_path(path: PathParameters) -> Self {
        let warning = path.warning();
        let env = &path.environment;

        let min_distance = (path.effective_heights.0 - path.effective_heights.1).abs() / 200e-3;
        let mut diffraction = Diffraction::initialize(&path);

        let scale = (env.wave_number * env.effective_curvature.powi(2)).powf(-1.0 / 3.0);
        let d3 = path.line_of_sight_distance.max(1.3787 * scale + path.horizon_distance);
        let d4 = d3 + 2.7574 * scale;
        let a3 = diffraction.evaluate(&path, d3);
        let a4 = diffraction.evaluate(&path, d4);
        let line = Line::through((d3, a3), (d4, a4));

        debug!(
            dlsa = path.line_of_sight_distance,
            aed = line.intercept,
            emd = line.slope,
            warning = warning.code(),
            "diffraction fit"
        );

        Self {
            path,
            warning,
            min_distance,
            scale,
            diffraction: line,
            line_of_sight: OnceLock::new(),
            scatter: OnceLock::new(),
        }
    }

    /// The path parameters this model was built from.
    pub fn path(&self) -> &PathParameters {
        &self.path
    }

    /// Length of the profile.
    pub fn length(&self) -> f64 {
        self.path.length
    }

    /// Warning level of the path, independent of any queried distance.
    pub fn warning(&self) -> Warning {
        self.warning
    }

    /// Limit of the line of sight region.
    pub fn line_of_sight_distance(&self) -> f64 {
        self.path.line_of_sight_distance
    }

    /// Linear extrapolation of diffraction attenuation.
    pub fn diffraction_line(&self) -> Line {
        self.diffraction
    }

    /// Fit used within line of sight.
    ///
    /// See ITM section `<16>`.
    pub fn line_of_sight_fit(&self) -> &LineOfSightFit {
        self.line_of_sight.get_or_init(|| {
            let path = &self.path;
            let (aed, emd) = (self.diffraction.intercept, self.diffraction.slope);
            let mut los = LineOfSight::initialize(path, self.diffraction);

            let d2 = path.line_of_sight_distance;
            let a2 = self.diffraction.at(d2);
            let mut d0 = 1.908 * path.environment.wave_number * path.effective_heights.0 * path.effective_heights.1; // T.A. 4.38

            let d1;
            if aed >= 0.0 {
                d0 = d0.min(0.5 * path.horizon_distance); // T.A. 4.28
                d1 = d0 + 0.25 * (path.horizon_distance - d0); // T.A. 4.29
            } else {
                d1 = (-aed / emd).max(0.25 * path.horizon_distance); // T.A. 4.30
            }

            let a1 = los.evaluate(path, d1); // T.A. 4.31

            let mut ak1;
            let mut ak2 = 0.0;

            if d0 < d1 {
                let a0 = los.evaluate(path, d0); // T.A. 4.30
                let q = (d2 / d0).ln();
                ak2 = 0.0f64.max(
                    ((d2 - d0) * (a1 - a0) - (d1 - d0) * (a2 - a0))
                        / ((d2 - d0) * (d1 / d0).ln() - (d1 - d0) * q),
                ); // T.A. 4.32

                if aed >= 0.0 || ak2 > 0.0 {
                    ak1 = (a2 - a0 - ak2 * q) / (d2 - d0); // T.A. 4.33

                    if ak1 < 0.0 {
                        ak1 = 0.0; // T.A. 4.36
                        ak2 = fortran_dim(a2, a0) / q; // T.A. 4.35

                        // T.A. 4.37
                        if ak2 == 0.0 {
                            ak1 = emd;
                        }
                    }
                } else {
                    ak1 = (a2 - a1) / (d2 - d1); // T.A. 4.40
                    ak2 = 0.0; // T.A. 4.41

                    // T.A. 4.37
                    if ak1 <= 0.0 {
                        ak1 = emd;
                    }
                }
            } else {
                ak1 = (a2 - a1) / (d2 - d1);

                if ak1 <= 0.0 {
                    ak1 = emd;
                }
            }

            // T.A. 4.42
            let fit = LineOfSightFit {
                ael: a2 - ak1 * d2 - ak2 * d2.ln(),
                ak1,
                ak2,
            };

            debug!(ael = fit.ael, ak1 = fit.ak1, ak2 = fit.ak2, "line of sight fit");
            fit
        })
    }

    /// Fit used beyond the crossover from diffraction to scatter.
    ///
    /// See ITM section `<21>`.
    pub fn scatter_fit(&self) -> &ScatterFit {
        self.scatter.get_or_init(|| {
            let path = &self.path;
            let mut scatter = Scatter::initialize(path);

            let d5 = path.horizon_distance + 200e3; // T.A. 4.52
            let d6 = d5 + 200e3; // T.A. 4.53
            let a6 = scatter.evaluate(path, d6); // T.A. 4.54
            let a5 = scatter.evaluate(path, d5); // T.A. 4.55

            let (emd, aed) = (self.diffraction.slope, self.diffraction.intercept);

            let fit = if a5 < 1000.0 {
                let ems = (a6 - a5) / 200e3; // T.A. 4.57
                let crossover = path.line_of_sight_distance.max(
                    (path.horizon_distance
                        + 0.3 * self.scale * (crate::environment::CARRIER_FREQUENCY * path.environment.wave_number).ln())
                    .max((a5 - aed - ems * d5) / (emd - ems)),
                ); // T.A. 4.58
                let aes = (emd - ems) * crossover + aed; // T.A. 4.59

                ScatterFit {
                    line: Line::new(aes, ems),
                    crossover,
                }
            } else {
                // T.A. 4.56
                ScatterFit {
                    line: self.diffraction,
                    crossover: 10e6,
                }
            };

            debug!(
                aes = fit.line.intercept,
                ems = fit.line.slope,
                dx = fit.crossover,
                "scatter fit"
            );
            fit
        })
    }

    /// Where scatter takes over from diffraction.
    pub fn scatter_crossover(&self) -> f64 {
        self.scatter_fit().crossover
    }

    /// Reference attenuation at some distance from the transmitter.
    ///
    /// The distance needn't be within the profile: the path geometry stays
    /// that of the whole profile, only the distance plugged into the fits
    /// changes. A zero distance has no attenuation.
    ///
    /// See ITM sections `<5>` and `<8>`.
    pub fn attenuation_at(&self, distance: f64) -> Result<Estimate> {
        if !distance.is_finite() {
            return Err(ItmError::NonFinite("distance"));
        }

        if distance < 0.0 {
            return Err(ItmError::NegativeDistance(distance));
        }

        let mut warning = self.warning;

        if distance == 0.0 {
            return Ok(Estimate {
                attenuation: 0.0,
                region: Region::LineOfSight,
                warning,
            });
        }

        if distance > 1000e3 {
            warning.raise(Warning::Caution, "distance near the validated range");
        }

        if distance < self.min_distance {
            warning.raise(Warning::Doubtful, "distance short for the height difference");
        }

        if distance < 1e3 || distance > 2000e3 {
            warning.raise(Warning::Invalid, "distance out of range");
        }

        let (attenuation, region) = if distance < self.path.line_of_sight_distance {
            (self.line_of_sight_fit().at(distance), Region::LineOfSight)
        } else {
            let scatter = self.scatter_fit();

            if distance > scatter.crossover {
                (scatter.line.at(distance), Region::Scatter)
            } else {
                (self.diffraction.at(distance), Region::Diffraction)
            }
        };

        let attenuation = attenuation.max(0.0);
        trace!(distance, attenuation, ?region, "attenuation");

        Ok(Estimate {
            attenuation,
            region,
            warning,
        })
    }
}

/// Antenna heights must be finite and not below ground.
pub(crate) fn check_heights(heights: (f64, f64)) -> Result<()> {
    for &h in [heights.0, heights.1].iter() {
        if !h.is_finite() {
            return Err(ItmError::NonFinite("antenna height"));
        }

        if h < 0.0 {
            return Err(ItmError::NegativeHeight(h));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn flat_model(samples: usize, interval: f64, heights: (f64, f64)) -> Model {
        let z = vec![0.0; samples];
        let profile = Profile::new(&z, interval).unwrap();
        Model::new(&profile, heights, &Settings::default()).unwrap()
    }

    #[test]
    fn regions_follow_distance() {
        let model = flat_model(401, 100.0, (30.0, 10.0));
        let dlsa = model.line_of_sight_distance();

        assert_eq!(model.attenuation_at(0.5 * dlsa).unwrap().region, Region::LineOfSight);
        assert_eq!(model.attenuation_at(1.01 * dlsa).unwrap().region, Region::Diffraction);

        let dx = model.scatter_crossover();
        assert!(dx >= dlsa);
        if dx < 2000e3 {
            assert_eq!(model.attenuation_at(dx * 1.1).unwrap().region, Region::Scatter);
        }
    }

    #[test]
    fn line_of_sight_fit_meets_diffraction() {
        let model = flat_model(401, 100.0, (30.0, 10.0));
        let dlsa = model.line_of_sight_distance();

        let fit = model.line_of_sight_fit();
        assert!(fit.ak2 >= 0.0);
        assert_relative_eq!(fit.at(dlsa), model.diffraction_line().at(dlsa), max_relative = 1e-9);
    }

    #[test]
    fn fits_are_computed_once() {
        let model = flat_model(401, 100.0, (30.0, 10.0));
        let first = *model.scatter_fit();
        let _ = model.attenuation_at(500e3).unwrap();
        assert_eq!(*model.scatter_fit(), first);
        assert!(std::ptr::eq(model.scatter_fit(), model.scatter_fit()));
    }

    #[test]
    fn distance_warnings_do_not_stick() {
        let model = flat_model(401, 100.0, (30.0, 10.0));
        assert_eq!(model.warning(), Warning::None);

        assert_eq!(model.attenuation_at(500.0).unwrap().warning, Warning::Invalid);
        assert_eq!(model.attenuation_at(1500e3).unwrap().warning, Warning::Caution);
        assert_eq!(model.attenuation_at(20e3).unwrap().warning, Warning::None);
    }

    #[test]
    fn bad_queries() {
        let model = flat_model(11, 100.0, (10.0, 10.0));
        assert_eq!(model.attenuation_at(-1.0), Err(ItmError::NegativeDistance(-1.0)));
        assert!(model.attenuation_at(f64::NAN).is_err());

        let zero = model.attenuation_at(0.0).unwrap();
        assert_eq!(zero.attenuation, 0.0);
    }

    #[test]
    fn bad_inputs() {
        let z = vec![0.0; 11];
        let profile = Profile::new(&z, 100.0).unwrap();

        assert_eq!(
            Model::new(&profile, (-1.0, 10.0), &Settings::default()).unwrap_err(),
            ItmError::NegativeHeight(-1.0)
        );

        let settings = Settings {
            frequency: 0.0,
            ..Settings::default()
        };
        assert!(Model::new(&profile, (10.0, 10.0), &settings).is_err());
    }
}
