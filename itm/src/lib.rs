//! The Longley-Rice Irregular Terrain Model for RF.
//!
//! This crate implements the point-to-point mode of the [Irregular Terrain
//! Model][ITM68], also known as Longley-Rice, an empirical RF propagation model
//! developed at the U.S. National Telecommunications and Information
//! Administration around the 1960s by Anita Longley and Phil Rice.
//!
//! Given an elevation profile between two antennas, their heights, and the
//! radio and ground parameters, it predicts the median path loss in decibels.
//!
//! The code is cross-referenced to the [LaTeX documentation][ITM122] of the
//! ITM version 1.2.2 (sections within that document are referenced with `<N>`
//! in the code), and to George Hufford's 1999 memo describing
//! “[The Algorithm][GH1999]” (referenced as T.A. in the code). Variable names
//! from those are given as `<letters>` next to the fields that hold them.
//!
//! The structure is quite different from the FORTRAN and C++ renditions: each
//! of the three estimators (line of sight, diffraction, scatter) is a value
//! that only exists once initialised for a path, and a [`Model`] holds the
//! per-path context that used to be static state. Nothing is shared between
//! predictions, so any number of them can run concurrently.
//!
//! Time, location and situation variability are not modelled: all results are
//! median reference values.
//!
//! This implementation is released in the Public Domain, although note that the
//! NTIA requests any use of the ITM is properly credited.
//!
//! [GH1999]: https://www.its.bldrdoc.gov/media/50676/itm_alg.pdf
//! [ITM122]: https://www.its.bldrdoc.gov/media/50674/itm.pdf
//! [ITM68]: https://www.its.bldrdoc.gov/resources/radio-propagation-software/itm/itm.aspx

#![forbid(unsafe_code)]

use serde::Serialize;
use tracing::debug;

pub mod climate;
pub mod diffraction;
pub mod environment;
pub mod error;
pub mod formulae;
pub mod line_of_sight;
pub mod model;
pub mod path;
pub mod scatter;
pub mod settings;
pub mod terrain;
pub mod warning;

pub use climate::Climate;
pub use error::{ItmError, Result};
pub use model::{Estimate, Model, Region};
pub use path::PathParameters;
pub use settings::{Polarisation, Settings};
pub use terrain::{Profile, MAX_PROFILE_SAMPLES};
pub use warning::Warning;

use formulae::{fortran_dim, free_space_loss};

/// An attenuation estimator, ready to be evaluated along one path.
///
/// Estimators are obtained from their own `initialize` function, which needs
/// the path parameters: there is no way to evaluate one that hasn't been set
/// up for a path.
pub trait Estimator {
    /// Attenuation relative to free space (dB) at `distance` (m, positive).
    fn evaluate(&mut self, path: &PathParameters, distance: f64) -> f64;
}

/// A straight line of attenuation against distance.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Line {
    pub intercept: f64,
    pub slope: f64,
}

impl Line {
    pub fn new(intercept: f64, slope: f64) -> Self {
        Self { intercept, slope }
    }

    /// The line through two points.
    pub fn through(a: (f64, f64), b: (f64, f64)) -> Self {
        let slope = (b.1 - a.1) / (b.0 - a.0);
        Self::new(a.1 - slope * a.0, slope)
    }

    pub fn at(&self, distance: f64) -> f64 {
        self.intercept + self.slope * distance
    }
}

/// Outcome of a point-to-point prediction.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Prediction {
    /// Median path loss (dB): reference attenuation plus free space loss.
    pub loss: f64,

    /// Attenuation relative to free space (dB).
    pub reference_attenuation: f64,

    /// Free space loss over the length of the profile (dB).
    pub free_space_loss: f64,

    /// Mechanism the reference attenuation came from.
    pub region: Region,

    /// Worst parameter range problem met.
    pub warning: Warning,

    /// Whether the terminals see each other over the profile.
    pub line_of_sight: bool,
}

impl Prediction {
    /// No loss at all, for paths with nothing to propagate over.
    fn nil() -> Self {
        Self {
            loss: 0.0,
            reference_attenuation: 0.0,
            free_space_loss: 0.0,
            region: Region::LineOfSight,
            warning: Warning::None,
            line_of_sight: true,
        }
    }
}

/// Point-to-point median path loss between two antennas.
///
///  - `elevations` is the terrain profile from the transmitter to the
///    receiver, in metres above sea level.
///
///  - `interval` is the distance between two samples of the profile, in metres.
///
///  - `heights` is a tuple of the _height above ground_ in metres of the
///    terminals (antennas), transmitter then receiver.
///
///  - `settings` is an instance of the `Settings` struct, containing
///    atmospheric, surface, and radio parameter values.
///
/// Profiles longer than [`MAX_PROFILE_SAMPLES`] and non-finite or negative
/// inputs are errors. Profiles with less than two samples, a non-positive
/// interval, or a non-positive frequency have nothing to propagate over and
/// predict no loss at all. Everything else gives a prediction, with a
/// [`Warning`] telling how far out of the validated ranges it was.
pub fn predict_path_loss(
    elevations: &[f64],
    interval: f64,
    heights: (f64, f64),
    settings: &Settings,
) -> Result<Prediction> {
    if elevations.len() > MAX_PROFILE_SAMPLES {
        return Err(ItmError::ProfileTooLong {
            len: elevations.len(),
            max: MAX_PROFILE_SAMPLES,
        });
    }

    settings.check()?;
    model::check_heights(heights)?;

    if elevations.len() < 2 || interval <= 0.0 || settings.frequency <= 0.0 {
        debug!(samples = elevations.len(), interval, "nothing to propagate over");
        return Ok(Prediction::nil());
    }

    let profile = Profile::new(elevations, interval)?;
    let model = Model::new(&profile, heights, settings)?;
    let estimate = model.attenuation_at(model.length())?;

    let free_space = free_space_loss(model.length(), settings.frequency);
    let prediction = Prediction {
        loss: fortran_dim(estimate.attenuation + free_space, 0.0),
        reference_attenuation: estimate.attenuation,
        free_space_loss: free_space,
        region: estimate.region,
        warning: estimate.warning,
        line_of_sight: profile.is_line_of_sight(heights, settings),
    };

    debug!(
        loss = prediction.loss,
        aref = prediction.reference_attenuation,
        dh = model.path().terrain_irregularity,
        he = ?model.path().effective_heights,
        warning = prediction.warning.code(),
        "prediction"
    );

    Ok(prediction)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn line_through_points() {
        let line = Line::through((1.0, 3.0), (3.0, 7.0));
        assert_relative_eq!(line.slope, 2.0);
        assert_relative_eq!(line.intercept, 1.0);
        assert_relative_eq!(line.at(10.0), 21.0);
    }

    #[test]
    fn degenerate_profiles_have_no_loss() {
        let settings = Settings::default();

        for p in [
            predict_path_loss(&[], 100.0, (10.0, 10.0), &settings),
            predict_path_loss(&[0.0], 100.0, (10.0, 10.0), &settings),
            predict_path_loss(&[0.0, 0.0], 0.0, (10.0, 10.0), &settings),
            predict_path_loss(&[0.0, 0.0], -5.0, (10.0, 10.0), &settings),
        ]
        .iter()
        {
            let p = p.as_ref().unwrap();
            assert_eq!(p.loss, 0.0);
            assert_eq!(p.warning, Warning::None);
        }

        let silent = Settings {
            frequency: 0.0,
            ..Settings::default()
        };
        let p = predict_path_loss(&[0.0; 11], 100.0, (10.0, 10.0), &silent).unwrap();
        assert_eq!(p.loss, 0.0);
    }

    #[test]
    fn refuses_bad_inputs() {
        let settings = Settings::default();
        let z = vec![0.0; 11];

        assert_eq!(
            predict_path_loss(&z, 100.0, (10.0, -2.0), &settings),
            Err(ItmError::NegativeHeight(-2.0))
        );
        assert!(predict_path_loss(&z, 100.0, (f64::NAN, 10.0), &settings).is_err());
        assert!(predict_path_loss(&z, f64::NAN, (10.0, 10.0), &settings).is_err());

        let long = vec![0.0; MAX_PROFILE_SAMPLES + 1];
        assert_eq!(
            predict_path_loss(&long, 100.0, (10.0, 10.0), &settings),
            Err(ItmError::ProfileTooLong {
                len: MAX_PROFILE_SAMPLES + 1,
                max: MAX_PROFILE_SAMPLES
            })
        );
    }

    #[test]
    fn heights_are_checked_before_degenerate_profiles() {
        let settings = Settings::default();

        assert_eq!(
            predict_path_loss(&[0.0], 100.0, (f64::INFINITY, 10.0), &settings),
            Err(ItmError::NonFinite("antenna height"))
        );
        assert_eq!(
            predict_path_loss(&[], 0.0, (10.0, -0.5), &settings),
            Err(ItmError::NegativeHeight(-0.5))
        );

        let z = vec![0.0; 11];
        let profile = Profile::new(&z, 100.0).unwrap();
        assert_eq!(
            predict_path_loss(&z, 100.0, (10.0, f64::NEG_INFINITY), &settings).unwrap_err(),
            Model::new(&profile, (10.0, f64::NEG_INFINITY), &settings).unwrap_err()
        );
    }

    #[test]
    fn antennas_on_the_ground_are_invalid_but_finite() {
        let z = vec![0.0; 101];

        for &heights in [(0.0, 0.0), (0.0, 10.0)].iter() {
            let p = predict_path_loss(&z, 100.0, heights, &Settings::default()).unwrap();
            assert!(p.loss.is_finite() && p.loss > 0.0, "loss = {}", p.loss);
            assert_eq!(p.warning, Warning::Invalid);
        }
    }

    #[test]
    fn loss_adds_free_space() {
        let z = vec![0.0; 201];
        let p = predict_path_loss(&z, 100.0, (30.0, 30.0), &Settings::default()).unwrap();

        assert_relative_eq!(p.loss, p.reference_attenuation + p.free_space_loss, max_relative = 1e-12);
        assert_relative_eq!(p.free_space_loss, free_space_loss(20e3, 100.0));
        assert!(p.line_of_sight);
    }
}
