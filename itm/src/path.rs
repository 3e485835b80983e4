//! The path parameters: everything the estimators need to know about a path.

use crate::environment::Environment;
use crate::formulae::fortran_dim;
use crate::settings::Settings;
use crate::terrain::Profile;
use crate::warning::Warning;
use tracing::debug;

/// Antennas lower than this are modelled at this height: a terminal right on
/// flat ground has no horizon at all. Such paths are flagged invalid anyway.
pub const MIN_HEIGHT: f64 = 0.01;

/// Computed parameters of one transmitter to receiver path.
///
/// These are computed from the input settings and elevation profile, once,
/// and never change afterwards. Changing any input means computing a new
/// `PathParameters`.
///
/// In the source, `<letters>` indicate original variable names, such that one
/// may cross-reference these back to the memos and other implementations.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PathParameters {
    /// Distance from the transmitter to the receiver.
    pub length: f64, // <dist>

    /// Structural heights of the terminals above ground.
    pub heights: (f64, f64), // <hg>

    /// Frequency, atmosphere and ground.
    pub environment: Environment,

    /// Interdecile range of the terrain elevations, detrended.
    pub terrain_irregularity: f64, // <dh>

    /// Terminal effective heights: adjusted against horizons (or obstructions).
    pub effective_heights: (f64, f64), // <he>

    /// Distances from each terminal to its radio horizon.
    pub horizon_distances: (f64, f64), // <dl>

    /// Elevation angles of the horizons from each terminal at the heights of
    /// the antennas, in radians.
    pub elevation_angles: (f64, f64), // <the>

    /// Horizon distances over a smooth earth, from the effective heights.
    pub smooth_horizon_distances: (f64, f64), // <dls>

    /// Line of sight distance: sum of the smooth earth horizon distances.
    pub line_of_sight_distance: f64, // <dlsa>

    /// Total horizon distance.
    pub horizon_distance: f64, // <dla>

    /// Total bending angle.
    pub bending_angle: f64, // <tha>
}

impl PathParameters {
    /// Prepares a path from its profile.
    ///
    ///  - `heights` is a tuple of the _height above ground_ in metres of the
    ///    terminals (antennas), transmitter then receiver.
    ///
    ///  - `settings` is an instance of the `Settings` struct, containing
    ///    atmospheric, surface, and radio parameter values.
    ///
    /// See ITM sections `<42>` and `<6>`.
    pub fn new(profile: &Profile, heights: (f64, f64), settings: &Settings) -> Self {
        let heights = (heights.0.max(MIN_HEIGHT), heights.1.max(MIN_HEIGHT));
        let environment = Environment::new(settings, profile.reference_elevation());
        let length = profile.length();
        let horizons = profile.horizons(heights, environment.effective_curvature);

        let xl = window(length, heights, horizons.distances);
        let terrain_irregularity = profile.irregularity(xl);

        let mut path = Self {
            length,
            heights,
            environment,
            terrain_irregularity,
            effective_heights: heights,
            horizon_distances: horizons.distances,
            elevation_angles: horizons.angles,
            smooth_horizon_distances: (0.0, 0.0),
            line_of_sight_distance: 0.0,
            horizon_distance: 0.0,
            bending_angle: 0.0,
        };

        path.adjust_horizons(profile, xl);
        path.secondary_parameters();

        debug!(
            length,
            zsys = path.environment.general_elevation,
            dh = path.terrain_irregularity,
            he = ?path.effective_heights,
            dl = ?path.horizon_distances,
            the = ?path.elevation_angles,
            "path parameters"
        );

        path
    }

    /// Given initial but naive horizon calculation, make some adjustments.
    ///
    /// A path that is clearly line of sight gets its horizons re-derived from
    /// the empirical formulae originally designed for the area mode, over
    /// ground fitted between the `xl` window. Otherwise the effective heights
    /// come from ground fitted in front of each terminal, up to its horizon.
    ///
    /// See ITM sections `<43>`, `<45>`, `<46>`.
    fn adjust_horizons(&mut self, profile: &Profile, xl: (f64, f64)) {
        let ends = (profile.elevations()[0], profile.elevations()[profile.intervals()]);
        let curvature = self.environment.effective_curvature;
        let dh = self.terrain_irregularity;

        fn make_dl(he: f64, curv: f64, terrain: f64) -> f64 {
            (2.0 * he / curv).sqrt() * (-0.07 * (terrain / he.max(5.0)).sqrt()).exp()
        }

        if self.horizon_distances.0 + self.horizon_distances.1 >= 1.5 * self.length {
            // Redo light-of-sight horizons <45> if the path is line-of-sight

            let z = profile.fit(xl);
            self.effective_heights = (
                self.heights.0 + fortran_dim(ends.0, z.0),
                self.heights.1 + fortran_dim(ends.1, z.1),
            );

            self.horizon_distances = (
                make_dl(self.effective_heights.0, curvature, dh),
                make_dl(self.effective_heights.1, curvature, dh),
            );

            let q = self.horizon_distances.0 + self.horizon_distances.1;
            if q <= self.length {
                // rounded horizon, or two obstructions: stretch the effective
                // heights until the horizons meet
                let q = (self.length / q).powi(2);
                self.effective_heights = (self.effective_heights.0 * q, self.effective_heights.1 * q);
                self.horizon_distances = (
                    make_dl(self.effective_heights.0, curvature, dh),
                    make_dl(self.effective_heights.1, curvature, dh),
                );
            }

            // empirical adjustment of the grazing angles using delta-h
            fn make_qthe(he: f64, curv: f64, terrain: f64, horiz_dist: f64) -> f64 {
                let q = (2.0 * he / curv).sqrt();
                (0.65 * terrain * (q / horiz_dist - 1.0) - 2.0 * he) / q
            }

            self.elevation_angles = (
                make_qthe(self.effective_heights.0, curvature, dh, self.horizon_distances.0),
                make_qthe(self.effective_heights.1, curvature, dh, self.horizon_distances.1),
            );
        } else {
            // Get transhorizon effective heights <46>

            let (z0, _) = profile.fit((xl.0, 0.9 * self.horizon_distances.0));
            let (_, z1) = profile.fit((self.length - 0.9 * self.horizon_distances.1, xl.1));

            self.effective_heights = (
                self.heights.0 + fortran_dim(ends.0, z0),
                self.heights.1 + fortran_dim(ends.1, z1),
            );
        }
    }

    /// Secondary parameters derived from the adjusted geometry.
    ///
    /// See ITM section `<6>`.
    fn secondary_parameters(&mut self) {
        let curvature = self.environment.effective_curvature;

        self.smooth_horizon_distances = (
            (2.0 * self.effective_heights.0 / curvature).sqrt(),
            (2.0 * self.effective_heights.1 / curvature).sqrt(),
        );

        self.line_of_sight_distance = self.smooth_horizon_distances.0 + self.smooth_horizon_distances.1;
        self.horizon_distance = self.horizon_distances.0 + self.horizon_distances.1;
        self.bending_angle = (self.elevation_angles.0 + self.elevation_angles.1)
            .max(-self.horizon_distance * curvature);
    }

    /// Checks the path against the ranges the model was validated over.
    ///
    /// See ITM section `<7>`.
    pub fn warning(&self) -> Warning {
        let mut warning = Warning::None;
        let env = &self.environment;
        let hg = [self.heights.0, self.heights.1];

        if env.wave_number < 0.838 || env.wave_number > 210.0 {
            warning.raise(Warning::Caution, "frequency near the validated range");
        }

        if hg.iter().any(|&h| h < 1.0 || h > 1000.0) {
            warning.raise(Warning::Caution, "antenna height near the validated range");
        }

        let horizons = [
            (self.elevation_angles.0, self.horizon_distances.0, self.smooth_horizon_distances.0),
            (self.elevation_angles.1, self.horizon_distances.1, self.smooth_horizon_distances.1),
        ];

        if horizons
            .iter()
            .any(|&(the, dl, dls)| the.abs() > 200e-3 || dl < 0.1 * dls || dl > 3.0 * dls)
        {
            warning.raise(Warning::Doubtful, "horizon angle or distance out of range");
        }

        if env.effective_refractivity < 250.0
            || env.effective_refractivity > 400.0
            || env.effective_curvature < 75e-9
            || env.effective_curvature > 250e-9
            || env.transfer_impedance.re <= env.transfer_impedance.im.abs()
            || env.wave_number < 0.419
            || env.wave_number > 420.0
        {
            warning.raise(Warning::Invalid, "frequency or environment out of range");
        }

        if hg.iter().any(|&h| h < 0.5 || h > 3000.0) {
            warning.raise(Warning::Invalid, "antenna height out of range");
        }

        warning
    }
}

/// Window of the profile used for terrain irregularity: the least of fifteen
/// times the terminal height above ground and 10% of the horizon distance,
/// in from each end.
///
/// See ITM sections `<43>` and `<44>`.
fn window(length: f64, heights: (f64, f64), horizon_distances: (f64, f64)) -> (f64, f64) {
    fn make_xl(h: f64, horiz_dist: f64) -> f64 {
        (15.0 * h).min(0.1 * horiz_dist)
    }

    (
        make_xl(heights.0, horizon_distances.0),
        length - make_xl(heights.1, horizon_distances.1),
    )
}
