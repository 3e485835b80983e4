//! Ground and atmosphere preparation.

use crate::settings::{Polarisation, Settings};
use num_complex::Complex64;

/// The carrier or central frequency (in MHz).
///
/// This is pre-computed (in the paper) assuming a speed of light **in air** of
/// 299.7 metres per microsecond. See Fig/1.1 in T.A.
pub const CARRIER_FREQUENCY: f64 = 47.7;

/// Electrical environment of a path.
///
/// In the source, `<letters>` indicate original variable names, such that one
/// may cross-reference these back to the memos and other implementations.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Environment {
    /// [Wave number] of the carrier/central frequency (in radians per unit distance).
    ///
    /// [Wave number]: https://en.wikipedia.org/wiki/Wavenumber
    pub wave_number: f64, // <wn>

    /// General elevation: the mean elevation of the modeled system.
    pub general_elevation: f64, // <zsys>

    /// Effective surface refractivity at the system's elevation.
    pub effective_refractivity: f64, // <ens>

    /// Earth's effective curvature at the system's elevation.
    pub effective_curvature: f64, // <gme>

    /// Surface transfer impedance to the ground.
    pub transfer_impedance: Complex64, // <zgnd>
}

impl Environment {
    /// Various basic computed parameters.
    ///
    /// `general_elevation` is the mean terrain height of the path, which
    /// thins out the atmosphere: a zero elevation leaves the refractivity as
    /// given.
    ///
    /// See ITM section `<41>`.
    pub fn new(settings: &Settings, general_elevation: f64) -> Self {
        // Fig/1.1 in T.A.
        let wave_number = settings.frequency / CARRIER_FREQUENCY;

        let mut effective_refractivity = settings.surface_refractivity;
        if general_elevation != 0.0 {
            // Fig/1.2 in T.A.
            effective_refractivity *= (-general_elevation / 9460.0).exp();
        }

        // Fig/1.3 in T.A.
        let effective_curvature = 157e-9 * (1.0 - 0.04665 * (effective_refractivity / 179.3).exp());

        // Fig/1.5 in T.A.
        let complex_relative_permittivity = Complex64::new(
            settings.permittivity,
            376.62 * settings.conductivity / wave_number,
        );

        // Fig/1.4 in T.A.
        let mut transfer_impedance = (complex_relative_permittivity - 1.0).sqrt();
        if settings.polarisation == Polarisation::Vertical {
            transfer_impedance /= complex_relative_permittivity;
        }

        Self {
            wave_number,
            general_elevation,
            effective_refractivity,
            effective_curvature,
            transfer_impedance,
        }
    }
}
