//! Radio and environment settings.

use crate::climate::Climate;
use crate::error::{ItmError, Result};
use serde::{Deserialize, Serialize};
use std::convert::TryFrom;
use std::fmt;
use std::str::FromStr;

/// The polarisation of the radio wave.
#[allow(missing_docs)]
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, PartialOrd, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Polarisation {
    Horizontal,
    Vertical,
}

impl Default for Polarisation {
    fn default() -> Self {
        Polarisation::Vertical
    }
}

/// Error for polarisation codes or names that don't exist.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
#[error("unknown polarisation: {0} (expected horizontal/0 or vertical/1)")]
pub struct UnknownPolarisation(pub String);

impl TryFrom<u8> for Polarisation {
    type Error = UnknownPolarisation;

    fn try_from(code: u8) -> std::result::Result<Self, Self::Error> {
        match code {
            0 => Ok(Polarisation::Horizontal),
            1 => Ok(Polarisation::Vertical),
            _ => Err(UnknownPolarisation(code.to_string())),
        }
    }
}

impl FromStr for Polarisation {
    type Err = UnknownPolarisation;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "0" | "h" | "horizontal" => Ok(Polarisation::Horizontal),
            "1" | "v" | "vertical" => Ok(Polarisation::Vertical),
            _ => Err(UnknownPolarisation(s.into())),
        }
    }
}

impl fmt::Display for Polarisation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            Polarisation::Horizontal => "horizontal",
            Polarisation::Vertical => "vertical",
        })
    }
}

/// Input settings for the model.
///
/// Refer to [ITU-R P.527] to derive ground permittivity and conductivity for
/// your region/terrain and frequency.
/// Alternatively, you may use [SPLAT's simplified table][dielectrics].
///
/// The defaults describe average ground in a continental temperate climate,
/// vertically polarised at 100 MHz.
///
/// [ITU-R P.527]: https://www.itu.int/dms_pubrec/itu-r/rec/p/R-REC-P.527-4-201706-I!!PDF-E.pdf
/// [dielectrics]: http://www.qsl.net/n9zia/conduct.html
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct Settings {
    /// Relative permittivity of the ground (aka "dielectric constant").
    pub permittivity: f64,

    /// Conductivity of the ground (in siemens per metre).
    pub conductivity: f64,

    /// Type of climate.
    pub climate: Climate,

    /// Surface refractivity reduced to sea level (N-units).
    pub surface_refractivity: f64,

    /// Frequency of modeled wave (MHz).
    pub frequency: f64,

    /// Polarisation of modeled wave.
    pub polarisation: Polarisation,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            permittivity: 15.0,
            conductivity: 0.005,
            climate: Climate::default(),
            surface_refractivity: 301.0,
            frequency: 100.0,
            polarisation: Polarisation::default(),
        }
    }
}

impl Settings {
    /// Rejects NaN and infinite values, which no amount of warnings can save.
    pub fn check(&self) -> Result<()> {
        let fields = [
            ("permittivity", self.permittivity),
            ("conductivity", self.conductivity),
            ("surface refractivity", self.surface_refractivity),
            ("frequency", self.frequency),
        ];

        for (name, value) in fields.iter() {
            if !value.is_finite() {
                return Err(ItmError::NonFinite(*name));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn polarisation_codes() {
        assert_eq!(Polarisation::try_from(0u8), Ok(Polarisation::Horizontal));
        assert_eq!(Polarisation::try_from(1u8), Ok(Polarisation::Vertical));
        assert!(Polarisation::try_from(2u8).is_err());
        assert_eq!("V".parse::<Polarisation>(), Ok(Polarisation::Vertical));
    }

    #[test]
    fn rejects_nan() {
        let mut settings = Settings::default();
        assert!(settings.check().is_ok());

        settings.frequency = f64::NAN;
        assert_eq!(settings.check(), Err(ItmError::NonFinite("frequency")));
    }

    #[test]
    fn partial_config_keeps_defaults() {
        let settings: Settings =
            serde_json::from_str(r#"{ "frequency": 450.0, "climate": "desert" }"#).unwrap();

        assert_eq!(settings.frequency, 450.0);
        assert_eq!(settings.climate, Climate::Desert);
        assert_eq!(settings.permittivity, 15.0);
        assert_eq!(settings.polarisation, Polarisation::Vertical);
    }
}
