//! Radio climates.
//!
//! The ITM recognises seven climate regions, originally selected by a numeric
//! code. They drive the long-term fading statistics of the variability
//! extension, which this crate does not compute: a climate is carried along
//! with the other settings and reported, but does not change the median loss.

use serde::{Deserialize, Serialize};
use std::convert::TryFrom;
use std::fmt;
use std::str::FromStr;

/// Radio-climate regions.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, PartialOrd, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Climate {
    Equatorial,
    ContinentalSubtropical,
    MaritimeSubtropical,
    Desert,
    ContinentalTemperate,
    MaritimeTemperateOverLand,
    MaritimeTemperateOverSea,
}

impl Default for Climate {
    fn default() -> Self {
        Climate::ContinentalTemperate
    }
}

impl Climate {
    /// All climates, in code order.
    pub const ALL: [Climate; 7] = [
        Climate::Equatorial,
        Climate::ContinentalSubtropical,
        Climate::MaritimeSubtropical,
        Climate::Desert,
        Climate::ContinentalTemperate,
        Climate::MaritimeTemperateOverLand,
        Climate::MaritimeTemperateOverSea,
    ];

    /// The classic ITM climate code, 1 through 7.
    pub fn code(self) -> u8 {
        match self {
            Climate::Equatorial => 1,
            Climate::ContinentalSubtropical => 2,
            Climate::MaritimeSubtropical => 3,
            Climate::Desert => 4,
            Climate::ContinentalTemperate => 5,
            Climate::MaritimeTemperateOverLand => 6,
            Climate::MaritimeTemperateOverSea => 7,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Climate::Equatorial => "equatorial",
            Climate::ContinentalSubtropical => "continental_subtropical",
            Climate::MaritimeSubtropical => "maritime_subtropical",
            Climate::Desert => "desert",
            Climate::ContinentalTemperate => "continental_temperate",
            Climate::MaritimeTemperateOverLand => "maritime_temperate_over_land",
            Climate::MaritimeTemperateOverSea => "maritime_temperate_over_sea",
        }
    }
}

/// Error for climate codes or names that don't exist.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
#[error("unknown radio climate: {0}")]
pub struct UnknownClimate(pub String);

impl TryFrom<u8> for Climate {
    type Error = UnknownClimate;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Climate::ALL
            .iter()
            .copied()
            .find(|c| c.code() == code)
            .ok_or_else(|| UnknownClimate(code.to_string()))
    }
}

impl FromStr for Climate {
    type Err = UnknownClimate;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        if let Ok(code) = lower.parse::<u8>() {
            return Climate::try_from(code);
        }

        Climate::ALL
            .iter()
            .copied()
            .find(|c| c.name() == lower)
            .ok_or_else(|| UnknownClimate(s.into()))
    }
}

impl fmt::Display for Climate {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_round_trip() {
        for climate in Climate::ALL.iter() {
            assert_eq!(Climate::try_from(climate.code()), Ok(*climate));
        }

        assert!(Climate::try_from(0u8).is_err());
        assert!(Climate::try_from(8u8).is_err());
    }

    #[test]
    fn parses_names_and_codes() {
        assert_eq!("desert".parse::<Climate>(), Ok(Climate::Desert));
        assert_eq!(" Continental_Temperate ".parse::<Climate>(), Ok(Climate::ContinentalTemperate));
        assert_eq!("7".parse::<Climate>(), Ok(Climate::MaritimeTemperateOverSea));
        assert!("tundra".parse::<Climate>().is_err());
    }

    #[test]
    fn default_is_continental_temperate() {
        assert_eq!(Climate::default().code(), 5);
    }
}
