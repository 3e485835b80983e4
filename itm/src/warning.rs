//! Soft range warnings.
//!
//! The regressions behind the ITM were fitted over limited ranges of
//! frequency, heights, distances and ground constants. Outside of those the
//! model still produces a number, but with less and less meaning. Rather than
//! refusing to compute, every result carries the worst [`Warning`] met along
//! the way. See ITM sections `<7>` and `<8>`.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Severity of parameter range problems, ordered from harmless to invalid.
///
/// A warning only ever goes up: use [`Warning::raise`] rather than assigning.
#[derive(
    Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Warning {
    /// All parameters within range.
    None,

    /// Some parameters are nearly out of range: use results with caution.
    Caution,

    /// Defaults have been substituted for impossible parameters.
    Substituted,

    /// A combination of parameters is out of range: results are probably
    /// invalid.
    Doubtful,

    /// Some parameters are out of range: results are probably invalid.
    Invalid,
}

impl Default for Warning {
    fn default() -> Self {
        Warning::None
    }
}

impl Warning {
    /// Raises to `level` if that is more severe, otherwise leaves as is.
    pub fn raise(&mut self, level: Self, reason: &str) {
        if level > *self {
            debug!(from = self.code(), to = level.code(), reason, "warning raised");
            *self = level;
        }
    }

    /// The numeric code used by other ITM implementations (0 to 4).
    pub fn code(self) -> u8 {
        match self {
            Warning::None => 0,
            Warning::Caution => 1,
            Warning::Substituted => 2,
            Warning::Doubtful => 3,
            Warning::Invalid => 4,
        }
    }

    /// Whether results should still be considered meaningful.
    pub fn is_valid(self) -> bool {
        self < Warning::Doubtful
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let text = match self {
            Warning::None => "no warning",
            Warning::Caution => "some parameters are nearly out of range",
            Warning::Substituted => "defaults substituted for impossible parameters",
            Warning::Doubtful => "a combination of parameters is out of range",
            Warning::Invalid => "some parameters are out of range",
        };

        write!(f, "{} ({})", text, self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_ever_rises() {
        let mut w = Warning::None;
        w.raise(Warning::Doubtful, "test");
        assert_eq!(w, Warning::Doubtful);

        w.raise(Warning::Caution, "test");
        assert_eq!(w, Warning::Doubtful);

        w.raise(Warning::Invalid, "test");
        assert_eq!(w.code(), 4);
    }

    #[test]
    fn codes_follow_order() {
        let all = [
            Warning::None,
            Warning::Caution,
            Warning::Substituted,
            Warning::Doubtful,
            Warning::Invalid,
        ];

        for (i, w) in all.iter().enumerate() {
            assert_eq!(w.code() as usize, i);
        }

        assert!(Warning::Substituted.is_valid());
        assert!(!Warning::Doubtful.is_valid());
    }
}
