//! Link scenarios: two sites, the terrain between them, and the radio settings.

use anyhow::{Context, Result};
use geo::{HaversineDistance, Point};
use itm::{Climate, Prediction, Settings, Warning};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::{convert::TryFrom, fs, path::Path};
use tracing::{debug, warn};

/// Base site definition.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Site {
    /// What it's called
    pub name: String,

    /// Where it is, in degrees
    pub latitude: f64,
    pub longitude: f64,

    /// How high above ground
    pub aboveground: f64,
}

impl Site {
    pub fn position(&self) -> Point<f64> {
        Point::new(self.longitude, self.latitude)
    }
}

/// A link to predict, as read from a scenario file.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Scenario {
    pub transmitter: Site,
    pub receiver: Site,

    /// Terrain elevations from the transmitter to the receiver, in metres.
    pub elevations: Vec<f64>,

    /// Distance between elevation samples; derived from the sites if absent.
    #[serde(default)]
    pub interval: Option<f64>,

    /// Numeric radio climate code (1 to 7), overriding `settings.climate`.
    #[serde(default)]
    pub climate: Option<u8>,

    #[serde(default)]
    pub settings: Settings,
}

impl Scenario {
    pub fn load(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)
            .with_context(|| format!("reading scenario {}", path.display()))?;
        Self::parse(&json).with_context(|| format!("parsing scenario {}", path.display()))
    }

    pub fn parse(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Great-circle distance between the sites.
    pub fn distance(&self) -> f64 {
        self.transmitter
            .position()
            .haversine_distance(&self.receiver.position())
    }

    /// Distance between two elevation samples.
    pub fn interval(&self) -> f64 {
        if let Some(interval) = self.interval {
            return interval;
        }

        match self.elevations.len() {
            0 | 1 => 0.0,
            n => self.distance() / (n - 1) as f64,
        }
    }

    pub fn heights(&self) -> (f64, f64) {
        (self.transmitter.aboveground, self.receiver.aboveground)
    }

    /// Radio settings to use, and whether defaults had to be substituted.
    pub fn settings(&self) -> (Settings, Warning) {
        let mut settings = self.settings;
        let mut warning = Warning::None;

        if let Some(code) = self.climate {
            match Climate::try_from(code) {
                Ok(climate) => settings.climate = climate,
                Err(err) => {
                    warn!(%err, "using the default climate");
                    settings.climate = Climate::default();
                    warning.raise(Warning::Substituted, "unknown climate code");
                }
            }
        }

        (settings, warning)
    }

    /// Median path loss over the whole link.
    pub fn predict(&self, settings: &Settings, substituted: Warning) -> Result<Prediction> {
        let mut prediction = itm::predict_path_loss(
            &self.elevations,
            self.interval(),
            self.heights(),
            settings,
        )
        .with_context(|| {
            format!(
                "predicting {} to {}",
                self.transmitter.name, self.receiver.name
            )
        })?;

        prediction.warning.raise(substituted, "scenario defaults");
        if !prediction.warning.is_valid() {
            warn!(warning = %prediction.warning, "prediction is out of the model's validated range");
        }

        Ok(prediction)
    }

    /// Median path loss at every sample along the profile, as if the receiver
    /// stood there.
    pub fn sweep(&self, settings: &Settings, substituted: Warning) -> Result<Vec<(f64, Prediction)>> {
        let interval = self.interval();
        let heights = self.heights();
        debug!(samples = self.elevations.len(), interval, "sweeping profile");

        (1..self.elevations.len())
            .into_par_iter()
            .map(|end| {
                let mut prediction =
                    itm::predict_path_loss(&self.elevations[..=end], interval, heights, settings)
                        .with_context(|| format!("predicting at sample {}", end))?;
                prediction.warning.raise(substituted, "scenario defaults");
                Ok((end as f64 * interval, prediction))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const SCENARIO: &str = r#"{
        "transmitter": { "name": "hill", "latitude": -41.0, "longitude": 174.0, "aboveground": 30.0 },
        "receiver": { "name": "town", "latitude": -41.0, "longitude": 174.1, "aboveground": 10.0 },
        "elevations": [10.0, 20.0, 35.0, 20.0, 15.0],
        "settings": { "frequency": 450.0 }
    }"#;

    #[test]
    fn parses_with_defaults() {
        let scenario = Scenario::parse(SCENARIO).unwrap();
        assert_eq!(scenario.transmitter.name, "hill");
        assert_eq!(scenario.heights(), (30.0, 10.0));
        assert_eq!(scenario.settings.frequency, 450.0);
        assert_eq!(scenario.settings.permittivity, Settings::default().permittivity);
        assert_eq!(scenario.interval, None);
    }

    #[test]
    fn interval_from_site_distance() {
        let scenario = Scenario::parse(SCENARIO).unwrap();

        // a tenth of a degree of longitude at 41° south
        let distance = scenario.distance();
        assert!(distance > 8300.0 && distance < 8450.0, "distance = {}", distance);
        assert_relative_eq!(scenario.interval(), distance / 4.0);
    }

    #[test]
    fn explicit_interval_wins() {
        let mut scenario = Scenario::parse(SCENARIO).unwrap();
        scenario.interval = Some(100.0);
        assert_eq!(scenario.interval(), 100.0);
    }

    #[test]
    fn unknown_climate_is_substituted() {
        let mut scenario = Scenario::parse(SCENARIO).unwrap();

        scenario.climate = Some(3);
        let (settings, warning) = scenario.settings();
        assert_eq!(settings.climate, Climate::MaritimeSubtropical);
        assert_eq!(warning, Warning::None);

        scenario.climate = Some(12);
        let (settings, warning) = scenario.settings();
        assert_eq!(settings.climate, Climate::default());
        assert_eq!(warning, Warning::Substituted);

        let prediction = scenario.predict(&settings, warning).unwrap();
        assert!(prediction.warning >= Warning::Substituted);
    }

    #[test]
    fn antenna_on_the_ground_is_not_valid() {
        let mut scenario = Scenario::parse(SCENARIO).unwrap();
        scenario.transmitter.aboveground = 0.1;
        let (settings, warning) = scenario.settings();

        let prediction = scenario.predict(&settings, warning).unwrap();
        assert_eq!(prediction.warning, Warning::Invalid);
        assert!(!prediction.warning.is_valid());
        assert!(prediction.loss.is_finite());
    }

    #[test]
    fn sweep_covers_every_sample() {
        let scenario = Scenario::parse(SCENARIO).unwrap();
        let (settings, warning) = scenario.settings();

        let sweep = scenario.sweep(&settings, warning).unwrap();
        assert_eq!(sweep.len(), 4);
        assert_relative_eq!(sweep[3].0, scenario.distance(), max_relative = 1e-9);

        let whole = scenario.predict(&settings, warning).unwrap();
        assert_eq!(sweep[3].1, whole);
    }
}
