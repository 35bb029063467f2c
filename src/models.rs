use serde::Deserialize;

use crate::error::{AdvisorError, Result};

/// One sensor sample as appended to the reading log.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Reading {
    /// Degrees Celsius
    pub temperature: f64,
    /// Relative humidity in percent
    pub humidity: f64,
    /// Unitless air-quality proxy (scaled MQ135 output)
    #[serde(alias = "airQualityIndex", alias = "mq135")]
    pub air_quality_index: f64,
    /// Ingestion time in Unix milliseconds
    pub timestamp: i64,
}

impl Reading {
    /// Parse a JSON reading payload and reject non-finite values.
    pub fn from_json(payload: &str) -> Result<Self> {
        let reading: Reading = serde_json::from_str(payload)?;
        reading.validate()?;
        Ok(reading)
    }

    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("temperature", self.temperature),
            ("humidity", self.humidity),
            ("air_quality_index", self.air_quality_index),
        ];

        for (name, value) in fields {
            if !value.is_finite() {
                return Err(AdvisorError::InvalidReading(format!(
                    "{} is not a finite number: {}",
                    name, value
                )));
            }
        }

        Ok(())
    }
}

/// Means over the most recent readings. Never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct AveragedWindow {
    pub avg_temperature: f64,
    pub avg_humidity: f64,
    pub avg_air_quality: f64,
    pub samples: usize,
}

/// The singleton "latest advice" record.
#[derive(Debug, Clone, PartialEq)]
pub struct Advice {
    pub latest: String,
    /// Generation time in Unix milliseconds
    pub timestamp: i64,
}
