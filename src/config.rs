use log::info;
use std::collections::HashMap;
use std::env;

use crate::advisor::DEFAULT_WINDOW_SIZE;
use crate::error::{AdvisorError, Result};

pub const DEFAULT_CHANNEL: &str = "sensor_data_created";

#[derive(Debug, Clone)]
pub struct AdvisorConfig {
    pub database_url: String,
    /// Notification channel carrying newly created readings
    pub channel: String,
    pub window_size: usize,
}

impl AdvisorConfig {
    pub fn new() -> Result<Self> {
        // Load environment variables
        dotenv::dotenv().ok();

        let config = Self::from_vars(env::vars())?;
        info!(
            "Configured channel '{}' with a window of {} readings",
            config.channel, config.window_size
        );
        Ok(config)
    }

    pub fn from_vars<I>(vars: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let vars: HashMap<String, String> = vars.into_iter().collect();

        let database_url = vars
            .get("DATABASE_URL")
            .filter(|v| !v.trim().is_empty())
            .cloned()
            .ok_or_else(|| {
                AdvisorError::Config("DATABASE_URL environment variable not set".into())
            })?;

        let channel = match vars.get("ADVISOR_CHANNEL") {
            Some(channel) => channel.trim().to_string(),
            None => DEFAULT_CHANNEL.to_string(),
        };
        if !is_identifier(&channel) {
            return Err(AdvisorError::Config(format!(
                "ADVISOR_CHANNEL '{}' is not a plain identifier",
                channel
            )));
        }

        let window_size = match vars.get("ADVISOR_WINDOW_SIZE") {
            Some(raw) => raw.trim().parse::<usize>().map_err(|e| {
                AdvisorError::Config(format!("ADVISOR_WINDOW_SIZE '{}': {}", raw, e))
            })?,
            None => DEFAULT_WINDOW_SIZE,
        };
        if window_size == 0 {
            return Err(AdvisorError::Config(
                "ADVISOR_WINDOW_SIZE must be at least 1".into(),
            ));
        }

        Ok(AdvisorConfig {
            database_url,
            channel,
            window_size,
        })
    }
}

/// The channel is interpolated unquoted into `LISTEN`, which folds case,
/// while `pg_notify` matches the channel name exactly. Only lowercase bare
/// identifiers pass.
fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_lowercase() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn defaults() {
        let config = AdvisorConfig::from_vars(vars(&[(
            "DATABASE_URL",
            "postgres://advisor@localhost/sensors",
        )]))
        .unwrap();
        assert_eq!(config.channel, DEFAULT_CHANNEL);
        assert_eq!(config.window_size, 10);
    }

    #[test]
    fn overrides() {
        let config = AdvisorConfig::from_vars(vars(&[
            ("DATABASE_URL", "postgres://advisor@localhost/sensors"),
            ("ADVISOR_CHANNEL", "new_reading"),
            ("ADVISOR_WINDOW_SIZE", " 25 "),
        ]))
        .unwrap();
        assert_eq!(config.channel, "new_reading");
        assert_eq!(config.window_size, 25);
    }

    #[test]
    fn missing_database_url() {
        let err = AdvisorConfig::from_vars(vars(&[])).unwrap_err();
        assert!(matches!(err, AdvisorError::Config(_)));
    }

    #[test]
    fn rejects_bad_channel_and_window() {
        for (key, value) in [
            ("ADVISOR_CHANNEL", "readings; DROP TABLE sensor_data"),
            ("ADVISOR_CHANNEL", "1readings"),
            ("ADVISOR_CHANNEL", "SensorData"),
            ("ADVISOR_CHANNEL", ""),
            ("ADVISOR_WINDOW_SIZE", "0"),
            ("ADVISOR_WINDOW_SIZE", "ten"),
        ] {
            let result = AdvisorConfig::from_vars(vars(&[
                ("DATABASE_URL", "postgres://advisor@localhost/sensors"),
                (key, value),
            ]));
            assert!(
                matches!(result, Err(AdvisorError::Config(_))),
                "{}={}",
                key,
                value
            );
        }
    }
}
