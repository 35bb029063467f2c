/// Advisory pipeline: fetch the recent window, average it, evaluate the rules
/// and overwrite the latest advice
use async_trait::async_trait;
use log::{debug, info};

use crate::advice::generate_advice;
use crate::error::Result;
use crate::models::{Advice, Reading};
use crate::utils::{calculate_averages, format_millis, now_millis};

pub const DEFAULT_WINDOW_SIZE: usize = 10;

/// Read access to the append-only reading log.
#[async_trait]
pub trait ReadingLog: Send + Sync {
    /// Up to `limit` most recent readings ordered by timestamp.
    async fn recent(&self, limit: usize) -> Result<Vec<Reading>>;
}

/// The singleton latest-advice slot. Last write wins.
#[async_trait]
pub trait AdviceSink: Send + Sync {
    async fn replace(&self, advice: Advice) -> Result<()>;
}

/// Compute the advice for a new reading against its history window.
///
/// Fails with `AdvisorError::EmptyWindow` when `history` is empty and with
/// `AdvisorError::InvalidReading` when its averages are not finite.
pub fn handle_new_reading(reading: &Reading, history: &[Reading]) -> Result<Advice> {
    let window = calculate_averages(history)?;
    debug!(
        "Window of {} samples: temp={:.2}°C, humidity={:.2}%, aqi={:.2}",
        window.samples, window.avg_temperature, window.avg_humidity, window.avg_air_quality
    );

    Ok(Advice {
        latest: generate_advice(reading, &window),
        timestamp: now_millis(),
    })
}

pub struct Advisor<L, S> {
    log: L,
    sink: S,
    window_size: usize,
}

impl<L: ReadingLog, S: AdviceSink> Advisor<L, S> {
    pub fn new(log: L, sink: S) -> Self {
        Self::with_window_size(log, sink, DEFAULT_WINDOW_SIZE)
    }

    pub fn with_window_size(log: L, sink: S, window_size: usize) -> Self {
        Self {
            log,
            sink,
            window_size: window_size.max(1),
        }
    }

    /// Handle one newly created reading.
    ///
    /// Writes to the sink exactly once on success. On any error nothing is
    /// written and the previous advice stays in place.
    pub async fn on_new_reading(&self, reading: Reading) -> Result<Advice> {
        reading.validate()?;

        let history = self.log.recent(self.window_size).await?;
        let advice = handle_new_reading(&reading, &history)?;

        self.sink.replace(advice.clone()).await?;
        info!(
            "Advice for reading at {} generated at {}: {}",
            format_millis(reading.timestamp),
            format_millis(advice.timestamp),
            advice.latest
        );

        Ok(advice)
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use super::memory::MemoryStore;
    use crate::error::AdvisorError;
    use std::sync::{Arc, Mutex};

    fn reading(temperature: f64, humidity: f64, aqi: f64, timestamp: i64) -> Reading {
        Reading {
            temperature,
            humidity,
            air_quality_index: aqi,
            timestamp,
        }
    }

    fn advisor(store: &Arc<MemoryStore>) -> Advisor<Arc<MemoryStore>, Arc<MemoryStore>> {
        Advisor::new(store.clone(), store.clone())
    }

    #[test]
    fn pure_handler_uses_history_averages() {
        let history: Vec<Reading> = (0..10).map(|i| reading(20.0, 50.0, 520.0, i)).collect();
        let advice = handle_new_reading(&reading(20.0, 80.0, 650.0, 10), &history).unwrap();

        assert!(advice.latest.contains("mold growth"));
        assert!(advice.latest.contains("Ventilate the room immediately"));
        assert!(advice.latest.contains("consistently poor"));
        assert!(advice.timestamp > 0);
    }

    #[test]
    fn pure_handler_rejects_empty_history() {
        let result = handle_new_reading(&reading(20.0, 50.0, 100.0, 1), &[]);
        assert!(matches!(result, Err(AdvisorError::EmptyWindow)));
    }

    #[tokio::test]
    async fn writes_advice_once_per_reading() {
        let store = Arc::new(MemoryStore::default());
        let advisor = advisor(&store);

        let new = reading(35.0, 50.0, 300.0, 1);
        store.append(new.clone());
        let advice = advisor.on_new_reading(new).await.unwrap();

        assert_eq!(store.writes(), 1);
        assert_eq!(store.advice(), Some(advice.clone()));
        assert!(advice.latest.contains("High temperature"));
        // single-reading window: no trend
        assert!(!advice.latest.contains("compared to recent readings"));
    }

    #[tokio::test]
    async fn window_is_capped_at_most_recent_readings() {
        let store = Arc::new(MemoryStore::default());
        // old readings with very poor air fall outside the window
        for ts in 0..5 {
            store.append(reading(20.0, 50.0, 2000.0, ts));
        }
        for ts in 5..15 {
            store.append(reading(20.0, 50.0, 100.0, ts));
        }
        let advisor = advisor(&store);

        let advice = advisor
            .on_new_reading(reading(20.0, 50.0, 100.0, 14))
            .await
            .unwrap();
        assert!(!advice.latest.contains("compared to recent readings"));
    }

    #[tokio::test]
    async fn later_invocation_overwrites_earlier_advice() {
        let store = Arc::new(MemoryStore::default());
        let advisor = advisor(&store);

        let first = reading(35.0, 50.0, 100.0, 1);
        store.append(first.clone());
        advisor.on_new_reading(first).await.unwrap();

        let second = reading(10.0, 50.0, 100.0, 2);
        store.append(second.clone());
        advisor.on_new_reading(second).await.unwrap();

        assert_eq!(store.writes(), 2);
        let latest = store.advice().unwrap();
        assert!(latest.latest.starts_with("Low temperature"));
    }

    #[tokio::test]
    async fn empty_log_writes_nothing() {
        let store = Arc::new(MemoryStore::default());
        let advisor = advisor(&store);

        let result = advisor.on_new_reading(reading(20.0, 50.0, 100.0, 1)).await;
        assert!(matches!(result, Err(AdvisorError::EmptyWindow)));
        assert_eq!(store.writes(), 0);
        assert_eq!(store.advice(), None);
    }

    #[tokio::test]
    async fn malformed_reading_writes_nothing() {
        let store = Arc::new(MemoryStore::default());
        store.append(reading(20.0, 50.0, 100.0, 1));
        let advisor = advisor(&store);

        let result = advisor
            .on_new_reading(reading(f64::INFINITY, 50.0, 100.0, 2))
            .await;
        assert!(matches!(result, Err(AdvisorError::InvalidReading(_))));
        assert_eq!(store.writes(), 0);
    }

    #[tokio::test]
    async fn non_finite_history_writes_nothing() {
        let store = Arc::new(MemoryStore::default());
        store.append(reading(20.0, 50.0, f64::NAN, 1));
        store.append(reading(20.0, 50.0, 100.0, 2));
        let advisor = advisor(&store);

        let result = advisor.on_new_reading(reading(20.0, 50.0, 900.0, 3)).await;
        assert!(matches!(result, Err(AdvisorError::InvalidReading(_))));
        assert_eq!(store.writes(), 0);
        assert_eq!(store.advice(), None);
    }

    #[test]
    fn pure_handler_rejects_overflowing_history() {
        let history = [reading(20.0, 50.0, 1e308, 1), reading(20.0, 50.0, 1e308, 2)];
        let result = handle_new_reading(&reading(20.0, 50.0, 100.0, 3), &history);
        assert!(matches!(result, Err(AdvisorError::InvalidReading(_))));
    }

    #[tokio::test]
    async fn sink_failure_keeps_previous_advice() {
        let previous = Advice {
            latest: "Air quality is good. ".into(),
            timestamp: 42,
        };
        let store = Arc::new(MemoryStore {
            advice: Mutex::new(Some(previous.clone())),
            fail_writes: true,
            ..Default::default()
        });
        store.append(reading(35.0, 50.0, 100.0, 1));
        let advisor = advisor(&store);

        let result = advisor.on_new_reading(reading(35.0, 50.0, 100.0, 1)).await;
        assert!(matches!(result, Err(AdvisorError::Sink(_))));
        assert_eq!(store.advice(), Some(previous));
    }

    #[tokio::test]
    async fn zero_window_size_still_reads_one_record() {
        let store = Arc::new(MemoryStore::default());
        store.append(reading(20.0, 50.0, 100.0, 1));
        let advisor = Advisor::with_window_size(store.clone(), store.clone(), 0);

        assert!(advisor
            .on_new_reading(reading(20.0, 50.0, 100.0, 1))
            .await
            .is_ok());
    }
}
