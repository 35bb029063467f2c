/// Database operations for the reading log and the latest-advice record
use async_trait::async_trait;
use log::debug;
use std::sync::Arc;
use tokio_postgres::{Client, Row};

use crate::advisor::{AdviceSink, ReadingLog};
use crate::error::{AdvisorError, Result};
use crate::models::{Advice, Reading};

const ADVICE_ID: i16 = 1;

/// Create the reading log and the advice table if they do not exist yet.
pub async fn ensure_schema(client: &Client) -> Result<()> {
    client
        .batch_execute(
            "CREATE TABLE IF NOT EXISTS sensor_data (
                 id BIGSERIAL PRIMARY KEY,
                 temperature DOUBLE PRECISION NOT NULL,
                 humidity DOUBLE PRECISION NOT NULL,
                 air_quality_index DOUBLE PRECISION NOT NULL,
                 timestamp BIGINT NOT NULL
             );
             CREATE INDEX IF NOT EXISTS sensor_data_timestamp_idx ON sensor_data (timestamp);
             CREATE TABLE IF NOT EXISTS ai_advice (
                 id SMALLINT PRIMARY KEY CHECK (id = 1),
                 latest TEXT NOT NULL,
                 timestamp BIGINT NOT NULL
             );",
        )
        .await?;
    Ok(())
}

fn reading_from_row(row: &Row) -> Result<Reading> {
    let reading = Reading {
        temperature: row.try_get("temperature")?,
        humidity: row.try_get("humidity")?,
        air_quality_index: row.try_get("air_quality_index")?,
        timestamp: row.try_get("timestamp")?,
    };
    // DOUBLE PRECISION columns can hold 'NaN' and 'Infinity'
    reading.validate()?;
    Ok(reading)
}

/// Reading log backed by the `sensor_data` table
#[derive(Clone)]
pub struct PgReadingLog {
    client: Arc<Client>,
}

impl PgReadingLog {
    pub fn new(client: Arc<Client>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ReadingLog for PgReadingLog {
    async fn recent(&self, limit: usize) -> Result<Vec<Reading>> {
        let rows = self
            .client
            .query(
                "SELECT temperature, humidity, air_quality_index, timestamp
                 FROM sensor_data
                 ORDER BY timestamp DESC
                 LIMIT $1",
                &[&(limit as i64)],
            )
            .await?;

        debug!("Fetched {} recent readings", rows.len());
        rows.iter().map(reading_from_row).collect()
    }
}

/// Singleton advice record in the `ai_advice` table
#[derive(Clone)]
pub struct PgAdviceStore {
    client: Arc<Client>,
}

impl PgAdviceStore {
    pub fn new(client: Arc<Client>) -> Self {
        Self { client }
    }

    pub async fn latest(&self) -> Result<Option<Advice>> {
        let row = self
            .client
            .query_opt(
                "SELECT latest, timestamp FROM ai_advice WHERE id = $1",
                &[&ADVICE_ID],
            )
            .await?;

        match row {
            Some(row) => Ok(Some(Advice {
                latest: row.try_get("latest")?,
                timestamp: row.try_get("timestamp")?,
            })),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl AdviceSink for PgAdviceStore {
    async fn replace(&self, advice: Advice) -> Result<()> {
        // Both fields are written in one statement
        let rows = self
            .client
            .execute(
                "INSERT INTO ai_advice (id, latest, timestamp)
                 VALUES ($1, $2, $3)
                 ON CONFLICT (id) DO UPDATE
                 SET latest = EXCLUDED.latest, timestamp = EXCLUDED.timestamp",
                &[&ADVICE_ID, &advice.latest, &advice.timestamp],
            )
            .await?;

        if rows != 1 {
            return Err(AdvisorError::Sink(format!(
                "advice upsert affected {} rows",
                rows
            )));
        }
        Ok(())
    }
}
