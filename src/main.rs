use log::{error, info};
use std::sync::Arc;

use indoor_advisor::config::AdvisorConfig;
use indoor_advisor::database::{connect, ensure_schema, PgAdviceStore, PgReadingLog};
use indoor_advisor::listener::run_listener;
use indoor_advisor::utils::format_millis;
use indoor_advisor::Advisor;

async fn main_loop(config: AdvisorConfig) -> Result<(), Box<dyn std::error::Error>> {
    info!("Starting indoor advisor service");

    let client = Arc::new(connect(&config.database_url).await?);
    ensure_schema(&client).await?;

    let readings = PgReadingLog::new(Arc::clone(&client));
    let advice_store = PgAdviceStore::new(Arc::clone(&client));

    match advice_store.latest().await? {
        Some(advice) => info!(
            "Current advice from {}: {}",
            format_millis(advice.timestamp),
            advice.latest
        ),
        None => info!("No advice stored yet"),
    }

    let advisor = Arc::new(Advisor::with_window_size(
        readings,
        advice_store,
        config.window_size,
    ));

    run_listener(&config.database_url, &config.channel, advisor).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .format_timestamp_secs()
        .init();

    // Load configuration
    let config = match AdvisorConfig::new() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    // Handle Ctrl+C gracefully
    let (tx, mut rx) = tokio::sync::oneshot::channel();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                let _ = tx.send(());
            }
            Err(e) => error!("Failed to listen for Ctrl+C: {}", e),
        }
    });

    // Run main loop or wait for shutdown signal
    tokio::select! {
        result = main_loop(config) => {
            match result {
                Ok(_) => info!("Program completed successfully"),
                Err(e) => {
                    error!("Fatal error: {}", e);
                    return Err(e);
                }
            }
        }
        Ok(()) = &mut rx => {
            info!("Program terminated by user. Exiting gracefully.");
        }
    }

    Ok(())
}
