use log::{error, warn};
use openssl::ssl::{SslConnector, SslMethod};
use postgres_openssl::{MakeTlsConnector, TlsStream};
use tokio::time::Duration;
use tokio_postgres::{Client, Connection, Socket};
use url::Url;

use crate::error::{AdvisorError, Result};

const MAX_RETRIES: usize = 10;
const WAIT_BETWEEN_RETRIES: u64 = 5;

pub type PgConnection = Connection<Socket, TlsStream<Socket>>;

pub fn create_ssl_connector(sslrootcert_path: Option<&str>) -> Result<MakeTlsConnector> {
    let mut builder = SslConnector::builder(SslMethod::tls())
        .map_err(|e| AdvisorError::Tls(format!("SSL builder error: {}", e)))?;

    if let Some(path) = sslrootcert_path {
        builder
            .set_ca_file(path)
            .map_err(|e| AdvisorError::Tls(format!("Error loading CA cert: {}", e)))?;
    }

    Ok(MakeTlsConnector::new(builder.build()))
}

/// Strip the `sslrootcert` query parameter, which libpq understands but
/// tokio-postgres does not, and return it separately.
pub fn split_ssl_params(database_url: &str) -> Result<(String, Option<String>)> {
    let url = Url::parse(database_url)
        .map_err(|e| AdvisorError::Config(format!("URL parse error: {}", e)))?;

    let mut sslrootcert_path = None;
    let mut clean_params = Vec::new();
    for (key, value) in url.query_pairs() {
        if key == "sslrootcert" {
            sslrootcert_path = Some(value.to_string());
        } else {
            clean_params.push((key.into_owned(), value.into_owned()));
        }
    }

    let mut clean_url = url.clone();
    clean_url.set_query(None);
    if !clean_params.is_empty() {
        let query = clean_params
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("&");
        clean_url.set_query(Some(&query));
    }

    Ok((clean_url.to_string(), sslrootcert_path))
}

/// Open a connection, retrying transient failures at startup only.
///
/// The caller owns the returned connection and must drive it.
pub async fn connect_with_retry(database_url: &str) -> Result<(Client, PgConnection)> {
    let (clean_database_url, sslrootcert_path) = split_ssl_params(database_url)?;

    let mut last_error = None;
    for attempt in 0..MAX_RETRIES {
        let connector = create_ssl_connector(sslrootcert_path.as_deref())?;

        match tokio_postgres::connect(&clean_database_url, connector).await {
            Ok(pair) => return Ok(pair),
            Err(e) => {
                warn!("Attempt {}: connection error: {}", attempt + 1, e);
                last_error = Some(e);
            }
        }

        if attempt < MAX_RETRIES - 1 {
            tokio::time::sleep(Duration::from_secs(WAIT_BETWEEN_RETRIES)).await;
        }
    }

    match last_error {
        Some(e) => Err(e.into()),
        None => Err(AdvisorError::Config("Max retries exceeded".into())),
    }
}

/// Connect and drive the connection in the background.
pub async fn connect(database_url: &str) -> Result<Client> {
    let (client, connection) = connect_with_retry(database_url).await?;

    tokio::spawn(async move {
        if let Err(e) = connection.await {
            error!("Connection error: {}", e);
        }
    });

    Ok(client)
}
