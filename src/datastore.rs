//! Datastore Bootstrap
//!
//! Opens the process-wide MongoDB connection at startup. The connection
//! string comes from a single environment variable; there is no retry.

use mongodb::bson::doc;
use mongodb::options::ClientOptions;
use mongodb::Client;
use thiserror::Error;

use crate::config::DatastoreConfig;

/// Errors that can occur while connecting
#[derive(Error, Debug)]
pub enum DatastoreError {
    #[error("Connection string not set (expected in ${0})")]
    MissingUri(String),

    #[error("MongoDB error: {0}")]
    Mongo(#[from] mongodb::error::Error),
}

/// Connect to `uri` and verify the server answers a ping
pub async fn connect(uri: &str, app_name: &str) -> Result<Client, DatastoreError> {
    let mut options = ClientOptions::parse(uri).await?;
    options.app_name = Some(app_name.to_string());

    let client = Client::with_options(options)?;
    client
        .database("admin")
        .run_command(doc! { "ping": 1 }, None)
        .await?;

    Ok(client)
}

/// Connect using the configured environment variable
pub async fn connect_from_env(config: &DatastoreConfig) -> Result<Client, DatastoreError> {
    let uri = config
        .uri()
        .ok_or_else(|| DatastoreError::MissingUri(config.uri_env.clone()))?;
    connect(&uri, &config.app_name).await
}

/// Connect or terminate the process.
///
/// Logs success. On failure logs the error and exits with status 1.
pub async fn bootstrap(config: &DatastoreConfig) -> Client {
    match connect_from_env(config).await {
        Ok(client) => {
            tracing::info!(app_name = %config.app_name, "Datastore connected");
            client
        }
        Err(e) => {
            tracing::error!(error = %e, "Datastore connection failed");
            std::process::exit(1);
        }
    }
}

/// Whether the server still answers a ping
pub async fn ping(client: &Client) -> bool {
    client
        .database("admin")
        .run_command(doc! { "ping": 1 }, None)
        .await
        .is_ok()
}
