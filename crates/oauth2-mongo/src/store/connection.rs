//! Shared MongoDB connection with explicit open/close lifecycle.

use std::time::Duration;

use futures::future::BoxFuture;
use mongodb::bson::doc;
use mongodb::options::ClientOptions;
use mongodb::{Client, ClientSession, Collection, Database};

use crate::config::{Config, defaults};
use crate::error::{StoreError, StoreResult};

/// Handle to one MongoDB database, shared by the client and token stores.
///
/// Cloning is cheap; all clones use the same connection pool.
#[derive(Clone)]
pub struct MongoConnection {
    client: Client,
    database: String,
    operation_timeout: Duration,
    disconnect_timeout: Duration,
}

impl MongoConnection {
    /// Connect to the configured deployment and verify it answers a ping.
    ///
    /// # Errors
    ///
    /// Returns error if the URL is invalid, the server cannot be reached, or
    /// the ping does not complete within `connect_timeout`.
    pub async fn connect(config: &Config) -> StoreResult<Self> {
        let mut options = ClientOptions::parse(&config.url).await?;
        options.connect_timeout = Some(config.connect_timeout);
        options.server_selection_timeout = Some(config.connect_timeout);
        options.app_name.get_or_insert_with(|| env!("CARGO_PKG_NAME").to_string());

        let client = Client::with_options(options)?;
        let connection = Self {
            client,
            database: config.database.clone(),
            operation_timeout: config.operation_timeout,
            disconnect_timeout: config.disconnect_timeout,
        };

        let db = connection.database();
        tokio::time::timeout(config.connect_timeout, async move {
            db.run_command(doc! { "ping": 1 }).await
        })
        .await
        .map_err(|_| StoreError::Timeout(config.connect_timeout))??;

        tracing::info!(database = %config.database, "Connected to MongoDB");
        Ok(connection)
    }

    /// Wrap an already connected driver client.
    #[must_use]
    pub fn from_client(client: Client, database: impl Into<String>) -> Self {
        Self {
            client,
            database: database.into(),
            operation_timeout: defaults::OPERATION_TIMEOUT,
            disconnect_timeout: defaults::DISCONNECT_TIMEOUT,
        }
    }

    #[must_use]
    pub fn database(&self) -> Database {
        self.client.database(&self.database)
    }

    #[must_use]
    pub fn collection<T: Send + Sync>(&self, name: &str) -> Collection<T> {
        self.database().collection(name)
    }

    /// Run `op` inside a session transaction.
    ///
    /// Commits when `op` succeeds and aborts when it fails or exceeds the
    /// operation timeout. The original fault is returned even if the abort
    /// itself fails.
    pub async fn with_transaction<T, F>(&self, op: F) -> StoreResult<T>
    where
        T: Send,
        F: for<'s> FnOnce(&'s mut ClientSession) -> BoxFuture<'s, StoreResult<T>> + Send,
    {
        let mut session = self.client.start_session().await?;
        session.start_transaction().await?;

        let body = tokio::time::timeout(self.operation_timeout, op(&mut session));
        let outcome = match body.await {
            Ok(result) => result,
            Err(_) => Err(StoreError::Timeout(self.operation_timeout)),
        };

        match outcome {
            Ok(value) => {
                session.commit_transaction().await?;
                Ok(value)
            }
            Err(err) => {
                if let Err(abort_err) = session.abort_transaction().await {
                    tracing::warn!(error = %abort_err, "Failed to abort transaction");
                }
                Err(err)
            }
        }
    }

    /// Shut down the connection pool.
    ///
    /// Waits up to `disconnect_timeout` for outstanding sessions to drop.
    pub async fn close(self) {
        let Self {
            client,
            database,
            disconnect_timeout,
            ..
        } = self;

        let shutdown = async move { client.shutdown().await };
        let finished = tokio::time::timeout(disconnect_timeout, shutdown).await;
        if finished.is_err() {
            tracing::warn!(timeout = ?disconnect_timeout, "MongoDB shutdown timed out");
        } else {
            tracing::info!(database = %database, "MongoDB connection closed");
        }
    }
}

impl std::fmt::Debug for MongoConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MongoConnection")
            .field("database", &self.database)
            .field("operation_timeout", &self.operation_timeout)
            .finish_non_exhaustive()
    }
}
