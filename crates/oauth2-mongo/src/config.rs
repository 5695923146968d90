//! Configuration for the MongoDB OAuth stores.

use std::time::Duration;

use anyhow::Context;
use chrono::{DateTime, Timelike, Utc};

/// Default values.
pub mod defaults {
    use std::time::Duration;

    /// MongoDB connection string.
    pub const URL: &str = "mongodb://127.0.0.1:27017";

    /// Database name.
    pub const DATABASE: &str = "oauth2";

    /// Client registrations.
    pub const CLIENTS_COLLECTION: &str = "oauth2_clients";

    /// Reserved; nothing is written here.
    pub const TXN_COLLECTION: &str = "oauth2_txn";

    /// Serialized token records.
    pub const BASIC_COLLECTION: &str = "oauth2_basic";

    /// Access token index rows.
    pub const ACCESS_COLLECTION: &str = "oauth2_access";

    /// Refresh token index rows.
    pub const REFRESH_COLLECTION: &str = "oauth2_refresh";

    /// Connection establishment and initial ping.
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Upper bound for one transaction body.
    pub const OPERATION_TIMEOUT: Duration = Duration::from_secs(15);

    /// Upper bound for closing the connection.
    pub const DISCONNECT_TIMEOUT: Duration = Duration::from_secs(15);
}

/// Connection configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// MongoDB connection string.
    pub url: String,

    /// Target database.
    pub database: String,

    /// Timeout for connecting and the startup ping.
    pub connect_timeout: Duration,

    /// Timeout applied to each transaction.
    pub operation_timeout: Duration,

    /// Timeout for [`MongoConnection::close`](crate::MongoConnection::close).
    pub disconnect_timeout: Duration,
}

impl Config {
    /// Create a configuration for the given URL and database with default timeouts.
    #[must_use]
    pub fn new(url: impl Into<String>, database: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            database: database.into(),
            connect_timeout: defaults::CONNECT_TIMEOUT,
            operation_timeout: defaults::OPERATION_TIMEOUT,
            disconnect_timeout: defaults::DISCONNECT_TIMEOUT,
        }
    }

    /// Create configuration from environment variables.
    ///
    /// Reads `MONGO_URL`, `MONGO_DB` and `MONGO_CONNECT_TIMEOUT_SECS`; unset
    /// variables fall back to [`defaults`].
    ///
    /// # Errors
    ///
    /// Returns error if `MONGO_CONNECT_TIMEOUT_SECS` is not a number.
    pub fn from_env() -> anyhow::Result<Self> {
        let url = std::env::var("MONGO_URL").unwrap_or_else(|_| defaults::URL.to_string());
        let database = std::env::var("MONGO_DB")
            .unwrap_or_else(|_| defaults::DATABASE.to_string());

        let mut config = Self::new(url, database);

        if let Ok(secs) = std::env::var("MONGO_CONNECT_TIMEOUT_SECS") {
            let secs: u64 = secs
                .parse()
                .context("Invalid MONGO_CONNECT_TIMEOUT_SECS")?;
            config.connect_timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(defaults::URL, defaults::DATABASE)
    }
}

/// Collection names used by the client store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Client registrations (default `oauth2_clients`).
    pub clients_collection: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            clients_collection: defaults::CLIENTS_COLLECTION.to_string(),
        }
    }
}

/// How access and refresh expiries are compared when clamping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExpiryClamp {
    /// Compare whole Unix seconds. Access expiry never exceeds refresh expiry.
    #[default]
    WholeSeconds,

    /// Compare only the seconds-of-minute field, as earlier deployments did.
    SecondOfMinute,
}

impl ExpiryClamp {
    /// Whether `access` expires after `refresh` under this comparison.
    #[must_use]
    pub fn exceeds(self, access: DateTime<Utc>, refresh: DateTime<Utc>) -> bool {
        match self {
            Self::WholeSeconds => access.timestamp() > refresh.timestamp(),
            Self::SecondOfMinute => access.second() > refresh.second(),
        }
    }
}

/// Collection names and expiry policy used by the token store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenConfig {
    /// Reserved collection name (default `oauth2_txn`).
    pub txn_collection: String,

    /// Serialized token records (default `oauth2_basic`).
    pub basic_collection: String,

    /// Access token rows (default `oauth2_access`).
    pub access_collection: String,

    /// Refresh token rows (default `oauth2_refresh`).
    pub refresh_collection: String,

    /// Clamp comparison mode.
    pub expiry_clamp: ExpiryClamp,
}

impl TokenConfig {
    /// Collections that carry an `ExpiredAt` index.
    #[must_use]
    pub fn expiring_collections(&self) -> [&str; 3] {
        [
            &self.basic_collection,
            &self.access_collection,
            &self.refresh_collection,
        ]
    }
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            txn_collection: defaults::TXN_COLLECTION.to_string(),
            basic_collection: defaults::BASIC_COLLECTION.to_string(),
            access_collection: defaults::ACCESS_COLLECTION.to_string(),
            refresh_collection: defaults::REFRESH_COLLECTION.to_string(),
            expiry_clamp: ExpiryClamp::default(),
        }
    }
}
