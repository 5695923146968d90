//! MongoDB storage for OAuth 2.0
//!
//! Persists registered clients, authorization codes, access tokens and
//! refresh tokens for an OAuth 2.0 authorization server.
//!
//! # Features
//!
//! - **Client store**: insert, fetch and revoke client registrations
//! - **Token store**: one transaction per grant across basic, access and refresh collections
//! - **Expiry indexes**: ascending `ExpiredAt` indexes for external TTL cleanup
//!
//! # Example
//!
//! ```no_run
//! use oauth2_mongo::{Config, MongoConnection, MongoTokenStore, TokenConfig, TokenStore};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let connection = MongoConnection::connect(&config).await?;
//!     let tokens = MongoTokenStore::new(connection.clone(), TokenConfig::default()).await;
//!
//!     let token = tokens.get_by_access("some-access-token").await?;
//!     println!("{}", token.client_id);
//!
//!     connection.close().await;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod models;
pub mod store;

pub use config::{ClientConfig, Config, ExpiryClamp, TokenConfig};
pub use error::{StoreError, StoreResult};
pub use models::{Client, ClientInfo, Token, TokenInfo};
pub use store::{ClientStore, MongoClientStore, MongoConnection, MongoTokenStore, TokenStore};
