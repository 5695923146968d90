//! MongoDB-backed client and token stores.
//!
//! Both stores share a [`MongoConnection`] and run every operation inside a
//! session transaction. The traits below are the seams the authorization
//! server calls through.

mod client;
mod connection;
pub mod documents;
pub mod grant;
mod token;

pub use client::MongoClientStore;
pub use connection::MongoConnection;
pub use token::MongoTokenStore;

use crate::error::StoreResult;
use crate::models::{Client, ClientInfo, Token, TokenInfo};

/// Storage for registered clients.
#[async_trait::async_trait]
pub trait ClientStore: Send + Sync {
    /// Insert a new client. Fails with `DuplicateKey` if the id exists.
    async fn set(&self, info: &dyn ClientInfo) -> StoreResult<()>;

    /// Fetch a client by id. Fails with `NotFound` if absent.
    async fn get_by_id(&self, id: &str) -> StoreResult<Client>;

    /// Delete a client by id. Deleting an absent client succeeds.
    async fn remove_by_id(&self, id: &str) -> StoreResult<()>;
}

/// Storage for authorization codes, access tokens and refresh tokens.
#[async_trait::async_trait]
pub trait TokenStore: Send + Sync {
    /// Store a newly issued grant.
    async fn create(&self, info: &dyn TokenInfo) -> StoreResult<()>;

    /// Delete the record stored for an authorization code.
    async fn remove_by_code(&self, code: &str) -> StoreResult<()>;

    /// Delete the access token row. The refresh row and payload are kept.
    async fn remove_by_access(&self, access: &str) -> StoreResult<()>;

    /// Delete the refresh token row. The access row and payload are kept.
    async fn remove_by_refresh(&self, refresh: &str) -> StoreResult<()>;

    async fn get_by_code(&self, code: &str) -> StoreResult<Token>;

    async fn get_by_access(&self, access: &str) -> StoreResult<Token>;

    async fn get_by_refresh(&self, refresh: &str) -> StoreResult<Token>;
}
