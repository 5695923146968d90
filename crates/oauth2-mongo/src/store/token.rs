//! Authorization codes, access tokens and refresh tokens.
//!
//! Each grant stores its full token record once, in the basic collection.
//! Access and refresh tokens get small rows in their own collections that
//! point at that record. Rows are removed independently; expired leftovers
//! are cleaned up through the `ExpiredAt` indexes.

use mongodb::bson::oid::ObjectId;
use mongodb::bson::{Document, doc};
use mongodb::{ClientSession, Collection, IndexModel};
use serde::Serialize;

use super::TokenStore;
use super::connection::MongoConnection;
use super::documents::{BasicDocument, EXPIRED_AT, TokenDocument};
use super::grant::GrantWrite;
use crate::config::TokenConfig;
use crate::error::{StoreError, StoreResult};
use crate::models::{Token, TokenInfo};

/// Token store spread over the basic, access and refresh collections.
#[derive(Debug, Clone)]
pub struct MongoTokenStore {
    connection: MongoConnection,
    config: TokenConfig,
}

impl MongoTokenStore {
    /// Create the store and its expiry indexes.
    ///
    /// Index failures do not prevent startup; they are logged as warnings.
    /// Call [`ensure_indexes`](Self::ensure_indexes) to handle them yourself.
    pub async fn new(connection: MongoConnection, config: TokenConfig) -> Self {
        let store = Self::without_indexes(connection, config);

        if let Err(e) = store.ensure_indexes().await {
            tracing::warn!(error = %e, "Failed to create token expiry indexes");
        }

        store
    }

    /// Create the store without touching indexes.
    #[must_use]
    pub fn without_indexes(connection: MongoConnection, config: TokenConfig) -> Self {
        Self { connection, config }
    }

    #[must_use]
    pub fn config(&self) -> &TokenConfig {
        &self.config
    }

    /// Create an ascending `ExpiredAt` index on the basic, access and refresh collections.
    pub async fn ensure_indexes(&self) -> StoreResult<()> {
        for name in self.config.expiring_collections() {
            let index = IndexModel::builder().keys(doc! { EXPIRED_AT: 1 }).build();
            let created = self
                .connection
                .collection::<Document>(name)
                .create_index(index)
                .await?;

            tracing::debug!(
                collection = %name,
                index = %created.index_name,
                "Ensured expiry index"
            );
        }
        Ok(())
    }

    fn basic(&self) -> Collection<BasicDocument> {
        self.connection.collection(&self.config.basic_collection)
    }

    fn rows(&self, name: &str) -> Collection<TokenDocument> {
        self.connection.collection(name)
    }

    async fn remove(&self, name: &str, id: &str) -> StoreResult<()> {
        let collection = self.connection.collection::<Document>(name);
        let filter = doc! { "_id": id };

        let deleted = self
            .connection
            .with_transaction(move |session| {
                Box::pin(async move {
                    let result = collection
                        .delete_one(filter)
                        .session(&mut *session)
                        .await?;
                    Ok(result.deleted_count)
                })
            })
            .await?;

        tracing::debug!(collection = %name, deleted, "Removed token document");
        Ok(())
    }

    /// Resolve a token row to its basic payload and decode it.
    async fn lookup(&self, name: &str, token: &str) -> StoreResult<Token> {
        let rows = self.rows(name);
        let basic = self.basic();
        let token = token.to_owned();

        let record = self
            .connection
            .with_transaction(move |session| {
                Box::pin(async move {
                    let row = rows
                        .find_one(doc! { "_id": token.as_str() })
                        .session(&mut *session)
                        .await?
                        .filter(|row| !row.basic_id.is_empty())
                        .ok_or_else(|| StoreError::not_found(rows.name(), token))?;

                    find_basic(&basic, &row.basic_id, session).await
                })
            })
            .await?;

        Ok(Token::from_payload(record.payload())?)
    }
}

async fn insert<T>(
    collection: &Collection<T>,
    doc: &T,
    id: &str,
    session: &mut ClientSession,
) -> StoreResult<()>
where
    T: Serialize + Send + Sync,
{
    collection
        .insert_one(doc)
        .session(session)
        .await
        .map_err(|e| StoreError::from_insert(e, collection.name(), id))?;
    Ok(())
}

async fn find_basic(
    basic: &Collection<BasicDocument>,
    id: &str,
    session: &mut ClientSession,
) -> StoreResult<BasicDocument> {
    basic
        .find_one(doc! { "_id": id })
        .session(session)
        .await?
        .ok_or_else(|| StoreError::not_found(basic.name(), id))
}

#[async_trait::async_trait]
impl TokenStore for MongoTokenStore {
    async fn create(&self, info: &dyn TokenInfo) -> StoreResult<()> {
        let write = GrantWrite::plan(info, self.config.expiry_clamp, || {
            ObjectId::new().to_hex()
        })?;
        let basic_id = write.basic_id().to_owned();

        let basic = self.basic();
        let access = self.rows(&self.config.access_collection);
        let refresh = self.rows(&self.config.refresh_collection);

        self.connection
            .with_transaction(move |session| {
                Box::pin(async move {
                    insert(&basic, &write.basic, &write.basic.id, session).await?;
                    if let Some(row) = &write.access {
                        insert(&access, row, &row.id, session).await?;
                    }
                    if let Some(row) = &write.refresh {
                        insert(&refresh, row, &row.id, session).await?;
                    }
                    Ok(())
                })
            })
            .await?;

        tracing::debug!(basic_id = %basic_id, "Stored token grant");
        Ok(())
    }

    async fn remove_by_code(&self, code: &str) -> StoreResult<()> {
        self.remove(&self.config.basic_collection, code).await
    }

    async fn remove_by_access(&self, access: &str) -> StoreResult<()> {
        self.remove(&self.config.access_collection, access).await
    }

    async fn remove_by_refresh(&self, refresh: &str) -> StoreResult<()> {
        self.remove(&self.config.refresh_collection, refresh).await
    }

    async fn get_by_code(&self, code: &str) -> StoreResult<Token> {
        let basic = self.basic();
        let code = code.to_owned();

        let record = self
            .connection
            .with_transaction(move |session| {
                Box::pin(async move { find_basic(&basic, &code, session).await })
            })
            .await?;

        Ok(Token::from_payload(record.payload())?)
    }

    async fn get_by_access(&self, access: &str) -> StoreResult<Token> {
        self.lookup(&self.config.access_collection, access).await
    }

    async fn get_by_refresh(&self, refresh: &str) -> StoreResult<Token> {
        self.lookup(&self.config.refresh_collection, refresh).await
    }
}
