//! Client registrations.

use mongodb::Collection;
use mongodb::bson::doc;

use super::ClientStore;
use super::connection::MongoConnection;
use super::documents::ClientDocument;
use crate::config::ClientConfig;
use crate::error::{StoreError, StoreResult};
use crate::models::{Client, ClientInfo};

/// Client store backed by one MongoDB collection.
#[derive(Debug, Clone)]
pub struct MongoClientStore {
    connection: MongoConnection,
    config: ClientConfig,
}

impl MongoClientStore {
    #[must_use]
    pub fn new(connection: MongoConnection, config: ClientConfig) -> Self {
        Self { connection, config }
    }

    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn clients(&self) -> Collection<ClientDocument> {
        self.connection.collection(&self.config.clients_collection)
    }
}

#[async_trait::async_trait]
impl ClientStore for MongoClientStore {
    async fn set(&self, info: &dyn ClientInfo) -> StoreResult<()> {
        let clients = self.clients();
        let entity = ClientDocument::from_info(info);
        let id = entity.id.clone();

        self.connection
            .with_transaction(move |session| {
                Box::pin(async move {
                    clients
                        .insert_one(&entity)
                        .session(&mut *session)
                        .await
                        .map_err(|e| StoreError::from_insert(e, clients.name(), &entity.id))?;
                    Ok(())
                })
            })
            .await?;

        tracing::debug!(
            collection = %self.config.clients_collection,
            id = %id,
            "Stored client"
        );
        Ok(())
    }

    async fn get_by_id(&self, id: &str) -> StoreResult<Client> {
        let clients = self.clients();
        let id = id.to_owned();

        let entity = self
            .connection
            .with_transaction(move |session| {
                Box::pin(async move {
                    clients
                        .find_one(doc! { "_id": id.as_str() })
                        .session(&mut *session)
                        .await?
                        .ok_or_else(|| StoreError::not_found(clients.name(), id))
                })
            })
            .await?;

        Ok(entity.into())
    }

    async fn remove_by_id(&self, id: &str) -> StoreResult<()> {
        let clients = self.clients();
        let filter = doc! { "_id": id };

        let deleted = self
            .connection
            .with_transaction(move |session| {
                Box::pin(async move {
                    let result = clients.delete_one(filter).session(&mut *session).await?;
                    Ok(result.deleted_count)
                })
            })
            .await?;

        tracing::debug!(
            collection = %self.config.clients_collection,
            id = %id,
            deleted,
            "Removed client"
        );
        Ok(())
    }
}
