//! End-to-end store tests against a live MongoDB replica set.
//!
//! Transactions need a replica set; a single-node one is enough:
//!
//! ```text
//! docker run -d -p 27017:27017 mongo:7 --replSet rs0
//! docker exec <id> mongosh --eval 'rs.initiate()'
//! MONGO_URL="mongodb://127.0.0.1:27017/?directConnection=true" \
//!     cargo test -p oauth2-mongo --features integration
//! ```

#![cfg(feature = "integration")]

use chrono::{TimeDelta, TimeZone, Utc};
use mongodb::bson::oid::ObjectId;
use mongodb::bson::{Document, doc};

use oauth2_mongo::store::documents::{BasicDocument, TokenDocument};
use oauth2_mongo::{
    Client, ClientConfig, ClientStore, Config, MongoClientStore, MongoConnection,
    MongoTokenStore, StoreError, Token, TokenConfig, TokenStore,
};

/// Connect to a fresh, uniquely named database.
async fn connect() -> MongoConnection {
    let mut config = Config::from_env().expect("valid environment");
    config.database = format!("oauth2_test_{}", ObjectId::new().to_hex());
    MongoConnection::connect(&config)
        .await
        .expect("MongoDB reachable")
}

fn client_store(connection: &MongoConnection) -> MongoClientStore {
    MongoClientStore::new(connection.clone(), ClientConfig::default())
}

async fn token_store(connection: &MongoConnection) -> MongoTokenStore {
    MongoTokenStore::new(connection.clone(), TokenConfig::default()).await
}

async fn teardown(connection: MongoConnection) {
    connection
        .database()
        .drop()
        .await
        .expect("drop test database");
    connection.close().await;
}

fn issued_at() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
}

fn access_grant(access: &str, refresh: &str) -> Token {
    Token {
        client_id: "app".into(),
        user_id: "u1".into(),
        scope: "read write".into(),
        access: access.into(),
        access_created_at: issued_at(),
        access_expires_in: TimeDelta::seconds(3600),
        refresh: refresh.into(),
        refresh_created_at: issued_at(),
        refresh_expires_in: TimeDelta::seconds(7200),
        ..Token::default()
    }
}

// =============================================================================
// Client store
// =============================================================================

#[tokio::test]
async fn test_client_set_get_remove() {
    let connection = connect().await;
    let clients = client_store(&connection);

    let client = Client::new("app", "s3cret", "https://app.example.com", "owner");
    clients.set(&client).await.unwrap();

    assert_eq!(clients.get_by_id("app").await.unwrap(), client);

    clients.remove_by_id("app").await.unwrap();
    let err = clients.get_by_id("app").await.unwrap_err();
    assert!(err.is_not_found(), "unexpected error: {err}");

    teardown(connection).await;
}

#[tokio::test]
async fn test_client_duplicate_id_rejected() {
    let connection = connect().await;
    let clients = client_store(&connection);

    let first = Client::new("app", "first", "", "");
    let second = Client::new("app", "second", "", "");

    clients.set(&first).await.unwrap();
    let err = clients.set(&second).await.unwrap_err();
    let StoreError::DuplicateKey { id, .. } = err else {
        panic!("unexpected error: {err}");
    };
    assert_eq!(id, "app");

    // The first registration is untouched.
    let stored = clients.get_by_id("app").await.unwrap();
    assert_eq!(stored.secret, "first");

    teardown(connection).await;
}

#[tokio::test]
async fn test_client_remove_missing_is_noop() {
    let connection = connect().await;
    let clients = client_store(&connection);

    clients.remove_by_id("never-registered").await.unwrap();

    teardown(connection).await;
}

// =============================================================================
// Token store
// =============================================================================

#[tokio::test]
async fn test_code_grant_round_trip() {
    let connection = connect().await;
    let tokens = token_store(&connection).await;

    let grant = Token {
        client_id: "app".into(),
        code: "code-1".into(),
        code_created_at: issued_at(),
        code_expires_in: TimeDelta::minutes(10),
        code_challenge: "challenge".into(),
        code_challenge_method: "S256".into(),
        ..Token::default()
    };
    tokens.create(&grant).await.unwrap();

    let stored = tokens.get_by_code("code-1").await.unwrap();
    assert_eq!(stored, grant);

    // Only the basic payload exists for a bare code.
    let access_rows = connection.collection::<Document>("oauth2_access");
    let refresh_rows = connection.collection::<Document>("oauth2_refresh");
    let access_count = access_rows.count_documents(doc! {}).await.unwrap();
    let refresh_count = refresh_rows.count_documents(doc! {}).await.unwrap();
    assert_eq!(access_count, 0);
    assert_eq!(refresh_count, 0);
    let err = tokens.get_by_access("code-1").await.unwrap_err();
    assert!(err.is_not_found());

    tokens.remove_by_code("code-1").await.unwrap();
    let err = tokens.get_by_code("code-1").await.unwrap_err();
    assert!(err.is_not_found());

    teardown(connection).await;
}

#[tokio::test]
async fn test_access_and_refresh_resolve_same_payload() {
    let connection = connect().await;
    let tokens = token_store(&connection).await;

    let grant = access_grant("at-1", "rt-1");
    tokens.create(&grant).await.unwrap();

    let by_access = tokens.get_by_access("at-1").await.unwrap();
    let by_refresh = tokens.get_by_refresh("rt-1").await.unwrap();
    assert_eq!(by_access, grant);
    assert_eq!(by_access, by_refresh);

    teardown(connection).await;
}

#[tokio::test]
async fn test_grant_expiries_are_stored() {
    let connection = connect().await;
    let tokens = token_store(&connection).await;

    tokens.create(&access_grant("at-1", "rt-1")).await.unwrap();

    let access = connection
        .collection::<TokenDocument>("oauth2_access")
        .find_one(doc! { "_id": "at-1" })
        .await
        .unwrap()
        .expect("access row");
    let refresh = connection
        .collection::<TokenDocument>("oauth2_refresh")
        .find_one(doc! { "_id": "rt-1" })
        .await
        .unwrap()
        .expect("refresh row");
    let basic = connection
        .collection::<BasicDocument>("oauth2_basic")
        .find_one(doc! { "_id": access.basic_id.as_str() })
        .await
        .unwrap()
        .expect("basic payload");

    let t = issued_at().timestamp_millis();
    assert_eq!(access.expired_at.timestamp_millis(), t + 3_600_000);
    assert_eq!(refresh.expired_at.timestamp_millis(), t + 7_200_000);
    assert_eq!(basic.expired_at.timestamp_millis(), t + 7_200_000);
    assert_eq!(refresh.basic_id, access.basic_id);

    teardown(connection).await;
}

#[tokio::test]
async fn test_remove_by_access_does_not_cascade() {
    let connection = connect().await;
    let tokens = token_store(&connection).await;

    let grant = access_grant("at-1", "rt-1");
    tokens.create(&grant).await.unwrap();

    tokens.remove_by_access("at-1").await.unwrap();

    let err = tokens.get_by_access("at-1").await.unwrap_err();
    assert!(err.is_not_found());
    let by_refresh = tokens.get_by_refresh("rt-1").await.unwrap();
    assert_eq!(by_refresh, grant);

    // Removing again is a no-op.
    tokens.remove_by_access("at-1").await.unwrap();

    teardown(connection).await;
}

#[tokio::test]
async fn test_failed_grant_leaves_no_partial_state() {
    let connection = connect().await;
    let tokens = token_store(&connection).await;

    tokens.create(&access_grant("at-1", "rt-1")).await.unwrap();

    // Fresh access token, but the refresh token collides.
    let colliding = access_grant("at-2", "rt-1");
    let err = tokens.create(&colliding).await.unwrap_err();
    assert!(err.is_duplicate_key(), "unexpected error: {err}");

    let err = tokens.get_by_access("at-2").await.unwrap_err();
    assert!(err.is_not_found());
    let basics = connection.collection::<Document>("oauth2_basic");
    assert_eq!(basics.count_documents(doc! {}).await.unwrap(), 1);

    teardown(connection).await;
}

#[tokio::test]
async fn test_dangling_row_reports_missing_payload() {
    let connection = connect().await;
    let tokens = token_store(&connection).await;

    let grant = access_grant("at-1", "rt-1");
    tokens.create(&grant).await.unwrap();

    let basic_id = connection
        .collection::<TokenDocument>("oauth2_access")
        .find_one(doc! { "_id": "at-1" })
        .await
        .unwrap()
        .expect("access row")
        .basic_id;
    tokens.remove_by_code(&basic_id).await.unwrap();

    match tokens.get_by_access("at-1").await.unwrap_err() {
        StoreError::NotFound { collection, id } => {
            assert_eq!(collection, "oauth2_basic");
            assert_eq!(id, basic_id);
        }
        other => panic!("unexpected error: {other}"),
    }

    teardown(connection).await;
}

#[tokio::test]
async fn test_expiry_indexes_created() {
    let connection = connect().await;
    let tokens = MongoTokenStore::without_indexes(connection.clone(), TokenConfig::default());

    tokens.ensure_indexes().await.unwrap();

    for name in TokenConfig::default().expiring_collections() {
        let names = connection
            .collection::<Document>(name)
            .list_index_names()
            .await
            .unwrap();
        let indexed = names.iter().any(|n| n == "ExpiredAt_1");
        assert!(indexed, "{name}: {names:?}");
    }

    teardown(connection).await;
}
