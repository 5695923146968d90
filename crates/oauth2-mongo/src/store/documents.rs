//! Stored document shapes.
//!
//! Field names match the collections written by earlier deployments, so
//! existing data stays readable.

use chrono::Utc;
use mongodb::bson::spec::BinarySubtype;
use mongodb::bson::{self, Binary};
use serde::{Deserialize, Serialize};

use crate::models::{Client, ClientInfo};

/// Field carrying the expiry timestamp, indexed ascending.
pub const EXPIRED_AT: &str = "ExpiredAt";

/// A row in the clients collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientDocument {
    #[serde(rename = "_id")]
    pub id: String,
    pub secret: String,
    pub domain: String,
    #[serde(rename = "userid")]
    pub user_id: String,
}

impl ClientDocument {
    #[must_use]
    pub fn from_info(info: &(impl ClientInfo + ?Sized)) -> Self {
        Self {
            id: info.id().to_owned(),
            secret: info.secret().to_owned(),
            domain: info.domain().to_owned(),
            user_id: info.user_id().to_owned(),
        }
    }
}

impl From<ClientDocument> for Client {
    fn from(doc: ClientDocument) -> Self {
        Self {
            id: doc.id,
            secret: doc.secret,
            domain: doc.domain,
            user_id: doc.user_id,
        }
    }
}

/// The serialized token record for one grant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BasicDocument {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "Data")]
    pub data: Binary,
    #[serde(rename = "ExpiredAt")]
    pub expired_at: bson::DateTime,
}

impl BasicDocument {
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        payload: Vec<u8>,
        expired_at: chrono::DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            data: Binary {
                subtype: BinarySubtype::Generic,
                bytes: payload,
            },
            expired_at: to_bson_datetime(expired_at),
        }
    }

    /// Raw JSON payload.
    #[must_use]
    pub fn payload(&self) -> &[u8] {
        &self.data.bytes
    }
}

/// An access or refresh token pointing at its [`BasicDocument`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenDocument {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "BasicID")]
    pub basic_id: String,
    #[serde(rename = "ExpiredAt")]
    pub expired_at: bson::DateTime,
}

impl TokenDocument {
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        basic_id: impl Into<String>,
        expired_at: chrono::DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            basic_id: basic_id.into(),
            expired_at: to_bson_datetime(expired_at),
        }
    }
}

/// BSON dates have millisecond precision.
#[must_use]
pub fn to_bson_datetime(at: chrono::DateTime<Utc>) -> bson::DateTime {
    bson::DateTime::from_millis(at.timestamp_millis())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_document_field_names() {
        let doc = ClientDocument::from_info(&Client::new("app", "s", "https://d", "u"));
        let raw = bson::to_document(&doc).unwrap();

        assert_eq!(raw.get_str("_id").unwrap(), "app");
        assert_eq!(raw.get_str("secret").unwrap(), "s");
        assert_eq!(raw.get_str("domain").unwrap(), "https://d");
        assert_eq!(raw.get_str("userid").unwrap(), "u");
    }

    #[test]
    fn test_basic_document_stores_binary_payload() {
        let at = chrono::DateTime::from_timestamp(1_700_000_000, 123_456_789).unwrap();
        let doc = BasicDocument::new("b1", b"{}".to_vec(), at);
        let raw = bson::to_document(&doc).unwrap();

        assert_eq!(raw.get_binary_generic("Data").unwrap(), b"{}");
        let expired_at = raw.get_datetime(EXPIRED_AT).unwrap();
        assert_eq!(expired_at.timestamp_millis(), 1_700_000_000_123);
    }

    #[test]
    fn test_token_document_field_names() {
        let at = chrono::DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let raw = bson::to_document(&TokenDocument::new("at-1", "b1", at)).unwrap();

        assert_eq!(raw.get_str("_id").unwrap(), "at-1");
        assert_eq!(raw.get_str("BasicID").unwrap(), "b1");
        assert!(raw.get_datetime(EXPIRED_AT).is_ok());
    }
}
