//! Token issuance records.
//!
//! A [`Token`] is stored whole, as JSON, inside the basic payload. Field names
//! follow the wire format used by the issuing framework: timestamps are
//! RFC 3339 and lifetimes are integer nanoseconds.

use std::collections::BTreeMap;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Read access to a token issuance record.
pub trait TokenInfo: Send + Sync {
    /// Authorization code, empty when none was issued.
    fn code(&self) -> &str;

    fn code_created_at(&self) -> DateTime<Utc>;

    fn code_expires_in(&self) -> TimeDelta;

    /// Access token, empty when none was issued.
    fn access(&self) -> &str;

    fn access_created_at(&self) -> DateTime<Utc>;

    fn access_expires_in(&self) -> TimeDelta;

    /// Refresh token, empty when none was issued.
    fn refresh(&self) -> &str;

    fn refresh_created_at(&self) -> DateTime<Utc>;

    fn refresh_expires_in(&self) -> TimeDelta;

    /// Snapshot the full record for serialization.
    fn to_token(&self) -> Token;
}

/// A token issuance record: code, access and refresh token with their timings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Token {
    #[serde(rename = "ClientID")]
    pub client_id: String,

    #[serde(rename = "UserID")]
    pub user_id: String,

    #[serde(rename = "RedirectURI")]
    pub redirect_uri: String,

    #[serde(rename = "Scope")]
    pub scope: String,

    #[serde(rename = "Code")]
    pub code: String,

    #[serde(rename = "CodeChallenge")]
    pub code_challenge: String,

    #[serde(rename = "CodeChallengeMethod")]
    pub code_challenge_method: String,

    #[serde(rename = "CodeCreateAt")]
    pub code_created_at: DateTime<Utc>,

    #[serde(rename = "CodeExpiresIn", with = "nanos")]
    pub code_expires_in: TimeDelta,

    #[serde(rename = "Access")]
    pub access: String,

    #[serde(rename = "AccessCreateAt")]
    pub access_created_at: DateTime<Utc>,

    #[serde(rename = "AccessExpiresIn", with = "nanos")]
    pub access_expires_in: TimeDelta,

    #[serde(rename = "Refresh")]
    pub refresh: String,

    #[serde(rename = "RefreshCreateAt")]
    pub refresh_created_at: DateTime<Utc>,

    #[serde(rename = "RefreshExpiresIn", with = "nanos")]
    pub refresh_expires_in: TimeDelta,

    /// Extra data attached by the framework.
    #[serde(
        rename = "Extension",
        skip_serializing_if = "BTreeMap::is_empty",
        deserialize_with = "null_as_empty"
    )]
    pub extension: BTreeMap<String, Vec<String>>,
}

/// Seconds from the Unix epoch back to 0001-01-01T00:00:00Z, the framework's
/// unset timestamp.
const UNSET_SECS: i64 = -62_135_596_800;

/// Timestamp written for a code or token that was never issued.
#[must_use]
pub fn unset_time() -> DateTime<Utc> {
    DateTime::from_timestamp(UNSET_SECS, 0).unwrap_or_default()
}

impl Default for Token {
    fn default() -> Self {
        let unset = unset_time();
        Self {
            client_id: String::new(),
            user_id: String::new(),
            redirect_uri: String::new(),
            scope: String::new(),
            code: String::new(),
            code_challenge: String::new(),
            code_challenge_method: String::new(),
            code_created_at: unset,
            code_expires_in: TimeDelta::zero(),
            access: String::new(),
            access_created_at: unset,
            access_expires_in: TimeDelta::zero(),
            refresh: String::new(),
            refresh_created_at: unset,
            refresh_expires_in: TimeDelta::zero(),
            extension: BTreeMap::new(),
        }
    }
}

impl Token {
    /// Encode as the JSON payload stored in the basic collection.
    pub fn to_payload(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }

    /// Decode a stored JSON payload.
    pub fn from_payload(bytes: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(bytes)
    }
}

impl TokenInfo for Token {
    fn code(&self) -> &str {
        &self.code
    }

    fn code_created_at(&self) -> DateTime<Utc> {
        self.code_created_at
    }

    fn code_expires_in(&self) -> TimeDelta {
        self.code_expires_in
    }

    fn access(&self) -> &str {
        &self.access
    }

    fn access_created_at(&self) -> DateTime<Utc> {
        self.access_created_at
    }

    fn access_expires_in(&self) -> TimeDelta {
        self.access_expires_in
    }

    fn refresh(&self) -> &str {
        &self.refresh
    }

    fn refresh_created_at(&self) -> DateTime<Utc> {
        self.refresh_created_at
    }

    fn refresh_expires_in(&self) -> TimeDelta {
        self.refresh_expires_in
    }

    fn to_token(&self) -> Token {
        self.clone()
    }
}

/// A nil map is written as `null`.
fn null_as_empty<'de, D>(deserializer: D) -> Result<BTreeMap<String, Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let map: Option<BTreeMap<String, Vec<String>>> = Option::deserialize(deserializer)?;
    Ok(map.unwrap_or_default())
}

/// Lifetimes as signed nanoseconds.
mod nanos {
    use chrono::TimeDelta;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &TimeDelta, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        // Overflows only past ~292 years.
        serializer.serialize_i64(value.num_nanoseconds().unwrap_or(i64::MAX))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<TimeDelta, D::Error>
    where
        D: Deserializer<'de>,
    {
        i64::deserialize(deserializer).map(TimeDelta::nanoseconds)
    }
}
