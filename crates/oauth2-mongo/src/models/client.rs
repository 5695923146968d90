//! Registered OAuth clients.

use serde::{Deserialize, Serialize};

/// Read access to a client registration.
pub trait ClientInfo: Send + Sync {
    /// Client identifier.
    fn id(&self) -> &str;

    /// Client secret.
    fn secret(&self) -> &str;

    /// Registered redirect domain.
    fn domain(&self) -> &str;

    /// Owning user.
    fn user_id(&self) -> &str;
}

/// A registered OAuth client.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    pub id: String,
    pub secret: String,
    pub domain: String,
    pub user_id: String,
}

impl Client {
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        secret: impl Into<String>,
        domain: impl Into<String>,
        user_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            secret: secret.into(),
            domain: domain.into(),
            user_id: user_id.into(),
        }
    }
}

impl ClientInfo for Client {
    fn id(&self) -> &str {
        &self.id
    }

    fn secret(&self) -> &str {
        &self.secret
    }

    fn domain(&self) -> &str {
        &self.domain
    }

    fn user_id(&self) -> &str {
        &self.user_id
    }
}
