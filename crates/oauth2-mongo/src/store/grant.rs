//! Turning one issued grant into the documents that store it.
//!
//! A grant carrying an authorization code becomes a single basic document
//! keyed by the code. Any other grant becomes a basic document under a fresh
//! id plus an access row and, when a refresh token was issued, a refresh row.

use chrono::{DateTime, TimeDelta, Utc};

use super::documents::{BasicDocument, TokenDocument};
use crate::config::ExpiryClamp;
use crate::error::{StoreError, StoreResult};
use crate::models::TokenInfo;

/// Expiry instants derived from a grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GrantExpiry {
    /// Access token expiry, already clamped to the refresh expiry.
    pub access: DateTime<Utc>,
    /// Refresh token expiry, if a refresh token was issued.
    pub refresh: Option<DateTime<Utc>>,
}

impl GrantExpiry {
    /// Compute access and refresh expiries for an access grant.
    ///
    /// Returns [`StoreError::InvalidToken`] when an expiry falls outside the
    /// representable date range.
    pub fn of(info: &(impl TokenInfo + ?Sized), clamp: ExpiryClamp) -> StoreResult<Self> {
        let mut access = expires_at(
            "access",
            info.access_created_at(),
            info.access_expires_in(),
        )?;

        let refresh = if info.refresh().is_empty() {
            None
        } else {
            Some(expires_at(
                "refresh",
                info.refresh_created_at(),
                info.refresh_expires_in(),
            )?)
        };

        if let Some(refresh) = refresh {
            if clamp.exceeds(access, refresh) {
                access = refresh;
            }
        }

        Ok(Self { access, refresh })
    }

    /// The basic payload lives as long as the longest-lived token.
    #[must_use]
    pub fn basic(&self) -> DateTime<Utc> {
        self.refresh.unwrap_or(self.access)
    }
}

/// Documents written for one grant, in insertion order.
#[derive(Debug, Clone, PartialEq)]
pub struct GrantWrite {
    pub basic: BasicDocument,
    pub access: Option<TokenDocument>,
    pub refresh: Option<TokenDocument>,
}

impl GrantWrite {
    /// Lay out the documents for `info`.
    ///
    /// `next_id` is only called for access grants, to key the basic payload.
    pub fn plan(
        info: &(impl TokenInfo + ?Sized),
        clamp: ExpiryClamp,
        next_id: impl FnOnce() -> String,
    ) -> StoreResult<Self> {
        let code = info.code();
        let access = info.access();

        if code.is_empty() && access.is_empty() {
            return Err(StoreError::InvalidToken(
                "token carries neither an authorization code nor an access token".into(),
            ));
        }

        let payload = info.to_token().to_payload()?;

        if !code.is_empty() {
            let expired_at =
                expires_at("code", info.code_created_at(), info.code_expires_in())?;
            return Ok(Self {
                basic: BasicDocument::new(code, payload, expired_at),
                access: None,
                refresh: None,
            });
        }

        let expiry = GrantExpiry::of(info, clamp)?;
        let basic_id = next_id();

        let refresh = expiry.refresh.map(|expired_at| {
            TokenDocument::new(info.refresh(), basic_id.as_str(), expired_at)
        });

        Ok(Self {
            access: Some(TokenDocument::new(access, basic_id.as_str(), expiry.access)),
            refresh,
            basic: BasicDocument::new(basic_id, payload, expiry.basic()),
        })
    }

    /// Id of the basic payload every row points at.
    #[must_use]
    pub fn basic_id(&self) -> &str {
        &self.basic.id
    }
}

fn expires_at(
    kind: &str,
    created_at: DateTime<Utc>,
    lifetime: TimeDelta,
) -> StoreResult<DateTime<Utc>> {
    created_at.checked_add_signed(lifetime).ok_or_else(|| {
        StoreError::InvalidToken(format!(
            "{kind} expiry overflows: created {created_at}, lifetime {lifetime}"
        ))
    })
}
