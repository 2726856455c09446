//! OAuth2 client-credentials token

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

/// Token returned by the auth endpoint.
///
/// `issued_at` is stamped locally when the token is received; a token
/// without it is never valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthToken {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub issued_at: Option<DateTime<Utc>>,
}

impl AuthToken {
    /// Instant the token stops being valid.
    ///
    /// `None` when unissued or when `expires_in` overflows the calendar, so
    /// such a token is treated as expired and requested again.
    #[must_use]
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        let lifetime = TimeDelta::try_seconds(i64::try_from(self.expires_in).ok()?)?;
        self.issued_at?.checked_add_signed(lifetime)
    }

    /// Valid iff issued and `now` is before expiry.
    #[must_use]
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at().is_some_and(|expiry| now < expiry)
    }

    /// Value for the `Authorization` header.
    #[must_use]
    pub fn authorization_header(&self) -> String {
        format!("{} {}", self.token_type, self.access_token)
    }

    /// Copy of the token stamped with its issue time.
    #[must_use]
    pub fn issued(self, at: DateTime<Utc>) -> Self {
        Self { issued_at: Some(at), ..self }
    }
}
