//! Session composition, restore and logout.

use super::{
    codes::UserProfile,
    error::GateError,
    limiter::usage_percentage,
    storage::SESSION_KEY,
    Gate,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, warn};

const MSG_AUTH_FAILED: &str = "Authentication failed. Please try again.";
const MSG_INVALID_FALLBACK: &str = "Invalid access code";
const MASK: &str = "••••••••";

/// Record of a successful gate pass. Expiry is fixed at creation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub access_code: String,
    pub user: UserProfile,
    pub permissions: Vec<String>,
    pub usage_count: u64,
    pub max_usage: u64,
    pub expires_at: i64,
    pub created_at: i64,
}

impl Session {
    #[must_use]
    pub fn is_active(&self, now_ms: i64) -> bool {
        self.expires_at > now_ms
    }

    #[must_use]
    pub fn time_remaining_ms(&self, now_ms: i64) -> i64 {
        (self.expires_at - now_ms).max(0)
    }

    #[must_use]
    pub fn usage_percentage(&self) -> f64 {
        usage_percentage(self.usage_count, self.max_usage)
    }

    /// First four characters of the code followed by a fixed mask.
    #[must_use]
    pub fn masked_access_code(&self) -> String {
        let head: String = self.access_code.chars().take(4).collect();
        format!("{head}{MASK}")
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AuthOutcome {
    Granted { session: Session, message: String },
    Denied { message: String },
}

impl AuthOutcome {
    fn denied(message: impl Into<String>) -> Self {
        Self::Denied {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn is_granted(&self) -> bool {
        matches!(self, Self::Granted { .. })
    }

    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Granted { message, .. } | Self::Denied { message } => message,
        }
    }

    #[must_use]
    pub fn session(&self) -> Option<&Session> {
        match self {
            Self::Granted { session, .. } => Some(session),
            Self::Denied { .. } => None,
        }
    }
}

impl Gate {
    /// Validate a code, consume one request and persist the resulting
    /// session under [`SESSION_KEY`].
    #[instrument(skip(self, code))]
    pub async fn authenticate(&self, code: &str) -> AuthOutcome {
        let validation = self.validate(code).await;
        if !validation.valid {
            let message = if validation.message.is_empty() {
                MSG_INVALID_FALLBACK.to_string()
            } else {
                validation.message
            };
            return AuthOutcome::denied(message);
        }

        let rate = self.check_and_consume(code);
        if !rate.allowed {
            return AuthOutcome::denied(
                rate.message
                    .unwrap_or_else(|| MSG_INVALID_FALLBACK.to_string()),
            );
        }

        let (Some(user), Some(permissions)) = (validation.user, validation.permissions) else {
            error!("validation granted access without a user record");
            return AuthOutcome::denied(MSG_AUTH_FAILED);
        };

        let now = self.now_ms();
        let session = Session {
            access_code: code.to_string(),
            user,
            permissions,
            usage_count: rate.usage_count,
            max_usage: rate.max_usage,
            expires_at: now + self.config().session_ttl_ms(),
            created_at: now,
        };

        if let Err(e) = self.persist(&session) {
            error!("Failed to persist session: {e}");
            return AuthOutcome::denied(MSG_AUTH_FAILED);
        }

        info!("demo access granted to {}", session.user.name);
        let message = format!("Welcome {}! Demo access granted.", session.user.name);
        AuthOutcome::Granted { session, message }
    }

    /// Load the stored session if it is still active. Expired or unreadable
    /// sessions are removed.
    pub fn restore(&self) -> Option<Session> {
        match self.try_restore() {
            Ok(session) => session,
            Err(e) => {
                error!("Failed to restore session: {e}");
                None
            }
        }
    }

    /// Forget the stored session.
    pub fn logout(&self) {
        if let Err(e) = self.storage().remove_item(SESSION_KEY) {
            error!("Failed to clear session: {e}");
        }
    }

    fn persist(&self, session: &Session) -> Result<(), GateError> {
        let json = serde_json::to_string(session)?;
        self.storage().set_item(SESSION_KEY, &json)
    }

    fn try_restore(&self) -> Result<Option<Session>, GateError> {
        let Some(raw) = self.storage().get_item(SESSION_KEY)? else {
            return Ok(None);
        };

        match serde_json::from_str::<Session>(&raw) {
            Ok(session) if session.is_active(self.now_ms()) => Ok(Some(session)),
            Ok(_) => {
                debug!("stored session expired");
                self.storage().remove_item(SESSION_KEY)?;
                Ok(None)
            }
            Err(e) => {
                warn!("removing unreadable session: {e}");
                self.storage().remove_item(SESSION_KEY)?;
                Ok(None)
            }
        }
    }
}
