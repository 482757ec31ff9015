//! Access code validation.

use super::{
    clock::Clock,
    codes::{normalize, AccessCodeRecord, AccessCodeTable, UserProfile},
    delay::Delay,
    error::GateError,
    storage::{code_session_key, stored_expiry, LocalStorage},
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error, instrument, warn};

pub const MSG_CODE_REQUIRED: &str = "Access code is required";
pub const MSG_INVALID_CODE: &str = "Invalid access code. Please check your code and try again.";
pub const MSG_CODE_EXPIRED: &str = "Access code has expired. Please request a new code.";
pub const MSG_VALIDATION_UNAVAILABLE: &str =
    "Validation service temporarily unavailable. Please try again.";

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub valid: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserProfile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permissions: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<AccessCodeRecord>,
}

impl ValidationResult {
    fn denied(message: &str) -> Self {
        Self {
            valid: false,
            message: message.to_string(),
            user: None,
            permissions: None,
            config: None,
        }
    }

    fn granted(record: &AccessCodeRecord) -> Self {
        Self {
            valid: true,
            message: format!("Welcome {}! Access granted.", record.user.name),
            user: Some(record.user.clone()),
            permissions: Some(record.permissions.clone()),
            config: Some(record.clone()),
        }
    }
}

#[derive(Debug)]
pub struct AccessValidator {
    codes: Arc<AccessCodeTable>,
    storage: Arc<dyn LocalStorage>,
    clock: Arc<dyn Clock>,
    delay: Arc<dyn Delay>,
}

impl AccessValidator {
    pub fn new(
        codes: Arc<AccessCodeTable>,
        storage: Arc<dyn LocalStorage>,
        clock: Arc<dyn Clock>,
        delay: Arc<dyn Delay>,
    ) -> Self {
        Self {
            codes,
            storage,
            clock,
            delay,
        }
    }

    /// Validate a submitted access code.
    ///
    /// Never fails: storage faults become a "temporarily unavailable" result.
    /// May remove a stale `session_<CODE>` marker as a side effect.
    #[instrument(skip(self, code))]
    pub async fn validate(&self, code: &str) -> ValidationResult {
        // Pacing runs before any storage access.
        self.delay.wait().await;

        match self.check(code) {
            Ok(result) => result,
            Err(e) => {
                error!("Access code validation error: {e}");
                ValidationResult::denied(MSG_VALIDATION_UNAVAILABLE)
            }
        }
    }

    fn check(&self, code: &str) -> Result<ValidationResult, GateError> {
        if code.is_empty() {
            return Ok(ValidationResult::denied(MSG_CODE_REQUIRED));
        }

        let normalized = normalize(code);
        let Some(record) = self.codes.get(&normalized) else {
            warn!("rejected unknown access code");
            return Ok(ValidationResult::denied(MSG_INVALID_CODE));
        };

        let key = code_session_key(&normalized);
        if let Some(raw) = self.storage.get_item(&key)? {
            match stored_expiry(&raw) {
                Ok(Some(expires_at)) if expires_at < self.clock.now_ms() => {
                    self.storage.remove_item(&key)?;
                    warn!("access code {normalized} has an expired session");
                    return Ok(ValidationResult::denied(MSG_CODE_EXPIRED));
                }
                Ok(_) => {}
                Err(e) => {
                    debug!("removing unreadable session marker {key}: {e}");
                    self.storage.remove_item(&key)?;
                }
            }
        }

        debug!("access code {normalized} accepted");
        Ok(ValidationResult::granted(record))
    }
}
