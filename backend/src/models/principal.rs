use serde::{Deserialize, Serialize};

use crate::engine::AvailabilityError;
use crate::models::AccountRole;

/// The already-authenticated caller of an operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub user_id: String,
    pub org_id: String,
    pub role: AccountRole,
}

impl Principal {
    pub fn new(user_id: impl Into<String>, org_id: impl Into<String>, role: AccountRole) -> Self {
        Self {
            user_id: user_id.into(),
            org_id: org_id.into(),
            role,
        }
    }

    pub fn is_elevated(&self) -> bool {
        self.role.is_elevated()
    }

    /// Allow acting on `user_id` only for that user or an elevated caller.
    pub fn authorize_self_or_elevated(&self, user_id: &str) -> Result<(), AvailabilityError> {
        if self.user_id == user_id || self.is_elevated() {
            Ok(())
        } else {
            Err(AvailabilityError::Forbidden(format!(
                "user {} may not access availability of user {}",
                self.user_id, user_id
            )))
        }
    }
}
