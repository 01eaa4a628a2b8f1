use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown role: {0}")]
pub struct UnknownRole(pub String);

/// Role of an account, used for authorization decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountRole {
    Admin,
    Tutor,
    Student,
}

impl AccountRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountRole::Admin => "admin",
            AccountRole::Tutor => "tutor",
            AccountRole::Student => "student",
        }
    }

    /// Elevated accounts may act on other users' availability.
    pub fn is_elevated(&self) -> bool {
        matches!(self, AccountRole::Admin)
    }
}

impl FromStr for AccountRole {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(AccountRole::Admin),
            "tutor" => Ok(AccountRole::Tutor),
            "student" => Ok(AccountRole::Student),
            _ => Err(UnknownRole(s.to_string())),
        }
    }
}

impl fmt::Display for AccountRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tag stored on each availability block saying whose availability it is.
///
/// Kept separate from [`AccountRole`] so the data column can evolve
/// independently of authorization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AvailabilityRole {
    Admin,
    Tutor,
    Student,
}

impl AvailabilityRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            AvailabilityRole::Admin => "admin",
            AvailabilityRole::Tutor => "tutor",
            AvailabilityRole::Student => "student",
        }
    }
}

impl From<AccountRole> for AvailabilityRole {
    fn from(role: AccountRole) -> Self {
        match role {
            AccountRole::Admin => AvailabilityRole::Admin,
            AccountRole::Tutor => AvailabilityRole::Tutor,
            AccountRole::Student => AvailabilityRole::Student,
        }
    }
}

impl fmt::Display for AvailabilityRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
