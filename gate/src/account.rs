use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of customer that owns a dashboard account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserType {
    #[default]
    Business,
    Agency,
}

impl UserType {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserType::Business => "business",
            UserType::Agency => "agency",
        }
    }
}

impl fmt::Display for UserType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "business" => Ok(UserType::Business),
            "agency" => Ok(UserType::Agency),
            other => Err(format!("Unknown user type: {}", other)),
        }
    }
}

/// Plan status. Only a payment-success event moves an account to `Active`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    Active,
    #[default]
    Trial,
}

impl AccountStatus {
    /// Reads a stored status string. Anything but `"active"` is a trial.
    pub fn from_stored(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case("active") {
            AccountStatus::Active
        } else {
            AccountStatus::Trial
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AccountStatus::Active => "active",
            AccountStatus::Trial => "trial",
        }
    }
}

/// Account record as read from the account store.
///
/// `created_at` is `None` when the stored timestamp is missing or could not be
/// read; trial computations then fall back to day zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,
    pub created_at: Option<DateTime<Utc>>,
    pub status: AccountStatus,
    pub user_type: UserType,
}

impl Account {
    pub fn is_active(&self) -> bool {
        self.status == AccountStatus::Active
    }

    pub fn is_trial(&self) -> bool {
        !self.is_active()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_status_is_trial() {
        assert_eq!(AccountStatus::from_stored("active"), AccountStatus::Active);
        assert_eq!(AccountStatus::from_stored(" ACTIVE "), AccountStatus::Active);
        assert_eq!(AccountStatus::from_stored("trial"), AccountStatus::Trial);
        assert_eq!(AccountStatus::from_stored("past_due"), AccountStatus::Trial);
        assert_eq!(AccountStatus::from_stored(""), AccountStatus::Trial);
    }

    #[test]
    fn user_type_parses_case_insensitively() {
        assert_eq!("Agency".parse::<UserType>(), Ok(UserType::Agency));
        assert_eq!("business".parse::<UserType>(), Ok(UserType::Business));
        assert!("reseller".parse::<UserType>().is_err());
    }

    #[test]
    fn serializes_lowercase() {
        let json = serde_json::to_string(&UserType::Agency).unwrap();
        assert_eq!(json, "\"agency\"");
        let json = serde_json::to_string(&AccountStatus::Active).unwrap();
        assert_eq!(json, "\"active\"");
    }
}
