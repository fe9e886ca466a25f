use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::account::UserType;

/// A dashboard area that can be gated. Serialized by its sidebar label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FeatureKey {
    #[serde(rename = "Dashboard")]
    Dashboard,
    #[serde(rename = "Reviews")]
    Reviews,
    #[serde(rename = "Requests")]
    Requests,
    #[serde(rename = "AI Assistant")]
    AiAssistant,
    #[serde(rename = "Analytics")]
    Analytics,
    #[serde(rename = "GBP Media")]
    GbpMedia,
    #[serde(rename = "Widgets")]
    Widgets,
    #[serde(rename = "Settings")]
    Settings,
}

impl FeatureKey {
    pub const ALL: [FeatureKey; 8] = [
        FeatureKey::Dashboard,
        FeatureKey::Reviews,
        FeatureKey::Requests,
        FeatureKey::AiAssistant,
        FeatureKey::Analytics,
        FeatureKey::GbpMedia,
        FeatureKey::Widgets,
        FeatureKey::Settings,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            FeatureKey::Dashboard => "Dashboard",
            FeatureKey::Reviews => "Reviews",
            FeatureKey::Requests => "Requests",
            FeatureKey::AiAssistant => "AI Assistant",
            FeatureKey::Analytics => "Analytics",
            FeatureKey::GbpMedia => "GBP Media",
            FeatureKey::Widgets => "Widgets",
            FeatureKey::Settings => "Settings",
        }
    }
}

impl fmt::Display for FeatureKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for FeatureKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        FeatureKey::ALL
            .into_iter()
            .find(|key| key.label().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("Unknown feature: {}", s))
    }
}

/// Features held back from business accounts that are still on a trial.
pub const TRIAL_LOCKED_FEATURES: [FeatureKey; 3] = [
    FeatureKey::AiAssistant,
    FeatureKey::Analytics,
    FeatureKey::GbpMedia,
];

/// Whether `feature` sits behind an upgrade for this kind of account.
///
/// Agencies are provisioned separately and never locked. Paid business
/// accounts see everything.
pub fn is_locked(user_type: UserType, is_trial_account: bool, feature: FeatureKey) -> bool {
    match user_type {
        UserType::Agency => false,
        UserType::Business => is_trial_account && TRIAL_LOCKED_FEATURES.contains(&feature),
    }
}

/// Every locked feature, in sidebar order.
pub fn locked_features(user_type: UserType, is_trial_account: bool) -> Vec<FeatureKey> {
    FeatureKey::ALL
        .into_iter()
        .filter(|feature| is_locked(user_type, is_trial_account, *feature))
        .collect()
}
