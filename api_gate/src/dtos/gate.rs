use gate::{Entitlement, FeatureKey, GateSnapshot, NavigationOutcome};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct NavigateRequest {
    pub feature: String,
}

#[derive(Debug, Serialize)]
pub struct NavigateResponse {
    /// `navigated`, `upsell` or `expired`
    pub outcome: &'static str,
    pub feature: Option<FeatureKey>,
    pub snapshot: GateSnapshot,
}

impl NavigateResponse {
    pub fn new(outcome: NavigationOutcome, snapshot: GateSnapshot) -> Self {
        let (outcome, feature) = match outcome {
            NavigationOutcome::Navigated(feature) => ("navigated", Some(feature)),
            NavigationOutcome::Upsell(feature) => ("upsell", Some(feature)),
            NavigationOutcome::Expired => ("expired", None),
        };
        Self {
            outcome,
            feature,
            snapshot,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct EntitlementResponse {
    #[serde(flatten)]
    pub entitlement: Entitlement,
    pub locked_features: Vec<FeatureKey>,
}

impl From<Entitlement> for EntitlementResponse {
    fn from(entitlement: Entitlement) -> Self {
        Self {
            locked_features: entitlement.locked_features(),
            entitlement,
        }
    }
}
