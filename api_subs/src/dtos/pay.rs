use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct UpgradeRequest {
    pub success_url: String,
    pub cancel_url: String,
}

#[derive(Debug, Serialize)]
pub struct UpgradeResponse {
    pub url: String,
}
