use actix_web::{Responder, delete, get, post, web};
use common::{
    error::{AppError, Res},
    http::Success,
    jwt::JwtClaims,
};
use db::AccountStore;
use gate::FeatureKey;

use crate::{
    dtos::gate::{EntitlementResponse, NavigateRequest, NavigateResponse},
    services::{self, registry::GateRegistry},
};

/// Returns the current gate for the signed-in user.
///
/// The first call of a session loads the account; later calls re-check the
/// trial against the current time, so a trial that ran out mid-session shows
/// the expired overlay on the next poll.
///
/// # Output
/// - Success: the gate snapshot (state, active view, trial progress, locked features)
/// - Error: 401 Unauthorized without a valid Supabase token
///
/// Account store failures are not surfaced; the snapshot then reports
/// `"account": "failed"` and a fresh, non-expired trial.
///
/// # Frontend Example
/// ```javascript
/// const response = await fetch('/api/dashboard/gate', {
///   headers: { 'Authorization': `Bearer ${session.access_token}` }
/// });
/// const gate = await response.json();
/// // {
/// //   state: { kind: "normal" },
/// //   active_view: "Dashboard",
/// //   account: "loaded",
/// //   entitlement: { user_type: "business", trial: { days_elapsed: 5, days_left: 9, is_expired: false }, ... },
/// //   locked_features: ["AI Assistant", "Analytics", "GBP Media"]
/// // }
/// ```
#[get("")]
pub async fn get_gate(
    claims: web::ReqData<JwtClaims>,
    registry: web::Data<GateRegistry>,
    store: web::Data<dyn AccountStore>,
) -> Res<impl Responder> {
    let snapshot = services::gate::load_session(&registry, store.get_ref(), &claims).await;
    Success::ok(snapshot)
}

/// Requests navigation to a dashboard area. Loads the account first when the
/// session does not have it, so the answer always reflects the real trial.
///
/// # Input
/// - `feature`: sidebar label, e.g. `"Requests"` or `"AI Assistant"`
///
/// # Output
/// - `outcome: "navigated"`: the active view changed
/// - `outcome: "upsell"`: the feature is locked, the upsell prompt names it
/// - `outcome: "expired"`: the trial is over, the expired overlay is shown
/// - Error: 400 Bad Request for an unknown feature label
#[post("/navigate")]
pub async fn post_navigate(
    claims: web::ReqData<JwtClaims>,
    req: web::Json<NavigateRequest>,
    registry: web::Data<GateRegistry>,
    store: web::Data<dyn AccountStore>,
) -> Res<impl Responder> {
    let feature = req
        .feature
        .parse::<FeatureKey>()
        .map_err(AppError::BadRequest)?;

    let (outcome, snapshot) = services::gate::navigate(&registry, store.get_ref(), &claims, feature).await;
    Success::ok(NavigateResponse::new(outcome, snapshot))
}

/// Closes the upsell prompt.
#[post("/dismiss")]
pub async fn post_dismiss(
    claims: web::ReqData<JwtClaims>,
    registry: web::Data<GateRegistry>,
    store: web::Data<dyn AccountStore>,
) -> Res<impl Responder> {
    let snapshot = services::gate::dismiss(&registry, store.get_ref(), &claims).await;
    Success::ok(snapshot)
}

/// Ends the dashboard session on logout. Account fetches still in flight for
/// it are discarded when they complete.
#[delete("")]
pub async fn delete_gate(
    claims: web::ReqData<JwtClaims>,
    registry: web::Data<GateRegistry>,
) -> Res<impl Responder> {
    if registry.end_session(claims.user_id()) {
        log::debug!("Ended gate session for {}", claims.user_id());
    }
    Success::no_content()
}

/// Trial progress and locked features for the signed-in user, without
/// touching the navigation session.
#[get("")]
pub async fn get_entitlement(
    claims: web::ReqData<JwtClaims>,
    registry: web::Data<GateRegistry>,
    store: web::Data<dyn AccountStore>,
) -> Res<impl Responder> {
    let entitlement = services::gate::entitlement(&registry, store.get_ref(), &claims).await;
    Success::ok(EntitlementResponse::from(entitlement))
}
