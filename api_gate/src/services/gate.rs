use chrono::Utc;
use common::{
    error::{AppError, Res},
    jwt::JwtClaims,
};
use db::AccountStore;
use gate::{
    Account, Entitlement, FeatureKey, GateController, GateSnapshot, NavigationOutcome, UserType,
};
use uuid::Uuid;

use super::registry::GateRegistry;

/// User type the session claims at sign-up. Business when absent or unknown.
pub fn user_type_hint(claims: &JwtClaims) -> UserType {
    claims
        .user_metadata
        .user_type
        .as_deref()
        .and_then(|raw| raw.parse().ok())
        .unwrap_or_default()
}

/// Reads the account, folding a missing row into an error so that the gate
/// treats it like any other failed fetch.
pub async fn fetch_account(store: &dyn AccountStore, user_id: Uuid) -> Res<Account> {
    store
        .fetch_account(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Account {} not found", user_id)))
}

/// Loads the account into the user's session unless it is already there.
/// Gate operations call this first; the loading state lasts only while a
/// fetch is in flight.
pub async fn ensure_loaded(registry: &GateRegistry, store: &dyn AccountStore, claims: &JwtClaims) {
    let user_id = claims.user_id();
    if let Some(ticket) = registry.begin_fetch_if_needed(user_id, user_type_hint(claims)) {
        let result = fetch_account(store, user_id).await;
        registry.apply_fetch(user_id, ticket, result, Utc::now());
    }
}

/// Returns the user's gate, loading the account first if the session does not
/// have it yet.
pub async fn load_session(
    registry: &GateRegistry,
    store: &dyn AccountStore,
    claims: &JwtClaims,
) -> GateSnapshot {
    ensure_loaded(registry, store, claims).await;

    let now = Utc::now();
    registry.with_session(claims.user_id(), user_type_hint(claims), |gate| {
        gate.refresh(now);
        gate.snapshot(now)
    })
}

/// Re-reads the account of a live session, e.g. after a payment.
/// Does nothing when the user has no session.
pub async fn reload_session(registry: &GateRegistry, store: &dyn AccountStore, user_id: Uuid) {
    if let Some(ticket) = registry.begin_refetch(user_id) {
        let result = fetch_account(store, user_id).await;
        registry.apply_fetch(user_id, ticket, result, Utc::now());
    }
}

pub async fn navigate(
    registry: &GateRegistry,
    store: &dyn AccountStore,
    claims: &JwtClaims,
    feature: FeatureKey,
) -> (NavigationOutcome, GateSnapshot) {
    ensure_loaded(registry, store, claims).await;

    let now = Utc::now();
    registry.with_session(claims.user_id(), user_type_hint(claims), |gate| {
        let outcome = gate.request_navigation(feature, now);
        (outcome, gate.snapshot(now))
    })
}

pub async fn dismiss(
    registry: &GateRegistry,
    store: &dyn AccountStore,
    claims: &JwtClaims,
) -> GateSnapshot {
    ensure_loaded(registry, store, claims).await;

    let now = Utc::now();
    registry.with_session(claims.user_id(), user_type_hint(claims), |gate| {
        gate.dismiss_prompt();
        gate.snapshot(now)
    })
}

/// Entitlement without touching the session, for one-off checks.
pub async fn entitlement(
    registry: &GateRegistry,
    store: &dyn AccountStore,
    claims: &JwtClaims,
) -> Entitlement {
    let mut gate = GateController::new(user_type_hint(claims), registry.window());
    let ticket = gate.begin_fetch();
    let result = fetch_account(store, claims.user_id()).await;
    let now = Utc::now();
    gate.apply_fetch(ticket, result, now);
    gate.entitlement(now)
}
