use api_gate::{GateRegistry, services::gate::reload_session};
use common::error::{AppError, Res};
use db::AccountStore;
use stripe::{
    CheckoutSession, CheckoutSessionMode, Client, CreateCheckoutSession, Event, EventObject,
    EventType, Webhook,
};
use uuid::Uuid;

use crate::dtos::pay::UpgradeRequest;

/// Account to switch to the paid plan after a completed checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Activation {
    pub user_id: Uuid,
    pub stripe_customer_id: Option<String>,
}

/// Creates the checkout session behind the dashboard's Upgrade button.
/// The user id travels as `client_reference_id` and comes back in the
/// webhook.
pub async fn create_upgrade_session(
    client: &Client,
    price_id: &str,
    user_id: Uuid,
    email: Option<&str>,
    req: &UpgradeRequest,
) -> Res<CheckoutSession> {
    if price_id.is_empty() {
        return Err(AppError::Internal(
            "STRIPE_PRICE_ID is not configured".to_string(),
        ));
    }

    let client_reference_id = user_id.to_string();
    let params = CreateCheckoutSession {
        line_items: Some(vec![stripe::CreateCheckoutSessionLineItems {
            price: Some(price_id.to_string()),
            quantity: Some(1),
            ..Default::default()
        }]),
        mode: Some(CheckoutSessionMode::Subscription),
        success_url: Some(req.success_url.as_str()),
        cancel_url: Some(req.cancel_url.as_str()),
        client_reference_id: Some(client_reference_id.as_str()),
        customer_email: email,
        ..Default::default()
    };
    CheckoutSession::create(client, params)
        .await
        .map_err(AppError::from)
}

/// Creates an event for the webhook based on the request payload and signature.
/// Requires a webhook secret key.
pub fn construct_event(payload: &str, signature: &str, webhook_secret: &str) -> Res<Event> {
    match Webhook::construct_event(payload, signature, webhook_secret) {
        Ok(event) => Ok(event),
        Err(e) => {
            log::error!("Error constructing webhook event: {}", e);
            Err(AppError::BadRequest(format!("Webhook Error: {}", e)))
        }
    }
}

/// Reads the activation target out of a completed checkout.
pub fn parse_activation(
    client_reference_id: Option<&str>,
    stripe_customer_id: Option<String>,
) -> Res<Activation> {
    let raw = client_reference_id
        .ok_or_else(|| AppError::BadRequest("Checkout session has no client_reference_id".to_string()))?;
    let user_id = raw
        .trim()
        .parse::<Uuid>()
        .map_err(|e| AppError::BadRequest(format!("Invalid client_reference_id {}: {}", raw, e)))?;

    Ok(Activation {
        user_id,
        stripe_customer_id,
    })
}

/// Marks the account paid and refreshes a live dashboard session so the
/// overlay or upsell prompt goes away without a new login.
pub async fn activate_account(
    store: &dyn AccountStore,
    registry: &GateRegistry,
    activation: Activation,
) -> Res<()> {
    let user_id = activation.user_id;
    if !store.activate(user_id, activation.stripe_customer_id).await? {
        return Err(AppError::NotFound(format!("Account {} not found", user_id)));
    }
    log::info!("Account {} is now active", user_id);

    reload_session(registry, store, user_id).await;
    Ok(())
}

/// Processes the webhook event.
pub async fn process_webhook_event(
    event: Event,
    store: &dyn AccountStore,
    registry: &GateRegistry,
) -> Res<()> {
    log::info!("Processing webhook event: {}", event.type_);

    match event.type_ {
        EventType::CheckoutSessionCompleted => {
            if let EventObject::CheckoutSession(session) = event.data.object {
                log::info!("Checkout session completed: {}", session.id);
                let activation = parse_activation(
                    session.client_reference_id.as_deref(),
                    session.customer.as_ref().map(|c| c.id().to_string()),
                )?;
                activate_account(store, registry, activation).await?;
            }
        }
        _ => {
            log::info!("Unhandled event type: {}", event.type_);
        }
    }

    Ok(())
}
