use std::sync::Arc;

use actix_web::{HttpRequest, Responder, post, web};
use api_gate::GateRegistry;
use common::{
    env_config::Config,
    error::{AppError, Res},
    http::Success,
    jwt::JwtClaims,
    stripe,
};
use db::AccountStore;

use crate::{
    dtos::pay::{UpgradeRequest, UpgradeResponse},
    services,
};

/// Handles Stripe webhook events.
///
/// # Input
/// - `payload`: Raw string containing the webhook event data
/// - `req`: HTTP request containing Stripe signature in headers
///
/// # Output
/// - Success: Returns 200 OK when webhook is processed successfully
/// - Error: Returns 400 Bad Request for an invalid signature or checkout
///   reference, 404 if the referenced account does not exist
///
/// # Note
/// This endpoint is called by Stripe, not by the dashboard. Configure it in the
/// Stripe Dashboard under Webhooks (event `checkout.session.completed`) and set
/// the signing secret as STRIPE_WEBHOOK_SECRET.
#[post("/webhook")]
pub async fn post_webhook(
    payload: String,
    req: HttpRequest,
    config: web::Data<Arc<Config>>,
    store: web::Data<dyn AccountStore>,
    registry: web::Data<GateRegistry>,
) -> Res<impl Responder> {
    let signature = match req.headers().get("stripe-signature") {
        Some(signature) => signature.to_str().unwrap_or(""),
        None => return Err(AppError::BadRequest("Stripe signature missing".to_string())),
    };

    let event =
        services::pay::construct_event(&payload, signature, &config.stripe_webhook_secret)?;
    services::pay::process_webhook_event(event, store.get_ref(), &registry).await?;

    Success::ok("Webhook processed successfully")
}

/// Starts the upgrade from trial to the paid plan.
///
/// # Input
/// - `success_url`: where Stripe Checkout redirects after payment
/// - `cancel_url`: where it redirects if the user backs out
///
/// # Output
/// - Success: `{ "url": "https://checkout.stripe.com/..." }`
///
/// # Frontend Example
/// ```javascript
/// const response = await fetch('/api/dashboard/pay/upgrade', {
///   method: 'POST',
///   headers: {
///     'Content-Type': 'application/json',
///     'Authorization': `Bearer ${session.access_token}`
///   },
///   body: JSON.stringify({
///     success_url: `${window.location.origin}/dashboard?upgraded=1`,
///     cancel_url: `${window.location.origin}/dashboard`
///   })
/// });
/// const { url } = await response.json();
/// window.location.href = url;
/// ```
#[post("/upgrade")]
pub async fn post_upgrade(
    claims: web::ReqData<JwtClaims>,
    req: web::Json<UpgradeRequest>,
    config: web::Data<Arc<Config>>,
) -> Res<impl Responder> {
    let client = stripe::create_client(&config.stripe_secret_key);

    let session = services::pay::create_upgrade_session(
        &client,
        &config.stripe_price_id,
        claims.user_id(),
        claims.email.as_deref(),
        &req,
    )
    .await?;

    let url = session
        .url
        .ok_or_else(|| AppError::Internal("Checkout session has no URL".to_string()))?;
    Success::ok(UpgradeResponse { url })
}
