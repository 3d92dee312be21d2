use crate::api::errors::repository_error_response;
use crate::db::{OrderOperations, PaymentOperations, RepositoryError};
use crate::enums::common::MessageResponse;
use crate::gateway::stripe::{verify_signature, WebhookEvent};
use crate::models::statuses::PaymentStatus;
use actix_web::{post, web, HttpRequest, HttpResponse, Responder};

#[derive(Clone)]
pub struct WebhookConfig {
    pub stripe_endpoint_secret: String,
}

/// Stripe calls this endpoint for every event on the account; only
/// `payment_intent.succeeded` and `charge.refunded` mutate state, everything
/// else is acknowledged and dropped. Events can arrive repeatedly, so the
/// payment update underneath is idempotent.
#[utoipa::path(
    post,
    tag = "Webhooks",
    path = "/stripe/webhook",
    request_body = String,
    responses(
        (status = 200, description = "Event processed or ignored", body = MessageResponse),
        (status = 400, description = "Bad signature or payload", body = MessageResponse),
        (status = 404, description = "Unknown transaction id", body = MessageResponse)
    ),
    summary = "Stripe payment-event webhook"
)]
#[post("/stripe/webhook")]
pub(super) async fn stripe_webhook(
    config: web::Data<WebhookConfig>,
    order_ops: web::Data<OrderOperations>,
    payment_ops: web::Data<PaymentOperations>,
    req: HttpRequest,
    body: web::Bytes,
) -> impl Responder {
    let sig_header = req
        .headers()
        .get("Stripe-Signature")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    if let Err(reason) = verify_signature(&body, sig_header, &config.stripe_endpoint_secret) {
        warn!("stripe_webhook: signature rejected: {}", reason);
        return HttpResponse::BadRequest().json(MessageResponse::error("Invalid signature"));
    }

    let event: WebhookEvent = match serde_json::from_slice(&body) {
        Ok(event) => event,
        Err(e) => {
            warn!("stripe_webhook: unparseable payload: {}", e);
            return HttpResponse::BadRequest().json(MessageResponse::error("Invalid payload"));
        }
    };

    let new_status = match event.event_type.as_str() {
        "payment_intent.succeeded" => PaymentStatus::Completed,
        "charge.refunded" => PaymentStatus::Refunded,
        other => {
            debug!("stripe_webhook: ignoring event type '{}'", other);
            return HttpResponse::Ok().json(MessageResponse::ok("Event ignored"));
        }
    };

    let transaction_id = event.transaction_id().to_string();
    let payment_ops = payment_ops.get_ref().clone();
    let order_ops = order_ops.get_ref().clone();
    let result = web::block(move || {
        let payment = payment_ops.get_payment_by_transaction_id(&transaction_id)?;
        order_ops.update_payment_status(payment.payment_id, new_status)?;
        Ok::<(), RepositoryError>(())
    })
    .await;

    match result {
        Ok(Ok(())) => HttpResponse::Ok().json(MessageResponse::ok("Event processed")),
        Ok(Err(e)) => {
            error!("stripe_webhook: {}", e);
            repository_error_response("stripe_webhook", e)
        }
        Err(e) => {
            error!("stripe_webhook: blocking error: {}", e);
            HttpResponse::InternalServerError()
                .json(MessageResponse::error("Internal server error"))
        }
    }
}
