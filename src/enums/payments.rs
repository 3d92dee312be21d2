use crate::models::statuses::{PaymentGateway, PaymentMethod};
use serde::Deserialize;
use utoipa::ToSchema;

/// Payment details submitted alongside an order. `payment_status` is the
/// gateway-reported state and goes through the fixed mapping table before
/// anything is stored.
#[derive(Deserialize, ToSchema, Debug)]
pub struct PaymentRequest {
    pub payment_method: PaymentMethod,
    pub payment_status: String,
    pub payment_gateway: PaymentGateway,
    pub transaction_id: String,
    pub amount_paid_cents: i64,
}

#[derive(Deserialize, ToSchema, Debug)]
pub struct UpdatePaymentStatusRequest {
    pub payment_status: String,
}
