use crate::models::payments::{Order, OrderItem};
use crate::models::statuses::OrderType;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::payments::PaymentRequest;

#[derive(Deserialize, ToSchema, Debug)]
pub struct OrderItemRequest {
    pub menu_item_id: i32,
    pub quantity: i16,
    pub special_instructions: Option<String>,
}

#[derive(Deserialize, ToSchema, Debug)]
pub struct OrderRequest {
    pub restaurant_id: i32,
    pub promo_id: Option<i32>,
    pub menu_items: Vec<OrderItemRequest>,
    pub order_type: OrderType,
    pub is_delivery: bool,
    pub delivery_address: Option<String>,
    pub special_instructions: Option<String>,
    #[serde(default)]
    pub tax_cents: i64,
    #[serde(default)]
    pub tip_cents: i64,
    pub payment: PaymentRequest,
}

#[derive(Serialize, ToSchema)]
pub struct CreateOrderResponse {
    pub status: String,
    pub order_id: Option<i32>,
    pub payment_id: Option<i32>,
    pub message: Option<String>,
    pub error: Option<String>,
}

#[derive(Deserialize, ToSchema, Debug)]
pub struct UpdateOrderStatusRequest {
    pub action: String,
}

/// Admin decision on an order. Messages are what the customer channel shows.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OrderAction {
    Accept,
    Reject,
    Complete,
}

impl OrderAction {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "accept" => Some(Self::Accept),
            "reject" => Some(Self::Reject),
            "complete" => Some(Self::Complete),
            _ => None,
        }
    }

    pub fn customer_message(&self) -> &'static str {
        match self {
            Self::Accept => "Your order has been accepted",
            Self::Reject => "Your order has been rejected",
            Self::Complete => "Your order is complete",
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
}
