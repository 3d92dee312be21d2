use crate::models::statuses::{
    OrderStatus, OrderType, PaymentGateway, PaymentMethod, PaymentStatus, PromoUsageStatus,
    RefundStatus,
};
use chrono::{DateTime, Utc};
use diesel::{Associations, Identifiable, Insertable, Queryable, Selectable};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Queryable, Selectable, Identifiable, Serialize, ToSchema, Debug)]
#[diesel(table_name = crate::db::schema::orders)]
#[diesel(primary_key(order_id))]
pub struct Order {
    pub order_id: i32,
    pub customer_id: i32,
    pub restaurant_id: i32,
    pub promo_id: Option<i32>,
    pub order_total_cents: i64,
    pub status: OrderStatus,
    pub order_type: OrderType,
    pub is_delivery: bool,
    pub delivery_address: Option<String>,
    pub special_instructions: Option<String>,
    pub tax_cents: i64,
    pub tip_cents: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::db::schema::orders)]
pub struct NewOrder {
    pub customer_id: i32,
    pub restaurant_id: i32,
    pub promo_id: Option<i32>,
    pub order_total_cents: i64,
    pub status: OrderStatus,
    pub order_type: OrderType,
    pub is_delivery: bool,
    pub delivery_address: Option<String>,
    pub special_instructions: Option<String>,
    pub tax_cents: i64,
    pub tip_cents: i64,
}

#[derive(Queryable, Selectable, Associations, Serialize, ToSchema, Debug)]
#[diesel(table_name = crate::db::schema::order_items)]
#[diesel(belongs_to(Order, foreign_key = order_id))]
pub struct OrderItem {
    pub order_item_id: i32,
    pub order_id: i32,
    pub menu_id: i32,
    pub quantity: i16,
    pub price_cents: i64,
    pub special_instructions: Option<String>,
}

impl OrderItem {
    pub fn subtotal_cents(&self) -> i64 {
        self.price_cents * self.quantity as i64
    }
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::db::schema::order_items)]
pub struct NewOrderItem {
    pub order_id: i32,
    pub menu_id: i32,
    pub quantity: i16,
    pub price_cents: i64,
    pub special_instructions: Option<String>,
}

#[derive(Queryable, Selectable, Identifiable, Serialize, ToSchema, Debug)]
#[diesel(table_name = crate::db::schema::payments)]
#[diesel(primary_key(payment_id))]
pub struct Payment {
    pub payment_id: i32,
    pub order_id: i32,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub payment_gateway: PaymentGateway,
    pub transaction_id: String,
    pub amount_paid_cents: i64,
    pub refund_status: RefundStatus,
    pub refund_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::db::schema::payments)]
pub struct NewPayment {
    pub order_id: i32,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub payment_gateway: PaymentGateway,
    pub transaction_id: String,
    pub amount_paid_cents: i64,
}

#[derive(Queryable, Selectable, Serialize, ToSchema, Debug)]
#[diesel(table_name = crate::db::schema::promo_usages)]
pub struct PromoUsage {
    pub promo_usage_id: i32,
    pub promo_id: i32,
    pub customer_id: i32,
    pub status: PromoUsageStatus,
    pub used_at: DateTime<Utc>,
}
