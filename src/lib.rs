#[macro_use]
extern crate log;

pub mod api;
pub mod auth;
pub mod db;
pub mod enums;
pub mod gateway;
pub mod models;
pub mod notify;
pub mod test_utils;

use crate::api::WebhookConfig;
use crate::db::{
    establish_connection_pool, run_db_migrations, OrderOperations, PaymentOperations,
    PromoOperations, RestaurantOperations,
};
use crate::notify::ChannelRegistry;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub order_ops: OrderOperations,
    pub payment_ops: PaymentOperations,
    pub promo_ops: PromoOperations,
    pub restaurant_ops: RestaurantOperations,
    pub notifier: Arc<ChannelRegistry>,
    pub webhook_config: WebhookConfig,
}

impl AppState {
    pub fn new(url: &str) -> Self {
        let db = establish_connection_pool(url);
        run_db_migrations(db.clone()).expect("Unable to run migrations");

        let stripe_endpoint_secret =
            std::env::var("STRIPE_WEBHOOK_SECRET").unwrap_or_else(|_| String::new());
        if stripe_endpoint_secret.is_empty() {
            warn!("STRIPE_WEBHOOK_SECRET not set; webhook signature checks will reject everything");
        }

        let notifier = Arc::new(ChannelRegistry::default());
        let order_ops = OrderOperations::new(db.clone(), notifier.clone());
        let payment_ops = PaymentOperations::new(db.clone());
        let promo_ops = PromoOperations::new(db.clone());
        let restaurant_ops = RestaurantOperations::new(db);

        AppState {
            order_ops,
            payment_ops,
            promo_ops,
            restaurant_ops,
            notifier,
            webhook_config: WebhookConfig {
                stripe_endpoint_secret,
            },
        }
    }
}
