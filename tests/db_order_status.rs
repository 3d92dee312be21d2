mod common;

use std::sync::Arc;

use diesel::r2d2::{ConnectionManager, Pool};
use diesel::PgConnection;
use dineease::db::{OrderOperations, RepositoryError};
use dineease::enums::orders::{OrderAction, OrderItemRequest, OrderRequest};
use dineease::enums::payments::PaymentRequest;
use dineease::models::statuses::{
    OrderStatus, OrderType, PaymentGateway, PaymentMethod, PaymentStatus,
};
use dineease::notify::{customer_topic, ChannelRegistry, NoopNotifier, Notifier};
use dineease::test_utils::TestFixtures;

fn place_order(
    pool: &Pool<ConnectionManager<PgConnection>>,
    notifier: Arc<dyn Notifier>,
    fixtures: &TestFixtures,
    transaction_id: &str,
) -> (i32, i32) {
    let order_ops = OrderOperations::new(pool.clone(), notifier);
    order_ops
        .create_order(
            fixtures.customer_id,
            OrderRequest {
                restaurant_id: fixtures.restaurant_id,
                promo_id: None,
                menu_items: vec![OrderItemRequest {
                    menu_item_id: fixtures.menu_ids[0],
                    quantity: 1,
                    special_instructions: None,
                }],
                order_type: OrderType::Takeaway,
                is_delivery: false,
                delivery_address: None,
                special_instructions: None,
                tax_cents: 0,
                tip_cents: 0,
                payment: PaymentRequest {
                    payment_method: PaymentMethod::CreditCard,
                    payment_status: "processing".to_string(),
                    payment_gateway: PaymentGateway::Stripe,
                    transaction_id: transaction_id.to_string(),
                    amount_paid_cents: 0,
                },
            },
        )
        .expect("place order")
}

#[actix_rt::test]
async fn accept_requires_an_approved_payment() {
    let (pool, fixtures) = common::setup_pool_with_fixtures();

    let (order_id_val, _) = place_order(&pool, Arc::new(NoopNotifier), &fixtures, "pi_accept_1");

    let order_ops = OrderOperations::new(pool.clone(), Arc::new(NoopNotifier));
    let err = order_ops
        .update_order_status(order_id_val, OrderAction::Accept)
        .expect_err("accept with pending payment must fail");
    assert!(matches!(err, RepositoryError::Conflict(_)));
}

#[actix_rt::test]
async fn accepted_order_runs_to_completion() {
    let (pool, fixtures) = common::setup_pool_with_fixtures();

    let registry = Arc::new(ChannelRegistry::default());
    let (order_id_val, payment_id_val) =
        place_order(&pool, registry.clone(), &fixtures, "pi_accept_2");

    let order_ops = OrderOperations::new(pool.clone(), registry.clone());
    order_ops
        .update_payment_status(payment_id_val, PaymentStatus::Completed)
        .expect("complete payment");

    // The payment already confirmed the order; a staff accept replays cleanly.
    let order = order_ops
        .update_order_status(order_id_val, OrderAction::Accept)
        .expect("accept");
    assert_eq!(order.status, OrderStatus::Confirmed);

    let mut rx = registry.subscribe(&customer_topic(fixtures.customer_id));
    let order = order_ops
        .update_order_status(order_id_val, OrderAction::Complete)
        .expect("complete");
    assert_eq!(order.status, OrderStatus::Completed);

    let raw = rx.try_recv().expect("order status event");
    let event: serde_json::Value = serde_json::from_str(&raw).expect("valid json");
    assert_eq!(event["type"], "order_status");
    assert_eq!(event["order_id"], order_id_val);
    assert_eq!(event["status"], "completed");
}

#[actix_rt::test]
async fn reject_cancels_a_pending_order() {
    let (pool, fixtures) = common::setup_pool_with_fixtures();

    let (order_id_val, _) = place_order(&pool, Arc::new(NoopNotifier), &fixtures, "pi_reject_1");

    let order_ops = OrderOperations::new(pool.clone(), Arc::new(NoopNotifier));
    let order = order_ops
        .update_order_status(order_id_val, OrderAction::Reject)
        .expect("reject");
    assert_eq!(order.status, OrderStatus::Cancelled);

    // Cancelled is terminal.
    let err = order_ops
        .update_order_status(order_id_val, OrderAction::Complete)
        .expect_err("completing a cancelled order must fail");
    assert!(matches!(err, RepositoryError::Conflict(_)));
}

#[actix_rt::test]
async fn unknown_order_is_not_found() {
    let (pool, _fixtures) = common::setup_pool_with_fixtures();

    let order_ops = OrderOperations::new(pool.clone(), Arc::new(NoopNotifier));
    let err = order_ops
        .update_order_status(555555, OrderAction::Accept)
        .expect_err("unknown order must fail");
    assert!(matches!(err, RepositoryError::NotFound(_)));
}

#[actix_rt::test]
async fn active_order_listing_drops_finished_orders() {
    let (pool, fixtures) = common::setup_pool_with_fixtures();

    let (open_order, _) = place_order(&pool, Arc::new(NoopNotifier), &fixtures, "pi_active_1");
    let (closed_order, _) = place_order(&pool, Arc::new(NoopNotifier), &fixtures, "pi_active_2");

    let order_ops = OrderOperations::new(pool.clone(), Arc::new(NoopNotifier));
    order_ops
        .update_order_status(closed_order, OrderAction::Reject)
        .expect("reject");

    let active = order_ops
        .get_active_orders_for_restaurant(fixtures.restaurant_id)
        .expect("active orders");
    let ids: Vec<i32> = active.iter().map(|o| o.order_id).collect();
    assert!(ids.contains(&open_order));
    assert!(!ids.contains(&closed_order));

    let mine = order_ops
        .get_orders_by_customer(fixtures.customer_id)
        .expect("customer orders");
    assert_eq!(mine.len(), 2);
}
