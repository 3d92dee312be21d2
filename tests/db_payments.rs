mod common;

use std::sync::Arc;

use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::PgConnection;
use dineease::db::{DbConnection, OrderOperations, PaymentOperations, RepositoryError};
use dineease::enums::orders::{OrderItemRequest, OrderRequest};
use dineease::enums::payments::PaymentRequest;
use dineease::models::statuses::{
    DiscountKind, OrderStatus, OrderType, PaymentGateway, PaymentMethod, PaymentStatus,
    PromoUsageStatus, RefundStatus,
};
use dineease::notify::{customer_topic, ChannelRegistry, NoopNotifier, Notifier};
use dineease::test_utils::{insert_promo, TestFixtures};

fn place_order(
    pool: &Pool<ConnectionManager<PgConnection>>,
    notifier: Arc<dyn Notifier>,
    fixtures: &TestFixtures,
    transaction_id: &str,
    promo_id: Option<i32>,
) -> (i32, i32) {
    let order_ops = OrderOperations::new(pool.clone(), notifier);
    order_ops
        .create_order(
            fixtures.customer_id,
            OrderRequest {
                restaurant_id: fixtures.restaurant_id,
                promo_id,
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

fn order_status_of(conn: &mut PgConnection, order_id_val: i32) -> OrderStatus {
    use dineease::db::schema::orders::dsl::*;
    orders
        .filter(order_id.eq(order_id_val))
        .select(status)
        .first(conn)
        .expect("order status")
}

fn payment_status_of(conn: &mut PgConnection, payment_id_val: i32) -> PaymentStatus {
    use dineease::db::schema::payments::dsl::*;
    payments
        .filter(payment_id.eq(payment_id_val))
        .select(payment_status)
        .first(conn)
        .expect("payment status")
}

fn promo_usage_count(conn: &mut PgConnection, promo_id_val: i32) -> i32 {
    use dineease::db::schema::promos::dsl::*;
    promos
        .filter(promo_id.eq(promo_id_val))
        .select(usage_count)
        .first(conn)
        .expect("promo usage count")
}

fn usage_status_of(conn: &mut PgConnection, promo_id_val: i32, customer_id_val: i32) -> PromoUsageStatus {
    use dineease::db::schema::promo_usages::dsl::*;
    promo_usages
        .filter(promo_id.eq(promo_id_val))
        .filter(customer_id.eq(customer_id_val))
        .select(status)
        .first(conn)
        .expect("promo usage status")
}

#[actix_rt::test]
async fn completed_payment_confirms_order_and_approves_promo() {
    let (pool, fixtures) = common::setup_pool_with_fixtures();
    let mut conn = DbConnection::new(&pool).expect("db connection");

    let promo_id_val = insert_promo(
        conn.connection(),
        Some(fixtures.restaurant_id),
        DiscountKind::Fixed,
        500,
        Some(5),
    )
    .expect("insert promo");

    let registry = Arc::new(ChannelRegistry::default());
    let mut rx = registry.subscribe(&customer_topic(fixtures.customer_id));
    let (order_id_val, payment_id_val) = place_order(
        &pool,
        registry.clone(),
        &fixtures,
        "pi_confirm_1",
        Some(promo_id_val),
    );

    let order_ops = OrderOperations::new(pool.clone(), registry.clone());
    let order = order_ops
        .update_payment_status(payment_id_val, PaymentStatus::Completed)
        .expect("update payment status");

    assert_eq!(order.status, OrderStatus::Confirmed);
    assert_eq!(payment_status_of(conn.connection(), payment_id_val), PaymentStatus::Completed);
    assert_eq!(
        usage_status_of(conn.connection(), promo_id_val, fixtures.customer_id),
        PromoUsageStatus::Approved
    );
    assert_eq!(promo_usage_count(conn.connection(), promo_id_val), 1);

    let raw = rx.try_recv().expect("payment event");
    let event: serde_json::Value = serde_json::from_str(&raw).expect("valid json");
    assert_eq!(event["type"], "payment_status");
    assert_eq!(event["order_id"], order_id_val);
    assert_eq!(event["payment_status"], "completed");
}

#[actix_rt::test]
async fn failed_payment_cancels_order_and_rejects_promo() {
    let (pool, fixtures) = common::setup_pool_with_fixtures();
    let mut conn = DbConnection::new(&pool).expect("db connection");

    let promo_id_val = insert_promo(
        conn.connection(),
        Some(fixtures.restaurant_id),
        DiscountKind::Fixed,
        500,
        Some(5),
    )
    .expect("insert promo");

    let (order_id_val, payment_id_val) = place_order(
        &pool,
        Arc::new(NoopNotifier),
        &fixtures,
        "pi_fail_1",
        Some(promo_id_val),
    );

    let order_ops = OrderOperations::new(pool.clone(), Arc::new(NoopNotifier));
    order_ops
        .update_payment_status(payment_id_val, PaymentStatus::Failed)
        .expect("update payment status");

    assert_eq!(order_status_of(conn.connection(), order_id_val), OrderStatus::Cancelled);
    assert_eq!(payment_status_of(conn.connection(), payment_id_val), PaymentStatus::Failed);
    assert_eq!(
        usage_status_of(conn.connection(), promo_id_val, fixtures.customer_id),
        PromoUsageStatus::Rejected
    );
    assert_eq!(promo_usage_count(conn.connection(), promo_id_val), 0);
}

#[actix_rt::test]
async fn repeated_status_update_is_a_no_op() {
    let (pool, fixtures) = common::setup_pool_with_fixtures();
    let mut conn = DbConnection::new(&pool).expect("db connection");

    let registry = Arc::new(ChannelRegistry::default());
    let (order_id_val, payment_id_val) =
        place_order(&pool, registry.clone(), &fixtures, "pi_idem_1", None);

    let mut rx = registry.subscribe(&customer_topic(fixtures.customer_id));
    let order_ops = OrderOperations::new(pool.clone(), registry.clone());
    order_ops
        .update_payment_status(payment_id_val, PaymentStatus::Completed)
        .expect("first update");
    rx.try_recv().expect("event from first update");

    // Replaying the same transition must not fail, touch rows, or re-notify.
    let order = order_ops
        .update_payment_status(payment_id_val, PaymentStatus::Completed)
        .expect("replayed update");
    assert_eq!(order.status, OrderStatus::Confirmed);
    assert_eq!(order_status_of(conn.connection(), order_id_val), OrderStatus::Confirmed);
    assert!(rx.try_recv().is_err());
}

#[actix_rt::test]
async fn refunded_payment_records_full_refund_without_touching_order() {
    let (pool, fixtures) = common::setup_pool_with_fixtures();
    let mut conn = DbConnection::new(&pool).expect("db connection");

    let (order_id_val, payment_id_val) =
        place_order(&pool, Arc::new(NoopNotifier), &fixtures, "pi_refund_1", None);

    let order_ops = OrderOperations::new(pool.clone(), Arc::new(NoopNotifier));
    order_ops
        .update_payment_status(payment_id_val, PaymentStatus::Completed)
        .expect("complete payment");
    order_ops
        .update_payment_status(payment_id_val, PaymentStatus::Refunded)
        .expect("refund payment");

    assert_eq!(payment_status_of(conn.connection(), payment_id_val), PaymentStatus::Refunded);
    assert_eq!(order_status_of(conn.connection(), order_id_val), OrderStatus::Confirmed);

    use dineease::db::schema::payments::dsl::*;
    let refund = payments
        .filter(payment_id.eq(payment_id_val))
        .select(refund_status)
        .first::<RefundStatus>(conn.connection())
        .expect("refund status");
    assert_eq!(refund, RefundStatus::Full);
}

#[actix_rt::test]
async fn approval_losing_the_usage_limit_race_still_confirms_the_order() {
    let (pool, fixtures) = common::setup_pool_with_fixtures();
    let mut conn = DbConnection::new(&pool).expect("db connection");

    let promo_id_val = insert_promo(
        conn.connection(),
        Some(fixtures.restaurant_id),
        DiscountKind::Fixed,
        500,
        Some(1),
    )
    .expect("insert promo");

    let (order_id_val, payment_id_val) = place_order(
        &pool,
        Arc::new(NoopNotifier),
        &fixtures,
        "pi_race_1",
        Some(promo_id_val),
    );

    // Another customer exhausts the limit while this payment is in flight.
    use dineease::db::schema::promos::dsl as promos_dsl;
    diesel::update(promos_dsl::promos.filter(promos_dsl::promo_id.eq(promo_id_val)))
        .set(promos_dsl::usage_count.eq(1))
        .execute(conn.connection())
        .expect("exhaust promo");

    let order_ops = OrderOperations::new(pool.clone(), Arc::new(NoopNotifier));
    order_ops
        .update_payment_status(payment_id_val, PaymentStatus::Completed)
        .expect("update payment status");

    assert_eq!(order_status_of(conn.connection(), order_id_val), OrderStatus::Confirmed);
    assert_eq!(
        usage_status_of(conn.connection(), promo_id_val, fixtures.customer_id),
        PromoUsageStatus::Rejected
    );
    assert_eq!(promo_usage_count(conn.connection(), promo_id_val), 1);
}

#[actix_rt::test]
async fn unknown_payment_is_not_found() {
    let (pool, _fixtures) = common::setup_pool_with_fixtures();

    let order_ops = OrderOperations::new(pool.clone(), Arc::new(NoopNotifier));
    let err = order_ops
        .update_payment_status(987654, PaymentStatus::Completed)
        .expect_err("unknown payment must fail");
    assert!(matches!(err, RepositoryError::NotFound(_)));
}

#[actix_rt::test]
async fn payment_lookups_by_id_and_transaction_id() {
    let (pool, fixtures) = common::setup_pool_with_fixtures();

    let (order_id_val, payment_id_val) =
        place_order(&pool, Arc::new(NoopNotifier), &fixtures, "pi_lookup_1", None);

    let payment_ops = PaymentOperations::new(pool.clone());
    let by_id = payment_ops.get_payment(payment_id_val).expect("payment by id");
    assert_eq!(by_id.order_id, order_id_val);
    assert_eq!(by_id.transaction_id, "pi_lookup_1");

    let by_txn = payment_ops
        .get_payment_by_transaction_id("pi_lookup_1")
        .expect("payment by transaction id");
    assert_eq!(by_txn.payment_id, payment_id_val);

    let for_order = payment_ops
        .get_payment_for_order(order_id_val)
        .expect("payment by order id");
    assert_eq!(for_order.payment_id, payment_id_val);

    let err = payment_ops
        .get_payment_by_transaction_id("pi_missing")
        .expect_err("missing transaction id");
    assert!(matches!(err, RepositoryError::NotFound(_)));
}
