use crate::db::{promos, DbConnection, RepositoryError};
use crate::enums::orders::{OrderAction, OrderRequest};
use crate::gateway::map_gateway_status;
use crate::models::core::MenuItemCheck;
use crate::models::payments::{NewOrder, NewOrderItem, NewPayment, Order, OrderItem, Payment};
use crate::models::statuses::{OrderStatus, PaymentStatus, RefundStatus};
use crate::notify::{customer_topic, restaurant_topic, Notifier, OrderEvent};
use chrono::Utc;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::{DatabaseErrorKind, Error};
use diesel::PgConnection;
use log::{debug, error};
use std::collections::HashMap;
use std::sync::Arc;

/// Order workflow coordinator. Each mutating operation runs as a single
/// transaction over Order, OrderItem, Payment and PromoUsage rows;
/// notifications are published only after the transaction commits.
#[derive(Clone)]
pub struct OrderOperations {
    pool: Pool<ConnectionManager<PgConnection>>,
    notifier: Arc<dyn Notifier>,
}

struct PaymentOutcome {
    order: Order,
    payment_id: i32,
    changed: bool,
}

impl OrderOperations {
    pub fn new(pool: Pool<ConnectionManager<PgConnection>>, notifier: Arc<dyn Notifier>) -> Self {
        Self { pool, notifier }
    }

    /// Create an order with its line items, payment record and (optionally) a
    /// pending promo usage, all-or-nothing. Returns (order_id, payment_id).
    pub fn create_order(
        &self,
        customer_id_val: i32,
        req: OrderRequest,
    ) -> Result<(i32, i32), RepositoryError> {
        let mut conn = DbConnection::new(&self.pool).map_err(|e| {
            error!("create_order: failed to acquire DB connection: {}", e);
            e
        })?;

        if req.menu_items.is_empty() {
            return Err(RepositoryError::ValidationError(format!(
                "Order is empty for customer: {}",
                customer_id_val
            )));
        }
        for item in &req.menu_items {
            if item.quantity < 1 {
                return Err(RepositoryError::ValidationError(format!(
                    "Invalid quantity {} for menu item {}",
                    item.quantity, item.menu_item_id
                )));
            }
        }

        let initial_payment_status =
            map_gateway_status(&req.payment.payment_status).ok_or_else(|| {
                RepositoryError::ValidationError(format!(
                    "Unknown gateway payment status: {}",
                    req.payment.payment_status
                ))
            })?;

        let mut new_order_event: Option<OrderEvent> = None;
        let restaurant_id_val = req.restaurant_id;

        let result = conn.connection().transaction(|conn| {
            let customer_name: String = {
                use crate::db::schema::users::dsl::*;
                users
                    .filter(user_id.eq(customer_id_val))
                    .select(name)
                    .first::<String>(conn)
                    .map_err(|e| match e {
                        Error::NotFound => RepositoryError::NotFound(format!(
                            "users: {}",
                            customer_id_val
                        )),
                        other => RepositoryError::DatabaseError(other),
                    })?
            };

            {
                use crate::db::schema::restaurants::dsl::*;
                restaurants
                    .filter(restaurant_id.eq(restaurant_id_val))
                    .select(restaurant_id)
                    .first::<i32>(conn)
                    .map_err(|e| match e {
                        Error::NotFound => RepositoryError::NotFound(format!(
                            "restaurants: {}",
                            restaurant_id_val
                        )),
                        other => RepositoryError::DatabaseError(other),
                    })?;
            }

            // Snapshot current menu prices; later menu edits must not affect
            // this order.
            let menu_item_ids: Vec<i32> =
                req.menu_items.iter().map(|i| i.menu_item_id).collect();
            let menu_rows: Vec<MenuItemCheck> = {
                use crate::db::schema::menus::dsl::*;
                menus
                    .filter(menu_id.eq_any(&menu_item_ids))
                    .select(MenuItemCheck::as_select())
                    .load::<MenuItemCheck>(conn)
                    .map_err(RepositoryError::DatabaseError)?
            };
            let price_by_menu: HashMap<i32, &MenuItemCheck> =
                menu_rows.iter().map(|m| (m.menu_id, m)).collect();

            for item in &req.menu_items {
                let menu_row =
                    price_by_menu.get(&item.menu_item_id).ok_or_else(|| {
                        RepositoryError::NotFound(format!(
                            "menus: no menu item matched for {}",
                            item.menu_item_id
                        ))
                    })?;
                if menu_row.restaurant_id != restaurant_id_val {
                    return Err(RepositoryError::ValidationError(format!(
                        "Order contains items from another restaurant: menu item {} for customer {}",
                        item.menu_item_id, customer_id_val
                    )));
                }
            }

            // Validate the promo and record the pending attempt before any
            // order rows exist, so a conflict aborts the whole creation.
            let promo = match req.promo_id {
                Some(promo_id_val) => {
                    let promo = promos::find_promo(conn, promo_id_val)?;
                    if !promo.can_be_used() {
                        return Err(RepositoryError::Conflict(format!(
                            "Promo {} cannot be used",
                            promo_id_val
                        )));
                    }
                    promos::record_attempt(conn, promo_id_val, customer_id_val)?;
                    Some(promo)
                }
                None => None,
            };

            let items_subtotal: i64 = req
                .menu_items
                .iter()
                .map(|i| price_by_menu[&i.menu_item_id].cost_cents * i.quantity as i64)
                .sum();
            let discounted_subtotal = match &promo {
                Some(p) => p.discounted_total(items_subtotal),
                None => items_subtotal,
            };
            let order_total = discounted_subtotal + req.tax_cents + req.tip_cents;

            let inserted_order: Order = {
                use crate::db::schema::orders::dsl::*;
                diesel::insert_into(orders)
                    .values(&NewOrder {
                        customer_id: customer_id_val,
                        restaurant_id: restaurant_id_val,
                        promo_id: req.promo_id,
                        order_total_cents: order_total,
                        status: OrderStatus::Pending,
                        order_type: req.order_type,
                        is_delivery: req.is_delivery,
                        delivery_address: req.delivery_address.clone(),
                        special_instructions: req.special_instructions.clone(),
                        tax_cents: req.tax_cents,
                        tip_cents: req.tip_cents,
                    })
                    .returning(Order::as_returning())
                    .get_result::<Order>(conn)
                    .map_err(RepositoryError::DatabaseError)?
            };

            let new_items: Vec<NewOrderItem> = req
                .menu_items
                .iter()
                .map(|item| NewOrderItem {
                    order_id: inserted_order.order_id,
                    menu_id: item.menu_item_id,
                    quantity: item.quantity,
                    price_cents: price_by_menu[&item.menu_item_id].cost_cents,
                    special_instructions: item.special_instructions.clone(),
                })
                .collect();
            {
                use crate::db::schema::order_items::dsl::*;
                diesel::insert_into(order_items)
                    .values(&new_items)
                    .execute(conn)
                    .map_err(RepositoryError::DatabaseError)?;
            }

            let inserted_payment_id: i32 = {
                use crate::db::schema::payments::dsl::*;
                diesel::insert_into(payments)
                    .values(&NewPayment {
                        order_id: inserted_order.order_id,
                        payment_method: req.payment.payment_method,
                        payment_status: initial_payment_status,
                        payment_gateway: req.payment.payment_gateway,
                        transaction_id: req.payment.transaction_id.clone(),
                        amount_paid_cents: req.payment.amount_paid_cents,
                    })
                    .returning(payment_id)
                    .get_result::<i32>(conn)
                    .map_err(|e| match e {
                        Error::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                            RepositoryError::Conflict(format!(
                                "Transaction id already recorded: {}",
                                req.payment.transaction_id
                            ))
                        }
                        other => RepositoryError::DatabaseError(other),
                    })?
            };

            new_order_event = Some(OrderEvent::NewOrder {
                order_id: inserted_order.order_id,
                status: inserted_order.status.to_string(),
                customer_name,
                order_total_cents: inserted_order.order_total_cents,
                created_at: inserted_order.created_at,
            });

            Ok((inserted_order.order_id, inserted_payment_id))
        })?;

        if let Some(event) = new_order_event {
            self.notifier
                .publish(&restaurant_topic(restaurant_id_val), &event);
        }
        debug!(
            "create_order: order {} payment {} created for customer {}",
            result.0, result.1, customer_id_val
        );
        Ok(result)
    }

    /// Apply a gateway- or admin-reported payment status. Reapplying the
    /// current status is a no-op, which makes webhook replays safe.
    pub fn update_payment_status(
        &self,
        search_payment_id: i32,
        new_status: PaymentStatus,
    ) -> Result<Order, RepositoryError> {
        let mut conn = DbConnection::new(&self.pool).map_err(|e| {
            error!(
                "update_payment_status: failed to acquire DB connection for payment_id {}: {}",
                search_payment_id, e
            );
            e
        })?;

        let outcome = conn
            .connection()
            .transaction::<PaymentOutcome, RepositoryError, _>(|conn| {
                let payment: Payment = {
                    use crate::db::schema::payments::dsl::*;
                    payments
                        .filter(payment_id.eq(search_payment_id))
                        .for_update()
                        .select(Payment::as_select())
                        .first::<Payment>(conn)
                        .map_err(|e| match e {
                            Error::NotFound => RepositoryError::NotFound(format!(
                                "payments: {}",
                                search_payment_id
                            )),
                            other => RepositoryError::DatabaseError(other),
                        })?
                };

                let order = load_order_for_update(conn, payment.order_id)?;

                if payment.payment_status == new_status {
                    debug!(
                        "update_payment_status: payment {} already {}, no-op",
                        search_payment_id, new_status
                    );
                    return Ok(PaymentOutcome {
                        order,
                        payment_id: payment.payment_id,
                        changed: false,
                    });
                }

                {
                    use crate::db::schema::payments::dsl::*;
                    let refund = if new_status == PaymentStatus::Refunded {
                        RefundStatus::Full
                    } else {
                        payment.refund_status
                    };
                    diesel::update(payments.filter(payment_id.eq(search_payment_id)))
                        .set((
                            payment_status.eq(new_status),
                            refund_status.eq(refund),
                            updated_at.eq(Utc::now()),
                        ))
                        .execute(conn)
                        .map_err(RepositoryError::DatabaseError)?;
                }

                let order = match new_status {
                    PaymentStatus::Completed => {
                        if let Some(promo_id_val) = order.promo_id {
                            promos::approve_usage(conn, promo_id_val, order.customer_id)?;
                        }
                        set_order_status(conn, order, OrderStatus::Confirmed)?
                    }
                    PaymentStatus::Failed => {
                        if let Some(promo_id_val) = order.promo_id {
                            promos::reject_usage(conn, promo_id_val, order.customer_id)?;
                        }
                        set_order_status(conn, order, OrderStatus::Cancelled)?
                    }
                    // Pending / refunded touch the payment only.
                    PaymentStatus::Pending | PaymentStatus::Refunded => order,
                };

                Ok(PaymentOutcome {
                    order,
                    payment_id: payment.payment_id,
                    changed: true,
                })
            })?;

        if outcome.changed {
            self.notifier.publish(
                &customer_topic(outcome.order.customer_id),
                &OrderEvent::PaymentStatus {
                    order_id: outcome.order.order_id,
                    payment_id: outcome.payment_id,
                    payment_status: new_status.to_string(),
                    message: match new_status {
                        PaymentStatus::Completed => "Payment approved and order confirmed",
                        PaymentStatus::Failed => "Payment failed and order cancelled",
                        _ => "Payment status updated",
                    }
                    .to_string(),
                },
            );
        }
        Ok(outcome.order)
    }

    /// Apply an admin accept/reject/complete decision.
    pub fn update_order_status(
        &self,
        search_order_id: i32,
        action: OrderAction,
    ) -> Result<Order, RepositoryError> {
        let mut conn = DbConnection::new(&self.pool).map_err(|e| {
            error!(
                "update_order_status: failed to acquire DB connection for order_id {}: {}",
                search_order_id, e
            );
            e
        })?;

        let order = conn.connection().transaction(|conn| {
            let order = load_order_for_update(conn, search_order_id)?;

            // A pending order with a payment on record may only be accepted
            // once that payment has completed.
            if action == OrderAction::Accept && order.status == OrderStatus::Pending {
                use crate::db::schema::payments::dsl::*;
                let payment_state = payments
                    .filter(order_id.eq(order.order_id))
                    .select(payment_status)
                    .first::<PaymentStatus>(conn)
                    .optional()
                    .map_err(RepositoryError::DatabaseError)?;
                if let Some(state) = payment_state {
                    if state != PaymentStatus::Completed {
                        return Err(RepositoryError::Conflict(format!(
                            "Cannot accept order {}. Payment is not approved.",
                            order.order_id
                        )));
                    }
                }
            }

            let target = match action {
                OrderAction::Accept => OrderStatus::Confirmed,
                OrderAction::Reject => OrderStatus::Cancelled,
                OrderAction::Complete => OrderStatus::Completed,
            };

            set_order_status(conn, order, target)
        })?;

        self.notifier.publish(
            &customer_topic(order.customer_id),
            &OrderEvent::OrderStatus {
                order_id: order.order_id,
                status: order.status.to_string(),
                message: action.customer_message().to_string(),
            },
        );
        Ok(order)
    }

    pub fn get_order_with_items(
        &self,
        search_order_id: i32,
    ) -> Result<(Order, Vec<OrderItem>), RepositoryError> {
        let mut conn = DbConnection::new(&self.pool).map_err(|e| {
            error!(
                "get_order_with_items: failed to acquire DB connection for order_id {}: {}",
                search_order_id, e
            );
            e
        })?;

        let order: Order = {
            use crate::db::schema::orders::dsl::*;
            orders
                .filter(order_id.eq(search_order_id))
                .select(Order::as_select())
                .first::<Order>(conn.connection())
                .map_err(|e| match e {
                    Error::NotFound => {
                        RepositoryError::NotFound(format!("orders: {}", search_order_id))
                    }
                    other => RepositoryError::DatabaseError(other),
                })?
        };

        let items: Vec<OrderItem> = {
            use crate::db::schema::order_items::dsl::*;
            order_items
                .filter(order_id.eq(search_order_id))
                .select(OrderItem::as_select())
                .load::<OrderItem>(conn.connection())
                .map_err(RepositoryError::DatabaseError)?
        };

        Ok((order, items))
    }

    pub fn get_orders_by_customer(
        &self,
        search_customer_id: i32,
    ) -> Result<Vec<Order>, RepositoryError> {
        let mut conn = DbConnection::new(&self.pool).map_err(|e| {
            error!(
                "get_orders_by_customer: failed to acquire DB connection for customer_id {}: {}",
                search_customer_id, e
            );
            e
        })?;

        use crate::db::schema::orders::dsl::*;
        orders
            .filter(customer_id.eq(search_customer_id))
            .order_by(created_at.desc())
            .select(Order::as_select())
            .load::<Order>(conn.connection())
            .map_err(|e| {
                error!(
                    "get_orders_by_customer: error loading orders for customer_id {}: {}",
                    search_customer_id, e
                );
                RepositoryError::DatabaseError(e)
            })
    }

    /// Orders a restaurant still has in flight (not completed or cancelled).
    pub fn get_active_orders_for_restaurant(
        &self,
        search_restaurant_id: i32,
    ) -> Result<Vec<Order>, RepositoryError> {
        let mut conn = DbConnection::new(&self.pool).map_err(|e| {
            error!(
                "get_active_orders_for_restaurant: failed to acquire DB connection for restaurant_id {}: {}",
                search_restaurant_id, e
            );
            e
        })?;

        use crate::db::schema::orders::dsl::*;
        orders
            .filter(restaurant_id.eq(search_restaurant_id))
            .filter(status.ne_all(vec![OrderStatus::Completed, OrderStatus::Cancelled]))
            .order_by(created_at.desc())
            .select(Order::as_select())
            .load::<Order>(conn.connection())
            .map_err(RepositoryError::DatabaseError)
    }
}

fn load_order_for_update(
    conn: &mut PgConnection,
    search_order_id: i32,
) -> Result<Order, RepositoryError> {
    use crate::db::schema::orders::dsl::*;
    orders
        .filter(order_id.eq(search_order_id))
        .for_update()
        .select(Order::as_select())
        .first::<Order>(conn)
        .map_err(|e| match e {
            Error::NotFound => RepositoryError::NotFound(format!("orders: {}", search_order_id)),
            other => RepositoryError::DatabaseError(other),
        })
}

/// Transition an order through the state machine, persisting the new status.
/// Illegal transitions are a conflict; the row is untouched.
fn set_order_status(
    conn: &mut PgConnection,
    order: Order,
    target: OrderStatus,
) -> Result<Order, RepositoryError> {
    if order.status == target {
        return Ok(order);
    }
    if !order.status.can_transition_to(target) {
        return Err(RepositoryError::Conflict(format!(
            "Order {} cannot move from {} to {}",
            order.order_id, order.status, target
        )));
    }

    use crate::db::schema::orders::dsl::*;
    diesel::update(orders.filter(order_id.eq(order.order_id)))
        .set((status.eq(target), updated_at.eq(Utc::now())))
        .returning(Order::as_returning())
        .get_result::<Order>(conn)
        .map_err(RepositoryError::DatabaseError)
}
