use crate::db::{DbConnection, RepositoryError};
use crate::models::payments::Payment;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::Error;
use diesel::PgConnection;
use log::error;

/// Read access to payment records. Mutation goes through the order workflow
/// so that Order, Payment and PromoUsage can't drift apart.
#[derive(Clone)]
pub struct PaymentOperations {
    pool: Pool<ConnectionManager<PgConnection>>,
}

impl PaymentOperations {
    pub fn new(pool: Pool<ConnectionManager<PgConnection>>) -> Self {
        Self { pool }
    }

    pub fn get_payment(&self, search_payment_id: i32) -> Result<Payment, RepositoryError> {
        let mut conn = DbConnection::new(&self.pool).map_err(|e| {
            error!(
                "get_payment: failed to acquire DB connection for payment_id {}: {}",
                search_payment_id, e
            );
            e
        })?;

        use crate::db::schema::payments::dsl::*;
        payments
            .filter(payment_id.eq(search_payment_id))
            .select(Payment::as_select())
            .first::<Payment>(conn.connection())
            .map_err(|e| match e {
                Error::NotFound => {
                    RepositoryError::NotFound(format!("payments: {}", search_payment_id))
                }
                other => RepositoryError::DatabaseError(other),
            })
    }

    /// Webhook lookups key on the gateway transaction id, which is unique
    /// across all payments.
    pub fn get_payment_by_transaction_id(
        &self,
        search_transaction_id: &str,
    ) -> Result<Payment, RepositoryError> {
        let mut conn = DbConnection::new(&self.pool).map_err(|e| {
            error!(
                "get_payment_by_transaction_id: failed to acquire DB connection for '{}': {}",
                search_transaction_id, e
            );
            e
        })?;

        use crate::db::schema::payments::dsl::*;
        payments
            .filter(transaction_id.eq(search_transaction_id))
            .select(Payment::as_select())
            .first::<Payment>(conn.connection())
            .map_err(|e| match e {
                Error::NotFound => RepositoryError::NotFound(format!(
                    "payments: transaction {}",
                    search_transaction_id
                )),
                other => RepositoryError::DatabaseError(other),
            })
    }

    pub fn get_payment_for_order(
        &self,
        search_order_id: i32,
    ) -> Result<Payment, RepositoryError> {
        let mut conn = DbConnection::new(&self.pool).map_err(|e| {
            error!(
                "get_payment_for_order: failed to acquire DB connection for order_id {}: {}",
                search_order_id, e
            );
            e
        })?;

        use crate::db::schema::payments::dsl::*;
        payments
            .filter(order_id.eq(search_order_id))
            .select(Payment::as_select())
            .first::<Payment>(conn.connection())
            .map_err(|e| match e {
                Error::NotFound => RepositoryError::NotFound(format!(
                    "payments: no payment for order {}",
                    search_order_id
                )),
                other => RepositoryError::DatabaseError(other),
            })
    }
}
