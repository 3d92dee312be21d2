use crate::db::{DbConnection, RepositoryError};
use crate::models::core::Promo;
use crate::models::statuses::PromoUsageStatus;
use chrono::Utc;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::Error;
use diesel::PgConnection;
use log::{debug, error, warn};

/// Per-customer promo usage ledger.
///
/// The conn-level functions compose into the order workflow's transaction;
/// `approve_usage` is the only place `promos.usage_count` is mutated and it
/// holds a row lock on the promo while re-checking the limit.
#[derive(Clone)]
pub struct PromoOperations {
    pool: Pool<ConnectionManager<PgConnection>>,
}

pub fn find_promo(conn: &mut PgConnection, search_promo_id: i32) -> Result<Promo, RepositoryError> {
    use crate::db::schema::promos::dsl::*;
    promos
        .filter(promo_id.eq(search_promo_id))
        .select(Promo::as_select())
        .first::<Promo>(conn)
        .map_err(|e| match e {
            Error::NotFound => RepositoryError::NotFound(format!("promo: {}", search_promo_id)),
            other => RepositoryError::DatabaseError(other),
        })
}

/// Create or reuse the single lifetime usage row for (promo, customer).
///
/// A prior approved usage is a hard conflict. A prior rejected usage is not
/// terminal: the row flips back to pending for the new attempt.
pub fn record_attempt(
    conn: &mut PgConnection,
    attempt_promo_id: i32,
    attempt_customer_id: i32,
) -> Result<(), RepositoryError> {
    use crate::db::schema::promo_usages::dsl::*;

    let existing = promo_usages
        .filter(promo_id.eq(attempt_promo_id))
        .filter(customer_id.eq(attempt_customer_id))
        .select(status)
        .first::<PromoUsageStatus>(conn)
        .optional()
        .map_err(RepositoryError::DatabaseError)?;

    match existing {
        Some(PromoUsageStatus::Approved) => Err(RepositoryError::Conflict(format!(
            "Promo {} has already been used and approved by customer {}",
            attempt_promo_id, attempt_customer_id
        ))),
        Some(PromoUsageStatus::Pending) => Ok(()),
        Some(PromoUsageStatus::Rejected) => {
            diesel::update(
                promo_usages
                    .filter(promo_id.eq(attempt_promo_id))
                    .filter(customer_id.eq(attempt_customer_id)),
            )
            .set((status.eq(PromoUsageStatus::Pending), used_at.eq(Utc::now())))
            .execute(conn)
            .map_err(RepositoryError::DatabaseError)?;
            Ok(())
        }
        None => {
            diesel::insert_into(promo_usages)
                .values((
                    promo_id.eq(attempt_promo_id),
                    customer_id.eq(attempt_customer_id),
                    status.eq(PromoUsageStatus::Pending),
                ))
                .execute(conn)
                .map_err(RepositoryError::DatabaseError)?;
            Ok(())
        }
    }
}

/// Approve the pending usage and increment the promo's usage counter as one
/// critical section. The promo row is locked and the limit re-checked under
/// the lock, so concurrent approvals cannot overshoot `usage_limit`.
///
/// Returns false when the limit is already exhausted; the usage is marked
/// rejected instead and the caller proceeds without the promo.
pub fn approve_usage(
    conn: &mut PgConnection,
    target_promo_id: i32,
    target_customer_id: i32,
) -> Result<bool, RepositoryError> {
    let locked_promo = {
        use crate::db::schema::promos::dsl::*;
        promos
            .filter(promo_id.eq(target_promo_id))
            .for_update()
            .select(Promo::as_select())
            .first::<Promo>(conn)
            .map_err(|e| match e {
                Error::NotFound => {
                    RepositoryError::NotFound(format!("promo: {}", target_promo_id))
                }
                other => RepositoryError::DatabaseError(other),
            })?
    };

    use crate::db::schema::promo_usages::dsl::*;

    if !locked_promo.can_be_used() {
        warn!(
            "approve_usage: promo {} exhausted or inactive, rejecting usage for customer {}",
            target_promo_id, target_customer_id
        );
        diesel::update(
            promo_usages
                .filter(promo_id.eq(target_promo_id))
                .filter(customer_id.eq(target_customer_id))
                .filter(status.eq(PromoUsageStatus::Pending)),
        )
        .set(status.eq(PromoUsageStatus::Rejected))
        .execute(conn)
        .map_err(RepositoryError::DatabaseError)?;
        return Ok(false);
    }

    let updated = diesel::update(
        promo_usages
            .filter(promo_id.eq(target_promo_id))
            .filter(customer_id.eq(target_customer_id))
            .filter(status.eq(PromoUsageStatus::Pending)),
    )
    .set(status.eq(PromoUsageStatus::Approved))
    .execute(conn)
    .map_err(RepositoryError::DatabaseError)?;

    if updated == 0 {
        // Replayed approval: the usage may already be approved.
        let already_approved = promo_usages
            .filter(promo_id.eq(target_promo_id))
            .filter(customer_id.eq(target_customer_id))
            .filter(status.eq(PromoUsageStatus::Approved))
            .count()
            .get_result::<i64>(conn)
            .map_err(RepositoryError::DatabaseError)?;
        if already_approved > 0 {
            debug!(
                "approve_usage: usage for promo {} customer {} already approved",
                target_promo_id, target_customer_id
            );
            return Ok(true);
        }
        return Err(RepositoryError::NotFound(format!(
            "promo_usages: no pending usage for promo {} customer {}",
            target_promo_id, target_customer_id
        )));
    }

    {
        use crate::db::schema::promos::dsl::*;
        diesel::update(promos.filter(promo_id.eq(target_promo_id)))
            .set(usage_count.eq(usage_count + 1))
            .execute(conn)
            .map_err(RepositoryError::DatabaseError)?;
    }

    Ok(true)
}

/// Flip the pending usage to rejected. No usage_count change; missing pending
/// rows are a no-op so failed-payment replays stay idempotent.
pub fn reject_usage(
    conn: &mut PgConnection,
    target_promo_id: i32,
    target_customer_id: i32,
) -> Result<(), RepositoryError> {
    use crate::db::schema::promo_usages::dsl::*;

    let updated = diesel::update(
        promo_usages
            .filter(promo_id.eq(target_promo_id))
            .filter(customer_id.eq(target_customer_id))
            .filter(status.eq(PromoUsageStatus::Pending)),
    )
    .set(status.eq(PromoUsageStatus::Rejected))
    .execute(conn)
    .map_err(RepositoryError::DatabaseError)?;

    if updated == 0 {
        debug!(
            "reject_usage: no pending usage for promo {} customer {}",
            target_promo_id, target_customer_id
        );
    }
    Ok(())
}

impl PromoOperations {
    pub fn new(pool: Pool<ConnectionManager<PgConnection>>) -> Self {
        Self { pool }
    }

    pub fn get_promo(&self, search_promo_id: i32) -> Result<Promo, RepositoryError> {
        let mut conn = DbConnection::new(&self.pool).map_err(|e| {
            error!("get_promo: failed to acquire DB connection: {}", e);
            e
        })?;
        find_promo(conn.connection(), search_promo_id)
    }

    /// Promos advertised for a restaurant. When a customer id is given,
    /// promos that customer has already redeemed (approved usage) are
    /// filtered out, matching what the storefront shows.
    pub fn get_promos_for_restaurant(
        &self,
        search_restaurant_id: i32,
        for_customer_id: Option<i32>,
    ) -> Result<Vec<Promo>, RepositoryError> {
        let mut conn = DbConnection::new(&self.pool).map_err(|e| {
            error!(
                "get_promos_for_restaurant: failed to acquire DB connection for restaurant_id {}: {}",
                search_restaurant_id, e
            );
            e
        })?;

        use crate::db::schema::{promo_usages, promos};

        let mut all = promos::table
            .filter(
                promos::restaurant_id
                    .eq(search_restaurant_id)
                    .or(promos::restaurant_id.is_null()),
            )
            .select(Promo::as_select())
            .load::<Promo>(conn.connection())
            .map_err(|e| {
                error!(
                    "get_promos_for_restaurant: error loading promos for restaurant_id {}: {}",
                    search_restaurant_id, e
                );
                RepositoryError::DatabaseError(e)
            })?;

        if let Some(customer) = for_customer_id {
            let redeemed: Vec<i32> = promo_usages::table
                .filter(promo_usages::customer_id.eq(customer))
                .filter(promo_usages::status.eq(PromoUsageStatus::Approved))
                .select(promo_usages::promo_id)
                .load::<i32>(conn.connection())
                .map_err(RepositoryError::DatabaseError)?;
            all.retain(|p| !redeemed.contains(&p.promo_id));
        }

        Ok(all)
    }
}
