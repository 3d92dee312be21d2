use crate::db::{establish_connection_pool, run_db_migrations, DbConnection, RepositoryError};
use crate::models::core::NewPromo;
use crate::models::statuses::{DiscountKind, PromoStatus};
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::PgConnection;
use std::sync::Once;

// Fixture strategy:
// - Build users/restaurants/menus/promos via the helpers below.
// - Fixed webhook secret so API tests can sign payloads themselves.
pub const TEST_STRIPE_WEBHOOK_SECRET: &str = "whsec_test-secret";
static TEST_THREADS_GUARD: Once = Once::new();

fn ensure_single_threaded_tests() {
    TEST_THREADS_GUARD.call_once(|| {
        let threads = test_threads_from_args().or_else(|| std::env::var("RUST_TEST_THREADS").ok());
        if threads.as_deref() != Some("1") {
            panic!(
                "Tests must run with --test-threads=1 or RUST_TEST_THREADS=1 because init_test_env mutates environment variables."
            );
        }
    });
}

fn test_threads_from_args() -> Option<String> {
    let mut args = std::env::args();
    while let Some(arg) = args.next() {
        if arg == "--test-threads" {
            return args.next();
        }
        if let Some(value) = arg.strip_prefix("--test-threads=") {
            return Some(value.to_string());
        }
    }
    None
}

fn set_env_if_unset(key: &str, value: &str) {
    if std::env::var_os(key).is_none() {
        std::env::set_var(key, value);
    }
}

pub fn init_test_env() {
    ensure_single_threaded_tests();
    set_env_if_unset("STRIPE_WEBHOOK_SECRET", TEST_STRIPE_WEBHOOK_SECRET);
}

pub fn build_test_pool(database_url: &str) -> Pool<ConnectionManager<PgConnection>> {
    let pool = establish_connection_pool(database_url);
    run_db_migrations(pool.clone()).expect("Unable to run migrations");
    pool
}

pub fn reset_db(pool: &Pool<ConnectionManager<PgConnection>>) -> Result<(), RepositoryError> {
    let mut conn = DbConnection::new(pool)?;
    diesel::sql_query(
        "TRUNCATE TABLE payments, order_items, orders, promo_usages, promos, \
         addon_options, addon_categories, menus, restaurants, users RESTART IDENTITY CASCADE",
    )
    .execute(conn.connection())
    .map_err(RepositoryError::DatabaseError)?;
    Ok(())
}

pub struct TestFixtures {
    pub customer_id: i32,
    pub staff_id: i32,
    pub restaurant_id: i32,
    pub menu_ids: Vec<i32>,
}

pub fn seed_basic_fixtures(
    pool: &Pool<ConnectionManager<PgConnection>>,
) -> Result<TestFixtures, RepositoryError> {
    let mut conn = DbConnection::new(pool)?;

    let staff_id = insert_user(conn.connection(), "Owner One", "owner1@example.com", true)?;
    let customer_id = insert_user(conn.connection(), "User One", "user1@example.com", false)?;
    let restaurant_id = insert_restaurant(conn.connection(), "Test Bistro", staff_id)?;
    let pasta_id = insert_menu_item(conn.connection(), restaurant_id, "Pasta Primavera", 2000)?;
    let wrap_id = insert_menu_item(conn.connection(), restaurant_id, "Chicken Wrap", 1500)?;

    Ok(TestFixtures {
        customer_id,
        staff_id,
        restaurant_id,
        menu_ids: vec![pasta_id, wrap_id],
    })
}

pub fn insert_user(
    conn: &mut PgConnection,
    name_val: &str,
    email_val: &str,
    is_staff_val: bool,
) -> Result<i32, RepositoryError> {
    use crate::db::schema::users::dsl::*;

    diesel::insert_into(users)
        .values((
            name.eq(name_val),
            email.eq(email_val),
            is_staff.eq(is_staff_val),
        ))
        .returning(user_id)
        .get_result(conn)
        .map_err(RepositoryError::DatabaseError)
}

pub fn insert_restaurant(
    conn: &mut PgConnection,
    name_val: &str,
    owner_id_val: i32,
) -> Result<i32, RepositoryError> {
    use crate::db::schema::restaurants::dsl::*;

    diesel::insert_into(restaurants)
        .values((name.eq(name_val), owner_id.eq(owner_id_val)))
        .returning(restaurant_id)
        .get_result(conn)
        .map_err(RepositoryError::DatabaseError)
}

pub fn insert_menu_item(
    conn: &mut PgConnection,
    restaurant_id_val: i32,
    name_val: &str,
    cost_cents_val: i64,
) -> Result<i32, RepositoryError> {
    use crate::db::schema::menus::dsl::*;

    diesel::insert_into(menus)
        .values((
            restaurant_id.eq(restaurant_id_val),
            name.eq(name_val),
            cost_cents.eq(cost_cents_val),
        ))
        .returning(menu_id)
        .get_result(conn)
        .map_err(RepositoryError::DatabaseError)
}

pub fn insert_addon_category(
    conn: &mut PgConnection,
    menu_id_val: i32,
    name_val: &str,
    max_selections_val: i32,
) -> Result<i32, RepositoryError> {
    use crate::db::schema::addon_categories::dsl::*;

    diesel::insert_into(addon_categories)
        .values((
            menu_id.eq(menu_id_val),
            name.eq(name_val),
            max_selections.eq(max_selections_val),
        ))
        .returning(addon_category_id)
        .get_result(conn)
        .map_err(RepositoryError::DatabaseError)
}

pub fn insert_addon_option(
    conn: &mut PgConnection,
    addon_category_id_val: i32,
    name_val: &str,
    price_cents_val: i64,
) -> Result<i32, RepositoryError> {
    use crate::db::schema::addon_options::dsl::*;

    diesel::insert_into(addon_options)
        .values((
            addon_category_id.eq(addon_category_id_val),
            name.eq(name_val),
            price_cents.eq(price_cents_val),
        ))
        .returning(addon_option_id)
        .get_result(conn)
        .map_err(RepositoryError::DatabaseError)
}

pub fn insert_promo(
    conn: &mut PgConnection,
    restaurant_id_val: Option<i32>,
    discount_kind_val: DiscountKind,
    discount_value_val: i64,
    usage_limit_val: Option<i32>,
) -> Result<i32, RepositoryError> {
    use crate::db::schema::promos::dsl::*;

    diesel::insert_into(promos)
        .values(&NewPromo {
            restaurant_id: restaurant_id_val,
            menu_id: None,
            name: "Test promo".to_string(),
            description: None,
            discount_value: discount_value_val,
            discount_kind: discount_kind_val,
            usage_limit: usage_limit_val,
            status: PromoStatus::Active,
            code: None,
        })
        .returning(promo_id)
        .get_result(conn)
        .map_err(RepositoryError::DatabaseError)
}
