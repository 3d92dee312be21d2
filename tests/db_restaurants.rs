mod common;

use dineease::db::{DbConnection, RepositoryError, RestaurantOperations};
use dineease::test_utils::{insert_addon_category, insert_addon_option, insert_menu_item};

#[actix_rt::test]
async fn listing_and_lookup_return_seeded_restaurant() {
    let (pool, fixtures) = common::setup_pool_with_fixtures();

    let ops = RestaurantOperations::new(pool.clone());
    let all = ops.get_all_restaurants().expect("list restaurants");
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].name, "Test Bistro");

    let one = ops.get_restaurant(fixtures.restaurant_id).expect("get restaurant");
    assert_eq!(one.restaurant_id, fixtures.restaurant_id);

    let err = ops.get_restaurant(9999).expect_err("unknown restaurant");
    assert!(matches!(err, RepositoryError::NotFound(_)));
}

#[actix_rt::test]
async fn menu_listing_is_scoped_to_the_restaurant() {
    let (pool, fixtures) = common::setup_pool_with_fixtures();

    let ops = RestaurantOperations::new(pool.clone());
    let menu = ops
        .get_menu_for_restaurant(fixtures.restaurant_id)
        .expect("menu");
    assert_eq!(menu.len(), 2);
    assert!(menu.iter().any(|m| m.name == "Pasta Primavera"));
    assert!(menu.iter().any(|m| m.name == "Chicken Wrap"));
}

#[actix_rt::test]
async fn addons_come_back_grouped_by_category() {
    let (pool, fixtures) = common::setup_pool_with_fixtures();
    let mut conn = DbConnection::new(&pool).expect("db connection");

    let pasta = fixtures.menu_ids[0];
    let sauces = insert_addon_category(conn.connection(), pasta, "Sauce", 1).expect("category");
    insert_addon_option(conn.connection(), sauces, "Pesto", 150).expect("option");
    insert_addon_option(conn.connection(), sauces, "Arrabbiata", 100).expect("option");
    let extras = insert_addon_category(conn.connection(), pasta, "Extras", 3).expect("category");
    insert_addon_option(conn.connection(), extras, "Parmesan", 200).expect("option");

    // Addons on another menu item must not bleed in.
    let other = insert_menu_item(conn.connection(), fixtures.restaurant_id, "Soup", 800)
        .expect("menu item");
    let other_cat = insert_addon_category(conn.connection(), other, "Bread", 1).expect("category");
    insert_addon_option(conn.connection(), other_cat, "Baguette", 100).expect("option");

    let ops = RestaurantOperations::new(pool.clone());
    let groups = ops.get_addons_for_menu(pasta).expect("addons");
    assert_eq!(groups.len(), 2);

    let (sauce_cat, sauce_opts) = groups
        .iter()
        .find(|(c, _)| c.name == "Sauce")
        .expect("sauce group");
    assert_eq!(sauce_cat.max_selections, 1);
    assert_eq!(sauce_opts.len(), 2);

    let (_, extra_opts) = groups
        .iter()
        .find(|(c, _)| c.name == "Extras")
        .expect("extras group");
    assert_eq!(extra_opts.len(), 1);
    assert_eq!(extra_opts[0].price_cents, 200);

    let empty = ops.get_addons_for_menu(fixtures.menu_ids[1]).expect("no addons");
    assert!(empty.is_empty());
}
