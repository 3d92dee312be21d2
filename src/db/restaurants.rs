use crate::db::{DbConnection, RepositoryError};
use crate::models::core::{AddonCategory, AddonOption, Menu, Restaurant};
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::Error;
use diesel::PgConnection;
use log::error;

/// Restaurant/menu read-model. CRUD and search live in the back-office
/// service; the ordering workflow only ever reads from here.
#[derive(Clone)]
pub struct RestaurantOperations {
    pool: Pool<ConnectionManager<PgConnection>>,
}

impl RestaurantOperations {
    pub fn new(pool: Pool<ConnectionManager<PgConnection>>) -> Self {
        Self { pool }
    }

    pub fn get_all_restaurants(&self) -> Result<Vec<Restaurant>, RepositoryError> {
        let mut conn = DbConnection::new(&self.pool).map_err(|e| {
            error!("get_all_restaurants: failed to acquire DB connection: {}", e);
            e
        })?;

        use crate::db::schema::restaurants::dsl::*;
        restaurants
            .order_by(restaurant_id.asc())
            .select(Restaurant::as_select())
            .load::<Restaurant>(conn.connection())
            .map_err(RepositoryError::DatabaseError)
    }

    pub fn get_restaurant(
        &self,
        search_restaurant_id: i32,
    ) -> Result<Restaurant, RepositoryError> {
        let mut conn = DbConnection::new(&self.pool).map_err(|e| {
            error!(
                "get_restaurant: failed to acquire DB connection for restaurant_id {}: {}",
                search_restaurant_id, e
            );
            e
        })?;

        use crate::db::schema::restaurants::dsl::*;
        restaurants
            .filter(restaurant_id.eq(search_restaurant_id))
            .select(Restaurant::as_select())
            .first::<Restaurant>(conn.connection())
            .map_err(|e| match e {
                Error::NotFound => RepositoryError::NotFound(format!(
                    "restaurants: {}",
                    search_restaurant_id
                )),
                other => RepositoryError::DatabaseError(other),
            })
    }

    pub fn get_menu_for_restaurant(
        &self,
        search_restaurant_id: i32,
    ) -> Result<Vec<Menu>, RepositoryError> {
        let mut conn = DbConnection::new(&self.pool).map_err(|e| {
            error!(
                "get_menu_for_restaurant: failed to acquire DB connection for restaurant_id {}: {}",
                search_restaurant_id, e
            );
            e
        })?;

        use crate::db::schema::menus::dsl::*;
        menus
            .filter(restaurant_id.eq(search_restaurant_id))
            .order_by(menu_id.asc())
            .select(Menu::as_select())
            .load::<Menu>(conn.connection())
            .map_err(RepositoryError::DatabaseError)
    }

    /// Addon option groups for one menu item, options included.
    pub fn get_addons_for_menu(
        &self,
        search_menu_id: i32,
    ) -> Result<Vec<(AddonCategory, Vec<AddonOption>)>, RepositoryError> {
        let mut conn = DbConnection::new(&self.pool).map_err(|e| {
            error!(
                "get_addons_for_menu: failed to acquire DB connection for menu_id {}: {}",
                search_menu_id, e
            );
            e
        })?;

        use crate::db::schema::{addon_categories, addon_options};

        let categories: Vec<AddonCategory> = addon_categories::table
            .filter(addon_categories::menu_id.eq(search_menu_id))
            .select(AddonCategory::as_select())
            .load::<AddonCategory>(conn.connection())
            .map_err(RepositoryError::DatabaseError)?;

        let category_ids: Vec<i32> =
            categories.iter().map(|c| c.addon_category_id).collect();
        let options: Vec<AddonOption> = addon_options::table
            .filter(addon_options::addon_category_id.eq_any(&category_ids))
            .select(AddonOption::as_select())
            .load::<AddonOption>(conn.connection())
            .map_err(RepositoryError::DatabaseError)?;

        Ok(categories
            .into_iter()
            .map(|category| {
                let matching: Vec<AddonOption> = options
                    .iter()
                    .filter(|o| o.addon_category_id == category.addon_category_id)
                    .map(|o| AddonOption {
                        addon_option_id: o.addon_option_id,
                        addon_category_id: o.addon_category_id,
                        name: o.name.clone(),
                        price_cents: o.price_cents,
                    })
                    .collect();
                (category, matching)
            })
            .collect())
    }
}
