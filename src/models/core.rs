use crate::models::statuses::{DiscountKind, PromoStatus};
use chrono::{DateTime, NaiveDate, Utc};
use diesel::{Identifiable, Insertable, Queryable, Selectable};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Queryable, Selectable, Identifiable, Serialize, ToSchema, Debug)]
#[diesel(table_name = crate::db::schema::restaurants)]
#[diesel(primary_key(restaurant_id))]
pub struct Restaurant {
    pub restaurant_id: i32,
    pub name: String,
    pub owner_id: i32,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Queryable, Selectable, Identifiable, Serialize, ToSchema, Debug)]
#[diesel(table_name = crate::db::schema::menus)]
#[diesel(primary_key(menu_id))]
pub struct Menu {
    pub menu_id: i32,
    pub restaurant_id: i32,
    pub name: String,
    pub description: Option<String>,
    pub cost_cents: i64,
    pub status: String,
}

/// Price/ownership snapshot loaded while assembling an order.
#[derive(Queryable, Selectable, Debug)]
#[diesel(table_name = crate::db::schema::menus)]
pub struct MenuItemCheck {
    pub menu_id: i32,
    pub restaurant_id: i32,
    pub name: String,
    pub cost_cents: i64,
}

#[derive(Queryable, Selectable, Serialize, ToSchema, Debug)]
#[diesel(table_name = crate::db::schema::addon_categories)]
pub struct AddonCategory {
    pub addon_category_id: i32,
    pub menu_id: i32,
    pub name: String,
    pub required: bool,
    pub max_selections: i32,
}

#[derive(Queryable, Selectable, Serialize, ToSchema, Debug)]
#[diesel(table_name = crate::db::schema::addon_options)]
pub struct AddonOption {
    pub addon_option_id: i32,
    pub addon_category_id: i32,
    pub name: String,
    pub price_cents: i64,
}

#[derive(Queryable, Selectable, Identifiable, Serialize, ToSchema, Clone, Debug)]
#[diesel(table_name = crate::db::schema::promos)]
#[diesel(primary_key(promo_id))]
pub struct Promo {
    pub promo_id: i32,
    pub restaurant_id: Option<i32>,
    pub menu_id: Option<i32>,
    pub name: String,
    pub description: Option<String>,
    pub discount_value: i64,
    pub discount_kind: DiscountKind,
    pub usage_limit: Option<i32>,
    pub usage_count: i32,
    pub status: PromoStatus,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub code: Option<String>,
}

impl Promo {
    /// Active and not exhausted. Validity window and per-customer history
    /// are separate caller-side checks.
    pub fn can_be_used(&self) -> bool {
        if self.status != PromoStatus::Active {
            return false;
        }
        match self.usage_limit {
            Some(limit) => self.usage_count < limit,
            None => true,
        }
    }

    /// Total after applying the discount. Percentage values are whole
    /// percents; fixed values are cents. Never goes below zero.
    pub fn discounted_total(&self, total_cents: i64) -> i64 {
        let discounted = match self.discount_kind {
            DiscountKind::Percentage => total_cents - total_cents * self.discount_value / 100,
            DiscountKind::Fixed => total_cents - self.discount_value,
        };
        discounted.max(0)
    }
}

#[derive(Insertable, Deserialize, Debug)]
#[diesel(table_name = crate::db::schema::promos)]
pub struct NewPromo {
    pub restaurant_id: Option<i32>,
    pub menu_id: Option<i32>,
    pub name: String,
    pub description: Option<String>,
    pub discount_value: i64,
    pub discount_kind: DiscountKind,
    pub usage_limit: Option<i32>,
    pub status: PromoStatus,
    pub code: Option<String>,
}

#[derive(Queryable, Selectable, Serialize, ToSchema, Debug)]
#[diesel(table_name = crate::db::schema::users)]
pub struct User {
    pub user_id: i32,
    pub name: String,
    pub email: String,
    pub is_staff: bool,
    pub created_at: DateTime<Utc>,
}
