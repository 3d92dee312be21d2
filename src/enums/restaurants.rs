use crate::models::core::{AddonCategory, AddonOption};
use serde::Serialize;
use utoipa::ToSchema;

/// An addon category with its selectable options, as shown on the menu item
/// detail screen.
#[derive(Serialize, ToSchema, Debug)]
pub struct AddonGroup {
    #[serde(flatten)]
    pub category: AddonCategory,
    pub options: Vec<AddonOption>,
}
