use crate::api::errors::repository_error_response;
use crate::auth::Identity;
use crate::db::{PromoOperations, RestaurantOperations};
use crate::enums::common::{DataResponse, MessageResponse};
use crate::enums::restaurants::AddonGroup;
use crate::models::core::{Menu, Promo, Restaurant};
use actix_web::{get, web, FromRequest, HttpRequest, HttpResponse, Responder};

#[utoipa::path(
    get,
    tag = "Restaurants",
    path = "",
    responses(
        (status = 200, description = "All restaurants", body = DataResponse<Vec<Restaurant>>)
    ),
    summary = "List restaurants"
)]
#[get("")]
pub(super) async fn get_all_restaurants(
    restaurant_ops: web::Data<RestaurantOperations>,
) -> impl Responder {
    let ops = restaurant_ops.get_ref().clone();
    let result = web::block(move || ops.get_all_restaurants()).await;

    match result {
        Ok(Ok(restaurants)) => HttpResponse::Ok().json(DataResponse::ok(restaurants)),
        Ok(Err(e)) => repository_error_response("get_all_restaurants", e),
        Err(e) => {
            error!("get_all_restaurants: blocking error: {}", e);
            HttpResponse::InternalServerError()
                .json(MessageResponse::error("Internal server error"))
        }
    }
}

#[utoipa::path(
    get,
    tag = "Restaurants",
    path = "/{restaurant_id}/menu",
    responses(
        (status = 200, description = "Menu items for the restaurant", body = DataResponse<Vec<Menu>>)
    ),
    summary = "List a restaurant's menu"
)]
#[get("/{restaurant_id}/menu")]
pub(super) async fn get_restaurant_menu(
    restaurant_ops: web::Data<RestaurantOperations>,
    path: web::Path<(i32,)>,
) -> impl Responder {
    let restaurant_id = path.into_inner().0;
    let ops = restaurant_ops.get_ref().clone();
    let result = web::block(move || ops.get_menu_for_restaurant(restaurant_id)).await;

    match result {
        Ok(Ok(menu)) => HttpResponse::Ok().json(DataResponse::ok(menu)),
        Ok(Err(e)) => repository_error_response("get_restaurant_menu", e),
        Err(e) => {
            error!("get_restaurant_menu: blocking error: {}", e);
            HttpResponse::InternalServerError()
                .json(MessageResponse::error("Internal server error"))
        }
    }
}

#[utoipa::path(
    get,
    tag = "Restaurants",
    path = "/menu/{menu_id}/addons",
    responses(
        (status = 200, description = "Addon groups for the menu item", body = DataResponse<Vec<AddonGroup>>)
    ),
    summary = "List a menu item's addon categories and options"
)]
#[get("/menu/{menu_id}/addons")]
pub(super) async fn get_menu_addons(
    restaurant_ops: web::Data<RestaurantOperations>,
    path: web::Path<(i32,)>,
) -> impl Responder {
    let menu_id = path.into_inner().0;
    let ops = restaurant_ops.get_ref().clone();
    let result = web::block(move || ops.get_addons_for_menu(menu_id)).await;

    match result {
        Ok(Ok(groups)) => {
            let groups: Vec<AddonGroup> = groups
                .into_iter()
                .map(|(category, options)| AddonGroup { category, options })
                .collect();
            HttpResponse::Ok().json(DataResponse::ok(groups))
        }
        Ok(Err(e)) => repository_error_response("get_menu_addons", e),
        Err(e) => {
            error!("get_menu_addons: blocking error: {}", e);
            HttpResponse::InternalServerError()
                .json(MessageResponse::error("Internal server error"))
        }
    }
}

#[utoipa::path(
    get,
    tag = "Restaurants",
    path = "/{restaurant_id}/promos",
    responses(
        (status = 200, description = "Promos advertised for the restaurant", body = DataResponse<Vec<Promo>>)
    ),
    summary = "List a restaurant's promos, minus ones the caller already redeemed"
)]
#[get("/{restaurant_id}/promos")]
pub(super) async fn get_restaurant_promos(
    promo_ops: web::Data<PromoOperations>,
    req: HttpRequest,
    path: web::Path<(i32,)>,
) -> impl Responder {
    let restaurant_id = path.into_inner().0;
    // Identity is optional here: anonymous browsing sees every promo.
    let caller = Identity::extract(&req).await.ok().map(|i| i.user_id());

    let ops = promo_ops.get_ref().clone();
    let result = web::block(move || ops.get_promos_for_restaurant(restaurant_id, caller)).await;

    match result {
        Ok(Ok(promos)) => HttpResponse::Ok().json(DataResponse::ok(promos)),
        Ok(Err(e)) => repository_error_response("get_restaurant_promos", e),
        Err(e) => {
            error!("get_restaurant_promos: blocking error: {}", e);
            HttpResponse::InternalServerError()
                .json(MessageResponse::error("Internal server error"))
        }
    }
}
