mod errors;
mod orders;
mod payments;
mod restaurants;
mod webhooks;
mod ws;

use crate::AppState;
use actix_web::guard::{Guard, GuardContext};
use actix_web::http::header;
use actix_web::middleware::NormalizePath;
use actix_web::{get, web, HttpResponse, Responder};
pub use errors::default_error_handler;
use utoipa_actix_web::{scope, service_config::ServiceConfig};
pub use webhooks::WebhookConfig;

/// Route guard matching JSON bodies regardless of charset parameters.
pub struct ContentTypeHeader;

impl Guard for ContentTypeHeader {
    fn check(&self, ctx: &GuardContext<'_>) -> bool {
        ctx.head()
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.trim().to_ascii_lowercase().starts_with("application/json"))
            .unwrap_or(false)
    }
}

#[utoipa::path(
    get,
    tag = "Health",
    path = "/",
    responses(
        (status = 200, description = "Server is reachable", body = String)
    ),
    summary = "Liveness check"
)]
#[get("/")]
async fn root_endpoint() -> impl Responder {
    HttpResponse::Ok().body("Server up!")
}

pub fn configure(cfg: &mut ServiceConfig, state: &AppState) {
    cfg.service(root_endpoint)
        .service(
            scope::scope("/orders")
                .wrap(NormalizePath::trim())
                .app_data(web::Data::new(state.order_ops.clone()))
                .service(
                    scope::scope("")
                        .guard(ContentTypeHeader)
                        .service(orders::create_order)
                        .service(orders::update_order_status),
                )
                .service(
                    scope::scope("")
                        .service(orders::get_active_orders)
                        .service(orders::get_my_orders)
                        .service(orders::get_order),
                ),
        )
        .service(
            scope::scope("/payments")
                .wrap(NormalizePath::trim())
                .app_data(web::Data::new(state.order_ops.clone()))
                .app_data(web::Data::new(state.payment_ops.clone()))
                .service(
                    scope::scope("")
                        .guard(ContentTypeHeader)
                        .service(payments::update_payment_status),
                )
                .service(
                    scope::scope("")
                        .service(payments::get_payment_for_order)
                        .service(payments::get_payment),
                ),
        )
        .service(
            scope::scope("/restaurants")
                .wrap(NormalizePath::trim())
                .app_data(web::Data::new(state.restaurant_ops.clone()))
                .app_data(web::Data::new(state.promo_ops.clone()))
                .service(restaurants::get_all_restaurants)
                .service(restaurants::get_menu_addons)
                .service(restaurants::get_restaurant_menu)
                .service(restaurants::get_restaurant_promos),
        )
        .service(
            scope::scope("")
                .app_data(web::Data::new(state.order_ops.clone()))
                .app_data(web::Data::new(state.payment_ops.clone()))
                .app_data(web::Data::new(state.webhook_config.clone()))
                .service(webhooks::stripe_webhook),
        )
        .service(
            scope::scope("/ws")
                .app_data(web::Data::new(state.notifier.clone()))
                .service(ws::restaurant_orders_ws)
                .service(ws::customer_orders_ws),
        );
}
