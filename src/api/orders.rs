use crate::api::errors::repository_error_response;
use crate::auth::{Identity, StaffIdentity};
use crate::db::OrderOperations;
use crate::enums::common::{DataResponse, MessageResponse};
use crate::enums::orders::{
    CreateOrderResponse, OrderAction, OrderDetail, OrderRequest, UpdateOrderStatusRequest,
};
use actix_web::{get, post, web, HttpResponse, Responder};

#[utoipa::path(
    post,
    tag = "Orders",
    path = "/create",
    request_body = OrderRequest,
    responses(
        (status = 201, description = "Order, payment and promo usage created", body = CreateOrderResponse),
        (status = 400, description = "Validation or promo error", body = CreateOrderResponse),
        (status = 404, description = "Unknown restaurant, menu item or promo", body = CreateOrderResponse)
    ),
    summary = "Create a new order with its payment record"
)]
#[post("/create")]
pub(super) async fn create_order(
    order_ops: web::Data<OrderOperations>,
    identity: Identity,
    req_data: web::Json<OrderRequest>,
) -> impl Responder {
    let customer_id = identity.user_id();
    let result = web::block(move || {
        order_ops
            .get_ref()
            .clone()
            .create_order(customer_id, req_data.into_inner())
    })
    .await;

    match result {
        Ok(Ok((order_id, payment_id))) => {
            debug!(
                "create_order: order {} created for customer {}",
                order_id, customer_id
            );
            HttpResponse::Created().json(CreateOrderResponse {
                status: "ok".to_string(),
                order_id: Some(order_id),
                payment_id: Some(payment_id),
                message: Some("Order created successfully. Awaiting payment approval.".to_string()),
                error: None,
            })
        }
        Ok(Err(e)) => {
            error!("ORDER: create_order(): {}", e);
            repository_error_response("create_order", e)
        }
        Err(e) => {
            error!("create_order: blocking error: {}", e);
            HttpResponse::InternalServerError()
                .json(MessageResponse::error("Internal server error"))
        }
    }
}

#[utoipa::path(
    post,
    tag = "Orders",
    path = "/{order_id}/update-status",
    request_body = UpdateOrderStatusRequest,
    responses(
        (status = 200, description = "Order status updated", body = MessageResponse),
        (status = 400, description = "Invalid action", body = MessageResponse),
        (status = 404, description = "Order not found", body = MessageResponse),
        (status = 409, description = "Payment precondition unmet", body = MessageResponse)
    ),
    summary = "Accept, reject or complete an order"
)]
#[post("/{order_id}/update-status")]
pub(super) async fn update_order_status(
    order_ops: web::Data<OrderOperations>,
    _staff: StaffIdentity,
    path: web::Path<(i32,)>,
    req_data: web::Json<UpdateOrderStatusRequest>,
) -> impl Responder {
    let order_id = path.into_inner().0;
    let action = match OrderAction::parse(&req_data.action) {
        Some(action) => action,
        None => {
            return HttpResponse::BadRequest().json(MessageResponse::error(format!(
                "Invalid action '{}'. Use 'accept', 'reject' or 'complete'.",
                req_data.action
            )))
        }
    };

    let result = web::block(move || {
        order_ops
            .get_ref()
            .clone()
            .update_order_status(order_id, action)
    })
    .await;

    match result {
        Ok(Ok(order)) => HttpResponse::Ok().json(MessageResponse::ok(format!(
            "Order {} is now {}",
            order.order_id, order.status
        ))),
        Ok(Err(e)) => {
            error!("ORDER: update_order_status({}): {}", order_id, e);
            repository_error_response("update_order_status", e)
        }
        Err(e) => {
            error!("update_order_status: blocking error: {}", e);
            HttpResponse::InternalServerError()
                .json(MessageResponse::error("Internal server error"))
        }
    }
}

#[utoipa::path(
    get,
    tag = "Orders",
    path = "/{order_id}",
    responses(
        (status = 200, description = "Order with line items", body = DataResponse<OrderDetail>),
        (status = 404, description = "Order not found", body = MessageResponse)
    ),
    summary = "Get one order with its line items"
)]
#[get("/{order_id}")]
pub(super) async fn get_order(
    order_ops: web::Data<OrderOperations>,
    identity: Identity,
    path: web::Path<(i32,)>,
) -> impl Responder {
    let order_id = path.into_inner().0;
    let ops = order_ops.get_ref().clone();
    let result = web::block(move || ops.get_order_with_items(order_id)).await;

    match result {
        Ok(Ok((order, items))) => {
            if order.customer_id != identity.user_id() && !identity.is_staff() {
                return HttpResponse::NotFound()
                    .json(MessageResponse::error(format!("orders: {}", order_id)));
            }
            HttpResponse::Ok().json(DataResponse::ok(OrderDetail { order, items }))
        }
        Ok(Err(e)) => repository_error_response("get_order", e),
        Err(e) => {
            error!("get_order: blocking error: {}", e);
            HttpResponse::InternalServerError()
                .json(MessageResponse::error("Internal server error"))
        }
    }
}

#[utoipa::path(
    get,
    tag = "Orders",
    path = "",
    responses(
        (status = 200, description = "Orders of the calling customer", body = DataResponse<Vec<crate::models::payments::Order>>)
    ),
    summary = "List the caller's orders, newest first"
)]
#[get("")]
pub(super) async fn get_my_orders(
    order_ops: web::Data<OrderOperations>,
    identity: Identity,
) -> impl Responder {
    let customer_id = identity.user_id();
    let ops = order_ops.get_ref().clone();
    let result = web::block(move || ops.get_orders_by_customer(customer_id)).await;

    match result {
        Ok(Ok(orders)) => HttpResponse::Ok().json(DataResponse::ok(orders)),
        Ok(Err(e)) => repository_error_response("get_my_orders", e),
        Err(e) => {
            error!("get_my_orders: blocking error: {}", e);
            HttpResponse::InternalServerError()
                .json(MessageResponse::error("Internal server error"))
        }
    }
}

#[utoipa::path(
    get,
    tag = "Orders",
    path = "/restaurant/{restaurant_id}/active",
    responses(
        (status = 200, description = "In-flight orders for the restaurant", body = DataResponse<Vec<crate::models::payments::Order>>)
    ),
    summary = "List a restaurant's in-flight orders (staff)"
)]
#[get("/restaurant/{restaurant_id}/active")]
pub(super) async fn get_active_orders(
    order_ops: web::Data<OrderOperations>,
    _staff: StaffIdentity,
    path: web::Path<(i32,)>,
) -> impl Responder {
    let restaurant_id = path.into_inner().0;
    let ops = order_ops.get_ref().clone();
    let result = web::block(move || ops.get_active_orders_for_restaurant(restaurant_id)).await;

    match result {
        Ok(Ok(orders)) => HttpResponse::Ok().json(DataResponse::ok(orders)),
        Ok(Err(e)) => repository_error_response("get_active_orders", e),
        Err(e) => {
            error!("get_active_orders: blocking error: {}", e);
            HttpResponse::InternalServerError()
                .json(MessageResponse::error("Internal server error"))
        }
    }
}
