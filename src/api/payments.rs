use crate::api::errors::repository_error_response;
use crate::auth::Identity;
use crate::db::{OrderOperations, PaymentOperations};
use crate::enums::common::{DataResponse, MessageResponse};
use crate::enums::payments::UpdatePaymentStatusRequest;
use crate::models::statuses::PaymentStatus;
use actix_web::{get, post, web, HttpResponse, Responder};

#[utoipa::path(
    post,
    tag = "Payments",
    path = "/{payment_id}/update-status",
    request_body = UpdatePaymentStatusRequest,
    responses(
        (status = 200, description = "Payment status applied", body = MessageResponse),
        (status = 400, description = "Invalid payment status", body = MessageResponse),
        (status = 404, description = "Payment not found", body = MessageResponse)
    ),
    summary = "Update a payment's status and reconcile the order"
)]
#[post("/{payment_id}/update-status")]
pub(super) async fn update_payment_status(
    order_ops: web::Data<OrderOperations>,
    _identity: Identity,
    path: web::Path<(i32,)>,
    req_data: web::Json<UpdatePaymentStatusRequest>,
) -> impl Responder {
    let payment_id = path.into_inner().0;
    let new_status = match PaymentStatus::parse(&req_data.payment_status) {
        Some(status) => status,
        None => {
            return HttpResponse::BadRequest().json(MessageResponse::error(format!(
                "Invalid payment status '{}'",
                req_data.payment_status
            )))
        }
    };

    let ops = order_ops.get_ref().clone();
    let result = web::block(move || ops.update_payment_status(payment_id, new_status)).await;

    match result {
        Ok(Ok(order)) => {
            let message = match new_status {
                PaymentStatus::Completed => "Payment approved and order confirmed",
                PaymentStatus::Failed => "Payment failed and order cancelled",
                _ => "Payment status updated successfully",
            };
            debug!(
                "update_payment_status: payment {} -> {}, order {} now {}",
                payment_id, new_status, order.order_id, order.status
            );
            HttpResponse::Ok().json(MessageResponse::ok(message))
        }
        Ok(Err(e)) => {
            error!("PAYMENT: update_payment_status({}): {}", payment_id, e);
            repository_error_response("update_payment_status", e)
        }
        Err(e) => {
            error!("update_payment_status: blocking error: {}", e);
            HttpResponse::InternalServerError()
                .json(MessageResponse::error("Internal server error"))
        }
    }
}

#[utoipa::path(
    get,
    tag = "Payments",
    path = "/order/{order_id}",
    responses(
        (status = 200, description = "Payment for the order", body = DataResponse<crate::models::payments::Payment>),
        (status = 404, description = "No payment for the order", body = MessageResponse)
    ),
    summary = "Get the payment attached to an order"
)]
#[get("/order/{order_id}")]
pub(super) async fn get_payment_for_order(
    payment_ops: web::Data<PaymentOperations>,
    _identity: Identity,
    path: web::Path<(i32,)>,
) -> impl Responder {
    let order_id = path.into_inner().0;
    let ops = payment_ops.get_ref().clone();
    let result = web::block(move || ops.get_payment_for_order(order_id)).await;

    match result {
        Ok(Ok(payment)) => HttpResponse::Ok().json(DataResponse::ok(payment)),
        Ok(Err(e)) => repository_error_response("get_payment_for_order", e),
        Err(e) => {
            error!("get_payment_for_order: blocking error: {}", e);
            HttpResponse::InternalServerError()
                .json(MessageResponse::error("Internal server error"))
        }
    }
}

#[utoipa::path(
    get,
    tag = "Payments",
    path = "/{payment_id}",
    responses(
        (status = 200, description = "Payment record", body = DataResponse<crate::models::payments::Payment>),
        (status = 404, description = "Payment not found", body = MessageResponse)
    ),
    summary = "Get one payment record"
)]
#[get("/{payment_id}")]
pub(super) async fn get_payment(
    payment_ops: web::Data<PaymentOperations>,
    _identity: Identity,
    path: web::Path<(i32,)>,
) -> impl Responder {
    let payment_id = path.into_inner().0;
    let ops = payment_ops.get_ref().clone();
    let result = web::block(move || ops.get_payment(payment_id)).await;

    match result {
        Ok(Ok(payment)) => HttpResponse::Ok().json(DataResponse::ok(payment)),
        Ok(Err(e)) => repository_error_response("get_payment", e),
        Err(e) => {
            error!("get_payment: blocking error: {}", e);
            HttpResponse::InternalServerError()
                .json(MessageResponse::error("Internal server error"))
        }
    }
}
