use crate::notify::{customer_topic, restaurant_topic, ChannelRegistry};
use actix_web::{get, rt, web, HttpRequest, HttpResponse};
use actix_ws::Message;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Restaurant-owner feed: every new order for the restaurant.
#[utoipa::path(
    get,
    tag = "WebSockets",
    path = "/orders/restaurant/{restaurant_id}",
    params(
        ("restaurant_id", description = "Restaurant whose order feed to stream"),
    ),
    responses(
        (status = 101, description = "Switching protocols to a websocket session")
    ),
    summary = "Live feed of new orders for a restaurant"
)]
#[get("/orders/restaurant/{restaurant_id}")]
pub(super) async fn restaurant_orders_ws(
    registry: web::Data<Arc<ChannelRegistry>>,
    req: HttpRequest,
    stream: web::Payload,
    path: web::Path<(i32,)>,
) -> actix_web::Result<HttpResponse> {
    let restaurant_id = path.into_inner().0;
    let rx = registry.subscribe(&restaurant_topic(restaurant_id));
    serve_topic(req, stream, rx)
}

/// Customer feed: order and payment status changes for a user's orders.
#[utoipa::path(
    get,
    tag = "WebSockets",
    path = "/orders/{user_id}",
    params(
        ("user_id", description = "Customer whose order events to stream"),
    ),
    responses(
        (status = 101, description = "Switching protocols to a websocket session")
    ),
    summary = "Live feed of order and payment updates for a customer"
)]
#[get("/orders/{user_id}")]
pub(super) async fn customer_orders_ws(
    registry: web::Data<Arc<ChannelRegistry>>,
    req: HttpRequest,
    stream: web::Payload,
    path: web::Path<(i32,)>,
) -> actix_web::Result<HttpResponse> {
    let user_id = path.into_inner().0;
    let rx = registry.subscribe(&customer_topic(user_id));
    serve_topic(req, stream, rx)
}

/// Forward broadcast events to a websocket session until either side goes
/// away. Lagged receivers skip ahead; missed events are not replayed, a
/// reconnecting client re-fetches state over HTTP instead.
fn serve_topic(
    req: HttpRequest,
    stream: web::Payload,
    mut rx: broadcast::Receiver<String>,
) -> actix_web::Result<HttpResponse> {
    let (response, mut session, mut msg_stream) = actix_ws::handle(&req, stream)?;

    rt::spawn(async move {
        loop {
            tokio::select! {
                event = rx.recv() => match event {
                    Ok(payload) => {
                        if session.text(payload).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        debug!("ws subscriber lagged, skipped {} events", skipped);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
                msg = msg_stream.recv() => match msg {
                    Some(Ok(Message::Ping(bytes))) => {
                        if session.pong(&bytes).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(_)) => break,
                },
            }
        }
        let _ = session.close(None).await;
    });

    Ok(response)
}
