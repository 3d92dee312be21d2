use crate::db::RepositoryError;
use crate::enums::common::MessageResponse;
use actix_web::error::JsonPayloadError;
use actix_web::{Error, HttpRequest, HttpResponse};

pub fn default_error_handler(err: JsonPayloadError, req: &HttpRequest) -> Error {
    error!("Error in request: {} \n Error: {}", req.full_url(), err);
    actix_web::error::InternalError::from_response("", HttpResponse::BadRequest().finish()).into()
}

/// Map repository failures onto the HTTP surface. Persistence errors are
/// logged with context and masked behind a generic message.
pub(crate) fn repository_error_response(context: &str, e: RepositoryError) -> HttpResponse {
    match e {
        RepositoryError::NotFound(_) => {
            HttpResponse::NotFound().json(MessageResponse::error(e.to_string()))
        }
        RepositoryError::ValidationError(_) => {
            HttpResponse::BadRequest().json(MessageResponse::error(e.to_string()))
        }
        RepositoryError::Conflict(_) => {
            HttpResponse::Conflict().json(MessageResponse::error(e.to_string()))
        }
        RepositoryError::DatabaseError(_) | RepositoryError::ConnectionPoolError(_) => {
            error!("{}: {}", context, e);
            HttpResponse::InternalServerError()
                .json(MessageResponse::error("Internal server error"))
        }
    }
}
