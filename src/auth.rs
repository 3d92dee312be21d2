use actix_web::dev::Payload;
use actix_web::{error::ErrorUnauthorized, Error, FromRequest, HttpRequest};
use futures_util::future::{ready, Ready};

/// Identity established by the upstream auth service, forwarded as trusted
/// headers. Token issuance and verification are not this service's job.
#[derive(Clone, Debug)]
pub struct Identity {
    user_id: i32,
    is_staff: bool,
}

impl Identity {
    pub fn user_id(&self) -> i32 {
        self.user_id
    }

    pub fn is_staff(&self) -> bool {
        self.is_staff
    }
}

fn header_value<'a>(req: &'a HttpRequest, name: &str) -> Option<&'a str> {
    req.headers().get(name).and_then(|v| v.to_str().ok())
}

impl FromRequest for Identity {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let user_id = match header_value(req, "X-User-Id").and_then(|v| v.parse::<i32>().ok()) {
            Some(id) => id,
            None => return ready(Err(ErrorUnauthorized("missing identity"))),
        };
        let is_staff = header_value(req, "X-User-Staff")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        ready(Ok(Identity { user_id, is_staff }))
    }
}

/// Staff-only variant for the back-office order actions.
pub struct StaffIdentity(pub Identity);

impl FromRequest for StaffIdentity {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        match Identity::from_request(req, payload).into_inner() {
            Ok(identity) if identity.is_staff() => ready(Ok(StaffIdentity(identity))),
            Ok(_) => ready(Err(actix_web::error::ErrorForbidden(
                "staff access required",
            ))),
            Err(e) => ready(Err(e)),
        }
    }
}
