pub mod attendance;
pub mod report;

use actix_web::{FromRequest, HttpRequest, HttpResponse, dev::Payload, error::ErrorUnauthorized};
use futures::future::{Ready, ready};
use serde_json::json;

use crate::error::AttendanceError;

/// Caller identity, stamped onto requests by the surrounding platform's
/// gateway. This service never authenticates anyone itself; it only
/// refuses requests that arrive without the context.
pub struct Caller {
    pub tenant_id: u64,
    pub actor_id: u64,
}

fn header_id(req: &HttpRequest, name: &str) -> Option<u64> {
    req.headers()
        .get(name)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}

impl FromRequest for Caller {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let Some(tenant_id) = header_id(req, "X-Tenant-Id") else {
            return ready(Err(ErrorUnauthorized("Missing or invalid X-Tenant-Id")));
        };
        let Some(actor_id) = header_id(req, "X-Actor-Id") else {
            return ready(Err(ErrorUnauthorized("Missing or invalid X-Actor-Id")));
        };
        ready(Ok(Caller {
            tenant_id,
            actor_id,
        }))
    }
}

/// Shared store-error mapping: fetch failures become a retryable banner,
/// write failures stay scoped to the affected row, missing ids are 404.
pub(crate) fn store_error_response(err: &AttendanceError) -> HttpResponse {
    match err {
        AttendanceError::Fetch(_) => HttpResponse::InternalServerError().json(json!({
            "message": "Failed to load attendance data",
            "kind": "fetch",
            "retryable": true
        })),
        AttendanceError::Write(_) => HttpResponse::InternalServerError().json(json!({
            "message": "Failed to save attendance record",
            "kind": "write",
            "retryable": true
        })),
        AttendanceError::NotFound => HttpResponse::NotFound().json(json!({
            "message": "Attendance record not found"
        })),
    }
}
