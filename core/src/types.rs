//! Response codes and the generic response envelope.
//!
//! # Design
//! Many backends wrap every payload in `{ "code", "message", "data" }`.
//! `ResponseCode` names the codes callers usually branch on. The client never
//! enforces them: it only looks at the transport status, and interpreting the
//! envelope is left to the caller.

use serde::{Deserialize, Serialize};

/// Well-known HTTP and business status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum ResponseCode {
    Success = 200,
    Created = 201,
    Accepted = 202,
    NoContent = 204,
    BadRequest = 400,
    Unauthorized = 401,
    Forbidden = 403,
    NotFound = 404,
    MethodNotAllowed = 405,
    RequestTimeout = 408,
    Conflict = 409,
    UnprocessableEntity = 422,
    TooManyRequests = 429,
    InternalServerError = 500,
    BadGateway = 502,
    ServiceUnavailable = 503,
    GatewayTimeout = 504,
}

impl ResponseCode {
    pub fn code(self) -> u16 {
        self as u16
    }

    pub fn is_success(self) -> bool {
        (200..300).contains(&self.code())
    }
}

impl TryFrom<i64> for ResponseCode {
    type Error = i64;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        let code = match value {
            200 => Self::Success,
            201 => Self::Created,
            202 => Self::Accepted,
            204 => Self::NoContent,
            400 => Self::BadRequest,
            401 => Self::Unauthorized,
            403 => Self::Forbidden,
            404 => Self::NotFound,
            405 => Self::MethodNotAllowed,
            408 => Self::RequestTimeout,
            409 => Self::Conflict,
            422 => Self::UnprocessableEntity,
            429 => Self::TooManyRequests,
            500 => Self::InternalServerError,
            502 => Self::BadGateway,
            503 => Self::ServiceUnavailable,
            504 => Self::GatewayTimeout,
            other => return Err(other),
        };
        Ok(code)
    }
}

/// Generic `{ code, message, data }` envelope returned by many APIs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiEnvelope<T> {
    pub code: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default = "Option::default", skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiEnvelope<T> {
    /// The envelope code as a known `ResponseCode`, if it is one.
    pub fn response_code(&self) -> Option<ResponseCode> {
        ResponseCode::try_from(self.code).ok()
    }

    pub fn is_success(&self) -> bool {
        self.response_code().is_some_and(ResponseCode::is_success)
    }
}
