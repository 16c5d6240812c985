//! HTTP status codes as a typed enum.
//!
//! Use [`Status`] anywhere a status code is accepted — `Response::status()`,
//! `Response::builder().status()`, or as a bare value passed to a
//! [`Responder`](crate::Responder).
//!
//! The set is deliberately the codes a pipeline host actually emits, not the
//! full IANA registry.

/// An HTTP status code.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Status {
    // ── 2xx Success ───────────────────────────────────────────────────────────
    Ok,                  // 200
    Created,             // 201
    Accepted,            // 202
    NoContent,           // 204

    // ── 3xx Redirection ───────────────────────────────────────────────────────
    MovedPermanently,    // 301
    Found,               // 302
    NotModified,         // 304

    // ── 4xx Client errors ─────────────────────────────────────────────────────
    BadRequest,          // 400
    Unauthorized,        // 401
    Forbidden,           // 403
    NotFound,            // 404
    MethodNotAllowed,    // 405
    RequestTimeout,      // 408
    ContentTooLarge,     // 413

    // ── 5xx Server errors ─────────────────────────────────────────────────────
    InternalServerError, // 500
    NotImplemented,      // 501
    BadGateway,          // 502
    ServiceUnavailable,  // 503
    GatewayTimeout,      // 504
}

impl Status {
    /// The numeric wire code.
    pub fn code(self) -> u16 {
        match self {
            Self::Ok                  => 200,
            Self::Created             => 201,
            Self::Accepted            => 202,
            Self::NoContent           => 204,
            Self::MovedPermanently    => 301,
            Self::Found               => 302,
            Self::NotModified         => 304,
            Self::BadRequest          => 400,
            Self::Unauthorized        => 401,
            Self::Forbidden           => 403,
            Self::NotFound            => 404,
            Self::MethodNotAllowed    => 405,
            Self::RequestTimeout      => 408,
            Self::ContentTooLarge     => 413,
            Self::InternalServerError => 500,
            Self::NotImplemented      => 501,
            Self::BadGateway          => 502,
            Self::ServiceUnavailable  => 503,
            Self::GatewayTimeout      => 504,
        }
    }

    /// The standard reason phrase (e.g. `"Not Found"`).
    pub fn reason(self) -> &'static str {
        match self {
            Self::Ok                  => "OK",
            Self::Created             => "Created",
            Self::Accepted            => "Accepted",
            Self::NoContent           => "No Content",
            Self::MovedPermanently    => "Moved Permanently",
            Self::Found               => "Found",
            Self::NotModified         => "Not Modified",
            Self::BadRequest          => "Bad Request",
            Self::Unauthorized        => "Unauthorized",
            Self::Forbidden           => "Forbidden",
            Self::NotFound            => "Not Found",
            Self::MethodNotAllowed    => "Method Not Allowed",
            Self::RequestTimeout      => "Request Timeout",
            Self::ContentTooLarge     => "Content Too Large",
            Self::InternalServerError => "Internal Server Error",
            Self::NotImplemented      => "Not Implemented",
            Self::BadGateway          => "Bad Gateway",
            Self::ServiceUnavailable  => "Service Unavailable",
            Self::GatewayTimeout      => "Gateway Timeout",
        }
    }
}

impl From<Status> for u16 {
    fn from(s: Status) -> u16 {
        s.code()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_match_reasons() {
        assert_eq!(Status::Ok.code(), 200);
        assert_eq!(Status::Ok.reason(), "OK");
        assert_eq!(Status::InternalServerError.code(), 500);
        assert_eq!(Status::GatewayTimeout.reason(), "Gateway Timeout");
    }
}
