//! Outgoing HTTP response type, the [`Render`] seam, and the
//! [`IntoResponse`] conversion trait.
//!
//! Build a [`Response`] in your handler and hand it to the
//! [`Responder`](crate::Responder). That is the entire job description.
//!
//! A response body is either raw bytes or a boxed [`Render`] token — the hook
//! for an external view engine. Custom bodies are evaluated once, at the
//! moment the response is written out; a failed render degrades to a 500.

use bytes::Bytes;
use http_body_util::Full;

use crate::error::TaskError;
use crate::status::Status;

// ── Render seam ───────────────────────────────────────────────────────────────

/// A deferred body producer — typically a template engine invocation.
///
/// The pipeline never interprets templates itself; it carries the renderer
/// through to write-out and calls it exactly once per response.
pub trait Render: Send + Sync + 'static {
    fn render(&self) -> Result<String, TaskError>;

    /// Content type of the rendered body. Defaults to HTML, the common case
    /// for view engines.
    fn content_type(&self) -> &'static str {
        "text/html; charset=utf-8"
    }
}

// ── Response ─────────────────────────────────────────────────────────────────

pub(crate) enum Body {
    Bytes(Vec<u8>),
    Custom(Box<dyn Render>),
}

/// An outgoing HTTP response.
///
/// # Shortcuts (200 OK)
///
/// ```rust
/// use slipway::{Response, Status};
///
/// Response::text("hello");
/// Response::json(br#"{"id":1}"#.to_vec());
/// Response::status(Status::NoContent);
/// ```
///
/// # Builder (custom status or headers)
///
/// ```rust
/// use slipway::{Response, Status};
///
/// Response::builder()
///     .status(Status::Created)
///     .header("location", "/users/42")
///     .json(br#"{"id":42}"#.to_vec());
/// ```
pub struct Response {
    pub(crate) body: Body,
    pub(crate) headers: Vec<(String, String)>,
    pub(crate) status: Status,
}

impl Response {
    /// `200 OK` — `text/plain; charset=utf-8`.
    pub fn text(body: impl Into<String>) -> Self {
        Self::bytes_raw("text/plain; charset=utf-8", body.into().into_bytes())
    }

    /// `200 OK` — `application/json`. Pass bytes straight from your serialiser.
    pub fn json(body: Vec<u8>) -> Self {
        Self::bytes_raw("application/json", body)
    }

    /// Response with no body.
    pub fn status(code: Status) -> Self {
        Self { body: Body::Bytes(Vec::new()), headers: Vec::new(), status: code }
    }

    /// `200 OK` with a deferred [`Render`] body, evaluated at write-out.
    pub fn custom(render: impl Render) -> Self {
        Self { body: Body::Custom(Box::new(render)), headers: Vec::new(), status: Status::Ok }
    }

    /// Builder for responses that need a custom status or extra headers.
    pub fn builder() -> ResponseBuilder {
        ResponseBuilder { headers: Vec::new(), status: Status::Ok }
    }

    fn bytes_raw(content_type: &str, body: Vec<u8>) -> Self {
        Self {
            body: Body::Bytes(body),
            headers: vec![("content-type".to_owned(), content_type.to_owned())],
            status: Status::Ok,
        }
    }

    pub fn status_code(&self) -> u16 {
        self.status.code()
    }

    /// The body bytes, evaluating a custom renderer if one is attached.
    /// A failed render yields the error description — status is handled at
    /// write-out, this accessor exists for tests and embedders.
    pub fn body_bytes(&self) -> Vec<u8> {
        match &self.body {
            Body::Bytes(b) => b.clone(),
            Body::Custom(r) => match r.render() {
                Ok(s) => s.into_bytes(),
                Err(e) => e.to_string().into_bytes(),
            },
        }
    }

    /// Converts into the hyper-facing representation, resolving any custom
    /// renderer. Render failure degrades to a plain-text 500 here — the
    /// transport never sees an error.
    pub(crate) fn into_http(self) -> http::Response<Full<Bytes>> {
        let (status, headers, bytes) = match self.body {
            Body::Bytes(b) => (self.status, self.headers, b),
            Body::Custom(render) => match render.render() {
                Ok(s) => {
                    let mut headers = self.headers;
                    if !headers.iter().any(|(k, _)| k.eq_ignore_ascii_case("content-type")) {
                        headers.push(("content-type".to_owned(), render.content_type().to_owned()));
                    }
                    (self.status, headers, s.into_bytes())
                }
                Err(e) => (
                    Status::InternalServerError,
                    vec![("content-type".to_owned(), "text/plain; charset=utf-8".to_owned())],
                    e.to_string().into_bytes(),
                ),
            },
        };

        let mut builder = http::Response::builder().status(status.code());
        for (name, value) in &headers {
            builder = builder.header(name, value);
        }
        builder
            .body(Full::new(Bytes::from(bytes)))
            .unwrap_or_else(|_| {
                // Only reachable with a malformed header name/value.
                http::Response::builder()
                    .status(500)
                    .body(Full::new(Bytes::from_static(b"invalid response")))
                    .expect("static fallback response")
            })
    }
}

// ── ResponseBuilder ───────────────────────────────────────────────────────────

/// Fluent builder for [`Response`]. Defaults to `Status::Ok`.
pub struct ResponseBuilder {
    headers: Vec<(String, String)>,
    status: Status,
}

impl ResponseBuilder {
    pub fn status(mut self, code: Status) -> Self {
        self.status = code;
        self
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_owned(), value.to_owned()));
        self
    }

    /// Terminate with a plain-text body.
    pub fn text(self, body: impl Into<String>) -> Response {
        self.finish("text/plain; charset=utf-8", body.into().into_bytes())
    }

    /// Terminate with a JSON body.
    pub fn json(self, body: Vec<u8>) -> Response {
        self.finish("application/json", body)
    }

    /// Terminate with a deferred [`Render`] body.
    pub fn custom(self, render: impl Render) -> Response {
        Response { body: Body::Custom(Box::new(render)), headers: self.headers, status: self.status }
    }

    /// Terminate with no body.
    pub fn no_body(self) -> Response {
        Response { body: Body::Bytes(Vec::new()), headers: self.headers, status: self.status }
    }

    fn finish(self, content_type: &str, body: Vec<u8>) -> Response {
        let mut headers = vec![("content-type".to_owned(), content_type.to_owned())];
        headers.extend(self.headers);
        Response { body: Body::Bytes(body), headers, status: self.status }
    }
}

// ── IntoResponse ──────────────────────────────────────────────────────────────

/// Conversion into an HTTP [`Response`].
///
/// Implement on your own types to hand them to a
/// [`Responder`](crate::Responder) directly.
pub trait IntoResponse {
    fn into_response(self) -> Response;
}

impl IntoResponse for Response {
    fn into_response(self) -> Response {
        self
    }
}

impl IntoResponse for &'static str {
    fn into_response(self) -> Response {
        Response::text(self)
    }
}

impl IntoResponse for String {
    fn into_response(self) -> Response {
        Response::text(self)
    }
}

impl IntoResponse for Status {
    fn into_response(self) -> Response {
        Response::status(self)
    }
}
