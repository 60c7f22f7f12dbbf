//! Response writing.
//!
//! # Responsibilities
//! - Accumulate status and headers before the response is written
//! - Write and end the response exactly once
//! - Hand the finished response back to the dispatcher
//!
//! # Design Decisions
//! - Ending sends over a oneshot channel; the sender is consumed on first use
//! - A second `end` is ignored and logged, never a panic
//! - Status defaults to 200 until something overrides it

use axum::body::Bytes;
use axum::http::{header, HeaderMap, HeaderName, HeaderValue, Response, StatusCode};
use tokio::sync::oneshot;

pub const TEXT_PLAIN: &str = "text/plain";
pub const APPLICATION_JSON: &str = "application/json";
pub const TEXT_HTML: &str = "text/html";

/// Receiving half handed to the dispatcher.
pub type ResponseReceiver = oneshot::Receiver<Response<Bytes>>;

/// Response extension naming the pattern that served the request.
///
/// Absent when no route matched or a middleware answered first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchedRoute(pub String);

impl MatchedRoute {
    /// Metrics label for a response, `"none"` when nothing matched.
    pub fn label<B>(response: &Response<B>) -> &str {
        response
            .extensions()
            .get::<MatchedRoute>()
            .map(|matched| matched.0.as_str())
            .unwrap_or("none")
    }
}

/// The raw response writer for one request.
#[derive(Debug)]
pub struct RawResponse {
    status: StatusCode,
    headers: HeaderMap,
    sink: Option<oneshot::Sender<Response<Bytes>>>,
}

impl RawResponse {
    /// Create a writer together with the receiver that observes its single write.
    pub fn channel() -> (Self, ResponseReceiver) {
        let (tx, rx) = oneshot::channel();
        let response = Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            sink: Some(tx),
        };
        (response, rx)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn set_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Set a header, replacing any previous value.
    pub fn set_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.headers.insert(name, value);
    }

    /// Set the status and content type in one step.
    pub fn write_head(&mut self, status: StatusCode, content_type: &'static str) {
        self.status = status;
        self.headers
            .insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
    }

    /// True once the response has been ended.
    pub fn is_ended(&self) -> bool {
        self.sink.is_none()
    }

    /// Write the body and end the response.
    ///
    /// Returns `false` without writing anything if the response already ended.
    pub fn end(&mut self, body: impl Into<Bytes>) -> bool {
        let Some(sink) = self.sink.take() else {
            tracing::warn!(status = %self.status, "Response already ended; ignoring write");
            return false;
        };

        let mut response = Response::new(body.into());
        *response.status_mut() = self.status;
        *response.headers_mut() = std::mem::take(&mut self.headers);

        if sink.send(response).is_err() {
            tracing::debug!("Response receiver dropped before write");
        }
        true
    }
}
