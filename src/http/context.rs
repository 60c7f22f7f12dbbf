//! Per-request context.
//!
//! Built once per request from the raw request/response pair, threaded
//! through the middleware chain and handed by value to the matched handler.
//! Emission helpers set the content type, write the head and end the
//! response; only the first emission reaches the client.

use axum::body::Bytes;
use axum::http::{Method, StatusCode};
use serde::Serialize;

use crate::http::request::{parse_query, Query, QueryValue, RawRequest};
use crate::http::response::{RawResponse, APPLICATION_JSON, TEXT_HTML, TEXT_PLAIN};
use crate::routing::Params;

/// The per-request facade handed to middleware and handlers.
#[derive(Debug)]
pub struct RequestContext {
    request: RawRequest,
    response: RawResponse,
    /// Path component of the request URI, undecoded.
    pub pathname: String,
    /// Decoded query string.
    pub query: Query,
    /// Route parameters. Empty until resolution succeeds.
    pub params: Params,
}

impl RequestContext {
    pub fn new(request: RawRequest, response: RawResponse) -> Self {
        let pathname = request.uri().path().to_string();
        let query = parse_query(request.uri().query());
        Self {
            request,
            response,
            pathname,
            query,
            params: Params::new(),
        }
    }

    pub fn request(&self) -> &RawRequest {
        &self.request
    }

    pub fn response(&self) -> &RawResponse {
        &self.response
    }

    pub fn response_mut(&mut self) -> &mut RawResponse {
        &mut self.response
    }

    pub fn method(&self) -> &Method {
        self.request.method()
    }

    pub fn body(&self) -> &Bytes {
        self.request.body()
    }

    pub fn request_id(&self) -> Option<&str> {
        self.request.request_id()
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.request.header(name)
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    pub fn query_value(&self, key: &str) -> Option<&QueryValue> {
        self.query.get(key)
    }

    /// Override the status used by the next emission.
    pub fn status(&mut self, status: StatusCode) -> &mut Self {
        self.response.set_status(status);
        self
    }

    pub fn is_responded(&self) -> bool {
        self.response.is_ended()
    }

    pub fn text(&mut self, body: impl Into<String>) {
        self.emit(TEXT_PLAIN, body.into().into_bytes());
    }

    pub fn html(&mut self, body: impl Into<String>) {
        self.emit(TEXT_HTML, body.into().into_bytes());
    }

    /// Serialize `body` as JSON and emit it.
    ///
    /// Nothing is written when serialization fails.
    pub fn json<T: Serialize + ?Sized>(&mut self, body: &T) -> Result<(), serde_json::Error> {
        let encoded = serde_json::to_vec(body)?;
        self.emit(APPLICATION_JSON, encoded);
        Ok(())
    }

    /// Emit `404 Not Found` as plain text, regardless of any status set earlier.
    pub fn not_found(&mut self) {
        self.response.write_head(StatusCode::NOT_FOUND, TEXT_PLAIN);
        self.response.end("Not Found");
    }

    pub(crate) fn split(&mut self) -> (&RawRequest, &mut RawResponse) {
        (&self.request, &mut self.response)
    }

    fn emit(&mut self, content_type: &'static str, body: Vec<u8>) {
        let status = self.response.status();
        self.response.write_head(status, content_type);
        self.response.end(body);
    }
}
