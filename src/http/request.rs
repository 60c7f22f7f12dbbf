//! Request handling and decomposition.
//!
//! # Responsibilities
//! - Generate unique request ID (UUID v4) at the transport edge
//! - Hold the raw request (method, URI, headers, buffered body)
//! - Decompose the query string into a multi-value mapping
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - Body is buffered as raw bytes only; it is never parsed
//! - A key seen once is `Single`, a repeated key becomes `Multi` in arrival order

use std::collections::HashMap;

use axum::body::Bytes;
use axum::http::{request::Parts, HeaderMap, HeaderValue, Method, Request, Uri, Version};
use serde::Serialize;
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

/// Header carrying the per-request correlation ID.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Parsed query string, keyed by parameter name.
pub type Query = HashMap<String, QueryValue>;

/// A query value. Repeated keys collapse into `Multi`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum QueryValue {
    Single(String),
    Multi(Vec<String>),
}

impl QueryValue {
    /// The first value for this key.
    pub fn first(&self) -> &str {
        match self {
            QueryValue::Single(value) => value.as_str(),
            QueryValue::Multi(values) => values.first().map(String::as_str).unwrap_or_default(),
        }
    }

    /// All values for this key, in arrival order.
    pub fn values(&self) -> Vec<&str> {
        match self {
            QueryValue::Single(value) => vec![value.as_str()],
            QueryValue::Multi(values) => values.iter().map(String::as_str).collect(),
        }
    }

    fn push(&mut self, value: String) {
        match self {
            QueryValue::Single(existing) => {
                let first = std::mem::take(existing);
                *self = QueryValue::Multi(vec![first, value]);
            }
            QueryValue::Multi(values) => values.push(value),
        }
    }
}

/// Decode an `application/x-www-form-urlencoded` query string.
pub fn parse_query(query: Option<&str>) -> Query {
    let mut parsed = Query::new();
    let Some(query) = query else {
        return parsed;
    };

    for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
        match parsed.get_mut(&*key) {
            Some(existing) => existing.push(value.into_owned()),
            None => {
                parsed.insert(key.into_owned(), QueryValue::Single(value.into_owned()));
            }
        }
    }
    parsed
}

/// The raw inbound request as delivered by the transport.
#[derive(Debug, Clone)]
pub struct RawRequest {
    method: Method,
    uri: Uri,
    version: Version,
    headers: HeaderMap,
    body: Bytes,
}

impl RawRequest {
    /// Build from transport parts and an already buffered body.
    pub fn from_parts(parts: Parts, body: Bytes) -> Self {
        Self {
            method: parts.method,
            uri: parts.uri,
            version: parts.version,
            headers: parts.headers,
            body,
        }
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Case-insensitive single header lookup. Non-UTF-8 values read as absent.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// The correlation ID assigned by the transport, if any.
    pub fn request_id(&self) -> Option<&str> {
        self.header(X_REQUEST_ID)
    }
}

impl<B: Into<Bytes>> From<Request<B>> for RawRequest {
    fn from(request: Request<B>) -> Self {
        let (parts, body) = request.into_parts();
        Self::from_parts(parts, body.into())
    }
}

/// Generates a v4 UUID for every request lacking an `x-request-id`.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidRequestId;

impl MakeRequestId for UuidRequestId {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}
