//! Route lookup and dispatch.
//!
//! # Responsibilities
//! - Store compiled routes per method bucket, plus the `ALL` bucket
//! - Look up the first matching route for a request
//! - Return the matched route or an explicit `NoRouteFound`
//!
//! # Design Decisions
//! - Append-only during registration, immutable afterwards (shared without locks)
//! - First match wins, in registration order; no specificity ranking
//! - Method bucket is scanned before `ALL`
//! - Methods outside the recognised set fail immediately, without an `ALL` scan

use std::collections::HashMap;
use std::fmt;

use axum::http::Method;

use crate::routing::matcher::{Params, PathMatcher};
use crate::routing::RoutingError;

/// A route bucket key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouteMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Options,
    Head,
    /// Method-agnostic fallback bucket.
    All,
}

impl RouteMethod {
    /// Map a request method to its bucket. Unrecognised methods have none.
    pub fn from_http(method: &Method) -> Option<Self> {
        match method.as_str() {
            "GET" => Some(RouteMethod::Get),
            "POST" => Some(RouteMethod::Post),
            "PUT" => Some(RouteMethod::Put),
            "DELETE" => Some(RouteMethod::Delete),
            "PATCH" => Some(RouteMethod::Patch),
            "OPTIONS" => Some(RouteMethod::Options),
            "HEAD" => Some(RouteMethod::Head),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RouteMethod::Get => "GET",
            RouteMethod::Post => "POST",
            RouteMethod::Put => "PUT",
            RouteMethod::Delete => "DELETE",
            RouteMethod::Patch => "PATCH",
            RouteMethod::Options => "OPTIONS",
            RouteMethod::Head => "HEAD",
            RouteMethod::All => "ALL",
        }
    }
}

impl fmt::Display for RouteMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A registered route: compiled pattern plus its handler.
#[derive(Debug)]
pub struct Route<H> {
    matcher: PathMatcher,
    handler: H,
}

impl<H> Route<H> {
    pub fn pattern(&self) -> &str {
        self.matcher.pattern()
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }
}

/// Result of a successful resolution.
#[derive(Debug)]
pub struct RouteMatch<'a, H> {
    pub route: &'a Route<H>,
    pub bucket: RouteMethod,
    pub params: Params,
}

/// Per-method route storage.
///
/// Generic over the handler type so lookup semantics can be exercised
/// independently of the HTTP layer.
#[derive(Debug)]
pub struct RouteTable<H> {
    buckets: HashMap<RouteMethod, Vec<Route<H>>>,
}

impl<H> RouteTable<H> {
    pub fn new() -> Self {
        Self {
            buckets: HashMap::new(),
        }
    }

    /// Compile `pattern` and append the route to the `method` bucket.
    pub fn register(
        &mut self,
        method: RouteMethod,
        pattern: &str,
        handler: H,
    ) -> Result<(), RoutingError> {
        let matcher = PathMatcher::compile(pattern)?;

        tracing::debug!(
            method = %method,
            pattern = %pattern,
            params = ?matcher.param_names(),
            "Route registered"
        );

        self.buckets
            .entry(method)
            .or_default()
            .push(Route { matcher, handler });
        Ok(())
    }

    /// Resolve a request to the first matching route.
    pub fn resolve(&self, method: &Method, path: &str) -> Result<RouteMatch<'_, H>, RoutingError> {
        let not_found = || RoutingError::NoRouteFound {
            method: method.to_string(),
            path: path.to_string(),
        };

        let bucket = RouteMethod::from_http(method).ok_or_else(not_found)?;

        self.scan(bucket, path)
            .or_else(|| self.scan(RouteMethod::All, path))
            .ok_or_else(not_found)
    }

    /// Routes registered in `bucket`, in registration order.
    pub fn routes(&self, bucket: RouteMethod) -> &[Route<H>] {
        self.buckets.get(&bucket).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Total number of registered routes across all buckets.
    pub fn len(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn scan(&self, bucket: RouteMethod, path: &str) -> Option<RouteMatch<'_, H>> {
        self.routes(bucket).iter().find_map(|route| {
            route.matcher.matches(path).map(|params| RouteMatch {
                route,
                bucket,
                params,
            })
        })
    }
}

impl<H> Default for RouteTable<H> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(entries: &[(RouteMethod, &str, &'static str)]) -> RouteTable<&'static str> {
        let mut table = RouteTable::new();
        for (method, pattern, handler) in entries {
            table.register(*method, pattern, *handler).unwrap();
        }
        table
    }

    #[test]
    fn test_first_registered_match_wins() {
        let table = table(&[
            (RouteMethod::Get, "/users/:id", "by_id"),
            (RouteMethod::Get, "/users/me", "me"),
        ]);

        let matched = table.resolve(&Method::GET, "/users/me").unwrap();
        assert_eq!(*matched.route.handler(), "by_id");
        assert_eq!(matched.params.get("id").map(String::as_str), Some("me"));
    }

    #[test]
    fn test_method_bucket_beats_all() {
        let table = table(&[
            (RouteMethod::All, "/health", "any"),
            (RouteMethod::Get, "/health", "get"),
        ]);

        let matched = table.resolve(&Method::GET, "/health").unwrap();
        assert_eq!(*matched.route.handler(), "get");
        assert_eq!(matched.bucket, RouteMethod::Get);

        let matched = table.resolve(&Method::POST, "/health").unwrap();
        assert_eq!(*matched.route.handler(), "any");
        assert_eq!(matched.bucket, RouteMethod::All);
    }

    #[test]
    fn test_falls_back_to_all_when_method_bucket_misses() {
        let table = table(&[
            (RouteMethod::Get, "/items", "list"),
            (RouteMethod::All, "/items/:id", "item"),
        ]);

        let matched = table.resolve(&Method::GET, "/items/9").unwrap();
        assert_eq!(*matched.route.handler(), "item");
        assert_eq!(matched.params.get("id").map(String::as_str), Some("9"));
    }

    #[test]
    fn test_no_route_found() {
        let table = table(&[(RouteMethod::Get, "/items", "list")]);

        let err = table.resolve(&Method::DELETE, "/items").unwrap_err();
        assert_eq!(
            err,
            RoutingError::NoRouteFound {
                method: "DELETE".into(),
                path: "/items".into(),
            }
        );
    }

    #[test]
    fn test_unrecognised_method_skips_all_bucket() {
        let table = table(&[(RouteMethod::All, "/trace", "any")]);

        let err = table.resolve(&Method::TRACE, "/trace").unwrap_err();
        assert!(matches!(err, RoutingError::NoRouteFound { .. }));
    }

    #[test]
    fn test_register_rejects_malformed_pattern() {
        let mut table: RouteTable<&str> = RouteTable::new();
        let err = table.register(RouteMethod::Get, "/users/:", "bad").unwrap_err();
        assert!(matches!(err, RoutingError::MalformedPattern { .. }));
        assert!(table.is_empty());
    }

    #[test]
    fn test_routes_keep_registration_order() {
        let table = table(&[
            (RouteMethod::Post, "/b", "b"),
            (RouteMethod::Post, "/a", "a"),
            (RouteMethod::Get, "/c", "c"),
        ]);

        let patterns: Vec<_> = table.routes(RouteMethod::Post).iter().map(Route::pattern).collect();
        assert_eq!(patterns, vec!["/b", "/a"]);
        assert_eq!(table.len(), 3);
        assert!(table.routes(RouteMethod::Put).is_empty());
    }
}
