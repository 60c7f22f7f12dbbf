//! Routing error taxonomy.

use thiserror::Error;

/// Errors produced while registering or resolving routes.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RoutingError {
    /// Neither the method bucket nor the `ALL` bucket matched.
    #[error("no route found for {method} {path}")]
    NoRouteFound { method: String, path: String },

    /// The pattern could not be compiled. Raised at registration time.
    #[error("malformed route pattern `{pattern}`: {reason}")]
    MalformedPattern { pattern: String, reason: String },
}

impl RoutingError {
    pub(crate) fn malformed(pattern: &str, reason: impl Into<String>) -> Self {
        RoutingError::MalformedPattern {
            pattern: pattern.to_string(),
            reason: reason.into(),
        }
    }
}
