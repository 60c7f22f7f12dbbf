//! Minimal HTTP routing and middleware dispatch engine.

pub mod config;
pub mod http;
pub mod observability;
pub mod routing;

pub use config::AppConfig;
pub use http::{App, Middleware, Next, QueryValue, RawRequest, RawResponse, RequestContext};
pub use routing::{RouteMethod, RoutingError};
