//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, body buffering)
//!     → request.rs (raw request, query decomposition)
//!     → context.rs (per-request context)
//!     → middleware.rs (ordered chain, may halt)
//!     → [routing resolves method + pathname]
//!     → handler.rs (matched handler) or 404
//!     → response.rs (single write-and-end)
//!     → Send to client
//! ```

pub mod context;
pub mod error;
pub mod handler;
pub mod middleware;
pub mod request;
pub mod response;
pub mod server;

pub use context::RequestContext;
pub use error::{DispatchError, ServerError};
pub use handler::{BoxHandler, Handler};
pub use middleware::{ChainOutcome, IntoMiddleware, Middleware, MiddlewareChain, Next};
pub use request::{parse_query, Query, QueryValue, RawRequest, X_REQUEST_ID};
pub use response::{MatchedRoute, RawResponse};
pub use server::App;
