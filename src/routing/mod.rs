//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Registration (at startup):
//!     (method, pattern, handler)
//!     → matcher.rs (compile pattern, reject malformed)
//!     → router.rs (append to method bucket or ALL)
//!
//! Incoming Request (method, pathname)
//!     → router.rs (scan method bucket, then ALL)
//!     → matcher.rs (anchored match, extract params)
//!     → Return: RouteMatch or NoRouteFound
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - No regex in hot path (token matching only)
//! - Deterministic: same input always matches same route
//! - First match wins (ordered by registration)

pub mod error;
pub mod matcher;
pub mod router;

pub use error::RoutingError;
pub use matcher::{Params, PathMatcher};
pub use router::{Route, RouteMatch, RouteMethod, RouteTable};
