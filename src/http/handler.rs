//! Route handlers.

use std::future::Future;
use std::sync::Arc;

use futures_util::future::BoxFuture;

use crate::http::context::RequestContext;

/// A route handler. Receives the context by value and emits through it.
///
/// Implemented for any `Fn(RequestContext) -> impl Future<Output = ()>`.
pub trait Handler: Send + Sync + 'static {
    fn call(&self, ctx: RequestContext) -> BoxFuture<'static, ()>;
}

impl<F, Fut> Handler for F
where
    F: Fn(RequestContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    fn call(&self, ctx: RequestContext) -> BoxFuture<'static, ()> {
        Box::pin(self(ctx))
    }
}

/// Shared, type-erased handler as stored in the route table.
pub type BoxHandler = Arc<dyn Handler>;
