//! Middleware chain.
//!
//! # Responsibilities
//! - Store middleware in registration order
//! - Invoke each middleware with a `next` continuation
//! - Stop the chain when a middleware does not forward
//! - Hand the context to the terminal stage when the chain is exhausted
//!
//! # Design Decisions
//! - Two calling shapes, tagged at registration: raw `(request, response, next)`
//!   and context `(context, next)`
//! - `next` marks a cursor owned by the driver loop; forwarding takes effect
//!   once the middleware returns
//! - Strictly sequential, single pass; no middleware runs twice per request
//! - Middleware is synchronous. Checks that need to await (an auth lookup,
//!   a rate-limit store) belong in the route handler, which is async
//! - Panics are not caught here

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use crate::http::context::RequestContext;
use crate::http::request::RawRequest;
use crate::http::response::RawResponse;

pub type RawFn = dyn Fn(&RawRequest, &mut RawResponse, Next<'_>) + Send + Sync;
pub type ContextFn = dyn Fn(&mut RequestContext, Next<'_>) + Send + Sync;

#[derive(Debug, Default)]
struct Cursor {
    position: usize,
    forwarded: bool,
}

/// Continuation handed to every middleware.
///
/// Calling [`Next::call`] passes control on; dropping it ends the chain.
pub struct Next<'a> {
    cursor: &'a mut Cursor,
}

impl Next<'_> {
    /// Forward to the following middleware, or to route resolution.
    pub fn call(self) {
        self.cursor.forwarded = true;
    }

    /// Index of the middleware currently holding this continuation.
    pub fn position(&self) -> usize {
        self.cursor.position
    }
}

impl fmt::Debug for Next<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Next")
            .field("position", &self.cursor.position)
            .finish()
    }
}

/// A registered middleware, tagged with its calling shape.
#[derive(Clone)]
pub enum Middleware {
    /// Receives the raw request, the raw response and `next`.
    Raw(Arc<RawFn>),
    /// Receives the request context and `next`.
    Context(Arc<ContextFn>),
}

impl Middleware {
    pub fn raw<F>(f: F) -> Self
    where
        F: Fn(&RawRequest, &mut RawResponse, Next<'_>) + Send + Sync + 'static,
    {
        Middleware::Raw(Arc::new(f))
    }

    pub fn context<F>(f: F) -> Self
    where
        F: Fn(&mut RequestContext, Next<'_>) + Send + Sync + 'static,
    {
        Middleware::Context(Arc::new(f))
    }

    pub fn shape(&self) -> &'static str {
        match self {
            Middleware::Raw(_) => "raw",
            Middleware::Context(_) => "context",
        }
    }

    fn invoke(&self, ctx: &mut RequestContext, next: Next<'_>) {
        match self {
            Middleware::Raw(f) => {
                let (request, response) = ctx.split();
                f(request, response, next)
            }
            Middleware::Context(f) => f(ctx, next),
        }
    }
}

impl fmt::Debug for Middleware {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Middleware").field(&self.shape()).finish()
    }
}

/// Marker for the `(request, response, next)` shape.
pub struct RawShape;

/// Marker for the `(context, next)` shape.
pub struct ContextShape;

/// Conversion into a tagged [`Middleware`], picked by the function's signature.
pub trait IntoMiddleware<Shape> {
    fn into_middleware(self) -> Middleware;
}

impl IntoMiddleware<()> for Middleware {
    fn into_middleware(self) -> Middleware {
        self
    }
}

impl<F> IntoMiddleware<RawShape> for F
where
    F: Fn(&RawRequest, &mut RawResponse, Next<'_>) + Send + Sync + 'static,
{
    fn into_middleware(self) -> Middleware {
        Middleware::raw(self)
    }
}

impl<F> IntoMiddleware<ContextShape> for F
where
    F: Fn(&mut RequestContext, Next<'_>) + Send + Sync + 'static,
{
    fn into_middleware(self) -> Middleware {
        Middleware::context(self)
    }
}

/// How a chain run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainOutcome {
    /// Every middleware forwarded; the terminal stage ran.
    Exhausted,
    /// The middleware at `position` did not forward.
    Halted { position: usize },
}

/// Ordered, append-only middleware list.
#[derive(Debug, Clone, Default)]
pub struct MiddlewareChain {
    stack: Vec<Middleware>,
}

impl MiddlewareChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, middleware: Middleware) {
        self.stack.push(middleware);
    }

    pub fn len(&self) -> usize {
        self.stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    /// Run the middleware front to back without the terminal stage.
    pub fn drive(&self, ctx: &mut RequestContext) -> ChainOutcome {
        let mut cursor = Cursor::default();

        while let Some(middleware) = self.stack.get(cursor.position) {
            cursor.forwarded = false;
            middleware.invoke(ctx, Next { cursor: &mut cursor });

            if !cursor.forwarded {
                tracing::debug!(
                    position = cursor.position,
                    shape = middleware.shape(),
                    "Middleware halted the chain"
                );
                return ChainOutcome::Halted {
                    position: cursor.position,
                };
            }
            cursor.position += 1;
        }

        ChainOutcome::Exhausted
    }

    /// Run the chain, then `terminal` if every middleware forwarded.
    pub async fn run<F, Fut>(&self, mut ctx: RequestContext, terminal: F) -> ChainOutcome
    where
        F: FnOnce(RequestContext) -> Fut,
        Fut: Future<Output = ()>,
    {
        let outcome = self.drive(&mut ctx);
        if outcome == ChainOutcome::Exhausted {
            terminal(ctx).await;
        }
        outcome
    }
}
