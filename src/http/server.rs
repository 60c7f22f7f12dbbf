//! HTTP server setup and dispatch.
//!
//! # Responsibilities
//! - Registration API: per-method routes, `ALL` routes, middleware
//! - Dispatch a raw request through middleware, resolution and handler
//! - Emit 404 when resolution fails
//! - Create the Axum router that feeds every request into dispatch
//! - Wire up transport middleware (tracing, timeout, body limit, request ID,
//!   panic guard) and per-request metrics
//! - Bind and serve
//!
//! # Design Decisions
//! - Registration happens before `listen`; the App is frozen behind an `Arc`
//! - The core only produces 200 and 404; 408, 413 and 500 come from the
//!   transport glue in this file
//! - A handler that never responds is the transport's problem: the timeout
//!   layer bounds it, and a handler that returns without emitting gets 500

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{Request, Response as HttpResponse, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    catch_panic::CatchPanicLayer,
    limit::RequestBodyLimitLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::AppConfig;
use crate::http::context::RequestContext;
use crate::http::error::{DispatchError, ServerError};
use crate::http::handler::{BoxHandler, Handler};
use crate::http::middleware::{IntoMiddleware, MiddlewareChain};
use crate::http::request::{RawRequest, UuidRequestId};
use crate::http::response::{MatchedRoute, RawResponse};
use crate::observability::metrics;
use crate::routing::{RouteMethod, RouteTable, RoutingError};

/// The application: route table, middleware chain and server settings.
pub struct App {
    routes: RouteTable<BoxHandler>,
    middleware: MiddlewareChain,
    config: AppConfig,
}

impl App {
    pub fn new() -> Self {
        Self::with_config(AppConfig::default())
    }

    pub fn with_config(config: AppConfig) -> Self {
        Self {
            routes: RouteTable::new(),
            middleware: MiddlewareChain::new(),
            config,
        }
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn routes(&self) -> &RouteTable<BoxHandler> {
        &self.routes
    }

    pub fn middleware(&self) -> &MiddlewareChain {
        &self.middleware
    }

    /// Register `handler` for `pattern` in the given bucket.
    ///
    /// Malformed patterns are rejected here rather than at request time.
    pub fn route<H: Handler>(
        &mut self,
        method: RouteMethod,
        pattern: &str,
        handler: H,
    ) -> Result<&mut Self, RoutingError> {
        self.routes.register(method, pattern, Arc::new(handler))?;
        Ok(self)
    }

    pub fn get<H: Handler>(&mut self, pattern: &str, handler: H) -> Result<&mut Self, RoutingError> {
        self.route(RouteMethod::Get, pattern, handler)
    }

    pub fn post<H: Handler>(&mut self, pattern: &str, handler: H) -> Result<&mut Self, RoutingError> {
        self.route(RouteMethod::Post, pattern, handler)
    }

    pub fn put<H: Handler>(&mut self, pattern: &str, handler: H) -> Result<&mut Self, RoutingError> {
        self.route(RouteMethod::Put, pattern, handler)
    }

    pub fn delete<H: Handler>(&mut self, pattern: &str, handler: H) -> Result<&mut Self, RoutingError> {
        self.route(RouteMethod::Delete, pattern, handler)
    }

    pub fn patch<H: Handler>(&mut self, pattern: &str, handler: H) -> Result<&mut Self, RoutingError> {
        self.route(RouteMethod::Patch, pattern, handler)
    }

    pub fn options<H: Handler>(&mut self, pattern: &str, handler: H) -> Result<&mut Self, RoutingError> {
        self.route(RouteMethod::Options, pattern, handler)
    }

    pub fn head<H: Handler>(&mut self, pattern: &str, handler: H) -> Result<&mut Self, RoutingError> {
        self.route(RouteMethod::Head, pattern, handler)
    }

    /// Register a method-agnostic route, consulted after the method bucket.
    pub fn all<H: Handler>(&mut self, pattern: &str, handler: H) -> Result<&mut Self, RoutingError> {
        self.route(RouteMethod::All, pattern, handler)
    }

    /// Append a middleware. Its shape is taken from the function signature.
    pub fn use_middleware<S, M: IntoMiddleware<S>>(&mut self, middleware: M) -> &mut Self {
        let middleware = middleware.into_middleware();
        tracing::debug!(
            position = self.middleware.len(),
            shape = middleware.shape(),
            "Middleware registered"
        );
        self.middleware.push(middleware);
        self
    }

    /// Run one request through middleware, resolution and handler.
    ///
    /// A response produced by a route carries its pattern as a [`MatchedRoute`]
    /// extension.
    pub async fn dispatch(&self, request: RawRequest) -> Result<HttpResponse<Bytes>, DispatchError> {
        let method = request.method().clone();
        let request_id = request.request_id().unwrap_or("unknown").to_string();

        let (response, written) = RawResponse::channel();
        let ctx = RequestContext::new(request, response);
        let path = ctx.pathname.clone();
        let mut matched: Option<&str> = None;

        tracing::debug!(
            request_id = %request_id,
            method = %method,
            path = %path,
            "Dispatching request"
        );

        let outcome = self
            .middleware
            .run(ctx, |ctx| self.handle_route(ctx, &request_id, &mut matched))
            .await;

        match written.await {
            Ok(mut response) => {
                if let Some(pattern) = matched {
                    response
                        .extensions_mut()
                        .insert(MatchedRoute(pattern.to_string()));
                }
                Ok(response)
            }
            Err(_) => {
                tracing::error!(
                    request_id = %request_id,
                    method = %method,
                    path = %path,
                    outcome = ?outcome,
                    "Request finished without a response"
                );
                Err(DispatchError::Unanswered {
                    method: method.to_string(),
                    path,
                    route: matched.map(str::to_string),
                })
            }
        }
    }

    async fn handle_route<'a>(
        &'a self,
        mut ctx: RequestContext,
        request_id: &str,
        matched_pattern: &mut Option<&'a str>,
    ) {
        let resolved = self.routes.resolve(ctx.method(), &ctx.pathname);

        match resolved {
            Ok(matched) => {
                tracing::debug!(
                    request_id = %request_id,
                    pattern = %matched.route.pattern(),
                    bucket = %matched.bucket,
                    "Route matched"
                );
                *matched_pattern = Some(matched.route.pattern());
                let handler = Arc::clone(matched.route.handler());
                ctx.params = matched.params;
                handler.call(ctx).await;
            }
            Err(e) => {
                tracing::warn!(request_id = %request_id, error = %e, "No route matched");
                ctx.not_found();
            }
        }
    }

    /// Build the Axum router with all transport layers.
    #[allow(deprecated)]
    pub fn into_router(self) -> Router {
        let timeout = Duration::from_secs(self.config.timeouts.request_secs);
        let body_limit = self.config.listener.max_body_bytes;

        Router::new()
            .route("/{*path}", any(dispatch_handler))
            .route("/", any(dispatch_handler))
            .with_state(Arc::new(self))
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(UuidRequestId))
                    .layer(TraceLayer::new_for_http())
                    .layer(PropagateRequestIdLayer::x_request_id())
                    .layer(middleware::from_fn(track_requests))
                    .layer(RequestBodyLimitLayer::new(body_limit))
                    .layer(CatchPanicLayer::new())
                    .layer(TimeoutLayer::new(timeout)),
            )
    }

    /// Bind `host:port`, report the bound address, then serve until the process ends.
    ///
    /// Port 0 binds an ephemeral port; `on_ready` receives the real address.
    pub async fn listen<F>(self, port: u16, on_ready: F) -> Result<(), ServerError>
    where
        F: FnOnce(SocketAddr) + Send,
    {
        let address = format!("{}:{}", self.config.listener.host, port);
        let listener = TcpListener::bind(&address)
            .await
            .map_err(|source| ServerError::Bind {
                address: address.clone(),
                source,
            })?;

        on_ready(listener.local_addr()?);
        self.serve(listener).await
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn serve(self, listener: TcpListener) -> Result<(), ServerError> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            routes = self.routes.len(),
            middleware = self.middleware.len(),
            "HTTP server starting"
        );

        let app = self.into_router().into_make_service();
        axum::serve(listener, app).await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

/// Record every final outcome, including the 408, 413 and 500 responses
/// produced by the layers beneath.
async fn track_requests(request: Request<Body>, next: middleware::Next) -> Response {
    let start_time = Instant::now();
    let method = request.method().clone();

    let response = next.run(request).await;
    metrics::record_request(
        method.as_str(),
        response.status().as_u16(),
        MatchedRoute::label(&response),
        start_time,
    );
    response
}

/// Transport entry point: buffer the body, dispatch, translate the result.
///
/// Declared lengths over the limit never get here; this catches streamed bodies.
async fn dispatch_handler(State(app): State<Arc<App>>, request: Request<Body>) -> Response {
    let (parts, body) = request.into_parts();

    let body = match axum::body::to_bytes(body, app.config.listener.max_body_bytes).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(path = %parts.uri.path(), error = %e, "Failed to buffer request body");
            return (StatusCode::PAYLOAD_TOO_LARGE, "Payload Too Large").into_response();
        }
    };

    match app.dispatch(RawRequest::from_parts(parts, body)).await {
        Ok(response) => response.map(Body::from).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Dispatch failed");
            let mut response =
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response();
            let DispatchError::Unanswered { route, .. } = e;
            if let Some(route) = route {
                response.extensions_mut().insert(MatchedRoute(route));
            }
            response
        }
    }
}
