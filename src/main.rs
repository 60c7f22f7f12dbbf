//! switchyard demo server.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ axum/hyper ──▶ request ID, trace, timeout, panic guard
//!                                          │
//!                                          ▼
//!                                  RequestContext::new
//!                                          │
//!                                          ▼
//!                           MiddlewareChain (registration order)
//!                              │ halted            │ exhausted
//!                              ▼                   ▼
//!                        response as-is    RouteTable::resolve
//!                                            │ match     │ none
//!                                            ▼           ▼
//!                                        handler(ctx)   404
//! ```

use std::path::PathBuf;

use clap::Parser;
use serde::Serialize;
use switchyard::config::{load_config, AppConfig};
use switchyard::http::{App, Next, RawRequest, RawResponse, RequestContext};
use switchyard::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "switchyard")]
#[command(about = "Minimal HTTP routing and middleware dispatch server", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port to listen on (overrides the config file).
    #[arg(short, long)]
    port: Option<u16>,
}

#[derive(Serialize)]
struct UserView<'a> {
    id: &'a str,
}

fn powered_by(_req: &RawRequest, res: &mut RawResponse, next: Next<'_>) {
    res.set_header(
        axum::http::HeaderName::from_static("x-powered-by"),
        axum::http::HeaderValue::from_static("switchyard"),
    );
    next.call();
}

fn access_log(ctx: &mut RequestContext, next: Next<'_>) {
    tracing::info!(
        request_id = ctx.request_id().unwrap_or("unknown"),
        method = %ctx.method(),
        path = %ctx.pathname,
        user_agent = ctx.header("user-agent").unwrap_or("-"),
        "Request received"
    );
    next.call();
}

fn build_app(config: AppConfig) -> Result<App, switchyard::RoutingError> {
    let mut app = App::with_config(config);

    app.use_middleware(access_log).use_middleware(powered_by);

    app.get("/", |mut ctx: RequestContext| async move {
        ctx.html("<h1>switchyard</h1>");
    })?
    .get("/users/:id", |mut ctx: RequestContext| async move {
        let id = ctx.param("id").unwrap_or_default().to_string();
        if let Err(e) = ctx.json(&UserView { id: &id }) {
            tracing::error!(error = %e, "Failed to encode user");
        }
    })?
    .get("/search", |mut ctx: RequestContext| async move {
        let query = ctx.query.clone();
        if let Err(e) = ctx.json(&query) {
            tracing::error!(error = %e, "Failed to encode query");
        }
    })?
    .post("/echo", |mut ctx: RequestContext| async move {
        let body = String::from_utf8_lossy(ctx.body()).into_owned();
        ctx.text(body);
    })?
    .all("/health", |mut ctx: RequestContext| async move {
        ctx.text("ok");
    })?;

    Ok(app)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => AppConfig::default(),
    };

    logging::init(&config.observability)?;
    tracing::info!("switchyard v{} starting", env!("CARGO_PKG_VERSION"));

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let port = cli.port.unwrap_or(config.listener.port);
    let app = build_app(config)?;

    app.listen(port, |addr| {
        tracing::info!(address = %addr, "Listening for connections");
    })
    .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
