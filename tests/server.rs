//! End-to-end tests over a real socket.

use std::time::Duration;

use serde_json::{json, Value};
use switchyard::{App, Middleware, Next, RawRequest, RawResponse, RequestContext};

mod common;

fn powered_by(_req: &RawRequest, res: &mut RawResponse, next: Next<'_>) {
    res.set_header(
        axum::http::HeaderName::from_static("x-powered-by"),
        axum::http::HeaderValue::from_static("switchyard"),
    );
    next.call();
}

fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_full_request_flow() {
    let mut app = App::with_config(common::test_config());
    app.use_middleware(powered_by);
    app.get("/users/:id", |mut ctx: RequestContext| async move {
        let id = ctx.param("id").unwrap_or_default().to_string();
        let lang = ctx.query_value("lang").map(|v| v.first().to_string());
        ctx.json(&json!({ "id": id, "lang": lang })).unwrap();
    })
    .unwrap();

    let addr = common::spawn_app(app).await;
    let res = client()
        .get(format!("http://{addr}/users/42?lang=en"))
        .send()
        .await
        .expect("server unreachable");

    assert_eq!(res.status(), 200);
    assert_eq!(res.headers()["content-type"], "application/json");
    assert_eq!(res.headers()["x-powered-by"], "switchyard");
    assert!(res.headers().contains_key("x-request-id"));

    let body: Value = res.json().await.unwrap();
    assert_eq!(body, json!({ "id": "42", "lang": "en" }));
}

#[tokio::test]
async fn test_not_found_over_the_wire() {
    let app = App::with_config(common::test_config());
    let addr = common::spawn_app(app).await;

    let res = client()
        .get(format!("http://{addr}/nowhere"))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 404);
    assert_eq!(res.headers()["content-type"], "text/plain");
    assert_eq!(res.text().await.unwrap(), "Not Found");
}

#[tokio::test]
async fn test_incoming_request_id_is_kept() {
    let mut app = App::with_config(common::test_config());
    app.get("/", |mut ctx: RequestContext| async move {
        let id = ctx.request_id().unwrap_or_default().to_string();
        ctx.text(id);
    })
    .unwrap();

    let addr = common::spawn_app(app).await;
    let res = client()
        .get(format!("http://{addr}/"))
        .header("X-Request-Id", "abc-123")
        .send()
        .await
        .unwrap();

    assert_eq!(res.headers()["x-request-id"], "abc-123");
    assert_eq!(res.text().await.unwrap(), "abc-123");
}

#[tokio::test]
async fn test_post_body_reaches_handler() {
    let mut app = App::with_config(common::test_config());
    app.post("/echo", |mut ctx: RequestContext| async move {
        let body = String::from_utf8_lossy(ctx.body()).into_owned();
        ctx.text(body);
    })
    .unwrap();

    let addr = common::spawn_app(app).await;
    let res = client()
        .post(format!("http://{addr}/echo"))
        .body("ping")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 200);
    assert_eq!(res.text().await.unwrap(), "ping");
}

#[tokio::test]
async fn test_middleware_short_circuit_over_the_wire() {
    let mut app = App::with_config(common::test_config());
    app.use_middleware(Middleware::context(|ctx, next| {
        if ctx.header("authorization").is_some() {
            next.call();
        } else {
            ctx.status(axum::http::StatusCode::UNAUTHORIZED).text("denied");
        }
    }));
    app.get("/secret", |mut ctx: RequestContext| async move { ctx.text("treasure") })
        .unwrap();

    let addr = common::spawn_app(app).await;
    let client = client();

    let denied = client
        .get(format!("http://{addr}/secret"))
        .send()
        .await
        .unwrap();
    assert_eq!(denied.status(), 401);
    assert_eq!(denied.text().await.unwrap(), "denied");

    let allowed = client
        .get(format!("http://{addr}/secret"))
        .header("Authorization", "Bearer token")
        .send()
        .await
        .unwrap();
    assert_eq!(allowed.status(), 200);
    assert_eq!(allowed.text().await.unwrap(), "treasure");
}

#[tokio::test]
async fn test_unanswered_handler_gets_500() {
    let mut app = App::with_config(common::test_config());
    app.get("/silent", |_ctx: RequestContext| async {}).unwrap();

    let addr = common::spawn_app(app).await;
    let res = client()
        .get(format!("http://{addr}/silent"))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 500);
}

#[tokio::test]
async fn test_slow_handler_hits_timeout() {
    let mut config = common::test_config();
    config.timeouts.request_secs = 1;

    let mut app = App::with_config(config);
    app.get("/slow", |mut ctx: RequestContext| async move {
        tokio::time::sleep(Duration::from_secs(5)).await;
        ctx.text("too late");
    })
    .unwrap();

    let addr = common::spawn_app(app).await;
    let res = client()
        .get(format!("http://{addr}/slow"))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 408);
}

#[tokio::test]
async fn test_head_route_over_the_wire() {
    let mut app = App::with_config(common::test_config());
    app.head("/ping", |mut ctx: RequestContext| async move { ctx.text("pong") })
        .unwrap();

    let addr = common::spawn_app(app).await;
    let res = client()
        .head(format!("http://{addr}/ping"))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 200);
    assert_eq!(res.headers()["content-type"], "text/plain");
}
