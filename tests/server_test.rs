//! Configuration-driven server behavior, including router hot swap.

use std::io::Write;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request as HttpRequest, StatusCode};
use rdev_router::config::{build_router, load_config, parse_config, ConfigError};
use rdev_router::http::{apply_reloads, default_container, HttpServer};
use rdev_router::{DependencyResolver, Shutdown};
use tokio::sync::mpsc;
use tower::ServiceExt;

const CONFIG: &str = r#"
[routing]
missing_route_controller = "HttpError@show"

[[routes]]
name = "home"
methods = ["GET"]
path = "/"
controller = "Echo@index"

[[groups]]
path = "/api"
host = "api.example.com"

[[groups.routes]]
name = "item"
methods = ["GET", "PUT"]
path = "/items/{id}"
controller = "Echo@show"
vars = { id = '\d+' }

[[groups.groups]]
path = "/admin"
https = true

[[groups.groups.routes]]
methods = ["ANY"]
path = "/stats"
controller = "Echo@stats"
"#;

fn resolver() -> Arc<dyn DependencyResolver> {
    Arc::new(default_container())
}

fn server(config: &str) -> HttpServer {
    let config = parse_config(config).unwrap();
    let router = build_router(&config, resolver()).unwrap();
    HttpServer::new(config, router)
}

fn request(method: &str, uri: &str, host: &str) -> HttpRequest<Body> {
    HttpRequest::builder()
        .method(method)
        .uri(uri)
        .header("host", host)
        .body(Body::empty())
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn routes_by_host_and_path() {
    let app = server(CONFIG).app();

    let response = app
        .clone()
        .oneshot(request("PUT", "/api/items/7", "api.example.com:8080"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["action"], "show");
    assert_eq!(body["host"], "api.example.com");

    let response = app
        .oneshot(request("GET", "/api/items/7", "other.example.com"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

fn forwarded_https(method: &str, uri: &str, host: &str) -> HttpRequest<Body> {
    let mut request = request(method, uri, host);
    request
        .headers_mut()
        .insert("x-forwarded-proto", "https".parse().unwrap());
    request
}

#[tokio::test]
async fn https_group_requires_secure_requests() {
    let app = server(CONFIG).app();

    let insecure = app
        .clone()
        .oneshot(request("DELETE", "/api/admin/stats", "api.example.com"))
        .await
        .unwrap();
    assert_eq!(insecure.status(), StatusCode::NOT_FOUND);

    // The forwarded scheme is client-controlled unless the listener trusts it.
    let spoofed = app
        .oneshot(forwarded_https("DELETE", "/api/admin/stats", "api.example.com"))
        .await
        .unwrap();
    assert_eq!(spoofed.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn trusted_forwarded_proto_reaches_https_routes() {
    let trusted = format!("[listener]\ntrust_forwarded_proto = true\n{}", CONFIG);
    let app = server(&trusted).app();

    let response = app
        .clone()
        .oneshot(forwarded_https("DELETE", "/api/admin/stats", "api.example.com"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let mut plain = forwarded_https("DELETE", "/api/admin/stats", "api.example.com");
    plain
        .headers_mut()
        .insert("x-forwarded-proto", "http".parse().unwrap());
    let response = app.oneshot(plain).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn assumed_https_listener_reaches_https_routes() {
    let assumed = format!("[listener]\nassume_https = true\n{}", CONFIG);
    let response = server(&assumed)
        .app()
        .oneshot(request("DELETE", "/api/admin/stats", "api.example.com"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn request_id_is_echoed() {
    let app = server(CONFIG).app();
    let mut req = request("GET", "/", "localhost");
    req.headers_mut().insert("x-request-id", "abc-123".parse().unwrap());

    let response = app.oneshot(req).await.unwrap();
    assert_eq!(response.headers()["x-request-id"], "abc-123");
}

#[tokio::test]
async fn without_missing_route_unmatched_is_plain_404() {
    let app = server("[[routes]]\nmethods = [\"GET\"]\npath = \"/\"\ncontroller = \"Echo@index\"").app();
    let response = app.oneshot(request("POST", "/", "localhost")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn reload_swaps_router_and_keeps_it_on_failure() {
    let server = server(CONFIG);
    let routes = server.routes();
    let app = server.app();
    let shutdown = Shutdown::new();
    let (tx, rx) = mpsc::unbounded_channel();
    let reloads = tokio::spawn(apply_reloads(routes.clone(), rx, resolver(), shutdown.clone()));

    let mut next = parse_config(CONFIG).unwrap();
    next.routes[0].path = "/home".into();
    tx.send(next).unwrap();

    // Reusing a name is rejected and the previous router stays.
    let mut broken = parse_config(CONFIG).unwrap();
    broken.routes[0].name = Some("item".into());
    tx.send(broken).unwrap();

    drop(tx);
    reloads.await.unwrap();

    assert!(routes.load().collection().named("home").is_some());
    assert_eq!(routes.load().collection().named("home").unwrap().raw_path(), "/home");

    let response = app.oneshot(request("GET", "/home", "localhost")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[test]
fn load_config_from_disk() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(CONFIG.as_bytes()).unwrap();

    let config = load_config(file.path()).unwrap();
    assert_eq!(config.groups[0].groups[0].https, Some(true));
    assert_eq!(config.routing.missing_route_controller.as_deref(), Some("HttpError@show"));
}

#[test]
fn invalid_config_reports_every_problem() {
    let err = parse_config(
        r#"
        [timeouts]
        request_secs = 0

        [[routes]]
        methods = ["GET"]
        path = "/{"
        controller = "A@b"
        "#,
    )
    .unwrap_err();

    match err {
        ConfigError::Validation(errors) => assert_eq!(errors.len(), 2),
        other => panic!("unexpected error: {}", other),
    }
}
