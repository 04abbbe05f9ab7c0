//! Router-level tests that run without a database: status, content
//! negotiation, the recovery boundary, and the auth guards.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    response::Response,
    Router,
};
use http_body_util::BodyExt;
use tower::ServiceExt;
use webapp::config::{AppConfig, BuildInfo};
use webapp::web::status::StatusDto;
use webapp::{build_router, AppState};

const BASIC_AUTH_OK: &str = "Basic YWRtaW46c2VjcmV0"; // admin:secret
const BASIC_AUTH_BAD: &str = "Basic YWRtaW46d3Jvbmc="; // admin:wrong

fn test_config() -> AppConfig {
    AppConfig {
        environment: "test".to_string(),
        database_url: None,
        cookie_keys: Vec::new(),
        api_auth: ("admin".to_string(), "secret".to_string()),
        assets_dir: None,
        filename_404: "404.html".to_string(),
        filename_500: "500.html".to_string(),
        build: BuildInfo::current(),
    }
}

fn test_app() -> Router {
    let state = AppState::new(test_config(), None).expect("app state");
    build_router(state)
}

async fn send(req: Request<Body>) -> Response {
    test_app().oneshot(req).await.expect("infallible")
}

async fn body_string(res: Response) -> String {
    let bytes = res.into_body().collect().await.expect("body").to_bytes();
    String::from_utf8(bytes.to_vec()).expect("utf-8 body")
}

fn content_type(res: &Response) -> String {
    res.headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

#[tokio::test]
async fn status_route_reports_ok() {
    let res = send(
        Request::get("/_status")
            .header(header::HOST, "example.test")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);

    let body: StatusDto = serde_json::from_str(&body_string(res).await).unwrap();
    assert_eq!(body.status, "ok");
    assert_eq!(body.env, "test");
    assert_eq!(body.http.method, "GET");
    assert_eq!(body.http.url, "/_status");
    assert_eq!(body.http.host, "example.test");
    assert!(!body.build.version.is_empty());
}

#[tokio::test]
async fn hello_route_greets() {
    let res = send(Request::get("/hello?name=Alice").body(Body::empty()).unwrap()).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(
        body_string(res).await,
        r#"{"greetings":"Hello, Alice!"}"#
    );

    let res = send(Request::get("/hello").body(Body::empty()).unwrap()).await;
    assert_eq!(
        body_string(res).await,
        r#"{"greetings":"Hello, World!"}"#
    );
}

#[tokio::test]
async fn unknown_path_is_html_404_by_default() {
    let res = send(Request::get("/notfound").body(Body::empty()).unwrap()).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(content_type(&res), "text/html; charset=utf-8");

    let body = body_string(res).await;
    assert!(body.contains("404"), "{body}");
    assert!(body.contains("Not found"), "{body}");
}

#[tokio::test]
async fn unknown_path_is_json_404_when_preferred() {
    let res = send(
        Request::get("/notfound")
            .header(header::ACCEPT, "application/json,*")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert!(content_type(&res).starts_with("application/json"));
    assert_eq!(body_string(res).await, r#"{"error":"not found"}"#);
}

#[tokio::test]
async fn json_content_type_without_accept_negotiates_json() {
    let res = send(
        Request::get("/notfound")
            .header(header::CONTENT_TYPE, "text/json")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_string(res).await, r#"{"error":"not found"}"#);
}

#[tokio::test]
async fn panic_route_yields_html_500() {
    let res = send(Request::get("/panic").body(Body::empty()).unwrap()).await;
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(content_type(&res), "text/html; charset=utf-8");

    let body = body_string(res).await;
    assert!(body.contains("500"), "{body}");
    assert!(body.contains("Internal server error"), "{body}");
}

#[tokio::test]
async fn panic_route_never_leaks_the_cause() {
    let res = send(
        Request::get("/panic?message=kaboom-secret")
            .header(header::ACCEPT, "application/json,*")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_string(res).await, r#"{"error":"internal server error"}"#);
}

#[tokio::test]
async fn injected_client_error_echoes_the_message() {
    let res = send(
        Request::get("/panic?status=418&message=teapot")
            .header(header::ACCEPT, "application/json")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::IM_A_TEAPOT);
    assert_eq!(body_string(res).await, r#"{"error":"teapot"}"#);
}

#[tokio::test]
async fn injected_server_error_hides_the_message() {
    let res = send(
        Request::get("/panic?status=500&message=db-password-42")
            .header(header::ACCEPT, "application/json")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_string(res).await, r#"{"error":"internal server error"}"#);
}

#[tokio::test]
async fn api_requires_auth_before_anything_else() {
    // The test state has no database, so a 401 here proves the guard runs
    // before any database access could happen.
    let requests = [
        Request::get("/api/v1/users").body(Body::empty()).unwrap(),
        Request::put("/api/v1/users")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"name":"Alice"}"#))
            .unwrap(),
        Request::get("/api/v1/users/1").body(Body::empty()).unwrap(),
        Request::post("/api/v1/users/1")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"name":"Bob"}"#))
            .unwrap(),
        Request::delete("/api/v1/users/1").body(Body::empty()).unwrap(),
    ];
    for req in requests {
        let res = send(req).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }
}

#[tokio::test]
async fn api_rejects_bad_credentials() {
    let res = send(
        Request::get("/api/v1/users")
            .header(header::AUTHORIZATION, BASIC_AUTH_BAD)
            .header(header::ACCEPT, "application/json")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_string(res).await, r#"{"error":"unauthorized"}"#);
}

#[tokio::test]
async fn api_with_auth_but_no_database_hides_the_cause() {
    let res = send(
        Request::get("/api/v1/users")
            .header(header::AUTHORIZATION, BASIC_AUTH_OK)
            .header(header::ACCEPT, "application/json")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_string(res).await, r#"{"error":"internal server error"}"#);
}

#[tokio::test]
async fn login_page_is_served() {
    let res = send(Request::get("/login").body(Body::empty()).unwrap()).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(content_type(&res), "text/html; charset=utf-8");
    assert!(body_string(res).await.contains("<form"));
}

#[tokio::test]
async fn login_with_empty_credentials_is_401() {
    let res = send(
        Request::post("/login")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .header(header::ACCEPT, "application/json")
            .body(Body::from("name=&password="))
            .unwrap(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_string(res).await, r#"{"error":"unauthorized"}"#);
}

#[tokio::test]
async fn logout_redirects_home() {
    let res = send(Request::get("/logout").body(Body::empty()).unwrap()).await;
    assert!(res.status().is_redirection());
    assert_eq!(
        res.headers().get(header::LOCATION).unwrap().to_str().unwrap(),
        "/"
    );
}

#[tokio::test]
async fn static_assets_are_served_with_content_type() {
    let res = send(Request::get("/main.css").body(Body::empty()).unwrap()).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(content_type(&res), "text/css; charset=utf-8");

    let res = send(Request::get("/").body(Body::empty()).unwrap()).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(content_type(&res), "text/html; charset=utf-8");
}

#[tokio::test]
async fn path_traversal_is_not_found() {
    let res = send(
        Request::get("/../Cargo.toml")
            .header(header::ACCEPT, "application/json")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}
