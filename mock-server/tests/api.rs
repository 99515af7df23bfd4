use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::{app, Echo, INVALID_UTF8};
use tower::ServiceExt;

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn get(uri: &str) -> Request<String> {
    Request::builder().uri(uri).body(String::new()).unwrap()
}

// --- echo ---

#[tokio::test]
async fn echo_reports_method_query_and_body() {
    let resp = app()
        .oneshot(
            Request::builder()
                .method("PATCH")
                .uri("/echo?a=1&b=two")
                .header(http::header::CONTENT_TYPE, "application/json")
                .header("x-trace", "abc")
                .body(r#"{"k":true}"#.to_string())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let echo: Echo = body_json(resp).await;
    assert_eq!(echo.method, "PATCH");
    assert_eq!(echo.query.get("a").map(String::as_str), Some("1"));
    assert_eq!(echo.query.get("b").map(String::as_str), Some("two"));
    assert_eq!(echo.headers.get("content-type").map(String::as_str), Some("application/json"));
    assert_eq!(echo.headers.get("x-trace").map(String::as_str), Some("abc"));
    assert_eq!(echo.body, r#"{"k":true}"#);
}

#[tokio::test]
async fn echo_without_query_has_empty_map() {
    let resp = app().oneshot(get("/echo")).await.unwrap();
    let echo: Echo = body_json(resp).await;
    assert_eq!(echo.method, "GET");
    assert!(echo.query.is_empty());
    assert!(echo.body.is_empty());
}

// --- status ---

#[tokio::test]
async fn status_with_message_returns_json() {
    let resp = app()
        .oneshot(get("/status/404?message=not%20found"))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: serde_json::Value = body_json(resp).await;
    assert_eq!(body["message"], "not found");
}

#[tokio::test]
async fn status_without_message_returns_text() {
    let resp = app().oneshot(get("/status/500")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_bytes(resp).await, "status 500");
}

#[tokio::test]
async fn status_bad_code_returns_400() {
    let resp = app().oneshot(get("/status/not-a-code")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// --- slow ---

#[tokio::test]
async fn slow_reports_delay() {
    let resp = app().oneshot(get("/slow/5")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = body_json(resp).await;
    assert_eq!(body["slept_ms"], 5);
}

// --- form ---

#[tokio::test]
async fn form_echoes_fields() {
    let resp = app()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/form")
                .header(http::header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body("name=Ann+Lee&age=30".to_string())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = body_json(resp).await;
    assert_eq!(body["name"], "Ann Lee");
    assert_eq!(body["age"], "30");
}

#[tokio::test]
async fn form_without_content_type_is_rejected() {
    let resp = app()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/form")
                .body("a=1".to_string())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
}

// --- envelope / empty ---

#[tokio::test]
async fn envelope_has_code_and_data() {
    let resp = app().oneshot(get("/envelope")).await.unwrap();
    let body: serde_json::Value = body_json(resp).await;
    assert_eq!(body["code"], 200);
    assert_eq!(body["data"]["users"][1], "bob");
}

#[tokio::test]
async fn empty_returns_204_without_body() {
    let resp = app().oneshot(get("/empty")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert!(body_bytes(resp).await.is_empty());
}

#[tokio::test]
async fn bytes_returns_status_with_invalid_utf8() {
    let resp = app().oneshot(get("/bytes/502")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    let body = body_bytes(resp).await;
    assert_eq!(body.as_ref(), INVALID_UTF8.as_slice());
    assert!(std::str::from_utf8(&body).is_err());
}
