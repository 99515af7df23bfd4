//! End-to-end tests against the live mock server.
//!
//! # Design
//! Starts the mock server on a random port, then drives `FetchClient` with the
//! default `UreqTransport` over real HTTP. Covers encoding, every failure
//! class, and interceptors as they behave on the wire.

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::time::Duration;

use fetch_core::{
    request_interceptor_fn, response_interceptor_fn, ApiEnvelope, ClientConfig, FetchClient, HeaderInterceptor,
    RequestError, RequestOptions, ResponseCode,
};
use mock_server::Echo;
use serde_json::{json, Value};

/// Start the mock server on its own runtime and return its address.
fn start_server() -> SocketAddr {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener).await
        })
        .unwrap();
    });

    addr
}

fn client(addr: SocketAddr) -> FetchClient {
    FetchClient::new(ClientConfig::new(format!("http://{addr}"))).unwrap()
}

#[tokio::test]
async fn get_with_query_params() {
    let client = client(start_server());

    let echo: Echo = client
        .request(
            "/echo",
            RequestOptions::get()
                .param("q", "rust lang")
                .param("page", 2)
                .param("missing", Value::Null)
                .param("filter", json!({"tags": ["a", "b"]})),
        )
        .await
        .unwrap();

    assert_eq!(echo.method, "GET");
    assert_eq!(echo.query.get("q").map(String::as_str), Some("rust lang"));
    assert_eq!(echo.query.get("page").map(String::as_str), Some("2"));
    assert_eq!(
        echo.query.get("filter").map(String::as_str),
        Some(r#"{"tags":["a","b"]}"#)
    );
    assert!(!echo.query.contains_key("missing"));
}

#[tokio::test]
async fn post_json_body() {
    let client = client(start_server());

    let echo: Echo = client.post_json("/echo", json!({"a": 1})).await.unwrap();

    assert_eq!(echo.method, "POST");
    assert_eq!(echo.body, r#"{"a":1}"#);
    assert_eq!(
        echo.headers.get("content-type").map(String::as_str),
        Some("application/json")
    );
}

#[tokio::test]
async fn caller_content_type_survives() {
    let client = client(start_server());

    let echo: Echo = client
        .request(
            "/echo",
            RequestOptions::put()
                .header("Content-Type", "application/merge-patch+json")
                .json(json!({"name": "x"})),
        )
        .await
        .unwrap();

    assert_eq!(echo.method, "PUT");
    assert_eq!(
        echo.headers.get("content-type").map(String::as_str),
        Some("application/merge-patch+json")
    );
}

#[tokio::test]
async fn form_body_is_urlencoded() {
    let client = client(start_server());

    let fields: BTreeMap<String, String> = client
        .request("/form", RequestOptions::post().form(json!({"name": "Ann Lee", "age": 30})))
        .await
        .unwrap();

    assert_eq!(fields.get("name").map(String::as_str), Some("Ann Lee"));
    assert_eq!(fields.get("age").map(String::as_str), Some("30"));
}

#[tokio::test]
async fn form_string_is_sent_verbatim() {
    let client = client(start_server());

    let fields: BTreeMap<String, String> = client
        .request("/form", RequestOptions::post().form("a=1&b=two"))
        .await
        .unwrap();

    assert_eq!(fields.get("a").map(String::as_str), Some("1"));
    assert_eq!(fields.get("b").map(String::as_str), Some("two"));
}

#[tokio::test]
async fn not_found_with_json_message() {
    let client = client(start_server());

    let err = client
        .request_json("/status/404?message=not%20found", RequestOptions::default())
        .await
        .unwrap_err();

    assert_eq!(err.status, 404);
    assert_eq!(err.message, "not found");
    assert_eq!(err.data, Some(json!({"message": "not found"})));
    assert_eq!(err.response_code(), Some(ResponseCode::NotFound));
}

#[tokio::test]
async fn server_error_with_text_body() {
    let client = client(start_server());

    let err = client
        .request_json("/status/500", RequestOptions::default())
        .await
        .unwrap_err();

    assert_eq!(err.status, 500);
    assert_eq!(err.message, "HTTP 500 Internal Server Error");
    assert!(err.data.is_none());
}

#[tokio::test]
async fn delete_with_json_body_reaches_server() {
    let client = client(start_server());

    let echo: Echo = client
        .request("/echo", RequestOptions::delete().json(json!({"ids": [1, 2]})))
        .await
        .unwrap();

    assert_eq!(echo.method, "DELETE");
    assert_eq!(echo.body, r#"{"ids":[1,2]}"#);
    assert_eq!(
        echo.headers.get("content-type").map(String::as_str),
        Some("application/json")
    );
}

#[tokio::test]
async fn get_with_body_reaches_server() {
    let client = client(start_server());

    let echo: Echo = client
        .request("/echo", RequestOptions::get().body("search terms"))
        .await
        .unwrap();

    assert_eq!(echo.method, "GET");
    assert_eq!(echo.body, "search terms");
}

#[tokio::test]
async fn non_utf8_error_body_keeps_status() {
    let client = client(start_server());

    let err = client
        .request_json("/bytes/502", RequestOptions::default())
        .await
        .unwrap_err();

    assert_eq!(err.status, 502);
    assert_eq!(err.message, "HTTP 502 Bad Gateway");
    assert!(err.is_http());
    assert!(err.data.is_none());
}

#[tokio::test]
async fn slow_endpoint_times_out() {
    let client = client(start_server());

    let err = client
        .request_json(
            "/slow/2000",
            RequestOptions::get().timeout(Duration::from_millis(100)),
        )
        .await
        .unwrap_err();

    assert_eq!(err.status, 408);
    assert_eq!(err.message, "Request timed out");
    assert!(err.data.is_none());
}

#[tokio::test]
async fn unreachable_host_reports_status_zero() {
    // Grab a free port, then close it so nothing is listening.
    let addr = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap()
    };
    let client = client(addr);

    let err = client
        .request_json("/echo", RequestOptions::default())
        .await
        .unwrap_err();

    assert_eq!(err.status, 0);
    assert!(err.is_unreachable());
    assert!(err.data.is_none());
}

#[tokio::test]
async fn empty_response_is_null() {
    let client = client(start_server());

    let value = client
        .request_json("/empty", RequestOptions::delete())
        .await
        .unwrap();

    assert_eq!(value, Value::Null);
}

#[tokio::test]
async fn envelope_is_interpreted_by_caller() {
    let client = client(start_server());

    let envelope: ApiEnvelope<Value> = client.get("/envelope").await.unwrap();

    assert_eq!(envelope.response_code(), Some(ResponseCode::Success));
    assert_eq!(envelope.data.unwrap()["users"], json!(["ann", "bob"]));
}

#[tokio::test]
async fn interceptors_on_the_wire() {
    let mut client = client(start_server());
    client.add_request_interceptor(HeaderInterceptor::new("authorization", "Bearer t0k3n"));
    client.add_request_interceptor(request_interceptor_fn(|_url, opts: RequestOptions| async move {
        Ok(opts.param("via", "interceptor"))
    }));
    client.add_response_interceptor(response_interceptor_fn(
        |value| async move { Ok(value) },
        |err: RequestError| async move {
            if err.status == 404 {
                Ok(json!({"fallback": true}))
            } else {
                Err(err)
            }
        },
    ));

    let echo: Echo = client.get("/echo").await.unwrap();
    assert_eq!(
        echo.headers.get("authorization").map(String::as_str),
        Some("Bearer t0k3n")
    );
    assert_eq!(echo.query.get("via").map(String::as_str), Some("interceptor"));

    let recovered = client
        .request_json("/status/404", RequestOptions::default())
        .await
        .unwrap();
    assert_eq!(recovered, json!({"fallback": true}));

    let err = client
        .request_json("/status/503", RequestOptions::default())
        .await
        .unwrap_err();
    assert_eq!(err.status, 503);
}
