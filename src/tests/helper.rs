use std::time::Duration;

use axum::body::Body;
use axum::body::Bytes;
use axum::http::header::AUTHORIZATION;
use axum::http::header::CONTENT_TYPE;
use axum::http::header::LOCATION;
use axum::http::Method;
use axum::http::Request;
use axum::http::StatusCode;
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Map;
use serde_json::Value;
use tower::Service;
use uuid::Uuid;

use crate::setup_app;

/// Test helper version of the Link struct
#[derive(Debug)]
pub struct Link {
    pub id: Uuid,
    pub slug: String,
    pub destination_url: String,
    pub is_active: bool,
    pub expires_at: Option<String>,
    pub click_limit: Option<u64>,
    pub tags: Option<Vec<String>>,
}

/// Setup the Trimly app
///
/// Inject some environment variables to match our tests
pub fn setup_test_app() -> Router {
    std::env::set_var("ADMIN_USERNAME", "admin");
    std::env::set_var("ADMIN_PASSWORD", "verysecret");
    std::env::set_var("JWT_SECRET", "verysecret");

    setup_app()
}

async fn send(app: &mut Router, request: Request<Body>) -> (StatusCode, Option<String>, Bytes) {
    let response = app.call(request).await.unwrap();

    let status_code = response.status();

    let location = response.headers().get(LOCATION);
    let location = location.map(|header| header.to_str().unwrap().to_string());

    let body = response.into_body().collect().await.unwrap().to_bytes();

    (status_code, location, body)
}

fn json_request(
    method: Method,
    uri: String,
    access_token: Option<&str>,
    payload: &Value,
) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(CONTENT_TYPE, mime::APPLICATION_JSON.as_ref());

    if let Some(access_token) = access_token {
        builder = builder.header(AUTHORIZATION, access_token);
    }

    builder
        .body(Body::from(serde_json::to_vec(payload).unwrap()))
        .unwrap()
}

fn bare_request(method: Method, uri: String, access_token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);

    if let Some(access_token) = access_token {
        builder = builder.header(AUTHORIZATION, access_token);
    }

    builder.body(Body::empty()).unwrap()
}

pub async fn root(app: &mut Router, slug: &str) -> (StatusCode, Option<String>, String) {
    root_with_headers(app, slug, &[]).await
}

pub async fn root_with_headers(
    app: &mut Router,
    slug: &str,
    headers: &[(&str, &str)],
) -> (StatusCode, Option<String>, String) {
    let mut builder = Request::builder().method(Method::GET).uri(format!("/{slug}"));

    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }

    let request = builder.body(Body::empty()).unwrap();

    let (status_code, location, body) = send(app, request).await;

    (
        status_code,
        location,
        String::from_utf8_lossy(&body[..]).to_string(),
    )
}

pub async fn maybe_login(
    app: &mut Router,
    username: &str,
    password: &str,
) -> (StatusCode, Option<String>, String) {
    let mut payload = Map::new();
    payload.insert("username".to_string(), Value::String(username.to_string()));
    payload.insert("password".to_string(), Value::String(password.to_string()));

    let request = json_request(
        Method::POST,
        "/api/auth/login".to_string(),
        None,
        &Value::Object(payload),
    );

    let (status_code, _, body) = send(app, request).await;

    (
        status_code,
        if status_code == StatusCode::OK {
            Some(get_access_token(&body))
        } else {
            None
        },
        String::from_utf8_lossy(&body[..]).to_string(),
    )
}

pub async fn login(app: &mut Router) -> String {
    let (status_code, access_token, _) = maybe_login(app, "admin", "verysecret").await;

    assert_eq!(StatusCode::OK, status_code);

    access_token.unwrap()
}

pub async fn maybe_create_link(
    app: &mut Router,
    access_token: &str,
    payload: Value,
) -> (StatusCode, Option<Link>, Option<String>) {
    let request = json_request(
        Method::POST,
        "/api/links".to_string(),
        Some(access_token),
        &payload,
    );

    let (status_code, _, body) = send(app, request).await;

    (
        status_code,
        if status_code == StatusCode::CREATED {
            Some(get_link(&body))
        } else {
            None
        },
        if status_code.is_client_error() {
            Some(get_error_message(&body))
        } else {
            None
        },
    )
}

pub async fn create_link(app: &mut Router, access_token: &str, slug: &str, url: &str) -> Link {
    let mut payload = Map::new();
    payload.insert("slug".to_string(), Value::String(slug.to_string()));
    payload.insert(
        "destinationUrl".to_string(),
        Value::String(url.to_string()),
    );

    let (status_code, link, _) =
        maybe_create_link(app, access_token, Value::Object(payload)).await;

    assert_eq!(StatusCode::CREATED, status_code);

    link.unwrap()
}

pub async fn single_link(
    app: &mut Router,
    access_token: &str,
    id: &Uuid,
) -> (StatusCode, Option<Link>) {
    let request = bare_request(Method::GET, format!("/api/links/{id}"), Some(access_token));

    let (status_code, _, body) = send(app, request).await;

    (
        status_code,
        if status_code == StatusCode::OK {
            Some(get_link(&body))
        } else {
            None
        },
    )
}

pub async fn list_links(app: &mut Router, access_token: &str) -> (StatusCode, Vec<Link>) {
    let request = bare_request(Method::GET, "/api/links".to_string(), Some(access_token));

    let (status_code, _, body) = send(app, request).await;

    (
        status_code,
        if status_code == StatusCode::OK {
            get_links(&body)
        } else {
            Vec::new()
        },
    )
}

pub async fn maybe_update_link(
    app: &mut Router,
    access_token: &str,
    id: &Uuid,
    payload: Value,
) -> (StatusCode, Option<Link>, Option<String>) {
    let request = json_request(
        Method::PUT,
        format!("/api/links/{id}"),
        Some(access_token),
        &payload,
    );

    let (status_code, _, body) = send(app, request).await;

    (
        status_code,
        if status_code == StatusCode::OK {
            Some(get_link(&body))
        } else {
            None
        },
        if status_code.is_client_error() {
            Some(get_error_message(&body))
        } else {
            None
        },
    )
}

pub async fn delete_link(app: &mut Router, access_token: &str, id: &Uuid) -> StatusCode {
    let request = bare_request(Method::DELETE, format!("/api/links/{id}"), Some(access_token));

    let (status_code, _, body) = send(app, request).await;

    if status_code == StatusCode::OK {
        let ok = serde_json::from_slice::<Value>(&body[..]).unwrap()["data"]["ok"]
            .as_bool()
            .unwrap();
        assert!(ok);
    }

    status_code
}

pub async fn analytics_basic(
    app: &mut Router,
    access_token: &str,
    id: &Uuid,
) -> (StatusCode, Option<u64>) {
    let request = bare_request(
        Method::GET,
        format!("/api/analytics/{id}/basic"),
        Some(access_token),
    );

    let (status_code, _, body) = send(app, request).await;

    (
        status_code,
        if status_code == StatusCode::OK {
            serde_json::from_slice::<Value>(&body[..]).unwrap()["data"]["totalClicks"].as_u64()
        } else {
            None
        },
    )
}

/// Wait until the detached click writes have caught up with an expected
/// count, within a bounded number of polls
pub async fn wait_for_click_count(
    app: &mut Router,
    access_token: &str,
    id: &Uuid,
    expected: u64,
) -> u64 {
    let mut total_clicks = 0;

    for _ in 0..50 {
        let (status_code, count) = analytics_basic(app, access_token, id).await;
        assert_eq!(StatusCode::OK, status_code);

        total_clicks = count.unwrap();
        if total_clicks >= expected {
            break;
        }

        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    total_clicks
}

fn value_to_link(link: &Map<String, Value>) -> Link {
    Link {
        id: link["id"].as_str().map(Uuid::parse_str).unwrap().unwrap(),
        slug: link["slug"].as_str().map(ToString::to_string).unwrap(),
        destination_url: link["destinationUrl"]
            .as_str()
            .map(ToString::to_string)
            .unwrap(),
        is_active: link["isActive"].as_bool().unwrap(),
        expires_at: link
            .get("expiresAt")
            .and_then(Value::as_str)
            .map(ToString::to_string),
        click_limit: link.get("clickLimit").and_then(Value::as_u64),
        tags: link.get("tags").and_then(Value::as_array).map(|tags| {
            tags.iter()
                .map(|tag| tag.as_str().unwrap().to_string())
                .collect()
        }),
    }
}

fn get_link(body: &Bytes) -> Link {
    serde_json::from_slice::<Value>(&body[..]).unwrap()["data"]
        .as_object()
        .map(value_to_link)
        .unwrap()
}

fn get_links(body: &Bytes) -> Vec<Link> {
    serde_json::from_slice::<Value>(&body[..]).unwrap()["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|link| link.as_object().unwrap())
        .map(value_to_link)
        .collect()
}

fn get_error_message(body: &Bytes) -> String {
    serde_json::from_slice::<Value>(&body[..]).unwrap()["error"]
        .as_str()
        .map(ToString::to_string)
        .unwrap()
}

fn get_access_token(body: &Bytes) -> String {
    serde_json::from_slice::<Value>(&body[..]).unwrap()["data"]["token"]
        .as_str()
        .map(|token| format!("Bearer {token}"))
        .unwrap()
}
