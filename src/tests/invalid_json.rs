use axum::body::Body;
use axum::http::header::AUTHORIZATION;
use axum::http::header::CONTENT_TYPE;
use axum::http::Method;
use axum::http::Request;
use axum::http::StatusCode;
use axum::Router;
use tower::Service;

use crate::tests::helper;

async fn create_link_with_raw_body(
    app: &mut Router,
    access_token: &str,
    body: &'static str,
    include_content_type: bool,
) -> StatusCode {
    let mut builder = Request::builder().method(Method::POST).uri("/api/links");

    if include_content_type {
        builder = builder.header(CONTENT_TYPE, mime::APPLICATION_JSON.as_ref());
    }

    let request = builder
        .header(AUTHORIZATION, access_token)
        .body(Body::from(body.as_bytes()))
        .unwrap();

    let response = app.call(request).await.unwrap();

    response.status()
}

#[tokio::test]
async fn test_invalid_json_syntax() {
    let mut app = helper::setup_test_app();

    let access_token = helper::login(&mut app).await;

    let status_code =
        create_link_with_raw_body(&mut app, &access_token, "{ not json", true).await;

    assert_eq!(StatusCode::BAD_REQUEST, status_code);
}

#[tokio::test]
async fn test_missing_content_type() {
    let mut app = helper::setup_test_app();

    let access_token = helper::login(&mut app).await;

    let status_code = create_link_with_raw_body(
        &mut app,
        &access_token,
        r#"{ "slug": "ok", "destinationUrl": "https://www.example.com/" }"#,
        false,
    )
    .await;

    assert_eq!(StatusCode::BAD_REQUEST, status_code);
}

#[tokio::test]
async fn test_wrongly_typed_fields() {
    let mut app = helper::setup_test_app();

    let access_token = helper::login(&mut app).await;

    let status_code = create_link_with_raw_body(
        &mut app,
        &access_token,
        r#"{ "slug": 42, "destinationUrl": "https://www.example.com/" }"#,
        true,
    )
    .await;

    assert_eq!(StatusCode::BAD_REQUEST, status_code);
}

#[tokio::test]
async fn test_missing_required_fields() {
    let mut app = helper::setup_test_app();

    let access_token = helper::login(&mut app).await;

    let status_code =
        create_link_with_raw_body(&mut app, &access_token, r#"{ "slug": "ok" }"#, true).await;

    assert_eq!(StatusCode::BAD_REQUEST, status_code);
}
