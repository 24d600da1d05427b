mod common;

use axum::{
    body,
    http::{Method, StatusCode},
    response::Response,
};
use sea_orm::EntityTrait;
use serde_json::{json, Value};

use mrp_event_bridge::entities::system_parameter;
use mrp_event_bridge::services::settings::{DEFAULT_ENDPOINT_URL, DEFAULT_TIMEOUT_SECS};

use common::TestApp;

async fn response_json(response: Response) -> Value {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body bytes");
    serde_json::from_slice(&bytes).expect("json response")
}

#[tokio::test]
async fn first_read_seeds_documented_defaults() {
    let app = TestApp::new().await;

    let response = app.request(Method::GET, "/api/v1/settings/bridge", None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = response_json(response).await;
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["data"]["endpoint_url"], DEFAULT_ENDPOINT_URL);
    assert_eq!(body["data"]["timeout_secs"], DEFAULT_TIMEOUT_SECS);
    assert_eq!(body["data"]["enabled"], json!(true));

    let params = system_parameter::Entity::find()
        .all(&*app.state.db)
        .await
        .expect("query parameters");
    assert_eq!(params.len(), 3);
}

#[tokio::test]
async fn update_round_trips_through_the_parameter_store() {
    let app = TestApp::new().await;

    let payload = json!({
        "endpoint_url": "http://10.0.0.9:8080/api/work_operation.php",
        "timeout_secs": 30,
        "enabled": false
    });
    let response = app
        .request(Method::PUT, "/api/v1/settings/bridge", Some(payload))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = response_json(response).await;
    assert_eq!(
        body["data"]["endpoint_url"],
        "http://10.0.0.9:8080/api/work_operation.php"
    );
    assert_eq!(body["data"]["timeout_secs"], 30);
    assert_eq!(body["data"]["enabled"], json!(false));

    let reread = app.request(Method::GET, "/api/v1/settings/bridge", None).await;
    let body = response_json(reread).await;
    assert_eq!(body["data"]["timeout_secs"], 30);
    assert_eq!(body["data"]["enabled"], json!(false));
}

#[tokio::test]
async fn partial_update_keeps_unmentioned_fields() {
    let app = TestApp::new().await;

    let response = app
        .request(
            Method::PUT,
            "/api/v1/settings/bridge",
            Some(json!({ "enabled": false })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = response_json(response).await;
    assert_eq!(body["data"]["enabled"], json!(false));
    assert_eq!(body["data"]["endpoint_url"], DEFAULT_ENDPOINT_URL);
    assert_eq!(body["data"]["timeout_secs"], DEFAULT_TIMEOUT_SECS);
}

#[tokio::test]
async fn zero_timeout_is_rejected() {
    let app = TestApp::new().await;

    let response = app
        .request(
            Method::PUT,
            "/api/v1/settings/bridge",
            Some(json!({ "timeout_secs": 0 })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = response_json(response).await;
    assert_eq!(body["error"], "Bad Request");
}

#[tokio::test]
async fn endpoint_url_is_trimmed_on_write() {
    let app = TestApp::new().await;

    let response = app
        .request(
            Method::PUT,
            "/api/v1/settings/bridge",
            Some(json!({ "endpoint_url": "  http://127.0.0.1:9999/hook  " })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = response_json(response).await;
    assert_eq!(body["data"]["endpoint_url"], "http://127.0.0.1:9999/hook");
}
