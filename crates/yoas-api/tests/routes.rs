//! End-to-end tests of the HTTP surface against an in-memory database.

use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use yoas_api::{AppStateInner, router};
use yoas_db::Database;

const KEY: &str = "s3cret";

fn app(name: &str) -> (Router, PathBuf) {
    let dump_dir = std::env::temp_dir().join(format!("yoas_api_{}_{}", name, std::process::id()));
    let _ = std::fs::remove_dir_all(&dump_dir);
    let state = AppStateInner::new(
        Database::open_in_memory().unwrap(),
        KEY.to_string(),
        "/api".to_string(),
        dump_dir.clone(),
    );
    (router(Arc::new(state)), dump_dir)
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Vec<u8>) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(v) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(v.to_string())
        }
        None => Body::empty(),
    };
    let response = app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, bytes.to_vec())
}

async fn send_json(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let (status, bytes) = send(app, method, uri, body).await;
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn create(app: &Router, user_id: i64, message: &str) -> (StatusCode, Value) {
    send_json(
        app,
        Method::POST,
        &format!("/api/user?access_key={KEY}"),
        Some(json!({
            "user_id": user_id,
            "ban_reason": "spam",
            "additional_info": "reported twice",
            "message": message,
        })),
    )
    .await
}

#[tokio::test]
async fn create_get_delete_lifecycle() {
    let (app, _) = app("lifecycle");

    let (status, created) = create(&app, 100, "cheap\nwatches").await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["user_id"], 100);
    assert_eq!(created["ban_reason"], "spam");
    assert_eq!(created["message"]["text"], "cheap watches");
    assert!(created["utc_created_at"].is_f64());
    assert_eq!(created["utc_created_at_formatted"].as_str().unwrap().len(), 19);

    let (status, found) = send_json(&app, Method::GET, "/api/user?user_id=100", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(found["found"], true);
    assert_eq!(found["user"]["messages"][0]["text"], "cheap watches");

    let (status, deleted) = send_json(
        &app,
        Method::DELETE,
        &format!("/api/user?user_id=100&access_key={KEY}"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(deleted["found"], true);
    assert_eq!(deleted["user"]["messages"].as_array().unwrap().len(), 1);

    let (status, _) = send_json(&app, Method::GET, "/api/user?user_id=100", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send_json(&app, Method::GET, "/api/message?message_text=cheap%20watches", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn missing_user_is_not_found_not_error() {
    let (app, _) = app("missing");
    let (status, body) = send_json(&app, Method::GET, "/api/user?user_id=12345", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "found": false, "user": null }));

    let (status, body) = send_json(
        &app,
        Method::DELETE,
        &format!("/api/user?user_id=12345&access_key={KEY}"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "User not found.");
}

#[tokio::test]
async fn duplicate_user_id_is_rejected() {
    let (app, _) = app("duplicate");
    assert_eq!(create(&app, 7, "first").await.0, StatusCode::CREATED);

    let (status, body) = create(&app, 7, "second").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "This User_ID is already in database.");
}

#[tokio::test]
async fn wrong_key_is_forbidden_whatever_the_payload() {
    let (app, _) = app("forbidden");

    for uri in ["/api/user?access_key=wrong", "/api/user"] {
        let (status, body) = send_json(&app, Method::POST, uri, Some(json!({ "nonsense": true }))).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"], "Forbidden: invalid access key.");

        let (status, _) = send_json(
            &app,
            Method::POST,
            uri,
            Some(json!({ "user_id": 1, "message": "valid" })),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    let (status, _) = send_json(&app, Method::DELETE, "/api/user?user_id=oops&access_key=nope", None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // nothing was written
    let (status, _) = send_json(&app, Method::GET, "/api/user?user_id=1", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn invalid_payload_with_valid_key_is_bad_request() {
    let (app, _) = app("payload");
    let (status, body) = send_json(
        &app,
        Method::POST,
        &format!("/api/user?access_key={KEY}"),
        Some(json!({ "user_id": "abc", "message": "x" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, _) = create(&app, 3, "\u{feff}").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn message_lookup_normalizes_text() {
    let (app, _) = app("message");
    create(&app, 9, "join  my\nchannel").await;

    let (status, body) = send_json(
        &app,
        Method::GET,
        "/api/message?message_text=join%20my%0Achannel",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "found": true }));

    let (status, body) = send_json(&app, Method::GET, "/api/message?message_text=hello", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "found": false }));
}

#[tokio::test]
async fn dump_streams_json_file() {
    let (app, dump_dir) = app("dump_json");
    create(&app, 2, "second").await;
    create(&app, 1, "first").await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/dump?table=users&file_format=json&include=user_id&include=last_message&order_by=user_id")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/octet-stream"
    );
    let disposition = response.headers()[header::CONTENT_DISPOSITION].to_str().unwrap().to_string();
    assert!(disposition.starts_with("attachment; filename=\"users-dump-"));
    assert!(disposition.ends_with(".json\""));

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let records: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(
        records,
        json!([
            { "user_id": 1, "last_message": "first" },
            { "user_id": 2, "last_message": "second" }
        ])
    );

    let _ = std::fs::remove_dir_all(&dump_dir);
}

#[tokio::test]
async fn dump_csv_defaults_to_users() {
    let (app, dump_dir) = app("dump_csv");
    create(&app, 5, "hello").await;

    let (status, bytes) = send(&app, Method::GET, "/api/dump?include=user_id&include=ban_reason", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(String::from_utf8(bytes).unwrap(), "user_id,ban_reason\n5,spam\n");

    let _ = std::fs::remove_dir_all(&dump_dir);
}

#[tokio::test]
async fn dump_rejects_bad_parameters() {
    let (app, dump_dir) = app("dump_bad");

    let (status, body) = send_json(
        &app,
        Method::GET,
        "/api/dump?table=messages&include=text&include=text",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "\"include\" parameter has duplicate values");

    let (status, _) = send_json(&app, Method::GET, "/api/dump?table=bans", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send_json(&app, Method::GET, "/api/dump?file_format=xml", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send_json(&app, Method::GET, "/api/dump?unexpected=1", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let _ = std::fs::remove_dir_all(&dump_dir);
}

#[tokio::test]
async fn welcome_routes() {
    let (app, _) = app("welcome");
    let (status, body) = send_json(&app, Method::GET, "/", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["welcome_text"].as_str().unwrap().contains("/api"));

    let (status, body) = send_json(&app, Method::GET, "/api", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["welcome_text"].as_str().unwrap().contains("cas.chat"));
}

#[tokio::test]
async fn create_ignores_unknown_body_keys() {
    let (app, _) = app("extra_keys");
    let (status, body) = send_json(
        &app,
        Method::POST,
        &format!("/api/user?access_key={KEY}"),
        Some(json!({ "user_id": 1, "message": "hi", "reporter": "bot" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["user_id"], 1);
    assert_eq!(body["message"]["text"], "hi");
}

#[tokio::test]
async fn api_is_served_under_version_aliases() {
    let (app, _) = app("aliases");
    let (status, _) = create(&app, 11, "alias check").await;
    assert_eq!(status, StatusCode::CREATED);

    for prefix in ["/api", "/api/latest", "/api/v1"] {
        let (status, body) = send_json(&app, Method::GET, &format!("{prefix}/user?user_id=11"), None).await;
        assert_eq!(status, StatusCode::OK, "{prefix}");
        assert_eq!(body["user"]["user_id"], 11);

        let (status, body) = send_json(&app, Method::GET, prefix, None).await;
        assert_eq!(status, StatusCode::OK, "{prefix}");
        assert!(body["welcome_text"].as_str().unwrap().contains("cas.chat"));
    }
}

#[tokio::test]
async fn dump_negative_indent_is_single_line() {
    let (app, dump_dir) = app("dump_indent");
    create(&app, 4, "hello").await;

    let (status, bytes) = send(
        &app,
        Method::GET,
        "/api/dump?file_format=json&include=user_id&indent=-1",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(String::from_utf8(bytes).unwrap(), r#"[{"user_id":4}]"#);

    let _ = std::fs::remove_dir_all(&dump_dir);
}

#[tokio::test]
async fn root_welcome_names_full_api_url() {
    let (app, _) = app("welcome_host");
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/")
                .header(header::HOST, "bans.example.org")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert!(
        body["welcome_text"]
            .as_str()
            .unwrap()
            .contains("Check http://bans.example.org/api for more info.")
    );
}
