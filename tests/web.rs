use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
    response::Response,
};
use hackbuddy::app::{AppState, router};
use hackbuddy::board::Board;
use serde_json::{Value, json};
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

fn test_app() -> (Router, TempDir) {
    let dir = TempDir::new().unwrap();
    let board = Board::open(dir.path()).unwrap();
    (router(Arc::new(AppState::new(board))), dir)
}

/// Cookies a browser would keep from a response, as a `Cookie` header value
fn kept_cookies(response: &Response) -> String {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|value| value.to_str().unwrap().to_string())
        .filter(|value| !value.contains("Max-Age=0"))
        .map(|value| value.split(';').next().unwrap().to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

fn set_cookies(response: &Response) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|value| value.to_str().unwrap().to_string())
        .collect()
}

fn verify_form(identity: &str, code: &str) -> Request<Body> {
    Request::post(format!("/verify/{identity}"))
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(format!("code={code}")))
        .unwrap()
}

fn get(uri: &str, cookies: &str) -> Request<Body> {
    let mut request = Request::get(uri);
    if !cookies.is_empty() {
        request = request.header(header::COOKIE, cookies);
    }
    request.body(Body::empty()).unwrap()
}

fn post_json(uri: &str, cookies: &str, body: Value) -> Request<Body> {
    let mut request = Request::post(uri).header(header::CONTENT_TYPE, "application/json");
    if !cookies.is_empty() {
        request = request.header(header::COOKIE, cookies);
    }
    request.body(Body::from(body.to_string())).unwrap()
}

async fn body_text(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn body_json(response: Response) -> Value {
    serde_json::from_str(&body_text(response).await).unwrap()
}

#[tokio::test]
async fn wrong_code_is_rejected() {
    let (app, _dir) = test_app();

    let response = app.oneshot(verify_form("macha", "wrong-code")).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(set_cookies(&response).is_empty());
    assert_eq!(body_text(response).await, "Invalid security code");
}

#[tokio::test]
async fn blank_code_is_required() {
    let (app, _dir) = test_app();

    let response = app.oneshot(verify_form("veerendra", "")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_text(response).await, "Security code is required");
}

#[tokio::test]
async fn unknown_space_is_not_found() {
    let (app, _dir) = test_app();

    let response = app.oneshot(verify_form("mallory", "MACH4-2X5P")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn verifying_sets_cookies_and_unlocks_space() {
    let (app, _dir) = test_app();

    let response = app
        .clone()
        .oneshot(verify_form("macha", "MACH4-2X5P"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/macha");

    let cookies = kept_cookies(&response);
    assert!(cookies.contains("macha-security-verified=true"));
    assert!(cookies.contains("current-user-id=macha"));

    // the dashboard now remembers macha
    let response = app
        .clone()
        .oneshot(get("/api/space?path=/", &cookies))
        .await
        .unwrap();
    let space = body_json(response).await;
    assert_eq!(space["identity"], "macha");
    assert_eq!(space["label"], "Macha");
    assert_eq!(space["color"], "bg-purple-600");
    assert_eq!(space["verified"], true);

    let response = app.oneshot(get("/macha", &cookies)).await.unwrap();
    let page = body_text(response).await;
    assert!(page.contains("HackBuddy &middot; Macha"));
    assert!(!page.contains("Security Verification"));
}

#[tokio::test]
async fn locked_space_shows_code_form() {
    let (app, _dir) = test_app();

    let response = app.oneshot(get("/veerendra", "")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let page = body_text(response).await;
    assert!(page.contains("Security Verification"));
    assert!(page.contains("Veerendra's personal space"));
    assert!(page.contains("/verify/veerendra"));
}

#[tokio::test]
async fn shared_space_needs_no_code() {
    let (app, _dir) = test_app();

    let response = app
        .clone()
        .oneshot(get("/api/space?path=/hackathons", ""))
        .await
        .unwrap();
    let space = body_json(response).await;
    assert_eq!(space["identity"], Value::Null);
    assert_eq!(space["label"], "Both");
    assert_eq!(space["verified"], true);
    assert_eq!(space["theme"], "dark");

    let response = app.oneshot(get("/", "")).await.unwrap();
    assert!(body_text(response).await.contains("HackBuddy &middot; Both"));
}

#[tokio::test]
async fn board_endpoints_respect_the_gate() {
    let (app, _dir) = test_app();

    let response = app
        .clone()
        .oneshot(get("/api/tasks?path=/macha", ""))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/tasks?path=/veerendra",
            "",
            json!({ "title": "sneaky" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .clone()
        .oneshot(post_json("/api/tasks?path=/", "", json!({ "title": "book venue" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(body_json(response).await["user_space"], "Both");

    let response = app
        .clone()
        .oneshot(verify_form("macha", "MACH4-7Y3Q"))
        .await
        .unwrap();
    let cookies = kept_cookies(&response);

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/tasks?path=/macha",
            &cookies,
            json!({ "title": "pitch deck", "due_date": "2024-05-01" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .clone()
        .oneshot(get("/api/tasks?path=/macha", &cookies))
        .await
        .unwrap();
    let tasks = body_json(response).await;
    let titles: Vec<&str> = tasks
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["pitch deck", "book venue"]);

    // the shared dashboard only sees shared rows
    let response = app.oneshot(get("/api/tasks?path=/", "")).await.unwrap();
    assert_eq!(body_json(response).await.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn invalid_task_is_bad_request() {
    let (app, _dir) = test_app();

    let response = app
        .oneshot(post_json("/api/tasks?path=/", "", json!({ "title": "  " })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_text(response).await, "Title is required");
}

#[tokio::test]
async fn links_get_a_scheme() {
    let (app, _dir) = test_app();

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/links?path=/",
            "",
            json!({ "title": "Devpost", "url": "devpost.com" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let link = body_json(response).await;
    assert_eq!(link["url"], "https://devpost.com");

    let id = link["id"].as_str().unwrap();
    let response = app
        .clone()
        .oneshot(
            Request::delete(format!("/api/links/{id}?path=/"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app.oneshot(get("/api/links?path=/", "")).await.unwrap();
    assert!(body_json(response).await.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn api_verify_and_clear() {
    let (app, _dir) = test_app();

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/verify",
            "",
            json!({ "path": "/veerendra", "code": "nope" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(set_cookies(&response).is_empty());
    assert_eq!(body_json(response).await["verified"], false);

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/verify",
            "",
            json!({ "path": "/veerendra", "code": "V33R-8K7Z" }),
        ))
        .await
        .unwrap();
    let cookies = kept_cookies(&response);
    assert_eq!(body_json(response).await["verified"], true);

    let response = app
        .clone()
        .oneshot(post_json("/api/clear", &cookies, json!({ "path": "/veerendra" })))
        .await
        .unwrap();
    let removed = set_cookies(&response);
    assert!(removed.iter().any(|c| c.starts_with("veerendra-security-verified=")));
    assert!(removed.iter().any(|c| c.starts_with("current-user-id=")));
    assert_eq!(body_json(response).await["verified"], false);

    // the browser dropped both cookies, so the dashboard is shared again
    let response = app.oneshot(get("/api/space?path=/", "")).await.unwrap();
    assert_eq!(body_json(response).await["label"], "Both");
}

#[tokio::test]
async fn sign_out_redirects_home() {
    let (app, _dir) = test_app();

    let response = app
        .clone()
        .oneshot(verify_form("macha", "MACH4-2X5P"))
        .await
        .unwrap();
    let cookies = kept_cookies(&response);

    let response = app
        .oneshot(
            Request::post("/signout")
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .header(header::COOKIE, cookies)
                .body(Body::from("path=/macha"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/");
    assert_eq!(set_cookies(&response).len(), 2);
}

#[tokio::test]
async fn theme_toggle_round_trips() {
    let (app, _dir) = test_app();

    let response = app
        .clone()
        .oneshot(Request::post("/api/theme/toggle").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let cookies = kept_cookies(&response);
    assert!(cookies.contains("hackbuddy-theme=light"));
    assert_eq!(body_json(response).await["theme"], "light");

    let response = app
        .oneshot(get("/api/space?path=/", &cookies))
        .await
        .unwrap();
    assert_eq!(body_json(response).await["theme"], "light");
}

#[tokio::test]
async fn dashboard_is_never_gated() {
    let (app, _dir) = test_app();
    // remembered from an earlier visit, but never verified
    let cookies = "current-user-id=macha";

    for path in ["/", "/hackathons", "/projects"] {
        let response = app.clone().oneshot(get(path, cookies)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let page = body_text(response).await;
        assert!(!page.contains("Security Verification"), "{path} was gated");
        assert!(page.contains("HackBuddy &middot; Both"));
    }

    let response = app
        .clone()
        .oneshot(get("/api/tasks?path=/", cookies))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // the personal space itself still asks for the code
    let response = app.oneshot(get("/macha", cookies)).await.unwrap();
    assert!(body_text(response).await.contains("Security Verification"));
}

fn patch_json(uri: &str, cookies: &str, body: Value) -> Request<Body> {
    let mut request = Request::patch(uri).header(header::CONTENT_TYPE, "application/json");
    if !cookies.is_empty() {
        request = request.header(header::COOKIE, cookies);
    }
    request.body(Body::from(body.to_string())).unwrap()
}

fn delete(uri: &str, cookies: &str) -> Request<Body> {
    let mut request = Request::delete(uri);
    if !cookies.is_empty() {
        request = request.header(header::COOKIE, cookies);
    }
    request.body(Body::empty()).unwrap()
}

#[tokio::test]
async fn events_api() {
    let (app, _dir) = test_app();

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/events?path=/hackathons",
            "",
            json!({
                "title": "HackMIT",
                "organizer": "",
                "platform": "Devpost",
                "start_date": "2020-09-18T00:00:00Z",
                "end_date": "2020-09-20T00:00:00Z",
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_text(response).await, "Organizer is required");

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/events?path=/hackathons",
            "",
            json!({
                "title": "HackMIT",
                "organizer": "MIT",
                "platform": "Devpost",
                "type": "competition",
                "start_date": "2020-09-18T00:00:00Z",
                "end_date": "2020-09-20T00:00:00Z",
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let event = body_json(response).await;
    assert_eq!(event["status"], "completed");
    assert_eq!(event["progress"], 100);
    assert_eq!(event["type"], "competition");
    assert_eq!(event["user_space"], "Both");
    let id = event["id"].as_str().unwrap().to_string();

    let response = app
        .clone()
        .oneshot(patch_json(
            &format!("/api/events/{id}?path=/"),
            "",
            json!({ "start_date": "2999-01-01T00:00:00Z", "end_date": "2999-01-02T00:00:00Z" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let event = body_json(response).await;
    assert_eq!(event["status"], "upcoming");
    assert_eq!(event["progress"], 0);

    let response = app
        .clone()
        .oneshot(get(&format!("/api/events/{id}?path=/"), ""))
        .await
        .unwrap();
    assert_eq!(body_json(response).await["title"], "HackMIT");

    let response = app
        .clone()
        .oneshot(delete(&format!("/api/events/{id}?path=/"), ""))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .oneshot(get(&format!("/api/events/{id}?path=/"), ""))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn projects_api_is_space_scoped() {
    let (app, _dir) = test_app();

    let response = app
        .clone()
        .oneshot(verify_form("veerendra", "V33R-8K7Z"))
        .await
        .unwrap();
    let cookies = kept_cookies(&response);

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/projects?path=/veerendra",
            &cookies,
            json!({ "name": "Ledger", "tech_stack": ["Rust", "axum"] }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let project = body_json(response).await;
    assert_eq!(project["color"], "#8B5CF6");
    assert_eq!(project["progress"], 0);
    let id = project["id"].as_str().unwrap().to_string();

    // the shared dashboard cannot see or edit it
    let response = app
        .clone()
        .oneshot(get("/api/projects?path=/projects", ""))
        .await
        .unwrap();
    assert!(body_json(response).await.as_array().unwrap().is_empty());
    let response = app
        .clone()
        .oneshot(patch_json(
            &format!("/api/projects/{id}?path=/"),
            "",
            json!({ "progress": 50 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .clone()
        .oneshot(patch_json(
            &format!("/api/projects/{id}?path=/veerendra"),
            &cookies,
            json!({ "progress": 150 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .clone()
        .oneshot(patch_json(
            &format!("/api/projects/{id}?path=/veerendra"),
            &cookies,
            json!({ "progress": 75 }),
        ))
        .await
        .unwrap();
    assert_eq!(body_json(response).await["progress"], 75);

    let response = app
        .oneshot(get("/veerendra", &cookies))
        .await
        .unwrap();
    let page = body_text(response).await;
    assert!(page.contains("\"name\":\"Ledger\""));
}
