mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

use common::{unique_email, TestUser};

#[tokio::test]
async fn protected_routes_require_token() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    for path in ["/api/projects", "/api/tasks", "/api/tasks/stats/all", "/api/users/me"] {
        let res = client.get(server.url(path)).send().await?;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED, "{}", path);
        let body: Value = res.json().await?;
        assert_eq!(body["message"], "No token, authorization denied");
    }
    Ok(())
}

#[tokio::test]
async fn invalid_token_is_rejected() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client
        .get(server.url("/api/projects"))
        .bearer_auth("not.a.jwt")
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: Value = res.json().await?;
    assert_eq!(body["message"], "Token is not valid");

    let res = client
        .get(server.url("/api/projects"))
        .header("Authorization", "Basic dXNlcjpwYXNz")
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn register_then_login() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();
    let email = unique_email("alice");

    let res = client
        .post(server.url("/api/auth/register"))
        .json(&json!({ "name": "Alice", "email": email, "password": "wonderland" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let registered: Value = res.json().await?;
    assert_eq!(registered["message"], "User registered successfully");
    assert!(registered["user"].get("password").is_none());
    assert!(registered["user"].get("passwordHash").is_none());

    let res = client
        .post(server.url("/api/auth/login"))
        .json(&json!({ "email": email, "password": "wonderland" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let login: Value = res.json().await?;
    assert_eq!(login["message"], "Login successful");
    assert_eq!(login["user"]["id"], registered["user"]["id"]);

    // The fresh token opens the protected API
    let res = client
        .get(server.url("/api/projects"))
        .bearer_auth(login["token"].as_str().unwrap_or_default())
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn register_validates_and_rejects_duplicates() -> Result<()> {
    let user = TestUser::register("dup").await?;
    let client = reqwest::Client::new();

    let res = client
        .post(user.server.url("/api/auth/register"))
        .json(&json!({ "name": "Someone" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await?;
    assert!(body["field_errors"]["email"].is_string());
    assert!(body["field_errors"]["password"].is_string());

    let res = client
        .post(user.server.url("/api/auth/register"))
        .json(&json!({ "name": "Again", "email": user.email, "password": "pw" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await?;
    assert_eq!(body["message"], "User already exists with this email");
    Ok(())
}

#[tokio::test]
async fn login_failures_look_the_same() -> Result<()> {
    let user = TestUser::register("carol").await?;
    let client = reqwest::Client::new();

    let wrong_password: Value = client
        .post(user.server.url("/api/auth/login"))
        .json(&json!({ "email": user.email, "password": "nope" }))
        .send()
        .await?
        .json()
        .await?;
    let unknown_email: Value = client
        .post(user.server.url("/api/auth/login"))
        .json(&json!({ "email": unique_email("ghost"), "password": "nope" }))
        .send()
        .await?
        .json()
        .await?;

    assert_eq!(wrong_password["message"], "Invalid email or password");
    assert_eq!(wrong_password, unknown_email);

    let res = client
        .post(user.server.url("/api/auth/login"))
        .json(&json!({ "email": user.email }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn malformed_json_is_bad_request() -> Result<()> {
    let server = common::ensure_server().await?;

    let res = reqwest::Client::new()
        .post(server.url("/api/auth/login"))
        .header("Content-Type", "application/json")
        .body("{ not json")
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await?;
    assert_eq!(body["code"], "INVALID_JSON");
    Ok(())
}
