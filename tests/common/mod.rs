#![allow(dead_code)]

use reqwest::{multipart, Client};
use serde_json::{json, Value};
use std::sync::{Mutex, MutexGuard};
use std::time::{SystemTime, UNIX_EPOCH};

pub const BASE_URL: &str = "http://localhost:8000";

/// Serialises tests in one binary that toggle the registration setting.
static REGISTRATION_LOCK: Mutex<()> = Mutex::new(());

pub fn registration_lock() -> MutexGuard<'static, ()> {
    REGISTRATION_LOCK.lock().unwrap_or_else(|e| e.into_inner())
}

/// The well-formed sample record used throughout the tests.
pub const VALID_PGN: &str = "[Event \"test event 2\"]\n[Site \"test site 2\"]\n[Date \"2023.10.17\"]\n[Round \"4\"]\n[White \"foo\"]\n[Black \"bar\"]\n[Result \"0-1\"]\n\n1. e4 e5 2. d4 Nf6 3. Nc3 Nc6 4. d5 Nd4 5. Nf3 c5 6. Nxe5 Bd6 7. Bf4 O-O { test comment } 8. Nxf7 Rxf7 0-1";

/// Build a reqwest client for tests.
pub fn client() -> Client {
    Client::new()
}

/// Generate a unique suffix based on timestamp to avoid collisions.
pub fn unique_suffix() -> String {
    let ts = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    format!("{}", ts % 1_000_000_000)
}

/// Build a URL for an API endpoint.
pub fn url(path: &str) -> String {
    format!("{}{}", BASE_URL, path)
}

/// Admin credentials: `TEST_ADMIN_USERNAME` / `TEST_ADMIN_PASSWORD`, default
/// `admin` / `admin-password`.
pub fn admin_credentials() -> (String, String) {
    (
        std::env::var("TEST_ADMIN_USERNAME").unwrap_or_else(|_| "admin".into()),
        std::env::var("TEST_ADMIN_PASSWORD").unwrap_or_else(|_| "admin-password".into()),
    )
}

pub async fn register(client: &Client, username: &str, password: &str) -> reqwest::Response {
    client
        .post(url("/api/auth/register"))
        .json(&json!({ "username": username, "password": password }))
        .send()
        .await
        .expect("Failed to send register request")
}

pub async fn login(client: &Client, username: &str, password: &str) -> reqwest::Response {
    client
        .post(url("/api/auth/login"))
        .json(&json!({ "username": username, "password": password }))
        .send()
        .await
        .expect("Failed to send login request")
}

/// Token for the admin account. On a fresh database the first registration
/// creates it.
pub async fn admin_token(client: &Client) -> String {
    let (username, password) = admin_credentials();
    let _ = register(client, &username, &password).await;
    let resp = login(client, &username, &password).await;
    assert_eq!(resp.status(), 200, "admin login failed; set TEST_ADMIN_USERNAME/PASSWORD");
    let body: Value = resp.json().await.unwrap();
    body["token"].as_str().unwrap().to_string()
}

pub async fn set_registration(client: &Client, admin_token: &str, enabled: bool) {
    let resp = client
        .put(url("/api/admin/config"))
        .bearer_auth(admin_token)
        .json(&json!({ "registration_enabled": enabled }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
}

/// Register a fresh user (opening registration through the admin) and return
/// `(username, token)`.
pub async fn new_user(client: &Client, prefix: &str) -> (String, String) {
    let _guard = registration_lock();
    let admin = admin_token(client).await;
    set_registration(client, &admin, true).await;

    let username = format!("{prefix}_{}", unique_suffix());
    let resp = register(client, &username, "testpass123").await;
    assert_eq!(resp.status(), 201, "register {username}");
    let body: Value = resp.json().await.unwrap();
    (username, body["token"].as_str().unwrap().to_string())
}

/// POST /api/posts as multipart, optionally with a game record attached.
pub async fn create_post(
    client: &Client,
    token: &str,
    title: &str,
    file: Option<(&str, &[u8])>,
) -> reqwest::Response {
    let mut form = multipart::Form::new()
        .text("title", title.to_string())
        .text("body", "test body");
    if let Some((name, bytes)) = file {
        form = form.part(
            "pgn_file",
            multipart::Part::bytes(bytes.to_vec()).file_name(name.to_string()),
        );
    }
    client
        .post(url("/api/posts"))
        .bearer_auth(token)
        .multipart(form)
        .send()
        .await
        .expect("Failed to send create post request")
}
