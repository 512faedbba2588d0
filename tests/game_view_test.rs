//! Integration tests for the game viewer.
//!
//! Requires the server to be running on localhost:8000.

mod common;

use serde_json::{json, Value};

/// Upload the sample record and return its game id.
async fn upload_sample(client: &reqwest::Client) -> i64 {
    let (_, token) = common::new_user(client, "viewer").await;
    let resp = common::create_post(client, &token, "view me", Some(("valid.pgn", common::VALID_PGN.as_bytes()))).await;
    assert_eq!(resp.status(), 201);
    let post: Value = resp.json().await.unwrap();
    post["game"]["fileId"].as_i64().unwrap()
}

async fn view(client: &reqwest::Client, game_id: i64, session: &str, command: Option<&str>) -> reqwest::Response {
    let mut req = client
        .post(common::url(&format!("/api/games/{game_id}/view")))
        .header("x-session-id", session);
    if let Some(command) = command {
        req = req.json(&json!({ "command": command }));
    }
    req.send().await.unwrap()
}

#[tokio::test]
#[ignore = "requires the server on localhost:8000"]
async fn view_buttons_walk_the_main_line() {
    let client = common::client();
    let game_id = upload_sample(&client).await;
    let session = format!("buttons-{}", common::unique_suffix());

    let body: Value = view(&client, game_id, &session, None).await.json().await.unwrap();
    assert_eq!(body["ply"], 0);
    assert_eq!(body["totalPlies"], 16);
    assert_eq!(body["atStart"], true);
    assert!(body["lastMove"].is_null());
    assert_eq!(body["moves"].as_array().unwrap().len(), 16);

    let body: Value = view(&client, game_id, &session, Some("nextMove")).await.json().await.unwrap();
    assert_eq!(body["ply"], 1);
    assert_eq!(body["lastMove"], "e4");

    let body: Value = view(&client, game_id, &session, Some("prevMove")).await.json().await.unwrap();
    assert_eq!(body["ply"], 0);

    let body: Value = view(&client, game_id, &session, Some("lastMove")).await.json().await.unwrap();
    assert_eq!(body["ply"], 16);
    assert_eq!(body["atEnd"], true);
    assert_eq!(body["lastMove"], "Rxf7");

    let body: Value = view(&client, game_id, &session, Some("firstMove")).await.json().await.unwrap();
    assert_eq!(body["ply"], 0);

    let resp = view(&client, game_id, &session, Some("nonExistentMove")).await;
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["ply"], 0);
}

#[tokio::test]
#[ignore = "requires the server on localhost:8000"]
async fn session_id_is_minted_when_missing() {
    let client = common::client();
    let game_id = upload_sample(&client).await;

    let resp = client
        .get(common::url(&format!("/api/games/{game_id}/view")))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let header = resp.headers()["x-session-id"].to_str().unwrap().to_string();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["sessionId"], header);

    // The minted id carries the cursor forward.
    let resp = client
        .get(common::url(&format!("/api/games/{game_id}/view?command=next")))
        .header("x-session-id", &header)
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["ply"], 1);
}

#[tokio::test]
#[ignore = "requires the server on localhost:8000"]
async fn missing_game_is_not_found() {
    let client = common::client();
    let session = format!("missing-{}", common::unique_suffix());

    let resp = view(&client, i64::MAX, &session, None).await;
    assert_eq!(resp.status(), 404);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["detail"], format!("File with game id {} does not exist", i64::MAX));

    let resp = client.get(common::url("/api/games/")).send().await.unwrap();
    assert_eq!(resp.status(), 404);
}
