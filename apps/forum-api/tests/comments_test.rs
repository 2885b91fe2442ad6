mod common;

use axum::http::header::AUTHORIZATION;
use axum::http::StatusCode;
use chrono::{DateTime, Utc};

fn timestamp(value: &serde_json::Value) -> DateTime<Utc> {
    serde_json::from_value(value.clone()).expect("RFC 3339 timestamp")
}

// ---------------------------------------------------------------------------
// GET /channel/:channel/:thread/
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unknown_thread_is_not_found() {
    let (server, state) = common::test_server().await;
    let owner = common::create_user(&state.db, false).await;
    let auth = common::login(&state, &owner).await;
    let channel = common::create_channel(&server, &auth).await;

    let resp = server.get(&format!("/channel/{channel}/42/")).await;
    resp.assert_status(StatusCode::NOT_FOUND);
    assert_eq!(
        resp.json::<serde_json::Value>()["error"]["message"],
        "Thread not found"
    );

    common::cleanup_channel(&state.db, &channel).await;
    common::cleanup_user(&state.db, &owner.id).await;
}

#[tokio::test]
async fn non_numeric_thread_segment_is_not_found() {
    let (server, state) = common::test_server().await;
    let owner = common::create_user(&state.db, false).await;
    let auth = common::login(&state, &owner).await;
    let channel = common::create_channel(&server, &auth).await;

    let resp = server.get(&format!("/channel/{channel}/abc/")).await;
    resp.assert_status(StatusCode::NOT_FOUND);
    let body: serde_json::Value = resp.json();
    assert_eq!(body["error"]["code"], "NOT_FOUND");
    assert_eq!(body["error"]["message"], "Thread not found");

    server
        .post(&format!("/channel/{channel}/abc/"))
        .add_header(AUTHORIZATION, auth)
        .form(&[("create", "1"), ("text", "hello")])
        .await
        .assert_status(StatusCode::NOT_FOUND);

    common::cleanup_channel(&state.db, &channel).await;
    common::cleanup_user(&state.db, &owner.id).await;
}

#[tokio::test]
async fn viewer_flags_follow_thread_and_channel_roles() {
    let (server, state) = common::test_server().await;
    let owner = common::create_user(&state.db, false).await;
    let owner_auth = common::login(&state, &owner).await;
    let poster = common::create_user(&state.db, false).await;
    let poster_auth = common::login(&state, &poster).await;
    let channel = common::create_channel(&server, &owner_auth).await;
    let thread = common::create_thread(&server, &poster_auth, &channel).await;
    let path = format!("/channel/{channel}/{thread}/");

    let as_owner: serde_json::Value = server
        .get(&path)
        .add_header(AUTHORIZATION, owner_auth)
        .await
        .json();
    assert_eq!(as_owner["object"]["viewer"]["is_owner"], false);
    assert_eq!(as_owner["object"]["viewer"]["is_moderator"], true);

    let as_poster: serde_json::Value = server
        .get(&path)
        .add_header(AUTHORIZATION, poster_auth)
        .await
        .json();
    assert_eq!(as_poster["object"]["viewer"]["is_owner"], true);
    assert_eq!(as_poster["object"]["viewer"]["is_moderator"], false);
    assert_eq!(as_poster["object"]["thread"]["owner"], poster.username.as_str());

    let anonymous: serde_json::Value = server.get(&path).await.json();
    assert_eq!(anonymous["object"]["viewer"]["is_owner"], false);
    assert_eq!(anonymous["object"]["viewer"]["is_moderator"], false);

    common::cleanup_channel(&state.db, &channel).await;
    common::cleanup_user(&state.db, &owner.id).await;
    common::cleanup_user(&state.db, &poster.id).await;
}

// ---------------------------------------------------------------------------
// POST /channel/:channel/:thread/
// ---------------------------------------------------------------------------

#[tokio::test]
async fn posting_stamps_thread_and_channel() {
    let (server, state) = common::test_server().await;
    let owner = common::create_user(&state.db, false).await;
    let auth = common::login(&state, &owner).await;
    let channel = common::create_channel(&server, &auth).await;
    let thread = common::create_thread(&server, &auth, &channel).await;
    let path = format!("/channel/{channel}/{thread}/");

    let started = Utc::now();
    let resp = server
        .post(&path)
        .add_header(AUTHORIZATION, auth.clone())
        .form(&[("create", "1"), ("text", "Hello, everyone!")])
        .await;
    resp.assert_status(StatusCode::SEE_OTHER);
    assert_eq!(common::location(&resp), path);
    assert!(common::messages(&resp).is_empty());

    let body: serde_json::Value = server.get(&path).await.json();
    assert_eq!(body["kind"], "both");
    assert_eq!(body["form"]["fields"][0]["name"], "text");

    let comments = body["object"]["comments"].as_array().unwrap();
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0]["text"], "Hello, everyone!");
    assert_eq!(comments[0]["owner"], owner.username.as_str());
    assert_eq!(comments[0]["is_recent"], true);

    assert!(timestamp(&body["object"]["thread"]["recent_date"]) >= started);
    assert!(timestamp(&body["object"]["channel"]["recent_date"]) >= started);

    common::cleanup_channel(&state.db, &channel).await;
    common::cleanup_user(&state.db, &owner.id).await;
}

#[tokio::test]
async fn comments_are_listed_in_creation_order() {
    let (server, state) = common::test_server().await;
    let owner = common::create_user(&state.db, false).await;
    let auth = common::login(&state, &owner).await;
    let channel = common::create_channel(&server, &auth).await;
    let thread = common::create_thread(&server, &auth, &channel).await;
    let path = format!("/channel/{channel}/{thread}/");

    for text in ["first comment", "second comment", "third comment"] {
        server
            .post(&path)
            .add_header(AUTHORIZATION, auth.clone())
            .form(&[("create", "1"), ("text", text)])
            .await
            .assert_status(StatusCode::SEE_OTHER);
    }

    let body: serde_json::Value = server.get(&path).await.json();
    let texts: Vec<&str> = body["object"]["comments"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["text"].as_str().unwrap())
        .collect();
    assert_eq!(texts, ["first comment", "second comment", "third comment"]);

    common::cleanup_channel(&state.db, &channel).await;
    common::cleanup_user(&state.db, &owner.id).await;
}

#[tokio::test]
async fn rejected_comments_are_not_stored() {
    let (server, state) = common::test_server().await;
    let owner = common::create_user(&state.db, false).await;
    let auth = common::login(&state, &owner).await;
    let channel = common::create_channel(&server, &auth).await;
    let thread = common::create_thread(&server, &auth, &channel).await;
    let path = format!("/channel/{channel}/{thread}/");

    let too_long = "x".repeat(5001);
    for text in ["hi", "12345", too_long.as_str()] {
        let resp = server
            .post(&path)
            .add_header(AUTHORIZATION, auth.clone())
            .form(&[("create", "1"), ("text", text)])
            .await;
        resp.assert_status(StatusCode::SEE_OTHER);
        assert_eq!(common::location(&resp), path);
        assert_eq!(common::messages(&resp), vec!["Invalid input."]);
    }

    let anonymous = server
        .post(&path)
        .form(&[("create", "1"), ("text", "Anonymous hello")])
        .await;
    assert_eq!(
        common::messages(&anonymous),
        vec!["You must be logged in to do that."]
    );

    let body: serde_json::Value = server.get(&path).await.json();
    assert!(body["object"]["comments"].as_array().unwrap().is_empty());

    common::cleanup_channel(&state.db, &channel).await;
    common::cleanup_user(&state.db, &owner.id).await;
}

#[tokio::test]
async fn delete_removes_thread_and_returns_to_channel() {
    let (server, state) = common::test_server().await;
    let owner = common::create_user(&state.db, false).await;
    let auth = common::login(&state, &owner).await;
    let channel = common::create_channel(&server, &auth).await;
    let thread = common::create_thread(&server, &auth, &channel).await;
    let path = format!("/channel/{channel}/{thread}/");

    server
        .post(&path)
        .add_header(AUTHORIZATION, auth.clone())
        .form(&[("create", "1"), ("text", "Soon to be gone")])
        .await
        .assert_status(StatusCode::SEE_OTHER);

    let resp = server.post(&path).form(&[("delete", "1")]).await;
    resp.assert_status(StatusCode::SEE_OTHER);
    assert_eq!(common::location(&resp), format!("/channel/{channel}/"));

    server.get(&path).await.assert_status(StatusCode::NOT_FOUND);
    // The channel itself survives.
    server
        .get(&format!("/channel/{channel}/"))
        .await
        .assert_status_ok();

    let back = server
        .post(&format!("/channel/{channel}/{thread}/"))
        .form(&[("back", "1")])
        .await;
    back.assert_status(StatusCode::NOT_FOUND);

    common::cleanup_channel(&state.db, &channel).await;
    common::cleanup_user(&state.db, &owner.id).await;
}

#[tokio::test]
async fn back_returns_to_channel() {
    let (server, state) = common::test_server().await;
    let owner = common::create_user(&state.db, false).await;
    let auth = common::login(&state, &owner).await;
    let channel = common::create_channel(&server, &auth).await;
    let thread = common::create_thread(&server, &auth, &channel).await;

    let resp = server
        .post(&format!("/channel/{channel}/{thread}/"))
        .form(&[("back", "1")])
        .await;
    resp.assert_status(StatusCode::SEE_OTHER);
    assert_eq!(common::location(&resp), format!("/channel/{channel}/"));

    common::cleanup_channel(&state.db, &channel).await;
    common::cleanup_user(&state.db, &owner.id).await;
}

#[tokio::test]
async fn repeated_form_keys_are_invalid_input() {
    let (server, state) = common::test_server().await;
    let owner = common::create_user(&state.db, false).await;
    let auth = common::login(&state, &owner).await;
    let channel = common::create_channel(&server, &auth).await;
    let thread = common::create_thread(&server, &auth, &channel).await;
    let page = format!("/channel/{channel}/{thread}/");

    let resp = server
        .post(&page)
        .add_header(AUTHORIZATION, auth.clone())
        .form(&[("create", "1"), ("text", "first"), ("text", "second")])
        .await;
    resp.assert_status(StatusCode::SEE_OTHER);
    assert_eq!(common::location(&resp), page);
    assert_eq!(common::messages(&resp), vec!["Invalid input."]);

    let body: serde_json::Value = server.get(&page).await.json();
    assert_eq!(body["object"]["comments"], serde_json::json!([]));

    common::cleanup_channel(&state.db, &channel).await;
    common::cleanup_user(&state.db, &owner.id).await;
}
