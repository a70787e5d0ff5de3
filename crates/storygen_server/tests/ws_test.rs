//! Websocket protocol against a live server.

mod test_utils;

use futures::SinkExt;
use storygen_server::{NOT_INITIALIZED_MESSAGE, StoryServer};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use test_utils::next_json;

#[tokio::test]
async fn greeting_and_ping() {
    let (addr, _stop) = test_utils::spawn(StoryServer::new(test_utils::settings())).await;
    let (mut socket, _) = connect_async(format!("ws://{addr}/ws/alice")).await.unwrap();

    let greeting = next_json(&mut socket).await;
    assert_eq!(greeting["type"], "connected");

    socket.send(Message::text(r#"{"type": "ping"}"#)).await.unwrap();
    assert_eq!(next_json(&mut socket).await, serde_json::json!({"type": "pong"}));
}

#[tokio::test]
async fn unknown_types_are_ignored_and_bad_json_reported() {
    let (addr, _stop) = test_utils::spawn(StoryServer::new(test_utils::settings())).await;
    let (mut socket, _) = connect_async(format!("ws://{addr}/ws/bob")).await.unwrap();
    next_json(&mut socket).await;

    socket.send(Message::text(r#"{"type": "dance"}"#)).await.unwrap();
    socket.send(Message::text(r#"{"type": "ping"}"#)).await.unwrap();
    assert_eq!(next_json(&mut socket).await["type"], "pong");

    socket.send(Message::text("{not json")).await.unwrap();
    let error = next_json(&mut socket).await;
    assert_eq!(error["type"], "error");
    assert!(error["message"].as_str().unwrap().starts_with("Invalid message"));
}

#[tokio::test]
async fn story_request_without_pipeline_reports_error() {
    let (addr, _stop) = test_utils::spawn(StoryServer::new(test_utils::settings())).await;
    let (mut socket, _) = connect_async(format!("ws://{addr}/ws/carol")).await.unwrap();
    next_json(&mut socket).await;

    socket
        .send(Message::text(r#"{"type": "generate_story", "data": "snail, rain"}"#))
        .await
        .unwrap();

    assert_eq!(next_json(&mut socket).await["type"], "processing");
    assert_eq!(
        next_json(&mut socket).await,
        serde_json::json!({"type": "error", "message": NOT_INITIALIZED_MESSAGE})
    );
}

#[tokio::test]
async fn story_request_streams_story_and_images() {
    let server = StoryServer::new(test_utils::settings()).with_pipeline(test_utils::pipeline());
    let (addr, stop) = test_utils::spawn(server).await;
    let (mut socket, _) = connect_async(format!("ws://{addr}/ws/dave")).await.unwrap();
    next_json(&mut socket).await;

    socket
        .send(Message::text(r#"{"type": "generate_story", "data": "snail, rain"}"#))
        .await
        .unwrap();

    assert_eq!(next_json(&mut socket).await["type"], "processing");

    let story = next_json(&mut socket).await;
    assert_eq!(story["type"], "story_complete");
    assert!(story["data"].as_str().unwrap().starts_with("[SCENE 1]\nA snail raced."));

    for expected_index in 0..4 {
        let image = next_json(&mut socket).await;
        assert_eq!(image["type"], "image_generated");
        assert_eq!(image["data"]["index"], expected_index);
        assert_eq!(image["data"]["format"], "png");
        assert_eq!(image["data"]["stored_in_bucket"], false);
        assert!(image["data"]["base64"].is_string());
    }

    assert_eq!(
        next_json(&mut socket).await,
        serde_json::json!({"type": "turn_complete", "turn_complete": true})
    );

    // Connection stays usable after a turn
    socket.send(Message::text(r#"{"type": "ping"}"#)).await.unwrap();
    assert_eq!(next_json(&mut socket).await["type"], "pong");

    let _ = stop.send(());
}
