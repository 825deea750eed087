//! IPC tests: router dispatch and the Unix socket MessagePack loop

mod common;

use std::collections::HashMap;

use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use serde_json::json;
use tokio::net::UnixStream;
use tokio::sync::broadcast;
use tokio_util::codec::{Framed, LengthDelimitedCodec};
use uuid::Uuid;
use venuekb_core::ipc::{KbRequest, KbResponse};
use venuekb_core::{OnboardingAnswer, Section};
use venuekb_server::{router, server};

use common::{make_state, ScriptedModel};

#[tokio::test]
async fn test_ping_returns_pong() {
    let (state, _store) = make_state(ScriptedModel::new(vec![]));
    let response = router::handle_request(KbRequest::Ping, &state).await;
    assert!(response.is_ok());
    assert_eq!(response.data.unwrap()["pong"], true);
    assert_eq!(response.version, env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_extract_request_round_trips_report() {
    let model = ScriptedModel::new(vec![Ok(vec![json!({
        "question": "How many guests can the barn hold?",
        "answer": "The barn seats 180 guests.",
        "category": "capacity",
        "confidence": 0.92
    })])]);
    let (state, store) = make_state(model);
    let venue = Uuid::new_v4();

    let response = router::handle_request(
        KbRequest::Extract {
            venue_id: venue,
            transcript: "Coordinator: The barn seats 180 guests.".to_string(),
            pass: "capacity".to_string(),
        },
        &state,
    )
    .await;

    assert!(response.is_ok(), "{:?}", response.error);
    let data = response.data.unwrap();
    assert_eq!(data["report"]["saved"], 1);
    assert_eq!(store.len().await, 1);
}

#[tokio::test]
async fn test_validation_errors_become_error_responses() {
    let (state, _store) = make_state(ScriptedModel::new(vec![]));

    let response = router::handle_request(
        KbRequest::Extract {
            venue_id: Uuid::new_v4(),
            transcript: "hello".to_string(),
            pass: "Pricing".to_string(),
        },
        &state,
    )
    .await;
    assert_eq!(response.status, "error");
    assert!(response.error.unwrap().contains("Unknown pass 'Pricing'"));

    let response = router::handle_request(
        KbRequest::Onboarding {
            venue_id: Uuid::new_v4(),
            answers: vec![OnboardingAnswer {
                section: Some(Section::Policies),
                question: "Pets?".to_string(),
                answer: String::new(),
            }],
            replace_existing: false,
        },
        &state,
    )
    .await;
    assert_eq!(response.status, "error");
}

#[tokio::test]
async fn test_progress_for_empty_venue_is_zero() {
    let (state, _store) = make_state(ScriptedModel::new(vec![]));
    let response = router::handle_request(
        KbRequest::Progress {
            venue_id: Uuid::new_v4(),
            sections: HashMap::new(),
        },
        &state,
    )
    .await;
    let data = response.data.unwrap();
    assert_eq!(data["score"], 0.0);
    assert_eq!(data["sections"]["brand_voice"], "not_started");
}

#[tokio::test]
async fn test_unix_socket_serves_msgpack_frames() {
    let (state, _store) = make_state(ScriptedModel::new(vec![]));
    let socket_path = std::env::temp_dir().join(format!("venuekb-{}.sock", Uuid::new_v4()));
    let socket = socket_path.to_str().unwrap().to_string();

    let (tx, _rx) = broadcast::channel(1);
    let server_shutdown = tx.subscribe();
    let server_socket = socket.clone();
    let handle = tokio::spawn(async move {
        server::run_unix_server(&server_socket, state, server_shutdown).await
    });

    // Wait for the listener to bind
    let mut stream = None;
    for _ in 0..50 {
        if let Ok(s) = UnixStream::connect(&socket).await {
            stream = Some(s);
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    }
    let stream = stream.expect("server should accept connections");
    let mut framed = Framed::new(
        stream,
        LengthDelimitedCodec::builder().little_endian().new_codec(),
    );

    let request = rmp_serde::to_vec_named(&KbRequest::Ping).unwrap();
    framed.send(Bytes::from(request)).await.unwrap();
    let frame = framed.next().await.unwrap().unwrap();
    let response: KbResponse = rmp_serde::from_slice(&frame).unwrap();
    assert!(response.is_ok());

    // Garbage gets an error response, not a dropped connection
    framed.send(Bytes::from_static(b"\xc1")).await.unwrap();
    let frame = framed.next().await.unwrap().unwrap();
    let response: KbResponse = rmp_serde::from_slice(&frame).unwrap();
    assert_eq!(response.status, "error");
    assert!(response.error.unwrap().contains("Deserialization error"));

    tx.send(()).unwrap();
    handle.await.unwrap().unwrap();
    assert!(!socket_path.exists());
}
