mod utils;

use beacon_core::{CallerInfo, ClientMessage, ConnectionId, ServerEvent, UserId};
use serde_json::json;

use crate::utils::{TestClient, init_tracing, register, single_instance};

fn caller_info(id: &str, username: &str) -> CallerInfo {
    CallerInfo {
        id: Some(id.to_string()),
        username: Some(username.to_string()),
    }
}

#[tokio::test]
async fn call_rings_target_and_confirms_caller() {
    init_tracing();
    let (_backplane, relay) = single_instance();
    let mut caller = TestClient::connect(&relay);
    let mut target = TestClient::connect(&relay);

    register(&relay, &target, "u2", "Bob").await;
    caller.drain();
    target.drain();

    let offer = json!({ "type": "offer", "sdp": "v=0\r\no=- 42" });
    relay
        .handle_message(
            caller.id,
            ClientMessage::CallUser {
                target_user_id: "u2".into(),
                caller_info: caller_info("u1", "Alice"),
                offer: offer.clone(),
            },
        )
        .await;

    assert_eq!(
        target.drain(),
        vec![ServerEvent::IncomingCall {
            caller: caller_info("u1", "Alice"),
            offer,
            call_id: caller.id,
        }]
    );
    assert_eq!(
        caller.drain(),
        vec![ServerEvent::CallDispatched {
            target_user_id: "u2".into()
        }]
    );
}

#[tokio::test]
async fn call_to_unknown_user_fails_only_to_caller() {
    init_tracing();
    let (_backplane, relay) = single_instance();
    let mut caller = TestClient::connect(&relay);
    let mut bystander = TestClient::connect(&relay);

    relay
        .handle_message(
            caller.id,
            ClientMessage::CallUser {
                target_user_id: "ghost".into(),
                caller_info: caller_info("u1", "Alice"),
                offer: json!({}),
            },
        )
        .await;

    let events = caller.drain();
    assert_eq!(events.len(), 1);
    let ServerEvent::CallFailed {
        target_user_id, ..
    } = &events[0]
    else {
        panic!("expected call-failed, got {events:?}");
    };
    assert_eq!(target_user_id.as_ref(), Some(&UserId::from("ghost")));
    bystander.assert_silent();
}

#[tokio::test]
async fn incomplete_caller_info_fails_without_resolution() {
    init_tracing();
    let (_backplane, relay) = single_instance();
    let mut caller = TestClient::connect(&relay);
    let mut target = TestClient::connect(&relay);

    register(&relay, &target, "u2", "Bob").await;
    caller.drain();
    target.drain();

    relay
        .handle_message(
            caller.id,
            ClientMessage::CallUser {
                target_user_id: "u2".into(),
                caller_info: CallerInfo {
                    id: Some("u1".to_string()),
                    username: None,
                },
                offer: json!({}),
            },
        )
        .await;

    // Rejected before any lookup: the registered target hears nothing.
    let events = caller.drain();
    assert!(matches!(
        events.as_slice(),
        [ServerEvent::CallFailed {
            target_user_id: None,
            ..
        }]
    ));
    target.assert_silent();
}

#[tokio::test]
async fn answer_reject_and_end_relay_to_given_connection() {
    init_tracing();
    let (_backplane, relay) = single_instance();
    let mut caller = TestClient::connect(&relay);
    let callee = TestClient::connect(&relay);

    relay
        .handle_message(
            callee.id,
            ClientMessage::AnswerCall {
                call_id: caller.id,
                answer: json!({ "type": "answer", "sdp": "v=0" }),
                user_info: json!({ "name": "Bob" }),
            },
        )
        .await;
    assert_eq!(
        caller.try_recv(),
        Some(ServerEvent::CallAnswered {
            answer: json!({ "type": "answer", "sdp": "v=0" }),
            user_info: json!({ "name": "Bob" }),
        })
    );

    relay
        .handle_message(callee.id, ClientMessage::RejectCall { call_id: caller.id })
        .await;
    assert_eq!(caller.try_recv(), Some(ServerEvent::CallRejected));

    relay
        .handle_message(
            callee.id,
            ClientMessage::EndCall {
                target_connection_id: caller.id,
            },
        )
        .await;
    assert_eq!(caller.try_recv(), Some(ServerEvent::CallEnded));
}

#[tokio::test]
async fn ice_candidate_relay_preserves_payload_exactly() {
    init_tracing();
    let (_backplane, relay) = single_instance();
    let sender = TestClient::connect(&relay);
    let mut receiver = TestClient::connect(&relay);

    let candidate = json!({
        "candidate": "candidate:842163049 1 udp 1677729535 10.0.0.7 53442 typ srflx",
        "sdpMid": "0",
        "sdpMLineIndex": 0,
        "usernameFragment": null,
        "nested": { "weird": [1, 2.5, "три", true] }
    });

    relay
        .handle_message(
            sender.id,
            ClientMessage::IceCandidate {
                target_connection_id: receiver.id,
                candidate: candidate.clone(),
            },
        )
        .await;

    assert_eq!(
        receiver.try_recv(),
        Some(ServerEvent::IceCandidate {
            candidate,
            from_connection_id: sender.id,
        })
    );
}

#[tokio::test]
async fn answer_to_stale_call_id_is_absorbed() {
    init_tracing();
    let (_backplane, relay) = single_instance();
    let mut callee = TestClient::connect(&relay);

    relay
        .handle_message(
            callee.id,
            ClientMessage::AnswerCall {
                call_id: ConnectionId::new(),
                answer: json!({}),
                user_info: json!({}),
            },
        )
        .await;

    // No reachable target anywhere is not an error the answerer hears about.
    callee.assert_silent();
}
