use std::time::Duration;

use parley_core::{CandidateField, IceCandidate, NegotiationState, PeerConnectionState};
use parley_session::{EngineEvent, MemorySignalingStore, SessionEvent};

use crate::integration::{create_test_peer, init_tracing, test_room};
use crate::utils::{EngineCall, wait_for_event, wait_for_state};

#[tokio::test]
async fn test_local_candidates_published() {
    init_tracing();

    let store = MemorySignalingStore::new();
    let room = test_room();
    let mut caller = create_test_peer(&store, &room, "caller");
    let callee = create_test_peer(&store, &room, "callee");

    caller.handle.create_offer().await.unwrap();
    callee.handle.answer_call(&room).await.unwrap();
    wait_for_state(&caller.handle, NegotiationState::Negotiated)
        .await
        .unwrap();
    wait_for_state(&callee.handle, NegotiationState::Negotiated)
        .await
        .unwrap();

    // Caller candidates land in offerCandidates and reach the callee
    let from_caller = IceCandidate::new("candidate:1 1 udp 1 10.0.0.1 4000 typ host", "0", 0);
    caller
        .engine
        .emit(EngineEvent::LocalCandidate(from_caller.clone()))
        .await;
    let ok = callee
        .engine
        .wait_for_calls(|calls| calls.contains(&EngineCall::AddIceCandidate(from_caller.clone())))
        .await;
    assert!(ok, "Callee never applied the caller candidate");
    assert_eq!(
        store.candidates(&room, CandidateField::OfferCandidates),
        vec![from_caller]
    );

    // And the other way round
    let from_callee = IceCandidate::new("candidate:2 1 udp 1 10.0.0.2 4000 typ host", "1", 1);
    callee
        .engine
        .emit(EngineEvent::LocalCandidate(from_callee.clone()))
        .await;
    let ok = caller
        .engine
        .wait_for_calls(|calls| calls.contains(&EngineCall::AddIceCandidate(from_callee.clone())))
        .await;
    assert!(ok, "Caller never applied the callee candidate");
    assert_eq!(
        store.candidates(&room, CandidateField::AnswerCandidates),
        vec![from_callee]
    );

    caller
        .engine
        .emit(EngineEvent::ConnectionState(PeerConnectionState::Connected))
        .await;
    let event = wait_for_event(&mut caller.events, |e| {
        matches!(e, SessionEvent::ConnectionStateChanged(_))
    })
    .await
    .unwrap();
    assert_eq!(
        event,
        SessionEvent::ConnectionStateChanged(PeerConnectionState::Connected)
    );

    caller.handle.hangup().await;
    callee.handle.hangup().await;
}

#[tokio::test]
async fn test_candidate_without_role_is_dropped() {
    init_tracing();

    let store = MemorySignalingStore::new();
    let room = test_room();
    let peer = create_test_peer(&store, &room, "idle");

    peer.engine
        .emit(EngineEvent::LocalCandidate(IceCandidate::new(
            "candidate:9",
            "0",
            0,
        )))
        .await;
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert!(store.candidates(&room, CandidateField::OfferCandidates).is_empty());
    assert!(store.candidates(&room, CandidateField::AnswerCandidates).is_empty());

    peer.handle.hangup().await;
}
