use parley_core::{CallError, NegotiationState, RoomId, SessionError};
use parley_session::MemorySignalingStore;

use crate::integration::{create_test_peer, init_tracing, test_room};

#[tokio::test]
async fn test_answer_call_other_room() {
    init_tracing();

    let store = MemorySignalingStore::new();
    let room = test_room();
    let peer = create_test_peer(&store, &room, "callee");
    let other = RoomId::new("someone-else").unwrap();

    let result = peer.handle.answer_call(&other).await;
    assert_eq!(
        result,
        Err(CallError::Session(SessionError::RoomAlreadyBound {
            bound: room.clone(),
            requested: other.clone(),
        }))
    );

    let snapshot = peer.handle.snapshot().await.unwrap();
    assert_eq!(snapshot.state, NegotiationState::Idle);
    assert_eq!(store.listener_count(&other), 0);

    peer.handle.hangup().await;
}

#[tokio::test]
async fn test_create_offer_while_awaiting_offer_is_rejected() {
    init_tracing();

    let store = MemorySignalingStore::new();
    let room = test_room();
    let peer = create_test_peer(&store, &room, "callee");

    peer.handle.answer_call(&room).await.unwrap();

    let result = peer.handle.create_offer().await;
    assert_eq!(
        result,
        Err(CallError::Session(SessionError::InvalidState {
            action: "create offer",
            state: NegotiationState::AwaitingOffer,
        }))
    );
    assert!(peer.engine.calls().await.is_empty());

    peer.handle.hangup().await;
}
