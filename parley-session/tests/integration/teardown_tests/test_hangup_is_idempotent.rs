use std::time::Duration;

use parley_core::{CallError, NegotiationState, PeerConnectionState, SessionError};
use parley_session::{EngineEvent, MemorySignalingStore, SessionEvent};

use crate::integration::{create_test_peer, init_tracing, test_room};
use crate::utils::{EngineCall, drain_events};

#[tokio::test]
async fn test_hangup_is_idempotent() {
    init_tracing();

    let store = MemorySignalingStore::new();
    let room = test_room();
    let mut peer = create_test_peer(&store, &room, "caller");

    peer.handle.create_offer().await.unwrap();
    assert_eq!(store.listener_count(&room), 1);

    peer.handle.hangup().await;
    peer.handle.hangup().await;

    let snapshot = peer.handle.snapshot().await.unwrap();
    assert_eq!(snapshot.state, NegotiationState::Closed);
    assert_eq!(snapshot.pending_candidates, 0);
    assert_eq!(store.listener_count(&room), 0);
    assert_eq!(
        peer.engine.count(|c| *c == EngineCall::Close).await,
        1,
        "engine must be closed exactly once"
    );

    // Engine events after close never surface
    peer.engine
        .emit(EngineEvent::ConnectionState(PeerConnectionState::Disconnected))
        .await;
    tokio::time::sleep(Duration::from_millis(100)).await;

    let events = drain_events(&mut peer.events);
    let closed = events
        .iter()
        .filter(|e| **e == SessionEvent::SessionClosed)
        .count();
    assert_eq!(closed, 1, "expected exactly one SessionClosed");
    assert!(
        !events
            .iter()
            .any(|e| matches!(e, SessionEvent::ConnectionStateChanged(_)))
    );

    // Every action is refused once closed
    assert_eq!(
        peer.handle.create_offer().await,
        Err(CallError::Session(SessionError::Closed))
    );
    assert_eq!(
        peer.handle.answer_call(&room).await,
        Err(CallError::Session(SessionError::Closed))
    );
}
