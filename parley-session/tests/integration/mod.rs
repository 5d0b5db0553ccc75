pub mod candidate_tests;
pub mod connection_tests;
pub mod failure_tests;

use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::Level;

use parley_core::RoomId;
use parley_session::{CallHandle, CallSession, MemorySignalingStore, SessionConfig, SessionEvent};

use crate::utils::MockEngine;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_test_writer()
        .try_init();
}

/// A running session wired to a `MockEngine`.
pub struct TestPeer {
    pub handle: CallHandle,
    pub events: mpsc::UnboundedReceiver<SessionEvent>,
    pub engine: MockEngine,
}

pub fn test_room() -> RoomId {
    RoomId::generate()
}

pub fn create_test_peer(store: &MemorySignalingStore, room: &RoomId, label: &'static str) -> TestPeer {
    create_test_peer_with(store, room, label, &SessionConfig::default())
}

pub fn create_test_peer_with(
    store: &MemorySignalingStore,
    room: &RoomId,
    label: &'static str,
    config: &SessionConfig,
) -> TestPeer {
    let (engine, engine_rx) = MockEngine::new(label);
    let channel = Arc::new(store.channel(room.clone()));
    let (handle, events) = CallSession::spawn(channel, Arc::new(engine.clone()), engine_rx, config);

    TestPeer {
        handle,
        events,
        engine,
    }
}
