use parley_session::{MemorySignalingStore, SessionConfig};

use crate::integration::{create_test_peer_with, init_tracing, test_room};

#[tokio::test]
async fn test_zero_capacity_config_still_runs() {
    init_tracing();

    let store = MemorySignalingStore::new();
    let room = test_room();
    let config = SessionConfig {
        command_buffer: 0,
        engine_event_buffer: 0,
        ..SessionConfig::default()
    };
    let peer = create_test_peer_with(&store, &room, "caller", &config);

    peer.handle
        .create_offer()
        .await
        .expect("create_offer failed");
    assert!(store.offer(&room).is_some());

    peer.handle.hangup().await;
}
