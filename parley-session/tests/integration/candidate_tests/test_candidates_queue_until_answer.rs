use parley_core::{CandidateField, IceCandidate, NegotiationState, SessionDescription};
use parley_session::{MemorySignalingStore, SignalingChannel};

use crate::integration::{create_test_peer, init_tracing, test_room};
use crate::utils::{EngineCall, wait_for_snapshot, wait_for_state};

fn candidate(n: u16) -> IceCandidate {
    IceCandidate::new(
        format!("candidate:{n} 1 udp 2130706431 192.168.1.{n} 5000 typ host"),
        "0",
        0,
    )
}

#[tokio::test]
async fn test_candidates_queue_until_answer() {
    init_tracing();

    let store = MemorySignalingStore::new();
    let room = test_room();
    let caller = create_test_peer(&store, &room, "caller");
    let remote = store.channel(room.clone());

    caller.handle.create_offer().await.unwrap();

    // Candidates overtake the answer
    for n in 1..=3 {
        remote
            .publish_ice_candidate(CandidateField::AnswerCandidates, &candidate(n))
            .await
            .unwrap();
    }
    wait_for_snapshot(&caller.handle, |s| s.pending_candidates == 3)
        .await
        .expect("Candidates were not queued");
    assert_eq!(
        caller
            .engine
            .count(|c| matches!(c, EngineCall::AddIceCandidate(_)))
            .await,
        0
    );

    let answer = SessionDescription::answer("v=0 remote answer");
    remote.publish_answer(&answer).await.unwrap();
    wait_for_state(&caller.handle, NegotiationState::Negotiated)
        .await
        .expect("Caller did not negotiate");

    let ok = caller
        .engine
        .wait_for_calls(|calls| calls.len() >= 7)
        .await;
    assert!(ok, "Queued candidates were not applied");

    // Remote description first, then the queue in arrival order
    let calls = caller.engine.calls().await;
    assert_eq!(
        calls[3..7],
        [
            EngineCall::SetRemote(answer),
            EngineCall::AddIceCandidate(candidate(1)),
            EngineCall::AddIceCandidate(candidate(2)),
            EngineCall::AddIceCandidate(candidate(3)),
        ]
    );
    assert_eq!(caller.handle.snapshot().await.unwrap().pending_candidates, 0);

    // Late candidates go straight to the engine
    remote
        .publish_ice_candidate(CandidateField::AnswerCandidates, &candidate(4))
        .await
        .unwrap();
    let ok = caller
        .engine
        .wait_for_calls(|calls| calls.last() == Some(&EngineCall::AddIceCandidate(candidate(4))))
        .await;
    assert!(ok, "Late candidate was not applied");

    caller.handle.hangup().await;
}
