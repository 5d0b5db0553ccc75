use crate::negotiation::{EngineCompletion, EngineOp, EngineOutcome};
use crate::transport::MediaEngine;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::mpsc;
use tracing::debug;

/// Runs engine operations one at a time, in submission order, and reports
/// each result back to the session. Once shut down, queued operations are
/// dropped without touching the engine.
pub(crate) struct EngineWorker {
    ops_tx: mpsc::UnboundedSender<(u64, EngineOp)>,
    closed: Arc<AtomicBool>,
}

impl EngineWorker {
    pub(crate) fn spawn(
        engine: Arc<dyn MediaEngine>,
        completions: mpsc::UnboundedSender<EngineCompletion>,
    ) -> Self {
        let (ops_tx, ops_rx) = mpsc::unbounded_channel();
        let closed = Arc::new(AtomicBool::new(false));

        tokio::spawn(run(engine, ops_rx, completions, closed.clone()));

        Self { ops_tx, closed }
    }

    pub(crate) fn submit(&self, round: u64, op: EngineOp) {
        if self.ops_tx.send((round, op)).is_err() {
            debug!("Engine worker gone, operation dropped");
        }
    }

    pub(crate) fn shutdown(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

async fn run(
    engine: Arc<dyn MediaEngine>,
    mut ops_rx: mpsc::UnboundedReceiver<(u64, EngineOp)>,
    completions: mpsc::UnboundedSender<EngineCompletion>,
    closed: Arc<AtomicBool>,
) {
    while let Some((round, op)) = ops_rx.recv().await {
        if closed.load(Ordering::SeqCst) {
            debug!("Skipping engine operation after close: {:?}", op);
            continue;
        }

        let outcome = perform(engine.as_ref(), op).await;
        if completions.send(EngineCompletion { round, outcome }).is_err() {
            break;
        }
    }
    debug!("Engine worker stopped");
}

async fn perform(engine: &dyn MediaEngine, op: EngineOp) -> EngineOutcome {
    match op {
        EngineOp::AttachLocalTracks => {
            EngineOutcome::LocalTracksAttached(engine.attach_local_tracks().await.map_err(render))
        }
        EngineOp::CreateOffer => EngineOutcome::OfferCreated(engine.create_offer().await.map_err(render)),
        EngineOp::CreateAnswer => {
            EngineOutcome::AnswerCreated(engine.create_answer().await.map_err(render))
        }
        EngineOp::SetLocalDescription(desc) => EngineOutcome::LocalDescriptionSet(
            engine.set_local_description(&desc).await.map_err(render),
        ),
        EngineOp::SetRemoteDescription(desc) => EngineOutcome::RemoteDescriptionSet(
            engine.set_remote_description(&desc).await.map_err(render),
        ),
        EngineOp::AddIceCandidate(candidate) => EngineOutcome::IceCandidateAdded(
            engine.add_ice_candidate(&candidate).await.map_err(render),
        ),
    }
}

fn render(e: anyhow::Error) -> String {
    format!("{e:#}")
}
