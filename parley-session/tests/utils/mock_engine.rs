use anyhow::{Result, anyhow};
use async_trait::async_trait;
use parley_core::{IceCandidate, SessionDescription};
use parley_session::{EngineEvent, MediaEngine};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{Mutex, Notify, mpsc};

/// Engine operations recorded by `MockEngine`, in call order.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCall {
    AttachLocalTracks,
    CreateOffer,
    CreateAnswer,
    SetLocal(SessionDescription),
    SetRemote(SessionDescription),
    AddIceCandidate(IceCandidate),
    Close,
}

#[derive(Default)]
struct Faults {
    attach: AtomicBool,
    create_offer: AtomicBool,
    set_remote: AtomicBool,
    hold_create_offer: AtomicBool,
    gather_on_set_local: AtomicBool,
}

/// MediaEngine fake that records every call and produces canned SDP.
///
/// Failures can be switched on per operation, and `create_offer` can be held
/// until `release_create_offer` is called.
#[derive(Clone)]
pub struct MockEngine {
    label: &'static str,
    calls: Arc<Mutex<Vec<EngineCall>>>,
    faults: Arc<Faults>,
    offer_gate: Arc<Notify>,
    events: mpsc::Sender<EngineEvent>,
}

impl MockEngine {
    /// Create a new MockEngine and the event receiver to hand to the session.
    pub fn new(label: &'static str) -> (Self, mpsc::Receiver<EngineEvent>) {
        let (events, rx) = mpsc::channel(64);
        let engine = Self {
            label,
            calls: Arc::new(Mutex::new(Vec::new())),
            faults: Arc::new(Faults::default()),
            offer_gate: Arc::new(Notify::new()),
            events,
        };
        (engine, rx)
    }

    pub fn offer_sdp(&self) -> SessionDescription {
        SessionDescription::offer(format!("v=0 offer from {}", self.label))
    }

    pub fn answer_sdp(&self) -> SessionDescription {
        SessionDescription::answer(format!("v=0 answer from {}", self.label))
    }

    /// The host candidate this engine reports while gathering.
    pub fn host_candidate(&self) -> IceCandidate {
        IceCandidate::new(
            format!("candidate:1 1 udp 2130706431 10.0.0.1 5000 typ host generation 0 ufrag {}", self.label),
            "0",
            0,
        )
    }

    pub async fn calls(&self) -> Vec<EngineCall> {
        self.calls.lock().await.clone()
    }

    pub async fn count(&self, f: impl Fn(&EngineCall) -> bool) -> usize {
        self.calls.lock().await.iter().filter(|c| f(c)).count()
    }

    /// Wait until the recorded calls satisfy `pred`.
    pub async fn wait_for_calls(&self, pred: impl Fn(&[EngineCall]) -> bool) -> bool {
        let start = std::time::Instant::now();
        let timeout = std::time::Duration::from_millis(5000);

        loop {
            if pred(&self.calls.lock().await) {
                return true;
            }
            if start.elapsed() > timeout {
                return false;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
    }

    /// Raise an engine event as if the peer connection produced it.
    pub async fn emit(&self, event: EngineEvent) {
        self.events
            .send(event)
            .await
            .expect("session stopped reading engine events");
    }

    pub fn fail_attach(&self, fail: bool) {
        self.faults.attach.store(fail, Ordering::SeqCst);
    }

    pub fn fail_create_offer(&self, fail: bool) {
        self.faults.create_offer.store(fail, Ordering::SeqCst);
    }

    pub fn fail_set_remote(&self, fail: bool) {
        self.faults.set_remote.store(fail, Ordering::SeqCst);
    }

    /// Report `host_candidate` from inside `set_local_description`, before it
    /// returns, the way a real ICE agent starts gathering.
    pub fn gather_on_set_local(&self, gather: bool) {
        self.faults.gather_on_set_local.store(gather, Ordering::SeqCst);
    }

    pub fn hold_create_offer(&self) {
        self.faults.hold_create_offer.store(true, Ordering::SeqCst);
    }

    pub fn release_create_offer(&self) {
        self.faults.hold_create_offer.store(false, Ordering::SeqCst);
        self.offer_gate.notify_one();
    }

    async fn record(&self, call: EngineCall) {
        tracing::debug!("[MockEngine {}] {:?}", self.label, call);
        self.calls.lock().await.push(call);
    }
}

#[async_trait]
impl MediaEngine for MockEngine {
    async fn attach_local_tracks(&self) -> Result<()> {
        self.record(EngineCall::AttachLocalTracks).await;
        if self.faults.attach.load(Ordering::SeqCst) {
            return Err(anyhow!("camera unavailable"));
        }
        Ok(())
    }

    async fn create_offer(&self) -> Result<SessionDescription> {
        self.record(EngineCall::CreateOffer).await;
        if self.faults.hold_create_offer.load(Ordering::SeqCst) {
            self.offer_gate.notified().await;
        }
        if self.faults.create_offer.load(Ordering::SeqCst) {
            return Err(anyhow!("offer boom"));
        }
        Ok(self.offer_sdp())
    }

    async fn create_answer(&self) -> Result<SessionDescription> {
        self.record(EngineCall::CreateAnswer).await;
        Ok(self.answer_sdp())
    }

    async fn set_local_description(&self, desc: &SessionDescription) -> Result<()> {
        self.record(EngineCall::SetLocal(desc.clone())).await;
        if self.faults.gather_on_set_local.load(Ordering::SeqCst) {
            let _ = self
                .events
                .send(EngineEvent::LocalCandidate(self.host_candidate()))
                .await;
        }
        Ok(())
    }

    async fn set_remote_description(&self, desc: &SessionDescription) -> Result<()> {
        self.record(EngineCall::SetRemote(desc.clone())).await;
        if self.faults.set_remote.load(Ordering::SeqCst) {
            return Err(anyhow!("bad remote sdp"));
        }
        Ok(())
    }

    async fn add_ice_candidate(&self, candidate: &IceCandidate) -> Result<()> {
        self.record(EngineCall::AddIceCandidate(candidate.clone()))
            .await;
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.record(EngineCall::Close).await;
        Ok(())
    }
}
