use crate::signaling::{SignalingChannel, Subscription};
use async_trait::async_trait;
use dashmap::DashMap;
use parley_core::{
    CandidateField, ChannelError, ChannelEvent, DescriptionRecord, IceCandidate, RoomId, SdpKind,
    SessionDescription,
};
use serde_json::json;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::mpsc;
use tracing::{debug, warn};

struct Listener {
    id: u64,
    candidates: CandidateField,
    sink: mpsc::UnboundedSender<ChannelEvent>,
}

#[derive(Default)]
struct RoomDocument {
    offer: Option<DescriptionRecord>,
    answer: Option<DescriptionRecord>,
    offer_candidates: Vec<IceCandidate>,
    answer_candidates: Vec<IceCandidate>,
    listeners: Vec<Listener>,
}

impl RoomDocument {
    fn candidates(&self, field: CandidateField) -> &Vec<IceCandidate> {
        match field {
            CandidateField::OfferCandidates => &self.offer_candidates,
            CandidateField::AnswerCandidates => &self.answer_candidates,
        }
    }

    fn candidates_mut(&mut self, field: CandidateField) -> &mut Vec<IceCandidate> {
        match field {
            CandidateField::OfferCandidates => &mut self.offer_candidates,
            CandidateField::AnswerCandidates => &mut self.answer_candidates,
        }
    }

    /// Whole-document snapshot, as a document listener sees it after any
    /// write: every present description field is reported again.
    fn snapshot_events(&self) -> Vec<ChannelEvent> {
        let mut events = Vec::new();
        if let Some(record) = self.offer.clone() {
            match record.into_description(SdpKind::Offer) {
                Ok(desc) => events.push(ChannelEvent::OfferChanged(desc)),
                Err(e) => warn!("Skipping offer record: {}", e),
            }
        }
        if let Some(record) = self.answer.clone() {
            match record.into_description(SdpKind::Answer) {
                Ok(desc) => events.push(ChannelEvent::AnswerChanged(desc)),
                Err(e) => warn!("Skipping answer record: {}", e),
            }
        }
        events
    }

    fn notify_document(&mut self) {
        let events = self.snapshot_events();
        self.listeners.retain(|listener| {
            events
                .iter()
                .all(|event| listener.sink.send(event.clone()).is_ok())
        });
    }

    fn notify_candidate(&mut self, field: CandidateField, candidate: &IceCandidate) {
        self.listeners.retain(|listener| {
            listener.candidates != field
                || listener
                    .sink
                    .send(ChannelEvent::IceCandidateAdded(candidate.clone()))
                    .is_ok()
        });
    }
}

struct StoreInner {
    rooms: DashMap<RoomId, RoomDocument>,
    next_listener: AtomicU64,
    offline: AtomicBool,
}

/// In-process signaling store with document-store semantics: one document
/// per room holding `offer`, `answer`, `offerCandidates` and
/// `answerCandidates`, with snapshot listeners.
#[derive(Clone)]
pub struct MemorySignalingStore {
    inner: Arc<StoreInner>,
}

impl Default for MemorySignalingStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemorySignalingStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(StoreInner {
                rooms: DashMap::new(),
                next_listener: AtomicU64::new(1),
                offline: AtomicBool::new(false),
            }),
        }
    }

    pub fn channel(&self, room: RoomId) -> MemoryChannel {
        MemoryChannel {
            room,
            store: self.clone(),
        }
    }

    /// While offline every publish and subscribe fails with
    /// `ChannelError::Unavailable`.
    pub fn set_offline(&self, offline: bool) {
        self.inner.offline.store(offline, Ordering::SeqCst);
    }

    pub fn offer(&self, room: &RoomId) -> Option<DescriptionRecord> {
        self.inner.rooms.get(room).and_then(|doc| doc.offer.clone())
    }

    pub fn answer(&self, room: &RoomId) -> Option<DescriptionRecord> {
        self.inner.rooms.get(room).and_then(|doc| doc.answer.clone())
    }

    pub fn candidates(&self, room: &RoomId, field: CandidateField) -> Vec<IceCandidate> {
        self.inner
            .rooms
            .get(room)
            .map(|doc| doc.candidates(field).clone())
            .unwrap_or_default()
    }

    pub fn listener_count(&self, room: &RoomId) -> usize {
        self.inner
            .rooms
            .get(room)
            .map(|doc| doc.listeners.len())
            .unwrap_or(0)
    }

    /// The room document in its stored JSON layout.
    pub fn document_json(&self, room: &RoomId) -> Option<serde_json::Value> {
        let doc = self.inner.rooms.get(room)?;
        Some(json!({
            "offer": doc.offer,
            "answer": doc.answer,
            "offerCandidates": doc.offer_candidates,
            "answerCandidates": doc.answer_candidates,
        }))
    }

    fn ensure_online(&self) -> Result<(), ChannelError> {
        if self.inner.offline.load(Ordering::SeqCst) {
            return Err(ChannelError::Unavailable("store offline".to_owned()));
        }
        Ok(())
    }

    fn remove_listener(&self, room: &RoomId, id: u64) {
        if let Some(mut doc) = self.inner.rooms.get_mut(room) {
            doc.listeners.retain(|listener| listener.id != id);
        }
    }
}

/// A `MemorySignalingStore` view bound to one room.
#[derive(Clone)]
pub struct MemoryChannel {
    room: RoomId,
    store: MemorySignalingStore,
}

#[async_trait]
impl SignalingChannel for MemoryChannel {
    fn room(&self) -> &RoomId {
        &self.room
    }

    async fn publish_offer(&self, offer: &SessionDescription) -> Result<(), ChannelError> {
        self.store.ensure_online()?;
        let mut doc = self.store.inner.rooms.entry(self.room.clone()).or_default();

        // A new offer starts a new call: the old answer and candidates go.
        doc.offer = Some(DescriptionRecord::from(offer));
        doc.answer = None;
        doc.offer_candidates.clear();
        doc.answer_candidates.clear();
        doc.notify_document();

        debug!("Offer stored in room {}", self.room);
        Ok(())
    }

    async fn publish_answer(&self, answer: &SessionDescription) -> Result<(), ChannelError> {
        self.store.ensure_online()?;
        let mut doc = self.store.inner.rooms.entry(self.room.clone()).or_default();

        doc.answer = Some(DescriptionRecord::from(answer));
        doc.notify_document();

        debug!("Answer stored in room {}", self.room);
        Ok(())
    }

    async fn publish_ice_candidate(
        &self,
        field: CandidateField,
        candidate: &IceCandidate,
    ) -> Result<(), ChannelError> {
        self.store.ensure_online()?;
        let mut doc = self.store.inner.rooms.entry(self.room.clone()).or_default();

        doc.candidates_mut(field).push(candidate.clone());
        doc.notify_candidate(field, candidate);
        Ok(())
    }

    fn subscribe(
        &self,
        remote_candidates: CandidateField,
        sink: mpsc::UnboundedSender<ChannelEvent>,
    ) -> Result<Subscription, ChannelError> {
        self.store.ensure_online()?;
        let id = self.store.inner.next_listener.fetch_add(1, Ordering::Relaxed);
        {
            let mut doc = self.store.inner.rooms.entry(self.room.clone()).or_default();

            let replay = doc
                .snapshot_events()
                .into_iter()
                .chain(
                    doc.candidates(remote_candidates)
                        .iter()
                        .cloned()
                        .map(ChannelEvent::IceCandidateAdded),
                );
            for event in replay {
                if sink.send(event).is_err() {
                    return Err(ChannelError::Closed);
                }
            }

            doc.listeners.push(Listener {
                id,
                candidates: remote_candidates,
                sink,
            });
        }
        debug!("Listener {} subscribed to room {}", id, self.room);

        let store = self.store.clone();
        let room = self.room.clone();
        Ok(Subscription::new(move || {
            store.remove_listener(&room, id);
            debug!("Listener {} released from room {}", id, room);
        }))
    }
}
