use crate::session::{SessionCommand, SessionSnapshot};
use parley_core::{CallError, RoomId, SessionError};
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

/// Cloneable front door to a running `CallSession`. These are the three
/// actions a call screen offers, plus a state query.
#[derive(Clone)]
pub struct CallHandle {
    room: RoomId,
    command_tx: mpsc::Sender<SessionCommand>,
}

impl CallHandle {
    pub(crate) fn new(room: RoomId, command_tx: mpsc::Sender<SessionCommand>) -> Self {
        Self { room, command_tx }
    }

    pub fn room(&self) -> &RoomId {
        &self.room
    }

    /// Start the call as the caller. Resolves once the offer is set locally
    /// and stored in the room, or with the error that stopped it.
    pub async fn create_offer(&self) -> Result<(), CallError> {
        let (reply, rx) = oneshot::channel();
        self.send(SessionCommand::CreateOffer { reply }).await?;
        rx.await.map_err(|_| CallError::from(SessionError::Closed))?
    }

    /// Join the call in `room` as the callee. Resolves once listeners are
    /// armed; the answer follows asynchronously when the offer shows up.
    pub async fn answer_call(&self, room: &RoomId) -> Result<(), CallError> {
        let (reply, rx) = oneshot::channel();
        self.send(SessionCommand::AnswerCall {
            room: room.clone(),
            reply,
        })
        .await?;
        rx.await.map_err(|_| CallError::from(SessionError::Closed))?
    }

    /// End the call. Never fails; calling it again is harmless.
    pub async fn hangup(&self) {
        let (reply, rx) = oneshot::channel();
        if self
            .command_tx
            .send(SessionCommand::Hangup { reply })
            .await
            .is_err()
        {
            debug!("Hangup after session for {} stopped", self.room);
            return;
        }
        let _ = rx.await;
    }

    pub async fn snapshot(&self) -> Result<SessionSnapshot, SessionError> {
        let (reply, rx) = oneshot::channel();
        self.send(SessionCommand::Snapshot { reply }).await?;
        rx.await.map_err(|_| SessionError::Closed)
    }

    async fn send(&self, cmd: SessionCommand) -> Result<(), SessionError> {
        self.command_tx
            .send(cmd)
            .await
            .map_err(|_| SessionError::Closed)
    }
}
