use crate::session::SessionConfig;
use crate::transport::{EngineEvent, MediaEngine};
use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use parley_core::{
    IceCandidate, PeerConnectionState, RemoteTrack, SdpKind, SessionDescription, TrackKind,
};
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};
use tracing::{debug, info, warn};
use webrtc::api::APIBuilder;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::{self, MIME_TYPE_OPUS, MIME_TYPE_VP8};
use webrtc::ice_transport::ice_candidate::{RTCIceCandidate, RTCIceCandidateInit};
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::sdp_type::RTCSdpType;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::rtp_transceiver::rtp_codec::{RTCRtpCodecCapability, RTPCodecType};
use webrtc::rtp_transceiver::rtp_sender::RTCRtpSender;
use webrtc::track::track_local::TrackLocal;
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;
use webrtc::track::track_remote::TrackRemote;

const LOCAL_STREAM_ID: &str = "parley-local";

/// Local media the capture side writes samples into.
pub struct LocalTracks {
    pub video: Arc<TrackLocalStaticSample>,
    pub audio: Arc<TrackLocalStaticSample>,
    senders: Vec<Arc<RTCRtpSender>>,
}

/// `MediaEngine` backed by a webrtc-rs peer connection.
pub struct RtcMediaEngine {
    peer_connection: Arc<RTCPeerConnection>,
    local_tracks: Mutex<Option<LocalTracks>>,
}

impl RtcMediaEngine {
    /// Builds the peer connection. `event_tx` receives candidates, remote
    /// tracks and connection state changes as the engine produces them.
    pub async fn new(config: &SessionConfig, event_tx: mpsc::Sender<EngineEvent>) -> Result<Self> {
        let mut m = media_engine::MediaEngine::default();
        m.register_default_codecs()?;
        let registry = register_default_interceptors(Registry::new(), &mut m)?;

        let api = APIBuilder::new()
            .with_media_engine(m)
            .with_interceptor_registry(registry)
            .build();

        let rtc_config = RTCConfiguration {
            ice_servers: config
                .ice_servers
                .iter()
                .map(|server| RTCIceServer {
                    urls: server.urls.clone(),
                    username: server.username.clone().unwrap_or_default(),
                    credential: server.credential.clone().unwrap_or_default(),
                    ..Default::default()
                })
                .collect(),
            ..Default::default()
        };

        let peer_connection = Arc::new(
            api.new_peer_connection(rtc_config)
                .await
                .context("Failed to create peer connection")?,
        );

        let state_tx = event_tx.clone();
        peer_connection.on_peer_connection_state_change(Box::new(
            move |s: RTCPeerConnectionState| {
                let tx = state_tx.clone();

                Box::pin(async move {
                    info!("Peer connection state changed: {:?}", s);
                    let Some(state) = map_connection_state(s) else {
                        return;
                    };
                    let _ = tx.send(EngineEvent::ConnectionState(state)).await;
                })
            },
        ));

        let ice_tx = event_tx.clone();
        peer_connection.on_ice_candidate(Box::new(move |c: Option<RTCIceCandidate>| {
            let tx = ice_tx.clone();

            Box::pin(async move {
                let Some(candidate) = c else { return };
                let Ok(init) = candidate.to_json() else {
                    return;
                };
                let candidate = IceCandidate {
                    candidate: init.candidate,
                    sdp_mid: init.sdp_mid.unwrap_or_default(),
                    sdp_m_line_index: init.sdp_mline_index.unwrap_or(0),
                };
                let _ = tx.send(EngineEvent::LocalCandidate(candidate)).await;
            })
        }));

        let track_tx = event_tx;
        peer_connection.on_track(Box::new(move |track: Arc<TrackRemote>, _, _| {
            let tx = track_tx.clone();

            Box::pin(async move {
                let remote = RemoteTrack {
                    id: track.id(),
                    stream_id: track.stream_id(),
                    kind: match track.kind() {
                        RTPCodecType::Audio => TrackKind::Audio,
                        _ => TrackKind::Video,
                    },
                };
                debug!("Remote track {} ({:?}) arrived", remote.id, remote.kind);
                let _ = tx.send(EngineEvent::RemoteTrack(remote)).await;
            })
        }));

        Ok(Self {
            peer_connection,
            local_tracks: Mutex::new(None),
        })
    }

    pub async fn local_video_track(&self) -> Option<Arc<TrackLocalStaticSample>> {
        self.local_tracks
            .lock()
            .await
            .as_ref()
            .map(|tracks| tracks.video.clone())
    }

    pub async fn local_audio_track(&self) -> Option<Arc<TrackLocalStaticSample>> {
        self.local_tracks
            .lock()
            .await
            .as_ref()
            .map(|tracks| tracks.audio.clone())
    }

    async fn add_local_track(&self, track: Arc<TrackLocalStaticSample>) -> Result<Arc<RTCRtpSender>> {
        let sender = self
            .peer_connection
            .add_track(track as Arc<dyn TrackLocal + Send + Sync>)
            .await
            .context("Failed to add local track")?;

        // Interceptors only run while RTCP is being read.
        let rtcp_sender = sender.clone();
        tokio::spawn(async move {
            let mut buf = vec![0u8; 1500];
            while rtcp_sender.read(&mut buf).await.is_ok() {}
        });

        Ok(sender)
    }
}

#[async_trait]
impl MediaEngine for RtcMediaEngine {
    async fn attach_local_tracks(&self) -> Result<()> {
        let mut slot = self.local_tracks.lock().await;
        if slot.is_some() {
            return Ok(());
        }

        let video = Arc::new(TrackLocalStaticSample::new(
            RTCRtpCodecCapability {
                mime_type: MIME_TYPE_VP8.to_owned(),
                ..Default::default()
            },
            "video".to_owned(),
            LOCAL_STREAM_ID.to_owned(),
        ));
        let audio = Arc::new(TrackLocalStaticSample::new(
            RTCRtpCodecCapability {
                mime_type: MIME_TYPE_OPUS.to_owned(),
                ..Default::default()
            },
            "audio".to_owned(),
            LOCAL_STREAM_ID.to_owned(),
        ));

        let senders = vec![
            self.add_local_track(video.clone()).await?,
            self.add_local_track(audio.clone()).await?,
        ];

        *slot = Some(LocalTracks {
            video,
            audio,
            senders,
        });
        info!("Local audio and video tracks attached");
        Ok(())
    }

    async fn create_offer(&self) -> Result<SessionDescription> {
        let offer = self
            .peer_connection
            .create_offer(None)
            .await
            .context("Failed to create SDP offer")?;
        from_rtc(offer)
    }

    async fn create_answer(&self) -> Result<SessionDescription> {
        let answer = self
            .peer_connection
            .create_answer(None)
            .await
            .context("Failed to create SDP answer")?;
        from_rtc(answer)
    }

    async fn set_local_description(&self, desc: &SessionDescription) -> Result<()> {
        self.peer_connection
            .set_local_description(to_rtc(desc)?)
            .await
            .context("Failed to set local description")?;
        Ok(())
    }

    async fn set_remote_description(&self, desc: &SessionDescription) -> Result<()> {
        self.peer_connection
            .set_remote_description(to_rtc(desc)?)
            .await
            .context("Failed to set remote description")?;
        Ok(())
    }

    async fn add_ice_candidate(&self, candidate: &IceCandidate) -> Result<()> {
        let init = RTCIceCandidateInit {
            candidate: candidate.candidate.clone(),
            sdp_mid: (!candidate.sdp_mid.is_empty()).then(|| candidate.sdp_mid.clone()),
            sdp_mline_index: Some(candidate.sdp_m_line_index),
            username_fragment: None,
        };
        self.peer_connection
            .add_ice_candidate(init)
            .await
            .context("Failed to add ICE candidate")?;
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        if let Some(tracks) = self.local_tracks.lock().await.take() {
            for sender in tracks.senders {
                if let Err(e) = self.peer_connection.remove_track(&sender).await {
                    warn!("Failed to remove local track: {:?}", e);
                }
            }
        }
        self.peer_connection
            .close()
            .await
            .context("Failed to close peer connection")?;
        Ok(())
    }
}

fn to_rtc(desc: &SessionDescription) -> Result<RTCSessionDescription> {
    let sdp = desc.sdp().to_owned();
    let rtc = match desc.kind() {
        SdpKind::Offer => RTCSessionDescription::offer(sdp)?,
        SdpKind::Answer => RTCSessionDescription::answer(sdp)?,
    };
    Ok(rtc)
}

fn from_rtc(desc: RTCSessionDescription) -> Result<SessionDescription> {
    let kind = match desc.sdp_type {
        RTCSdpType::Offer => SdpKind::Offer,
        RTCSdpType::Answer => SdpKind::Answer,
        other => bail!("Unexpected SDP type {}", other),
    };
    Ok(SessionDescription::new(kind, desc.sdp))
}

fn map_connection_state(state: RTCPeerConnectionState) -> Option<PeerConnectionState> {
    match state {
        RTCPeerConnectionState::New => Some(PeerConnectionState::New),
        RTCPeerConnectionState::Connecting => Some(PeerConnectionState::Connecting),
        RTCPeerConnectionState::Connected => Some(PeerConnectionState::Connected),
        RTCPeerConnectionState::Disconnected => Some(PeerConnectionState::Disconnected),
        RTCPeerConnectionState::Failed => Some(PeerConnectionState::Failed),
        RTCPeerConnectionState::Closed => Some(PeerConnectionState::Closed),
        RTCPeerConnectionState::Unspecified => None,
    }
}
