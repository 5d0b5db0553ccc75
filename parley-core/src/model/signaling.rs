use crate::error::ChannelError;
use crate::model::candidate::IceCandidate;
use crate::model::description::{SdpKind, SessionDescription};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
pub struct IceServerConfig {
    pub urls: Vec<String>,
    pub username: Option<String>,
    pub credential: Option<String>,
}

impl IceServerConfig {
    pub fn stun(url: impl Into<String>) -> Self {
        Self {
            urls: vec![url.into()],
            username: None,
            credential: None,
        }
    }
}

/// The `offer` / `answer` fields of a room document.
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
pub struct DescriptionRecord {
    pub sdp: String,
    #[serde(rename = "type")]
    pub kind: SdpKind,
}

impl DescriptionRecord {
    /// Decodes the record stored under the field for `expected`. A type tag
    /// that disagrees with the field is rejected.
    pub fn into_description(self, expected: SdpKind) -> Result<SessionDescription, ChannelError> {
        if self.kind != expected {
            return Err(ChannelError::Malformed(format!(
                "{} field holds a description of type {}",
                expected, self.kind
            )));
        }
        Ok(SessionDescription::new(self.kind, self.sdp))
    }
}

impl From<&SessionDescription> for DescriptionRecord {
    fn from(desc: &SessionDescription) -> Self {
        Self {
            sdp: desc.sdp().to_owned(),
            kind: desc.kind(),
        }
    }
}

/// Append-only candidate sub-collections of a room document, one per role so
/// both sides' candidates never mix.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Hash, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub enum CandidateField {
    OfferCandidates,
    AnswerCandidates,
}

impl CandidateField {
    pub fn as_str(&self) -> &'static str {
        match self {
            CandidateField::OfferCandidates => "offerCandidates",
            CandidateField::AnswerCandidates => "answerCandidates",
        }
    }

    pub fn opposite(&self) -> Self {
        match self {
            CandidateField::OfferCandidates => CandidateField::AnswerCandidates,
            CandidateField::AnswerCandidates => CandidateField::OfferCandidates,
        }
    }
}

impl fmt::Display for CandidateField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A change observed on a subscribed room.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum ChannelEvent {
    OfferChanged(SessionDescription),
    AnswerChanged(SessionDescription),
    IceCandidateAdded(IceCandidate),
}
