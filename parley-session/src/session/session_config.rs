use anyhow::{Context, Result, bail};
use parley_core::IceServerConfig;
use serde::{Deserialize, Serialize};

/// Settings for a call session and its peer connection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SessionConfig {
    /// STUN/TURN servers handed to the ICE agent.
    pub ice_servers: Vec<IceServerConfig>,

    /// Create local audio/video tracks before producing an offer or answer.
    /// Without them the session negotiates receive-only.
    pub attach_local_media: bool,

    /// Capacity of the handle -> session command queue.
    pub command_buffer: usize,

    /// Capacity of the engine -> session event queue.
    pub engine_event_buffer: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ice_servers: vec![
                IceServerConfig::stun("stun:stun1.l.google.com:19302"),
                IceServerConfig::stun("stun:stun2.l.google.com:19302"),
            ],
            attach_local_media: true,
            command_buffer: 32,
            engine_event_buffer: 256,
        }
    }
}

impl SessionConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json).context("Failed to parse session config")?;
        config.validate().context("Invalid session config")?;
        Ok(config)
    }

    /// Queue capacities must be non-zero.
    pub fn validate(&self) -> Result<()> {
        if self.command_buffer == 0 {
            bail!("command_buffer must be at least 1");
        }
        if self.engine_event_buffer == 0 {
            bail!("engine_event_buffer must be at least 1");
        }
        Ok(())
    }
}
