use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Label of the single peer-to-peer data channel used for game moves.
/// Shared by both ends so the receiving side can reject channels it
/// did not agree to.
pub const GAME_CHANNEL_LABEL: &str = "konekt-game";

#[derive(Debug, Error)]
pub enum PacketError {
    #[error("invalid game packet: {0}")]
    Invalid(#[from] serde_json::Error),
}

/// Wire schema of the game data channel. Move payloads are opaque to
/// the transport; the game rules engines on either end interpret them.
/// Tags this build does not know decode to `Unknown` and are dropped
/// by the receiver.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum GamePacket {
    Move {
        #[serde(rename = "move")]
        game_move: serde_json::Value,
    },
    #[serde(other)]
    Unknown,
}

impl GamePacket {
    pub fn encode(&self) -> Result<String, PacketError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn decode(data: &[u8]) -> Result<Self, PacketError> {
        Ok(serde_json::from_slice(data)?)
    }
}
