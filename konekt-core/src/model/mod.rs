mod game;
mod packet;
mod peer;
mod polite;
mod room;
mod signaling;

pub use game::GameKind;
pub use packet::{GamePacket, PacketError, GAME_CHANNEL_LABEL};
pub use peer::PeerId;
pub use polite::PoliteRole;
pub use room::RoomId;
pub use signaling::{default_stun_servers, ClientMessage, IceServerConfig, ServerMessage};
