pub mod matchmaking;
pub mod signaling;

pub use matchmaking::*;
pub use signaling::*;
