mod config;
mod events;
mod session;
mod sink;

pub use config::SessionConfig;
pub use events::{SessionEvent, SessionState};
pub use session::{AnswerOutcome, NegotiationSession, OfferOutcome};
pub use sink::SignalSink;
