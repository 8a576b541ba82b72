mod command;
mod engine;
mod matchmaker;
mod room;
mod user;

pub use command::*;
pub use engine::*;
pub use matchmaker::*;
pub use room::*;
pub use user::*;
