//! Command handlers for the paperchat CLI.

mod ask;
mod chat;

pub use ask::AskCommand;
pub use chat::ChatCommand;
