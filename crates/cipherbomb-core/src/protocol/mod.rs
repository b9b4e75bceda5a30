//! Protocol types and events.

mod events;
mod types;

pub use events::GameEvent;
pub use types::{Category, GameId, Outcome, Phase, PlayerId};
