//! A runtime for parser-driven interactive fiction.
//!
//! A story is a [`World`] of passages joined by exits and scattered with
//! objects. [`Game`] owns the world and drives the session: it asks a [`Ui`]
//! for a line, runs it through the parser chain of the current passage, and
//! publishes events that story code listens to.

pub mod error;
pub mod event;
pub mod game;
pub mod inventory;
pub mod object;
pub mod parser;
pub mod passage;
pub mod pattern;
pub mod script;
pub mod text;
pub mod timer;
pub mod ui;
pub mod value;
pub mod world;

#[cfg(test)]
mod testing;

pub use error::{Error, Result};
pub use event::{Listener, Payload};
pub use game::{Game, GameConfig, GameEvent, Phase};
pub use object::{Capacity, GameObject, ObjectBuilder, ObjectEvent, VerbContext};
pub use parser::Outcome;
pub use passage::{Exit, Passage, PassageBuilder, PassageEvent};
pub use text::Text;
pub use ui::{Terminal, Transcript, Ui};
pub use value::Value;
pub use world::{ObjectId, PassageId, World};

/// Logs to stderr, honouring `RUST_LOG`. Defaults to warnings only so the
/// narration stays readable.
pub fn init_logging() {
	env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
}
