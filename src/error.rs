use thiserror::Error;

use crate::world::{ObjectId, PassageId};

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
	/// A verb/action template failed to compile.
	#[error("invalid pattern '{pattern}': {source}")]
	InvalidPattern {
		pattern: String,
		#[source]
		source: regex::Error,
	},

	#[error("undefined noun")]
	UndefinedNoun,

	/// Discard was asked to infer the object but nothing is held under the noun.
	#[error("nothing held under noun '{0}'")]
	NotHeld(String),

	#[error("unknown passage {0}")]
	UnknownPassage(PassageId),

	#[error("unknown object {0}")]
	UnknownObject(ObjectId),

	#[error("the game has no current passage")]
	NoPassage,

	/// A listener failed; the rest of the emission was skipped.
	#[error("listener for '{event}' failed: {source}")]
	Listener {
		event: String,
		#[source]
		source: anyhow::Error,
	},

	/// An action, verb, exit or timer continuation failed.
	#[error("handler failed: {0}")]
	Handler(#[source] anyhow::Error),

	#[error("ui error: {0}")]
	Io(#[from] std::io::Error),
}
