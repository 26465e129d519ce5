//! Presentation adapters.
//!
//! The game talks to its player only through [`Ui`]. Prompts take `&mut self`,
//! so a second prompt cannot be issued while one is outstanding.

mod terminal;
mod transcript;

use async_trait::async_trait;

pub use self::{
	terminal::Terminal,
	transcript::{Entry, Transcript},
};
use crate::error::Result;

#[async_trait(?Send)]
pub trait Ui {
	async fn start(&mut self, title: &str) -> Result<()>;

	/// Renders a passage's message.
	async fn show(&mut self, message: &str) -> Result<()>;

	async fn say(&mut self, message: &str) -> Result<()>;

	/// Reads one line. With `auto_play` and a default the default is taken
	/// without waiting for the player. `None` means no more input.
	async fn prompt(&mut self, default: Option<&str>, auto_play: bool) -> Result<Option<String>>;

	/// Separates scenes, e.g. after a restart.
	async fn clear(&mut self) -> Result<()>;

	/// Tears down the presentation. Calling it twice is harmless.
	async fn close(&mut self) -> Result<()>;
}
