use std::{
	cell::RefCell,
	collections::VecDeque,
	rc::Rc,
};

use async_trait::async_trait;

use super::Ui;
use crate::error::Result;

/// One call the game made on the adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
	Started(String),
	Shown(String),
	Said(String),
	/// A prompt, with the default it offered.
	Prompted(Option<String>),
	Cleared,
	Closed,
}

#[derive(Default)]
struct Recording {
	entries: Vec<Entry>,
	input: VecDeque<String>,
	hold: bool,
}

/// A headless adapter that records everything and answers prompts from a
/// queue. Clones share the same recording, so a test can keep one while the
/// game owns another.
#[derive(Clone, Default)]
pub struct Transcript {
	recording: Rc<RefCell<Recording>>,
}

impl Transcript {
	pub fn new() -> Self {
		Self::default()
	}

	/// Answers prompts without a default from `lines`, in order.
	pub fn with_input<I, S>(lines: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		let transcript = Self::new();
		transcript.recording.borrow_mut().input.extend(lines.into_iter().map(Into::into));
		transcript
	}

	/// Once input runs out, prompts wait forever instead of reporting the end
	/// of input. Useful for letting timers expire.
	pub fn holding(self) -> Self {
		self.recording.borrow_mut().hold = true;
		self
	}

	pub fn push_input(&self, line: &str) {
		self.recording.borrow_mut().input.push_back(line.to_owned());
	}

	pub fn entries(&self) -> Vec<Entry> {
		self.recording.borrow().entries.clone()
	}

	pub fn shown(&self) -> Vec<String> {
		self.collect(|e| match e {
			Entry::Shown(s) => Some(s.clone()),
			_ => None,
		})
	}

	pub fn said(&self) -> Vec<String> {
		self.collect(|e| match e {
			Entry::Said(s) => Some(s.clone()),
			_ => None,
		})
	}

	pub fn prompts(&self) -> usize {
		self.count(|e| matches!(e, Entry::Prompted(_)))
	}

	pub fn clears(&self) -> usize {
		self.count(|e| matches!(e, Entry::Cleared))
	}

	pub fn is_closed(&self) -> bool {
		self.count(|e| matches!(e, Entry::Closed)) > 0
	}

	fn collect(&self, f: impl Fn(&Entry) -> Option<String>) -> Vec<String> {
		self.recording.borrow().entries.iter().filter_map(f).collect()
	}

	fn count(&self, f: impl Fn(&Entry) -> bool) -> usize {
		self.recording.borrow().entries.iter().filter(|e| f(e)).count()
	}

	fn record(&self, entry: Entry) {
		self.recording.borrow_mut().entries.push(entry);
	}
}

#[async_trait(?Send)]
impl Ui for Transcript {
	async fn start(&mut self, title: &str) -> Result<()> {
		self.record(Entry::Started(title.to_owned()));
		Ok(())
	}

	async fn show(&mut self, message: &str) -> Result<()> {
		self.record(Entry::Shown(message.to_owned()));
		Ok(())
	}

	async fn say(&mut self, message: &str) -> Result<()> {
		self.record(Entry::Said(message.to_owned()));
		Ok(())
	}

	async fn prompt(&mut self, default: Option<&str>, _auto_play: bool) -> Result<Option<String>> {
		self.record(Entry::Prompted(default.map(str::to_owned)));
		if let Some(default) = default {
			return Ok(Some(default.to_owned()));
		}
		let (next, hold) = {
			let mut recording = self.recording.borrow_mut();
			(recording.input.pop_front(), recording.hold)
		};
		match next {
			Some(line) => Ok(Some(line)),
			None if hold => futures::future::pending().await,
			None => Ok(None),
		}
	}

	async fn clear(&mut self) -> Result<()> {
		self.record(Entry::Cleared);
		Ok(())
	}

	async fn close(&mut self) -> Result<()> {
		self.record(Entry::Closed);
		Ok(())
	}
}
