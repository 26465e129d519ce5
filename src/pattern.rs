//! Anchored pattern templates and the ordered tables that hold them.
//!
//! Verb and action tables are priority-ordered lists rather than maps: the
//! first pattern that matches wins, and patterns are evaluated strictly in
//! declaration order.

use regex::{Captures, Regex};

use crate::error::{Error, Result};

/// A template compiled once, anchored at the start of the input.
#[derive(Debug, Clone)]
pub struct Pattern {
	source: String,
	regex: Regex,
}

impl Pattern {
	pub fn new(source: &str) -> Result<Self> {
		let regex = Regex::new(&format!("^(?:{source})")).map_err(|source_err| Error::InvalidPattern {
			pattern: source.to_owned(),
			source: source_err,
		})?;
		Ok(Self {
			source: source.to_owned(),
			regex,
		})
	}

	/// The template as it was declared.
	pub fn source(&self) -> &str {
		&self.source
	}

	pub fn is_match(&self, text: &str) -> bool {
		self.regex.is_match(text)
	}

	pub fn captures<'t>(&self, text: &'t str) -> Option<Captures<'t>> {
		self.regex.captures(text)
	}
}

/// Ordered `(pattern, handler)` pairs.
#[derive(Debug, Clone)]
pub struct PatternTable<H> {
	entries: Vec<(Pattern, H)>,
}

impl<H> Default for PatternTable<H> {
	fn default() -> Self {
		Self { entries: Vec::new() }
	}
}

impl<H> PatternTable<H> {
	pub fn new() -> Self {
		Self::default()
	}

	/// Appends a pattern. Re-declaring an existing template replaces its
	/// handler without changing its priority.
	pub fn insert(&mut self, source: &str, handler: H) -> Result<()> {
		if let Some(entry) = self.entries.iter_mut().find(|(p, _)| p.source == source) {
			entry.1 = handler;
			return Ok(());
		}
		self.entries.push((Pattern::new(source)?, handler));
		Ok(())
	}

	/// Drops a template. Unknown templates are ignored.
	pub fn remove(&mut self, source: &str) -> bool {
		let before = self.entries.len();
		self.entries.retain(|(p, _)| p.source != source);
		before != self.entries.len()
	}

	pub fn contains(&self, source: &str) -> bool {
		self.entries.iter().any(|(p, _)| p.source == source)
	}

	/// First handler whose pattern matches `text`.
	pub fn resolve(&self, text: &str) -> Option<&H> {
		self.entries.iter().find(|(p, _)| p.is_match(text)).map(|(_, h)| h)
	}

	pub fn iter(&self) -> impl Iterator<Item = (&Pattern, &H)> {
		self.entries.iter().map(|(p, h)| (p, h))
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}
}
