//! Narrative text and the wording helpers for articles, plurals and points.

use std::{fmt, rc::Rc};

use crate::game::Game;

/// Narrative text: either fixed, or computed from the game state when shown.
#[derive(Clone)]
pub enum Text {
	Plain(String),
	Computed(Rc<dyn Fn(&Game) -> String>),
}

impl Text {
	pub fn computed(f: impl Fn(&Game) -> String + 'static) -> Self {
		Text::Computed(Rc::new(f))
	}

	pub fn render(&self, game: &Game) -> String {
		match self {
			Text::Plain(s) => s.clone(),
			Text::Computed(f) => f(game),
		}
	}
}

impl fmt::Debug for Text {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Text::Plain(s) => f.debug_tuple("Plain").field(s).finish(),
			Text::Computed(_) => f.write_str("Computed(..)"),
		}
	}
}

impl From<&str> for Text {
	fn from(s: &str) -> Self {
		Text::Plain(s.to_owned())
	}
}

impl From<String> for Text {
	fn from(s: String) -> Self {
		Text::Plain(s)
	}
}

/// Lower-case vowel check used for a/an, matching `^[aeiou]`.
pub fn starts_with_vowel(name: &str) -> bool {
	name.starts_with(['a', 'e', 'i', 'o', 'u'])
}

/// "a X" or "an X".
pub fn indefinite(name: &str) -> String {
	if starts_with_vowel(name) { format!("an {name}") } else { format!("a {name}") }
}

/// "some X" for plural objects, otherwise "a X" / "an X".
pub fn article(name: &str, plural: bool) -> String {
	if plural { format!("some {name}") } else { indefinite(name) }
}

/// "1 point", "0 points", "-2 points".
pub fn points(n: i64) -> String {
	if n == 1 { format!("{n} point") } else { format!("{n} points") }
}
