//! Flag values and the flag store.

use std::{collections::HashMap, fmt};

// ---------------------------------------------------------------------------
// Dynamic value type
// ---------------------------------------------------------------------------

/// A flag value. Stories branch on these, so comparisons are by value.
#[derive(Clone, Debug, PartialEq, Default)]
pub enum Value {
	Number(i64),
	Bool(bool),
	Str(String),
	#[default]
	Null,
}

impl Value {
	pub fn truthy(&self) -> bool {
		match self {
			Value::Bool(b) => *b,
			Value::Number(n) => *n != 0,
			Value::Str(s) => !s.is_empty(),
			Value::Null => false,
		}
	}

	pub fn as_number(&self) -> i64 {
		match self {
			Value::Number(n) => *n,
			Value::Bool(b) => i64::from(*b),
			Value::Str(s) => s.trim().parse().unwrap_or(0),
			Value::Null => 0,
		}
	}

	pub fn as_str(&self) -> Option<&str> {
		match self {
			Value::Str(s) => Some(s),
			_ => None,
		}
	}
}

impl fmt::Display for Value {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Value::Number(n) => write!(f, "{n}"),
			Value::Bool(b) => write!(f, "{b}"),
			Value::Str(s) => f.write_str(s),
			Value::Null => f.write_str("<null>"),
		}
	}
}

impl From<i64> for Value {
	fn from(n: i64) -> Self {
		Value::Number(n)
	}
}

impl From<i32> for Value {
	fn from(n: i32) -> Self {
		Value::Number(n.into())
	}
}

impl From<bool> for Value {
	fn from(b: bool) -> Self {
		Value::Bool(b)
	}
}

impl From<&str> for Value {
	fn from(s: &str) -> Self {
		Value::Str(s.to_owned())
	}
}

impl From<String> for Value {
	fn from(s: String) -> Self {
		Value::Str(s)
	}
}

// ---------------------------------------------------------------------------
// Flag store (one per Game, Passage and GameObject)
// ---------------------------------------------------------------------------

#[derive(Default, Debug, Clone)]
pub struct Flags {
	values: HashMap<String, Value>,
}

impl Flags {
	pub fn get(&self, key: &str) -> Option<&Value> {
		self.values.get(key)
	}

	/// `true` when the flag holds a truthy value.
	pub fn is_set(&self, key: &str) -> bool {
		self.values.get(key).is_some_and(Value::truthy)
	}

	/// Stores `value` under `key`. Returns `false` without touching the store
	/// when the key already holds an equal value.
	pub fn set(&mut self, key: &str, value: Value) -> bool {
		if self.values.get(key) == Some(&value) {
			return false;
		}
		self.values.insert(key.to_owned(), value);
		true
	}

	pub fn clear(&mut self) {
		self.values.clear();
	}

	pub fn len(&self) -> usize {
		self.values.len()
	}

	pub fn is_empty(&self) -> bool {
		self.values.is_empty()
	}
}
