//! Owned event dispatch.
//!
//! Every entity embeds a [`Dispatcher`] keyed by its own event enum. An
//! emission snapshots the listeners for the event and awaits them one after
//! another in subscription order; the first failure stops the emission and is
//! returned to the emitting call site.

use std::{hash::Hash, rc::Rc};

use futures::future::LocalBoxFuture;
use indexmap::IndexMap;
use log::debug;

use crate::{
	error::{Error, Result},
	game::Game,
	value::Value,
	world::{ObjectId, PassageId},
};

pub type Listener = Rc<dyn for<'a> Fn(&'a mut Game, &'a Payload) -> LocalBoxFuture<'a, anyhow::Result<()>>>;

/// Wraps a closure as a [`Listener`].
pub fn listener<F>(f: F) -> Listener
where
	F: for<'a> Fn(&'a mut Game, &'a Payload) -> LocalBoxFuture<'a, anyhow::Result<()>> + 'static,
{
	Rc::new(f)
}

/// Context handed to listeners alongside the game.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Payload {
	pub passage: Option<PassageId>,
	pub object: Option<ObjectId>,
	pub key: Option<String>,
	pub value: Value,
}

impl Payload {
	pub fn passage(id: PassageId) -> Self {
		Self {
			passage: Some(id),
			..Self::default()
		}
	}

	pub fn flag(key: &str, value: Value) -> Self {
		Self {
			key: Some(key.to_owned()),
			value,
			..Self::default()
		}
	}

	pub fn with_passage(mut self, id: Option<PassageId>) -> Self {
		self.passage = id;
		self
	}

	pub fn with_object(mut self, id: ObjectId) -> Self {
		self.object = Some(id);
		self
	}
}

pub struct Dispatcher<K> {
	listeners: IndexMap<K, Vec<Listener>>,
}

impl<K> Default for Dispatcher<K> {
	fn default() -> Self {
		Self {
			listeners: IndexMap::new(),
		}
	}
}

impl<K: Hash + Eq> Dispatcher<K> {
	pub fn subscribe(&mut self, event: K, listener: Listener) {
		self.listeners.entry(event).or_default().push(listener);
	}

	/// The listeners currently subscribed to `event`, in subscription order.
	pub fn listeners(&self, event: &K) -> Vec<Listener> {
		self.listeners.get(event).cloned().unwrap_or_default()
	}

	pub fn count(&self, event: &K) -> usize {
		self.listeners.get(event).map_or(0, Vec::len)
	}
}

/// Runs `listeners` sequentially; stops at the first failure.
pub async fn publish(game: &mut Game, event: &str, listeners: Vec<Listener>, payload: &Payload) -> Result<()> {
	if listeners.is_empty() {
		return Ok(());
	}
	debug!("emit {event} ({} listeners)", listeners.len());
	for listener in listeners {
		listener(game, payload).await.map_err(|source| Error::Listener {
			event: event.to_owned(),
			source,
		})?;
	}
	Ok(())
}
