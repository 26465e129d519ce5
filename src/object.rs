//! Interactable objects and their verb tables.

use std::{fmt, rc::Rc};

use futures::{FutureExt, future::LocalBoxFuture};
use log::debug;
use regex::Regex;

use crate::{
	error::{Error, Result},
	event::{Dispatcher, Listener, Payload, listener},
	game::Game,
	parser::Outcome,
	passage::PassageEvent,
	pattern::PatternTable,
	text::Text,
	value::{Flags, Value},
	world::{ObjectId, PassageId},
};

pub type VerbHandler = Rc<dyn for<'a> Fn(&'a mut Game, VerbContext) -> LocalBoxFuture<'a, anyhow::Result<()>>>;

/// What a verb handler is told about the command that reached it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerbContext {
	pub object: ObjectId,
	pub passage: PassageId,
	/// The verb phrase in front of the noun, e.g. "pick up".
	pub verb: String,
	pub noun: String,
}

/// How many of a noun the inventory can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Capacity {
	#[default]
	Single,
	Multiple,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ObjectEvent {
	Examined,
	Taken,
	Discarded,
	Set(String),
}

impl fmt::Display for ObjectEvent {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			ObjectEvent::Examined => f.write_str("examined"),
			ObjectEvent::Taken => f.write_str("taken"),
			ObjectEvent::Discarded => f.write_str("discarded"),
			ObjectEvent::Set(key) => write!(f, "set.{key}"),
		}
	}
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

pub struct ObjectBuilder {
	noun: String,
	name: Option<String>,
	alternates: Vec<String>,
	description: Option<Text>,
	verbs: Vec<(String, VerbHandler)>,
	removed: Vec<String>,
	takeable: bool,
	capacity: Capacity,
	plural: bool,
	plural_name: Option<String>,
	points: i64,
	dropped: Option<Text>,
	listeners: Vec<(ObjectEvent, Listener)>,
}

impl ObjectBuilder {
	/// Display name; defaults to the noun.
	pub fn name(mut self, name: &str) -> Self {
		self.name = Some(name.to_owned());
		self
	}

	/// Another word the player may use for this object.
	pub fn alternate(mut self, alternate: &str) -> Self {
		self.alternates.push(alternate.to_owned());
		self
	}

	pub fn description(mut self, description: impl Into<Text>) -> Self {
		self.description = Some(description.into());
		self
	}

	pub fn verb<F>(mut self, pattern: &str, handler: F) -> Self
	where
		F: for<'a> Fn(&'a mut Game, VerbContext) -> LocalBoxFuture<'a, anyhow::Result<()>> + 'static,
	{
		let handler: VerbHandler = Rc::new(handler);
		self.verbs.push((pattern.to_owned(), handler));
		self
	}

	/// Opts out of a built-in verb such as [`GameObject::LOOK`].
	pub fn remove_verb(mut self, pattern: &str) -> Self {
		self.removed.push(pattern.to_owned());
		self
	}

	/// Fixed objects get no take/discard verbs.
	pub fn takeable(mut self, takeable: bool) -> Self {
		self.takeable = takeable;
		self
	}

	pub fn capacity(mut self, capacity: Capacity) -> Self {
		self.capacity = capacity;
		self
	}

	pub fn plural(mut self, plural: bool) -> Self {
		self.plural = plural;
		self
	}

	pub fn plural_name(mut self, plural_name: &str) -> Self {
		self.plural_name = Some(plural_name.to_owned());
		self
	}

	pub fn points(mut self, points: i64) -> Self {
		self.points = points;
		self
	}

	/// Said when the object is discarded.
	pub fn dropped(mut self, message: impl Into<Text>) -> Self {
		self.dropped = Some(message.into());
		self
	}

	pub fn on<F>(mut self, event: ObjectEvent, f: F) -> Self
	where
		F: for<'a> Fn(&'a mut Game, &'a Payload) -> LocalBoxFuture<'a, anyhow::Result<()>> + 'static,
	{
		self.listeners.push((event, listener(f)));
		self
	}

	pub(crate) fn build(self, id: ObjectId) -> Result<GameObject> {
		if self.noun.trim().is_empty() {
			return Err(Error::UndefinedNoun);
		}

		let mut verbs = PatternTable::new();
		verbs.insert(GameObject::LOOK, Rc::new(examine) as VerbHandler)?;
		if self.takeable {
			verbs.insert(GameObject::TAKE, Rc::new(take) as VerbHandler)?;
			verbs.insert(GameObject::DISCARD, Rc::new(discard) as VerbHandler)?;
		}
		for (pattern, handler) in self.verbs {
			verbs.insert(&pattern, handler)?;
		}
		for pattern in &self.removed {
			verbs.remove(pattern);
		}

		let names = std::iter::once(&self.noun)
			.chain(&self.alternates)
			.map(|n| regex::escape(n))
			.collect::<Vec<_>>()
			.join("|");
		let source = format!("^(.+) (?:{names})$");
		let subject = Regex::new(&source).map_err(|err| Error::InvalidPattern {
			pattern: source.clone(),
			source: err,
		})?;

		let mut events = Dispatcher::default();
		for (event, l) in self.listeners {
			events.subscribe(event, l);
		}

		Ok(GameObject {
			id,
			name: self.name.unwrap_or_else(|| self.noun.clone()),
			noun: self.noun,
			alternates: self.alternates,
			description: self.description,
			verbs,
			takeable: self.takeable,
			capacity: self.capacity,
			plural: self.plural,
			plural_name: self.plural_name,
			points: self.points,
			dropped: self.dropped,
			subject,
			flags: Flags::default(),
			events,
			home: None,
		})
	}
}

fn examine(game: &mut Game, ctx: VerbContext) -> LocalBoxFuture<'_, anyhow::Result<()>> {
	async move {
		GameObject::describe(game, ctx.object).await?;
		let payload = Payload::passage(ctx.passage).with_object(ctx.object);
		game.emit_object(ctx.object, ObjectEvent::Examined, payload).await?;
		anyhow::Ok(())
	}
	.boxed_local()
}

fn take(game: &mut Game, ctx: VerbContext) -> LocalBoxFuture<'_, anyhow::Result<()>> {
	async move {
		GameObject::take(game, ctx.object, ctx.passage, &ctx.noun).await?;
		anyhow::Ok(())
	}
	.boxed_local()
}

fn discard(game: &mut Game, ctx: VerbContext) -> LocalBoxFuture<'_, anyhow::Result<()>> {
	async move {
		GameObject::discard(game, ctx.object, ctx.passage, &ctx.noun).await?;
		anyhow::Ok(())
	}
	.boxed_local()
}

// ---------------------------------------------------------------------------
// GameObject
// ---------------------------------------------------------------------------

pub struct GameObject {
	id: ObjectId,
	noun: String,
	name: String,
	alternates: Vec<String>,
	description: Option<Text>,
	verbs: PatternTable<VerbHandler>,
	takeable: bool,
	capacity: Capacity,
	plural: bool,
	plural_name: Option<String>,
	points: i64,
	dropped: Option<Text>,
	/// `^(.+) (?:noun|alternates…)$`, capturing the verb phrase.
	subject: Regex,
	flags: Flags,
	pub(crate) events: Dispatcher<ObjectEvent>,
	pub(crate) home: Option<PassageId>,
}

impl GameObject {
	pub const LOOK: &'static str = "(?:look|examine)";
	pub const TAKE: &'static str = "(?:take|pick.+up|get|pocket|collect)";
	pub const DISCARD: &'static str = "(?:discard|put.+down|drop|leave)";

	pub fn builder(noun: &str) -> ObjectBuilder {
		ObjectBuilder {
			noun: noun.to_owned(),
			name: None,
			alternates: Vec::new(),
			description: None,
			verbs: Vec::new(),
			removed: Vec::new(),
			takeable: true,
			capacity: Capacity::Single,
			plural: false,
			plural_name: None,
			points: 0,
			dropped: None,
			listeners: Vec::new(),
		}
	}

	pub fn id(&self) -> ObjectId {
		self.id
	}

	pub fn noun(&self) -> &str {
		&self.noun
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn alternates(&self) -> &[String] {
		&self.alternates
	}

	/// Name used when counting several of these.
	pub fn plural_name(&self) -> &str {
		self.plural_name.as_deref().unwrap_or(&self.name)
	}

	pub fn is_plural(&self) -> bool {
		self.plural
	}

	pub fn is_takeable(&self) -> bool {
		self.takeable
	}

	pub fn capacity(&self) -> Capacity {
		self.capacity
	}

	pub fn points(&self) -> i64 {
		self.points
	}

	/// The passage the object was first placed in.
	pub fn home(&self) -> Option<PassageId> {
		self.home
	}

	pub fn verbs(&self) -> &PatternTable<VerbHandler> {
		&self.verbs
	}

	pub fn get(&self, key: &str) -> Option<&Value> {
		self.flags.get(key)
	}

	pub fn drop_message(&self) -> Text {
		self.dropped.clone().unwrap_or_else(|| Text::Plain(format!("You drop the {}.", self.name)))
	}

	/// The verb phrase of `text` when it ends with this object's noun or one
	/// of its alternates.
	pub(crate) fn subject<'t>(&self, text: &'t str) -> Option<&'t str> {
		self.subject.captures(text)?.get(1).map(|m| m.as_str())
	}

	pub fn on<F>(&mut self, event: ObjectEvent, f: F)
	where
		F: for<'a> Fn(&'a mut Game, &'a Payload) -> LocalBoxFuture<'a, anyhow::Result<()>> + 'static,
	{
		self.events.subscribe(event, listener(f));
	}

	// -----------------------------------------------------------------
	// Operations that need the whole game
	// -----------------------------------------------------------------

	/// Runs the first verb whose pattern matches `verb`.
	pub async fn perform(game: &mut Game, id: ObjectId, passage: PassageId, verb: &str, noun: &str) -> Result<Outcome> {
		let Some(handler) = game.world().object(id)?.verbs.resolve(verb).cloned() else {
			debug!("{id} has no verb matching '{verb}'");
			return Ok(Outcome::Unresolved);
		};
		let ctx = VerbContext {
			object: id,
			passage,
			verb: verb.to_owned(),
			noun: noun.to_owned(),
		};
		handler(game, ctx).await.map_err(Error::Handler)?;
		Ok(Outcome::Handled)
	}

	pub async fn describe(game: &mut Game, id: ObjectId) -> Result<()> {
		let description = game.world().object(id)?.description.clone();
		match description {
			Some(text) => game.say(text).await,
			None => game.say("It's just this thing, you know?").await,
		}
	}

	/// Moves the object from `passage` into the inventory.
	pub async fn take(game: &mut Game, id: ObjectId, passage: PassageId, noun: &str) -> Result<bool> {
		if !game.take(noun, id).await? {
			return Ok(false);
		}
		game.world_mut().passage_mut(passage)?.remove_object(noun);

		let payload = Payload::passage(passage).with_object(id);
		game.emit_object(id, ObjectEvent::Taken, payload.clone()).await?;
		game.emit_passage(passage, PassageEvent::Taken(noun.to_owned()), payload).await?;
		Ok(true)
	}

	/// Moves one held `noun` from the inventory into `passage`.
	pub async fn discard(game: &mut Game, id: ObjectId, passage: PassageId, noun: &str) -> Result<bool> {
		let Some(dropped) = game.release(noun, Some(id), false).await? else {
			return Ok(false);
		};
		game.world_mut().passage_mut(passage)?.insert_object(noun.to_owned(), dropped);

		let payload = Payload::passage(passage).with_object(dropped);
		game.emit_object(dropped, ObjectEvent::Discarded, payload.clone()).await?;
		game.emit_passage(passage, PassageEvent::Discarded(noun.to_owned()), payload).await?;
		Ok(true)
	}

	/// Sets one of the object's own flags, emitting `set.<key>` on change.
	pub async fn set(game: &mut Game, id: ObjectId, key: &str, value: impl Into<Value>) -> Result<bool> {
		let value = value.into();
		if !game.world_mut().object_mut(id)?.flags.set(key, value.clone()) {
			return Ok(false);
		}
		let payload = Payload::flag(key, value).with_object(id).with_passage(game.passage());
		game.emit_object(id, ObjectEvent::Set(key.to_owned()), payload).await?;
		Ok(true)
	}
}
