//! Passages: the locations of a story.

use std::{collections::HashMap, fmt, rc::Rc};

use futures::{FutureExt, future::LocalBoxFuture};
use indexmap::IndexMap;
use log::debug;
use regex::Regex;

use crate::{
	error::{Error, Result},
	event::{Dispatcher, Listener, Payload, listener},
	game::Game,
	parser::{self, Outcome},
	pattern::PatternTable,
	text::Text,
	value::{Flags, Value},
	world::{ObjectId, PassageId},
};

pub type ActionHandler = Rc<dyn for<'a> Fn(&'a mut Game, PassageId) -> LocalBoxFuture<'a, anyhow::Result<()>>>;

type ExitFn = dyn for<'a> Fn(&'a mut Game, PassageId) -> LocalBoxFuture<'a, Result<()>>;

/// Verbs the movement resolver accepts in front of an exit name.
const MOVEMENT_VERBS: [&str; 5] = ["go to", "go", "head", "walk to", "walk"];

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PassageEvent {
	Entering,
	Entered,
	Exited,
	/// Any game flag changed while this passage was current.
	GameSet,
	/// A specific game flag changed while this passage was current.
	GameSetKey(String),
	/// One of this passage's own flags changed.
	Set(String),
	/// An object with this noun was taken from the passage.
	Taken(String),
	/// An object with this noun was dropped into the passage.
	Discarded(String),
}

impl fmt::Display for PassageEvent {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			PassageEvent::Entering => f.write_str("entering"),
			PassageEvent::Entered => f.write_str("entered"),
			PassageEvent::Exited => f.write_str("exited"),
			PassageEvent::GameSet => f.write_str("game.set"),
			PassageEvent::GameSetKey(key) => write!(f, "game.set.{key}"),
			PassageEvent::Set(key) => write!(f, "set.{key}"),
			PassageEvent::Taken(noun) => write!(f, "{noun}.taken"),
			PassageEvent::Discarded(noun) => write!(f, "{noun}.discarded"),
		}
	}
}

// ---------------------------------------------------------------------------
// Exits
// ---------------------------------------------------------------------------

/// A transition out of a passage, called with the game and the origin.
#[derive(Clone)]
pub struct Exit(Rc<ExitFn>);

impl Exit {
	pub fn new<F>(f: F) -> Self
	where
		F: for<'a> Fn(&'a mut Game, PassageId) -> LocalBoxFuture<'a, Result<()>> + 'static,
	{
		Self(Rc::new(f))
	}

	/// Moves the player to `target`.
	pub fn to(target: PassageId) -> Self {
		Self::new(move |game, _| async move { game.move_to(target).await }.boxed_local())
	}

	/// Kills the player in `target`, then restarts.
	pub fn death(target: PassageId) -> Self {
		Self::new(move |game, _| async move { game.die(target).await }.boxed_local())
	}

	/// Ends the story in `target`.
	pub fn ending(target: PassageId) -> Self {
		Self::new(move |game, _| async move { game.end(target).await }.boxed_local())
	}

	pub async fn follow(&self, game: &mut Game, origin: PassageId) -> Result<()> {
		(self.0)(game, origin).await
	}
}

impl fmt::Debug for Exit {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str("Exit(..)")
	}
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

pub struct PassageBuilder {
	message: Text,
	actions: Vec<(String, ActionHandler)>,
	removed: Vec<String>,
	exits: Vec<(String, Exit)>,
	set: Vec<(String, Value)>,
	listeners: Vec<(PassageEvent, Listener)>,
}

impl PassageBuilder {
	/// Adds an action pattern matched directly against the player's input.
	pub fn action<F>(mut self, pattern: &str, handler: F) -> Self
	where
		F: for<'a> Fn(&'a mut Game, PassageId) -> LocalBoxFuture<'a, anyhow::Result<()>> + 'static,
	{
		let handler: ActionHandler = Rc::new(handler);
		self.actions.push((pattern.to_owned(), handler));
		self
	}

	/// Opts out of a built-in action such as [`Passage::LOOK`].
	pub fn remove_action(mut self, pattern: &str) -> Self {
		self.removed.push(pattern.to_owned());
		self
	}

	pub fn exit(mut self, direction: &str, exit: Exit) -> Self {
		self.exits.push((direction.to_owned(), exit));
		self
	}

	/// A game flag assigned every time the passage is entered.
	pub fn set(mut self, key: &str, value: impl Into<Value>) -> Self {
		self.set.push((key.to_owned(), value.into()));
		self
	}

	pub fn on<F>(mut self, event: PassageEvent, f: F) -> Self
	where
		F: for<'a> Fn(&'a mut Game, &'a Payload) -> LocalBoxFuture<'a, anyhow::Result<()>> + 'static,
	{
		self.listeners.push((event, listener(f)));
		self
	}

	pub(crate) fn build(self, id: PassageId) -> Result<Passage> {
		let mut actions = PatternTable::new();
		actions.insert(Passage::LOOK, Rc::new(look) as ActionHandler)?;
		for (pattern, handler) in self.actions {
			actions.insert(&pattern, handler)?;
		}
		for pattern in &self.removed {
			actions.remove(pattern);
		}

		let mut events = Dispatcher::default();
		for (event, l) in self.listeners {
			events.subscribe(event, l);
		}
		if !self.set.is_empty() {
			let assignments = Rc::new(self.set);
			events.subscribe(
				PassageEvent::Entered,
				listener(move |game, _| {
					let assignments = assignments.clone();
					async move {
						for (key, value) in assignments.iter() {
							game.set(key, value.clone()).await?;
						}
						anyhow::Ok(())
					}
					.boxed_local()
				}),
			);
		}

		let mut passage = Passage {
			id,
			message: self.message,
			actions,
			objects: IndexMap::new(),
			exits: IndexMap::new(),
			aliases: HashMap::new(),
			movement: None,
			flags: Flags::default(),
			events,
		};
		for (direction, exit) in self.exits {
			passage.add_exit(&direction, exit)?;
		}
		Ok(passage)
	}
}

fn look(game: &mut Game, id: PassageId) -> LocalBoxFuture<'_, anyhow::Result<()>> {
	async move {
		Passage::describe(game, id).await?;
		anyhow::Ok(())
	}
	.boxed_local()
}

// ---------------------------------------------------------------------------
// Passage
// ---------------------------------------------------------------------------

pub struct Passage {
	id: PassageId,
	message: Text,
	actions: PatternTable<ActionHandler>,
	objects: IndexMap<String, ObjectId>,
	exits: IndexMap<String, Exit>,
	/// Exit name variants ("dark-forest", "darkforest") mapped to the exit.
	aliases: HashMap<String, String>,
	movement: Option<Regex>,
	flags: Flags,
	pub(crate) events: Dispatcher<PassageEvent>,
}

impl Passage {
	/// The built-in look/examine action.
	pub const LOOK: &'static str = "(?:look(?: around)?|examine)$";

	pub fn builder(message: impl Into<Text>) -> PassageBuilder {
		PassageBuilder {
			message: message.into(),
			actions: Vec::new(),
			removed: Vec::new(),
			exits: Vec::new(),
			set: Vec::new(),
			listeners: Vec::new(),
		}
	}

	pub fn id(&self) -> PassageId {
		self.id
	}

	pub fn message(&self) -> &Text {
		&self.message
	}

	pub fn actions(&self) -> &PatternTable<ActionHandler> {
		&self.actions
	}

	pub fn get(&self, key: &str) -> Option<&Value> {
		self.flags.get(key)
	}

	pub fn object(&self, noun: &str) -> Option<ObjectId> {
		self.objects.get(noun).copied()
	}

	/// Objects currently lying here, keyed by noun, in placement order.
	pub fn objects(&self) -> impl Iterator<Item = (&str, ObjectId)> {
		self.objects.iter().map(|(noun, id)| (noun.as_str(), *id))
	}

	pub fn exit_names(&self) -> impl Iterator<Item = &str> {
		self.exits.keys().map(String::as_str)
	}

	pub fn has_exit(&self, direction: &str) -> bool {
		self.exits.contains_key(direction)
	}

	pub fn on<F>(&mut self, event: PassageEvent, f: F)
	where
		F: for<'a> Fn(&'a mut Game, &'a Payload) -> LocalBoxFuture<'a, anyhow::Result<()>> + 'static,
	{
		self.events.subscribe(event, listener(f));
	}

	/// Adds or replaces an exit and recompiles the movement pattern.
	pub fn add_exit(&mut self, direction: &str, exit: Exit) -> Result<()> {
		self.exits.insert(direction.to_owned(), exit);
		self.compile_movement()
	}

	pub(crate) fn insert_object(&mut self, noun: String, object: ObjectId) {
		self.objects.insert(noun, object);
	}

	pub(crate) fn remove_object(&mut self, noun: &str) -> Option<ObjectId> {
		self.objects.shift_remove(noun)
	}

	fn compile_movement(&mut self) -> Result<()> {
		self.aliases.clear();
		let mut names = Vec::new();
		for direction in self.exits.keys() {
			for variant in [direction.clone(), direction.replace(' ', "-"), direction.replace(' ', "")] {
				if !self.aliases.contains_key(&variant) {
					names.push(regex::escape(&variant));
					self.aliases.insert(variant, direction.clone());
				}
			}
		}
		if names.is_empty() {
			self.movement = None;
			return Ok(());
		}

		let verbs = MOVEMENT_VERBS.map(regex::escape).join("|");
		let source = format!("^(?:(?:{verbs}) ?)?({})$", names.join("|"));
		let regex = Regex::new(&source).map_err(|err| Error::InvalidPattern {
			pattern: source.clone(),
			source: err,
		})?;
		self.movement = Some(regex);
		Ok(())
	}

	/// The exit named by a movement command, if any.
	pub(crate) fn movement_target(&self, text: &str) -> Option<(&str, &Exit)> {
		let caps = self.movement.as_ref()?.captures(text)?;
		let direction = self.aliases.get(caps.get(1)?.as_str())?;
		self.exits.get_key_value(direction).map(|(k, v)| (k.as_str(), v))
	}

	// -----------------------------------------------------------------
	// Operations that need the whole game
	// -----------------------------------------------------------------

	/// Interprets one line of input through the parser chain and runs the
	/// resolved action.
	pub async fn perform(game: &mut Game, id: PassageId, text: &str) -> Result<Outcome> {
		match parser::resolve(text, id, game)? {
			Some(deferred) => deferred.run(game, id).await,
			None => Ok(Outcome::Unresolved),
		}
	}

	pub async fn describe(game: &mut Game, id: PassageId) -> Result<()> {
		let message = game.world().passage(id)?.message.clone();
		game.say(message).await
	}

	/// Follows the exit named `direction`. Unknown directions do nothing and
	/// return `false`.
	pub async fn exit(game: &mut Game, id: PassageId, direction: &str) -> Result<bool> {
		let Some(exit) = game.world().passage(id)?.exits.get(direction).cloned() else {
			debug!("{id} has no exit '{direction}'");
			return Ok(false);
		};
		exit.follow(game, id).await?;
		Ok(true)
	}

	/// Sets one of the passage's own flags, emitting `set.<key>` on change.
	pub async fn set(game: &mut Game, id: PassageId, key: &str, value: impl Into<Value>) -> Result<bool> {
		let value = value.into();
		if !game.world_mut().passage_mut(id)?.flags.set(key, value.clone()) {
			return Ok(false);
		}
		game.emit_passage(id, PassageEvent::Set(key.to_owned()), Payload::flag(key, value).with_passage(Some(id)))
			.await?;
		Ok(true)
	}
}

#[cfg(test)]
mod tests {
	use std::{cell::RefCell, rc::Rc};

	use super::*;
	use crate::{testing::sandbox, world::World};

	#[test]
	fn event_names() {
		assert_eq!(PassageEvent::GameSetKey("lamp".into()).to_string(), "game.set.lamp");
		assert_eq!(PassageEvent::Taken("key".into()).to_string(), "key.taken");
		assert_eq!(PassageEvent::Discarded("key".into()).to_string(), "key.discarded");
		assert_eq!(PassageEvent::Set("lit".into()).to_string(), "set.lit");
	}

	#[test]
	fn movement_matches_verbs_and_variants() {
		let mut world = World::new();
		let here = world.add_passage(Passage::builder("Here.")).unwrap();
		let there = world.add_passage(Passage::builder("There.")).unwrap();
		world.connect(here, "dark forest", there).unwrap();
		world.connect(here, "north", there).unwrap();
		let passage = world.passage(here).unwrap();

		for input in ["north", "go north", "go to north", "walk to dark forest", "head dark-forest", "walk darkforest", "gonorth"] {
			assert!(passage.movement_target(input).is_some(), "{input}");
		}
		assert_eq!(passage.movement_target("head dark-forest").unwrap().0, "dark forest");
		assert!(passage.movement_target("go south").is_none());
		assert!(passage.movement_target("north face").is_none());
	}

	#[test]
	fn removed_default_action_is_omitted() {
		let mut world = World::new();
		let id = world
			.add_passage(Passage::builder("Pitch black.").remove_action(Passage::LOOK))
			.unwrap();
		assert!(world.passage(id).unwrap().actions().resolve("look").is_none());
	}

	#[test]
	fn bad_action_pattern_fails_construction() {
		let mut world = World::new();
		let result = world.add_passage(Passage::builder("Here.").action("(oops", |_, _| async { anyhow::Ok(()) }.boxed_local()));
		assert!(matches!(result, Err(Error::InvalidPattern { .. })));
	}

	#[tokio::test]
	async fn exit_to_unknown_direction_is_not_an_error() {
		let (mut game, _) = sandbox();
		let here = game.passage().unwrap();
		assert!(!Passage::exit(&mut game, here, "sideways").await.unwrap());
	}

	#[tokio::test]
	async fn entered_applies_static_set_after_listeners() {
		let seen = Rc::new(RefCell::new(None));
		let probe = seen.clone();
		let mut world = World::new();
		let start = world.add_passage(Passage::builder("Start.")).unwrap();
		let lit = world
			.add_passage(Passage::builder("A lit room.").set("lit", true).on(PassageEvent::Entered, move |game, _| {
				*probe.borrow_mut() = Some(game.get("lit").cloned());
				async { anyhow::Ok(()) }.boxed_local()
			}))
			.unwrap();
		world.connect(start, "in", lit).unwrap();
		let (mut game, _) = crate::testing::game_with(world, start);

		game.act("in").await.unwrap();

		assert_eq!(*seen.borrow(), Some(None));
		assert_eq!(game.get("lit"), Some(&Value::Bool(true)));
	}

	#[tokio::test]
	async fn own_flags_emit_set_events() {
		let (mut game, _) = sandbox();
		let here = game.passage().unwrap();
		let count = Rc::new(RefCell::new(0));
		let c = count.clone();
		game.world_mut().passage_mut(here).unwrap().on(PassageEvent::Set("door".into()), move |_, payload| {
			assert_eq!(payload.value, Value::from("open"));
			*c.borrow_mut() += 1;
			async { anyhow::Ok(()) }.boxed_local()
		});

		assert!(Passage::set(&mut game, here, "door", "open").await.unwrap());
		assert!(!Passage::set(&mut game, here, "door", "open").await.unwrap());
		assert_eq!(*count.borrow(), 1);
		assert_eq!(game.world().passage(here).unwrap().get("door"), Some(&Value::from("open")));
	}
}
