//! The game state machine and session loop.

use std::{collections::VecDeque, fmt, sync::LazyLock, time::Duration};

use async_recursion::async_recursion;
use futures::{FutureExt, future::LocalBoxFuture};
use log::{debug, error, info};
use regex::Regex;
use tokio::time::Instant;

use crate::{
	error::{Error, Result},
	event::{Dispatcher, Listener, Payload, listener, publish},
	inventory::{Inventory, Slot},
	object::{Capacity, GameObject, ObjectEvent},
	parser::Outcome,
	passage::{Passage, PassageEvent},
	text::{Text, article, indefinite, points},
	timer::{self, Timers},
	ui::Ui,
	value::{Flags, Value},
	world::{ObjectId, PassageId, World},
};

/// A scripted line that forces a live timer to fire.
static WAIT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^wait ([a-z0-9_\.]+)$").expect("valid regex"));

// ---------------------------------------------------------------------------
// Events and configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GameEvent {
	Starting,
	Started,
	Ready,
	Prompting,
	Restarting,
	Reset,
	/// The score changed; the payload value is the new total.
	Score,
	ActionNotFound,
	Set(String),
}

impl fmt::Display for GameEvent {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			GameEvent::Starting => f.write_str("starting"),
			GameEvent::Started => f.write_str("started"),
			GameEvent::Ready => f.write_str("ready"),
			GameEvent::Prompting => f.write_str("prompting"),
			GameEvent::Restarting => f.write_str("restarting"),
			GameEvent::Reset => f.write_str("reset"),
			GameEvent::Score => f.write_str("score"),
			GameEvent::ActionNotFound => f.write_str("action.notfound"),
			GameEvent::Set(key) => write!(f, "set.{key}"),
		}
	}
}

pub struct GameConfig {
	title: String,
	start: PassageId,
	quit_words: Vec<String>,
	listeners: Vec<(GameEvent, Listener)>,
}

impl GameConfig {
	pub fn new(title: &str, start: PassageId) -> Self {
		Self {
			title: title.to_owned(),
			start,
			quit_words: vec!["quit".to_owned()],
			listeners: Vec::new(),
		}
	}

	/// Replaces the words that end the session.
	pub fn quit_words(mut self, words: &[&str]) -> Self {
		self.quit_words = words.iter().map(|w| (*w).to_owned()).collect();
		self
	}

	pub fn on<F>(mut self, event: GameEvent, f: F) -> Self
	where
		F: for<'a> Fn(&'a mut Game, &'a Payload) -> LocalBoxFuture<'a, anyhow::Result<()>> + 'static,
	{
		self.listeners.push((event, listener(f)));
		self
	}
}

/// Where the session loop is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
	Idle,
	Starting,
	Started,
	Ready,
	Prompting,
	Acting,
	Ended,
}

// ---------------------------------------------------------------------------
// Game
// ---------------------------------------------------------------------------

pub struct Game {
	title: String,
	start: PassageId,
	passage: Option<PassageId>,
	world: World,
	flags: Flags,
	score: i64,
	inventory: Inventory,
	timers: Timers,
	script: VecDeque<String>,
	auto_play: bool,
	quit_words: Vec<String>,
	ended: bool,
	phase: Phase,
	events: Dispatcher<GameEvent>,
	ui: Box<dyn Ui>,
}

impl Game {
	pub fn new(config: GameConfig, world: World, ui: impl Ui + 'static) -> Result<Self> {
		world.passage(config.start)?;

		let mut events = Dispatcher::default();
		for (event, l) in config.listeners {
			events.subscribe(event, l);
		}
		events.subscribe(
			GameEvent::ActionNotFound,
			listener(|game, _| {
				async move {
					game.say("You try, but it just doesn't make sense.").await?;
					anyhow::Ok(())
				}
				.boxed_local()
			}),
		);
		events.subscribe(
			GameEvent::Score,
			listener(|_, payload| {
				debug!("score: {}", payload.value);
				async { anyhow::Ok(()) }.boxed_local()
			}),
		);

		Ok(Self {
			title: config.title,
			start: config.start,
			passage: Some(config.start),
			world,
			flags: Flags::default(),
			score: 0,
			inventory: Inventory::new(),
			timers: Timers::new(),
			script: VecDeque::new(),
			auto_play: false,
			quit_words: config.quit_words,
			ended: false,
			phase: Phase::Idle,
			events,
			ui: Box::new(ui),
		})
	}

	pub fn title(&self) -> &str {
		&self.title
	}

	pub fn world(&self) -> &World {
		&self.world
	}

	pub fn world_mut(&mut self) -> &mut World {
		&mut self.world
	}

	/// The current passage.
	pub fn passage(&self) -> Option<PassageId> {
		self.passage
	}

	pub fn is_ended(&self) -> bool {
		self.ended
	}

	pub fn phase(&self) -> Phase {
		self.phase
	}

	pub fn quit_words(&self) -> &[String] {
		&self.quit_words
	}

	// --------------------------------------------------
	// Events
	// --------------------------------------------------

	pub fn on<F>(&mut self, event: GameEvent, f: F)
	where
		F: for<'a> Fn(&'a mut Game, &'a Payload) -> LocalBoxFuture<'a, anyhow::Result<()>> + 'static,
	{
		self.events.subscribe(event, listener(f));
	}

	pub async fn emit(&mut self, event: GameEvent, payload: Payload) -> Result<()> {
		let listeners = self.events.listeners(&event);
		publish(self, &event.to_string(), listeners, &payload).await
	}

	pub async fn emit_passage(&mut self, id: PassageId, event: PassageEvent, payload: Payload) -> Result<()> {
		let listeners = self.world.passage(id)?.events.listeners(&event);
		publish(self, &format!("{id}.{event}"), listeners, &payload).await
	}

	pub async fn emit_object(&mut self, id: ObjectId, event: ObjectEvent, payload: Payload) -> Result<()> {
		let listeners = self.world.object(id)?.events.listeners(&event);
		publish(self, &format!("{id}.{event}"), listeners, &payload).await
	}

	// --------------------------------------------------
	// Flags and score
	// --------------------------------------------------

	pub fn get(&self, key: &str) -> Option<&Value> {
		self.flags.get(key)
	}

	/// Sets a game flag. Returns `false` when the value did not change, in
	/// which case no event fires.
	pub async fn set(&mut self, key: &str, value: impl Into<Value>) -> Result<bool> {
		let value = value.into();
		if !self.flags.set(key, value.clone()) {
			return Ok(false);
		}
		let payload = Payload::flag(key, value).with_passage(self.passage);
		self.emit(GameEvent::Set(key.to_owned()), payload.clone()).await?;
		if let Some(id) = self.passage {
			self.emit_passage(id, PassageEvent::GameSetKey(key.to_owned()), payload.clone()).await?;
			self.emit_passage(id, PassageEvent::GameSet, payload).await?;
		}
		Ok(true)
	}

	pub fn score(&self) -> i64 {
		self.score
	}

	pub async fn plus(&mut self, n: i64) -> Result<()> {
		self.add_score(n).await
	}

	pub async fn minus(&mut self, n: i64) -> Result<()> {
		self.add_score(-n).await
	}

	async fn add_score(&mut self, n: i64) -> Result<()> {
		if n == 0 {
			return Ok(());
		}
		self.score += n;
		let payload = Payload {
			value: Value::Number(self.score),
			..Payload::default()
		};
		self.emit(GameEvent::Score, payload).await
	}

	// --------------------------------------------------
	// Output
	// --------------------------------------------------

	pub async fn say(&mut self, message: impl Into<Text>) -> Result<()> {
		let line = message.into().render(self);
		self.ui.say(&line).await
	}

	/// Renders a passage's message.
	pub async fn show(&mut self, id: PassageId) -> Result<()> {
		let line = self.world.passage(id)?.message().render(self);
		self.ui.show(&line).await
	}

	// --------------------------------------------------
	// Transitions
	// --------------------------------------------------

	async fn transition(&mut self, target: PassageId) -> Result<()> {
		self.world.passage(target)?;
		if let Some(old) = self.passage {
			self.emit_passage(old, PassageEvent::Exited, Payload::passage(old)).await?;
		}
		info!("entering {target}");
		self.passage = Some(target);
		self.emit_passage(target, PassageEvent::Entering, Payload::passage(target)).await?;
		self.show(target).await?;
		self.emit_passage(target, PassageEvent::Entered, Payload::passage(target)).await
	}

	pub async fn move_to(&mut self, target: PassageId) -> Result<()> {
		self.transition(target).await
	}

	/// Shows the death passage, then restarts from the beginning.
	pub async fn die(&mut self, target: PassageId) -> Result<()> {
		self.transition(target).await?;
		info!("died in {target}");
		self.restart().await
	}

	/// Shows the final passage and the score, then ends the session.
	pub async fn end(&mut self, target: PassageId) -> Result<()> {
		self.ended = true;
		self.phase = Phase::Ended;
		self.timers.clear_all();
		self.transition(target).await?;
		info!("ended in {target} with {}", points(self.score));
		let line = format!("Thank you for playing {}. You scored {}.", self.title, points(self.score));
		self.say(line).await
	}

	/// Starts over in the original start passage with no flags, score,
	/// timers or inventory. Held objects go back where they were found.
	pub async fn restart(&mut self) -> Result<()> {
		info!("restarting {}", self.title);
		self.emit(GameEvent::Restarting, Payload::default()).await?;
		self.flags.clear();
		self.score = 0;
		self.timers.clear_all();
		self.return_inventory()?;
		self.emit(GameEvent::Reset, Payload::default()).await?;
		self.ui.clear().await?;

		self.passage = Some(self.start);
		self.emit(GameEvent::Started, Payload::default()).await?;
		self.show(self.start).await
	}

	/// Empties the inventory back into each object's home passage. A restart
	/// that reset only flags, score and timers would leave held objects out
	/// of the world with their points gone; this one does not carry them over.
	fn return_inventory(&mut self) -> Result<()> {
		let held: Vec<ObjectId> = self.inventory.held().collect();
		self.inventory.clear();
		for id in held {
			let obj = self.world.object(id)?;
			let noun = obj.noun().to_owned();
			if let Some(home) = obj.home() {
				self.world.passage_mut(home)?.insert_object(noun, id);
			}
		}
		Ok(())
	}

	/// Cancels all timers, ends the session and closes the UI.
	pub async fn exit(&mut self) -> Result<()> {
		info!("exiting {}", self.title);
		self.timers.clear_all();
		self.ended = true;
		self.phase = Phase::Ended;
		self.ui.close().await
	}

	// --------------------------------------------------
	// Inventory
	// --------------------------------------------------

	pub async fn take(&mut self, noun: &str, object: ObjectId) -> Result<bool> {
		self.add_to_inventory(noun, object, false).await
	}

	/// Like [`Game::take`] but says nothing.
	pub async fn take_quietly(&mut self, noun: &str, object: ObjectId) -> Result<bool> {
		self.add_to_inventory(noun, object, true).await
	}

	async fn add_to_inventory(&mut self, noun: &str, object: ObjectId, quiet: bool) -> Result<bool> {
		if noun.trim().is_empty() {
			return Err(Error::UndefinedNoun);
		}
		let obj = self.world.object(object)?;
		let name = obj.name().to_owned();
		let worth = obj.points();
		let multiple = obj.capacity() == Capacity::Multiple;

		let message = match (multiple, self.inventory.slot(noun).is_some()) {
			(true, true) => format!("You take another {name}."),
			(true, false) => format!("You take {}.", indefinite(&name)),
			(false, _) => format!("You take the {name}."),
		};
		if !self.inventory.add(noun, object, multiple) {
			debug!("{noun} already held");
			if !quiet {
				self.say(format!("You already have the {name}.")).await?;
			}
			return Ok(false);
		}

		self.plus(worth).await?;
		if !quiet {
			self.say(message).await?;
		}
		Ok(true)
	}

	/// Drops one `noun`. `object` picks which one when several are held and
	/// names the object in the refusal message when none is.
	pub async fn discard(&mut self, noun: &str, object: Option<ObjectId>) -> Result<bool> {
		Ok(self.release(noun, object, false).await?.is_some())
	}

	/// Like [`Game::discard`] but says nothing.
	pub async fn discard_quietly(&mut self, noun: &str, object: Option<ObjectId>) -> Result<bool> {
		Ok(self.release(noun, object, true).await?.is_some())
	}

	/// Removes one `noun` from the inventory and returns the object that left.
	pub(crate) async fn release(&mut self, noun: &str, object: Option<ObjectId>, quiet: bool) -> Result<Option<ObjectId>> {
		if noun.trim().is_empty() {
			return Err(Error::UndefinedNoun);
		}

		let held = self.inventory.slot(noun).map(Slot::count);
		if held.is_none_or(|n| n == 0) {
			let object = object.ok_or_else(|| Error::NotHeld(noun.to_owned()))?;
			let obj = self.world.object(object)?;
			let line = match held {
				Some(_) => format!("You don't have any more {}.", obj.plural_name()),
				None if obj.is_plural() => format!("You don't have any {}.", obj.name()),
				None => format!("You don't have {}.", indefinite(obj.name())),
			};
			if !quiet {
				self.say(line).await?;
			}
			return Ok(None);
		}

		let Some(removed) = self.inventory.remove(noun, object) else {
			return Ok(None);
		};
		let obj = self.world.object(removed)?;
		let worth = obj.points();
		let dropped = obj.drop_message();
		self.minus(worth).await?;
		if !quiet {
			self.say(dropped).await?;
		}
		Ok(Some(removed))
	}

	pub fn has(&self, noun: &str) -> bool {
		self.inventory.has(noun)
	}

	/// How many of `noun` are held.
	pub fn count(&self, noun: &str) -> usize {
		self.inventory.count(noun)
	}

	/// Held nouns with the object that represents each. Multiple slots are
	/// represented by their first object; empty slots are skipped.
	pub fn held(&self) -> impl Iterator<Item = (&str, ObjectId)> {
		self.inventory.slots().filter_map(|(noun, slot)| slot.first().map(|id| (noun, id)))
	}

	pub fn with_inventory(&self, mut f: impl FnMut(&str, &GameObject)) {
		for (noun, id) in self.held() {
			if let Ok(obj) = self.world.object(id) {
				f(noun, obj);
			}
		}
	}

	pub async fn show_inventory(&mut self) -> Result<()> {
		let mut entries = Vec::new();
		for (_, slot) in self.inventory.slots() {
			let entry = match slot {
				Slot::Multiple(ids) if ids.len() > 1 => {
					format!("{} {}", ids.len(), self.world.object(ids[0])?.plural_name())
				}
				Slot::Multiple(ids) => match ids.first() {
					Some(id) => indefinite(self.world.object(*id)?.name()),
					None => continue,
				},
				Slot::Single(id) => {
					let obj = self.world.object(*id)?;
					article(obj.name(), obj.is_plural())
				}
			};
			entries.push(entry);
		}

		if entries.is_empty() {
			return self.say("You don't have anything.").await;
		}
		let mut text = String::from("You have:");
		for entry in entries {
			text.push_str("\n    - ");
			text.push_str(&entry);
		}
		self.say(text).await
	}

	// --------------------------------------------------
	// Timers
	// --------------------------------------------------

	/// Runs `callback` after `delay`, unless cleared first. Returns the
	/// timer's name, generated when `name` is `None`.
	pub fn timer<F>(&mut self, delay: Duration, name: Option<&str>, callback: F) -> String
	where
		F: for<'a> FnOnce(&'a mut Game) -> LocalBoxFuture<'a, anyhow::Result<()>> + 'static,
	{
		self.timers.start(delay, name, timer::callback(callback))
	}

	/// Cancels a live timer. Unknown names are ignored.
	pub fn clear_timer(&mut self, name: &str) -> bool {
		self.timers.clear(name)
	}

	pub fn is_timer_live(&self, name: &str) -> bool {
		self.timers.is_live(name)
	}

	/// Fires a live timer now. Returns `false` if it was not live.
	pub async fn fire_timer(&mut self, name: &str) -> Result<bool> {
		let Some(callback) = self.timers.take(name) else {
			return Ok(false);
		};
		debug!("timer {name} fired");
		callback(self).await.map_err(Error::Handler)?;
		Ok(true)
	}

	/// Runs expired timers one at a time until none is due or the session
	/// ends. A failing continuation is logged and the rest still run.
	async fn run_due_timers(&mut self) {
		let now = Instant::now();
		while !self.ended {
			let Some((name, callback)) = self.timers.take_next_due(now) else {
				break;
			};
			debug!("timer {name} expired");
			if let Err(err) = callback(self).await {
				error!("timer {name} failed: {err:#}");
			}
		}
	}

	// --------------------------------------------------
	// Session loop
	// --------------------------------------------------

	/// Waits for the next line of input. Scripted lines come first; a
	/// scripted `wait <timer>` fires that timer and moves on to the next
	/// line. Timers that expire while waiting run before the prompt is asked
	/// again. `None` means input is exhausted.
	#[async_recursion(?Send)]
	pub async fn prompt(&mut self) -> Result<Option<String>> {
		if self.ended {
			return Ok(None);
		}
		let line = self.script.pop_front();
		if let Some(name) = line.as_deref().and_then(|l| WAIT.captures(l)).map(|caps| caps[1].to_owned()) {
			if self.timers.is_live(&name) {
				self.fire_timer(&name).await?;
				return self.prompt().await;
			}
		}

		self.phase = Phase::Prompting;
		self.emit(GameEvent::Prompting, Payload::default()).await?;
		loop {
			if self.ended {
				return Ok(None);
			}
			let default = line.as_deref();
			let auto_play = self.auto_play;
			let Some(deadline) = self.timers.next_deadline() else {
				return self.ui.prompt(default, auto_play).await;
			};
			let input = tokio::select! {
				biased;
				_ = tokio::time::sleep_until(deadline) => None,
				input = self.ui.prompt(default, auto_play) => Some(input?),
			};
			match input {
				Some(input) => return Ok(input),
				None => self.run_due_timers().await,
			}
		}
	}

	/// Interprets one line in the current passage.
	pub async fn act(&mut self, text: &str) -> Result<Outcome> {
		let id = self.passage.ok_or(Error::NoPassage)?;
		Passage::perform(self, id, text).await
	}

	/// One turn: prompt, then act on the answer.
	pub async fn ready(&mut self) -> Result<()> {
		self.phase = Phase::Ready;
		let Some(line) = self.prompt().await? else {
			if !self.ended {
				self.exit().await?;
			}
			return Ok(());
		};
		let text = line.trim();
		if text.is_empty() {
			return Ok(());
		}

		self.phase = Phase::Acting;
		if self.act(text).await? == Outcome::Unresolved {
			self.emit(GameEvent::ActionNotFound, Payload::default().with_passage(self.passage)).await?;
		}
		Ok(())
	}

	/// Runs the session: `script` lines are offered as defaults before the
	/// player is asked, and taken without waiting when `auto_play` is set.
	pub async fn play(&mut self, script: impl IntoIterator<Item = String>, auto_play: bool) -> Result<()> {
		self.script = script.into_iter().collect();
		self.auto_play = auto_play;

		self.phase = Phase::Starting;
		self.emit(GameEvent::Starting, Payload::default()).await?;
		let title = self.title.clone();
		self.ui.start(&title).await?;
		self.phase = Phase::Started;
		self.emit(GameEvent::Started, Payload::default()).await?;
		let id = self.passage.ok_or(Error::NoPassage)?;
		self.show(id).await?;

		while !self.ended {
			if let Err(err) = self.turn().await {
				if let Error::Io(_) = err {
					return Err(err);
				}
				error!("{err}");
			}
		}
		self.phase = Phase::Ended;
		Ok(())
	}

	async fn turn(&mut self) -> Result<()> {
		self.emit(GameEvent::Ready, Payload::default()).await?;
		self.ready().await
	}
}

#[cfg(test)]
mod tests {
	use std::{cell::RefCell, rc::Rc};

	use super::*;
	use crate::{
		testing::{game_with, sandbox},
		ui::Transcript,
	};

	fn coin_world() -> (World, PassageId, ObjectId, ObjectId) {
		let mut world = World::new();
		let vault = world.add_passage(Passage::builder("A vault.")).unwrap();
		let a = world
			.add_object(GameObject::builder("coin").capacity(Capacity::Multiple).plural_name("coins").points(2))
			.unwrap();
		let b = world
			.add_object(GameObject::builder("coin").capacity(Capacity::Multiple).plural_name("coins").points(2))
			.unwrap();
		(world, vault, a, b)
	}

	#[tokio::test]
	async fn set_fires_only_on_change() {
		let (mut game, _) = sandbox();
		let count = Rc::new(RefCell::new(Vec::new()));
		let seen = count.clone();
		game.on(GameEvent::Set("door".into()), move |_, payload| {
			seen.borrow_mut().push(payload.value.clone());
			async { anyhow::Ok(()) }.boxed_local()
		});

		assert!(game.set("door", "open").await.unwrap());
		assert!(!game.set("door", "open").await.unwrap());
		assert!(game.set("door", "shut").await.unwrap());

		assert_eq!(*count.borrow(), vec![Value::from("open"), Value::from("shut")]);
	}

	#[tokio::test]
	async fn set_notifies_the_current_passage_after_the_game() {
		let (mut game, _) = sandbox();
		let order = Rc::new(RefCell::new(Vec::new()));
		let here = game.passage().unwrap();
		for (tag, event) in [("key", PassageEvent::GameSetKey("lamp".into())), ("any", PassageEvent::GameSet)] {
			let order = order.clone();
			game.world_mut().passage_mut(here).unwrap().on(event, move |_, _| {
				order.borrow_mut().push(tag);
				async { anyhow::Ok(()) }.boxed_local()
			});
		}
		let o = order.clone();
		game.on(GameEvent::Set("lamp".into()), move |_, _| {
			o.borrow_mut().push("game");
			async { anyhow::Ok(()) }.boxed_local()
		});

		game.set("lamp", true).await.unwrap();

		assert_eq!(*order.borrow(), vec!["game", "key", "any"]);
	}

	#[tokio::test]
	async fn failing_listener_aborts_set_emissions() {
		let (mut game, _) = sandbox();
		let here = game.passage().unwrap();
		let reached = Rc::new(RefCell::new(false));
		let r = reached.clone();
		game.on(GameEvent::Set("lamp".into()), |_, _| async { Err::<(), _>(anyhow::anyhow!("no")) }.boxed_local());
		game.world_mut().passage_mut(here).unwrap().on(PassageEvent::GameSet, move |_, _| {
			*r.borrow_mut() = true;
			async { anyhow::Ok(()) }.boxed_local()
		});

		let err = game.set("lamp", true).await.unwrap_err();

		assert!(matches!(err, Error::Listener { ref event, .. } if event == "set.lamp"));
		assert!(!*reached.borrow());
		assert_eq!(game.get("lamp"), Some(&Value::Bool(true)));
	}

	#[tokio::test]
	async fn multiple_capacity_counts_up_and_down() {
		let (world, vault, a, b) = coin_world();
		let (mut game, transcript) = game_with(world, vault);

		assert!(game.take("coin", a).await.unwrap());
		assert!(game.take("coin", b).await.unwrap());
		assert_eq!(game.count("coin"), 2);
		assert_eq!(game.score(), 4);

		assert!(game.discard("coin", None).await.unwrap());
		assert!(game.discard("coin", None).await.unwrap());
		assert!(!game.discard("coin", Some(a)).await.unwrap());
		assert_eq!(game.count("coin"), 0);
		assert_eq!(game.score(), 0);

		assert_eq!(
			transcript.said(),
			vec![
				"You take a coin.",
				"You take another coin.",
				"You drop the coin.",
				"You drop the coin.",
				"You don't have any more coins.",
			]
		);
	}

	#[tokio::test]
	async fn refusals_and_quiet_variants() {
		let mut world = World::new();
		let hall = world.add_passage(Passage::builder("A hall.")).unwrap();
		let egg = world.add_object(GameObject::builder("egg")).unwrap();
		let beans = world.add_object(GameObject::builder("beans").plural(true)).unwrap();
		let (mut game, transcript) = game_with(world, hall);

		assert!(!game.discard("egg", Some(egg)).await.unwrap());
		assert!(!game.discard("beans", Some(beans)).await.unwrap());
		assert!(game.take_quietly("egg", egg).await.unwrap());
		assert!(!game.take_quietly("egg", egg).await.unwrap());
		assert!(game.discard_quietly("egg", None).await.unwrap());

		assert_eq!(transcript.said(), vec!["You don't have an egg.", "You don't have any beans."]);
		assert!(matches!(game.discard("egg", None).await, Err(Error::NotHeld(_))));
		assert!(matches!(game.take("", egg).await, Err(Error::UndefinedNoun)));
	}

	#[tokio::test]
	async fn inventory_listing() {
		let (mut world, vault, a, b) = coin_world();
		let orb = world.add_object(GameObject::builder("orb")).unwrap();
		let beans = world.add_object(GameObject::builder("beans").plural(true)).unwrap();
		let (mut game, transcript) = game_with(world, vault);

		game.take_quietly("orb", orb).await.unwrap();
		game.take_quietly("coin", a).await.unwrap();
		game.take_quietly("coin", b).await.unwrap();
		game.take_quietly("beans", beans).await.unwrap();
		game.show_inventory().await.unwrap();

		assert_eq!(transcript.said(), vec!["You have:\n    - an orb\n    - 2 coins\n    - some beans"]);

		let mut nouns = Vec::new();
		game.with_inventory(|noun, _| nouns.push(noun.to_owned()));
		assert_eq!(nouns, vec!["orb", "coin", "beans"]);
	}

	#[tokio::test]
	async fn end_reports_the_score() {
		let mut world = World::new();
		let start = world.add_passage(Passage::builder("Start.")).unwrap();
		let finale = world.add_passage(Passage::builder("The end.")).unwrap();
		let (mut game, transcript) = game_with(world, start);
		game.timer(Duration::from_secs(30), Some("doom"), |_| async { anyhow::Ok(()) }.boxed_local());

		game.plus(1).await.unwrap();
		game.end(finale).await.unwrap();

		assert!(game.is_ended());
		assert!(!game.is_timer_live("doom"));
		assert_eq!(transcript.shown(), vec!["The end."]);
		assert_eq!(transcript.said(), vec!["Thank you for playing Test. You scored 1 point."]);
		assert_eq!(game.prompt().await.unwrap(), None);
	}

	#[tokio::test]
	async fn die_restarts_from_the_original_start() {
		let mut world = World::new();
		let start = world.add_passage(Passage::builder("Start.")).unwrap();
		let middle = world.add_passage(Passage::builder("Middle.")).unwrap();
		let pit = world.add_passage(Passage::builder("You fall.")).unwrap();
		let gem = world.add_object(GameObject::builder("gem").points(3)).unwrap();
		world.place(middle, gem).unwrap();
		let (mut game, transcript) = game_with(world, start);

		game.move_to(middle).await.unwrap();
		game.act("take gem").await.unwrap();
		game.set("torch", true).await.unwrap();
		game.timer(Duration::from_secs(5), Some("drip"), |_| async { anyhow::Ok(()) }.boxed_local());
		game.die(pit).await.unwrap();

		assert_eq!(game.passage(), Some(start));
		assert_eq!(game.score(), 0);
		assert_eq!(game.get("torch"), None);
		assert!(!game.has("gem"));
		assert!(!game.is_timer_live("drip"));
		assert_eq!(game.world().passage(middle).unwrap().object("gem"), Some(gem));
		assert_eq!(transcript.shown(), vec!["Middle.", "You fall.", "Start."]);
		assert_eq!(transcript.clears(), 1);
	}

	#[tokio::test]
	async fn transitions_emit_in_order() {
		let order = Rc::new(RefCell::new(Vec::new()));
		let (o1, o2, o3) = (order.clone(), order.clone(), order.clone());
		let mut world = World::new();
		let a = world
			.add_passage(Passage::builder("A.").on(PassageEvent::Exited, move |_, _| {
				o1.borrow_mut().push("exited a");
				async { anyhow::Ok(()) }.boxed_local()
			}))
			.unwrap();
		let b = world
			.add_passage(
				Passage::builder("B.")
					.on(PassageEvent::Entering, move |_, _| {
						o2.borrow_mut().push("entering b");
						async { anyhow::Ok(()) }.boxed_local()
					})
					.on(PassageEvent::Entered, move |_, _| {
						o3.borrow_mut().push("entered b");
						async { anyhow::Ok(()) }.boxed_local()
					}),
			)
			.unwrap();
		let (mut game, _) = game_with(world, a);

		game.move_to(b).await.unwrap();

		assert_eq!(*order.borrow(), vec!["exited a", "entering b", "entered b"]);
	}

	fn recording(fired: &Rc<RefCell<Vec<&'static str>>>, name: &'static str) -> timer::TimerCallback {
		let fired = fired.clone();
		timer::callback(move |_| {
			fired.borrow_mut().push(name);
			async { anyhow::Ok(()) }.boxed_local()
		})
	}

	#[tokio::test(start_paused = true)]
	async fn an_expiring_timer_can_clear_one_due_with_it() {
		let fired = Rc::new(RefCell::new(Vec::new()));
		let (mut game, _) = sandbox();
		let f = fired.clone();
		game.timer(Duration::from_secs(3), Some("a"), move |game| {
			async move {
				f.borrow_mut().push("a");
				game.clear_timer("b");
				anyhow::Ok(())
			}
			.boxed_local()
		});
		game.timer(Duration::from_secs(3), Some("b"), recording(&fired, "b"));

		tokio::time::advance(Duration::from_secs(3)).await;
		game.run_due_timers().await;

		assert_eq!(*fired.borrow(), vec!["a"]);
		assert!(!game.is_timer_live("b"));
	}

	#[tokio::test(start_paused = true)]
	async fn ending_stops_the_timers_due_with_it() {
		let fired = Rc::new(RefCell::new(Vec::new()));
		let mut world = World::new();
		let start = world.add_passage(Passage::builder("Start.")).unwrap();
		let finale = world.add_passage(Passage::builder("The end.")).unwrap();
		let (mut game, transcript) = game_with(world, start);
		game.timer(Duration::from_secs(3), Some("a"), move |game| {
			async move {
				game.end(finale).await?;
				anyhow::Ok(())
			}
			.boxed_local()
		});
		game.timer(Duration::from_secs(3), Some("b"), recording(&fired, "b"));

		tokio::time::advance(Duration::from_secs(3)).await;
		game.run_due_timers().await;

		assert!(fired.borrow().is_empty());
		assert_eq!(transcript.said(), vec!["Thank you for playing Test. You scored 0 points."]);
	}

	#[tokio::test(start_paused = true)]
	async fn a_failing_timer_does_not_lose_the_others() {
		let fired = Rc::new(RefCell::new(Vec::new()));
		let (mut game, _) = sandbox();
		game.timer(Duration::from_secs(3), Some("a"), |_| {
			async { Err::<(), _>(anyhow::anyhow!("fizzle")) }.boxed_local()
		});
		game.timer(Duration::from_secs(3), Some("b"), recording(&fired, "b"));

		tokio::time::advance(Duration::from_secs(3)).await;
		game.run_due_timers().await;

		assert_eq!(*fired.borrow(), vec!["b"]);
		assert!(!game.is_timer_live("a"));
		assert!(!game.is_timer_live("b"));
	}

	#[test]
	fn start_passage_must_exist() {
		let mut world = World::new();
		let hall = world.add_passage(Passage::builder("A hall.")).unwrap();
		let result = Game::new(GameConfig::new("X", hall), World::new(), Transcript::new());
		assert!(matches!(result, Err(Error::UnknownPassage(id)) if id == hall));
	}
}
