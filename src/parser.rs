//! The parser chain.
//!
//! Each resolver looks at one line of input and the current state without
//! touching it, and either claims the line with a [`Deferred`] action or
//! passes. Resolvers are tried in a fixed order and the first claim wins.

use log::{debug, info};

use crate::{
	error::{Error, Result},
	game::Game,
	object::GameObject,
	passage::{ActionHandler, Exit},
	text::points,
	world::{ObjectId, PassageId},
};

/// Words that list the inventory.
const INVENTORY_WORDS: [&str; 3] = ["inventory", "inv", "i"];

/// Whether a line of input was acted upon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
	Handled,
	Unresolved,
}

/// A resolved command that has not run yet.
pub enum Deferred {
	Move { direction: String, exit: Exit },
	Action(ActionHandler),
	Verb { object: ObjectId, verb: String, noun: String },
	Quit,
	Score,
	Inventory,
}

impl Deferred {
	pub async fn run(self, game: &mut Game, passage: PassageId) -> Result<Outcome> {
		match self {
			Deferred::Move { direction, exit } => {
				info!("leaving {passage} by '{direction}'");
				exit.follow(game, passage).await?;
			}
			Deferred::Action(handler) => handler(game, passage).await.map_err(Error::Handler)?,
			Deferred::Verb { object, verb, noun } => {
				return GameObject::perform(game, object, passage, &verb, &noun).await;
			}
			Deferred::Quit => game.exit().await?,
			Deferred::Score => {
				let line = format!("You have {}", points(game.score()));
				game.say(line).await?;
			}
			Deferred::Inventory => game.show_inventory().await?,
		}
		Ok(Outcome::Handled)
	}

	fn kind(&self) -> &'static str {
		match self {
			Deferred::Move { .. } => "movement",
			Deferred::Action(_) => "passage action",
			Deferred::Verb { .. } => "object verb",
			Deferred::Quit => "quit",
			Deferred::Score => "score",
			Deferred::Inventory => "inventory",
		}
	}
}

type Resolver = fn(&str, PassageId, &Game) -> Result<Option<Deferred>>;

const CHAIN: [Resolver; 7] = [movement, action, object_verb, inventory_verb, quit, score, inventory];

/// Runs the chain over `text` for the passage `id`.
pub fn resolve(text: &str, id: PassageId, game: &Game) -> Result<Option<Deferred>> {
	for resolver in CHAIN {
		if let Some(deferred) = resolver(text, id, game)? {
			debug!("'{text}' resolved as {}", deferred.kind());
			return Ok(Some(deferred));
		}
	}
	debug!("'{text}' unresolved in {id}");
	Ok(None)
}

// ---------------------------------------------------------------------------
// Resolvers
// ---------------------------------------------------------------------------

fn movement(text: &str, id: PassageId, game: &Game) -> Result<Option<Deferred>> {
	let passage = game.world().passage(id)?;
	Ok(passage.movement_target(text).map(|(direction, exit)| Deferred::Move {
		direction: direction.to_owned(),
		exit: exit.clone(),
	}))
}

fn action(text: &str, id: PassageId, game: &Game) -> Result<Option<Deferred>> {
	let passage = game.world().passage(id)?;
	Ok(passage.actions().resolve(text).cloned().map(Deferred::Action))
}

fn object_verb(text: &str, id: PassageId, game: &Game) -> Result<Option<Deferred>> {
	let world = game.world();
	for (noun, object) in world.passage(id)?.objects() {
		let obj = world.object(object)?;
		let Some(verb) = obj.subject(text) else {
			continue;
		};
		if obj.verbs().resolve(verb).is_some() {
			return Ok(Some(Deferred::Verb {
				object,
				verb: verb.to_owned(),
				noun: noun.to_owned(),
			}));
		}
	}
	Ok(None)
}

fn inventory_verb(text: &str, _: PassageId, game: &Game) -> Result<Option<Deferred>> {
	for (noun, object) in game.held() {
		if let Some(verb) = game.world().object(object)?.subject(text) {
			return Ok(Some(Deferred::Verb {
				object,
				verb: verb.to_owned(),
				noun: noun.to_owned(),
			}));
		}
	}
	Ok(None)
}

fn quit(text: &str, _: PassageId, game: &Game) -> Result<Option<Deferred>> {
	Ok(game.quit_words().iter().any(|w| w == text).then_some(Deferred::Quit))
}

fn score(text: &str, _: PassageId, _: &Game) -> Result<Option<Deferred>> {
	Ok((text == "score").then_some(Deferred::Score))
}

fn inventory(text: &str, _: PassageId, _: &Game) -> Result<Option<Deferred>> {
	Ok(INVENTORY_WORDS.contains(&text).then_some(Deferred::Inventory))
}
