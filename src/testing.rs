//! Fixtures shared by the unit tests.

use crate::{
	game::{Game, GameConfig},
	passage::Passage,
	ui::Transcript,
	world::{PassageId, World},
};

/// A game over `world` titled "Test", recording into the returned transcript.
pub fn game_with(world: World, start: PassageId) -> (Game, Transcript) {
	let transcript = Transcript::new();
	let game = Game::new(GameConfig::new("Test", start), world, transcript.clone()).expect("start passage exists");
	(game, transcript)
}

/// A game with a single empty room.
pub fn sandbox() -> (Game, Transcript) {
	let mut world = World::new();
	let room = world.add_passage(Passage::builder("An empty room.")).expect("valid passage");
	game_with(world, room)
}
