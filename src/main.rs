use std::{env, path::Path, time::Duration};

use anyhow::{Context, Result};
use futures::FutureExt;
use log::info;
use passage_rust::{
	Capacity, Exit, Game, GameConfig, GameObject, Passage, PassageEvent, PassageId, Terminal, Text, World, init_logging, script,
};

/// A short story: find the key, climb the lighthouse and light the lamp
/// before the gale puts the stairwell lamps out.
fn story() -> Result<(World, PassageId)> {
	let mut world = World::new();

	let drowned = world.add_passage(Passage::builder("You slip on the wet stone and the sea takes you."))?;
	let darkness = world.add_passage(Passage::builder("The wind howls, the lamps go out, and you miss your footing in the dark."))?;
	let finale = world.add_passage(Passage::builder("The great lamp blazes. Far out at sea, a ship turns for home."))?;

	let shore = world.add_passage(
		Passage::builder(Text::computed(|game| {
			if game.get("visited").is_some_and(|v| v.truthy()) {
				"The shore again. The lighthouse waits to the north.".to_owned()
			} else {
				"You stand on a windswept shore. A lighthouse rises to the north.".to_owned()
			}
		}))
		.exit("rocks", Exit::death(drowned)),
	)?;

	let stairs = world.add_passage(
		Passage::builder("A spiral staircase winds upward. Oil lamps gutter in the draught.").on(
			PassageEvent::Entered,
			move |game, _| {
				if !game.is_timer_live("gale") {
					game.timer(Duration::from_secs(45), Some("gale"), move |game| {
						async move {
							game.die(darkness).await?;
							anyhow::Ok(())
						}
						.boxed_local()
					});
				}
				async { anyhow::Ok(()) }.boxed_local()
			},
		),
	)?;

	let door = world.add_passage(
		Passage::builder("A heavy oak door, bound in iron, blocks the way in.")
			.set("visited", true)
			.action("(?:unlock|open) (?:the )?door", move |game, _| {
				async move {
					if !game.has("key") {
						game.say("It's locked tight.").await?;
						return anyhow::Ok(());
					}
					game.say("The key turns with a groan.").await?;
					game.move_to(stairs).await?;
					anyhow::Ok(())
				}
				.boxed_local()
			}),
	)?;

	let lamp_room = world.add_passage(
		Passage::builder("The lamp room. A great brass lamp stands cold in the middle.")
			.on(PassageEvent::Entered, |game, _| {
				game.clear_timer("gale");
				async { anyhow::Ok(()) }.boxed_local()
			})
			.action("light (?:the )?lamp", move |game, _| {
				async move {
					if !game.has("matches") {
						game.say("You have nothing to light it with.").await?;
						return anyhow::Ok(());
					}
					game.plus(10).await?;
					game.end(finale).await?;
					anyhow::Ok(())
				}
				.boxed_local()
			}),
	)?;

	world.connect(shore, "north", door)?;
	world.connect(door, "south", shore)?;
	world.connect(stairs, "up", lamp_room)?;
	world.connect(stairs, "down", door)?;
	world.connect(lamp_room, "down", stairs)?;

	let key = world.add_object(
		GameObject::builder("key")
			.name("iron key")
			.alternate("iron key")
			.description("A heavy iron key, flecked with rust.")
			.points(5),
	)?;
	world.place(shore, key)?;

	for beach in [shore, door, stairs] {
		let shell = world.add_object(
			GameObject::builder("shell")
				.capacity(Capacity::Multiple)
				.plural_name("shells")
				.description("A pale spiral shell.")
				.dropped("The shell clatters on the stone."),
		)?;
		world.place(beach, shell)?;
	}

	let matches = world.add_object(
		GameObject::builder("matches")
			.name("box of matches")
			.plural(true)
			.description("A damp box of matches. A few might still strike.")
			.points(2),
	)?;
	world.place(stairs, matches)?;

	let lamp = world.add_object(
		GameObject::builder("lamp")
			.name("brass lamp")
			.takeable(false)
			.description("Polished brass, taller than you are.")
			.verb("(?:polish|rub)", |game, _| {
				async move {
					game.say("You polish the brass until it gleams.").await?;
					anyhow::Ok(())
				}
				.boxed_local()
			}),
	)?;
	world.place(lamp_room, lamp)?;

	Ok((world, shore))
}

fn main() -> Result<()> {
	init_logging();

	let mut lines = Vec::new();
	let mut auto_play = false;
	for arg in env::args().skip(1) {
		match arg.as_str() {
			"--auto" => auto_play = true,
			path => {
				lines = script::load(Path::new(path)).with_context(|| format!("Failed to load script '{path}'"))?;
				info!("loaded {} scripted lines from {path}", lines.len());
			}
		}
	}

	let runtime = tokio::runtime::Builder::new_current_thread()
		.enable_all()
		.build()
		.context("Failed to start the runtime")?;

	runtime.block_on(async {
		let (world, start) = story()?;
		let mut game = Game::new(GameConfig::new("The Lighthouse", start), world, Terminal::new())?;
		game.play(lines, auto_play).await?;
		anyhow::Ok(())
	})
}
