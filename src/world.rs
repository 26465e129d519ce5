//! The world registry.
//!
//! Passages point at each other through exits and objects move between
//! passages and the inventory, so neither owns the other: both live in this
//! arena and refer to each other by id.

use std::fmt;

use crate::{
	error::{Error, Result},
	object::{GameObject, ObjectBuilder},
	passage::{Exit, Passage, PassageBuilder},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PassageId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(usize);

impl fmt::Display for PassageId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "passage#{}", self.0)
	}
}

impl fmt::Display for ObjectId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "object#{}", self.0)
	}
}

#[derive(Default)]
pub struct World {
	passages: Vec<Passage>,
	objects: Vec<GameObject>,
}

impl World {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn add_passage(&mut self, builder: PassageBuilder) -> Result<PassageId> {
		let id = PassageId(self.passages.len());
		self.passages.push(builder.build(id)?);
		Ok(id)
	}

	pub fn add_object(&mut self, builder: ObjectBuilder) -> Result<ObjectId> {
		let id = ObjectId(self.objects.len());
		self.objects.push(builder.build(id)?);
		Ok(id)
	}

	/// Puts `object` into `passage` under its noun. The first passage an
	/// object is placed in becomes its home for restarts.
	pub fn place(&mut self, passage: PassageId, object: ObjectId) -> Result<()> {
		let noun = {
			let obj = self.object_mut(object)?;
			obj.home.get_or_insert(passage);
			obj.noun().to_owned()
		};
		self.passage_mut(passage)?.insert_object(noun, object);
		Ok(())
	}

	/// Adds an exit from `from` that moves the player to `to`.
	pub fn connect(&mut self, from: PassageId, direction: &str, to: PassageId) -> Result<()> {
		self.passage(to)?;
		self.passage_mut(from)?.add_exit(direction, Exit::to(to))
	}

	pub fn passage(&self, id: PassageId) -> Result<&Passage> {
		self.passages.get(id.0).ok_or(Error::UnknownPassage(id))
	}

	pub fn passage_mut(&mut self, id: PassageId) -> Result<&mut Passage> {
		self.passages.get_mut(id.0).ok_or(Error::UnknownPassage(id))
	}

	pub fn object(&self, id: ObjectId) -> Result<&GameObject> {
		self.objects.get(id.0).ok_or(Error::UnknownObject(id))
	}

	pub fn object_mut(&mut self, id: ObjectId) -> Result<&mut GameObject> {
		self.objects.get_mut(id.0).ok_or(Error::UnknownObject(id))
	}

	pub fn objects(&self) -> impl Iterator<Item = &GameObject> {
		self.objects.iter()
	}

	pub fn passage_count(&self) -> usize {
		self.passages.len()
	}
}
