//! What the player is carrying.

use indexmap::IndexMap;

use crate::world::ObjectId;

/// One noun's worth of held objects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Slot {
	Single(ObjectId),
	/// Several interchangeable objects; may be empty after discards.
	Multiple(Vec<ObjectId>),
}

impl Slot {
	pub fn first(&self) -> Option<ObjectId> {
		match self {
			Slot::Single(id) => Some(*id),
			Slot::Multiple(ids) => ids.first().copied(),
		}
	}

	pub fn count(&self) -> usize {
		match self {
			Slot::Single(_) => 1,
			Slot::Multiple(ids) => ids.len(),
		}
	}
}

/// Held objects keyed by noun, in the order they were first picked up.
#[derive(Debug, Clone, Default)]
pub struct Inventory {
	slots: IndexMap<String, Slot>,
}

impl Inventory {
	pub fn new() -> Self {
		Self::default()
	}

	/// True when at least one `noun` is held.
	pub fn has(&self, noun: &str) -> bool {
		self.count(noun) > 0
	}

	pub fn count(&self, noun: &str) -> usize {
		self.slots.get(noun).map_or(0, Slot::count)
	}

	pub fn slot(&self, noun: &str) -> Option<&Slot> {
		self.slots.get(noun)
	}

	/// Adds `object` under `noun`. Returns `false` if a single-capacity noun
	/// or that very object is already held.
	pub fn add(&mut self, noun: &str, object: ObjectId, multiple: bool) -> bool {
		if self.holds(object) {
			return false;
		}
		match self.slots.get_mut(noun) {
			Some(Slot::Multiple(ids)) => {
				ids.push(object);
				true
			}
			Some(Slot::Single(_)) => false,
			None => {
				let slot = if multiple { Slot::Multiple(vec![object]) } else { Slot::Single(object) };
				self.slots.insert(noun.to_owned(), slot);
				true
			}
		}
	}

	/// Removes one `noun`. With `preferred`, that exact object is removed if
	/// it is held; otherwise the most recently taken one goes. A multiple slot
	/// stays behind empty.
	pub fn remove(&mut self, noun: &str, preferred: Option<ObjectId>) -> Option<ObjectId> {
		if let Slot::Multiple(ids) = self.slots.get_mut(noun)? {
			let index = preferred
				.and_then(|want| ids.iter().position(|id| *id == want))
				.or_else(|| ids.len().checked_sub(1))?;
			return Some(ids.remove(index));
		}
		self.slots.shift_remove(noun).as_ref().and_then(Slot::first)
	}

	pub fn holds(&self, object: ObjectId) -> bool {
		self.held().any(|id| id == object)
	}

	pub fn first(&self, noun: &str) -> Option<ObjectId> {
		self.slots.get(noun).and_then(Slot::first)
	}

	/// Every held object, slot by slot.
	pub fn held(&self) -> impl Iterator<Item = ObjectId> + '_ {
		self.slots.values().flat_map(|slot| match slot {
			Slot::Single(id) => std::slice::from_ref(id).iter().copied(),
			Slot::Multiple(ids) => ids.iter().copied(),
		})
	}

	pub fn slots(&self) -> impl Iterator<Item = (&str, &Slot)> {
		self.slots.iter().map(|(noun, slot)| (noun.as_str(), slot))
	}

	pub fn clear(&mut self) {
		self.slots.clear();
	}

	pub fn is_empty(&self) -> bool {
		self.slots.values().all(|slot| slot.count() == 0)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::{object::GameObject, world::World};

	fn ids<const N: usize>() -> [ObjectId; N] {
		let mut world = World::new();
		std::array::from_fn(|i| world.add_object(GameObject::builder(&format!("o{i}"))).unwrap())
	}

	#[test]
	fn single_slot_refuses_a_second() {
		let [a, b] = ids();
		let mut inv = Inventory::new();
		assert!(inv.add("key", a, false));
		assert!(!inv.add("key", b, false));
		assert_eq!(inv.count("key"), 1);
		assert_eq!(inv.remove("key", None), Some(a));
		assert!(inv.slot("key").is_none());
	}

	#[test]
	fn multiple_slot_counts_and_empties() {
		let [a, b] = ids();
		let mut inv = Inventory::new();
		inv.add("coin", a, true);
		inv.add("coin", b, true);
		assert_eq!(inv.count("coin"), 2);
		assert_eq!(inv.first("coin"), Some(a));

		assert_eq!(inv.remove("coin", Some(a)), Some(a));
		assert_eq!(inv.remove("coin", None), Some(b));
		assert_eq!(inv.remove("coin", None), None);
		assert!(!inv.has("coin"));
		assert!(matches!(inv.slot("coin"), Some(Slot::Multiple(v)) if v.is_empty()));
		assert!(inv.is_empty());
	}

	#[test]
	fn the_same_object_is_never_held_twice() {
		let [a, b] = ids();
		let mut inv = Inventory::new();
		assert!(inv.add("coin", a, true));
		assert!(!inv.add("coin", a, true));
		assert!(inv.add("coin", b, true));
		assert_eq!(inv.count("coin"), 2);
		assert!(inv.holds(a));
	}

	#[test]
	fn held_walks_every_slot() {
		let [a, b, c] = ids();
		let mut inv = Inventory::new();
		inv.add("key", a, false);
		inv.add("coin", b, true);
		inv.add("coin", c, true);
		assert_eq!(inv.held().collect::<Vec<_>>(), vec![a, b, c]);
		inv.clear();
		assert_eq!(inv.held().count(), 0);
	}
}
