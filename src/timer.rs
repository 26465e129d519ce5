//! Named one-shot timers.
//!
//! A timer is a deadline and a continuation. Nothing runs in the background:
//! the session checks for due timers while it waits for input, and a scripted
//! `wait <name>` line fires a live timer straight away.

use std::time::Duration;

use futures::future::LocalBoxFuture;
use indexmap::IndexMap;
use log::debug;
use tokio::time::Instant;

use crate::game::Game;

pub type TimerCallback = Box<dyn for<'a> FnOnce(&'a mut Game) -> LocalBoxFuture<'a, anyhow::Result<()>>>;

/// Boxes a closure as a [`TimerCallback`].
pub fn callback<F>(f: F) -> TimerCallback
where
	F: for<'a> FnOnce(&'a mut Game) -> LocalBoxFuture<'a, anyhow::Result<()>> + 'static,
{
	Box::new(f)
}

struct Pending {
	deadline: Instant,
	callback: TimerCallback,
}

#[derive(Default)]
pub struct Timers {
	pending: IndexMap<String, Pending>,
	generated: u64,
}

impl Timers {
	pub fn new() -> Self {
		Self::default()
	}

	/// Schedules `callback` after `delay` under `name`, replacing any live
	/// timer with the same name. Without a name one is generated.
	pub fn start(&mut self, delay: Duration, name: Option<&str>, callback: TimerCallback) -> String {
		let name = match name {
			Some(name) => name.to_owned(),
			None => {
				self.generated += 1;
				format!("timer_{}", self.generated)
			}
		};
		debug!("timer {name} due in {delay:?}");
		let deadline = Instant::now() + delay;
		self.pending.insert(name.clone(), Pending { deadline, callback });
		name
	}

	/// Cancels a timer. Returns `false` if it was not live.
	pub fn clear(&mut self, name: &str) -> bool {
		self.pending.shift_remove(name).is_some()
	}

	pub fn clear_all(&mut self) {
		if !self.pending.is_empty() {
			debug!("clearing {} timers", self.pending.len());
		}
		self.pending.clear();
	}

	pub fn is_live(&self, name: &str) -> bool {
		self.pending.contains_key(name)
	}

	pub fn len(&self) -> usize {
		self.pending.len()
	}

	pub fn is_empty(&self) -> bool {
		self.pending.is_empty()
	}

	/// Removes a live timer and hands back its continuation.
	pub fn take(&mut self, name: &str) -> Option<TimerCallback> {
		self.pending.shift_remove(name).map(|p| p.callback)
	}

	pub fn next_deadline(&self) -> Option<Instant> {
		self.pending.values().map(|p| p.deadline).min()
	}

	/// Removes the earliest timer whose deadline is at or before `now`. Ties
	/// go to the timer started first. Timers stay in the table until taken,
	/// so a continuation can still clear the ones due after it.
	pub fn take_next_due(&mut self, now: Instant) -> Option<(String, TimerCallback)> {
		let (index, _) = self
			.pending
			.values()
			.enumerate()
			.filter(|(_, p)| p.deadline <= now)
			.min_by_key(|(_, p)| p.deadline)?;
		let (name, pending) = self.pending.shift_remove_index(index)?;
		Some((name, pending.callback))
	}
}

#[cfg(test)]
mod tests {
	use futures::FutureExt;

	use super::*;

	fn noop() -> TimerCallback {
		callback(|_| async { anyhow::Ok(()) }.boxed_local())
	}

	#[tokio::test(start_paused = true)]
	async fn generated_names_are_unique() {
		let mut timers = Timers::new();
		let a = timers.start(Duration::from_secs(1), None, noop());
		let b = timers.start(Duration::from_secs(1), None, noop());
		assert_ne!(a, b);
		assert!(a.starts_with("timer_"));
		assert_eq!(timers.len(), 2);
	}

	#[tokio::test(start_paused = true)]
	async fn restarting_a_name_replaces_it() {
		let mut timers = Timers::new();
		timers.start(Duration::from_secs(10), Some("boil"), noop());
		timers.start(Duration::from_secs(2), Some("boil"), noop());
		assert_eq!(timers.len(), 1);
		assert_eq!(timers.next_deadline(), Some(Instant::now() + Duration::from_secs(2)));
	}

	#[tokio::test(start_paused = true)]
	async fn due_timers_come_out_earliest_first() {
		let mut timers = Timers::new();
		timers.start(Duration::from_secs(3), Some("late"), noop());
		timers.start(Duration::from_secs(1), Some("early"), noop());
		timers.start(Duration::from_secs(60), Some("never"), noop());

		tokio::time::advance(Duration::from_secs(5)).await;
		let now = Instant::now();
		let due: Vec<_> = std::iter::from_fn(|| timers.take_next_due(now)).map(|(n, _)| n).collect();

		assert_eq!(due, vec!["early", "late"]);
		assert!(timers.is_live("never"));
		assert!(!timers.is_live("early"));
	}

	#[tokio::test(start_paused = true)]
	async fn simultaneous_timers_leave_one_at_a_time() {
		let mut timers = Timers::new();
		timers.start(Duration::from_secs(3), Some("a"), noop());
		timers.start(Duration::from_secs(3), Some("b"), noop());

		tokio::time::advance(Duration::from_secs(3)).await;
		let now = Instant::now();
		let (first, _) = timers.take_next_due(now).unwrap();

		assert_eq!(first, "a");
		assert!(timers.is_live("b"));
		assert!(timers.clear("b"));
		assert!(timers.take_next_due(now).is_none());
	}

	#[tokio::test(start_paused = true)]
	async fn cleared_timers_are_gone() {
		let mut timers = Timers::new();
		timers.start(Duration::from_secs(1), Some("boil"), noop());
		assert!(timers.clear("boil"));
		assert!(!timers.clear("boil"));
		assert!(timers.take("boil").is_none());
		timers.start(Duration::from_secs(1), Some("a"), noop());
		timers.clear_all();
		assert!(timers.is_empty());
	}
}
