//! Reference-counted values shared by several bindings, like one listener closure attached to many elements.

use core::hash::Hash;
use hashbrown::{hash_map::Entry, HashMap};
use num_traits::{CheckedAdd, CheckedSub, One, Zero};

/// Values keyed by `K`, each alive while at least one binding refers to it.
pub(crate) struct Bindings<K, V, C = u16> {
	entries: HashMap<K, Binding<C, V>>,
}

struct Binding<C, V> {
	count: C,
	value: V,
}

/// The outcome of [`Bindings::unbind`].
#[derive(Debug)]
pub(crate) enum Unbound<V> {
	/// Other bindings still refer to the value.
	Retained,
	/// That was the last binding. The value is handed back to be dropped.
	Released(V),
	/// Nothing was bound to the key.
	Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("binding count saturated")]
pub(crate) struct CountSaturated;

impl<K: Hash + Eq, V, C: CheckedAdd + CheckedSub + One + Zero> Bindings<K, V, C> {
	pub(crate) fn new() -> Self {
		Self { entries: HashMap::new() }
	}

	/// Adds a binding to `key`, creating its value on first use.
	pub(crate) fn bind(&mut self, key: K, create: impl FnOnce() -> V) -> Result<&V, CountSaturated> {
		match self.entries.entry(key) {
			Entry::Occupied(occupied) => {
				let binding = occupied.into_mut();
				binding.count = binding.count.checked_add(&C::one()).ok_or(CountSaturated)?;
				Ok(&binding.value)
			}
			Entry::Vacant(vacant) => Ok(&vacant
				.insert(Binding {
					count: C::one(),
					value: create(),
				})
				.value),
		}
	}

	pub(crate) fn get(&self, key: &K) -> Option<&V> {
		self.entries.get(key).map(|binding| &binding.value)
	}

	/// Removes a binding from `key`, releasing the value with the last one.
	pub(crate) fn unbind(&mut self, key: &K) -> Unbound<V> {
		let binding = match self.entries.get_mut(key) {
			Some(binding) => binding,
			None => return Unbound::Unknown,
		};
		match binding.count.checked_sub(&C::one()) {
			Some(count) if !count.is_zero() => {
				binding.count = count;
				Unbound::Retained
			}
			_ => self.entries.remove(key).map_or(Unbound::Unknown, |binding| Unbound::Released(binding.value)),
		}
	}

	pub(crate) fn len(&self) -> usize {
		self.entries.len()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn last_unbind_releases() {
		let mut bindings = Bindings::<&str, String, u8>::new();
		let mut created = 0;
		for _ in 0..2 {
			bindings
				.bind("click", || {
					created += 1;
					"closure".to_owned()
				})
				.unwrap();
		}
		assert_eq!(created, 1);
		assert_eq!(bindings.get(&"click").map(String::as_str), Some("closure"));

		assert!(matches!(bindings.unbind(&"click"), Unbound::Retained));
		assert!(matches!(bindings.unbind(&"click"), Unbound::Released(value) if value == "closure"));
		assert!(matches!(bindings.unbind(&"click"), Unbound::Unknown));
		assert_eq!(bindings.len(), 0);
	}

	#[test]
	fn saturation() {
		let mut bindings = Bindings::<u8, (), u8>::new();
		for _ in 0..u8::MAX {
			bindings.bind(0, || ()).unwrap();
		}
		assert_eq!(bindings.bind(0, || ()).unwrap_err(), CountSaturated);
		assert!(matches!(bindings.unbind(&0), Unbound::Retained));
	}
}
