use std::collections::BTreeMap;

/// The keys that differ between two maps. The comparison is shallow: values are compared with [`PartialEq`] only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectsDiff<'a, K> {
	/// Keys only in the new map.
	pub added: Vec<&'a K>,
	/// Keys only in the old map.
	pub removed: Vec<&'a K>,
	/// Keys in both maps with unequal values.
	pub updated: Vec<&'a K>,
}

impl<K> ObjectsDiff<'_, K> {
	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.added.is_empty() && self.removed.is_empty() && self.updated.is_empty()
	}
}

#[must_use]
pub fn objects_diff<'a, K: Ord, V: PartialEq>(old: &'a BTreeMap<K, V>, new: &'a BTreeMap<K, V>) -> ObjectsDiff<'a, K> {
	let mut diff = ObjectsDiff {
		added: Vec::new(),
		removed: old.keys().filter(|key| !new.contains_key(key)).collect(),
		updated: Vec::new(),
	};
	for (key, value) in new {
		match old.get(key) {
			None => diff.added.push(key),
			Some(old_value) if old_value != value => diff.updated.push(key),
			Some(_) => {}
		}
	}
	diff
}
