use pretty_assertions::assert_eq;
use std::collections::BTreeMap;
use vdom_runtime::objects::{objects_diff, ObjectsDiff};

fn map(entries: &[(&'static str, i32)]) -> BTreeMap<&'static str, i32> {
	entries.iter().copied().collect()
}

#[test]
fn added_removed_updated() {
	let old = map(&[("kept", 1), ("changed", 1), ("gone", 1)]);
	let new = map(&[("kept", 1), ("changed", 2), ("fresh", 1)]);

	let diff = objects_diff(&old, &new);
	assert_eq!(
		diff,
		ObjectsDiff {
			added: vec![&"fresh"],
			removed: vec![&"gone"],
			updated: vec![&"changed"],
		}
	);
	assert!(!diff.is_empty());
}

#[test]
fn self_diff_is_empty() {
	let a = map(&[("a", 1), ("b", 2)]);
	let diff = objects_diff(&a, &a);
	assert!(diff.is_empty(), "{:?}", diff);

	let empty = map(&[]);
	assert!(objects_diff(&empty, &empty).is_empty());
}

#[test]
fn added_and_removed_are_disjoint() {
	let cases = [
		(map(&[]), map(&[("a", 1)])),
		(map(&[("a", 1)]), map(&[])),
		(map(&[("a", 1), ("b", 1)]), map(&[("b", 2), ("c", 3)])),
		(map(&[("x", 0), ("y", 0), ("z", 0)]), map(&[("w", 0), ("x", 1), ("z", 0)])),
	];
	for (old, new) in &cases {
		let diff = objects_diff(old, new);
		for key in &diff.added {
			assert!(!diff.removed.contains(key));
			assert!(new.contains_key(*key) && !old.contains_key(*key));
		}
		for key in &diff.removed {
			assert!(old.contains_key(*key) && !new.contains_key(*key));
		}
		for key in &diff.updated {
			assert!(old[*key] != new[*key]);
		}
		assert_eq!(diff.added.len() + diff.updated.len() + new.keys().filter(|key| old.get(*key) == new.get(*key)).count(), new.len());
	}
}

#[test]
fn comparison_is_shallow() {
	let old: BTreeMap<_, _> = vec![("list", vec![1, 2])].into_iter().collect();
	let same: BTreeMap<_, _> = vec![("list", vec![1, 2])].into_iter().collect();
	let different: BTreeMap<_, _> = vec![("list", vec![2, 1])].into_iter().collect();

	assert!(objects_diff(&old, &same).is_empty());
	assert_eq!(objects_diff(&old, &different).updated, vec![&"list"]);
}
