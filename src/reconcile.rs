//! Mounting, destroying and patching virtual trees against a [`Host`].

use crate::{
	error::{Error, Result},
	host::Host,
	props::{apply_props, patch_props},
	vnode::{ElementNode, VNode},
};
use core::{fmt::Debug, mem};
use hashbrown::{HashMap, HashSet};
use tracing::{instrument, trace, trace_span, warn};

const UNMOUNTED: &str = "cannot destroy an unmounted node";

/// Page content is only logged with the `dangerous-logging` feature.
pub(crate) fn loggable<T: Debug>(value: &T) -> &dyn Debug {
	if cfg!(feature = "dangerous-logging") {
		value
	} else {
		&"<redacted>"
	}
}

/// Reconciler configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Options {
	/// How deep virtual trees may nest before [`Error::DepthLimitExceeded`] is returned.
	pub depth_limit: usize,
	/// Whether plain attributes missing from a new render are removed.
	///
	/// Off by default. Setting an attribute to [`AttrValue::Null`](`crate::vnode::AttrValue::Null`) removes it either way.
	pub clear_removed_attributes: bool,
	/// Whether inline style properties missing from a new render are cleared.
	///
	/// Off by default: only the class is always recomputed in full.
	pub clear_removed_styles: bool,
}

impl Default for Options {
	fn default() -> Self {
		Self {
			depth_limit: 1024,
			clear_removed_attributes: false,
			clear_removed_styles: false,
		}
	}
}

/// Mounts, patches and destroys virtual trees through a [`Host`] backend.
///
/// # Correct Use
///
/// Trees returned by [`Reconciler::patch`] replace the ones passed in.
/// Each mounted tree must eventually be [destroyed](`Reconciler::destroy`) to release its host nodes and listeners.
///
/// Errors abort the current operation. The host tree keeps whatever mutations were applied before the failure.
#[derive(Debug)]
pub struct Reconciler<H> {
	host: H,
	options: Options,
}

impl<H: Host> Reconciler<H> {
	#[must_use]
	pub fn new(host: H) -> Self {
		Self::with_options(host, Options::default())
	}

	#[must_use]
	pub fn with_options(host: H, options: Options) -> Self {
		Self { host, options }
	}

	pub fn host(&self) -> &H {
		&self.host
	}

	pub fn options(&self) -> &Options {
		&self.options
	}

	/// Materializes `vnode` as the last child (or children, for fragments) of `parent`.
	#[instrument(skip(self, vnode))]
	pub fn mount(&self, vnode: &mut VNode<H::Node>, parent: &H::Node) -> Result<()> {
		self.check_target(parent)?;
		let index = self.host.child_count(parent);
		self.mount_at(vnode, parent, index, 0)
	}

	/// Detaches `vnode`'s host nodes and listeners, recursively clearing every host reference.
	#[instrument(skip(self, vnode))]
	pub fn destroy(&self, vnode: &mut VNode<H::Node>) -> Result<()> {
		self.destroy_node(vnode, 0)
	}

	/// Reconciles the mounted `old` tree (if any) with `new` and returns `new`, now mounted.
	///
	/// Without an `old` tree, this is an initial [mount](`Reconciler::mount`).
	#[instrument(skip(self, old, new))]
	pub fn patch(&self, old: Option<VNode<H::Node>>, new: VNode<H::Node>, parent: &H::Node) -> Result<VNode<H::Node>> {
		self.check_target(parent)?;
		let mut new = new;
		let old = match old {
			Some(old) => old,
			None => {
				self.mount(&mut new, parent)?;
				return Ok(new);
			}
		};
		if !old.is_mounted() {
			return Err(Error::PreconditionViolation("cannot patch from an unmounted node"));
		}
		if new.is_mounted() {
			return Err(Error::PreconditionViolation("cannot patch into an already mounted node"));
		}

		let mut index = self.current_index(&old, parent);
		let patched = self.patch_node(old, new, parent, &mut index, 0)?;
		trace!(end = index, "Patched.");
		Ok(patched)
	}

	fn check_target(&self, parent: &H::Node) -> Result<()> {
		if self.host.can_have_children(parent) {
			Ok(())
		} else {
			Err(Error::InvalidMountTarget(format!("{:?} can't have children", parent).into()))
		}
	}

	fn check_depth(&self, depth: usize) -> Result<()> {
		if depth > self.options.depth_limit {
			Err(Error::DepthLimitExceeded(self.options.depth_limit))
		} else {
			Ok(())
		}
	}

	/// Where `vnode`'s first host node currently sits in `parent`.
	///
	/// Empty fragments occupy no host nodes; they are treated as sitting at the end.
	fn current_index(&self, vnode: &VNode<H::Node>, parent: &H::Node) -> usize {
		let mut hosts = Vec::new();
		vnode.collect_top_level_hosts(&mut hosts);
		hosts
			.first()
			.and_then(|first| self.host.index_of(parent, first))
			.unwrap_or_else(|| self.host.child_count(parent))
	}

	fn mount_at(&self, vnode: &mut VNode<H::Node>, parent: &H::Node, index: usize, depth: usize) -> Result<()> {
		self.check_depth(depth)?;
		if vnode.is_mounted() {
			return Err(Error::PreconditionViolation("cannot mount an already mounted node"));
		}

		match vnode {
			VNode::Text(text) => {
				let span = trace_span!("Mounting text node", value = ?loggable(&text.value), index);
				let _enter = span.enter();
				let node = self.host.create_text(&text.value)?;
				self.host.insert_child(parent, &node, index)?;
				text.host = Some(node);
			}

			VNode::Element(element) => {
				let span = trace_span!("Mounting element", tag = %element.tag, index);
				let _enter = span.enter();
				let node = self.host.create_element(&element.tag)?;
				element.listeners = Some(apply_props(&self.host, &node, &element.props)?);
				element.host = Some(node.clone());

				let mut child_index = 0;
				for child in &mut element.children {
					self.mount_at(child, &node, child_index, depth + 1)?;
					child_index += child.dom_len();
				}
				self.host.insert_child(parent, &node, index)?;
			}

			VNode::Fragment(fragment) => {
				let span = trace_span!("Mounting fragment", len = fragment.children.len(), index);
				let _enter = span.enter();
				fragment.host = Some(parent.clone());

				let mut child_index = index;
				for child in &mut fragment.children {
					self.mount_at(child, parent, child_index, depth + 1)?;
					child_index += child.dom_len();
				}
			}
		}
		Ok(())
	}

	fn destroy_node(&self, vnode: &mut VNode<H::Node>, depth: usize) -> Result<()> {
		self.check_depth(depth)?;
		match vnode {
			VNode::Text(text) => {
				let node = text.host.take().ok_or(Error::PreconditionViolation(UNMOUNTED))?;
				trace!(?node, "Removing text node.");
				self.host.remove_node(&node);
			}

			VNode::Element(element) => {
				let span = trace_span!("Destroying element", tag = %element.tag);
				let _enter = span.enter();
				let node = element.host.take().ok_or(Error::PreconditionViolation(UNMOUNTED))?;
				self.host.remove_node(&node);

				for child in &mut element.children {
					self.destroy_node(child, depth + 1)?;
				}

				if let Some(listeners) = element.listeners.take() {
					for (event, handler) in &listeners {
						self.host.remove_listener(&node, event, handler);
					}
					trace!(count = listeners.len(), "Removed listener(s).");
				}
			}

			VNode::Fragment(fragment) => {
				fragment.host.take().ok_or(Error::PreconditionViolation(UNMOUNTED))?;
				for child in &mut fragment.children {
					self.destroy_node(child, depth + 1)?;
				}
			}
		}
		Ok(())
	}

	/// Patches `old`, which starts at `*index` in `parent`, into `new` and advances `index` past it.
	fn patch_node(&self, old: VNode<H::Node>, new: VNode<H::Node>, parent: &H::Node, index: &mut usize, depth: usize) -> Result<VNode<H::Node>> {
		self.check_depth(depth)?;
		match (old, new) {
			(VNode::Text(mut t_1), VNode::Text(mut t_2)) => {
				let span = trace_span!("Diffing text node", t_1 = ?loggable(&t_1.value), t_2 = ?loggable(&t_2.value));
				let _enter = span.enter();
				let node = t_1.host.take().ok_or(Error::PreconditionViolation(UNMOUNTED))?;
				if t_1.value != t_2.value {
					self.host.set_text(&node, &t_2.value);
				}
				t_2.host = Some(node);
				*index += 1;
				Ok(VNode::Text(t_2))
			}

			(VNode::Element(mut e_1), VNode::Element(mut e_2)) if e_1.tag == e_2.tag => {
				let span = trace_span!("Diffing element", tag = %e_1.tag);
				let _enter = span.enter();
				let node = e_1.host.take().ok_or(Error::PreconditionViolation(UNMOUNTED))?;

				let mut listeners = e_1.listeners.take().unwrap_or_default();
				patch_props(&self.host, &node, &e_1.props, &e_2.props, &mut listeners, &self.options)?;
				e_2.listeners = Some(listeners);

				e_2.children = self.patch_children(mem::take(&mut e_1.children), mem::take(&mut e_2.children), &node, 0, depth + 1)?;
				e_2.host = Some(node);
				*index += 1;
				Ok(VNode::Element(e_2))
			}

			(VNode::Fragment(mut f_1), VNode::Fragment(mut f_2)) => {
				let span = trace_span!("Diffing fragment", len_1 = f_1.children.len(), len_2 = f_2.children.len());
				let _enter = span.enter();
				f_1.host.take().ok_or(Error::PreconditionViolation(UNMOUNTED))?;

				f_2.children = self.patch_children(mem::take(&mut f_1.children), mem::take(&mut f_2.children), parent, *index, depth + 1)?;
				f_2.host = Some(parent.clone());
				let patched = VNode::Fragment(f_2);
				*index += patched.dom_len();
				Ok(patched)
			}

			// Mismatching nodes: Destroy and rebuild.
			(mut n_1, mut n_2) => {
				let span = trace_span!("Replace mismatching", n_1 = n_1.kind(), n_2 = n_2.kind());
				let _enter = span.enter();

				if let (VNode::Element(ElementNode { tag: tag_1, .. }), VNode::Element(ElementNode { tag: tag_2, .. })) = (&n_1, &n_2) {
					if tag_1.eq_ignore_ascii_case(tag_2) {
						warn!("Recreating element due to different tag name casing: {:?} -> {:?}", tag_1, tag_2);
					}
				}

				self.destroy_node(&mut n_1, depth)?;
				self.mount_at(&mut n_2, parent, *index, depth)?;
				*index += n_2.dom_len();
				Ok(n_2)
			}
		}
	}

	/// Reconciles two children lists whose host nodes start at `offset` in `parent`.
	fn patch_children(&self, old: Vec<VNode<H::Node>>, new: Vec<VNode<H::Node>>, parent: &H::Node, offset: usize, depth: usize) -> Result<Vec<VNode<H::Node>>> {
		if old.is_empty() && new.is_empty() {
			return Ok(new);
		}
		if unique_keys(&old).is_some() && unique_keys(&new).is_some() {
			self.patch_keyed_children(old, new, parent, offset, depth)
		} else {
			self.patch_indexed_children(old, new, parent, offset, depth)
		}
	}

	fn patch_indexed_children(&self, old: Vec<VNode<H::Node>>, new: Vec<VNode<H::Node>>, parent: &H::Node, offset: usize, depth: usize) -> Result<Vec<VNode<H::Node>>> {
		let span = trace_span!("Diffing children by index", old_len = old.len(), new_len = new.len());
		let _enter = span.enter();

		let mut cursor = offset;
		let mut old = old.into_iter();
		let mut patched = Vec::with_capacity(new.len());
		for n_2 in new {
			match old.next() {
				Some(n_1) => patched.push(self.patch_node(n_1, n_2, parent, &mut cursor, depth)?),
				None => {
					let mut n_2 = n_2;
					self.mount_at(&mut n_2, parent, cursor, depth)?;
					cursor += n_2.dom_len();
					patched.push(n_2);
				}
			}
		}
		for mut n_1 in old {
			self.destroy_node(&mut n_1, depth)?;
		}
		Ok(patched)
	}

	fn patch_keyed_children(&self, old: Vec<VNode<H::Node>>, new: Vec<VNode<H::Node>>, parent: &H::Node, offset: usize, depth: usize) -> Result<Vec<VNode<H::Node>>> {
		let span = trace_span!("Diffing keyed children", old_len = old.len(), new_len = new.len());
		let _enter = span.enter();

		let new_keys: HashSet<String> = new.iter().filter_map(VNode::key).map(str::to_owned).collect();
		let mut matched = HashMap::with_capacity(old.len());
		for mut n_1 in old {
			match n_1.key().filter(|key| new_keys.contains(*key)).map(str::to_owned) {
				Some(key) => {
					matched.insert(key, n_1);
				}
				None => self.destroy_node(&mut n_1, depth)?,
			}
		}

		let mut cursor = offset;
		let mut patched = Vec::with_capacity(new.len());
		for mut n_2 in new {
			match n_2.key().and_then(|key| matched.remove(key)) {
				Some(n_1) => {
					self.move_to(&n_1, parent, cursor)?;
					patched.push(self.patch_node(n_1, n_2, parent, &mut cursor, depth)?);
				}
				None => {
					self.mount_at(&mut n_2, parent, cursor, depth)?;
					cursor += n_2.dom_len();
					patched.push(n_2);
				}
			}
		}
		debug_assert!(matched.is_empty());
		Ok(patched)
	}

	/// Moves `vnode`'s host nodes so they start at `index` in `parent`. Nodes already in place aren't touched.
	fn move_to(&self, vnode: &VNode<H::Node>, parent: &H::Node, index: usize) -> Result<()> {
		let mut hosts = Vec::new();
		vnode.collect_top_level_hosts(&mut hosts);
		for (target, node) in (index..).zip(&hosts) {
			if self.host.index_of(parent, node) != Some(target) {
				trace!(?node, target, "Moving host node.");
				self.host.insert_child(parent, node, target)?;
			}
		}
		Ok(())
	}
}

/// The keys of `children` if every child is keyed and no key repeats.
fn unique_keys<N>(children: &[VNode<N>]) -> Option<HashSet<&str>> {
	let mut keys = HashSet::with_capacity(children.len());
	for child in children {
		if !keys.insert(child.key()?) {
			warn!(
				"Duplicate key {:?} among siblings. Falling back to reconciling by index.",
				loggable(&child.key())
			);
			return None;
		}
	}
	Some(keys)
}
