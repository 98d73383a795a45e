//! The primitive operations a rendering backend provides to the reconciler.

use crate::{
	error::HostError,
	vnode::{AttrValue, Handler},
};
use core::fmt::Debug;

/// A rendering backend.
///
/// All methods take `&self`: implementations are expected to be cheap handles with interior mutability,
/// so that event handlers can re-enter the application (and with it the reconciler) while the backend is shared.
pub trait Host {
	/// A handle to one node of the rendered tree. Cloning must not duplicate the node itself.
	type Node: Clone + Debug;

	fn create_text(&self, value: &str) -> Result<Self::Node, HostError>;
	fn create_element(&self, tag: &str) -> Result<Self::Node, HostError>;

	/// Replaces the content of a text node.
	fn set_text(&self, node: &Self::Node, value: &str);

	/// The generic attribute primitive, used for `data-*` attributes.
	fn set_attribute(&self, node: &Self::Node, name: &str, value: &str) -> Result<(), HostError>;
	fn remove_attribute(&self, node: &Self::Node, name: &str);

	/// Sets a direct property of the host node.
	fn set_property(&self, node: &Self::Node, name: &str, value: &AttrValue) -> Result<(), HostError>;

	/// Sets a direct property to null. Backends may refuse this for some properties.
	fn clear_property(&self, node: &Self::Node, name: &str) -> Result<(), HostError>;

	/// Replaces the whole class list.
	fn set_class(&self, node: &Self::Node, class: &str);

	/// Sets (`Some`) or clears (`None`) a single inline style property.
	fn set_style(&self, node: &Self::Node, name: &str, value: Option<&str>);

	fn add_listener(&self, node: &Self::Node, event: &str, handler: &Handler) -> Result<(), HostError>;
	fn remove_listener(&self, node: &Self::Node, event: &str, handler: &Handler);

	/// Inserts `node` before the child currently at `index` in `parent`, or appends it if there is no such child.
	///
	/// An already attached `node` is moved.
	fn insert_child(&self, parent: &Self::Node, node: &Self::Node, index: usize) -> Result<(), HostError>;

	/// Detaches `node` from its parent, if any.
	fn remove_node(&self, node: &Self::Node);

	fn index_of(&self, parent: &Self::Node, node: &Self::Node) -> Option<usize>;
	fn child_count(&self, parent: &Self::Node) -> usize;

	/// Whether children can be inserted into `node` at all.
	fn can_have_children(&self, node: &Self::Node) -> bool;
}
