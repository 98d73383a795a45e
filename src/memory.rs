//! An in-memory [`Host`] backend.
//!
//! Nodes live in an arena and are never freed, so a [`NodeId`] stays valid for the lifetime of its [`MemoryHost`].
//! Every mutation is recorded, which makes it easy to assert how much work a patch did.

use crate::{
	error::HostError,
	host::Host,
	vnode::{AttrValue, Event, Handler},
};
use hashbrown::HashSet;
use std::{cell::RefCell, collections::BTreeMap, fmt::Write as _, rc::Rc};
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// One primitive operation applied to a [`MemoryHost`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
	CreateText(NodeId),
	CreateElement(NodeId, String),
	SetText(NodeId),
	SetAttribute(NodeId, String),
	RemoveAttribute(NodeId, String),
	SetProperty(NodeId, String),
	ClearProperty(NodeId, String),
	SetClass(NodeId),
	SetStyle(NodeId, String),
	AddListener(NodeId, String),
	RemoveListener(NodeId, String),
	Insert { parent: NodeId, node: NodeId, index: usize },
	Remove(NodeId),
}

impl Mutation {
	/// Whether this mutation creates, attaches or detaches a node.
	#[must_use]
	pub fn is_structural(&self) -> bool {
		matches!(self, Mutation::CreateText(_) | Mutation::CreateElement(..) | Mutation::Insert { .. } | Mutation::Remove(_))
	}
}

/// A cheap, cloneable handle to an in-memory render tree.
#[derive(Debug, Clone, Default)]
pub struct MemoryHost {
	tree: Rc<RefCell<Tree>>,
}

#[derive(Debug, Default)]
struct Tree {
	nodes: Vec<NodeData>,
	guarded_properties: HashSet<String>,
	mutations: Vec<Mutation>,
}

#[derive(Debug)]
struct NodeData {
	kind: Kind,
	parent: Option<NodeId>,
	children: Vec<NodeId>,
}

#[derive(Debug)]
enum Kind {
	Text(String),
	Element(ElementData),
}

#[derive(Debug, Default)]
struct ElementData {
	tag: String,
	attributes: BTreeMap<String, String>,
	properties: BTreeMap<String, AttrValue>,
	class: String,
	style: BTreeMap<String, String>,
	listeners: Vec<(String, Handler)>,
}

impl Tree {
	fn push(&mut self, kind: Kind) -> NodeId {
		let id = NodeId(self.nodes.len());
		self.nodes.push(NodeData {
			kind,
			parent: None,
			children: Vec::new(),
		});
		id
	}

	fn record(&mut self, mutation: Mutation) {
		trace!(?mutation, "Applying host mutation.");
		self.mutations.push(mutation)
	}

	fn element_mut(&mut self, id: NodeId) -> Option<&mut ElementData> {
		match &mut self.nodes.get_mut(id.0)?.kind {
			Kind::Element(element) => Some(element),
			Kind::Text(_) => None,
		}
	}

	fn element(&self, id: NodeId) -> Option<&ElementData> {
		match &self.nodes.get(id.0)?.kind {
			Kind::Element(element) => Some(element),
			Kind::Text(_) => None,
		}
	}

	fn detach(&mut self, node: NodeId) {
		if let Some(parent) = self.nodes.get_mut(node.0).and_then(|node| node.parent.take()) {
			self.nodes[parent.0].children.retain(|&child| child != node);
		}
	}

	fn write_html(&self, id: NodeId, html: &mut String) {
		match &self.nodes[id.0].kind {
			Kind::Text(text) => html.push_str(text),
			Kind::Element(element) => {
				let mut attributes: BTreeMap<&str, String> = BTreeMap::new();
				for (name, value) in &element.properties {
					match value {
						AttrValue::Null | AttrValue::Bool(false) => {}
						AttrValue::Bool(true) => {
							attributes.insert(name, String::new());
						}
						AttrValue::Number(_) | AttrValue::Text(_) => {
							attributes.insert(name, value.to_attribute_string().unwrap_or_default());
						}
					}
				}
				for (name, value) in &element.attributes {
					attributes.insert(name, value.clone());
				}
				if !element.class.is_empty() {
					attributes.insert("class", element.class.clone());
				}
				if !element.style.is_empty() {
					let style = element.style.iter().map(|(name, value)| format!("{}: {};", name, value)).collect::<Vec<_>>().join(" ");
					attributes.insert("style", style);
				}

				html.push('<');
				html.push_str(&element.tag);
				for (name, value) in attributes {
					if value.is_empty() {
						let _ = write!(html, " {}", name);
					} else {
						let _ = write!(html, " {}=\"{}\"", name, value);
					}
				}
				html.push('>');
				self.write_children_html(id, html);
				let _ = write!(html, "</{}>", element.tag);
			}
		}
	}

	fn write_children_html(&self, id: NodeId, html: &mut String) {
		for &child in self.nodes.get(id.0).map_or(&[][..], |node| node.children.as_slice()) {
			self.write_html(child, html)
		}
	}
}

impl MemoryHost {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// Creates a detached element to mount into, without recording it as a mutation.
	#[must_use]
	pub fn create_root(&self) -> NodeId {
		self.tree.borrow_mut().push(Kind::Element(ElementData {
			tag: "body".to_owned(),
			..ElementData::default()
		}))
	}

	/// Makes [`Host::clear_property`] fail for `name`, like browsers do for some reflected properties.
	pub fn guard_property(&self, name: impl Into<String>) {
		self.tree.borrow_mut().guarded_properties.insert(name.into());
	}

	#[must_use]
	pub fn mutations(&self) -> Vec<Mutation> {
		self.tree.borrow().mutations.clone()
	}

	pub fn clear_mutations(&self) {
		self.tree.borrow_mut().mutations.clear()
	}

	/// Delivers `event` to every listener for its name on `node`, returning how many were called.
	///
	/// Handlers run after the tree borrow is released, so they may patch through this host.
	pub fn dispatch_event(&self, node: NodeId, event: &Event) -> usize {
		let handlers: Vec<Handler> = match self.tree.borrow().element(node) {
			Some(element) => element
				.listeners
				.iter()
				.filter(|(name, _)| name == event.name())
				.map(|(_, handler)| handler.clone())
				.collect(),
			None => Vec::new(),
		};
		for handler in &handlers {
			handler.call(event)
		}
		handlers.len()
	}

	#[must_use]
	pub fn children(&self, node: NodeId) -> Vec<NodeId> {
		self.tree.borrow().nodes.get(node.0).map(|node| node.children.clone()).unwrap_or_default()
	}

	#[must_use]
	pub fn parent(&self, node: NodeId) -> Option<NodeId> {
		self.tree.borrow().nodes.get(node.0).and_then(|node| node.parent)
	}

	#[must_use]
	pub fn tag(&self, node: NodeId) -> Option<String> {
		self.tree.borrow().element(node).map(|element| element.tag.clone())
	}

	#[must_use]
	pub fn text(&self, node: NodeId) -> Option<String> {
		match &self.tree.borrow().nodes.get(node.0)?.kind {
			Kind::Text(text) => Some(text.clone()),
			Kind::Element(_) => None,
		}
	}

	#[must_use]
	pub fn class(&self, node: NodeId) -> Option<String> {
		self.tree.borrow().element(node).map(|element| element.class.clone())
	}

	#[must_use]
	pub fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
		self.tree.borrow().element(node).and_then(|element| element.attributes.get(name).cloned())
	}

	#[must_use]
	pub fn property(&self, node: NodeId, name: &str) -> Option<AttrValue> {
		self.tree.borrow().element(node).and_then(|element| element.properties.get(name).cloned())
	}

	#[must_use]
	pub fn style(&self, node: NodeId, name: &str) -> Option<String> {
		self.tree.borrow().element(node).and_then(|element| element.style.get(name).cloned())
	}

	#[must_use]
	pub fn listener_count(&self, node: NodeId) -> usize {
		self.tree.borrow().element(node).map_or(0, |element| element.listeners.len())
	}

	/// Serializes the children of `node`. Properties are rendered like attributes.
	#[must_use]
	pub fn inner_html(&self, node: NodeId) -> String {
		let mut html = String::new();
		self.tree.borrow().write_children_html(node, &mut html);
		html
	}
}

impl Host for MemoryHost {
	type Node = NodeId;

	fn create_text(&self, value: &str) -> Result<NodeId, HostError> {
		let mut tree = self.tree.borrow_mut();
		let id = tree.push(Kind::Text(value.to_owned()));
		tree.record(Mutation::CreateText(id));
		Ok(id)
	}

	fn create_element(&self, tag: &str) -> Result<NodeId, HostError> {
		if tag.is_empty() || !tag.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
			return Err(HostError::new("create element", format!("invalid tag name {:?}", tag)));
		}
		let mut tree = self.tree.borrow_mut();
		let id = tree.push(Kind::Element(ElementData {
			tag: tag.to_owned(),
			..ElementData::default()
		}));
		tree.record(Mutation::CreateElement(id, tag.to_owned()));
		Ok(id)
	}

	fn set_text(&self, node: &NodeId, value: &str) {
		let mut tree = self.tree.borrow_mut();
		if let Some(NodeData { kind: Kind::Text(text), .. }) = tree.nodes.get_mut(node.0) {
			*text = value.to_owned();
		}
		tree.record(Mutation::SetText(*node));
	}

	fn set_attribute(&self, node: &NodeId, name: &str, value: &str) -> Result<(), HostError> {
		let mut tree = self.tree.borrow_mut();
		let element = tree.element_mut(*node).ok_or_else(|| HostError::new("set attribute", "not an element"))?;
		element.attributes.insert(name.to_owned(), value.to_owned());
		tree.record(Mutation::SetAttribute(*node, name.to_owned()));
		Ok(())
	}

	fn remove_attribute(&self, node: &NodeId, name: &str) {
		let mut tree = self.tree.borrow_mut();
		if let Some(element) = tree.element_mut(*node) {
			element.attributes.remove(name);
			element.properties.remove(name);
			if name == "class" {
				element.class.clear();
			}
		}
		tree.record(Mutation::RemoveAttribute(*node, name.to_owned()));
	}

	fn set_property(&self, node: &NodeId, name: &str, value: &AttrValue) -> Result<(), HostError> {
		let mut tree = self.tree.borrow_mut();
		let element = tree.element_mut(*node).ok_or_else(|| HostError::new("set property", "not an element"))?;
		element.properties.insert(name.to_owned(), value.clone());
		tree.record(Mutation::SetProperty(*node, name.to_owned()));
		Ok(())
	}

	fn clear_property(&self, node: &NodeId, name: &str) -> Result<(), HostError> {
		let mut tree = self.tree.borrow_mut();
		if tree.guarded_properties.contains(name) {
			return Err(HostError::new("clear property", format!("{:?} can't be set to null", name)));
		}
		let element = tree.element_mut(*node).ok_or_else(|| HostError::new("clear property", "not an element"))?;
		element.properties.remove(name);
		tree.record(Mutation::ClearProperty(*node, name.to_owned()));
		Ok(())
	}

	fn set_class(&self, node: &NodeId, class: &str) {
		let mut tree = self.tree.borrow_mut();
		if let Some(element) = tree.element_mut(*node) {
			element.class = class.to_owned();
		}
		tree.record(Mutation::SetClass(*node));
	}

	fn set_style(&self, node: &NodeId, name: &str, value: Option<&str>) {
		let mut tree = self.tree.borrow_mut();
		if let Some(element) = tree.element_mut(*node) {
			match value {
				Some(value) if !value.is_empty() => {
					element.style.insert(name.to_owned(), value.to_owned());
				}
				_ => {
					element.style.remove(name);
				}
			}
		}
		tree.record(Mutation::SetStyle(*node, name.to_owned()));
	}

	fn add_listener(&self, node: &NodeId, event: &str, handler: &Handler) -> Result<(), HostError> {
		let mut tree = self.tree.borrow_mut();
		let element = tree.element_mut(*node).ok_or_else(|| HostError::new("add listener", "not an element"))?;
		if !element.listeners.iter().any(|(name, h)| name == event && h == handler) {
			element.listeners.push((event.to_owned(), handler.clone()));
		}
		tree.record(Mutation::AddListener(*node, event.to_owned()));
		Ok(())
	}

	fn remove_listener(&self, node: &NodeId, event: &str, handler: &Handler) {
		let mut tree = self.tree.borrow_mut();
		if let Some(element) = tree.element_mut(*node) {
			element.listeners.retain(|(name, h)| !(name == event && h == handler));
		}
		tree.record(Mutation::RemoveListener(*node, event.to_owned()));
	}

	fn insert_child(&self, parent: &NodeId, node: &NodeId, index: usize) -> Result<(), HostError> {
		let mut tree = self.tree.borrow_mut();
		if tree.element(*parent).is_none() {
			return Err(HostError::new("insert child", "parent is not an element"));
		}
		if tree.nodes.get(node.0).is_none() {
			return Err(HostError::new("insert child", "unknown node"));
		}
		let reference = tree.nodes[parent.0].children.get(index).copied();
		if reference == Some(*node) {
			return Ok(());
		}
		tree.detach(*node);
		let children = &mut tree.nodes[parent.0].children;
		let position = reference.and_then(|reference| children.iter().position(|&child| child == reference)).unwrap_or(children.len());
		children.insert(position, *node);
		tree.nodes[node.0].parent = Some(*parent);
		tree.record(Mutation::Insert {
			parent: *parent,
			node: *node,
			index: position,
		});
		Ok(())
	}

	fn remove_node(&self, node: &NodeId) {
		let mut tree = self.tree.borrow_mut();
		tree.detach(*node);
		tree.record(Mutation::Remove(*node));
	}

	fn index_of(&self, parent: &NodeId, node: &NodeId) -> Option<usize> {
		self.tree.borrow().nodes.get(parent.0)?.children.iter().position(|child| child == node)
	}

	fn child_count(&self, parent: &NodeId) -> usize {
		self.tree.borrow().nodes.get(parent.0).map_or(0, |parent| parent.children.len())
	}

	fn can_have_children(&self, node: &NodeId) -> bool {
		self.tree.borrow().element(*node).is_some()
	}
}
