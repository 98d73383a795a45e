//! A [`Host`] backend that renders into a browser DOM through [`web_sys`].
//!
//! Event listeners are registered as one [`Closure`] per [`Handler`], reference-counted across
//! all elements and event names it is bound to, and freed once the last binding is removed.
//!
//! # Safety
//!
//! Listener closures are memory-safe, including interactions with misbehaving JavaScript code.
//! However, listeners that are still attached when the [`WebHost`] is dropped will start throwing errors into JavaScript.

use crate::{
	bindings::{Bindings, Unbound},
	error::HostError,
	host::Host,
	vnode::{AttrValue, Event, Handler, HandlerId},
};
use core::{
	cell::RefCell,
	convert::TryFrom,
	fmt::{self, Debug, Formatter},
};
use js_sys::Reflect;
use tracing::{trace, warn};
use wasm_bindgen::{closure::Closure, JsCast, JsValue};
use web_sys::{Document, Element, HtmlInputElement, Node};

type ListenerClosure = Closure<dyn Fn(web_sys::Event)>;

/// Renders into the DOM of one [`Document`].
pub struct WebHost {
	document: Document,
	listener_closures: RefCell<Bindings<HandlerId, ListenerClosure>>,
}

impl Debug for WebHost {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("WebHost")
			.field("document", &self.document)
			.field("listener_closures", &self.listener_closures.borrow().len())
			.finish()
	}
}

impl WebHost {
	#[must_use]
	pub fn new(document: Document) -> Self {
		Self {
			document,
			listener_closures: RefCell::new(Bindings::new()),
		}
	}

	/// Uses the document of the global `window`.
	///
	/// # Errors
	///
	/// Iff there is no `window` or it has no document.
	pub fn from_window() -> Result<Self, HostError> {
		web_sys::window()
			.and_then(|window| window.document())
			.map(Self::new)
			.ok_or_else(|| HostError::new("find document", "no global `window.document`"))
	}

	#[must_use]
	pub fn document(&self) -> &Document {
		&self.document
	}

	/// How many distinct [`Handler`]s currently have a JavaScript closure.
	#[must_use]
	pub fn listener_closure_count(&self) -> usize {
		self.listener_closures.borrow().len()
	}
}

fn js_error(operation: &'static str) -> impl FnOnce(JsValue) -> HostError {
	move |error| HostError::new(operation, format!("{:?}", error))
}

fn element<'a>(node: &'a Node, operation: &'static str) -> Result<&'a Element, HostError> {
	node.dyn_ref::<Element>().ok_or_else(|| HostError::new(operation, format!("{:?} is not an element", node)))
}

fn to_js(value: &AttrValue) -> JsValue {
	match value {
		AttrValue::Null => JsValue::NULL,
		AttrValue::Bool(value) => JsValue::from_bool(*value),
		AttrValue::Number(value) => JsValue::from_f64(*value),
		AttrValue::Text(value) => JsValue::from_str(value),
	}
}

fn to_event(event: web_sys::Event) -> Event {
	let mut converted = Event::new(event.type_());
	if let Some(input) = event.target().and_then(|target| target.dyn_into::<HtmlInputElement>().ok()) {
		converted = converted.with_value(input.value());
	}
	converted.with_raw(event)
}

impl Host for WebHost {
	type Node = Node;

	fn create_text(&self, value: &str) -> Result<Node, HostError> {
		Ok(self.document.create_text_node(value).into())
	}

	fn create_element(&self, tag: &str) -> Result<Node, HostError> {
		self.document.create_element(tag).map(Into::into).map_err(js_error("create element"))
	}

	fn set_text(&self, node: &Node, value: &str) {
		node.set_text_content(Some(value))
	}

	fn set_attribute(&self, node: &Node, name: &str, value: &str) -> Result<(), HostError> {
		element(node, "set attribute")?.set_attribute(name, value).map_err(js_error("set attribute"))
	}

	fn remove_attribute(&self, node: &Node, name: &str) {
		if let Some(element) = node.dyn_ref::<Element>() {
			if let Err(error) = element.remove_attribute(name) {
				warn!(name, ?error, "Failed to remove attribute.");
			}
		}
	}

	fn set_property(&self, node: &Node, name: &str, value: &AttrValue) -> Result<(), HostError> {
		Reflect::set(node, &JsValue::from_str(name), &to_js(value)).map(drop).map_err(js_error("set property"))
	}

	fn clear_property(&self, node: &Node, name: &str) -> Result<(), HostError> {
		Reflect::set(node, &JsValue::from_str(name), &JsValue::NULL).map(drop).map_err(js_error("clear property"))
	}

	fn set_class(&self, node: &Node, class: &str) {
		if let Some(element) = node.dyn_ref::<Element>() {
			element.set_class_name(class)
		}
	}

	fn set_style(&self, node: &Node, name: &str, value: Option<&str>) {
		// Same as `element.style[name] = value`, which accepts camelCase names.
		let style = match Reflect::get(node, &JsValue::from_str("style")) {
			Ok(style) if style.is_object() => style,
			_ => return warn!(name, "Node has no inline style."),
		};
		let value = value.map_or(JsValue::NULL, JsValue::from_str);
		if let Err(error) = Reflect::set(&style, &JsValue::from_str(name), &value) {
			warn!(name, ?error, "Failed to set style property.");
		}
	}

	fn add_listener(&self, node: &Node, event: &str, handler: &Handler) -> Result<(), HostError> {
		let mut listener_closures = self.listener_closures.borrow_mut();
		let closure = listener_closures
			.bind(handler.id(), || {
				trace!(handler = ?handler.id(), "Creating listener closure.");
				let handler = handler.clone();
				Closure::wrap(Box::new(move |event: web_sys::Event| handler.call(&to_event(event))) as Box<dyn Fn(web_sys::Event)>)
			})
			.map_err(|_| HostError::new("add listener", "too many (more than 65k) active bindings of the same handler"))?;
		let added = node
			.add_event_listener_with_callback(event, closure.as_ref().unchecked_ref())
			.map_err(js_error("add listener"));
		if added.is_err() {
			listener_closures.unbind(&handler.id());
		}
		added
	}

	fn remove_listener(&self, node: &Node, event: &str, handler: &Handler) {
		let mut listener_closures = self.listener_closures.borrow_mut();
		match listener_closures.get(&handler.id()) {
			Some(closure) => {
				if let Err(error) = node.remove_event_listener_with_callback(event, closure.as_ref().unchecked_ref()) {
					warn!(event, ?error, "Failed to remove event listener.");
				}
			}
			None => return warn!(event, handler = ?handler.id(), "No closure found for handler."),
		}

		if let Unbound::Released(closure) = listener_closures.unbind(&handler.id()) {
			trace!(handler = ?handler.id(), "Freeing listener closure.");
			drop(closure);
		}
	}

	fn insert_child(&self, parent: &Node, node: &Node, index: usize) -> Result<(), HostError> {
		let reference = u32::try_from(index).ok().and_then(|index| parent.child_nodes().get(index));
		if reference.as_ref().map_or(false, |reference| reference.is_same_node(Some(node))) {
			return Ok(());
		}
		parent.insert_before(node, reference.as_ref()).map(drop).map_err(js_error("insert child"))
	}

	fn remove_node(&self, node: &Node) {
		if let Some(parent) = node.parent_node() {
			if let Err(error) = parent.remove_child(node) {
				warn!(?error, "Failed to remove node.");
			}
		}
	}

	fn index_of(&self, parent: &Node, node: &Node) -> Option<usize> {
		let child_nodes = parent.child_nodes();
		(0..child_nodes.length())
			.position(|i| child_nodes.get(i).map_or(false, |child| child.is_same_node(Some(node))))
	}

	fn child_count(&self, parent: &Node) -> usize {
		parent.child_nodes().length() as usize
	}

	fn can_have_children(&self, node: &Node) -> bool {
		matches!(node.node_type(), Node::ELEMENT_NODE | Node::DOCUMENT_FRAGMENT_NODE)
	}
}
