//! The virtual node model: [`VNode`] and its three variants, [`Props`], [`Handler`]s and the constructor functions.
//!
//! Trees are built programmatically:
//!
//! ```
//! use vdom_runtime::{children, element, fragment, text, vnode::Props};
//!
//! let vdom: vdom_runtime::VNode<()> = fragment(children![
//! 	element("h1", Props::new().class("title"), children!["Hello!"]),
//! 	element("p", Props::new().attr("id", "description"), children![text("World")]),
//! 	None,
//! ]);
//! assert_eq!(vdom.children().len(), 2);
//! ```

use core::{
	any::Any,
	fmt::{self, Debug, Formatter},
	hash::{Hash, Hasher},
	sync::atomic::{AtomicU64, Ordering},
};
use std::{borrow::Cow, collections::BTreeMap, rc::Rc};
use tracing::warn;

/// A virtual node, generic over the host node handle `N` it binds to once mounted.
#[derive(Debug)]
pub enum VNode<N> {
	Text(TextNode<N>),
	Element(ElementNode<N>),
	Fragment(FragmentNode<N>),
}

#[derive(Debug)]
pub struct TextNode<N> {
	pub value: String,
	pub(crate) host: Option<N>,
}

#[derive(Debug)]
pub struct ElementNode<N> {
	pub tag: String,
	pub props: Props,
	pub children: Vec<VNode<N>>,
	pub(crate) host: Option<N>,
	pub(crate) listeners: Option<BTreeMap<String, Handler>>,
}

impl<N> ElementNode<N> {
	/// The listeners actually registered on the host element, if mounted.
	#[must_use]
	pub fn listeners(&self) -> Option<&BTreeMap<String, Handler>> {
		self.listeners.as_ref()
	}
}

/// Children without a host node of their own.
///
/// Once mounted, the host reference is the parent host node the children were inserted into.
#[derive(Debug)]
pub struct FragmentNode<N> {
	pub key: Option<String>,
	pub children: Vec<VNode<N>>,
	pub(crate) host: Option<N>,
}

impl<N> VNode<N> {
	/// Sets the reordering key of an element or fragment.
	///
	/// Text nodes can't be keyed. Wrap them in a fragment instead.
	#[must_use]
	pub fn with_key(mut self, key: impl Into<String>) -> Self {
		match &mut self {
			VNode::Text(_) => warn!("Ignoring key on a text node. Wrap it in a keyed fragment instead."),
			VNode::Element(element) => element.props.key = Some(key.into()),
			VNode::Fragment(fragment) => fragment.key = Some(key.into()),
		}
		self
	}

	#[must_use]
	pub fn key(&self) -> Option<&str> {
		match self {
			VNode::Text(_) => None,
			VNode::Element(element) => element.props.key.as_deref(),
			VNode::Fragment(fragment) => fragment.key.as_deref(),
		}
	}

	/// The bound host node. For fragments, this is the parent host node.
	#[must_use]
	pub fn host_node(&self) -> Option<&N> {
		match self {
			VNode::Text(text) => text.host.as_ref(),
			VNode::Element(element) => element.host.as_ref(),
			VNode::Fragment(fragment) => fragment.host.as_ref(),
		}
	}

	#[must_use]
	pub fn is_mounted(&self) -> bool {
		self.host_node().is_some()
	}

	#[must_use]
	pub fn children(&self) -> &[VNode<N>] {
		match self {
			VNode::Text(_) => &[],
			VNode::Element(element) => &element.children,
			VNode::Fragment(fragment) => &fragment.children,
		}
	}

	/// How many host nodes this virtual node occupies in its parent host node.
	#[must_use]
	pub fn dom_len(&self) -> usize {
		match self {
			VNode::Text(_) | VNode::Element(_) => 1,
			VNode::Fragment(fragment) => fragment.children.iter().map(VNode::dom_len).sum(),
		}
	}

	pub(crate) fn kind(&self) -> &'static str {
		match self {
			VNode::Text(_) => "text",
			VNode::Element(_) => "element",
			VNode::Fragment(_) => "fragment",
		}
	}
}

impl<N: Clone> VNode<N> {
	/// Appends the host nodes this virtual node occupies in its parent, in order.
	pub(crate) fn collect_top_level_hosts(&self, hosts: &mut Vec<N>) {
		match self {
			VNode::Text(TextNode { host, .. }) | VNode::Element(ElementNode { host, .. }) => hosts.extend(host.iter().cloned()),
			VNode::Fragment(fragment) => {
				for child in &fragment.children {
					child.collect_top_level_hosts(hosts)
				}
			}
		}
	}
}

/// Anything that may appear in a children list before normalization.
#[derive(Debug)]
pub enum Child<N> {
	Node(VNode<N>),
	Empty,
}

impl<N> From<VNode<N>> for Child<N> {
	fn from(node: VNode<N>) -> Self {
		Child::Node(node)
	}
}

impl<N> From<Option<VNode<N>>> for Child<N> {
	fn from(node: Option<VNode<N>>) -> Self {
		node.map_or(Child::Empty, Child::Node)
	}
}

impl<N> From<&str> for Child<N> {
	fn from(value: &str) -> Self {
		Child::Node(text(value))
	}
}

impl<N> From<String> for Child<N> {
	fn from(value: String) -> Self {
		Child::Node(text(value))
	}
}

impl<N> From<()> for Child<N> {
	fn from((): ()) -> Self {
		Child::Empty
	}
}

/// Builds a `Vec` of [`Child`]ren from a mix of nodes, strings and `Option`s.
#[macro_export]
macro_rules! children {
	($($child:expr),* $(,)?) => {{
		let children: ::std::vec::Vec<$crate::vnode::Child<_>> = ::std::vec![$($crate::vnode::Child::from($child)),*];
		children
	}};
}

fn normalize<N>(children: impl IntoIterator<Item = Child<N>>) -> Vec<VNode<N>> {
	children
		.into_iter()
		.filter_map(|child| match child {
			Child::Node(node) => Some(node),
			Child::Empty => None,
		})
		.collect()
}

/// Creates an element node. The tag isn't validated here; the host backend rejects invalid ones at mount time.
pub fn element<N>(tag: impl Into<String>, props: Props, children: impl IntoIterator<Item = Child<N>>) -> VNode<N> {
	VNode::Element(ElementNode {
		tag: tag.into(),
		props,
		children: normalize(children),
		host: None,
		listeners: None,
	})
}

/// Creates a text node. The value is not escaped.
pub fn text<N>(value: impl Into<String>) -> VNode<N> {
	VNode::Text(TextNode { value: value.into(), host: None })
}

pub fn fragment<N>(children: impl IntoIterator<Item = Child<N>>) -> VNode<N> {
	VNode::Fragment(FragmentNode {
		key: None,
		children: normalize(children),
		host: None,
	})
}

/// Element properties, with the reserved `class`, `style` and `on` keys split out.
#[derive(Debug, Default)]
pub struct Props {
	pub attributes: BTreeMap<String, AttrValue>,
	pub class: ClassSpec,
	pub style: BTreeMap<String, String>,
	pub listeners: BTreeMap<String, Handler>,
	pub key: Option<String>,
}

impl Props {
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// Sets a plain attribute. Names starting with `data-` are set as host attributes, all others as host properties.
	#[must_use]
	pub fn attr(mut self, name: impl Into<String>, value: impl Into<AttrValue>) -> Self {
		self.attributes.insert(name.into(), value.into());
		self
	}

	#[must_use]
	pub fn class(mut self, class: impl Into<String>) -> Self {
		self.class = ClassSpec::Single(class.into());
		self
	}

	#[must_use]
	pub fn classes<S: Into<String>>(mut self, classes: impl IntoIterator<Item = S>) -> Self {
		self.class = ClassSpec::List(classes.into_iter().map(Into::into).collect());
		self
	}

	#[must_use]
	pub fn style(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.style.insert(name.into(), value.into());
		self
	}

	#[must_use]
	pub fn on(self, event: impl Into<String>, callback: impl Fn(&Event) + 'static) -> Self {
		self.listener(event, Handler::new(callback))
	}

	/// Like [`Props::on`], but keeps the identity of an existing [`Handler`].
	#[must_use]
	pub fn listener(mut self, event: impl Into<String>, handler: Handler) -> Self {
		self.listeners.insert(event.into(), handler);
		self
	}

	#[must_use]
	pub fn key(mut self, key: impl Into<String>) -> Self {
		self.key = Some(key.into());
		self
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassSpec {
	None,
	Single(String),
	List(Vec<String>),
}

impl Default for ClassSpec {
	fn default() -> Self {
		ClassSpec::None
	}
}

impl ClassSpec {
	/// The full class attribute value.
	#[must_use]
	pub fn joined(&self) -> Cow<'_, str> {
		match self {
			ClassSpec::None => Cow::Borrowed(""),
			ClassSpec::Single(class) => Cow::Borrowed(class),
			ClassSpec::List(classes) => Cow::Owned(classes.join(" ")),
		}
	}
}

/// A plain attribute value. [`AttrValue::Null`] removes the attribute.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
	Null,
	Bool(bool),
	Number(f64),
	Text(String),
}

impl AttrValue {
	/// The value as it appears in markup, or `None` for [`AttrValue::Null`].
	#[must_use]
	pub fn to_attribute_string(&self) -> Option<String> {
		match self {
			AttrValue::Null => None,
			AttrValue::Bool(value) => Some(value.to_string()),
			AttrValue::Number(value) => Some(value.to_string()),
			AttrValue::Text(value) => Some(value.clone()),
		}
	}
}

impl From<&str> for AttrValue {
	fn from(value: &str) -> Self {
		AttrValue::Text(value.to_owned())
	}
}

impl From<String> for AttrValue {
	fn from(value: String) -> Self {
		AttrValue::Text(value)
	}
}

impl From<bool> for AttrValue {
	fn from(value: bool) -> Self {
		AttrValue::Bool(value)
	}
}

impl From<f64> for AttrValue {
	fn from(value: f64) -> Self {
		AttrValue::Number(value)
	}
}

impl From<i32> for AttrValue {
	fn from(value: i32) -> Self {
		AttrValue::Number(value.into())
	}
}

impl<T: Into<AttrValue>> From<Option<T>> for AttrValue {
	fn from(value: Option<T>) -> Self {
		value.map_or(AttrValue::Null, Into::into)
	}
}

/// An event delivered to a [`Handler`] by the host backend.
#[derive(Clone)]
pub struct Event {
	name: String,
	value: Option<String>,
	raw: Option<Rc<dyn Any>>,
}

impl Event {
	#[must_use]
	pub fn new(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			value: None,
			raw: None,
		}
	}

	/// Attaches the current value of the event target, like an `<input>`'s text.
	#[must_use]
	pub fn with_value(mut self, value: impl Into<String>) -> Self {
		self.value = Some(value.into());
		self
	}

	/// Attaches the backend's own event object.
	#[must_use]
	pub fn with_raw(mut self, raw: impl Any) -> Self {
		self.raw = Some(Rc::new(raw));
		self
	}

	#[must_use]
	pub fn name(&self) -> &str {
		&self.name
	}

	#[must_use]
	pub fn value(&self) -> Option<&str> {
		self.value.as_deref()
	}

	#[must_use]
	pub fn raw<T: Any>(&self) -> Option<&T> {
		self.raw.as_ref().and_then(|raw| raw.downcast_ref())
	}
}

impl Debug for Event {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("Event")
			.field("name", &self.name)
			.field("value", &self.value)
			.field("raw", &self.raw.is_some())
			.finish()
	}
}

/// Identifies one [`Handler`] registration across clones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandlerId(u64);

/// An event callback. Equality is by identity: clones compare equal, separately created handlers never do.
#[derive(Clone)]
pub struct Handler {
	id: HandlerId,
	callback: Rc<dyn Fn(&Event)>,
}

impl Handler {
	pub fn new(callback: impl Fn(&Event) + 'static) -> Self {
		static NEXT_ID: AtomicU64 = AtomicU64::new(0);
		Self {
			id: HandlerId(NEXT_ID.fetch_add(1, Ordering::Relaxed)),
			callback: Rc::new(callback),
		}
	}

	#[must_use]
	pub fn id(&self) -> HandlerId {
		self.id
	}

	pub fn call(&self, event: &Event) {
		(self.callback)(event)
	}
}

impl PartialEq for Handler {
	fn eq(&self, other: &Self) -> bool {
		self.id == other.id
	}
}
impl Eq for Handler {}

impl Hash for Handler {
	fn hash<H: Hasher>(&self, state: &mut H) {
		self.id.hash(state)
	}
}

impl Debug for Handler {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_tuple("Handler").field(&self.id.0).finish()
	}
}
