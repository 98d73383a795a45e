//! Builds mounted virtual trees from existing DOM content, so that an application can take over pre-rendered markup.
//!
//! Loaded elements carry their attributes but no listeners. The first patch attaches those.

use crate::{
	error::{Error, Result},
	vnode::{AttrValue, ClassSpec, ElementNode, FragmentNode, Props, TextNode, VNode},
};
use std::collections::BTreeMap;
use tracing::{instrument, trace};
use wasm_bindgen::JsCast;
use web_sys::{Attr, Element, NamedNodeMap, Node, NodeList, Text};

/// Loads the children of `parent` as a mounted fragment bound to `parent`.
///
/// # Errors
///
/// [`Error::UnsupportedNodeType`] for content other than elements and text (comments, for example),
/// and [`Error::DepthLimitExceeded`] for trees nested deeper than `depth_limit`.
#[instrument(skip(parent))]
pub fn load(parent: &Node, depth_limit: usize) -> Result<VNode<Node>> {
	Ok(VNode::Fragment(FragmentNode {
		key: None,
		children: load_child_nodes(&parent.child_nodes(), depth_limit)?,
		host: Some(parent.clone()),
	}))
}

pub fn load_child_nodes(child_nodes: &NodeList, depth_limit: usize) -> Result<Vec<VNode<Node>>> {
	if depth_limit == 0 {
		return Err(Error::DepthLimitExceeded(depth_limit));
	}
	(0..child_nodes.length())
		.filter_map(|i| child_nodes.get(i))
		.map(|child| {
			if let Some(element) = child.dyn_ref::<Element>() {
				load_element(element, depth_limit - 1)
			} else if let Some(text) = child.dyn_ref::<Text>() {
				Ok(VNode::Text(TextNode {
					value: text.data(),
					host: Some(child.clone()),
				}))
			} else {
				Err(Error::UnsupportedNodeType(child.node_name()))
			}
		})
		.collect()
}

pub fn load_element(element: &Element, depth_limit: usize) -> Result<VNode<Node>> {
	let node: &Node = element.as_ref();
	trace!(tag = %element.local_name(), "Loading element.");
	Ok(VNode::Element(ElementNode {
		tag: element.local_name(),
		props: load_props(&element.attributes()),
		children: load_child_nodes(&node.child_nodes(), depth_limit)?,
		host: Some(node.clone()),
		listeners: Some(BTreeMap::new()),
	}))
}

pub fn load_props(attributes: &NamedNodeMap) -> Props {
	let mut props = Props::new();
	for attribute in (0..attributes.length()).filter_map(|i| attributes.item(i)) {
		load_attribute(&attribute, &mut props)
	}
	props
}

fn load_attribute(attribute: &Attr, props: &mut Props) {
	let name = attribute.local_name();
	let value = attribute.value();
	match name.as_str() {
		"class" => props.class = ClassSpec::Single(value),
		"style" => {
			for declaration in value.split(';') {
				if let Some((property, value)) = declaration.split_once(':') {
					props.style.insert(property.trim().to_owned(), value.trim().to_owned());
				}
			}
		}
		_ => {
			props.attributes.insert(name, AttrValue::Text(value));
		}
	}
}
