//! Applying and patching element [`Props`] on host nodes.
//!
//! The class is always recomputed in full.
//! Plain attributes and inline styles that disappear between renders are left in place unless
//! [`Options::clear_removed_attributes`] or [`Options::clear_removed_styles`] is set.
//! An explicit [`AttrValue::Null`] always removes the attribute.

use crate::{
	error::Result,
	host::Host,
	objects::objects_diff,
	reconcile::{loggable, Options},
	vnode::{AttrValue, Handler, Props},
};
use std::collections::BTreeMap;
use tracing::{trace, warn};

/// Attributes with this prefix go through [`Host::set_attribute`] instead of being set as properties.
pub const DATA_ATTRIBUTE_PREFIX: &str = "data-";

/// Applies `props` to a freshly created host element and returns the listeners that were registered.
pub(crate) fn apply_props<H: Host>(host: &H, node: &H::Node, props: &Props) -> Result<BTreeMap<String, Handler>> {
	let class = props.class.joined();
	if !class.is_empty() {
		host.set_class(node, &class);
	}

	for (name, value) in &props.style {
		host.set_style(node, name, Some(value.as_str()));
	}

	for (name, value) in &props.attributes {
		set_attribute(host, node, name, value)?;
	}

	let mut listeners = BTreeMap::new();
	for (event, handler) in &props.listeners {
		host.add_listener(node, event, handler)?;
		listeners.insert(event.clone(), handler.clone());
	}
	Ok(listeners)
}

pub(crate) fn set_attribute<H: Host>(host: &H, node: &H::Node, name: &str, value: &AttrValue) -> Result<()> {
	trace!(name, value = ?loggable(value), "Setting attribute.");
	match value {
		AttrValue::Null => remove_attribute(host, node, name),
		_ if name.starts_with(DATA_ATTRIBUTE_PREFIX) => host.set_attribute(node, name, &value.to_attribute_string().unwrap_or_default())?,
		_ => host.set_property(node, name, value)?,
	}
	Ok(())
}

pub(crate) fn remove_attribute<H: Host>(host: &H, node: &H::Node, name: &str) {
	if let Err(error) = host.clear_property(node, name) {
		warn!(%error, name, "Failed to set property to null. Removing the attribute only.");
	}
	host.remove_attribute(node, name);
}

/// Brings a mounted element from `old` to `new` props.
///
/// `listeners` is the record of listeners registered on `node` and is updated in place.
pub(crate) fn patch_props<H: Host>(host: &H, node: &H::Node, old: &Props, new: &Props, listeners: &mut BTreeMap<String, Handler>, options: &Options) -> Result<()> {
	let attributes = objects_diff(&old.attributes, &new.attributes);
	if options.clear_removed_attributes {
		for name in attributes.removed {
			remove_attribute(host, node, name);
		}
	} else if !attributes.removed.is_empty() {
		trace!(count = attributes.removed.len(), "Leaving removed attributes in place.");
	}
	for name in attributes.added.into_iter().chain(attributes.updated) {
		set_attribute(host, node, name, &new.attributes[name])?;
	}

	if old.class != new.class {
		host.set_class(node, &new.class.joined());
	}

	let style = objects_diff(&old.style, &new.style);
	for name in style.added.into_iter().chain(style.updated) {
		host.set_style(node, name, Some(new.style[name].as_str()));
	}
	if options.clear_removed_styles {
		for name in style.removed {
			host.set_style(node, name, None);
		}
	} else if !style.removed.is_empty() {
		trace!(count = style.removed.len(), "Leaving removed style properties in place.");
	}

	patch_listeners(host, node, listeners, &new.listeners)
}

fn patch_listeners<H: Host>(host: &H, node: &H::Node, listeners: &mut BTreeMap<String, Handler>, new: &BTreeMap<String, Handler>) -> Result<()> {
	let diff = objects_diff(listeners, new);
	if diff.is_empty() {
		return Ok(());
	}
	let removed: Vec<String> = diff.removed.into_iter().chain(diff.updated.iter().copied()).cloned().collect();
	let added: Vec<String> = diff.added.into_iter().chain(diff.updated).cloned().collect();

	for event in removed {
		if let Some(handler) = listeners.remove(&event) {
			host.remove_listener(node, &event, &handler);
		}
	}
	for event in added {
		let handler = &new[&event];
		host.add_listener(node, &event, handler)?;
		listeners.insert(event, handler.clone());
	}
	Ok(())
}
