#![cfg(target_arch = "wasm32")]

use std::{cell::Cell, rc::Rc};
use vdom_runtime::{children, element, fragment, text, vnode::Props, Reconciler};
use wasm_bindgen::JsCast;
use wasm_bindgen_test::{wasm_bindgen_test, wasm_bindgen_test_configure};
use web_sys::{Element, HtmlElement};

wasm_bindgen_test_configure!(run_in_browser);

use web_body_::*;

#[wasm_bindgen_test]
fn mount_patch_destroy() {
	let (host, container) = host_and_container();
	let reconciler = Reconciler::new(host);
	let parent = as_node(&container);

	let vdom = reconciler
		.patch(
			None,
			fragment(children![
				element("p", Props::new().class("a").attr("id", "first").attr("data-role", "greeting"), children!["Hello"]),
				text("World"),
			]),
			parent,
		)
		.unwrap();
	let p = vdom.children()[0].host_node().unwrap().clone().dyn_into::<Element>().unwrap();
	assert_eq!(p.class_name(), "a");
	assert_eq!(p.id(), "first");
	assert_eq!(p.get_attribute("data-role").as_deref(), Some("greeting"));
	assert_eq!(container.text_content().as_deref(), Some("HelloWorld"));

	let mut vdom = reconciler
		.patch(
			Some(vdom),
			fragment(children![element("p", Props::new().class("b").attr("data-role", "farewell"), children!["Goodbye"]), text("World")]),
			parent,
		)
		.unwrap();
	let patched = vdom.children()[0].host_node().unwrap();
	assert!(patched.is_same_node(Some(p.as_ref())));
	assert_eq!(p.class_name(), "b");
	assert_eq!(p.get_attribute("data-role").as_deref(), Some("farewell"));
	assert_eq!(p.id(), "first");
	assert_eq!(container.text_content().as_deref(), Some("GoodbyeWorld"));

	reconciler.destroy(&mut vdom).unwrap();
	assert_eq!(container.child_nodes().length(), 0);
}

#[wasm_bindgen_test]
fn style() {
	let (host, container) = host_and_container();
	let reconciler = Reconciler::new(host);

	let vdom = reconciler
		.patch(None, element("p", Props::new().style("color", "red"), children![]), as_node(&container))
		.unwrap();
	let p = vdom.host_node().unwrap().clone().dyn_into::<HtmlElement>().unwrap();
	assert_eq!(p.style().get_property_value("color").unwrap(), "red");
}

#[wasm_bindgen_test]
fn click() {
	let (host, container) = host_and_container();
	let reconciler = Reconciler::new(host);

	let clicks = Rc::new(Cell::new(0));
	let on_click = {
		let clicks = Rc::clone(&clicks);
		move |event: &vdom_runtime::vnode::Event| {
			assert!(event.raw::<web_sys::Event>().is_some());
			clicks.set(clicks.get() + 1)
		}
	};
	let mut vdom = reconciler
		.patch(None, element("button", Props::new().on("click", on_click), children!["Click me!"]), as_node(&container))
		.unwrap();
	assert_eq!(reconciler.host().listener_closure_count(), 1);

	let button = vdom.host_node().unwrap().clone().dyn_into::<HtmlElement>().unwrap();
	button.click();
	assert_eq!(clicks.get(), 1);

	reconciler.destroy(&mut vdom).unwrap();
	assert_eq!(reconciler.host().listener_closure_count(), 0);
	button.click();
	assert_eq!(clicks.get(), 1);
}

#[wasm_bindgen_test]
fn keyed_reorder() {
	let (host, container) = host_and_container();
	let reconciler = Reconciler::new(host);
	let list = |keys: &[&str]| {
		element(
			"ul",
			Props::new(),
			keys.iter().map(|&key| vdom_runtime::vnode::Child::Node(element("li", Props::new(), children![key]).with_key(key))),
		)
	};

	let vdom = reconciler.patch(None, list(&["a", "b", "c"]), as_node(&container)).unwrap();
	let before: Vec<_> = vdom.children().iter().map(|li| li.host_node().unwrap().clone()).collect();

	let vdom = reconciler.patch(Some(vdom), list(&["c", "b", "a"]), as_node(&container)).unwrap();
	assert_eq!(container.text_content().as_deref(), Some("cba"));
	for (li, old) in vdom.children().iter().zip(before.iter().rev()) {
		assert!(li.host_node().unwrap().is_same_node(Some(old)));
	}
}
