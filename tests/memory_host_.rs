#![allow(dead_code)]

use std::sync::Once;
use vdom_runtime::{
	memory::{MemoryHost, NodeId},
	VNode,
};

pub fn init_log() {
	static INIT: Once = Once::new();
	INIT.call_once(|| {
		// Another test binary may have installed a subscriber already.
		let _ = tracing_subscriber::fmt().with_max_level(tracing::Level::TRACE).with_test_writer().try_init();
	});
}

/// A fresh host with an empty root element.
pub fn host_and_root() -> (MemoryHost, NodeId) {
	init_log();
	let host = MemoryHost::new();
	let root = host.create_root();
	(host, root)
}

pub fn host_of(vnode: &VNode<NodeId>) -> NodeId {
	*vnode.host_node().expect("Expected a mounted node.")
}

/// Whether `vnode` and all of its descendants have released their host node.
pub fn fully_destroyed(vnode: &VNode<NodeId>) -> bool {
	!vnode.is_mounted() && vnode.children().iter().all(fully_destroyed)
}

/// Whether `vnode` and all of its descendants are bound to a host node.
pub fn fully_mounted(vnode: &VNode<NodeId>) -> bool {
	vnode.is_mounted() && vnode.children().iter().all(fully_mounted)
}
