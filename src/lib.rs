#![doc(html_root_url = "https://docs.rs/vdom-runtime/0.0.1")]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

//! A minimal virtual DOM runtime.
//!
//! Describe the UI as a tree of [`VNode`]s built with [`element`], [`text`] and [`fragment`],
//! [mount](`Reconciler::mount`) it once and then [patch](`Reconciler::patch`) it with each new tree.
//! Only the differences are applied to the host tree.
//!
//! The host rendering backend is pluggable through the [`Host`] trait.
//! [`memory::MemoryHost`] keeps everything in memory, [`web::WebHost`] renders into a browser DOM.

#[cfg(doctest)]
pub mod readme {
	doc_comment::doctest!("../README.md");
}

pub mod app;
mod bindings;
pub mod dispatcher;
pub mod error;
pub mod host;
pub mod load;
pub mod memory;
pub mod objects;
pub mod props;
pub mod reconcile;
pub mod vnode;
pub mod web;

pub use crate::{
	app::App,
	error::{Error, HostError, Result},
	host::Host,
	reconcile::{Options, Reconciler},
	vnode::{element, fragment, text, VNode},
};
