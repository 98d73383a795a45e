//! Command dispatch: named commands with a payload, subscribers per command and hooks that run after every command.
//!
//! A [`Dispatcher`] is a plain value. Each [`App`](`crate::app::App`) owns its own; there is no global instance.

use crate::error::{Error, Result};
use core::fmt::{self, Debug, Formatter};
use hashbrown::HashMap;
use std::{
	cell::RefCell,
	rc::{Rc, Weak},
};
use tracing::{trace, warn};

/// A command subscriber. Equality is by identity, so clones of one handler count as the same subscriber.
pub struct CommandHandler<P>(Rc<dyn Fn(&P)>);

impl<P> CommandHandler<P> {
	pub fn new(handler: impl Fn(&P) + 'static) -> Self {
		Self(Rc::new(handler))
	}

	fn is(&self, other: &Self) -> bool {
		core::ptr::eq(Rc::as_ptr(&self.0).cast::<u8>(), Rc::as_ptr(&other.0).cast::<u8>())
	}
}

impl<P> Clone for CommandHandler<P> {
	fn clone(&self) -> Self {
		Self(Rc::clone(&self.0))
	}
}

impl<P> Debug for CommandHandler<P> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_tuple("CommandHandler").field(&Rc::as_ptr(&self.0).cast::<u8>()).finish()
	}
}

type AfterHook = Rc<dyn Fn()>;

struct Registry<P> {
	subscribers: HashMap<String, Vec<CommandHandler<P>>>,
	after_hooks: Vec<AfterHook>,
}

/// A cheap, cloneable handle to a set of command subscriptions.
pub struct Dispatcher<P> {
	registry: Rc<RefCell<Registry<P>>>,
}

impl<P> Clone for Dispatcher<P> {
	fn clone(&self) -> Self {
		Self {
			registry: Rc::clone(&self.registry),
		}
	}
}

impl<P: 'static> Default for Dispatcher<P> {
	fn default() -> Self {
		Self::new()
	}
}

impl<P> Debug for Dispatcher<P> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		let registry = self.registry.borrow();
		f.debug_struct("Dispatcher")
			.field("commands", &registry.subscribers.keys().collect::<Vec<_>>())
			.field("after_hooks", &registry.after_hooks.len())
			.finish()
	}
}

impl<P: 'static> Dispatcher<P> {
	#[must_use]
	pub fn new() -> Self {
		Self {
			registry: Rc::new(RefCell::new(Registry {
				subscribers: HashMap::new(),
				after_hooks: Vec::new(),
			})),
		}
	}

	/// Registers `handler` for `command`.
	///
	/// Subscribing the same handler to the same command again has no effect and returns an inert [`Subscription`].
	pub fn subscribe(&self, command: impl Into<String>, handler: CommandHandler<P>) -> Subscription {
		let command = command.into();
		let mut registry = self.registry.borrow_mut();
		let handlers = registry.subscribers.entry(command.clone()).or_insert_with(Vec::new);
		if handlers.iter().any(|h| h.is(&handler)) {
			trace!(%command, "Handler is already subscribed.");
			return Subscription::inert();
		}
		handlers.push(handler.clone());

		let registry = Rc::downgrade(&self.registry);
		Subscription::new(move || {
			if let Some(registry) = Weak::upgrade(&registry) {
				if let Some(handlers) = registry.borrow_mut().subscribers.get_mut(&command) {
					handlers.retain(|h| !h.is(&handler));
				}
			}
		})
	}

	/// Registers `hook` to run after every dispatched command, whether or not it had subscribers.
	pub fn after_every_command(&self, hook: impl Fn() + 'static) -> Subscription {
		let hook: AfterHook = Rc::new(hook);
		self.registry.borrow_mut().after_hooks.push(Rc::clone(&hook));

		let registry = Rc::downgrade(&self.registry);
		Subscription::new(move || {
			if let Some(registry) = Weak::upgrade(&registry) {
				registry.borrow_mut().after_hooks.retain(|h| !Rc::ptr_eq(h, &hook));
			}
		})
	}

	/// Runs every subscriber of `command`, then every after-every-command hook.
	///
	/// # Errors
	///
	/// [`Error::HandlerNotFound`] if `command` has no subscribers. This is logged as a warning and is not fatal:
	/// the hooks still run.
	pub fn dispatch(&self, command: &str, payload: &P) -> Result<()> {
		let handlers = self.registry.borrow().subscribers.get(command).cloned().unwrap_or_default();
		let result = if handlers.is_empty() {
			warn!(command, "No handlers for command.");
			Err(Error::HandlerNotFound(command.to_owned()))
		} else {
			trace!(command, count = handlers.len(), "Dispatching command.");
			for handler in &handlers {
				(handler.0)(payload)
			}
			Ok(())
		};

		let after_hooks = self.registry.borrow().after_hooks.clone();
		for hook in &after_hooks {
			hook()
		}
		result
	}

	/// An [`Emitter`] for views to dispatch commands from event handlers.
	#[must_use]
	pub fn emitter(&self) -> Emitter<P> {
		Emitter { dispatcher: self.clone() }
	}
}

/// Undoes a subscription when [`Subscription::unsubscribe`] is called. Dropping it keeps the subscription.
#[must_use = "Dropping a `Subscription` keeps it active forever."]
pub struct Subscription(Option<Box<dyn FnOnce()>>);

impl Subscription {
	fn new(unsubscribe: impl FnOnce() + 'static) -> Self {
		Self(Some(Box::new(unsubscribe)))
	}

	fn inert() -> Self {
		Self(None)
	}

	pub fn unsubscribe(self) {
		if let Some(unsubscribe) = self.0 {
			unsubscribe()
		}
	}
}

impl Debug for Subscription {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_tuple("Subscription").field(&self.0.is_some()).finish()
	}
}

/// Dispatches commands on behalf of a view.
pub struct Emitter<P> {
	dispatcher: Dispatcher<P>,
}

impl<P> Clone for Emitter<P> {
	fn clone(&self) -> Self {
		Self {
			dispatcher: self.dispatcher.clone(),
		}
	}
}

impl<P> Debug for Emitter<P> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("Emitter").field("dispatcher", &self.dispatcher).finish()
	}
}

impl<P: 'static> Emitter<P> {
	/// Dispatches `command`. A missing subscriber is only logged.
	pub fn emit(&self, command: &str, payload: P) {
		// `HandlerNotFound` is already logged by the dispatcher.
		let _ = self.dispatcher.dispatch(command, &payload);
	}
}
