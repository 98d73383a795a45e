//! The application shell: owns the state, mounts the view once and patches it after every command.

use crate::{
	dispatcher::{CommandHandler, Dispatcher, Emitter, Subscription},
	error::{Error, Result},
	host::Host,
	reconcile::{Options, Reconciler},
	vnode::VNode,
};
use std::{
	cell::{Ref, RefCell},
	rc::Rc,
};
use tracing::{error, instrument, trace};

type View<S, P, N> = Box<dyn Fn(&S, &Emitter<P>) -> VNode<N>>;

struct Shared<H: Host, S, P> {
	reconciler: Reconciler<H>,
	state: RefCell<S>,
	view: View<S, P, H::Node>,
	emitter: Emitter<P>,
	mounted: RefCell<Option<Mounted<H::Node>>>,
	render_error: RefCell<Option<Error>>,
}

struct Mounted<N> {
	parent: N,
	/// `None` after a failed render cycle.
	vdom: Option<VNode<N>>,
}

/// An application: state, reducers that derive new state from commands, and a view of the state.
///
/// # Correct Use
///
/// Views must not emit commands while rendering, and reducers must not read the [`App::state`] they're replacing.
/// Both would panic on a `RefCell` borrow.
///
/// ```
/// use vdom_runtime::{app::App, children, element, memory::MemoryHost, vnode::Props};
///
/// let host = MemoryHost::new();
/// let root = host.create_root();
/// let app = App::new(host.clone(), 0_i32, |count: &i32, emitter| {
/// 	let emitter = emitter.clone();
/// 	element(
/// 		"button",
/// 		Props::new().on("click", move |_| emitter.emit("increment", ())),
/// 		children![count.to_string()],
/// 	)
/// })
/// .with_reducer("increment", |count, _| count + 1);
///
/// app.mount(&root).unwrap();
/// app.emit("increment", ()).unwrap();
/// assert_eq!(host.inner_html(root), "<button>1</button>");
/// ```
pub struct App<H: Host, S, P> {
	shared: Rc<Shared<H, S, P>>,
	dispatcher: Dispatcher<P>,
	subscriptions: Vec<Subscription>,
}

impl<H: Host + 'static, S: 'static, P: 'static> App<H, S, P> {
	pub fn new(host: H, state: S, view: impl Fn(&S, &Emitter<P>) -> VNode<H::Node> + 'static) -> Self {
		Self::with_options(host, state, view, Options::default())
	}

	pub fn with_options(host: H, state: S, view: impl Fn(&S, &Emitter<P>) -> VNode<H::Node> + 'static, options: Options) -> Self {
		let dispatcher = Dispatcher::new();
		let shared = Rc::new(Shared {
			reconciler: Reconciler::with_options(host, options),
			state: RefCell::new(state),
			view: Box::new(view),
			emitter: dispatcher.emitter(),
			mounted: RefCell::new(None),
			render_error: RefCell::new(None),
		});

		let weak = Rc::downgrade(&shared);
		let render = dispatcher.after_every_command(move || {
			if let Some(shared) = weak.upgrade() {
				if let Err(error) = shared.render() {
					error!(%error, "Render cycle failed.");
					*shared.render_error.borrow_mut() = Some(error);
				}
			}
		});

		Self {
			shared,
			dispatcher,
			subscriptions: vec![render],
		}
	}

	/// Registers `reducer` to replace the state whenever `command` is dispatched.
	#[must_use]
	pub fn with_reducer(mut self, command: impl Into<String>, reducer: impl Fn(&S, &P) -> S + 'static) -> Self {
		let weak = Rc::downgrade(&self.shared);
		let subscription = self.dispatcher.subscribe(
			command,
			CommandHandler::new(move |payload: &P| {
				if let Some(shared) = weak.upgrade() {
					let next = reducer(&shared.state.borrow(), payload);
					*shared.state.borrow_mut() = next;
				}
			}),
		);
		self.subscriptions.push(subscription);
		self
	}

	/// Renders the view and mounts it into `parent`.
	///
	/// # Errors
	///
	/// [`Error::AlreadyMounted`] if called twice, or any error from mounting.
	#[instrument(skip(self))]
	pub fn mount(&self, parent: &H::Node) -> Result<()> {
		let mut mounted = self.shared.mounted.borrow_mut();
		if mounted.is_some() {
			return Err(Error::AlreadyMounted);
		}
		let vdom = (self.shared.view)(&self.shared.state.borrow(), &self.shared.emitter);
		let vdom = self.shared.reconciler.patch(None, vdom, parent)?;
		*mounted = Some(Mounted {
			parent: parent.clone(),
			vdom: Some(vdom),
		});
		Ok(())
	}

	/// Dispatches `command`, which re-renders the application.
	///
	/// # Errors
	///
	/// The error of the render cycle this triggered, if it failed. A missing command handler is only logged.
	pub fn emit(&self, command: &str, payload: P) -> Result<()> {
		match self.dispatcher.dispatch(command, &payload) {
			Ok(()) | Err(Error::HandlerNotFound(_)) => {}
			Err(error) => return Err(error),
		}
		self.take_render_error().map_or(Ok(()), Err)
	}

	/// Takes the error of the last failed render cycle, including ones triggered through an [`Emitter`].
	pub fn take_render_error(&self) -> Option<Error> {
		self.shared.render_error.borrow_mut().take()
	}

	/// Destroys the rendered tree and drops every subscription.
	///
	/// # Errors
	///
	/// [`Error::NotMounted`] if the app was never mounted, or any error from destroying the tree.
	#[instrument(skip(self))]
	pub fn unmount(self) -> Result<()> {
		let mounted = self.shared.mounted.borrow_mut().take().ok_or(Error::NotMounted)?;
		for subscription in self.subscriptions {
			subscription.unsubscribe();
		}
		match mounted.vdom {
			Some(mut vdom) => self.shared.reconciler.destroy(&mut vdom),
			None => Ok(()),
		}
	}

	#[must_use]
	pub fn state(&self) -> Ref<'_, S> {
		self.shared.state.borrow()
	}

	pub fn host(&self) -> &H {
		self.shared.reconciler.host()
	}

	#[must_use]
	pub fn emitter(&self) -> Emitter<P> {
		self.shared.emitter.clone()
	}

	/// Inspects the currently mounted virtual tree.
	pub fn with_vdom<R>(&self, f: impl FnOnce(Option<&VNode<H::Node>>) -> R) -> R {
		let mounted = self.shared.mounted.borrow();
		f(mounted.as_ref().and_then(|mounted| mounted.vdom.as_ref()))
	}
}

impl<H: Host, S, P> Shared<H, S, P> {
	fn render(&self) -> Result<()> {
		let mut mounted = self.mounted.borrow_mut();
		let mounted = match mounted.as_mut() {
			Some(mounted) => mounted,
			None => {
				trace!("Not mounted. Skipping render.");
				return Ok(());
			}
		};
		let old = mounted
			.vdom
			.take()
			.ok_or(Error::PreconditionViolation("a previous render cycle failed"))?;
		let new = (self.view)(&self.state.borrow(), &self.emitter);
		mounted.vdom = Some(self.reconciler.patch(Some(old), new, &mounted.parent)?);
		Ok(())
	}
}
