use std::borrow::Cow;

/// Everything that can go wrong while mounting, patching or destroying a virtual tree,
/// or while driving an [`App`](`crate::app::App`).
///
/// All variants except [`Error::HandlerNotFound`] abort the current render pass.
/// The host tree keeps any mutations that were applied before the failure; there is no rollback.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum Error {
	/// The parent handed to `mount` or `patch` can't hold child nodes.
	#[error("invalid mount target: {0}")]
	InvalidMountTarget(Cow<'static, str>),

	/// A host node could not be described as a virtual node.
	#[error("unsupported node type: {0}")]
	UnsupportedNodeType(String),

	/// Lifecycle misuse, like destroying an unmounted node or mounting a mounted one.
	#[error("precondition violated: {0}")]
	PreconditionViolation(&'static str),

	/// A command was dispatched without any subscriber. Non-fatal.
	#[error("no handlers for command: {0}")]
	HandlerNotFound(String),

	/// The virtual tree nests deeper than [`Options::depth_limit`](`crate::reconcile::Options::depth_limit`).
	#[error("depth limit of {0} reached")]
	DepthLimitExceeded(usize),

	#[error(transparent)]
	Host(#[from] HostError),

	#[error("the application is already mounted")]
	AlreadyMounted,

	#[error("the application is not mounted")]
	NotMounted,
}

/// A failure reported by a [`Host`](`crate::host::Host`) backend.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("host backend failed to {operation}: {message}")]
pub struct HostError {
	pub operation: &'static str,
	pub message: String,
}

impl HostError {
	#[must_use]
	pub fn new(operation: &'static str, message: impl Into<String>) -> Self {
		Self {
			operation,
			message: message.into(),
		}
	}
}

pub type Result<T, E = Error> = core::result::Result<T, E>;
