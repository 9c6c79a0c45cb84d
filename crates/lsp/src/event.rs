//! Hooks for observing synchronization problems.
//!
//! Nothing on the edit path reports errors to its caller. Failed sends and
//! calls on sessions in the wrong state are logged and forwarded here, so a
//! host can surface them or count them.

use std::sync::Arc;

use lsp_types::Uri;

use crate::Error;
use crate::session::SessionState;

/// Receives synchronization events. All methods default to doing nothing.
pub trait SyncEventHandler: Send + Sync {
	/// A notification could not be handed to the server. It is not retried.
	fn on_notification_failed(&self, uri: &Uri, method: &'static str, error: &Error) {
		let _ = (uri, method, error);
	}

	/// `operation` was called while the session was in `state`, and was ignored.
	fn on_lifecycle_violation(&self, uri: &Uri, operation: &'static str, state: SessionState) {
		let _ = (uri, operation, state);
	}
}

/// Shared handle to an event handler.
pub type SharedEventHandler = Arc<dyn SyncEventHandler>;

/// Event handler that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpEventHandler;

impl SyncEventHandler for NoOpEventHandler {}
