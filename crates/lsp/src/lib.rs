//! Document synchronization between an editor buffer and a language server.
//!
//! A [`DocumentSession`] turns the local edits of one buffer into the ordered
//! `textDocument/didOpen`, `didChange`, `didSave` and `didClose` stream a
//! server expects, and keeps an edit log so ranges the server reported
//! against an older revision can be carried forward to the current text.
//!
//! The crate never talks to a process or a socket itself. Notifications leave
//! through a [`DocumentTransport`] supplied by the host, and what the server
//! supports is read from a shared [`CapabilityRegistry`].
//!
//! ## Layout
//!
//! - [`changes`]: batching of edits into `didChange` content changes per sync kind.
//! - [`session`]: per-document lifecycle, versioning and rebasing.
//! - [`manager`]: the per-connection table of sessions keyed by URI.
//! - [`capabilities`]: server capability snapshot and dynamic registrations.
//! - [`config`]: tunables for open settling, flushing and offset encoding.
#![warn(missing_docs)]
use std::path::{Path, PathBuf};

/// Re-export of the [`lsp_types`] dependency of this crate.
pub use lsp_types;
pub use lockstep_primitives as primitives;

pub mod capabilities;
pub mod changes;
pub mod config;
pub mod event;
pub mod manager;
mod outbox;
pub mod runtime;
pub mod session;
pub mod transport;

pub use capabilities::{CapabilityRegistry, CapabilitySnapshot, SaveInterest, SyncKind};
pub use changes::PendingChanges;
pub use config::{FlushPolicy, SyncConfig};
pub use event::{NoOpEventHandler, SharedEventHandler, SyncEventHandler};
pub use lockstep_primitives::{EditDelta, EditLog, LspPosition, LspRange, OffsetEncoding, TextEdit};
pub use manager::SessionManager;
pub use session::{DocumentSession, DocumentText, OpenHandle, SaveDispatch, SessionState, SyncContext};
pub use transport::DocumentTransport;

/// A convenient type alias for `Result` with `E` = [`enum@crate::Error`].
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Possible errors.
#[derive(Debug, Clone, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
	/// The outbox or open task stopped before replying.
	#[error("service stopped")]
	ServiceStopped,
	/// The transport failed to hand a notification to the server.
	#[error("transport error: {0}")]
	Transport(String),
	/// The session was torn down.
	#[error("session closed")]
	SessionClosed,
	/// A character offset did not fit the buffer snapshot it was resolved against.
	#[error("offset {offset} is outside the buffer")]
	Conversion {
		/// The offending character index.
		offset: usize,
	},
	/// The path cannot be expressed as a `file://` URI.
	#[error("invalid document path: {}", .0.display())]
	InvalidPath(PathBuf),
}

/// Converts an absolute filesystem path to an LSP URI.
///
/// Returns `None` for relative paths.
pub fn uri_from_path(path: &Path) -> Option<lsp_types::Uri> {
	use std::str::FromStr;

	let url = url::Url::from_file_path(path).ok()?;
	lsp_types::Uri::from_str(url.as_str()).ok()
}
