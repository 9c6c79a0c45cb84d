//! Table of document sessions for one server connection.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use lsp_types::Uri;
use parking_lot::RwLock;

use crate::capabilities::CapabilityRegistry;
use crate::session::{DocumentSession, DocumentText, SyncContext};
use crate::{Error, Result, uri_from_path};

/// Owns every [`DocumentSession`] of one server connection, keyed by URI.
#[derive(Debug)]
pub struct SessionManager {
	ctx: SyncContext,
	sessions: RwLock<HashMap<String, DocumentSession>>,
}

impl SessionManager {
	/// Creates an empty manager sharing `ctx` with all its sessions.
	pub fn new(ctx: SyncContext) -> Self {
		Self {
			ctx,
			sessions: RwLock::new(HashMap::new()),
		}
	}

	/// Capability registry to update on (re)connect and dynamic registration.
	pub fn capabilities(&self) -> &Arc<CapabilityRegistry> {
		&self.ctx.capabilities
	}

	/// Returns the session for `path`, creating it if needed.
	///
	/// A new session is unopened; call [`DocumentSession::ensure_open`] or
	/// record an edit to send `didOpen`.
	pub fn open(&self, path: &Path, language_id: &str, buffer: Arc<dyn DocumentText>) -> Result<DocumentSession> {
		let uri = uri_from_path(path).ok_or_else(|| Error::InvalidPath(path.to_path_buf()))?;
		let mut sessions = self.sessions.write();
		if let Some(session) = sessions.get(uri.as_str()) {
			return Ok(session.clone());
		}

		let key = uri.as_str().to_string();
		let session = DocumentSession::new(uri, language_id, buffer, self.ctx.clone());
		sessions.insert(key, session.clone());
		Ok(session)
	}

	/// Session for `uri`, if one exists.
	pub fn get(&self, uri: &Uri) -> Option<DocumentSession> {
		self.sessions.read().get(uri.as_str()).cloned()
	}

	/// Returns `true` if a session exists for `uri`.
	pub fn contains(&self, uri: &Uri) -> bool {
		self.sessions.read().contains_key(uri.as_str())
	}

	/// Number of sessions.
	pub fn len(&self) -> usize {
		self.sessions.read().len()
	}

	/// Returns `true` if there are no sessions.
	pub fn is_empty(&self) -> bool {
		self.sessions.read().is_empty()
	}

	/// Tears down and forgets the session for `uri`. Returns `false` if there was none.
	pub fn close(&self, uri: &Uri) -> bool {
		let Some(session) = self.sessions.write().remove(uri.as_str()) else {
			return false;
		};
		session.teardown();
		true
	}

	/// Forgets every session without `didClose`, for a server that is going away.
	pub fn disconnect_all(&self) {
		let sessions: Vec<_> = self.sessions.write().drain().map(|(_, session)| session).collect();
		tracing::debug!(count = sessions.len(), "Detaching all document sessions");
		for session in sessions {
			session.detach();
		}
	}
}
