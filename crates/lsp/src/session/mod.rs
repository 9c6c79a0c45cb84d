//! Per-document synchronization with one language server.
//!
//! A [`DocumentSession`] owns everything needed to keep one buffer in step
//! with one server:
//!
//! - the document version, bumped for `didOpen` and every non-empty flush;
//! - the lifecycle state and the memoized open handle;
//! - the batch of changes not yet sent;
//! - the edit log used to rebase stale ranges;
//! - the outbox that delivers notifications in order.
//!
//! Lock order is pending batch, then lifecycle or edit log. The lifecycle
//! and edit log locks are never held together. Edits are batched and logged
//! under one hold of the pending lock, so the batch and the log always agree
//! on edit order. No lock is held across an await.

mod open;

use std::sync::Arc;
use std::sync::atomic::{AtomicI32, Ordering};

use futures::future::{BoxFuture, Shared};
use lockstep_primitives::{EditDelta, EditLog, LspRange, OffsetEncoding, TextEdit};
use lsp_types::{
	DidChangeTextDocumentParams, DidCloseTextDocumentParams, DidOpenTextDocumentParams, DidSaveTextDocumentParams, TextDocumentIdentifier,
	TextDocumentItem, Uri, VersionedTextDocumentIdentifier,
};
pub use open::OpenHandle;
use parking_lot::{Mutex, RwLock};
use ropey::Rope;
use tokio::sync::oneshot;

use crate::capabilities::{CapabilityRegistry, SaveInterest, SyncKind};
use crate::changes::PendingChanges;
use crate::config::{FlushPolicy, SyncConfig};
use crate::event::{NoOpEventHandler, SharedEventHandler};
use crate::outbox::{Outbound, Outbox};
use crate::transport::DocumentTransport;
use crate::{Error, runtime};

/// Read access to the text of the buffer a session mirrors.
pub trait DocumentText: Send + Sync {
	/// Current text. Must reflect every edit already passed to
	/// [`DocumentSession::record_edit`].
	fn snapshot(&self) -> Rope;
}

impl DocumentText for RwLock<Rope> {
	fn snapshot(&self) -> Rope {
		self.read().clone()
	}
}

/// Lifecycle of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
	/// `didOpen` not sent yet.
	Unopened,
	/// `didOpen` queued, outcome unknown.
	Opening,
	/// The server accepted the document.
	Open,
	/// `didOpen` failed. Changes and saves are no longer sent.
	Failed,
	/// Torn down. Nothing more is sent.
	Closed,
}

impl SessionState {
	/// Short lowercase name for logs.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Unopened => "unopened",
			Self::Opening => "opening",
			Self::Open => "open",
			Self::Failed => "failed",
			Self::Closed => "closed",
		}
	}

	fn accepts_changes(self) -> bool {
		matches!(self, Self::Opening | Self::Open)
	}
}

/// What [`DocumentSession::checkpoint`] did about `didSave`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveDispatch {
	/// `didSave` was queued.
	Sent,
	/// The server declared no interest in saves.
	Suppressed,
	/// The document was never opened on the server.
	NotOpened,
	/// The session was already torn down.
	Closed,
}

/// Collaborators shared by every session of one server connection.
#[derive(Clone)]
pub struct SyncContext {
	/// Where notifications go.
	pub transport: Arc<dyn DocumentTransport>,
	/// What the server declared.
	pub capabilities: Arc<CapabilityRegistry>,
	/// Tunables.
	pub config: SyncConfig,
	/// Receives failures and lifecycle violations.
	pub events: SharedEventHandler,
}

impl SyncContext {
	/// Context with default configuration and no event handler.
	pub fn new(transport: Arc<dyn DocumentTransport>, capabilities: Arc<CapabilityRegistry>) -> Self {
		Self {
			transport,
			capabilities,
			config: SyncConfig::default(),
			events: Arc::new(NoOpEventHandler),
		}
	}

	/// Replace the configuration.
	pub fn with_config(mut self, config: SyncConfig) -> Self {
		self.config = config;
		self
	}

	/// Replace the event handler.
	pub fn with_events(mut self, events: SharedEventHandler) -> Self {
		self.events = events;
		self
	}
}

impl std::fmt::Debug for SyncContext {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("SyncContext").field("config", &self.config).finish_non_exhaustive()
	}
}

struct Lifecycle {
	state: SessionState,
	open: Option<OpenHandle>,
	outbox: Option<Outbox>,
	drained: Option<Shared<BoxFuture<'static, ()>>>,
}

struct Inner {
	uri: Uri,
	language_id: String,
	sync_kind: SyncKind,
	encoding: OffsetEncoding,
	buffer: Arc<dyn DocumentText>,
	ctx: SyncContext,
	version: AtomicI32,
	pending: Mutex<PendingChanges>,
	edits: Mutex<EditLog>,
	lifecycle: Mutex<Lifecycle>,
}

/// Synchronization state for one buffer on one server.
///
/// Cheap to clone; clones share state.
#[derive(Clone)]
pub struct DocumentSession {
	inner: Arc<Inner>,
}

impl DocumentSession {
	/// Creates an unopened session.
	///
	/// The sync kind and offset encoding are fixed here from the current
	/// capability snapshot and configuration.
	pub fn new(uri: Uri, language_id: impl Into<String>, buffer: Arc<dyn DocumentText>, ctx: SyncContext) -> Self {
		let caps = ctx.capabilities.snapshot();
		let sync_kind = caps.sync_kind();
		let encoding = ctx.config.encoding.unwrap_or_else(|| caps.position_encoding());
		tracing::debug!(
			uri = uri.as_str(),
			sync_kind = ?sync_kind,
			encoding = encoding.as_str(),
			pinned = ctx.config.encoding.is_some(),
			"Document session created"
		);

		Self {
			inner: Arc::new(Inner {
				uri,
				language_id: language_id.into(),
				sync_kind,
				encoding,
				buffer,
				ctx,
				version: AtomicI32::new(0),
				pending: Mutex::new(PendingChanges::new(sync_kind)),
				edits: Mutex::new(EditLog::new()),
				lifecycle: Mutex::new(Lifecycle {
					state: SessionState::Unopened,
					open: None,
					outbox: None,
					drained: None,
				}),
			}),
		}
	}

	/// Document URI.
	pub fn uri(&self) -> &Uri {
		&self.inner.uri
	}

	/// Language identifier sent with `didOpen`.
	pub fn language_id(&self) -> &str {
		&self.inner.language_id
	}

	/// Sync kind fixed at creation.
	pub fn sync_kind(&self) -> SyncKind {
		self.inner.sync_kind
	}

	/// Offset encoding for every position this session produces.
	pub fn encoding(&self) -> OffsetEncoding {
		self.inner.encoding
	}

	/// Last version handed out. 0 before `didOpen`.
	pub fn version(&self) -> i32 {
		self.inner.version.load(Ordering::SeqCst)
	}

	/// Current lifecycle state.
	pub fn state(&self) -> SessionState {
		self.inner.lifecycle.lock().state
	}

	/// Records waiting for the next flush.
	pub fn pending_len(&self) -> usize {
		self.inner.pending.lock().len()
	}

	/// Opens the document on the server once.
	///
	/// Every call returns a handle to the same open. The handle resolves after
	/// the server accepted `didOpen` and the settle delay passed, or with the
	/// open's error. On a closed session it resolves with
	/// [`Error::SessionClosed`].
	pub fn ensure_open(&self) -> OpenHandle {
		let mut lifecycle = self.inner.lifecycle.lock();
		if lifecycle.state == SessionState::Closed {
			return OpenHandle::ready(Err(Error::SessionClosed));
		}
		if let Some(handle) = &lifecycle.open {
			return handle.clone();
		}
		self.open_locked(&mut lifecycle)
	}

	/// Queues `didOpen` with the current text. Caller holds the lifecycle lock.
	fn open_locked(&self, lifecycle: &mut Lifecycle) -> OpenHandle {
		let inner = &self.inner;
		let version = inner.version.fetch_add(1, Ordering::SeqCst) + 1;
		let params = DidOpenTextDocumentParams {
			text_document: TextDocumentItem {
				uri: inner.uri.clone(),
				language_id: inner.language_id.clone(),
				version,
				text: inner.buffer.snapshot().to_string(),
			},
		};

		let outbox = Outbox::spawn(inner.uri.clone(), inner.ctx.transport.clone(), inner.ctx.events.clone());
		let (reply_tx, reply_rx) = oneshot::channel();
		outbox.send(Outbound::Open { params, reply: reply_tx });
		tracing::debug!(uri = inner.uri.as_str(), version, "didOpen queued");

		let task = runtime::spawn("open", finish_open(inner.clone(), reply_rx));
		let handle = OpenHandle::new(async move { task.await.unwrap_or(Err(Error::ServiceStopped)) });

		lifecycle.state = SessionState::Opening;
		lifecycle.outbox = Some(outbox);
		lifecycle.open = Some(handle.clone());
		handle
	}

	/// Records a mutation the buffer has already applied.
	///
	/// Must not be called while holding a lock that [`DocumentText::snapshot`]
	/// needs, and before the buffer applies a later mutation that overlaps or
	/// precedes this one. An unopened session is opened instead, and its
	/// `didOpen` already carries this edit.
	pub fn record_edit(&self, edit: &TextEdit) {
		let encoding = self.inner.encoding;
		let batched = {
			let mut pending = self.inner.pending.lock();
			let text = self.inner.buffer.snapshot();
			let delta = edit.delta_after(&text, encoding);
			let batched = {
				let mut lifecycle = self.inner.lifecycle.lock();
				match lifecycle.state {
					SessionState::Closed => None,
					SessionState::Unopened => {
						self.open_locked(&mut lifecycle);
						Some(false)
					}
					SessionState::Opening | SessionState::Open => {
						pending.push(edit, delta, &text, encoding);
						Some(true)
					}
					SessionState::Failed => {
						tracing::debug!(uri = self.inner.uri.as_str(), "Edit not batched, server never opened the document");
						Some(false)
					}
				}
			};
			if batched.is_some() {
				self.log_edit(edit, delta);
			}
			batched
		};

		let Some(batched) = batched else {
			self.violation("record_edit", SessionState::Closed);
			return;
		};
		if batched && self.inner.ctx.config.flush == FlushPolicy::Immediate {
			self.flush();
		}
	}

	/// Signals that the buffer's current transaction settled. Flushes.
	pub fn commit(&self) {
		self.flush();
	}

	/// Sends pending changes as one `didChange`.
	///
	/// Returns the version used, or `None` when nothing was sent. Concurrent
	/// flushes serialize; each batch gets its own version.
	pub fn flush(&self) -> Option<i32> {
		let mut pending = self.inner.pending.lock();
		let lifecycle = self.inner.lifecycle.lock();
		if !lifecycle.state.accepts_changes() {
			return None;
		}
		let outbox = lifecycle.outbox.as_ref()?;
		let content_changes = pending.take()?;

		let version = self.inner.version.fetch_add(1, Ordering::SeqCst) + 1;
		let count = content_changes.len();
		outbox.send(Outbound::Change(DidChangeTextDocumentParams {
			text_document: VersionedTextDocumentIdentifier {
				uri: self.inner.uri.clone(),
				version,
			},
			content_changes,
		}));
		tracing::trace!(uri = self.inner.uri.as_str(), version, count, "didChange queued");
		Some(version)
	}

	/// Marks a save.
	///
	/// The edit log is cleared, pending changes are flushed, and `didSave` is
	/// queued with the full text unless the server declared no interest.
	pub fn checkpoint(&self) -> SaveDispatch {
		self.inner.edits.lock().checkpoint();

		match self.state() {
			SessionState::Closed => {
				self.violation("checkpoint", SessionState::Closed);
				return SaveDispatch::Closed;
			}
			SessionState::Unopened | SessionState::Failed => return SaveDispatch::NotOpened,
			SessionState::Opening | SessionState::Open => {}
		}

		self.flush();

		if self.inner.ctx.capabilities.snapshot().save_interest() == SaveInterest::Suppressed {
			tracing::debug!(uri = self.inner.uri.as_str(), "didSave suppressed by server capabilities");
			return SaveDispatch::Suppressed;
		}

		let text = self.inner.buffer.snapshot().to_string();
		let lifecycle = self.inner.lifecycle.lock();
		let Some(outbox) = lifecycle.outbox.as_ref().filter(|_| lifecycle.state.accepts_changes()) else {
			return SaveDispatch::Closed;
		};
		outbox.send(Outbound::Save(DidSaveTextDocumentParams {
			text_document: TextDocumentIdentifier::new(self.inner.uri.clone()),
			text: Some(text),
		}));
		tracing::trace!(uri = self.inner.uri.as_str(), "didSave queued");
		SaveDispatch::Sent
	}

	/// Closes the session, sending `didClose` if the server has the document.
	///
	/// Pending changes are discarded. Notifications already queued still go
	/// out. Idempotent.
	pub fn teardown(&self) {
		self.shutdown(true);
	}

	/// Closes the session without `didClose`, for when the server is going away.
	pub fn detach(&self) {
		self.shutdown(false);
	}

	fn shutdown(&self, notify: bool) {
		let mut pending = self.inner.pending.lock();
		let mut lifecycle = self.inner.lifecycle.lock();
		let previous = std::mem::replace(&mut lifecycle.state, SessionState::Closed);
		if previous == SessionState::Closed {
			return;
		}
		pending.clear();

		let Some(outbox) = lifecycle.outbox.take() else {
			tracing::debug!(uri = self.inner.uri.as_str(), "Session closed before open");
			return;
		};
		let send_close = notify && previous.accepts_changes() && self.inner.ctx.transport.is_active();
		if send_close {
			outbox.send(Outbound::Close(DidCloseTextDocumentParams {
				text_document: TextDocumentIdentifier::new(self.inner.uri.clone()),
			}));
		}
		lifecycle.drained = Some(outbox.drained());
		tracing::debug!(
			uri = self.inner.uri.as_str(),
			previous = previous.as_str(),
			did_close = send_close,
			"Session closed"
		);
	}

	/// Resolves once every notification queued before this call was handed
	/// to the transport.
	pub async fn barrier(&self) {
		let (queued, drained) = {
			let lifecycle = self.inner.lifecycle.lock();
			match &lifecycle.outbox {
				Some(outbox) => {
					let (tx, rx) = oneshot::channel();
					outbox.send(Outbound::Barrier(tx));
					(Some(rx), None)
				}
				None => (None, lifecycle.drained.clone()),
			}
		};
		if let Some(rx) = queued {
			let _ = rx.await;
		} else if let Some(drained) = drained {
			drained.await;
		}
	}

	/// Revision of the edit log. Stamp ranges with this when they are computed.
	pub fn revision(&self) -> u64 {
		self.inner.edits.lock().revision()
	}

	/// Carries `range`, computed at revision `since`, to the current text.
	///
	/// `None` if a save or an unrecordable edit happened since.
	pub fn rebase(&self, range: LspRange, since: u64) -> Option<LspRange> {
		self.inner.edits.lock().rebase(range, since)
	}

	/// Appends the edit's delta to the log. Caller holds the pending lock.
	fn log_edit(&self, edit: &TextEdit, delta: Option<EditDelta>) {
		let mut edits = self.inner.edits.lock();
		match delta {
			Some(delta) => {
				edits.push(delta);
			}
			None => {
				let err = Error::Conversion { offset: edit.offset };
				tracing::warn!(uri = self.inner.uri.as_str(), error = %err, "Edit log reset");
				edits.reset();
			}
		}
	}

	fn violation(&self, operation: &'static str, state: SessionState) {
		tracing::debug!(uri = self.inner.uri.as_str(), operation, state = state.as_str(), "Ignored call on session");
		self.inner.ctx.events.on_lifecycle_violation(&self.inner.uri, operation, state);
	}
}

impl std::fmt::Debug for DocumentSession {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("DocumentSession")
			.field("uri", &self.inner.uri.as_str())
			.field("version", &self.version())
			.field("state", &self.state())
			.finish()
	}
}

/// Waits for the `didOpen` outcome, settles the state, then the settle delay.
async fn finish_open(inner: Arc<Inner>, reply: oneshot::Receiver<crate::Result<()>>) -> crate::Result<()> {
	let result = reply.await.unwrap_or(Err(Error::ServiceStopped));

	{
		let mut lifecycle = inner.lifecycle.lock();
		if lifecycle.state == SessionState::Opening {
			lifecycle.state = if result.is_ok() { SessionState::Open } else { SessionState::Failed };
		}
	}

	match &result {
		Ok(()) => {
			let delay = inner.ctx.config.effective_settle_delay();
			if !delay.is_zero() {
				tokio::time::sleep(delay).await;
			}
			tracing::debug!(uri = inner.uri.as_str(), "Document opened");
		}
		Err(err) => {
			inner.pending.lock().clear();
			tracing::warn!(uri = inner.uri.as_str(), error = %err, "Document open failed");
		}
	}
	result
}
