//! What the server declared it wants to hear about documents.
//!
//! The [`CapabilityRegistry`] holds the capabilities from `initialize` plus
//! any `client/registerCapability` registrations that affect document sync.
//! Readers take a lock-free [`CapabilitySnapshot`]; writers replace the whole
//! snapshot.

use std::sync::Arc;

use arc_swap::ArcSwap;
use lockstep_primitives::OffsetEncoding;
use lsp_types::notification::{DidChangeTextDocument, DidSaveTextDocument, Notification};
use lsp_types::{Registration, ServerCapabilities, TextDocumentSyncCapability, TextDocumentSyncKind, TextDocumentSyncSaveOptions};

/// How document content reaches the server, fixed per session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyncKind {
	/// The server only wants open/close.
	None,
	/// Every change resends the whole document.
	Full,
	/// Changes carry only the edited ranges.
	Incremental,
}

impl SyncKind {
	/// Maps the protocol value. Unknown values are `None`.
	pub fn from_lsp(kind: TextDocumentSyncKind) -> Option<Self> {
		if kind == TextDocumentSyncKind::NONE {
			Some(Self::None)
		} else if kind == TextDocumentSyncKind::FULL {
			Some(Self::Full)
		} else if kind == TextDocumentSyncKind::INCREMENTAL {
			Some(Self::Incremental)
		} else {
			None
		}
	}

	fn from_raw(raw: i64) -> Option<Self> {
		match raw {
			0 => Some(Self::None),
			1 => Some(Self::Full),
			2 => Some(Self::Incremental),
			_ => None,
		}
	}
}

/// Whether `didSave` should be sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveInterest {
	/// Send `didSave`.
	Notify,
	/// The server declared it does not care about saves.
	Suppressed,
}

/// Immutable view of the server's document-sync capabilities.
#[derive(Debug, Clone, Default)]
pub struct CapabilitySnapshot {
	server: Option<ServerCapabilities>,
	change_registrations: Vec<(String, SyncKind)>,
	save_registrations: Vec<String>,
}

impl CapabilitySnapshot {
	/// Snapshot for a server that declared `capabilities` and nothing dynamic yet.
	pub fn new(capabilities: Option<ServerCapabilities>) -> Self {
		Self {
			server: capabilities,
			..Self::default()
		}
	}

	/// Capabilities from the `initialize` response, if known.
	pub fn server(&self) -> Option<&ServerCapabilities> {
		self.server.as_ref()
	}

	/// Effective sync kind.
	///
	/// The latest dynamic `textDocument/didChange` registration wins, then the
	/// static declaration. A server that declared nothing gets full sync.
	pub fn sync_kind(&self) -> SyncKind {
		if let Some((_, kind)) = self.change_registrations.last() {
			return *kind;
		}
		let declared = match self.server.as_ref().and_then(|caps| caps.text_document_sync.as_ref()) {
			Some(TextDocumentSyncCapability::Kind(kind)) => Some(*kind),
			Some(TextDocumentSyncCapability::Options(options)) => options.change,
			None => None,
		};
		declared.and_then(SyncKind::from_lsp).unwrap_or(SyncKind::Full)
	}

	/// Whether saves should be reported.
	///
	/// Suppressed only when the server declared sync options without save
	/// support and never registered `textDocument/didSave` dynamically.
	pub fn save_interest(&self) -> SaveInterest {
		if !self.save_registrations.is_empty() {
			return SaveInterest::Notify;
		}
		match self.server.as_ref().and_then(|caps| caps.text_document_sync.as_ref()) {
			Some(TextDocumentSyncCapability::Options(options)) => match &options.save {
				None | Some(TextDocumentSyncSaveOptions::Supported(false)) => SaveInterest::Suppressed,
				Some(_) => SaveInterest::Notify,
			},
			_ => SaveInterest::Notify,
		}
	}

	/// Position encoding negotiated by the server, UTF-16 when absent or unknown.
	pub fn position_encoding(&self) -> OffsetEncoding {
		self.server
			.as_ref()
			.and_then(|caps| caps.position_encoding.as_ref())
			.and_then(|kind| OffsetEncoding::from_label(kind.as_str()))
			.unwrap_or_default()
	}
}

/// Shared, atomically replaced capability state for one server connection.
#[derive(Debug, Default)]
pub struct CapabilityRegistry {
	snap: ArcSwap<CapabilitySnapshot>,
}

impl CapabilityRegistry {
	/// Registry for a server whose capabilities are `capabilities`.
	pub fn new(capabilities: Option<ServerCapabilities>) -> Self {
		Self {
			snap: ArcSwap::from_pointee(CapabilitySnapshot::new(capabilities)),
		}
	}

	/// Current snapshot.
	pub fn snapshot(&self) -> Arc<CapabilitySnapshot> {
		self.snap.load_full()
	}

	/// Replaces the server capabilities after (re)connecting.
	///
	/// Dynamic registrations belong to the previous connection and are dropped.
	pub fn set_server_capabilities(&self, capabilities: Option<ServerCapabilities>) {
		self.snap.store(Arc::new(CapabilitySnapshot::new(capabilities)));
	}

	/// Applies a dynamic registration.
	///
	/// Returns `false` for methods that do not affect document sync or for a
	/// `didChange` registration without a usable `syncKind`.
	pub fn register(&self, registration: &Registration) -> bool {
		let method = registration.method.as_str();
		if method == DidChangeTextDocument::METHOD {
			let Some(kind) = registration
				.register_options
				.as_ref()
				.and_then(|options| options.get("syncKind"))
				.and_then(serde_json::Value::as_i64)
				.and_then(SyncKind::from_raw)
			else {
				tracing::debug!(id = registration.id.as_str(), "didChange registration without syncKind");
				return false;
			};
			self.snap.rcu(|snap| {
				let mut next = CapabilitySnapshot::clone(snap);
				next.change_registrations.retain(|(id, _)| *id != registration.id);
				next.change_registrations.push((registration.id.clone(), kind));
				next
			});
			tracing::debug!(id = registration.id.as_str(), kind = ?kind, "didChange registered");
			true
		} else if method == DidSaveTextDocument::METHOD {
			self.snap.rcu(|snap| {
				let mut next = CapabilitySnapshot::clone(snap);
				if !next.save_registrations.contains(&registration.id) {
					next.save_registrations.push(registration.id.clone());
				}
				next
			});
			tracing::debug!(id = registration.id.as_str(), "didSave registered");
			true
		} else {
			false
		}
	}

	/// Removes a dynamic registration by id. Returns `false` if it was unknown.
	pub fn unregister(&self, id: &str) -> bool {
		let mut removed = false;
		self.snap.rcu(|snap| {
			let mut next = CapabilitySnapshot::clone(snap);
			let before = next.change_registrations.len() + next.save_registrations.len();
			next.change_registrations.retain(|(reg, _)| reg != id);
			next.save_registrations.retain(|reg| reg != id);
			removed = next.change_registrations.len() + next.save_registrations.len() != before;
			next
		});
		removed
	}
}
