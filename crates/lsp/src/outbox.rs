//! Per-session queue that hands notifications to the transport in order.
//!
//! Edit-path callers only push onto an unbounded channel. One task per
//! session drains it and awaits the transport sequentially, so the server sees
//! notifications in exactly the order they were enqueued.

use std::sync::Arc;

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use lsp_types::notification::{DidChangeTextDocument, DidCloseTextDocument, DidOpenTextDocument, DidSaveTextDocument, Notification};
use lsp_types::{DidChangeTextDocumentParams, DidCloseTextDocumentParams, DidOpenTextDocumentParams, DidSaveTextDocumentParams, Uri};
use tokio::sync::{mpsc, oneshot};

use crate::event::SharedEventHandler;
use crate::transport::DocumentTransport;
use crate::{Result, runtime};

/// A queued notification.
pub(crate) enum Outbound {
	/// `didOpen`; the transport outcome is reported back through `reply`.
	Open {
		params: DidOpenTextDocumentParams,
		reply: oneshot::Sender<Result<()>>,
	},
	Change(DidChangeTextDocumentParams),
	Save(DidSaveTextDocumentParams),
	Close(DidCloseTextDocumentParams),
	/// Resolves once everything queued before it was handed off.
	Barrier(oneshot::Sender<()>),
}

/// Sender side of a session's outbox.
pub(crate) struct Outbox {
	tx: mpsc::UnboundedSender<Outbound>,
	drained: Shared<BoxFuture<'static, ()>>,
}

impl Outbox {
	/// Spawns the drain task for `uri`.
	pub(crate) fn spawn(uri: Uri, transport: Arc<dyn DocumentTransport>, events: SharedEventHandler) -> Self {
		let (tx, rx) = mpsc::unbounded_channel();
		let task = runtime::spawn("outbox", drain(uri, transport, events, rx));
		let drained = async move {
			let _ = task.await;
		}
		.boxed()
		.shared();
		Self { tx, drained }
	}

	/// Queues `msg`. Returns `false` if the drain task is gone.
	pub(crate) fn send(&self, msg: Outbound) -> bool {
		self.tx.send(msg).is_ok()
	}

	/// Resolves once the sender is dropped and the queue is empty.
	pub(crate) fn drained(&self) -> Shared<BoxFuture<'static, ()>> {
		self.drained.clone()
	}
}

async fn drain(uri: Uri, transport: Arc<dyn DocumentTransport>, events: SharedEventHandler, mut rx: mpsc::UnboundedReceiver<Outbound>) {
	let report = |method: &'static str, err: &crate::Error| {
		tracing::warn!(uri = uri.as_str(), method, error = %err, "LSP notification failed");
		events.on_notification_failed(&uri, method, err);
	};
	let mut open_failed = false;

	while let Some(msg) = rx.recv().await {
		match msg {
			Outbound::Open { params, reply } => {
				let version = params.text_document.version;
				let result = match transport.ready().await {
					Ok(()) => transport.did_open(params).await,
					Err(err) => Err(err),
				};
				match &result {
					Ok(()) => tracing::trace!(uri = uri.as_str(), version, "didOpen sent"),
					Err(err) => {
						open_failed = true;
						report(DidOpenTextDocument::METHOD, err);
					}
				}
				let _ = reply.send(result);
			}
			Outbound::Barrier(done) => {
				let _ = done.send(());
			}
			Outbound::Change(_) | Outbound::Save(_) | Outbound::Close(_) if open_failed => {
				tracing::debug!(uri = uri.as_str(), "dropping notification for document the server never opened");
			}
			Outbound::Change(params) => {
				let version = params.text_document.version;
				match transport.did_change(params).await {
					Ok(()) => tracing::trace!(uri = uri.as_str(), version, "didChange sent"),
					Err(err) => report(DidChangeTextDocument::METHOD, &err),
				}
			}
			Outbound::Save(params) => match transport.did_save(params).await {
				Ok(()) => tracing::trace!(uri = uri.as_str(), "didSave sent"),
				Err(err) => report(DidSaveTextDocument::METHOD, &err),
			},
			Outbound::Close(params) => match transport.did_close(params).await {
				Ok(()) => tracing::trace!(uri = uri.as_str(), "didClose sent"),
				Err(err) => report(DidCloseTextDocument::METHOD, &err),
			},
		}
	}

	tracing::trace!(uri = uri.as_str(), "outbox drained");
}
