//! The seam through which notifications reach a language server.

use async_trait::async_trait;
use lsp_types::{DidChangeTextDocumentParams, DidCloseTextDocumentParams, DidOpenTextDocumentParams, DidSaveTextDocumentParams};

use crate::Result;

/// Delivers text-document notifications to one language server.
///
/// Implementations own framing and the server process. Each call returns
/// once the notification was handed off; none of them wait for the server to
/// act on it.
#[async_trait]
pub trait DocumentTransport: Send + Sync {
	/// Resolves once the server finished `initialize`. Awaited before `didOpen`.
	async fn ready(&self) -> Result<()> {
		Ok(())
	}

	/// Returns `false` once the server is shutting down or gone.
	fn is_active(&self) -> bool {
		true
	}

	/// Sends `textDocument/didOpen`.
	async fn did_open(&self, params: DidOpenTextDocumentParams) -> Result<()>;

	/// Sends `textDocument/didChange`.
	async fn did_change(&self, params: DidChangeTextDocumentParams) -> Result<()>;

	/// Sends `textDocument/didSave`.
	async fn did_save(&self, params: DidSaveTextDocumentParams) -> Result<()>;

	/// Sends `textDocument/didClose`.
	async fn did_close(&self, params: DidCloseTextDocumentParams) -> Result<()>;
}
