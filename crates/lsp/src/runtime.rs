//! Spawning background work from threads that may not be inside tokio.

use std::future::Future;
use std::sync::OnceLock;

use tokio::task::JoinHandle;

/// Handle to the ambient runtime, or to a lazily built shared one.
pub fn handle() -> tokio::runtime::Handle {
	if let Ok(handle) = tokio::runtime::Handle::try_current() {
		return handle;
	}

	static GLOBAL_RT: OnceLock<tokio::runtime::Runtime> = OnceLock::new();
	let runtime = GLOBAL_RT.get_or_init(|| {
		tokio::runtime::Builder::new_multi_thread()
			.enable_all()
			.worker_threads(2)
			.thread_name("lockstep-sync")
			.build()
			.expect("failed to build lockstep fallback tokio runtime")
	});
	runtime.handle().clone()
}

/// Spawns a task on [`handle`].
pub fn spawn<F>(task: &'static str, fut: F) -> JoinHandle<F::Output>
where
	F: Future + Send + 'static,
	F::Output: Send + 'static,
{
	tracing::trace!(task, "sync.spawn");
	handle().spawn(fut)
}
