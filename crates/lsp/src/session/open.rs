use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};

use crate::Result;

/// Awaitable outcome of opening a document on the server.
///
/// Every clone observes the same result. The open itself runs in the
/// background whether or not anyone awaits the handle.
#[derive(Clone)]
pub struct OpenHandle {
	inner: Shared<BoxFuture<'static, Result<()>>>,
}

impl OpenHandle {
	pub(super) fn new(fut: impl Future<Output = Result<()>> + Send + 'static) -> Self {
		Self { inner: fut.boxed().shared() }
	}

	pub(super) fn ready(result: Result<()>) -> Self {
		Self::new(futures::future::ready(result))
	}

	/// Outcome once some clone of the handle has resolved.
	pub fn peek(&self) -> Option<Result<()>> {
		self.inner.peek().cloned()
	}
}

impl Future for OpenHandle {
	type Output = Result<()>;

	fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
		Pin::new(&mut self.inner).poll(cx)
	}
}

impl fmt::Debug for OpenHandle {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("OpenHandle").field("outcome", &self.peek()).finish()
	}
}
