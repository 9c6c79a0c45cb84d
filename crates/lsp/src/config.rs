//! Configuration for document synchronization.

use std::time::Duration;

use lockstep_primitives::OffsetEncoding;
use serde::{Deserialize, Deserializer};

/// When pending changes are sent to the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlushPolicy {
	/// Batch edits until the buffer reports a settled transaction.
	#[default]
	OnCommit,
	/// Send each edit as soon as it is recorded.
	Immediate,
}

/// Tunables shared by every session of one server connection.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
	/// Grace period after `didOpen` before the open handle resolves, in milliseconds.
	pub settle_delay_ms: u64,
	/// Skip the settle delay. Used by tests and scripted runs.
	pub deterministic: bool,
	/// When pending changes are flushed.
	pub flush: FlushPolicy,
	/// Fixed offset encoding. `None` uses the encoding the server negotiated.
	#[serde(deserialize_with = "deserialize_encoding")]
	pub encoding: Option<OffsetEncoding>,
}

impl Default for SyncConfig {
	fn default() -> Self {
		Self {
			settle_delay_ms: 500,
			deterministic: false,
			flush: FlushPolicy::OnCommit,
			encoding: None,
		}
	}
}

impl SyncConfig {
	/// Create the default configuration.
	pub fn new() -> Self {
		Self::default()
	}

	/// Set the settle delay after `didOpen`.
	pub fn settle_delay(mut self, delay: Duration) -> Self {
		self.settle_delay_ms = delay.as_millis() as u64;
		self
	}

	/// Skip the settle delay.
	pub fn deterministic(mut self, deterministic: bool) -> Self {
		self.deterministic = deterministic;
		self
	}

	/// Set the flush policy.
	pub fn flush(mut self, flush: FlushPolicy) -> Self {
		self.flush = flush;
		self
	}

	/// Pin the offset encoding instead of following the server.
	pub fn encoding(mut self, encoding: OffsetEncoding) -> Self {
		self.encoding = Some(encoding);
		self
	}

	/// Effective settle delay, zero in deterministic mode.
	pub fn effective_settle_delay(&self) -> Duration {
		if self.deterministic {
			Duration::ZERO
		} else {
			Duration::from_millis(self.settle_delay_ms)
		}
	}
}

fn deserialize_encoding<'de, D>(deserializer: D) -> Result<Option<OffsetEncoding>, D::Error>
where
	D: Deserializer<'de>,
{
	let Some(label) = Option::<String>::deserialize(deserializer)? else {
		return Ok(None);
	};
	OffsetEncoding::from_label(&label)
		.map(Some)
		.ok_or_else(|| serde::de::Error::unknown_variant(&label, &["utf-8", "utf-16", "utf-32"]))
}
