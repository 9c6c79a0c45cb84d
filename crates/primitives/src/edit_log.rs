use crate::delta::EditDelta;
use crate::lsp::LspRange;
use crate::rebase::rebase_range;

/// Chronological record of edit deltas since the last checkpoint.
///
/// Every recorded delta advances the revision by one. Revisions keep counting
/// across checkpoints, so a revision handed out once is never reused and a
/// range stamped with a revision older than the current checkpoint is
/// recognisably stale.
#[derive(Debug, Clone, Default)]
pub struct EditLog {
	base: u64,
	deltas: Vec<EditDelta>,
}

impl EditLog {
	/// Creates an empty log at revision 0.
	pub fn new() -> Self {
		Self::default()
	}

	/// Appends a delta and returns the new revision.
	pub fn push(&mut self, delta: EditDelta) -> u64 {
		self.deltas.push(delta);
		self.revision()
	}

	/// Revision reached after the most recent delta.
	pub fn revision(&self) -> u64 {
		self.base + self.deltas.len() as u64
	}

	/// Revision of the last checkpoint. Ranges older than this cannot be rebased.
	pub fn base(&self) -> u64 {
		self.base
	}

	/// Number of deltas since the last checkpoint.
	pub fn len(&self) -> usize {
		self.deltas.len()
	}

	/// Returns `true` if nothing was recorded since the last checkpoint.
	pub fn is_empty(&self) -> bool {
		self.deltas.is_empty()
	}

	/// Deltas since the last checkpoint, oldest first.
	pub fn deltas(&self) -> &[EditDelta] {
		&self.deltas
	}

	/// Marks the current revision as the new baseline and drops the deltas.
	pub fn checkpoint(&mut self) {
		self.base = self.revision();
		self.deltas.clear();
	}

	/// Drops the deltas after a change whose delta could not be derived.
	///
	/// Any range stamped before the reset becomes unrebasable. The revision
	/// still advances past the underivable change.
	pub fn reset(&mut self) {
		self.base = self.revision() + 1;
		self.deltas.clear();
	}

	/// Rebases `range`, recorded at revision `since`, to the current revision.
	///
	/// Returns `None` if `since` predates the last checkpoint or lies in the
	/// future.
	pub fn rebase(&self, range: LspRange, since: u64) -> Option<LspRange> {
		if since < self.base || since > self.revision() {
			return None;
		}
		let skip = (since - self.base) as usize;
		Some(rebase_range(range, &self.deltas[skip..]))
	}
}
