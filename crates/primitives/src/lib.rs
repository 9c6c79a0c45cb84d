//! Value types for keeping a text buffer and a language server in agreement.
//!
//! Everything here is pure: positions and ranges in LSP coordinates, conversion
//! between rope character indices and those coordinates, the [`EditDelta`]
//! describing one mutation, and the rebasing transform that carries a range
//! recorded at one revision forward through later edits.

/// Edit deltas derived from raw buffer mutations.
pub mod delta;
/// Chronological log of edit deltas since the last checkpoint.
pub mod edit_log;
/// LSP position/range/encoding primitives.
pub mod lsp;
/// Rope character index to LSP position conversion.
pub mod position;
/// Range rebasing across edit deltas.
pub mod rebase;

pub use delta::{EditDelta, TextEdit};
pub use edit_log::EditLog;
pub use lsp::{LspPosition, LspRange, OffsetEncoding};
pub use position::{char_range_to_lsp_range, char_to_lsp_position, lsp_position_to_char, lsp_range_to_char_range};
pub use rebase::{rebase_position, rebase_range};
pub use ropey::{Rope, RopeSlice};
