//! Editor boundary: direct cosmos edits outside the solver, with undo/redo.
//!
//! # Invariants
//! - Every edit goes through [`Cosmos::bulk_edit`](cosmos_kernel::Cosmos::bulk_edit),
//!   so caches are rebuilt from scratch and a resample is requested.
//! - Every edit is reversible; undo restores the significant state exactly.
//! - A rejected edit leaves the cosmos and both history stacks untouched.

mod editor;

pub use editor::{EditCommand, EditError, Editor};
