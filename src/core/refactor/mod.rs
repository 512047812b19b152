//! Batch renaming — rewrite document text and move directories.
//!
//! `rewrite` is pure text-in/text-out; `paths` plans and executes the moves.

mod paths;
mod rewrite;

pub use paths::{
    apply_moves, execution_order, plan_moves, plan_moves_with, select_backend, FsBackend,
    GitBackend, MoveBackend, MoveOutcome, MovePlan, MoveStatus, PlannedMove,
};
pub use rewrite::{
    Replacement, ReplacementKind, RewriteOutcome, RewriteWarning, TextRewriter,
};

pub(crate) use rewrite::{
    anchor_at, cuts_into, ends_anchor, ends_path, find_links, in_malformed_link, is_external,
    is_word_boundary, normalize_path, parent_dir, shielded_anchors, shielded_names, starts_path,
    word_spans,
};
