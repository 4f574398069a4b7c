//! Core error types for tac-core.
//!
//! Uses `thiserror` for structured, matchable error variants covering
//! failure modes in the IR data model: missing IDs and malformed CFG shape.

use thiserror::Error;

use crate::id::{BlockId, StmtId, SymbolId};

/// Core errors produced by the tac-core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A SymbolId was not found in the symbol table.
    #[error("symbol not found: SymbolId({id})", id = id.0)]
    SymbolNotFound { id: SymbolId },

    /// A StmtId was not found in the statement arena.
    #[error("statement not found: StmtId({id})", id = id.0)]
    StmtNotFound { id: StmtId },

    /// A BlockId was not found in the block graph.
    #[error("block not found: BlockId({id})", id = id.0)]
    BlockNotFound { id: BlockId },

    /// A jump or branch statement targets a label that was never defined.
    #[error("undefined label target: {label}")]
    UndefinedLabel { label: String },

    /// A basic block invariant was violated while building or cleaning the CFG.
    #[error("graph inconsistency: {reason}")]
    GraphInconsistency { reason: String },
}
