//! Basic blocks: vertices of the CFG.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::id::{BlockId, StmtId, SymbolId};
use crate::ops::BinOp;

/// A canonicalized binary expression, keyed by operator and operand symbols.
/// Used by the (optional, disabled-by-default) available-expressions
/// analysis and common-subexpression elimination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExprKey {
    pub op: BinOp,
    pub left: SymbolId,
    pub right: SymbolId,
}

/// A pair `(result, source)` from some `Copy` statement, the unit the
/// available-copies analysis reasons about.
pub type CopyPair = (SymbolId, SymbolId);

/// A vertex of the CFG. `first`/`last` bracket the block's statements with
/// Labels (possibly the same Label, for an empty block); iterating a
/// block's "real" statements means walking strictly between them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Block {
    pub first: StmtId,
    pub last: StmtId,
    pub preds: Vec<BlockId>,
    pub succs: Vec<BlockId>,
    /// The block that followed this one textually, before any CFG rebuild
    /// reordering. `None` for the last block.
    pub next_block: Option<BlockId>,

    // --- live-variable analysis ---
    pub ue_var: HashSet<SymbolId>,
    pub var_kill: HashSet<SymbolId>,
    pub live_out: HashSet<SymbolId>,

    // --- available-copies analysis ---
    pub de_copies: HashSet<CopyPair>,
    pub copy_kill: HashSet<CopyPair>,
    pub avail_in: HashSet<CopyPair>,

    // --- available-expressions analysis (CSE) ---
    pub expr_kill: HashSet<ExprKey>,
    pub de_exprs: HashSet<ExprKey>,
    pub avail_in_exprs: HashSet<ExprKey>,
}

impl Block {
    pub fn new(first: StmtId, last: StmtId) -> Self {
        Block {
            first,
            last,
            preds: Vec::new(),
            succs: Vec::new(),
            next_block: None,
            ue_var: HashSet::new(),
            var_kill: HashSet::new(),
            live_out: HashSet::new(),
            de_copies: HashSet::new(),
            copy_kill: HashSet::new(),
            avail_in: HashSet::new(),
            expr_kill: HashSet::new(),
            de_exprs: HashSet::new(),
            avail_in_exprs: HashSet::new(),
        }
    }

    /// `true` iff this block has no real statements between its bracketing labels.
    pub fn is_empty_block(&self) -> bool {
        self.first == self.last
    }

    /// Clears all per-iteration dataflow sets, keeping structural fields
    /// (`first`, `last`, `preds`, `succs`, `next_block`) intact. Used before
    /// recomputing dataflow without a full CFG rebuild.
    pub fn clear_dataflow(&mut self) {
        self.ue_var.clear();
        self.var_kill.clear();
        self.live_out.clear();
        self.de_copies.clear();
        self.copy_kill.clear();
        self.avail_in.clear();
        self.expr_kill.clear();
        self.de_exprs.clear();
        self.avail_in_exprs.clear();
    }
}
