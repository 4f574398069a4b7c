//! Functions: the top-level unit owning a statement list, its CFG, and its
//! local scope.

use petgraph::stable_graph::StableGraph;
use petgraph::Directed;
use serde::{Deserialize, Serialize};

use crate::alloc::LabelAllocator;
use crate::block::Block;
use crate::error::CoreError;
use crate::id::{BlockId, SymbolId};
use crate::stmt::StmtArena;
use crate::symtab::ScopeId;

/// A function definition: its statement arena, its CFG (rebuilt wholesale
/// by `tac-opt`'s CFG-cleanup pass), its entry/exit blocks, and its local
/// scope.
///
/// The block graph is a `StableGraph` so `BlockId`s (backed by `NodeIndex`)
/// survive removal of unrelated blocks during cleanup, the same way the
/// core's other graphs keep indices stable under mutation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Function {
    pub name: SymbolId,
    pub params: Vec<SymbolId>,
    pub scope: ScopeId,
    pub stmts: StmtArena,
    blocks: StableGraph<Block, (), Directed, u32>,
    pub entry: Option<BlockId>,
    pub exit: Option<BlockId>,
    /// Shared by the translator and by `tac-opt`'s CFG cleanup, so labels
    /// synthesized during optimization never collide with ones the
    /// translator already issued for this function.
    pub label_alloc: LabelAllocator,
}

impl Function {
    pub fn new(name: SymbolId, params: Vec<SymbolId>, scope: ScopeId) -> Self {
        Function {
            name,
            params,
            scope,
            stmts: StmtArena::new(),
            blocks: StableGraph::new(),
            entry: None,
            exit: None,
            label_alloc: LabelAllocator::new(),
        }
    }

    /// Discards every block. Called at the start of each CFG rebuild; no
    /// `BlockId` issued before this call remains valid afterward.
    pub fn clear_blocks(&mut self) {
        self.blocks = StableGraph::new();
        self.entry = None;
        self.exit = None;
    }

    pub fn add_block(&mut self, block: Block) -> BlockId {
        self.blocks.add_node(block).into()
    }

    pub fn block(&self, id: BlockId) -> Option<&Block> {
        self.blocks.node_weight(id.into())
    }

    pub fn block_mut(&mut self, id: BlockId) -> Option<&mut Block> {
        self.blocks.node_weight_mut(id.into())
    }

    pub fn try_block(&self, id: BlockId) -> Result<&Block, CoreError> {
        self.block(id).ok_or(CoreError::BlockNotFound { id })
    }

    /// Adds a control-flow edge `from -> to` and keeps both blocks'
    /// `preds`/`succs` lists consistent with it.
    pub fn connect(&mut self, from: BlockId, to: BlockId) {
        self.blocks.add_edge(from.into(), to.into(), ());
        if let Some(b) = self.block_mut(from) {
            if !b.succs.contains(&to) {
                b.succs.push(to);
            }
        }
        if let Some(b) = self.block_mut(to) {
            if !b.preds.contains(&from) {
                b.preds.push(from);
            }
        }
    }

    /// All block ids currently in the graph, in insertion order.
    pub fn block_ids(&self) -> impl Iterator<Item = BlockId> + '_ {
        self.blocks.node_indices().map(BlockId::from)
    }

    pub fn block_count(&self) -> usize {
        self.blocks.node_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::StmtId;

    #[test]
    fn connect_updates_both_sides() {
        let mut f = Function::new(SymbolId(0), Vec::new(), ScopeId(0));
        let a = f.add_block(Block::new(StmtId(0), StmtId(0)));
        let b = f.add_block(Block::new(StmtId(1), StmtId(1)));
        f.connect(a, b);

        assert_eq!(f.block(a).unwrap().succs, vec![b]);
        assert_eq!(f.block(b).unwrap().preds, vec![a]);
    }

    #[test]
    fn clear_blocks_resets_entry_and_exit() {
        let mut f = Function::new(SymbolId(0), Vec::new(), ScopeId(0));
        let a = f.add_block(Block::new(StmtId(0), StmtId(0)));
        f.entry = Some(a);
        f.clear_blocks();
        assert!(f.entry.is_none());
        assert_eq!(f.block_count(), 0);
    }

    #[test]
    fn try_block_reports_missing_block() {
        let f = Function::new(SymbolId(0), Vec::new(), ScopeId(0));
        assert!(f.try_block(BlockId(0)).is_err());
    }
}
