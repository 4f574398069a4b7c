//! Stable ID newtypes for IR entities.
//!
//! All IDs are distinct newtype wrappers over `u32`, so a `SymbolId` cannot
//! be accidentally used where a `StmtId` is expected.

use std::fmt;

use petgraph::graph::NodeIndex;
use serde::{Deserialize, Serialize};

/// Identity of an interned [`crate::symbol::Symbol`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SymbolId(pub u32);

/// Identity of a statement node in the statement arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StmtId(pub u32);

/// Monotonically numbered label identity, distinct from the label's position
/// in the statement arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LabelId(pub u32);

/// Identity of a basic block. Maps to a petgraph `NodeIndex<u32>` in the
/// block graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockId(pub u32);

impl fmt::Display for SymbolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for StmtId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for LabelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L{}", self.0)
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<NodeIndex<u32>> for BlockId {
    fn from(idx: NodeIndex<u32>) -> Self {
        BlockId(idx.index() as u32)
    }
}

impl From<BlockId> for NodeIndex<u32> {
    fn from(id: BlockId) -> Self {
        NodeIndex::new(id.0 as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_id_to_node_index_roundtrip() {
        let idx = NodeIndex::<u32>::new(7);
        let block_id = BlockId::from(idx);
        assert_eq!(block_id.0, 7);
        let back: NodeIndex<u32> = block_id.into();
        assert_eq!(back.index(), 7);
    }

    #[test]
    fn label_id_display_has_l_prefix() {
        assert_eq!(format!("{}", LabelId(3)), "L3");
    }

    #[test]
    fn ids_are_distinct_types() {
        let sym = SymbolId(1);
        let stmt = StmtId(1);
        assert_eq!(sym.0, stmt.0);
    }

    #[test]
    fn serde_roundtrip() {
        let id = SymbolId(42);
        let json = serde_json::to_string(&id).unwrap();
        let back: SymbolId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, back);
    }
}
