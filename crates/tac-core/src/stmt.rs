//! The statement arena: a doubly-linked list over a slot vector, so that
//! [`StmtId`]s and the iterators [`crate::block::Block`] holds as its
//! `first`/`last` endpoints stay valid across mid-sequence insertion and
//! removal. A plain `Vec<Statement>` cannot offer that — `Vec::remove`
//! shifts every later index. Removed slots are tombstoned and recycled from
//! a free list, the same technique `petgraph::StableGraph` uses to keep
//! `NodeIndex`es stable under node removal.

use serde::{Deserialize, Serialize};

use crate::id::{LabelId, StmtId, SymbolId};
use crate::ops::{BinOp, UnOp};

/// A three-address statement. Every non-label variant mentions at most
/// three operand symbols, per the three-address-code invariant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Statement {
    /// Placeholder preserving a block that would otherwise be empty.
    Null,
    /// A branch target; also delimits blocks.
    Label(LabelId),
    /// Unconditional jump. Does not fall through. `target` is a label
    /// identity, not a statement position -- this lets the translator
    /// forward-reference a label before the statement that declares it has
    /// been emitted.
    Jump { target: LabelId },
    /// Conditional branch; falls through to the next statement when not taken.
    Branch {
        op: crate::ops::RelOp,
        left: SymbolId,
        right: SymbolId,
        target: LabelId,
    },
    /// Function call. `result` is `None` when the call's value is discarded.
    /// May clobber globals.
    Call {
        result: Option<SymbolId>,
        func: SymbolId,
        args: Vec<SymbolId>,
    },
    /// Returns `expr` (if any) from the enclosing function. Does not fall through.
    Return { expr: Option<SymbolId> },
    /// `result := left op right`.
    Binary {
        op: BinOp,
        result: SymbolId,
        left: SymbolId,
        right: SymbolId,
    },
    /// `result := op expr`.
    Unary {
        op: UnOp,
        result: SymbolId,
        expr: SymbolId,
    },
    /// `result := expr`.
    Copy { result: SymbolId, expr: SymbolId },
    /// `result := array[index]` (read).
    Index {
        result: SymbolId,
        array: SymbolId,
        index: SymbolId,
    },
    /// `array[index] := expr` (write).
    Update {
        array: SymbolId,
        index: SymbolId,
        expr: SymbolId,
    },
}

impl Statement {
    /// The label this statement declares, if it is a `Label`.
    pub fn as_label(&self) -> Option<LabelId> {
        match self {
            Statement::Label(id) => Some(*id),
            _ => None,
        }
    }

    /// This statement's branch/jump target label, if it has one.
    pub fn target(&self) -> Option<LabelId> {
        match self {
            Statement::Jump { target } => Some(*target),
            Statement::Branch { target, .. } => Some(*target),
            _ => None,
        }
    }

    /// Rewrites this statement's target label in place. Panics if this
    /// statement kind carries no target -- callers must check
    /// `target().is_some()` first, matching the core's assertion-driven
    /// invariant style.
    pub fn set_target(&mut self, new_target: LabelId) {
        match self {
            Statement::Jump { target } => *target = new_target,
            Statement::Branch { target, .. } => *target = new_target,
            _ => panic!("set_target called on a statement with no target"),
        }
    }

    /// `true` iff control may reach the textually next statement after this
    /// one executes. `Jump`, `Return` never fall through; `Branch` falls
    /// through when not taken.
    pub fn falls_thru(&self) -> bool {
        !matches!(self, Statement::Jump { .. } | Statement::Return { .. })
    }

    /// The symbol defined (killed) by this statement, if any.
    pub fn def(&self) -> Option<SymbolId> {
        match self {
            Statement::Call { result, .. } => *result,
            Statement::Binary { result, .. } => Some(*result),
            Statement::Unary { result, .. } => Some(*result),
            Statement::Copy { result, .. } => Some(*result),
            Statement::Index { result, .. } => Some(*result),
            _ => None,
        }
    }

    /// The symbols used (generated) by this statement, in operand order.
    pub fn uses(&self) -> Vec<SymbolId> {
        match self {
            Statement::Null | Statement::Label(_) | Statement::Jump { .. } => Vec::new(),
            Statement::Branch { left, right, .. } => vec![*left, *right],
            Statement::Call { args, .. } => args.clone(),
            Statement::Return { expr } => expr.iter().copied().collect(),
            Statement::Binary { left, right, .. } => vec![*left, *right],
            Statement::Unary { expr, .. } => vec![*expr],
            Statement::Copy { expr, .. } => vec![*expr],
            Statement::Index { array, index, .. } => vec![*array, *index],
            Statement::Update { array, index, expr } => vec![*array, *index, *expr],
        }
    }

    /// `true` for `Call`. Used by DCE's useless-code pass, which never
    /// deletes a call even when its result is dead -- the call may still
    /// have side effects.
    pub fn is_call(&self) -> bool {
        matches!(self, Statement::Call { .. })
    }
}

#[derive(Debug, Clone)]
struct Slot {
    stmt: Option<Statement>,
    prev: Option<StmtId>,
    next: Option<StmtId>,
}

/// A doubly-linked list of [`Statement`]s stored in a slot vector. IDs
/// remain valid across insertion and removal anywhere in the sequence;
/// removing a statement tombstones its slot rather than shifting others.
#[derive(Debug, Clone, Default)]
pub struct StmtArena {
    slots: Vec<Slot>,
    free: Vec<StmtId>,
    head: Option<StmtId>,
    tail: Option<StmtId>,
}

impl StmtArena {
    pub fn new() -> Self {
        Self::default()
    }

    fn alloc(&mut self, stmt: Statement) -> StmtId {
        if let Some(id) = self.free.pop() {
            self.slots[id.0 as usize] = Slot {
                stmt: Some(stmt),
                prev: None,
                next: None,
            };
            id
        } else {
            let id = StmtId(self.slots.len() as u32);
            self.slots.push(Slot {
                stmt: Some(stmt),
                prev: None,
                next: None,
            });
            id
        }
    }

    /// Appends `stmt` to the end of the sequence.
    pub fn push_back(&mut self, stmt: Statement) -> StmtId {
        let id = self.alloc(stmt);
        self.slots[id.0 as usize].prev = self.tail;
        match self.tail {
            Some(tail) => self.slots[tail.0 as usize].next = Some(id),
            None => self.head = Some(id),
        }
        self.tail = Some(id);
        id
    }

    /// Inserts `stmt` immediately after `after`, returning its new id.
    pub fn insert_after(&mut self, after: StmtId, stmt: Statement) -> StmtId {
        let old_next = self.slots[after.0 as usize].next;
        let id = self.alloc(stmt);
        self.slots[id.0 as usize].prev = Some(after);
        self.slots[id.0 as usize].next = old_next;
        self.slots[after.0 as usize].next = Some(id);
        match old_next {
            Some(n) => self.slots[n.0 as usize].prev = Some(id),
            None => self.tail = Some(id),
        }
        id
    }

    /// Removes the statement at `id`, splicing its neighbors together.
    /// Any other `StmtId` referencing it becomes dangling; callers must not
    /// dereference a removed id (this mirrors the core's assertion-driven
    /// invariant enforcement rather than returning `Result`).
    pub fn remove(&mut self, id: StmtId) {
        let (prev, next) = {
            let slot = &self.slots[id.0 as usize];
            (slot.prev, slot.next)
        };
        match prev {
            Some(p) => self.slots[p.0 as usize].next = next,
            None => self.head = next,
        }
        match next {
            Some(n) => self.slots[n.0 as usize].prev = prev,
            None => self.tail = prev,
        }
        self.slots[id.0 as usize].stmt = None;
        self.free.push(id);
    }

    /// Replaces the statement at `id` in place, preserving its position.
    pub fn replace(&mut self, id: StmtId, stmt: Statement) {
        self.slots[id.0 as usize].stmt = Some(stmt);
    }

    pub fn get(&self, id: StmtId) -> Option<&Statement> {
        self.slots[id.0 as usize].stmt.as_ref()
    }

    pub fn get_mut(&mut self, id: StmtId) -> Option<&mut Statement> {
        self.slots[id.0 as usize].stmt.as_mut()
    }

    pub fn next(&self, id: StmtId) -> Option<StmtId> {
        self.slots[id.0 as usize].next
    }

    pub fn prev(&self, id: StmtId) -> Option<StmtId> {
        self.slots[id.0 as usize].prev
    }

    pub fn head(&self) -> Option<StmtId> {
        self.head
    }

    pub fn tail(&self) -> Option<StmtId> {
        self.tail
    }

    /// Iterates live statements in sequence order.
    pub fn iter(&self) -> StmtIter<'_> {
        StmtIter {
            arena: self,
            current: self.head,
        }
    }
}

pub struct StmtIter<'a> {
    arena: &'a StmtArena,
    current: Option<StmtId>,
}

impl<'a> Iterator for StmtIter<'a> {
    type Item = (StmtId, &'a Statement);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.current?;
        self.current = self.arena.next(id);
        self.arena.get(id).map(|stmt| (id, stmt))
    }
}
