//! Control-flow graph construction and cleanup.
//!
//! [`rebuild`] tears down a function's block graph and reconstructs it from
//! its (possibly just-mutated) statement list: merge adjacent labels,
//! eliminate jump chains, drop unneeded labels -- repeated to a fixed point
//! since each cleanup step can expose more of the next -- then walk the
//! cleaned-up sequence once to lay down blocks and edges. Every local
//! transform in `crate::transforms` calls this after it reports a change;
//! nothing else may build or mutate the block graph.

use std::collections::{HashMap, HashSet};

use tac_core::{Block, BlockId, Function, LabelId, Statement, StmtId};

/// Rebuilds `func`'s block graph from its statement list from scratch. Any
/// `BlockId` obtained before this call is no longer valid afterward.
pub fn rebuild(func: &mut Function) {
    func.clear_blocks();
    ensure_block_boundaries(func);
    loop {
        let merged = merge_adjacent_labels(func);
        let chained = eliminate_jump_chains(func);
        let pruned = remove_unneeded_labels(func);
        if !(merged || chained || pruned) {
            break;
        }
    }
    build_blocks(func);
}

/// After every non-fall-through or branching statement, ensure the next
/// statement is a Label, inserting a fresh one otherwise.
/// This is what guarantees a block can never collapse to nothing.
fn ensure_block_boundaries(func: &mut Function) {
    let mut cur = func.stmts.head();
    while let Some(id) = cur {
        let needs_boundary = matches!(
            func.stmts.get(id).unwrap(),
            Statement::Jump { .. } | Statement::Return { .. } | Statement::Branch { .. }
        );
        if needs_boundary {
            let next_is_label = func
                .stmts
                .next(id)
                .map(|n| matches!(func.stmts.get(n).unwrap(), Statement::Label(_)))
                .unwrap_or(false);
            if !next_is_label {
                let label = func.label_alloc.fresh();
                func.stmts.insert_after(id, Statement::Label(label));
            }
        }
        cur = func.stmts.next(id);
    }
}

/// Step 2: where multiple consecutive labels occur, keep the first and
/// rewrite every branch/jump target that named one of the rest.
fn merge_adjacent_labels(func: &mut Function) -> bool {
    let mut merged: HashMap<LabelId, LabelId> = HashMap::new();
    let mut cur = func.stmts.head();
    while let Some(id) = cur {
        let Statement::Label(keep) = *func.stmts.get(id).unwrap() else {
            cur = func.stmts.next(id);
            continue;
        };
        let mut next = func.stmts.next(id);
        while let Some(n) = next {
            let Statement::Label(extra) = *func.stmts.get(n).unwrap() else {
                break;
            };
            merged.insert(extra, keep);
            let after = func.stmts.next(n);
            func.stmts.remove(n);
            next = after;
        }
        cur = next;
    }
    if merged.is_empty() {
        return false;
    }
    rewrite_targets(func, &merged);
    true
}

/// Step 3: a Label immediately followed by an unconditional Jump forwards
/// to the Jump's target; if that Label is itself unreachable by fall-through
/// (its predecessor doesn't fall through), the Label/Jump pair is pure
/// indirection and gets deleted once every other target has been forwarded
/// through it.
fn eliminate_jump_chains(func: &mut Function) -> bool {
    let mut changed = false;

    let mut forward: HashMap<LabelId, LabelId> = HashMap::new();
    let mut cur = func.stmts.head();
    while let Some(id) = cur {
        if let Statement::Label(label) = *func.stmts.get(id).unwrap() {
            if let Some(n) = func.stmts.next(id) {
                if let Statement::Jump { target } = *func.stmts.get(n).unwrap() {
                    if target != label {
                        forward.insert(label, target);
                    }
                }
            }
        }
        cur = func.stmts.next(id);
    }

    if !forward.is_empty() {
        let keys: Vec<LabelId> = forward.keys().copied().collect();
        for k in keys {
            let mut v = forward[&k];
            let mut seen: HashSet<LabelId> = HashSet::from([k]);
            while let Some(&next) = forward.get(&v) {
                if !seen.insert(v) {
                    break; // cyclic forwarding chain; stop rather than loop forever
                }
                v = next;
            }
            forward.insert(k, v);
        }
        rewrite_targets(func, &forward);
        changed = true;
    }

    let mut to_remove = Vec::new();
    let mut cur = func.stmts.head();
    while let Some(id) = cur {
        if forward.contains_key(&label_of(func, id).unwrap_or(LabelId(u32::MAX))) {
            let falls_from_pred = func
                .stmts
                .prev(id)
                .map(|p| func.stmts.get(p).unwrap().falls_thru())
                .unwrap_or(true);
            if !falls_from_pred {
                if let Some(n) = func.stmts.next(id) {
                    if matches!(func.stmts.get(n).unwrap(), Statement::Jump { .. }) {
                        to_remove.push(id);
                        to_remove.push(n);
                    }
                }
            }
        }
        cur = func.stmts.next(id);
    }
    if !to_remove.is_empty() {
        for id in to_remove {
            func.stmts.remove(id);
        }
        changed = true;
    }

    let mut drop_jumps = Vec::new();
    let mut cur = func.stmts.head();
    while let Some(id) = cur {
        if let Statement::Jump { target } = *func.stmts.get(id).unwrap() {
            if let Some(n) = func.stmts.next(id) {
                if matches!(func.stmts.get(n).unwrap(), Statement::Label(l) if *l == target) {
                    drop_jumps.push(id);
                }
            }
        }
        cur = func.stmts.next(id);
    }
    if !drop_jumps.is_empty() {
        for id in drop_jumps {
            func.stmts.remove(id);
        }
        changed = true;
    }

    changed
}

fn label_of(func: &Function, id: StmtId) -> Option<LabelId> {
    func.stmts.get(id).and_then(|s| s.as_label())
}

/// Step 4: a Label is needed iff it is the target of some branch/jump, or
/// immediately follows a Null, or immediately follows a non-fall-through
/// statement. A Label with no predecessor (the function's entry) or none
/// following it (the synthetic exit anchor) is always kept regardless,
/// since both anchor a block the CFG can't do without.
fn remove_unneeded_labels(func: &mut Function) -> bool {
    let targeted: HashSet<LabelId> = func.stmts.iter().filter_map(|(_, s)| s.target()).collect();
    let tail = func.stmts.tail();

    let mut to_remove = Vec::new();
    let mut cur = func.stmts.head();
    while let Some(id) = cur {
        if let Statement::Label(label) = *func.stmts.get(id).unwrap() {
            let is_boundary = func.stmts.prev(id).is_none() || Some(id) == tail;
            let needed = is_boundary
                || targeted.contains(&label)
                || match func.stmts.prev(id) {
                    None => true,
                    Some(p) => {
                        let pstmt = func.stmts.get(p).unwrap();
                        matches!(pstmt, Statement::Null) || !pstmt.falls_thru()
                    }
                };
            if !needed {
                to_remove.push(id);
            }
        }
        cur = func.stmts.next(id);
    }
    if to_remove.is_empty() {
        return false;
    }
    for id in to_remove {
        func.stmts.remove(id);
    }
    true
}

fn rewrite_targets(func: &mut Function, map: &HashMap<LabelId, LabelId>) {
    let ids: Vec<StmtId> = func.stmts.iter().map(|(id, _)| id).collect();
    for id in ids {
        if let Some(stmt) = func.stmts.get_mut(id) {
            if let Some(t) = stmt.target() {
                if let Some(&mapped) = map.get(&t) {
                    stmt.set_target(mapped);
                }
            }
        }
    }
}

/// Step 5: walk the cleaned-up list; at each Label, close the previous
/// block (its `last` becomes this Label) and open a new one whose `first`
/// is this Label. The final block -- anchored at the trailing Label -- is
/// the function's synthetic exit: every `Return`, wherever it is textually,
/// connects to it directly rather than to whatever block follows it.
fn build_blocks(func: &mut Function) {
    let mut label_to_block: HashMap<LabelId, BlockId> = HashMap::new();
    let mut order: Vec<BlockId> = Vec::new();
    let mut prev_block: Option<BlockId> = None;

    let mut cur = func.stmts.head();
    while let Some(id) = cur {
        if let Statement::Label(label) = *func.stmts.get(id).unwrap() {
            if let Some(pb) = prev_block {
                func.block_mut(pb).unwrap().last = id;
            }
            let block = func.add_block(Block::new(id, id));
            label_to_block.insert(label, block);
            if prev_block.is_none() {
                func.entry = Some(block);
            }
            order.push(block);
            prev_block = Some(block);
        }
        cur = func.stmts.next(id);
    }
    func.exit = order.last().copied();

    for (i, &block_id) in order.iter().enumerate() {
        let (first, last) = {
            let b = func.block(block_id).unwrap();
            (b.first, b.last)
        };
        let mut last_real: Option<StmtId> = None;
        let mut cursor = func.stmts.next(first);
        while let Some(c) = cursor {
            if c == last {
                break;
            }
            last_real = Some(c);
            cursor = func.stmts.next(c);
        }
        let next_block = order.get(i + 1).copied();
        let exit = func.exit;

        match last_real.map(|id| func.stmts.get(id).unwrap().clone()) {
            Some(Statement::Jump { target }) => {
                if let Some(&tb) = label_to_block.get(&target) {
                    func.connect(block_id, tb);
                }
            }
            Some(Statement::Branch { target, .. }) => {
                if let Some(&tb) = label_to_block.get(&target) {
                    func.connect(block_id, tb);
                }
                match next_block.or(exit) {
                    Some(nb) => func.connect(block_id, nb),
                    None => {}
                }
            }
            Some(Statement::Return { .. }) => {
                if let Some(e) = exit {
                    func.connect(block_id, e);
                }
            }
            _ => {
                // Falls through: Null, Call, Binary, Unary, Copy, Index,
                // Update, or an empty block all reach the next block.
                if let Some(nb) = next_block {
                    func.connect(block_id, nb);
                } else if let Some(e) = exit {
                    if block_id != e {
                        func.connect(block_id, e);
                    }
                }
            }
        }
    }

    for (i, &b) in order.iter().enumerate() {
        let next = order.get(i + 1).copied();
        func.block_mut(b).unwrap().next_block = next;
    }
}
