//! Dead-code elimination, in its two halves: useless-code
//! removal (a definition whose result is not live past it) and
//! unreachable-code removal (a block the CFG can no longer reach from
//! entry). Both need [`crate::dataflow::live`] and [`crate::cfg`] to have
//! already run.

use std::collections::HashSet;

use tac_core::{BlockId, Function, Statement};

/// Deletes definitions whose result is not in `live_out` by the end of their
/// block, walking each block backward so killing one use can expose the
/// next. `Call` is never deleted even when its result is unused -- it may
/// have side effects the dataflow doesn't model.
pub fn run_useless(func: &mut Function) -> bool {
    let mut changed = false;
    for id in func.block_ids().collect::<Vec<_>>() {
        let (first, last, live_out) = {
            let b = func.block(id).unwrap();
            (b.first, b.last, b.live_out.clone())
        };
        let mut real = Vec::new();
        let mut cur = func.stmts.next(first);
        while let Some(c) = cur {
            if c == last {
                break;
            }
            real.push(c);
            cur = func.stmts.next(c);
        }

        let mut live = live_out;
        for &sid in real.iter().rev() {
            let stmt = func.stmts.get(sid).unwrap().clone();
            if stmt.is_call() {
                if let Some(def) = stmt.def() {
                    live.remove(&def);
                }
                for u in stmt.uses() {
                    live.insert(u);
                }
                continue;
            }
            match stmt.def() {
                Some(def) if !live.contains(&def) => {
                    func.stmts.remove(sid);
                    changed = true;
                }
                Some(def) => {
                    live.remove(&def);
                    for u in stmt.uses() {
                        live.insert(u);
                    }
                }
                None => {
                    for u in stmt.uses() {
                        live.insert(u);
                    }
                }
            }
        }
    }
    changed
}

/// Deletes every real statement in a block the CFG can't reach by DFS from
/// `func.entry`. Leaves the bracketing labels alone -- [`crate::cfg::rebuild`]
/// prunes those on its next run if they end up unneeded.
pub fn run_unreachable(func: &mut Function) -> bool {
    let Some(entry) = func.entry else {
        return false;
    };
    let mut reachable: HashSet<BlockId> = HashSet::new();
    let mut stack = vec![entry];
    while let Some(b) = stack.pop() {
        if !reachable.insert(b) {
            continue;
        }
        stack.extend(func.block(b).unwrap().succs.iter().copied());
    }

    let mut changed = false;
    for id in func.block_ids().collect::<Vec<_>>() {
        if reachable.contains(&id) {
            continue;
        }
        let (first, last) = {
            let b = func.block(id).unwrap();
            (b.first, b.last)
        };
        let mut to_remove = Vec::new();
        let mut cur = func.stmts.next(first);
        while let Some(c) = cur {
            if c == last {
                break;
            }
            to_remove.push(c);
            cur = func.stmts.next(c);
        }
        if !to_remove.is_empty() {
            for r in to_remove {
                func.stmts.remove(r);
            }
            changed = true;
        }
    }
    changed
}
