//! Available-copies analysis (forward, must).
//!
//! The universe is every `(result, source)` pair that appears in some Copy
//! statement anywhere in the function. `DECopies`/`CopyKill` are computed
//! per block in one forward walk; `AvailIn` is then iterated to a fixed
//! point, intersecting over predecessors (an empty predecessor set, i.e.
//! the entry block, always yields `AvailIn = ∅`).

use std::collections::HashSet;

use tac_core::{BlockId, CopyPair, Function, Statement, SymbolId, SymbolTable};

use super::effects::non_function_globals;

pub fn compute_available_copies(func: &mut Function, symbols: &SymbolTable) {
    let universe = collect_universe(func);
    let globals = non_function_globals(symbols);
    compute_local_sets(func, &universe, &globals);

    let entry = func.entry;
    let block_ids: Vec<_> = func.block_ids().collect();
    for &id in &block_ids {
        let b = func.block_mut(id).unwrap();
        b.avail_in = if Some(id) == entry {
            HashSet::new()
        } else {
            universe.clone()
        };
    }

    loop {
        let mut changed = false;
        for &id in &block_ids {
            if Some(id) == entry {
                continue; // AvailIn(entry) = ∅ always, regardless of predecessors
            }
            let preds = func.block(id).unwrap().preds.clone();
            let new_in = intersect_over_preds(func, &preds);
            let b = func.block_mut(id).unwrap();
            if b.avail_in != new_in {
                b.avail_in = new_in;
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }
}

fn intersect_over_preds(func: &Function, preds: &[BlockId]) -> HashSet<CopyPair> {
    let mut iter = preds.iter();
    let Some(&first) = iter.next() else {
        return HashSet::new();
    };
    let mut acc = out_set(func, first);
    for &p in iter {
        let set = out_set(func, p);
        acc = acc.intersection(&set).copied().collect();
    }
    acc
}

fn out_set(func: &Function, block: BlockId) -> HashSet<CopyPair> {
    let b = func.block(block).unwrap();
    let mut set: HashSet<CopyPair> = b.avail_in.difference(&b.copy_kill).copied().collect();
    set.extend(b.de_copies.iter().copied());
    set
}

pub(crate) fn collect_universe(func: &Function) -> HashSet<CopyPair> {
    func.stmts
        .iter()
        .filter_map(|(_, s)| match s {
            Statement::Copy { result, expr } => Some((*result, *expr)),
            _ => None,
        })
        .collect()
}

fn compute_local_sets(func: &mut Function, universe: &HashSet<CopyPair>, globals: &HashSet<SymbolId>) {
    for id in func.block_ids().collect::<Vec<_>>() {
        let (first, last) = {
            let b = func.block(id).unwrap();
            (b.first, b.last)
        };
        let mut de_copies = HashSet::new();
        let mut copy_kill = HashSet::new();
        let mut cur = func.stmts.next(first);
        while let Some(c) = cur {
            if c == last {
                break;
            }
            let stmt = func.stmts.get(c).unwrap().clone();
            apply_effect(&stmt, universe, globals, &mut de_copies, &mut copy_kill);
            cur = func.stmts.next(c);
        }
        let b = func.block_mut(id).unwrap();
        b.de_copies = de_copies;
        b.copy_kill = copy_kill;
    }
}

pub(crate) fn apply_effect(
    stmt: &Statement,
    universe: &HashSet<CopyPair>,
    globals: &HashSet<SymbolId>,
    de_copies: &mut HashSet<CopyPair>,
    copy_kill: &mut HashSet<CopyPair>,
) {
    if let Some(def) = stmt.def() {
        kill_touching(def, universe, de_copies, copy_kill);
    }
    if matches!(stmt, Statement::Call { .. }) {
        for &g in globals {
            kill_touching(g, universe, de_copies, copy_kill);
        }
    }
    if let Statement::Copy { result, expr } = stmt {
        de_copies.insert((*result, *expr));
        copy_kill.remove(&(*result, *expr));
    }
}

fn kill_touching(
    sym: SymbolId,
    universe: &HashSet<CopyPair>,
    de_copies: &mut HashSet<CopyPair>,
    copy_kill: &mut HashSet<CopyPair>,
) {
    for &pair @ (r, s) in universe {
        if r == sym || s == sym {
            copy_kill.insert(pair);
            de_copies.remove(&pair);
        }
    }
}
