//! Available-expressions analysis (forward, must).
//!
//! Structurally the same fixed point as [`super::copies`], but keyed on
//! `(op, left, right)` triples drawn from `Binary` statements rather than
//! Copy pairs. Only wired to the optional, disabled-by-default CSE pass
//! (available-expressions and CSE are half-implemented here; do not
//! promise they run").

use std::collections::HashSet;

use tac_core::{BlockId, ExprKey, Function, Statement, SymbolId, SymbolTable};

use super::effects::non_function_globals;

pub fn compute_available_expressions(func: &mut Function, symbols: &SymbolTable) {
    let universe = collect_universe(func);
    let globals = non_function_globals(symbols);
    compute_local_sets(func, &universe, &globals);

    let entry = func.entry;
    let block_ids: Vec<_> = func.block_ids().collect();
    for &id in &block_ids {
        let b = func.block_mut(id).unwrap();
        b.avail_in_exprs = if Some(id) == entry {
            HashSet::new()
        } else {
            universe.clone()
        };
    }

    loop {
        let mut changed = false;
        for &id in &block_ids {
            if Some(id) == entry {
                continue;
            }
            let preds = func.block(id).unwrap().preds.clone();
            let new_in = intersect_over_preds(func, &preds);
            let b = func.block_mut(id).unwrap();
            if b.avail_in_exprs != new_in {
                b.avail_in_exprs = new_in;
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }
}

fn intersect_over_preds(func: &Function, preds: &[BlockId]) -> HashSet<ExprKey> {
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

fn out_set(func: &Function, block: BlockId) -> HashSet<ExprKey> {
    let b = func.block(block).unwrap();
    let mut set: HashSet<ExprKey> = b.avail_in_exprs.difference(&b.expr_kill).copied().collect();
    set.extend(b.de_exprs.iter().copied());
    set
}

fn collect_universe(func: &Function) -> HashSet<ExprKey> {
    func.stmts
        .iter()
        .filter_map(|(_, s)| match s {
            Statement::Binary { op, left, right, .. } => Some(ExprKey {
                op: *op,
                left: *left,
                right: *right,
            }),
            _ => None,
        })
        .collect()
}

fn compute_local_sets(func: &mut Function, universe: &HashSet<ExprKey>, globals: &HashSet<SymbolId>) {
    for id in func.block_ids().collect::<Vec<_>>() {
        let (first, last) = {
            let b = func.block(id).unwrap();
            (b.first, b.last)
        };
        let mut de_exprs = HashSet::new();
        let mut expr_kill = HashSet::new();
        let mut cur = func.stmts.next(first);
        while let Some(c) = cur {
            if c == last {
                break;
            }
            let stmt = func.stmts.get(c).unwrap().clone();
            if let Some(def) = stmt.def() {
                kill_touching(def, universe, &mut de_exprs, &mut expr_kill);
            }
            if matches!(stmt, Statement::Call { .. }) {
                for &g in globals {
                    kill_touching(g, universe, &mut de_exprs, &mut expr_kill);
                }
            }
            if let Statement::Binary { op, left, right, .. } = &stmt {
                de_exprs.insert(ExprKey {
                    op: *op,
                    left: *left,
                    right: *right,
                });
            }
            cur = func.stmts.next(c);
        }
        let b = func.block_mut(id).unwrap();
        b.de_exprs = de_exprs;
        b.expr_kill = expr_kill;
    }
}

fn kill_touching(
    sym: SymbolId,
    universe: &HashSet<ExprKey>,
    de_exprs: &mut HashSet<ExprKey>,
    expr_kill: &mut HashSet<ExprKey>,
) {
    for &key in universe {
        if key.left == sym || key.right == sym {
            expr_kill.insert(key);
            de_exprs.remove(&key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cfg;

    #[test]
    fn avail_in_entry_is_always_empty() {
        let check_result =
            tac_frontend::compile_source("int f(int a, int b){ int x; x = a + b; return x; }").unwrap();
        let mut symbols = check_result.symbols;
        let fdef = &check_result.program.functions[0];
        let mut labels = tac_core::LabelAllocator::new();
        let mut func = tac_translate::translate_function(fdef, &mut symbols, &mut labels);
        cfg::rebuild(&mut func);
        compute_available_expressions(&mut func, &symbols);
        let entry = func.entry.unwrap();
        assert!(func.block(entry).unwrap().avail_in_exprs.is_empty());
    }
}
