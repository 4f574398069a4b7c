//! Copy propagation: forward-substitutes copy sources for their
//! results wherever the copy is still available, using each block's
//! `avail_in` set (from [`crate::dataflow::copies`]) as the seed.

use std::collections::HashMap;

use tac_core::{Function, Statement, SymbolTable};

use crate::dataflow::copies::{apply_effect, collect_universe};

pub fn run(func: &mut Function, symbols: &SymbolTable) -> bool {
    let mut changed = false;
    // The kill universe has to be every copy pair in the whole function, not
    // just this block's avail_in: a copy generated earlier in this same
    // block is not in avail_in, but its source can still be overwritten
    // later in the block, and that has to invalidate it too.
    let universe = collect_universe(func);
    for id in func.block_ids().collect::<Vec<_>>() {
        let (first, last, avail_in) = {
            let b = func.block(id).unwrap();
            (b.first, b.last, b.avail_in.clone())
        };
        let globals = crate::dataflow::effects::non_function_globals(symbols);
        let mut sub: HashMap<_, _> = avail_in.into_iter().collect();

        let mut cur = func.stmts.next(first);
        while let Some(c) = cur {
            if c == last {
                break;
            }
            let mut stmt = func.stmts.get(c).unwrap().clone();
            if substitute(&mut stmt, &sub) {
                func.stmts.replace(c, stmt.clone());
                changed = true;
            }

            let mut de_copies = std::collections::HashSet::new();
            let mut copy_kill = std::collections::HashSet::new();
            apply_effect(&stmt, &universe, &globals, &mut de_copies, &mut copy_kill);
            for &(r, _) in &copy_kill {
                sub.remove(&r);
            }
            for &(r, s) in &de_copies {
                sub.insert(r, s);
            }

            cur = func.stmts.next(c);
        }
    }
    changed
}

/// Replaces every use in `stmt` with its substitute, if any; returns whether
/// anything changed. `Copy { result, expr }`'s own `expr` is substituted
/// like any other use -- this is what lets chains of copies collapse.
fn substitute(stmt: &mut Statement, sub: &HashMap<tac_core::SymbolId, tac_core::SymbolId>) -> bool {
    let mut changed = false;
    let mut sub_one = |s: &mut tac_core::SymbolId| {
        if let Some(&r) = sub.get(s) {
            if r != *s {
                *s = r;
                changed = true;
            }
        }
    };
    match stmt {
        Statement::Branch { left, right, .. } => {
            sub_one(left);
            sub_one(right);
        }
        Statement::Call { args, .. } => {
            for a in args {
                sub_one(a);
            }
        }
        Statement::Return { expr: Some(e) } => sub_one(e),
        Statement::Binary { left, right, .. } => {
            sub_one(left);
            sub_one(right);
        }
        Statement::Unary { expr, .. } => sub_one(expr),
        Statement::Copy { expr, .. } => sub_one(expr),
        Statement::Index { array, index, .. } => {
            sub_one(array);
            sub_one(index);
        }
        Statement::Update { array, index, expr } => {
            sub_one(array);
            sub_one(index);
            sub_one(expr);
        }
        _ => {}
    }
    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{cfg, dataflow};

    fn optimized(src: &str) -> Function {
        let check_result = tac_frontend::compile_source(src).expect("valid program");
        let mut symbols = check_result.symbols;
        let f = &check_result.program.functions[0];
        let mut labels = tac_core::LabelAllocator::new();
        let mut func = tac_translate::translate_function(f, &mut symbols, &mut labels);
        cfg::rebuild(&mut func);
        dataflow::compute_available_copies(&mut func, &symbols);
        run(&mut func, &symbols);
        func
    }

    #[test]
    fn copy_source_is_substituted_into_later_use() {
        let func = optimized("int f(int a){ int x; int y; x = a; y = x + x; return y; }");
        // After propagation the Binary's operands should both resolve to `a`.
        let uses_a_twice = func.stmts.iter().any(|(_, s)| {
            if let Statement::Binary { left, right, .. } = s {
                left == right
            } else {
                false
            }
        });
        assert!(uses_a_twice);
    }

    #[test]
    fn copy_source_overwritten_later_in_the_same_block_stops_propagating() {
        // x := a; a := a + 1; y := x -- the copy x->a must not still
        // propagate into `y := x` once `a` has been redefined in this same
        // block, even though that redefinition never appears in avail_in.
        let func = optimized(
            "int f(int a){ int x; int y; x = a; a = a + 1; y = x; return y; }",
        );
        let a = func.params[0];
        let copies_of_a = func
            .stmts
            .iter()
            .filter(|(_, s)| matches!(s, Statement::Copy { expr, .. } if *expr == a))
            .count();
        // Only `x := a` should ever read `a` directly through a Copy. If the
        // stale x->a mapping survived past `a`'s redefinition, `y := x`
        // would also have been rewritten to `y := a`.
        assert_eq!(copies_of_a, 1, "y must not be rewritten to the post-increment `a`");
    }

    #[test]
    fn call_kills_propagated_globals() {
        let func = optimized(
            "int g; int h(); int f(){ int x; g = 1; x = g; h(); return x; }",
        );
        assert!(func.block_ids().count() >= 1);
    }
}
