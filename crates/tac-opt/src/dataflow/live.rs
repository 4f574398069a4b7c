//! Live-variable analysis (backward, may).
//!
//! For each block, `UEVar` (upward-exposed uses) and `VarKill` (locally
//! killed symbols) are computed in one forward walk -- a use counts as
//! upward-exposed only if nothing earlier in the block already killed that
//! symbol; a reverse walk would let a later kill in program order suppress
//! an earlier genuinely upward-exposed use. `LiveOut` is then iterated to a
//! fixed point over the whole CFG. `LiveOut` starts empty
//! everywhere except the exit block, which starts as the set of scalar
//! globals -- a call anywhere in the function might still read them after
//! this function returns.

use std::collections::HashSet;

use tac_core::{Function, Statement, SymbolTable};

use super::effects::non_function_globals;

pub fn compute_live_variables(func: &mut Function, symbols: &SymbolTable) {
    compute_local_sets(func, symbols);

    let exit = func.exit;
    let globals = non_function_globals(symbols);
    let block_ids: Vec<_> = func.block_ids().collect();
    for &id in &block_ids {
        let b = func.block_mut(id).unwrap();
        b.live_out = if Some(id) == exit {
            globals.clone()
        } else {
            HashSet::new()
        };
    }

    loop {
        let mut changed = false;
        for &id in block_ids.iter().rev() {
            let succs = func.block(id).unwrap().succs.clone();
            let mut new_live_out = HashSet::new();
            for s in succs {
                let sb = func.block(s).unwrap();
                new_live_out.extend(sb.ue_var.iter().copied());
                new_live_out.extend(sb.live_out.difference(&sb.var_kill).copied());
            }
            let b = func.block_mut(id).unwrap();
            if b.live_out != new_live_out {
                b.live_out = new_live_out;
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }
}

fn compute_local_sets(func: &mut Function, symbols: &SymbolTable) {
    let globals = non_function_globals(symbols);
    for id in func.block_ids().collect::<Vec<_>>() {
        let (first, last) = {
            let b = func.block(id).unwrap();
            (b.first, b.last)
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

        // Forward walk: a use counts as upward-exposed iff no earlier
        // statement in this block has already killed that symbol. Walking
        // in reverse would let a later kill in the block suppress an
        // earlier, genuinely upward-exposed use.
        let mut ue_var = HashSet::new();
        let mut var_kill = HashSet::new();
        for &sid in real.iter() {
            let stmt = func.stmts.get(sid).unwrap();
            let mut gens: Vec<_> = stmt
                .uses()
                .into_iter()
                .filter(|s| !symbols.is_number(*s))
                .collect();
            if matches!(stmt, Statement::Call { .. }) {
                gens.extend(globals.iter().copied());
            }
            for g in gens {
                if !var_kill.contains(&g) {
                    ue_var.insert(g);
                }
            }
            if let Some(k) = stmt.def() {
                var_kill.insert(k);
            }
        }

        let b = func.block_mut(id).unwrap();
        b.ue_var = ue_var;
        b.var_kill = var_kill;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cfg;

    fn analyzed(src: &str) -> (Function, SymbolTable) {
        let check_result = tac_frontend::compile_source(src).expect("valid program");
        let mut symbols = check_result.symbols;
        let f = &check_result.program.functions[0];
        let mut labels = tac_core::LabelAllocator::new();
        let mut func = tac_translate::translate_function(f, &mut symbols, &mut labels);
        cfg::rebuild(&mut func);
        compute_live_variables(&mut func, &symbols);
        (func, symbols)
    }

    #[test]
    fn param_used_only_in_return_is_live_into_that_block() {
        let (func, symbols) = analyzed("int f(int a){ int x; x = 1; return a; }");
        let a_sym = func.params[0];
        let has_block_with_a_ue = func
            .block_ids()
            .any(|b| func.block(b).unwrap().ue_var.contains(&a_sym));
        assert!(has_block_with_a_ue, "{:?}", symbols.get(a_sym));
    }

    #[test]
    fn use_before_a_later_kill_in_the_same_block_is_upward_exposed() {
        // `n` is read by `t0 := n - 1` before `n := t0` redefines it, so
        // `n` must be upward-exposed even though the same block kills it
        // afterward.
        let (func, symbols) = analyzed("int f(int n){ while(n) n = n - 1; return n; }");
        let n = func.params[0];
        let has_ue_n = func
            .block_ids()
            .any(|b| func.block(b).unwrap().ue_var.contains(&n));
        assert!(has_ue_n, "{:?}", symbols.get(n));
    }

    #[test]
    fn locally_killed_variable_is_recorded_in_var_kill() {
        let (func, _) = analyzed("int f(){ int x; int y; x = 1; y = 2; return y; }");
        let entry = func.entry.unwrap();
        assert!(!func.block(entry).unwrap().var_kill.is_empty());
    }

    #[test]
    fn live_out_satisfies_transfer_equation_at_fixed_point() {
        let (func, _) = analyzed("int f(int a){ while(a) a = a - 1; return a; }");
        for id in func.block_ids() {
            let succs = func.block(id).unwrap().succs.clone();
            let mut expected = HashSet::new();
            for s in succs {
                let sb = func.block(s).unwrap();
                expected.extend(sb.ue_var.iter().copied());
                expected.extend(sb.live_out.difference(&sb.var_kill).copied());
            }
            assert_eq!(func.block(id).unwrap().live_out, expected);
        }
    }
}
