//! The fixed-point optimizer driver: rebuilds the CFG once,
//! then repeatedly runs every enabled transform in a fixed order, rebuilding
//! the CFG after any transform that reports a change, until a whole
//! iteration makes no change at all.

use tac_core::{Function, SymbolTable};

use crate::{cfg, dataflow, transforms};

/// Which local transforms are enabled for one optimizer run. Each flag is
/// independent -- unlike the source's fallthrough `switch` over optimization
/// level, enabling `lvn` says nothing about `cprop`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Options {
    pub dce: bool,
    pub asimp: bool,
    pub cfold: bool,
    pub lvn: bool,
    pub cprop: bool,
    /// Not exposed by `tac-cli` -- it is an honest simplification, not a
    /// real, independently gated pass for callers that opt in directly.
    pub cse: bool,
}

impl Options {
    pub fn all() -> Self {
        Options {
            dce: true,
            asimp: true,
            cfold: true,
            lvn: true,
            cprop: true,
            cse: false,
        }
    }

    pub fn none() -> Self {
        Options::default()
    }
}

/// Runs `func` through the fixed-point pipeline. Terminates because every
/// transform either strictly reduces statement count/expression complexity
/// or rewrites a statement to a form on which it is a no-op.
pub fn optimize(func: &mut Function, symbols: &mut SymbolTable, opts: &Options) {
    cfg::rebuild(func);
    loop {
        let mut iteration_changed = false;
        dataflow::compute_live_variables(func, symbols);

        if opts.dce {
            let mut changed = transforms::dce::run_useless(func);
            changed |= transforms::dce::run_unreachable(func);
            if changed {
                cfg::rebuild(func);
                iteration_changed = true;
            }
        }

        if opts.asimp && transforms::algebraic::run(func, symbols) {
            cfg::rebuild(func);
            iteration_changed = true;
        }

        if opts.cfold && transforms::constfold::run(func, symbols) {
            cfg::rebuild(func);
            iteration_changed = true;
        }

        if opts.lvn && transforms::lvn::run(func) {
            cfg::rebuild(func);
            iteration_changed = true;
        }

        if opts.cprop {
            dataflow::compute_available_copies(func, symbols);
            if transforms::copyprop::run(func, symbols) {
                cfg::rebuild(func);
                iteration_changed = true;
            }
        }

        if opts.cse && transforms::cse::run(func) {
            cfg::rebuild(func);
            iteration_changed = true;
        }

        if !iteration_changed {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tac_core::Statement;

    fn optimize_source(src: &str) -> (Function, SymbolTable) {
        let check_result = tac_frontend::compile_source(src).expect("valid program");
        let mut symbols = check_result.symbols;
        let f = &check_result.program.functions[0];
        let mut labels = tac_core::LabelAllocator::new();
        let mut func = tac_translate::translate_function(f, &mut symbols, &mut labels);
        optimize(&mut func, &mut symbols, &Options::all());
        (func, symbols)
    }

    fn single_return_literal(func: &Function, symbols: &SymbolTable, expected: i64) {
        let returns: Vec<_> = func
            .stmts
            .iter()
            .filter_map(|(_, s)| match s {
                Statement::Return { expr } => Some(*expr),
                _ => None,
            })
            .collect();
        assert_eq!(returns.len(), 1, "expected exactly one Return, got {returns:?}");
        let expr = returns[0].expect("Return should carry a value");
        assert_eq!(
            symbols.get(expr).unwrap().name.parse::<i64>().ok(),
            Some(expected)
        );
    }

    #[test]
    fn scenario_1_constant_expression_folds_to_a_single_return() {
        let (func, symbols) = optimize_source("int f(){ int x; x = 2 + 3; return x; }");
        single_return_literal(&func, &symbols, 5);
    }

    #[test]
    fn scenario_2_add_zero_propagates_the_parameter() {
        let (func, symbols) = optimize_source("int f(int a){ int x; x = a + 0; return x; }");
        let a = func.params[0];
        let returns_a = func.stmts.iter().any(|(_, s)| match s {
            Statement::Return { expr: Some(e) } => *e == a,
            _ => false,
        });
        assert!(returns_a, "{:?}", symbols.get(a));
        assert!(!func.stmts.iter().any(|(_, s)| matches!(s, Statement::Binary { .. })));
    }

    #[test]
    fn scenario_3_self_copy_and_redundant_copy_collapse_to_the_parameter() {
        let (func, _) = optimize_source("int f(int a){ int x; x = a; x = x; return x; }");
        let a = func.params[0];
        let returns_a = func.stmts.iter().any(|(_, s)| match s {
            Statement::Return { expr: Some(e) } => *e == a,
            _ => false,
        });
        assert!(returns_a);
    }

    #[test]
    fn scenario_4_unreachable_return_after_always_taken_branch_is_deleted() {
        let (func, symbols) = optimize_source("int f(){ if (1) return 1; return 2; }");
        single_return_literal(&func, &symbols, 1);
    }

    #[test]
    fn scenario_5_multiply_by_one_then_zero_folds_to_zero() {
        let (func, symbols) = optimize_source("int f(int a){ int x; x = a*1; x = x*0; return x; }");
        single_return_literal(&func, &symbols, 0);
    }

    #[test]
    fn scenario_6_repeated_expression_becomes_one_binary_plus_a_copy() {
        let (func, _) =
            optimize_source("int f(int a,int b){ int t; t = a+b; t = a+b; return t; }");
        let binaries = func
            .stmts
            .iter()
            .filter(|(_, s)| matches!(s, Statement::Binary { .. }))
            .count();
        assert_eq!(binaries, 1, "LVN should have collapsed the repeated a+b");
    }

    #[test]
    fn running_the_optimizer_twice_is_idempotent() {
        let (mut func, mut symbols) =
            optimize_source("int f(int a,int b){ int t; t = a+b; t = a+b; return t; }");
        let before: Vec<_> = func.stmts.iter().map(|(_, s)| s.clone()).collect();
        optimize(&mut func, &mut symbols, &Options::all());
        let after: Vec<_> = func.stmts.iter().map(|(_, s)| s.clone()).collect();
        assert_eq!(before, after);
    }
}
