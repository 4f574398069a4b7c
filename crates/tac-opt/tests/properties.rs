//! Property-based tests for the constant-folding/optimizer invariants
//! stated directly in terms of integer arithmetic and idempotence.

use proptest::prelude::*;
use tac_core::{ArithOp, BinOp, Function, LabelAllocator, RelOp, ScopeId, Specifier, Statement, SymbolKind, SymbolTable, TypeSpec};

fn fresh_with_literals(a: i64, b: i64) -> (Function, SymbolTable, tac_core::SymbolId, tac_core::SymbolId) {
    let mut symbols = SymbolTable::new();
    let name = symbols.declare("f".into(), TypeSpec::scalar(Specifier::Word), SymbolKind::Global);
    let func = Function::new(name, Vec::new(), ScopeId(0));
    let la = symbols.make_literal(a, TypeSpec::scalar(Specifier::Word));
    let lb = symbols.make_literal(b, TypeSpec::scalar(Specifier::Word));
    (func, symbols, la, lb)
}

fn optimized_binary(op: BinOp, a: i64, b: i64) -> Option<i64> {
    let (mut func, mut symbols, la, lb) = fresh_with_literals(a, b);
    let result = symbols.make_temp(TypeSpec::scalar(Specifier::Word));
    func.stmts.push_back(Statement::Binary { op, result, left: la, right: lb });
    tac_opt::transforms::constfold::run(&mut func, &mut symbols);
    func.stmts.iter().find_map(|(_, s)| match s {
        Statement::Copy { expr, .. } => symbols.get(*expr).unwrap().name.parse::<i64>().ok(),
        _ => None,
    })
}

proptest! {
    #[test]
    fn constant_folding_matches_wrapping_i32_add(a in any::<i32>(), b in any::<i32>()) {
        let got = optimized_binary(BinOp::Arith(ArithOp::Add), a as i64, b as i64);
        prop_assert_eq!(got, Some(a.wrapping_add(b) as i64));
    }

    #[test]
    fn constant_folding_matches_wrapping_i32_sub(a in any::<i32>(), b in any::<i32>()) {
        let got = optimized_binary(BinOp::Arith(ArithOp::Sub), a as i64, b as i64);
        prop_assert_eq!(got, Some(a.wrapping_sub(b) as i64));
    }

    #[test]
    fn constant_folding_matches_wrapping_i32_mul(a in any::<i32>(), b in any::<i32>()) {
        let got = optimized_binary(BinOp::Arith(ArithOp::Mul), a as i64, b as i64);
        prop_assert_eq!(got, Some(a.wrapping_mul(b) as i64));
    }

    #[test]
    fn constant_folding_division_truncates_toward_zero(a in any::<i32>(), b in any::<i32>()) {
        prop_assume!(b != 0);
        let got = optimized_binary(BinOp::Arith(ArithOp::Div), a as i64, b as i64);
        prop_assert_eq!(got, Some(a.wrapping_div(b) as i64));
    }

    #[test]
    fn constant_folding_modulo_takes_the_sign_of_the_dividend(a in any::<i32>(), b in any::<i32>()) {
        prop_assume!(b != 0);
        let got = optimized_binary(BinOp::Arith(ArithOp::Mod), a as i64, b as i64);
        prop_assert_eq!(got, Some(a.wrapping_rem(b) as i64));
    }

    #[test]
    fn relational_fold_matches_native_comparison(a in any::<i32>(), b in any::<i32>()) {
        let got = optimized_binary(BinOp::Rel(RelOp::Lt), a as i64, b as i64);
        prop_assert_eq!(got, Some((a < b) as i64));
    }
}

#[test]
fn optimizing_twice_reaches_the_same_statement_list() {
    let sources = [
        "int f(){ int x; x = 2 + 3; return x; }",
        "int f(int a){ int x; x = a + 0; return x; }",
        "int f(int a){ int x; x = a; x = x; return x; }",
        "int f(){ if (1) return 1; return 2; }",
        "int f(int a){ int x; x = a*1; x = x*0; return x; }",
        "int f(int a,int b){ int t; t = a+b; t = a+b; return t; }",
        "int f(int a){ while(a) a = a - 1; return a; }",
    ];
    for src in sources {
        let check_result = tac_frontend::compile_source(src).expect("valid program");
        let mut symbols = check_result.symbols;
        let f = &check_result.program.functions[0];
        let mut labels = LabelAllocator::new();
        let mut func = tac_translate::translate_function(f, &mut symbols, &mut labels);
        tac_opt::optimize(&mut func, &mut symbols, &tac_opt::Options::all());
        let once: Vec<_> = func.stmts.iter().map(|(_, s)| s.clone()).collect();
        tac_opt::optimize(&mut func, &mut symbols, &tac_opt::Options::all());
        let twice: Vec<_> = func.stmts.iter().map(|(_, s)| s.clone()).collect();
        assert_eq!(once, twice, "not idempotent for {src:?}");
    }
}
