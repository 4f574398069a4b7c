//! Constant folding: `Binary` and `Branch` statements whose
//! operands are both literals are evaluated at compile time. Arithmetic
//! wraps at word width and division/modulo truncate toward zero, matching C
//! semantics; a literal zero divisor is left unfolded rather than panicking.

use tac_core::{ArithOp, BinOp, Function, RelOp, Specifier, Statement, SymbolTable, TypeSpec};

use super::{literal_value, Rewrite};

pub fn run(func: &mut Function, symbols: &mut SymbolTable) -> bool {
    let mut changed = false;
    let ids: Vec<_> = func.stmts.iter().map(|(id, _)| id).collect();
    for id in ids {
        let stmt = func.stmts.get(id).unwrap().clone();
        match fold(&stmt, symbols) {
            Rewrite::Unchanged => {}
            Rewrite::Replace(new_stmt) => {
                func.stmts.replace(id, new_stmt);
                changed = true;
            }
            Rewrite::Delete => {
                func.stmts.remove(id);
                changed = true;
            }
        }
    }
    changed
}

fn fold(stmt: &Statement, symbols: &mut SymbolTable) -> Rewrite {
    match stmt {
        Statement::Binary { op, result, left, right } => {
            let (Some(l), Some(r)) = (literal_value(symbols, *left), literal_value(symbols, *right)) else {
                return Rewrite::Unchanged;
            };
            match eval(*op, l, r) {
                Some(v) => {
                    let lit = symbols.make_literal(v, TypeSpec::scalar(Specifier::Word));
                    Rewrite::Replace(Statement::Copy { result: *result, expr: lit })
                }
                None => Rewrite::Unchanged,
            }
        }
        Statement::Branch { op, left, right, target } => {
            let (Some(l), Some(r)) = (literal_value(symbols, *left), literal_value(symbols, *right)) else {
                return Rewrite::Unchanged;
            };
            match eval(BinOp::Rel(*op), l, r) {
                Some(1) => Rewrite::Replace(Statement::Jump { target: *target }),
                Some(_) => Rewrite::Delete,
                None => Rewrite::Unchanged,
            }
        }
        _ => Rewrite::Unchanged,
    }
}

/// Evaluates `left op right` as 32-bit wrapping arithmetic. `None` means the
/// statement should be left alone (div/mod by a literal zero).
fn eval(op: BinOp, left: i64, right: i64) -> Option<i64> {
    let l = left as i32;
    let r = right as i32;
    let v = match op {
        BinOp::Arith(ArithOp::Add) => l.wrapping_add(r),
        BinOp::Arith(ArithOp::Sub) => l.wrapping_sub(r),
        BinOp::Arith(ArithOp::Mul) => l.wrapping_mul(r),
        BinOp::Arith(ArithOp::Div) => {
            if r == 0 {
                return None;
            }
            l.wrapping_div(r)
        }
        BinOp::Arith(ArithOp::Mod) => {
            if r == 0 {
                return None;
            }
            l.wrapping_rem(r)
        }
        BinOp::Arith(ArithOp::And) => ((l != 0) && (r != 0)) as i32,
        BinOp::Arith(ArithOp::Or) => ((l != 0) || (r != 0)) as i32,
        BinOp::Rel(rel) => {
            let truth = match rel {
                RelOp::Eq => l == r,
                RelOp::Ne => l != r,
                RelOp::Lt => l < r,
                RelOp::Le => l <= r,
                RelOp::Gt => l > r,
                RelOp::Ge => l >= r,
            };
            truth as i32
        }
    };
    Some(v as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tac_core::{ArithOp, Function, ScopeId, SymbolKind};

    fn fresh() -> (Function, SymbolTable) {
        let mut symbols = SymbolTable::new();
        let name = symbols.declare("f".into(), TypeSpec::scalar(Specifier::Word), SymbolKind::Global);
        (Function::new(name, Vec::new(), ScopeId(0)), symbols)
    }

    #[test]
    fn adds_two_literals() {
        let (mut func, mut symbols) = fresh();
        let a = symbols.make_literal(2, TypeSpec::scalar(Specifier::Word));
        let b = symbols.make_literal(3, TypeSpec::scalar(Specifier::Word));
        let result = symbols.make_temp(TypeSpec::scalar(Specifier::Word));
        func.stmts.push_back(Statement::Binary {
            op: BinOp::Arith(ArithOp::Add),
            result,
            left: a,
            right: b,
        });
        assert!(run(&mut func, &mut symbols));
        let (_, stmt) = func.stmts.iter().next().unwrap();
        match stmt {
            Statement::Copy { expr, .. } => assert_eq!(literal_value(&symbols, *expr), Some(5)),
            other => panic!("expected Copy, got {other:?}"),
        }
    }

    #[test]
    fn division_by_literal_zero_is_left_unfolded() {
        let (mut func, mut symbols) = fresh();
        let a = symbols.make_literal(7, TypeSpec::scalar(Specifier::Word));
        let z = symbols.make_literal(0, TypeSpec::scalar(Specifier::Word));
        let result = symbols.make_temp(TypeSpec::scalar(Specifier::Word));
        let id = func.stmts.push_back(Statement::Binary {
            op: BinOp::Arith(ArithOp::Div),
            result,
            left: a,
            right: z,
        });
        assert!(!run(&mut func, &mut symbols));
        assert!(matches!(func.stmts.get(id).unwrap(), Statement::Binary { .. }));
    }

    #[test]
    fn truncates_toward_zero() {
        let (mut func, mut symbols) = fresh();
        let a = symbols.make_literal(-7, TypeSpec::scalar(Specifier::Word));
        let b = symbols.make_literal(2, TypeSpec::scalar(Specifier::Word));
        let result = symbols.make_temp(TypeSpec::scalar(Specifier::Word));
        func.stmts.push_back(Statement::Binary {
            op: BinOp::Arith(ArithOp::Div),
            result,
            left: a,
            right: b,
        });
        run(&mut func, &mut symbols);
        let (_, stmt) = func.stmts.iter().next().unwrap();
        match stmt {
            Statement::Copy { expr, .. } => assert_eq!(literal_value(&symbols, *expr), Some(-3)),
            other => panic!("expected Copy, got {other:?}"),
        }
    }

    #[test]
    fn folds_logical_and_of_two_nonzero_literals_to_one() {
        let (mut func, mut symbols) = fresh();
        let a = symbols.make_literal(1, TypeSpec::scalar(Specifier::Word));
        let b = symbols.make_literal(2, TypeSpec::scalar(Specifier::Word));
        let result = symbols.make_temp(TypeSpec::scalar(Specifier::Word));
        func.stmts.push_back(Statement::Binary {
            op: BinOp::Arith(ArithOp::And),
            result,
            left: a,
            right: b,
        });
        assert!(run(&mut func, &mut symbols));
        let (_, stmt) = func.stmts.iter().next().unwrap();
        match stmt {
            Statement::Copy { expr, .. } => assert_eq!(literal_value(&symbols, *expr), Some(1)),
            other => panic!("expected Copy, got {other:?}"),
        }
    }

    #[test]
    fn folds_logical_or_of_two_zero_literals_to_zero() {
        let (mut func, mut symbols) = fresh();
        let a = symbols.make_literal(0, TypeSpec::scalar(Specifier::Word));
        let b = symbols.make_literal(0, TypeSpec::scalar(Specifier::Word));
        let result = symbols.make_temp(TypeSpec::scalar(Specifier::Word));
        func.stmts.push_back(Statement::Binary {
            op: BinOp::Arith(ArithOp::Or),
            result,
            left: a,
            right: b,
        });
        assert!(run(&mut func, &mut symbols));
        let (_, stmt) = func.stmts.iter().next().unwrap();
        match stmt {
            Statement::Copy { expr, .. } => assert_eq!(literal_value(&symbols, *expr), Some(0)),
            other => panic!("expected Copy, got {other:?}"),
        }
    }

    #[test]
    fn folds_branch_to_jump_when_taken() {
        let (mut func, mut symbols) = fresh();
        let a = symbols.make_literal(1, TypeSpec::scalar(Specifier::Word));
        let b = symbols.make_literal(1, TypeSpec::scalar(Specifier::Word));
        let mut labels = tac_core::LabelAllocator::new();
        let target = labels.fresh();
        let id = func.stmts.push_back(Statement::Branch {
            op: RelOp::Eq,
            left: a,
            right: b,
            target,
        });
        assert!(run(&mut func, &mut symbols));
        assert_eq!(func.stmts.get(id).unwrap(), &Statement::Jump { target });
    }

    #[test]
    fn folds_branch_away_when_not_taken() {
        let (mut func, mut symbols) = fresh();
        let a = symbols.make_literal(1, TypeSpec::scalar(Specifier::Word));
        let b = symbols.make_literal(2, TypeSpec::scalar(Specifier::Word));
        let mut labels = tac_core::LabelAllocator::new();
        let target = labels.fresh();
        let id = func.stmts.push_back(Statement::Branch {
            op: RelOp::Eq,
            left: a,
            right: b,
            target,
        });
        assert!(run(&mut func, &mut symbols));
        assert!(func.stmts.get(id).is_none());
    }
}
