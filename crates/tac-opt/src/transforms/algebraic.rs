//! Algebraic simplification: per-statement peephole identities
//! over `Binary` and `Branch`, no dataflow required. Simplifications don't
//! cascade within one invocation (e.g. `x*1*0` takes two driver iterations)
//! -- the fixed-point driver reruns this pass until nothing changes.

use tac_core::{ArithOp, BinOp, Function, RelOp, Specifier, Statement, SymbolId, SymbolTable, TypeSpec, UnOp};

use super::{literal_value, Rewrite};

pub fn run(func: &mut Function, symbols: &mut SymbolTable) -> bool {
    let mut changed = false;
    let ids: Vec<_> = func.stmts.iter().map(|(id, _)| id).collect();
    for id in ids {
        let stmt = func.stmts.get(id).unwrap().clone();
        match simplify(&stmt, symbols) {
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

fn simplify(stmt: &Statement, symbols: &mut SymbolTable) -> Rewrite {
    match stmt {
        Statement::Binary { op, result, left, right } => simplify_binary(*op, *result, *left, *right, symbols),
        Statement::Branch { op, left, right, target } => simplify_branch(*op, *left, *right, *target),
        Statement::Copy { result, expr } if result == expr => Rewrite::Delete,
        _ => Rewrite::Unchanged,
    }
}

fn zero(symbols: &mut SymbolTable) -> SymbolId {
    symbols.make_literal(0, TypeSpec::scalar(Specifier::Word))
}

fn one_value(symbols: &SymbolTable, id: SymbolId) -> bool {
    literal_value(symbols, id) == Some(1)
}

fn zero_value(symbols: &SymbolTable, id: SymbolId) -> bool {
    literal_value(symbols, id) == Some(0)
}

fn simplify_binary(
    op: BinOp,
    result: SymbolId,
    left: SymbolId,
    right: SymbolId,
    symbols: &mut SymbolTable,
) -> Rewrite {
    match op {
        BinOp::Arith(ArithOp::Add) => {
            if zero_value(symbols, right) {
                return Rewrite::Replace(Statement::Copy { result, expr: left });
            }
            if zero_value(symbols, left) {
                return Rewrite::Replace(Statement::Copy { result, expr: right });
            }
        }
        BinOp::Arith(ArithOp::Sub) => {
            if zero_value(symbols, right) {
                return Rewrite::Replace(Statement::Copy { result, expr: left });
            }
            if left == right {
                let z = zero(symbols);
                return Rewrite::Replace(Statement::Copy { result, expr: z });
            }
            if zero_value(symbols, left) {
                return Rewrite::Replace(Statement::Unary {
                    op: UnOp::Negate,
                    result,
                    expr: right,
                });
            }
        }
        BinOp::Arith(ArithOp::Mul) => {
            if one_value(symbols, right) {
                return Rewrite::Replace(Statement::Copy { result, expr: left });
            }
            if one_value(symbols, left) {
                return Rewrite::Replace(Statement::Copy { result, expr: right });
            }
            if zero_value(symbols, right) || zero_value(symbols, left) {
                let z = zero(symbols);
                return Rewrite::Replace(Statement::Copy { result, expr: z });
            }
        }
        BinOp::Arith(ArithOp::Div) => {
            if one_value(symbols, right) {
                return Rewrite::Replace(Statement::Copy { result, expr: left });
            }
            if zero_value(symbols, left) {
                let z = zero(symbols);
                return Rewrite::Replace(Statement::Copy { result, expr: z });
            }
        }
        BinOp::Rel(rel) => {
            if left == right {
                let truth = matches!(rel, RelOp::Eq | RelOp::Le | RelOp::Ge);
                let lit = symbols.make_literal(truth as i64, TypeSpec::scalar(Specifier::Word));
                return Rewrite::Replace(Statement::Copy { result, expr: lit });
            }
        }
        _ => {}
    }
    Rewrite::Unchanged
}

/// A `Branch` whose two operands are textually the same symbol is always
/// taken or never taken, independent of constant folding (which only fires
/// on literal operands).
fn simplify_branch(op: RelOp, left: SymbolId, right: SymbolId, target: tac_core::LabelId) -> Rewrite {
    if left != right {
        return Rewrite::Unchanged;
    }
    let taken = matches!(op, RelOp::Eq | RelOp::Le | RelOp::Ge);
    if taken {
        Rewrite::Replace(Statement::Jump { target })
    } else {
        Rewrite::Delete
    }
}
