//! AST-to-TAC translation.
//!
//! Each function is framed by a leading Label, a Null, a second Label, the
//! generated body, and a trailing Label, so the first and last basic blocks
//! can never collapse to empty once the CFG is built. Expression lowering
//! is post-order: recurse into children, assign a fresh temp to the parent,
//! emit the corresponding statement. Literals and already-resolved symbols
//! never need a statement of their own.

use std::collections::HashMap;

use tac_core::{
    ArithOp, BinOp, Function, LabelAllocator, RelOp, Specifier, Statement, SymbolId, SymbolTable,
    TypeSpec,
};
use tac_frontend::resolved;

struct Ctx<'a> {
    symbols: &'a mut SymbolTable,
    labels: &'a mut LabelAllocator,
    func: &'a mut Function,
}

impl<'a> Ctx<'a> {
    fn emit(&mut self, stmt: Statement) {
        self.func.stmts.push_back(stmt);
    }

    fn fresh_temp(&mut self, ty: TypeSpec) -> SymbolId {
        self.symbols.make_temp(ty)
    }

    fn literal(&mut self, n: i64) -> SymbolId {
        self.symbols.make_literal(n, TypeSpec::scalar(Specifier::Word))
    }

    fn symbol_type(&self, id: SymbolId) -> TypeSpec {
        self.symbols
            .get(id)
            .map(|s| s.ty.clone())
            .unwrap_or_else(|| TypeSpec::scalar(Specifier::Word))
    }

    /// Scales an index symbol by the array's element size (array
    /// indexing scales the index when the element is larger than one byte).
    fn scale_index(&mut self, array: SymbolId, index: SymbolId) -> SymbolId {
        let elem_size = self.symbol_type(array).element_size();
        if elem_size <= 1 {
            return index;
        }
        let size_lit = self.literal(elem_size as i64);
        let result = self.fresh_temp(TypeSpec::scalar(Specifier::Word));
        self.emit(Statement::Binary {
            op: BinOp::Arith(ArithOp::Mul),
            result,
            left: index,
            right: size_lit,
        });
        result
    }

    /// Lowers an expression to the symbol holding its value, emitting
    /// whatever statements are needed to compute it.
    fn lower_expr(&mut self, expr: &resolved::Expr) -> SymbolId {
        match expr {
            resolved::Expr::Symbol(id) => *id,
            resolved::Expr::Index { array, index } => {
                let idx = self.lower_expr(index);
                let scaled = self.scale_index(*array, idx);
                let ty = self.symbol_type(*array);
                let result = self.fresh_temp(TypeSpec::scalar(ty.specifier));
                self.emit(Statement::Index {
                    result,
                    array: *array,
                    index: scaled,
                });
                result
            }
            resolved::Expr::Call { func, args } => self.lower_call(*func, args, true).unwrap(),
            resolved::Expr::Negate(e) => {
                let v = self.lower_expr(e);
                let result = self.fresh_temp(self.symbol_type(v));
                self.emit(Statement::Unary {
                    op: tac_core::UnOp::Negate,
                    result,
                    expr: v,
                });
                result
            }
            // `!e` lowers as the value expression `e == 0` -- Unary carries
            // only NEGATE and widen-byte-to-word, so logical not is
            // expressed through Binary's relational form instead.
            resolved::Expr::Not(e) => {
                let v = self.lower_expr(e);
                let zero = self.literal(0);
                let result = self.fresh_temp(TypeSpec::scalar(Specifier::Word));
                self.emit(Statement::Binary {
                    op: BinOp::Rel(RelOp::Eq),
                    result,
                    left: v,
                    right: zero,
                });
                result
            }
            resolved::Expr::Arith { op, left, right } => {
                let l = self.lower_expr(left);
                let r = self.lower_expr(right);
                let result = self.fresh_temp(TypeSpec::scalar(Specifier::Word));
                self.emit(Statement::Binary {
                    op: BinOp::Arith(arith_op(*op)),
                    result,
                    left: l,
                    right: r,
                });
                result
            }
            resolved::Expr::Rel { op, left, right } => {
                let l = self.lower_expr(left);
                let r = self.lower_expr(right);
                let result = self.fresh_temp(TypeSpec::scalar(Specifier::Word));
                self.emit(Statement::Binary {
                    op: BinOp::Rel(*op),
                    result,
                    left: l,
                    right: r,
                });
                result
            }
            resolved::Expr::Logic { op, left, right } => {
                let l = self.lower_expr(left);
                let r = self.lower_expr(right);
                let result = self.fresh_temp(TypeSpec::scalar(Specifier::Word));
                let arith = match op {
                    resolved::LogicOp::And => ArithOp::And,
                    resolved::LogicOp::Or => ArithOp::Or,
                };
                self.emit(Statement::Binary {
                    op: BinOp::Arith(arith),
                    result,
                    left: l,
                    right: r,
                });
                result
            }
        }
    }

    /// Lowers a call. `want_result` is false for a bare call statement,
    /// whose value (if any) is discarded.
    fn lower_call(&mut self, func: SymbolId, args: &[resolved::Expr], want_result: bool) -> Option<SymbolId> {
        let arg_syms: Vec<_> = args.iter().map(|a| self.lower_expr(a)).collect();
        let return_ty = self
            .symbols
            .get(func)
            .and_then(|s| s.ty.function.as_ref())
            .map(|sig| (*sig.return_type).clone())
            .unwrap_or_else(|| TypeSpec::scalar(Specifier::Word));
        let result = if want_result {
            Some(self.fresh_temp(return_ty))
        } else {
            None
        };
        self.emit(Statement::Call {
            result,
            func,
            args: arg_syms,
        });
        result
    }

    fn lower_assignment(&mut self, a: &resolved::Assignment) {
        match a {
            resolved::Assignment::Scalar { target, rhs } => {
                let v = self.lower_expr(rhs);
                self.emit(Statement::Copy {
                    result: *target,
                    expr: v,
                });
            }
            resolved::Assignment::Element { array, index, rhs } => {
                let idx = self.lower_expr(index);
                let scaled = self.scale_index(*array, idx);
                let v = self.lower_expr(rhs);
                self.emit(Statement::Update {
                    array: *array,
                    index: scaled,
                    expr: v,
                });
            }
            resolved::Assignment::Call(expr) => {
                if let resolved::Expr::Call { func, args } = expr {
                    self.lower_call(*func, args, false);
                } else {
                    self.lower_expr(expr);
                }
            }
        }
    }

    /// Boolean short-circuit: emits branches to `target` rather than
    /// materializing a value -- this is the `test(node, target, if_true)`
    /// recursion, not an ordinary expression evaluation.
    fn test(&mut self, expr: &resolved::Expr, target: tac_core::LabelId, if_true: bool) {
        match expr {
            resolved::Expr::Not(e) => self.test(e, target, !if_true),
            resolved::Expr::Rel { op, left, right } => {
                let l = self.lower_expr(left);
                let r = self.lower_expr(right);
                let op = if if_true { *op } else { op.inverse() };
                self.emit(Statement::Branch {
                    op,
                    left: l,
                    right: r,
                    target,
                });
            }
            resolved::Expr::Logic {
                op: resolved::LogicOp::And,
                left,
                right,
            } => {
                if if_true {
                    let skip = self.labels.fresh();
                    self.test(left, skip, false);
                    self.test(right, target, true);
                    self.emit(Statement::Label(skip));
                } else {
                    self.test(left, target, false);
                    self.test(right, target, false);
                }
            }
            resolved::Expr::Logic {
                op: resolved::LogicOp::Or,
                left,
                right,
            } => {
                if if_true {
                    self.test(left, target, true);
                    self.test(right, target, true);
                } else {
                    let skip = self.labels.fresh();
                    self.test(left, skip, true);
                    self.test(right, target, false);
                    self.emit(Statement::Label(skip));
                }
            }
            _ => {
                let v = self.lower_expr(expr);
                let zero = self.literal(0);
                let op = if if_true { RelOp::Ne } else { RelOp::Eq };
                self.emit(Statement::Branch {
                    op,
                    left: v,
                    right: zero,
                    target,
                });
            }
        }
    }

    fn lower_stmt(&mut self, stmt: &resolved::Stmt) {
        match stmt {
            resolved::Stmt::Block(stmts) => {
                for s in stmts {
                    self.lower_stmt(s);
                }
            }
            resolved::Stmt::If {
                cond,
                then_branch,
                else_branch: None,
            } => {
                let skip = self.labels.fresh();
                self.test(cond, skip, false);
                self.lower_stmt(then_branch);
                self.emit(Statement::Label(skip));
            }
            resolved::Stmt::If {
                cond,
                then_branch,
                else_branch: Some(else_branch),
            } => {
                let else_label = self.labels.fresh();
                let end_label = self.labels.fresh();
                self.test(cond, else_label, false);
                self.lower_stmt(then_branch);
                self.emit(Statement::Jump { target: end_label });
                self.emit(Statement::Label(else_label));
                self.lower_stmt(else_branch);
                self.emit(Statement::Label(end_label));
            }
            resolved::Stmt::While { cond, body } => {
                let top = self.labels.fresh();
                let exit = self.labels.fresh();
                self.emit(Statement::Label(top));
                self.test(cond, exit, false);
                self.lower_stmt(body);
                self.emit(Statement::Jump { target: top });
                self.emit(Statement::Label(exit));
            }
            resolved::Stmt::DoWhile { body, cond } => {
                let top = self.labels.fresh();
                self.emit(Statement::Label(top));
                self.lower_stmt(body);
                self.test(cond, top, true);
            }
            resolved::Stmt::For { init, cond, step, body } => {
                self.lower_assignment(init);
                let top = self.labels.fresh();
                let exit = self.labels.fresh();
                self.emit(Statement::Label(top));
                self.test(cond, exit, false);
                self.lower_stmt(body);
                self.lower_assignment(step);
                self.emit(Statement::Jump { target: top });
                self.emit(Statement::Label(exit));
            }
            resolved::Stmt::Return(expr) => {
                let v = self.lower_expr(expr);
                self.emit(Statement::Return { expr: Some(v) });
                let l = self.labels.fresh();
                self.emit(Statement::Label(l));
            }
            resolved::Stmt::Expr(a) => self.lower_assignment(a),
        }
    }
}

fn arith_op(op: resolved::ArithOp) -> ArithOp {
    match op {
        resolved::ArithOp::Add => ArithOp::Add,
        resolved::ArithOp::Sub => ArithOp::Sub,
        resolved::ArithOp::Mul => ArithOp::Mul,
        resolved::ArithOp::Div => ArithOp::Div,
        resolved::ArithOp::Mod => ArithOp::Mod,
    }
}

/// Translates one checked function into its TAC statement list. The
/// function's block graph is left empty -- `tac-opt`'s CFG builder
/// constructs it from the statement list on the first fixed-point pass.
pub fn translate_function(f: &resolved::Function, symbols: &mut SymbolTable, labels: &mut LabelAllocator) -> Function {
    let mut func = Function::new(f.symbol, f.params.clone(), f.scope);
    {
        let mut ctx = Ctx {
            symbols,
            labels,
            func: &mut func,
        };
        let l0 = ctx.labels.fresh();
        ctx.emit(Statement::Label(l0));
        ctx.emit(Statement::Null);
        let l1 = ctx.labels.fresh();
        ctx.emit(Statement::Label(l1));
        for stmt in &f.body {
            ctx.lower_stmt(stmt);
        }
        let l_end = ctx.labels.fresh();
        ctx.emit(Statement::Label(l_end));
    }
    func
}

/// Translates every function in a checked program.
pub fn translate_program(program: &resolved::Program, symbols: &mut SymbolTable) -> HashMap<SymbolId, Function> {
    let mut labels = LabelAllocator::new();
    program
        .functions
        .iter()
        .map(|f| (f.symbol, translate_function(f, symbols, &mut labels)))
        .collect()
}
