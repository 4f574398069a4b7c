//! Semantic checking: a single pass over the parsed AST that builds the
//! symbol table and scope tree, resolves every name, and collects
//! diagnostics for undeclared names, redeclarations, and call mismatches.
//! Like the parser, it gathers every error in one pass rather than
//! stopping at the first.

use tac_core::{Specifier, SymbolId, SymbolKind, SymbolTable, TypeSpec};

use crate::ast;
use crate::error::FrontendError;
use crate::resolved;

pub struct CheckResult {
    pub program: resolved::Program,
    pub symbols: SymbolTable,
    pub scopes: tac_core::ScopeTree,
    pub errors: Vec<FrontendError>,
}

struct Checker {
    symbols: SymbolTable,
    scopes: tac_core::ScopeTree,
    errors: Vec<FrontendError>,
}

impl Checker {
    fn declare_unique(
        &mut self,
        scope: tac_core::ScopeId,
        name: &str,
        ty: TypeSpec,
        kind: SymbolKind,
        line: u32,
    ) -> SymbolId {
        if self
            .scopes
            .symbols(scope)
            .iter()
            .any(|&id| self.symbols.get(id).map(|s| s.name.as_str()) == Some(name))
        {
            self.errors.push(FrontendError::Redeclared {
                line,
                name: name.to_string(),
            });
        }
        let id = self.symbols.declare(name.to_string(), ty, kind);
        self.scopes.declare(scope, id);
        id
    }

    fn lookup(&mut self, scope: tac_core::ScopeId, name: &str, line: u32) -> Option<SymbolId> {
        match self.scopes.lookup(&self.symbols, scope, name) {
            Some(id) => Some(id),
            None => {
                self.errors.push(FrontendError::Undeclared {
                    line,
                    name: name.to_string(),
                });
                None
            }
        }
    }

    fn resolve_expr(&mut self, scope: tac_core::ScopeId, expr: &ast::Expr) -> resolved::Expr {
        match expr {
            ast::Expr::Num(n, _) => {
                let id = self.symbols.make_literal(*n, TypeSpec::scalar(Specifier::Word));
                resolved::Expr::Symbol(id)
            }
            ast::Expr::StrLit(s, _) => {
                let mut ty = TypeSpec::scalar(Specifier::Byte);
                ty.pointer = true;
                let id = self.symbols.make_strlit(s, ty);
                resolved::Expr::Symbol(id)
            }
            ast::Expr::CharLit(c, _) => {
                let id = self.symbols.make_charlit(*c, TypeSpec::scalar(Specifier::Byte));
                resolved::Expr::Symbol(id)
            }
            ast::Expr::Name(name, line) => match self.lookup(scope, name, *line) {
                Some(id) => resolved::Expr::Symbol(id),
                None => resolved::Expr::Symbol(self.symbols.make_literal(0, TypeSpec::scalar(Specifier::Word))),
            },
            ast::Expr::Index { array, index, line } => {
                let idx = self.resolve_expr(scope, index);
                match self.lookup(scope, array, *line) {
                    Some(id) => {
                        if !self.symbols.get(id).map(|s| s.ty.is_array()).unwrap_or(true) {
                            self.errors.push(FrontendError::NotAnArray {
                                line: *line,
                                name: array.clone(),
                            });
                        }
                        resolved::Expr::Index {
                            array: id,
                            index: Box::new(idx),
                        }
                    }
                    None => idx,
                }
            }
            ast::Expr::Call { name, args, line } => {
                let resolved_args: Vec<_> = args.iter().map(|a| self.resolve_expr(scope, a)).collect();
                match self.lookup(scope, name, *line) {
                    Some(id) => {
                        let expected = self.symbols.get(id).map(|s| s.ty.parameters().len());
                        match expected {
                            Some(n) if !self.symbols.get(id).unwrap().ty.is_function() => {
                                self.errors.push(FrontendError::NotAFunction {
                                    line: *line,
                                    name: name.clone(),
                                });
                                let _ = n;
                            }
                            Some(n) if n != resolved_args.len() => {
                                self.errors.push(FrontendError::ArityMismatch {
                                    line: *line,
                                    name: name.clone(),
                                    expected: n,
                                    got: resolved_args.len(),
                                });
                            }
                            _ => {}
                        }
                        resolved::Expr::Call {
                            func: id,
                            args: resolved_args,
                        }
                    }
                    None => resolved::Expr::Call {
                        func: self.symbols.make_literal(0, TypeSpec::scalar(Specifier::Word)),
                        args: resolved_args,
                    },
                }
            }
            ast::Expr::Negate(e, _) => resolved::Expr::Negate(Box::new(self.resolve_expr(scope, e))),
            ast::Expr::Not(e, _) => resolved::Expr::Not(Box::new(self.resolve_expr(scope, e))),
            ast::Expr::Arith { op, left, right } => resolved::Expr::Arith {
                op: (*op).into(),
                left: Box::new(self.resolve_expr(scope, left)),
                right: Box::new(self.resolve_expr(scope, right)),
            },
            ast::Expr::Rel { op, left, right } => resolved::Expr::Rel {
                op: (*op).into(),
                left: Box::new(self.resolve_expr(scope, left)),
                right: Box::new(self.resolve_expr(scope, right)),
            },
            ast::Expr::Logic { op, left, right } => resolved::Expr::Logic {
                op: match op {
                    ast::LogicOp::And => resolved::LogicOp::And,
                    ast::LogicOp::Or => resolved::LogicOp::Or,
                },
                left: Box::new(self.resolve_expr(scope, left)),
                right: Box::new(self.resolve_expr(scope, right)),
            },
        }
    }

    fn resolve_assignment(&mut self, scope: tac_core::ScopeId, a: &ast::Assignment) -> resolved::Assignment {
        match a {
            ast::Assignment::Scalar { name, rhs, line } => {
                let rhs = self.resolve_expr(scope, rhs);
                match self.lookup(scope, name, *line) {
                    Some(target) => resolved::Assignment::Scalar { target, rhs },
                    None => resolved::Assignment::Call(rhs),
                }
            }
            ast::Assignment::Element { array, index, rhs, line } => {
                let index = self.resolve_expr(scope, index);
                let rhs = self.resolve_expr(scope, rhs);
                match self.lookup(scope, array, *line) {
                    Some(id) => {
                        if !self.symbols.get(id).map(|s| s.ty.is_array()).unwrap_or(true) {
                            self.errors.push(FrontendError::NotAnArray {
                                line: *line,
                                name: array.clone(),
                            });
                        }
                        resolved::Assignment::Element { array: id, index, rhs }
                    }
                    None => resolved::Assignment::Call(rhs),
                }
            }
            ast::Assignment::Call(expr) => resolved::Assignment::Call(self.resolve_expr(scope, expr)),
        }
    }

    fn resolve_stmt(&mut self, scope: tac_core::ScopeId, stmt: &ast::Stmt) -> resolved::Stmt {
        match stmt {
            ast::Stmt::Block(stmts) => {
                resolved::Stmt::Block(stmts.iter().map(|s| self.resolve_stmt(scope, s)).collect())
            }
            ast::Stmt::If {
                cond,
                then_branch,
                else_branch,
            } => resolved::Stmt::If {
                cond: self.resolve_expr(scope, cond),
                then_branch: Box::new(self.resolve_stmt(scope, then_branch)),
                else_branch: else_branch.as_ref().map(|s| Box::new(self.resolve_stmt(scope, s))),
            },
            ast::Stmt::While { cond, body } => resolved::Stmt::While {
                cond: self.resolve_expr(scope, cond),
                body: Box::new(self.resolve_stmt(scope, body)),
            },
            ast::Stmt::DoWhile { body, cond } => resolved::Stmt::DoWhile {
                body: Box::new(self.resolve_stmt(scope, body)),
                cond: self.resolve_expr(scope, cond),
            },
            ast::Stmt::For { init, cond, step, body } => resolved::Stmt::For {
                init: self.resolve_assignment(scope, init),
                cond: self.resolve_expr(scope, cond),
                step: self.resolve_assignment(scope, step),
                body: Box::new(self.resolve_stmt(scope, body)),
            },
            ast::Stmt::Return(expr, _) => resolved::Stmt::Return(self.resolve_expr(scope, expr)),
            ast::Stmt::Expr(a) => resolved::Stmt::Expr(self.resolve_assignment(scope, a)),
        }
    }
}

fn function_type(f: &ast::FunctionDecl) -> TypeSpec {
    let params = f
        .params
        .iter()
        .map(|p| {
            if p.is_array {
                TypeSpec::array(p.specifier, 0)
            } else {
                TypeSpec::scalar(p.specifier)
            }
        })
        .collect();
    TypeSpec::function(params, TypeSpec::scalar(f.return_specifier))
}

/// Runs semantic checking over a parsed [`ast::Program`], producing the
/// resolved tree the translator consumes along with the symbol table,
/// scope tree, and any diagnostics found.
pub fn check(program: &ast::Program) -> CheckResult {
    let mut checker = Checker {
        symbols: SymbolTable::new(),
        scopes: tac_core::ScopeTree::new(),
        errors: Vec::new(),
    };
    let root = checker.scopes.new_root();

    for g in &program.globals {
        let ty = match g.array_length {
            Some(len) => TypeSpec::array(g.specifier, len),
            None => TypeSpec::scalar(g.specifier),
        };
        checker.declare_unique(root, &g.name, ty, SymbolKind::Global, g.line);
    }

    let mut func_symbols = Vec::new();
    for f in &program.functions {
        let ty = function_type(f);
        let id = checker.declare_unique(root, &f.name, ty, SymbolKind::Global, f.line);
        func_symbols.push(id);
    }

    let mut resolved_functions = Vec::new();
    for (f, &symbol) in program.functions.iter().zip(&func_symbols) {
        let scope = checker.scopes.new_child(root);
        let mut params = Vec::new();
        for p in &f.params {
            let ty = if p.is_array {
                TypeSpec::array(p.specifier, 0)
            } else {
                TypeSpec::scalar(p.specifier)
            };
            params.push(checker.declare_unique(scope, &p.name, ty, SymbolKind::Local, f.line));
        }
        for local in &f.locals {
            let ty = match local.array_length {
                Some(len) => TypeSpec::array(local.specifier, len),
                None => TypeSpec::scalar(local.specifier),
            };
            checker.declare_unique(scope, &local.name, ty, SymbolKind::Local, local.line);
        }

        let body = f.body.iter().map(|s| checker.resolve_stmt(scope, s)).collect();
        resolved_functions.push(resolved::Function {
            symbol,
            params,
            scope,
            body,
        });
    }

    CheckResult {
        program: resolved::Program {
            functions: resolved_functions,
        },
        symbols: checker.symbols,
        scopes: checker.scopes,
        errors: checker.errors,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    #[test]
    fn resolves_simple_function_with_no_errors() {
        let (program, parse_errors) = parse("int f(){ int x; x = 2 + 3; return x; }");
        assert!(parse_errors.is_empty());
        let result = check(&program);
        assert!(result.errors.is_empty(), "{:?}", result.errors);
        assert_eq!(result.program.functions.len(), 1);
    }

    #[test]
    fn reports_undeclared_name() {
        let (program, _) = parse("int f(){ return y; }");
        let result = check(&program);
        assert!(result
            .errors
            .iter()
            .any(|e| matches!(e, FrontendError::Undeclared { name, .. } if name == "y")));
    }

    #[test]
    fn reports_redeclaration_in_same_scope() {
        let (program, _) = parse("int f(){ int x; int x; return x; }");
        let result = check(&program);
        assert!(result
            .errors
            .iter()
            .any(|e| matches!(e, FrontendError::Redeclared { name, .. } if name == "x")));
    }

    #[test]
    fn reports_arity_mismatch_on_call() {
        let (program, _) = parse("int g(int a){ return a; } int f(){ return g(1, 2); }");
        let result = check(&program);
        assert!(result.errors.iter().any(|e| matches!(
            e,
            FrontendError::ArityMismatch { expected: 1, got: 2, .. }
        )));
    }

    #[test]
    fn reports_not_an_array_on_scalar_index() {
        let (program, _) = parse("int f(){ int x; x = 0; return x[0]; }");
        let result = check(&program);
        assert!(result
            .errors
            .iter()
            .any(|e| matches!(e, FrontendError::NotAnArray { .. })));
    }

    #[test]
    fn inner_local_shadows_outer_global() {
        let (program, _) = parse("int g; int f(){ int g; g = 1; return g; }");
        let result = check(&program);
        assert!(result.errors.is_empty());
    }
}
