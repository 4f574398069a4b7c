//! Recursive-descent parser.
//!
//! Grammar and precedence chain follow the source language directly:
//! primary → unary → multiplicative → additive → relational → equality →
//! and → or (`expression`) → assignment. Errors are collected rather than
//! raised immediately: a syntax error synchronizes to the next `;` or
//! `}` and parsing continues, so one bad statement doesn't hide the rest.

use tac_core::Specifier;

use crate::ast::*;
use crate::error::FrontendError;
use crate::lexer::{Token, TokenKind};

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    pub errors: Vec<FrontendError>,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Parser {
            tokens,
            pos: 0,
            errors: Vec::new(),
        }
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek_kind(&self) -> &TokenKind {
        &self.peek().kind
    }

    fn advance(&mut self) -> Token {
        let tok = self.peek().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        tok
    }

    fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(self.peek_kind()) == std::mem::discriminant(kind)
    }

    fn matches(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn error_here(&mut self, msg_kind: &TokenKind) {
        let tok = self.peek();
        self.errors.push(FrontendError::Syntax {
            line: tok.line,
            lexeme: tok.kind.to_string(),
        });
        let _ = msg_kind;
    }

    /// Consumes `kind` or reports a syntax error and leaves the cursor in
    /// place for the caller's recovery to handle.
    fn expect(&mut self, kind: TokenKind) -> Token {
        if self.check(&kind) {
            self.advance()
        } else {
            self.error_here(&kind);
            self.peek().clone()
        }
    }

    fn expect_name(&mut self) -> String {
        match self.peek_kind().clone() {
            TokenKind::Name(n) => {
                self.advance();
                n
            }
            _ => {
                self.error_here(&TokenKind::Name(String::new()));
                String::new()
            }
        }
    }

    /// Skips tokens until a statement boundary, so one syntax error doesn't
    /// cascade into spurious follow-on errors.
    fn synchronize(&mut self) {
        loop {
            match self.peek_kind() {
                TokenKind::Semi => {
                    self.advance();
                    return;
                }
                TokenKind::RBrace | TokenKind::Eof => return,
                _ => {
                    self.advance();
                }
            }
        }
    }

    pub fn parse_program(&mut self) -> Program {
        let mut program = Program::default();
        while !matches!(self.peek_kind(), TokenKind::Eof) {
            self.global_declaration(&mut program);
        }
        program
    }

    fn specifier(&mut self) -> Specifier {
        if self.matches(&TokenKind::Int) {
            Specifier::Word
        } else if self.matches(&TokenKind::Char) {
            Specifier::Byte
        } else {
            self.error_here(&TokenKind::Int);
            Specifier::Word
        }
    }

    fn global_declaration(&mut self, program: &mut Program) {
        if matches!(self.peek_kind(), TokenKind::Void) {
            self.advance();
        }
        let is_void_return = matches!(self.tokens[self.pos.saturating_sub(1)].kind, TokenKind::Void);
        let specifier = if is_void_return {
            Specifier::Word
        } else {
            self.specifier()
        };
        let line = self.peek().line;
        let name = self.expect_name();

        if matches!(self.peek_kind(), TokenKind::LParen) {
            self.advance();
            let params = self.parameters();
            self.expect(TokenKind::RParen);
            self.expect(TokenKind::LBrace);
            let locals = self.declarations();
            let body = self.statements();
            self.expect(TokenKind::RBrace);

            program.functions.push(FunctionDecl {
                name,
                return_specifier: specifier,
                is_void: is_void_return,
                params,
                locals,
                body,
                line,
            });
            return;
        }

        let array_length = self.array_suffix();
        program.globals.push(GlobalDecl {
            name,
            specifier,
            array_length,
            line,
        });
        self.more_declarators(program, specifier, line);
        self.expect(TokenKind::Semi);
    }

    fn more_declarators(&mut self, program: &mut Program, specifier: Specifier, line: u32) {
        while self.matches(&TokenKind::Comma) {
            let name = self.expect_name();
            let array_length = self.array_suffix();
            program.globals.push(GlobalDecl {
                name,
                specifier,
                array_length,
                line,
            });
        }
    }

    fn array_suffix(&mut self) -> Option<u32> {
        if self.matches(&TokenKind::LBracket) {
            let len = match self.peek_kind().clone() {
                TokenKind::Num(n) => {
                    self.advance();
                    n as u32
                }
                _ => 1,
            };
            self.expect(TokenKind::RBracket);
            Some(len)
        } else {
            None
        }
    }

    fn parameters(&mut self) -> Vec<Param> {
        let mut params = Vec::new();
        if matches!(self.peek_kind(), TokenKind::Void) {
            self.advance();
            return params;
        }
        if matches!(self.peek_kind(), TokenKind::RParen) {
            return params;
        }
        loop {
            let specifier = self.specifier();
            let name = self.expect_name();
            let is_array = if self.matches(&TokenKind::LBracket) {
                self.expect(TokenKind::RBracket);
                true
            } else {
                false
            };
            params.push(Param {
                name,
                specifier,
                is_array,
            });
            if !self.matches(&TokenKind::Comma) {
                break;
            }
        }
        params
    }

    fn declarations(&mut self) -> Vec<LocalDecl> {
        let mut locals = Vec::new();
        while matches!(self.peek_kind(), TokenKind::Int | TokenKind::Char) {
            let specifier = self.specifier();
            loop {
                let line = self.peek().line;
                let name = self.expect_name();
                let array_length = self.array_suffix();
                locals.push(LocalDecl {
                    name,
                    specifier,
                    array_length,
                    line,
                });
                if !self.matches(&TokenKind::Comma) {
                    break;
                }
            }
            self.expect(TokenKind::Semi);
        }
        locals
    }

    fn statements(&mut self) -> Vec<Stmt> {
        let mut stmts = Vec::new();
        while !matches!(self.peek_kind(), TokenKind::RBrace | TokenKind::Eof) {
            stmts.push(self.statement());
        }
        stmts
    }

    fn statement(&mut self) -> Stmt {
        match self.peek_kind().clone() {
            TokenKind::LBrace => {
                self.advance();
                let body = self.statements();
                self.expect(TokenKind::RBrace);
                Stmt::Block(body)
            }
            TokenKind::If => {
                self.advance();
                self.expect(TokenKind::LParen);
                let cond = self.expression();
                self.expect(TokenKind::RParen);
                let then_branch = Box::new(self.statement());
                let else_branch = if self.matches(&TokenKind::Else) {
                    Some(Box::new(self.statement()))
                } else {
                    None
                };
                Stmt::If {
                    cond,
                    then_branch,
                    else_branch,
                }
            }
            TokenKind::For => {
                self.advance();
                self.expect(TokenKind::LParen);
                let init = self.assignment();
                self.expect(TokenKind::Semi);
                let cond = self.expression();
                self.expect(TokenKind::Semi);
                let step = self.assignment();
                self.expect(TokenKind::RParen);
                let body = Box::new(self.statement());
                Stmt::For {
                    init,
                    cond,
                    step,
                    body,
                }
            }
            TokenKind::While => {
                self.advance();
                self.expect(TokenKind::LParen);
                let cond = self.expression();
                self.expect(TokenKind::RParen);
                let body = Box::new(self.statement());
                Stmt::While { cond, body }
            }
            TokenKind::Do => {
                self.advance();
                let body = Box::new(self.statement());
                self.expect(TokenKind::While);
                self.expect(TokenKind::LParen);
                let cond = self.expression();
                self.expect(TokenKind::RParen);
                self.expect(TokenKind::Semi);
                Stmt::DoWhile { body, cond }
            }
            TokenKind::Return => {
                let line = self.peek().line;
                self.advance();
                let expr = self.expression();
                self.expect(TokenKind::Semi);
                Stmt::Return(expr, line)
            }
            _ => {
                let stmt = self.assignment();
                self.expect(TokenKind::Semi);
                Stmt::Expr(stmt)
            }
        }
    }

    fn assignment(&mut self) -> Assignment {
        let line = self.peek().line;
        let name = self.expect_name();

        match self.peek_kind().clone() {
            TokenKind::Assign => {
                self.advance();
                let rhs = self.expression();
                Assignment::Scalar { name, rhs, line }
            }
            TokenKind::LBracket => {
                self.advance();
                let index = self.expression();
                self.expect(TokenKind::RBracket);
                self.expect(TokenKind::Assign);
                let rhs = self.expression();
                Assignment::Element {
                    array: name,
                    index,
                    rhs,
                    line,
                }
            }
            TokenKind::LParen => {
                self.advance();
                let mut args = Vec::new();
                if !matches!(self.peek_kind(), TokenKind::RParen) {
                    args.push(self.expression());
                    while self.matches(&TokenKind::Comma) {
                        args.push(self.expression());
                    }
                }
                self.expect(TokenKind::RParen);
                Assignment::Call(Expr::Call { name, args, line })
            }
            _ => {
                self.error_here(&TokenKind::Assign);
                self.synchronize();
                Assignment::Call(Expr::Num(0, line))
            }
        }
    }

    // --- expression grammar, in ascending precedence order ---

    fn expression(&mut self) -> Expr {
        self.or_expression()
    }

    fn or_expression(&mut self) -> Expr {
        let mut left = self.and_expression();
        while self.matches(&TokenKind::OrOr) {
            let right = self.and_expression();
            left = Expr::Logic {
                op: LogicOp::Or,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        left
    }

    fn and_expression(&mut self) -> Expr {
        let mut left = self.equality_expression();
        while self.matches(&TokenKind::AndAnd) {
            let right = self.equality_expression();
            left = Expr::Logic {
                op: LogicOp::And,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        left
    }

    fn equality_expression(&mut self) -> Expr {
        let mut left = self.relational_expression();
        loop {
            let op = match self.peek_kind() {
                TokenKind::Eq => RelOp::Eq,
                TokenKind::Ne => RelOp::Ne,
                _ => break,
            };
            self.advance();
            let right = self.relational_expression();
            left = Expr::Rel {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        left
    }

    fn relational_expression(&mut self) -> Expr {
        let mut left = self.additive_expression();
        loop {
            let op = match self.peek_kind() {
                TokenKind::Lt => RelOp::Lt,
                TokenKind::Gt => RelOp::Gt,
                TokenKind::Le => RelOp::Le,
                TokenKind::Ge => RelOp::Ge,
                _ => break,
            };
            self.advance();
            let right = self.additive_expression();
            left = Expr::Rel {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        left
    }

    fn additive_expression(&mut self) -> Expr {
        let mut left = self.multiplicative_expression();
        loop {
            let op = match self.peek_kind() {
                TokenKind::Plus => ArithOp::Add,
                TokenKind::Minus => ArithOp::Sub,
                _ => break,
            };
            self.advance();
            let right = self.multiplicative_expression();
            left = Expr::Arith {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        left
    }

    fn multiplicative_expression(&mut self) -> Expr {
        let mut left = self.unary_expression();
        loop {
            let op = match self.peek_kind() {
                TokenKind::Star => ArithOp::Mul,
                TokenKind::Slash => ArithOp::Div,
                TokenKind::Percent => ArithOp::Mod,
                _ => break,
            };
            self.advance();
            let right = self.unary_expression();
            left = Expr::Arith {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        left
    }

    fn unary_expression(&mut self) -> Expr {
        let line = self.peek().line;
        if self.matches(&TokenKind::Minus) {
            Expr::Negate(Box::new(self.unary_expression()), line)
        } else if self.matches(&TokenKind::Not) {
            Expr::Not(Box::new(self.unary_expression()), line)
        } else {
            self.primary_expression()
        }
    }

    fn primary_expression(&mut self) -> Expr {
        let line = self.peek().line;
        match self.peek_kind().clone() {
            TokenKind::Num(n) => {
                self.advance();
                Expr::Num(n, line)
            }
            TokenKind::StrLit(s) => {
                self.advance();
                Expr::StrLit(s, line)
            }
            TokenKind::CharLit(c) => {
                self.advance();
                Expr::CharLit(c, line)
            }
            TokenKind::LParen => {
                self.advance();
                let expr = self.expression();
                self.expect(TokenKind::RParen);
                expr
            }
            TokenKind::Name(name) => {
                self.advance();
                if self.matches(&TokenKind::LBracket) {
                    let index = self.expression();
                    self.expect(TokenKind::RBracket);
                    Expr::Index {
                        array: name,
                        index: Box::new(index),
                        line,
                    }
                } else if self.matches(&TokenKind::LParen) {
                    let mut args = Vec::new();
                    if !matches!(self.peek_kind(), TokenKind::RParen) {
                        args.push(self.expression());
                        while self.matches(&TokenKind::Comma) {
                            args.push(self.expression());
                        }
                    }
                    self.expect(TokenKind::RParen);
                    Expr::Call { name, args, line }
                } else {
                    Expr::Name(name, line)
                }
            }
            _ => {
                self.error_here(&TokenKind::Name(String::new()));
                self.advance();
                Expr::Num(0, line)
            }
        }
    }
}

/// Lexes and parses `source`, returning the raw AST alongside any syntax
/// errors collected during the parse.
pub fn parse(source: &str) -> (Program, Vec<FrontendError>) {
    let tokens = crate::lexer::Lexer::new(source).tokenize();
    let mut parser = Parser::new(tokens);
    let program = parser.parse_program();
    (program, parser.errors)
}
