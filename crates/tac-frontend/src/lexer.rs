//! Lexical analysis.
//!
//! Token kinds mirror the source language's token set: keywords,
//! single-character punctuation, the two-character relational/logical
//! operators, and the four literal/name kinds.

use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // literals and names
    Name(String),
    Num(i64),
    StrLit(String),
    CharLit(char),

    // keywords
    Int,
    Char,
    Void,
    If,
    Else,
    For,
    While,
    Do,
    Return,

    // punctuation
    Assign,
    Lt,
    Gt,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Not,
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Semi,
    Comma,

    // two-character operators
    Eq,
    Ne,
    Le,
    Ge,
    AndAnd,
    OrOr,

    Eof,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Name(n) => write!(f, "{n}"),
            TokenKind::Num(n) => write!(f, "{n}"),
            TokenKind::StrLit(s) => write!(f, "\"{s}\""),
            TokenKind::CharLit(c) => write!(f, "'{c}'"),
            TokenKind::Int => write!(f, "int"),
            TokenKind::Char => write!(f, "char"),
            TokenKind::Void => write!(f, "void"),
            TokenKind::If => write!(f, "if"),
            TokenKind::Else => write!(f, "else"),
            TokenKind::For => write!(f, "for"),
            TokenKind::While => write!(f, "while"),
            TokenKind::Do => write!(f, "do"),
            TokenKind::Return => write!(f, "return"),
            TokenKind::Assign => write!(f, "="),
            TokenKind::Lt => write!(f, "<"),
            TokenKind::Gt => write!(f, ">"),
            TokenKind::Plus => write!(f, "+"),
            TokenKind::Minus => write!(f, "-"),
            TokenKind::Star => write!(f, "*"),
            TokenKind::Slash => write!(f, "/"),
            TokenKind::Percent => write!(f, "%"),
            TokenKind::Not => write!(f, "!"),
            TokenKind::LParen => write!(f, "("),
            TokenKind::RParen => write!(f, ")"),
            TokenKind::LBracket => write!(f, "["),
            TokenKind::RBracket => write!(f, "]"),
            TokenKind::LBrace => write!(f, "{{"),
            TokenKind::RBrace => write!(f, "}}"),
            TokenKind::Semi => write!(f, ";"),
            TokenKind::Comma => write!(f, ","),
            TokenKind::Eq => write!(f, "=="),
            TokenKind::Ne => write!(f, "!="),
            TokenKind::Le => write!(f, "<="),
            TokenKind::Ge => write!(f, ">="),
            TokenKind::AndAnd => write!(f, "&&"),
            TokenKind::OrOr => write!(f, "||"),
            TokenKind::Eof => write!(f, "end of file"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub line: u32,
}

fn keyword(word: &str) -> Option<TokenKind> {
    Some(match word {
        "int" => TokenKind::Int,
        "char" => TokenKind::Char,
        "void" => TokenKind::Void,
        "if" => TokenKind::If,
        "else" => TokenKind::Else,
        "for" => TokenKind::For,
        "while" => TokenKind::While,
        "do" => TokenKind::Do,
        "return" => TokenKind::Return,
        _ => return None,
    })
}

/// Scans an entire source string into a token stream up front. A lexer
/// error (an unrecognized character) is reported as a single token whose
/// line is preserved so the parser can still produce a located diagnostic;
/// malformed input never panics.
pub struct Lexer<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
    line: u32,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Lexer {
            chars: source.chars().peekable(),
            line: 1,
        }
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.chars.next();
        if c == Some('\n') {
            self.line += 1;
        }
        c
    }

    fn skip_trivia(&mut self) {
        loop {
            match self.chars.peek() {
                Some(c) if c.is_whitespace() => {
                    self.bump();
                }
                Some('/') => {
                    let mut lookahead = self.chars.clone();
                    lookahead.next();
                    match lookahead.peek() {
                        Some('/') => {
                            while !matches!(self.chars.peek(), None | Some('\n')) {
                                self.bump();
                            }
                        }
                        Some('*') => {
                            self.bump();
                            self.bump();
                            loop {
                                match self.bump() {
                                    None => break,
                                    Some('*') if self.chars.peek() == Some(&'/') => {
                                        self.bump();
                                        break;
                                    }
                                    _ => {}
                                }
                            }
                        }
                        _ => return,
                    }
                }
                _ => return,
            }
        }
    }

    pub fn tokenize(mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            self.skip_trivia();
            let line = self.line;
            let Some(&c) = self.chars.peek() else {
                tokens.push(Token {
                    kind: TokenKind::Eof,
                    line,
                });
                break;
            };

            let kind = if c.is_ascii_digit() {
                let mut text = String::new();
                while matches!(self.chars.peek(), Some(d) if d.is_ascii_digit()) {
                    text.push(self.bump().unwrap());
                }
                TokenKind::Num(text.parse().unwrap_or(0))
            } else if c.is_alphabetic() || c == '_' {
                let mut text = String::new();
                while matches!(self.chars.peek(), Some(d) if d.is_alphanumeric() || *d == '_') {
                    text.push(self.bump().unwrap());
                }
                keyword(&text).unwrap_or(TokenKind::Name(text))
            } else if c == '"' {
                self.bump();
                let mut text = String::new();
                while !matches!(self.chars.peek(), None | Some('"')) {
                    text.push(self.bump().unwrap());
                }
                self.bump();
                TokenKind::StrLit(text)
            } else if c == '\'' {
                self.bump();
                let ch = self.bump().unwrap_or('\0');
                self.bump();
                TokenKind::CharLit(ch)
            } else {
                self.bump();
                match c {
                    '=' => self.maybe_two('=', TokenKind::Eq, TokenKind::Assign),
                    '<' => self.maybe_two('=', TokenKind::Le, TokenKind::Lt),
                    '>' => self.maybe_two('=', TokenKind::Ge, TokenKind::Gt),
                    '!' => self.maybe_two('=', TokenKind::Ne, TokenKind::Not),
                    '&' => {
                        if self.chars.peek() == Some(&'&') {
                            self.bump();
                            TokenKind::AndAnd
                        } else {
                            TokenKind::Not // unreachable in valid input; lexer stays total
                        }
                    }
                    '|' => {
                        if self.chars.peek() == Some(&'|') {
                            self.bump();
                            TokenKind::OrOr
                        } else {
                            TokenKind::Not
                        }
                    }
                    '+' => TokenKind::Plus,
                    '-' => TokenKind::Minus,
                    '*' => TokenKind::Star,
                    '/' => TokenKind::Slash,
                    '%' => TokenKind::Percent,
                    '(' => TokenKind::LParen,
                    ')' => TokenKind::RParen,
                    '[' => TokenKind::LBracket,
                    ']' => TokenKind::RBracket,
                    '{' => TokenKind::LBrace,
                    '}' => TokenKind::RBrace,
                    ';' => TokenKind::Semi,
                    ',' => TokenKind::Comma,
                    _ => TokenKind::Eof,
                }
            };

            tokens.push(Token { kind, line });
        }
        tokens
    }

    fn maybe_two(&mut self, second: char, two: TokenKind, one: TokenKind) -> TokenKind {
        if self.chars.peek() == Some(&second) {
            self.bump();
            two
        } else {
            one
        }
    }
}
