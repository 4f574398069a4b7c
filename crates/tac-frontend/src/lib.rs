pub mod ast;
pub mod check;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod resolved;

pub use check::{check, CheckResult};
pub use error::FrontendError;
pub use parser::parse;

/// Runs the whole front end — lex, parse, check — in one call. Errors from
/// either stage are concatenated; parsing still runs the checker on
/// whatever it managed to recover, matching the "report everything" style.
pub fn compile_source(source: &str) -> Result<CheckResult, Vec<FrontendError>> {
    let (program, mut errors) = parse(source);
    let mut result = check(&program);
    errors.append(&mut result.errors);
    if errors.is_empty() {
        Ok(result)
    } else {
        result.errors = errors;
        Err(result.errors)
    }
}
