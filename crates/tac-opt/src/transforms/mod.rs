//! Local transforms: each consumes the statement list (and,
//! where noted, dataflow sets already computed on the CFG) and reports
//! whether it changed anything, via [`Rewrite`] at the per-statement level.

pub mod algebraic;
pub mod constfold;
pub mod copyprop;
pub mod cse;
pub mod dce;
pub mod lvn;

use tac_core::Statement;

/// The outcome of considering one statement for rewriting: left alone, a
/// new statement in its place (the old one is destroyed), or deleted
/// outright.
pub(crate) enum Rewrite {
    Unchanged,
    Replace(Statement),
    Delete,
}

/// Parses a literal symbol's printed value, or `None` if `id` doesn't name
/// a numeric literal. Shared by algebraic simplification and constant
/// folding, both of which only ever fire on `is_number` operands.
pub(crate) fn literal_value(symbols: &tac_core::SymbolTable, id: tac_core::SymbolId) -> Option<i64> {
    let sym = symbols.get(id)?;
    if sym.is_number() {
        sym.name.parse::<i64>().ok()
    } else {
        None
    }
}
