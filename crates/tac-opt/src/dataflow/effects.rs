//! Shared helpers for computing per-statement gen/kill effects, used by the
//! live-variable, available-copies, and available-expressions analyses.

use std::collections::HashSet;

use tac_core::{SymbolId, SymbolKind, SymbolTable};

/// Every `Global`-kinded symbol that isn't itself a function -- the set
/// LVA seeds the exit block's `LiveOut` with, and that a `Call` statement
/// is conservatively assumed to use (LVA) or clobber (available-copies,
/// available-expressions).
pub fn non_function_globals(symbols: &SymbolTable) -> HashSet<SymbolId> {
    symbols
        .iter()
        .filter(|s| s.kind == SymbolKind::Global && !s.ty.is_function())
        .map(|s| s.id)
        .collect()
}
