//! Symbols: the opaque identities named storage locations, temporaries, and
//! literals are keyed by throughout the IR.

use serde::{Deserialize, Serialize};

use crate::id::SymbolId;
use crate::types::TypeSpec;

/// What kind of storage a symbol denotes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SymbolKind {
    Local,
    Global,
    Temp,
    /// A numeric literal; its value is carried in `Symbol::name`.
    Num,
    StrLit,
    CharLit,
}

/// An interned symbol. Identity (the [`SymbolId`] used to look it up) is
/// what dataflow keys on, never the name or value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Symbol {
    pub id: SymbolId,
    pub name: String,
    pub ty: TypeSpec,
    pub kind: SymbolKind,
}

impl Symbol {
    /// `true` iff this symbol is a numeric literal (`kind == Num`).
    pub fn is_number(&self) -> bool {
        self.kind == SymbolKind::Num
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Specifier;

    #[test]
    fn is_number_true_only_for_num_kind() {
        let num = Symbol {
            id: SymbolId(0),
            name: "5".into(),
            ty: TypeSpec::scalar(Specifier::Word),
            kind: SymbolKind::Num,
        };
        assert!(num.is_number());

        let local = Symbol {
            id: SymbolId(1),
            name: "x".into(),
            ty: TypeSpec::scalar(Specifier::Word),
            kind: SymbolKind::Local,
        };
        assert!(!local.is_number());
    }

    #[test]
    fn serde_roundtrip_symbol() {
        let sym = Symbol {
            id: SymbolId(3),
            name: "t0".into(),
            ty: TypeSpec::scalar(Specifier::Word),
            kind: SymbolKind::Temp,
        };
        let json = serde_json::to_string(&sym).unwrap();
        let back: Symbol = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id, sym.id);
        assert_eq!(back.name, sym.name);
    }
}
