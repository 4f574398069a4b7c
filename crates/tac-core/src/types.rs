//! The source language's type system: byte/word scalars, fixed arrays,
//! optional pointers, and function signatures.
//!
//! No floats, no structs, no enums -- the source language is deliberately
//! small. Every [`TypeSpec`] answers the symbol-type
//! interface the core consumes: `is_function`, `is_array`, `is_pointer`,
//! `is_scalar`, `size`, `specifier`, `parameters`.

use serde::{Deserialize, Serialize};

/// A byte- or word-width scalar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Specifier {
    Byte,
    Word,
}

impl Specifier {
    /// Size in bytes of one scalar of this specifier.
    pub fn size(self) -> u32 {
        match self {
            Specifier::Byte => 1,
            Specifier::Word => 4,
        }
    }
}

/// Full type of a symbol or expression.
///
/// At most one of `array_length`, `function` is set; `pointer` may combine
/// with either a scalar or an array, matching the "array indexing beyond one
/// dimension, pointer arithmetic beyond indexing" is deliberately out of scope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeSpec {
    pub specifier: Specifier,
    pub array_length: Option<u32>,
    pub pointer: bool,
    pub function: Option<FunctionSignature>,
}

/// Parameter and return specifiers for a function symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionSignature {
    pub parameters: Vec<TypeSpec>,
    pub return_type: Box<TypeSpec>,
}

impl TypeSpec {
    pub fn scalar(specifier: Specifier) -> Self {
        TypeSpec {
            specifier,
            array_length: None,
            pointer: false,
            function: None,
        }
    }

    pub fn array(specifier: Specifier, length: u32) -> Self {
        TypeSpec {
            specifier,
            array_length: Some(length),
            pointer: false,
            function: None,
        }
    }

    pub fn function(parameters: Vec<TypeSpec>, return_type: TypeSpec) -> Self {
        TypeSpec {
            specifier: return_type.specifier,
            array_length: None,
            pointer: false,
            function: Some(FunctionSignature {
                parameters,
                return_type: Box::new(return_type),
            }),
        }
    }

    pub fn is_function(&self) -> bool {
        self.function.is_some()
    }

    pub fn is_array(&self) -> bool {
        self.array_length.is_some()
    }

    pub fn is_pointer(&self) -> bool {
        self.pointer
    }

    pub fn is_scalar(&self) -> bool {
        !self.is_array() && !self.is_pointer() && !self.is_function()
    }

    /// Size in bytes: element size times array length for arrays, pointer
    /// width (word-sized) for pointers, scalar size otherwise.
    pub fn size(&self) -> u32 {
        if self.pointer {
            return Specifier::Word.size();
        }
        match self.array_length {
            Some(len) => self.specifier.size() * len,
            None => self.specifier.size(),
        }
    }

    /// Size of one element -- for arrays, the scalar size; for scalars, the
    /// same as `size()`. Used to scale array index offsets.
    pub fn element_size(&self) -> u32 {
        self.specifier.size()
    }

    pub fn parameters(&self) -> &[TypeSpec] {
        match &self.function {
            Some(sig) => &sig.parameters,
            None => &[],
        }
    }
}
