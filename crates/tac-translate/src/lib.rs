pub mod translate;

pub use tac_core::LabelAllocator;
pub use translate::{translate_function, translate_program};
