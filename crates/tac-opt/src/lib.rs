//! Control-flow construction and the dataflow-driven local optimizer
//! everything downstream of a translated [`tac_core::Function`]
//! and upstream of instruction selection.

pub mod cfg;
pub mod dataflow;
pub mod driver;
pub mod transforms;

pub use driver::{optimize, Options};
