//! Errors for the instruction selector.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EmitError {
    /// A function was handed to the selector before its CFG was built --
    /// `tac_opt::cfg::rebuild` (or `tac_opt::optimize`) must run first.
    #[error("function has no entry block; run cfg::rebuild before emitting")]
    MissingEntryBlock,
}
