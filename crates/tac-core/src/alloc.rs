//! Monotonic ID allocators, threaded explicitly through the translator and
//! optimizer rather than kept as global counters: label and temporary
//! numbering are process-wide in the source language's reference tool, but
//! here an explicit allocator is passed through call chains instead.

use serde::{Deserialize, Serialize};

use crate::id::LabelId;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LabelAllocator {
    next: u32,
}

impl LabelAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates a fresh label, never reused for the lifetime of this
    /// allocator. Shared by the translator (initial framing and control
    /// flow) and the optimizer's CFG cleanup (label-merging insertions), so
    /// both draw from the same counter and can never collide.
    pub fn fresh(&mut self) -> LabelId {
        let id = LabelId(self.next);
        self.next += 1;
        id
    }
}
