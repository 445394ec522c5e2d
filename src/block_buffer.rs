//! Block buffer (C3): accumulates incoming scalar values until the current
//! target length is reached, then emits the completed block.
//!
//! The target length is latched at the start of each block and only
//! re-read from the controller at the next block boundary — resizing never
//! happens mid-block (§5's ordering guarantee).

#[derive(Debug, Clone)]
pub struct BlockBuffer {
    values: Vec<f64>,
    target: usize,
}

impl BlockBuffer {
    pub fn new(initial_target: usize) -> Self {
        BlockBuffer {
            values: Vec::with_capacity(initial_target),
            target: initial_target,
        }
    }

    pub fn target(&self) -> usize {
        self.target
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Push one value. Returns `Some(block)` and resets the buffer if this
    /// push completes the current target length.
    pub fn push(&mut self, value: f64) -> Option<Vec<f64>> {
        self.values.push(value);
        if self.values.len() >= self.target {
            Some(std::mem::take(&mut self.values))
        } else {
            None
        }
    }

    /// Adopt a new target length for the *next* block. Has no effect on
    /// values already buffered for the block in progress.
    pub fn set_next_target(&mut self, target: usize) {
        self.target = target;
    }

    /// Flush whatever is buffered, if anything, clearing the buffer.
    /// Used when the input stream ends mid-block.
    pub fn flush(&mut self) -> Option<Vec<f64>> {
        if self.values.is_empty() {
            None
        } else {
            Some(std::mem::take(&mut self.values))
        }
    }
}
