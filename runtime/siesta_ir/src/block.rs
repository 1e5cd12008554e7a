//! Blocks: ordered step sequences forming one lexical unit.

use std::fmt;
use std::sync::Arc;

use crate::step::Step;

/// Shared handle to an immutable block.
///
/// A block's identity is fixed once built; it is shared read-only across
/// all executions and all closures created from it.
pub type BlockRef = Arc<Block>;

/// An ordered sequence of steps forming one lexical scope's worth of code.
#[derive(Debug)]
pub struct Block {
    steps: Vec<Step>,
}

impl Block {
    /// Build a block from a finished step list.
    pub fn new(steps: Vec<Step>) -> BlockRef {
        Arc::new(Block { steps })
    }

    /// An empty block.
    pub fn empty() -> BlockRef {
        Block::new(Vec::new())
    }

    /// The steps, in evaluation order.
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Number of steps.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Whether the block has no steps.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Approximate source-line range `(low, high)` covered by this block's
    /// own steps, for diagnostics. `None` for an empty block.
    pub fn line_range(&self) -> Option<(u32, u32)> {
        let first = self.steps.first()?.line();
        let (mut low, mut high) = (first, first);
        for step in &self.steps {
            low = low.min(step.line());
            high = high.max(step.line());
        }
        Some((low, high))
    }
}

impl fmt::Display for Block {
    /// Shows the line range, which is what warning messages want.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line_range() {
            Some((low, high)) if low == high => write!(f, "<block @ line {low}>"),
            Some((low, high)) => write!(f, "<block @ lines {low}-{high}>"),
            None => f.write_str("<empty block>"),
        }
    }
}
