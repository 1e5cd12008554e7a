//! Shared helpers: hand-built blocks standing in for the external parser,
//! a collecting warning watcher, and instance plumbing.

use std::sync::Arc;

use parking_lot::Mutex;

use siesta_ir::{Block, BlockBuilder, BlockRef, Check};

use crate::{Scalar, ScriptInstance, ScriptWarning, SharedRegistry, WarningWatcher};

/// Build a block with a closure over the builder.
pub(crate) fn blk(build: impl FnOnce(&mut BlockBuilder)) -> BlockRef {
    let mut builder = BlockBuilder::new();
    build(&mut builder);
    builder.finish()
}

/// Single int-literal expression.
pub(crate) fn int_expr(line: u32, value: i32) -> BlockRef {
    blk(|b| {
        b.int(line, value);
    })
}

/// Single long-literal expression.
pub(crate) fn long_expr(line: u32, value: i64) -> BlockRef {
    blk(|b| {
        b.long(line, value);
    })
}

/// Single double-literal expression.
pub(crate) fn double_expr(line: u32, value: f64) -> BlockRef {
    blk(|b| {
        b.double(line, value);
    })
}

/// Single string-literal expression.
pub(crate) fn str_expr(line: u32, value: &str) -> BlockRef {
    blk(|b| {
        b.string(line, value);
    })
}

/// Single variable-read expression.
pub(crate) fn get_expr(line: u32, name: &str) -> BlockRef {
    blk(|b| {
        b.get(line, name);
    })
}

/// Splice several expression blocks into one argument/operand block:
/// one step per expression, in declaration order.
pub(crate) fn concat(blocks: &[BlockRef]) -> BlockRef {
    let mut steps = Vec::new();
    for block in blocks {
        steps.extend(block.steps().iter().cloned());
    }
    Block::new(steps)
}

/// Operator expression over operand expressions.
pub(crate) fn op_expr(line: u32, symbol: &str, operands: &[BlockRef]) -> BlockRef {
    blk(|b| {
        b.operate(line, symbol, concat(operands));
    })
}

/// Call expression over argument expressions.
pub(crate) fn call_expr(line: u32, name: &str, args: &[BlockRef]) -> BlockRef {
    blk(|b| {
        b.call(line, name, concat(args));
    })
}

/// Container-element expression `name[index]`.
pub(crate) fn index_expr(line: u32, name: &str, index: BlockRef) -> BlockRef {
    blk(|b| {
        b.index(line, get_expr(line, name), name, index);
    })
}

/// Append `name = rhs` to a block under construction.
pub(crate) fn set_var(builder: &mut BlockBuilder, line: u32, name: &str, rhs: BlockRef) {
    builder.assign(line, get_expr(line, name), rhs);
}

/// A leaf predicate check over operand expressions.
pub(crate) fn pred(line: u32, name: &str, operands: &[BlockRef]) -> Check {
    Check::new(line, name, concat(operands))
}

/// An instance over the core registry.
pub(crate) fn script(block: BlockRef) -> ScriptInstance {
    ScriptInstance::new("test.ss", block, SharedRegistry::with_core())
}

/// An instance plus a collecting watcher.
pub(crate) fn watched(block: BlockRef) -> (ScriptInstance, Arc<Collector>) {
    let instance = script(block);
    let collector = Collector::new();
    instance.add_watcher(collector.clone());
    (instance, collector)
}

/// Integer value of a global binding.
pub(crate) fn global_int(instance: &ScriptInstance, name: &str) -> Option<i32> {
    instance.variables().lookup(name).map(|s| s.int_value())
}

/// Global binding handle.
pub(crate) fn global(instance: &ScriptInstance, name: &str) -> Option<Scalar> {
    instance.variables().lookup(name)
}

/// Warning watcher that records everything it sees.
pub(crate) struct Collector {
    seen: Mutex<Vec<ScriptWarning>>,
}

impl Collector {
    pub(crate) fn new() -> Arc<Collector> {
        Arc::new(Collector {
            seen: Mutex::new(Vec::new()),
        })
    }

    /// Messages of non-trace warnings, in delivery order.
    pub(crate) fn messages(&self) -> Vec<String> {
        self.seen
            .lock()
            .iter()
            .filter(|w| !w.is_trace())
            .map(|w| w.message().to_owned())
            .collect()
    }

    /// (message, line) pairs of non-trace warnings.
    pub(crate) fn faults(&self) -> Vec<(String, u32)> {
        self.seen
            .lock()
            .iter()
            .filter(|w| !w.is_trace())
            .map(|w| (w.message().to_owned(), w.line()))
            .collect()
    }

    /// Messages of trace warnings only.
    pub(crate) fn traces(&self) -> Vec<String> {
        self.seen
            .lock()
            .iter()
            .filter(|w| w.is_trace())
            .map(|w| w.message().to_owned())
            .collect()
    }
}

impl WarningWatcher for Collector {
    fn script_warning(&self, warning: &ScriptWarning) {
        self.seen.lock().push(warning.clone());
    }
}
