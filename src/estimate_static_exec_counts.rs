use tracing::trace;

use crate::{
    block::BlockId, dominators::Dominators, function::Function, natural_loops::NaturalLoops,
};

/// Estimates basic block frequencies based on loop analysis: each level of loop nesting is
/// assumed to run ten times as often as the level around it. Blocks that cannot be reached
/// from the entry never run.
pub fn estimate_static_execution_counts(func: &Function) -> Vec<f64> {
    const BASE: f64 = 10.0;

    let dominators = Dominators::new(func);
    let natural_loops = NaturalLoops::new(func, &dominators);

    trace!(
        function = func.name(),
        loops = natural_loops.num_loops(),
        "estimating static execution counts"
    );

    (0..func.num_blocks())
        .map(BlockId)
        .map(|block| {
            if dominators.is_reachable(block) {
                BASE.powi(natural_loops.loop_depth(block) as i32)
            } else {
                0.0
            }
        })
        .collect()
}
