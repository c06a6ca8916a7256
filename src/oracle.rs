//! Where block frequencies and edge probabilities come from.
//!
//! The profiler only ever asks two questions: how often does a block run, and how likely is
//! a given successor edge. Hosts answer them through [`FrequencyOracle`] and
//! [`ProbabilityOracle`]; the implementations here cover the common sources.

use crate::{
    block::BlockId,
    error::ProfileError,
    estimate_static_exec_counts::estimate_static_execution_counts,
    function::Function,
    probability::BranchProbability,
};

pub trait FrequencyOracle {
    /// Estimated execution count of `block`, or `None` when unknown.
    fn frequency(&self, block: BlockId) -> Option<f64>;
}

pub trait ProbabilityOracle {
    /// Probability that control leaves `block` through its `successor`-th edge.
    fn probability(&self, block: BlockId, successor: usize)
        -> Result<BranchProbability, ProfileError>;
}

impl<F> FrequencyOracle for F
where
    F: Fn(BlockId) -> Option<f64>,
{
    fn frequency(&self, block: BlockId) -> Option<f64> {
        self(block)
    }
}

impl<F> ProbabilityOracle for F
where
    F: Fn(BlockId, usize) -> Option<BranchProbability>,
{
    fn probability(
        &self,
        block: BlockId,
        successor: usize,
    ) -> Result<BranchProbability, ProfileError> {
        self(block, successor).ok_or(ProfileError::MissingOracleData { block, successor })
    }
}

/// Profile counts recorded on the blocks themselves.
pub struct RecordedFrequencies<'a> {
    func: &'a Function,
}

impl<'a> RecordedFrequencies<'a> {
    pub fn new(func: &'a Function) -> Self {
        Self { func }
    }
}

impl FrequencyOracle for RecordedFrequencies<'_> {
    fn frequency(&self, block: BlockId) -> Option<f64> {
        self.func.blocks().get(block.0).and_then(|b| b.frequency())
    }
}

/// Frequencies guessed from loop nesting, for functions that were never profiled.
pub struct StaticFrequencies {
    counts: Vec<f64>,
}

impl StaticFrequencies {
    pub fn new(func: &Function) -> Self {
        Self {
            counts: estimate_static_execution_counts(func),
        }
    }
}

impl FrequencyOracle for StaticFrequencies {
    fn frequency(&self, block: BlockId) -> Option<f64> {
        self.counts.get(block.0).copied()
    }
}

/// Edge probabilities derived from the branch weights on each block's terminator.
///
/// A terminator without weights (or with a weight list that does not match the successor
/// count) falls back to the per-edge [`Frequency`](crate::block::Frequency) class. When every
/// weight is zero the edges are treated as equally likely.
pub struct EdgeWeights<'a> {
    func: &'a Function,
}

impl<'a> EdgeWeights<'a> {
    pub fn new(func: &'a Function) -> Self {
        Self { func }
    }

    fn weight_of(&self, block: BlockId, successor: usize) -> (u64, u64) {
        let block = self.func.block(block);
        let successors = block.successor_list();

        let explicit = block
            .terminator()
            .and_then(|term| term.branch_weights())
            .filter(|weights| weights.len() == successors.len());

        match explicit {
            Some(weights) => (
                weights[successor] as u64,
                weights.iter().map(|&w| w as u64).sum(),
            ),
            None => (
                successors[successor].1.default_weight() as u64,
                successors
                    .iter()
                    .map(|(_, freq)| freq.default_weight() as u64)
                    .sum(),
            ),
        }
    }
}

impl ProbabilityOracle for EdgeWeights<'_> {
    fn probability(
        &self,
        block: BlockId,
        successor: usize,
    ) -> Result<BranchProbability, ProfileError> {
        let num_successors = self
            .func
            .blocks()
            .get(block.0)
            .map(|b| b.num_successors())
            .unwrap_or(0);

        if successor >= num_successors {
            return Err(ProfileError::MissingOracleData { block, successor });
        }

        let (weight, total) = self.weight_of(block, successor);

        let probability = if total == 0 {
            BranchProbability::new(1, num_successors as u64)
        } else {
            BranchProbability::new(weight, total)
        };

        probability.ok_or(ProfileError::MissingOracleData { block, successor })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::{BasicBlockBuilder, Frequency};

    fn diamond(weights: Option<[u32; 2]>, rare_else: bool) -> Function {
        let mut func = Function::new("diamond");
        let entry = func.add_block(Some(1.0));
        let then = func.add_block(None);
        let else_ = func.add_block(None);

        let mut b = BasicBlockBuilder::new(&mut func, entry);
        match weights {
            Some(weights) => b.branch_weighted(then, else_, weights),
            None => {
                let freq = if rare_else { Frequency::Rare } else { Frequency::Normal };
                b.branch(then, (else_, freq));
            }
        }
        b.switch_to_block(then);
        b.return_();
        b.switch_to_block(else_);
        b.return_();

        func
    }

    #[test]
    fn explicit_weights() {
        let func = diamond(Some([3, 1]), false);
        let oracle = EdgeWeights::new(&func);

        assert_eq!(
            oracle.probability(BlockId(0), 0),
            Ok(BranchProbability::new(3, 4).unwrap())
        );
        assert_eq!(
            oracle.probability(BlockId(0), 1),
            Ok(BranchProbability::new(1, 4).unwrap())
        );
    }

    #[test]
    fn frequency_class_weights() {
        let func = diamond(None, true);
        let oracle = EdgeWeights::new(&func);

        let taken = oracle.probability(BlockId(0), 0).unwrap();
        assert_eq!(taken, BranchProbability::new(2000, 2001).unwrap());
        assert!(taken.is_biased());

        let even = diamond(None, false);
        let oracle = EdgeWeights::new(&even);
        assert_eq!(
            oracle.probability(BlockId(0), 1),
            Ok(BranchProbability::new(1, 2).unwrap())
        );
    }

    #[test]
    fn all_zero_weights_are_uniform() {
        let func = diamond(Some([0, 0]), false);
        let oracle = EdgeWeights::new(&func);

        assert_eq!(
            oracle.probability(BlockId(0), 0),
            Ok(BranchProbability::new(1, 2).unwrap())
        );
    }

    #[test]
    fn out_of_range_edge_is_reported() {
        let func = diamond(None, false);
        let oracle = EdgeWeights::new(&func);

        assert_eq!(
            oracle.probability(BlockId(0), 2),
            Err(ProfileError::MissingOracleData {
                block: BlockId(0),
                successor: 2
            })
        );
        assert!(oracle.probability(BlockId(1), 0).is_err());
        assert!(oracle.probability(BlockId(9), 0).is_err());
    }

    #[test]
    fn recorded_frequencies() {
        let func = diamond(None, false);
        let oracle = RecordedFrequencies::new(&func);

        assert_eq!(oracle.frequency(BlockId(0)), Some(1.0));
        assert_eq!(oracle.frequency(BlockId(1)), None);
        assert_eq!(oracle.frequency(BlockId(7)), None);
    }

    #[test]
    fn closures_are_oracles() {
        let freq = |block: BlockId| (block.0 == 0).then_some(4.0);
        let prob = |_: BlockId, succ: usize| (succ == 0).then_some(BranchProbability::ONE);

        assert_eq!(freq.frequency(BlockId(0)), Some(4.0));
        assert_eq!(prob.probability(BlockId(0), 0), Ok(BranchProbability::ONE));
        assert!(prob.probability(BlockId(0), 1).is_err());
    }
}
