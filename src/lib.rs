//! Frequency-weighted instruction mix profiling.
//!
//! Given a function's control-flow graph, an estimate of how often each block runs and the
//! probability of each successor edge, [`profile`] reports which share of the executed
//! instructions were integer math, floating point math, memory accesses, biased branches,
//! unbiased branches or anything else. The analysis never modifies the function.

pub mod block;
pub mod category;
pub mod dominators;
pub mod error;
pub mod estimate_static_exec_counts;
pub mod function;
pub mod instruction;
pub mod natural_loops;
pub mod opcode;
pub mod oracle;
pub mod parser;
pub mod pass;
pub mod probability;
pub mod profile;


pub use block::{BasicBlock, BasicBlockBuilder, BlockId, Frequency, FrequentBlock};
pub use category::{Category, CategoryCounts};
pub use error::{ParseError, PipelineError, ProfileError};
pub use function::Function;
pub use instruction::Instruction;
pub use opcode::Opcode;
pub use oracle::{
    EdgeWeights, FrequencyOracle, ProbabilityOracle, RecordedFrequencies, StaticFrequencies,
};
pub use parser::parse_module;
pub use probability::BranchProbability;
pub use profile::{profile, InstructionProfiler, ProfileRecord};

/// Where block frequencies come from when a pass runs without an explicit oracle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FrequencySource {
    /// Profile counts recorded on the blocks. Blocks without one count as never executed.
    #[default]
    Recorded,
    /// `10^loop_depth` estimates from the CFG shape.
    Static,
}

#[derive(Debug, Clone, Default)]
pub struct Options {
    pub frequency_source: FrequencySource,
    /// Log every function's CFG at debug level before it is profiled.
    pub dump_cfg: bool,
}
