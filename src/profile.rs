//! Frequency-weighted instruction mix of a single function.
//!
//! Every instruction is put in one of six [`Category`] buckets and counted with the
//! execution frequency of its block. Branches (`br`, `switch`, `indirectbr`) are split by
//! their successor edge probabilities: a branch is *biased* when any one of its edges is
//! taken more than 80% of the time.
//!
//! The result is a [`ProfileRecord`] holding the weighted totals. Fractions are derived from
//! the totals on demand and rendered with three decimals by its `Display` impl, which produces
//! one comma separated line:
//!
//! ```text
//! name, total, integer, float, memory, biased_branch, unbiased_branch, other
//! ```

use std::fmt;

use tracing::{debug, trace, warn};

use crate::{
    block::{BasicBlock, BlockId},
    category::{classify, Category, CategoryCounts, InstructionClass},
    error::ProfileError,
    function::Function,
    oracle::{FrequencyOracle, ProbabilityOracle},
};

/// Walks a function once and produces its [`ProfileRecord`]. Stateless: every call starts
/// from fresh counters, so one profiler can be shared between threads.
#[derive(Debug, Clone, Copy, Default)]
pub struct InstructionProfiler;

impl InstructionProfiler {
    pub fn new() -> Self {
        Self
    }

    pub fn profile<F, P>(
        &self,
        func: &Function,
        frequencies: &F,
        probabilities: &P,
    ) -> Result<ProfileRecord, ProfileError>
    where
        F: FrequencyOracle + ?Sized,
        P: ProbabilityOracle + ?Sized,
    {
        profile(func, frequencies, probabilities)
    }
}

/// Profile `func`. Fails only when `probabilities` cannot answer for an edge of a branch.
pub fn profile<F, P>(
    func: &Function,
    frequencies: &F,
    probabilities: &P,
) -> Result<ProfileRecord, ProfileError>
where
    F: FrequencyOracle + ?Sized,
    P: ProbabilityOracle + ?Sized,
{
    let mut counts = CategoryCounts::new();
    let mut total = 0.0;

    for block in func.blocks() {
        let weight = block_weight(frequencies, block);

        for inst in block.instructions() {
            let category = match classify(inst.opcode()) {
                InstructionClass::Fixed(category) => category,
                InstructionClass::Branch => {
                    if is_biased(block, probabilities)? {
                        Category::BiasedBranch
                    } else {
                        Category::UnbiasedBranch
                    }
                }
            };

            total += weight;
            counts.add(category, weight);
        }
    }

    debug!(
        function = func.name(),
        blocks = func.num_blocks(),
        total,
        "profiled function"
    );

    if !total.is_finite() {
        warn!(function = func.name(), "weighted instruction count overflowed");
    }

    Ok(ProfileRecord {
        function: func.name().to_owned(),
        total,
        counts,
    })
}

/// Execution weight of every instruction in `block`. Unknown, negative and NaN frequencies
/// count as zero.
fn block_weight<F: FrequencyOracle + ?Sized>(frequencies: &F, block: &BasicBlock) -> f64 {
    match frequencies.frequency(block.id()) {
        Some(freq) if freq > 0.0 => {
            trace!(block = %block.id(), freq, "block weight");
            freq
        }
        Some(_) => 0.0,
        None => {
            trace!(block = %block.id(), "no frequency for block, counting as zero");
            0.0
        }
    }
}

/// A branch is biased when some successor edge is taken with probability above 0.8. Stops at
/// the first such edge. A branch without successors is never biased.
fn is_biased<P: ProbabilityOracle + ?Sized>(
    block: &BasicBlock,
    probabilities: &P,
) -> Result<bool, ProfileError> {
    let id: BlockId = block.id();

    for successor in 0..block.num_successors() {
        if probabilities.probability(id, successor)?.is_biased() {
            return Ok(true);
        }
    }

    Ok(false)
}

/// The weighted instruction mix of one function.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileRecord {
    function: String,
    total: f64,
    counts: CategoryCounts,
}

impl ProfileRecord {
    pub fn function(&self) -> &str {
        &self.function
    }

    /// Weighted instruction count, before truncation.
    pub fn weighted_total(&self) -> f64 {
        self.total
    }

    /// Weighted instruction count, truncated towards zero.
    pub fn total_count(&self) -> u64 {
        self.total as u64
    }

    pub fn counts(&self) -> &CategoryCounts {
        &self.counts
    }

    /// Share of the weighted total that falls in `category`. Zero when nothing executed.
    ///
    /// When the weighted total overflows to infinity but every category count is still finite,
    /// the ratio is taken over the counts scaled down by a power of two, so the fractions keep
    /// summing to one. An infinite category count leaves the mix undefined and every fraction
    /// is reported as zero.
    pub fn fraction(&self, category: Category) -> f64 {
        const SCALE: f64 = 0.125;

        if self.total > 0.0 && self.total.is_finite() {
            self.counts[category] / self.total
        } else if self.total > 0.0 && self.counts.as_array().iter().all(|c| c.is_finite()) {
            let scaled_total: f64 = self.counts.as_array().iter().map(|c| c * SCALE).sum();
            self.counts[category] * SCALE / scaled_total
        } else {
            0.0
        }
    }

    /// All six fractions, in reporting order.
    pub fn fractions(&self) -> [f64; Category::COUNT] {
        Category::ALL.map(|category| self.fraction(category))
    }
}

impl fmt::Display for ProfileRecord {
    /// Fractions are printed with `{:.3}`, which rounds the exact binary value to the nearest
    /// representable decimal, ties to even.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.function, self.total_count())?;

        for fraction in self.fractions() {
            write!(f, ", {:.3}", fraction)?;
        }

        Ok(())
    }
}
