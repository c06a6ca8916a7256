use std::ops::{Index, IndexMut};

use crate::opcode::Opcode;

/// The six buckets an instruction is counted in. The declaration order is the reporting order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum Category {
    Integer,
    Float,
    Memory,
    BiasedBranch,
    UnbiasedBranch,
    Other,
}

impl Category {
    pub const COUNT: usize = 6;

    pub const ALL: [Category; Category::COUNT] = [
        Category::Integer,
        Category::Float,
        Category::Memory,
        Category::BiasedBranch,
        Category::UnbiasedBranch,
        Category::Other,
    ];

    pub const fn index(self) -> usize {
        self as usize
    }
}

/// What the opcode alone tells us about an instruction. Branches cannot be
/// bucketed until their successor edge probabilities are known.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstructionClass {
    Branch,
    Fixed(Category),
}

/// Static opcode table. Anything not listed falls through to `Other`.
pub const fn classify(opcode: Opcode) -> InstructionClass {
    use Opcode::*;

    match opcode {
        Br | Switch | IndirectBr => InstructionClass::Branch,

        Add | Sub | Mul | UDiv | SDiv | URem | SRem | Shl | LShr | AShr | And | Or | Xor
        | ICmp => InstructionClass::Fixed(Category::Integer),

        FAdd | FSub | FMul | FDiv | FRem | FCmp => InstructionClass::Fixed(Category::Float),

        Alloca | Load | Store | GetElementPtr | Fence | AtomicCmpXchg | AtomicRMW => {
            InstructionClass::Fixed(Category::Memory)
        }

        _ => InstructionClass::Fixed(Category::Other),
    }
}

/// Per-category weighted counters for a single profiling run.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CategoryCounts {
    counts: [f64; Category::COUNT],
}

impl CategoryCounts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `weight` to `category`. Weights are never negative, so counters only grow.
    pub fn add(&mut self, category: Category, weight: f64) {
        debug_assert!(weight >= 0.0);
        self.counts[category.index()] += weight;
    }

    pub fn sum(&self) -> f64 {
        self.counts.iter().sum()
    }

    pub fn as_array(&self) -> &[f64; Category::COUNT] {
        &self.counts
    }
}

impl Index<Category> for CategoryCounts {
    type Output = f64;

    fn index(&self, category: Category) -> &f64 {
        &self.counts[category.index()]
    }
}

impl IndexMut<Category> for CategoryCounts {
    fn index_mut(&mut self, category: Category) -> &mut f64 {
        &mut self.counts[category.index()]
    }
}
