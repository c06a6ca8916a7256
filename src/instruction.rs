use tinyvec::TinyVec;

use crate::opcode::Opcode;

/// Branch weights attached to a terminator, one per successor edge of its block.
pub type BranchWeights = TinyVec<[u32; 2]>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    pub(crate) opcode: Opcode,
    pub(crate) branch_weights: Option<BranchWeights>,
}

impl Instruction {
    pub fn new(opcode: Opcode) -> Self {
        Self {
            opcode,
            branch_weights: None,
        }
    }

    pub fn with_weights(opcode: Opcode, weights: &[u32]) -> Self {
        Self {
            opcode,
            branch_weights: Some(weights.iter().copied().collect()),
        }
    }

    pub fn opcode(&self) -> Opcode {
        self.opcode
    }

    pub fn branch_weights(&self) -> Option<&[u32]> {
        self.branch_weights.as_deref()
    }

    pub fn is_terminator(&self) -> bool {
        self.opcode.is_terminator()
    }
}

impl From<Opcode> for Instruction {
    fn from(opcode: Opcode) -> Self {
        Instruction::new(opcode)
    }
}
