use std::ops::Deref;

use crate::{function::Function, instruction::Instruction, opcode::Opcode};

pub struct BasicBlock {
    pub(crate) index: usize,
    pub(crate) insts: Vec<Instruction>,
    pub(crate) predecessor_list: Vec<BlockId>,
    pub(crate) successor_list: Vec<FrequentBlock>,
    /// Recorded profile count. `None` when no profile data reached this block.
    pub(crate) frequency: Option<f64>,
}

impl BasicBlock {
    pub fn new(index: usize, frequency: Option<f64>) -> Self {
        Self {
            index,
            insts: Vec::new(),
            predecessor_list: Vec::new(),
            successor_list: Vec::new(),
            frequency,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn id(&self) -> BlockId {
        BlockId(self.index)
    }

    pub fn frequency(&self) -> Option<f64> {
        self.frequency
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.insts
    }

    pub fn terminator(&self) -> Option<&Instruction> {
        self.insts.last().filter(|inst| inst.is_terminator())
    }

    pub fn append(&mut self, inst: Instruction) {
        self.insts.push(inst);
    }

    pub fn append_successor(&mut self, block: FrequentBlock) {
        self.successor_list.push(block);
    }

    pub fn set_successors(&mut self, target: FrequentBlock) {
        self.successor_list.clear();
        self.successor_list.push(target);
    }

    pub fn set_successors2(&mut self, target1: FrequentBlock, target2: FrequentBlock) {
        self.successor_list.clear();
        self.successor_list.push(target1);
        self.successor_list.push(target2);
    }

    pub fn num_successors(&self) -> usize {
        self.successor_list.len()
    }

    pub fn successor_list(&self) -> &Vec<FrequentBlock> {
        &self.successor_list
    }

    pub fn predecessor_list(&self) -> &Vec<BlockId> {
        &self.predecessor_list
    }

    pub fn add_predecessor(&mut self, predecessor: BlockId) -> bool {
        if self.predecessor_list.contains(&predecessor) {
            false
        } else {
            self.predecessor_list.push(predecessor);
            true
        }
    }

    pub(crate) fn fmt<W: std::fmt::Write>(&self, f: &mut W) -> std::fmt::Result {
        match self.frequency {
            Some(freq) => writeln!(f, "bb{} freq={}:", self.index, freq)?,
            None => writeln!(f, "bb{}:", self.index)?,
        }

        let last = self.insts.len().saturating_sub(1);
        for (i, inst) in self.insts.iter().enumerate() {
            write!(f, "  {}", inst.opcode())?;

            if i == last && !self.successor_list.is_empty() {
                for (j, (succ, freq)) in self.successor_list.iter().enumerate() {
                    let sep = if j == 0 { " " } else { ", " };
                    write!(f, "{}bb{}", sep, succ.0)?;
                    if *freq == Frequency::Rare {
                        write!(f, "!rare")?;
                    }
                }
            }

            if let Some(weights) = inst.branch_weights() {
                write!(f, " !weights ")?;
                for (j, weight) in weights.iter().enumerate() {
                    if j != 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", weight)?;
                }
            }

            writeln!(f)?;
        }

        Ok(())
    }
}

impl Deref for BasicBlock {
    type Target = Vec<Instruction>;

    fn deref(&self) -> &Self::Target {
        &self.insts
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockId(pub usize);

impl From<BlockId> for usize {
    fn from(x: BlockId) -> usize {
        x.0
    }
}

impl From<usize> for BlockId {
    fn from(x: usize) -> Self {
        BlockId(x)
    }
}

impl std::fmt::Display for BlockId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "bb{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Frequency {
    /// We don't have any hypothesis about the frequency of this edge. This is the common case.
    #[default]
    Normal,
    /// We expect that this edge will be taken super rarely. When no branch weights are
    /// attached, rare edges get the "unlikely" weight.
    Rare,
}

impl Frequency {
    /// Edge weight used when the terminator carries no explicit branch weights. These are the
    /// likely/unlikely weights of `__builtin_expect`.
    pub const fn default_weight(self) -> u32 {
        match self {
            Frequency::Normal => 2000,
            Frequency::Rare => 1,
        }
    }
}

pub type FrequentBlock = (BlockId, Frequency);

pub struct BasicBlockBuilder<'a> {
    pub func: &'a mut Function,
    pub block: BlockId,
}

impl<'a> BasicBlockBuilder<'a> {
    pub fn new(func: &'a mut Function, block: BlockId) -> Self {
        BasicBlockBuilder { func, block }
    }

    pub fn switch_to_block(&mut self, block: BlockId) {
        self.block = block;
    }

    pub fn append(&mut self, opcode: Opcode) -> &mut Self {
        self.func.block_mut(self.block).append(Instruction::new(opcode));
        self
    }

    pub fn append_all(&mut self, opcodes: &[Opcode]) -> &mut Self {
        for &opcode in opcodes {
            self.append(opcode);
        }
        self
    }

    pub fn jump(&mut self, to: BlockId) {
        self.func.block_mut(self.block).append(Instruction::new(Opcode::Br));
        self.func
            .block_mut(self.block)
            .set_successors((to, Frequency::Normal));
        self.func.block_mut(to).add_predecessor(self.block);
    }

    pub fn branch(&mut self, taken: BlockId, not_taken: FrequentBlock) {
        self.func.block_mut(self.block).append(Instruction::new(Opcode::Br));
        self.func
            .block_mut(self.block)
            .set_successors2((taken, Frequency::Normal), not_taken);
        self.func.block_mut(not_taken.0).add_predecessor(self.block);
        self.func.block_mut(taken).add_predecessor(self.block);
    }

    /// Conditional branch with explicit `(taken, not_taken)` branch weights.
    pub fn branch_weighted(&mut self, taken: BlockId, not_taken: BlockId, weights: [u32; 2]) {
        self.terminate(Opcode::Br, &[taken, not_taken], Some(&weights));
    }

    pub fn switch(&mut self, targets: &[BlockId], weights: Option<&[u32]>) {
        self.terminate(Opcode::Switch, targets, weights);
    }

    /// Append `opcode` as the terminator and make `targets` the block's successors.
    pub fn terminate(&mut self, opcode: Opcode, targets: &[BlockId], weights: Option<&[u32]>) {
        let inst = match weights {
            Some(weights) => Instruction::with_weights(opcode, weights),
            None => Instruction::new(opcode),
        };

        let block = self.func.block_mut(self.block);
        block.append(inst);
        block.successor_list.clear();
        for &target in targets {
            block.append_successor((target, Frequency::Normal));
        }

        for &target in targets {
            self.func.block_mut(target).add_predecessor(self.block);
        }
    }

    pub fn return_(&mut self) {
        self.append(Opcode::Ret);
    }

    pub fn unreachable(&mut self) {
        self.append(Opcode::Unreachable);
    }
}
