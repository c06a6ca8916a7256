use std::{borrow::Cow, fmt};

use crate::{
    block::{BasicBlock, BlockId, Frequency, FrequentBlock},
    dominators::Graph,
};

/// A single function: a name and its blocks in declaration order. Block 0 is the entry.
pub struct Function {
    pub(crate) name: String,
    pub(crate) blocks: Vec<BasicBlock>,
}

impl Graph for Function {
    type Node = BlockId;

    fn num_nodes(&self) -> usize {
        self.blocks.len()
    }

    fn node(&self, index: usize) -> Option<Self::Node> {
        (index < self.blocks.len()).then_some(BlockId(index))
    }

    fn node_index(&self, node: Self::Node) -> usize {
        node.0
    }

    fn root(&self) -> Self::Node {
        BlockId(0)
    }

    fn predecessors(&self, block: Self::Node) -> Cow<[Self::Node]> {
        Cow::Borrowed(self.blocks[block.0].predecessor_list())
    }

    fn successors(&self, block: Self::Node) -> Cow<[Self::Node]> {
        Cow::Owned(
            self.blocks[block.0]
                .successor_list()
                .iter()
                .map(|x| x.0)
                .collect(),
        )
    }
}

impl Function {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            blocks: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Append a new block with an optional recorded profile count.
    pub fn add_block(&mut self, frequency: Option<f64>) -> BlockId {
        let id = BlockId(self.blocks.len());
        self.blocks.push(BasicBlock::new(id.0, frequency));
        id
    }

    /// Add a new successor edge to a block and record the matching predecessor.
    pub fn add_successor(&mut self, block: BlockId, successor: FrequentBlock) {
        self.blocks[block.0].successor_list.push(successor);
        self.blocks[successor.0 .0].add_predecessor(block);
    }

    pub fn block(&self, id: BlockId) -> &BasicBlock {
        &self.blocks[id.0]
    }

    pub fn block_mut(&mut self, id: BlockId) -> &mut BasicBlock {
        &mut self.blocks[id.0]
    }

    pub fn blocks(&self) -> &[BasicBlock] {
        &self.blocks
    }

    pub fn num_blocks(&self) -> usize {
        self.blocks.len()
    }

    pub fn num_instructions(&self) -> usize {
        self.blocks.iter().map(|block| block.len()).sum()
    }

    pub fn successors(&self, id: BlockId) -> &[(BlockId, Frequency)] {
        self.blocks[id.0].successor_list()
    }

    pub fn predecessors(&self, id: BlockId) -> &[BlockId] {
        self.blocks[id.0].predecessor_list()
    }

    pub fn display_(&self) -> FunctionDisplay<'_> {
        FunctionDisplay(self)
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.display_(), f)
    }
}

pub struct FunctionDisplay<'a>(&'a Function);

impl fmt::Display for FunctionDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "define @{}", self.0.name)?;
        for block in &self.0.blocks {
            block.fmt(f)?;
        }
        Ok(())
    }
}
