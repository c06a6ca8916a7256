use thiserror::Error;

use crate::block::BlockId;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProfileError {
    /// An oracle was asked about an edge it knows nothing about.
    #[error("no probability for successor {successor} of {block}")]
    MissingOracleData { block: BlockId, successor: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}: {kind}")]
pub struct ParseError {
    pub line: usize,
    pub kind: ParseErrorKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
    #[error("unknown opcode `{0}`")]
    UnknownOpcode(String),
    #[error("undefined block label `{0}`")]
    UndefinedLabel(String),
    #[error("block label `{0}` defined twice")]
    DuplicateLabel(String),
    #[error("{weights} branch weights for {successors} successors")]
    WeightCountMismatch { weights: usize, successors: usize },
    #[error("only the last instruction of a block may have successors")]
    SuccessorsNotOnTerminator,
    #[error("instruction outside of a block")]
    InstructionOutsideBlock,
    #[error("block outside of a function")]
    BlockOutsideFunction,
    #[error("invalid number `{0}`")]
    InvalidNumber(String),
    #[error("unexpected `{0}`")]
    Unexpected(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    #[error("unknown pass `{0}`")]
    UnknownPass(String),
    #[error("empty pipeline")]
    Empty,
    #[error("in function `{function}`: {source}")]
    Profile {
        function: String,
        #[source]
        source: ProfileError,
    },
}
