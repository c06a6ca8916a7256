//! Named function passes and the pipeline they run in.
//!
//! A host builds a pipeline from a comma separated list of pass names, then runs it over
//! each function. Passes are read-only: they see the function through a shared reference and
//! report through a [`RecordSink`].

use std::{collections::HashMap, io};

use once_cell::sync::Lazy;
use tracing::debug;

use crate::{
    error::PipelineError,
    function::Function,
    oracle::{EdgeWeights, FrequencyOracle, RecordedFrequencies, StaticFrequencies},
    profile::{InstructionProfiler, ProfileRecord},
    FrequencySource, Options,
};

/// Everything a pass may query about the function it runs on.
pub struct AnalysisContext<'a> {
    pub options: &'a Options,
}

impl<'a> AnalysisContext<'a> {
    pub fn new(options: &'a Options) -> Self {
        Self { options }
    }

    /// Block frequencies for `func`, from the source selected in the options.
    pub fn frequencies<'f>(&self, func: &'f Function) -> Box<dyn FrequencyOracle + 'f> {
        match self.options.frequency_source {
            FrequencySource::Recorded => Box::new(RecordedFrequencies::new(func)),
            FrequencySource::Static => Box::new(StaticFrequencies::new(func)),
        }
    }

    pub fn probabilities<'f>(&self, func: &'f Function) -> EdgeWeights<'f> {
        EdgeWeights::new(func)
    }
}

/// Receives one record per analyzed function.
pub trait RecordSink {
    fn emit(&mut self, record: ProfileRecord) -> io::Result<()>;
}

/// Writes each record as one line.
pub struct WriterSink<W: io::Write> {
    out: W,
}

impl<W: io::Write> WriterSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: io::Write> RecordSink for WriterSink<W> {
    fn emit(&mut self, record: ProfileRecord) -> io::Result<()> {
        writeln!(self.out, "{}", record)
    }
}

/// Keeps every record in memory.
#[derive(Default)]
pub struct VecSink {
    pub records: Vec<ProfileRecord>,
}

impl RecordSink for VecSink {
    fn emit(&mut self, record: ProfileRecord) -> io::Result<()> {
        self.records.push(record);
        Ok(())
    }
}

pub trait FunctionPass {
    fn name(&self) -> &'static str;

    fn run(
        &mut self,
        func: &Function,
        cx: &AnalysisContext<'_>,
        sink: &mut dyn RecordSink,
    ) -> Result<(), PassError>;
}

#[derive(Debug, thiserror::Error)]
pub enum PassError {
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
    #[error("failed to write record: {0}")]
    Io(#[from] io::Error),
}

/// Emits the weighted instruction mix of every function it runs on.
#[derive(Default)]
pub struct InstructionProfilePass {
    profiler: InstructionProfiler,
}

impl InstructionProfilePass {
    pub const NAME: &'static str = "instprof";
}

impl FunctionPass for InstructionProfilePass {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn run(
        &mut self,
        func: &Function,
        cx: &AnalysisContext<'_>,
        sink: &mut dyn RecordSink,
    ) -> Result<(), PassError> {
        if cx.options.dump_cfg {
            debug!("{}", func.display_());
        }

        let frequencies = cx.frequencies(func);
        let probabilities = cx.probabilities(func);

        let record = self
            .profiler
            .profile(func, &*frequencies, &probabilities)
            .map_err(|source| PipelineError::Profile {
                function: func.name().to_owned(),
                source,
            })?;

        sink.emit(record)?;
        Ok(())
    }
}

fn instruction_profile_pass() -> Box<dyn FunctionPass + Send> {
    Box::new(InstructionProfilePass::default())
}

pub type PassConstructor = fn() -> Box<dyn FunctionPass + Send>;

pub struct PassRegistry {
    passes: HashMap<&'static str, PassConstructor>,
}

impl PassRegistry {
    pub fn new() -> Self {
        Self {
            passes: HashMap::new(),
        }
    }

    /// Registry with every pass this crate provides.
    pub fn with_builtin_passes() -> Self {
        let mut registry = Self::new();
        registry.register(InstructionProfilePass::NAME, instruction_profile_pass);
        registry
    }

    /// Returns `false` if `name` was already taken; the old constructor is kept.
    pub fn register(&mut self, name: &'static str, constructor: PassConstructor) -> bool {
        if self.passes.contains_key(name) {
            return false;
        }
        self.passes.insert(name, constructor);
        true
    }

    pub fn lookup(&self, name: &str) -> Option<PassConstructor> {
        self.passes.get(name).copied()
    }

    /// Names are trimmed; empty entries are skipped.
    pub fn parse_pipeline(&self, pipeline: &str) -> Result<Pipeline, PipelineError> {
        let mut passes = Vec::new();

        for name in pipeline.split(',').map(str::trim).filter(|n| !n.is_empty()) {
            let constructor = self
                .lookup(name)
                .ok_or_else(|| PipelineError::UnknownPass(name.to_owned()))?;
            passes.push(constructor());
        }

        if passes.is_empty() {
            return Err(PipelineError::Empty);
        }

        Ok(Pipeline { passes })
    }
}

impl Default for PassRegistry {
    fn default() -> Self {
        Self::with_builtin_passes()
    }
}

static REGISTRY: Lazy<PassRegistry> = Lazy::new(PassRegistry::with_builtin_passes);

/// The process-wide registry of built-in passes.
pub fn registry() -> &'static PassRegistry {
    &REGISTRY
}

pub struct Pipeline {
    passes: Vec<Box<dyn FunctionPass + Send>>,
}

impl Pipeline {
    pub fn pass_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.passes.iter().map(|pass| pass.name())
    }

    /// Run every pass over `func`, in order. Stops at the first failure.
    pub fn run(
        &mut self,
        func: &Function,
        cx: &AnalysisContext<'_>,
        sink: &mut dyn RecordSink,
    ) -> Result<(), PassError> {
        for pass in &mut self.passes {
            debug!(pass = pass.name(), function = func.name(), "running pass");
            pass.run(func, cx, sink)?;
        }
        Ok(())
    }
}
