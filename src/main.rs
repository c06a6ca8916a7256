use std::{io::Read, process::ExitCode};

use anyhow::{Context, Result};
use instprof::{
    pass::{registry, AnalysisContext, InstructionProfilePass, WriterSink},
    FrequencySource, Options,
};
use tracing_subscriber::EnvFilter;

const HELP: &str = "\
instprof: frequency-weighted instruction mix of annotated CFGs

USAGE:
  instprof [OPTIONS] FILE...

Reads each FILE (`-` for stdin) and writes one record per function to stderr:
  name, total, integer, float, memory, biased_branch, unbiased_branch, other

OPTIONS:
  --static          Estimate block frequencies from loop nesting instead of
                    using the recorded `freq=` counts
  --dump-cfg        Log each function's CFG at debug level
  --passes LIST     Comma separated pass pipeline [default: instprof]
  -h, --help        Print this help
";

struct Args {
    options: Options,
    passes: String,
    files: Vec<String>,
}

fn parse_args() -> Result<Args, pico_args::Error> {
    let mut args = pico_args::Arguments::from_env();

    if args.contains(["-h", "--help"]) {
        print!("{}", HELP);
        std::process::exit(0);
    }

    let mut options = Options::default();
    if args.contains("--static") {
        options.frequency_source = FrequencySource::Static;
    }
    options.dump_cfg = args.contains("--dump-cfg");

    let passes = args
        .opt_value_from_str("--passes")?
        .unwrap_or_else(|| InstructionProfilePass::NAME.to_owned());

    let files = args
        .finish()
        .into_iter()
        .map(|arg| arg.to_string_lossy().into_owned())
        .collect();

    Ok(Args {
        options,
        passes,
        files,
    })
}

fn read_source(path: &str) -> std::io::Result<String> {
    if path == "-" {
        let mut source = String::new();
        std::io::stdin().read_to_string(&mut source)?;
        Ok(source)
    } else {
        std::fs::read_to_string(path)
    }
}

fn run(args: Args) -> Result<()> {
    let mut pipeline = registry()
        .parse_pipeline(&args.passes)
        .with_context(|| format!("invalid pass pipeline `{}`", args.passes))?;
    let cx = AnalysisContext::new(&args.options);
    let mut sink = WriterSink::new(std::io::stderr().lock());

    for path in &args.files {
        let source = read_source(path).with_context(|| path.clone())?;
        let functions = instprof::parse_module(&source).with_context(|| path.clone())?;

        for func in &functions {
            pipeline
                .run(func, &cx, &mut sink)
                .with_context(|| path.clone())?;
        }
    }

    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = match parse_args() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("error: {}\n\n{}", e, HELP);
            return ExitCode::FAILURE;
        }
    };

    if args.files.is_empty() {
        eprint!("{}", HELP);
        return ExitCode::FAILURE;
    }

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
