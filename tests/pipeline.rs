use instprof::{
    pass::{registry, AnalysisContext, PassError, PassRegistry, VecSink, WriterSink},
    FrequencySource, Options, PipelineError,
};

const MODULE: &str = "
; straight-line code with a hot loop
define @sum
entry freq=1:
  alloca
  store
  br loop
loop freq=100:
  load
  add
  icmp
  br loop, done !weights 99, 1
done freq=1:
  load
  ret

define @nothing

define @cold
entry:
  fadd
  ret
";

fn run(options: &Options, source: &str) -> String {
    let functions = instprof::parse_module(source).unwrap();
    let mut pipeline = registry().parse_pipeline("instprof").unwrap();
    let cx = AnalysisContext::new(options);
    let mut sink = WriterSink::new(Vec::new());

    for func in &functions {
        pipeline.run(func, &cx, &mut sink).unwrap();
    }

    String::from_utf8(sink.into_inner()).unwrap()
}

#[test]
fn recorded_frequencies() {
    let out = run(&Options::default(), MODULE);

    // sum: 3 + 400 + 2 = 405 weighted instructions.
    assert_eq!(
        out,
        "sum, 405, 0.494, 0.000, 0.254, 0.249, 0.000, 0.002\n\
         nothing, 0, 0.000, 0.000, 0.000, 0.000, 0.000, 0.000\n\
         cold, 0, 0.000, 0.000, 0.000, 0.000, 0.000, 0.000\n"
    );
}

#[test]
fn static_frequencies() {
    let options = Options {
        frequency_source: FrequencySource::Static,
        ..Options::default()
    };
    let out = run(&options, MODULE);
    let lines: Vec<&str> = out.lines().collect();

    // loop runs 10 times per entry under the static estimate: 3 + 40 + 2.
    assert_eq!(lines[0], "sum, 45, 0.444, 0.000, 0.289, 0.244, 0.000, 0.022");
    assert_eq!(lines[2], "cold, 2, 0.000, 0.500, 0.000, 0.000, 0.000, 0.500");
}

#[test]
fn unknown_pass_is_rejected() {
    assert!(matches!(
        registry().parse_pipeline("instprof, nope"),
        Err(PipelineError::UnknownPass(name)) if name == "nope"
    ));
    assert!(matches!(
        registry().parse_pipeline(" , "),
        Err(PipelineError::Empty)
    ));
}

#[test]
fn pipeline_runs_passes_in_order() {
    let registry = PassRegistry::default();
    let mut pipeline = registry.parse_pipeline("instprof,instprof").unwrap();
    assert_eq!(pipeline.pass_names().collect::<Vec<_>>(), ["instprof", "instprof"]);

    let functions = instprof::parse_module(MODULE).unwrap();
    let options = Options::default();
    let cx = AnalysisContext::new(&options);
    let mut sink = VecSink::default();
    pipeline.run(&functions[0], &cx, &mut sink).unwrap();

    assert_eq!(sink.records.len(), 2);
    assert_eq!(sink.records[0], sink.records[1]);
    assert_eq!(sink.records[0].function(), "sum");
}

#[test]
fn registering_twice_keeps_first() {
    let mut registry = PassRegistry::new();
    assert!(registry.lookup("instprof").is_none());

    let builtin = PassRegistry::with_builtin_passes();
    let constructor = builtin.lookup("instprof").unwrap();
    assert!(registry.register("instprof", constructor));
    assert!(!registry.register("instprof", constructor));
}

#[test]
fn branch_without_edges_is_unbiased() {
    let functions = instprof::parse_module("define @odd\nbb0 freq=1:\n  br\n  ret\n").unwrap();
    let options = Options::default();
    let cx = AnalysisContext::new(&options);
    let mut sink = VecSink::default();

    registry()
        .parse_pipeline("instprof")
        .unwrap()
        .run(&functions[0], &cx, &mut sink)
        .unwrap();

    assert_eq!(
        sink.records[0].to_string(),
        "odd, 2, 0.000, 0.000, 0.000, 0.000, 0.500, 0.500"
    );
}

#[test]
fn profile_errors_name_the_function() {
    let err = PassError::from(PipelineError::Profile {
        function: "odd".into(),
        source: instprof::ProfileError::MissingOracleData {
            block: instprof::BlockId(0),
            successor: 1,
        },
    });

    assert_eq!(
        err.to_string(),
        "in function `odd`: no probability for successor 1 of bb0"
    );
}

#[test]
fn parse_errors_name_the_file() {
    use anyhow::Context;

    let path = "broken.cfg".to_owned();
    let err = instprof::parse_module("define @f\nbb0:\n  frobnicate\n")
        .with_context(|| path.clone())
        .unwrap_err();

    assert_eq!(
        format!("{:#}", err),
        "broken.cfg: line 3: unknown opcode `frobnicate`"
    );
}
