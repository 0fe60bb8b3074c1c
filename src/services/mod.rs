pub mod evaluation;
pub mod profiler;

pub use evaluation::{Evaluation, ScriptEvaluation};
pub use profiler::{
    GenerationSummary, LogStyle, ParetoEntry, Profiler, ProfilerSettings, RunManifest,
    RunProfiler, SampleRecord,
};
