// Nested cross-validation benchmark runner

pub mod experiment;
pub mod final_model;
pub mod nested;
pub mod registry;
pub mod selector;

pub use experiment::{build_reporter, execute, run_experiment, run_on_data};
pub use final_model::FinalTrainer;
pub use nested::OuterLoopEvaluator;
pub use registry::{AlgorithmEntry, AlgorithmRegistry};
pub use selector::select_best;

/// `tracing` subscriber for the binaries: `RUST_LOG`, defaulting to `info`.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
