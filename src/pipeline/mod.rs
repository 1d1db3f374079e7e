// src/pipeline/mod.rs
// Question answering pipeline

mod classifier;
mod formatter;
mod generator;
mod orchestrator;
pub mod prompts;
mod types;

pub use classifier::Classifier;
pub use formatter::{Formatter, fallback_rendering};
pub use generator::{DescriptorGenerator, RelationalGenerator, heuristic_descriptor};
pub use orchestrator::QueryPipeline;
pub use types::{
    Artifact, Classification, MIN_QUESTION_CHARS, Outcome, Question, RelationalOutcome, ResultRows,
    RestDescriptor, RestTable, SheetRef, Stage,
};
