//! Extracts the end-of-chapter quizzes of a two-volume EPUB into one
//! markdown checklist: a heading per chapter, then each question with its
//! choices ticked against the chapter's answer key and the explanation
//! pulled from the matching volume's appendix.

pub mod answer_key;
pub mod archive;
pub mod assembler;
pub mod dom;
pub mod error;
pub mod explanation;
pub mod heading;
pub mod pipeline;
pub mod volume;

#[cfg(test)]
mod test_support;

pub use error::{QuizError, Result};
pub use pipeline::{
    DirectorySource, DocumentSource, InMemorySource, Pipeline, PipelineConfig, RunSummary,
};
