//! Pipeline error types.

use crate::build::convert::ConvertError;
use crate::build::dedup::DedupError;
use crate::build::paginate::PaginateError;
use crate::build::readme::ReadmeError;
use crate::build::rename::RenameError;
use crate::build::sequence::SequenceError;

/// Errors that abort a pipeline run.
#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    #[error("dedup failed: {0}")]
    Dedup(#[from] DedupError),

    #[error("sequence check failed: {0}")]
    Sequence(#[from] SequenceError),

    #[error("rename failed: {0}")]
    Rename(#[from] RenameError),

    #[error("readme generation failed: {0}")]
    Readme(#[from] ReadmeError),

    #[error("markdown to json failed: {0}")]
    Convert(#[from] ConvertError),

    #[error("index pagination failed: {0}")]
    Paginate(#[from] PaginateError),

    #[error("stage '{stage}' failed: {message}")]
    Stage { stage: String, message: String },
}

impl PipelineError {
    /// Create a stage-specific error.
    pub fn stage(stage: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Stage {
            stage: stage.into(),
            message: message.into(),
        }
    }
}
