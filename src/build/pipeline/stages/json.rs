//! Markdown to JSON stage.

use async_trait::async_trait;

use crate::build::convert::{self, ConvertOptions};
use crate::build::pipeline::{PipelineContext, PipelineError, Stage};

/// Converts canonical documents to JSON and writes the docs index.
pub struct JsonStage;

#[async_trait]
impl Stage for JsonStage {
    fn name(&self) -> &'static str {
        "md-to-json"
    }

    fn derived(&self) -> bool {
        true
    }

    async fn run(&self, ctx: &mut PipelineContext<'_>) -> Result<String, PipelineError> {
        let collection = ctx.collection;
        let opts = ConvertOptions {
            src: collection.complete_dir.clone(),
            out: collection.json_dir.clone(),
            index: collection.index_file.clone(),
            concurrency: ctx.concurrency,
        };

        let summary = convert::run(&opts).await?;
        Ok(summary.line())
    }
}
