//! README stage.

use async_trait::async_trait;

use crate::build::pipeline::{PipelineContext, PipelineError, Stage};
use crate::build::readme::{self, ReadmeOptions};

/// Writes `README.md` into the complete directory.
pub struct ReadmeStage;

#[async_trait]
impl Stage for ReadmeStage {
    fn name(&self) -> &'static str {
        "build-index"
    }

    fn derived(&self) -> bool {
        true
    }

    async fn run(&self, ctx: &mut PipelineContext<'_>) -> Result<String, PipelineError> {
        let collection = ctx.collection;
        let settings = &collection.readme;
        let opts = ReadmeOptions {
            dir: collection.complete_dir.clone(),
            out: None,
            per_page: settings.per_page,
            heading: settings.heading.clone(),
            note: settings.note.clone(),
            include_empty_pages: settings.include_empty_pages,
            concurrency: ctx.concurrency,
            template: settings.template.clone(),
        };

        let summary = readme::run(&opts).await?;
        Ok(format!(
            "{} entries in {} sections, {} errors",
            summary.entries, summary.sections, summary.errors
        ))
    }
}
