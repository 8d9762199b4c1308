//! Rename stage.

use async_trait::async_trait;

use crate::build::pipeline::{PipelineContext, PipelineError, Stage};
use crate::build::rename::{self, RenameOptions};

/// Renames the complete directory's documents to `<id>.md`.
pub struct RenameStage;

#[async_trait]
impl Stage for RenameStage {
    fn name(&self) -> &'static str {
        "rename"
    }

    async fn run(&self, ctx: &mut PipelineContext<'_>) -> Result<String, PipelineError> {
        let collection = ctx.collection;

        // A dry-run dedup leaves the complete directory unpopulated.
        if ctx.dry_run && !collection.complete_dir.exists() {
            return Ok(format!(
                "skipped ({} does not exist yet)",
                collection.complete_dir.display()
            ));
        }

        let opts = RenameOptions {
            dir: collection.complete_dir.clone(),
            pattern: collection.rename.pattern.clone(),
            conflict: collection.rename.conflict,
            dry_run: ctx.dry_run,
        };
        let summary = rename::run(&opts).await?;

        Ok(format!(
            "{} renamed, {} overwritten, {} skipped (exists), {} skipped (no id), {} no-op, {} errors",
            summary.renamed,
            summary.overwritten,
            summary.skipped_existing,
            summary.skipped_no_id,
            summary.noop,
            summary.errors
        ))
    }
}
