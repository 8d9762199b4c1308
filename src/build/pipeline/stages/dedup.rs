//! Dedup stage.

use async_trait::async_trait;

use crate::build::dedup::{self, DedupOptions};
use crate::build::pipeline::{PipelineContext, PipelineError, Stage};

/// Moves the first copy of each distinct document into the complete
/// directory and sets the others aside.
pub struct DedupStage;

#[async_trait]
impl Stage for DedupStage {
    fn name(&self) -> &'static str {
        "dedup"
    }

    async fn run(&self, ctx: &mut PipelineContext<'_>) -> Result<String, PipelineError> {
        let collection = ctx.collection;
        let opts = DedupOptions {
            src: collection.source_dir.clone(),
            dest: collection.complete_dir.clone(),
            duplicates: collection.duplicates_dir.clone(),
            delete_duplicates: collection.dedup.delete_duplicates,
            flatten: collection.dedup.flatten,
            concurrency: ctx.concurrency,
            max_bytes: collection.dedup.max_bytes,
            normalize: collection.dedup.normalize(),
            dry_run: ctx.dry_run,
        };

        let summary = dedup::run(&opts).await?;
        let line = format!(
            "{} scanned, {} unique, {} duplicates, {} skipped",
            summary.total_scanned, summary.unique_count, summary.duplicate_count, summary.skipped
        );
        ctx.dedup = Some(summary);
        Ok(line)
    }
}
