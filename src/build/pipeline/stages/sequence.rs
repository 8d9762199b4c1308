//! Sequence check stage.

use async_trait::async_trait;

use crate::build::pipeline::{PipelineContext, PipelineError, Stage};
use crate::build::sequence::{self, SequenceOptions};

/// Reports id gaps and duplicates. Looks at the complete directory once
/// dedup has committed, and at the extractor output otherwise.
pub struct SequenceStage;

#[async_trait]
impl Stage for SequenceStage {
    fn name(&self) -> &'static str {
        "check-sequence"
    }

    async fn run(&self, ctx: &mut PipelineContext<'_>) -> Result<String, PipelineError> {
        let collection = ctx.collection;
        let dir = if ctx.dry_run {
            collection.source_dir.clone()
        } else {
            collection.complete_dir.clone()
        };
        let settings = &collection.sequence;
        let opts = SequenceOptions {
            dir,
            pattern: settings.pattern.clone(),
            check_pages: settings.check_pages,
            page_start_at: settings.page_start_at,
            case_insensitive: settings.case_insensitive,
        };

        let report = sequence::check(&opts)?;
        sequence::print_report(&report, opts.check_pages);

        if let Some(path) = &settings.report
            && !ctx.dry_run
        {
            sequence::write_report(&report, path).await?;
        }

        Ok(format!(
            "{} ids, {} missing, {} duplicate ids, {} unparsable",
            report.ids_present.len(),
            report.missing_count,
            report.duplicate_ids.len(),
            report.unparsable_files.len()
        ))
    }
}
