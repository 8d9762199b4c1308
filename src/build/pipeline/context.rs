//! Pipeline context for sharing state across stages.

use crate::build::dedup::DedupSummary;
use crate::config::CollectionConfig;

/// Shared context for the stages of one collection run.
pub struct PipelineContext<'a> {
    /// The collection being processed
    pub collection: &'a CollectionConfig,

    /// Plan only, no filesystem writes
    pub dry_run: bool,

    /// Max in-flight file operations within a stage
    pub concurrency: usize,

    /// Set once the dedup stage has run
    pub dedup: Option<DedupSummary>,
}

impl<'a> PipelineContext<'a> {
    pub fn new(collection: &'a CollectionConfig, dry_run: bool, concurrency: usize) -> Self {
        Self {
            collection,
            dry_run,
            concurrency: concurrency.max(1),
            dedup: None,
        }
    }
}
