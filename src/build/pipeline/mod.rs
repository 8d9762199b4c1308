//! Collection pipeline.
//!
//! A collection moves through these stages:
//! 1. dedup (extractor output into the complete directory)
//! 2. check-sequence (report id gaps and duplicates)
//! 3. rename (canonical `<id>.md` names)
//! 4. build-index (README)
//! 5. md-to-json (one JSON per document plus the docs index)
//! 6. index-pages (paginated index)
//!
//! Stages 4 to 6 only write derived artifacts and are skipped in dry-run.

mod context;
mod error;
mod stages;

pub use context::PipelineContext;
pub use error::PipelineError;

use async_trait::async_trait;
use tracing::info;

use stages::{DedupStage, JsonStage, PagesStage, ReadmeStage, RenameStage, SequenceStage};

/// A stage in the collection pipeline.
#[async_trait]
pub trait Stage: Send + Sync {
    /// Unique name for this stage (used by `--skip`).
    fn name(&self) -> &'static str;

    /// Whether the stage only derives artifacts from canonical documents.
    /// Such stages do not run in dry-run mode.
    fn derived(&self) -> bool {
        false
    }

    /// Run the stage and return a one-line summary.
    async fn run(&self, ctx: &mut PipelineContext<'_>) -> Result<String, PipelineError>;
}

/// The outcome line of one stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageReport {
    pub stage: &'static str,
    pub summary: String,
}

/// Ordered stages for one collection.
///
/// ```ignore
/// let mut pipeline = Pipeline::default_pipeline();
/// pipeline.without(&["build-index".to_string()])?;
/// let reports = pipeline.run(&mut ctx).await?;
/// ```
pub struct Pipeline {
    stages: Vec<Box<dyn Stage>>,
}

impl Pipeline {
    /// Create an empty pipeline with no stages.
    pub fn new() -> Self {
        Self { stages: Vec::new() }
    }

    /// Stages: dedup → check-sequence → rename → build-index → md-to-json → index-pages
    pub fn default_pipeline() -> Self {
        let mut pipeline = Self::new();
        pipeline.add_stage(DedupStage);
        pipeline.add_stage(SequenceStage);
        pipeline.add_stage(RenameStage);
        pipeline.add_stage(ReadmeStage);
        pipeline.add_stage(JsonStage);
        pipeline.add_stage(PagesStage);
        pipeline
    }

    /// Add a stage to the end of the pipeline.
    pub fn add_stage<S: Stage + 'static>(&mut self, stage: S) -> &mut Self {
        self.stages.push(Box::new(stage));
        self
    }

    /// Remove the named stages. Unknown names are an error.
    pub fn without(&mut self, names: &[String]) -> Result<&mut Self, PipelineError> {
        for name in names {
            if !self.stages.iter().any(|s| s.name() == name) {
                return Err(PipelineError::stage(
                    name.as_str(),
                    format!("unknown stage, expected one of: {}", self.stage_names().join(", ")),
                ));
            }
        }
        self.stages.retain(|s| !names.iter().any(|n| n == s.name()));
        Ok(self)
    }

    /// Run every stage in order. The first failing stage aborts the run.
    pub async fn run(&self, ctx: &mut PipelineContext<'_>) -> Result<Vec<StageReport>, PipelineError> {
        let mut reports = Vec::with_capacity(self.stages.len());

        for stage in &self.stages {
            let summary = if ctx.dry_run && stage.derived() {
                "skipped (dry run)".to_string()
            } else {
                info!(collection = %ctx.collection.name, stage = stage.name(), "running stage");
                stage.run(ctx).await?
            };
            reports.push(StageReport {
                stage: stage.name(),
                summary,
            });
        }

        Ok(reports)
    }

    /// Get the names of all stages in order.
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::default_pipeline()
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::config::CollectionConfig;

    fn collection(root: &Path) -> CollectionConfig {
        let mut collection = CollectionConfig::with_layout("rollos", "rollos", "rollo");
        collection.resolve_paths(root);
        collection
    }

    fn seed(collection: &CollectionConfig) {
        std::fs::create_dir_all(&collection.source_dir).unwrap();
        let files = [
            ("id-1_pagina-1__UNO.md", "# Uno\n\nPrimer texto.\n\n*Escribe: Alfa*\n"),
            ("id-2_pagina-1__DOS.md", "# Dos\n\nSegundo texto.\n"),
            ("copia/id-2_pagina-1__DOS.md", "# Dos   \n\nSegundo texto.\t\n\n\n"),
            ("id-4_pagina-1__CUATRO.md", "# Cuatro\n\nCuarto texto.\n"),
        ];
        for (name, content) in files {
            let path = collection.source_dir.join(name);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, content).unwrap();
        }
    }

    #[test]
    fn test_default_stage_order() {
        assert_eq!(
            Pipeline::default_pipeline().stage_names(),
            vec![
                "dedup",
                "check-sequence",
                "rename",
                "build-index",
                "md-to-json",
                "index-pages"
            ]
        );
    }

    #[test]
    fn test_without_removes_and_validates() {
        let mut pipeline = Pipeline::default_pipeline();
        pipeline
            .without(&["build-index".to_string(), "dedup".to_string()])
            .unwrap();
        assert_eq!(
            pipeline.stage_names(),
            vec!["check-sequence", "rename", "md-to-json", "index-pages"]
        );

        assert!(matches!(
            pipeline.without(&["publish".to_string()]),
            Err(PipelineError::Stage { .. })
        ));
    }

    #[tokio::test]
    async fn test_full_run_commits_every_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let collection = collection(dir.path());
        seed(&collection);

        let mut ctx = PipelineContext::new(&collection, false, 2);
        let reports = Pipeline::default_pipeline().run(&mut ctx).await.unwrap();

        assert_eq!(reports.len(), 6);
        assert!(collection.complete_dir.join("1.md").exists());
        assert!(collection.complete_dir.join("2.md").exists());
        assert!(collection.complete_dir.join("4.md").exists());
        assert!(collection.complete_dir.join("README.md").exists());
        assert_eq!(std::fs::read_dir(&collection.duplicates_dir).unwrap().count(), 1);
        assert!(collection.json_dir.join("4.json").exists());
        assert!(collection.pages_dir.join("meta.json").exists());
        assert!(collection.pages_dir.join("1.json").exists());

        let index: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&collection.index_file).unwrap())
                .unwrap();
        assert_eq!(index.as_array().unwrap().len(), 3);
        assert_eq!(index[0]["autor"], "Alfa");
    }

    #[tokio::test]
    async fn test_dry_run_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let collection = collection(dir.path());
        seed(&collection);

        let mut ctx = PipelineContext::new(&collection, true, 2);
        let reports = Pipeline::default_pipeline().run(&mut ctx).await.unwrap();

        assert_eq!(reports[3].summary, "skipped (dry run)");
        assert_eq!(reports[5].summary, "skipped (dry run)");
        assert!(!collection.complete_dir.exists());
        assert!(!collection.index_file.exists());
        assert_eq!(ctx.dedup.as_ref().map(|d| d.duplicate_count), Some(1));
    }
}
