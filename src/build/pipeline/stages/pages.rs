//! Index pagination stage.

use async_trait::async_trait;

use crate::build::paginate;
use crate::build::pipeline::{PipelineContext, PipelineError, Stage};

/// Splits the docs index into `meta.json` and `<page>.json` files.
pub struct PagesStage;

#[async_trait]
impl Stage for PagesStage {
    fn name(&self) -> &'static str {
        "index-pages"
    }

    fn derived(&self) -> bool {
        true
    }

    async fn run(&self, ctx: &mut PipelineContext<'_>) -> Result<String, PipelineError> {
        let collection = ctx.collection;
        let meta = paginate::run(
            &collection.index_file,
            &collection.pages_dir,
            collection.pages.page_size,
        )
        .await?;

        Ok(format!(
            "{} pages of {} (max id {})",
            meta.total_pages, meta.page_size, meta.max_id
        ))
    }
}
