use tracing::info;

use crate::{
    ExtractArgs,
    build::extract::{self, MarkdownWriter, StrategyRegistry},
    build::html::PlainHtmlStrategy,
};

pub async fn run(args: &ExtractArgs) -> Result<(), anyhow::Error> {
    let mut registry = StrategyRegistry::new();
    registry.register(PlainHtmlStrategy);
    info!(strategies = ?registry.names(), "extracting {}", args.html.display());

    let mut writer = MarkdownWriter::new(&args.out);
    let summary = extract::run(&args.html, &registry, &mut writer).await?;
    println!(
        "Done. Pages: {}. Written: {}. Empty: {}. Failed pages: {}. Failed documents: {}. Output: {}",
        summary.pages,
        summary.written,
        summary.skipped_empty,
        summary.failed_pages,
        summary.failed_documents,
        args.out.display()
    );

    Ok(())
}
