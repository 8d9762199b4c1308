use crate::{
    BuildIndexArgs,
    build::readme::{self, ReadmeOptions},
    util::default_concurrency,
};

pub async fn run(args: &BuildIndexArgs) -> Result<(), anyhow::Error> {
    let opts = ReadmeOptions {
        dir: args.dir.clone(),
        out: args.out.clone(),
        per_page: args.per_page,
        heading: args.heading.clone(),
        note: args.note.clone(),
        include_empty_pages: args.include_empty_pages,
        concurrency: args.concurrency.unwrap_or_else(default_concurrency),
        template: args.template.clone(),
    };

    let summary = readme::run(&opts).await?;
    println!(
        "README generated at: {} ({} documents, {} errors)",
        summary.out.display(),
        summary.entries,
        summary.errors
    );

    Ok(())
}
