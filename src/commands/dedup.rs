use crate::{
    DedupArgs,
    build::dedup::{self, DedupOptions},
    build::normalize::NormalizeOptions,
    util::default_concurrency,
};

pub async fn run(args: &DedupArgs) -> Result<(), anyhow::Error> {
    let opts = DedupOptions {
        src: args.src.clone(),
        dest: args.dest.clone(),
        duplicates: args.duplicates.clone(),
        delete_duplicates: args.delete_duplicates,
        flatten: args.flatten,
        concurrency: args.concurrency.unwrap_or_else(default_concurrency),
        max_bytes: args.max_bytes,
        normalize: NormalizeOptions {
            strip_bom: args.strip_bom,
            normalize_eol: args.normalize_eol,
            trim_trailing_spaces: args.trim_trailing_spaces,
            ignore_front_matter: args.ignore_front_matter,
            collapse_blank_lines: args.collapse_blank_lines,
        },
        dry_run: args.mode.is_dry_run(),
    };

    let summary = dedup::run(&opts).await?;
    println!("{}", serde_json::to_string_pretty(&summary)?);

    Ok(())
}
