use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::build::rename::ConflictPolicy;

mod build;
mod commands;
mod config;
mod util;

#[derive(Parser)]
#[command(version, about)]
struct Args {
    /// The command to execute
    #[command(subcommand)]
    command: RollosCommand,
}

/// `--dry-run <bool>` plus `--commit`, which always wins.
#[derive(clap::Args, Clone, Copy)]
struct DryRunArgs {
    /// Only report what would happen
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    dry_run: bool,

    /// Perform the changes (implies --dry-run false)
    #[arg(long, default_value = "false")]
    commit: bool,
}

impl DryRunArgs {
    fn is_dry_run(&self) -> bool {
        self.dry_run && !self.commit
    }
}

#[derive(Parser)]
struct InitArgs {
    /// The path to initialize the project in
    path: PathBuf,

    /// Whether to create the directory if it doesn't exist
    #[arg(short, long, default_value = "false")]
    create: bool,
}

#[derive(Parser)]
struct ExtractArgs {
    /// Directory with the saved `*.htm`/`*.html` pages
    #[arg(long = "in")]
    html: PathBuf,

    /// Directory for the `id-<N>[_pagina-<P>]__TITLE.md` files
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser)]
struct CheckSequenceArgs {
    /// Directory with files named `id-<N>[_pagina-<P>]...`
    #[arg(long)]
    dir: PathBuf,

    /// Write the report as JSON to this file
    #[arg(long)]
    out: Option<PathBuf>,

    /// Glob matched against paths relative to --dir
    #[arg(long, default_value = "**/*.md")]
    pattern: String,

    /// Also look for gaps in the `pagina-<P>` numbers of each id
    #[arg(long, default_value = "false")]
    check_pages: bool,

    /// First expected page number
    #[arg(long, default_value_t = 1)]
    page_start_at: u64,

    /// Match `id-`/`pagina-` tokens case-sensitively
    #[arg(long, default_value = "false")]
    case_sensitive: bool,
}

#[derive(Parser)]
struct DedupArgs {
    /// Directory with the extracted Markdown files
    #[arg(long)]
    src: PathBuf,

    /// Destination for unique documents
    #[arg(long, default_value = "./complete")]
    dest: PathBuf,

    /// Destination for duplicates
    #[arg(long, default_value = "./duplicates")]
    duplicates: PathBuf,

    /// Delete duplicates instead of moving them
    #[arg(long, default_value = "false")]
    delete_duplicates: bool,

    /// Put every output directly in the target folder
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    flatten: bool,

    /// Max in-flight file reads (defaults to the CPU count, 2 to 8)
    #[arg(long)]
    concurrency: Option<usize>,

    /// Skip files larger than this many bytes
    #[arg(long, default_value_t = build::dedup::DEFAULT_MAX_BYTES)]
    max_bytes: u64,

    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    ignore_front_matter: bool,

    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    collapse_blank_lines: bool,

    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    normalize_eol: bool,

    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    trim_trailing_spaces: bool,

    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    strip_bom: bool,

    #[command(flatten)]
    mode: DryRunArgs,
}

#[derive(Parser)]
struct RenameArgs {
    /// Directory with the deduplicated files
    #[arg(long, default_value = "./complete")]
    dir: PathBuf,

    /// Glob matched case-insensitively against paths relative to --dir
    #[arg(long, default_value = "**/*.md")]
    pattern: String,

    /// What to do when `<id>.md` already exists
    #[arg(long, value_enum, default_value_t = ConflictPolicy::Suffix)]
    conflict: ConflictPolicy,

    #[command(flatten)]
    mode: DryRunArgs,
}

#[derive(Parser)]
struct BuildIndexArgs {
    /// Directory with the `<id>.md` files
    #[arg(long, default_value = "./complete")]
    dir: PathBuf,

    /// README path (defaults to `<dir>/README.md`)
    #[arg(long)]
    out: Option<PathBuf>,

    /// IDs per section
    #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u64).range(1..))]
    per_page: u64,

    /// Top-level heading
    #[arg(long, default_value = build::readme::DEFAULT_HEADING)]
    heading: String,

    /// Paragraph under the heading
    #[arg(long, default_value = build::readme::DEFAULT_NOTE)]
    note: String,

    /// Keep sections without documents
    #[arg(long, default_value = "false")]
    include_empty_pages: bool,

    /// Max in-flight file reads
    #[arg(long)]
    concurrency: Option<usize>,

    /// Tera template replacing the built-in layout
    #[arg(long)]
    template: Option<PathBuf>,
}

#[derive(Parser)]
struct MdToJsonArgs {
    /// Directory with the `<id>.md` files
    #[arg(long, default_value = "assets/docs-src")]
    src: PathBuf,

    /// Directory for the `<id>.json` files
    #[arg(long, default_value = "assets/docs")]
    out: PathBuf,

    /// Path of the docs index
    #[arg(long, default_value = "assets/docs-index.json")]
    index: PathBuf,

    /// Max in-flight conversions
    #[arg(long)]
    concurrency: Option<usize>,
}

#[derive(Parser)]
struct IndexPagesArgs {
    /// Path of the docs index
    #[arg(long)]
    index: PathBuf,

    /// Output directory for `meta.json` and `<page>.json`
    #[arg(long)]
    out: PathBuf,

    /// IDs per page, values below 1 fall back to 10
    #[arg(long, default_value_t = 10, allow_negative_numbers = true)]
    page_size: i64,
}

#[derive(Parser)]
struct RunArgs {
    /// The path to the configuration file
    #[arg(short, long = "config", default_value = config::DEFAULT_CONFIG_FILE)]
    config_file: Option<PathBuf>,

    /// Only run these collections (default: all)
    #[arg(long = "collection")]
    collections: Vec<String>,

    /// Leave out these stages
    #[arg(long)]
    skip: Vec<String>,

    #[command(flatten)]
    mode: DryRunArgs,
}

#[derive(Subcommand)]
enum RollosCommand {
    /// Extract Markdown documents from saved HTML pages
    Extract(ExtractArgs),

    /// Report missing and duplicate ids in a directory
    CheckSequence(CheckSequenceArgs),

    /// Move unique documents aside and set duplicates apart
    Dedup(DedupArgs),

    /// Rename documents to `<id>.md`
    Rename(RenameArgs),

    /// Write a paginated README index
    BuildIndex(BuildIndexArgs),

    /// Convert `<id>.md` documents to JSON
    MdToJson(MdToJsonArgs),

    /// Split the docs index into JSON pages
    IndexPages(IndexPagesArgs),

    /// Run every stage for the configured collections
    Run(RunArgs),

    /// Write a default rollos.yaml
    Init(InitArgs),
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    init_tracing();
    let args = Args::parse();

    match args.command {
        RollosCommand::Extract(args) => {
            commands::extract::run(&args).await?;
        }
        RollosCommand::CheckSequence(args) => {
            commands::check_sequence::run(&args).await?;
        }
        RollosCommand::Dedup(args) => {
            commands::dedup::run(&args).await?;
        }
        RollosCommand::Rename(args) => {
            commands::rename::run(&args).await?;
        }
        RollosCommand::BuildIndex(args) => {
            commands::build_index::run(&args).await?;
        }
        RollosCommand::MdToJson(args) => {
            commands::md_to_json::run(&args).await?;
        }
        RollosCommand::IndexPages(args) => {
            commands::index_pages::run(&args).await?;
        }
        RollosCommand::Run(args) => {
            commands::run::run(&args).await?;
        }
        RollosCommand::Init(args) => {
            commands::init::run(&args).await?;
        }
    }

    Ok(())
}
