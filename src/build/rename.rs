//! Renames post-dedup files to their canonical `<id>.md` name.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use super::files::{self, DiscoverError, GlobOptions};
use super::naming::{
    TokenMatcher, canonical_id, canonical_name, file_name_of, relative_display,
    strip_collision_suffix,
};

#[derive(thiserror::Error, Debug)]
pub enum RenameError {
    #[error(transparent)]
    Discover(#[from] DiscoverError),

    #[error("no free name left for {0}")]
    NoFreeName(String),

    #[error("failed to rename {src} -> {dest}: {source}")]
    Io {
        src: PathBuf,
        dest: PathBuf,
        source: std::io::Error,
    },
}

/// What to do when `<id>.md` already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ConflictPolicy {
    /// Try `<id> (2).md`, `<id> (3).md`, ...
    #[default]
    Suffix,
    /// Replace the existing target.
    Overwrite,
    /// Leave the source untouched.
    Skip,
}

#[derive(Debug, Clone)]
pub struct RenameOptions {
    pub dir: PathBuf,
    pub pattern: String,
    pub conflict: ConflictPolicy,
    pub dry_run: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Renamed,
    Overwritten,
    SkippedExisting,
    SkippedNoId,
    Noop,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenameSummary {
    pub renamed: usize,
    pub overwritten: usize,
    pub skipped_existing: usize,
    pub skipped_no_id: usize,
    pub noop: usize,
    pub errors: usize,
}

impl RenameSummary {
    fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Renamed => self.renamed += 1,
            Outcome::Overwritten => self.overwritten += 1,
            Outcome::SkippedExisting => self.skipped_existing += 1,
            Outcome::SkippedNoId => self.skipped_no_id += 1,
            Outcome::Noop => self.noop += 1,
        }
    }

    /// One-line summary printed at the end of a run.
    pub fn line(&self, dir: &Path, dry_run: bool) -> String {
        format!(
            "Done. Dir: {} | Renamed: {} | Overwritten: {} | Skipped (exists): {} | Skipped (no id): {} | No-op: {} | Errors: {} | Mode: {}",
            dir.display(),
            self.renamed,
            self.overwritten,
            self.skipped_existing,
            self.skipped_no_id,
            self.noop,
            self.errors,
            if dry_run { "DRY-RUN" } else { "COMMIT" }
        )
    }
}

/// Rename every matching file under `opts.dir` to `<dir>/<id>.md`.
///
/// Files are handled one at a time in walk order. Targets taken earlier in
/// the run count as occupied, which keeps dry-run plans identical to what a
/// commit would do.
pub async fn run(opts: &RenameOptions) -> Result<RenameSummary, RenameError> {
    let options = GlobOptions {
        case_insensitive: true,
    };
    let sources = files::discover(&opts.dir, &opts.pattern, options)?;
    let mut summary = RenameSummary::default();

    if sources.is_empty() {
        warn!(dir = %opts.dir.display(), "no files matched the provided pattern");
        return Ok(summary);
    }

    let matcher = TokenMatcher::default();
    let mut claimed: HashSet<PathBuf> = HashSet::new();

    for src in &sources {
        match rename_one(src, opts, &matcher, &mut claimed).await {
            Ok(outcome) => summary.record(outcome),
            Err(e) => {
                error!(file = %src.display(), error = %e, "rename failed");
                summary.errors += 1;
            }
        }
    }

    Ok(summary)
}

async fn rename_one(
    src: &Path,
    opts: &RenameOptions,
    matcher: &TokenMatcher,
    claimed: &mut HashSet<PathBuf>,
) -> Result<Outcome, RenameError> {
    let name = file_name_of(src);
    let in_root = src.parent() == Some(opts.dir.as_path());

    if in_root && canonical_id(&name).is_some() {
        claimed.insert(src.to_path_buf());
        return Ok(Outcome::Noop);
    }

    let Some(id) = matcher.parse(&strip_collision_suffix(&name)).id else {
        warn!(file = %name, "skipping, no id");
        return Ok(Outcome::SkippedNoId);
    };

    let target_name = canonical_name(id);
    let base = opts.dir.join(&target_name);
    if base == src {
        claimed.insert(base);
        return Ok(Outcome::Noop);
    }

    let base_taken = claimed.contains(&base) || files::exists(&base).await;
    let (target, outcome) = match (base_taken, opts.conflict) {
        (false, _) => (base, Outcome::Renamed),
        (true, ConflictPolicy::Skip) => {
            warn!(target = %target_name, file = %name, "skipped, target exists");
            return Ok(Outcome::SkippedExisting);
        }
        (true, ConflictPolicy::Overwrite) => (base, Outcome::Overwritten),
        (true, ConflictPolicy::Suffix) => {
            let free = files::free_target(&opts.dir, &target_name, src, claimed)
                .await
                .ok_or_else(|| RenameError::NoFreeName(target_name.clone()))?;
            (free, Outcome::Renamed)
        }
    };

    if opts.dry_run {
        println!(
            "[DRY-RUN] {} -> {}",
            relative_display(src, &opts.dir),
            relative_display(&target, &opts.dir)
        );
    } else {
        if outcome == Outcome::Overwritten && files::exists(&target).await {
            tokio::fs::remove_file(&target)
                .await
                .map_err(|source| io_error(src, &target, source))?;
        }
        tokio::fs::rename(src, &target)
            .await
            .map_err(|source| io_error(src, &target, source))?;
        info!(from = %name, to = %file_name_of(&target), "renamed");
    }

    claimed.insert(target);
    Ok(outcome)
}

fn io_error(src: &Path, dest: &Path, source: std::io::Error) -> RenameError {
    RenameError::Io {
        src: src.to_path_buf(),
        dest: dest.to_path_buf(),
        source,
    }
}
