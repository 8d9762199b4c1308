//! Duplicate detection by normalized content hash.
//!
//! Dedup runs in two phases:
//! 1. **Plan**: every candidate is read and hashed (up to `concurrency`
//!    files in flight). Results come back in discovery order, and the
//!    canonical-or-duplicate decision is made serially in that order, so the
//!    first file with a given hash always wins.
//! 2. **Execute**: canonical copies are moved to `dest`; duplicates are moved
//!    to `duplicates` or deleted. Nothing is written in dry-run mode.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use futures_util::stream::{self, StreamExt};
use serde::Serialize;
use tracing::{error, info, warn};

use super::files::{self, DiscoverError, GlobOptions};
use super::naming::file_name_of;
use super::normalize::{NormalizeOptions, content_hash};
use crate::util::display_absolute;

/// Default size ceiling: files larger than 5 MiB are skipped.
pub const DEFAULT_MAX_BYTES: u64 = 5 * 1024 * 1024;

#[derive(thiserror::Error, Debug)]
pub enum DedupError {
    #[error(transparent)]
    Discover(#[from] DiscoverError),

    #[error("failed to create output directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
}

#[derive(Debug, Clone)]
pub struct DedupOptions {
    pub src: PathBuf,
    pub dest: PathBuf,
    pub duplicates: PathBuf,
    pub delete_duplicates: bool,
    pub flatten: bool,
    pub concurrency: usize,
    pub max_bytes: u64,
    pub normalize: NormalizeOptions,
    pub dry_run: bool,
}

/// What will happen to one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanAction {
    MoveUnique { target: PathBuf },
    MoveDuplicate { target: PathBuf, canonical: PathBuf },
    DeleteDuplicate { canonical: PathBuf },
    Skip { reason: String },
}

#[derive(Debug, Clone)]
pub struct FilePlan {
    pub src: PathBuf,
    pub size: u64,
    pub hash: Option<String>,
    pub action: PlanAction,
}

impl FilePlan {
    fn skip(src: PathBuf, size: u64, reason: impl Into<String>) -> Self {
        Self {
            src,
            size,
            hash: None,
            action: PlanAction::Skip {
                reason: reason.into(),
            },
        }
    }

    pub fn is_skip(&self) -> bool {
        matches!(self.action, PlanAction::Skip { .. })
    }

    pub fn is_duplicate(&self) -> bool {
        matches!(
            self.action,
            PlanAction::MoveDuplicate { .. } | PlanAction::DeleteDuplicate { .. }
        )
    }
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DedupSummary {
    pub total_found: usize,
    pub total_scanned: usize,
    pub total_bytes: u64,
    pub unique_count: usize,
    pub duplicate_count: usize,
    pub moved_unique: usize,
    pub moved_duplicates: usize,
    pub deleted_duplicates: usize,
    pub skipped: usize,
    pub dest: String,
    pub duplicates_dir: String,
}

/// Result of reading and hashing one candidate.
enum Analysis {
    Hashed { size: u64, hash: String },
    Skipped { size: u64, reason: String },
}

/// Discover, plan and execute a dedup run.
pub async fn run(opts: &DedupOptions) -> Result<DedupSummary, DedupError> {
    let candidates = files::discover(&opts.src, "**/*.md", GlobOptions::default())?;
    info!(
        "Found {} .md files under {}.",
        candidates.len(),
        display_absolute(&opts.src)
    );

    let plans = plan(candidates, opts).await;

    if !opts.dry_run {
        ensure_dir(&opts.dest).await?;
        if !opts.delete_duplicates {
            ensure_dir(&opts.duplicates).await?;
        }
    }

    Ok(execute(&plans, opts).await)
}

async fn ensure_dir(path: &Path) -> Result<(), DedupError> {
    tokio::fs::create_dir_all(path)
        .await
        .map_err(|source| DedupError::CreateDir {
            path: path.to_path_buf(),
            source,
        })
}

/// Hash every candidate and decide what happens to it.
///
/// `candidates` must be in discovery order; the first file producing a
/// given hash becomes the canonical copy.
pub async fn plan(candidates: Vec<PathBuf>, opts: &DedupOptions) -> Vec<FilePlan> {
    let analyses: Vec<(PathBuf, std::io::Result<Analysis>)> = stream::iter(candidates)
        .map(|path| async move {
            let analysis = analyze(&path, opts).await;
            (path, analysis)
        })
        .buffered(opts.concurrency.max(1))
        .collect()
        .await;

    let mut seen: HashMap<String, PathBuf> = HashMap::new();
    let mut claimed: HashSet<PathBuf> = HashSet::new();
    let mut plans = Vec::with_capacity(analyses.len());

    for (src, analysis) in analyses {
        let (size, hash) = match analysis {
            Ok(Analysis::Hashed { size, hash }) => (size, hash),
            Ok(Analysis::Skipped { size, reason }) => {
                plans.push(FilePlan::skip(src, size, reason));
                continue;
            }
            Err(e) => {
                error!(path = %src.display(), error = %e, "failed to analyze file");
                plans.push(FilePlan::skip(src, 0, e.to_string()));
                continue;
            }
        };

        let action = match seen.get(&hash) {
            Some(canonical) if opts.delete_duplicates => PlanAction::DeleteDuplicate {
                canonical: canonical.clone(),
            },
            Some(canonical) => {
                let canonical = canonical.clone();
                match target_path(&src, &opts.duplicates, opts, &claimed).await {
                    Some(target) => {
                        claimed.insert(target.clone());
                        PlanAction::MoveDuplicate { target, canonical }
                    }
                    None => PlanAction::Skip {
                        reason: "no free target name".to_string(),
                    },
                }
            }
            None => {
                seen.insert(hash.clone(), src.clone());
                match target_path(&src, &opts.dest, opts, &claimed).await {
                    Some(target) => {
                        claimed.insert(target.clone());
                        PlanAction::MoveUnique { target }
                    }
                    None => PlanAction::Skip {
                        reason: "no free target name".to_string(),
                    },
                }
            }
        };

        plans.push(FilePlan {
            src,
            size,
            hash: Some(hash),
            action,
        });
    }

    plans
}

async fn analyze(path: &Path, opts: &DedupOptions) -> std::io::Result<Analysis> {
    let meta = tokio::fs::metadata(path).await?;
    if !meta.is_file() {
        return Ok(Analysis::Skipped {
            size: 0,
            reason: "not a regular file".to_string(),
        });
    }
    if meta.len() > opts.max_bytes {
        return Ok(Analysis::Skipped {
            size: meta.len(),
            reason: format!("larger than {} bytes", opts.max_bytes),
        });
    }

    let content = tokio::fs::read_to_string(path).await?;
    Ok(Analysis::Hashed {
        size: meta.len(),
        hash: content_hash(&content, &opts.normalize),
    })
}

/// Where a file lands under `base_out`.
///
/// Flattened outputs go directly into `base_out` with ` (n)` suffixes on
/// collision; otherwise the path relative to the source root is kept.
async fn target_path(
    src: &Path,
    base_out: &Path,
    opts: &DedupOptions,
    claimed: &HashSet<PathBuf>,
) -> Option<PathBuf> {
    let (dir, name) = if opts.flatten {
        (base_out.to_path_buf(), file_name_of(src))
    } else {
        let relative = src.strip_prefix(&opts.src).unwrap_or(src);
        let dir = match relative.parent() {
            Some(parent) => base_out.join(parent),
            None => base_out.to_path_buf(),
        };
        (dir, file_name_of(src))
    };

    files::free_target(&dir, &name, src, claimed).await
}

/// Carry out the plan and tally the results.
pub async fn execute(plans: &[FilePlan], opts: &DedupOptions) -> DedupSummary {
    let mut summary = DedupSummary {
        total_found: plans.len(),
        total_scanned: plans.iter().filter(|p| !p.is_skip()).count(),
        total_bytes: plans.iter().map(|p| p.size).sum(),
        unique_count: plans
            .iter()
            .filter(|p| matches!(p.action, PlanAction::MoveUnique { .. }))
            .count(),
        duplicate_count: plans.iter().filter(|p| p.is_duplicate()).count(),
        dest: display_absolute(&opts.dest),
        duplicates_dir: display_absolute(&opts.duplicates),
        ..DedupSummary::default()
    };

    if opts.dry_run {
        let to_move_dup = plans
            .iter()
            .filter(|p| matches!(p.action, PlanAction::MoveDuplicate { .. }))
            .count();
        let to_delete = summary.duplicate_count - to_move_dup;
        println!(
            "[DRY-RUN] Unique to move: {}, Duplicates to move: {}, Duplicates to delete: {}",
            summary.unique_count, to_move_dup, to_delete
        );
        summary.skipped = plans.iter().filter(|p| p.is_skip()).count();
        return summary;
    }

    for plan in plans {
        let result = match &plan.action {
            PlanAction::MoveUnique { target } => files::move_file(&plan.src, target)
                .await
                .map(|()| summary.moved_unique += 1),
            PlanAction::MoveDuplicate { target, .. } => files::move_file(&plan.src, target)
                .await
                .map(|()| summary.moved_duplicates += 1),
            PlanAction::DeleteDuplicate { .. } => tokio::fs::remove_file(&plan.src)
                .await
                .map(|()| summary.deleted_duplicates += 1),
            PlanAction::Skip { reason } => {
                warn!(path = %plan.src.display(), reason = %reason, "skipped");
                summary.skipped += 1;
                Ok(())
            }
        };

        if let Err(e) = result {
            error!(path = %plan.src.display(), error = %e, "failed to apply dedup action");
            summary.skipped += 1;
        }
    }

    summary
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(root: &Path) -> DedupOptions {
        DedupOptions {
            src: root.join("src"),
            dest: root.join("complete"),
            duplicates: root.join("duplicates"),
            delete_duplicates: false,
            flatten: true,
            concurrency: 4,
            max_bytes: DEFAULT_MAX_BYTES,
            normalize: NormalizeOptions::default(),
            dry_run: false,
        }
    }

    fn write(path: &Path, content: &str) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    fn names_in(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .map(|rd| {
                rd.map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
                    .collect()
            })
            .unwrap_or_default();
        names.sort();
        names
    }

    #[tokio::test]
    async fn test_trailing_whitespace_duplicates_collapse() {
        let dir = tempfile::tempdir().unwrap();
        let opts = options(dir.path());
        write(&opts.src.join("id-1__A.md"), "# A\n\nText.\n");
        write(&opts.src.join("id-2__A.md"), "# A   \n\nText.   \n\n\n");

        let summary = run(&opts).await.unwrap();

        assert_eq!(summary.total_found, 2);
        assert_eq!(summary.unique_count, 1);
        assert_eq!(summary.duplicate_count, 1);
        assert_eq!(summary.moved_unique, 1);
        assert_eq!(summary.moved_duplicates, 1);
        assert_eq!(names_in(&opts.dest), vec!["id-1__A.md"]);
        assert_eq!(names_in(&opts.duplicates), vec!["id-2__A.md"]);
    }

    #[tokio::test]
    async fn test_first_in_discovery_order_is_canonical() {
        let dir = tempfile::tempdir().unwrap();
        let opts = options(dir.path());
        write(&opts.src.join("b/id-9__X.md"), "same");
        write(&opts.src.join("a/id-3__X.md"), "same");
        write(&opts.src.join("c.md"), "same");

        let candidates = files::discover(&opts.src, "**/*.md", GlobOptions::default()).unwrap();
        let plans = plan(candidates, &opts).await;

        let canonical: Vec<&FilePlan> = plans
            .iter()
            .filter(|p| matches!(p.action, PlanAction::MoveUnique { .. }))
            .collect();
        assert_eq!(canonical.len(), 1);
        assert!(canonical[0].src.ends_with("a/id-3__X.md"));
        for p in plans.iter().filter(|p| p.is_duplicate()) {
            match &p.action {
                PlanAction::MoveDuplicate { canonical, .. } => {
                    assert!(canonical.ends_with("a/id-3__X.md"))
                }
                other => panic!("unexpected action {:?}", other),
            }
        }
    }

    #[tokio::test]
    async fn test_dry_run_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let mut opts = options(dir.path());
        opts.dry_run = true;
        write(&opts.src.join("id-1__A.md"), "one");
        write(&opts.src.join("id-2__A.md"), "one");

        let summary = run(&opts).await.unwrap();

        assert_eq!(summary.unique_count, 1);
        assert_eq!(summary.duplicate_count, 1);
        assert_eq!(summary.moved_unique, 0);
        assert_eq!(summary.moved_duplicates, 0);
        assert!(!opts.dest.exists());
        assert!(!opts.duplicates.exists());
        assert_eq!(names_in(&opts.src).len(), 2);
    }

    #[tokio::test]
    async fn test_delete_duplicates() {
        let dir = tempfile::tempdir().unwrap();
        let mut opts = options(dir.path());
        opts.delete_duplicates = true;
        write(&opts.src.join("id-1__A.md"), "one");
        write(&opts.src.join("id-2__A.md"), "one");

        let summary = run(&opts).await.unwrap();

        assert_eq!(summary.deleted_duplicates, 1);
        assert!(!opts.duplicates.exists());
        assert_eq!(names_in(&opts.dest), vec!["id-1__A.md"]);
        assert!(names_in(&opts.src).is_empty());
    }

    #[tokio::test]
    async fn test_flatten_resolves_name_collisions() {
        let dir = tempfile::tempdir().unwrap();
        let opts = options(dir.path());
        write(&opts.src.join("x/doc.md"), "first");
        write(&opts.src.join("y/doc.md"), "second");

        let summary = run(&opts).await.unwrap();

        assert_eq!(summary.moved_unique, 2);
        assert_eq!(names_in(&opts.dest), vec!["doc (2).md", "doc.md"]);
        assert_eq!(
            std::fs::read_to_string(opts.dest.join("doc.md")).unwrap(),
            "first"
        );
    }

    #[tokio::test]
    async fn test_without_flatten_keeps_structure() {
        let dir = tempfile::tempdir().unwrap();
        let mut opts = options(dir.path());
        opts.flatten = false;
        write(&opts.src.join("x/doc.md"), "first");

        run(&opts).await.unwrap();

        assert!(opts.dest.join("x/doc.md").exists());
    }

    #[tokio::test]
    async fn test_oversized_files_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let mut opts = options(dir.path());
        opts.max_bytes = 4;
        write(&opts.src.join("big.md"), "0123456789");
        write(&opts.src.join("ok.md"), "abc");

        let summary = run(&opts).await.unwrap();

        assert_eq!(summary.total_found, 2);
        assert_eq!(summary.total_scanned, 1);
        assert_eq!(summary.skipped, 1);
        assert!(opts.src.join("big.md").exists());
        assert_eq!(names_in(&opts.dest), vec!["ok.md"]);
    }

    #[tokio::test]
    async fn test_rerun_on_unique_output_finds_no_duplicates() {
        let dir = tempfile::tempdir().unwrap();
        let opts = options(dir.path());
        write(&opts.src.join("id-1__A.md"), "# A\n\nalpha");
        write(&opts.src.join("id-2__B.md"), "# B\n\nbeta");
        write(&opts.src.join("id-3__A.md"), "# A   \n\nalpha\n");
        run(&opts).await.unwrap();

        let second = DedupOptions {
            src: opts.dest.clone(),
            dest: dir.path().join("complete-2"),
            duplicates: dir.path().join("duplicates-2"),
            ..opts.clone()
        };
        let summary = run(&second).await.unwrap();

        assert_eq!(summary.total_found, 2);
        assert_eq!(summary.unique_count, 2);
        assert_eq!(summary.duplicate_count, 0);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_broken_link_does_not_stop_the_batch() {
        let dir = tempfile::tempdir().unwrap();
        let opts = options(dir.path());
        write(&opts.src.join("a.md"), "# A");
        std::os::unix::fs::symlink(opts.src.join("gone.md"), opts.src.join("b.md")).unwrap();

        let summary = run(&opts).await.unwrap();

        assert_eq!(summary.total_found, 1);
        assert_eq!(summary.moved_unique, 1);
        assert_eq!(names_in(&opts.dest), vec!["a.md"]);
    }

    #[tokio::test]
    async fn test_missing_source_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let opts = options(dir.path());

        assert!(matches!(
            run(&opts).await,
            Err(DedupError::Discover(DiscoverError::PathNotFound(_)))
        ));
    }
}
