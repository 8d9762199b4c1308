//! Gap and duplicate detection over `id-<N>` / `pagina-<P>` filename tokens.
//!
//! The checker never touches the files. Its findings are data-quality
//! reports for a human to act on, not errors.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::files::{self, DiscoverError, GlobOptions};
use super::naming::{TokenMatcher, file_name_of, relative_display};
use crate::util::{compact_ranges, display_absolute};

/// Most missing numbers a report lists. Counts stay exact past this.
pub const MAX_LISTED_MISSING: usize = 100_000;

#[derive(thiserror::Error, Debug)]
pub enum SequenceError {
    #[error(transparent)]
    Discover(#[from] DiscoverError),

    #[error("failed to write report {path}: {source}")]
    WriteReport {
        path: PathBuf,
        source: std::io::Error,
    },
}

#[derive(Debug, Clone)]
pub struct SequenceOptions {
    pub dir: PathBuf,
    pub pattern: String,
    pub check_pages: bool,
    pub page_start_at: u64,
    pub case_insensitive: bool,
}

/// A maximal run of missing ids. `after` is the last present id before the
/// run, or 0 when the run starts at 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Gap {
    pub after: u64,
    pub missing: Vec<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageGap {
    pub id: u64,
    pub missing: Vec<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateId {
    pub id: u64,
    pub count: usize,
    pub files: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SequenceReport {
    pub dir: String,
    pub scanned_files: usize,
    pub ids_present: Vec<u64>,
    pub min_id: Option<u64>,
    pub max_id: Option<u64>,
    pub missing_ids: Vec<u64>,
    pub missing_count: u64,
    /// Set when `missing_ids` stops at `MAX_LISTED_MISSING`.
    pub missing_truncated: bool,
    pub id_gaps: Vec<Gap>,
    pub duplicate_ids: Vec<DuplicateId>,
    pub unparsable_files: Vec<String>,
    pub page_gaps: Vec<PageGap>,
    pub generated_at: DateTime<Utc>,
}

/// One scanned file and the tokens found in its name.
#[derive(Debug, Clone)]
pub struct FileInfo {
    pub rel: String,
    pub id: Option<u64>,
    pub page: Option<u64>,
}

/// Scan `opts.dir` and build the report.
pub fn check(opts: &SequenceOptions) -> Result<SequenceReport, SequenceError> {
    let paths = files::discover(&opts.dir, &opts.pattern, GlobOptions::default())?;
    let matcher = TokenMatcher::new(opts.case_insensitive);

    let infos: Vec<FileInfo> = paths
        .iter()
        .map(|path| {
            let tokens = matcher.parse(&file_name_of(path));
            FileInfo {
                rel: relative_display(path, &opts.dir),
                id: tokens.id,
                page: tokens.page,
            }
        })
        .collect();

    Ok(analyze(&opts.dir, &infos, opts.check_pages, opts.page_start_at))
}

/// Build a report from already-parsed file infos.
pub fn analyze(
    dir: &Path,
    infos: &[FileInfo],
    check_pages: bool,
    page_start_at: u64,
) -> SequenceReport {
    let mut unparsable: Vec<String> = infos
        .iter()
        .filter(|i| i.id.is_none())
        .map(|i| i.rel.clone())
        .collect();
    unparsable.sort();

    let ids: Vec<u64> = infos
        .iter()
        .filter_map(|i| i.id)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let gaps = compute_id_gaps(&ids);
    let page_gaps = if check_pages {
        compute_page_gaps(infos, page_start_at)
    } else {
        Vec::new()
    };

    SequenceReport {
        dir: display_absolute(dir),
        scanned_files: infos.len(),
        min_id: ids.first().copied(),
        max_id: ids.last().copied(),
        ids_present: ids,
        missing_truncated: (gaps.missing.len() as u64) < gaps.missing_count,
        missing_ids: gaps.missing,
        missing_count: gaps.missing_count,
        id_gaps: gaps.gaps,
        duplicate_ids: group_duplicates(infos),
        unparsable_files: unparsable,
        page_gaps,
        generated_at: Utc::now(),
    }
}

/// Missing ids over `[min(1, minId) ..= maxId]`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdGaps {
    /// At most `MAX_LISTED_MISSING` ids, ascending.
    pub missing: Vec<u64>,
    pub missing_count: u64,
    pub gaps: Vec<Gap>,
}

/// Find the runs of missing ids between the present ones.
///
/// `ids` must be sorted and unique. Only the holes are visited, so a
/// single huge id costs no more than a small one.
pub fn compute_id_gaps(ids: &[u64]) -> IdGaps {
    let mut out = IdGaps::default();
    let Some(&first) = ids.first() else {
        return out;
    };
    let mut budget = MAX_LISTED_MISSING;

    let mut push = |out: &mut IdGaps, after: u64, from: u64, to: u64| {
        out.missing_count += to - from + 1;
        let listed = take_range(from, to, &mut budget);
        if !listed.is_empty() {
            out.missing.extend_from_slice(&listed);
            out.gaps.push(Gap {
                after,
                missing: listed,
            });
        }
    };

    if first > 1 {
        push(&mut out, 0, 1, first - 1);
    }
    for pair in ids.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        if b - a > 1 {
            push(&mut out, a, a + 1, b - 1);
        }
    }

    out
}

/// `from ..= to`, shortened to what is left of `budget`.
fn take_range(from: u64, to: u64, budget: &mut usize) -> Vec<u64> {
    let len = (to - from).saturating_add(1);
    let n = usize::try_from(len).unwrap_or(usize::MAX).min(*budget);
    *budget -= n;
    (from..=to).take(n).collect()
}

/// Group files sharing an id. Only ids with more than one file are kept.
pub fn group_duplicates(infos: &[FileInfo]) -> Vec<DuplicateId> {
    let mut by_id: BTreeMap<u64, Vec<String>> = BTreeMap::new();
    for info in infos {
        if let Some(id) = info.id {
            by_id.entry(id).or_default().push(info.rel.clone());
        }
    }

    by_id
        .into_iter()
        .filter(|(_, files)| files.len() > 1)
        .map(|(id, mut files)| {
            files.sort();
            DuplicateId {
                id,
                count: files.len(),
                files,
            }
        })
        .collect()
}

/// Per-id page gaps over `[min(observed, page_start_at) ..= max(observed)]`.
///
/// Listed pages share the `MAX_LISTED_MISSING` budget across all ids.
pub fn compute_page_gaps(infos: &[FileInfo], page_start_at: u64) -> Vec<PageGap> {
    let mut by_id: BTreeMap<u64, BTreeSet<u64>> = BTreeMap::new();
    for info in infos {
        if let (Some(id), Some(page)) = (info.id, info.page) {
            by_id.entry(id).or_default().insert(page);
        }
    }

    let mut budget = MAX_LISTED_MISSING;
    let mut out = Vec::new();
    for (id, pages) in by_id {
        let Some(&first) = pages.first() else {
            continue;
        };
        let mut missing = Vec::new();
        if page_start_at < first {
            missing.extend(take_range(page_start_at, first - 1, &mut budget));
        }
        let pages: Vec<u64> = pages.into_iter().collect();
        for pair in pages.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            if b - a > 1 {
                missing.extend(take_range(a + 1, b - 1, &mut budget));
            }
        }
        if !missing.is_empty() {
            out.push(PageGap { id, missing });
        }
    }
    out
}

/// Print the human-readable breakdown to stdout.
pub fn print_report(report: &SequenceReport, check_pages: bool) {
    println!(
        "Scanned {} files under {}.",
        report.scanned_files, report.dir
    );
    match (report.min_id, report.max_id) {
        (Some(min), Some(max)) => println!(
            "IDs present: {} (min {}, max {})",
            report.ids_present.len(),
            min,
            max
        ),
        _ => println!("IDs present: 0"),
    }

    if report.missing_ids.is_empty() {
        println!("No missing IDs within the observed min..max range.");
    } else {
        println!("Missing ID count: {}", report.missing_count);
        println!("Missing ranges: {}", compact_ranges(&report.missing_ids));
        if report.missing_truncated {
            println!(
                "  (only the first {} missing IDs are listed)",
                report.missing_ids.len()
            );
        }
        println!("Break points:");
        for gap in &report.id_gaps {
            let after = if gap.after == 0 {
                "before 1".to_string()
            } else {
                format!("after {}", gap.after)
            };
            println!("  Gap {}: {}", after, compact_ranges(&gap.missing));
        }
    }

    if !report.duplicate_ids.is_empty() {
        println!("Duplicate IDs (multiple files share the same ID):");
        for dup in &report.duplicate_ids {
            println!("  id-{}: {} files", dup.id, dup.count);
            for file in &dup.files {
                println!("    - {}", file);
            }
        }
    }

    if !report.unparsable_files.is_empty() {
        println!("Files without an 'id-<n>' token:");
        for file in &report.unparsable_files {
            println!("  - {}", file);
        }
    }

    if check_pages && !report.page_gaps.is_empty() {
        println!("Page gaps by ID:");
        for gap in &report.page_gaps {
            println!(
                "  id-{}: missing pages {}",
                gap.id,
                compact_ranges(&gap.missing)
            );
        }
    }
}

/// Persist the report as pretty JSON.
pub async fn write_report(report: &SequenceReport, path: &Path) -> Result<(), SequenceError> {
    files::write_json(path, report)
        .await
        .map_err(|source| SequenceError::WriteReport {
            path: path.to_path_buf(),
            source,
        })
}
