//! Shared utility functions.

use std::path::{Path, PathBuf};

/// Default number of in-flight file operations: the CPU count clamped to 2..=8.
pub fn default_concurrency() -> usize {
    let cpus = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(2);
    cpus.clamp(2, 8)
}

/// Render a sorted list of integers as compact ranges.
///
/// `[1, 2, 3, 5, 7, 8]` -> `"1-3, 5, 7-8"`
pub fn compact_ranges(nums: &[u64]) -> String {
    let Some((&first, rest)) = nums.split_first() else {
        return String::new();
    };

    let mut ranges = Vec::new();
    let mut start = first;
    let mut prev = first;

    for &n in rest {
        if n == prev + 1 {
            prev = n;
        } else {
            ranges.push(format_range(start, prev));
            start = n;
            prev = n;
        }
    }
    ranges.push(format_range(start, prev));

    ranges.join(", ")
}

fn format_range(start: u64, end: u64) -> String {
    if start == end {
        start.to_string()
    } else {
        format!("{}-{}", start, end)
    }
}

/// Resolve a possibly relative path against a base directory.
pub fn resolve_against(base: &Path, path: &Path) -> PathBuf {
    if path.is_relative() {
        base.join(path)
    } else {
        path.to_path_buf()
    }
}

/// Best-effort absolute form of a path for display in summaries.
pub fn display_absolute(path: &Path) -> String {
    std::path::absolute(path)
        .unwrap_or_else(|_| path.to_path_buf())
        .display()
        .to_string()
}
