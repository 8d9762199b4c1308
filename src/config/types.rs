//! Configuration type definitions.
//!
//! This module contains the data structures of `rollos.yaml`.
//! These types are pure data - no I/O.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::build::dedup::DEFAULT_MAX_BYTES;
use crate::build::normalize::NormalizeOptions;
use crate::build::paginate::DEFAULT_PAGE_SIZE;
use crate::build::readme::{DEFAULT_HEADING, DEFAULT_NOTE};
use crate::build::rename::ConflictPolicy;
use crate::util::{default_concurrency, resolve_against};

fn default_true() -> bool {
    true
}

fn default_pattern() -> String {
    "**/*.md".to_string()
}

fn default_page_size() -> u64 {
    DEFAULT_PAGE_SIZE
}

fn default_page_start_at() -> u64 {
    1
}

fn default_max_bytes() -> u64 {
    DEFAULT_MAX_BYTES
}

fn default_heading() -> String {
    DEFAULT_HEADING.to_string()
}

fn default_note() -> String {
    DEFAULT_NOTE.to_string()
}

// =============================================================================
// Top level
// =============================================================================

/// The whole `rollos.yaml` file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Max in-flight file operations per stage
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    pub collections: Vec<CollectionConfig>,
}

/// One document collection and the directories its stages read and write.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionConfig {
    pub name: String,
    /// Extractor output, pre-canonical names
    pub source_dir: PathBuf,
    /// Dedup survivors, renamed to `<id>.md`
    pub complete_dir: PathBuf,
    pub duplicates_dir: PathBuf,
    /// One `<id>.json` per document
    pub json_dir: PathBuf,
    /// The flat docs index
    pub index_file: PathBuf,
    pub pages_dir: PathBuf,
    #[serde(default)]
    pub dedup: DedupConfig,
    #[serde(default)]
    pub sequence: SequenceConfig,
    #[serde(default)]
    pub rename: RenameConfig,
    #[serde(default)]
    pub readme: ReadmeConfig,
    #[serde(default)]
    pub pages: PagesConfig,
}

impl CollectionConfig {
    /// The standard layout: `markdown/<ns>` through `complete/<ns>` into
    /// `public/docs/<public_name>`.
    pub fn with_layout(name: &str, namespace: &str, public_name: &str) -> Self {
        let public = PathBuf::from("public/docs").join(public_name);
        Self {
            name: name.to_string(),
            source_dir: PathBuf::from("markdown").join(namespace),
            complete_dir: PathBuf::from("complete").join(namespace),
            duplicates_dir: PathBuf::from("duplicates").join(namespace),
            json_dir: public.clone(),
            index_file: public.join("docs-index.json"),
            pages_dir: public.join("index/pages"),
            dedup: DedupConfig::default(),
            sequence: SequenceConfig::default(),
            rename: RenameConfig::default(),
            readme: ReadmeConfig::default(),
            pages: PagesConfig::default(),
        }
    }

    /// Make every relative path absolute against `base`.
    pub fn resolve_paths(&mut self, base: &Path) {
        for path in [
            &mut self.source_dir,
            &mut self.complete_dir,
            &mut self.duplicates_dir,
            &mut self.json_dir,
            &mut self.index_file,
            &mut self.pages_dir,
        ] {
            *path = resolve_against(base, path);
        }
        if let Some(report) = &mut self.sequence.report {
            *report = resolve_against(base, report);
        }
        if let Some(template) = &mut self.readme.template {
            *template = resolve_against(base, template);
        }
    }
}

// =============================================================================
// Per-stage settings
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DedupConfig {
    #[serde(default)]
    pub delete_duplicates: bool,
    #[serde(default = "default_true")]
    pub flatten: bool,
    #[serde(default = "default_max_bytes")]
    pub max_bytes: u64,
    #[serde(default = "default_true")]
    pub ignore_front_matter: bool,
    #[serde(default = "default_true")]
    pub collapse_blank_lines: bool,
    #[serde(default = "default_true")]
    pub normalize_eol: bool,
    #[serde(default = "default_true")]
    pub trim_trailing_spaces: bool,
    #[serde(default = "default_true")]
    pub strip_bom: bool,
}

impl DedupConfig {
    pub fn normalize(&self) -> NormalizeOptions {
        NormalizeOptions {
            strip_bom: self.strip_bom,
            normalize_eol: self.normalize_eol,
            trim_trailing_spaces: self.trim_trailing_spaces,
            ignore_front_matter: self.ignore_front_matter,
            collapse_blank_lines: self.collapse_blank_lines,
        }
    }
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            delete_duplicates: false,
            flatten: true,
            max_bytes: DEFAULT_MAX_BYTES,
            ignore_front_matter: true,
            collapse_blank_lines: true,
            normalize_eol: true,
            trim_trailing_spaces: true,
            strip_bom: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SequenceConfig {
    #[serde(default = "default_pattern")]
    pub pattern: String,
    #[serde(default)]
    pub check_pages: bool,
    #[serde(default = "default_page_start_at")]
    pub page_start_at: u64,
    #[serde(default = "default_true")]
    pub case_insensitive: bool,
    /// Where to write the JSON report, if anywhere
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report: Option<PathBuf>,
}

impl Default for SequenceConfig {
    fn default() -> Self {
        Self {
            pattern: default_pattern(),
            check_pages: false,
            page_start_at: 1,
            case_insensitive: true,
            report: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenameConfig {
    #[serde(default = "default_pattern")]
    pub pattern: String,
    #[serde(default)]
    pub conflict: ConflictPolicy,
}

impl Default for RenameConfig {
    fn default() -> Self {
        Self {
            pattern: default_pattern(),
            conflict: ConflictPolicy::Suffix,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadmeConfig {
    #[serde(default = "default_page_size")]
    pub per_page: u64,
    #[serde(default = "default_heading")]
    pub heading: String,
    #[serde(default = "default_note")]
    pub note: String,
    #[serde(default)]
    pub include_empty_pages: bool,
    /// A Tera template replacing the built-in README layout
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<PathBuf>,
}

impl Default for ReadmeConfig {
    fn default() -> Self {
        Self {
            per_page: DEFAULT_PAGE_SIZE,
            heading: default_heading(),
            note: default_note(),
            include_empty_pages: false,
            template: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PagesConfig {
    #[serde(default = "default_page_size")]
    pub page_size: u64,
}

impl Default for PagesConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}
