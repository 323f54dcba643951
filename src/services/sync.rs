//! Episode tree sync and manifest generation.
//!
//! Copies per-language markdown source trees into the public assets
//! directory, scans the copied trees for `NNNN-NNNN` folder buckets and
//! `NNNN.md` episode files, and writes the `episode-index.json` manifest the
//! reader consumes.

use crate::error::{ReaderError, Result};
use crate::types::{BookMetadata, EpisodeIndexDoc, EpisodeRange, Language, LanguageIndex};
use chrono::Utc;
use fs_extra::dir::CopyOptions;
use regex::Regex;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{debug, info};
use walkdir::WalkDir;

fn folder_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^(\d{4})-(\d{4})$").unwrap())
}

fn episode_file_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^(\d{4})\.md$").unwrap())
}

/// Parse a `NNNN-NNNN` bucket folder name. Inverted ranges are rejected.
pub fn parse_folder_range(name: &str) -> Option<EpisodeRange> {
    let captures = folder_pattern().captures(name)?;
    let start: u32 = captures.get(1)?.as_str().parse().ok()?;
    let end: u32 = captures.get(2)?.as_str().parse().ok()?;
    if end < start {
        return None;
    }
    Some(EpisodeRange {
        folder: name.to_string(),
        start,
        end,
    })
}

/// Parse a `NNNN.md` episode file name into its episode number.
pub fn parse_episode_file(name: &str) -> Option<u32> {
    let captures = episode_file_pattern().captures(name)?;
    captures.get(1)?.as_str().parse().ok()
}

/// One language tree to copy: source markdown tree -> public target.
#[derive(Debug, Clone)]
pub struct SyncPair {
    pub language: Language,
    pub source: PathBuf,
    pub target: PathBuf,
}

#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub pairs: Vec<SyncPair>,
    pub manifest_path: PathBuf,
    pub metadata: BookMetadata,
}

#[derive(Debug)]
pub struct SyncReport {
    pub language: Language,
    pub target: PathBuf,
    pub index: LanguageIndex,
}

/// Copy every configured language tree and index the copies.
/// Each target is replaced wholesale so deleted episodes disappear too.
pub fn sync_trees(config: &SyncConfig) -> Result<Vec<SyncReport>> {
    let mut reports = Vec::new();

    for pair in &config.pairs {
        if !pair.source.is_dir() {
            return Err(ReaderError::SyncConfig {
                reason: format!("source tree {} is not a directory", pair.source.display()),
            });
        }

        if pair.target.exists() {
            std::fs::remove_dir_all(&pair.target).map_err(|e| ReaderError::OutputDirectory {
                reason: format!("cannot clear {}: {}", pair.target.display(), e),
            })?;
        }
        std::fs::create_dir_all(&pair.target).map_err(|e| ReaderError::OutputDirectory {
            reason: format!("cannot create {}: {}", pair.target.display(), e),
        })?;

        let options = CopyOptions::new().content_only(true);
        fs_extra::dir::copy(&pair.source, &pair.target, &options).map_err(|e| {
            ReaderError::OutputDirectory {
                reason: format!(
                    "copy {} -> {} failed: {}",
                    pair.source.display(),
                    pair.target.display(),
                    e
                ),
            }
        })?;
        info!(
            "Synced: {} -> {}",
            pair.source.display(),
            pair.target.display()
        );

        let index = build_language_index(&pair.target)?;
        reports.push(SyncReport {
            language: pair.language,
            target: pair.target.clone(),
            index,
        });
    }

    Ok(reports)
}

/// Scan one language tree and summarize which episodes it actually holds.
pub fn build_language_index(root: &Path) -> Result<LanguageIndex> {
    let mut folders: Vec<EpisodeRange> = Vec::new();
    for entry in std::fs::read_dir(root)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        if let Some(range) = entry.file_name().to_str().and_then(parse_folder_range) {
            folders.push(range);
        }
    }
    folders.sort_by_key(|range| range.start);

    let mut episodes: BTreeSet<u32> = BTreeSet::new();
    for entry in WalkDir::new(root).min_depth(2).max_depth(2) {
        let entry = entry.map_err(|e| ReaderError::EpisodeTree {
            reason: format!("cannot scan {}: {}", root.display(), e),
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let in_bucket = entry
            .path()
            .parent()
            .and_then(|parent| parent.file_name())
            .and_then(|name| name.to_str())
            .is_some_and(|name| folder_pattern().is_match(name));
        if !in_bucket {
            continue;
        }
        if let Some(episode) = entry.file_name().to_str().and_then(parse_episode_file) {
            episodes.insert(episode);
        }
    }

    let available_episodes: Vec<u32> = episodes.into_iter().collect();
    let total_episodes = available_episodes.last().copied().unwrap_or(0);
    debug!(
        root = %root.display(),
        folders = folders.len(),
        episodes = available_episodes.len(),
        "indexed language tree"
    );

    Ok(LanguageIndex {
        available_count: Some(available_episodes.len()),
        total_episodes: Some(total_episodes),
        folders: Some(folders),
        available_episodes: Some(available_episodes),
    })
}

/// Assemble the manifest document from per-language sync reports.
pub fn manifest_from_reports(reports: &[SyncReport], metadata: &BookMetadata) -> EpisodeIndexDoc {
    let section = |language: Language| {
        reports
            .iter()
            .find(|report| report.language == language)
            .map(|report| report.index.clone())
    };

    let mut metadata = metadata.clone();
    metadata.generated = Some(true);
    metadata.last_updated = Some(Utc::now().to_rfc3339());

    EpisodeIndexDoc {
        eng: section(Language::Eng),
        burmese: section(Language::Burmese),
        metadata: Some(metadata),
    }
}

/// Write the manifest as pretty JSON with a trailing newline.
pub fn write_manifest(path: &Path, manifest: &EpisodeIndexDoc) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut payload = serde_json::to_string_pretty(manifest)?;
    payload.push('\n');
    std::fs::write(path, payload)?;
    info!("Generated: {}", path.display());
    Ok(())
}

/// Structural diagnostics for one language tree.
#[derive(Debug, Default)]
pub struct TreeReport {
    pub folders: usize,
    pub episode_files: usize,
    pub problems: Vec<String>,
}

impl TreeReport {
    pub fn is_clean(&self) -> bool {
        self.problems.is_empty()
    }
}

/// Check folder and file naming in an episode tree without modifying it.
pub fn validate_tree(root: &Path) -> Result<TreeReport> {
    let mut report = TreeReport::default();

    for entry in std::fs::read_dir(root)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();

        if !entry.file_type()?.is_dir() {
            report
                .problems
                .push(format!("stray file at tree root: {}", name));
            continue;
        }

        let Some(range) = parse_folder_range(&name) else {
            report
                .problems
                .push(format!("unrecognized folder name: {}", name));
            continue;
        };
        report.folders += 1;

        for file in std::fs::read_dir(entry.path())? {
            let file = file?;
            let file_name = file.file_name().to_string_lossy().into_owned();

            if !file.file_type()?.is_file() {
                report
                    .problems
                    .push(format!("{}/{} is not a file", name, file_name));
                continue;
            }

            match parse_episode_file(&file_name) {
                Some(episode) if range.contains(episode) => report.episode_files += 1,
                Some(episode) => report.problems.push(format!(
                    "{}/{} holds episode {} outside its range",
                    name, file_name, episode
                )),
                None => report
                    .problems
                    .push(format!("{}/{} does not match NNNN.md", name, file_name)),
            }
        }
    }

    Ok(report)
}
