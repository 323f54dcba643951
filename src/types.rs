use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// Highest episode number the built-in range table covers.
pub const MAX_EPISODE: u32 = 2088;

/// Supported content languages. `Eng` is the primary language and the
/// fallback for any hint we do not recognize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Eng,
    Burmese,
}

impl Language {
    /// Map a free-form language hint onto the closed language set.
    /// Total function: unrecognized or missing input resolves to `Eng`.
    pub fn normalize(input: Option<&str>) -> Self {
        match input.map(|value| value.trim().to_ascii_lowercase()).as_deref() {
            Some("burmese") | Some("my") | Some("mm") | Some("mya") | Some("burma")
            | Some("myanmar") => Language::Burmese,
            _ => Language::Eng,
        }
    }

    /// Folder segment used in episode resource paths.
    pub fn folder_name(self) -> &'static str {
        match self {
            Language::Eng => "eng-episodes",
            Language::Burmese => "burmese-episodes",
        }
    }

    /// Localized label used when formatting episode display names.
    pub fn episode_label(self) -> &'static str {
        match self {
            Language::Eng => "Episode",
            Language::Burmese => "အပိုင်း",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Language::Eng => write!(f, "eng"),
            Language::Burmese => write!(f, "burmese"),
        }
    }
}

/// A contiguous bucket of episode numbers stored under one folder,
/// e.g. episodes 101..=200 under `0101-0200`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpisodeRange {
    #[serde(rename = "name")]
    pub folder: String,
    pub start: u32,
    pub end: u32,
}

impl EpisodeRange {
    pub fn contains(&self, episode: u32) -> bool {
        episode >= self.start && episode <= self.end
    }
}

/// Built-in folder range table: hundred-episode buckets up to `MAX_EPISODE`.
/// Used whenever an index document is absent or unusable.
pub fn default_ranges() -> &'static [EpisodeRange] {
    static RANGES: OnceLock<Vec<EpisodeRange>> = OnceLock::new();
    RANGES.get_or_init(|| {
        let mut ranges = Vec::new();
        let mut start = 1u32;
        while start <= MAX_EPISODE {
            let end = (start + 99).min(MAX_EPISODE);
            ranges.push(EpisodeRange {
                folder: format!("{:04}-{:04}", start, end),
                start,
                end,
            });
            start = end + 1;
        }
        ranges
    })
}

/// Per-language section of the episode index document. Any one of the three
/// availability representations may be present; the resolver normalizes them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LanguageIndex {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available_episodes: Option<Vec<u32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folders: Option<Vec<EpisodeRange>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_episodes: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available_count: Option<usize>,
}

/// Book-level metadata carried in the generated manifest.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title_burmese: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
}

/// The episode index document (`episode-index.json`), keyed by language.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EpisodeIndexDoc {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eng: Option<LanguageIndex>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub burmese: Option<LanguageIndex>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<BookMetadata>,
}

impl EpisodeIndexDoc {
    pub fn language(&self, language: Language) -> Option<&LanguageIndex> {
        match language {
            Language::Eng => self.eng.as_ref(),
            Language::Burmese => self.burmese.as_ref(),
        }
    }
}

/// A successfully fetched episode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpisodeContent {
    pub content: String,
    pub episode: u32,
    pub language: Language,
    pub path: String,
}

/// Typed fetch outcome: a missing resource is not an error, it is a result
/// the caller handles by substituting the nearest available episode.
#[derive(Debug, Clone)]
pub enum FetchOutcome {
    Content(EpisodeContent),
    NotFound,
}

/// Navigation direction for adjacent-episode lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Prev,
    Next,
}

/// Reading mode the UI layer renders in. Anything that is not explicitly
/// paging normalizes to scroll.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadingMode {
    #[default]
    Scroll,
    Paging,
}

impl ReadingMode {
    pub fn normalize(input: &str) -> Self {
        if input.trim().eq_ignore_ascii_case("paging") {
            ReadingMode::Paging
        } else {
            ReadingMode::Scroll
        }
    }
}

fn default_theme() -> String {
    "system".to_string()
}

fn default_font() -> String {
    "serif".to_string()
}

fn default_font_size() -> u32 {
    19
}

fn default_line_height() -> f64 {
    1.75
}

fn default_width() -> u32 {
    780
}

fn default_source() -> String {
    "all".to_string()
}

/// Reader presentation settings. Field-level serde defaults give the same
/// merge behavior as spreading a stored document over the default object:
/// a partial payload fills missing fields from defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReaderSettings {
    #[serde(default = "default_theme")]
    pub theme: String,
    #[serde(default = "default_font")]
    pub font: String,
    #[serde(default)]
    pub mode: ReadingMode,
    #[serde(default = "default_font_size")]
    pub font_size: u32,
    #[serde(default = "default_line_height")]
    pub line_height: f64,
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_source")]
    pub source: String,
}

impl Default for ReaderSettings {
    fn default() -> Self {
        ReaderSettings {
            theme: default_theme(),
            font: default_font(),
            mode: ReadingMode::default(),
            font_size: default_font_size(),
            line_height: default_line_height(),
            width: default_width(),
            source: default_source(),
        }
    }
}

/// Per-chapter reading position, tracked separately for each reading mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ReadingProgress {
    pub scroll: f64,
    pub paging: f64,
}

impl ReadingProgress {
    pub fn position(&self, mode: ReadingMode) -> f64 {
        match mode {
            ReadingMode::Scroll => self.scroll,
            ReadingMode::Paging => self.paging,
        }
    }
}

/// Pagination character budgets. The exact numbers are tunable display
/// configuration, not semantic constants.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationConfig {
    pub mobile_max_chars: usize,
    pub desktop_max_chars: usize,
    pub mobile_breakpoint: u32,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        PaginationConfig {
            mobile_max_chars: 2100,
            desktop_max_chars: 3200,
            mobile_breakpoint: 768,
        }
    }
}
