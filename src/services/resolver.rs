//! Episode index resolution.
//!
//! Everything in this module is pure: degenerate inputs map to `None` or to
//! the built-in default range, never to an error. The available-episode list
//! handed to the search functions is always sorted ascending and free of
//! duplicates.

use crate::types::{
    default_ranges, Direction, EpisodeIndexDoc, EpisodeRange, Language,
};
use tracing::debug;

/// Resolve the list of episodes available for a language from whichever
/// representation the index document provides: an explicit list, folder
/// ranges expanded into individual numbers, or a bare count implying
/// `1..=count`. An absent or unusable document falls back to the built-in
/// range table so callers are never left with zero episodes.
pub fn available_episodes(index: Option<&EpisodeIndexDoc>, language: Language) -> Vec<u32> {
    let section = index.and_then(|doc| doc.language(language));

    let mut episodes: Vec<u32> = match section {
        Some(section) => {
            if let Some(list) = section
                .available_episodes
                .as_ref()
                .filter(|list| !list.is_empty())
            {
                list.iter().copied().filter(|&ep| ep > 0).collect()
            } else if let Some(folders) = section.folders.as_ref().filter(|f| !f.is_empty()) {
                expand_folder_ranges(folders)
            } else if let Some(total) = section.total_episodes.filter(|&total| total > 0) {
                (1..=total).collect()
            } else {
                debug!(%language, "index section carries no usable availability data");
                expand_folder_ranges(default_ranges())
            }
        }
        None => {
            debug!(%language, "no index section for language, using default range");
            expand_folder_ranges(default_ranges())
        }
    };

    episodes.sort_unstable();
    episodes.dedup();
    episodes
}

fn expand_folder_ranges(folders: &[EpisodeRange]) -> Vec<u32> {
    folders
        .iter()
        .filter(|range| range.end >= range.start && range.start > 0)
        .flat_map(|range| range.start..=range.end)
        .collect()
}

/// Find the available episode closest to `target`.
///
/// Returns `None` only when the list is empty. Targets outside the covered
/// range clamp to the first or last episode; inside the range a binary
/// search locates the straddling neighbors and the numerically closer one
/// wins, with exact ties broken toward the lower episode.
pub fn find_nearest_episode(available: &[u32], target: u32) -> Option<u32> {
    let first = *available.first()?;
    let last = *available.last()?;

    if target <= first {
        return Some(first);
    }
    if target >= last {
        return Some(last);
    }

    match available.binary_search(&target) {
        Ok(_) => Some(target),
        Err(insert_at) => {
            let lower = available[insert_at - 1];
            let upper = available[insert_at];
            if upper - target < target - lower {
                Some(upper)
            } else {
                Some(lower)
            }
        }
    }
}

/// Positional predecessor or successor of `current` within `available`.
///
/// This is strictly a neighbor lookup: if `current` itself is not in the
/// list, or sits at the relevant edge, the answer is `None` rather than a
/// substituted nearby episode.
pub fn adjacent_episode(available: &[u32], current: u32, direction: Direction) -> Option<u32> {
    let position = available.binary_search(&current).ok()?;
    match direction {
        Direction::Prev => position.checked_sub(1).map(|i| available[i]),
        Direction::Next => available.get(position + 1).copied(),
    }
}

/// The folder range an episode's resource lives under, if any.
pub fn folder_for_episode(episode: u32) -> Option<&'static EpisodeRange> {
    default_ranges().iter().find(|range| range.contains(episode))
}

/// Zero-padded 4-digit episode number, e.g. `0042`.
pub fn format_episode_number(episode: u32) -> String {
    format!("{:04}", episode)
}

/// Root-relative resource path for an episode markdown file:
/// `/{eng-episodes|burmese-episodes}/{folder}/{nnnn}.md`.
/// `None` when the episode falls outside every folder range.
pub fn episode_path(language: Language, episode: u32) -> Option<String> {
    let range = folder_for_episode(episode)?;
    Some(format!(
        "/{}/{}/{}.md",
        language.folder_name(),
        range.folder,
        format_episode_number(episode)
    ))
}

/// Localized display name, e.g. `Episode 0042 - Title`.
pub fn format_episode_name(episode: u32, title: Option<&str>, language: Language) -> String {
    let padded = format_episode_number(episode);
    match title {
        Some(title) => format!("{} {} - {}", language.episode_label(), padded, title),
        None => format!("{} {}", language.episode_label(), padded),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{LanguageIndex, MAX_EPISODE};

    fn doc_with_eng(section: LanguageIndex) -> EpisodeIndexDoc {
        EpisodeIndexDoc {
            eng: Some(section),
            burmese: None,
            metadata: None,
        }
    }

    #[test]
    fn available_prefers_explicit_list_and_normalizes_it() {
        let doc = doc_with_eng(LanguageIndex {
            available_episodes: Some(vec![5, 1, 3, 3, 0, 1]),
            ..LanguageIndex::default()
        });
        assert_eq!(available_episodes(Some(&doc), Language::Eng), vec![1, 3, 5]);
    }

    #[test]
    fn available_expands_folder_ranges() {
        let doc = doc_with_eng(LanguageIndex {
            folders: Some(vec![
                EpisodeRange {
                    folder: "0001-0003".into(),
                    start: 1,
                    end: 3,
                },
                EpisodeRange {
                    folder: "0007-0008".into(),
                    start: 7,
                    end: 8,
                },
            ]),
            ..LanguageIndex::default()
        });
        assert_eq!(
            available_episodes(Some(&doc), Language::Eng),
            vec![1, 2, 3, 7, 8]
        );
    }

    #[test]
    fn available_accepts_bare_count() {
        let doc = doc_with_eng(LanguageIndex {
            total_episodes: Some(4),
            ..LanguageIndex::default()
        });
        assert_eq!(
            available_episodes(Some(&doc), Language::Eng),
            vec![1, 2, 3, 4]
        );
    }

    #[test]
    fn available_falls_back_to_default_range() {
        let episodes = available_episodes(None, Language::Burmese);
        assert_eq!(episodes.len(), MAX_EPISODE as usize);
        assert_eq!(episodes.first(), Some(&1));
        assert_eq!(episodes.last(), Some(&MAX_EPISODE));

        // Empty section behaves the same as a missing document.
        let doc = doc_with_eng(LanguageIndex::default());
        assert_eq!(available_episodes(Some(&doc), Language::Eng), episodes);
    }

    #[test]
    fn nearest_on_empty_list_is_none() {
        assert_eq!(find_nearest_episode(&[], 10), None);
    }

    #[test]
    fn nearest_returns_exact_match() {
        let available = [1, 5, 9];
        assert_eq!(find_nearest_episode(&available, 5), Some(5));
    }

    #[test]
    fn nearest_clamps_out_of_range_targets() {
        let available = [10, 20, 30];
        assert_eq!(find_nearest_episode(&available, 1), Some(10));
        assert_eq!(find_nearest_episode(&available, 10), Some(10));
        assert_eq!(find_nearest_episode(&available, 99), Some(30));
    }

    #[test]
    fn nearest_across_gap_prefers_closer_side() {
        // Episodes 1..=100 and 201..=300, gap 101..=200.
        let available: Vec<u32> = (1..=100).chain(201..=300).collect();

        // 150 is 50 from 100 and 51 from 201.
        assert_eq!(find_nearest_episode(&available, 150), Some(100));
        // 151 is 51 from 100 and 50 from 201.
        assert_eq!(find_nearest_episode(&available, 151), Some(201));
    }

    #[test]
    fn nearest_breaks_exact_ties_toward_lower() {
        let available = [10, 20];
        assert_eq!(find_nearest_episode(&available, 15), Some(10));
    }

    #[test]
    fn adjacent_walks_list_positions() {
        let available = [2, 4, 9];
        assert_eq!(adjacent_episode(&available, 4, Direction::Prev), Some(2));
        assert_eq!(adjacent_episode(&available, 4, Direction::Next), Some(9));
    }

    #[test]
    fn adjacent_has_no_neighbor_at_edges() {
        let available = [2, 4, 9];
        assert_eq!(adjacent_episode(&available, 2, Direction::Prev), None);
        assert_eq!(adjacent_episode(&available, 9, Direction::Next), None);
    }

    #[test]
    fn adjacent_never_substitutes_for_absent_current() {
        let available = [2, 4, 9];
        assert_eq!(adjacent_episode(&available, 5, Direction::Prev), None);
        assert_eq!(adjacent_episode(&available, 5, Direction::Next), None);
    }

    #[test]
    fn episode_path_is_bucketed_and_zero_padded() {
        assert_eq!(
            episode_path(Language::Eng, 42).as_deref(),
            Some("/eng-episodes/0001-0100/0042.md")
        );
        assert_eq!(
            episode_path(Language::Burmese, 101).as_deref(),
            Some("/burmese-episodes/0101-0200/0101.md")
        );
        assert_eq!(episode_path(Language::Eng, MAX_EPISODE + 1), None);
        assert_eq!(episode_path(Language::Eng, 0), None);
    }

    #[test]
    fn display_name_uses_localized_label() {
        assert_eq!(
            format_episode_name(7, Some("The Gate"), Language::Eng),
            "Episode 0007 - The Gate"
        );
        assert_eq!(
            format_episode_name(7, None, Language::Burmese),
            "အပိုင်း 0007"
        );
    }
}
