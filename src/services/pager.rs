//! Markdown pagination.
//!
//! Splits an episode's markdown into page strings bounded by a character
//! budget. Packing is block-aware: content is decomposed into top-level
//! blocks (blank-line separated runs, with fenced code kept intact) and
//! blocks are packed greedily, so every page stays independently renderable
//! markdown.

use crate::types::PaginationConfig;
use regex::Regex;
use std::sync::OnceLock;

/// Split `content` into pages of at most `max_chars_per_page` characters.
///
/// Empty or whitespace-only content yields no pages. Content that already
/// fits the budget yields exactly one trimmed page. A single block longer
/// than the budget is split at the last line break at or before the budget,
/// falling back to a space, falling back to a hard cut.
///
/// Deterministic: identical input always yields identical output.
pub fn split_into_pages(content: &str, max_chars_per_page: usize) -> Vec<String> {
    let budget = max_chars_per_page.max(1);

    if content.trim().is_empty() {
        return Vec::new();
    }
    if content.chars().count() <= budget {
        return vec![content.trim().to_string()];
    }

    let blocks = match split_blocks(content) {
        Some(blocks) => blocks,
        // Decomposition could not faithfully reproduce the source.
        None => return vec![content.trim().to_string()],
    };

    let mut pages: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for block in blocks {
        let block_len = block.chars().count();

        if block_len > budget {
            close_page(&mut pages, &mut current);
            current_len = 0;

            let (full_pages, remainder) = split_oversized(&block, budget);
            pages.extend(full_pages);
            if let Some(rest) = remainder {
                current_len = rest.chars().count();
                current = rest;
            }
            continue;
        }

        // Blocks on one page are rejoined with a blank line.
        let separator_len = if current.is_empty() { 0 } else { 2 };
        if !current.is_empty() && current_len + separator_len + block_len > budget {
            close_page(&mut pages, &mut current);
            current_len = 0;
        }

        if current.is_empty() {
            current.push_str(&block);
            current_len = block_len;
        } else {
            current.push_str("\n\n");
            current.push_str(&block);
            current_len += separator_len + block_len;
        }
    }

    close_page(&mut pages, &mut current);
    pages
}

fn close_page(pages: &mut Vec<String>, current: &mut String) {
    let trimmed = current.trim();
    if !trimmed.is_empty() {
        pages.push(trimmed.to_string());
    }
    current.clear();
}

/// Decompose markdown into top-level blocks: runs of non-blank lines
/// separated by blank lines, except inside fenced code where blank lines
/// belong to the block. Returns `None` when the decomposition would lose
/// content relative to the source.
fn split_blocks(content: &str) -> Option<Vec<String>> {
    let mut blocks: Vec<String> = Vec::new();
    let mut buffer: Vec<&str> = Vec::new();
    let mut fence_marker: Option<&'static str> = None;

    for line in content.lines() {
        let stripped = line.trim_start();

        if let Some(marker) = fence_marker {
            buffer.push(line);
            if stripped.starts_with(marker) {
                fence_marker = None;
            }
            continue;
        }

        if line.trim().is_empty() {
            if !buffer.is_empty() {
                blocks.push(buffer.join("\n"));
                buffer.clear();
            }
            continue;
        }

        buffer.push(line);
        if stripped.starts_with("```") {
            fence_marker = Some("```");
        } else if stripped.starts_with("~~~") {
            fence_marker = Some("~~~");
        }
    }

    if !buffer.is_empty() {
        blocks.push(buffer.join("\n"));
    }

    if blocks.is_empty() {
        return None;
    }

    // Faithfulness check: no block may be dropped by the decomposition.
    let source_weight = non_whitespace_len(content);
    let block_weight: usize = blocks.iter().map(|block| non_whitespace_len(block)).sum();
    if source_weight == block_weight {
        Some(blocks)
    } else {
        None
    }
}

fn non_whitespace_len(text: &str) -> usize {
    text.chars().filter(|c| !c.is_whitespace()).count()
}

/// Split one block that exceeds the budget into budget-sized pieces,
/// preferring line breaks, then spaces, then a hard cut. The final piece is
/// returned separately so following blocks can continue packing after it.
fn split_oversized(block: &str, budget: usize) -> (Vec<String>, Option<String>) {
    let mut chars: Vec<char> = block.chars().collect();
    let mut pieces = Vec::new();

    while chars.len() > budget {
        let prefix = &chars[..budget];
        let cut = prefix
            .iter()
            .rposition(|&c| c == '\n')
            .or_else(|| prefix.iter().rposition(|&c| c == ' '))
            .map_or(budget, |idx| (idx + 1).max(1));

        let piece: String = chars.drain(..cut).collect();
        let trimmed = piece.trim();
        if !trimmed.is_empty() {
            pieces.push(trimmed.to_string());
        }
    }

    let remainder: String = chars.into_iter().collect();
    if remainder.trim().is_empty() {
        (pieces, None)
    } else {
        (pieces, Some(remainder))
    }
}

/// Character budget for the given viewport width.
pub fn page_budget(config: &PaginationConfig, viewport_width: u32) -> usize {
    if viewport_width < config.mobile_breakpoint {
        config.mobile_max_chars
    } else {
        config.desktop_max_chars
    }
}

/// First ATX `#` heading in the content, if any.
pub fn extract_title(content: &str) -> Option<String> {
    static TITLE: OnceLock<Regex> = OnceLock::new();
    let pattern = TITLE.get_or_init(|| Regex::new(r"(?m)^#\s+(.+)$").unwrap());
    pattern
        .captures(content)
        .and_then(|captures| captures.get(1))
        .map(|title| title.as_str().trim().to_string())
}

pub fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Estimated reading time at ~220 words per minute, never below one minute.
pub fn reading_minutes(words: usize) -> usize {
    ((words as f64 / 220.0).round() as usize).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_and_whitespace_yield_no_pages() {
        assert!(split_into_pages("", 100).is_empty());
        assert!(split_into_pages("   \n\n  ", 100).is_empty());
    }

    #[test]
    fn content_within_budget_is_one_trimmed_page() {
        let pages = split_into_pages("  hello world\n", 100);
        assert_eq!(pages, vec!["hello world".to_string()]);
    }

    #[test]
    fn greedy_packing_splits_three_large_paragraphs() {
        let para1 = "a".repeat(1000);
        let para2 = "b".repeat(1500);
        let para3 = "c".repeat(1000);
        let content = format!("{}\n\n{}\n\n{}", para1, para2, para3);

        // 1000 + 2 + 1500 overflows 2000, so every paragraph lands alone.
        let pages = split_into_pages(&content, 2000);
        assert_eq!(pages, vec![para1, para2, para3]);
    }

    #[test]
    fn small_blocks_share_a_page() {
        let content = "one\n\ntwo\n\nthree";
        let pages = split_into_pages(content, 10);
        assert_eq!(pages, vec!["one\n\ntwo".to_string(), "three".to_string()]);
    }

    #[test]
    fn no_page_exceeds_budget_for_divisible_blocks() {
        let paragraphs: Vec<String> = (0..40).map(|i| format!("paragraph {:02}", i)).collect();
        let content = paragraphs.join("\n\n");
        for budget in [30usize, 50, 80, 200] {
            for page in split_into_pages(&content, budget) {
                assert!(
                    page.chars().count() <= budget,
                    "page of {} chars exceeds budget {}",
                    page.chars().count(),
                    budget
                );
            }
        }
    }

    #[test]
    fn oversized_block_is_hard_split_within_budget() {
        let content = "x".repeat(5000);
        let pages = split_into_pages(&content, 2000);
        assert_eq!(pages.len(), 3);
        for page in &pages {
            assert!(page.chars().count() <= 2000);
        }
        let total: usize = pages.iter().map(|p| p.chars().count()).sum();
        assert_eq!(total, 5000);
    }

    #[test]
    fn oversized_block_prefers_space_boundaries() {
        let words: Vec<String> = (0..400).map(|i| format!("word{:03}", i)).collect();
        let content = words.join(" ");
        let pages = split_into_pages(&content, 500);
        assert!(pages.len() > 1);
        for page in &pages {
            assert!(page.chars().count() <= 500);
            // A space-boundary split never cuts a word in half.
            assert!(page.split_whitespace().all(|w| w.starts_with("word")));
        }
    }

    #[test]
    fn oversized_split_is_multibyte_safe() {
        let content = "မြန်မာ".repeat(500);
        let pages = split_into_pages(&content, 700);
        assert!(pages.len() > 1);
        for page in &pages {
            assert!(page.chars().count() <= 700);
        }
    }

    #[test]
    fn fenced_code_keeps_internal_blank_lines_together() {
        let para1 = "x".repeat(100);
        let fence = "```\nlet a = 1;\n\nlet b = 2;\n```";
        let para2 = "y".repeat(100);
        let content = format!("{}\n\n{}\n\n{}", para1, fence, para2);

        let pages = split_into_pages(&content, 120);
        assert_eq!(pages.len(), 3);
        assert_eq!(pages[1], fence);
    }

    #[test]
    fn pages_preserve_every_block() {
        let content = "# Title\n\nFirst paragraph.\n\n- item one\n- item two\n\nLast paragraph.";
        let pages = split_into_pages(content, 30);
        let rejoined = pages.join("\n\n");
        let weight = |text: &str| text.chars().filter(|c| !c.is_whitespace()).count();
        assert_eq!(weight(&rejoined), weight(content));
    }

    #[test]
    fn pagination_is_deterministic() {
        let content = "alpha\n\nbeta\n\ngamma\n\ndelta";
        assert_eq!(split_into_pages(content, 12), split_into_pages(content, 12));
    }

    #[test]
    fn budget_follows_viewport_breakpoint() {
        let config = PaginationConfig::default();
        assert_eq!(page_budget(&config, 390), config.mobile_max_chars);
        assert_eq!(page_budget(&config, 768), config.desktop_max_chars);
        assert_eq!(page_budget(&config, 1280), config.desktop_max_chars);
    }

    #[test]
    fn title_is_first_h1() {
        let content = "intro line\n\n# The Gate\n\n## Sub\nbody";
        assert_eq!(extract_title(content).as_deref(), Some("The Gate"));
        assert_eq!(extract_title("no headings here"), None);
    }

    #[test]
    fn reading_minutes_never_drops_below_one() {
        assert_eq!(reading_minutes(0), 1);
        assert_eq!(reading_minutes(110), 1);
        assert_eq!(reading_minutes(660), 3);
    }
}
