//! # Episode Reader Library
//!
//! Backend for a serialized-novel markdown reader: resolves requested
//! episodes against the per-language availability index, fetches episode
//! markdown over HTTP or from a local tree, splits it into bounded pages at
//! block boundaries, and keeps reader state (current episode, settings,
//! progress) consistent under concurrent navigation.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use episode_reader::{
//!     available_episodes, find_nearest_episode, split_into_pages,
//!     CancellationToken, ContentFetcher, ContentSource, FetchOutcome, Language,
//! };
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let source = ContentSource::parse("https://example.org/novel/")?;
//!     let fetcher = ContentFetcher::new(source, Duration::from_secs(10));
//!     let token = CancellationToken::new();
//!
//!     // Resolve the request against what is actually available.
//!     let index = fetcher.fetch_index(&token).await?;
//!     let available = available_episodes(index.as_ref(), Language::Eng);
//!     let episode = find_nearest_episode(&available, 42).expect("non-empty index");
//!
//!     if let FetchOutcome::Content(found) = fetcher.fetch_episode(Language::Eng, episode, &token).await? {
//!         let pages = split_into_pages(&found.content, 3200);
//!         println!("{} pages", pages.len());
//!     }
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod services;
pub mod types;

// Re-export main types and services for easier usage
pub use error::{ReaderError, Result};
pub use services::cache::{
    network_first_with_fallback, stale_while_revalidate, CachePolicy, ContentCache,
};
pub use services::cancel::CancellationToken;
pub use services::debounce::{Debouncer, Throttle};
pub use services::fetcher::{ContentFetcher, ContentSource};
pub use services::pager::{extract_title, page_budget, split_into_pages};
pub use services::resolver::{
    adjacent_episode, available_episodes, episode_path, find_nearest_episode,
    format_episode_number,
};
pub use services::session::{ApplyResult, ReaderSession, RequestTicket};
pub use services::storage::{JsonFileStore, KeyValueStore, MemoryStore};
pub use services::sync::{SyncConfig, SyncPair};
pub use types::{
    Direction, EpisodeContent, EpisodeIndexDoc, FetchOutcome, Language, PaginationConfig,
    ReaderSettings, ReadingMode,
};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::pager;
    use crate::services::resolver;
    use crate::types::Direction;

    #[test]
    fn resolve_then_paginate_workflow() {
        // Index with a gap: 1..=100 and 201..=300 available.
        let available: Vec<u32> = (1..=100).chain(201..=300).collect();

        // Requested episode 150 resolves to the nearest available one.
        let resolved = resolver::find_nearest_episode(&available, 150).unwrap();
        assert_eq!(resolved, 100);

        // Navigation from the resolved episode crosses the gap.
        assert_eq!(
            resolver::adjacent_episode(&available, resolved, Direction::Next),
            Some(201)
        );

        // The fetched content paginates within the configured budget.
        let config = PaginationConfig::default();
        let budget = pager::page_budget(&config, 1280);
        let content = "paragraph one\n\nparagraph two\n\n".repeat(300);
        let pages = pager::split_into_pages(&content, budget);
        assert!(!pages.is_empty());
        assert!(pages.iter().all(|page| page.chars().count() <= budget));
    }

    #[test]
    fn canonical_target_is_stable_for_available_episodes() {
        let available = vec![1, 2, 3];
        for episode in &available {
            assert_eq!(
                resolver::find_nearest_episode(&available, *episode),
                Some(*episode)
            );
        }
    }
}
