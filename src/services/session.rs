//! Reader session state.
//!
//! All shared reading state (current episode, settings, progress) lives in
//! one session object mutated only through explicit methods, never from
//! ambient globals. Concurrent fetches are serialized by a monotonically
//! increasing request sequence: each navigation issues a ticket and cancels
//! the previous request's token, and an outcome is applied only if its
//! ticket is still the latest. Stale results are discarded without touching
//! content state (last-request-wins).

use crate::services::cancel::CancellationToken;
use crate::services::storage::{
    self, KeyValueStore,
};
use crate::types::{
    EpisodeContent, FetchOutcome, Language, ReaderSettings, ReadingMode, ReadingProgress,
};
use std::collections::HashMap;
use tracing::debug;

/// Identifies one navigation request. Outcomes carrying an outdated ticket
/// are rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestTicket {
    seq: u64,
    pub episode: u32,
    pub language: Language,
}

/// What happened when an outcome was offered to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyResult {
    /// The outcome belonged to the latest request and was applied.
    Applied,
    /// A newer navigation superseded this request; nothing changed.
    Stale,
}

#[derive(Debug, Default)]
pub struct ReaderSession {
    latest_seq: u64,
    pending_token: Option<CancellationToken>,
    current: Option<EpisodeContent>,
    settings: ReaderSettings,
    progress: HashMap<String, ReadingProgress>,
    last_chapter: Option<String>,
}

impl ReaderSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restore settings, progress, and the last-open chapter from a store.
    pub fn restore(store: &dyn KeyValueStore) -> Self {
        Self {
            latest_seq: 0,
            pending_token: None,
            current: None,
            settings: storage::load_settings(store),
            progress: storage::load_progress(store),
            last_chapter: storage::load_last_chapter(store),
        }
    }

    /// Begin navigating to an episode. Cancels whatever fetch was still in
    /// flight and hands back the ticket plus the token the new fetch must
    /// carry.
    pub fn begin_navigation(
        &mut self,
        episode: u32,
        language: Language,
    ) -> (RequestTicket, CancellationToken) {
        if let Some(previous) = self.pending_token.take() {
            previous.cancel();
        }

        self.latest_seq += 1;
        let token = CancellationToken::new();
        self.pending_token = Some(token.clone());

        let ticket = RequestTicket {
            seq: self.latest_seq,
            episode,
            language,
        };
        debug!(seq = ticket.seq, episode, %language, "navigation started");
        (ticket, token)
    }

    /// Offer a fetch outcome to the session. Only the outcome of the most
    /// recent navigation is applied; anything older is reported stale and
    /// leaves the displayed content untouched.
    pub fn apply_outcome(&mut self, ticket: RequestTicket, outcome: FetchOutcome) -> ApplyResult {
        if ticket.seq != self.latest_seq {
            debug!(
                seq = ticket.seq,
                latest = self.latest_seq,
                "discarding stale fetch result"
            );
            return ApplyResult::Stale;
        }

        self.pending_token = None;
        if let FetchOutcome::Content(episode) = outcome {
            self.last_chapter = Some(chapter_id(episode.language, episode.episode));
            self.current = Some(episode);
        }
        ApplyResult::Applied
    }

    pub fn current(&self) -> Option<&EpisodeContent> {
        self.current.as_ref()
    }

    pub fn settings(&self) -> &ReaderSettings {
        &self.settings
    }

    pub fn update_settings(&mut self, settings: ReaderSettings) {
        self.settings = settings;
    }

    pub fn last_chapter(&self) -> Option<&str> {
        self.last_chapter.as_deref()
    }

    /// Record a reading position for one chapter in one mode, clamped at
    /// zero. The other mode's position is preserved.
    pub fn set_progress(&mut self, chapter_id: &str, mode: ReadingMode, position: f64) {
        let snapshot = self.progress.entry(chapter_id.to_string()).or_default();
        let safe = if position.is_finite() {
            position.max(0.0)
        } else {
            0.0
        };
        match mode {
            ReadingMode::Scroll => snapshot.scroll = safe,
            ReadingMode::Paging => snapshot.paging = safe,
        }
    }

    pub fn progress_for(&self, chapter_id: &str) -> ReadingProgress {
        self.progress.get(chapter_id).copied().unwrap_or_default()
    }

    /// Persist settings, progress, and last-open chapter.
    pub fn persist(&self, store: &mut dyn KeyValueStore) {
        storage::save_settings(store, &self.settings);
        storage::save_progress(store, &self.progress);
        if let Some(chapter) = &self.last_chapter {
            storage::save_last_chapter(store, chapter);
        }
    }
}

/// Stable chapter identifier used for progress bookkeeping.
pub fn chapter_id(language: Language, episode: u32) -> String {
    format!("{}-{:04}", language, episode)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::storage::MemoryStore;

    fn content(language: Language, episode: u32, body: &str) -> FetchOutcome {
        FetchOutcome::Content(EpisodeContent {
            content: body.to_string(),
            episode,
            language,
            path: format!("/{}/{:04}.md", language.folder_name(), episode),
        })
    }

    #[test]
    fn last_request_wins_over_slow_fetch() {
        let mut session = ReaderSession::new();

        // Fetch for episode 42 is issued...
        let (ticket_42, token_42) = session.begin_navigation(42, Language::Eng);
        // ...then navigation moves to 43 before 42 resolves.
        let (ticket_43, _token_43) = session.begin_navigation(43, Language::Eng);
        assert!(token_42.is_cancelled());

        // 43 resolves first and is applied.
        assert_eq!(
            session.apply_outcome(ticket_43, content(Language::Eng, 43, "episode 43")),
            ApplyResult::Applied
        );

        // 42's late result must not overwrite 43's content.
        assert_eq!(
            session.apply_outcome(ticket_42, content(Language::Eng, 42, "episode 42")),
            ApplyResult::Stale
        );
        assert_eq!(session.current().map(|ep| ep.episode), Some(43));
    }

    #[test]
    fn not_found_applies_without_clearing_content() {
        let mut session = ReaderSession::new();

        let (ticket, _) = session.begin_navigation(10, Language::Eng);
        session.apply_outcome(ticket, content(Language::Eng, 10, "ten"));

        let (ticket, _) = session.begin_navigation(11, Language::Eng);
        assert_eq!(
            session.apply_outcome(ticket, FetchOutcome::NotFound),
            ApplyResult::Applied
        );
        // The previous episode stays displayed while the caller redirects
        // to the nearest available one.
        assert_eq!(session.current().map(|ep| ep.episode), Some(10));
    }

    #[test]
    fn progress_tracks_modes_independently() {
        let mut session = ReaderSession::new();
        let chapter = chapter_id(Language::Burmese, 7);

        session.set_progress(&chapter, ReadingMode::Scroll, 321.0);
        session.set_progress(&chapter, ReadingMode::Paging, 2.0);
        session.set_progress(&chapter, ReadingMode::Scroll, -5.0);

        let progress = session.progress_for(&chapter);
        assert_eq!(progress.scroll, 0.0);
        assert_eq!(progress.paging, 2.0);
        assert_eq!(progress.position(ReadingMode::Paging), 2.0);
    }

    #[test]
    fn session_roundtrips_through_store() {
        let mut store = MemoryStore::new();

        let mut session = ReaderSession::new();
        let (ticket, _) = session.begin_navigation(42, Language::Eng);
        session.apply_outcome(ticket, content(Language::Eng, 42, "body"));
        session.set_progress(&chapter_id(Language::Eng, 42), ReadingMode::Scroll, 128.0);
        let mut settings = ReaderSettings::default();
        settings.font_size = 22;
        session.update_settings(settings);
        session.persist(&mut store);

        let restored = ReaderSession::restore(&store);
        assert_eq!(restored.settings().font_size, 22);
        assert_eq!(restored.last_chapter(), Some("eng-0042"));
        assert_eq!(
            restored.progress_for(&chapter_id(Language::Eng, 42)).scroll,
            128.0
        );
    }
}
