use crate::error::{ReaderError, Result};
use crate::services::cancel::CancellationToken;
use crate::services::resolver::episode_path;
use crate::types::{EpisodeContent, EpisodeIndexDoc, FetchOutcome, Language};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tokio::time::timeout;
use tracing::{debug, info, warn};
use url::Url;

const INDEX_DOCUMENT: &str = "/episode-index.json";

/// Where episode resources live: a remote HTTP base or a local tree root.
#[derive(Debug, Clone)]
pub enum ContentSource {
    Http(Url),
    Local(PathBuf),
}

impl ContentSource {
    /// Parse a user-supplied base: URLs become HTTP sources, everything
    /// else is treated as a local directory.
    pub fn parse(base: &str) -> Result<Self> {
        if base.starts_with("http://") || base.starts_with("https://") {
            Ok(ContentSource::Http(Url::parse(base)?))
        } else {
            Ok(ContentSource::Local(PathBuf::from(base)))
        }
    }
}

#[derive(Clone)]
pub struct ContentFetcher {
    source: ContentSource,
    client: reqwest::Client,
    timeout: Duration,
}

impl ContentFetcher {
    pub fn new(source: ContentSource, request_timeout: Duration) -> Self {
        Self {
            source,
            client: reqwest::Client::new(),
            timeout: request_timeout,
        }
    }

    /// Fetch one episode's markdown.
    ///
    /// A missing resource (HTTP 404, file not found, or an episode number
    /// outside every folder range) is `Ok(NotFound)`. Transient failures
    /// surface as typed errors so the caller can offer a retry. A cancelled
    /// token short-circuits before and after the IO so stale content never
    /// reaches the caller.
    pub async fn fetch_episode(
        &self,
        language: Language,
        episode: u32,
        token: &CancellationToken,
    ) -> Result<FetchOutcome> {
        let Some(path) = episode_path(language, episode) else {
            debug!(episode, %language, "episode outside every folder range");
            return Ok(FetchOutcome::NotFound);
        };

        token.check()?;
        let fetched = self.fetch_resource(&path).await?;
        token.check()?;

        match fetched {
            Some(content) => {
                info!(episode, %language, path, "fetched episode");
                Ok(FetchOutcome::Content(EpisodeContent {
                    content,
                    episode,
                    language,
                    path,
                }))
            }
            None => {
                debug!(episode, %language, path, "episode not found");
                Ok(FetchOutcome::NotFound)
            }
        }
    }

    /// Load the episode index document, if one is published.
    ///
    /// Absence and malformed JSON both resolve to `Ok(None)`: the resolver
    /// falls back to the built-in default range, so a broken manifest never
    /// leaves the reader without an episode list.
    pub async fn fetch_index(&self, token: &CancellationToken) -> Result<Option<EpisodeIndexDoc>> {
        token.check()?;
        let Some(raw) = self.fetch_resource(INDEX_DOCUMENT).await? else {
            debug!("no episode index document published");
            return Ok(None);
        };
        token.check()?;

        match serde_json::from_str::<EpisodeIndexDoc>(&raw) {
            Ok(doc) => Ok(Some(doc)),
            Err(error) => {
                warn!(%error, "episode index document is malformed, using default range");
                Ok(None)
            }
        }
    }

    /// Fetch a root-relative resource. `Ok(None)` means not found.
    async fn fetch_resource(&self, path: &str) -> Result<Option<String>> {
        match &self.source {
            ContentSource::Http(base) => self.fetch_from_url(base, path).await,
            ContentSource::Local(root) => Self::fetch_from_file(root, path).await,
        }
    }

    async fn fetch_from_url(&self, base: &Url, path: &str) -> Result<Option<String>> {
        let url = base.join(path.trim_start_matches('/'))?;
        debug!(%url, "requesting");

        let request = async {
            let response = self.client.get(url.clone()).send().await?;
            let status = response.status();

            if status.as_u16() == 404 {
                return Ok(None);
            }
            if !status.is_success() {
                return Err(ReaderError::HttpStatus {
                    status: status.as_u16(),
                    path: path.to_string(),
                });
            }

            Ok(Some(response.text().await?))
        };

        timeout(self.timeout, request)
            .await
            .map_err(|_| ReaderError::Timeout {
                path: path.to_string(),
            })?
    }

    async fn fetch_from_file(root: &Path, path: &str) -> Result<Option<String>> {
        let file_path = root.join(path.trim_start_matches('/'));
        match fs::read_to_string(&file_path).await {
            Ok(content) => Ok(Some(content)),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(error) => Err(error.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::resolver::format_episode_number;

    fn local_fetcher(root: &Path) -> ContentFetcher {
        ContentFetcher::new(
            ContentSource::Local(root.to_path_buf()),
            Duration::from_secs(5),
        )
    }

    fn write_episode(root: &Path, language: Language, episode: u32, body: &str) {
        let folder = crate::services::resolver::folder_for_episode(episode).unwrap();
        let dir = root.join(language.folder_name()).join(&folder.folder);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join(format!("{}.md", format_episode_number(episode))),
            body,
        )
        .unwrap();
    }

    #[tokio::test]
    async fn local_fetch_roundtrip() {
        let dir = std::env::temp_dir().join("ep-read-fetcher-roundtrip");
        let _ = std::fs::remove_dir_all(&dir);
        write_episode(&dir, Language::Eng, 42, "# Episode 42\n\nbody");

        let fetcher = local_fetcher(&dir);
        let token = CancellationToken::new();
        let outcome = fetcher
            .fetch_episode(Language::Eng, 42, &token)
            .await
            .unwrap();

        match outcome {
            FetchOutcome::Content(episode) => {
                assert_eq!(episode.episode, 42);
                assert_eq!(episode.path, "/eng-episodes/0001-0100/0042.md");
                assert!(episode.content.contains("Episode 42"));
            }
            FetchOutcome::NotFound => panic!("expected content"),
        }

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn missing_episode_is_not_found_not_error() {
        let dir = std::env::temp_dir().join("ep-read-fetcher-missing");
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();

        let fetcher = local_fetcher(&dir);
        let token = CancellationToken::new();
        let outcome = fetcher
            .fetch_episode(Language::Burmese, 7, &token)
            .await
            .unwrap();
        assert!(matches!(outcome, FetchOutcome::NotFound));

        // Outside every folder range: also not-found, still no error.
        let outcome = fetcher
            .fetch_episode(Language::Eng, 9999, &token)
            .await
            .unwrap();
        assert!(matches!(outcome, FetchOutcome::NotFound));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn cancelled_token_short_circuits() {
        let dir = std::env::temp_dir().join("ep-read-fetcher-cancel");
        let _ = std::fs::remove_dir_all(&dir);
        write_episode(&dir, Language::Eng, 1, "body");

        let fetcher = local_fetcher(&dir);
        let token = CancellationToken::new();
        token.cancel();

        let result = fetcher.fetch_episode(Language::Eng, 1, &token).await;
        assert!(matches!(result, Err(ReaderError::Cancelled)));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn malformed_index_degrades_to_none() {
        let dir = std::env::temp_dir().join("ep-read-fetcher-badindex");
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("episode-index.json"), "{not json").unwrap();

        let fetcher = local_fetcher(&dir);
        let token = CancellationToken::new();
        assert!(fetcher.fetch_index(&token).await.unwrap().is_none());

        let _ = std::fs::remove_dir_all(&dir);
    }
}
