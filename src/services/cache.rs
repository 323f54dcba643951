//! Offline content caching.
//!
//! Two named strategies mirror the reader's offline behavior: navigations
//! go network-first with a cached fallback, while content and static assets
//! are served stale-while-revalidate. The policy for a resource is chosen
//! by its extension class.

use crate::error::Result;
use std::future::Future;
use std::path::PathBuf;
use tokio::fs;
use tracing::{debug, warn};

const CONTENT_EXTENSIONS: &[&str] = &[
    "md", "json", "css", "js", "html", "png", "jpg", "jpeg", "gif", "webp", "svg",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachePolicy {
    NetworkFirstWithFallback,
    StaleWhileRevalidate,
}

impl CachePolicy {
    /// Select the strategy for a resource path by extension class.
    /// Extensionless paths are treated as navigations.
    pub fn for_path(path: &str) -> Self {
        let extension = path
            .rsplit('/')
            .next()
            .and_then(|segment| segment.rsplit_once('.'))
            .map(|(_, ext)| ext.to_ascii_lowercase());

        match extension {
            Some(ext) if CONTENT_EXTENSIONS.contains(&ext.as_str()) => {
                CachePolicy::StaleWhileRevalidate
            }
            _ => CachePolicy::NetworkFirstWithFallback,
        }
    }
}

/// Directory-backed cache keyed by root-relative resource path.
#[derive(Debug, Clone)]
pub struct ContentCache {
    root: PathBuf,
}

impl ContentCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        // Flatten the resource path into a single file name so keys cannot
        // escape the cache root.
        let flat: String = key
            .trim_start_matches('/')
            .chars()
            .map(|c| if c == '/' || c == '\\' { '_' } else { c })
            .collect();
        self.root.join(flat)
    }

    pub async fn get(&self, key: &str) -> Option<String> {
        fs::read_to_string(self.entry_path(key)).await.ok()
    }

    pub async fn put(&self, key: &str, value: &str) -> Result<()> {
        fs::create_dir_all(&self.root).await?;
        fs::write(self.entry_path(key), value).await?;
        Ok(())
    }
}

/// Try the network, cache on success; on failure serve the cached entry,
/// then the designated fallback entry, before giving up with the original
/// error.
pub async fn network_first_with_fallback<F, Fut>(
    fetch: F,
    cache: &ContentCache,
    key: &str,
    fallback_key: Option<&str>,
) -> Result<String>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<String>>,
{
    match fetch().await {
        Ok(body) => {
            if let Err(error) = cache.put(key, &body).await {
                warn!(key, %error, "could not cache fetched resource");
            }
            Ok(body)
        }
        Err(error) => {
            if let Some(cached) = cache.get(key).await {
                debug!(key, "network failed, serving cached copy");
                return Ok(cached);
            }
            if let Some(fallback) = fallback_key {
                if let Some(cached) = cache.get(fallback).await {
                    debug!(key, fallback, "network failed, serving fallback entry");
                    return Ok(cached);
                }
            }
            Err(error)
        }
    }
}

/// Serve the cached entry immediately and refresh it in the background;
/// only an empty cache waits for the network.
pub async fn stale_while_revalidate<F, Fut>(
    fetch: F,
    cache: &ContentCache,
    key: &str,
) -> Result<String>
where
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = Result<String>> + Send,
{
    if let Some(cached) = cache.get(key).await {
        let cache = cache.clone();
        let key = key.to_string();
        tokio::spawn(async move {
            match fetch().await {
                Ok(body) => {
                    if let Err(error) = cache.put(&key, &body).await {
                        warn!(key = %key, %error, "could not refresh cached resource");
                    }
                }
                Err(error) => debug!(key = %key, %error, "background revalidation failed"),
            }
        });
        return Ok(cached);
    }

    let body = fetch().await?;
    if let Err(error) = cache.put(key, &body).await {
        warn!(key, %error, "could not cache fetched resource");
    }
    Ok(body)
}
