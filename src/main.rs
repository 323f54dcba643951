mod cli;
mod error;
mod services;
mod types;

use clap::Parser;
use cli::{Cli, Commands, FetchArgs, PaginateArgs, ResolveArgs, SyncArgs, ValidateArgs};
use error::{ReaderError, Result};
use services::cache::{self, CachePolicy, ContentCache};
use services::cancel::CancellationToken;
use services::fetcher::{ContentFetcher, ContentSource};
use services::pager;
use services::resolver;
use services::session::{chapter_id, ReaderSession};
use services::storage::{self, JsonFileStore};
use services::sync::{self, SyncConfig, SyncPair};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{error, info, warn, Level};
use types::{
    BookMetadata, Direction, EpisodeIndexDoc, FetchOutcome, Language, PaginationConfig,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .init();

    let result = match &cli.command {
        Commands::Sync(args) => handle_sync_command(args),
        Commands::Resolve(args) => handle_resolve_command(args),
        Commands::Paginate(args) => handle_paginate_command(args, &cli.output).await,
        Commands::Fetch(args) => handle_fetch_command(args).await,
        Commands::Validate(args) => handle_validate_command(args),
    };

    if let Err(e) = result {
        error!("Operation failed: {}", e);
        std::process::exit(1);
    }

    Ok(())
}

fn handle_sync_command(args: &SyncArgs) -> Result<()> {
    let mut pairs = Vec::new();
    for (language, source) in [
        (Language::Eng, args.eng.as_ref()),
        (Language::Burmese, args.burmese.as_ref()),
    ] {
        if let Some(source) = source {
            pairs.push(SyncPair {
                language,
                source: source.clone(),
                target: args.public.join(language.folder_name()),
            });
        }
    }

    if pairs.is_empty() {
        return Err(ReaderError::SyncConfig {
            reason: "nothing to sync: pass --eng and/or --burmese".to_string(),
        });
    }

    info!("Starting sync of {} language trees", pairs.len());

    let config = SyncConfig {
        pairs,
        manifest_path: args.public.join("episode-index.json"),
        metadata: BookMetadata {
            title: args.title.clone(),
            author: args.author.clone(),
            ..BookMetadata::default()
        },
    };

    let reports = sync::sync_trees(&config)?;
    for report in &reports {
        info!(
            "  {}: {} episodes in {} folders",
            report.language,
            report.index.available_count.unwrap_or(0),
            report.index.folders.as_ref().map_or(0, |f| f.len()),
        );
    }

    let manifest = sync::manifest_from_reports(&reports, &config.metadata);
    sync::write_manifest(&config.manifest_path, &manifest)?;

    info!("Sync completed successfully!");
    Ok(())
}

fn handle_resolve_command(args: &ResolveArgs) -> Result<()> {
    let language = Language::normalize(Some(&args.language));
    let index = args.index.as_deref().and_then(load_index_document);
    let available = resolver::available_episodes(index.as_ref(), language);

    let Some(resolved) = resolver::find_nearest_episode(&available, args.episode) else {
        println!("No episodes available for language '{}'.", language);
        return Ok(());
    };

    println!("\n=== Episode resolution ===");
    println!("Requested: {} ({})", args.episode, language);
    println!(
        "Resolved:  {} -> {}",
        resolved,
        resolver::episode_path(language, resolved).unwrap_or_else(|| "(no path)".to_string())
    );
    if resolved != args.episode {
        println!("Requested episode is unavailable; showing nearest available episode.");
    }

    match resolver::adjacent_episode(&available, resolved, Direction::Prev) {
        Some(previous) => println!("Previous:  {}", previous),
        None => println!("Previous:  (none)"),
    }
    match resolver::adjacent_episode(&available, resolved, Direction::Next) {
        Some(next) => println!("Next:      {}", next),
        None => println!("Next:      (none)"),
    }
    println!("Available: {} episodes", available.len());

    Ok(())
}

async fn handle_paginate_command(args: &PaginateArgs, output_dir: &PathBuf) -> Result<()> {
    let language = Language::normalize(Some(&args.language));
    let source = ContentSource::parse(&args.base)?;
    let fetcher = ContentFetcher::new(source, Duration::from_secs(args.timeout_secs));

    let mut store = JsonFileStore::open(storage::default_store_path(output_dir));
    let mut session = ReaderSession::restore(&store);

    let (ticket, token) = session.begin_navigation(args.episode, language);
    let index = fetcher.fetch_index(&token).await?;
    let available = resolver::available_episodes(index.as_ref(), language);

    let Some(resolved) = resolver::find_nearest_episode(&available, args.episode) else {
        return Err(ReaderError::EpisodeTree {
            reason: format!("no episodes available for language '{}'", language),
        });
    };
    if resolved != args.episode {
        info!(
            "Episode {} unavailable, showing nearest available episode {}",
            args.episode, resolved
        );
    }

    let outcome = fetcher.fetch_episode(language, resolved, &token).await?;
    session.apply_outcome(ticket, outcome);

    let Some(episode) = session.current() else {
        warn!(
            "Episode {} has no backing resource; the index may be stale",
            resolved
        );
        return Ok(());
    };

    let budget = args.max_chars.unwrap_or_else(|| {
        pager::page_budget(&PaginationConfig::default(), args.viewport_width)
    });
    let pages = pager::split_into_pages(&episode.content, budget);
    let words = pager::count_words(&episode.content);

    let title = pager::extract_title(&episode.content)
        .unwrap_or_else(|| resolver::format_episode_name(episode.episode, None, language));
    println!("\n=== {} ===", title);
    println!("Source: {}", episode.path);
    println!(
        "{} words · ~{} min read",
        words,
        pager::reading_minutes(words)
    );
    println!("{} pages at {} chars per page", pages.len(), budget);
    for (idx, page) in pages.iter().enumerate() {
        println!("  Page {}: {} chars", idx + 1, page.chars().count());
    }

    if args.write {
        write_pages(output_dir, language, episode.episode, &pages).await?;
    }

    session.persist(&mut store);
    Ok(())
}

async fn write_pages(
    output_dir: &Path,
    language: Language,
    episode: u32,
    pages: &[String],
) -> Result<()> {
    tokio::fs::create_dir_all(output_dir)
        .await
        .map_err(|e| ReaderError::OutputDirectory {
            reason: format!("cannot create output directory: {}", e),
        })?;

    for (idx, page) in pages.iter().enumerate() {
        let filename = format!(
            "{}_page_{:02}.md",
            chapter_id(language, episode),
            idx + 1
        );
        let path = output_dir.join(filename);
        tokio::fs::write(&path, page).await?;
        info!("  - {}", path.display());
    }

    Ok(())
}

async fn handle_fetch_command(args: &FetchArgs) -> Result<()> {
    let language = Language::normalize(Some(&args.language));
    let source = ContentSource::parse(&args.base)?;
    let fetcher = ContentFetcher::new(source, Duration::from_secs(args.timeout_secs));
    let token = CancellationToken::new();

    let index = fetcher.fetch_index(&token).await?;
    let available = resolver::available_episodes(index.as_ref(), language);
    let Some(resolved) = resolver::find_nearest_episode(&available, args.episode) else {
        return Err(ReaderError::EpisodeTree {
            reason: format!("no episodes available for language '{}'", language),
        });
    };
    if resolved != args.episode {
        info!(
            "Episode {} unavailable, fetching nearest available episode {}",
            args.episode, resolved
        );
    }

    let content = match &args.cache_dir {
        Some(cache_dir) => {
            fetch_with_cache(&fetcher, cache_dir, language, resolved, &token).await?
        }
        None => match fetcher.fetch_episode(language, resolved, &token).await? {
            FetchOutcome::Content(episode) => episode.content,
            FetchOutcome::NotFound => {
                return Err(ReaderError::EpisodeTree {
                    reason: format!(
                        "episode {} has no backing resource; the index may be stale",
                        resolved
                    ),
                })
            }
        },
    };

    match &args.out {
        Some(out) => {
            tokio::fs::write(out, &content).await?;
            info!("Wrote {} bytes to {}", content.len(), out.display());
        }
        None => print!("{}", content),
    }

    Ok(())
}

/// Fetch through the offline cache, picking the strategy by resource class.
async fn fetch_with_cache(
    fetcher: &ContentFetcher,
    cache_dir: &Path,
    language: Language,
    episode: u32,
    token: &CancellationToken,
) -> Result<String> {
    let path = resolver::episode_path(language, episode).ok_or_else(|| {
        ReaderError::EpisodeTree {
            reason: format!("episode {} is outside every folder range", episode),
        }
    })?;
    let content_cache = ContentCache::new(cache_dir);

    let fetch = {
        let fetcher = fetcher.clone();
        let token = token.clone();
        move || async move {
            match fetcher.fetch_episode(language, episode, &token).await? {
                FetchOutcome::Content(found) => Ok(found.content),
                FetchOutcome::NotFound => Err(ReaderError::EpisodeTree {
                    reason: format!("episode {} has no backing resource", episode),
                }),
            }
        }
    };

    match CachePolicy::for_path(&path) {
        CachePolicy::StaleWhileRevalidate => {
            cache::stale_while_revalidate(fetch, &content_cache, &path).await
        }
        CachePolicy::NetworkFirstWithFallback => {
            cache::network_first_with_fallback(fetch, &content_cache, &path, None).await
        }
    }
}

fn handle_validate_command(args: &ValidateArgs) -> Result<()> {
    info!("Validating {} episode trees", args.roots.len());

    let mut total_problems = 0usize;
    for root in &args.roots {
        match sync::validate_tree(root) {
            Ok(report) if report.is_clean() => {
                info!(
                    "✓ {}: {} folders, {} episode files",
                    root.display(),
                    report.folders,
                    report.episode_files
                );
            }
            Ok(report) => {
                error!("✗ {}: {} problems", root.display(), report.problems.len());
                for problem in &report.problems {
                    println!("  - {}", problem);
                }
                total_problems += report.problems.len();
            }
            Err(e) => {
                error!("✗ {}: {}", root.display(), e);
                total_problems += 1;
            }
        }
    }

    println!("\n=== Validation Summary ===");
    println!("Trees checked: {}", args.roots.len());

    if total_problems > 0 {
        return Err(ReaderError::EpisodeTree {
            reason: format!("{} problems found across episode trees", total_problems),
        });
    }

    println!("All episode trees are valid!");
    Ok(())
}

fn load_index_document(path: &Path) -> Option<EpisodeIndexDoc> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) => {
            warn!("Cannot read index document {}: {}", path.display(), e);
            return None;
        }
    };
    match serde_json::from_str(&raw) {
        Ok(doc) => Some(doc),
        Err(e) => {
            warn!(
                "Index document {} is malformed ({}), using default range",
                path.display(),
                e
            );
            None
        }
    }
}
