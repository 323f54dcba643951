use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ep-read")]
#[command(about = "Episode tooling for a serialized markdown novel: sync trees, resolve episodes, paginate content")]
#[command(version = "0.1.0")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output directory for generated files
    #[arg(short, long, global = true, default_value = "./output")]
    pub output: PathBuf,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Copy episode source trees into the public directory and write the manifest
    Sync(SyncArgs),

    /// Resolve a requested episode against the availability index
    Resolve(ResolveArgs),

    /// Fetch an episode and split it into pages
    Paginate(PaginateArgs),

    /// Fetch an episode's raw markdown
    Fetch(FetchArgs),

    /// Validate the structure of episode trees
    Validate(ValidateArgs),
}

#[derive(Args)]
pub struct SyncArgs {
    /// English episode source tree
    #[arg(long, value_name = "DIR")]
    pub eng: Option<PathBuf>,

    /// Burmese episode source tree
    #[arg(long, value_name = "DIR")]
    pub burmese: Option<PathBuf>,

    /// Public assets directory receiving the copies and the manifest
    #[arg(long, default_value = "./public")]
    pub public: PathBuf,

    /// Book title recorded in the manifest
    #[arg(long)]
    pub title: Option<String>,

    /// Author recorded in the manifest
    #[arg(long)]
    pub author: Option<String>,
}

#[derive(Args)]
pub struct ResolveArgs {
    /// Requested episode number
    #[arg(value_name = "EPISODE")]
    pub episode: u32,

    /// Content language (free-form hint, e.g. "eng", "my", "burmese")
    #[arg(short, long, default_value = "eng")]
    pub language: String,

    /// Path to an episode-index.json manifest; omitted means default range
    #[arg(long, value_name = "FILE")]
    pub index: Option<PathBuf>,
}

#[derive(Args)]
pub struct PaginateArgs {
    /// Requested episode number
    #[arg(value_name = "EPISODE")]
    pub episode: u32,

    /// Content language
    #[arg(short, long, default_value = "eng")]
    pub language: String,

    /// Content base: an HTTP URL or a local public directory
    #[arg(short, long, default_value = "./public")]
    pub base: String,

    /// Override the page character budget
    #[arg(long, value_name = "CHARS")]
    pub max_chars: Option<usize>,

    /// Viewport width used to pick the budget when no override is given
    #[arg(long, default_value_t = 1280)]
    pub viewport_width: u32,

    /// Write the pages as files into the output directory
    #[arg(long)]
    pub write: bool,

    /// Fetch timeout in seconds
    #[arg(long, default_value_t = 10)]
    pub timeout_secs: u64,
}

#[derive(Args)]
pub struct FetchArgs {
    /// Requested episode number
    #[arg(value_name = "EPISODE")]
    pub episode: u32,

    /// Content language
    #[arg(short, long, default_value = "eng")]
    pub language: String,

    /// Content base: an HTTP URL or a local public directory
    #[arg(short, long, default_value = "./public")]
    pub base: String,

    /// Offline cache directory; fetched content is cached and served on outages
    #[arg(long, value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Write the markdown to a file instead of stdout
    #[arg(long, value_name = "FILE")]
    pub out: Option<PathBuf>,

    /// Fetch timeout in seconds
    #[arg(long, default_value_t = 10)]
    pub timeout_secs: u64,
}

#[derive(Args)]
pub struct ValidateArgs {
    /// Episode tree roots to check
    #[arg(required = true, value_name = "DIR")]
    pub roots: Vec<PathBuf>,
}
