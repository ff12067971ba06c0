// MarkView core: tab session, in-document search and the native bridge
// The console host drives everything through one event queue

pub mod app;
pub mod autosave;
pub mod commands;
pub mod console;
pub mod error;
pub mod models;
pub mod outline;
pub mod search;
pub mod session;
pub mod storage;
pub mod watcher;

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use commands::common::markdown_file_from_args;
use error::Result;
use storage::Storage;

/// Command line arguments
#[derive(Debug, Parser)]
#[command(name = "markview", version, about = "Markdown viewer with tabs, search and live reload")]
pub struct Cli {
    /// Markdown file to open at startup (.md or .markdown)
    pub file: Option<PathBuf>,

    /// Directory holding settings.json and recent.json
    #[arg(long, value_name = "DIR")]
    pub config_dir: Option<PathBuf>,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let storage = match cli.config_dir {
        Some(dir) => Storage::open(dir),
        None => Storage::open_default()?,
    };
    let storage = Arc::new(storage);

    // Same rule as a second launch: only markdown files are opened
    let initial = cli.file.and_then(|path| {
        let arg = path.to_string_lossy().to_string();
        let found = markdown_file_from_args(&["markview".to_string(), arg]);
        if found.is_none() {
            tracing::warn!(path = %path.display(), "ignoring non-markdown file argument");
        }
        found
    });

    let runtime = tokio::runtime::Builder::new_multi_thread().enable_all().build()?;
    runtime.block_on(console::run_console(storage, initial))
}
