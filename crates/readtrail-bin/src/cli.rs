use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Segment Markdown into reading units and track reading progress
#[derive(Debug, Parser)]
#[command(name = "readtrail", version, about)]
pub struct Cli {
    /// YAML config file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the sections of a Markdown document
    Sections(SectionsArgs),
    /// Build the section-metadata, content-index and directory-structure artifacts
    Index(IndexArgs),
    /// Per-document reading history
    #[command(subcommand)]
    History(HistoryCommand),
    /// To-read queue
    #[command(subcommand)]
    List(ListCommand),
}

#[derive(Debug, Args)]
pub struct SectionsArgs {
    pub file: PathBuf,

    /// Include each section's content
    #[arg(long)]
    pub content: bool,
}

#[derive(Debug, Args)]
pub struct IndexArgs {
    /// Content root to scan
    pub root: PathBuf,

    /// Directory receiving the JSON artifacts
    #[arg(long)]
    pub out: PathBuf,
}

#[derive(Debug, Subcommand)]
pub enum HistoryCommand {
    /// Record a reading session
    Add {
        path: String,
        #[arg(long, default_value = "")]
        title: String,
        /// Completed section indices, comma separated
        #[arg(long, value_delimiter = ',')]
        sections: Vec<u32>,
        #[arg(long)]
        time_ms: Option<u64>,
        #[arg(long)]
        words: Option<u64>,
    },
    /// Mark sections of an already read document completed
    Complete {
        path: String,
        #[arg(value_delimiter = ',', required = true)]
        indices: Vec<u32>,
    },
    /// Most recently read documents first
    List {
        #[arg(long)]
        limit: Option<usize>,
    },
    Show {
        path: String,
    },
    Remove {
        path: String,
    },
    /// Merge duplicate records of the same document
    Clean,
    Stats,
    /// Forget all reading history
    Clear,
}

#[derive(Debug, Subcommand)]
pub enum ListCommand {
    Add { path: String, title: String },
    Toggle { id: String },
    Remove { id: String },
    Show,
    Stats,
    /// Drop completed entries
    Prune,
}
