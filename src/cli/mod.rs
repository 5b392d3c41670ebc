//! CLI module for Kurs.

pub mod commands;
mod output;

pub use output::Output;

use clap::{Parser, Subcommand};

/// Kurs - Course Material Search and Q&A
///
/// A CLI tool for indexing course transcripts and asking questions about
/// them. The name "Kurs" comes from the Norwegian word for "course."
#[derive(Parser, Debug)]
#[command(name = "kurs")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Parse and index course documents from a folder
    Ingest {
        /// Folder of course documents (defaults to ingestion.docs_dir)
        folder: Option<String>,
    },

    /// Ask a question about the indexed courses
    Ask {
        /// The question to ask
        question: String,

        /// Continue an existing session
        #[arg(short, long)]
        session: Option<String>,
    },

    /// Start an interactive chat session
    Chat,

    /// Search course content directly, without the assistant
    Search {
        /// Search query
        query: String,

        /// Restrict to one course (fuzzy name match)
        #[arg(long)]
        course: Option<String>,

        /// Restrict to one lesson number
        #[arg(long)]
        lesson: Option<u32>,

        /// Maximum number of results
        #[arg(short, long, default_value = "5")]
        limit: usize,
    },

    /// Show the lesson outline of a course
    Outline {
        /// Course name (fuzzy match against the catalog)
        course: String,
    },

    /// List indexed courses
    List,

    /// Start the HTTP API server
    Serve {
        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(short, long, default_value = "8000")]
        port: u16,

        /// Skip document ingestion at startup
        #[arg(long)]
        no_ingest: bool,
    },

    /// Delete all indexed courses and chunks
    Clear {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Open configuration file in editor
    Edit,

    /// Show configuration file path
    Path,
}
