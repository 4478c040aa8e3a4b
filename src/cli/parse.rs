//! CLI parse: clap types for Quill. No behavior; definitions only.

use crate::formats::ContentFormat;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Quill CLI - Reliable content generation against OpenAI-compatible services
#[derive(Parser, Debug)]
#[command(name = "quill")]
#[command(about = "Generate complete social content with model fallback, continuation and schema checks")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace root directory (config/quill.toml is read from here)
    #[arg(long, default_value = ".")]
    pub workspace: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging (debug level)
    #[arg(long, default_value = "false")]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output is "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

/// Options shared by the generating commands
#[derive(Args, Debug, Clone, Default)]
pub struct GenerationArgs {
    /// Brief describing what to write (theme, subthemes, ideas)
    #[arg(long, conflicts_with = "brief_file")]
    pub brief: Option<String>,

    /// Read the brief from a file
    #[arg(long)]
    pub brief_file: Option<PathBuf>,

    /// Model candidate, most preferred first (repeatable; replaces configured candidates)
    #[arg(long = "model")]
    pub models: Vec<String>,

    /// Request JSON output validated against the format schema
    #[arg(long)]
    pub structured: bool,

    /// Override the system prompt
    #[arg(long)]
    pub system: Option<String>,

    /// Output token budget per call
    #[arg(long)]
    pub token_budget: Option<u32>,

    /// Maximum segments (calls that contribute text) per piece
    #[arg(long)]
    pub max_segments: Option<u32>,

    /// Answer from a recorded JSON script instead of calling the service
    #[arg(long)]
    pub replay: Option<PathBuf>,

    /// Output format (text or json)
    #[arg(long, default_value = "text")]
    pub format: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate one piece of content
    Generate {
        /// Content format: reels, post, carousel, live, stories
        content: ContentFormat,

        #[command(flatten)]
        args: GenerationArgs,
    },
    /// Generate several formats from one brief
    Package {
        /// Formats to generate (default: all, in package order)
        #[arg(long = "only", value_delimiter = ',')]
        formats: Vec<ContentFormat>,

        /// Pieces generated at once
        #[arg(long)]
        concurrency: Option<usize>,

        #[command(flatten)]
        args: GenerationArgs,
    },
    /// Configuration commands (show, init)
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show the effective configuration after all sources are merged
    Show {
        /// Output format (toml or json)
        #[arg(long, default_value = "toml")]
        format: String,
    },
    /// Write a default configuration file
    Init {
        /// Target path (default: <workspace>/config/quill.toml)
        #[arg(long, conflicts_with = "global")]
        path: Option<PathBuf>,
        /// Write the global user config instead
        #[arg(long)]
        global: bool,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}
