//! CLI command definitions and parsing
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "carchive",
    version,
    about = "Chat-archive manager with unified search",
    long_about = "Carchive stores exported AI-chat archives (ChatGPT, Claude) in a local SQLite \
                  database and provides one search entry point across messages, conversations, \
                  text chunks, AI-generated commentary, and media."
)]
pub struct Cli {
    /// Global config file path (defaults to ~/.config/carchive/config.toml)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize the archive database under the configured data directory
    Init,

    /// Search the archive
    Search {
        /// Search query text (empty matches everything)
        #[arg(default_value = "")]
        query: String,

        /// Text matching mode: substring, exact, any_word, all_words, regex
        #[arg(short, long, default_value = "substring")]
        mode: String,

        /// Entity types to search, comma-separated:
        /// message, conversation, chunk, gencom, media, all
        #[arg(short, long, default_value = "all")]
        types: String,

        /// Filter by message author role (repeatable)
        #[arg(long)]
        role: Vec<String>,

        /// Filter by provider name, e.g. chatgpt, claude (repeatable)
        #[arg(long)]
        provider: Vec<String>,

        /// Restrict gencom search to specific subtypes (repeatable)
        #[arg(long = "gencom-type")]
        gencom_type: Vec<String>,

        /// Restrict to one conversation id
        #[arg(long)]
        conversation: Option<String>,

        /// Only items created within the last N days
        #[arg(long)]
        days: Option<i64>,

        /// Inclusive start date (YYYY-MM-DD or RFC 3339)
        #[arg(long)]
        since: Option<String>,

        /// Inclusive end date (YYYY-MM-DD or RFC 3339)
        #[arg(long)]
        until: Option<String>,

        /// Sort order: date_desc, date_asc, alpha_asc, alpha_desc
        #[arg(short, long, default_value = "date_desc")]
        sort: String,

        /// Number of results to skip
        #[arg(long, default_value = "0")]
        offset: usize,

        /// Maximum number of results (defaults to search.default_limit)
        #[arg(short, long)]
        limit: Option<usize>,

        /// Print the full JSON results envelope
        #[arg(long)]
        json: bool,
    },

    /// Show archive statistics
    Stats,

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

    /// Validate configuration file
    Validate {
        /// Path to config file (defaults to standard location)
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Initialize default configuration
    Init {
        /// Force overwrite existing config
        #[arg(short, long)]
        force: bool,
    },
}

impl Cli {
    /// Parse CLI arguments from command line
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
