//! Command-line argument parsing for newsdesk
//!
//! This module defines the CLI structure using clap derive macros: article
//! reads through the hooks, search, the preload bootstrap, media bucket
//! management and configuration.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// newsdesk - read the news site from the terminal
#[derive(Parser, Debug)]
#[command(
    name = "newsdesk",
    version,
    about = "Browse and manage a news site backed by a hosted data service",
    long_about = "Reads published articles, trending stories and search results through the same
cached data-access layer the site uses, and manages the media bucket."
)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all subcommands
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Very verbose logging (debug level)
    #[arg(long, global = true)]
    pub very_verbose: bool,

    /// Quiet mode - suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Configuration file path
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Read from an exported JSON snapshot instead of the service
    #[arg(long, global = true, value_name = "FILE")]
    pub snapshot: Option<PathBuf>,

    /// Skip the startup preload; every read goes straight to the service
    #[arg(long, global = true)]
    pub no_preload: bool,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Latest published articles
    Latest {
        /// Maximum number of articles shown
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// Featured articles
    Featured,

    /// Articles in one category
    Category {
        /// Category slug
        slug: String,
    },

    /// Trending articles in ranking order
    Trending,

    /// Show one article and record a view
    Article {
        /// Article slug
        slug: String,
    },

    /// Search titles, excerpts and subtitles
    Search {
        /// Text to look for
        text: String,
    },

    /// Run the preload bootstrap and report what it loaded
    Preload,

    /// Manage the media bucket
    Media(MediaArgs),

    /// Manage the configuration file
    Config(ConfigArgs),
}

/// Arguments for media management
#[derive(Args, Debug)]
pub struct MediaArgs {
    #[command(subcommand)]
    pub action: MediaAction,
}

/// Media bucket actions
#[derive(Subcommand, Debug)]
pub enum MediaAction {
    /// List objects, newest first
    List,

    /// Upload a local file under a generated unique name
    Upload {
        /// File to upload
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Remove objects by name
    Remove {
        /// Object names
        #[arg(required = true)]
        names: Vec<String>,
    },
}

/// Arguments for configuration management
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Configuration actions
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Write a commented default configuration file
    Init {
        /// Destination (defaults to the user config directory)
        #[arg(value_name = "FILE")]
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Print the effective configuration
    Show,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

impl GlobalArgs {
    /// Level forced by a verbosity flag, if any
    pub fn flag_level(&self) -> Option<tracing::Level> {
        if self.quiet {
            Some(tracing::Level::ERROR)
        } else if self.very_verbose {
            Some(tracing::Level::DEBUG)
        } else if self.verbose {
            Some(tracing::Level::INFO)
        } else {
            None
        }
    }

    /// Logging level: verbosity flags win over `configured`
    pub fn log_level(&self, configured: tracing::Level) -> tracing::Level {
        self.flag_level().unwrap_or(configured)
    }
}

impl Commands {
    /// Whether the command reads articles and benefits from the preload
    pub fn reads_articles(&self) -> bool {
        matches!(
            self,
            Commands::Latest { .. }
                | Commands::Featured
                | Commands::Category { .. }
                | Commands::Trending
                | Commands::Article { .. }
                | Commands::Search { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_read_commands() {
        let cli = Cli::try_parse_from(["newsdesk", "category", "culture", "--no-preload"]).unwrap();
        assert!(cli.global.no_preload);
        assert!(matches!(cli.command, Commands::Category { ref slug } if slug == "culture"));
        assert!(cli.command.reads_articles());

        let cli = Cli::try_parse_from(["newsdesk", "latest"]).unwrap();
        assert!(matches!(cli.command, Commands::Latest { limit: 20 }));
    }

    #[test]
    fn test_parse_media_and_config() {
        let cli = Cli::try_parse_from(["newsdesk", "media", "remove", "a.jpg", "b.png"]).unwrap();
        match cli.command {
            Commands::Media(MediaArgs {
                action: MediaAction::Remove { names },
            }) => assert_eq!(names, vec!["a.jpg", "b.png"]),
            other => panic!("unexpected command {:?}", other),
        }
        assert!(!Commands::Preload.reads_articles());

        assert!(Cli::try_parse_from(["newsdesk", "media", "remove"]).is_err());

        let cli = Cli::try_parse_from([
            "newsdesk",
            "--snapshot",
            "dump.json",
            "config",
            "init",
            "--force",
        ])
        .unwrap();
        assert_eq!(cli.global.snapshot, Some(PathBuf::from("dump.json")));
        assert!(matches!(
            cli.command,
            Commands::Config(ConfigArgs {
                action: ConfigAction::Init { force: true, .. }
            })
        ));
    }

    #[test]
    fn test_log_level() {
        let cli_quiet = Cli {
            global: GlobalArgs {
                quiet: true,
                ..GlobalArgs::default()
            },
            command: Commands::Trending,
        };

        let cli_verbose = Cli {
            global: GlobalArgs {
                verbose: true,
                ..GlobalArgs::default()
            },
            command: Commands::Trending,
        };

        assert_eq!(cli_quiet.global.log_level(tracing::Level::DEBUG), tracing::Level::ERROR);
        assert_eq!(cli_verbose.global.log_level(tracing::Level::WARN), tracing::Level::INFO);

        let cli_plain = Cli {
            global: GlobalArgs::default(),
            command: Commands::Trending,
        };
        assert_eq!(cli_plain.global.log_level(tracing::Level::DEBUG), tracing::Level::DEBUG);
    }
}
