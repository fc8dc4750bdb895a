//! Command-line argument parsing for blogctl
//!
//! Provides clap-based CLI with subcommands and verbosity control.

use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

use crate::guard::Route;

/// blogctl - administer a blog-manager backend from the terminal
#[derive(Parser, Debug)]
#[command(name = "blogctl")]
#[command(version)]
#[command(about = "Manage posts, images, settings and the writing assistant of a blog-manager backend", long_about = None)]
pub struct Args {
    /// Backend base URL (overrides the config file)
    #[arg(long, global = true)]
    pub server: Option<String>,

    /// Request timeout in seconds (overrides the config file)
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbosity level: -q (quiet), default (normal), -v (verbose), -vv (very verbose)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Log in and store the access token
    Login {
        username: String,
        /// Read from stdin when omitted
        #[arg(long)]
        password: Option<String>,
    },

    /// Create an account
    Register {
        username: String,
        email: String,
        #[arg(long)]
        password: Option<String>,
    },

    /// Forget the stored token
    Logout,

    /// Show the logged-in user
    Whoami,

    /// Blog posts
    #[command(subcommand)]
    Blog(BlogCommand),

    /// Images stored by the backend
    #[command(subcommand)]
    Image(ImageCommand),

    /// Backend system settings
    #[command(subcommand)]
    Config(SystemCommand),

    /// Writing assistant
    #[command(subcommand)]
    Llm(LlmCommand),

    /// Run connectivity and session health checks
    Doctor,

    /// Display the local configuration
    Settings {
        /// Write the defaults to the config file
        #[arg(long)]
        init: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum BlogCommand {
    /// List all posts
    List,

    /// Print one post
    Show { id: i64 },

    /// Create a post
    New {
        #[command(flatten)]
        meta: MetaArgs,

        /// Take metadata from a markdown draft with front matter
        #[arg(long, value_name = "FILE")]
        from_file: Option<PathBuf>,
    },

    /// Change title, categories, tags or saying
    EditInfo {
        id: i64,

        #[command(flatten)]
        meta: MetaArgs,

        /// Remove all tags before applying --tag
        #[arg(long)]
        clear_tags: bool,
    },

    /// Replace the markdown body
    EditContent {
        id: i64,

        /// File holding the new body, `-` for stdin
        #[arg(long, value_name = "FILE")]
        file: PathBuf,
    },

    /// Delete a post
    Delete {
        id: i64,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Filter posts by keyword, category or tag
    Search {
        keyword: Option<String>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        tag: Option<String>,
    },
}

/// Metadata flags shared by `blog new` and `blog edit-info`
#[derive(ClapArgs, Debug, Default, Clone)]
pub struct MetaArgs {
    #[arg(long)]
    pub title: Option<String>,
    #[arg(long)]
    pub categories: Option<String>,
    /// Repeat for several tags
    #[arg(long = "tag", value_name = "TAG")]
    pub tags: Vec<String>,
    #[arg(long)]
    pub saying: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum ImageCommand {
    /// Upload an image file
    Upload {
        file: PathBuf,
        /// Destination path relative to the image store
        #[arg(long, default_value = "")]
        path: String,
    },

    /// Download an image
    Get {
        relative_path: String,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the URL an image is served at
    Url { relative_path: String },
}

#[derive(Subcommand, Debug)]
pub enum SystemCommand {
    /// Show backend settings
    Get,

    /// Change backend settings, e.g. `blogStoragePath=/srv/blog`
    Set {
        #[arg(value_name = "KEY=VALUE", required = true)]
        assignments: Vec<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum LlmCommand {
    /// Show the active LLM backend
    Get,

    /// Switch LLM backend (XModel or BigModel)
    Set { llm_type: Option<String> },

    /// Ask for a writing suggestion
    Suggest {
        text: String,
        /// Stream the reply as it is generated
        #[arg(long)]
        stream: bool,
    },

    /// One-shot chat without streaming
    Ask { text: String },

    /// Streaming chat; interactive when no message is given
    Chat { message: Option<String> },
}

/// Verbosity level enum
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    Quiet,
    Normal,
    Verbose,
    VeryVerbose,
}

impl Args {
    /// Get verbosity level based on flags
    pub fn verbosity(&self) -> Verbosity {
        if self.quiet {
            Verbosity::Quiet
        } else {
            match self.verbose {
                0 => Verbosity::Normal,
                1 => Verbosity::Verbose,
                _ => Verbosity::VeryVerbose,
            }
        }
    }

    /// Whether verbosity was left at its default
    pub fn verbosity_is_default(&self) -> bool {
        !self.quiet && self.verbose == 0
    }
}

impl Commands {
    /// Route a command is checked against before it runs; `None` skips the guard
    pub fn route(&self) -> Option<Route> {
        match self {
            Commands::Login { .. } => Some(Route::Login),
            Commands::Register { .. } => Some(Route::Register),
            Commands::Blog(cmd) => Some(match cmd {
                BlogCommand::List => Route::BlogList,
                BlogCommand::Show { id } => Route::BlogDetail(*id),
                BlogCommand::New { .. } => Route::BlogAdd,
                BlogCommand::EditInfo { id, .. }
                | BlogCommand::EditContent { id, .. }
                | BlogCommand::Delete { id, .. } => Route::BlogEdit(*id),
                BlogCommand::Search { .. } => Route::BlogSearch,
            }),
            Commands::Image(ImageCommand::Upload { .. }) => Some(Route::Dashboard),
            Commands::Config(_) | Commands::Llm(_) => Some(Route::Dashboard),
            Commands::Image(_)
            | Commands::Logout
            | Commands::Whoami
            | Commands::Doctor
            | Commands::Settings { .. } => None,
        }
    }
}

impl Verbosity {
    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Verbosity::Quiet => "quiet",
            Verbosity::Normal => "normal",
            Verbosity::Verbose => "verbose",
            Verbosity::VeryVerbose => "very_verbose",
        }
    }

    /// Parse the config-file spelling
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "quiet" => Some(Verbosity::Quiet),
            "normal" => Some(Verbosity::Normal),
            "verbose" => Some(Verbosity::Verbose),
            "very_verbose" => Some(Verbosity::VeryVerbose),
            _ => None,
        }
    }

    /// Check if should show progress spinners
    pub fn show_progress(&self) -> bool {
        !matches!(self, Verbosity::Quiet)
    }
}
