use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// sri - Subresource Integrity for the scripts and stylesheets a site renders
#[derive(Parser, Debug)]
#[command(name = "sri")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (TOML, YAML or JSON)
    #[arg(short, long, global = true, env = "SRI_CONFIG")]
    pub config: Option<PathBuf>,

    /// More logging; repeat for more detail. `RUST_LOG` takes precedence.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the base64 SHA-256 digest of a file (or stdin)
    Hash {
        /// File to hash; `-` or nothing reads stdin
        file: Option<PathBuf>,
        /// Print a complete integrity value (`sha256-...`)
        #[arg(short, long)]
        integrity: bool,
    },

    /// Report whether a URL is served from the site's own origin
    IsLocal {
        url: String,
    },

    /// Inspect and edit the known hash cache
    #[command(subcommand)]
    Known(KnownCommands),

    /// Inspect and edit the exclusion list
    #[command(subcommand)]
    Excluded(ExcludedCommands),

    /// Issue a verification token for an admin action
    Nonce {
        #[command(flatten)]
        session: SessionArgs,
        /// Print a complete admin link for `exclude` or `include` of a URL
        #[arg(long, requires = "url", value_name = "ADMIN_URL")]
        link: Option<String>,
        #[arg(long, default_value = "exclude", requires = "link")]
        action: String,
        #[arg(long, requires = "link")]
        url: Option<String>,
    },

    /// Process an admin request given as its query string
    Action {
        /// e.g. `action=exclude&url=...&_wpsri_nonce=...`
        query: String,
        #[command(flatten)]
        session: SessionArgs,
        /// Report rejected tokens instead of failing
        #[arg(long)]
        silent: bool,
    },

    /// Add integrity attributes to an HTML document
    Rewrite {
        /// HTML file; `-` or nothing reads stdin
        file: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
pub enum KnownCommands {
    /// List every cached digest
    #[command(alias = "ls")]
    List,
    /// Print the cached digest of a URL
    Get { url: String },
    /// Record a digest for a URL
    Set { url: String, digest: String },
    /// Forget the digest of a URL
    #[command(alias = "rm")]
    Delete { url: String },
    /// Forget every digest
    Clear,
}

#[derive(Subcommand, Debug)]
pub enum ExcludedCommands {
    /// List excluded URLs in order
    #[command(alias = "ls")]
    List,
    /// Exclude a URL
    Add { url: String },
    /// Stop excluding a URL
    #[command(alias = "rm")]
    Remove { url: String },
}

#[derive(clap::Args, Debug)]
pub struct SessionArgs {
    /// ID of the user the token is bound to
    #[arg(long)]
    pub user: u64,
    /// Login session token the nonce is bound to
    #[arg(long, env = "SRI_SESSION")]
    pub session: String,
}
