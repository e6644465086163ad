//! sri - Subresource Integrity for the scripts and stylesheets a site renders
//!
//! Command line front end over the option store: hash resources, manage the
//! known hash cache and the exclusion list, issue and process admin action
//! tokens, and rewrite HTML documents.

use clap::Parser;
use exn::ResultExt;
use sri_config::Config;
use sri_rewrite::{FetcherHandle, HttpFetcher};
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;
mod context;
mod error;

use crate::cli::{Cli, Commands};
use crate::context::Context;
use crate::error::{ErrorKind, Result};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match run(cli).await {
        Ok(output) => {
            if !output.is_empty() {
                println!("{output}");
            }
            ExitCode::SUCCESS
        },
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::FAILURE
        },
    }
}

/// Logs go to stderr; stdout is for command output.
fn init_tracing(verbose: u8) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level(verbose)));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).try_init();
}

fn default_level(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

fn open(config: Option<&Path>) -> Result<Context> {
    Context::open(Config::load(config).or_raise(|| ErrorKind::Config)?)
}

async fn run(cli: Cli) -> Result<String> {
    let Cli { config, command, .. } = cli;
    let config = config.as_deref();
    match command {
        // The only command that works without any configuration.
        Commands::Hash { file, integrity } => {
            let content = commands::read_input(file.as_deref()).await?;
            Ok(commands::hash(&content, integrity))
        },
        Commands::IsLocal { url } => commands::is_local(&open(config)?, &url),
        Commands::Known(command) => commands::known(&open(config)?, command).await,
        Commands::Excluded(command) => commands::excluded(&open(config)?, command).await,
        Commands::Nonce { session, link, action, url } => {
            commands::nonce(&open(config)?, &session, link.as_deref(), &action, url.as_deref())
        },
        Commands::Action { query, session, silent } => commands::action(&open(config)?, &query, &session, silent).await,
        Commands::Rewrite { file } => {
            let ctx = open(config)?;
            let input = commands::read_input(file.as_deref()).await?;
            let html = String::from_utf8_lossy(&input);
            let fetch = &ctx.config.fetch;
            let fetcher = HttpFetcher::new(fetch.timeout(), &fetch.user_agent, fetch.max_bytes)
                .or_raise(|| ErrorKind::Config)?;
            let fetcher: FetcherHandle = Arc::new(fetcher);
            commands::rewrite(&ctx, &html, fetcher).await
        },
    }
}
