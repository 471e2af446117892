mod cli;
mod commands;

use clap::Parser;
use dotenv::dotenv;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use salon_client::clock::SystemClock;
use salon_client::storage::FileStorage;
use salon_client::toast::TerminalToasts;
use salon_client::{ApiResult, ClientConfig, SalonContext};

use crate::cli::Cli;

#[tokio::main]
async fn main() -> ExitCode {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let ctx = match build_context(&cli) {
        Ok(ctx) => ctx,
        Err(e) => {
            eprintln!("salon: {e}");
            return ExitCode::from(2);
        }
    };
    let _toasts = TerminalToasts::attach(&ctx.toasts);

    match commands::run(&ctx, cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            debug!("command failed: {e:?}");
            ExitCode::FAILURE
        }
    }
}

fn build_context(cli: &Cli) -> ApiResult<SalonContext> {
    let mut config = match &cli.local {
        Some(host) => ClientConfig::local(host)?,
        None => ClientConfig::from_env()?,
    };
    if let Some(path) = &cli.session_file {
        config.session_file = path.clone();
    }
    debug!(session = %config.session_file.display(), "opening session store");

    let storage = Arc::new(FileStorage::open(&config.session_file)?);
    SalonContext::new(config, storage, Arc::new(SystemClock))
}
