//! pingpost binary: probe a host on a schedule and deliver each result to
//! Slack, chaining threaded deliveries through the returned handle.

use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use pingpost_slack::{deliver_artifact, RetryPolicy, SlackApiClient, SlackApiClientConfig};

mod cli_args;
mod probe;

use cli_args::Cli;

fn init_tracing() {
    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    run_loop(cli).await
}

async fn run_loop(cli: Cli) -> Result<()> {
    let client = SlackApiClient::new(SlackApiClientConfig {
        api_base: cli.api_base.clone(),
        bot_token: cli.bot_token.clone(),
        request_timeout_ms: cli.request_timeout_ms,
        retry: RetryPolicy {
            max_attempts: cli.retry_max_attempts,
            base_delay: Duration::from_millis(cli.retry_base_delay_ms),
        },
    })
    .context("failed to construct slack client")?;

    let interval = Duration::from_secs(cli.interval_seconds);
    let mut thread_ts: Option<String> = None;

    loop {
        let artifact = probe::run_probe(&cli.host, cli.probe_count).await?;
        match deliver_artifact(
            &client,
            &cli.channel,
            &artifact,
            cli.threaded,
            thread_ts.take(),
        )
        .await
        {
            Ok(next) => thread_ts = next,
            Err(error) => {
                // The handle was already dropped by take(); the next
                // successful delivery opens a fresh thread.
                tracing::error!(
                    transient = error.is_transport(),
                    "failed to deliver probe output to slack: {error}"
                );
            }
        }

        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("shutting down");
                return Ok(());
            }
        }
    }
}
