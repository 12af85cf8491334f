use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::runtime::Runtime;
use tracing::info;
use tracing_subscriber::EnvFilter;

use slackhook::cli::{Cli, Commands};
use slackhook::config::Config;
use slackhook::{ChainedConnections, EnvConnections, SlackWebhookHook};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let rt = Runtime::new()?;
    rt.block_on(async {
        match cli.command {
            Commands::Send(args) => {
                let config = Config::load(cli.config.clone())?;
                // Environment URIs shadow connections from the config file.
                let connections = ChainedConnections::new()
                    .with(EnvConnections::new())
                    .with(config);

                let dry_run = args.dry_run;
                let hook = SlackWebhookHook::new(args.into_options(), Arc::new(connections))
                    .context("Preparing Slack webhook")?;

                if dry_run {
                    println!("{}", hook.build_slack_message()?);
                    return Ok(());
                }

                hook.execute().await.context("Sending Slack webhook")?;
                info!(connection = hook.http_conn_id().unwrap_or("-"), "Slack message sent");
            }
            Commands::Version { json } => {
                if json {
                    let info = serde_json::json!({
                        "version": env!("CARGO_PKG_VERSION"),
                        "commit": option_env!("GIT_SHA").unwrap_or("unknown"),
                        "build_date": option_env!("BUILD_DATE").unwrap_or("unknown"),
                    });
                    println!("{}", serde_json::to_string_pretty(&info)?);
                } else {
                    println!(
                        "slackhook {} (commit: {}, built: {})",
                        env!("CARGO_PKG_VERSION"),
                        option_env!("GIT_SHA").unwrap_or("unknown"),
                        option_env!("BUILD_DATE").unwrap_or("unknown"),
                    );
                }
            }
        }
        Ok::<(), anyhow::Error>(())
    })
}

/// Logs go to stderr so stdout stays clean for `--dry-run` output.
fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();
}
