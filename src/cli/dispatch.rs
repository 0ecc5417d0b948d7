use super::capture::cmd_capture;
use super::config::cmd_config;
use super::env::CliArgs;
use super::label::cmd_label;
use super::replay::cmd_replay;
use crate::cli::commands::Commands;
use crate::cli::context::CliContext;
use anyhow::Result;

pub async fn dispatch(cli: &CliArgs, ctx: &CliContext) -> Result<()> {
    match cli.command.clone() {
        Commands::Capture(args) => cmd_capture(args, ctx).await,
        Commands::Replay(args) => cmd_replay(args, ctx).await,
        Commands::Label(args) => cmd_label(args, ctx).await,
        Commands::Config(args) => cmd_config(args, ctx).await,
    }
}
