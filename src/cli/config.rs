use anyhow::Result;
use clap::{Args, Subcommand};

use crate::cli::context::CliContext;
use crate::cli::runtime::config_candidates;

#[derive(Args, Clone, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Clone, Debug)]
pub enum ConfigAction {
    /// Show the effective configuration
    Show,

    /// List the files searched for configuration, in order
    Paths,
}

pub async fn cmd_config(args: ConfigArgs, ctx: &CliContext) -> Result<()> {
    match args.action {
        ConfigAction::Show => {
            match ctx.config_path() {
                Some(path) => println!("# Loaded from {}", path.display()),
                None => println!("# Built-in defaults"),
            }
            print!("{}", ctx.config().to_yaml()?);
        }
        ConfigAction::Paths => {
            for path in config_candidates(None) {
                let marker = if path.exists() { "*" } else { " " };
                println!("{marker} {}", path.display());
            }
        }
    }
    Ok(())
}
