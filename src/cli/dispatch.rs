use super::config::cmd_config;
use super::env::CliArgs;
use super::evaluate::{cmd_authorize, cmd_evaluate, cmd_notice};
use crate::cli::commands::Commands;
use crate::cli::context::CliContext;
use anyhow::Result;

pub async fn dispatch(cli: &CliArgs, ctx: &CliContext) -> Result<()> {
    match cli.command.clone() {
        Commands::Evaluate(args) => cmd_evaluate(args, ctx),
        Commands::Authorize(args) => cmd_authorize(args, ctx),
        Commands::Notice(args) => cmd_notice(args, ctx),
        Commands::Config(args) => cmd_config(args, ctx).await,
    }
}
