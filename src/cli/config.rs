use std::path::Path;
use std::time::{Duration, SystemTime};

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use gp_moderation_policy::{ModerationCenter, ModerationConfig};
use serde_json::json;
use tokio::signal;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{info, warn};

use crate::cli::context::CliContext;

#[derive(Args, Clone, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Clone, Debug)]
pub enum ConfigAction {
    /// Show the effective configuration and where each value came from
    Show,

    /// Validate the configuration and summarize the moderation lists
    Validate,

    /// Reload the configuration whenever the file changes
    Watch {
        /// Polling interval, e.g. 5s or 1m
        #[arg(long, default_value = "5s", value_parser = humantime::parse_duration)]
        interval: Duration,
    },
}

pub async fn cmd_config(args: ConfigArgs, ctx: &CliContext) -> Result<()> {
    match args.action {
        ConfigAction::Show => {
            let snapshot = ctx.center().snapshot();
            let payload = json!({
                "path": ctx.config_path(),
                "found": ctx.config_found(),
                "config": &*snapshot,
            });
            ctx.output().emit(&payload, || describe_config(ctx, &snapshot))
        }
        ConfigAction::Validate => {
            let snapshot = ctx.center().snapshot();
            let payload = json!({
                "valid": true,
                "path": ctx.config_path(),
                "found": ctx.config_found(),
                "target_domain": snapshot.target_domain,
                "blocked": snapshot.blocked.len(),
                "warned": snapshot.warned.len(),
            });
            ctx.output().emit(&payload, || {
                format!(
                    "Configuration valid ({}): target={}, blocked={}, warned={}",
                    ctx.config_path().display(),
                    snapshot.target_domain,
                    snapshot.blocked.len(),
                    snapshot.warned.len()
                )
            })
        }
        ConfigAction::Watch { interval: period } => watch(ctx, period).await,
    }
}

async fn watch(ctx: &CliContext, period: Duration) -> Result<()> {
    let center = ctx.center();
    let path = ctx.config_path();
    let mut updates = center.subscribe();
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut last_modified = modified_at(path);

    println!(
        "Watching {} (rev {}), press Ctrl-C to stop",
        path.display(),
        center.snapshot().rev
    );

    loop {
        tokio::select! {
            _ = signal::ctrl_c() => {
                info!("stopping configuration watch");
                return Ok(());
            }
            _ = ticker.tick() => {
                let modified = modified_at(path);
                if modified == last_modified {
                    continue;
                }
                last_modified = modified;
                if let Err(err) = center.reload() {
                    warn!(path = %path.display(), "reload rejected: {err}");
                }
            }
            changed = updates.changed() => {
                changed.context("configuration channel closed")?;
                let snapshot = updates.borrow_and_update().clone();
                println!(
                    "rev {}: target={}, blocked={}, warned={}",
                    snapshot.rev,
                    snapshot.target_domain,
                    snapshot.blocked.len(),
                    snapshot.warned.len()
                );
            }
        }
    }
}

fn modified_at(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|meta| meta.modified()).ok()
}

fn describe_config(ctx: &CliContext, snapshot: &ModerationConfig) -> String {
    let source = |path: &str| {
        snapshot
            .source_of(path)
            .map(|source| format!("{source:?}"))
            .unwrap_or_else(|| "-".into())
    };

    let mut lines = vec![
        format!(
            "Configuration: {}{}",
            ctx.config_path().display(),
            if ctx.config_found() { "" } else { " (not found, defaults)" }
        ),
        format!("Revision: {}", snapshot.rev),
        String::new(),
        format!(
            "Target domain → {} [{}]",
            snapshot.target_domain,
            source("target_domain")
        ),
        format!(
            "Default reason → {} [{}]",
            snapshot.default_reason_url,
            source("default_reason_url")
        ),
        format!(
            "Restricted actions → {} [{}]",
            snapshot
                .restricted_actions
                .iter()
                .cloned()
                .collect::<Vec<_>>()
                .join(", "),
            source("restricted_actions")
        ),
    ];

    for (label, path, list) in [
        ("Blocked", "blocked", &snapshot.blocked),
        ("Warned", "warned", &snapshot.warned),
    ] {
        lines.push(format!("{label} ({}) [{}]", list.len(), source(path)));
        for entry in list.iter() {
            lines.push(format!(
                "  {} → {}",
                entry.username,
                entry.reason_url().unwrap_or("(default reason)")
            ));
        }
    }
    lines.join("\n")
}
