use clap::Subcommand;

use super::config::ConfigArgs;
use super::evaluate::{AuthorizeArgs, EvaluateArgs, NoticeArgs};

#[derive(Subcommand, Clone)]
pub enum Commands {
    /// Classify a contributor as allowed, warned or blocked
    Evaluate(EvaluateArgs),

    /// Check whether a contributor may perform an action
    Authorize(AuthorizeArgs),

    /// Preview the notice a host would display for a contributor
    Notice(NoticeArgs),

    /// Inspect, validate or watch the moderation configuration
    Config(ConfigArgs),
}
