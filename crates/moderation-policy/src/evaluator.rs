use std::sync::Arc;

use tracing::debug;

use crate::model::{ModerationConfig, ModerationContext, ModerationList, Verdict};
use crate::notice::{plan_notice, Notice, Surface};

/// Stateless policy over one published configuration snapshot.
///
/// Cloning is cheap; every clone shares the same immutable configuration.
#[derive(Clone, Debug)]
pub struct ModerationEvaluator {
    config: Arc<ModerationConfig>,
}

impl ModerationEvaluator {
    pub fn new(config: Arc<ModerationConfig>) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ModerationConfig {
        &self.config
    }

    /// Classifies the context. Off-domain and anonymous contexts are always allowed,
    /// and a blocked entry wins over a warned one.
    pub fn evaluate(&self, context: &ModerationContext) -> Verdict {
        if !context.is_authenticated || !self.config.is_target_host(context.host()) {
            return Verdict::Allowed;
        }

        let username = context.username();
        if let Some(reason_url) = self.lookup(&self.config.blocked, username) {
            debug!(target: "gp_moderation::evaluator", username, %reason_url, "contributor blocked");
            return Verdict::Blocked { reason_url };
        }
        if let Some(reason_url) = self.lookup(&self.config.warned, username) {
            debug!(target: "gp_moderation::evaluator", username, %reason_url, "contributor warned");
            return Verdict::Warned { reason_url };
        }
        Verdict::Allowed
    }

    /// Denies only restricted actions of blocked contributors; everything else passes.
    pub fn authorize_action(&self, context: &ModerationContext) -> bool {
        let action = context.action();
        if !self.config.is_restricted_action(action) {
            return true;
        }
        if self.evaluate(context).is_blocked() {
            debug!(
                target: "gp_moderation::evaluator",
                username = context.username(),
                action,
                "restricted action denied"
            );
            return false;
        }
        true
    }

    pub fn notice_for(&self, context: &ModerationContext, surface: Surface) -> Option<Notice> {
        let verdict = self.evaluate(context);
        plan_notice(&verdict, context.username(), surface, &self.config.links)
    }

    fn lookup(&self, list: &ModerationList, username: &str) -> Option<String> {
        list.get(username).map(|entry| {
            entry
                .reason_url()
                .unwrap_or(self.config.default_reason_url.as_str())
                .to_string()
        })
    }
}

impl From<ModerationConfig> for ModerationEvaluator {
    fn from(config: ModerationConfig) -> Self {
        Self::new(Arc::new(config))
    }
}
