use std::collections::BTreeSet;

use crate::model::{LinkSettings, ModerationConfig, ModerationList};

pub const DEFAULT_TARGET_DOMAIN: &str = "translate.wordpress.org";
pub const DEFAULT_REASON_URL: &str = "https://make.wordpress.org/polyglots/";
pub const DEFAULT_RESTRICTED_ACTIONS: [&str; 4] = ["edit", "write", "approve", "import-waiting"];

pub fn default_links() -> LinkSettings {
    LinkSettings {
        profile_base: "https://profiles.wordpress.org/".into(),
        guidelines: "https://make.wordpress.org/polyglots/handbook/translating/expectations/"
            .into(),
        support: "https://wordpress.slack.com/archives/C02RP50LK".into(),
        appeal: "https://make.wordpress.org/polyglots/".into(),
        site: "https://translate.wordpress.org/".into(),
    }
}

/// Built-in configuration: production host and links, empty moderation lists.
pub fn default_config() -> ModerationConfig {
    ModerationConfig {
        rev: 1,
        loaded_at: None,
        target_domain: DEFAULT_TARGET_DOMAIN.into(),
        default_reason_url: DEFAULT_REASON_URL.into(),
        restricted_actions: DEFAULT_RESTRICTED_ACTIONS
            .iter()
            .map(|action| action.to_string())
            .collect::<BTreeSet<_>>(),
        blocked: ModerationList::new(),
        warned: ModerationList::new(),
        links: default_links(),
        provenance: Default::default(),
    }
}
