pub mod api;
pub mod defaults;
pub mod errors;
pub mod evaluator;
pub mod loader;
pub mod model;
pub mod notice;
pub mod override_store;

pub use api::{ModerationCenter, SharedModerationCenter};
pub use defaults::default_config;
pub use errors::ConfigError;
pub use evaluator::ModerationEvaluator;
pub use loader::{
    load_config, load_config_with_options, parse_config_str, validate_config, LoadOptions,
};
pub use model::{
    ConfigSource, LinkSettings, ModerationConfig, ModerationContext, ModerationEntry,
    ModerationList, Verdict,
};
pub use notice::{plan_notice, Notice, NoticeKind, NoticeLinks, Surface};

#[cfg(test)]
mod tests;
