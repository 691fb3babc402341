use std::collections::BTreeSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::defaults::default_config;
use crate::errors::ConfigError;
use crate::model::{ConfigSource, ModerationConfig, ModerationList};

pub const ENV_PREFIX: &str = "GP_MODERATION__";
pub const ENV_JSON: &str = "GP_MODERATION_OVERRIDE_JSON";

/// Sections applied as a whole instead of being flattened further.
/// Usernames are case-sensitive, so list keys must never be normalized.
const WHOLE_SECTIONS: [&str; 3] = ["blocked", "warned", "restricted_actions"];

const BUILTIN_PATHS: [&str; 10] = [
    "target_domain",
    "default_reason_url",
    "restricted_actions",
    "blocked",
    "warned",
    "links.profile_base",
    "links.guidelines",
    "links.support",
    "links.appeal",
    "links.site",
];

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub paths: Vec<PathBuf>,
    pub include_env: bool,
}

impl LoadOptions {
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            paths: vec![path.into()],
            include_env: true,
        }
    }

    /// File layers only; used where the process environment must not leak in.
    pub fn files_only(paths: impl IntoIterator<Item = PathBuf>) -> Self {
        Self {
            paths: paths.into_iter().collect(),
            include_env: false,
        }
    }
}

pub fn load_config(path: Option<&Path>) -> Result<ModerationConfig, ConfigError> {
    let mut options = LoadOptions::default();
    if let Some(p) = path {
        options.paths.push(p.to_path_buf());
    }
    options.include_env = true;
    load_config_with_options(&options)
}

pub fn load_config_with_options(options: &LoadOptions) -> Result<ModerationConfig, ConfigError> {
    let mut config = default_config();
    for path in BUILTIN_PATHS {
        config.set_provenance(path, ConfigSource::Builtin);
    }

    for path in &options.paths {
        if path.exists() {
            debug!(path = %path.display(), "applying moderation config file");
            let overlays = overlays_from_file(path)?;
            apply_overlays(&mut config, overlays)?;
        } else {
            debug!(path = %path.display(), "moderation config file missing; skipped");
        }
    }

    if options.include_env {
        let env_overlays = overlays_from_env()?;
        apply_overlays(&mut config, env_overlays)?;
    }

    validate_config(&config)?;
    config.loaded_at = Some(Utc::now());
    Ok(config)
}

/// Parses a standalone YAML or JSON document on top of the built-in defaults.
pub fn parse_config_str(raw: &str) -> Result<ModerationConfig, ConfigError> {
    let mut config = default_config();
    for path in BUILTIN_PATHS {
        config.set_provenance(path, ConfigSource::Builtin);
    }
    let overlays = overlays_from_str(raw, ConfigSource::File)?;
    apply_overlays(&mut config, overlays)?;
    validate_config(&config)?;
    Ok(config)
}

struct ConfigOverlay {
    path: String,
    value: Value,
    source: ConfigSource,
}

fn apply_overlays(
    config: &mut ModerationConfig,
    overlays: Vec<ConfigOverlay>,
) -> Result<(), ConfigError> {
    for overlay in overlays {
        apply_overlay(config, &overlay.path, overlay.value, overlay.source)?;
    }
    Ok(())
}

pub(crate) fn apply_overlay(
    config: &mut ModerationConfig,
    path: &str,
    value: Value,
    source: ConfigSource,
) -> Result<(), ConfigError> {
    match path {
        "target_domain" => config.target_domain = to_text(path, value)?,
        "default_reason_url" => config.default_reason_url = to_text(path, value)?,
        "restricted_actions" => config.restricted_actions = to_actions(path, value)?,
        "blocked" => config.blocked = to_list(path, value)?,
        "warned" => config.warned = to_list(path, value)?,
        "links.profile_base" => config.links.profile_base = to_text(path, value)?,
        "links.guidelines" => config.links.guidelines = to_text(path, value)?,
        "links.support" => config.links.support = to_text(path, value)?,
        "links.appeal" => config.links.appeal = to_text(path, value)?,
        "links.site" => config.links.site = to_text(path, value)?,
        path => return Err(ConfigError::UnsupportedPath(path.to_string())),
    }
    config.set_provenance(path, source);
    Ok(())
}

fn overlays_from_file(path: &Path) -> Result<Vec<ConfigOverlay>, ConfigError> {
    let content = fs::read_to_string(path)
        .map_err(|err| ConfigError::Io(format!("{}: {}", path.display(), err)))?;
    overlays_from_str(&content, ConfigSource::File)
}

fn overlays_from_str(raw: &str, source: ConfigSource) -> Result<Vec<ConfigOverlay>, ConfigError> {
    let yaml_value: serde_yaml::Value =
        serde_yaml::from_str(raw).map_err(|err| ConfigError::Parse(format!("{}", err)))?;
    let json_value =
        serde_json::to_value(yaml_value).map_err(|err| ConfigError::Parse(format!("{}", err)))?;
    match json_value {
        Value::Object(_) => Ok(flatten_value(json_value, None, source)),
        Value::Null => Ok(Vec::new()),
        other => Err(ConfigError::Parse(format!(
            "expected a mapping at the document root, got {other}"
        ))),
    }
}

fn overlays_from_env() -> Result<Vec<ConfigOverlay>, ConfigError> {
    let mut overlays = Vec::new();
    for (key, raw) in env::vars() {
        if let Some(stripped) = key.strip_prefix(ENV_PREFIX) {
            let path = stripped
                .split("__")
                .filter(|segment| !segment.is_empty())
                .map(|segment| segment.to_ascii_lowercase())
                .collect::<Vec<_>>()
                .join(".");
            if path.is_empty() {
                continue;
            }
            let value = parse_env_value(&raw);
            if value.is_null() {
                continue;
            }
            overlays.push(ConfigOverlay {
                path,
                value,
                source: ConfigSource::Env,
            });
        }
    }
    overlays.sort_by(|a, b| a.path.cmp(&b.path));

    if let Ok(raw_json) = env::var(ENV_JSON) {
        if !raw_json.trim().is_empty() {
            let json_value: Value = serde_json::from_str(&raw_json)
                .map_err(|err| ConfigError::Parse(format!("{ENV_JSON}: {err}")))?;
            overlays.extend(flatten_value(json_value, None, ConfigSource::Env));
        }
    }

    Ok(overlays)
}

fn parse_env_value(raw: &str) -> Value {
    let raw = raw.trim();
    if raw.is_empty() {
        return Value::Null;
    }
    if raw.starts_with('[') || raw.starts_with('{') {
        if let Ok(parsed) = serde_json::from_str::<Value>(raw) {
            return parsed;
        }
    }
    Value::String(raw.to_string())
}

fn flatten_value(value: Value, prefix: Option<String>, source: ConfigSource) -> Vec<ConfigOverlay> {
    let whole = prefix
        .as_deref()
        .map(|p| WHOLE_SECTIONS.contains(&p))
        .unwrap_or(false);
    match value {
        Value::Object(map) if !whole => {
            let mut result = Vec::new();
            for (key, value) in map {
                let key_segment = key.trim().to_ascii_lowercase();
                let next_prefix = match &prefix {
                    Some(prefix) if !prefix.is_empty() => format!("{}.{}", prefix, key_segment),
                    _ => key_segment,
                };
                result.extend(flatten_value(value, Some(next_prefix), source));
            }
            result
        }
        Value::Null => Vec::new(),
        other => match prefix {
            Some(path) => vec![ConfigOverlay {
                path,
                value: other,
                source,
            }],
            None => Vec::new(),
        },
    }
}

fn to_text(path: &str, value: Value) -> Result<String, ConfigError> {
    match value {
        Value::String(text) => Ok(text.trim().to_string()),
        other => Err(ConfigError::InvalidValue {
            path: path.to_string(),
            detail: format!("expected string, got {other}"),
        }),
    }
}

fn to_actions(path: &str, value: Value) -> Result<BTreeSet<String>, ConfigError> {
    let raw: Vec<String> = match value {
        Value::String(text) => text.split(',').map(|item| item.to_string()).collect(),
        Value::Array(items) => items
            .into_iter()
            .map(|item| to_text(path, item))
            .collect::<Result<_, _>>()?,
        other => {
            return Err(ConfigError::InvalidValue {
                path: path.to_string(),
                detail: format!("expected list of action names, got {other}"),
            })
        }
    };
    Ok(raw
        .into_iter()
        .map(|action| action.trim().to_string())
        .filter(|action| !action.is_empty())
        .collect())
}

fn to_list(path: &str, value: Value) -> Result<ModerationList, ConfigError> {
    serde_json::from_value(value).map_err(|err| ConfigError::InvalidValue {
        path: path.to_string(),
        detail: err.to_string(),
    })
}

/// Rejects configurations the evaluator could only apply with surprising results.
pub fn validate_config(config: &ModerationConfig) -> Result<(), ConfigError> {
    if config.target_domain.trim().is_empty() {
        return Err(ConfigError::Invalid("target_domain must not be empty".into()));
    }
    check_url("default_reason_url", &config.default_reason_url)?;
    check_url("links.profile_base", &config.links.profile_base)?;
    check_url("links.guidelines", &config.links.guidelines)?;
    check_url("links.support", &config.links.support)?;
    check_url("links.appeal", &config.links.appeal)?;
    check_url("links.site", &config.links.site)?;

    for (section, list) in [("blocked", &config.blocked), ("warned", &config.warned)] {
        for entry in list.iter() {
            if entry.username.trim().is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "{section} contains an empty username"
                )));
            }
            if let Some(url) = entry.reason_url() {
                check_url(&format!("{section}.{}", entry.username), url)?;
            }
        }
    }
    Ok(())
}

fn check_url(field: &str, value: &str) -> Result<(), ConfigError> {
    match Url::parse(value) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && url.has_host() => Ok(()),
        _ => Err(ConfigError::InvalidUrl {
            field: field.to_string(),
            value: value.to_string(),
        }),
    }
}
