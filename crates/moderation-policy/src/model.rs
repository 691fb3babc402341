use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single moderated contributor and the discussion that justifies the decision.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModerationEntry {
    pub username: String,
    pub reason_url: Option<String>,
    /// Operator-only remark; never surfaced to the contributor.
    pub note: Option<String>,
}

impl ModerationEntry {
    pub fn new(username: impl Into<String>, reason_url: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            reason_url: Some(reason_url.into()),
            note: None,
        }
    }

    /// Reason URL for this entry, ignoring blank values.
    pub fn reason_url(&self) -> Option<&str> {
        self.reason_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }
}

/// On-disk shape of a list entry: `alice: https://...`, `alice: { reason_url: ... }` or `alice:`.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntrySpec {
    Empty,
    Url(String),
    Detailed(DetailedEntry),
}

/// Long form of a list entry. Misspelled keys are rejected rather than ignored.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DetailedEntry {
    #[serde(default)]
    pub reason_url: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
}

/// Username keyed moderation table. Keys are matched case-sensitively.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    from = "BTreeMap<String, EntrySpec>",
    into = "BTreeMap<String, EntrySpec>"
)]
pub struct ModerationList {
    entries: BTreeMap<String, ModerationEntry>,
}

impl ModerationList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, entry: ModerationEntry) -> Option<ModerationEntry> {
        self.entries.insert(entry.username.clone(), entry)
    }

    pub fn get(&self, username: &str) -> Option<&ModerationEntry> {
        if username.is_empty() {
            return None;
        }
        self.entries.get(username)
    }

    pub fn contains(&self, username: &str) -> bool {
        self.get(username).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ModerationEntry> {
        self.entries.values()
    }
}

impl FromIterator<ModerationEntry> for ModerationList {
    fn from_iter<I: IntoIterator<Item = ModerationEntry>>(iter: I) -> Self {
        let mut list = ModerationList::new();
        for entry in iter {
            list.insert(entry);
        }
        list
    }
}

impl From<BTreeMap<String, EntrySpec>> for ModerationList {
    fn from(raw: BTreeMap<String, EntrySpec>) -> Self {
        raw.into_iter()
            .map(|(username, spec)| {
                let (reason_url, note) = match spec {
                    EntrySpec::Empty => (None, None),
                    EntrySpec::Url(url) => (Some(url), None),
                    EntrySpec::Detailed(DetailedEntry { reason_url, note }) => (reason_url, note),
                };
                ModerationEntry {
                    username,
                    reason_url,
                    note,
                }
            })
            .collect()
    }
}

impl From<ModerationList> for BTreeMap<String, EntrySpec> {
    fn from(list: ModerationList) -> Self {
        list.entries
            .into_iter()
            .map(|(username, entry)| {
                let spec = match (entry.reason_url, entry.note) {
                    (None, None) => EntrySpec::Empty,
                    (Some(url), None) => EntrySpec::Url(url),
                    (reason_url, note) => EntrySpec::Detailed(DetailedEntry { reason_url, note }),
                };
                (username, spec)
            })
            .collect()
    }
}

/// Links handed to the host layer when it displays a notice.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkSettings {
    pub profile_base: String,
    pub guidelines: String,
    pub support: String,
    pub appeal: String,
    pub site: String,
}

/// Immutable moderation configuration published to evaluators.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ModerationConfig {
    pub rev: u64,
    pub loaded_at: Option<DateTime<Utc>>,
    pub target_domain: String,
    pub default_reason_url: String,
    pub restricted_actions: BTreeSet<String>,
    pub blocked: ModerationList,
    pub warned: ModerationList,
    pub links: LinkSettings,
    #[serde(default)]
    pub provenance: HashMap<String, ConfigProvenance>,
}

impl ModerationConfig {
    /// Exact host comparison, ignoring surrounding whitespace and ASCII case.
    pub fn is_target_host(&self, host: &str) -> bool {
        let host = host.trim();
        !host.is_empty() && host.eq_ignore_ascii_case(self.target_domain.trim())
    }

    pub fn is_restricted_action(&self, action: &str) -> bool {
        self.restricted_actions.contains(action)
    }

    pub fn set_provenance(&mut self, path: &str, source: ConfigSource) {
        self.provenance.insert(
            path.to_string(),
            ConfigProvenance {
                path: path.to_string(),
                source,
            },
        );
    }

    pub fn source_of(&self, path: &str) -> Option<ConfigSource> {
        self.provenance.get(path).map(|entry| entry.source)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ConfigProvenance {
    pub path: String,
    pub source: ConfigSource,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum ConfigSource {
    Builtin,
    File,
    Env,
    Runtime,
}

/// Per-request input to the evaluator. Missing fields never match anything.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModerationContext {
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub is_authenticated: bool,
}

impl ModerationContext {
    /// Context for a logged-in principal on `host`.
    pub fn authenticated(host: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            host: Some(host.into()),
            username: Some(username.into()),
            action: None,
            is_authenticated: true,
        }
    }

    /// Context for a visitor without a session.
    pub fn anonymous(host: impl Into<String>) -> Self {
        Self {
            host: Some(host.into()),
            ..Self::default()
        }
    }

    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }

    pub fn host(&self) -> &str {
        self.host.as_deref().unwrap_or_default()
    }

    pub fn username(&self) -> &str {
        self.username.as_deref().unwrap_or_default()
    }

    pub fn action(&self) -> &str {
        self.action.as_deref().unwrap_or_default()
    }
}

/// Outcome of evaluating a context against the moderation lists.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum Verdict {
    Allowed,
    Warned { reason_url: String },
    Blocked { reason_url: String },
}

impl Verdict {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Verdict::Allowed)
    }

    pub fn is_warned(&self) -> bool {
        matches!(self, Verdict::Warned { .. })
    }

    pub fn is_blocked(&self) -> bool {
        matches!(self, Verdict::Blocked { .. })
    }

    pub fn reason_url(&self) -> Option<&str> {
        match self {
            Verdict::Allowed => None,
            Verdict::Warned { reason_url } | Verdict::Blocked { reason_url } => Some(reason_url),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Allowed => "allowed",
            Verdict::Warned { .. } => "warned",
            Verdict::Blocked { .. } => "blocked",
        }
    }
}
