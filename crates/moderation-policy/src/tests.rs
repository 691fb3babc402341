use crate::api::{ModerationCenter, SharedModerationCenter};
use crate::defaults::{default_config, DEFAULT_REASON_URL};
use crate::errors::ConfigError;
use crate::evaluator::ModerationEvaluator;
use crate::loader::{load_config, load_config_with_options, parse_config_str, LoadOptions};
use crate::model::{ConfigSource, ModerationContext, ModerationEntry, Verdict};
use crate::notice::{profile_url, Surface};
use crate::override_store::RuntimeOverrideStore;
use pretty_assertions::assert_eq;
use std::env;
use std::sync::{Mutex, OnceLock};

const HOST: &str = "translate.example.org";

fn sample_config() -> crate::model::ModerationConfig {
    let mut config = default_config();
    config.target_domain = HOST.into();
    config
        .blocked
        .insert(ModerationEntry::new("alice", "https://example.org/case1"));
    config
        .warned
        .insert(ModerationEntry::new("bob", "https://example.org/case2"));
    config
}

#[test]
fn default_config_restricts_write_actions_only() {
    let config = default_config();
    let actions: Vec<&str> = config.restricted_actions.iter().map(String::as_str).collect();
    assert_eq!(actions, vec!["approve", "edit", "import-waiting", "write"]);
    assert!(config.blocked.is_empty());
    assert!(config.warned.is_empty());
}

#[test]
fn host_match_ignores_case_and_padding_but_not_ports() {
    let config = sample_config();
    assert!(config.is_target_host("translate.example.org"));
    assert!(config.is_target_host(" Translate.Example.ORG "));
    assert!(!config.is_target_host("translate.example.org:8080"));
    assert!(!config.is_target_host("example.org"));
    assert!(!config.is_target_host(""));
}

#[test]
fn username_lookup_is_case_sensitive() {
    let evaluator = ModerationEvaluator::from(sample_config());
    let ctx = ModerationContext::authenticated(HOST, "Alice");
    assert_eq!(evaluator.evaluate(&ctx), Verdict::Allowed);
}

#[test]
fn missing_fields_fail_open() {
    let evaluator = ModerationEvaluator::from(sample_config());
    let ctx = ModerationContext {
        is_authenticated: true,
        ..ModerationContext::default()
    };
    assert_eq!(evaluator.evaluate(&ctx), Verdict::Allowed);
    assert!(evaluator.authorize_action(&ctx));

    let no_action = ModerationContext::authenticated(HOST, "alice");
    assert!(evaluator.authorize_action(&no_action));
}

#[test]
fn blank_reason_url_uses_default_advisory_link() {
    let mut config = sample_config();
    config.blocked.insert(ModerationEntry {
        username: "dave".into(),
        reason_url: Some("  ".into()),
        note: None,
    });
    let evaluator = ModerationEvaluator::from(config);
    let verdict = evaluator.evaluate(&ModerationContext::authenticated(HOST, "dave"));
    assert_eq!(
        verdict,
        Verdict::Blocked {
            reason_url: DEFAULT_REASON_URL.into()
        }
    );
}

#[test]
fn parse_accepts_short_detailed_and_empty_entries() {
    let config = parse_config_str(
        r#"
target_domain: translate.example.org
blocked:
  alice: https://example.org/case1
  Carol:
    reason_url: https://example.org/case3
    note: repeated machine translations
warned:
  bob:
"#,
    )
    .unwrap();

    assert_eq!(
        config.blocked.get("alice").and_then(|e| e.reason_url()),
        Some("https://example.org/case1")
    );
    let carol = config.blocked.get("Carol").expect("case preserved");
    assert_eq!(carol.note.as_deref(), Some("repeated machine translations"));
    assert!(config.blocked.get("carol").is_none());
    assert_eq!(config.warned.get("bob").and_then(|e| e.reason_url()), None);
    assert_eq!(config.source_of("blocked"), Some(ConfigSource::File));
    assert_eq!(config.source_of("links.appeal"), Some(ConfigSource::Builtin));
}

#[test]
fn parse_accepts_json_documents() {
    let config = parse_config_str(
        r#"{"target_domain": "translate.example.org", "restricted_actions": ["edit"]}"#,
    )
    .unwrap();
    assert_eq!(config.restricted_actions.len(), 1);
    assert!(config.is_restricted_action("edit"));
    assert!(!config.is_restricted_action("approve"));
}

#[test]
fn invalid_reason_url_is_rejected_at_load() {
    let err = parse_config_str("blocked:\n  alice: not a url\n").unwrap_err();
    match err {
        ConfigError::InvalidUrl { field, .. } => assert_eq!(field, "blocked.alice"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn misspelled_entry_keys_are_rejected() {
    let err = parse_config_str(
        "blocked:\n  alice:\n    reson_url: https://example.org/specific\n",
    )
    .unwrap_err();
    match err {
        ConfigError::InvalidValue { path, .. } => assert_eq!(path, "blocked"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn unknown_paths_are_rejected() {
    let err = parse_config_str("links:\n  homepage: https://example.org/\n").unwrap_err();
    assert!(matches!(err, ConfigError::UnsupportedPath(path) if path == "links.homepage"));
}

#[test]
fn empty_target_domain_is_rejected() {
    let err = parse_config_str("target_domain: \"  \"\n").unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)));
}

#[test]
fn file_layers_apply_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let base = dir.path().join("base.yaml");
    let local = dir.path().join("local.yaml");
    std::fs::write(
        &base,
        "target_domain: translate.example.org\nblocked:\n  alice: https://example.org/case1\n",
    )
    .unwrap();
    std::fs::write(&local, "blocked:\n  erin: https://example.org/case5\n").unwrap();

    let options = LoadOptions::files_only(vec![base, local, dir.path().join("missing.yaml")]);
    let config = load_config_with_options(&options).unwrap();

    assert_eq!(config.target_domain, HOST);
    assert!(config.blocked.contains("erin"));
    assert!(!config.blocked.contains("alice"));
    assert!(config.loaded_at.is_some());
}

#[test]
fn env_overrides_scalar_and_records_provenance() {
    let _guard = env_guard().lock().unwrap();
    let key = "GP_MODERATION__LINKS__APPEAL";
    env::set_var(key, "https://example.org/appeals/");
    let config = load_config(None);
    env::remove_var(key);

    let config = config.expect("load config");
    assert_eq!(config.links.appeal, "https://example.org/appeals/");
    assert_eq!(config.source_of("links.appeal"), Some(ConfigSource::Env));
}

#[test]
fn env_json_overlay_preserves_username_case() {
    let _guard = env_guard().lock().unwrap();
    env::set_var(
        "GP_MODERATION_OVERRIDE_JSON",
        r#"{"warned": {"MixedCase": "https://example.org/case9"}, "restricted_actions": "edit, approve"}"#,
    );
    let config = load_config(None);
    env::remove_var("GP_MODERATION_OVERRIDE_JSON");

    let config = config.expect("load config with json overlay");
    assert!(config.warned.contains("MixedCase"));
    assert!(!config.warned.contains("mixedcase"));
    assert_eq!(config.restricted_actions.len(), 2);
    assert_eq!(config.source_of("warned"), Some(ConfigSource::Env));
}

#[test]
fn replace_bumps_revision_and_swaps_whole_config() {
    let center = SharedModerationCenter::new(sample_config());
    let before = center.snapshot();

    let mut next = sample_config();
    next.blocked = Default::default();
    let rev = center.replace(next);

    assert_eq!(rev, before.rev + 1);
    assert!(before.blocked.contains("alice"));
    let evaluator = center.evaluator();
    assert_eq!(evaluator.config().rev, rev);
    assert_eq!(
        evaluator.evaluate(&ModerationContext::authenticated(HOST, "alice")),
        Verdict::Allowed
    );
}

#[test]
fn apply_override_validates_before_publishing() {
    let center = SharedModerationCenter::new(sample_config());
    let rev = center.snapshot().rev;

    let err = center
        .apply_override("default_reason_url", serde_json::json!("ftp://example.org/"))
        .unwrap_err();
    assert!(matches!(err, ConfigError::InvalidUrl { .. }));
    assert_eq!(center.snapshot().rev, rev);

    let next = center
        .apply_override("warned", serde_json::json!({"frank": "https://example.org/case6"}))
        .unwrap();
    let snapshot = center.snapshot();
    assert_eq!(snapshot.rev, next);
    assert!(snapshot.warned.contains("frank"));
    assert_eq!(snapshot.source_of("warned"), Some(ConfigSource::Runtime));
}

#[test]
fn failed_reload_keeps_current_config() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("moderation.yaml");
    std::fs::write(&path, "target_domain: translate.example.org\n").unwrap();

    let center = SharedModerationCenter::load(LoadOptions::files_only(vec![path.clone()])).unwrap();
    let rev = center.snapshot().rev;

    std::fs::write(&path, "target_domain: [not, a, string]\n").unwrap();
    assert!(center.reload().is_err());
    assert_eq!(center.snapshot().rev, rev);
    assert_eq!(center.snapshot().target_domain, HOST);

    std::fs::write(
        &path,
        "target_domain: translate.example.org\nblocked:\n  alice: https://example.org/case1\n",
    )
    .unwrap();
    let next = center.reload().unwrap();
    assert_eq!(next, rev + 1);
    assert!(center.snapshot().blocked.contains("alice"));
}

#[test]
fn reload_keeps_current_config_when_file_disappears() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("moderation.yaml");
    std::fs::write(
        &path,
        "target_domain: translate.example.org\nblocked:\n  alice: https://example.org/case1\n",
    )
    .unwrap();

    let center = SharedModerationCenter::load(LoadOptions::files_only(vec![path.clone()])).unwrap();
    let rev = center.snapshot().rev;

    std::fs::remove_file(&path).unwrap();
    let err = center.reload().unwrap_err();
    assert!(matches!(err, ConfigError::Io(_)));
    assert_eq!(center.snapshot().rev, rev);
    assert_eq!(
        center
            .evaluator()
            .evaluate(&ModerationContext::authenticated(HOST, "alice")),
        Verdict::Blocked {
            reason_url: "https://example.org/case1".into()
        }
    );

    std::fs::write(&path, "target_domain: translate.example.org\n").unwrap();
    assert_eq!(center.reload().unwrap(), rev + 1);
    assert!(center.snapshot().blocked.is_empty());
}

#[test]
fn runtime_override_survives_reload() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("moderation.yaml");
    std::fs::write(
        &path,
        "target_domain: translate.example.org\nwarned:\n  bob: https://example.org/case2\n",
    )
    .unwrap();

    let center = SharedModerationCenter::load(LoadOptions::files_only(vec![path.clone()])).unwrap();
    center
        .apply_override(
            "blocked",
            serde_json::json!({"mallory": "https://example.org/case7"}),
        )
        .unwrap();

    std::fs::write(
        &path,
        "target_domain: translate.example.org\nwarned:\n  erin: https://example.org/case5\n",
    )
    .unwrap();
    center.reload().unwrap();

    let snapshot = center.snapshot();
    assert!(snapshot.warned.contains("erin"));
    assert!(!snapshot.warned.contains("bob"));
    assert_eq!(snapshot.source_of("blocked"), Some(ConfigSource::Runtime));
    assert_eq!(
        center
            .evaluator()
            .evaluate(&ModerationContext::authenticated(HOST, "mallory")),
        Verdict::Blocked {
            reason_url: "https://example.org/case7".into()
        }
    );
}

#[test]
fn cleared_override_falls_back_to_loaded_base() {
    let center = SharedModerationCenter::new(sample_config());
    center
        .apply_override(
            "blocked",
            serde_json::json!({"mallory": "https://example.org/case7"}),
        )
        .unwrap();
    assert!(!center.snapshot().blocked.contains("alice"));

    let rev = center.clear_override("blocked").unwrap();
    let snapshot = center.snapshot();
    assert_eq!(snapshot.rev, rev);
    assert!(snapshot.blocked.contains("alice"));
    assert!(!snapshot.blocked.contains("mallory"));

    assert_eq!(center.clear_override("blocked").unwrap(), rev);
}

#[test]
fn override_store_replaces_paths_in_place() {
    let mut store = RuntimeOverrideStore::default();
    store.insert("links.appeal".into(), serde_json::json!("https://example.org/a"));
    store.insert("warned".into(), serde_json::json!({}));
    store.insert("links.appeal".into(), serde_json::json!("https://example.org/b"));

    let paths: Vec<&str> = store.entries().iter().map(|e| e.path.as_str()).collect();
    assert_eq!(paths, vec!["links.appeal", "warned"]);
    assert_eq!(store.entries()[0].value, serde_json::json!("https://example.org/b"));

    assert!(store.remove("warned"));
    assert!(!store.remove("warned"));
    assert!(store.remove("links.appeal"));
    assert!(store.is_empty());
}

#[tokio::test]
async fn subscribe_streams_revisions() {
    let center = SharedModerationCenter::new(sample_config());
    let mut rx = center.subscribe();
    let original_rev = rx.borrow().rev;

    center.replace(sample_config());
    rx.changed().await.unwrap();
    let snapshot = rx.borrow().clone();
    assert_ne!(snapshot.rev, original_rev);
}

#[test]
fn profile_url_encodes_username() {
    assert_eq!(
        profile_url("https://profiles.example.org/", "jane doe"),
        "https://profiles.example.org/jane%20doe/"
    );
    assert_eq!(
        profile_url("https://profiles.example.org", "a/b"),
        "https://profiles.example.org/a%2Fb/"
    );
}

#[test]
fn surface_parses_banner_alias() {
    assert_eq!("banner".parse::<Surface>().unwrap(), Surface::Inline);
    assert_eq!("PAGE".parse::<Surface>().unwrap(), Surface::Page);
    assert!("modal".parse::<Surface>().is_err());
}

fn env_guard() -> &'static Mutex<()> {
    static ENV_GUARD: OnceLock<Mutex<()>> = OnceLock::new();
    ENV_GUARD.get_or_init(|| Mutex::new(()))
}
