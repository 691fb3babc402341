use gp_moderation_policy::{
    default_config, ModerationConfig, ModerationContext, ModerationEntry, ModerationEvaluator,
    NoticeKind, Surface, Verdict,
};

const HOST: &str = "translate.example.org";

fn sample_config(blocked: Vec<ModerationEntry>, warned: Vec<ModerationEntry>) -> ModerationConfig {
    let mut config = default_config();
    config.target_domain = HOST.into();
    config.blocked = blocked.into_iter().collect();
    config.warned = warned.into_iter().collect();
    config
}

fn alice_blocked() -> ModerationEvaluator {
    ModerationEvaluator::from(sample_config(
        vec![ModerationEntry::new("alice", "https://example.org/case1")],
        vec![],
    ))
}

#[test]
fn blocked_user_editing_is_denied() {
    let evaluator = alice_blocked();
    let ctx = ModerationContext::authenticated(HOST, "alice").with_action("edit");

    assert_eq!(
        evaluator.evaluate(&ctx),
        Verdict::Blocked {
            reason_url: "https://example.org/case1".into()
        }
    );
    assert!(!evaluator.authorize_action(&ctx));
}

#[test]
fn blocked_user_viewing_is_authorized() {
    let evaluator = alice_blocked();
    let ctx = ModerationContext::authenticated(HOST, "alice").with_action("view");

    assert!(evaluator.evaluate(&ctx).is_blocked());
    assert!(evaluator.authorize_action(&ctx));
}

#[test]
fn unlisted_user_is_allowed() {
    let evaluator = alice_blocked();
    let ctx = ModerationContext::authenticated(HOST, "bob").with_action("edit");

    assert_eq!(evaluator.evaluate(&ctx), Verdict::Allowed);
    assert!(evaluator.authorize_action(&ctx));
}

#[test]
fn every_restricted_action_is_denied_for_blocked_users() {
    let evaluator = alice_blocked();
    for action in ["edit", "write", "approve", "import-waiting"] {
        let ctx = ModerationContext::authenticated(HOST, "alice").with_action(action);
        assert!(!evaluator.authorize_action(&ctx), "{action} should be denied");
    }
    for action in ["view", "Edit", "delete", ""] {
        let ctx = ModerationContext::authenticated(HOST, "alice").with_action(action);
        assert!(evaluator.authorize_action(&ctx), "{action:?} should pass");
    }
}

#[test]
fn block_takes_precedence_over_warning() {
    let evaluator = ModerationEvaluator::from(sample_config(
        vec![ModerationEntry::new("alice", "https://example.org/block")],
        vec![ModerationEntry::new("alice", "https://example.org/warn")],
    ));
    let ctx = ModerationContext::authenticated(HOST, "alice");

    assert_eq!(
        evaluator.evaluate(&ctx),
        Verdict::Blocked {
            reason_url: "https://example.org/block".into()
        }
    );
}

#[test]
fn warned_user_keeps_write_access() {
    let evaluator = ModerationEvaluator::from(sample_config(
        vec![],
        vec![ModerationEntry::new("bob", "https://example.org/case2")],
    ));
    let ctx = ModerationContext::authenticated(HOST, "bob").with_action("approve");

    assert_eq!(
        evaluator.evaluate(&ctx),
        Verdict::Warned {
            reason_url: "https://example.org/case2".into()
        }
    );
    assert!(evaluator.authorize_action(&ctx));
}

#[test]
fn other_hosts_are_never_moderated() {
    let evaluator = alice_blocked();
    for host in ["translate.example.com", "example.org", "", "translate.example.org.evil"] {
        let ctx = ModerationContext::authenticated(host, "alice").with_action("edit");
        assert_eq!(evaluator.evaluate(&ctx), Verdict::Allowed, "host {host:?}");
        assert!(evaluator.authorize_action(&ctx));
    }
}

#[test]
fn anonymous_sessions_are_never_moderated() {
    let evaluator = alice_blocked();
    let mut ctx = ModerationContext::anonymous(HOST).with_action("edit");
    ctx.username = Some("alice".into());

    assert_eq!(evaluator.evaluate(&ctx), Verdict::Allowed);
    assert!(evaluator.authorize_action(&ctx));
}

#[test]
fn blocked_page_view_gets_forbidden_notice() {
    let evaluator = alice_blocked();
    let ctx = ModerationContext::authenticated(HOST, "alice");

    let notice = evaluator
        .notice_for(&ctx, Surface::Page)
        .expect("blocked users get a page notice");
    assert_eq!(notice.kind, NoticeKind::Blocked);
    assert_eq!(notice.status, 403);
    assert_eq!(notice.links.reason, "https://example.org/case1");
    assert_eq!(notice.links.profile, "https://profiles.wordpress.org/alice/");

    let banner = evaluator.notice_for(&ctx, Surface::Inline).unwrap();
    assert_eq!(banner.status, 200);
    assert_eq!(banner.element_id, "show_banned_message");
}

#[test]
fn warned_users_only_get_inline_banner() {
    let evaluator = ModerationEvaluator::from(sample_config(
        vec![],
        vec![ModerationEntry::new("bob", "https://example.org/case2")],
    ));
    let ctx = ModerationContext::authenticated(HOST, "bob");

    assert!(evaluator.notice_for(&ctx, Surface::Page).is_none());
    let banner = evaluator.notice_for(&ctx, Surface::Inline).unwrap();
    assert_eq!(banner.kind, NoticeKind::Warned);
    assert_eq!(banner.element_id, "show_warned_message");
    assert_eq!(banner.links.reason, "https://example.org/case2");
}

#[test]
fn allowed_users_get_no_notice() {
    let evaluator = alice_blocked();
    let ctx = ModerationContext::authenticated(HOST, "carol");
    assert!(evaluator.notice_for(&ctx, Surface::Page).is_none());
    assert!(evaluator.notice_for(&ctx, Surface::Inline).is_none());
}

#[test]
fn verdict_serializes_with_tag() {
    let verdict = Verdict::Warned {
        reason_url: "https://example.org/case2".into(),
    };
    let json = serde_json::to_value(&verdict).unwrap();
    assert_eq!(json["verdict"], "warned");
    assert_eq!(json["reason_url"], "https://example.org/case2");
}
