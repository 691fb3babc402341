use anyhow::Result;
use clap::{Args, ValueEnum};
use gp_moderation_policy::{ModerationContext, Notice, Surface, Verdict};
use serde::Serialize;

use crate::cli::context::CliContext;

#[derive(Args, Clone, Debug)]
pub struct ContextArgs {
    /// Request host; defaults to the configured target domain
    #[arg(long)]
    pub host: Option<String>,

    /// Username of the logged-in contributor
    #[arg(short, long)]
    pub user: Option<String>,

    /// Evaluate as a visitor without a session
    #[arg(long)]
    pub anonymous: bool,
}

impl ContextArgs {
    fn to_context(&self, ctx: &CliContext, action: Option<&str>) -> ModerationContext {
        let host = self
            .host
            .clone()
            .unwrap_or_else(|| ctx.evaluator().config().target_domain.clone());
        ModerationContext {
            host: Some(host),
            username: self.user.clone(),
            action: action.map(str::to_string),
            is_authenticated: !self.anonymous && self.user.is_some(),
        }
    }
}

#[derive(Args, Clone, Debug)]
pub struct EvaluateArgs {
    #[command(flatten)]
    pub context: ContextArgs,

    /// Action being attempted (informational for evaluate)
    #[arg(long)]
    pub action: Option<String>,
}

#[derive(Args, Clone, Debug)]
pub struct AuthorizeArgs {
    #[command(flatten)]
    pub context: ContextArgs,

    /// Action being attempted, e.g. edit, approve, import-waiting
    #[arg(long)]
    pub action: String,
}

#[derive(Args, Clone, Debug)]
pub struct NoticeArgs {
    #[command(flatten)]
    pub context: ContextArgs,

    /// Where the host would display the notice
    #[arg(long, value_enum, default_value = "page")]
    pub surface: SurfaceArg,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum SurfaceArg {
    Page,
    Inline,
}

impl From<SurfaceArg> for Surface {
    fn from(value: SurfaceArg) -> Self {
        match value {
            SurfaceArg::Page => Surface::Page,
            SurfaceArg::Inline => Surface::Inline,
        }
    }
}

#[derive(Serialize)]
struct VerdictReport<'a> {
    rev: u64,
    context: &'a ModerationContext,
    verdict: &'static str,
    reason_url: Option<&'a str>,
}

#[derive(Serialize)]
struct AuthorizeReport<'a> {
    rev: u64,
    context: &'a ModerationContext,
    verdict: &'static str,
    authorized: bool,
}

#[derive(Serialize)]
struct NoticeReport<'a> {
    rev: u64,
    context: &'a ModerationContext,
    notice: Option<&'a Notice>,
}

pub fn cmd_evaluate(args: EvaluateArgs, ctx: &CliContext) -> Result<()> {
    let evaluator = ctx.evaluator();
    let context = args.context.to_context(ctx, args.action.as_deref());
    let verdict = evaluator.evaluate(&context);

    let report = VerdictReport {
        rev: evaluator.config().rev,
        context: &context,
        verdict: verdict.as_str(),
        reason_url: verdict.reason_url(),
    };
    ctx.output().emit(&report, || describe_verdict(&context, &verdict))
}

pub fn cmd_authorize(args: AuthorizeArgs, ctx: &CliContext) -> Result<()> {
    let evaluator = ctx.evaluator();
    let context = args.context.to_context(ctx, Some(&args.action));
    let verdict = evaluator.evaluate(&context);
    let authorized = evaluator.authorize_action(&context);

    let report = AuthorizeReport {
        rev: evaluator.config().rev,
        context: &context,
        verdict: verdict.as_str(),
        authorized,
    };
    ctx.output().emit(&report, || {
        let who = display_user(&context);
        if authorized {
            format!("authorized: {who} may {} ({})", args.action, verdict.as_str())
        } else {
            format!("denied: {who} may not {} ({})", args.action, verdict.as_str())
        }
    })
}

pub fn cmd_notice(args: NoticeArgs, ctx: &CliContext) -> Result<()> {
    let evaluator = ctx.evaluator();
    let context = args.context.to_context(ctx, None);
    let notice = evaluator.notice_for(&context, args.surface.into());

    let report = NoticeReport {
        rev: evaluator.config().rev,
        context: &context,
        notice: notice.as_ref(),
    };
    ctx.output().emit(&report, || match &notice {
        None => format!("no notice for {}", display_user(&context)),
        Some(notice) => {
            let mut lines = vec![format!(
                "{:?} notice on {} surface (status {}, element #{})",
                notice.kind, notice.surface, notice.status, notice.element_id
            )];
            lines.push(format!("  profile:    {}", notice.links.profile));
            lines.push(format!("  reason:     {}", notice.links.reason));
            lines.push(format!("  guidelines: {}", notice.links.guidelines));
            lines.push(format!("  support:    {}", notice.links.support));
            lines.push(format!("  appeal:     {}", notice.links.appeal));
            lines.join("\n")
        }
    })
}

fn describe_verdict(context: &ModerationContext, verdict: &Verdict) -> String {
    let who = display_user(context);
    match verdict {
        Verdict::Allowed => format!("allowed: {who}"),
        Verdict::Warned { reason_url } => format!("warned: {who} (see {reason_url})"),
        Verdict::Blocked { reason_url } => format!("blocked: {who} (see {reason_url})"),
    }
}

fn display_user(context: &ModerationContext) -> String {
    let user = if context.is_authenticated {
        context.username()
    } else {
        "anonymous visitor"
    };
    format!("{user} on {}", context.host())
}
