//! Structured notices for the host layer. Nothing here renders markup or
//! localizes text; the host turns a [`Notice`] into its own page or banner.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::model::{LinkSettings, Verdict};

pub const BLOCKED_ELEMENT_ID: &str = "show_banned_message";
pub const WARNED_ELEMENT_ID: &str = "show_warned_message";

/// Where the host intends to show a notice.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Surface {
    /// Whole-page response; only blocks replace the page.
    Page,
    /// Banner slot above the translation table.
    Inline,
}

impl FromStr for Surface {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "page" => Ok(Surface::Page),
            "inline" | "banner" => Ok(Surface::Inline),
            other => Err(format!("unknown surface: {other}")),
        }
    }
}

impl fmt::Display for Surface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Surface::Page => f.write_str("page"),
            Surface::Inline => f.write_str("inline"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    Blocked,
    Warned,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoticeLinks {
    pub profile: String,
    pub reason: String,
    pub guidelines: String,
    pub support: String,
    pub appeal: String,
    pub site: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub surface: Surface,
    pub status: u16,
    pub element_id: String,
    pub username: String,
    pub links: NoticeLinks,
}

/// Maps a verdict onto the notice a host should display, if any.
///
/// | verdict | page            | inline              |
/// |---------|-----------------|---------------------|
/// | blocked | 403 block page  | blocked banner      |
/// | warned  | none            | warning banner      |
/// | allowed | none            | none                |
pub fn plan_notice(
    verdict: &Verdict,
    username: &str,
    surface: Surface,
    links: &LinkSettings,
) -> Option<Notice> {
    let (kind, reason) = match verdict {
        Verdict::Allowed => return None,
        Verdict::Warned { .. } if surface == Surface::Page => return None,
        Verdict::Warned { reason_url } => (NoticeKind::Warned, reason_url),
        Verdict::Blocked { reason_url } => (NoticeKind::Blocked, reason_url),
    };

    let status = match (kind, surface) {
        (NoticeKind::Blocked, Surface::Page) => 403,
        _ => 200,
    };
    let element_id = match kind {
        NoticeKind::Blocked => BLOCKED_ELEMENT_ID,
        NoticeKind::Warned => WARNED_ELEMENT_ID,
    };

    Some(Notice {
        kind,
        surface,
        status,
        element_id: element_id.to_string(),
        username: username.to_string(),
        links: NoticeLinks {
            profile: profile_url(&links.profile_base, username),
            reason: reason.clone(),
            guidelines: links.guidelines.clone(),
            support: links.support.clone(),
            appeal: links.appeal.clone(),
            site: links.site.clone(),
        },
    })
}

/// `<base>/<percent-encoded username>/`
pub fn profile_url(base: &str, username: &str) -> String {
    let Ok(mut url) = Url::parse(base) else {
        return base.to_string();
    };
    if let Ok(mut segments) = url.path_segments_mut() {
        segments.pop_if_empty().push(username).push("");
    }
    url.to_string()
}
