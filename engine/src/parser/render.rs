use std::sync::LazyLock;

use regex::Regex;

use super::{Display, parse};
use crate::action::Action;
use crate::error::{OtfError, Result};

const BLIND_PREFIX: &str = "&lt;Blind Roll&gt; ";

static DATA_ACTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"data-action='([^']*)'").expect("valid regex"));

pub(super) fn span(action: &Action, display: &Display, color_modifiers: bool) -> String {
    let data = action
        .encode()
        .map(|encoded| format!(" data-action='{encoded}'"))
        .unwrap_or_default();
    match display {
        Display::Modifier { positive } => {
            let class = match (color_modifiers, positive) {
                (false, _) => "glinkmod",
                (true, true) => "glinkmodplus",
                (true, false) => "glinkmodminus",
            };
            format!("<span class='{class}'{data}>{}</span>", action.orig)
        }
        Display::Link { text, prefix, comment } => {
            let blind = if action.blind_roll { BLIND_PREFIX } else { "" };
            let mut out = format!("<span class='gurpslink'{data}>{blind}{prefix}{}</span>", text.trim());
            if !comment.is_empty() {
                out.push(' ');
                out.push_str(comment);
            }
            out
        }
        Display::Pdf { link } => format!("<span class='pdflink'{data}>{link}</span>"),
    }
}

/// Render every `[...]` span in free text. Spans that match no rule keep
/// their brackets; a `[` inside an open span restarts it.
pub fn link(text: &str, color_modifiers: bool) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(open) = rest.find('[') {
        let Some(close) = rest[open..].find(']').map(|i| i + open) else {
            break;
        };
        let start = rest[..close].rfind('[').unwrap_or(open);
        let inner = &rest[start + 1..close];
        out.push_str(&rest[..start]);
        let parsed = parse(inner, Some(""), color_modifiers);
        if parsed.action.is_some() {
            out.push_str(&parsed.text);
        } else {
            out.push('[');
            out.push_str(inner);
            out.push(']');
        }
        rest = &rest[close + 1..];
    }
    out.push_str(rest);
    out
}

/// Recover the action attached to a rendered span without re-parsing.
pub fn recover(rendered: &str) -> Result<Action> {
    let caps = DATA_ACTION_RE
        .captures(rendered)
        .ok_or_else(|| OtfError::Decode("no action attached".into()))?;
    Action::decode(&caps[1])
}
