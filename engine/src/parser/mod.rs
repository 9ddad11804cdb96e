//! OTF span recognition.
//!
//! The recognizers in [`RULES`] are tried in order and the first full match
//! wins. A leading `!` (blind roll) is stripped before every rule except
//! the modifier rule, which only ever sees unprefixed text.

mod render;

use std::sync::LazyLock;

use regex::{Captures, Regex};
use tracing::debug;

use crate::action::{Action, ActionKind, DerivedBase};
use crate::tables::{attribute_path, is_damage_type, mapped_stat};

pub use render::{link, recover};

/// Rendered text for one span plus the action it encodes, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parsed {
    pub text: String,
    pub action: Option<Action>,
}

impl Parsed {
    fn pass_through(text: &str) -> Self {
        Self { text: text.to_string(), action: None }
    }
}

struct Input<'a> {
    text: &'a str,
    blind: bool,
    default_desc: &'a str,
}

enum Display {
    Modifier { positive: bool },
    Link { text: String, prefix: &'static str, comment: String },
    Pdf { link: String },
}

struct Recognized {
    kind: ActionKind,
    display: Display,
}

impl Recognized {
    fn link(kind: ActionKind, text: &str) -> Self {
        Self {
            kind,
            display: Display::Link { text: text.to_string(), prefix: "", comment: String::new() },
        }
    }
}

/// One grammar recognizer. Each is total: match or no match, never an error.
pub struct Rule {
    pub name: &'static str,
    recognize: fn(&Input<'_>) -> Option<Recognized>,
}

pub static RULES: [Rule; 12] = [
    Rule { name: "modifier", recognize: modifier },
    Rule { name: "attribute", recognize: attribute },
    Rule { name: "targeted-attribute", recognize: targeted_attribute },
    Rule { name: "self-control", recognize: self_control },
    Rule { name: "dice", recognize: dice },
    Rule { name: "pdf", recognize: pdf },
    Rule { name: "derived", recognize: derived },
    Rule { name: "skill-spell", recognize: skill_or_spell },
    Rule { name: "attack", recognize: attack },
    Rule { name: "dodge", recognize: dodge },
    Rule { name: "mapped", recognize: mapped },
    Rule { name: "block-parry", recognize: block_or_parry },
];

/// Name of the rule that recognizes `text`, if any.
pub fn matching_rule(text: &str) -> Option<&'static str> {
    let input = prepare(text, "")?;
    RULES.iter().find(|r| (r.recognize)(&input).is_some()).map(|r| r.name)
}

/// Parse the content of one bracket pair (brackets already stripped).
pub fn parse(text: &str, default_desc: Option<&str>, color_modifiers: bool) -> Parsed {
    let Some(input) = prepare(text, default_desc.unwrap_or("")) else {
        return Parsed::pass_through(text);
    };
    for rule in &RULES {
        if let Some(recognized) = (rule.recognize)(&input) {
            debug!(rule = rule.name, text, "otf match");
            let action = Action::new(text, recognized.kind).blind(input.blind);
            let rendered = render::span(&action, &recognized.display, color_modifiers);
            return Parsed { text: rendered, action: Some(action) };
        }
    }
    Parsed::pass_through(text)
}

fn prepare<'a>(text: &'a str, default_desc: &'a str) -> Option<Input<'a>> {
    if text.chars().count() < 2 {
        return None;
    }
    let (body, blind) = match text.strip_prefix('!') {
        Some(rest) => (rest, true),
        None => (text, false),
    };
    Some(Input { text: body, blind, default_desc })
}

macro_rules! regex {
    ($name:ident, $re:expr) => {
        static $name: LazyLock<Regex> = LazyLock::new(|| Regex::new($re).expect("valid regex"));
    };
}

regex!(MODIFIER_RE, r"(?s)^([+-])(\d+)(.*)$");
regex!(ATTRIBUTE_RE, r"^([A-Za-z0-9_]+)([+-]\d+)?(.*)$");
regex!(TARGETED_RE, r"^([a-zA-Z]+)(\d+)(.*)$");
regex!(SELF_CONTROL_RE, r"^(\d+) *(.*)$");
regex!(DICE_RE, r"^(\d+)d6?([-+]\d+)?([xX*]\d+)? ?(\([.\d]+\))?(!)? ?(.*)$");
regex!(DERIVED_RE, r"^(SW|THR)([-+]\d+)?(!)?( .*)?$");
regex!(SKILL_PLAIN_RE, r#"(?s)^S:([^ "+-]+\*?)([-+]\d+)? ?(.*)$"#);
regex!(SKILL_QUOTED_RE, r#"(?s)^S:"([^"]+)"([-+]\d+)? ?(.*)$"#);
regex!(ATTACK_PLAIN_RE, r#"(?s)^A:([^ "+-]+\*?)([-+]\d+)? ?(.*)$"#);
regex!(ATTACK_QUOTED_RE, r#"(?s)^A:"([^"]+)"([-+]\d+)? ?(.*)$"#);

fn group<'t>(caps: &Captures<'t>, i: usize) -> &'t str {
    caps.get(i).map_or("", |m| m.as_str())
}

fn signed(caps: &Captures<'_>, i: usize) -> Option<Option<i32>> {
    match caps.get(i) {
        Some(m) => m.as_str().parse().ok().map(Some),
        None => Some(None),
    }
}

fn modifier(input: &Input<'_>) -> Option<Recognized> {
    if input.blind {
        return None;
    }
    let caps = MODIFIER_RE.captures(input.text)?;
    let value: i32 = format!("{}{}", &caps[1], &caps[2]).parse().ok()?;
    let mut desc = group(&caps, 3).trim().to_string();
    if desc.is_empty() {
        desc = input.default_desc.to_string();
    }
    Some(Recognized {
        kind: ActionKind::Modifier { modifier: value, desc },
        display: Display::Modifier { positive: &caps[1] == "+" },
    })
}

fn attribute(input: &Input<'_>) -> Option<Recognized> {
    let caps = ATTRIBUTE_RE.captures(input.text)?;
    let path = attribute_path(&caps[1])?;
    let kind = ActionKind::Attribute {
        attribute: caps[1].to_string(),
        path: path.to_string(),
        modifier: signed(&caps, 2)?,
        desc: group(&caps, 3).trim().to_string(),
        target: None,
    };
    Some(Recognized::link(kind, input.text))
}

fn targeted_attribute(input: &Input<'_>) -> Option<Recognized> {
    let caps = TARGETED_RE.captures(input.text)?;
    let path = attribute_path(&caps[1])?;
    let target: i32 = caps[2].parse().ok().filter(|&n| n != 0)?;
    let kind = ActionKind::Attribute {
        attribute: caps[1].to_string(),
        path: path.to_string(),
        modifier: None,
        desc: group(&caps, 3).trim().to_string(),
        target: Some(target),
    };
    Some(Recognized::link(kind, input.text))
}

fn self_control(input: &Input<'_>) -> Option<Recognized> {
    let rest = input.text.strip_prefix("CR:")?.trim();
    let caps = SELF_CONTROL_RE.captures(rest)?;
    let kind = ActionKind::SelfControl {
        target: caps[1].parse().ok()?,
        desc: group(&caps, 2).trim().to_string(),
    };
    Some(Recognized::link(kind, input.text))
}

fn dice(input: &Input<'_>) -> Option<Recognized> {
    let caps = DICE_RE.captures(input.text)?;
    let (count, adds, mult, divisor, bang) =
        (&caps[1], group(&caps, 2), group(&caps, 3), group(&caps, 4), group(&caps, 5));
    let trailing = group(&caps, 6).trim();

    let kind = if is_damage_type(trailing) {
        ActionKind::Damage {
            formula: format!("{count}d{adds}{mult}{divisor}{bang}"),
            damage_type: trailing.to_string(),
        }
    } else {
        // Armor divisors only mean something for damage; they are dropped here.
        let mult = match mult.strip_prefix(['x', 'X']) {
            Some(k) => format!("*{k}"),
            None => mult.to_string(),
        };
        ActionKind::Roll {
            formula: format!("{count}d{adds}{mult}{bang}"),
            desc: trailing.to_string(),
        }
    };
    Some(Recognized::link(kind, input.text))
}

fn pdf(input: &Input<'_>) -> Option<Recognized> {
    let link = input.text.strip_prefix("PDF:")?.trim_start_matches(' ');
    Some(Recognized {
        kind: ActionKind::Pdf { link: link.to_string() },
        display: Display::Pdf { link: link.to_string() },
    })
}

fn derived(input: &Input<'_>) -> Option<Recognized> {
    let caps = DERIVED_RE.captures(input.text)?;
    let base = if &caps[1] == "SW" { DerivedBase::Swing } else { DerivedBase::Thrust };
    let formula = format!("{}{}", group(&caps, 2), group(&caps, 3));
    let trailing = group(&caps, 4).trim().to_string();
    let kind = if is_damage_type(&trailing) {
        ActionKind::DerivedDamage { base, formula, damage_type: trailing }
    } else {
        ActionKind::DerivedRoll { base, formula, desc: trailing }
    };
    Some(Recognized::link(kind, input.text))
}

struct NamedReference {
    name: String,
    modifier: Option<i32>,
    desc: String,
    span_text: String,
    comment: String,
}

/// Shared grammar of `S:` and `A:`: unquoted names first, then quoted ones.
/// With a modifier the trailing text describes the modifier; without one it
/// is a comment shown after the span.
fn named_reference(text: &str, plain: &Regex, quoted: &Regex) -> Option<NamedReference> {
    let caps = plain.captures(text).or_else(|| quoted.captures(text))?;
    let name = caps[1].trim().to_string();
    if name.is_empty() {
        return None;
    }
    let trailing = group(&caps, 3).to_string();
    match caps.get(2) {
        Some(m) => Some(NamedReference {
            span_text: format!("{name}{} {trailing}", m.as_str()),
            modifier: Some(m.as_str().parse().ok()?),
            desc: trailing,
            comment: String::new(),
            name,
        }),
        None => Some(NamedReference {
            span_text: name.clone(),
            modifier: None,
            desc: String::new(),
            comment: trailing,
            name,
        }),
    }
}

fn skill_or_spell(input: &Input<'_>) -> Option<Recognized> {
    let r = named_reference(input.text, &SKILL_PLAIN_RE, &SKILL_QUOTED_RE)?;
    Some(Recognized {
        kind: ActionKind::SkillOrSpell { name: r.name, modifier: r.modifier, desc: r.desc },
        display: Display::Link { text: r.span_text, prefix: "<b>S:</b>", comment: r.comment },
    })
}

fn attack(input: &Input<'_>) -> Option<Recognized> {
    let r = named_reference(input.text, &ATTACK_PLAIN_RE, &ATTACK_QUOTED_RE)?;
    Some(Recognized {
        kind: ActionKind::Attack { name: r.name, modifier: r.modifier, desc: r.desc },
        display: Display::Link { text: r.span_text, prefix: "<b>A:</b>", comment: r.comment },
    })
}

fn dodge(input: &Input<'_>) -> Option<Recognized> {
    matches!(input.text, "Dodge" | "DODGE").then(|| Recognized::link(ActionKind::Dodge, input.text))
}

fn mapped(input: &Input<'_>) -> Option<Recognized> {
    let path = mapped_stat(input.text)?;
    let kind = ActionKind::Mapped { path: path.to_string(), desc: input.text.to_string() };
    Some(Recognized::link(kind, input.text))
}

fn block_or_parry(input: &Input<'_>) -> Option<Recognized> {
    let mut parts = input.text.split(':');
    let defense = parts.next().filter(|d| matches!(*d, "Block" | "BLOCK" | "Parry" | "PARRY"))?;
    let kind = ActionKind::BlockOrParry {
        desc: defense.to_string(),
        melee_filter: parts.next().filter(|m| !m.is_empty()).map(str::to_string),
        path: defense.to_lowercase(),
    };
    Some(Recognized::link(kind, input.text))
}
