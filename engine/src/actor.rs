//! The character accessor the dispatcher resolves targets against, and a
//! serde-loadable sheet implementing it.

use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkillMatch {
    pub name: String,
    pub level: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttackMatch {
    pub name: String,
    pub level: Option<i32>,
    pub mode: Option<String>,
    pub rof: Option<i32>,
    pub rcl: Option<i32>,
}

/// Defense values of one melee attack, in sheet order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeleeDefense {
    pub name: String,
    pub parry: Option<i32>,
    pub block: Option<i32>,
}

impl MeleeDefense {
    /// `path` is `parry` or `block`.
    pub fn value(&self, path: &str) -> Option<i32> {
        match path {
            "parry" => self.parry,
            "block" => self.block,
            _ => None,
        }
    }
}

pub trait Actor {
    fn name(&self) -> &str;
    /// Numeric value at a data path such as `attributes.ST.value`.
    fn attribute(&self, path: &str) -> Option<i32>;
    /// First skill, then spell, whose name matches the `*` wildcard pattern.
    fn find_skill_or_spell(&self, pattern: &str) -> Option<SkillMatch>;
    /// First melee, then ranged, attack matching `name (mode)`.
    fn find_attack(&self, pattern: &str) -> Option<AttackMatch>;
    fn current_dodge(&self) -> i32;
    fn swing(&self) -> &str;
    fn thrust(&self) -> &str;
    /// Derived senses and fright check (`vision`, `hearing`, ...).
    fn mapped(&self, path: &str) -> Option<i32>;
    /// Sheet-level parry/block not tied to a weapon.
    fn basic_defense(&self, _path: &str) -> Option<i32> {
        None
    }
    fn melee(&self) -> Vec<MeleeDefense>;
    fn spend_fatigue(&mut self, points: i32);
}

/// Leading integer of a sheet string (`"9F"` -> 9, `"No"` -> None).
pub fn leading_int(text: &str) -> Option<i32> {
    let t = text.trim_start();
    let (sign, digits) = match t.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, t.strip_prefix('+').unwrap_or(t)),
    };
    let end = digits.find(|c: char| !c.is_ascii_digit()).unwrap_or(digits.len());
    digits[..end].parse::<i32>().ok().map(|n| sign * n)
}

/// Turn a `*` wildcard name into an unanchored regex; everything else is literal.
pub fn name_pattern(pattern: &str) -> Option<Regex> {
    let source = pattern.split('*').map(regex::escape).collect::<Vec<_>>().join(".*");
    Regex::new(&source).ok()
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Leveled {
    pub name: String,
    pub level: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeleeAttack {
    pub name: String,
    pub mode: String,
    pub level: String,
    pub damage: String,
    pub parry: String,
    pub block: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RangedAttack {
    pub name: String,
    pub mode: String,
    pub level: String,
    pub damage: String,
    pub rof: String,
    pub rcl: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Encumbrance {
    pub level: u8,
    pub dodge: i32,
    #[serde(rename = "move")]
    pub move_: i32,
    pub current: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pool {
    pub value: i32,
    pub max: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Character {
    pub name: String,
    /// `ST`, `DX`, `IQ`, `HT`, `WILL`, `PER` scores.
    pub attributes: IndexMap<String, i32>,
    #[serde(rename = "FP")]
    pub fp: Pool,
    pub swing: String,
    pub thrust: String,
    pub skills: Vec<Leveled>,
    pub spells: Vec<Leveled>,
    pub melee: Vec<MeleeAttack>,
    pub ranged: Vec<RangedAttack>,
    pub encumbrance: Vec<Encumbrance>,
    /// `vision`, `hearing`, `touch`, `tastesmell`, `frightcheck`.
    pub senses: IndexMap<String, i32>,
    pub parry: Option<i32>,
    pub block: Option<i32>,
}

fn display_name(name: &str, mode: &str) -> String {
    if mode.is_empty() {
        name.to_string()
    } else {
        format!("{name} ({mode})")
    }
}

fn non_empty(s: &str) -> Option<String> {
    (!s.is_empty()).then(|| s.to_string())
}

impl Actor for Character {
    fn name(&self) -> &str {
        &self.name
    }

    fn attribute(&self, path: &str) -> Option<i32> {
        let mut parts = path.split('.');
        match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some("attributes"), Some(key), Some("value"), None) => self.attributes.get(key).copied(),
            (Some("FP"), Some("value"), None, _) => Some(self.fp.value),
            _ => None,
        }
    }

    fn find_skill_or_spell(&self, pattern: &str) -> Option<SkillMatch> {
        let re = name_pattern(pattern)?;
        let found = self
            .skills
            .iter()
            .find(|s| re.is_match(&s.name))
            .or_else(|| self.spells.iter().find(|s| re.is_match(&s.name)))
            .map(|s| SkillMatch { name: s.name.clone(), level: Some(s.level) });
        debug!(pattern, found = ?found.as_ref().map(|s| &s.name), "skill lookup");
        found
    }

    fn find_attack(&self, pattern: &str) -> Option<AttackMatch> {
        let re = name_pattern(pattern)?;
        if let Some(m) = self.melee.iter().find(|m| re.is_match(&display_name(&m.name, &m.mode))) {
            return Some(AttackMatch {
                name: m.name.clone(),
                level: leading_int(&m.level),
                mode: non_empty(&m.mode),
                rof: None,
                rcl: None,
            });
        }
        self.ranged
            .iter()
            .find(|r| re.is_match(&display_name(&r.name, &r.mode)))
            .map(|r| AttackMatch {
                name: r.name.clone(),
                level: leading_int(&r.level),
                mode: non_empty(&r.mode),
                rof: leading_int(&r.rof),
                rcl: leading_int(&r.rcl),
            })
    }

    fn current_dodge(&self) -> i32 {
        self.encumbrance.iter().find(|e| e.current).map_or(0, |e| e.dodge)
    }

    fn swing(&self) -> &str {
        &self.swing
    }

    fn thrust(&self) -> &str {
        &self.thrust
    }

    fn mapped(&self, path: &str) -> Option<i32> {
        self.senses.get(path).copied()
    }

    fn basic_defense(&self, path: &str) -> Option<i32> {
        match path {
            "parry" => self.parry,
            "block" => self.block,
            _ => None,
        }
    }

    fn melee(&self) -> Vec<MeleeDefense> {
        self.melee
            .iter()
            .map(|m| MeleeDefense {
                name: m.name.clone(),
                parry: leading_int(&m.parry),
                block: leading_int(&m.block),
            })
            .collect()
    }

    fn spend_fatigue(&mut self, points: i32) {
        self.fp.value = self.fp.value.saturating_sub(points);
        debug!(actor = %self.name, points, remaining = self.fp.value, "fatigue spent");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leading_int_mimics_sheet_strings() {
        assert_eq!(leading_int("9F"), Some(9));
        assert_eq!(leading_int(" 12"), Some(12));
        assert_eq!(leading_int("-2"), Some(-2));
        assert_eq!(leading_int("No"), None);
        assert_eq!(leading_int(""), None);
    }

    #[test]
    fn wildcard_escapes_everything_else() {
        let re = name_pattern("Fast-Draw (Knife)").unwrap();
        assert!(re.is_match("Fast-Draw (Knife)"));
        assert!(!re.is_match("Fast-Draw Knife"));

        let re = name_pattern("Broad*").unwrap();
        assert!(re.is_match("Broadsword"));
        assert!(re.is_match("Shortsword (Broadsword default)"));
    }

    #[test]
    fn attack_lookup_matches_on_mode() {
        let ch = Character {
            name: "Tester".into(),
            melee: vec![MeleeAttack {
                name: "Spear".into(),
                mode: "Thrust".into(),
                level: "13".into(),
                ..Default::default()
            }],
            ..Default::default()
        };
        let hit = ch.find_attack("Spear (Thrust)").unwrap();
        assert_eq!(hit.level, Some(13));
        assert_eq!(hit.mode.as_deref(), Some("Thrust"));
        assert!(ch.find_attack("Spear (Swing)").is_none());
    }
}
