//! Content bundled into the binary: the bucket's modifier menus and a
//! sample character.

use indexmap::IndexMap;

use crate::actor::Character;
use crate::error::Result;
use crate::parser::{Parsed, parse};

pub fn builtin_menu_sources() -> IndexMap<&'static str, &'static str> {
    IndexMap::from([
        ("melee", include_str!("../content/menus/melee.otf")),
        ("ranged", include_str!("../content/menus/ranged.otf")),
        ("defense", include_str!("../content/menus/defense.otf")),
        ("other", include_str!("../content/menus/other.otf")),
        ("difficulty", include_str!("../content/menus/difficulty.otf")),
        ("lighting", include_str!("../content/menus/lighting.otf")),
    ])
}

pub fn builtin_characters() -> IndexMap<&'static str, &'static str> {
    IndexMap::from([(
        "sample_fighter",
        include_str!("../content/characters/sample_fighter.json"),
    )])
}

pub fn sample_character() -> Result<Character> {
    Ok(serde_json::from_str(include_str!("../content/characters/sample_fighter.json"))?)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuItem {
    /// Heading the item sits under, if any.
    pub section: Option<String>,
    /// The full OTF text, brackets included.
    pub otf: String,
}

impl MenuItem {
    pub fn parse(&self, color_modifiers: bool) -> Parsed {
        let inner = self
            .otf
            .strip_prefix('[')
            .and_then(|s| s.strip_suffix(']'))
            .unwrap_or(&self.otf);
        parse(inner, Some(""), color_modifiers)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Menu {
    pub id: &'static str,
    pub title: String,
    pub items: Vec<MenuItem>,
}

/// Menu files: `# Title`, then OTF lines, with `## Heading` starting a section.
fn parse_menu(id: &'static str, source: &str) -> Menu {
    let mut title = id.to_string();
    let mut section = None;
    let mut items = Vec::new();
    for line in source.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if let Some(heading) = line.strip_prefix("## ") {
            section = Some(heading.to_string());
        } else if let Some(t) = line.strip_prefix("# ") {
            title = t.to_string();
        } else {
            items.push(MenuItem { section: section.clone(), otf: line.to_string() });
        }
    }
    Menu { id, title, items }
}

pub fn builtin_menus() -> Vec<Menu> {
    builtin_menu_sources()
        .into_iter()
        .map(|(id, source)| parse_menu(id, source))
        .collect()
}
