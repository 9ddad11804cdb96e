//! The modifier "bucket": an ordered, merge-by-description accumulator that
//! is drained by the next roll.

use std::sync::LazyLock;

use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::display_mod;
use crate::error::Result;

/// Description of the single measured-range entry.
pub const RANGE_DESC: &str = "for range";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModifierEntry {
    #[serde(rename = "mod")]
    pub modifier: i32,
    pub desc: String,
}

impl ModifierEntry {
    pub fn new(modifier: i32, desc: impl Into<String>) -> Self {
        Self { modifier, desc: desc.into() }
    }

    pub fn directive(&self) -> Directive {
        Directive::parse(&self.desc)
    }
}

impl std::fmt::Display for ModifierEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.desc.is_empty() {
            f.write_str(&display_mod(self.modifier))
        } else {
            write!(f, "{} : {}", display_mod(self.modifier), self.desc)
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModifierStack {
    entries: IndexMap<String, i32>,
    sum: i32,
}

impl ModifierStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge into an entry with the same description, or append.
    pub fn add(&mut self, modifier: i32, desc: impl Into<String>) {
        let desc = desc.into();
        debug!(modifier, desc = %desc, "bucket add");
        let entry = self.entries.entry(desc).or_insert(0);
        *entry = entry.saturating_add(modifier);
        self.recompute();
    }

    /// Return `external` followed by the stack contents and empty the stack.
    pub fn drain(&mut self, external: Vec<ModifierEntry>) -> Vec<ModifierEntry> {
        let mut consumed = external;
        consumed.extend(
            self.entries
                .drain(..)
                .map(|(desc, modifier)| ModifierEntry { modifier, desc }),
        );
        self.recompute();
        debug!(count = consumed.len(), "bucket drained");
        consumed
    }

    pub fn sum(&self) -> i32 {
        self.sum
    }

    pub fn display_sum(&self) -> String {
        display_mod(self.sum)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> Vec<ModifierEntry> {
        self.entries
            .iter()
            .map(|(desc, &modifier)| ModifierEntry { modifier, desc: desc.clone() })
            .collect()
    }

    /// Remove the entry at `index` (insertion order).
    pub fn remove(&mut self, index: usize) -> Option<ModifierEntry> {
        let removed = self
            .entries
            .shift_remove_index(index)
            .map(|(desc, modifier)| ModifierEntry { modifier, desc });
        self.recompute();
        removed
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.recompute();
    }

    /// Keep at most one measured-range modifier; zero removes it.
    pub fn set_range_modifier(&mut self, modifier: i32) {
        self.entries.shift_remove(RANGE_DESC);
        if modifier == 0 {
            self.recompute();
        } else {
            self.add(modifier, RANGE_DESC);
        }
    }

    /// Text form: `No modifiers`, or the total followed by one line per entry.
    pub fn summary(&self, prefix: &str) -> String {
        if self.entries.is_empty() {
            return format!("{prefix}No modifiers");
        }
        let mut out = format!("{prefix}total: {}", self.display_sum());
        for entry in self.entries() {
            out.push_str(&format!("\n  {} : {}", display_mod(entry.modifier), entry.desc));
        }
        out
    }

    pub fn snapshot(&self) -> ModifierSnapshot {
        ModifierSnapshot { modifiers: self.entries(), current_sum: self.sum }
    }

    /// Replace the contents with a stored snapshot; the stored sum is ignored.
    pub fn restore(&mut self, snapshot: ModifierSnapshot) {
        self.entries.clear();
        for entry in snapshot.modifiers {
            let merged = self.entries.entry(entry.desc).or_insert(0);
            *merged = merged.saturating_add(entry.modifier);
        }
        self.recompute();
    }

    fn recompute(&mut self) {
        self.sum = self.entries.values().fold(0, |acc, &m| acc.saturating_add(m));
    }
}

/// Persisted form of a stack.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModifierSnapshot {
    #[serde(rename = "modifierList", default)]
    pub modifiers: Vec<ModifierEntry>,
    #[serde(rename = "currentSum", default)]
    pub current_sum: i32,
}

/// Where a bucket survives between sessions.
pub trait ModifierStore {
    fn save(&mut self, snapshot: &ModifierSnapshot) -> Result<()>;
    fn load(&self) -> Result<Option<ModifierSnapshot>>;
}

#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    pub saved: Option<ModifierSnapshot>,
}

impl ModifierStore for MemoryStore {
    fn save(&mut self, snapshot: &ModifierSnapshot) -> Result<()> {
        self.saved = Some(snapshot.clone());
        Ok(())
    }

    fn load(&self) -> Result<Option<ModifierSnapshot>> {
        Ok(self.saved.clone())
    }
}

static COST_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\* ?Costs? (\d+) ?FP").expect("valid regex"));
static MAX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*Max: ?(\d+)").expect("valid regex"));

/// Side effects embedded in a modifier description: `*Cost 1FP` and `*Max:9`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Directive {
    pub fatigue_cost: Option<i32>,
    pub max_target: Option<i32>,
}

impl Directive {
    pub fn parse(desc: &str) -> Self {
        let capture = |re: &Regex| {
            re.captures(desc)
                .and_then(|c| c.get(1))
                .and_then(|m| m.as_str().parse().ok())
        };
        Self { fatigue_cost: capture(&COST_RE), max_target: capture(&MAX_RE) }
    }

    pub fn is_empty(&self) -> bool {
        self.fatigue_cost.is_none() && self.max_target.is_none()
    }
}
