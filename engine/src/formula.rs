//! Dice formulas in the `NdS+A*K!` shorthand.

use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::Dice;
use crate::error::OtfError;

static FORMULA_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+)d(\d+)?((?:[-+]\d+)*)(?:[xX*](\d+))?(?:\(([.\d]+)\))?(!)?$")
        .expect("valid regex")
});
static BARE_D_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)d(\d*)").expect("valid regex"));
static ADD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[-+]\d+").expect("valid regex"));

/// Upper bound for dice count, sides and multiplier.
pub const MAX_DICE: u32 = 1000;

/// A parsed dice formula. Several additive terms are allowed so that a
/// derived value like `1d+2` can be extended with `+1`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiceFormula {
    pub count: u32,
    pub sides: u32,
    pub adds: i32,
    pub multiplier: Option<u32>,
    /// Armor divisor, carried for damage formulas only.
    pub armor_divisor: Option<String>,
    /// Trailing `!`: the total never drops below 1.
    pub min_one: bool,
}

/// Faces and total of one evaluated formula.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormulaRoll {
    pub faces: Vec<u32>,
    pub total: i32,
}

impl DiceFormula {
    /// Roll the dice; `(sum + adds) * multiplier + modifier`, clamped to 1
    /// when the formula carries the minimum marker. Arithmetic saturates.
    pub fn roll(&self, dice: &mut Dice, modifier: i32) -> FormulaRoll {
        let faces = dice.roll_many(self.count.min(MAX_DICE), self.sides.min(MAX_DICE));
        let sum = faces.iter().fold(0i32, |acc, &f| acc.saturating_add(f as i32));
        let multiplier = i32::try_from(self.multiplier.unwrap_or(1)).unwrap_or(i32::MAX);
        let mut total = sum
            .saturating_add(self.adds)
            .saturating_mul(multiplier)
            .saturating_add(modifier);
        if self.min_one && total < 1 {
            total = 1;
        }
        FormulaRoll { faces, total }
    }
}

impl FromStr for DiceFormula {
    type Err = OtfError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let compact: String = s.chars().filter(|c| !c.is_whitespace()).collect();
        let invalid = || OtfError::InvalidFormula(s.to_string());
        let caps = FORMULA_RE.captures(&compact).ok_or_else(invalid)?;

        let bounded = |text: &str| {
            text.parse::<u32>()
                .ok()
                .filter(|&n| n <= MAX_DICE)
                .ok_or_else(invalid)
        };
        let count = bounded(&caps[1])?;
        let sides = match caps.get(2) {
            Some(m) => bounded(m.as_str())?,
            None => 6,
        };
        let mut adds = 0i32;
        for term in ADD_RE.find_iter(caps.get(3).map_or("", |m| m.as_str())) {
            let term = term.as_str().parse::<i32>().map_err(|_| invalid())?;
            adds = adds.checked_add(term).ok_or_else(invalid)?;
        }
        let multiplier = match caps.get(4) {
            Some(m) => Some(bounded(m.as_str())?),
            None => None,
        };
        Ok(Self {
            count,
            sides,
            adds,
            multiplier,
            armor_divisor: caps.get(5).map(|m| m.as_str().to_string()),
            min_one: caps.get(6).is_some(),
        })
    }
}

impl std::fmt::Display for DiceFormula {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}d{}", self.count, self.sides)?;
        if self.adds != 0 {
            write!(f, "{:+}", self.adds)?;
        }
        if let Some(k) = self.multiplier {
            write!(f, "*{k}")?;
        }
        if let Some(div) = &self.armor_divisor {
            write!(f, "({div})")?;
        }
        if self.min_one {
            f.write_str("!")?;
        }
        Ok(())
    }
}

/// Make bare `Nd` explicit as `Nd6`.
pub fn d6ify(formula: &str) -> String {
    BARE_D_RE
        .replace_all(formula, |caps: &regex::Captures<'_>| {
            if caps[2].is_empty() {
                format!("{}d6", &caps[1])
            } else {
                caps[0].to_string()
            }
        })
        .into_owned()
}
