//! Executes a [`RollRequest`]: drains the stack, rolls, classifies and
//! renders the result.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::Dice;
use crate::dispatch::{RollRequest, Visibility};
use crate::error::Result;
use crate::formula::DiceFormula;
use crate::modifiers::{ModifierEntry, ModifierStack};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    CriticalSuccess,
    Success,
    Failure,
    CriticalFailure,
}

impl Outcome {
    pub fn label(self) -> &'static str {
        match self {
            Outcome::CriticalSuccess => "Critical Success!",
            Outcome::Success => "Success!",
            Outcome::Failure => "Failure.",
            Outcome::CriticalFailure => "Critical Failure!",
        }
    }

    pub fn is_success(self) -> bool {
        matches!(self, Outcome::CriticalSuccess | Outcome::Success)
    }
}

/// Classify a 3d6 roll against the final (modified, capped) target.
/// Critical success is checked before critical failure.
pub fn classify(raw: i32, final_target: i32) -> Outcome {
    let critical_success =
        raw <= 4 || (raw == 5 && final_target >= 15) || (raw == 6 && final_target >= 16);
    let critical_failure = raw >= 18
        || (raw == 17 && final_target <= 15)
        || (raw.saturating_sub(final_target) >= 10 && final_target > 0);
    if critical_success {
        Outcome::CriticalSuccess
    } else if critical_failure {
        Outcome::CriticalFailure
    } else if final_target >= raw {
        Outcome::Success
    } else {
        Outcome::Failure
    }
}

/// Hits from rapid fire: one per full recoil step of margin plus one,
/// capped at the rate of fire. Only reported when more than one.
pub fn extra_hits(margin: i32, rcl: Option<i32>, rof: Option<i32>) -> Option<i32> {
    if margin <= 0 {
        return None;
    }
    let rcl = rcl.filter(|&r| r > 0)?;
    let mut hits = (margin / rcl).saturating_add(1);
    if let Some(rof) = rof.filter(|&r| r > 0) {
        hits = hits.min(rof);
    }
    (hits > 1).then_some(hits)
}

pub fn margin_text(margin: i32) -> String {
    match margin {
        0 => "just made it".to_string(),
        m if m > 0 => format!("made it by {m}"),
        m => format!("missed it by {}", m.unsigned_abs()),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollOutcome {
    pub total: i32,
    pub target: Option<i32>,
    pub margin: Option<i32>,
    pub is_critical_success: bool,
    pub is_critical_failure: bool,
    pub extra_hits: Option<i32>,
    /// `None` for open rolls.
    pub result: Option<Outcome>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RollReport {
    pub label: String,
    pub outcome: RollOutcome,
    pub faces: Vec<u32>,
    /// Everything consumed by this roll, one-shot entries first.
    pub modifiers: Vec<ModifierEntry>,
    pub text: String,
    pub visibility: Visibility,
    /// Fatigue owed by `*Cost N FP` entries; the caller charges the actor.
    pub fatigue_cost: i32,
}

/// Roll `request`, consuming `stack` exactly once. The formula is validated
/// before anything is drained.
pub fn resolve(request: &RollRequest, stack: &mut ModifierStack, dice: &mut Dice) -> Result<RollReport> {
    let formula: DiceFormula = request.formula.parse()?;
    let modifiers = stack.drain(request.extra_mods.clone());

    let modifier = modifiers.iter().fold(0i32, |acc, m| acc.saturating_add(m.modifier));
    let directives: Vec<_> = modifiers.iter().map(ModifierEntry::directive).collect();
    for (entry, directive) in modifiers.iter().zip(&directives) {
        if !directive.is_empty() {
            debug!(desc = %entry.desc, ?directive, "modifier directive");
        }
    }
    let cap = directives.iter().filter_map(|d| d.max_target).min();
    let fatigue_cost = directives
        .iter()
        .filter_map(|d| d.fatigue_cost)
        .fold(0i32, i32::saturating_add);

    let mod_lines: Vec<String> = modifiers.iter().map(|m| format!("  {m}")).collect();

    let (outcome, faces, text) = match request.target {
        Some(target) if target > 0 => {
            let roll = formula.roll(dice, 0);
            let raw = roll.total;
            let mut final_target = target.saturating_add(modifier);
            if let Some(cap) = cap {
                final_target = final_target.min(cap);
            }
            let result = classify(raw, final_target);
            let margin = final_target.saturating_sub(raw);
            let hits = extra_hits(margin, request.rcl, request.rof);

            let mut lines = vec![format!("{} ({target})", request.label)];
            lines.extend(request.note.iter().map(|n| format!("({n})")));
            if !mod_lines.is_empty() {
                lines.extend(mod_lines);
                lines.push(format!("New Target: ({final_target})"));
            }
            lines.push(format!("Rolled {raw} -> {} {}", result.label(), margin_text(margin)));
            if let Some(h) = hits {
                lines.push(format!("Total possible hits due to RoF/Rcl: {h}"));
            }

            let outcome = RollOutcome {
                total: raw,
                target: Some(final_target),
                margin: Some(margin),
                is_critical_success: result == Outcome::CriticalSuccess,
                is_critical_failure: result == Outcome::CriticalFailure,
                extra_hits: hits,
                result: Some(result),
            };
            (outcome, roll.faces, lines.join("\n"))
        }
        _ => {
            let roll = formula.roll(dice, modifier);
            let label = if roll.total == 1 {
                request.label.replace("points", "point")
            } else {
                request.label.clone()
            };
            let mut lines = vec![label];
            lines.extend(mod_lines);
            lines.push(format!("Rolled {} {:?}", roll.total, roll.faces));

            let outcome = RollOutcome {
                total: roll.total,
                target: None,
                margin: None,
                is_critical_success: false,
                is_critical_failure: false,
                extra_hits: None,
                result: None,
            };
            (outcome, roll.faces, lines.join("\n"))
        }
    };

    info!(
        label = %request.label,
        total = outcome.total,
        target = ?outcome.target,
        result = ?outcome.result,
        "roll resolved"
    );
    Ok(RollReport {
        label: request.label.clone(),
        outcome,
        faces,
        modifiers,
        text,
        visibility: request.visibility,
        fatigue_cost,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crit_success_wins_over_margin_failure() {
        assert_eq!(classify(4, -20), Outcome::CriticalSuccess);
        assert_eq!(classify(5, 15), Outcome::CriticalSuccess);
        assert_eq!(classify(5, 14), Outcome::Success);
        assert_eq!(classify(6, 16), Outcome::CriticalSuccess);
    }

    #[test]
    fn seventeen_fails_critically_below_sixteen() {
        assert_eq!(classify(17, 10), Outcome::CriticalFailure);
        assert_eq!(classify(17, 16), Outcome::Failure);
        assert_eq!(classify(16, 6), Outcome::CriticalFailure);
        assert_eq!(classify(18, 30), Outcome::CriticalFailure);
        assert_eq!(classify(12, i32::MIN), Outcome::Failure);
    }

    #[test]
    fn extra_hits_respect_recoil_and_rate_of_fire() {
        assert_eq!(extra_hits(4, Some(2), Some(3)), Some(3));
        assert_eq!(extra_hits(4, Some(2), None), Some(3));
        assert_eq!(extra_hits(7, Some(2), Some(8)), Some(4));
        assert_eq!(extra_hits(1, Some(2), Some(3)), None);
        assert_eq!(extra_hits(5, None, Some(3)), None);
        assert_eq!(extra_hits(0, Some(1), None), None);
        assert_eq!(extra_hits(i32::MAX, Some(1), None), Some(i32::MAX));
    }

    #[test]
    fn margin_text_reads_naturally() {
        assert_eq!(margin_text(0), "just made it");
        assert_eq!(margin_text(3), "made it by 3");
        assert_eq!(margin_text(-2), "missed it by 2");
        assert_eq!(margin_text(i32::MIN), "missed it by 2147483648");
    }
}
