//! Turns a parsed [`Action`] into a roll request or a side effect.
//!
//! Dispatch never draws dice. Target checks resolve their target number
//! here; any modifier typed into the span itself rides along as a one-shot
//! entry instead of being merged into the shared stack.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::action::{Action, ActionKind, DerivedBase};
use crate::actor::Actor;
use crate::error::{OtfError, Result};
use crate::formula::d6ify;
use crate::modifiers::{ModifierEntry, ModifierStack};
use crate::pdf::PdfReference;
use crate::settings::Settings;
use crate::tables::attribute_name;

/// Who gets to see a posted result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Visibility {
    #[default]
    Public,
    /// Only the roller.
    Whisper,
    /// Only the game master.
    Blind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RollRequest {
    pub formula: String,
    /// `None` for open rolls, where modifiers go onto the dice total.
    pub target: Option<i32>,
    pub label: String,
    /// Secondary line shown under the label (attack mode, attribute note).
    pub note: Option<String>,
    /// One-shot modifiers consumed ahead of the stack.
    pub extra_mods: Vec<ModifierEntry>,
    pub rof: Option<i32>,
    pub rcl: Option<i32>,
    pub visibility: Visibility,
}

impl RollRequest {
    fn open(formula: String, label: String) -> Self {
        Self {
            formula,
            target: None,
            label,
            note: None,
            extra_mods: Vec::new(),
            rof: None,
            rcl: None,
            visibility: Visibility::Public,
        }
    }

    /// A 3d6 check against `target`.
    pub fn check(target: i32, label: impl Into<String>) -> Self {
        Self { target: Some(target), ..Self::open("3d6".into(), label.into()) }
    }

    fn with_modifier(mut self, modifier: Option<i32>, desc: &str) -> Self {
        if let Some(m) = modifier {
            self.extra_mods.push(ModifierEntry::new(m, desc));
        }
        self
    }
}

/// Handed to the damage collaborator; never evaluated against a target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DamageRequest {
    pub actor: Option<String>,
    pub formula: String,
    pub damage_type: String,
    /// Display form of a derived formula, e.g. `SW+1`.
    pub label: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    Roll(RollRequest),
    Damage(DamageRequest),
    ModifierAdded { modifier: i32, desc: String },
    Reference(PdfReference),
    /// Target resolved to zero, negative or nothing: no roll happens.
    NoRoll,
}

fn require<'a>(actor: Option<&'a dyn Actor>) -> Result<&'a dyn Actor> {
    actor.ok_or(OtfError::NoActor)
}

fn derived_value(actor: &dyn Actor, base: DerivedBase) -> &str {
    match base {
        DerivedBase::Swing => actor.swing(),
        DerivedBase::Thrust => actor.thrust(),
    }
}

fn target_check(target: Option<i32>, request: impl FnOnce(i32) -> RollRequest) -> Dispatch {
    match target {
        Some(t) if t > 0 => Dispatch::Roll(request(t)),
        _ => Dispatch::NoRoll,
    }
}

/// Decide what `action` means for `actor`. Modifier actions are pushed onto
/// `stack` here; everything that rolls comes back as a [`RollRequest`].
pub fn dispatch(
    action: &Action,
    actor: Option<&dyn Actor>,
    stack: &mut ModifierStack,
    settings: &Settings,
) -> Result<Dispatch> {
    debug!(kind = action.kind.tag(), orig = %action.orig, "dispatch");
    let visibility = if action.blind_roll { Visibility::Blind } else { Visibility::Public };

    let dispatched = match &action.kind {
        ActionKind::Modifier { modifier, desc } => {
            stack.add(*modifier, desc.as_str());
            Dispatch::ModifierAdded { modifier: *modifier, desc: desc.clone() }
        }
        ActionKind::Pdf { link } => {
            Dispatch::Reference(PdfReference::resolve(link, settings.basic_set_pdf)?)
        }
        ActionKind::Attribute { path, modifier, desc, target, .. } => {
            let actor = require(actor)?;
            let target = (*target).or_else(|| actor.attribute(path));
            target_check(target, |t| {
                let mut request = RollRequest::check(t, format!("Roll vs {}", attribute_name(path)))
                    .with_modifier(*modifier, desc);
                if modifier.is_none() && !desc.is_empty() {
                    request.note = Some(desc.clone());
                }
                request
            })
        }
        ActionKind::SelfControl { target, desc } => {
            target_check(Some(*target), |t| RollRequest::check(t, format!("Self Control {desc}")))
        }
        ActionKind::Roll { formula, desc } => {
            let label = format!("Rolling {formula} {desc}").trim_end().to_string();
            Dispatch::Roll(RollRequest::open(d6ify(formula), label))
        }
        ActionKind::Damage { formula, damage_type } => Dispatch::Damage(DamageRequest {
            actor: actor.map(|a| a.name().to_string()),
            formula: formula.clone(),
            damage_type: damage_type.clone(),
            label: None,
        }),
        ActionKind::DerivedDamage { base, formula, damage_type } => {
            let actor = require(actor)?;
            Dispatch::Damage(DamageRequest {
                actor: Some(actor.name().to_string()),
                formula: format!("{}{formula}", derived_value(actor, *base)),
                damage_type: damage_type.clone(),
                label: Some(format!("{base}{formula}")),
            })
        }
        ActionKind::DerivedRoll { base, formula, desc } => {
            let actor = require(actor)?;
            let label = format!("Rolling {base}{formula} {desc}").trim_end().to_string();
            let resolved = d6ify(&format!("{}{formula}", derived_value(actor, *base)));
            Dispatch::Roll(RollRequest::open(resolved, label))
        }
        ActionKind::SkillOrSpell { name, modifier, desc } => {
            let actor = require(actor)?;
            let skill = actor.find_skill_or_spell(name).ok_or_else(|| OtfError::SkillNotFound {
                name: name.clone(),
                actor: actor.name().to_string(),
            })?;
            target_check(skill.level, |t| {
                RollRequest::check(t, skill.name.clone()).with_modifier(*modifier, desc)
            })
        }
        ActionKind::Attack { name, modifier, desc } => {
            let actor = require(actor)?;
            let attack = actor.find_attack(name).ok_or_else(|| OtfError::AttackNotFound {
                name: name.clone(),
                actor: actor.name().to_string(),
            })?;
            target_check(attack.level, |t| RollRequest {
                note: attack.mode.clone(),
                rof: attack.rof,
                rcl: attack.rcl,
                ..RollRequest::check(t, attack.name.clone()).with_modifier(*modifier, desc)
            })
        }
        ActionKind::Dodge => {
            let actor = require(actor)?;
            target_check(Some(actor.current_dodge()), |t| RollRequest::check(t, "Dodge"))
        }
        ActionKind::Mapped { path, desc } => {
            let actor = require(actor)?;
            target_check(actor.mapped(path), |t| RollRequest::check(t, desc.clone()))
        }
        ActionKind::BlockOrParry { desc, melee_filter, path } => {
            let actor = require(actor)?;
            block_or_parry(actor, desc, melee_filter.as_deref(), path)?
        }
    };

    let dispatched = match dispatched {
        Dispatch::Roll(request) => Dispatch::Roll(RollRequest { visibility, ..request }),
        other => other,
    };
    if dispatched == Dispatch::NoRoll {
        debug!(orig = %action.orig, "target not positive, no roll");
    }
    Ok(dispatched)
}

/// Sheet-level defense first (only when unscoped), then the first melee
/// entry with a value whose name starts with the filter.
fn block_or_parry(
    actor: &dyn Actor,
    desc: &str,
    melee_filter: Option<&str>,
    path: &str,
) -> Result<Dispatch> {
    let mut label = desc.to_string();
    let mut target = if melee_filter.is_none() { actor.basic_defense(path) } else { None };
    if !target.is_some_and(|t| t > 0) {
        let found = actor.melee().into_iter().find(|m| {
            m.value(path).is_some() && melee_filter.is_none_or(|f| m.name.starts_with(f))
        });
        if let Some(m) = found {
            target = m.value(path);
            label = format!("{desc} for {}", m.name);
        }
    }
    match target {
        Some(t) if t != 0 => Ok(target_check(Some(t), |t| RollRequest::check(t, label))),
        _ => {
            warn!(defense = desc, filter = ?melee_filter, "no defense value");
            Err(OtfError::NoDefense { defense: desc.to_string() })
        }
    }
}
