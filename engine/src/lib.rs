//! On-the-Fly (OTF) formula engine.
//!
//! Bracketed annotations such as `[ST-1]`, `[S:Broadsword+2 feint]` or
//! `[3d+1 cut]` are parsed into typed [`Action`]s, dispatched against an
//! optional [`Actor`] and a consume-once [`ModifierStack`], and resolved
//! into a concrete 3d6 roll outcome.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

pub mod action;
pub mod actor;
pub mod content;
pub mod dispatch;
pub mod error;
pub mod formula;
pub mod modifiers;
pub mod parser;
pub mod pdf;
pub mod resolve;
pub mod session;
pub mod settings;
pub mod tables;

pub use action::{Action, ActionKind, DerivedBase};
pub use actor::{Actor, AttackMatch, Character, MeleeDefense, SkillMatch};
pub use dispatch::{dispatch, DamageRequest, Dispatch, RollRequest, Visibility};
pub use error::{OtfError, Result};
pub use formula::{d6ify, DiceFormula};
pub use modifiers::{Directive, MemoryStore, ModifierEntry, ModifierSnapshot, ModifierStack, ModifierStore};
pub use parser::{link, parse, recover, Parsed};
pub use pdf::{BasicSetPdf, PdfReference};
pub use resolve::{classify, extra_hits, resolve, Outcome, RollOutcome, RollReport};
pub use session::{Activation, Host, RecordingHost, Session, TracingHost};
pub use settings::Settings;

enum Source {
    Seeded(ChaCha8Rng),
    Scripted { faces: Vec<u32>, next: usize },
}

/// Die roller. Seeded rollers are reproducible; scripted rollers replay a
/// fixed list of faces (cycling) so tests can pin exact totals.
pub struct Dice {
    source: Source,
}

impl Dice {
    pub fn from_seed(seed: u64) -> Self {
        Self { source: Source::Seeded(ChaCha8Rng::seed_from_u64(seed)) }
    }

    pub fn from_entropy() -> Self {
        Self::from_seed(rand::random())
    }

    pub fn from_scripted(faces: Vec<u32>) -> Self {
        Self { source: Source::Scripted { faces, next: 0 } }
    }

    /// Roll one die with `sides` faces.
    pub fn roll(&mut self, sides: u32) -> u32 {
        let sides = sides.max(1);
        match &mut self.source {
            Source::Seeded(rng) => rng.gen_range(1..=sides),
            Source::Scripted { faces, next } => {
                if faces.is_empty() {
                    return 1;
                }
                let face = faces[*next % faces.len()];
                *next += 1;
                face.clamp(1, sides)
            }
        }
    }

    /// Roll `count` dice and return the individual faces.
    pub fn roll_many(&mut self, count: u32, sides: u32) -> Vec<u32> {
        (0..count).map(|_| self.roll(sides)).collect()
    }

    pub fn three_d6(&mut self) -> i32 {
        self.roll_many(3, 6).iter().sum::<u32>() as i32
    }
}

impl std::fmt::Debug for Dice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.source {
            Source::Seeded(_) => f.write_str("Dice(seeded)"),
            Source::Scripted { faces, next } => write!(f, "Dice(scripted {faces:?} @{next})"),
        }
    }
}

/// Signed display of a modifier, `+0` for zero.
pub fn display_mod(value: i32) -> String {
    format!("{:+}", value)
}
