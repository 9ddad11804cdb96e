//! The typed result of parsing one OTF span.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

use crate::error::{OtfError, Result};

/// One parsed span. `orig` is the untouched span text (including a leading
/// `!`); actions are never mutated after parsing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    pub orig: String,
    #[serde(rename = "blindroll", default, skip_serializing_if = "is_false")]
    pub blind_roll: bool,
    #[serde(flatten)]
    pub kind: ActionKind,
}

fn is_false(b: &bool) -> bool {
    !*b
}

/// Which of the actor's derived damage values a formula is based on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DerivedBase {
    #[serde(rename = "SW")]
    Swing,
    #[serde(rename = "THR")]
    Thrust,
}

impl DerivedBase {
    pub fn as_str(self) -> &'static str {
        match self {
            DerivedBase::Swing => "SW",
            DerivedBase::Thrust => "THR",
        }
    }
}

impl std::fmt::Display for DerivedBase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ActionKind {
    #[serde(rename = "modifier")]
    Modifier {
        #[serde(rename = "mod")]
        modifier: i32,
        desc: String,
    },
    #[serde(rename = "attribute")]
    Attribute {
        attribute: String,
        path: String,
        #[serde(rename = "mod", default, skip_serializing_if = "Option::is_none")]
        modifier: Option<i32>,
        #[serde(default)]
        desc: String,
        /// Fixed target that bypasses the actor's own score.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        target: Option<i32>,
    },
    #[serde(rename = "selfcontrol")]
    SelfControl { target: i32, desc: String },
    #[serde(rename = "skill-spell")]
    SkillOrSpell {
        name: String,
        #[serde(rename = "mod", default, skip_serializing_if = "Option::is_none")]
        modifier: Option<i32>,
        #[serde(default)]
        desc: String,
    },
    #[serde(rename = "attack")]
    Attack {
        name: String,
        #[serde(rename = "mod", default, skip_serializing_if = "Option::is_none")]
        modifier: Option<i32>,
        #[serde(default)]
        desc: String,
    },
    #[serde(rename = "roll")]
    Roll { formula: String, desc: String },
    #[serde(rename = "damage")]
    Damage {
        formula: String,
        #[serde(rename = "damagetype")]
        damage_type: String,
    },
    #[serde(rename = "derivedroll")]
    DerivedRoll {
        #[serde(rename = "derivedformula")]
        base: DerivedBase,
        formula: String,
        desc: String,
    },
    #[serde(rename = "deriveddamage")]
    DerivedDamage {
        #[serde(rename = "derivedformula")]
        base: DerivedBase,
        formula: String,
        #[serde(rename = "damagetype")]
        damage_type: String,
    },
    #[serde(rename = "dodge")]
    Dodge,
    #[serde(rename = "mapped")]
    Mapped { path: String, desc: String },
    #[serde(rename = "block-parry")]
    BlockOrParry {
        desc: String,
        #[serde(rename = "melee", default, skip_serializing_if = "Option::is_none")]
        melee_filter: Option<String>,
        path: String,
    },
    #[serde(rename = "pdf")]
    Pdf { link: String },
}

impl ActionKind {
    /// The `type` tag used on the wire.
    pub fn tag(&self) -> &'static str {
        match self {
            ActionKind::Modifier { .. } => "modifier",
            ActionKind::Attribute { .. } => "attribute",
            ActionKind::SelfControl { .. } => "selfcontrol",
            ActionKind::SkillOrSpell { .. } => "skill-spell",
            ActionKind::Attack { .. } => "attack",
            ActionKind::Roll { .. } => "roll",
            ActionKind::Damage { .. } => "damage",
            ActionKind::DerivedRoll { .. } => "derivedroll",
            ActionKind::DerivedDamage { .. } => "deriveddamage",
            ActionKind::Dodge => "dodge",
            ActionKind::Mapped { .. } => "mapped",
            ActionKind::BlockOrParry { .. } => "block-parry",
            ActionKind::Pdf { .. } => "pdf",
        }
    }
}

impl Action {
    pub fn new(orig: impl Into<String>, kind: ActionKind) -> Self {
        Self { orig: orig.into(), blind_roll: false, kind }
    }

    pub fn blind(mut self, blind_roll: bool) -> Self {
        self.blind_roll = blind_roll;
        self
    }

    /// Base64 of the JSON form, as attached to rendered spans.
    pub fn encode(&self) -> Result<String> {
        let json = serde_json::to_string(self)?;
        Ok(STANDARD.encode(json))
    }

    pub fn decode(encoded: &str) -> Result<Self> {
        let bytes = STANDARD
            .decode(encoded.trim())
            .map_err(|e| OtfError::Decode(e.to_string()))?;
        serde_json::from_slice(&bytes).map_err(|e| OtfError::Decode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_form_uses_type_tag() {
        let action = Action::new(
            "ST+2 lifting",
            ActionKind::Attribute {
                attribute: "ST".into(),
                path: "attributes.ST.value".into(),
                modifier: Some(2),
                desc: "lifting".into(),
                target: None,
            },
        );
        let value = serde_json::to_value(&action).unwrap();
        assert_eq!(value["type"], "attribute");
        assert_eq!(value["mod"], 2);
        assert_eq!(value["orig"], "ST+2 lifting");
        assert!(value.get("blindroll").is_none());
        assert!(value.get("target").is_none());
    }

    #[test]
    fn encode_decode() {
        let action = Action::new("Dodge", ActionKind::Dodge).blind(true);
        let encoded = action.encode().unwrap();
        assert_eq!(Action::decode(&encoded).unwrap(), action);
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(matches!(Action::decode("not base64!"), Err(OtfError::Decode(_))));
        let not_json = STANDARD.encode("{\"type\":\"nope\"}");
        assert!(matches!(Action::decode(&not_json), Err(OtfError::Decode(_))));
    }
}
