//! Fixed lookup tables shared by the parser and the dispatcher.

/// Data path for an attribute token as typed in an OTF span.
pub fn attribute_path(name: &str) -> Option<&'static str> {
    match name {
        "ST" => Some("attributes.ST.value"),
        "DX" => Some("attributes.DX.value"),
        "IQ" => Some("attributes.IQ.value"),
        "HT" => Some("attributes.HT.value"),
        "WILL" | "Will" => Some("attributes.WILL.value"),
        "PER" | "Per" => Some("attributes.PER.value"),
        _ => None,
    }
}

/// Short attribute name for a data path (`attributes.WILL.value` -> `WILL`).
pub fn attribute_name(path: &str) -> &str {
    path.strip_prefix("attributes.")
        .and_then(|rest| rest.strip_suffix(".value"))
        .unwrap_or(path)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WoundModifier {
    pub multiplier: f32,
    pub label: &'static str,
    /// `dmg` is a generic type that is never shown as a label.
    pub hidden: bool,
}

const fn wound(multiplier: f32, label: &'static str) -> WoundModifier {
    WoundModifier { multiplier, label, hidden: false }
}

/// Wound multiplier for a damage-type keyword (`cut`, `imp`, `pi+`, ...).
pub fn wound_modifier(keyword: &str) -> Option<WoundModifier> {
    let w = match keyword {
        "burn" => wound(1.0, "Burning"),
        "cor" => wound(1.0, "Corrosive"),
        "cr" => wound(1.0, "Crushing"),
        "cut" => wound(1.5, "Cutting"),
        "fat" => wound(1.0, "Fatigue"),
        "imp" => wound(2.0, "Impaling"),
        "pi-" => wound(0.5, "Small Piercing"),
        "pi" => wound(1.0, "Piercing"),
        "pi+" => wound(1.5, "Large Piercing"),
        "pi++" => wound(2.0, "Huge Piercing"),
        "tox" => wound(1.0, "Toxic"),
        "dmg" => WoundModifier { multiplier: 1.0, label: "Damage", hidden: true },
        _ => return None,
    };
    Some(w)
}

pub fn is_damage_type(keyword: &str) -> bool {
    wound_modifier(keyword).is_some()
}

/// Map long-form damage type names onto their keyword.
pub fn canonical_damage_type(name: &str) -> Option<&'static str> {
    let keyword = match name.trim().to_lowercase().as_str() {
        "burn" | "burning" => "burn",
        "cor" | "corrosion" | "corrosive" => "cor",
        "cr" | "crush" | "crushing" => "cr",
        "cut" | "cutting" => "cut",
        "fat" | "fatigue" => "fat",
        "imp" | "impaling" => "imp",
        "pi-" | "small piercing" => "pi-",
        "pi" | "piercing" => "pi",
        "pi+" | "large piercing" => "pi+",
        "pi++" | "huge piercing" => "pi++",
        "tox" | "toxic" => "tox",
        _ => return None,
    };
    Some(keyword)
}

/// Exact-string lookup for the named derived stats.
pub fn mapped_stat(text: &str) -> Option<&'static str> {
    match text {
        "Vision" | "VISION" => Some("vision"),
        "Hearing" | "HEARING" => Some("hearing"),
        "Touch" | "TOUCH" => Some("touch"),
        "Taste" | "TASTE" | "Smell" | "SMELL" | "Taste Smell" | "TASTE SMELL" | "TASTESMELL" => {
            Some("tastesmell")
        }
        "Frightcheck" | "FRIGHTCHECK" | "Fright check" | "Fright Check" => Some("frightcheck"),
        _ => None,
    }
}
