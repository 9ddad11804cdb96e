use jni::objects::{JClass, JString};
use jni::sys::jstring;
use jni::JNIEnv;
use otf_engine::{
    link, parse, Activation, Actor, Character, ModifierEntry, RecordingHost, Session, Settings,
};
use serde::Deserialize;
use serde_json::{json, Value};

pub const VERSION: &str = concat!("otf-ffi ", env!("CARGO_PKG_VERSION"));

fn ok(value: Value) -> Value {
    json!({ "ok": true, "result": value })
}

fn err(e: impl std::fmt::Display) -> Value {
    json!({ "ok": false, "error": e.to_string() })
}

fn respond(env: &JNIEnv, payload: Value) -> jstring {
    env.new_string(payload.to_string())
        .map(JString::into_raw)
        .unwrap_or(std::ptr::null_mut())
}

fn with_input(env: &mut JNIEnv, input: &JString, f: impl FnOnce(&str) -> Value) -> jstring {
    let payload = match env.get_string(input) {
        Ok(s) => f(&String::from(s)),
        Err(e) => err(e),
    };
    respond(env, payload)
}

#[derive(Debug, Deserialize)]
pub struct RollConfig {
    pub otf: String,
    #[serde(default)]
    pub seed: u64,
    #[serde(default)]
    pub character: Option<Character>,
    /// Bucket contents to roll with.
    #[serde(default)]
    pub modifiers: Vec<ModifierEntry>,
}

fn strip_brackets(text: &str) -> &str {
    let t = text.trim();
    t.strip_prefix('[').and_then(|s| s.strip_suffix(']')).unwrap_or(t)
}

pub fn parse_internal(text: &str) -> Value {
    let parsed = parse(strip_brackets(text), Some(""), true);
    ok(json!({ "text": parsed.text, "action": parsed.action }))
}

pub fn link_internal(text: &str) -> Value {
    ok(Value::String(link(text, true)))
}

pub fn roll_internal(config: &str) -> Value {
    let cfg: RollConfig = match serde_json::from_str(config) {
        Ok(c) => c,
        Err(e) => return err(format!("invalid_config: {e}")),
    };
    let settings = Settings { seed: Some(cfg.seed), ..Settings::default() };
    let mut session = Session::with_host(settings, RecordingHost::default());
    for m in &cfg.modifiers {
        session.add_modifier(m.modifier, &m.desc);
    }
    let mut character = cfg.character;
    let actor = character.as_mut().map(|c| c as &mut dyn Actor);
    let activation = match session.activate_text(strip_brackets(&cfg.otf), actor) {
        Ok(a) => a,
        Err(e) => return err(e),
    };
    let result = match activation {
        Activation::Rolled(report) => json!({ "kind": "roll", "report": report }),
        Activation::Damage(request) => json!({ "kind": "damage", "request": request }),
        Activation::ModifierAdded { modifier, desc } => {
            json!({ "kind": "modifier", "mod": modifier, "desc": desc })
        }
        Activation::Reference(reference) => json!({ "kind": "reference", "reference": reference }),
        Activation::NoRoll => json!({ "kind": "none" }),
        Activation::PassThrough => return err(format!("not an OTF formula: {}", cfg.otf)),
    };
    let fp = character.as_ref().map(|c| c.fp.value);
    ok(json!({ "activation": result, "fp": fp }))
}

#[no_mangle]
pub extern "system" fn Java_com_otf_Ffi_version<'local>(
    env: JNIEnv<'local>,
    _class: JClass<'local>,
) -> jstring {
    env.new_string(VERSION)
        .map(JString::into_raw)
        .unwrap_or(std::ptr::null_mut())
}

#[no_mangle]
pub extern "system" fn Java_com_otf_Ffi_parseJson(
    mut env: JNIEnv,
    _class: JClass,
    text: JString,
) -> jstring {
    with_input(&mut env, &text, parse_internal)
}

#[no_mangle]
pub extern "system" fn Java_com_otf_Ffi_linkJson(
    mut env: JNIEnv,
    _class: JClass,
    text: JString,
) -> jstring {
    with_input(&mut env, &text, link_internal)
}

#[no_mangle]
pub extern "system" fn Java_com_otf_Ffi_rollJson(
    mut env: JNIEnv,
    _class: JClass,
    config: JString,
) -> jstring {
    with_input(&mut env, &config, roll_internal)
}
