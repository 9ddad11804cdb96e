mod store;

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use otf_engine::content::builtin_menus;
use otf_engine::tables::{canonical_damage_type, wound_modifier};
use otf_engine::{
    link, parse, resolve, Activation, Actor, Character, DamageRequest, Dice, Host, ModifierStack,
    ModifierStore, PdfReference, RollReport, RollRequest, Session, Settings, Visibility,
};
use tracing_subscriber::EnvFilter;

use crate::store::{read_text_auto, FileStore};

#[derive(Subcommand)]
enum BucketCmd {
    /// Print the bucket contents
    Show,
    /// Add (or merge) a modifier
    Add {
        #[arg(allow_negative_numbers = true)]
        modifier: i32,
        /// Description; identical descriptions merge
        desc: Vec<String>,
    },
    /// Remove one entry by position (0-based)
    Remove { index: usize },
    /// Empty the bucket
    Clear,
}

#[derive(Subcommand)]
enum Cmd {
    /// Parse one OTF formula; prints the rendered span and the action JSON
    Parse {
        text: String,
        /// Render modifiers without plus/minus classes
        #[arg(long)]
        no_color: bool,
    },
    /// Render every [..] formula inside free text
    Link {
        text: String,
        #[arg(long)]
        no_color: bool,
    },
    /// Activate one OTF formula
    Roll {
        /// Formula, with or without surrounding brackets
        otf: String,
        /// Character sheet JSON to roll against
        #[arg(long)]
        character: Option<PathBuf>,
        /// RNG seed; overrides the settings file
        #[arg(long)]
        seed: Option<u64>,
        /// Bucket file shared between invocations
        #[arg(long)]
        bucket: Option<PathBuf>,
        /// Settings file (YAML or JSON)
        #[arg(long)]
        settings: Option<PathBuf>,
        /// Post the result as a whisper
        #[arg(long)]
        whisper: bool,
    },
    /// Inspect or edit a file-backed modifier bucket
    Bucket {
        #[arg(long, default_value = "bucket.json")]
        file: PathBuf,
        #[command(subcommand)]
        action: BucketCmd,
    },
    /// Plain 3d6 roll against a target number
    Check {
        #[arg(long)]
        target: i32,
        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        modifier: i32,
        #[arg(long, default_value_t = 42)]
        seed: u64,
    },
    /// List the built-in modifier menus
    Menus {
        /// Only this menu (melee, ranged, defense, other, difficulty, lighting)
        #[arg(long)]
        menu: Option<String>,
    },
}

#[derive(Parser)]
#[command(name = "otf")]
#[command(about = "On-the-Fly formula parser and roller")]
struct Cli {
    #[command(subcommand)]
    cmd: Cmd,
}

/// Prints everything a session produces.
struct TerminalHost;

impl Host for TerminalHost {
    fn post_outcome(&mut self, report: &RollReport) {
        match report.visibility {
            Visibility::Public => {}
            Visibility::Whisper => println!("(whisper)"),
            Visibility::Blind => println!("(blind roll, GM only)"),
        }
        println!("{}", report.text);
    }

    fn create_damage(&mut self, request: &DamageRequest) {
        let who = request.actor.as_deref().unwrap_or("no character");
        let shown = request.label.as_deref().unwrap_or(&request.formula);
        println!(
            "Damage {shown} {} ({who}): {}{}",
            request.damage_type,
            request.formula,
            wound_note(&request.damage_type)
        );
    }

    fn open_reference(&mut self, reference: &PdfReference) {
        println!("{reference}");
        println!("{}", reference.url);
    }
}

/// Wound multiplier shown after a damage line, e.g. ` [Cutting x1.5]`.
fn wound_note(damage_type: &str) -> String {
    let keyword = canonical_damage_type(damage_type).unwrap_or(damage_type);
    match wound_modifier(keyword) {
        Some(w) if !w.hidden => format!(" [{} x{}]", w.label, w.multiplier),
        _ => String::new(),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_character(path: &std::path::Path) -> Result<Character> {
    let text = read_text_auto(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing character {}", path.display()))
}

/// Fatigue spent by a roll is written back so the sheet stays current.
fn save_character(path: &std::path::Path, character: &Character) -> Result<()> {
    let json = serde_json::to_string_pretty(character)?;
    std::fs::write(path, json).with_context(|| format!("writing character {}", path.display()))
}

fn strip_brackets(text: &str) -> &str {
    let t = text.trim();
    t.strip_prefix('[').and_then(|s| s.strip_suffix(']')).unwrap_or(t)
}

fn load_bucket(store: &FileStore) -> Result<ModifierStack> {
    let mut stack = ModifierStack::new();
    if let Some(snapshot) = store.load().context("loading bucket")? {
        stack.restore(snapshot);
    }
    Ok(stack)
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    match cli.cmd {
        Cmd::Parse { text, no_color } => {
            let parsed = parse(strip_brackets(&text), Some(""), !no_color);
            println!("{}", parsed.text);
            if let Some(action) = parsed.action {
                println!("{}", serde_json::to_string_pretty(&action)?);
            }
        }
        Cmd::Link { text, no_color } => {
            println!("{}", link(&text, !no_color));
        }
        Cmd::Roll {
            otf,
            character: sheet,
            seed,
            bucket,
            settings,
            whisper,
        } => {
            let mut settings = match settings {
                Some(path) => Settings::load(&path).with_context(|| format!("loading {}", path.display()))?,
                None => Settings::default(),
            };
            if seed.is_some() {
                settings.seed = seed;
            }
            let mut character = sheet.as_deref().map(load_character).transpose()?;

            let mut session = Session::with_host(settings, TerminalHost);
            if let Some(path) = bucket {
                session = session.with_store(Box::new(FileStore::new(path)));
            }
            let visibility = whisper.then_some(Visibility::Whisper);
            let actor = character.as_mut().map(|c| c as &mut dyn Actor);
            let text = strip_brackets(&otf);
            let action = match parse(text, Some(session.settings().default_modifier_desc.as_str()), true).action {
                Some(action) => action,
                None => bail!("'{text}' is not an OTF formula"),
            };
            match session.activate_with_visibility(&action, actor, visibility)? {
                Activation::ModifierAdded { .. } => println!("{}", session.stack().summary("Bucket ")),
                Activation::NoRoll => println!("No roll (target is not positive)"),
                Activation::Rolled(report) if report.fatigue_cost != 0 => {
                    if let (Some(path), Some(ch)) = (&sheet, &character) {
                        save_character(path, ch)?;
                        println!("{} spends {} FP ({}/{} left)", ch.name, report.fatigue_cost, ch.fp.value, ch.fp.max);
                    }
                }
                Activation::Rolled(_)
                | Activation::Damage(_)
                | Activation::Reference(_)
                | Activation::PassThrough => {}
            }
        }
        Cmd::Bucket { file, action } => {
            let mut store = FileStore::new(file);
            let mut stack = load_bucket(&store)?;
            match action {
                BucketCmd::Show => {}
                BucketCmd::Add { modifier, desc } => stack.add(modifier, desc.join(" ")),
                BucketCmd::Remove { index } => {
                    if stack.remove(index).is_none() {
                        bail!("no bucket entry at position {index}");
                    }
                }
                BucketCmd::Clear => stack.clear(),
            }
            store.save(&stack.snapshot()).context("saving bucket")?;
            println!("{}", stack.summary(""));
        }
        Cmd::Check {
            target,
            modifier,
            seed,
        } => {
            if target <= 0 {
                bail!("target must be positive, got {target}");
            }
            let mut stack = ModifierStack::new();
            if modifier != 0 {
                stack.add(modifier, "modifier");
            }
            let mut dice = Dice::from_seed(seed);
            let report = resolve(&RollRequest::check(target, "3d6"), &mut stack, &mut dice)?;
            println!("{}", report.text);
        }
        Cmd::Menus { menu } => {
            let menus = builtin_menus();
            if let Some(id) = &menu {
                if !menus.iter().any(|m| m.id == id.as_str()) {
                    bail!("unknown menu '{id}'");
                }
            }
            for m in menus.iter().filter(|m| menu.as_deref().is_none_or(|id| m.id == id)) {
                println!("{}", m.title);
                let mut section = None;
                for item in &m.items {
                    if item.section != section {
                        section = item.section.clone();
                        if let Some(s) = &section {
                            println!("  -- {s} --");
                        }
                    }
                    println!("  {}", item.otf);
                }
            }
        }
    }
    Ok(())
}
