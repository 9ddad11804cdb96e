//! One roller's context: settings, dice, the modifier bucket and the sinks
//! results are posted to.
//!
//! A session is driven through `&mut self`, so one activation completes
//! (stack drained, outcome posted) before the next can start. Hosts that
//! serve several actors concurrently share a session behind a `Mutex`.

use tracing::{debug, info, warn};

use crate::Dice;
use crate::action::Action;
use crate::actor::Actor;
use crate::dispatch::{DamageRequest, Dispatch, Visibility, dispatch};
use crate::error::Result;
use crate::modifiers::{ModifierStack, ModifierStore};
use crate::parser::parse;
use crate::pdf::PdfReference;
use crate::resolve::{RollReport, resolve};
use crate::settings::Settings;

/// Where activations end up. None of these can fail from the session's
/// point of view.
pub trait Host {
    fn post_outcome(&mut self, report: &RollReport);
    fn create_damage(&mut self, request: &DamageRequest);
    fn open_reference(&mut self, reference: &PdfReference);
}

/// Logs everything through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingHost;

impl Host for TracingHost {
    fn post_outcome(&mut self, report: &RollReport) {
        info!(visibility = ?report.visibility, "{}", report.text);
    }

    fn create_damage(&mut self, request: &DamageRequest) {
        info!(formula = %request.formula, damage_type = %request.damage_type, "damage");
    }

    fn open_reference(&mut self, reference: &PdfReference) {
        info!(%reference, url = %reference.url, "open reference");
    }
}

/// Keeps everything it receives; used by tests and the FFI bridge.
#[derive(Debug, Default, Clone)]
pub struct RecordingHost {
    pub outcomes: Vec<RollReport>,
    pub damage: Vec<DamageRequest>,
    pub references: Vec<PdfReference>,
}

impl Host for RecordingHost {
    fn post_outcome(&mut self, report: &RollReport) {
        self.outcomes.push(report.clone());
    }

    fn create_damage(&mut self, request: &DamageRequest) {
        self.damage.push(request.clone());
    }

    fn open_reference(&mut self, reference: &PdfReference) {
        self.references.push(reference.clone());
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Activation {
    Rolled(RollReport),
    Damage(DamageRequest),
    ModifierAdded { modifier: i32, desc: String },
    Reference(PdfReference),
    NoRoll,
    /// The text matched no rule.
    PassThrough,
}

pub struct Session<H: Host = TracingHost> {
    settings: Settings,
    dice: Dice,
    stack: ModifierStack,
    store: Option<Box<dyn ModifierStore>>,
    host: H,
}

impl Session<TracingHost> {
    pub fn new(settings: Settings) -> Self {
        Self::with_host(settings, TracingHost)
    }
}

impl<H: Host> Session<H> {
    pub fn with_host(settings: Settings, host: H) -> Self {
        let dice = settings.dice();
        Self { settings, dice, stack: ModifierStack::new(), store: None, host }
    }

    pub fn with_dice(mut self, dice: Dice) -> Self {
        self.dice = dice;
        self
    }

    /// Attach a persistence sink and restore whatever it holds. A failing
    /// load leaves the stack empty.
    pub fn with_store(mut self, store: Box<dyn ModifierStore>) -> Self {
        match store.load() {
            Ok(Some(snapshot)) => {
                debug!(entries = snapshot.modifiers.len(), "bucket restored");
                self.stack.restore(snapshot);
            }
            Ok(None) => {}
            Err(err) => warn!(error = %err, "could not load saved bucket"),
        }
        self.store = Some(store);
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn stack(&self) -> &ModifierStack {
        &self.stack
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn into_host(self) -> H {
        self.host
    }

    pub fn add_modifier(&mut self, modifier: i32, desc: &str) {
        self.stack.add(modifier, desc);
        self.persist();
    }

    pub fn set_range_modifier(&mut self, modifier: i32) {
        self.stack.set_range_modifier(modifier);
        self.persist();
    }

    pub fn remove_modifier(&mut self, index: usize) {
        if self.stack.remove(index).is_some() {
            self.persist();
        }
    }

    pub fn clear_modifiers(&mut self) {
        self.stack.clear();
        self.persist();
    }

    pub fn activate(&mut self, action: &Action, actor: Option<&mut dyn Actor>) -> Result<Activation> {
        self.activate_with_visibility(action, actor, None)
    }

    /// Like [`Session::activate`], but a requested visibility replaces
    /// `Public`. Blind actions stay blind.
    pub fn activate_with_visibility(
        &mut self,
        action: &Action,
        mut actor: Option<&mut dyn Actor>,
        visibility: Option<Visibility>,
    ) -> Result<Activation> {
        let dispatched = dispatch(action, actor.as_deref(), &mut self.stack, &self.settings)
            .inspect_err(|err| warn!(orig = %action.orig, error = %err, "cannot roll"))?;

        let activation = match dispatched {
            Dispatch::Roll(mut request) => {
                if let Some(v) = visibility {
                    if request.visibility != Visibility::Blind {
                        request.visibility = v;
                    }
                }
                let report = resolve(&request, &mut self.stack, &mut self.dice)
                    .inspect_err(|err| warn!(orig = %action.orig, error = %err, "cannot roll"))?;
                if report.fatigue_cost != 0 {
                    if let Some(actor) = actor.as_deref_mut() {
                        actor.spend_fatigue(report.fatigue_cost);
                    }
                }
                self.persist();
                self.host.post_outcome(&report);
                Activation::Rolled(report)
            }
            Dispatch::Damage(request) => {
                self.host.create_damage(&request);
                Activation::Damage(request)
            }
            Dispatch::ModifierAdded { modifier, desc } => {
                self.persist();
                Activation::ModifierAdded { modifier, desc }
            }
            Dispatch::Reference(reference) => {
                self.host.open_reference(&reference);
                Activation::Reference(reference)
            }
            Dispatch::NoRoll => Activation::NoRoll,
        };
        Ok(activation)
    }

    /// Parse the content of one bracket pair and activate it.
    pub fn activate_text(&mut self, text: &str, actor: Option<&mut dyn Actor>) -> Result<Activation> {
        let parsed = parse(
            text,
            Some(self.settings.default_modifier_desc.as_str()),
            self.settings.color_modifiers,
        );
        match parsed.action {
            Some(action) => self.activate(&action, actor),
            None => Ok(Activation::PassThrough),
        }
    }

    fn persist(&mut self) {
        if let Some(store) = self.store.as_mut() {
            if let Err(err) = store.save(&self.stack.snapshot()) {
                warn!(error = %err, "could not save bucket");
            }
        }
    }
}
