use std::cell::RefCell;
use std::rc::Rc;

use otf_engine::content::sample_character;
use otf_engine::{
    Activation, Actor, Dice, ModifierEntry, ModifierSnapshot, ModifierStore, OtfError, RecordingHost, Session,
    Settings, Visibility, parse,
};

/// Store whose contents stay visible to the test after being boxed.
#[derive(Clone, Default)]
struct SharedStore(Rc<RefCell<Option<ModifierSnapshot>>>);

impl ModifierStore for SharedStore {
    fn save(&mut self, snapshot: &ModifierSnapshot) -> otf_engine::Result<()> {
        *self.0.borrow_mut() = Some(snapshot.clone());
        Ok(())
    }

    fn load(&self) -> otf_engine::Result<Option<ModifierSnapshot>> {
        Ok(self.0.borrow().clone())
    }
}

struct BrokenStore;

impl ModifierStore for BrokenStore {
    fn save(&mut self, _: &ModifierSnapshot) -> otf_engine::Result<()> {
        Err(OtfError::Decode("disk full".into()))
    }

    fn load(&self) -> otf_engine::Result<Option<ModifierSnapshot>> {
        Err(OtfError::Decode("corrupt".into()))
    }
}

fn session(faces: Vec<u32>) -> Session<RecordingHost> {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    Session::with_host(Settings::default(), RecordingHost::default()).with_dice(Dice::from_scripted(faces))
}

#[test]
fn bucket_is_consumed_by_the_next_roll() {
    let mut hero = sample_character().unwrap();
    let mut s = session(vec![3, 3, 4]);
    assert!(matches!(s.activate_text("+2 aim", None).unwrap(), Activation::ModifierAdded { modifier: 2, .. }));
    assert_eq!(s.stack().sum(), 2);

    let Activation::Rolled(report) = s.activate_text("S:Broadsword", Some(&mut hero)).unwrap() else {
        panic!("expected a roll")
    };
    assert_eq!(report.outcome.target, Some(16));
    assert!(s.stack().is_empty());
    assert_eq!(s.host().outcomes.len(), 1);
}

#[test]
fn fatigue_cost_is_charged_to_the_actor() {
    let mut hero = sample_character().unwrap();
    let mut s = session(vec![3, 3, 4]);
    s.add_modifier(2, "dmg (Mighty Blow) *Cost 1FP");
    s.activate_text("A:Broadsword*", Some(&mut hero)).unwrap();
    assert_eq!(hero.fp.value, 11);
}

#[test]
fn failures_mutate_nothing() {
    let mut s = session(vec![3, 3, 4]);
    s.add_modifier(1, "aim");
    assert!(matches!(s.activate_text("Dodge", None), Err(OtfError::NoActor)));
    assert_eq!(s.stack().entries(), vec![ModifierEntry::new(1, "aim")]);
    assert!(s.host().outcomes.is_empty());
}

#[test]
fn oversized_spans_fail_cleanly() {
    let mut s = session(vec![6]);
    s.add_modifier(2, "aim");
    let Activation::Rolled(report) = s.activate_text("1d+1000000000x3", None).unwrap() else {
        panic!("expected a roll")
    };
    assert_eq!(report.outcome.total, i32::MAX);

    s.add_modifier(2, "aim");
    assert!(matches!(s.activate_text("4000000000d", None), Err(OtfError::InvalidFormula(_))));
    assert_eq!(s.stack().sum(), 2);
}

#[test]
fn explicit_attribute_target_without_actor_is_refused() {
    let mut s = session(vec![3, 3, 4]);
    assert!(matches!(s.activate_text("HT12", None), Err(OtfError::NoActor)));
    assert!(s.host().outcomes.is_empty());
}

#[test]
fn pass_through_and_no_roll() {
    let mut s = session(vec![1]);
    assert_eq!(s.activate_text("just words", None).unwrap(), Activation::PassThrough);
    assert_eq!(s.activate_text("CR: 0", None).unwrap(), Activation::NoRoll);
}

#[test]
fn damage_and_references_go_to_the_host() {
    let mut s = session(vec![1]);
    s.activate_text("2d cr", None).unwrap();
    s.activate_text("PDF:MA23", None).unwrap();
    let host = s.into_host();
    assert_eq!(host.damage[0].formula, "2d");
    assert_eq!(host.references[0].book, "MA");
    assert!(host.outcomes.is_empty());
}

#[test]
fn requested_visibility_never_unblinds() {
    let mut hero = sample_character().unwrap();
    let mut s = session(vec![3, 3, 4]);
    let whisper = parse("Dodge", None, true).action.unwrap();
    let blind = parse("!Dodge", None, true).action.unwrap();

    let Activation::Rolled(r) =
        s.activate_with_visibility(&whisper, Some(&mut hero), Some(Visibility::Whisper)).unwrap()
    else {
        panic!("expected a roll")
    };
    assert_eq!(r.visibility, Visibility::Whisper);

    let Activation::Rolled(r) =
        s.activate_with_visibility(&blind, Some(&mut hero), Some(Visibility::Whisper)).unwrap()
    else {
        panic!("expected a roll")
    };
    assert_eq!(r.visibility, Visibility::Blind);
}

#[test]
fn stack_is_persisted_and_restored() {
    let store = SharedStore::default();
    let mut s = session(vec![3, 3, 4]).with_store(Box::new(store.clone()));
    s.activate_text("-2 dark", None).unwrap();
    s.set_range_modifier(-3);
    assert_eq!(store.0.borrow().as_ref().map(|snap| snap.current_sum), Some(-5));

    let restored = session(vec![1]).with_store(Box::new(store.clone()));
    assert_eq!(restored.stack().sum(), -5);

    s.activate_text("3d", None).unwrap();
    assert_eq!(store.0.borrow().as_ref().map(|snap| snap.modifiers.len()), Some(0));
}

#[test]
fn broken_store_is_tolerated() {
    let mut s = session(vec![3, 3, 4]).with_store(Box::new(BrokenStore));
    s.add_modifier(1, "aim");
    assert_eq!(s.stack().sum(), 1);
    s.clear_modifiers();
    assert!(s.stack().is_empty());
}

#[test]
fn actor_trait_objects_work() {
    let mut hero = sample_character().unwrap();
    let actor: &mut dyn Actor = &mut hero;
    let mut s = session(vec![3, 3, 4]);
    assert!(matches!(s.activate_text("DX", Some(actor)).unwrap(), Activation::Rolled(_)));
}
