use otf_engine::dispatch::RollRequest;
use otf_engine::{Dice, ModifierStack, OtfError, Outcome, classify, resolve};
use proptest::prelude::*;

fn open(formula: &str, label: &str) -> RollRequest {
    RollRequest { target: None, formula: formula.into(), ..RollRequest::check(1, label) }
}

#[test]
fn classification_examples() {
    for target in -5..30 {
        assert_eq!(classify(4, target), Outcome::CriticalSuccess);
    }
    assert_eq!(classify(17, 10), Outcome::CriticalFailure);
    assert_eq!(classify(10, 12), Outcome::Success);
}

#[test]
fn target_roll_lists_modifiers_and_new_target() {
    let mut stack = ModifierStack::new();
    stack.add(2, "aim");
    stack.add(-1, "dark");
    let mut dice = Dice::from_scripted(vec![3, 3, 4]);

    let report = resolve(&RollRequest::check(14, "Broadsword"), &mut stack, &mut dice).unwrap();
    assert!(stack.is_empty());
    assert_eq!(report.outcome.total, 10);
    assert_eq!(report.outcome.target, Some(15));
    assert_eq!(report.outcome.margin, Some(5));
    assert_eq!(report.outcome.result, Some(Outcome::Success));
    insta::assert_snapshot!(report.text, @r"
Broadsword (14)
  +2 : aim
  -1 : dark
New Target: (15)
Rolled 10 -> Success! made it by 5
");
}

#[test]
fn one_shot_modifiers_come_first() {
    let mut stack = ModifierStack::new();
    stack.add(-2, "shock");
    let request = RollRequest {
        extra_mods: vec![otf_engine::ModifierEntry::new(2, "feint")],
        ..RollRequest::check(12, "Stealth")
    };
    let report = resolve(&request, &mut stack, &mut Dice::from_scripted(vec![4, 4, 4])).unwrap();
    let descs: Vec<_> = report.modifiers.iter().map(|m| m.desc.as_str()).collect();
    assert_eq!(descs, ["feint", "shock"]);
    assert_eq!(report.outcome.margin, Some(0));
    assert!(report.text.ends_with("Rolled 12 -> Success! just made it"));
}

#[test]
fn max_directive_caps_target() {
    let mut stack = ModifierStack::new();
    stack.add(-4, "to hit (Charge Attack) *Max:9");
    stack.add(10, "GM said so");
    let report =
        resolve(&RollRequest::check(15, "Broadsword"), &mut stack, &mut Dice::from_scripted(vec![3, 3, 4]))
            .unwrap();
    assert_eq!(report.outcome.target, Some(9));
    assert_eq!(report.outcome.result, Some(Outcome::Failure));
    assert!(report.text.contains("missed it by 1"));
}

#[test]
fn fatigue_directives_are_summed() {
    let mut stack = ModifierStack::new();
    stack.add(2, "dmg (Mighty Blow) *Cost 1FP");
    stack.add(2, "Feverish Defense *Costs 2 FP");
    let report =
        resolve(&RollRequest::check(10, "Dodge"), &mut stack, &mut Dice::from_scripted(vec![1])).unwrap();
    assert_eq!(report.fatigue_cost, 3);
    assert_eq!(report.outcome.result, Some(Outcome::CriticalSuccess));
}

#[test]
fn extreme_modifiers_saturate_instead_of_overflowing() {
    let mut stack = ModifierStack::new();
    stack.add(i32::MAX, "blessed");
    stack.add(5, "aim");
    let report =
        resolve(&RollRequest::check(20, "Luck"), &mut stack, &mut Dice::from_scripted(vec![3, 3, 4])).unwrap();
    assert_eq!(report.outcome.target, Some(i32::MAX));
    assert_eq!(report.outcome.result, Some(Outcome::Success));

    stack.add(i32::MIN, "cursed");
    stack.add(i32::MIN, "doomed");
    let report =
        resolve(&RollRequest::check(20, "Luck"), &mut stack, &mut Dice::from_scripted(vec![3, 3, 4])).unwrap();
    assert_eq!(report.outcome.target, Some(i32::MIN + 20));
    assert_eq!(report.outcome.margin, Some(i32::MIN + 10));
    assert_eq!(report.outcome.result, Some(Outcome::Failure));
}

#[test]
fn oversized_open_roll_saturates() {
    let report = resolve(
        &open("1d6+1000000000*3", "Rolling"),
        &mut ModifierStack::new(),
        &mut Dice::from_scripted(vec![6]),
    )
    .unwrap();
    assert_eq!(report.outcome.total, i32::MAX);
}

#[test]
fn rapid_fire_reports_extra_hits() {
    let request = RollRequest { rof: Some(3), rcl: Some(2), ..RollRequest::check(14, "Crossbow") };
    let report =
        resolve(&request, &mut ModifierStack::new(), &mut Dice::from_scripted(vec![3, 3, 4])).unwrap();
    assert_eq!(report.outcome.extra_hits, Some(3));
    assert!(report.text.ends_with("Total possible hits due to RoF/Rcl: 3"));
}

#[test]
fn attack_mode_note_follows_label() {
    let request = RollRequest { note: Some("Swing".into()), ..RollRequest::check(14, "Broadsword") };
    let report =
        resolve(&request, &mut ModifierStack::new(), &mut Dice::from_scripted(vec![6, 6, 6])).unwrap();
    insta::assert_snapshot!(report.text, @r"
Broadsword (14)
(Swing)
Rolled 18 -> Critical Failure! missed it by 4
");
    assert!(report.outcome.is_critical_failure);
}

#[test]
fn open_roll_adds_modifiers_to_total() {
    let mut stack = ModifierStack::new();
    stack.add(3, "bonus");
    let report = resolve(&open("2d6+1", "Rolling 2d+1"), &mut stack, &mut Dice::from_scripted(vec![2, 5]))
        .unwrap();
    assert_eq!(report.outcome.total, 11);
    assert_eq!(report.outcome.result, None);
    assert_eq!(report.faces, vec![2, 5]);
    insta::assert_snapshot!(report.text, @r"
Rolling 2d+1
  +3 : bonus
Rolled 11 [2, 5]
");
}

#[test]
fn open_roll_minimum_and_singular_points() {
    let mut stack = ModifierStack::new();
    stack.add(-5, "armor");
    let report =
        resolve(&open("1d6!", "Rolling 1d! points"), &mut stack, &mut Dice::from_scripted(vec![2])).unwrap();
    assert_eq!(report.outcome.total, 1);
    assert!(report.text.starts_with("Rolling 1d! point\n"));
}

#[test]
fn multiplier_applies_before_modifiers() {
    let mut stack = ModifierStack::new();
    stack.add(1, "x");
    let report =
        resolve(&open("1d6*3", "Rolling"), &mut stack, &mut Dice::from_scripted(vec![4])).unwrap();
    assert_eq!(report.outcome.total, 13);
}

#[test]
fn bad_formula_leaves_stack_untouched() {
    let mut stack = ModifierStack::new();
    stack.add(2, "aim");
    let err = resolve(&open("d6", "Rolling"), &mut stack, &mut Dice::from_seed(1)).unwrap_err();
    assert!(matches!(err, OtfError::InvalidFormula(_)));
    assert_eq!(stack.sum(), 2);
}

#[test]
fn seeded_rolls_repeat() {
    let roll = |seed| {
        resolve(&RollRequest::check(12, "IQ"), &mut ModifierStack::new(), &mut Dice::from_seed(seed))
            .unwrap()
            .outcome
    };
    assert_eq!(roll(42), roll(42));
}

proptest! {
    #[test]
    fn outcome_depends_only_on_raw_and_final(faces in prop::collection::vec(1u32..=6, 3), target in 1i32..25, m in -6i32..6) {
        let mut stack = ModifierStack::new();
        stack.add(m, "m");
        let report = resolve(&RollRequest::check(target, "t"), &mut stack, &mut Dice::from_scripted(faces.clone())).unwrap();
        let raw: i32 = faces.iter().map(|&f| f as i32).sum();
        prop_assert_eq!(report.outcome.total, raw);
        prop_assert_eq!(report.outcome.result, Some(classify(raw, target + m)));
        prop_assert_eq!(report.outcome.margin, Some(target + m - raw));
    }

    #[test]
    fn classification_is_consistent_with_margin(raw in 3i32..=18, target in -10i32..30) {
        let outcome = classify(raw, target);
        if (5..=16).contains(&raw) && raw - target < 10 && !(raw <= 6 && target >= 15) {
            prop_assert_eq!(outcome.is_success(), target >= raw);
        }
    }
}
