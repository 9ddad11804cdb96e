use clap::Parser;
use otf_engine::{classify, Dice, Outcome};
use serde::Serialize;

#[derive(Parser)]
#[command(name = "odds")]
#[command(about = "Monte Carlo sweep of 3d6 success and critical rates")]
struct Args {
    /// Rolls per target number
    #[arg(long, default_value_t = 10_000)]
    trials: u32,

    /// RNG base seed (target t uses seed+t)
    #[arg(long, default_value_t = 12345)]
    seed: u64,

    /// Lowest target number
    #[arg(long, default_value_t = 3)]
    from: i32,

    /// Highest target number
    #[arg(long, default_value_t = 20)]
    to: i32,

    /// Emit JSON rows instead of a table
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Default, Serialize)]
struct Row {
    target: i32,
    success: f64,
    critical_success: f64,
    critical_failure: f64,
}

fn sweep(target: i32, trials: u32, seed: u64) -> Row {
    let mut dice = Dice::from_seed(seed);
    let (mut success, mut crit, mut fumble) = (0u32, 0u32, 0u32);
    for _ in 0..trials {
        let outcome = classify(dice.three_d6(), target);
        if outcome.is_success() {
            success += 1;
        }
        match outcome {
            Outcome::CriticalSuccess => crit += 1,
            Outcome::CriticalFailure => fumble += 1,
            Outcome::Success | Outcome::Failure => {}
        }
    }
    let pct = |n: u32| 100.0 * f64::from(n) / f64::from(trials.max(1));
    Row {
        target,
        success: pct(success),
        critical_success: pct(crit),
        critical_failure: pct(fumble),
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    if args.from > args.to {
        anyhow::bail!("--from {} is above --to {}", args.from, args.to);
    }
    let rows: Vec<Row> = (args.from..=args.to)
        .map(|t| sweep(t, args.trials, args.seed.wrapping_add(t as u64)))
        .collect();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }
    println!("target  success%  crit%  critfail%");
    for r in &rows {
        println!(
            "{:>6}  {:>8.1}  {:>5.1}  {:>9.1}",
            r.target, r.success, r.critical_success, r.critical_failure
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn high_targets_succeed_more_often() {
        let low = sweep(6, 2000, 1);
        let high = sweep(14, 2000, 1);
        assert!(high.success > low.success);
        assert!(low.critical_failure > high.critical_failure);
    }
}
