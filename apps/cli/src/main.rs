#![deny(warnings)]

//! Headless CLI: play a scripted campaign against the adaptive competitor
//! and print the outcome.

use anyhow::{bail, Context, Result};
use rust_decimal::Decimal;
use sim_core::{ActionKind, CampaignConfig, TurnRecord, UnitKind, UserCommand};
use sim_runtime::{analytics, Campaign, ScriptedUser};
use std::path::PathBuf;
use tracing::{info, warn, Level};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Default)]
struct Args {
    scenario: Option<PathBuf>,
    quarters: Option<u32>,
    seed: Option<u64>,
    action: Option<String>,
    budget: Option<Decimal>,
    alloc: Option<String>,
    feint: bool,
    save: Option<PathBuf>,
    load: Option<PathBuf>,
    report: Option<PathBuf>,
}

/// Parse a numeric flag value, warning and falling back to the scenario
/// value when it is missing or malformed.
fn numeric<T: std::str::FromStr>(flag: &str, raw: Option<String>) -> Option<T> {
    match raw.as_deref().map(|s| s.trim().parse::<T>()) {
        Some(Ok(value)) => Some(value),
        Some(Err(_)) => {
            warn!(flag, value = raw.as_deref(), "unparsable value ignored, using scenario setting");
            None
        }
        None => {
            warn!(flag, "missing value ignored, using scenario setting");
            None
        }
    }
}

fn parse_args(argv: impl IntoIterator<Item = String>) -> Result<Args> {
    let mut args = Args::default();
    let mut it = argv.into_iter();
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--scenario" => args.scenario = it.next().map(PathBuf::from),
            "--quarters" => args.quarters = numeric("--quarters", it.next()),
            "--seed" => args.seed = numeric("--seed", it.next()),
            "--action" => args.action = it.next(),
            "--budget" => {
                let raw = it.next().unwrap_or_default();
                args.budget = Some(raw.parse().with_context(|| format!("bad budget {raw:?}"))?);
            }
            "--alloc" => args.alloc = it.next(),
            "--feint" => args.feint = true,
            "--save" => args.save = it.next().map(PathBuf::from),
            "--load" => args.load = it.next().map(PathBuf::from),
            "--report" => args.report = it.next().map(PathBuf::from),
            other => warn!(arg = other, "ignoring unknown argument"),
        }
    }
    Ok(args)
}

/// Parse a snake_case enum name the same way scenario files spell it.
fn parse_name<T: serde::de::DeserializeOwned>(what: &str, raw: &str) -> Result<T> {
    serde_json::from_value(serde_json::Value::String(raw.trim().to_lowercase()))
        .with_context(|| format!("unknown {what} {raw:?}"))
}

/// `sales=60,rnd=40` into unit weights.
fn parse_alloc(raw: &str) -> Result<Vec<(UnitKind, u32)>> {
    raw.split(',')
        .filter(|part| !part.trim().is_empty())
        .map(|part| {
            let (unit, pct) = part
                .split_once('=')
                .with_context(|| format!("expected unit=percent, got {part:?}"))?;
            let pct: u32 = pct
                .trim()
                .parse()
                .with_context(|| format!("bad percentage in {part:?}"))?;
            Ok((parse_name::<UnitKind>("unit", unit)?, pct))
        })
        .collect()
}

fn build_command(args: &Args) -> Result<UserCommand> {
    let kind = match &args.action {
        Some(name) => parse_name::<ActionKind>("action", name)?,
        None => ActionKind::Hold,
    };
    if kind == ActionKind::Hold {
        return Ok(UserCommand::hold());
    }
    let budget = args.budget.unwrap_or(Decimal::new(200, 0));
    let weights = match &args.alloc {
        Some(raw) => parse_alloc(raw)?,
        None => vec![(UnitKind::Sales, 50), (UnitKind::Marketing, 50)],
    };
    if weights.iter().map(|(_, w)| *w).sum::<u32>() == 0 {
        bail!("allocation weights must not all be zero");
    }
    let mut command = UserCommand::from_percentages(kind, budget, &weights);
    command.feint = args.feint;
    Ok(command)
}

fn load_config(args: &Args) -> Result<CampaignConfig> {
    let mut cfg = match &args.scenario {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading scenario {}", path.display()))?;
            CampaignConfig::from_yaml_str(&text)?
        }
        None => CampaignConfig::default(),
    };
    if let Some(q) = args.quarters {
        cfg.max_quarters = q;
    }
    if let Some(seed) = args.seed {
        cfg.seed = seed;
    }
    cfg.validate()?;
    Ok(cfg)
}

fn print_turn(record: &TurnRecord) {
    println!(
        "Q{:>2} {} | user {:>5.1}% ${} {:?} | rival {:>5.1}% ${} {:?} | {:?}/{:?}",
        record.turn,
        record.date,
        record.user.market_share,
        record.user.cash.round_dp(0),
        record.user_action.kind,
        record.competitor.market_share,
        record.competitor.cash.round_dp(0),
        record.competitor_action.kind,
        record.ai.personality,
        record.ai.phase,
    );
    for event in &record.events {
        println!("     - {}", event.message);
    }
}

fn main() -> Result<()> {
    // Logging setup
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_max_level(Level::INFO)
        .init();

    let args = parse_args(std::env::args().skip(1))?;
    info!(
        version = env!("CARGO_PKG_VERSION"),
        git = env!("GIT_SHA"),
        "starting CLI"
    );

    let cfg = load_config(&args)?;
    let command = build_command(&args)?;
    let mut campaign = match &args.load {
        Some(path) => Campaign::load(path, &cfg)?,
        None => Campaign::new(cfg.clone())?,
    };
    info!(
        seed = cfg.seed,
        quarters = cfg.max_quarters,
        resumed_at = campaign.turn(),
        "campaign ready"
    );

    let remaining = cfg.max_quarters.saturating_sub(campaign.turn());
    let mut user = ScriptedUser::repeating(command, remaining);
    let report = campaign.run(&mut user, &mut print_turn)?;
    for (turn, error) in &user.rejections {
        warn!(turn, %error, "command rejected");
    }

    if let Some(k) = analytics::kpis(&report.records) {
        println!(
            "KPI | quarters: {} | user share: {:.1}% | rival share: {:.1}% | momentum: {:+.2} | quarters won: {} lost: {}",
            report.records.len(),
            k.user_share,
            k.competitor_share,
            k.user_momentum,
            k.user_wins,
            k.competitor_wins
        );
    }
    match &report.outcome {
        Some(outcome) => println!(
            "Outcome | {:?} after {} quarters | verdict: {:?}",
            outcome.reason, outcome.turns, outcome.verdict
        ),
        None => println!("Outcome | campaign still running"),
    }

    if let Some(path) = &args.save {
        campaign.save(path)?;
        info!(path = %path.display(), "campaign saved");
    }
    if let Some(path) = &args.report {
        let rows = persistence::report_rows(&report.records, cfg.ai.vocabulary)?;
        persistence::export_report_json(path, &rows)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alloc_parses_units_and_percentages() {
        let w = parse_alloc("sales=60, rnd=40").unwrap();
        assert_eq!(w, vec![(UnitKind::Sales, 60), (UnitKind::RnD, 40)]);
        assert!(parse_alloc("sales").is_err());
        assert!(parse_alloc("warehouse=10").is_err());
    }

    fn argv(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn bad_numbers_fall_back_without_eating_flags() {
        let args = parse_args(argv(&["--seed", "abc", "--quarters", "12", "--feint"])).unwrap();
        assert_eq!(args.seed, None);
        assert_eq!(args.quarters, Some(12));
        assert!(args.feint);

        let args = parse_args(argv(&["--quarters", "-3", "--seed", " 77 "])).unwrap();
        assert_eq!(args.quarters, None);
        assert_eq!(args.seed, Some(77));
    }

    #[test]
    fn hold_ignores_budget() {
        let args = Args {
            budget: Some(Decimal::new(999, 0)),
            ..Args::default()
        };
        assert_eq!(build_command(&args).unwrap(), UserCommand::hold());
    }

    #[test]
    fn attack_splits_budget() {
        let args = Args {
            action: Some("Attack".into()),
            budget: Some(Decimal::new(300, 0)),
            alloc: Some("sales=100".into()),
            ..Args::default()
        };
        let cmd = build_command(&args).unwrap();
        assert_eq!(cmd.kind, ActionKind::Attack);
        assert_eq!(cmd.allocation.get(&UnitKind::Sales), Some(&Decimal::new(300, 0)));
    }
}
