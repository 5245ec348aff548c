//! `rcp`: plan recovery scenarios from the command line
//!
//! Exit codes: 0 when the plan passes (or the graph is clean for `check`),
//! 1 otherwise, 2 when inputs cannot be loaded.

use anyhow::{Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use rcp_core::render::{render_plan, render_topology, render_waves};
use rcp_core::{Planner, PlannerConfig, Scenario};
use rcp_kernel::scheduler::{partition_report, UNBOUNDED_WAVE};
use rcp_kernel::topology::analyze;
use rcp_policy::ConstraintSet;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn cli() -> Command {
    let scenario = Arg::new("scenario")
        .required(true)
        .value_parser(value_parser!(PathBuf))
        .help("Scenario file (.json, .yaml or .yml)");
    let max_wave = Arg::new("max-wave")
        .long("max-wave")
        .value_parser(value_parser!(usize))
        .help("Maximum nodes per wave (unbounded when omitted)");
    let json = Arg::new("json")
        .long("json")
        .action(ArgAction::SetTrue)
        .help("Output as JSON");

    Command::new("rcp")
        .version(rcp_core::VERSION)
        .about("Recovery command planner")
        .subcommand_required(true)
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Debug logging unless RUST_LOG is set"),
        )
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON lines on stderr"),
        )
        .subcommand(
            Command::new("plan")
                .about("Run the full planning pipeline")
                .arg(scenario.clone())
                .arg(
                    Arg::new("policy")
                        .long("policy")
                        .value_parser(value_parser!(PathBuf))
                        .help("Constraint set TOML file"),
                )
                .arg(max_wave.clone())
                .arg(json.clone()),
        )
        .subcommand(
            Command::new("check")
                .about("Validate graph structure and print health metrics")
                .arg(scenario.clone())
                .arg(json),
        )
        .subcommand(
            Command::new("waves")
                .about("Print the wave partition")
                .arg(scenario)
                .arg(max_wave),
        )
}

fn init_tracing(verbose: bool, json: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn load_scenario(args: &ArgMatches) -> Result<Scenario> {
    let path = args
        .get_one::<PathBuf>("scenario")
        .context("scenario path is required")?;
    Scenario::load(path).with_context(|| format!("loading scenario {}", path.display()))
}

fn run_plan(args: &ArgMatches) -> Result<bool> {
    let scenario = load_scenario(args)?;

    let constraints = match args.get_one::<PathBuf>("policy") {
        Some(path) => ConstraintSet::load(path)
            .with_context(|| format!("loading constraint set {}", path.display()))?,
        None => ConstraintSet::default(),
    };
    let mut config = PlannerConfig::new().with_constraints(constraints);
    if let Some(&max) = args.get_one::<usize>("max-wave") {
        config = config.with_max_nodes_per_wave(max);
    }

    let report = Planner::new(config).plan(&scenario);
    if args.get_flag("json") {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", render_plan(&report));
    }
    Ok(report.passed())
}

fn run_check(args: &ArgMatches) -> Result<bool> {
    let scenario = load_scenario(args)?;
    let report = analyze(&scenario.to_graph());

    if args.get_flag("json") {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", render_topology(&report));
    }
    Ok(report.issues.is_empty())
}

fn run_waves(args: &ArgMatches) -> Result<bool> {
    let scenario = load_scenario(args)?;
    let limit = args
        .get_one::<usize>("max-wave")
        .copied()
        .unwrap_or(UNBOUNDED_WAVE);
    let report = analyze(&scenario.to_graph());

    print!("{}", render_waves(&partition_report(&report, limit)));
    Ok(report.residual.is_empty())
}

fn run(matches: &ArgMatches) -> Result<bool> {
    match matches.subcommand() {
        Some(("plan", args)) => run_plan(args),
        Some(("check", args)) => run_check(args),
        Some(("waves", args)) => run_waves(args),
        _ => anyhow::bail!("unknown subcommand"),
    }
}

fn main() {
    let matches = cli().get_matches();
    init_tracing(matches.get_flag("verbose"), matches.get_flag("log-json"));

    match run(&matches) {
        Ok(ok) => std::process::exit(i32::from(!ok)),
        Err(err) => {
            tracing::error!("{err:#}");
            eprintln!("error: {err:#}");
            std::process::exit(2);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn scenario_file(body: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        file.write_all(body.as_bytes()).unwrap();
        file
    }

    const CLEAN: &str = r#"{"plan_id":"p","tenant":"t","nodes":[{"id":"a"},{"id":"b","dependencies":[{"node_id":"a","criticality":2,"coupling":0.1}]}]}"#;
    const CYCLIC: &str = r#"{"plan_id":"p","tenant":"t","nodes":[{"id":"x","dependencies":[{"node_id":"y"}]},{"id":"y","dependencies":[{"node_id":"x"}]}]}"#;

    #[test]
    fn cli_definition_is_consistent() {
        cli().debug_assert();
    }

    #[test]
    fn plan_args_parse() {
        let matches = cli()
            .try_get_matches_from(["rcp", "plan", "s.yaml", "--max-wave", "3", "--json", "-v"])
            .unwrap();
        assert!(matches.get_flag("verbose"));
        let (name, args) = matches.subcommand().unwrap();
        assert_eq!(name, "plan");
        assert_eq!(args.get_one::<usize>("max-wave"), Some(&3));
        assert!(args.get_flag("json"));
    }

    #[test]
    fn clean_scenario_passes_all_commands() {
        let file = scenario_file(CLEAN);
        let path = file.path().to_str().unwrap();
        for command in ["plan", "check", "waves"] {
            let matches = cli().try_get_matches_from(["rcp", command, path]).unwrap();
            assert!(run(&matches).unwrap(), "{command} should succeed");
        }
    }

    #[test]
    fn cyclic_scenario_fails_plan_and_check() {
        let file = scenario_file(CYCLIC);
        let path = file.path().to_str().unwrap();
        for command in ["plan", "check"] {
            let matches = cli().try_get_matches_from(["rcp", command, path]).unwrap();
            assert!(!run(&matches).unwrap(), "{command} should fail");
        }
    }

    #[test]
    fn missing_scenario_is_an_error() {
        let matches = cli()
            .try_get_matches_from(["rcp", "check", "/no/such/file.json"])
            .unwrap();
        assert!(run(&matches).is_err());
    }
}
