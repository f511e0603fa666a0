use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use floating_tiles::sim::{Scenario, ScenarioError, SimHost};
use floating_tiles::tracing_sub;
use floating_tiles::{Config, Directive, EventAdapter, Window};
use tracing::Level;

#[derive(Parser, Debug)]
#[command(
    name = "tiles-replay",
    version = env!("CARGO_PKG_VERSION"),
    about = "Replay a window-manager scenario through the overlap policy"
)]
struct ReplayCli {
    /// Scenario file (JSON).
    #[arg(value_name = "SCENARIO")]
    scenario: PathBuf,

    /// Policy configuration (JSON). Defaults apply to anything missing.
    #[arg(short = 'c', long = "config", value_name = "PATH")]
    config: Option<PathBuf>,

    /// Log every evaluation step.
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH")]
    log_file: Option<PathBuf>,
}

fn main() -> ExitCode {
    let args = ReplayCli::parse();

    if let Some(path) = &args.log_file
        && let Err(err) = tracing_sub::log_to_file(path)
    {
        eprintln!("tiles-replay: cannot open log file {}: {err}", path.display());
        return ExitCode::FAILURE;
    }
    tracing_sub::init_default(if args.verbose {
        Level::DEBUG
    } else {
        Level::WARN
    });

    let config = match &args.config {
        Some(path) => match Config::load(path) {
            Ok(config) => config,
            Err(err) => {
                eprintln!("tiles-replay: {}: {err}", path.display());
                return ExitCode::FAILURE;
            }
        },
        None => Config::default(),
    };

    match run(&args, config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("tiles-replay: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &ReplayCli, config: Config) -> Result<(), ScenarioError> {
    let scenario = Scenario::load(&args.scenario)?;
    let mut adapter = EventAdapter::new(scenario.host()?, config);

    let mut applied = adapter.start();
    applied.extend(adapter.pump());
    report("start", &applied);

    for (index, step) in scenario.steps.iter().enumerate() {
        step.apply(adapter.host_mut())?;
        let applied = adapter.pump();
        report(&format!("step {}: {step:?}", index + 1), &applied);
    }

    print_final_state(adapter.host());
    Ok(())
}

fn report(label: &str, applied: &[Directive<u32>]) {
    println!("{label}");
    if applied.is_empty() {
        println!("  (no directives)");
    }
    for directive in applied {
        println!("  {directive}");
    }
}

fn print_final_state(host: &SimHost) {
    println!("final state (desktop {})", host.desktop());
    for window in host.all_windows().iter().rev() {
        let marker = if host.active() == Some(window.id()) {
            '*'
        } else if window.is_minimized() {
            '_'
        } else {
            ' '
        };
        println!(
            "  {marker} {:>4} {:<16} {}",
            window.id(),
            window.application_class(),
            window.caption()
        );
    }
}
