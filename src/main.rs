use std::io;

use clap::Parser;
use smartwatch::capture::{self, smartctl::SmartctlSource};
use smartwatch::check::{self, Outcome, SavePolicy};
use smartwatch::cli::{CheckArgs, Cli, Command, DiffArgs};
use smartwatch::config::Config;
use smartwatch::diff::{self, Differences};
use smartwatch::error::{Error, Result};
use smartwatch::prompt;
use smartwatch::report::{self, Comparison};
use smartwatch::store::Store;
use tracing::{debug, Level};

fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::WARN };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn smartctl_source(config: &Config) -> Result<SmartctlSource> {
    let source = SmartctlSource::new(&config.smartctl);
    if !source.available() {
        return Err(Error::ToolUnavailable(config.smartctl.binary.clone()));
    }
    Ok(source)
}

fn print_comparison(comparison: &Comparison, json: bool) {
    print_rendered(&report::render(comparison, json), json);
}

fn print_rendered(rendered: &str, json: bool) {
    if json {
        println!("{rendered}");
    } else {
        print!("{rendered}");
    }
}

fn run_check(config: &Config, args: &CheckArgs) -> Result<()> {
    let source = smartctl_source(config)?;
    let store = Store::new(config.store.resolve_dir()?);

    let current = capture::run(&source, &config.filter)?;
    let previous = store.load_latest()?;
    let outcome = check::evaluate(previous.as_ref(), &current);

    match &previous {
        None => {
            let store_dir = store.dir().display().to_string();
            print_rendered(
                &report::render_first_run(&store_dir, &current.timestamp, args.json),
                args.json,
            );
        }
        Some(previous) => {
            let unchanged = Differences::default();
            let differences = match &outcome {
                Outcome::Changed(differences) => differences,
                _ => &unchanged,
            };
            print_comparison(
                &Comparison {
                    from: &previous.timestamp,
                    to: &current.timestamp,
                    differences,
                },
                args.json,
            );
        }
    }

    let policy = SavePolicy::from_flags(args.yes, args.no_save);
    let save = check::should_save(&outcome, policy, || {
        println!();
        let stdin = io::stdin();
        let mut input = stdin.lock();
        // keep the question off stdout when stdout is JSON
        let answered = if args.json {
            prompt::confirm("Commit S.M.A.R.T. changes", &mut input, &mut io::stderr())
        } else {
            prompt::confirm("Commit S.M.A.R.T. changes", &mut input, &mut io::stdout())
        };
        answered.map_err(Error::Prompt)
    })?;

    if save {
        check::persist(&store, &config.store, &current)?;
        debug!(timestamp = %current.timestamp, "snapshot saved");
    } else {
        eprintln!("Snapshot not saved.");
    }

    Ok(())
}

fn run_capture(config: &Config) -> Result<()> {
    let source = smartctl_source(config)?;
    let snapshot = capture::run(&source, &config.filter)?;
    println!("{}", report::json::render_snapshot(&snapshot));
    Ok(())
}

fn run_diff(config: &Config, args: &DiffArgs) -> Result<()> {
    let store = Store::new(config.store.resolve_dir()?);
    let history = store.load_history()?;

    if history.len() < 2 {
        eprintln!("Need at least 2 snapshots to compare. Run 'smartwatch check' a few times.");
        std::process::exit(1);
    }

    let Some(older) = history.nth_back(args.from) else {
        eprintln!("No snapshot at offset {} (history has {}).", args.from, history.len());
        std::process::exit(1);
    };
    let Some(newer) = history.nth_back(args.to) else {
        eprintln!("No snapshot at offset {} (history has {}).", args.to, history.len());
        std::process::exit(1);
    };

    let differences = diff::compare_snapshots(older, newer);
    print_comparison(
        &Comparison {
            from: &older.timestamp,
            to: &newer.timestamp,
            differences: &differences,
        },
        args.json,
    );
    Ok(())
}

fn run_history(config: &Config) -> Result<()> {
    let store = Store::new(config.store.resolve_dir()?);
    let history = store.load_history()?;
    print!("{}", report::text::render_history(&history));
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        None => run_check(&config, &CheckArgs::default()),
        Some(Command::Check(args)) => run_check(&config, &args),
        Some(Command::Capture) => run_capture(&config),
        Some(Command::Diff(args)) => run_diff(&config, &args),
        Some(Command::History) => run_history(&config),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
