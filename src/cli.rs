use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "smartwatch")]
#[command(about = "Tracks S.M.A.R.T. attribute changes on attached drives")]
#[command(version)]
pub struct Cli {
    /// Config file (defaults to the platform config dir)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Show debug logging on stderr
    #[arg(long, short = 'v', global = true, default_value_t = false)]
    pub verbose: bool,

    /// Defaults to `check` when omitted
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Capture a snapshot, compare it with the last saved one and save it
    Check(CheckArgs),

    /// Capture a snapshot and print it as JSON without saving
    Capture,

    /// Compare two snapshots from the history log
    Diff(DiffArgs),

    /// List snapshots in the history log
    History,
}

#[derive(Args, Default)]
pub struct CheckArgs {
    /// Save the new snapshot without asking, even if something changed
    #[arg(long, short = 'y', default_value_t = false)]
    pub yes: bool,

    /// Never save the new snapshot
    #[arg(long, default_value_t = false)]
    pub no_save: bool,

    /// Output the comparison as JSON
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Args)]
pub struct DiffArgs {
    /// Older snapshot, as offset back from the newest
    #[arg(long, default_value_t = 1)]
    pub from: usize,

    /// Newer snapshot, as offset back from the newest
    #[arg(long, default_value_t = 0)]
    pub to: usize,

    /// Output as JSON
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn bare_invocation_has_no_subcommand() {
        let cli = Cli::try_parse_from(["smartwatch"]).unwrap();
        assert!(cli.command.is_none());
        assert!(!cli.verbose);
    }

    #[test]
    fn diff_offsets_default_to_last_two() {
        let cli = Cli::try_parse_from(["smartwatch", "diff"]).unwrap();
        let Some(Command::Diff(args)) = cli.command else {
            panic!("expected diff");
        };
        assert_eq!((args.from, args.to), (1, 0));
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["smartwatch", "check", "-y", "-v", "--config", "/etc/sw.toml"]).unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.config, Some(PathBuf::from("/etc/sw.toml")));
        let Some(Command::Check(args)) = cli.command else {
            panic!("expected check");
        };
        assert!(args.yes && !args.no_save);
    }
}
