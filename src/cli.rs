use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Shared application context for global flags
#[derive(Clone, Debug)]
pub struct AppContext {
    pub quiet: bool,    // global --quiet
    pub no_color: bool, // global --no-color
    pub dry_run: bool,  // global --dry-run
}

#[derive(Parser)]
#[command(name = "uic")]
#[command(about = "Injects stable data-agent-id attributes into JSX/HTML source and emits unified diffs")]
#[command(version, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Suppress non-essential output
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Show what would be done without executing (wins over --write)
    #[arg(long, global = true)]
    pub dry_run: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Annotate source files from a discovered element list
    Annotate(AnnotateArgs),

    /// Initialize a uic.toml config file
    Init(InitArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Debug, Clone, Args)]
pub struct AnnotateArgs {
    /// Element list (JSON array, or an object with an `elements` array)
    pub elements: PathBuf,

    /// Directory relative `filePath` entries are resolved against
    #[arg(long, default_value = ".")]
    pub root: PathBuf,

    /// Write annotated files (backed up first)
    #[arg(long)]
    pub write: bool,

    /// Backup directory (overrides config `backup_dir`)
    #[arg(long)]
    pub backup_dir: Option<PathBuf>,

    /// Print a single-line JSON report instead of diffs
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser)]
pub struct InitArgs {
    /// Directory to initialize config in
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Overwrite existing config file
    #[arg(long)]
    pub force: bool,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

#[derive(Parser)]
pub struct CompletionsArgs {
    /// Target shell
    #[arg(value_enum)]
    pub shell: Shell,

    /// Output directory; if omitted and --stdout not set, prints error
    #[arg(long)]
    pub out_dir: Option<PathBuf>,

    /// Print completion script to stdout instead of a file
    #[arg(long)]
    pub stdout: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_follow_subcommand() {
        let cli = Cli::try_parse_from([
            "uic", "annotate", "els.json", "--write", "--dry-run", "--root", "app",
        ])
        .unwrap();
        assert!(cli.dry_run);
        let Commands::Annotate(args) = cli.command else {
            panic!("expected annotate");
        };
        assert!(args.write);
        assert_eq!(args.root, PathBuf::from("app"));
        assert_eq!(args.elements, PathBuf::from("els.json"));
    }
}
