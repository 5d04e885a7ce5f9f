use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;
use uic::cli::{AppContext, Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Build a context once, pass everywhere
    let ctx = AppContext {
        quiet: cli.quiet,
        no_color: cli.no_color,
        dry_run: cli.dry_run,
    };

    // Logs share stderr with the summary; stdout carries only patches/JSON
    let default_level = if ctx.quiet { "error" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(!ctx.no_color)
        .with_target(false)
        .init();

    match cli.command {
        Commands::Annotate(args) => uic::annotate_run(args, &ctx),
        Commands::Init(args) => uic::infra::config::init(args, &ctx),
        Commands::Completions(args) => uic::completion::run(args, &ctx),
    }
}
