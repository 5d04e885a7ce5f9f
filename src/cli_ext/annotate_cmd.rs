//! `uic annotate`: load elements, run the orchestrator, report.
//!
//! Diffs (or the JSON report) go to stdout; every human-facing message goes
//! to stderr so the patch stream can be piped straight into `git apply`.

use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use serde::Serialize;
use tracing::{info, warn};

use crate::cli::{AnnotateArgs, AppContext};
use crate::core::backup::{BackupResult, cleanup_backup, restore_backup};
use crate::core::orchestrate::{AnnotateOptions, AnnotateResult, annotate_files};
use crate::infra::config::load_config;
use crate::infra::elements::load_elements;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Report<'a> {
    dry_run: bool,
    #[serde(flatten)]
    result: &'a AnnotateResult,
}

pub fn run(args: AnnotateArgs, ctx: &AppContext) -> Result<()> {
    let config = load_config()?;

    let root = std::path::absolute(&args.root)
        .with_context(|| format!("resolve --root {}", args.root.display()))?;
    let elements = load_elements(&args.elements, &root)?;

    let dry_run = ctx.dry_run || !args.write;
    let opts = AnnotateOptions {
        dry_run,
        write: args.write,
        backup_dir: Some(args.backup_dir.unwrap_or(config.backup_dir)),
        display_root: Some(root),
    };

    let result = match annotate_files(&elements, &opts) {
        Ok(result) => result,
        Err(err) => {
            if let Some(backup) = err.backup() {
                restore_backup(backup).with_context(|| {
                    format!(
                        "{err}; restoring from {} also failed",
                        backup.backup_dir.display()
                    )
                })?;
                if !ctx.quiet {
                    eprintln!("Restored original files from {}", backup.backup_dir.display());
                }
            }
            return Err(err.into());
        }
    };

    if args.json {
        let report = Report { dry_run, result: &result };
        println!("{}", serde_json::to_string(&report).context("serialize report")?);
    } else if dry_run {
        for (i, patch) in result.patches.iter().enumerate() {
            if i > 0 {
                println!();
            }
            print!("{}", patch.diff);
        }
    }

    if !dry_run {
        if let Some(backup) = &result.backup {
            if config.keep_backup {
                info!(dir = %backup.backup_dir.display(), "keeping backup");
            } else {
                discard_backup(backup);
            }
        }
    }

    if !ctx.quiet {
        report_summary(&result, dry_run, ctx);
    }
    Ok(())
}

/// Remove a backup whose files were all written; a failure is only logged.
fn discard_backup(backup: &BackupResult) -> bool {
    match cleanup_backup(backup) {
        Ok(()) => true,
        Err(e) => {
            warn!(dir = %backup.backup_dir.display(), "could not remove backup: {e:#}");
            false
        }
    }
}

fn report_summary(result: &AnnotateResult, dry_run: bool, ctx: &AppContext) {
    let summary = if dry_run {
        format!(
            "{} annotation(s) would be applied across {} file(s)",
            result.total_applied, result.files_modified
        )
    } else {
        format!(
            "Applied {} annotation(s) across {} file(s)",
            result.total_applied, result.files_modified
        )
    };

    if ctx.no_color {
        eprintln!("{summary}");
    } else if dry_run {
        eprintln!("{}", summary.yellow());
    } else {
        eprintln!("{} {}", "✓".green(), summary);
    }

    if result.total_skipped > 0 {
        eprintln!("{} target(s) already annotated", result.total_skipped);
    }
    if !result.read_failures.is_empty() {
        eprintln!("{} file(s) could not be read", result.read_failures.len());
    }
}
