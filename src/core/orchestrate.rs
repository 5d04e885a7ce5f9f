//! Batch driver: groups elements per file, annotates, diffs and optionally
//! writes the results behind a backup.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::core::annotate::{AnnotationResult, AnnotationTarget, annotate_source};
use crate::core::backup::{BackupResult, create_backup};
use crate::core::diff::FilePatch;
use crate::infra::elements::ElementRecord;
use crate::infra::io::{read_source, write_atomic};

#[derive(Debug, Clone)]
pub struct AnnotateOptions {
    /// Never touch the filesystem, even with `write` set
    pub dry_run: bool,
    pub write: bool,
    /// Backup root; [`crate::core::backup::DEFAULT_BACKUP_DIR`] when `None`
    pub backup_dir: Option<PathBuf>,
    /// Patch paths are shown relative to this directory when possible
    pub display_root: Option<PathBuf>,
}

impl Default for AnnotateOptions {
    fn default() -> Self {
        Self {
            dry_run: true,
            write: false,
            backup_dir: None,
            display_root: None,
        }
    }
}

impl AnnotateOptions {
    fn writes(&self) -> bool {
        self.write && !self.dry_run
    }
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotateResult {
    pub patches: Vec<FilePatch>,
    pub total_applied: usize,
    pub total_skipped: usize,
    pub files_modified: usize,
    /// Files that could not be read; they contribute nothing else
    pub read_failures: Vec<PathBuf>,
    /// Present only when files were written
    pub backup: Option<BackupResult>,
}

#[derive(Debug, thiserror::Error)]
pub enum AnnotateError {
    #[error("backup failed; no file was written")]
    Backup(#[source] anyhow::Error),

    /// Files before `path` have already been replaced; restore from `backup`.
    #[error("failed to write {path}")]
    Write {
        path: PathBuf,
        backup: BackupResult,
        #[source]
        source: anyhow::Error,
    },
}

impl AnnotateError {
    /// Backup to restore from, if the failure happened after one was taken.
    pub fn backup(&self) -> Option<&BackupResult> {
        match self {
            AnnotateError::Backup(_) => None,
            AnnotateError::Write { backup, .. } => Some(backup),
        }
    }
}

enum FileOutcome {
    Unreadable,
    Annotated(AnnotationResult),
}

/// Annotate every file referenced by `elements`.
///
/// Files are processed in parallel; the result keeps the order in which each
/// file first appears in `elements`. Writing only happens when
/// `opts.write && !opts.dry_run`, and only after every modified file has been
/// backed up.
#[instrument(skip_all, fields(elements = elements.len(), write = opts.writes()))]
pub fn annotate_files(
    elements: &[ElementRecord],
    opts: &AnnotateOptions,
) -> Result<AnnotateResult, AnnotateError> {
    let mut groups: IndexMap<&Path, Vec<AnnotationTarget>> = IndexMap::new();
    for el in elements {
        groups
            .entry(el.file_path.as_path())
            .or_default()
            .push(el.to_target());
    }
    debug!(files = groups.len(), "grouped elements by file");

    let groups: Vec<(&Path, Vec<AnnotationTarget>)> = groups.into_iter().collect();
    let outcomes: Vec<(&Path, FileOutcome)> = groups
        .into_par_iter()
        .map(|(path, targets)| match read_source(path) {
            Ok(source) => (path, FileOutcome::Annotated(annotate_source(&source, &targets))),
            Err(e) => {
                warn!(file = %path.display(), "skipping unreadable file: {e:#}");
                (path, FileOutcome::Unreadable)
            }
        })
        .collect();

    let mut result = AnnotateResult::default();
    let mut pending: Vec<(&Path, usize)> = Vec::new();

    for (path, outcome) in outcomes {
        let annotated = match outcome {
            FileOutcome::Unreadable => {
                result.read_failures.push(path.to_path_buf());
                continue;
            }
            FileOutcome::Annotated(a) => a,
        };

        result.total_applied += annotated.annotations_applied;
        result.total_skipped += annotated.annotations_skipped;
        if !annotated.modified {
            continue;
        }

        result.files_modified += 1;
        let patch = FilePatch::new(
            display_path(path, opts.display_root.as_deref()),
            annotated.original_source,
            annotated.annotated_source,
        );
        pending.push((path, result.patches.len()));
        result.patches.push(patch);
    }

    if opts.writes() && !pending.is_empty() {
        let paths: Vec<&Path> = pending.iter().map(|(p, _)| *p).collect();
        let backup =
            create_backup(&paths, opts.backup_dir.as_deref()).map_err(AnnotateError::Backup)?;

        for (path, idx) in &pending {
            let contents = &result.patches[*idx].modified;
            if let Err(source) = write_atomic(path, contents.as_bytes()) {
                return Err(AnnotateError::Write {
                    path: path.to_path_buf(),
                    backup,
                    source,
                });
            }
            debug!(file = %path.display(), "wrote annotated file");
        }

        info!(files = pending.len(), "annotated files written");
        result.backup = Some(backup);
    }

    Ok(result)
}

fn display_path(path: &Path, root: Option<&Path>) -> String {
    let shown = root
        .and_then(|r| path.strip_prefix(r).ok())
        .unwrap_or(path);
    shown.to_string_lossy().replace('\\', "/")
}
