//! File-level backup with a mirrored directory layout.
//!
//! Every file about to be rewritten is copied to
//! `<backup_dir>/<path relative to the common ancestor of all backed-up files>`.
//! The mapping is recomputed from the absolute originals on restore, so a
//! [`BackupResult`] is all that is needed to undo a write.

use anyhow::{Context, Result, bail};
use blake3::Hasher as Blake3;
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    fs::{self, File},
    io::Read,
    path::{Component, Path, PathBuf},
};
use tracing::{debug, info, warn};

/// Backup directory used when the caller does not name one.
pub const DEFAULT_BACKUP_DIR: &str = ".uic-backup";

/// Snapshot taken before a destructive write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupResult {
    /// Absolute backup root.
    pub backup_dir: PathBuf,
    /// Absolute paths of the original files.
    pub files: Vec<PathBuf>,
    /// `blake3:<hex>` of each backed-up copy, keyed by original path.
    #[serde(default)]
    pub checksums: BTreeMap<PathBuf, String>,
}

/// Deepest directory containing every path in `paths`.
///
/// Works on path components only and never touches the filesystem. Each
/// path contributes its parent directory, so a single file yields its own
/// directory. Returns `None` for an empty input.
pub fn common_ancestor<P: AsRef<Path>>(paths: &[P]) -> Option<PathBuf> {
    let mut dirs = paths.iter().map(|p| {
        let p = p.as_ref();
        p.parent().unwrap_or(p).components().collect::<Vec<Component<'_>>>()
    });

    let mut prefix = dirs.next()?;
    for comps in dirs {
        let shared = prefix
            .iter()
            .zip(comps.iter())
            .take_while(|(a, b)| a == b)
            .count();
        prefix.truncate(shared);
    }

    Some(prefix.iter().map(|c| c.as_os_str()).collect())
}

/// Path of `file` under `ancestor`, as stored in the backup tree.
fn relative_to(file: &Path, ancestor: &Path) -> Result<PathBuf> {
    let rel = file.strip_prefix(ancestor).with_context(|| {
        format!(
            "{} is not under backup ancestor {}",
            file.display(),
            ancestor.display()
        )
    })?;
    if rel.as_os_str().is_empty() {
        bail!("cannot back up a directory root: {}", file.display());
    }
    Ok(rel.to_path_buf())
}

fn absolutize(p: &Path) -> Result<PathBuf> {
    std::path::absolute(p).with_context(|| format!("resolve absolute path: {}", p.display()))
}

/// Copy `file_paths` into a mirrored tree under `backup_dir`
/// (default [`DEFAULT_BACKUP_DIR`], resolved against the working directory).
pub fn create_backup<P: AsRef<Path>>(
    file_paths: &[P],
    backup_dir: Option<&Path>,
) -> Result<BackupResult> {
    let backup_dir = absolutize(backup_dir.unwrap_or(Path::new(DEFAULT_BACKUP_DIR)))?;

    let already_populated = fs::read_dir(&backup_dir)
        .map(|mut entries| entries.next().is_some())
        .unwrap_or(false);
    if already_populated {
        warn!(
            dir = %backup_dir.display(),
            "backup directory is not empty; files from an earlier backup may be overwritten"
        );
    }

    fs::create_dir_all(&backup_dir)
        .with_context(|| format!("create backup dir: {}", backup_dir.display()))?;

    let files: IndexSet<PathBuf> = file_paths
        .iter()
        .map(|p| absolutize(p.as_ref()))
        .collect::<Result<_>>()?;
    let files: Vec<PathBuf> = files.into_iter().collect();

    let mut checksums = BTreeMap::new();
    if let Some(ancestor) = common_ancestor(&files) {
        for file in &files {
            let rel = relative_to(file, &ancestor)?;
            let target = backup_dir.join(&rel);

            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("create backup parent: {}", parent.display()))?;
            }
            fs::copy(file, &target)
                .with_context(|| format!("copy file to backup: {}", target.display()))?;

            checksums.insert(file.clone(), stream_blake3(&target)?);
            debug!(file = %file.display(), backup = %target.display(), "backed up");
        }
    }

    info!(dir = %backup_dir.display(), files = files.len(), "backup created");
    Ok(BackupResult {
        backup_dir,
        files,
        checksums,
    })
}

/// Copy every backed-up file over its original location.
///
/// Safe to repeat. A backup copy whose checksum no longer matches is refused
/// before anything is overwritten.
pub fn restore_backup(result: &BackupResult) -> Result<()> {
    let Some(ancestor) = common_ancestor(&result.files) else {
        return Ok(());
    };

    let mut plan = Vec::with_capacity(result.files.len());
    for file in &result.files {
        let source = result.backup_dir.join(relative_to(file, &ancestor)?);
        if let Some(expected) = result.checksums.get(file) {
            let actual = stream_blake3(&source)?;
            if &actual != expected {
                bail!(
                    "backup copy {} does not match its checksum (expected {}, found {})",
                    source.display(),
                    expected,
                    actual
                );
            }
        }
        plan.push((source, file));
    }

    for (source, file) in plan {
        if let Some(parent) = file.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create restore parent: {}", parent.display()))?;
        }
        fs::copy(&source, file)
            .with_context(|| format!("restore {} from {}", file.display(), source.display()))?;
    }

    info!(dir = %result.backup_dir.display(), files = result.files.len(), "backup restored");
    Ok(())
}

/// Remove the backup tree; a missing directory is not an error.
pub fn cleanup_backup(result: &BackupResult) -> Result<()> {
    match fs::remove_dir_all(&result.backup_dir) {
        Ok(()) => {
            debug!(dir = %result.backup_dir.display(), "backup removed");
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(anyhow::Error::new(e)
            .context(format!("remove backup dir: {}", result.backup_dir.display()))),
    }
}

/// Stream a file into a blake3 digest as `blake3:<hex>`.
fn stream_blake3(path: &Path) -> Result<String> {
    let mut f =
        File::open(path).with_context(|| format!("open for checksum: {}", path.display()))?;
    let mut hasher = Blake3::new();
    let mut buf = [0u8; 64 * 1024];
    loop {
        let n = f.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(format!("blake3:{}", hasher.finalize().to_hex()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn ancestor_of_nested_paths() {
        let paths = [
            PathBuf::from("/repo/src/app/a.tsx"),
            PathBuf::from("/repo/src/b.tsx"),
            PathBuf::from("/repo/src/app/deep/c.vue"),
        ];
        assert_eq!(common_ancestor(&paths), Some(PathBuf::from("/repo/src")));
    }

    #[test]
    fn ancestor_of_single_file_is_its_parent() {
        let paths = [PathBuf::from("/repo/src/a.tsx")];
        assert_eq!(common_ancestor(&paths), Some(PathBuf::from("/repo/src")));
    }

    #[test]
    fn ancestor_ignores_shared_name_prefixes() {
        let paths = [PathBuf::from("/w/app/x.ts"), PathBuf::from("/w/apple/y.ts")];
        assert_eq!(common_ancestor(&paths), Some(PathBuf::from("/w")));
        let none: [PathBuf; 0] = [];
        assert_eq!(common_ancestor(&none), None);
    }

    #[test]
    fn backup_mirrors_tree_and_restores() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        fs::create_dir_all(root.join("src/pages")).unwrap();
        fs::write(root.join("src/App.tsx"), "<App/>").unwrap();
        fs::write(root.join("src/pages/Home.tsx"), "<Home/>").unwrap();

        let files = [root.join("src/App.tsx"), root.join("src/pages/Home.tsx")];
        let dir = root.join(".bk");
        let backup = create_backup(&files, Some(dir.as_path())).unwrap();

        assert_eq!(backup.files.len(), 2);
        assert_eq!(
            fs::read_to_string(root.join(".bk/pages/Home.tsx")).unwrap(),
            "<Home/>"
        );

        fs::write(root.join("src/App.tsx"), "changed").unwrap();
        fs::remove_file(root.join("src/pages/Home.tsx")).unwrap();
        restore_backup(&backup).unwrap();
        restore_backup(&backup).unwrap();

        assert_eq!(fs::read_to_string(root.join("src/App.tsx")).unwrap(), "<App/>");
        assert_eq!(
            fs::read_to_string(root.join("src/pages/Home.tsx")).unwrap(),
            "<Home/>"
        );
    }

    #[test]
    fn duplicate_inputs_are_backed_up_once() {
        let tmp = TempDir::new().unwrap();
        let f = tmp.path().join("a.html");
        fs::write(&f, "<p>").unwrap();

        let dir = tmp.path().join("bk");
        let backup = create_backup(&[f.clone(), f.clone()], Some(dir.as_path())).unwrap();
        assert_eq!(backup.files, vec![f]);
        assert!(tmp.path().join("bk/a.html").exists());
    }

    #[test]
    fn corrupted_copy_is_refused() {
        let tmp = TempDir::new().unwrap();
        let f = tmp.path().join("src/a.tsx");
        fs::create_dir_all(f.parent().unwrap()).unwrap();
        fs::write(&f, "original").unwrap();

        let dir = tmp.path().join("bk");
        let backup = create_backup(&[f.clone()], Some(dir.as_path())).unwrap();
        fs::write(tmp.path().join("bk/a.tsx"), "tampered").unwrap();
        fs::write(&f, "edited").unwrap();

        assert!(restore_backup(&backup).is_err());
        assert_eq!(fs::read_to_string(&f).unwrap(), "edited");
    }

    #[test]
    fn cleanup_is_idempotent() {
        let tmp = TempDir::new().unwrap();
        let f = tmp.path().join("a.vue");
        fs::write(&f, "<template/>").unwrap();

        let dir = tmp.path().join("bk");
        let backup = create_backup(&[f], Some(dir.as_path())).unwrap();
        assert!(backup.backup_dir.exists());
        cleanup_backup(&backup).unwrap();
        assert!(!backup.backup_dir.exists());
        cleanup_backup(&backup).unwrap();
    }
}
