use anyhow::{Context, Result};
use std::fs;
use std::io::Write;
use std::path::Path;

/// Read a source file as UTF-8.
pub fn read_source<P: AsRef<Path>>(path: P) -> Result<String> {
    let path = path.as_ref();
    fs::read_to_string(path).with_context(|| format!("Failed to read file {}", path.display()))
}

/// Atomic write with robust temp file strategy
pub fn write_atomic(path: &Path, data: &[u8]) -> Result<()> {
    // Prefer same-dir tempfile so the final rename stays on one filesystem
    let dir = path.parent().unwrap_or_else(|| Path::new("."));

    // Preserve original permissions
    let perms = fs::metadata(path).map(|m| m.permissions()).ok();

    let tmp = tempfile::NamedTempFile::new_in(dir)
        .with_context(|| format!("create temp file in {}", dir.display()))?;

    let mut file = tmp.as_file();
    file.write_all(data)
        .with_context(|| format!("write temp file for {}", path.display()))?;
    file.sync_all()?;

    if let Some(perms) = perms {
        fs::set_permissions(tmp.path(), perms).context("set temp permissions")?;
    }

    // Atomically replace the destination
    match tmp.persist(path) {
        Ok(_) => {}
        Err(e) => {
            // Rename refused (e.g. cross-device); copy the finished bytes instead
            fs::copy(e.file.path(), path)
                .with_context(|| format!("replace {}", path.display()))?;
        }
    }

    // fsync parent dir to ensure durability on Unix
    #[cfg(unix)]
    {
        if let Ok(parent_file) = fs::File::open(dir) {
            let _ = parent_file.sync_all();
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn write_atomic_replaces_contents() {
        let tmp = TempDir::new().unwrap();
        let p = tmp.path().join("App.tsx");
        fs::write(&p, "<App/>\n").unwrap();

        write_atomic(&p, b"<App data-agent-id=\"app\"/>\n").unwrap();
        assert_eq!(read_source(&p).unwrap(), "<App data-agent-id=\"app\"/>\n");
        assert_eq!(fs::read_dir(tmp.path()).unwrap().count(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn write_atomic_keeps_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = TempDir::new().unwrap();
        let p = tmp.path().join("run.html");
        fs::write(&p, "<p>").unwrap();
        fs::set_permissions(&p, fs::Permissions::from_mode(0o640)).unwrap();

        write_atomic(&p, b"<p id=\"x\">").unwrap();
        let mode = fs::metadata(&p).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o640);
    }

    #[test]
    fn read_source_names_missing_file() {
        let err = read_source("/definitely/not/here.tsx").unwrap_err();
        assert!(format!("{err:#}").contains("here.tsx"));
    }
}
