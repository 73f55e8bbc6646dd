//! Atomic File Writes - temp-write then rename
//!
//! Every file the index produces goes through here, so a crash mid-write can
//! never leave a truncated state file or a half-copied artifact behind.
//!
//! Two shapes are offered:
//! - [`write_atomic`] for a single file (state, readings)
//! - [`StagedFile`] + [`commit_all`] for multi-file commits where every file
//!   must be staged before any of them is renamed into place, and a failed
//!   rename rolls the whole set back (publishing)

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Write `bytes` to `path` atomically.
///
/// Creates the parent directory if needed, writes to a hidden temp sibling,
/// fsyncs it and renames it over `path`.
pub fn write_atomic(path: impl AsRef<Path>, bytes: &[u8]) -> io::Result<()> {
    StagedFile::stage(path, bytes)?.commit()
}

/// A file written to a temp location next to its destination, not yet visible.
///
/// Dropping an uncommitted `StagedFile` removes the temp file.
#[derive(Debug)]
pub struct StagedFile {
    tmp: PathBuf,
    dest: PathBuf,
    committed: bool,
}

impl StagedFile {
    /// Write `bytes` to a temp sibling of `dest`
    pub fn stage(dest: impl AsRef<Path>, bytes: &[u8]) -> io::Result<Self> {
        let dest = dest.as_ref().to_path_buf();

        if let Some(parent) = dest.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let staged = Self {
            tmp: tmp_path(&dest),
            dest,
            committed: false,
        };

        // Leftovers from a crashed run with the same pid are overwritten
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&staged.tmp)?;
        file.write_all(bytes)?;
        file.sync_all()?;

        Ok(staged)
    }

    /// Final destination of this file
    pub fn dest(&self) -> &Path {
        &self.dest
    }

    /// Rename the temp file into place
    pub fn commit(mut self) -> io::Result<()> {
        self.rename_into_place()?;
        fsync_parent(&self.dest)
    }

    fn rename_into_place(&mut self) -> io::Result<()> {
        fs::rename(&self.tmp, &self.dest)?;
        self.committed = true;
        Ok(())
    }
}

/// Commit staged files as one unit: afterwards either every destination
/// holds its new content or every destination is as it was before.
///
/// Existing destinations are moved aside to `.<name>.<pid>.bak` first and
/// restored if any rename fails. Backups are removed once all files landed.
pub fn commit_all(mut files: Vec<StagedFile>) -> io::Result<()> {
    for file in &files {
        if file.dest.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::Other,
                format!("destination is a directory: {}", file.dest.display()),
            ));
        }
    }

    let mut moved: Vec<(PathBuf, Option<PathBuf>)> = Vec::with_capacity(files.len());
    for file in &files {
        let backup = if file.dest.exists() {
            let backup = sibling_path(&file.dest, "bak");
            if let Err(e) = fs::rename(&file.dest, &backup) {
                roll_back(&moved, 0);
                return Err(e);
            }
            Some(backup)
        } else {
            None
        };
        moved.push((file.dest.clone(), backup));
    }

    for (committed, file) in files.iter_mut().enumerate() {
        if let Err(e) = file.rename_into_place() {
            roll_back(&moved, committed);
            return Err(e);
        }
    }

    for (_, backup) in &moved {
        if let Some(backup) = backup {
            let _ = fs::remove_file(backup);
        }
    }

    match files.first() {
        Some(file) => fsync_parent(&file.dest),
        None => Ok(()),
    }
}

/// Undo a partial [`commit_all`]: the first `committed` entries hold new
/// content, every entry with a backup gets it back.
fn roll_back(moved: &[(PathBuf, Option<PathBuf>)], committed: usize) {
    for (i, (dest, backup)) in moved.iter().enumerate() {
        match backup {
            Some(backup) => {
                let _ = fs::rename(backup, dest);
            }
            None if i < committed => {
                let _ = fs::remove_file(dest);
            }
            None => {}
        }
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        if !self.committed {
            let _ = fs::remove_file(&self.tmp);
        }
    }
}

fn tmp_path(dest: &Path) -> PathBuf {
    sibling_path(dest, "tmp")
}

fn sibling_path(dest: &Path, ext: &str) -> PathBuf {
    let name = dest
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    dest.with_file_name(format!(".{}.{}.{}", name, std::process::id(), ext))
}

#[cfg(target_family = "unix")]
fn fsync_parent(path: &Path) -> io::Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    File::open(parent)?.sync_all()
}

#[cfg(not(target_family = "unix"))]
fn fsync_parent(_path: &Path) -> io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn leftover_temps(dir: &Path) -> usize {
        fs::read_dir(dir)
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| {
                let name = e.file_name().to_string_lossy().into_owned();
                name.ends_with(".tmp") || name.ends_with(".bak")
            })
            .count()
    }

    #[test]
    fn test_write_atomic_replaces_content() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");

        write_atomic(&path, b"first").unwrap();
        write_atomic(&path, b"second").unwrap();

        assert_eq!(fs::read(&path).unwrap(), b"second");
        assert_eq!(leftover_temps(dir.path()), 0);
    }

    #[test]
    fn test_write_atomic_creates_parent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/deeper/out.json");

        write_atomic(&path, b"{}").unwrap();

        assert!(path.exists());
    }

    #[test]
    fn test_dropped_stage_leaves_nothing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("card.json");

        let staged = StagedFile::stage(&path, b"data").unwrap();
        assert_eq!(leftover_temps(dir.path()), 1);
        assert!(!path.exists());

        drop(staged);

        assert_eq!(leftover_temps(dir.path()), 0);
        assert!(!path.exists());
    }

    #[test]
    fn test_staged_commit_is_visible() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("card.json");

        let staged = StagedFile::stage(&path, b"data").unwrap();
        assert_eq!(staged.dest(), path.as_path());
        staged.commit().unwrap();

        assert_eq!(fs::read(&path).unwrap(), b"data");
        assert_eq!(leftover_temps(dir.path()), 0);
    }

    #[test]
    fn test_commit_all_replaces_every_file() {
        let dir = tempdir().unwrap();
        let a = dir.path().join("a.png");
        let b = dir.path().join("b.json");
        fs::write(&a, b"old a").unwrap();

        let staged = vec![
            StagedFile::stage(&a, b"new a").unwrap(),
            StagedFile::stage(&b, b"new b").unwrap(),
        ];
        commit_all(staged).unwrap();

        assert_eq!(fs::read(&a).unwrap(), b"new a");
        assert_eq!(fs::read(&b).unwrap(), b"new b");
        assert_eq!(leftover_temps(dir.path()), 0);
    }

    #[test]
    fn test_commit_all_rolls_back_on_failed_rename() {
        let dir = tempdir().unwrap();
        let a = dir.path().join("a.png");
        let b = dir.path().join("b.json");
        let c = dir.path().join("c.json");
        fs::write(&a, b"old a").unwrap();
        fs::write(&c, b"old c").unwrap();

        let staged = vec![
            StagedFile::stage(&a, b"new a").unwrap(),
            StagedFile::stage(&b, b"new b").unwrap(),
            StagedFile::stage(&c, b"new c").unwrap(),
        ];
        // Losing the last temp file makes its rename fail after the first two landed
        fs::remove_file(&staged[2].tmp).unwrap();

        assert!(commit_all(staged).is_err());

        assert_eq!(fs::read(&a).unwrap(), b"old a");
        assert!(!b.exists());
        assert_eq!(fs::read(&c).unwrap(), b"old c");
        assert_eq!(leftover_temps(dir.path()), 0);
    }

    #[test]
    fn test_commit_all_refuses_directory_destination() {
        let dir = tempdir().unwrap();
        let a = dir.path().join("a.png");
        let b = dir.path().join("b.json");
        fs::write(&a, b"old a").unwrap();
        fs::create_dir(&b).unwrap();
        fs::write(b.join("inner"), b"x").unwrap();

        let staged = vec![
            StagedFile::stage(&a, b"new a").unwrap(),
            StagedFile::stage(&b, b"new b").unwrap(),
        ];

        assert!(commit_all(staged).is_err());
        assert_eq!(fs::read(&a).unwrap(), b"old a");
        assert!(b.join("inner").exists());
        assert_eq!(leftover_temps(dir.path()), 0);
    }
}
