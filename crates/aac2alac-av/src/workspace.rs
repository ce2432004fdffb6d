//! Scratch space and atomic finalization for one conversion.
//!
//! A [`Workspace`] owns a private temporary directory the engine writes into.
//! Only [`Workspace::finalize`] touches the destination, and the directory is
//! removed when the workspace is dropped, however the conversion ended.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::request::OverwritePolicy;
use crate::{Error, Result};

/// Prefix for scratch directories, so stray ones are recognisable.
const SCRATCH_PREFIX: &str = ".aac2alac-";

/// Workspace for one conversion.
///
/// # Example
///
/// ```no_run
/// use aac2alac_av::{OverwritePolicy, Workspace};
///
/// let workspace = Workspace::new(std::path::Path::new("/media/clip.mov")).unwrap();
/// // ... run the engine, writing to workspace.output() ...
/// workspace.finalize(OverwritePolicy::Allow).unwrap();
/// ```
#[derive(Debug)]
pub struct Workspace {
    temp_dir: TempDir,
    destination: PathBuf,
}

impl Workspace {
    /// Create a scratch directory for producing `destination`.
    ///
    /// The directory is placed next to the destination when its parent
    /// exists, so the final rename stays on one filesystem. Otherwise the
    /// system temp directory is used.
    pub fn new(destination: &Path) -> Result<Self> {
        let parent = destination
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));

        let mut builder = tempfile::Builder::new();
        builder.prefix(SCRATCH_PREFIX);
        let temp_dir = if parent.is_dir() {
            builder.tempdir_in(parent)
        } else {
            builder.tempdir()
        }
        .map_err(|e| Error::workspace(format!("failed to create scratch dir: {e}")))?;

        tracing::debug!("scratch dir: {}", temp_dir.path().display());

        Ok(Self {
            temp_dir,
            destination: destination.to_path_buf(),
        })
    }

    /// Where the engine should write (same file name as the destination).
    pub fn output(&self) -> PathBuf {
        let file_name = self
            .destination
            .file_name()
            .unwrap_or_else(|| std::ffi::OsStr::new("output.mov"));
        self.temp_dir.path().join(file_name)
    }

    /// Path to the scratch directory.
    pub fn temp_dir(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Move the scratch output into place.
    ///
    /// The destination is either fully replaced or left as it was. The
    /// scratch directory is removed in both cases.
    ///
    /// # Errors
    ///
    /// - [`Error::Workspace`] if the scratch output is missing or empty, or
    ///   the move fails.
    /// - [`Error::DestinationExists`] if `policy` is
    ///   [`OverwritePolicy::Forbid`] and the destination appeared meanwhile.
    pub fn finalize(self, policy: OverwritePolicy) -> Result<PathBuf> {
        let output = self.output();
        let dest = &self.destination;

        match fs::metadata(&output) {
            Ok(meta) if meta.is_file() && meta.len() > 0 => {}
            Ok(_) => {
                return Err(Error::workspace(format!(
                    "engine produced an empty output: {}",
                    output.display()
                )))
            }
            Err(e) => {
                return Err(Error::workspace(format!(
                    "output file does not exist: {} ({e})",
                    output.display()
                )))
            }
        }

        if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                Error::workspace(format!("failed to create {}: {e}", parent.display()))
            })?;
        }

        if policy == OverwritePolicy::Forbid && dest.exists() {
            return Err(Error::DestinationExists { path: dest.clone() });
        }

        // Try rename first (same filesystem), fall back to copy+persist.
        if let Err(rename_err) = fs::rename(&output, dest) {
            tracing::debug!("rename failed ({rename_err}), copying instead");
            copy_into_place(&output, dest, policy).map_err(|e| match e {
                CopyError::Exists => Error::DestinationExists { path: dest.clone() },
                CopyError::Io(e) => {
                    Error::workspace(format!("failed to move output to {}: {e}", dest.display()))
                }
            })?;
        }

        Ok(dest.clone())
    }
}

#[derive(Debug)]
enum CopyError {
    Exists,
    Io(io::Error),
}

impl From<io::Error> for CopyError {
    fn from(e: io::Error) -> Self {
        CopyError::Io(e)
    }
}

/// Copy `src` into a temp file beside `dest`, then persist it atomically.
fn copy_into_place(
    src: &Path,
    dest: &Path,
    policy: OverwritePolicy,
) -> std::result::Result<(), CopyError> {
    let dir = dest
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    let mut staged = tempfile::Builder::new()
        .prefix(SCRATCH_PREFIX)
        .tempfile_in(dir)?;
    io::copy(&mut fs::File::open(src)?, staged.as_file_mut())?;
    staged.as_file().sync_all()?;

    match policy {
        OverwritePolicy::Allow => {
            staged.persist(dest).map_err(|e| CopyError::Io(e.error))?;
        }
        OverwritePolicy::Forbid => match staged.persist_noclobber(dest) {
            Ok(_) => {}
            Err(e) if e.error.kind() == io::ErrorKind::AlreadyExists => {
                return Err(CopyError::Exists)
            }
            Err(e) => return Err(CopyError::Io(e.error)),
        },
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scratch_lives_next_to_destination() {
        let dir = tempfile::tempdir().unwrap();
        let ws = Workspace::new(&dir.path().join("clip.mov")).unwrap();

        assert_eq!(ws.temp_dir().parent(), Some(dir.path()));
        assert!(ws.output().starts_with(ws.temp_dir()));
        assert_eq!(ws.output().file_name().unwrap(), "clip.mov");
    }

    #[test]
    fn missing_parent_uses_system_temp() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("not/yet/clip.mov");
        let ws = Workspace::new(&dest).unwrap();
        assert!(!ws.temp_dir().starts_with(dir.path()));

        fs::write(ws.output(), b"alac").unwrap();
        let final_path = ws.finalize(OverwritePolicy::Allow).unwrap();
        assert_eq!(final_path, dest);
        assert_eq!(fs::read(&dest).unwrap(), b"alac");
    }

    #[test]
    fn finalize_replaces_destination() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("clip.mov");
        fs::write(&dest, b"old").unwrap();

        let ws = Workspace::new(&dest).unwrap();
        let scratch = ws.temp_dir().to_path_buf();
        fs::write(ws.output(), b"new").unwrap();

        assert_eq!(ws.finalize(OverwritePolicy::Allow).unwrap(), dest);
        assert_eq!(fs::read(&dest).unwrap(), b"new");
        assert!(!scratch.exists());
    }

    #[test]
    fn failed_finalize_leaves_destination_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("clip.mov");
        fs::write(&dest, b"precious").unwrap();

        let ws = Workspace::new(&dest).unwrap();
        let scratch = ws.temp_dir().to_path_buf();
        // The engine never wrote anything.
        assert!(matches!(ws.finalize(OverwritePolicy::Allow), Err(Error::Workspace(_))));

        assert_eq!(fs::read(&dest).unwrap(), b"precious");
        assert!(!scratch.exists());
    }

    #[test]
    fn empty_output_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("clip.mov");

        let ws = Workspace::new(&dest).unwrap();
        fs::write(ws.output(), b"").unwrap();
        assert!(ws.finalize(OverwritePolicy::Allow).is_err());
        assert!(!dest.exists());
    }

    #[test]
    fn forbid_rechecks_destination() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("clip.mov");

        let ws = Workspace::new(&dest).unwrap();
        fs::write(ws.output(), b"new").unwrap();
        // Someone else created the destination while the engine ran.
        fs::write(&dest, b"theirs").unwrap();

        assert!(matches!(
            ws.finalize(OverwritePolicy::Forbid),
            Err(Error::DestinationExists { .. })
        ));
        assert_eq!(fs::read(&dest).unwrap(), b"theirs");
    }

    #[test]
    fn drop_removes_scratch() {
        let dir = tempfile::tempdir().unwrap();
        let ws = Workspace::new(&dir.path().join("clip.mov")).unwrap();
        let scratch = ws.temp_dir().to_path_buf();
        fs::write(ws.output(), b"partial").unwrap();

        drop(ws);
        assert!(!scratch.exists());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn copy_fallback_respects_policy() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src.mov");
        let dest = dir.path().join("dest.mov");
        fs::write(&src, b"data").unwrap();

        copy_into_place(&src, &dest, OverwritePolicy::Forbid).unwrap();
        assert_eq!(fs::read(&dest).unwrap(), b"data");

        assert!(matches!(
            copy_into_place(&src, &dest, OverwritePolicy::Forbid),
            Err(CopyError::Exists)
        ));

        fs::write(&src, b"newer").unwrap();
        copy_into_place(&src, &dest, OverwritePolicy::Allow).unwrap();
        assert_eq!(fs::read(&dest).unwrap(), b"newer");
    }
}
