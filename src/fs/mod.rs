//! Filesystem capability
//!
//! All backup, catalog and restore logic talks to the disk through the
//! [`FileSystem`] trait so it can run against [`MemoryFs`] in tests and
//! against [`RealFs`] in production.
//!
//! Operations mirror `std::fs` and report plain `std::io::Error`s; callers
//! attach the operation and path when converting to `BkupError`.

mod memory;
mod real;

use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tracing::warn;

pub use memory::MemoryFs;
pub use real::RealFs;

/// What kind of object a path refers to (symlinks are never followed)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Dir,
    File,
    Symlink,
}

/// Metadata of a single path, as seen without following symlinks
#[derive(Debug, Clone)]
pub struct Metadata {
    pub kind: EntryKind,
    /// Last modification time, when the platform reports one
    pub modified: Option<SystemTime>,
    /// Unix permission bits, when the platform has them
    pub mode: Option<u32>,
}

impl Metadata {
    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Dir
    }
}

/// An immediate child of a directory
#[derive(Debug, Clone)]
pub struct DirEntry {
    pub name: OsString,
    pub path: PathBuf,
    pub kind: EntryKind,
}

/// Capability interface over the filesystem
pub trait FileSystem {
    /// List the immediate children of `dir`, sorted by name
    fn read_dir(&self, dir: &Path) -> io::Result<Vec<DirEntry>>;

    /// Metadata for `path` without following a trailing symlink
    fn symlink_metadata(&self, path: &Path) -> io::Result<Metadata>;

    /// Read a whole file
    fn read(&self, path: &Path) -> io::Result<Vec<u8>>;

    /// Create or truncate `path` and write `data`, synced to disk
    fn write(&self, path: &Path, data: &[u8]) -> io::Result<()>;

    /// Rename `from` to `to`, replacing a file (or empty directory) at `to`
    fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;

    fn create_dir_all(&self, path: &Path) -> io::Result<()>;

    /// Remove a file or a symlink
    fn remove_file(&self, path: &Path) -> io::Result<()>;

    /// Remove a directory and everything below it
    fn remove_dir_all(&self, path: &Path) -> io::Result<()>;

    /// Create a symlink at `link` pointing to `target` (stored verbatim)
    fn symlink(&self, target: &Path, link: &Path) -> io::Result<()>;

    fn read_link(&self, path: &Path) -> io::Result<PathBuf>;

    /// Copy a regular file's bytes and permission bits
    fn copy_file(&self, src: &Path, dst: &Path) -> io::Result<()>;

    fn set_modified(&self, path: &Path, time: SystemTime) -> io::Result<()>;

    fn set_permissions(&self, path: &Path, mode: u32) -> io::Result<()>;

    /// Copy the contents of `src` into the existing directory `dst`
    ///
    /// Symlinks are recreated as symlinks. Modification times and permission
    /// bits are preserved best-effort.
    fn copy_tree(&self, src: &Path, dst: &Path) -> io::Result<()> {
        copy_tree_portable(self, src, dst)
    }

    /// Whether `path` exists (a dangling symlink counts as existing)
    fn exists(&self, path: &Path) -> bool {
        self.symlink_metadata(path).is_ok()
    }
}

/// Recursive tree copy built only on the primitive trait operations
pub fn copy_tree_portable<F: FileSystem + ?Sized>(fs: &F, src: &Path, dst: &Path) -> io::Result<()> {
    for entry in fs.read_dir(src)? {
        let target = dst.join(&entry.name);
        match entry.kind {
            EntryKind::Symlink => {
                let link = fs.read_link(&entry.path)?;
                fs.symlink(&link, &target)?;
            }
            EntryKind::Dir => {
                fs.create_dir_all(&target)?;
                copy_tree_portable(fs, &entry.path, &target)?;
                preserve_attributes(fs, &entry.path, &target);
            }
            EntryKind::File => {
                fs.copy_file(&entry.path, &target)?;
                preserve_attributes(fs, &entry.path, &target);
            }
        }
    }
    Ok(())
}

/// Carry mode and mtime from `src` to `dst`, logging instead of failing
fn preserve_attributes<F: FileSystem + ?Sized>(fs: &F, src: &Path, dst: &Path) {
    let meta = match fs.symlink_metadata(src) {
        Ok(meta) => meta,
        Err(e) => {
            warn!(path = %src.display(), error = %e, "could not read attributes to preserve");
            return;
        }
    };
    if let Some(mode) = meta.mode {
        if let Err(e) = fs.set_permissions(dst, mode) {
            warn!(path = %dst.display(), error = %e, "could not preserve permissions");
        }
    }
    if let Some(modified) = meta.modified {
        if let Err(e) = fs.set_modified(dst, modified) {
            warn!(path = %dst.display(), error = %e, "could not preserve modification time");
        }
    }
}

/// Remove every child of `dir`, leaving the directory itself in place
pub fn clear_dir<F: FileSystem + ?Sized>(fs: &F, dir: &Path) -> io::Result<usize> {
    let entries = fs.read_dir(dir)?;
    let count = entries.len();
    for entry in entries {
        match entry.kind {
            EntryKind::Dir => fs.remove_dir_all(&entry.path)?,
            EntryKind::File | EntryKind::Symlink => fs.remove_file(&entry.path)?,
        }
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn sample_tree(fs: &MemoryFs) {
        fs.create_dir_all(Path::new("/src/nested")).unwrap();
        fs.write(Path::new("/src/a.txt"), b"alpha").unwrap();
        fs.write(Path::new("/src/nested/b.txt"), b"beta").unwrap();
        fs.symlink(Path::new("a.txt"), Path::new("/src/link")).unwrap();
        fs.set_permissions(Path::new("/src/a.txt"), 0o600).unwrap();
        fs.set_modified(
            Path::new("/src/a.txt"),
            SystemTime::UNIX_EPOCH + Duration::from_secs(1_000),
        )
        .unwrap();
    }

    #[test]
    fn test_portable_copy_preserves_structure() {
        let fs = MemoryFs::new();
        sample_tree(&fs);
        fs.create_dir_all(Path::new("/dst")).unwrap();

        copy_tree_portable(&fs, Path::new("/src"), Path::new("/dst")).unwrap();

        assert_eq!(fs.read(Path::new("/dst/a.txt")).unwrap(), b"alpha");
        assert_eq!(fs.read(Path::new("/dst/nested/b.txt")).unwrap(), b"beta");

        let link = fs.symlink_metadata(Path::new("/dst/link")).unwrap();
        assert_eq!(link.kind, EntryKind::Symlink);
        assert_eq!(fs.read_link(Path::new("/dst/link")).unwrap(), PathBuf::from("a.txt"));

        let meta = fs.symlink_metadata(Path::new("/dst/a.txt")).unwrap();
        assert_eq!(meta.mode, Some(0o600));
        assert_eq!(
            meta.modified,
            Some(SystemTime::UNIX_EPOCH + Duration::from_secs(1_000))
        );
    }

    #[test]
    fn test_clear_dir_keeps_directory() {
        let fs = MemoryFs::new();
        sample_tree(&fs);

        let removed = clear_dir(&fs, Path::new("/src")).unwrap();

        assert_eq!(removed, 3);
        assert!(fs.symlink_metadata(Path::new("/src")).unwrap().is_dir());
        assert!(fs.read_dir(Path::new("/src")).unwrap().is_empty());
    }
}
