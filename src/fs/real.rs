//! Production filesystem backed by `std::fs`

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use filetime::FileTime;
use tracing::warn;
use walkdir::WalkDir;

use super::{DirEntry, EntryKind, FileSystem, Metadata};

/// The real filesystem
#[derive(Debug, Clone, Copy, Default)]
pub struct RealFs;

impl RealFs {
    pub fn new() -> Self {
        Self
    }
}

fn kind_of(file_type: fs::FileType) -> EntryKind {
    if file_type.is_symlink() {
        EntryKind::Symlink
    } else if file_type.is_dir() {
        EntryKind::Dir
    } else {
        EntryKind::File
    }
}

#[cfg(unix)]
fn mode_of(meta: &fs::Metadata) -> Option<u32> {
    use std::os::unix::fs::PermissionsExt;
    Some(meta.permissions().mode() & 0o7777)
}

#[cfg(not(unix))]
fn mode_of(_meta: &fs::Metadata) -> Option<u32> {
    None
}

#[cfg(unix)]
fn make_symlink(target: &Path, link: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
fn make_symlink(target: &Path, link: &Path) -> io::Result<()> {
    // Relative targets resolve against the link's own directory
    let resolved = link.parent().map(|p| p.join(target)).unwrap_or_else(|| target.to_path_buf());
    if resolved.is_dir() {
        std::os::windows::fs::symlink_dir(target, link)
    } else {
        std::os::windows::fs::symlink_file(target, link)
    }
}

impl FileSystem for RealFs {
    fn read_dir(&self, dir: &Path) -> io::Result<Vec<DirEntry>> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            entries.push(DirEntry {
                name: entry.file_name(),
                path: entry.path(),
                kind: kind_of(entry.file_type()?),
            });
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    fn symlink_metadata(&self, path: &Path) -> io::Result<Metadata> {
        let meta = fs::symlink_metadata(path)?;
        Ok(Metadata {
            kind: kind_of(meta.file_type()),
            modified: meta.modified().ok(),
            mode: mode_of(&meta),
        })
    }

    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        fs::read(path)
    }

    fn write(&self, path: &Path, data: &[u8]) -> io::Result<()> {
        let mut file = File::create(path)?;
        file.write_all(data)?;
        file.flush()?;
        file.sync_all()
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        fs::rename(from, to)
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        fs::create_dir_all(path)
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        fs::remove_file(path)
    }

    fn remove_dir_all(&self, path: &Path) -> io::Result<()> {
        fs::remove_dir_all(path)
    }

    fn symlink(&self, target: &Path, link: &Path) -> io::Result<()> {
        make_symlink(target, link)
    }

    fn read_link(&self, path: &Path) -> io::Result<PathBuf> {
        fs::read_link(path)
    }

    fn copy_file(&self, src: &Path, dst: &Path) -> io::Result<()> {
        // fs::copy carries the permission bits along with the bytes
        fs::copy(src, dst).map(|_| ())
    }

    fn set_modified(&self, path: &Path, time: SystemTime) -> io::Result<()> {
        filetime::set_file_mtime(path, FileTime::from_system_time(time))
    }

    #[cfg(unix)]
    fn set_permissions(&self, path: &Path, mode: u32) -> io::Result<()> {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(mode))
    }

    #[cfg(not(unix))]
    fn set_permissions(&self, _path: &Path, _mode: u32) -> io::Result<()> {
        Ok(())
    }

    fn copy_tree(&self, src: &Path, dst: &Path) -> io::Result<()> {
        // Directories are yielded after their contents, so their mtime and
        // mode are applied once nothing else will be written below them.
        for entry in WalkDir::new(src)
            .follow_links(false)
            .min_depth(1)
            .contents_first(true)
            .sort_by_file_name()
        {
            let entry = entry.map_err(io::Error::from)?;
            let rel = entry
                .path()
                .strip_prefix(src)
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
            let target = dst.join(rel);
            let file_type = entry.file_type();

            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }

            if file_type.is_symlink() {
                let link = fs::read_link(entry.path())?;
                make_symlink(&link, &target)?;
                continue;
            }

            let meta = entry.metadata().map_err(io::Error::from)?;
            if file_type.is_dir() {
                fs::create_dir_all(&target)?;
                if let Some(mode) = mode_of(&meta) {
                    if let Err(e) = self.set_permissions(&target, mode) {
                        warn!(path = %target.display(), error = %e, "could not preserve permissions");
                    }
                }
            } else {
                fs::copy(entry.path(), &target)?;
            }

            let mtime = FileTime::from_last_modification_time(&meta);
            if let Err(e) = filetime::set_file_mtime(&target, mtime) {
                warn!(path = %target.display(), error = %e, "could not preserve modification time");
            }
        }
        Ok(())
    }
}
