//! In-memory filesystem
//!
//! A small model of a POSIX tree (directories, files, symlinks, mtimes and
//! modes) with a settable clock and write-fault injection. Used by the test
//! suites to drive the backup core deterministically.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use super::{DirEntry, EntryKind, FileSystem, Metadata};

#[derive(Debug, Clone)]
enum Content {
    Dir,
    File(Vec<u8>),
    Symlink(PathBuf),
}

#[derive(Debug, Clone)]
struct Node {
    content: Content,
    modified: SystemTime,
    mode: u32,
}

impl Node {
    fn kind(&self) -> EntryKind {
        match self.content {
            Content::Dir => EntryKind::Dir,
            Content::File(_) => EntryKind::File,
            Content::Symlink(_) => EntryKind::Symlink,
        }
    }
}

type FaultRule = Box<dyn Fn(&Path) -> bool>;

/// In-memory [`FileSystem`] implementation
pub struct MemoryFs {
    nodes: RefCell<BTreeMap<PathBuf, Node>>,
    clock: RefCell<SystemTime>,
    faults: RefCell<Vec<FaultRule>>,
}

impl Default for MemoryFs {
    fn default() -> Self {
        Self::new()
    }
}

fn not_found(path: &Path) -> io::Error {
    io::Error::new(io::ErrorKind::NotFound, format!("{} does not exist", path.display()))
}

fn conflict(path: &Path, what: &str) -> io::Error {
    io::Error::new(io::ErrorKind::Other, format!("{}: {}", path.display(), what))
}

impl MemoryFs {
    /// Create an empty filesystem containing only `/`
    pub fn new() -> Self {
        let start = SystemTime::UNIX_EPOCH + Duration::from_secs(1_000_000);
        let mut nodes = BTreeMap::new();
        nodes.insert(
            PathBuf::from("/"),
            Node {
                content: Content::Dir,
                modified: start,
                mode: 0o755,
            },
        );
        Self {
            nodes: RefCell::new(nodes),
            clock: RefCell::new(start),
            faults: RefCell::new(Vec::new()),
        }
    }

    /// Set the time stamped onto subsequently modified paths
    pub fn set_clock(&self, now: SystemTime) {
        *self.clock.borrow_mut() = now;
    }

    /// Make every mutation of a path matching `rule` fail with an I/O error
    pub fn fail_writes_where(&self, rule: impl Fn(&Path) -> bool + 'static) {
        self.faults.borrow_mut().push(Box::new(rule));
    }

    /// Remove all injected faults
    pub fn clear_faults(&self) {
        self.faults.borrow_mut().clear();
    }

    /// Every path strictly below `dir`, in sorted order
    pub fn descendants(&self, dir: &Path) -> Vec<PathBuf> {
        self.nodes
            .borrow()
            .keys()
            .filter(|p| p.starts_with(dir) && p.as_path() != dir)
            .cloned()
            .collect()
    }

    fn now(&self) -> SystemTime {
        *self.clock.borrow()
    }

    fn check_fault(&self, path: &Path) -> io::Result<()> {
        if self.faults.borrow().iter().any(|rule| rule(path)) {
            return Err(io::Error::new(
                io::ErrorKind::Other,
                format!("injected failure writing {}", path.display()),
            ));
        }
        Ok(())
    }

    fn require_parent_dir(&self, path: &Path) -> io::Result<()> {
        let parent = path.parent().ok_or_else(|| not_found(path))?;
        match self.nodes.borrow().get(parent) {
            Some(node) if node.kind() == EntryKind::Dir => Ok(()),
            Some(_) => Err(conflict(parent, "not a directory")),
            None => Err(not_found(parent)),
        }
    }

    fn touch_parent(&self, path: &Path) {
        let now = self.now();
        if let Some(parent) = path.parent() {
            if let Some(node) = self.nodes.borrow_mut().get_mut(parent) {
                node.modified = now;
            }
        }
    }

    fn insert(&self, path: &Path, content: Content, mode: u32) {
        let node = Node {
            content,
            modified: self.now(),
            mode,
        };
        self.nodes.borrow_mut().insert(path.to_path_buf(), node);
        self.touch_parent(path);
    }

    fn node(&self, path: &Path) -> io::Result<Node> {
        self.nodes
            .borrow()
            .get(path)
            .cloned()
            .ok_or_else(|| not_found(path))
    }

    fn has_children(&self, dir: &Path) -> bool {
        self.nodes
            .borrow()
            .keys()
            .any(|p| p.parent() == Some(dir))
    }
}

impl FileSystem for MemoryFs {
    fn read_dir(&self, dir: &Path) -> io::Result<Vec<DirEntry>> {
        if self.node(dir)?.kind() != EntryKind::Dir {
            return Err(conflict(dir, "not a directory"));
        }
        let nodes = self.nodes.borrow();
        let mut entries: Vec<DirEntry> = nodes
            .iter()
            .filter(|(p, _)| p.parent() == Some(dir))
            .filter_map(|(p, node)| {
                Some(DirEntry {
                    name: p.file_name()?.to_os_string(),
                    path: p.clone(),
                    kind: node.kind(),
                })
            })
            .collect();
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    fn symlink_metadata(&self, path: &Path) -> io::Result<Metadata> {
        let node = self.node(path)?;
        Ok(Metadata {
            kind: node.kind(),
            modified: Some(node.modified),
            mode: Some(node.mode),
        })
    }

    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        match self.node(path)?.content {
            Content::File(data) => Ok(data),
            Content::Dir => Err(conflict(path, "is a directory")),
            Content::Symlink(_) => Err(conflict(path, "is a symlink")),
        }
    }

    fn write(&self, path: &Path, data: &[u8]) -> io::Result<()> {
        self.check_fault(path)?;
        self.require_parent_dir(path)?;
        let mode = match self.nodes.borrow().get(path) {
            Some(node) if node.kind() == EntryKind::Dir => {
                return Err(conflict(path, "is a directory"));
            }
            Some(node) => node.mode,
            None => 0o644,
        };
        self.insert(path, Content::File(data.to_vec()), mode);
        Ok(())
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        self.check_fault(to)?;
        let source = self.node(from)?;
        self.require_parent_dir(to)?;
        if to.starts_with(from) && to != from {
            return Err(conflict(to, "cannot move a directory into itself"));
        }
        if let Some(existing) = self.nodes.borrow().get(to) {
            match (source.kind(), existing.kind()) {
                (EntryKind::Dir, EntryKind::Dir) if self.has_children(to) => {
                    return Err(conflict(to, "directory not empty"));
                }
                (EntryKind::Dir, EntryKind::Dir) => {}
                (EntryKind::Dir, _) => return Err(conflict(to, "not a directory")),
                (_, EntryKind::Dir) => return Err(conflict(to, "is a directory")),
                _ => {}
            }
        }

        let mut nodes = self.nodes.borrow_mut();
        nodes.remove(to);
        let moved: Vec<PathBuf> = nodes
            .keys()
            .filter(|p| p.starts_with(from))
            .cloned()
            .collect();
        for old in moved {
            if let Some(node) = nodes.remove(&old) {
                let new = match old.strip_prefix(from) {
                    Ok(rel) if !rel.as_os_str().is_empty() => to.join(rel),
                    _ => to.to_path_buf(),
                };
                nodes.insert(new, node);
            }
        }
        drop(nodes);
        self.touch_parent(from);
        self.touch_parent(to);
        Ok(())
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        let mut missing = Vec::new();
        for ancestor in path.ancestors() {
            match self.nodes.borrow().get(ancestor) {
                Some(node) if node.kind() == EntryKind::Dir => break,
                Some(_) => return Err(conflict(ancestor, "not a directory")),
                None => missing.push(ancestor.to_path_buf()),
            }
        }
        for dir in missing.into_iter().rev() {
            self.check_fault(&dir)?;
            self.insert(&dir, Content::Dir, 0o755);
        }
        Ok(())
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        if self.node(path)?.kind() == EntryKind::Dir {
            return Err(conflict(path, "is a directory"));
        }
        self.nodes.borrow_mut().remove(path);
        self.touch_parent(path);
        Ok(())
    }

    fn remove_dir_all(&self, path: &Path) -> io::Result<()> {
        if self.node(path)?.kind() != EntryKind::Dir {
            return Err(conflict(path, "not a directory"));
        }
        self.nodes.borrow_mut().retain(|p, _| !p.starts_with(path));
        self.touch_parent(path);
        Ok(())
    }

    fn symlink(&self, target: &Path, link: &Path) -> io::Result<()> {
        self.check_fault(link)?;
        self.require_parent_dir(link)?;
        if self.exists(link) {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("{} already exists", link.display()),
            ));
        }
        self.insert(link, Content::Symlink(target.to_path_buf()), 0o777);
        Ok(())
    }

    fn read_link(&self, path: &Path) -> io::Result<PathBuf> {
        match self.node(path)?.content {
            Content::Symlink(target) => Ok(target),
            _ => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} is not a symlink", path.display()),
            )),
        }
    }

    fn copy_file(&self, src: &Path, dst: &Path) -> io::Result<()> {
        self.check_fault(dst)?;
        let source = self.node(src)?;
        let Content::File(data) = source.content else {
            return Err(conflict(src, "not a regular file"));
        };
        self.require_parent_dir(dst)?;
        if matches!(self.nodes.borrow().get(dst), Some(node) if node.kind() == EntryKind::Dir) {
            return Err(conflict(dst, "is a directory"));
        }
        self.insert(dst, Content::File(data), source.mode);
        Ok(())
    }

    fn set_modified(&self, path: &Path, time: SystemTime) -> io::Result<()> {
        let mut nodes = self.nodes.borrow_mut();
        let node = nodes.get_mut(path).ok_or_else(|| not_found(path))?;
        node.modified = time;
        Ok(())
    }

    fn set_permissions(&self, path: &Path, mode: u32) -> io::Result<()> {
        let mut nodes = self.nodes.borrow_mut();
        let node = nodes.get_mut(path).ok_or_else(|| not_found(path))?;
        node.mode = mode;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_requires_parent() {
        let fs = MemoryFs::new();
        let err = fs.write(Path::new("/missing/file"), b"x").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn test_rename_moves_subtree() {
        let fs = MemoryFs::new();
        fs.create_dir_all(Path::new("/a/inner")).unwrap();
        fs.write(Path::new("/a/inner/f"), b"1").unwrap();

        fs.rename(Path::new("/a"), Path::new("/b")).unwrap();

        assert!(!fs.exists(Path::new("/a")));
        assert_eq!(fs.read(Path::new("/b/inner/f")).unwrap(), b"1");
    }

    #[test]
    fn test_rename_refuses_non_empty_target_dir() {
        let fs = MemoryFs::new();
        fs.create_dir_all(Path::new("/a")).unwrap();
        fs.create_dir_all(Path::new("/b")).unwrap();
        fs.write(Path::new("/b/keep"), b"").unwrap();

        assert!(fs.rename(Path::new("/a"), Path::new("/b")).is_err());
        assert!(fs.exists(Path::new("/b/keep")));
    }

    #[test]
    fn test_rename_replaces_file() {
        let fs = MemoryFs::new();
        fs.write(Path::new("/new"), b"new").unwrap();
        fs.write(Path::new("/old"), b"old").unwrap();

        fs.rename(Path::new("/new"), Path::new("/old")).unwrap();

        assert_eq!(fs.read(Path::new("/old")).unwrap(), b"new");
        assert!(!fs.exists(Path::new("/new")));
    }

    #[test]
    fn test_clock_stamps_modifications() {
        let fs = MemoryFs::new();
        let t = SystemTime::UNIX_EPOCH + Duration::from_secs(42);
        fs.set_clock(t);
        fs.create_dir_all(Path::new("/d")).unwrap();

        assert_eq!(fs.symlink_metadata(Path::new("/d")).unwrap().modified, Some(t));
    }

    #[test]
    fn test_injected_fault() {
        let fs = MemoryFs::new();
        fs.fail_writes_where(|p| p.ends_with("boom"));

        assert!(fs.write(Path::new("/boom"), b"").is_err());
        assert!(fs.write(Path::new("/fine"), b"").is_ok());

        fs.clear_faults();
        assert!(fs.write(Path::new("/boom"), b"").is_ok());
    }

    #[test]
    fn test_remove_dir_all_removes_descendants() {
        let fs = MemoryFs::new();
        fs.create_dir_all(Path::new("/x/y/z")).unwrap();
        fs.write(Path::new("/x/y/z/f"), b"").unwrap();
        fs.write(Path::new("/xy"), b"").unwrap();

        fs.remove_dir_all(Path::new("/x")).unwrap();

        assert!(fs.descendants(Path::new("/")).iter().all(|p| !p.starts_with("/x")));
        assert!(fs.exists(Path::new("/xy")));
    }
}
