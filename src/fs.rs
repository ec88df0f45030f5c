//! Filesystem capability used by the resolver and the materializer.
//!
//! Every filesystem access of the engine goes through [`FileSystem`] so the
//! operating system can be swapped for the in-memory [`MemoryFs`] in tests.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// A single entry of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub is_dir: bool,
    /// Permission bits (`0o7777` mask).
    pub mode: u32,
}

/// Filesystem operations needed to resolve and materialize templates.
pub trait FileSystem {
    /// Returns information about `path`, following symlinks.
    fn stat(&self, path: &Path) -> io::Result<DirEntry>;

    /// Creates a single directory. The parent must exist.
    fn mkdir(&self, path: &Path, mode: u32) -> io::Result<()>;

    /// Creates a directory and any missing ancestors.
    fn mkdir_all(&self, path: &Path, mode: u32) -> io::Result<()>;

    /// Opens `path` for writing, creating or truncating it with `mode`.
    /// The file is closed when the returned writer is dropped.
    fn create_file(&self, path: &Path, mode: u32) -> io::Result<Box<dyn Write>>;

    /// Lists the immediate entries of a directory, sorted by name.
    fn read_dir(&self, path: &Path) -> io::Result<Vec<DirEntry>>;

    /// Reads the whole content of a file.
    fn read_file(&self, path: &Path) -> io::Result<Vec<u8>>;

    fn exists(&self, path: &Path) -> bool {
        self.stat(path).is_ok()
    }
}

fn entry_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// [`FileSystem`] backed by the host operating system.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsFs;

impl OsFs {
    pub fn new() -> Self {
        Self
    }
}

#[cfg(unix)]
fn metadata_mode(metadata: &fs::Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o7777
}

#[cfg(not(unix))]
fn metadata_mode(metadata: &fs::Metadata) -> u32 {
    match (metadata.is_dir(), metadata.permissions().readonly()) {
        (true, _) => 0o755,
        (false, true) => 0o444,
        (false, false) => 0o644,
    }
}

#[cfg(unix)]
fn apply_mode(path: &Path, mode: u32) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode))
}

#[cfg(not(unix))]
fn apply_mode(path: &Path, mode: u32) -> io::Result<()> {
    let mut permissions = fs::metadata(path)?.permissions();
    permissions.set_readonly(mode & 0o200 == 0);
    fs::set_permissions(path, permissions)
}

impl FileSystem for OsFs {
    fn stat(&self, path: &Path) -> io::Result<DirEntry> {
        let metadata = fs::metadata(path)?;
        Ok(DirEntry {
            name: entry_name(path),
            is_dir: metadata.is_dir(),
            mode: metadata_mode(&metadata),
        })
    }

    fn mkdir(&self, path: &Path, mode: u32) -> io::Result<()> {
        let mut builder = fs::DirBuilder::new();
        #[cfg(unix)]
        {
            use std::os::unix::fs::DirBuilderExt;
            builder.mode(mode);
        }
        builder.create(path)?;
        // The umask may have stripped bits from the requested mode.
        apply_mode(path, mode)
    }

    fn mkdir_all(&self, path: &Path, mode: u32) -> io::Result<()> {
        let mut builder = fs::DirBuilder::new();
        builder.recursive(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::DirBuilderExt;
            builder.mode(mode);
        }
        #[cfg(not(unix))]
        let _ = mode;
        builder.create(path)
    }

    fn create_file(&self, path: &Path, mode: u32) -> io::Result<Box<dyn Write>> {
        let mut options = fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(mode);
        }
        let file = options.open(path)?;
        apply_mode(path, mode)?;
        Ok(Box::new(file))
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<DirEntry>> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(path)? {
            let entry = entry?;
            let metadata = fs::metadata(entry.path())?;
            entries.push(DirEntry {
                name: entry.file_name().to_string_lossy().into_owned(),
                is_dir: metadata.is_dir(),
                mode: metadata_mode(&metadata),
            });
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    fn read_file(&self, path: &Path) -> io::Result<Vec<u8>> {
        fs::read(path)
    }
}

#[derive(Debug, Clone)]
enum Node {
    Dir { mode: u32 },
    File { mode: u32, content: Vec<u8> },
}

type Nodes = Rc<RefCell<BTreeMap<PathBuf, Node>>>;

/// In-memory [`FileSystem`]. Clones share the same tree.
#[derive(Debug, Clone, Default)]
pub struct MemoryFs {
    nodes: Nodes,
}

fn not_found(path: &Path) -> io::Error {
    io::Error::new(io::ErrorKind::NotFound, format!("{}: not found", path.display()))
}

impl MemoryFs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a file, creating missing parent directories with mode `0o755`.
    pub fn add_file<P: AsRef<Path>>(&self, path: P, content: &[u8], mode: u32) -> io::Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            self.mkdir_all(parent, 0o755)?;
        }
        self.nodes
            .borrow_mut()
            .insert(path.to_path_buf(), Node::File { mode, content: content.to_vec() });
        Ok(())
    }

    /// Returns true if `path` is a directory.
    pub fn is_dir<P: AsRef<Path>>(&self, path: P) -> bool {
        matches!(self.nodes.borrow().get(path.as_ref()), Some(Node::Dir { .. }))
    }

    fn parent_is_dir(&self, path: &Path) -> bool {
        match path.parent() {
            None => true,
            Some(parent) if parent.as_os_str().is_empty() => true,
            Some(parent) => self.is_dir(parent),
        }
    }
}

struct MemoryFile {
    nodes: Nodes,
    path: PathBuf,
}

impl Write for MemoryFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self.nodes.borrow_mut().get_mut(&self.path) {
            Some(Node::File { content, .. }) => {
                content.extend_from_slice(buf);
                Ok(buf.len())
            }
            _ => Err(not_found(&self.path)),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl FileSystem for MemoryFs {
    fn stat(&self, path: &Path) -> io::Result<DirEntry> {
        let nodes = self.nodes.borrow();
        let (is_dir, mode) = match nodes.get(path) {
            Some(Node::Dir { mode }) => (true, *mode),
            Some(Node::File { mode, .. }) => (false, *mode),
            None => return Err(not_found(path)),
        };
        Ok(DirEntry { name: entry_name(path), is_dir, mode })
    }

    fn mkdir(&self, path: &Path, mode: u32) -> io::Result<()> {
        if self.exists(path) {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("{}: already exists", path.display()),
            ));
        }
        if !self.parent_is_dir(path) {
            return Err(not_found(path));
        }
        self.nodes.borrow_mut().insert(path.to_path_buf(), Node::Dir { mode });
        Ok(())
    }

    fn mkdir_all(&self, path: &Path, mode: u32) -> io::Result<()> {
        let mut ancestors: Vec<&Path> = path
            .ancestors()
            .filter(|a| !a.as_os_str().is_empty())
            .collect();
        ancestors.reverse();
        let mut nodes = self.nodes.borrow_mut();
        for ancestor in ancestors {
            match nodes.get(ancestor) {
                Some(Node::Dir { .. }) => {}
                Some(Node::File { .. }) => {
                    return Err(io::Error::new(
                        io::ErrorKind::Other,
                        format!("{}: not a directory", ancestor.display()),
                    ))
                }
                None => {
                    nodes.insert(ancestor.to_path_buf(), Node::Dir { mode });
                }
            }
        }
        Ok(())
    }

    fn create_file(&self, path: &Path, mode: u32) -> io::Result<Box<dyn Write>> {
        if !self.parent_is_dir(path) || self.is_dir(path) {
            return Err(not_found(path));
        }
        self.nodes
            .borrow_mut()
            .insert(path.to_path_buf(), Node::File { mode, content: Vec::new() });
        Ok(Box::new(MemoryFile { nodes: Rc::clone(&self.nodes), path: path.to_path_buf() }))
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<DirEntry>> {
        if !self.is_dir(path) {
            return Err(not_found(path));
        }
        let nodes = self.nodes.borrow();
        let mut entries: Vec<DirEntry> = nodes
            .iter()
            .filter(|(p, _)| p.parent() == Some(path))
            .map(|(p, node)| {
                let (is_dir, mode) = match node {
                    Node::Dir { mode } => (true, *mode),
                    Node::File { mode, .. } => (false, *mode),
                };
                DirEntry { name: entry_name(p), is_dir, mode }
            })
            .collect();
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    fn read_file(&self, path: &Path) -> io::Result<Vec<u8>> {
        match self.nodes.borrow().get(path) {
            Some(Node::File { content, .. }) => Ok(content.clone()),
            Some(Node::Dir { .. }) => Err(io::Error::new(
                io::ErrorKind::Other,
                format!("{}: is a directory", path.display()),
            )),
            None => Err(not_found(path)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_memory_fs_add_and_read() {
        let fs = MemoryFs::new();
        fs.add_file("/t/base/main.txt", b"hello", 0o644).unwrap();

        assert!(fs.is_dir("/t/base"));
        assert_eq!(fs.read_file(Path::new("/t/base/main.txt")).unwrap(), b"hello");

        let entries = fs.read_dir(Path::new("/t")).unwrap();
        assert_eq!(
            entries,
            vec![DirEntry { name: "base".to_string(), is_dir: true, mode: 0o755 }]
        );
    }

    #[test]
    fn test_memory_fs_create_file_writes_through() {
        let fs = MemoryFs::new();
        fs.mkdir_all(Path::new("/out"), 0o755).unwrap();
        {
            let mut file = fs.create_file(Path::new("/out/a.sh"), 0o700).unwrap();
            file.write_all(b"#!/bin/sh\n").unwrap();
        }
        let entry = fs.stat(Path::new("/out/a.sh")).unwrap();
        assert_eq!(entry.mode, 0o700);
        assert!(!entry.is_dir);
        assert_eq!(fs.read_file(Path::new("/out/a.sh")).unwrap(), b"#!/bin/sh\n");
    }

    #[test]
    fn test_memory_fs_mkdir_requires_parent() {
        let fs = MemoryFs::new();
        assert!(fs.mkdir(Path::new("/missing/child"), 0o755).is_err());
        fs.mkdir(Path::new("/missing"), 0o755).unwrap();
        fs.mkdir(Path::new("/missing/child"), 0o750).unwrap();
        assert_eq!(fs.stat(Path::new("/missing/child")).unwrap().mode, 0o750);
        assert_eq!(
            fs.mkdir(Path::new("/missing"), 0o755).unwrap_err().kind(),
            io::ErrorKind::AlreadyExists
        );
    }

    #[test]
    fn test_memory_fs_clones_share_tree() {
        let fs = MemoryFs::new();
        let other = fs.clone();
        other.add_file("/shared/file", b"x", 0o644).unwrap();
        assert!(fs.exists(Path::new("/shared/file")));
    }

    #[cfg(unix)]
    #[test]
    fn test_os_fs_preserves_mode() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let fs = OsFs::new();
        let path = temp_dir.path().join("run.sh");
        {
            let mut file = fs.create_file(&path, 0o750).unwrap();
            file.write_all(b"echo").unwrap();
        }
        assert_eq!(fs.stat(&path).unwrap().mode, 0o750);

        let dir = temp_dir.path().join("private");
        fs.mkdir(&dir, 0o700).unwrap();
        assert_eq!(fs.stat(&dir).unwrap().mode, 0o700);
    }
}
