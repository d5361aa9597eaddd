// CLASSIFICATION: COMMUNITY
// Filename: debugfs.rs v0.1
// Author: Lukas Bower
// Date Modified: 2026-10-19

//! In-memory debug filesystem.
//!
//! Directories and files live in a single path-keyed table. Files carry a
//! [`FileOps`] handler; each [`OpenFile`] tracks its own read offset so a
//! handler sees the classic `(buf, ppos)` pair on every call.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use log::{debug, info};

use crate::kernel::errno::{KResult, KernelError};

/// Where the filesystem would be mounted; only used for display.
pub const DEBUGFS_MOUNT: &str = "/sys/kernel/debug";

/// File behaviour. Handlers without a write operation reject writes.
pub trait FileOps: Send + Sync {
    fn read(&self, buf: &mut [u8], ppos: &mut u64) -> KResult<usize>;

    fn write(&self, _buf: &[u8], _ppos: &mut u64) -> KResult<usize> {
        Err(KernelError::InvalidArgument("file has no write handler"))
    }
}

/// Handle to a directory or file created in the filesystem.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Dentry {
    path: String,
}

impl Dentry {
    /// Path relative to the mount point, without a leading slash.
    pub fn path(&self) -> &str {
        &self.path
    }
}

impl fmt::Display for Dentry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", DEBUGFS_MOUNT, self.path)
    }
}

enum Node {
    Dir,
    File { mode: u16, ops: Arc<dyn FileOps> },
}

pub struct DebugFs {
    available: bool,
    nodes: RwLock<BTreeMap<String, Node>>,
}

impl Default for DebugFs {
    fn default() -> Self {
        Self::new()
    }
}

impl DebugFs {
    pub fn new() -> Self {
        DebugFs {
            available: true,
            nodes: RwLock::new(BTreeMap::new()),
        }
    }

    /// A filesystem that was never registered; every create fails with
    /// `NoDevice`.
    pub fn unavailable() -> Self {
        DebugFs {
            available: false,
            nodes: RwLock::new(BTreeMap::new()),
        }
    }

    fn nodes(&self) -> KResult<RwLockReadGuard<'_, BTreeMap<String, Node>>> {
        self.nodes
            .read()
            .map_err(|_| KernelError::LockPoisoned("debugfs"))
    }

    fn nodes_mut(&self) -> KResult<RwLockWriteGuard<'_, BTreeMap<String, Node>>> {
        self.nodes
            .write()
            .map_err(|_| KernelError::LockPoisoned("debugfs"))
    }

    fn child_path(&self, name: &str, parent: Option<&Dentry>) -> KResult<String> {
        if !self.available {
            return Err(KernelError::NoDevice);
        }
        if name.is_empty() || name.contains('/') {
            return Err(KernelError::InvalidArgument("bad debugfs name"));
        }
        Ok(match parent {
            Some(p) => format!("{}/{}", p.path, name),
            None => name.to_string(),
        })
    }

    fn insert(&self, path: String, node: Node, parent: Option<&Dentry>) -> KResult<Dentry> {
        let mut nodes = self.nodes_mut()?;
        if let Some(p) = parent {
            match nodes.get(&p.path) {
                Some(Node::Dir) => {}
                Some(Node::File { .. }) => {
                    return Err(KernelError::InvalidArgument("parent is not a directory"))
                }
                None => return Err(KernelError::NotFound(p.path.clone())),
            }
        }
        if nodes.contains_key(&path) {
            return Err(KernelError::AlreadyExists(path));
        }
        nodes.insert(path.clone(), node);
        debug!("debugfs: created {}/{}", DEBUGFS_MOUNT, path);
        Ok(Dentry { path })
    }

    pub fn create_dir(&self, name: &str, parent: Option<&Dentry>) -> KResult<Dentry> {
        let path = self.child_path(name, parent)?;
        self.insert(path, Node::Dir, parent)
    }

    pub fn create_file(
        &self,
        name: &str,
        mode: u16,
        parent: Option<&Dentry>,
        ops: Arc<dyn FileOps>,
    ) -> KResult<Dentry> {
        let path = self.child_path(name, parent)?;
        self.insert(path, Node::File { mode, ops }, parent)
    }

    /// Remove `dentry` and everything below it. Removing something already
    /// gone is not an error.
    pub fn remove_recursive(&self, dentry: &Dentry) -> KResult<()> {
        let prefix = format!("{}/", dentry.path);
        let mut nodes = self.nodes_mut()?;
        let before = nodes.len();
        nodes.retain(|path, _| path != &dentry.path && !path.starts_with(&prefix));
        info!("debugfs: removed {} ({} entries)", dentry, before - nodes.len());
        Ok(())
    }

    pub fn exists(&self, path: &str) -> KResult<bool> {
        Ok(self.nodes()?.contains_key(path.trim_start_matches('/')))
    }

    /// Names directly below `dir` (or the root when `None`), sorted.
    pub fn list(&self, dir: Option<&str>) -> KResult<Vec<String>> {
        let nodes = self.nodes()?;
        let prefix = match dir {
            Some(d) => format!("{}/", d.trim_matches('/')),
            None => String::new(),
        };
        Ok(nodes
            .keys()
            .filter_map(|p| p.strip_prefix(&prefix))
            .filter(|rest| !rest.is_empty() && !rest.contains('/'))
            .map(str::to_string)
            .collect())
    }

    /// Open the file at `path` (relative to the mount point).
    pub fn open(&self, path: &str) -> KResult<OpenFile> {
        let path = path.trim_start_matches('/');
        let nodes = self.nodes()?;
        match nodes.get(path) {
            Some(Node::File { mode, ops }) => Ok(OpenFile {
                mode: *mode,
                ops: Arc::clone(ops),
                pos: 0,
            }),
            Some(Node::Dir) => Err(KernelError::InvalidArgument("is a directory")),
            None => Err(KernelError::NotFound(path.to_string())),
        }
    }
}

/// An open debugfs file with its own offset.
pub struct OpenFile {
    mode: u16,
    ops: Arc<dyn FileOps>,
    pos: u64,
}

impl OpenFile {
    pub fn pos(&self) -> u64 {
        self.pos
    }

    pub fn read(&mut self, buf: &mut [u8]) -> KResult<usize> {
        if self.mode & 0o444 == 0 {
            return Err(KernelError::NotPermitted);
        }
        self.ops.read(buf, &mut self.pos)
    }

    pub fn write(&mut self, buf: &[u8]) -> KResult<usize> {
        if self.mode & 0o222 == 0 {
            return Err(KernelError::NotPermitted);
        }
        self.ops.write(buf, &mut self.pos)
    }

    /// Read until the handler reports end of file, `chunk` bytes at a time.
    pub fn read_to_end(&mut self, chunk: usize) -> KResult<Vec<u8>> {
        let mut buf = vec![0u8; chunk.max(1)];
        let mut out = Vec::new();
        loop {
            let n = self.read(&mut buf)?;
            if n == 0 {
                return Ok(out);
            }
            out.extend_from_slice(&buf[..n]);
        }
    }
}
