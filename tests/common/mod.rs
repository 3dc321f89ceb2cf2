#![allow(dead_code)]

use dedupe::scanner::{ContentHash, FileIdentity, FileInspector, HashError, Inspected, ScanError};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Held by tests that read or write `DEDUPE_*` environment variables.
pub static ENV_MUTEX: Mutex<()> = Mutex::new(());

/// In-memory files with controllable device and inode numbers.
#[derive(Default)]
pub struct MemoryInspector {
    files: HashMap<PathBuf, (FileIdentity, Option<Vec<u8>>)>,
    hashed: RefCell<Vec<(u64, Option<u64>)>>,
}

impl MemoryInspector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, path: &str, device: u64, inode: u64, content: &[u8]) {
        let identity = FileIdentity::new(path, device, inode, content.len() as u64);
        self.files
            .insert(PathBuf::from(path), (identity, Some(content.to_vec())));
    }

    pub fn with_file(mut self, path: &str, device: u64, inode: u64, content: &[u8]) -> Self {
        self.add(path, device, inode, content);
        self
    }

    /// A file whose metadata is readable but whose content is not.
    pub fn with_unreadable(mut self, path: &str, device: u64, inode: u64, size: u64) -> Self {
        let identity = FileIdentity::new(path, device, inode, size);
        self.files.insert(PathBuf::from(path), (identity, None));
        self
    }

    /// Times the given inode has been hashed.
    pub fn hash_count(&self, device: u64, inode: u64) -> usize {
        self.hashed
            .borrow()
            .iter()
            .filter(|&&key| key == (device, Some(inode)))
            .count()
    }

    pub fn total_hashes(&self) -> usize {
        self.hashed.borrow().len()
    }
}

impl FileInspector for MemoryInspector {
    fn identify(&self, path: &Path) -> Result<Inspected, ScanError> {
        self.files
            .get(path)
            .map(|(identity, _)| Inspected::File(identity.clone()))
            .ok_or_else(|| ScanError::NotFound(path.to_path_buf()))
    }

    fn content_hash(&self, file: &FileIdentity) -> Result<ContentHash, HashError> {
        self.hashed.borrow_mut().push((file.device_id, file.inode));
        match self.files.get(&file.path) {
            Some((_, Some(content))) => Ok(ContentHash::new(format!(
                "mem:{}",
                String::from_utf8_lossy(content)
            ))),
            _ => Err(HashError::from_io(
                &file.path,
                io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
            )),
        }
    }
}

pub fn paths(names: &[&str]) -> Vec<PathBuf> {
    names.iter().map(PathBuf::from).collect()
}

pub fn write_file(dir: &Path, name: &str, content: &[u8]) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, content).unwrap();
    path
}
