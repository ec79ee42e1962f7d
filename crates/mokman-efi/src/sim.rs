//! Simulated firmware.
//!
//! Deterministic in-memory implementations of every capability trait,
//! driven by scripted keystrokes and inspected through captured output and
//! variable contents. The test suites and the conformance harness run the
//! manager against these instead of real firmware.

use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;

use parking_lot::Mutex;
use sha1::Sha1;
use sha2::{Digest, Sha256};

use crate::console::{Colour, Console, Key, ScanCode};
use crate::fs::{FileHandle, FileInfo, SimpleFileSystem};
use crate::guid::Guid;
use crate::registry::ProtocolRegistry;
use crate::shimlock::{ImageDigests, PeCoffContext, ShimLock};
use crate::status::Status;
use crate::varstore::{VariableStore, attr};

// ---------------------------------------------------------------------------
// Console
// ---------------------------------------------------------------------------

/// Scripted console: keystrokes are queued up front, output is captured.
///
/// `read_key` on an exhausted script returns Enter so a mis-scripted test
/// terminates instead of hanging; the fallback count is recorded.
#[derive(Debug, Default)]
pub struct SimConsole {
    keys: VecDeque<Key>,
    out: String,
    colour: Option<Colour>,
    cursor: (usize, usize),
    cursor_visible: bool,
    clear_count: usize,
    exhausted_reads: usize,
}

impl SimConsole {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues raw keystrokes.
    pub fn script_keys(&mut self, keys: impl IntoIterator<Item = Key>) {
        self.keys.extend(keys);
    }

    /// Queues one printable keystroke per character of `text`.
    pub fn script_text(&mut self, text: &str) {
        self.keys.extend(text.chars().map(Key::printable));
    }

    /// Queues `text` followed by Enter.
    pub fn script_line(&mut self, text: &str) {
        self.script_text(text);
        self.keys.push_back(Key::enter());
    }

    /// Queues a non-printing keystroke.
    pub fn script_scan(&mut self, scan: ScanCode) {
        self.keys.push_back(Key::scan(scan));
    }

    /// Everything written so far, across screen clears.
    pub fn output(&self) -> &str {
        &self.out
    }

    /// Whether the captured output contains `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        self.out.contains(needle)
    }

    /// How many times the screen was cleared.
    pub fn clear_count(&self) -> usize {
        self.clear_count
    }

    /// How many blocking reads ran past the end of the script.
    pub fn exhausted_reads(&self) -> usize {
        self.exhausted_reads
    }
}

impl Console for SimConsole {
    fn clear(&mut self) {
        self.clear_count += 1;
        self.cursor = (0, 0);
    }

    fn set_colour(&mut self, colour: Colour) {
        self.colour = Some(colour);
    }

    fn write(&mut self, text: &str) {
        self.out.push_str(text);
    }

    fn set_cursor(&mut self, col: usize, row: usize) {
        self.cursor = (col, row);
    }

    fn enable_cursor(&mut self, visible: bool) {
        self.cursor_visible = visible;
    }

    fn read_key(&mut self) -> Key {
        match self.keys.pop_front() {
            Some(key) => key,
            None => {
                self.exhausted_reads += 1;
                Key::enter()
            }
        }
    }

    fn poll_key(&mut self, _timeout_ms: u64) -> Option<Key> {
        self.keys.pop_front()
    }
}

// ---------------------------------------------------------------------------
// Variable store
// ---------------------------------------------------------------------------

/// In-memory variable store with append-write semantics.
#[derive(Debug, Default)]
pub struct SimVarStore {
    vars: BTreeMap<(String, Guid), Vec<u8>>,
}

impl SimVarStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a variable without going through the attribute machinery.
    pub fn seed(&mut self, name: &str, vendor: &Guid, data: &[u8]) {
        self.vars.insert((name.to_owned(), *vendor), data.to_vec());
    }

    /// Reads a variable without the `Status` wrapping.
    pub fn peek(&self, name: &str, vendor: &Guid) -> Option<&[u8]> {
        self.vars
            .get(&(name.to_owned(), *vendor))
            .map(Vec::as_slice)
    }
}

impl VariableStore for SimVarStore {
    fn get(&self, name: &str, vendor: &Guid) -> Result<Vec<u8>, Status> {
        self.vars
            .get(&(name.to_owned(), *vendor))
            .cloned()
            .ok_or(Status::NotFound)
    }

    fn set(
        &mut self,
        name: &str,
        vendor: &Guid,
        attributes: u32,
        data: &[u8],
    ) -> Result<(), Status> {
        let key = (name.to_owned(), *vendor);
        if attributes & attr::APPEND_WRITE != 0 {
            if data.is_empty() {
                // Zero-length append-write clears the variable.
                self.vars.remove(&key);
            } else {
                self.vars.entry(key).or_default().extend_from_slice(data);
            }
        } else if data.is_empty() {
            self.vars.remove(&key);
        } else {
            self.vars.insert(key, data.to_vec());
        }
        Ok(())
    }

    fn delete(&mut self, name: &str, vendor: &Guid) -> Result<(), Status> {
        match self.vars.remove(&(name.to_owned(), *vendor)) {
            Some(_) => Ok(()),
            None => Err(Status::NotFound),
        }
    }
}

// ---------------------------------------------------------------------------
// Filesystem
// ---------------------------------------------------------------------------

#[derive(Debug)]
enum Node {
    File(Vec<u8>),
    Dir(BTreeMap<String, Node>),
}

impl Node {
    fn descend(&self, path: &[String]) -> Option<&Node> {
        let mut node = self;
        for component in path {
            match node {
                Node::Dir(children) => node = children.get(component)?,
                Node::File(_) => return None,
            }
        }
        Some(node)
    }
}

/// One simulated filesystem instance over a shared in-memory tree.
///
/// Clones share the tree, like multiple opens of one protocol handle.
#[derive(Debug, Clone)]
pub struct SimFileSystem {
    device_path: String,
    label: Option<String>,
    root: Arc<Mutex<Node>>,
}

impl SimFileSystem {
    pub fn new(device_path: &str, label: Option<&str>) -> Self {
        Self {
            device_path: device_path.to_owned(),
            label: label.map(str::to_owned),
            root: Arc::new(Mutex::new(Node::Dir(BTreeMap::new()))),
        }
    }

    /// Creates a directory at `path` ("a/b/c"), including parents.
    pub fn add_dir(&self, path: &str) {
        let mut root = self.root.lock();
        let mut node = &mut *root;
        for component in path.split('/').filter(|c| !c.is_empty()) {
            let Node::Dir(children) = node else {
                panic!("sim fs: {path} crosses a file");
            };
            node = children
                .entry(component.to_owned())
                .or_insert_with(|| Node::Dir(BTreeMap::new()));
        }
    }

    /// Creates a file at `path`, including parent directories.
    pub fn add_file(&self, path: &str, data: &[u8]) {
        let (dir, name) = match path.rsplit_once('/') {
            Some((dir, name)) => (dir, name),
            None => ("", path),
        };
        self.add_dir(dir);
        let mut root = self.root.lock();
        let mut node = &mut *root;
        for component in dir.split('/').filter(|c| !c.is_empty()) {
            let Node::Dir(children) = node else {
                unreachable!("add_dir just created the chain");
            };
            node = children.get_mut(component).expect("parent exists");
        }
        let Node::Dir(children) = node else {
            panic!("sim fs: {path} crosses a file");
        };
        children.insert(name.to_owned(), Node::File(data.to_vec()));
    }
}

impl SimpleFileSystem for SimFileSystem {
    fn open_volume(&self) -> Result<Box<dyn FileHandle>, Status> {
        Ok(Box::new(SimFile {
            root: Arc::clone(&self.root),
            path: Vec::new(),
            pos: 0,
            dir_index: 0,
        }))
    }

    fn device_path(&self) -> String {
        self.device_path.clone()
    }

    fn volume_label(&self) -> Option<String> {
        self.label.clone()
    }
}

/// An open handle into a [`SimFileSystem`] tree.
#[derive(Debug)]
pub struct SimFile {
    root: Arc<Mutex<Node>>,
    path: Vec<String>,
    pos: u64,
    dir_index: usize,
}

impl SimFile {
    fn with_node<R>(&self, f: impl FnOnce(&Node) -> Result<R, Status>) -> Result<R, Status> {
        let root = self.root.lock();
        match root.descend(&self.path) {
            Some(node) => f(node),
            None => Err(Status::NotFound),
        }
    }

    /// Directory listing in read order: `.` and `..` first (except at the
    /// volume root, which carries no dot entries), then children.
    fn listing(&self) -> Result<Vec<FileInfo>, Status> {
        self.with_node(|node| {
            let Node::Dir(children) = node else {
                return Err(Status::InvalidParameter);
            };
            let mut entries = Vec::new();
            if !self.path.is_empty() {
                for dot in [".", ".."] {
                    entries.push(FileInfo {
                        name: dot.to_owned(),
                        size: 0,
                        directory: true,
                    });
                }
            }
            for (name, child) in children {
                entries.push(match child {
                    Node::File(data) => FileInfo {
                        name: name.clone(),
                        size: data.len() as u64,
                        directory: false,
                    },
                    Node::Dir(_) => FileInfo {
                        name: name.clone(),
                        size: 0,
                        directory: true,
                    },
                });
            }
            Ok(entries)
        })
    }
}

impl FileHandle for SimFile {
    fn open(&self, name: &str) -> Result<Box<dyn FileHandle>, Status> {
        self.with_node(|node| {
            let Node::Dir(children) = node else {
                return Err(Status::InvalidParameter);
            };
            if !children.contains_key(name) {
                return Err(Status::NotFound);
            }
            Ok(())
        })?;
        let mut path = self.path.clone();
        path.push(name.to_owned());
        Ok(Box::new(SimFile {
            root: Arc::clone(&self.root),
            path,
            pos: 0,
            dir_index: 0,
        }))
    }

    fn info(&self) -> Result<FileInfo, Status> {
        let name = self.path.last().cloned().unwrap_or_default();
        self.with_node(|node| {
            Ok(match node {
                Node::File(data) => FileInfo {
                    name: name.clone(),
                    size: data.len() as u64,
                    directory: false,
                },
                Node::Dir(_) => FileInfo {
                    name: name.clone(),
                    size: 0,
                    directory: true,
                },
            })
        })
    }

    fn read_to_end(&mut self) -> Result<Vec<u8>, Status> {
        let pos = self.pos;
        let data = self.with_node(|node| match node {
            Node::File(data) => {
                let start = (pos as usize).min(data.len());
                Ok(data[start..].to_vec())
            }
            Node::Dir(_) => Err(Status::InvalidParameter),
        })?;
        self.pos += data.len() as u64;
        Ok(data)
    }

    fn read_dir_entry(&mut self) -> Result<Option<FileInfo>, Status> {
        let entries = self.listing()?;
        let entry = entries.get(self.dir_index).cloned();
        if entry.is_some() {
            self.dir_index += 1;
        }
        Ok(entry)
    }

    fn set_position(&mut self, position: u64) -> Result<(), Status> {
        let is_dir = self.with_node(|node| Ok(matches!(node, Node::Dir(_))))?;
        if is_dir && position != 0 {
            return Err(Status::InvalidParameter);
        }
        self.pos = position;
        self.dir_index = 0;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Shim lock
// ---------------------------------------------------------------------------

/// Simulated shim-lock protocol: accepts `MZ`-prefixed images and hashes
/// the whole image body.
#[derive(Debug, Default)]
pub struct SimShimLock;

impl SimShimLock {
    pub fn new() -> Self {
        Self
    }

    /// The digests this protocol will report for `image`.
    pub fn digests_of(image: &[u8]) -> ImageDigests {
        let sha256: [u8; 32] = Sha256::digest(image).into();
        let sha1: [u8; 20] = Sha1::digest(image).into();
        ImageDigests { sha256, sha1 }
    }
}

impl ShimLock for SimShimLock {
    fn context(&mut self, image: &[u8]) -> Result<PeCoffContext, Status> {
        if image.len() < 2 || &image[..2] != b"MZ" {
            return Err(Status::Unsupported);
        }
        Ok(PeCoffContext {
            image_size: image.len(),
        })
    }

    fn hash(&mut self, image: &[u8], context: &PeCoffContext) -> Result<ImageDigests, Status> {
        if context.image_size != image.len() {
            return Err(Status::InvalidParameter);
        }
        Ok(Self::digests_of(image))
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Registry over the simulated protocol instances.
#[derive(Debug, Default)]
pub struct SimRegistry {
    pub filesystems: Vec<SimFileSystem>,
    pub shim_lock: Option<SimShimLock>,
}

impl SimRegistry {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProtocolRegistry for SimRegistry {
    fn filesystems(&mut self) -> Vec<Box<dyn SimpleFileSystem>> {
        self.filesystems
            .iter()
            .cloned()
            .map(|fs| Box::new(fs) as Box<dyn SimpleFileSystem>)
            .collect()
    }

    fn shim_lock(&mut self) -> Option<&mut dyn ShimLock> {
        self.shim_lock.as_mut().map(|s| s as &mut dyn ShimLock)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::guid;

    #[test]
    fn test_append_write_concatenates() {
        let mut store = SimVarStore::new();
        let aw = attr::NON_VOLATILE | attr::BOOTSERVICE_ACCESS | attr::APPEND_WRITE;
        store.set("MokList", &guid::SHIM_LOCK, aw, b"abc").unwrap();
        store.set("MokList", &guid::SHIM_LOCK, aw, b"def").unwrap();
        assert_eq!(
            store.peek("MokList", &guid::SHIM_LOCK),
            Some(b"abcdef".as_slice())
        );
    }

    #[test]
    fn test_zero_length_append_clears() {
        let mut store = SimVarStore::new();
        let aw = attr::NON_VOLATILE | attr::BOOTSERVICE_ACCESS | attr::APPEND_WRITE;
        store.set("MokList", &guid::SHIM_LOCK, aw, b"abc").unwrap();
        store.set("MokList", &guid::SHIM_LOCK, aw, b"").unwrap();
        assert_eq!(store.peek("MokList", &guid::SHIM_LOCK), None);
        assert_eq!(
            store.get("MokList", &guid::SHIM_LOCK),
            Err(Status::NotFound)
        );
    }

    #[test]
    fn test_delete_missing_is_not_found() {
        let mut store = SimVarStore::new();
        assert_eq!(store.delete("MokNew", &guid::SHIM_LOCK), Err(Status::NotFound));
    }

    #[test]
    fn test_fs_listing_and_read() {
        let fs = SimFileSystem::new("PciRoot(0x0)/Sata(0x0)", Some("ESP"));
        fs.add_file("keys/vendor.der", b"DERDER");
        fs.add_file("shimx64.efi", b"MZ image");

        let mut root = fs.open_volume().unwrap();
        let mut names = Vec::new();
        while let Some(info) = root.read_dir_entry().unwrap() {
            names.push((info.name, info.directory));
        }
        // Volume root has no dot entries; children come in name order.
        assert_eq!(
            names,
            vec![("keys".to_owned(), true), ("shimx64.efi".to_owned(), false)]
        );

        let keys = root.open("keys").unwrap();
        let mut sub = keys;
        let mut sub_names = Vec::new();
        while let Some(info) = sub.read_dir_entry().unwrap() {
            sub_names.push(info.name);
        }
        assert_eq!(sub_names, vec![".", "..", "vendor.der"]);

        let mut file = sub.open("vendor.der").unwrap();
        assert_eq!(file.read_to_end().unwrap(), b"DERDER");
        // Cursor is at EOF; rewind re-reads.
        assert_eq!(file.read_to_end().unwrap(), b"");
        file.set_position(0).unwrap();
        assert_eq!(file.read_to_end().unwrap(), b"DERDER");
    }

    #[test]
    fn test_fs_rewind_dir() {
        let fs = SimFileSystem::new("dev", None);
        fs.add_file("a", b"1");
        let mut root = fs.open_volume().unwrap();
        assert!(root.read_dir_entry().unwrap().is_some());
        assert!(root.read_dir_entry().unwrap().is_none());
        root.set_position(0).unwrap();
        assert!(root.read_dir_entry().unwrap().is_some());
        assert_eq!(root.set_position(1), Err(Status::InvalidParameter));
    }

    #[test]
    fn test_shim_lock_rejects_non_pe() {
        let mut shim = SimShimLock::new();
        assert_eq!(shim.context(b"ELF whatever"), Err(Status::Unsupported));
        let ctx = shim.context(b"MZ payload").unwrap();
        let digests = shim.hash(b"MZ payload", &ctx).unwrap();
        assert_eq!(digests, SimShimLock::digests_of(b"MZ payload"));
    }

    #[test]
    fn test_console_script_fallback() {
        let mut con = SimConsole::new();
        con.script_line("y");
        assert_eq!(con.read_key(), Key::printable('y'));
        assert_eq!(con.read_key(), Key::enter());
        assert_eq!(con.read_key(), Key::enter());
        assert_eq!(con.exhausted_reads(), 1);
        assert_eq!(con.poll_key(1000), None);
    }
}
