//! Loaded files.
//!
//! A [`BinFile`] owns the buffer, its descriptor, its namespaces and every
//! object built from it. Exactly one object is current at a time; a
//! multi-architecture container may hold several.

use bytes::Bytes;
use std::fmt;
use std::sync::Arc;

use tracing::trace;

use crate::config::BinConfig;
use crate::core::IdPool;
use crate::hashing::FileDigests;
use crate::metadata::{bridge, Namespace};
use crate::object::BinaryObject;

/// Namespace key of the digest records.
pub const HASH_NS: &str = "hash";

pub struct BinFile {
    id: u32,
    fd: i32,
    name: String,
    buffer: Bytes,
    /// The file's own namespace, grafted under the root
    sdb: Namespace,
    sdb_addrinfo: Namespace,
    objects: Vec<BinaryObject>,
    current: Option<usize>,
    ids: Arc<IdPool>,
    digests: Option<FileDigests>,
}

impl BinFile {
    pub(crate) fn new(id: u32, fd: i32, name: impl Into<String>, buffer: Bytes, ids: Arc<IdPool>) -> Self {
        let name = name.into();
        let sdb = Namespace::new(format!("fd.{}", fd));
        sdb.set("file", name.as_str());
        sdb.set("size", buffer.len().to_string());
        Self {
            id,
            fd,
            name,
            buffer,
            sdb,
            sdb_addrinfo: Namespace::new("addrinfo"),
            objects: Vec::new(),
            current: None,
            ids,
            digests: None,
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn fd(&self) -> i32 {
        self.fd
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn buffer(&self) -> &Bytes {
        &self.buffer
    }

    pub fn size(&self) -> usize {
        self.buffer.len()
    }

    pub fn namespace(&self) -> &Namespace {
        &self.sdb
    }

    pub fn addrinfo(&self) -> &Namespace {
        &self.sdb_addrinfo
    }

    pub fn objects(&self) -> &[BinaryObject] {
        &self.objects
    }

    pub fn current_object(&self) -> Option<&BinaryObject> {
        self.objects.get(self.current?)
    }

    pub fn current_object_mut(&mut self) -> Option<&mut BinaryObject> {
        let idx = self.current?;
        self.objects.get_mut(idx)
    }

    pub fn object_by_id(&self, id: u32) -> Option<&BinaryObject> {
        self.objects.iter().find(|o| o.id() == id)
    }

    pub fn object_by_id_mut(&mut self, id: u32) -> Option<&mut BinaryObject> {
        self.objects.iter_mut().find(|o| o.id() == id)
    }

    /// Object whose info record matches exactly on arch, bits and file name.
    pub fn find_by_arch_bits(&self, arch: &str, bits: u32, name: &str) -> Option<&BinaryObject> {
        self.objects
            .iter()
            .find(|o| o.info().is_some_and(|i| i.matches(arch, bits, name)))
    }

    /// Add an object and make it current. Its namespace is grafted under
    /// the file, and the file under `root`.
    pub(crate) fn add_object(&mut self, root: &Namespace, obj: BinaryObject) {
        bridge::graft(root, &self.sdb, obj.metadata(), &self.sdb_addrinfo, self.fd);
        self.objects.push(obj);
        self.current = Some(self.objects.len() - 1);
        trace!(file = self.id, objects = self.objects.len(), "object added");
    }

    /// Replace the current object, destroying the old one only after the
    /// new one is in place.
    pub(crate) fn replace_current(&mut self, root: &Namespace, obj: BinaryObject) {
        match self.current {
            Some(idx) => {
                bridge::graft(root, &self.sdb, obj.metadata(), &self.sdb_addrinfo, self.fd);
                let old = std::mem::replace(&mut self.objects[idx], obj);
                old.destroy();
            }
            None => self.add_object(root, obj),
        }
    }

    /// Rerun the pipeline on the current object. A record set supplied by
    /// the plugin replaces the object namespace, so `info` is re-pointed.
    pub(crate) fn rerun_current(&mut self, config: &BinConfig) -> bool {
        let Some(idx) = self.current else {
            return false;
        };
        let obj = &mut self.objects[idx];
        obj.set_items(config);
        let stale = self
            .sdb
            .ns(bridge::INFO_KEY)
            .map_or(true, |ns| !ns.ptr_eq(obj.metadata()));
        if stale {
            trace!(file = self.id, object = obj.id(), "regrafting object namespace");
            self.sdb.ns_set(bridge::INFO_KEY, obj.metadata());
        }
        true
    }

    /// Remove and return an object by id. The current selection moves to
    /// the last remaining object.
    pub(crate) fn remove_object(&mut self, id: u32) -> Option<BinaryObject> {
        let pos = self.objects.iter().position(|o| o.id() == id)?;
        let obj = self.objects.remove(pos);
        self.current = match self.current {
            Some(c) if c == pos => self.objects.len().checked_sub(1),
            Some(c) if c > pos => Some(c - 1),
            other => other,
        };
        if let Some(cur) = self.current_object() {
            self.sdb.ns_set(bridge::INFO_KEY, cur.metadata());
        } else {
            self.sdb.ns_unset(bridge::INFO_KEY);
        }
        Some(obj)
    }

    /// Select the current object by id.
    pub fn set_current(&mut self, id: u32) -> bool {
        match self.objects.iter().position(|o| o.id() == id) {
            Some(pos) => {
                self.current = Some(pos);
                self.sdb.ns_set(bridge::INFO_KEY, self.objects[pos].metadata());
                true
            }
            None => false,
        }
    }

    /// sha256 and md5 of the whole buffer, computed on first use and
    /// recorded in the file namespace.
    pub fn digests(&mut self) -> &FileDigests {
        let buffer = &self.buffer;
        let sdb = &self.sdb;
        self.digests.get_or_insert_with(|| {
            let d = FileDigests::compute(buffer);
            let hash = sdb.ns_or_create(HASH_NS);
            hash.set("sha256", d.sha256.as_str());
            hash.set("md5", d.md5.as_str());
            d
        })
    }

    /// Whether any section of the current object covers `vaddr`.
    pub fn contains_vaddr(&self, vaddr: u64) -> bool {
        self.current_object()
            .and_then(|o| o.section_at_vaddr(vaddr))
            .is_some()
    }
}

impl Drop for BinFile {
    fn drop(&mut self) {
        // objects go first so their ids are back before the file's
        self.objects.clear();
        self.ids.release(self.id);
        trace!(file = self.id, "file closed");
    }
}

impl fmt::Debug for BinFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BinFile")
            .field("id", &self.id)
            .field("fd", &self.fd)
            .field("name", &self.name)
            .field("size", &self.buffer.len())
            .field("objects", &self.objects)
            .field("current", &self.current)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digests_recorded_in_namespace() {
        let ids = Arc::new(IdPool::default());
        let id = ids.grab().unwrap();
        let mut file = BinFile::new(id, 3, "abc.bin", Bytes::from_static(b"abc"), Arc::clone(&ids));
        let d = file.digests().clone();
        assert_eq!(
            d.sha256,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        let hash = file.namespace().ns(HASH_NS).unwrap();
        assert_eq!(hash.get("md5").as_deref(), Some("900150983cd24fb0d6963f7d28e17f72"));
        assert_eq!(file.namespace().get("file").as_deref(), Some("abc.bin"));
    }

    #[test]
    fn test_drop_releases_file_id() {
        let ids = Arc::new(IdPool::default());
        let id = ids.grab().unwrap();
        let file = BinFile::new(id, 3, "x", Bytes::new(), Arc::clone(&ids));
        assert!(file.current_object().is_none());
        assert!(!file.contains_vaddr(0));
        drop(file);
        assert_eq!(ids.in_use(), 0);
    }
}
