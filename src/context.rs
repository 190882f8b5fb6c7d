//! The `Bin` context: plugin registry, identifier pools and the active files.
//!
//! Every construction and lookup goes through a [`Bin`]. Mutation of the
//! file list takes `&mut self`, so loads and unloads on one context are
//! serialized by the borrow checker; the id pools and the namespace tree are
//! internally synchronized and may be shared with other contexts.

use bytes::Bytes;
use memmap2::Mmap;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::BinConfig;
use crate::core::{IdPool, UNSPECIFIED};
use crate::error::{BinError, PluginError, Result};
use crate::file::BinFile;
use crate::metadata::{bridge, Namespace};
use crate::object::{BinaryObject, CreateParams, RelocIndex};
use crate::plugin::{BinPlugin, CreateOptions, IoView};

/// Where and how to load a buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadOptions {
    /// Plugin to use; sniffed through `check_buffer` when `None`
    pub plugin: Option<String>,
    pub base_address: u64,
    pub load_address: u64,
    pub offset: u64,
    pub size: u64,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            plugin: None,
            base_address: UNSPECIFIED,
            load_address: UNSPECIFIED,
            offset: 0,
            size: UNSPECIFIED,
        }
    }
}

impl LoadOptions {
    pub fn with_plugin(mut self, name: impl Into<String>) -> Self {
        self.plugin = Some(name.into());
        self
    }

    pub fn with_base_address(mut self, base: u64) -> Self {
        self.base_address = base;
        self
    }

    pub fn with_load_address(mut self, load: u64) -> Self {
        self.load_address = load;
        self
    }
}

/// Binary-model context.
pub struct Bin {
    config: BinConfig,
    plugins: Vec<Arc<dyn BinPlugin>>,
    object_ids: Arc<IdPool>,
    file_ids: Arc<IdPool>,
    files: Vec<BinFile>,
    /// Id of the current file
    cur: Option<u32>,
    root: Namespace,
    next_fd: i32,
}

impl Default for Bin {
    fn default() -> Self {
        Self::new(BinConfig::default())
    }
}

impl Bin {
    /// Empty context with no plugins registered.
    pub fn new(config: BinConfig) -> Self {
        Self::with_pools(
            config,
            Arc::new(IdPool::default()),
            Arc::new(IdPool::default()),
        )
    }

    /// Context drawing ids from caller-provided pools.
    pub fn with_pools(config: BinConfig, object_ids: Arc<IdPool>, file_ids: Arc<IdPool>) -> Self {
        Self {
            config,
            plugins: Vec::new(),
            object_ids,
            file_ids,
            files: Vec::new(),
            cur: None,
            root: Namespace::new("bin"),
            next_fd: 3,
        }
    }

    /// Context with the built-in format plugins registered.
    pub fn with_default_plugins(config: BinConfig) -> Self {
        #[allow(unused_mut)]
        let mut bin = Self::new(config);
        #[cfg(feature = "wasm")]
        bin.plugins
            .push(Arc::new(crate::formats::wasm::WasmPlugin) as Arc<dyn BinPlugin>);
        bin
    }

    pub fn config(&self) -> &BinConfig {
        &self.config
    }

    /// Replace the extraction policy. Applies to objects built afterwards
    /// and to [`Bin::rerun`].
    pub fn set_config(&mut self, config: BinConfig) {
        self.config = config;
    }

    pub fn root_namespace(&self) -> &Namespace {
        &self.root
    }

    pub fn object_ids(&self) -> &Arc<IdPool> {
        &self.object_ids
    }

    pub fn file_ids(&self) -> &Arc<IdPool> {
        &self.file_ids
    }

    // ---- plugins ----

    /// Register a plugin. Names must be unique.
    pub fn add_plugin(&mut self, plugin: Arc<dyn BinPlugin>) -> Result<()> {
        if self.plugin_by_name(plugin.name()).is_some() {
            return Err(BinError::InvalidArgument(format!(
                "plugin '{}' already registered",
                plugin.name()
            )));
        }
        debug!(plugin = plugin.name(), "plugin registered");
        self.plugins.push(plugin);
        Ok(())
    }

    pub fn plugins(&self) -> &[Arc<dyn BinPlugin>] {
        &self.plugins
    }

    pub fn plugin_by_name(&self, name: &str) -> Option<&Arc<dyn BinPlugin>> {
        self.plugins.iter().find(|p| p.name() == name)
    }

    /// The named plugin, or the first registered plugin that recognises `buf`.
    pub fn select_plugin(&self, buf: &[u8], name: Option<&str>) -> Result<Arc<dyn BinPlugin>> {
        let found = match name {
            Some(name) => self.plugin_by_name(name),
            None => self.plugins.iter().find(|p| p.check_buffer(buf)),
        };
        found.cloned().ok_or_else(|| {
            BinError::InvalidArgument(match name {
                Some(name) => format!("no plugin named '{}'", name),
                None => "no plugin recognises the buffer".to_string(),
            })
        })
    }

    // ---- loading ----

    /// Load a buffer as a new file and make it current.
    ///
    /// Returns the new file's id. On any failure the file list and the
    /// namespace tree are left untouched.
    pub fn open_buffer(&mut self, name: &str, buffer: Bytes, opts: &LoadOptions) -> Result<u32> {
        if name.is_empty() {
            return Err(BinError::InvalidArgument("missing file name".to_string()));
        }
        let plugin = self.select_plugin(&buffer, opts.plugin.as_deref())?;
        let file_id = self.file_ids.grab().ok_or_else(|| {
            warn!(file = name, "file id pool exhausted");
            BinError::IdExhaustion
        })?;
        let fd = self.next_fd;
        // dropping the file on failure hands its id back
        let mut file = BinFile::new(file_id, fd, name, buffer, Arc::clone(&self.file_ids));

        let params = CreateParams {
            base_address: opts.base_address,
            load_address: opts.load_address,
            offset: opts.offset,
            size: opts.size,
            ..CreateParams::new(name, file.buffer())
        };
        let obj = BinaryObject::create(plugin, &self.object_ids, &self.config, params)?;

        file.add_object(&self.root, obj);
        self.files.push(file);
        self.cur = Some(file_id);
        self.next_fd += 1;
        info!(file = name, id = file_id, fd, "file opened");
        Ok(file_id)
    }

    /// Memory-map a file from disk and load it.
    pub fn open_path<P: AsRef<Path>>(&mut self, path: P, opts: &LoadOptions) -> Result<u32> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let size = file.metadata()?.len();
        debug!(path = %path.display(), size, "opening file");

        // memmap cannot map empty files
        let buffer = if size == 0 {
            Bytes::new()
        } else {
            // Safety: read-only map of a regular file, copied out before return.
            let mmap = unsafe { Mmap::map(&file)? };
            let mut data = Vec::new();
            data.try_reserve_exact(mmap.len()).map_err(|e| {
                warn!(path = %path.display(), size, "buffer allocation failed");
                BinError::AllocationFailure(e.to_string())
            })?;
            data.extend_from_slice(&mmap);
            Bytes::from(data)
        };
        self.open_buffer(&path.display().to_string(), buffer, opts)
    }

    /// Rebuild a file's current object at a different base and load address.
    ///
    /// The old object is destroyed only once the replacement is built, so a
    /// failed reload leaves the file as it was. Returns the new object id.
    pub fn reload(&mut self, file_id: u32, base_address: u64, load_address: u64) -> Result<u32> {
        let idx = self.file_index(file_id)?;
        let file = &self.files[idx];
        let cur = file
            .current_object()
            .ok_or_else(|| BinError::NotFound(format!("file {} has no current object", file_id)))?;
        let plugin = Arc::clone(cur.plugin());
        let params = CreateParams {
            base_address,
            load_address,
            offset: cur.buffer_offset(),
            size: cur.raw_size(),
            ..CreateParams::new(file.name(), file.buffer())
        };
        let obj = BinaryObject::create(plugin, &self.object_ids, &self.config, params)?;
        let id = obj.id();
        self.files[idx].replace_current(&self.root, obj);
        debug!(file = file_id, object = id, "file reloaded");
        Ok(id)
    }

    /// Run the extraction pipeline again on a file's current object with the
    /// context's current configuration.
    pub fn rerun(&mut self, file_id: u32) -> Result<()> {
        let config = &self.config;
        let file = self
            .files
            .iter_mut()
            .find(|f| f.id() == file_id)
            .ok_or_else(|| BinError::NotFound(format!("file {}", file_id)))?;
        if file.rerun_current(config) {
            Ok(())
        } else {
            Err(BinError::NotFound(format!("object of file {}", file_id)))
        }
    }

    /// Close a file, destroying its objects and removing its graft points.
    pub fn close_file(&mut self, file_id: u32) -> bool {
        let Ok(idx) = self.file_index(file_id) else {
            return false;
        };
        let file = self.files.remove(idx);
        bridge::ungraft(&self.root, file.namespace(), file.fd());
        if self.cur == Some(file_id) {
            self.cur = self.files.last().map(BinFile::id);
            if let Some(next) = self.files.last() {
                bridge::select(&self.root, next.namespace());
            }
        }
        info!(file = file_id, "file closed");
        true
    }

    /// Delete an object by id, defaulting to the current file and its
    /// current object. A file left with no objects is closed.
    ///
    /// Returns `true` when an object was removed.
    pub fn delete_object(&mut self, file_id: Option<u32>, object_id: Option<u32>) -> bool {
        let Some(file_id) = file_id.or(self.cur) else {
            return false;
        };
        let Ok(idx) = self.file_index(file_id) else {
            return false;
        };
        let file = &mut self.files[idx];
        let Some(object_id) = object_id.or_else(|| file.current_object().map(BinaryObject::id))
        else {
            return false;
        };
        let Some(obj) = file.remove_object(object_id) else {
            return false;
        };
        obj.destroy();
        debug!(file = file_id, object = object_id, "object deleted");
        if self.files[idx].objects().is_empty() {
            self.close_file(file_id);
        }
        true
    }

    // ---- queries ----

    pub fn files(&self) -> &[BinFile] {
        &self.files
    }

    pub fn find_file_by_id(&self, file_id: u32) -> Option<&BinFile> {
        self.files.iter().find(|f| f.id() == file_id)
    }

    pub fn find_file_by_id_mut(&mut self, file_id: u32) -> Option<&mut BinFile> {
        self.files.iter_mut().find(|f| f.id() == file_id)
    }

    pub fn current_file(&self) -> Option<&BinFile> {
        self.find_file_by_id(self.cur?)
    }

    pub fn current_file_mut(&mut self) -> Option<&mut BinFile> {
        let cur = self.cur?;
        self.find_file_by_id_mut(cur)
    }

    /// Make a file current.
    pub fn select_file(&mut self, file_id: u32) -> bool {
        match self.files.iter().find(|f| f.id() == file_id) {
            Some(file) => {
                bridge::select(&self.root, file.namespace());
                self.cur = Some(file_id);
                true
            }
            None => false,
        }
    }

    pub fn current_object(&self) -> Option<&BinaryObject> {
        self.current_file()?.current_object()
    }

    pub fn current_object_mut(&mut self) -> Option<&mut BinaryObject> {
        self.current_file_mut()?.current_object_mut()
    }

    /// Object by id across every open file.
    pub fn find_object_by_id(&self, object_id: u32) -> Option<&BinaryObject> {
        self.files.iter().find_map(|f| f.object_by_id(object_id))
    }

    pub fn find_object_by_id_mut(&mut self, object_id: u32) -> Option<&mut BinaryObject> {
        self.files
            .iter_mut()
            .find_map(|f| f.object_by_id_mut(object_id))
    }

    /// Object of a file matching exactly on arch, bits and file name.
    pub fn find_by_arch_bits(
        &self,
        file_id: u32,
        arch: &str,
        bits: u32,
        name: &str,
    ) -> Option<&BinaryObject> {
        self.find_file_by_id(file_id)?
            .find_by_arch_bits(arch, bits, name)
    }

    /// First open file whose current object has a section covering `vaddr`.
    pub fn file_at(&self, vaddr: u64) -> Option<&BinFile> {
        self.files.iter().find(|f| f.contains_vaddr(vaddr))
    }

    /// Resolve an object's relocations against a live address space, once.
    pub fn patch_relocs(&mut self, object_id: u32, io: &mut dyn IoView) -> Option<&RelocIndex> {
        self.find_object_by_id_mut(object_id)?.patch_relocs(io)
    }

    /// Synthesize a minimal file through a plugin's `create` capability.
    pub fn create(
        &self,
        plugin: &str,
        code: &[u8],
        data: &[u8],
        options: &CreateOptions,
    ) -> Result<Vec<u8>> {
        let p = self
            .plugin_by_name(plugin)
            .ok_or_else(|| BinError::InvalidArgument(format!("no plugin named '{}'", plugin)))?;
        p.create(code, data, options).map_err(|e| match e {
            PluginError::NotSupported => BinError::PluginContractViolation {
                plugin: plugin.to_string(),
                capability: "create",
            },
            other => BinError::InvalidArgument(other.to_string()),
        })
    }

    fn file_index(&self, file_id: u32) -> Result<usize> {
        self.files
            .iter()
            .position(|f| f.id() == file_id)
            .ok_or_else(|| BinError::NotFound(format!("file {}", file_id)))
    }
}
