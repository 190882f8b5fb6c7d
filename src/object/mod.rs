//! The binary object: one loaded interpretation of a buffer.
//!
//! An object is created by [`BinaryObject::create`], populated by the
//! extraction pipeline ([`BinaryObject::set_items`]) and owned by the
//! [`crate::file::BinFile`] that loaded it. Dropping an object releases every
//! collection it owns and returns its id to the pool.

pub mod classes;
pub mod lifecycle;
pub mod pipeline;
pub mod relocs;

use bytes::Bytes;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use tracing::trace;

use crate::core::address::{self, Translation};
use crate::core::{
    BinAddr, BinInfo, Class, Field, IdPool, Import, Language, LineRecord, MemRegion, MemoryMap,
    RegisterState, Relocation, Section, SpecialSymbol, StringLiteral, Symbol,
};
use crate::metadata::Namespace;
use crate::plugin::{BinFormat, BinPlugin, IoView};

pub use lifecycle::CreateParams;
pub use relocs::RelocIndex;

/// A populated binary object.
pub struct BinaryObject {
    id: u32,
    ids: Arc<IdPool>,

    /// Base address requested by the caller (`UNSPECIFIED` if none)
    requested_base: u64,
    /// Base address reported by the plugin
    base_address: u64,
    base_shift: i64,
    load_address: u64,
    buffer_offset: u64,
    declared_size: u64,
    raw_size: u64,

    plugin: Arc<dyn BinPlugin>,
    format: Box<dyn BinFormat>,
    buffer: Bytes,

    entries: Option<Vec<BinAddr>>,
    fields: Option<Vec<Field>>,
    imports: Option<Vec<Import>>,
    libs: Option<Vec<String>>,
    sections: Option<Vec<Section>>,
    strings: Option<Vec<StringLiteral>>,
    symbols: Option<Vec<Symbol>>,
    classes: Option<Vec<Class>>,
    lines: Option<Vec<LineRecord>>,
    relocs: Option<RelocIndex>,
    relocs_patched: bool,
    binsym: [Option<BinAddr>; SpecialSymbol::COUNT],
    regstate: Option<RegisterState>,
    maps: Option<Vec<MemoryMap>>,
    mem: Option<Vec<MemRegion>>,
    info: Option<BinInfo>,

    class_method_cache: Option<BTreeMap<String, String>>,
    metadata: Namespace,
    language: Language,
}

impl BinaryObject {
    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn plugin(&self) -> &Arc<dyn BinPlugin> {
        &self.plugin
    }

    pub fn plugin_name(&self) -> &str {
        self.plugin.name()
    }

    /// The plugin's loaded handle.
    pub fn format(&self) -> &dyn BinFormat {
        self.format.as_ref()
    }

    /// Buffer window the object was loaded from.
    pub fn buffer(&self) -> &Bytes {
        &self.buffer
    }

    /// Base address as reported by the plugin, before the shift.
    pub fn reported_base_address(&self) -> u64 {
        self.base_address
    }

    pub fn base_shift(&self) -> i64 {
        self.base_shift
    }

    /// Base address callers observe: reported base plus shift.
    pub fn effective_base_address(&self) -> u64 {
        address::effective_base(self.base_address, self.base_shift)
    }

    /// Offset relative to the effective base.
    pub fn addr_with_base(&self, offset: u64) -> u64 {
        self.effective_base_address().wrapping_add(offset)
    }

    pub fn load_address(&self) -> u64 {
        self.load_address
    }

    pub fn buffer_offset(&self) -> u64 {
        self.buffer_offset
    }

    /// Size reported by the plugin, or the raw size when it reports none.
    pub fn declared_size(&self) -> u64 {
        self.declared_size
    }

    /// Bytes of the file actually covered by the object.
    pub fn raw_size(&self) -> u64 {
        self.raw_size
    }

    pub fn translation(&self) -> Translation {
        Translation::new(self.load_address, self.base_shift)
    }

    pub fn entries(&self) -> Option<&[BinAddr]> {
        self.entries.as_deref()
    }

    pub fn fields(&self) -> Option<&[Field]> {
        self.fields.as_deref()
    }

    pub fn imports(&self) -> Option<&[Import]> {
        self.imports.as_deref()
    }

    pub fn libs(&self) -> Option<&[String]> {
        self.libs.as_deref()
    }

    pub fn sections(&self) -> Option<&[Section]> {
        self.sections.as_deref()
    }

    pub fn strings(&self) -> Option<&[StringLiteral]> {
        self.strings.as_deref()
    }

    pub fn symbols(&self) -> Option<&[Symbol]> {
        self.symbols.as_deref()
    }

    pub fn classes(&self) -> Option<&[Class]> {
        self.classes.as_deref()
    }

    pub fn lines(&self) -> Option<&[LineRecord]> {
        self.lines.as_deref()
    }

    pub fn relocs(&self) -> Option<&RelocIndex> {
        self.relocs.as_ref()
    }

    pub fn special_symbol(&self, kind: SpecialSymbol) -> Option<&BinAddr> {
        self.binsym[kind.index()].as_ref()
    }

    pub fn register_state(&self) -> Option<&RegisterState> {
        self.regstate.as_ref()
    }

    pub fn memory_maps(&self) -> Option<&[MemoryMap]> {
        self.maps.as_deref()
    }

    pub fn memory_regions(&self) -> Option<&[MemRegion]> {
        self.mem.as_deref()
    }

    pub fn info(&self) -> Option<&BinInfo> {
        self.info.as_ref()
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn metadata(&self) -> &Namespace {
        &self.metadata
    }

    pub fn class_method_cache(&self) -> Option<&BTreeMap<String, String>> {
        self.class_method_cache.as_ref()
    }

    /// `"class.method"` label of the method at `vaddr`.
    pub fn class_method_at(&self, vaddr: u64) -> Option<&str> {
        self.class_method_cache
            .as_ref()?
            .get(&classes::method_cache_key(vaddr))
            .map(String::as_str)
    }

    /// Relocation inserted at exactly `vaddr`.
    pub fn reloc_at(&self, vaddr: u64) -> Option<&Relocation> {
        self.relocs.as_ref()?.get(vaddr)
    }

    /// Whether the lazy relocation patch already ran for this object.
    pub fn relocs_patched(&self) -> bool {
        self.relocs_patched
    }

    /// Resolve relocations against a live address space.
    ///
    /// The plugin is asked at most once per object; later calls return the
    /// existing index unchanged.
    pub fn patch_relocs(&mut self, io: &mut dyn IoView) -> Option<&RelocIndex> {
        if !self.relocs_patched {
            self.relocs_patched = true;
            if let Some(mut patched) = self.format.patch_relocations(io) {
                address::rebase_all(&mut patched, &self.translation());
                trace!(object = self.id, count = patched.len(), "relocations patched");
                self.relocs = Some(RelocIndex::build(patched));
            }
        }
        self.relocs.as_ref()
    }

    /// Section covering a virtual address.
    pub fn section_at_vaddr(&self, vaddr: u64) -> Option<&Section> {
        self.sections
            .as_deref()?
            .iter()
            .find(|s| s.contains_vaddr(vaddr))
    }

    /// Translate a virtual address to a file offset through the sections,
    /// falling back to the object's own translation.
    pub fn vaddr_to_paddr(&self, vaddr: u64) -> u64 {
        match self.section_at_vaddr(vaddr) {
            Some(Section {
                paddr: Some(p),
                vaddr: Some(v),
                ..
            }) => p.wrapping_add(vaddr - v),
            _ => self.translation().vaddr_to_paddr(vaddr),
        }
    }

    /// Translate a file offset to a virtual address through the sections,
    /// falling back to the object's own translation.
    pub fn paddr_to_vaddr(&self, paddr: u64) -> u64 {
        let hit = self
            .sections
            .as_deref()
            .and_then(|secs| secs.iter().find(|s| s.contains_paddr(paddr)));
        match hit {
            Some(Section {
                paddr: Some(p),
                vaddr: Some(v),
                ..
            }) => v.wrapping_add(paddr - p),
            _ => self.translation().vaddr(None, Some(paddr)).unwrap_or(paddr),
        }
    }

    /// Release every owned collection. Safe on any partially populated
    /// object and idempotent.
    pub fn clear_items(&mut self) {
        self.entries = None;
        self.fields = None;
        self.imports = None;
        self.libs = None;
        self.sections = None;
        self.strings = None;
        self.symbols = None;
        self.classes = None;
        self.lines = None;
        self.relocs = None;
        self.binsym = Default::default();
        self.regstate = None;
        self.maps = None;
        self.mem = None;
        self.info = None;
        self.class_method_cache = None;
    }
}

impl Drop for BinaryObject {
    fn drop(&mut self) {
        self.clear_items();
        self.ids.release(self.id);
        trace!(object = self.id, "object destroyed");
    }
}

impl fmt::Debug for BinaryObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BinaryObject")
            .field("id", &self.id)
            .field("plugin", &self.plugin.name())
            .field("base", &format_args!("{:#x}", self.effective_base_address()))
            .field("load", &format_args!("{:#x}", self.load_address))
            .field("language", &self.language)
            .finish_non_exhaustive()
    }
}
