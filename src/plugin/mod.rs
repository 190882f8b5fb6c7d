//! Capability contract between the object model and format plugins.
//!
//! A plugin is split in two:
//!
//! - [`BinPlugin`] is the registered descriptor. It sniffs buffers, loads
//!   them, and can synthesize minimal files of its format.
//! - [`BinFormat`] is what `load_buffer` returns: the parsed handle that
//!   answers every extraction capability.
//!
//! Every capability except `load_buffer` is optional. Extraction methods
//! return `None` when the plugin does not implement them, and `Some` (possibly
//! empty) when it does. The pipeline relies on that distinction for the
//! string and class fallbacks.

pub mod io;

use bytes::Bytes;

use crate::core::{
    BinAddr, BinInfo, Class, Field, FileType, Import, LineRecord, MemRegion, MemoryMap,
    RegisterState, Relocation, Section, SpecialSymbol, StringLiteral, Symbol,
};
use crate::error::PluginError;
use crate::metadata::Namespace;

pub use io::{IoError, IoView, VecIo};

/// Inputs of a buffer load.
#[derive(Debug, Clone)]
pub struct LoadContext<'a> {
    pub file_name: &'a str,
    /// Window of the file buffer the object covers
    pub buffer: Bytes,
    pub load_address: u64,
    /// The object's private namespace, for plugins that record metadata
    pub metadata: &'a Namespace,
}

/// Target description for [`BinPlugin::create`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateOptions {
    pub arch: String,
    pub bits: u32,
}

/// A registered format plugin.
pub trait BinPlugin: Send + Sync {
    /// Unique plugin name ("wasm", "elf", ...).
    fn name(&self) -> &str;

    fn description(&self) -> &str {
        ""
    }

    fn license(&self) -> &str {
        ""
    }

    /// Whether the plugin recognises the buffer.
    fn check_buffer(&self, _buf: &[u8]) -> bool {
        false
    }

    /// Parse the buffer. Mandatory: the default reports `NotSupported`,
    /// which object construction treats as a contract violation.
    fn load_buffer(&self, _ctx: &LoadContext<'_>) -> Result<Box<dyn BinFormat>, PluginError> {
        Err(PluginError::NotSupported)
    }

    /// Synthesize a minimal file of this format from code and data bytes.
    fn create(
        &self,
        _code: &[u8],
        _data: &[u8],
        _options: &CreateOptions,
    ) -> Result<Vec<u8>, PluginError> {
        Err(PluginError::NotSupported)
    }
}

/// The loaded view of a buffer.
pub trait BinFormat: Send + Sync {
    fn base_address(&self) -> Option<u64> {
        None
    }

    fn buffer_offset(&self) -> Option<u64> {
        None
    }

    fn declared_size(&self) -> Option<u64> {
        None
    }

    fn file_type(&self) -> Option<FileType> {
        None
    }

    /// Only consulted for [`FileType::Core`].
    fn register_state(&self) -> Option<RegisterState> {
        None
    }

    /// Only consulted for [`FileType::Core`].
    fn memory_maps(&self) -> Option<Vec<MemoryMap>> {
        None
    }

    /// Invoked once per well-known kind.
    fn special_symbol(&self, _kind: SpecialSymbol) -> Option<BinAddr> {
        None
    }

    fn entries(&self) -> Option<Vec<BinAddr>> {
        None
    }

    fn fields(&self) -> Option<Vec<Field>> {
        None
    }

    fn imports(&self) -> Option<Vec<Import>> {
        None
    }

    fn symbols(&self) -> Option<Vec<Symbol>> {
        None
    }

    fn libraries(&self) -> Option<Vec<String>> {
        None
    }

    fn sections(&self) -> Option<Vec<Section>> {
        None
    }

    fn relocations(&self) -> Option<Vec<Relocation>> {
        None
    }

    /// `None` makes the pipeline fall back to the generic scanner.
    fn strings(&self) -> Option<Vec<StringLiteral>> {
        None
    }

    /// `None` makes the pipeline reconstruct classes from symbols.
    fn classes(&self) -> Option<Vec<Class>> {
        None
    }

    fn lines(&self) -> Option<Vec<LineRecord>> {
        None
    }

    fn memory_regions(&self) -> Option<Vec<MemRegion>> {
        None
    }

    fn info(&self) -> Option<BinInfo> {
        None
    }

    /// Resolve relocation targets against a live address space.
    fn patch_relocations(&self, _io: &mut dyn IoView) -> Option<Vec<Relocation>> {
        None
    }

    /// Replacement for the object's default namespace.
    fn metadata_record_set(&self) -> Option<Namespace> {
        None
    }

    /// Preferred minimum length for the generic string scanner.
    fn min_string_length(&self) -> Option<usize> {
        None
    }
}
