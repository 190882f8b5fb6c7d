//! Common test utilities and helpers.
//!
//! `MockPlugin` answers every capability from a [`MockSpec`] the test fills
//! in, so lifecycle and pipeline behaviour can be driven without a real
//! file format.

#![allow(dead_code)]

use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use binmodel::core::{
    BinAddr, BinInfo, Class, Field, FileType, Import, LineRecord, MemRegion, MemoryMap,
    RegisterState, Relocation, Section, SpecialSymbol, StringLiteral, Symbol,
};
use binmodel::metadata::Namespace;
use binmodel::plugin::{BinFormat, BinPlugin, IoView, LoadContext};
use binmodel::{Bin, BinConfig, PluginError};
use tempfile::NamedTempFile;

/// Magic recognised by `MockPlugin::check_buffer`.
pub const MOCK_MAGIC: &[u8] = b"MOCK";

/// Auxiliary record set the mock hands back after loading.
#[derive(Debug, Clone)]
pub enum RecordSet {
    /// The namespace the object was loaded with
    Echo,
    /// Always the same namespace
    Fixed(Namespace),
    /// A new namespace per call, tagged with `generation`
    Fresh,
}

/// What the mock format reports. `None` fields are unimplemented
/// capabilities.
#[derive(Debug, Clone, Default)]
pub struct MockSpec {
    /// Fail `load_buffer` with `NotSupported`
    pub no_load: bool,
    /// Fail `load_buffer` with `Rejected`
    pub reject: bool,
    pub file_type: Option<FileType>,
    pub register_state: Option<RegisterState>,
    pub memory_maps: Option<Vec<MemoryMap>>,
    pub base_address: Option<u64>,
    pub buffer_offset: Option<u64>,
    pub declared_size: Option<u64>,
    pub main: Option<BinAddr>,
    pub entries: Option<Vec<BinAddr>>,
    pub fields: Option<Vec<Field>>,
    pub imports: Option<Vec<Import>>,
    pub symbols: Option<Vec<Symbol>>,
    pub libs: Option<Vec<String>>,
    pub sections: Option<Vec<Section>>,
    pub relocs: Option<Vec<Relocation>>,
    /// Result of the lazy relocation patch
    pub patched: Option<Vec<Relocation>>,
    pub strings: Option<Vec<StringLiteral>>,
    pub classes: Option<Vec<Class>>,
    pub info: Option<BinInfo>,
    pub lines: Option<Vec<LineRecord>>,
    pub memory_regions: Option<Vec<MemRegion>>,
    pub record_set: Option<RecordSet>,
}

/// Call counters shared between a plugin and every format it loads.
#[derive(Debug, Default)]
pub struct MockCounters {
    pub loads: AtomicUsize,
    pub patches: AtomicUsize,
    pub record_sets: AtomicUsize,
}

pub struct MockPlugin {
    name: String,
    spec: MockSpec,
    pub counters: Arc<MockCounters>,
}

impl MockPlugin {
    pub fn new(name: &str, spec: MockSpec) -> Self {
        Self {
            name: name.to_string(),
            spec,
            counters: Arc::new(MockCounters::default()),
        }
    }

    pub fn patches(&self) -> usize {
        self.counters.patches.load(Ordering::SeqCst)
    }
}

impl BinPlugin for MockPlugin {
    fn name(&self) -> &str {
        &self.name
    }

    fn check_buffer(&self, buf: &[u8]) -> bool {
        buf.starts_with(MOCK_MAGIC)
    }

    fn load_buffer(&self, ctx: &LoadContext<'_>) -> Result<Box<dyn BinFormat>, PluginError> {
        self.counters.loads.fetch_add(1, Ordering::SeqCst);
        if self.spec.no_load {
            return Err(PluginError::NotSupported);
        }
        if self.spec.reject {
            return Err(PluginError::Rejected("mock rejects".into()));
        }
        ctx.metadata.set("mock.file", ctx.file_name);
        Ok(Box::new(MockFormat {
            spec: self.spec.clone(),
            counters: Arc::clone(&self.counters),
            loaded_with: ctx.metadata.clone(),
        }))
    }
}

struct MockFormat {
    spec: MockSpec,
    counters: Arc<MockCounters>,
    loaded_with: Namespace,
}

impl BinFormat for MockFormat {
    fn file_type(&self) -> Option<FileType> {
        self.spec.file_type
    }

    fn register_state(&self) -> Option<RegisterState> {
        self.spec.register_state.clone()
    }

    fn memory_maps(&self) -> Option<Vec<MemoryMap>> {
        self.spec.memory_maps.clone()
    }

    fn base_address(&self) -> Option<u64> {
        self.spec.base_address
    }

    fn buffer_offset(&self) -> Option<u64> {
        self.spec.buffer_offset
    }

    fn declared_size(&self) -> Option<u64> {
        self.spec.declared_size
    }

    fn special_symbol(&self, kind: SpecialSymbol) -> Option<BinAddr> {
        match kind {
            SpecialSymbol::Main => self.spec.main,
            _ => None,
        }
    }

    fn entries(&self) -> Option<Vec<BinAddr>> {
        self.spec.entries.clone()
    }

    fn fields(&self) -> Option<Vec<Field>> {
        self.spec.fields.clone()
    }

    fn imports(&self) -> Option<Vec<Import>> {
        self.spec.imports.clone()
    }

    fn symbols(&self) -> Option<Vec<Symbol>> {
        self.spec.symbols.clone()
    }

    fn libraries(&self) -> Option<Vec<String>> {
        self.spec.libs.clone()
    }

    fn sections(&self) -> Option<Vec<Section>> {
        self.spec.sections.clone()
    }

    fn relocations(&self) -> Option<Vec<Relocation>> {
        self.spec.relocs.clone()
    }

    fn strings(&self) -> Option<Vec<StringLiteral>> {
        self.spec.strings.clone()
    }

    fn classes(&self) -> Option<Vec<Class>> {
        self.spec.classes.clone()
    }

    fn info(&self) -> Option<BinInfo> {
        self.spec.info.clone()
    }

    fn lines(&self) -> Option<Vec<LineRecord>> {
        self.spec.lines.clone()
    }

    fn memory_regions(&self) -> Option<Vec<MemRegion>> {
        self.spec.memory_regions.clone()
    }

    fn metadata_record_set(&self) -> Option<Namespace> {
        match self.spec.record_set.as_ref()? {
            RecordSet::Echo => Some(self.loaded_with.clone()),
            RecordSet::Fixed(ns) => Some(ns.clone()),
            RecordSet::Fresh => {
                let n = self.counters.record_sets.fetch_add(1, Ordering::SeqCst) + 1;
                let ns = Namespace::new("records");
                ns.set("generation", n.to_string());
                Some(ns)
            }
        }
    }

    fn patch_relocations(&self, _io: &mut dyn IoView) -> Option<Vec<Relocation>> {
        self.counters.patches.fetch_add(1, Ordering::SeqCst);
        self.spec.patched.clone()
    }
}

/// A context with one mock plugin registered; returns the plugin handle for
/// counter checks.
pub fn mock_bin(config: BinConfig, spec: MockSpec) -> (Bin, Arc<MockPlugin>) {
    let plugin = Arc::new(MockPlugin::new("mock", spec));
    let mut bin = Bin::new(config);
    bin.add_plugin(Arc::clone(&plugin) as Arc<dyn BinPlugin>)
        .unwrap();
    (bin, plugin)
}

/// `MOCK` followed by `len - 4` zero bytes.
pub fn mock_buffer(len: usize) -> bytes::Bytes {
    let mut v = MOCK_MAGIC.to_vec();
    v.resize(len.max(MOCK_MAGIC.len()), 0);
    bytes::Bytes::from(v)
}

/// Creates a temporary file with the given content.
pub fn create_temp_file(content: &[u8]) -> NamedTempFile {
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(content).unwrap();
    temp_file.flush().unwrap();
    temp_file
}

/// Minimal WebAssembly module builder for plugin tests.
pub mod wasm {
    pub fn uleb(out: &mut Vec<u8>, mut v: u32) {
        loop {
            let b = (v & 0x7f) as u8;
            v >>= 7;
            if v == 0 {
                out.push(b);
                return;
            }
            out.push(b | 0x80);
        }
    }

    pub fn name(out: &mut Vec<u8>, s: &str) {
        uleb(out, s.len() as u32);
        out.extend_from_slice(s.as_bytes());
    }

    pub fn section(out: &mut Vec<u8>, id: u8, payload: &[u8]) {
        out.push(id);
        uleb(out, payload.len() as u32);
        out.extend_from_slice(payload);
    }

    /// Imports `env.print`, defines two functions, exports the second as
    /// `main`, marks it as the start function, and carries a data segment
    /// with a printable string.
    pub fn sample_module() -> Vec<u8> {
        let mut m = b"\0asm\x01\0\0\0".to_vec();
        section(&mut m, 1, &[1, 0x60, 0, 0]);

        let mut imp = vec![1];
        name(&mut imp, "env");
        name(&mut imp, "print");
        imp.extend_from_slice(&[0, 0]);
        section(&mut m, 2, &imp);

        section(&mut m, 3, &[2, 0, 0]);
        section(&mut m, 5, &[1, 0, 1]);

        let mut exp = vec![1];
        name(&mut exp, "main");
        exp.extend_from_slice(&[0, 2]);
        section(&mut m, 7, &exp);

        section(&mut m, 8, &[2]);
        section(&mut m, 10, &[2, 2, 0, 0x0b, 4, 0, 0x10, 0, 0x0b]);

        // one active segment for memory 0 at offset 0
        let text = b"greetings from wasm";
        let mut data = vec![1, 0, 0x41, 0, 0x0b];
        uleb(&mut data, text.len() as u32);
        data.extend_from_slice(text);
        section(&mut m, 11, &data);
        m
    }
}
