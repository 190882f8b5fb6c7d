//! WebAssembly plugin
//!
//! Decodes the module section list once at load time and answers the
//! capability queries from the decoded tables.

pub mod parser;
pub mod reader;
pub mod types;

use std::collections::BTreeMap;

use tracing::{debug, trace};

use crate::core::{
    BinAddr, BinInfo, Endianness, EntryKind, FileType, Import, Section, SectionPerms, Symbol,
    SymbolBinding, SymbolKind,
};
use crate::error::PluginError;
use crate::plugin::{BinFormat, BinPlugin, CreateOptions, LoadContext};
pub use parser::{has_magic, WasmParser};
pub use types::{
    CodeEntry, ExportEntry, ExternalKind, ImportEntry, SectionId, WasmError, WasmSection,
    HEADER_SIZE, WASM_MAGIC, WASM_VERSION,
};

/// Registered WebAssembly plugin
#[derive(Debug, Clone, Copy, Default)]
pub struct WasmPlugin;

impl BinPlugin for WasmPlugin {
    fn name(&self) -> &str {
        "wasm"
    }

    fn description(&self) -> &str {
        "WebAssembly bin plugin"
    }

    fn license(&self) -> &str {
        "MIT"
    }

    fn check_buffer(&self, buf: &[u8]) -> bool {
        has_magic(buf)
    }

    fn load_buffer(&self, ctx: &LoadContext<'_>) -> Result<Box<dyn BinFormat>, PluginError> {
        let module = WasmModule::parse(ctx.file_name, &ctx.buffer)?;
        ctx.metadata.set("wasm.sections", module.sections.len().to_string());
        ctx.metadata.set("wasm.functions", module.codes.len().to_string());
        debug!(
            sections = module.sections.len(),
            imports = module.imports.len(),
            functions = module.codes.len(),
            "wasm module loaded"
        );
        Ok(Box::new(module))
    }

    /// Emit an empty module: magic and version only.
    fn create(
        &self,
        _code: &[u8],
        _data: &[u8],
        _options: &CreateOptions,
    ) -> Result<Vec<u8>, PluginError> {
        let mut out = Vec::with_capacity(HEADER_SIZE);
        out.extend_from_slice(WASM_MAGIC);
        out.extend_from_slice(&WASM_VERSION.to_le_bytes());
        Ok(out)
    }
}

/// Decoded module tables
#[derive(Debug, Clone)]
pub struct WasmModule {
    file_name: String,
    size: u64,
    sections: Vec<WasmSection>,
    imports: Vec<ImportEntry>,
    exports: Vec<ExportEntry>,
    codes: Vec<CodeEntry>,
    start: Option<u32>,
    names: BTreeMap<u32, String>,
}

impl WasmModule {
    pub fn parse(file_name: &str, data: &[u8]) -> types::Result<Self> {
        let p = WasmParser::parse(data)?;
        let imports = p.imports()?;
        let imported_functions = imports
            .iter()
            .filter(|i| i.kind == ExternalKind::Function)
            .count() as u32;
        Ok(Self {
            file_name: file_name.to_string(),
            size: data.len() as u64,
            sections: p.sections().to_vec(),
            exports: p.exports()?,
            codes: p.codes(imported_functions)?,
            start: p.start()?,
            names: p.function_names()?,
            imports,
        })
    }

    fn function_name(&self, index: u32) -> (String, SymbolBinding) {
        if let Some(name) = self.names.get(&index) {
            return (name.clone(), SymbolBinding::None);
        }
        self.exports
            .iter()
            .find(|e| e.kind == ExternalKind::Function && e.index == index)
            .map(|e| (e.field.clone(), SymbolBinding::Global))
            .unwrap_or_else(|| (format!("fcn.{}", index), SymbolBinding::None))
    }
}

fn symbol_kind(kind: ExternalKind) -> SymbolKind {
    match kind {
        ExternalKind::Function => SymbolKind::Function,
        ExternalKind::Table => SymbolKind::Table,
        ExternalKind::Memory => SymbolKind::Memory,
        ExternalKind::Global => SymbolKind::Global,
    }
}

impl BinFormat for WasmModule {
    fn base_address(&self) -> Option<u64> {
        Some(0)
    }

    fn declared_size(&self) -> Option<u64> {
        Some(self.size)
    }

    fn file_type(&self) -> Option<FileType> {
        Some(FileType::Executable)
    }

    /// The start function's body, else the first body. Absent for a
    /// module without code.
    fn entries(&self) -> Option<Vec<BinAddr>> {
        let start = self
            .start
            .and_then(|idx| self.codes.iter().find(|c| c.index == idx));
        let entry = start.or_else(|| self.codes.first());
        trace!(start = ?self.start, found = entry.is_some(), "wasm entry");
        let c = entry?;
        let offset = c.offset as u64;
        Some(vec![BinAddr::new(offset, Some(offset), EntryKind::Program)])
    }

    fn sections(&self) -> Option<Vec<Section>> {
        Some(
            self.sections
                .iter()
                .map(|s| {
                    let perms = match s.id {
                        SectionId::Code => SectionPerms::READ | SectionPerms::EXECUTE,
                        SectionId::Data | SectionId::Memory => {
                            SectionPerms::READ | SectionPerms::WRITE
                        }
                        _ => SectionPerms::READ,
                    };
                    let mut sec = Section::new(s.name.as_str(), s.offset as u64, s.size as u64)
                        .with_vaddr(s.offset as u64, s.size as u64)
                        .with_perms(perms);
                    sec.is_data = matches!(s.id, SectionId::Data | SectionId::Memory);
                    sec
                })
                .collect(),
        )
    }

    fn imports(&self) -> Option<Vec<Import>> {
        Some(
            self.imports
                .iter()
                .enumerate()
                .map(|(i, imp)| {
                    let mut out = Import::new(
                        imp.field.as_str(),
                        Some(imp.module.clone()),
                        symbol_kind(imp.kind),
                    );
                    out.ordinal = i as u32;
                    out
                })
                .collect(),
        )
    }

    /// Imports first as `imp.module.field`, then one symbol per function body.
    fn symbols(&self) -> Option<Vec<Symbol>> {
        let mut out = Vec::with_capacity(self.imports.len() + self.codes.len());
        for imp in &self.imports {
            let mut sym = Symbol::new(format!("imp.{}.{}", imp.module, imp.field), None)
                .with_kind(symbol_kind(imp.kind));
            sym.libname = Some(imp.module.clone());
            sym.is_imported = true;
            sym.ordinal = out.len() as u32;
            out.push(sym);
        }
        for code in &self.codes {
            let (name, bind) = self.function_name(code.index);
            let mut sym = Symbol::new(name, Some(code.offset as u64))
                .with_vaddr(code.offset as u64)
                .with_kind(SymbolKind::Function);
            sym.bind = bind;
            sym.size = code.len as u64;
            sym.ordinal = out.len() as u32;
            out.push(sym);
        }
        Some(out)
    }

    fn libraries(&self) -> Option<Vec<String>> {
        let mut libs: Vec<String> = Vec::new();
        for imp in &self.imports {
            if !libs.contains(&imp.module) {
                libs.push(imp.module.clone());
            }
        }
        Some(libs)
    }

    fn info(&self) -> Option<BinInfo> {
        Some(BinInfo {
            file: self.file_name.clone(),
            arch: "wasm".into(),
            machine: "wasm".into(),
            bits: 32,
            endian: Endianness::Little,
            os: "WebAssembly".into(),
            bin_type: "EXEC".into(),
            bclass: "module".into(),
            rclass: "wasm".into(),
            subsystem: "wasm".into(),
            has_va: false,
            has_debug_info: !self.names.is_empty(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reader::write_uleb32;

    fn section(out: &mut Vec<u8>, id: u8, payload: &[u8]) {
        out.push(id);
        write_uleb32(out, payload.len() as u32);
        out.extend_from_slice(payload);
    }

    fn name(out: &mut Vec<u8>, s: &str) {
        write_uleb32(out, s.len() as u32);
        out.extend_from_slice(s.as_bytes());
    }

    /// One imported function, two bodies, the second exported as `run`.
    fn module() -> Vec<u8> {
        let mut m = WasmPlugin
            .create(&[], &[], &CreateOptions::default())
            .unwrap();
        // type: () -> ()
        section(&mut m, 1, &[1, 0x60, 0, 0]);
        let mut imp = vec![1];
        name(&mut imp, "env");
        name(&mut imp, "log");
        imp.extend_from_slice(&[0, 0]);
        section(&mut m, 2, &imp);
        section(&mut m, 3, &[2, 0, 0]);
        let mut exp = vec![1];
        name(&mut exp, "run");
        exp.extend_from_slice(&[0, 2]);
        section(&mut m, 7, &exp);
        section(&mut m, 10, &[2, 2, 0, 0x0b, 3, 0, 0x01, 0x0b]);
        section(&mut m, 11, &[0]);
        m
    }

    #[test]
    fn test_check_and_create() {
        let header = WasmPlugin
            .create(&[], &[], &CreateOptions::default())
            .unwrap();
        assert_eq!(header, b"\0asm\x01\0\0\0");
        assert!(WasmPlugin.check_buffer(&header));
        assert!(!WasmPlugin.check_buffer(b"\x7fELF"));
        let m = WasmModule::parse("empty.wasm", &header).unwrap();
        assert!(m.sections().unwrap().is_empty());
        assert!(m.entries().is_none());
    }

    #[test]
    fn test_load_through_plugin_object() {
        let plugin: &dyn BinPlugin = &WasmPlugin;
        let metadata = crate::metadata::Namespace::new("info");
        let ctx = LoadContext {
            file_name: "a.wasm",
            buffer: bytes::Bytes::from(module()),
            load_address: 0,
            metadata: &metadata,
        };
        let format = plugin.load_buffer(&ctx).unwrap();
        assert_eq!(format.symbols().unwrap().len(), 3);
        assert_eq!(metadata.get("wasm.functions").as_deref(), Some("2"));

        let ctx = LoadContext {
            buffer: bytes::Bytes::from_static(b"\x7fELF\x02\x01\x01\0"),
            ..ctx
        };
        assert!(matches!(
            plugin.load_buffer(&ctx),
            Err(PluginError::Rejected(_))
        ));
        let header = plugin.create(&[], &[], &CreateOptions::default()).unwrap();
        assert_eq!(header.len(), HEADER_SIZE);
    }

    #[test]
    fn test_rejects_bad_version() {
        let err = WasmModule::parse("x", b"\0asm\x02\0\0\0").unwrap_err();
        assert_eq!(err, WasmError::UnsupportedVersion(2));
        assert!(matches!(PluginError::from(err), PluginError::Rejected(_)));
    }

    #[test]
    fn test_truncated_section_is_malformed() {
        let mut m = module();
        m.truncate(m.len() - 4);
        let err = WasmModule::parse("x", &m).unwrap_err();
        assert!(matches!(
            PluginError::from(err),
            PluginError::Malformed { .. }
        ));
    }

    #[test]
    fn test_symbols_and_imports() {
        let m = WasmModule::parse("a.wasm", &module()).unwrap();
        let syms = m.symbols().unwrap();
        let names: Vec<_> = syms.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["imp.env.log", "fcn.1", "run"]);
        assert!(syms[0].is_imported);
        assert_eq!(syms[2].bind, SymbolBinding::Global);
        assert_eq!(syms[1].size, 2);
        assert_eq!(syms[2].size, 3);

        let imports = m.imports().unwrap();
        assert_eq!(imports.len(), 1);
        assert_eq!(imports[0].name, "log");
        assert_eq!(imports[0].classname.as_deref(), Some("env"));
        assert_eq!(m.libraries().unwrap(), vec!["env".to_string()]);
    }

    #[test]
    fn test_sections_and_entry() {
        let bytes = module();
        let m = WasmModule::parse("a.wasm", &bytes).unwrap();
        let secs = m.sections().unwrap();
        let names: Vec<_> = secs.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["type", "import", "function", "export", "code", "data"]
        );
        assert!(secs[5].is_data);
        assert!(secs[4].is_executable());

        // no start section: first body
        let entry = m.entries().unwrap()[0];
        let first = m.symbols().unwrap()[1].paddr.unwrap();
        assert_eq!(entry.paddr, Some(first));
        assert_eq!(bytes[first as usize], 0);

        let info = m.info().unwrap();
        assert!(info.matches("wasm", 32, "a.wasm"));
        assert_eq!(info.rclass, "wasm");
        assert_eq!(m.declared_size(), Some(bytes.len() as u64));
    }

    #[test]
    fn test_name_section_wins() {
        let mut bytes = module();
        let mut payload = Vec::new();
        name(&mut payload, "name");
        let mut sub = vec![1];
        name(&mut sub, "helper");
        let mut fnames = vec![1];
        fnames.extend_from_slice(&sub);
        payload.push(1);
        write_uleb32(&mut payload, fnames.len() as u32);
        payload.extend_from_slice(&fnames);
        section(&mut bytes, 0, &payload);

        let m = WasmModule::parse("a.wasm", &bytes).unwrap();
        let syms = m.symbols().unwrap();
        assert_eq!(syms[1].name, "helper");
        assert_eq!(syms[2].name, "run");
        assert!(m.info().unwrap().has_debug_info);
    }
}
