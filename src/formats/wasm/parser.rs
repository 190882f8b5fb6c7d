//! Module walker: header check and section decoding

use std::collections::BTreeMap;

use super::reader::Reader;
use super::types::*;

/// Name of the custom section carrying debug names
const NAME_SECTION: &str = "name";
/// Function-names subsection of the name section
const NAME_SUBSECTION_FUNCTIONS: u8 = 1;

/// Whether `data` starts with the module magic.
pub fn has_magic(data: &[u8]) -> bool {
    data.len() >= WASM_MAGIC.len() && &data[..WASM_MAGIC.len()] == WASM_MAGIC
}

/// Parsed view of a module
pub struct WasmParser<'data> {
    data: &'data [u8],
    sections: Vec<WasmSection>,
}

impl<'data> WasmParser<'data> {
    /// Check the header and walk the section list.
    pub fn parse(data: &'data [u8]) -> Result<Self> {
        if !has_magic(data) {
            return Err(WasmError::InvalidMagic);
        }
        let mut r = Reader::new(data, WASM_MAGIC.len());
        let v = r.read_bytes(4)?;
        let version = u32::from_le_bytes([v[0], v[1], v[2], v[3]]);
        if version != WASM_VERSION {
            return Err(WasmError::UnsupportedVersion(version));
        }

        let mut sections = Vec::new();
        while !r.is_empty() {
            let id = SectionId::from_u8(r.read_u8()?);
            let size = r.read_uleb32()? as usize;
            let start = r.pos();
            let mut payload = Reader::new(r.read_bytes(size)?, 0);
            let name = match id {
                SectionId::Custom => payload.read_name()?.to_string(),
                other => other.name().to_string(),
            };
            sections.push(WasmSection {
                id,
                name,
                offset: start,
                size,
            });
        }
        Ok(Self { data, sections })
    }

    pub fn data(&self) -> &'data [u8] {
        self.data
    }

    pub fn sections(&self) -> &[WasmSection] {
        &self.sections
    }

    fn section(&self, id: SectionId) -> Option<&WasmSection> {
        self.sections.iter().find(|s| s.id == id)
    }

    fn custom_section(&self, name: &str) -> Option<&WasmSection> {
        self.sections
            .iter()
            .find(|s| s.id == SectionId::Custom && s.name == name)
    }

    /// Reader positioned at the start of a section payload, with absolute
    /// offsets.
    fn payload(&self, sec: &WasmSection) -> Reader<'data> {
        Reader::new(&self.data[..sec.offset + sec.size], sec.offset)
    }

    pub fn imports(&self) -> Result<Vec<ImportEntry>> {
        let Some(sec) = self.section(SectionId::Import) else {
            return Ok(Vec::new());
        };
        let mut r = self.payload(sec);
        let count = r.read_uleb32()?;
        let mut out = Vec::new();
        for _ in 0..count {
            let module = r.read_name()?.to_string();
            let field = r.read_name()?.to_string();
            let at = r.pos();
            let kind = ExternalKind::from_u8(r.read_u8()?, at)?;
            match kind {
                ExternalKind::Function => {
                    r.read_uleb32()?;
                }
                ExternalKind::Table => {
                    r.read_u8()?;
                    r.skip_limits()?;
                }
                ExternalKind::Memory => r.skip_limits()?,
                ExternalKind::Global => r.skip(2)?,
            }
            out.push(ImportEntry {
                module,
                field,
                kind,
            });
        }
        Ok(out)
    }

    pub fn exports(&self) -> Result<Vec<ExportEntry>> {
        let Some(sec) = self.section(SectionId::Export) else {
            return Ok(Vec::new());
        };
        let mut r = self.payload(sec);
        let count = r.read_uleb32()?;
        let mut out = Vec::new();
        for _ in 0..count {
            let field = r.read_name()?.to_string();
            let at = r.pos();
            let kind = ExternalKind::from_u8(r.read_u8()?, at)?;
            let index = r.read_uleb32()?;
            out.push(ExportEntry { field, kind, index });
        }
        Ok(out)
    }

    /// Function index of the start function.
    pub fn start(&self) -> Result<Option<u32>> {
        match self.section(SectionId::Start) {
            Some(sec) => self.payload(sec).read_uleb32().map(Some),
            None => Ok(None),
        }
    }

    /// Function bodies, indexed after the imported functions.
    pub fn codes(&self, imported_functions: u32) -> Result<Vec<CodeEntry>> {
        let Some(sec) = self.section(SectionId::Code) else {
            return Ok(Vec::new());
        };
        let mut r = self.payload(sec);
        let count = r.read_uleb32()?;
        let mut out = Vec::new();
        for i in 0..count {
            let len = r.read_uleb32()? as usize;
            let offset = r.pos();
            r.skip(len)?;
            out.push(CodeEntry {
                index: imported_functions + i,
                offset,
                len,
            });
        }
        Ok(out)
    }

    /// Function names from the `name` custom section. Other subsections are
    /// skipped; a module without the section yields an empty map.
    pub fn function_names(&self) -> Result<BTreeMap<u32, String>> {
        let mut names = BTreeMap::new();
        let Some(sec) = self.custom_section(NAME_SECTION) else {
            return Ok(names);
        };
        let mut r = self.payload(sec);
        r.read_name()?;
        while !r.is_empty() {
            let id = r.read_u8()?;
            let size = r.read_uleb32()? as usize;
            if id != NAME_SUBSECTION_FUNCTIONS {
                r.skip(size)?;
                continue;
            }
            let count = r.read_uleb32()?;
            for _ in 0..count {
                let index = r.read_uleb32()?;
                let name = r.read_name()?;
                names.insert(index, name.to_string());
            }
        }
        Ok(names)
    }
}
