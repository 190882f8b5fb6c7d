//! Core WebAssembly types and constants

use std::fmt;

use crate::error::PluginError;

/// WASM parsing errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WasmError {
    InvalidMagic,
    UnsupportedVersion(u32),
    Truncated { offset: usize, needed: usize },
    /// LEB128 value does not fit the target width
    Overflow { offset: usize },
    InvalidString { offset: usize },
    UnknownKind { offset: usize, kind: u8 },
}

impl fmt::Display for WasmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidMagic => write!(f, "Invalid WASM magic"),
            Self::UnsupportedVersion(v) => write!(f, "Unsupported WASM version: {}", v),
            Self::Truncated { offset, needed } => {
                write!(f, "Truncated at {:#x}, needed {} bytes", offset, needed)
            }
            Self::Overflow { offset } => write!(f, "LEB128 overflow at {:#x}", offset),
            Self::InvalidString { offset } => write!(f, "Name not UTF-8 at {:#x}", offset),
            Self::UnknownKind { offset, kind } => {
                write!(f, "Unknown external kind {} at {:#x}", kind, offset)
            }
        }
    }
}

impl std::error::Error for WasmError {}

impl WasmError {
    pub fn offset(&self) -> usize {
        match self {
            Self::InvalidMagic | Self::UnsupportedVersion(_) => 0,
            Self::Truncated { offset, .. }
            | Self::Overflow { offset }
            | Self::InvalidString { offset }
            | Self::UnknownKind { offset, .. } => *offset,
        }
    }
}

impl From<WasmError> for PluginError {
    fn from(e: WasmError) -> Self {
        match e {
            WasmError::InvalidMagic | WasmError::UnsupportedVersion(_) => {
                PluginError::Rejected(e.to_string())
            }
            other => PluginError::Malformed {
                offset: other.offset() as u64,
                message: other.to_string(),
            },
        }
    }
}

pub type Result<T> = std::result::Result<T, WasmError>;

/// WASM magic number
pub const WASM_MAGIC: &[u8; 4] = b"\0asm";

/// The only binary format version in use
pub const WASM_VERSION: u32 = 1;

/// Module header size: magic plus version
pub const HEADER_SIZE: usize = 8;

/// Known section ids
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionId {
    Custom,
    Type,
    Import,
    Function,
    Table,
    Memory,
    Global,
    Export,
    Start,
    Element,
    Code,
    Data,
    DataCount,
    Unknown(u8),
}

impl SectionId {
    pub fn from_u8(val: u8) -> Self {
        match val {
            0 => Self::Custom,
            1 => Self::Type,
            2 => Self::Import,
            3 => Self::Function,
            4 => Self::Table,
            5 => Self::Memory,
            6 => Self::Global,
            7 => Self::Export,
            8 => Self::Start,
            9 => Self::Element,
            10 => Self::Code,
            11 => Self::Data,
            12 => Self::DataCount,
            other => Self::Unknown(other),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Custom => "custom",
            Self::Type => "type",
            Self::Import => "import",
            Self::Function => "function",
            Self::Table => "table",
            Self::Memory => "memory",
            Self::Global => "global",
            Self::Export => "export",
            Self::Start => "start",
            Self::Element => "element",
            Self::Code => "code",
            Self::Data => "data",
            Self::DataCount => "datacount",
            Self::Unknown(_) => "unknown",
        }
    }
}

/// Kind of an imported or exported entity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExternalKind {
    Function = 0,
    Table = 1,
    Memory = 2,
    Global = 3,
}

impl ExternalKind {
    pub fn from_u8(val: u8, offset: usize) -> Result<Self> {
        match val {
            0 => Ok(Self::Function),
            1 => Ok(Self::Table),
            2 => Ok(Self::Memory),
            3 => Ok(Self::Global),
            kind => Err(WasmError::UnknownKind { offset, kind }),
        }
    }
}

/// A top-level section
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WasmSection {
    pub id: SectionId,
    /// Section name; custom sections carry their own
    pub name: String,
    /// File offset of the payload
    pub offset: usize,
    pub size: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportEntry {
    pub module: String,
    pub field: String,
    pub kind: ExternalKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportEntry {
    pub field: String,
    pub kind: ExternalKind,
    pub index: u32,
}

/// A function body in the code section
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodeEntry {
    /// Index in the function index space (imports first)
    pub index: u32,
    /// File offset of the body
    pub offset: usize,
    pub len: usize,
}
