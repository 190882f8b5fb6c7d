//! Extraction pipeline: populate an object from its plugin.
//!
//! Steps run in a fixed order. Base-address resolution comes first among
//! the address-bearing steps because every later rebase depends on the
//! shift. A capability the plugin lacks leaves its collection absent; no
//! step here can fail the object.

use tracing::{debug, trace};

use super::{classes, BinaryObject, RelocIndex};
use crate::config::{BinConfig, RequestFilter};
use crate::core::address::{self, rebase_all, Rebase};
use crate::core::{FileType, Language, SpecialSymbol};
use crate::demangle;
use crate::strings::{self, ScanConfig};
use crate::symbols::{filter, lang};

impl BinaryObject {
    /// Run every extraction step against the plugin.
    ///
    /// Running it again re-extracts the plugin-backed lists; the class-method
    /// cache is only ever built once.
    pub fn set_items(&mut self, config: &BinConfig) {
        let format = self.format.as_ref();

        // 1. process state for core dumps
        if format.file_type() == Some(FileType::Core) {
            self.regstate = format.register_state();
            self.maps = format.memory_maps();
            trace!(
                regstate = self.regstate.is_some(),
                maps = self.maps.as_ref().map_or(0, Vec::len),
                "core dump state"
            );
        }

        // 2. base address and shift
        match format.base_address() {
            Some(reported) => {
                self.base_address = reported;
                self.base_shift = address::base_shift(self.requested_base, reported);
            }
            None => {
                self.base_address = address::normalize_load_address(self.requested_base);
                self.base_shift = 0;
            }
        }
        let t = self.translation();
        debug!(
            base = format_args!("{:#x}", self.base_address),
            shift = self.base_shift,
            load = format_args!("{:#x}", self.load_address),
            "address translation"
        );

        // 3. offset and size
        if let Some(offset) = format.buffer_offset() {
            self.buffer_offset = offset;
        }
        if let Some(size) = format.declared_size() {
            self.declared_size = size;
        }

        // 4. special symbols
        for kind in SpecialSymbol::ALL {
            self.binsym[kind.index()] = format.special_symbol(kind).map(|mut addr| {
                addr.rebase(&t);
                addr
            });
        }

        // 5. entries, fields, imports, symbols
        self.entries = format.entries().map(|mut v| {
            rebase_all(&mut v, &t);
            v
        });
        self.fields = format.fields().map(|mut v| {
            rebase_all(&mut v, &t);
            v
        });
        self.imports = format.imports();
        self.symbols = format.symbols().map(|mut v| {
            rebase_all(&mut v, &t);
            let demangled = demangle::fill_demangled(&mut v);
            if config.filter {
                let renamed = filter::filter_symbols(&mut v);
                trace!(renamed, "symbol names filtered");
            }
            trace!(demangled, "symbol names demangled");
            v
        });
        debug!(
            entries = self.entries.as_ref().map_or(0, Vec::len),
            imports = self.imports.as_ref().map_or(0, Vec::len),
            symbols = self.symbols.as_ref().map_or(0, Vec::len),
            "symbols extracted"
        );

        // 6. info
        self.info = format.info();

        // 7. libraries
        self.libs = format.libraries();

        // 8. sections
        if self.sections.is_none() {
            self.sections = format.sections().map(|mut v| {
                rebase_all(&mut v, &t);
                if config.filter {
                    filter::filter_sections(&mut v);
                }
                v
            });
        }

        // 9. relocations
        if config.wants(RequestFilter::RELOCS | RequestFilter::IMPORTS) {
            if let Some(mut list) = format.relocations() {
                rebase_all(&mut list, &t);
                self.relocs = Some(RelocIndex::build(list));
            }
            trace!(
                relocs = self.relocs.as_ref().map_or(0, RelocIndex::len),
                "relocations indexed"
            );
        }

        // 10. strings
        if config.wants(RequestFilter::STRINGS) {
            let mut list = match format.strings() {
                Some(list) => list,
                None => self.scan_strings(config),
            };
            rebase_all(&mut list, &t);
            if config.debase64 {
                let changed = strings::normalize_strings(&mut list);
                trace!(changed, "base64 strings unwrapped");
            }
            debug!(strings = list.len(), "strings extracted");
            self.strings = Some(list);
        }

        // 11. classes
        let mut swift = false;
        if config.wants(RequestFilter::CLASSES) {
            let symbols = self.symbols.as_deref().unwrap_or(&[]);
            self.classes = match format.classes() {
                Some(list) => {
                    swift = lang::is_swift(
                        symbols,
                        self.imports.as_deref().unwrap_or(&[]),
                        self.libs.as_deref().unwrap_or(&[]),
                    );
                    if swift {
                        trace!("symbol-encoded classes, reconstructing from symbols");
                        classes::classes_from_symbols(symbols)
                    } else {
                        Some(list)
                    }
                }
                None => classes::classes_from_symbols(symbols),
            };
            if let Some(list) = self.classes.as_mut() {
                if config.filter {
                    filter::filter_classes(list);
                }
                if self.class_method_cache.is_none() {
                    self.class_method_cache = Some(classes::build_class_method_cache(list));
                }
            }
            debug!(
                classes = self.classes.as_ref().map_or(0, Vec::len),
                "classes extracted"
            );
        }

        // 12. lines, record set, memory regions
        self.lines = format.lines();
        if let Some(ns) = format.metadata_record_set() {
            if !ns.ptr_eq(&self.metadata) {
                trace!("plugin replaced the object namespace");
                self.metadata = ns;
            }
        }
        self.mem = format.memory_regions();

        // 13. language
        if config.wants(RequestFilter::SYMBOLS | RequestFilter::IMPORTS) {
            self.language = if swift {
                Language::Swift
            } else {
                lang::infer_language(
                    self.info.as_ref(),
                    self.symbols.as_deref().unwrap_or(&[]),
                    self.imports.as_deref().unwrap_or(&[]),
                    self.libs.as_deref().unwrap_or(&[]),
                )
            };
            debug!(language = %self.language, "language inferred");
        }
    }

    /// Generic scan over data sections, or the whole window when raw
    /// scanning is requested or the object has no sections.
    fn scan_strings(&self, config: &BinConfig) -> Vec<crate::core::StringLiteral> {
        let cfg = ScanConfig::from_bin_config(config, self.format.min_string_length());
        let data = self.buffer.as_ref();
        let data_sections: Vec<_> = self
            .sections
            .as_deref()
            .unwrap_or(&[])
            .iter()
            .filter(|s| s.is_data)
            .filter_map(|s| {
                // sections are rebased; undo the load address to index the buffer
                let start = s.paddr?.checked_sub(self.load_address)? as usize;
                Some(start..start.saturating_add(s.size as usize))
            })
            .collect();
        if config.raw_strings || data_sections.is_empty() {
            strings::scan_strings(data, &cfg)
        } else {
            strings::scan_ranges(data, data_sections, &cfg)
        }
    }
}
