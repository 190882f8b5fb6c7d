//! Object construction and teardown.
//!
//! Construction is atomic: the object id is returned to the pool and the
//! fresh namespace dropped on every failure path, so a failed `create`
//! leaves no trace behind.

use bytes::Bytes;
use std::sync::Arc;

use tracing::{debug, warn};

use super::BinaryObject;
use crate::config::BinConfig;
use crate::core::address::{self, UNSPECIFIED};
use crate::core::{IdPool, Language};
use crate::error::{BinError, Result};
use crate::metadata::Namespace;
use crate::plugin::{BinPlugin, LoadContext};

/// Address-space parameters of a new object.
#[derive(Debug, Clone)]
pub struct CreateParams<'a> {
    pub file_name: &'a str,
    /// The whole file buffer
    pub buffer: &'a Bytes,
    /// Requested base address, or `UNSPECIFIED`
    pub base_address: u64,
    /// Requested load address, or `UNSPECIFIED`
    pub load_address: u64,
    /// Offset of the object inside the buffer
    pub offset: u64,
    /// Bytes covered by the object; `UNSPECIFIED` covers the rest of the buffer
    pub size: u64,
}

impl<'a> CreateParams<'a> {
    /// Whole-buffer object at the plugin's preferred addresses.
    pub fn new(file_name: &'a str, buffer: &'a Bytes) -> Self {
        Self {
            file_name,
            buffer,
            base_address: UNSPECIFIED,
            load_address: UNSPECIFIED,
            offset: 0,
            size: UNSPECIFIED,
        }
    }
}

impl BinaryObject {
    /// Load `params.buffer` through `plugin` and run the extraction pipeline.
    ///
    /// # Errors
    ///
    /// - [`BinError::IdExhaustion`] when no object id is left
    /// - [`BinError::PluginContractViolation`] when the plugin has no
    ///   `load_buffer`
    /// - [`BinError::LoadFailure`] when the plugin rejects the buffer
    pub fn create(
        plugin: Arc<dyn BinPlugin>,
        ids: &Arc<IdPool>,
        config: &BinConfig,
        params: CreateParams<'_>,
    ) -> Result<BinaryObject> {
        let span = crate::span_trace!("object_create", plugin = plugin.name(), file = params.file_name);
        let _enter = span.enter();

        let buf_len = params.buffer.len() as u64;
        let offset = params.offset.min(buf_len);
        let raw_size = params.size.min(buf_len - offset);
        let window = params
            .buffer
            .slice(offset as usize..(offset + raw_size) as usize);

        let metadata = Namespace::new("info");
        let id = ids.grab().ok_or_else(|| {
            warn!("object id pool exhausted");
            BinError::IdExhaustion
        })?;

        let load_address = address::normalize_load_address(params.load_address);
        let ctx = LoadContext {
            file_name: params.file_name,
            buffer: window.clone(),
            load_address,
            metadata: &metadata,
        };
        let format = match plugin.load_buffer(&ctx) {
            Ok(format) => format,
            Err(e) => {
                ids.release(id);
                return Err(crate::log_error!(
                    BinError::from_load(plugin.name(), e),
                    "object construction failed"
                ));
            }
        };

        let mut obj = BinaryObject {
            id,
            ids: Arc::clone(ids),
            requested_base: params.base_address,
            base_address: address::normalize_load_address(params.base_address),
            base_shift: 0,
            load_address,
            buffer_offset: params.offset,
            declared_size: raw_size,
            raw_size,
            plugin,
            format,
            buffer: window,
            entries: None,
            fields: None,
            imports: None,
            libs: None,
            sections: None,
            strings: None,
            symbols: None,
            classes: None,
            lines: None,
            relocs: None,
            relocs_patched: false,
            binsym: Default::default(),
            regstate: None,
            maps: None,
            mem: None,
            info: None,
            class_method_cache: None,
            metadata,
            language: Language::Unknown,
        };
        obj.set_items(config);
        debug!(
            id,
            base = format_args!("{:#x}", obj.effective_base_address()),
            "object created"
        );
        Ok(obj)
    }

    /// Tear the object down, releasing its id.
    pub fn destroy(self) {
        drop(self);
    }
}
