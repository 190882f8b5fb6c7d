//! End-to-end loading through the built-in WebAssembly plugin.

#![cfg(feature = "wasm")]

mod common;

use binmodel::core::{SymbolBinding, StringEncoding};
use binmodel::{Bin, BinConfig, BinError, CreateOptions, LoadOptions};
use common::wasm::sample_module;
use common::{create_temp_file, mock_buffer};

fn open_sample(config: BinConfig) -> Bin {
    let mut bin = Bin::with_default_plugins(config);
    bin.open_buffer("sample.wasm", sample_module().into(), &LoadOptions::default())
        .unwrap();
    bin
}

#[test]
fn test_plugin_selected_by_magic() {
    let bin = open_sample(BinConfig::default());
    let obj = bin.current_object().unwrap();
    assert_eq!(obj.plugin_name(), "wasm");
    assert_eq!(obj.effective_base_address(), 0);

    let info = obj.info().unwrap();
    assert!(info.matches("wasm", 32, "sample.wasm"));
    assert_eq!(info.os, "WebAssembly");
    assert!(!info.has_debug_info);
    assert_eq!(obj.metadata().get("wasm.functions").as_deref(), Some("2"));
}

#[test]
fn test_symbols_follow_function_index_space() {
    let bin = open_sample(BinConfig::default());
    let obj = bin.current_object().unwrap();
    let syms = obj.symbols().unwrap();
    let names: Vec<_> = syms.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["imp.env.print", "fcn.1", "main"]);
    assert!(syms[0].is_imported);
    assert_eq!(syms[0].libname.as_deref(), Some("env"));
    assert_eq!(syms[2].bind, SymbolBinding::Global);
    assert_eq!(syms[2].size, 4);

    // the start function is the entry point
    let entry = obj.entries().unwrap()[0];
    assert_eq!(entry.paddr, syms[2].paddr);
    assert_eq!(obj.libs().unwrap(), ["env".to_string()]);
    assert_eq!(obj.imports().unwrap()[0].name, "print");
}

#[test]
fn test_strings_come_from_data_section() {
    let bin = open_sample(BinConfig::default());
    let obj = bin.current_object().unwrap();
    let data = obj
        .sections()
        .unwrap()
        .iter()
        .find(|s| s.name == "data")
        .unwrap();
    assert!(data.is_data);

    let strings = obj.strings().unwrap();
    let hit = strings
        .iter()
        .find(|s| s.value == "greetings from wasm")
        .unwrap();
    assert_eq!(hit.encoding, StringEncoding::Ascii);
    assert!(data.contains_paddr(hit.paddr.unwrap()));
    // code and import names stay out of a data-section scan
    assert!(strings.iter().all(|s| s.value != "print"));
}

#[test]
fn test_open_path_maps_file() {
    let tmp = create_temp_file(&sample_module());
    let mut bin = Bin::with_default_plugins(BinConfig::default());
    let id = bin.open_path(tmp.path(), &LoadOptions::default()).unwrap();

    let file = bin.find_file_by_id(id).unwrap();
    assert_eq!(file.size(), sample_module().len());
    assert_eq!(file.current_object().unwrap().plugin_name(), "wasm");
    assert!(file.name().ends_with(&*tmp.path().file_name().unwrap().to_string_lossy()));
}

#[test]
fn test_unknown_buffer_has_no_plugin() {
    let mut bin = Bin::with_default_plugins(BinConfig::default());
    let err = bin
        .open_buffer("x.bin", mock_buffer(16), &LoadOptions::default())
        .unwrap_err();
    assert!(!matches!(err, BinError::PluginContractViolation { .. }));
    assert!(bin.files().is_empty());
}

#[test]
fn test_create_and_reopen() {
    let mut bin = Bin::with_default_plugins(BinConfig::default());
    let header = bin
        .create("wasm", &[], &[], &CreateOptions::default())
        .unwrap();
    assert_eq!(header, b"\0asm\x01\0\0\0");
    assert!(matches!(
        bin.create("nope", &[], &[], &CreateOptions::default()),
        Err(BinError::InvalidArgument(_))
    ));

    bin.open_buffer("empty.wasm", header.into(), &LoadOptions::default())
        .unwrap();
    let obj = bin.current_object().unwrap();
    assert!(obj.symbols().unwrap().is_empty());
    // no code body, so no entry list at all
    assert!(obj.entries().is_none());
}

#[test]
fn test_namespace_snapshot() {
    let bin = open_sample(BinConfig::default());
    let json = bin.root_namespace().to_json();
    let fd = &json["fd.3"];
    assert_eq!(fd["file"], "sample.wasm");
    assert_eq!(fd["info"]["wasm.sections"], "8");
}
