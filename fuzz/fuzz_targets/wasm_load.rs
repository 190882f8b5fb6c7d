#![no_main]
use binmodel::{Bin, BinConfig, LoadOptions};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let mut bin = Bin::with_default_plugins(BinConfig::default());
    let opts = LoadOptions::default().with_plugin("wasm");
    if let Ok(id) = bin.open_buffer("<fuzz>", bytes::Bytes::copy_from_slice(data), &opts) {
        let _ = bin.rerun(id);
        assert!(bin.close_file(id));
    }
    assert_eq!(bin.object_ids().in_use(), 0);
});
