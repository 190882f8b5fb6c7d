#![no_main]
use binmodel::core::{StringEncoding, StringLiteral};
use binmodel::strings::{normalize_strings, scan_strings, ScanConfig};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let mut found = scan_strings(data, &ScanConfig::default());
    let text = String::from_utf8_lossy(data);
    found.push(StringLiteral::new(text, 0, data.len() as u32, StringEncoding::Utf8));
    normalize_strings(&mut found);
});
