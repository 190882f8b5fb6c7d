//! Bounded string scanners for ASCII and UTF-16 encodings.
//!
//! Used when a plugin has no string extractor of its own. Offsets in the
//! returned records are physical addresses relative to the scanned buffer.

use std::ops::Range;

use super::ScanConfig;
use crate::core::{StringEncoding, StringLiteral};

fn is_text_byte(b: u8) -> bool {
    (b.is_ascii_graphic() || b == b' ' || b == b'\t') && b != 0x7f
}

fn is_text_unit(ch: u16) -> bool {
    ch < 128 && is_text_byte(ch as u8)
}

struct Collector<'a> {
    cfg: &'a ScanConfig,
    out: Vec<StringLiteral>,
}

impl Collector<'_> {
    fn accept(&self, chars: usize) -> bool {
        chars >= self.cfg.min_length && (self.cfg.max_length == 0 || chars <= self.cfg.max_length)
    }

    fn push(&mut self, text: String, offset: usize, size: usize, encoding: StringEncoding) {
        self.out
            .push(StringLiteral::new(text, offset as u64, size as u32, encoding));
    }
}

fn scan_ascii(scan: &[u8], base: usize, c: &mut Collector<'_>) {
    let mut run_start: Option<usize> = None;
    // sentinel position closes a trailing run
    for i in 0..=scan.len() {
        let text = scan.get(i).map(|&b| is_text_byte(b)).unwrap_or(false);
        match (text, run_start) {
            (true, None) => run_start = Some(i),
            (false, Some(start)) => {
                run_start = None;
                let run = &scan[start..i];
                if c.accept(run.len()) {
                    // is_text_byte admits ASCII only
                    let text = String::from_utf8_lossy(run).into_owned();
                    c.push(text, base + start, run.len(), StringEncoding::Ascii);
                }
            }
            _ => {}
        }
    }
}

fn scan_utf16(scan: &[u8], base: usize, big_endian: bool, c: &mut Collector<'_>) {
    let encoding = if big_endian {
        StringEncoding::Utf16Be
    } else {
        StringEncoding::Utf16Le
    };
    let mut run: Vec<u16> = Vec::new();
    let mut run_offset = 0usize;
    let flush = |run: &mut Vec<u16>, run_offset: usize, c: &mut Collector<'_>| {
        // a single-byte-per-char run is already reported by the ASCII pass
        if run.len() >= 2 && c.accept(run.len()) {
            if let Ok(text) = String::from_utf16(run) {
                c.push(text, base + run_offset, run.len() * 2, encoding);
            }
        }
        run.clear();
    };
    for (i, chunk) in scan.chunks_exact(2).enumerate() {
        let ch = if big_endian {
            u16::from_be_bytes([chunk[0], chunk[1]])
        } else {
            u16::from_le_bytes([chunk[0], chunk[1]])
        };
        if is_text_unit(ch) {
            if run.is_empty() {
                run_offset = i * 2;
            }
            run.push(ch);
        } else {
            flush(&mut run, run_offset, c);
        }
    }
    flush(&mut run, run_offset, c);
}

/// Scan `data` for strings within the configured byte budget.
pub fn scan_strings(data: &[u8], cfg: &ScanConfig) -> Vec<StringLiteral> {
    scan_ranges(data, std::iter::once(0..data.len()), cfg)
}

/// Scan selected physical ranges of `data` (e.g. data sections).
///
/// Ranges are clamped to the buffer and the total byte budget. Results are
/// ordered by offset and numbered in that order.
pub fn scan_ranges<I>(data: &[u8], ranges: I, cfg: &ScanConfig) -> Vec<StringLiteral>
where
    I: IntoIterator<Item = Range<usize>>,
{
    let mut c = Collector {
        cfg,
        out: Vec::new(),
    };
    let mut budget = cfg.max_scan_bytes;
    for range in ranges {
        if budget == 0 {
            tracing::debug!("strings scan budget exhausted");
            break;
        }
        let start = range.start.min(data.len());
        let end = range.end.min(data.len()).min(start.saturating_add(budget));
        if start >= end {
            continue;
        }
        budget -= end - start;
        let scan = &data[start..end];
        scan_ascii(scan, start, &mut c);
        scan_utf16(scan, start, false, &mut c);
        scan_utf16(scan, start, true, &mut c);
    }
    let mut out = c.out;
    out.sort_by_key(|s| s.paddr);
    for (i, s) in out.iter_mut().enumerate() {
        s.ordinal = i as u32;
    }
    out
}
