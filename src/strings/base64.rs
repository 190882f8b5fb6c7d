//! Strict base64 codec for string normalisation.
//!
//! Decoding is deliberately unforgiving: whitespace, misplaced padding and
//! lengths that are not a multiple of four all reject the input, so ordinary
//! identifiers are not mistaken for encoded payloads.

const ALPHABET: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

const fn build_decode_table() -> [u8; 256] {
    let mut table = [0xffu8; 256];
    let mut i = 0;
    while i < 64 {
        table[ALPHABET[i] as usize] = i as u8;
        i += 1;
    }
    table
}

static DECODE: [u8; 256] = build_decode_table();

/// Encode bytes as padded base64.
pub fn encode(data: &[u8]) -> String {
    let mut out = String::with_capacity(data.len().div_ceil(3) * 4);
    for chunk in data.chunks(3) {
        let b1 = chunk.get(1).copied().unwrap_or(0);
        let b2 = chunk.get(2).copied().unwrap_or(0);
        let n = (u32::from(chunk[0]) << 16) | (u32::from(b1) << 8) | u32::from(b2);
        out.push(char::from(ALPHABET[(n >> 18 & 0x3f) as usize]));
        out.push(char::from(ALPHABET[(n >> 12 & 0x3f) as usize]));
        out.push(if chunk.len() > 1 {
            char::from(ALPHABET[(n >> 6 & 0x3f) as usize])
        } else {
            '='
        });
        out.push(if chunk.len() > 2 {
            char::from(ALPHABET[(n & 0x3f) as usize])
        } else {
            '='
        });
    }
    out
}

/// Decode padded base64.
///
/// Returns `None` for empty input or anything that is not canonical base64.
/// A successful decode is always shorter than its input.
pub fn decode(s: &str) -> Option<Vec<u8>> {
    let bytes = s.as_bytes();
    if bytes.is_empty() || bytes.len() % 4 != 0 {
        return None;
    }

    let quads = bytes.len() / 4;
    let mut out = Vec::with_capacity(quads * 3);
    for (qi, quad) in bytes.chunks_exact(4).enumerate() {
        let last = qi + 1 == quads;
        let pad = quad.iter().rev().take_while(|&&b| b == b'=').count();
        if pad > 2 || (pad > 0 && !last) {
            return None;
        }

        let mut n: u32 = 0;
        for (j, &b) in quad[..4 - pad].iter().enumerate() {
            let v = DECODE[usize::from(b)];
            if v == 0xff {
                return None;
            }
            n |= u32::from(v) << (18 - j * 6);
        }

        out.push((n >> 16) as u8);
        if pad < 2 {
            out.push((n >> 8) as u8);
        }
        if pad < 1 {
            out.push(n as u8);
        }
    }
    Some(out)
}
