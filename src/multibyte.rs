//! Multi-byte encoding support for UTF-8 and UTF-16
//!
//! This module holds the byte-level primitives for encodings where one
//! character can span several bytes. The decoders take an `at_end` flag: when
//! it is false, a sequence cut short by the end of `input` is left unconsumed
//! so a stream can carry it into the next chunk. When it is true, the same
//! tail becomes a single substitution.

use crate::options::Options;
use crate::surrogate::{
    is_continuation_byte, is_high_surrogate, is_low_surrogate, is_surrogate,
    split_to_surrogate_pair, MAX_CODEPOINT, SUPPLEMENTARY_START,
};
use crate::{Error, Result};

/// Number of UTF-8 bytes needed for a code point
#[inline]
pub fn utf8_character_length(codepoint: u32) -> usize {
    match codepoint {
        0..0x80 => 1,
        0x80..0x800 => 2,
        0x800..0x10000 => 3,
        _ => 4,
    }
}

/// Write the UTF-8 form of `codepoint` at the start of `out`, returning the byte count
#[inline]
pub fn utf8_store_character(codepoint: u32, out: &mut [u8]) -> usize {
    match utf8_character_length(codepoint) {
        1 => {
            out[0] = codepoint as u8;
            1
        }
        2 => {
            out[0] = 0xC0 | (codepoint >> 6) as u8;
            out[1] = 0x80 | (codepoint & 0x3F) as u8;
            2
        }
        3 => {
            out[0] = 0xE0 | (codepoint >> 12) as u8;
            out[1] = 0x80 | ((codepoint >> 6) & 0x3F) as u8;
            out[2] = 0x80 | (codepoint & 0x3F) as u8;
            3
        }
        _ => {
            out[0] = 0xF0 | (codepoint >> 18) as u8;
            out[1] = 0x80 | ((codepoint >> 12) & 0x3F) as u8;
            out[2] = 0x80 | ((codepoint >> 6) & 0x3F) as u8;
            out[3] = 0x80 | (codepoint & 0x3F) as u8;
            4
        }
    }
}

/// Write one UTF-16 code unit in the requested byte order
#[inline]
pub fn utf16_store_unit(unit: u16, big_endian: bool, out: &mut [u8]) -> usize {
    let bytes = if big_endian {
        unit.to_be_bytes()
    } else {
        unit.to_le_bytes()
    };
    out[..2].copy_from_slice(&bytes);
    2
}

/// Append a decoded code point to `out`, splitting supplementary planes into a pair
#[inline]
fn push_codepoint(codepoint: u32, out: &mut Vec<u16>) {
    if codepoint >= SUPPLEMENTARY_START {
        let (high, low) = split_to_surrogate_pair(codepoint);
        out.push(high);
        out.push(low);
    } else {
        out.push(codepoint as u16);
    }
}

enum Sequence {
    Complete(u32),
    Truncated,
    BadContinuation { byte: u8, offset: usize },
}

/// Collect the continuation bytes following the lead byte at `pos`
fn read_sequence(input: &[u8], pos: usize, length: usize, initial: u8) -> Sequence {
    let mut codepoint = u32::from(initial);
    for offset in 1..length {
        match input.get(pos + offset) {
            None => return Sequence::Truncated,
            Some(&byte) if is_continuation_byte(byte) => {
                codepoint = (codepoint << 6) | u32::from(byte & 0x3F);
            }
            Some(&byte) => return Sequence::BadContinuation { byte, offset },
        }
    }
    Sequence::Complete(codepoint)
}

/// Decode UTF-8 bytes, returning how many bytes were consumed
///
/// A well-formed sequence that decodes to a forbidden value (overlong,
/// surrogate, beyond U+10FFFF) is replaced as a whole. A sequence broken by a
/// non-continuation byte is replaced once and scanning resumes at the byte
/// right after its lead byte.
pub fn decode_utf8(
    input: &[u8],
    at_end: bool,
    options: &Options,
    out: &mut Vec<u16>,
) -> Result<usize> {
    let replacement = options.replacement();
    let mut pos = 0;

    while pos < input.len() {
        let lead = input[pos];
        let (length, minimum, initial) = match lead {
            0x00..=0x7F => {
                out.push(u16::from(lead));
                pos += 1;
                continue;
            }
            0xC0..=0xDF => (2, 0x80, lead & 0x1F),
            0xE0..=0xEF => (3, 0x800, lead & 0x0F),
            0xF0..=0xF7 => (4, SUPPLEMENTARY_START, lead & 0x07),
            _ => {
                let reason = if is_continuation_byte(lead) {
                    "unexpected continuation byte"
                } else {
                    "invalid lead byte"
                };
                let failure = Error::InvalidByteSequence {
                    byte: lead,
                    position: pos,
                    reason,
                };
                out.push(options.resolve(failure, replacement)?);
                pos += 1;
                continue;
            }
        };

        match read_sequence(input, pos, length, initial) {
            Sequence::Complete(codepoint) => {
                let reason = if codepoint < minimum {
                    Some("overlong encoding")
                } else if codepoint > MAX_CODEPOINT {
                    Some("code point beyond U+10FFFF")
                } else if length == 3 && (0xD800..=0xDFFF).contains(&codepoint) {
                    Some("encoded surrogate")
                } else {
                    None
                };
                if let Some(reason) = reason {
                    let failure = Error::InvalidByteSequence {
                        byte: lead,
                        position: pos,
                        reason,
                    };
                    out.push(options.resolve(failure, replacement)?);
                } else {
                    push_codepoint(codepoint, out);
                }
                pos += length;
            }
            Sequence::BadContinuation { byte, offset } => {
                let failure = Error::InvalidByteSequence {
                    byte,
                    position: pos + offset,
                    reason: "expected continuation byte",
                };
                out.push(options.resolve(failure, replacement)?);
                pos += 1;
            }
            Sequence::Truncated if !at_end => return Ok(pos),
            Sequence::Truncated => {
                let failure = Error::IncompleteByteSequence {
                    byte: lead,
                    position: pos,
                };
                out.push(options.resolve(failure, replacement)?);
                pos = input.len();
            }
        }
    }

    Ok(pos)
}

/// Decode UTF-16 bytes in the given byte order, returning how many bytes were consumed
pub fn decode_utf16(
    input: &[u8],
    big_endian: bool,
    at_end: bool,
    options: &Options,
    out: &mut Vec<u16>,
) -> Result<usize> {
    let read = |i: usize| {
        let bytes = [input[i], input[i + 1]];
        if big_endian {
            u16::from_be_bytes(bytes)
        } else {
            u16::from_le_bytes(bytes)
        }
    };
    let replacement = options.replacement();
    let mut pos = 0;

    while pos < input.len() {
        let remaining = input.len() - pos;
        if remaining < 2 {
            if !at_end {
                return Ok(pos);
            }
            let failure = Error::IncompleteByteSequence {
                byte: input[pos],
                position: pos,
            };
            out.push(options.resolve(failure, replacement)?);
            return Ok(input.len());
        }

        let unit = read(pos);
        if !is_surrogate(unit) {
            out.push(unit);
            pos += 2;
        } else if is_low_surrogate(unit) {
            let failure = Error::InvalidSurrogateSequence {
                unit,
                position: pos,
            };
            out.push(options.resolve(failure, replacement)?);
            pos += 2;
        } else if remaining < 4 {
            if !at_end {
                return Ok(pos);
            }
            let failure = Error::IncompleteSurrogateSequence {
                unit,
                position: pos,
            };
            out.push(options.resolve(failure, replacement)?);
            return Ok(input.len());
        } else {
            let next = read(pos + 2);
            if is_low_surrogate(next) {
                debug_assert!(is_high_surrogate(unit));
                out.push(unit);
                out.push(next);
                pos += 4;
            } else {
                let failure = Error::InvalidSurrogateSequence {
                    unit,
                    position: pos,
                };
                out.push(options.resolve(failure, replacement)?);
                pos += 2;
            }
        }
    }

    Ok(pos)
}
