//! The codec family and its one-shot encode/decode paths
//!
//! Every variant exposes the same four primitives: `character_length`,
//! `surrogate_length`, `store_character` and `store_surrogate`. The shared
//! encoder runs a sizing pass over the input with those primitives, allocates
//! the output once, then runs an identical fill pass. Streams reuse the same
//! passes with carried state (see [`crate::stream`]).

use crate::codepage::{self, CodePage};
use crate::multibyte::{
    decode_utf16, decode_utf8, utf16_store_unit, utf8_character_length, utf8_store_character,
};
use crate::options::Options;
use crate::stream::{StreamDecoder, StreamEncoder};
use crate::surrogate::{
    combine, is_high_surrogate, is_low_surrogate, split_to_surrogate_pair, BYTE_ORDER_MARK,
};
use crate::{Error, Result};

/// A character encoding between UTF-16 text and bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Codec {
    /// UTF-8 (1-4 bytes per character)
    UTF8,
    /// UTF-16 little endian
    UTF16LE,
    /// UTF-16 big endian
    UTF16BE,
    /// US-ASCII (7-bit)
    ASCII,
    /// Single-byte code page
    CodePage(&'static CodePage),
}

/// One character as seen by the encoder after surrogate validation
#[derive(Debug, Clone, Copy)]
pub(crate) enum Piece {
    /// A non-surrogate BMP code unit
    Unit(u16),
    /// A valid high/low surrogate pair
    Pair(u16, u16),
    /// An invalid or incomplete surrogate already resolved by the options
    Substitute,
}

/// Walk UTF-16 units, pairing surrogates and resolving invalid ones
///
/// `carried_high` is a high surrogate left over from a previous chunk. When
/// `at_end` is false, a trailing high surrogate is returned instead of being
/// treated as incomplete. Positions are unit offsets into `units`; a carried
/// surrogate reports position 0.
pub(crate) fn walk_units(
    units: &[u16],
    carried_high: Option<u16>,
    at_end: bool,
    options: &Options,
    mut emit: impl FnMut(Piece, usize) -> Result<()>,
) -> Result<Option<u16>> {
    let mut pending: Option<(u16, usize)> = carried_high.map(|high| (high, 0));

    for (position, &unit) in units.iter().enumerate() {
        if let Some((high, high_position)) = pending.take() {
            if is_low_surrogate(unit) {
                emit(Piece::Pair(high, unit), high_position)?;
                continue;
            }
            let failure = Error::InvalidSurrogateSequence {
                unit: high,
                position: high_position,
            };
            options.resolve(failure, ())?;
            emit(Piece::Substitute, high_position)?;
        }

        if is_high_surrogate(unit) {
            pending = Some((unit, position));
        } else if is_low_surrogate(unit) {
            let failure = Error::InvalidSurrogateSequence { unit, position };
            options.resolve(failure, ())?;
            emit(Piece::Substitute, position)?;
        } else {
            emit(Piece::Unit(unit), position)?;
        }
    }

    match pending {
        Some((high, position)) if at_end => {
            let failure = Error::IncompleteSurrogateSequence {
                unit: high,
                position,
            };
            options.resolve(failure, ())?;
            emit(Piece::Substitute, position)?;
            Ok(None)
        }
        pending => Ok(pending.map(|(high, _)| high)),
    }
}

/// Write a BMP code point as one unit, or a supplementary one as a pair
fn utf16_store_codepoint(codepoint: u32, big_endian: bool, out: &mut [u8]) -> usize {
    match u16::try_from(codepoint) {
        Ok(unit) => utf16_store_unit(unit, big_endian, out),
        Err(_) => {
            let (high, low) = split_to_surrogate_pair(codepoint);
            utf16_store_unit(high, big_endian, out);
            utf16_store_unit(low, big_endian, &mut out[2..]) + 2
        }
    }
}

impl Codec {
    /// ISO-8859-1 (Latin-1)
    pub fn iso_8859_1() -> Self {
        Codec::CodePage(&codepage::ISO_8859_1)
    }

    /// ISO-8859-15 (Latin-9)
    pub fn iso_8859_15() -> Self {
        Codec::CodePage(&codepage::ISO_8859_15)
    }

    /// Windows-1252
    pub fn windows_1252() -> Self {
        Codec::CodePage(&codepage::WINDOWS_1252)
    }

    /// Every well-known codec, in preference order
    pub fn all() -> [Codec; 7] {
        [
            Codec::UTF8,
            Codec::UTF16LE,
            Codec::UTF16BE,
            Codec::ASCII,
            Codec::iso_8859_1(),
            Codec::iso_8859_15(),
            Codec::windows_1252(),
        ]
    }

    /// Get the canonical name of this codec
    pub fn name(self) -> &'static str {
        match self {
            Codec::UTF8 => "UTF-8",
            Codec::UTF16LE => "UTF-16LE",
            Codec::UTF16BE => "UTF-16BE",
            Codec::ASCII => "US-ASCII",
            Codec::CodePage(page) => page.name(),
        }
    }

    /// Check if this codec is ASCII-compatible (bytes 0-127 mean the same as in ASCII)
    pub fn is_ascii_compatible(self) -> bool {
        !matches!(self, Codec::UTF16LE | Codec::UTF16BE)
    }

    /// Check if this codec uses more than one byte for some characters
    pub fn is_multibyte(self) -> bool {
        matches!(self, Codec::UTF8 | Codec::UTF16LE | Codec::UTF16BE)
    }

    /// Longest byte sequence a single character can take
    pub fn max_sequence_length(self) -> usize {
        if self.is_multibyte() { 4 } else { 1 }
    }

    /// Get the byte order mark for this codec if it has one
    pub fn bom(self) -> Option<&'static [u8]> {
        match self {
            Codec::UTF8 => Some(&[0xEF, 0xBB, 0xBF]),
            Codec::UTF16LE => Some(&[0xFF, 0xFE]),
            Codec::UTF16BE => Some(&[0xFE, 0xFF]),
            _ => None,
        }
    }

    /// Bytes needed for a BMP code unit or code point, `None` if it has no mapping
    pub fn character_length(self, codepoint: u32) -> Option<usize> {
        match self {
            Codec::UTF8 => Some(utf8_character_length(codepoint)),
            Codec::UTF16LE | Codec::UTF16BE => Some(if codepoint > 0xFFFF { 4 } else { 2 }),
            Codec::ASCII => (codepoint < 0x80).then_some(1),
            Codec::CodePage(page) => page.encode_codepoint(codepoint).map(|_| 1),
        }
    }

    /// Bytes needed for a valid surrogate pair, `None` if it has no mapping
    pub fn surrogate_length(self, high: u16, low: u16) -> Option<usize> {
        match self {
            Codec::UTF8 | Codec::UTF16LE | Codec::UTF16BE => Some(4),
            Codec::ASCII => None,
            Codec::CodePage(page) => page.encode_codepoint(combine(high, low)).map(|_| 1),
        }
    }

    /// Write a code point at the start of `out`, returning the byte count
    ///
    /// Returns `None` and writes nothing when the codec has no mapping for it.
    pub fn store_character(self, codepoint: u32, out: &mut [u8]) -> Option<usize> {
        match self {
            Codec::UTF8 => Some(utf8_store_character(codepoint, out)),
            Codec::UTF16LE | Codec::UTF16BE => {
                Some(utf16_store_codepoint(codepoint, self == Codec::UTF16BE, out))
            }
            Codec::ASCII => (codepoint < 0x80).then(|| {
                out[0] = codepoint as u8;
                1
            }),
            Codec::CodePage(page) => page.encode_codepoint(codepoint).map(|byte| {
                out[0] = byte;
                1
            }),
        }
    }

    /// Write a valid surrogate pair at the start of `out`, returning the byte count
    ///
    /// Returns `None` and writes nothing when the codec has no mapping for it.
    pub fn store_surrogate(self, high: u16, low: u16, out: &mut [u8]) -> Option<usize> {
        match self {
            Codec::UTF16LE | Codec::UTF16BE => {
                let big_endian = self == Codec::UTF16BE;
                utf16_store_unit(high, big_endian, out);
                Some(utf16_store_unit(low, big_endian, &mut out[2..]) + 2)
            }
            _ => self.store_character(combine(high, low), out),
        }
    }

    fn substitute_length(self, options: &Options) -> usize {
        let replacement = u32::from(options.replacement());
        match self {
            Codec::UTF8 => utf8_character_length(replacement),
            Codec::UTF16LE | Codec::UTF16BE => 2,
            Codec::ASCII | Codec::CodePage(_) => 1,
        }
    }

    fn store_substitute(self, options: &Options, out: &mut [u8]) -> usize {
        let replacement = u32::from(options.replacement());
        match self {
            Codec::UTF8 => utf8_store_character(replacement, out),
            Codec::UTF16LE | Codec::UTF16BE => {
                utf16_store_codepoint(replacement, self == Codec::UTF16BE, out)
            }
            Codec::ASCII | Codec::CodePage(_) => {
                out[0] = options.substitute_byte;
                1
            }
        }
    }

    fn unmappable(self, codepoint: u32, position: usize) -> Error {
        Error::UnmappableCharacter {
            codepoint,
            position,
            encoding: self.name(),
        }
    }

    fn piece_length(self, piece: Piece, position: usize, options: &Options) -> Result<usize> {
        let mapped = match piece {
            Piece::Unit(unit) => self
                .character_length(u32::from(unit))
                .ok_or_else(|| self.unmappable(u32::from(unit), position)),
            Piece::Pair(high, low) => self
                .surrogate_length(high, low)
                .ok_or_else(|| self.unmappable(combine(high, low), position)),
            Piece::Substitute => Ok(self.substitute_length(options)),
        };
        match mapped {
            Ok(length) => Ok(length),
            Err(failure) => options.resolve(failure, self.substitute_length(options)),
        }
    }

    fn store_piece(self, piece: Piece, options: &Options, out: &mut [u8]) -> usize {
        let stored = match piece {
            Piece::Unit(unit) => self.store_character(u32::from(unit), out),
            Piece::Pair(high, low) => self.store_surrogate(high, low, out),
            Piece::Substitute => None,
        };
        stored.unwrap_or_else(|| self.store_substitute(options, out))
    }

    /// Shared two-pass encoder for one-shot calls and stream chunks
    ///
    /// Returns the bytes and the high surrogate left pending at the end of
    /// `units` (always `None` when `at_end` is set). Fails before allocating
    /// when a fatal failure is found in the sizing pass.
    pub(crate) fn encode_units(
        self,
        units: &[u16],
        carried_high: Option<u16>,
        at_end: bool,
        with_bom: bool,
        options: &Options,
    ) -> Result<(Vec<u8>, Option<u16>)> {
        let bom = u32::from(BYTE_ORDER_MARK);
        let with_bom = with_bom && self.bom().is_some();

        let mut size = if with_bom {
            self.character_length(bom).unwrap_or(0)
        } else {
            0
        };
        let pending = walk_units(units, carried_high, at_end, options, |piece, position| {
            size += self.piece_length(piece, position, options)?;
            Ok(())
        })?;

        let mut bytes = vec![0u8; size];
        let mut offset = 0;
        if with_bom {
            offset += self.store_character(bom, &mut bytes).unwrap_or(0);
        }
        walk_units(units, carried_high, at_end, options, |piece, _| {
            offset += self.store_piece(piece, options, &mut bytes[offset..]);
            Ok(())
        })?;
        debug_assert_eq!(offset, size);

        Ok((bytes, pending))
    }

    /// Decode as much of `input` as possible into `out`, returning the bytes consumed
    ///
    /// With `at_end` unset, a trailing incomplete sequence is left unconsumed.
    pub(crate) fn decode_bytes(
        self,
        input: &[u8],
        at_end: bool,
        options: &Options,
        out: &mut Vec<u16>,
    ) -> Result<usize> {
        match self {
            Codec::UTF8 => decode_utf8(input, at_end, options, out),
            Codec::UTF16LE => decode_utf16(input, false, at_end, options, out),
            Codec::UTF16BE => decode_utf16(input, true, at_end, options, out),
            Codec::ASCII => {
                out.extend(input.iter().map(|&byte| u16::from(byte & 0x7F)));
                Ok(input.len())
            }
            Codec::CodePage(page) => {
                out.extend(input.iter().map(|&byte| page.decode_byte(byte)));
                Ok(input.len())
            }
        }
    }

    /// Encode UTF-16 text into bytes
    pub fn encode(self, text: &[u16], options: &Options) -> Result<Vec<u8>> {
        let (bytes, _) =
            self.encode_units(text, None, true, options.output_byte_order_mark, options)?;
        Ok(bytes)
    }

    /// Encode a Rust string
    pub fn encode_str(self, text: &str, options: &Options) -> Result<Vec<u8>> {
        let units: Vec<u16> = text.encode_utf16().collect();
        self.encode(&units, options)
    }

    /// Decode bytes into UTF-16 text
    pub fn decode(self, bytes: &[u8], options: &Options) -> Result<Vec<u16>> {
        let mut text = Vec::with_capacity(bytes.len());
        self.decode_bytes(bytes, true, options, &mut text)?;
        if options.drop_byte_order_mark
            && self.bom().is_some()
            && text.first() == Some(&BYTE_ORDER_MARK)
        {
            text.remove(0);
        }
        Ok(text)
    }

    /// Decode bytes into a Rust string
    pub fn decode_to_string(self, bytes: &[u8], options: &Options) -> Result<String> {
        let text = self.decode(bytes, options)?;
        Ok(String::from_utf16_lossy(&text))
    }

    /// Open a streaming encoder bound to this codec
    pub fn encoder(self, options: Options) -> StreamEncoder {
        StreamEncoder::new(self, options)
    }

    /// Open a streaming decoder bound to this codec
    pub fn decoder(self, options: Options) -> StreamDecoder {
        StreamDecoder::new(self, options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use quickcheck::QuickCheck;
    use rstest::rstest;

    fn units(text: &str) -> Vec<u16> {
        text.encode_utf16().collect()
    }

    #[test]
    fn test_codec_properties() {
        assert_eq!(Codec::UTF8.name(), "UTF-8");
        assert_eq!(Codec::windows_1252().name(), "Windows-1252");
        assert!(Codec::UTF8.is_ascii_compatible());
        assert!(!Codec::UTF16BE.is_ascii_compatible());
        assert!(Codec::UTF16LE.is_multibyte());
        assert!(!Codec::iso_8859_15().is_multibyte());
        assert_eq!(Codec::UTF8.bom(), Some([0xEF, 0xBB, 0xBF].as_slice()));
        assert_eq!(Codec::windows_1252().bom(), None);
        assert_eq!(Codec::windows_1252(), Codec::windows_1252());
        assert_ne!(Codec::iso_8859_1(), Codec::iso_8859_15());
    }

    #[rstest]
    #[case(Codec::UTF8, "A\u{E9}\u{20AC}\u{1F600}", &[0x41, 0xC3, 0xA9, 0xE2, 0x82, 0xAC, 0xF0, 0x9F, 0x98, 0x80])]
    #[case(Codec::UTF16LE, "A\u{1F600}", &[0x41, 0x00, 0x3D, 0xD8, 0x00, 0xDE])]
    #[case(Codec::UTF16BE, "A\u{1F600}", &[0x00, 0x41, 0xD8, 0x3D, 0xDE, 0x00])]
    #[case(Codec::ASCII, "Hi!", b"Hi!")]
    #[case(Codec::iso_8859_1(), "caf\u{E9}", &[0x63, 0x61, 0x66, 0xE9])]
    #[case(Codec::iso_8859_15(), "\u{20AC}", &[0xA4])]
    #[case(Codec::windows_1252(), "\u{20AC}\u{2122}", &[0x80, 0x99])]
    fn test_encode_and_decode(#[case] codec: Codec, #[case] text: &str, #[case] bytes: &[u8]) {
        let options = Options::default();
        assert_eq!(codec.encode_str(text, &options).unwrap(), bytes);
        assert_eq!(codec.decode(bytes, &options).unwrap(), units(text));
    }

    #[test]
    fn test_windows_1252_euro() {
        let codec = Codec::windows_1252();
        let options = Options::default();
        assert_eq!(codec.decode(&[0x80], &options).unwrap(), vec![0x20AC]);
        assert_eq!(codec.encode(&[0x20AC], &options).unwrap(), vec![0x80]);
    }

    #[test]
    fn test_lone_high_surrogate_substitution() {
        let encoded = Codec::UTF8.encode(&[0xD800], &Options::default()).unwrap();
        assert_eq!(encoded, vec![0xEF, 0xBF, 0xBD]);

        let err = Codec::UTF8.encode(&[0xD800], &Options::strict()).unwrap_err();
        assert_eq!(
            err,
            Error::IncompleteSurrogateSequence {
                unit: 0xD800,
                position: 0
            }
        );
    }

    #[test]
    fn test_invalid_surrogates_mid_text() {
        let options = Options::default();
        // High followed by a plain unit, then a lone low.
        let encoded = Codec::UTF16LE
            .encode(&[0xD800, 0x41, 0xDC00], &options)
            .unwrap();
        assert_eq!(encoded, vec![0xFD, 0xFF, 0x41, 0x00, 0xFD, 0xFF]);

        let err = Codec::UTF16LE
            .encode(&[0x41, 0xDC00], &Options::strict())
            .unwrap_err();
        assert_eq!(
            err,
            Error::InvalidSurrogateSequence {
                unit: 0xDC00,
                position: 1
            }
        );
    }

    #[test]
    fn test_unmappable_uses_substitute_byte() {
        let options = Options::default();
        assert_eq!(
            Codec::ASCII.encode_str("caf\u{E9}", &options).unwrap(),
            b"caf?"
        );
        assert_eq!(
            Codec::iso_8859_1()
                .encode_str("\u{1F600}x", &options.with_substitute_byte(b'*'))
                .unwrap(),
            b"*x"
        );
        // Invalid surrogates in single-byte targets also get the substitute byte.
        assert_eq!(
            Codec::windows_1252().encode(&[0xDC00], &options).unwrap(),
            b"?"
        );
    }

    #[test]
    fn test_unmappable_fatal() {
        let err = Codec::windows_1252()
            .encode_str("ab\u{0100}", &Options::strict())
            .unwrap_err();
        assert_eq!(
            err,
            Error::UnmappableCharacter {
                codepoint: 0x100,
                position: 2,
                encoding: "Windows-1252"
            }
        );
        assert!(err.to_string().contains("U+0100"));
    }

    #[test]
    fn test_ascii_decode_masks_high_bit() {
        let text = Codec::ASCII
            .decode(&[0x41, 0xC1, 0xFF], &Options::strict())
            .unwrap();
        assert_eq!(text, vec![0x41, 0x41, 0x7F]);
    }

    #[test]
    fn test_byte_order_mark() {
        let options = Options::default()
            .with_output_byte_order_mark(true)
            .with_drop_byte_order_mark(true);
        let bytes = Codec::UTF8.encode_str("A", &options).unwrap();
        assert_eq!(bytes, vec![0xEF, 0xBB, 0xBF, 0x41]);
        assert_eq!(Codec::UTF8.decode_to_string(&bytes, &options).unwrap(), "A");

        let kept = Codec::UTF8.decode(&bytes, &Options::default()).unwrap();
        assert_eq!(kept, vec![0xFEFF, 0x41]);

        assert_eq!(
            Codec::UTF16BE.encode_str("", &options).unwrap(),
            vec![0xFE, 0xFF]
        );
        // Code pages never write a byte order mark.
        assert_eq!(Codec::windows_1252().encode_str("A", &options).unwrap(), b"A");
    }

    #[test]
    fn test_custom_replacement_char() {
        let options = Options::default().with_replacement_char(u16::from(b'?'));
        assert_eq!(Codec::UTF8.decode_to_string(&[0x41, 0xFF], &options).unwrap(), "A?");
        assert_eq!(Codec::UTF8.encode(&[0xDFFF], &options).unwrap(), b"?");
    }

    #[test]
    fn test_surrogate_replacement_char_is_never_written() {
        let options = Options::default().with_replacement_char(0xD800);
        let bytes = Codec::UTF8.encode(&[0x41, 0xDC00], &options).unwrap();
        assert_eq!(bytes, vec![0x41, 0xEF, 0xBF, 0xBD]);
        assert!(std::str::from_utf8(&bytes).is_ok());
        assert_eq!(
            Codec::UTF16BE.encode(&[0xDC00], &options).unwrap(),
            vec![0xFF, 0xFD]
        );
        assert_eq!(Codec::UTF8.decode(&[0xFF], &options).unwrap(), vec![0xFFFD]);
    }

    #[test]
    fn test_store_primitives_report_unmappable() {
        let mut out = [0u8; 4];
        assert_eq!(Codec::windows_1252().store_character(0x20AC, &mut out), Some(1));
        assert_eq!(out[0], 0x80);

        let mut out = [0u8; 4];
        assert_eq!(Codec::windows_1252().store_character(0x0100, &mut out), None);
        assert_eq!(Codec::ASCII.store_character(0xE9, &mut out), None);
        assert_eq!(Codec::ASCII.store_surrogate(0xD83D, 0xDE00, &mut out), None);
        assert_eq!(out, [0u8; 4]);

        assert_eq!(Codec::UTF16BE.store_surrogate(0xD83D, 0xDE00, &mut out), Some(4));
        assert_eq!(out, [0xD8, 0x3D, 0xDE, 0x00]);
    }

    #[test]
    fn test_code_page_fill_uses_substitute_byte() {
        let options = Options::default().with_substitute_byte(b'#');
        let text = units("a\u{20AC}\u{0100}\u{1F600}b");
        assert_eq!(
            Codec::windows_1252().encode(&text, &options).unwrap(),
            vec![b'a', 0x80, b'#', b'#', b'b']
        );
    }

    #[test]
    fn test_round_trip_quickcheck() {
        fn prop(text: String) -> bool {
            let options = Options::strict();
            let expected = units(&text);
            [Codec::UTF8, Codec::UTF16LE, Codec::UTF16BE]
                .into_iter()
                .all(|codec| {
                    let bytes = codec.encode(&expected, &options).unwrap();
                    codec.decode(&bytes, &options).unwrap() == expected
                })
        }

        QuickCheck::new()
            .tests(500)
            .quickcheck(prop as fn(String) -> bool);
    }

    #[test]
    fn test_single_byte_round_trip_quickcheck() {
        fn prop(bytes: Vec<u8>) -> bool {
            let options = Options::strict();
            [Codec::iso_8859_1(), Codec::iso_8859_15(), Codec::windows_1252()]
                .into_iter()
                .all(|codec| {
                    let text = codec.decode(&bytes, &options).unwrap();
                    codec.encode(&text, &options).unwrap() == bytes
                })
        }

        QuickCheck::new()
            .tests(500)
            .quickcheck(prop as fn(Vec<u8>) -> bool);
    }
}
