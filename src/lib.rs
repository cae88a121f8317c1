//! # CharCodec - UTF-16 Text to Byte Encodings
//!
//! Converts between in-memory UTF-16 text and byte encodings, either in one
//! shot or incrementally over chunked input.
//!
//! ## Features
//!
//! - **UTF-8, UTF-16LE/BE, US-ASCII** and single-byte code pages
//!   (ISO-8859-1, ISO-8859-15, Windows-1252)
//! - **Streaming encoders and decoders** that carry split surrogate pairs and
//!   partial multi-byte sequences across chunk boundaries
//! - **One error policy** for every path: substitute by default, or fail on
//!   the first bad sequence with `error_fatal`
//! - **Byte order marks** written and dropped on request
//!
//! ## Quick Start
//!
//! ```rust
//! use charcodec::{Codec, Options};
//!
//! let options = Options::default();
//! let bytes = Codec::windows_1252().encode_str("\u{20AC}5", &options).unwrap();
//! assert_eq!(bytes, [0x80, b'5']);
//!
//! // Feed a split emoji through a streaming decoder
//! let mut decoder = Codec::UTF8.decoder(options);
//! let mut text = decoder.write(&[0xF0, 0x9F]).unwrap();
//! text.extend(decoder.write(&[0x98, 0x80]).unwrap());
//! text.extend(decoder.finish().unwrap());
//! assert_eq!(String::from_utf16(&text).unwrap(), "\u{1F600}");
//! ```

#![deny(missing_docs)]

pub mod codepage;
mod codec;
mod multibyte;
mod options;
pub mod registry;
pub mod stream;
pub mod surrogate;

pub use codec::Codec;
pub use codepage::CodePage;
pub use options::Options;
pub use registry::Registry;
pub use stream::{DecoderState, EncoderState, StreamDecoder, StreamEncoder};

/// Result type for encoding operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during encoding operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// A surrogate that is not part of a valid high/low pair
    #[error("invalid surrogate sequence: unit 0x{unit:04X} at position {position} is not part of a surrogate pair")]
    InvalidSurrogateSequence {
        /// The offending code unit
        unit: u16,
        /// Position of the unit in the input
        position: usize,
    },
    /// A high surrogate at end of input with no low surrogate after it
    #[error("incomplete surrogate sequence: high surrogate 0x{unit:04X} at position {position} has no low surrogate")]
    IncompleteSurrogateSequence {
        /// The dangling high surrogate
        unit: u16,
        /// Position of the unit in the input
        position: usize,
    },
    /// A lead or continuation byte that breaks the encoding's grammar
    #[error("invalid byte sequence: byte 0x{byte:02X} at position {position}: {reason}")]
    InvalidByteSequence {
        /// The offending byte
        byte: u8,
        /// Position of the byte in the input
        position: usize,
        /// Which rule failed
        reason: &'static str,
    },
    /// Input ended in the middle of a multi-byte sequence
    #[error("incomplete byte sequence: sequence starting with 0x{byte:02X} at position {position} is cut short")]
    IncompleteByteSequence {
        /// First byte of the truncated sequence
        byte: u8,
        /// Position of that byte in the input
        position: usize,
    },
    /// Character cannot be encoded in the target encoding
    #[error("unmappable character: U+{codepoint:04X} at position {position} has no mapping in {encoding}")]
    UnmappableCharacter {
        /// The unmappable code point
        codepoint: u32,
        /// Position of the character in the input
        position: usize,
        /// Target encoding name
        encoding: &'static str,
    },
    /// The requested operation is not available for this encoding
    #[error("unsupported operation: {operation} is not available for {encoding}")]
    UnsupportedOperation {
        /// Encoding name
        encoding: &'static str,
        /// What was attempted
        operation: &'static str,
    },
}

fn multibyte_error(from: Codec, to: Codec, operation: &'static str) -> Error {
    let encoding = if from.is_multibyte() { from } else { to };
    Error::UnsupportedOperation {
        encoding: encoding.name(),
        operation,
    }
}

/// Pre-computed translation table for single-byte to single-byte conversion
#[derive(Debug, Clone)]
pub struct TranslationTable {
    /// Direct lookup table: source_byte -> target_byte
    table: [u8; 256],
    /// Code point of every source byte, for error reports
    sources: [u16; 256],
    /// Bitmask of unmappable bytes for fast checking
    unmappable_mask: [u64; 4], // 256 bits = 4 u64s
    /// Target encoding name
    target: &'static str,
}

impl TranslationTable {
    /// Create a new translation table between two single-byte codecs
    ///
    /// Multi-byte codecs (UTF-8, UTF-16) fail with `UnsupportedOperation`;
    /// use [`Translator`] for those.
    pub fn new(from: Codec, to: Codec) -> Result<Self> {
        if from.is_multibyte() || to.is_multibyte() {
            return Err(multibyte_error(from, to, "single-byte translation table"));
        }

        let lenient = Options::default();
        let mut table = [0u8; 256];
        let mut sources = [0u16; 256];
        let mut unmappable_mask = [0u64; 4];

        for byte in 0..=255u8 {
            let idx = usize::from(byte);
            let unit = from.decode(&[byte], &lenient)?[0];
            sources[idx] = unit;
            let mut out = [0u8; 1];
            match to.store_character(u32::from(unit), &mut out) {
                Some(_) => table[idx] = out[0],
                None => unmappable_mask[idx / 64] |= 1u64 << (idx % 64),
            }
        }

        Ok(Self {
            table,
            sources,
            unmappable_mask,
            target: to.name(),
        })
    }

    /// Check if a byte is mappable
    #[inline]
    pub fn is_mappable(&self, byte: u8) -> bool {
        let idx = usize::from(byte);
        (self.unmappable_mask[idx / 64] & (1u64 << (idx % 64))) == 0
    }

    fn failure(&self, byte: u8, position: usize) -> Error {
        Error::UnmappableCharacter {
            codepoint: u32::from(self.sources[usize::from(byte)]),
            position,
            encoding: self.target,
        }
    }

    #[inline]
    fn translate_byte(&self, byte: u8, position: usize, options: &Options) -> Result<u8> {
        if self.is_mappable(byte) {
            Ok(self.table[usize::from(byte)])
        } else {
            options.resolve(self.failure(byte, position), options.substitute_byte)
        }
    }

    /// Translate bytes, substituting or failing on unmappable ones per `options`
    pub fn translate(&self, input: &[u8], options: &Options) -> Result<Vec<u8>> {
        input
            .iter()
            .enumerate()
            .map(|(pos, &byte)| self.translate_byte(byte, pos, options))
            .collect()
    }

    /// Translate in-place, overwriting the buffer
    ///
    /// With `error_fatal` the buffer is checked first and left untouched on failure.
    pub fn translate_in_place(&self, buffer: &mut [u8], options: &Options) -> Result<()> {
        if options.error_fatal {
            if let Some(pos) = buffer.iter().position(|&byte| !self.is_mappable(byte)) {
                return Err(self.failure(buffer[pos], pos));
            }
        }
        for (pos, byte) in buffer.iter_mut().enumerate() {
            *byte = self.translate_byte(*byte, pos, options)?;
        }
        Ok(())
    }
}

/// Converts bytes in one encoding to bytes in another through UTF-16 text
#[derive(Debug, Clone)]
pub struct Translator {
    table: Option<TranslationTable>,
    from: Codec,
    to: Codec,
    options: Options,
}

impl Translator {
    /// Create a new translator between two codecs
    pub fn new(from: Codec, to: Codec, options: Options) -> Self {
        let table = TranslationTable::new(from, to).ok();
        Self {
            table,
            from,
            to,
            options,
        }
    }

    /// Get source codec
    pub fn from_codec(&self) -> Codec {
        self.from
    }

    /// Get target codec
    pub fn to_codec(&self) -> Codec {
        self.to
    }

    fn convert_with(&self, input: &[u8], options: &Options) -> Result<Vec<u8>> {
        match self.table {
            Some(ref table) => table.translate(input, options),
            None => {
                let text = self.from.decode(input, options)?;
                self.to.encode(&text, options)
            }
        }
    }

    /// Convert data from source to target encoding
    pub fn convert(&self, input: &[u8]) -> Result<Vec<u8>> {
        self.convert_with(input, &self.options)
    }

    /// Convert data in-place (destructive)
    ///
    /// Only single-byte to single-byte conversions keep their length, so
    /// anything involving UTF-8 or UTF-16 fails with `UnsupportedOperation`.
    pub fn convert_in_place(&self, buffer: &mut [u8]) -> Result<()> {
        match self.table {
            Some(ref table) => table.translate_in_place(buffer, &self.options),
            None => Err(multibyte_error(self.from, self.to, "in-place conversion")),
        }
    }

    /// Convert with substitution forced on, ignoring `error_fatal`
    pub fn convert_lossy(&self, input: &[u8]) -> Vec<u8> {
        let lossy = self.options.with_error_fatal(false);
        // Substitution never fails; only fatal options produce errors here.
        self.convert_with(input, &lossy).unwrap_or_default()
    }
}

/// Streaming converter chaining a decoder and an encoder
#[derive(Debug, Clone)]
pub struct StreamingTranslator {
    decoder: StreamDecoder,
    encoder: StreamEncoder,
}

impl StreamingTranslator {
    /// Create a streaming translator between two codecs
    pub fn new(from: Codec, to: Codec, options: Options) -> Self {
        Self {
            decoder: from.decoder(options),
            encoder: to.encoder(options),
        }
    }

    /// Process a chunk of data
    ///
    /// After an error the stream is broken and should not be written again.
    pub fn process_chunk(&mut self, input: &[u8]) -> Result<Vec<u8>> {
        let text = self.decoder.write(input)?;
        self.encoder.write(&text)
    }

    /// End the stream, flushing held bytes and any pending surrogate
    pub fn finish(&mut self) -> Result<Vec<u8>> {
        let text = self.decoder.finish()?;
        let mut output = self.encoder.write(&text)?;
        output.extend(self.encoder.finish()?);
        Ok(output)
    }
}
