//! Streaming encoders and decoders
//!
//! Each stream keeps its carried state in a small value type with pure step
//! functions: `(state, chunk) -> (state', output)`. The stream objects apply a
//! step only when it succeeds, so a fatal error leaves the pending surrogate
//! or hold buffer exactly as it was before the failing chunk.
//!
//! Chunks must be written in their original order. Concatenating the output
//! of every `write` followed by `finish` gives the same result as the one-shot
//! [`Codec::encode`] / [`Codec::decode`] on the concatenated input.

use std::borrow::Cow;

use crate::codec::Codec;
use crate::options::Options;
use crate::surrogate::BYTE_ORDER_MARK;
use crate::Result;

/// Carried state of a streaming encoder between chunks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncoderState {
    /// High surrogate that ended the previous chunk
    pub pending_high: Option<u16>,
    /// Byte order mark not yet written
    pub bom_pending: bool,
}

impl EncoderState {
    /// Fresh state for a stream of `codec` with `options`
    pub fn new(codec: Codec, options: &Options) -> Self {
        Self {
            pending_high: None,
            bom_pending: options.output_byte_order_mark && codec.bom().is_some(),
        }
    }

    /// Encode one chunk of UTF-16 units
    pub fn step(self, codec: Codec, options: &Options, chunk: &[u16]) -> Result<(Self, Vec<u8>)> {
        self.advance(codec, options, chunk, false)
    }

    /// Resolve a dangling high surrogate at end of stream
    pub fn finish(self, codec: Codec, options: &Options) -> Result<(Self, Vec<u8>)> {
        self.advance(codec, options, &[], true)
    }

    fn advance(
        self,
        codec: Codec,
        options: &Options,
        chunk: &[u16],
        at_end: bool,
    ) -> Result<(Self, Vec<u8>)> {
        let (bytes, pending_high) =
            codec.encode_units(chunk, self.pending_high, at_end, self.bom_pending, options)?;
        if let Some(high) = pending_high {
            tracing::trace!("carrying high surrogate 0x{high:04X}");
        }
        let next = Self {
            pending_high,
            bom_pending: false,
        };
        Ok((next, bytes))
    }
}

/// Carried state of a streaming decoder between chunks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecoderState {
    /// Trailing bytes of the previous chunk that did not form a whole character
    pub hold: Vec<u8>,
    /// A leading U+FEFF still needs to be dropped
    pub bom_pending: bool,
}

impl DecoderState {
    /// Fresh state for a stream of `codec` with `options`
    pub fn new(codec: Codec, options: &Options) -> Self {
        Self {
            hold: Vec::new(),
            bom_pending: options.drop_byte_order_mark && codec.bom().is_some(),
        }
    }

    /// Decode one chunk of bytes, prefixed by whatever was held back last time
    pub fn step(&self, codec: Codec, options: &Options, chunk: &[u8]) -> Result<(Self, Vec<u16>)> {
        self.advance(codec, options, chunk, false)
    }

    /// Resolve any held bytes at end of stream
    pub fn finish(&self, codec: Codec, options: &Options) -> Result<(Self, Vec<u16>)> {
        self.advance(codec, options, &[], true)
    }

    fn advance(
        &self,
        codec: Codec,
        options: &Options,
        chunk: &[u8],
        at_end: bool,
    ) -> Result<(Self, Vec<u16>)> {
        let input: Cow<'_, [u8]> = if self.hold.is_empty() {
            Cow::Borrowed(chunk)
        } else {
            let mut joined = Vec::with_capacity(self.hold.len() + chunk.len());
            joined.extend_from_slice(&self.hold);
            joined.extend_from_slice(chunk);
            Cow::Owned(joined)
        };

        let mut text = Vec::with_capacity(input.len());
        let consumed = codec.decode_bytes(&input, at_end, options, &mut text)?;
        let hold = input[consumed..].to_vec();
        debug_assert!(hold.len() < codec.max_sequence_length());
        if !hold.is_empty() {
            tracing::trace!(held = hold.len(), codec = codec.name(), "holding partial sequence");
        }

        let mut bom_pending = self.bom_pending;
        if bom_pending && !text.is_empty() {
            if text[0] == BYTE_ORDER_MARK {
                text.remove(0);
            }
            bom_pending = false;
        }

        Ok((Self { hold, bom_pending }, text))
    }
}

/// Incremental encoder from UTF-16 chunks to byte chunks
#[derive(Debug, Clone)]
pub struct StreamEncoder {
    codec: Codec,
    options: Options,
    state: EncoderState,
}

impl StreamEncoder {
    /// Create an encoder bound to `codec`
    pub fn new(codec: Codec, options: Options) -> Self {
        Self {
            codec,
            options,
            state: EncoderState::new(codec, &options),
        }
    }

    /// Codec this stream writes
    pub fn codec(&self) -> Codec {
        self.codec
    }

    /// Current carried state
    pub fn state(&self) -> &EncoderState {
        &self.state
    }

    /// Encode one chunk. The output may be empty.
    pub fn write(&mut self, chunk: &[u16]) -> Result<Vec<u8>> {
        let (next, bytes) = self.state.step(self.codec, &self.options, chunk)?;
        self.state = next;
        Ok(bytes)
    }

    /// End the stream, resolving a dangling high surrogate
    ///
    /// On success the encoder is reset and may start a new stream.
    pub fn finish(&mut self) -> Result<Vec<u8>> {
        let (_, bytes) = self.state.finish(self.codec, &self.options)?;
        self.state = EncoderState::new(self.codec, &self.options);
        Ok(bytes)
    }
}

/// Incremental decoder from byte chunks to UTF-16 chunks
#[derive(Debug, Clone)]
pub struct StreamDecoder {
    codec: Codec,
    options: Options,
    state: DecoderState,
}

impl StreamDecoder {
    /// Create a decoder bound to `codec`
    pub fn new(codec: Codec, options: Options) -> Self {
        Self {
            codec,
            options,
            state: DecoderState::new(codec, &options),
        }
    }

    /// Codec this stream reads
    pub fn codec(&self) -> Codec {
        self.codec
    }

    /// Current carried state
    pub fn state(&self) -> &DecoderState {
        &self.state
    }

    /// Decode one chunk. The output may be empty when the chunk only extends a held sequence.
    pub fn write(&mut self, chunk: &[u8]) -> Result<Vec<u16>> {
        let (next, text) = self.state.step(self.codec, &self.options, chunk)?;
        self.state = next;
        Ok(text)
    }

    /// End the stream, resolving any held bytes
    ///
    /// On success the decoder is reset and may start a new stream.
    pub fn finish(&mut self) -> Result<Vec<u16>> {
        let (_, text) = self.state.finish(self.codec, &self.options)?;
        self.state = DecoderState::new(self.codec, &self.options);
        Ok(text)
    }
}
