//! Text normalisation: ordered blocks → one encoding-safe string.
//!
//! Each block contributes its trimmed text followed by a single `\n`. The
//! accumulated string is then restricted to the repertoire of the target
//! encoding: characters the encoder reports as unmappable are dropped, never
//! replaced or escaped. This step cannot fail.
//!
//! The result stays a Rust `String`; only its character set is narrowed.
//! For the default UTF-8 target (and the UTF-16 family, whose output
//! encoding is UTF-8) every `char` is representable and the text passes
//! through unchanged.

use crate::model::{NormalizedText, TextBlock};
use encoding_rs::{EncoderResult, Encoding};
use tracing::debug;

/// Joins blocks and filters them to a target encoding.
#[derive(Debug, Clone, Copy)]
pub struct Normalizer {
    encoding: &'static Encoding,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(encoding_rs::UTF_8)
    }
}

impl Normalizer {
    pub fn new(encoding: &'static Encoding) -> Self {
        Self { encoding }
    }

    /// Concatenate `blocks` in the order given.
    ///
    /// Callers pass pages in page order, each already sorted by
    /// [`crate::pipeline::order::order_blocks`].
    pub fn normalize<'a, I>(&self, blocks: I) -> NormalizedText
    where
        I: IntoIterator<Item = &'a TextBlock>,
    {
        let mut joined = String::new();
        for block in blocks {
            let content = block.text.trim();
            if content.is_empty() {
                continue;
            }
            joined.push_str(content);
            joined.push('\n');
        }

        let (text, dropped_chars) = self.retain_representable(joined);
        if dropped_chars > 0 {
            debug!(
                "Dropped {} characters not representable in {}",
                dropped_chars,
                self.encoding.name()
            );
        }
        NormalizedText {
            text,
            dropped_chars,
        }
    }

    fn retain_representable(&self, text: String) -> (String, usize) {
        if self.encoding.output_encoding() == encoding_rs::UTF_8 {
            return (text, 0);
        }

        let mut encoder = self.encoding.new_encoder();
        let mut out = String::with_capacity(text.len());
        let mut dropped = 0;
        let mut utf8 = [0u8; 4];
        // Wide enough for one character plus an ISO-2022-JP escape sequence.
        let mut scratch = [0u8; 16];

        for ch in text.chars() {
            let (result, _read, _written) = encoder.encode_from_utf8_without_replacement(
                ch.encode_utf8(&mut utf8),
                &mut scratch,
                false,
            );
            match result {
                EncoderResult::Unmappable(_) => dropped += 1,
                EncoderResult::InputEmpty | EncoderResult::OutputFull => out.push(ch),
            }
        }
        (out, dropped)
    }
}
