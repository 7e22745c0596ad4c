//! Chunking: split normalised text into fixed-length pieces.
//!
//! Lengths are counted in characters (`char`), so a chunk boundary never
//! lands inside a multi-byte UTF-8 sequence. Every chunk but the last holds
//! exactly `size` characters; the last holds the remaining 1..=`size`.
//! Empty text yields no chunks at all.

use crate::error::PdfTextError;

/// Borrowing iterator over the chunks of a string.
///
/// Created by [`chunks`].
#[derive(Debug, Clone)]
pub struct Chunks<'a> {
    rest: &'a str,
    size: usize,
}

impl<'a> Iterator for Chunks<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        if self.rest.is_empty() {
            return None;
        }
        // Byte offset of the first character past this chunk.
        let cut = self
            .rest
            .char_indices()
            .nth(self.size)
            .map_or(self.rest.len(), |(idx, _)| idx);
        let (head, tail) = self.rest.split_at(cut);
        self.rest = tail;
        Some(head)
    }
}

/// Iterate over `text` in chunks of `size` characters.
///
/// # Errors
/// [`PdfTextError::InvalidConfig`] if `size` is zero.
pub fn chunks(text: &str, size: usize) -> Result<Chunks<'_>, PdfTextError> {
    if size == 0 {
        return Err(PdfTextError::InvalidConfig(
            "Chunk size must be ≥ 1".into(),
        ));
    }
    Ok(Chunks { rest: text, size })
}

/// Split `text` into owned chunks of `size` characters.
pub fn chunk_text(text: &str, size: usize) -> Result<Vec<String>, PdfTextError> {
    Ok(chunks(text, size)?.map(str::to_string).collect())
}
