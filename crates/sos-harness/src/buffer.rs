//! Accumulated text buffer.
//!
//! A [`TextAccumulator`] lives for exactly one wait. It decodes output chunks
//! as UTF-8 in arrival order. A multibyte character split across two chunks
//! is held back until its remaining bytes arrive; bytes that can never form
//! valid UTF-8 become U+FFFD.

/// Per-wait text built from output chunks.
#[derive(Debug, Default, Clone)]
pub struct TextAccumulator {
    text: String,
    /// Trailing bytes of an incomplete character.
    pending: Vec<u8>,
}

impl TextAccumulator {
    /// Create an empty accumulator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode `chunk` and append it to the text.
    pub fn push(&mut self, chunk: &[u8]) {
        if self.pending.is_empty() {
            self.decode(chunk);
        } else {
            let mut joined = std::mem::take(&mut self.pending);
            joined.extend_from_slice(chunk);
            self.decode(&joined);
        }
    }

    fn decode(&mut self, mut bytes: &[u8]) {
        loop {
            match std::str::from_utf8(bytes) {
                Ok(valid) => {
                    self.text.push_str(valid);
                    return;
                }
                Err(err) => {
                    let (valid, rest) = bytes.split_at(err.valid_up_to());
                    self.text.push_str(&String::from_utf8_lossy(valid));
                    match err.error_len() {
                        Some(len) => {
                            self.text.push(char::REPLACEMENT_CHARACTER);
                            bytes = &rest[len..];
                        }
                        None => {
                            self.pending.extend_from_slice(rest);
                            return;
                        }
                    }
                }
            }
        }
    }

    /// The text decoded so far.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Length of the decoded text in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.text.len()
    }

    /// Check if nothing has been decoded yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.text.is_empty() && self.pending.is_empty()
    }

    /// Consume the accumulator, flushing any incomplete trailing character
    /// as U+FFFD.
    #[must_use]
    pub fn into_text(mut self) -> String {
        if !self.pending.is_empty() {
            self.text.push_str(&String::from_utf8_lossy(&self.pending));
        }
        self.text
    }
}
