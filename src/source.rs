//! The unit of input: one decoded source file.

use thiserror::Error;

/// Errors raised while accepting raw input, before any analysis stage runs.
#[derive(Error, Debug)]
pub enum InputError {
    #[error("{filename}: source is not valid UTF-8 ({source})")]
    Undecodable {
        filename: String,
        #[source]
        source: std::str::Utf8Error,
    },
}

/// A single source file accepted for analysis.
///
/// Immutable once constructed; every pipeline stage reads from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceUnit {
    filename: String,
    text: String,
}

impl SourceUnit {
    /// Create a unit from already-decoded text.
    pub fn new(filename: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            text: text.into(),
        }
    }

    /// Decode raw bytes as UTF-8, stripping a leading byte-order mark.
    pub fn from_bytes(filename: impl Into<String>, bytes: &[u8]) -> Result<Self, InputError> {
        let filename = filename.into();
        let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
        match std::str::from_utf8(bytes) {
            Ok(text) => Ok(Self::new(filename, text)),
            Err(source) => Err(InputError::Undecodable { filename, source }),
        }
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Number of lines in the unit.
    pub fn line_count(&self) -> usize {
        self.text.lines().count()
    }

    /// The first `max_chars` characters of the text.
    pub fn excerpt(&self, max_chars: usize) -> &str {
        truncate_chars(&self.text, max_chars)
    }

    /// Lines `start..=end` (1-indexed), clamped to the unit.
    pub fn lines_between(&self, start: usize, end: usize) -> String {
        self.text
            .lines()
            .skip(start.saturating_sub(1))
            .take(end.saturating_sub(start) + 1)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Truncate on a character boundary.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
