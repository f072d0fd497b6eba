//! Defines [`TermError`], the unified error type for term operations.
//!
//! Provides descriptive error variants for corrupted serialized input,
//! macro registry misuse, and kind mismatches in the checked accessors.

use smartstring::alias::String;
use thiserror::Error;

/// Represents all possible errors that can occur within the term core.
///
/// [`TermError`] provides a single error surface for higher-level functions.
/// Decoding failures are always reported through this type and are never
/// recovered silently; see [`TermError::is_corrupted_input`].
#[derive(Debug, Error)]
pub enum TermError {
    #[error("unknown term kind tag {tag:#04x} at offset {offset}")]
    UnknownKindTag { tag: u8, offset: usize },

    #[error("unknown universe level tag {tag:#04x} at offset {offset}")]
    UnknownLevelTag { tag: u8, offset: usize },

    #[error("invalid name component tag {tag:#04x} at offset {offset}")]
    InvalidNamePart { tag: u8, offset: usize },

    #[error("macro tag {0:?} is not registered")]
    UnknownMacroTag(String),

    #[error("unexpected end of input at offset {offset}: {needed} more byte(s) needed")]
    UnexpectedEof { offset: usize, needed: usize },

    #[error("back-reference {index} out of range, only {len} cell(s) decoded so far")]
    BadBackRef { index: u32, len: usize },

    #[error("invalid UTF-8 in string at offset {offset}")]
    InvalidUtf8 { offset: usize },

    #[error("trailing bytes after term at offset {offset}")]
    TrailingBytes { offset: usize },

    #[error("malformed macro payload: {0}")]
    MacroPayload(String),

    #[error("macro tag {0:?} is already registered")]
    DuplicateMacroTag(String),

    #[error("Type mismatch: expected {expected}, found {found}")]
    UnexpectedKind {
        expected: &'static str,
        found: &'static str,
    },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl TermError {
    /// Returns `true` for every error that means the bytes handed to a
    /// decoder do not describe a valid term stream.
    pub fn is_corrupted_input(&self) -> bool {
        matches!(
            self,
            TermError::UnknownKindTag { .. }
                | TermError::UnknownLevelTag { .. }
                | TermError::InvalidNamePart { .. }
                | TermError::UnknownMacroTag(_)
                | TermError::UnexpectedEof { .. }
                | TermError::BadBackRef { .. }
                | TermError::InvalidUtf8 { .. }
                | TermError::TrailingBytes { .. }
                | TermError::MacroPayload(_)
        )
    }
}

/// Internal errors raised by the low-level wire reader before the
/// decoder attaches them to a [`TermError`].
#[derive(Debug, Clone, Error)]
pub(crate) enum InternalTermError {
    /// The reader ran out of bytes.
    #[error("need {needed} byte(s) at offset {offset}")]
    Eof { offset: usize, needed: usize },

    /// A length-prefixed string was not valid UTF-8.
    #[error("bad utf-8 at offset {offset}")]
    Utf8 { offset: usize },
}

impl From<InternalTermError> for TermError {
    fn from(e: InternalTermError) -> Self {
        match e {
            InternalTermError::Eof { offset, needed } => TermError::UnexpectedEof { offset, needed },
            InternalTermError::Utf8 { offset } => TermError::InvalidUtf8 { offset },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corrupted_input_classification() {
        assert!(TermError::UnknownKindTag { tag: 0x42, offset: 3 }.is_corrupted_input());
        assert!(TermError::UnknownMacroTag("int".into()).is_corrupted_input());
        assert!(TermError::BadBackRef { index: 9, len: 2 }.is_corrupted_input());
        assert!(!TermError::DuplicateMacroTag("int".into()).is_corrupted_input());
        assert!(
            !TermError::UnexpectedKind {
                expected: "app",
                found: "var"
            }
            .is_corrupted_input()
        );
    }

    #[test]
    fn internal_errors_convert() {
        let e: TermError = InternalTermError::Eof { offset: 7, needed: 4 }.into();
        assert!(matches!(e, TermError::UnexpectedEof { offset: 7, needed: 4 }));
        let e: TermError = InternalTermError::Utf8 { offset: 1 }.into();
        assert!(matches!(e, TermError::InvalidUtf8 { offset: 1 }));
        assert_eq!(
            TermError::BadBackRef { index: 5, len: 1 }.to_string(),
            "back-reference 5 out of range, only 1 cell(s) decoded so far"
        );
    }
}
