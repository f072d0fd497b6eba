//! Defines [`MacroRegistry`], the table of macro payload readers.
//!
//! The registry maps a payload tag to the function that rebuilds the
//! payload from its bytes. It is an ordinary value: build one, register
//! every payload type once, then hand it to each
//! [`Deserializer`](crate::Deserializer) that may meet those payloads.

use crate::{MacroPayload, Reader, TermError};
use indexmap::IndexMap;
use smartstring::alias::String;
use std::fmt;
use std::rc::Rc;

/// Rebuilds a payload from the bytes its [`MacroPayload::write`] produced.
pub type MacroReader = Box<dyn Fn(&mut Reader<'_>) -> Result<Rc<dyn MacroPayload>, TermError>>;

/// Tag-indexed table of macro payload readers.
#[derive(Default)]
pub struct MacroRegistry {
    readers: IndexMap<String, MacroReader>,
}

impl MacroRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the reader for `tag`.
    ///
    /// Each tag may be registered once; a second registration fails with
    /// [`TermError::DuplicateMacroTag`] and leaves the first in place.
    pub fn register<F>(&mut self, tag: impl AsRef<str>, reader: F) -> Result<(), TermError>
    where
        F: Fn(&mut Reader<'_>) -> Result<Rc<dyn MacroPayload>, TermError> + 'static,
    {
        let tag = tag.as_ref();
        if self.readers.contains_key(tag) {
            return Err(TermError::DuplicateMacroTag(tag.into()));
        }
        log::debug!("macro registry: registered reader #{} for {tag:?}", self.readers.len());
        self.readers.insert(tag.into(), Box::new(reader));
        Ok(())
    }

    #[inline]
    pub fn contains(&self, tag: &str) -> bool {
        self.readers.contains_key(tag)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.readers.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.readers.is_empty()
    }

    /// Registered tags, in registration order.
    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.readers.keys().map(|k| k.as_str())
    }

    /// Reads one payload with the reader registered for `tag`.
    ///
    /// An unregistered tag is corrupted input for the caller, reported as
    /// [`TermError::UnknownMacroTag`]. Errors raised by the reader are
    /// passed through.
    pub fn read(&self, tag: &str, r: &mut Reader<'_>) -> Result<Rc<dyn MacroPayload>, TermError> {
        let reader = self
            .readers
            .get(tag)
            .ok_or_else(|| TermError::UnknownMacroTag(tag.into()))?;
        reader(r)
    }
}

impl fmt::Debug for MacroRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MacroRegistry")
            .field("tags", &self.tags().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::tests::IntLit;
    use crate::Writer;

    #[test]
    fn register_and_read() {
        let _ = env_logger::builder().is_test(true).try_init();
        let mut reg = MacroRegistry::new();
        assert!(reg.is_empty());
        reg.register(IntLit::TAG, IntLit::read).unwrap();
        assert!(reg.contains("int"));
        assert_eq!(reg.tags().collect::<Vec<_>>(), vec!["int"]);

        let mut w = Writer::new();
        w.write_i64(-12).unwrap();
        let bytes = w.into_bytes();
        let payload = reg.read("int", &mut Reader::new(&bytes)).unwrap();
        assert_eq!(payload.downcast_ref::<IntLit>(), Some(&IntLit(-12)));
    }

    #[test]
    fn duplicate_tag_is_rejected() {
        let mut reg = MacroRegistry::new();
        reg.register("int", IntLit::read).unwrap();
        let err = reg
            .register("int", |_r: &mut Reader<'_>| -> Result<Rc<dyn MacroPayload>, TermError> {
                Err(TermError::MacroPayload("unreachable".into()))
            })
            .unwrap_err();
        assert!(matches!(err, TermError::DuplicateMacroTag(ref t) if t == "int"));
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn unknown_tag_is_corrupted_input() {
        let reg = MacroRegistry::new();
        let Err(err) = reg.read("real", &mut Reader::new(&[])) else { panic!("expected error") };
        assert!(matches!(err, TermError::UnknownMacroTag(ref t) if t == "real"));
        assert!(err.is_corrupted_input());
    }
}
