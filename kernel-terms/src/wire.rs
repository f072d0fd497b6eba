//! Low-level wire primitives shared by the term codec and macro payloads.
//!
//! Integers are fixed-width little-endian. Strings and byte blobs carry a
//! `u32` length prefix. Names and universe levels are written inline.

use crate::{InternalTermError, Level, LevelKind, LevelNode, Name, NamePart, TermError};
use byteorder::{ByteOrder, WriteBytesExt, LE};
use smartstring::alias::String;
use std::io::Write;

const NAME_PART_STR: u8 = 0;
const NAME_PART_NUM: u8 = 1;

/// Append-only byte sink handed to [`crate::MacroPayload::write`].
#[derive(Debug, Default)]
pub struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(bytes: usize) -> Self {
        Self {
            buf: Vec::with_capacity(bytes),
        }
    }

    /// Number of bytes written so far.
    #[inline]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    /// Discards everything past the first `len` bytes.
    pub(crate) fn truncate(&mut self, len: usize) {
        self.buf.truncate(len);
    }

    pub fn write_u8(&mut self, v: u8) -> Result<(), TermError> {
        Ok(self.buf.write_u8(v)?)
    }

    pub fn write_bool(&mut self, v: bool) -> Result<(), TermError> {
        self.write_u8(v as u8)
    }

    pub fn write_u32(&mut self, v: u32) -> Result<(), TermError> {
        Ok(self.buf.write_u32::<LE>(v)?)
    }

    pub fn write_u64(&mut self, v: u64) -> Result<(), TermError> {
        Ok(self.buf.write_u64::<LE>(v)?)
    }

    pub fn write_i64(&mut self, v: i64) -> Result<(), TermError> {
        Ok(self.buf.write_i64::<LE>(v)?)
    }

    fn write_len(&mut self, len: usize) -> Result<(), TermError> {
        let len = u32::try_from(len).map_err(|_| {
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "length does not fit in u32")
        })?;
        self.write_u32(len)
    }

    /// Writes a length-prefixed byte blob.
    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), TermError> {
        self.write_len(bytes.len())?;
        Ok(self.buf.write_all(bytes)?)
    }

    /// Writes a length-prefixed UTF-8 string.
    pub fn write_str(&mut self, s: &str) -> Result<(), TermError> {
        self.write_bytes(s.as_bytes())
    }

    pub fn write_name(&mut self, name: &Name) -> Result<(), TermError> {
        self.write_len(name.parts().len())?;
        for part in name.parts() {
            match part {
                NamePart::Str(s) => {
                    self.write_u8(NAME_PART_STR)?;
                    self.write_str(s)?;
                }
                NamePart::Num(n) => {
                    self.write_u8(NAME_PART_NUM)?;
                    self.write_u32(*n)?;
                }
            }
        }
        Ok(())
    }

    /// Writes a level in prefix order: kind byte, then payload.
    pub fn write_level(&mut self, level: &Level) -> Result<(), TermError> {
        let mut stack = vec![level];
        while let Some(l) = stack.pop() {
            self.write_u8(l.kind() as u8)?;
            match l.node() {
                LevelNode::Zero => {}
                LevelNode::Param(id) | LevelNode::Meta(id) => self.write_u32(*id)?,
                LevelNode::Succ(l) => stack.push(l),
                LevelNode::Max(lhs, rhs) | LevelNode::IMax(lhs, rhs) => {
                    stack.push(rhs);
                    stack.push(lhs);
                }
            }
        }
        Ok(())
    }

    pub fn write_levels(&mut self, levels: &[Level]) -> Result<(), TermError> {
        self.write_len(levels.len())?;
        levels.iter().try_for_each(|l| self.write_level(l))
    }
}

/// Cursor over an encoded byte slice handed to macro payload readers.
#[derive(Debug, Clone)]
pub struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    /// Offset of the next byte to be read.
    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    #[inline]
    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    #[inline]
    pub fn is_at_end(&self) -> bool {
        self.pos == self.bytes.len()
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], InternalTermError> {
        if n > self.remaining() {
            return Err(InternalTermError::Eof {
                offset: self.pos,
                needed: n - self.remaining(),
            });
        }
        let s = &self.bytes[self.pos..self.pos + n];
        self.pos += n;
        Ok(s)
    }

    pub fn read_u8(&mut self) -> Result<u8, TermError> {
        Ok(self.take(1)?[0])
    }

    pub fn read_bool(&mut self) -> Result<bool, TermError> {
        Ok(self.read_u8()? != 0)
    }

    pub fn read_u32(&mut self) -> Result<u32, TermError> {
        Ok(LE::read_u32(self.take(4)?))
    }

    pub fn read_u64(&mut self) -> Result<u64, TermError> {
        Ok(LE::read_u64(self.take(8)?))
    }

    pub fn read_i64(&mut self) -> Result<i64, TermError> {
        Ok(LE::read_i64(self.take(8)?))
    }

    /// Reads a length-prefixed byte blob, borrowing from the input.
    pub fn read_bytes(&mut self) -> Result<&'a [u8], TermError> {
        let len = self.read_u32()? as usize;
        Ok(self.take(len)?)
    }

    /// Reads a length-prefixed UTF-8 string, borrowing from the input.
    pub fn read_str(&mut self) -> Result<&'a str, TermError> {
        let offset = self.pos;
        let bytes = self.read_bytes()?;
        core::str::from_utf8(bytes).map_err(|_| InternalTermError::Utf8 { offset }.into())
    }

    pub fn read_name(&mut self) -> Result<Name, TermError> {
        let count = self.read_u32()? as usize;
        // every component takes at least one byte
        let mut parts = Vec::with_capacity(count.min(self.remaining()));
        for _ in 0..count {
            let offset = self.pos;
            parts.push(match self.read_u8()? {
                NAME_PART_STR => NamePart::Str(String::from(self.read_str()?)),
                NAME_PART_NUM => NamePart::Num(self.read_u32()?),
                tag => return Err(TermError::InvalidNamePart { tag, offset }),
            });
        }
        Ok(Name::from_parts(parts))
    }

    /// Reads a level written by [`Writer::write_level`], rebuilding it
    /// through the smart constructors.
    pub fn read_level(&mut self) -> Result<Level, TermError> {
        enum Pending {
            Succ,
            Max(bool, Option<Level>),
        }
        let mut stack: Vec<Pending> = Vec::new();
        loop {
            let offset = self.pos;
            let tag = self.read_u8()?;
            let mut level = match LevelKind::from_u8(tag) {
                Some(LevelKind::Zero) => Level::zero(),
                Some(LevelKind::Param) => Level::param(self.read_u32()?),
                Some(LevelKind::Meta) => Level::meta(self.read_u32()?),
                Some(LevelKind::Succ) => {
                    stack.push(Pending::Succ);
                    continue;
                }
                Some(LevelKind::Max) => {
                    stack.push(Pending::Max(false, None));
                    continue;
                }
                Some(LevelKind::IMax) => {
                    stack.push(Pending::Max(true, None));
                    continue;
                }
                None => return Err(TermError::UnknownLevelTag { tag, offset }),
            };
            loop {
                match stack.pop() {
                    None => return Ok(level),
                    Some(Pending::Succ) => level = Level::succ(&level),
                    Some(Pending::Max(imax, None)) => {
                        stack.push(Pending::Max(imax, Some(level)));
                        break;
                    }
                    Some(Pending::Max(imax, Some(lhs))) => {
                        level = if imax {
                            Level::imax(&lhs, &level)
                        } else {
                            Level::max(&lhs, &level)
                        };
                    }
                }
            }
        }
    }

    pub fn read_levels(&mut self) -> Result<Vec<Level>, TermError> {
        let count = self.read_u32()? as usize;
        let mut levels = Vec::with_capacity(count.min(self.remaining()));
        for _ in 0..count {
            levels.push(self.read_level()?);
        }
        Ok(levels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalars_are_little_endian() {
        let mut w = Writer::new();
        w.write_u32(0x0102_0304).unwrap();
        w.write_u8(9).unwrap();
        w.write_str("hé").unwrap();
        assert_eq!(w.as_bytes(), &[4, 3, 2, 1, 9, 3, 0, 0, 0, b'h', 0xC3, 0xA9]);

        let bytes = w.into_bytes();
        let mut r = Reader::new(&bytes);
        assert_eq!(r.read_u32().unwrap(), 0x0102_0304);
        assert_eq!(r.read_u8().unwrap(), 9);
        assert_eq!(r.read_str().unwrap(), "hé");
        assert!(r.is_at_end());
    }

    #[test]
    fn truncated_input() {
        let mut r = Reader::new(&[1, 2]);
        let err = r.read_u32().unwrap_err();
        assert!(matches!(err, TermError::UnexpectedEof { offset: 0, needed: 2 }));
        assert!(err.is_corrupted_input());

        // a length prefix larger than the input
        let mut r = Reader::new(&[0xFF, 0xFF, 0xFF, 0x7F, b'a']);
        assert!(matches!(r.read_str(), Err(TermError::UnexpectedEof { offset: 4, .. })));
    }

    #[test]
    fn invalid_utf8() {
        let mut r = Reader::new(&[2, 0, 0, 0, 0xC3, 0x28]);
        assert!(matches!(r.read_str(), Err(TermError::InvalidUtf8 { offset: 0 })));
    }

    #[test]
    fn names_and_levels() {
        let name = Name::new("list").append_num(2).append_str("cons");
        let level = Level::imax(&Level::param(0), &Level::max(&Level::param(1), &Level::meta(3)));
        let mut w = Writer::new();
        w.write_name(&name).unwrap();
        w.write_levels(&[level.clone(), Level::of_nat(2)]).unwrap();
        let bytes = w.into_bytes();

        let mut r = Reader::new(&bytes);
        assert_eq!(r.read_name().unwrap(), name);
        let levels = r.read_levels().unwrap();
        assert_eq!(levels, vec![level, Level::of_nat(2)]);
        assert!(r.is_at_end());
    }

    #[test]
    fn bad_tags() {
        let mut r = Reader::new(&[1, 0, 0, 0, 7]);
        assert!(matches!(r.read_name(), Err(TermError::InvalidNamePart { tag: 7, offset: 4 })));
        let mut r = Reader::new(&[42]);
        assert!(matches!(r.read_level(), Err(TermError::UnknownLevelTag { tag: 42, offset: 0 })));
    }
}
