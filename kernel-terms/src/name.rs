//! Hierarchical names such as `nat::add` or `x::3`.

use crate::hash::{hash_str, mix};
use core::fmt;
use smartstring::alias::String;
use std::cmp::Ordering;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

const ANONYMOUS_HASH: u32 = 11;

/// One component of a [`Name`].
///
/// Numeric components sort before string components.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NamePart {
    Num(u32),
    Str(String),
}

struct NameData {
    parts: Vec<NamePart>,
    hash: u32,
}

/// An immutable hierarchical name. Cloning shares the underlying storage.
///
/// The empty name is the *anonymous* name. Binder names are cosmetic: they
/// never take part in term equality, but constants, metavariables and free
/// locals are identified by their names.
#[derive(Clone)]
pub struct Name(Rc<NameData>);

impl Name {
    /// The anonymous (empty) name.
    pub fn anonymous() -> Self {
        Self::from_parts(std::iter::empty())
    }

    /// An atomic name made of one string component.
    pub fn new(s: impl AsRef<str>) -> Self {
        Self::from_parts([NamePart::Str(s.as_ref().into())])
    }

    /// Builds a name from its components, outermost first.
    pub fn from_parts(parts: impl IntoIterator<Item = NamePart>) -> Self {
        let parts: Vec<NamePart> = parts.into_iter().collect();
        let hash = parts.iter().fold(ANONYMOUS_HASH, |h, p| match p {
            NamePart::Str(s) => hash_str(s.as_bytes(), h),
            NamePart::Num(n) => mix(h, *n),
        });
        Self(Rc::new(NameData { parts, hash }))
    }

    fn append(&self, part: NamePart) -> Self {
        Self::from_parts(self.0.parts.iter().cloned().chain(std::iter::once(part)))
    }

    /// Returns `self::s`.
    pub fn append_str(&self, s: impl AsRef<str>) -> Self {
        self.append(NamePart::Str(s.as_ref().into()))
    }

    /// Returns `self::n`.
    pub fn append_num(&self, n: u32) -> Self {
        self.append(NamePart::Num(n))
    }

    #[inline]
    pub fn is_anonymous(&self) -> bool {
        self.0.parts.is_empty()
    }

    #[inline]
    pub fn is_atomic(&self) -> bool {
        self.0.parts.len() == 1
    }

    /// The name without its last component. The prefix of an atomic or
    /// anonymous name is anonymous.
    pub fn prefix(&self) -> Self {
        let parts = &self.0.parts;
        let keep = parts.len().saturating_sub(1);
        Self::from_parts(parts[..keep].iter().cloned())
    }

    #[inline]
    pub fn parts(&self) -> &[NamePart] {
        &self.0.parts
    }

    /// Stable 32-bit hash of the name.
    #[inline]
    pub fn hash(&self) -> u32 {
        self.0.hash
    }
}

impl Default for Name {
    fn default() -> Self {
        Self::anonymous()
    }
}

impl From<&str> for Name {
    fn from(s: &str) -> Self {
        Name::new(s)
    }
}

impl PartialEq for Name {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0) || (self.0.hash == other.0.hash && self.0.parts == other.0.parts)
    }
}

impl Eq for Name {}

impl PartialOrd for Name {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Name {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.parts.cmp(&other.0.parts)
    }
}

impl Hash for Name {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u32(self.0.hash);
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_anonymous() {
            return f.write_str("[anonymous]");
        }
        for (i, part) in self.0.parts.iter().enumerate() {
            if i > 0 {
                f.write_str("::")?;
            }
            match part {
                NamePart::Str(s) => f.write_str(s)?,
                NamePart::Num(n) => write!(f, "{n}")?,
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "`{self}`")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_and_display() {
        let n = Name::new("nat").append_str("add").append_num(3);
        assert_eq!(n.to_string(), "nat::add::3");
        assert_eq!(n.prefix().to_string(), "nat::add");
        assert!(!n.is_atomic());
        assert!(Name::new("x").is_atomic());
        assert!(Name::anonymous().is_anonymous());
        assert!(Name::new("x").prefix().is_anonymous());
        assert_eq!(Name::anonymous().to_string(), "[anonymous]");
    }

    #[test]
    fn equality_and_hash_are_structural() {
        let a = Name::new("f").append_num(1);
        let b = Name::from_parts([NamePart::Str("f".into()), NamePart::Num(1)]);
        assert_eq!(a, b);
        assert_eq!(a.hash(), b.hash());
        assert_ne!(a, Name::new("f").append_num(2));
        assert_ne!(Name::new("a").hash(), Name::new("b").hash());
    }

    #[test]
    fn ordering() {
        let a = Name::new("a");
        let b = Name::new("b");
        assert!(a < b);
        assert!(a < a.append_str("x"));
        assert!(a.append_num(7) < a.append_str("x"));
        assert!(Name::anonymous() < a);
    }
}
