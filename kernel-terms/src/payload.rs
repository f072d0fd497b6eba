//! Defines [`MacroPayload`], the open extension point for macro cells.
//!
//! A payload is an object owned outside the closed set of term kinds
//! (a numeric literal, for instance). Payloads are reference-counted on
//! their own and may be shared by any number of macro cells.

use crate::{Name, TermError, Writer};
use core::fmt;
use std::any::Any;
use std::cmp::Ordering;

/// Capabilities every macro payload provides.
///
/// Only [`name`](MacroPayload::name), [`tag`](MacroPayload::tag),
/// [`write`](MacroPayload::write) and [`as_any`](MacroPayload::as_any) are
/// required. The defaults make all payloads of one concrete type equal to
/// each other and hash them by name.
pub trait MacroPayload: Any {
    /// Display name, also the primary ordering key.
    fn name(&self) -> Name;

    /// Registry tag written in front of the payload bytes. A reader for
    /// this tag must be registered in the [`crate::MacroRegistry`] used to
    /// decode the payload.
    fn tag(&self) -> &str;

    /// Writes the payload bytes (the tag is written by the caller).
    fn write(&self, w: &mut Writer) -> Result<(), TermError>;

    fn as_any(&self) -> &dyn Any;

    fn fmt_payload(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }

    /// Must agree with [`eq_payload`](MacroPayload::eq_payload): equal
    /// payloads have equal hashes.
    fn hash(&self) -> u32 {
        self.name().hash()
    }

    /// Equality against a payload of any type.
    fn eq_payload(&self, other: &dyn MacroPayload) -> bool {
        self.as_any().type_id() == other.as_any().type_id()
    }

    /// Tie-break between two payloads with the same name. `other` is only
    /// passed when it has the same concrete type as `self`. `None` leaves
    /// the two unordered.
    fn cmp_same_type(&self, _other: &dyn MacroPayload) -> Option<Ordering> {
        None
    }
}

impl<'a> dyn MacroPayload + 'a {
    /// Returns the payload as a `T` if that is its concrete type.
    pub fn downcast_ref<T: MacroPayload>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    #[inline]
    pub fn is<T: MacroPayload>(&self) -> bool {
        self.as_any().is::<T>()
    }

    pub(crate) fn same_type(&self, other: &dyn MacroPayload) -> bool {
        self.as_any().type_id() == other.as_any().type_id()
    }
}

/// Orders two payloads: by name, then by the same-type tie-break.
/// Payloads of different types with equal names are unordered.
pub(crate) fn cmp_payloads(a: &dyn MacroPayload, b: &dyn MacroPayload) -> Option<Ordering> {
    match a.name().cmp(&b.name()) {
        Ordering::Equal if a.same_type(b) => a.cmp_same_type(b),
        Ordering::Equal => None,
        ord => Some(ord),
    }
}

/// A wrapper that renders a payload through
/// [`fmt_payload`](MacroPayload::fmt_payload).
pub(crate) struct PayloadDisplay<'a>(pub(crate) &'a dyn MacroPayload);

impl fmt::Display for PayloadDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt_payload(f)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::Reader;
    use std::rc::Rc;

    /// An integer literal payload used across the crate's tests.
    #[derive(Debug, PartialEq)]
    pub(crate) struct IntLit(pub(crate) i64);

    impl IntLit {
        pub(crate) const TAG: &'static str = "int";

        pub(crate) fn read(r: &mut Reader<'_>) -> Result<Rc<dyn MacroPayload>, TermError> {
            Ok(Rc::new(IntLit(r.read_i64()?)))
        }
    }

    impl MacroPayload for IntLit {
        fn name(&self) -> Name {
            Name::new("int")
        }
        fn tag(&self) -> &str {
            Self::TAG
        }
        fn write(&self, w: &mut Writer) -> Result<(), TermError> {
            w.write_i64(self.0)
        }
        fn as_any(&self) -> &dyn Any {
            self
        }
        fn fmt_payload(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "{}", self.0)
        }
        fn hash(&self) -> u32 {
            self.0 as u32
        }
        fn eq_payload(&self, other: &dyn MacroPayload) -> bool {
            other.downcast_ref::<IntLit>() == Some(self)
        }
        fn cmp_same_type(&self, other: &dyn MacroPayload) -> Option<Ordering> {
            other.downcast_ref::<IntLit>().map(|o| self.0.cmp(&o.0))
        }
    }

    /// A payload that shares its name with `IntLit` but is a different type.
    pub(crate) struct Impostor;

    impl MacroPayload for Impostor {
        fn name(&self) -> Name {
            Name::new("int")
        }
        fn tag(&self) -> &str {
            "impostor"
        }
        fn write(&self, _w: &mut Writer) -> Result<(), TermError> {
            Ok(())
        }
        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    #[test]
    fn downcast_and_equality() {
        let a: Rc<dyn MacroPayload> = Rc::new(IntLit(3));
        let b: Rc<dyn MacroPayload> = Rc::new(IntLit(3));
        let c: Rc<dyn MacroPayload> = Rc::new(IntLit(4));
        assert_eq!(a.downcast_ref::<IntLit>(), Some(&IntLit(3)));
        assert!(a.is::<IntLit>());
        assert!(!a.is::<Impostor>());
        assert!(a.eq_payload(&*b));
        assert!(!a.eq_payload(&*c));
        assert!(!a.eq_payload(&Impostor));
        // the default equality accepts any payload of the same type
        assert!(Impostor.eq_payload(&Impostor));
    }

    #[test]
    fn ordering_by_name_then_type() {
        assert_eq!(cmp_payloads(&IntLit(1), &IntLit(2)), Some(Ordering::Less));
        assert_eq!(cmp_payloads(&IntLit(2), &IntLit(2)), Some(Ordering::Equal));
        assert_eq!(cmp_payloads(&IntLit(1), &Impostor), None);
        assert_eq!(cmp_payloads(&Impostor, &Impostor), None);
    }

    #[test]
    fn display_goes_through_payload() {
        assert_eq!(PayloadDisplay(&IntLit(-7)).to_string(), "-7");
        assert_eq!(PayloadDisplay(&Impostor).to_string(), "int");
    }
}
