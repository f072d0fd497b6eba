//! Universe levels.
//!
//! A [`Level`] is an immutable, shared value. Levels are built through the
//! smart constructors on [`Level`], which apply the usual `max`/`imax`
//! simplifications so that explicit levels stay in `succ^n zero` form.

use crate::hash::mix;
use core::fmt;
use std::cmp::Ordering;
use std::hash::{Hash, Hasher};
use std::mem;
use std::rc::Rc;

/// The kind of a [`Level`]. The discriminant doubles as the wire tag.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum LevelKind {
    Zero = 0,
    Succ = 1,
    Max = 2,
    IMax = 3,
    Param = 4,
    Meta = 5,
}

impl LevelKind {
    pub fn from_u8(tag: u8) -> Option<Self> {
        Some(match tag {
            0 => Self::Zero,
            1 => Self::Succ,
            2 => Self::Max,
            3 => Self::IMax,
            4 => Self::Param,
            5 => Self::Meta,
            _ => return None,
        })
    }
}

/// The payload of a [`Level`].
#[derive(Debug, Clone)]
pub enum LevelNode {
    Zero,
    Succ(Level),
    Max(Level, Level),
    IMax(Level, Level),
    /// A universe parameter, by index.
    Param(u32),
    /// A universe metavariable, by index.
    Meta(u32),
}

struct LevelCell {
    node: LevelNode,
    hash: u32,
    depth: u32,
    has_param: bool,
    has_meta: bool,
    explicit: bool,
    not_zero: bool,
}

#[derive(Clone)]
pub struct Level(Rc<LevelCell>);

impl Level {
    fn alloc(node: LevelNode) -> Self {
        let (hash, depth, has_param, has_meta, explicit, not_zero) = match &node {
            LevelNode::Zero => (7, 1, false, false, true, false),
            LevelNode::Succ(l) => (
                mix(l.hash(), 17),
                l.depth() + 1,
                l.has_param(),
                l.has_meta(),
                l.is_explicit(),
                true,
            ),
            LevelNode::Max(l1, l2) | LevelNode::IMax(l1, l2) => (
                mix(l1.hash(), l2.hash()),
                l1.depth().max(l2.depth()) + 1,
                l1.has_param() || l2.has_param(),
                l1.has_meta() || l2.has_meta(),
                false,
                match node {
                    LevelNode::Max(..) => l1.is_not_zero() || l2.is_not_zero(),
                    _ => l2.is_not_zero(),
                },
            ),
            LevelNode::Param(id) => (mix(*id, 11), 1, true, false, false, false),
            LevelNode::Meta(id) => (mix(*id, 11), 1, false, true, false, false),
        };
        Self(Rc::new(LevelCell {
            node,
            hash,
            depth,
            has_param,
            has_meta,
            explicit,
            not_zero,
        }))
    }

    pub fn zero() -> Self {
        Self::alloc(LevelNode::Zero)
    }

    pub fn one() -> Self {
        Self::succ(&Self::zero())
    }

    pub fn succ(l: &Level) -> Self {
        Self::alloc(LevelNode::Succ(l.clone()))
    }

    /// `max l1 l2`, simplified when the result is obvious.
    pub fn max(l1: &Level, l2: &Level) -> Self {
        if l1.is_explicit() && l2.is_explicit() {
            if l1.depth() >= l2.depth() { l1.clone() } else { l2.clone() }
        } else if l1 == l2 {
            l1.clone()
        } else if l1.is_zero() {
            l2.clone()
        } else if l2.is_zero() {
            l1.clone()
        } else {
            Self::alloc(LevelNode::Max(l1.clone(), l2.clone()))
        }
    }

    /// `imax l1 l2`: zero when `l2` is zero, otherwise `max l1 l2`.
    pub fn imax(l1: &Level, l2: &Level) -> Self {
        if l2.is_not_zero() {
            Self::max(l1, l2)
        } else if l2.is_zero() {
            l2.clone()
        } else if l1 == l2 {
            l1.clone()
        } else {
            Self::alloc(LevelNode::IMax(l1.clone(), l2.clone()))
        }
    }

    pub fn param(id: u32) -> Self {
        Self::alloc(LevelNode::Param(id))
    }

    pub fn meta(id: u32) -> Self {
        Self::alloc(LevelNode::Meta(id))
    }

    /// The explicit level `n`, that is `succ^n zero`.
    pub fn of_nat(n: u32) -> Self {
        (0..n).fold(Self::zero(), |l, _| Self::succ(&l))
    }

    #[inline]
    pub fn node(&self) -> &LevelNode {
        &self.0.node
    }

    pub fn kind(&self) -> LevelKind {
        match self.0.node {
            LevelNode::Zero => LevelKind::Zero,
            LevelNode::Succ(_) => LevelKind::Succ,
            LevelNode::Max(..) => LevelKind::Max,
            LevelNode::IMax(..) => LevelKind::IMax,
            LevelNode::Param(_) => LevelKind::Param,
            LevelNode::Meta(_) => LevelKind::Meta,
        }
    }

    #[inline]
    pub fn hash(&self) -> u32 {
        self.0.hash
    }

    #[inline]
    pub fn depth(&self) -> u32 {
        self.0.depth
    }

    #[inline]
    pub fn has_param(&self) -> bool {
        self.0.has_param
    }

    #[inline]
    pub fn has_meta(&self) -> bool {
        self.0.has_meta
    }

    /// True for `zero` and `succ` of an explicit level.
    #[inline]
    pub fn is_explicit(&self) -> bool {
        self.0.explicit
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        matches!(self.0.node, LevelNode::Zero)
    }

    /// True when the level is different from zero for every assignment of
    /// its parameters and metavariables.
    #[inline]
    pub fn is_not_zero(&self) -> bool {
        self.0.not_zero
    }

    #[inline]
    pub fn ptr_eq(&self, other: &Level) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Monotonic total order: depth, then kind, then hash, then structure.
    pub fn is_lt(&self, other: &Level) -> bool {
        self.cmp(other) == Ordering::Less
    }

    /// Quick rejection on the cached metadata.
    #[inline]
    fn same_shape(&self, other: &Level) -> bool {
        let (a, b) = (&*self.0, &*other.0);
        a.hash == b.hash && a.depth == b.depth && self.kind() == other.kind()
    }
}

impl Default for Level {
    fn default() -> Self {
        Self::zero()
    }
}

/// Moves the children out of a dying cell, leaving a leaf behind.
fn detach(cell: &mut LevelCell, todo: &mut Vec<Level>) {
    match mem::replace(&mut cell.node, LevelNode::Zero) {
        LevelNode::Succ(l) => todo.push(l),
        LevelNode::Max(l1, l2) | LevelNode::IMax(l1, l2) => {
            todo.push(l1);
            todo.push(l2);
        }
        LevelNode::Zero | LevelNode::Param(_) | LevelNode::Meta(_) => {}
    }
}

impl Drop for Level {
    fn drop(&mut self) {
        let Some(cell) = Rc::get_mut(&mut self.0) else {
            return;
        };
        if matches!(cell.node, LevelNode::Zero | LevelNode::Param(_) | LevelNode::Meta(_)) {
            return;
        }
        let mut todo = Vec::new();
        detach(cell, &mut todo);
        while let Some(mut l) = todo.pop() {
            if let Some(cell) = Rc::get_mut(&mut l.0) {
                detach(cell, &mut todo);
            }
            // `l` is now a leaf or still shared, so dropping it is shallow
        }
    }
}

impl PartialEq for Level {
    fn eq(&self, other: &Self) -> bool {
        if self.ptr_eq(other) {
            return true;
        }
        if !self.same_shape(other) {
            return false;
        }
        let mut stack = vec![(self, other)];
        while let Some((a, b)) = stack.pop() {
            if a.ptr_eq(b) {
                continue;
            }
            if !a.same_shape(b) {
                return false;
            }
            match (a.node(), b.node()) {
                (LevelNode::Zero, LevelNode::Zero) => {}
                (LevelNode::Param(i), LevelNode::Param(j)) | (LevelNode::Meta(i), LevelNode::Meta(j)) => {
                    if i != j {
                        return false;
                    }
                }
                (LevelNode::Succ(l1), LevelNode::Succ(l2)) => {
                    // explicit levels of equal depth are the same universe
                    if a.is_explicit() || b.is_explicit() {
                        if a.is_explicit() != b.is_explicit() {
                            return false;
                        }
                    } else {
                        stack.push((l1, l2));
                    }
                }
                (LevelNode::Max(l1, r1), LevelNode::Max(l2, r2))
                | (LevelNode::IMax(l1, r1), LevelNode::IMax(l2, r2)) => {
                    stack.push((r1, r2));
                    stack.push((l1, l2));
                }
                _ => return false,
            }
        }
        true
    }
}

impl Eq for Level {}

impl Hash for Level {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u32(self.0.hash);
    }
}

impl PartialOrd for Level {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Level {
    fn cmp(&self, other: &Self) -> Ordering {
        if self == other {
            return Ordering::Equal;
        }
        // past this point the pair is unequal, and so is the child pair
        // we descend into
        let (mut a, mut b) = (self, other);
        loop {
            let ord = a
                .depth()
                .cmp(&b.depth())
                .then_with(|| a.kind().cmp(&b.kind()))
                .then_with(|| a.hash().cmp(&b.hash()));
            if ord != Ordering::Equal {
                return ord;
            }
            match (a.node(), b.node()) {
                (LevelNode::Param(i), LevelNode::Param(j)) | (LevelNode::Meta(i), LevelNode::Meta(j)) => {
                    return i.cmp(j)
                }
                (LevelNode::Succ(l1), LevelNode::Succ(l2)) => (a, b) = (l1, l2),
                (LevelNode::Max(l1, r1), LevelNode::Max(l2, r2))
                | (LevelNode::IMax(l1, r1), LevelNode::IMax(l2, r2)) => {
                    (a, b) = if l1 != l2 { (l1, l2) } else { (r1, r2) };
                }
                _ => return Ordering::Equal,
            }
        }
    }
}

enum Item<'a> {
    Level(&'a Level),
    /// A level in argument position, parenthesized unless atomic.
    Child(&'a Level),
    Text(&'static str),
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut stack = vec![Item::Level(self)];
        while let Some(item) = stack.pop() {
            let l = match item {
                Item::Text(s) => {
                    f.write_str(s)?;
                    continue;
                }
                Item::Child(l) => {
                    if l.is_explicit() || matches!(l.node(), LevelNode::Param(_) | LevelNode::Meta(_)) {
                        l
                    } else {
                        stack.push(Item::Text(")"));
                        stack.push(Item::Level(l));
                        stack.push(Item::Text("("));
                        continue;
                    }
                }
                Item::Level(l) => l,
            };
            if l.is_explicit() {
                write!(f, "{}", l.depth() - 1)?;
                continue;
            }
            match l.node() {
                LevelNode::Zero => f.write_str("0")?,
                LevelNode::Param(id) => write!(f, "l_{id}")?,
                LevelNode::Meta(id) => write!(f, "?{id}")?,
                LevelNode::Succ(c) => {
                    f.write_str("succ ")?;
                    stack.push(Item::Child(c));
                }
                LevelNode::Max(lhs, rhs) | LevelNode::IMax(lhs, rhs) => {
                    let kind = l.kind();
                    f.write_str(if kind == LevelKind::Max { "max " } else { "imax " })?;
                    // max and imax associate to the right
                    let mut args = vec![lhs];
                    let mut rhs = rhs;
                    while rhs.kind() == kind {
                        match rhs.node() {
                            LevelNode::Max(l, r) | LevelNode::IMax(l, r) => {
                                args.push(l);
                                rhs = r;
                            }
                            _ => break,
                        }
                    }
                    args.push(rhs);
                    for (i, arg) in args.into_iter().enumerate().rev() {
                        stack.push(Item::Child(arg));
                        if i > 0 {
                            stack.push(Item::Text(" "));
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Level").field(&format_args!("{self}")).finish()
    }
}
