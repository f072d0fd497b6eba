//! Defines the core [`Term`] handle, its cell layout and constructors.
//!
//! A term is an immutable, reference-counted tree (in practice a DAG,
//! since subterms are freely shared). Every cell caches its structural
//! hash, depth and closedness flags at construction so the common
//! queries never traverse the tree.

use crate::check::{self, InvariantViolation};
use crate::hash::{mix, next_alloc_order};
use crate::teardown::note_alloc;
use crate::{Level, MacroPayload, Name, TermError};
use core::fmt;
use std::cell::Cell;
use std::mem::ManuallyDrop;
use std::rc::Rc;

/// The kind of a term cell. The discriminant doubles as the wire tag.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum TermKind {
    Var = 0,
    Sort = 1,
    Constant = 2,
    Meta = 3,
    Local = 4,
    App = 5,
    Pair = 6,
    Fst = 7,
    Snd = 8,
    Lambda = 9,
    Pi = 10,
    Sigma = 11,
    Let = 12,
    Macro = 13,
}

impl TermKind {
    pub fn from_u8(tag: u8) -> Option<Self> {
        use TermKind::*;
        Some(match tag {
            0 => Var,
            1 => Sort,
            2 => Constant,
            3 => Meta,
            4 => Local,
            5 => App,
            6 => Pair,
            7 => Fst,
            8 => Snd,
            9 => Lambda,
            10 => Pi,
            11 => Sigma,
            12 => Let,
            13 => Macro,
            _ => return None,
        })
    }

    /// Returns `true` for `Lambda`, `Pi` and `Sigma`.
    #[inline]
    pub fn is_binder(self) -> bool {
        matches!(self, TermKind::Lambda | TermKind::Pi | TermKind::Sigma)
    }

    /// Returns a lowercase name for the kind, used in error messages.
    pub fn name(self) -> &'static str {
        match self {
            TermKind::Var => "var",
            TermKind::Sort => "sort",
            TermKind::Constant => "constant",
            TermKind::Meta => "meta",
            TermKind::Local => "local",
            TermKind::App => "app",
            TermKind::Pair => "pair",
            TermKind::Fst => "fst",
            TermKind::Snd => "snd",
            TermKind::Lambda => "lambda",
            TermKind::Pi => "pi",
            TermKind::Sigma => "sigma",
            TermKind::Let => "let",
            TermKind::Macro => "macro",
        }
    }
}

/// Payload of a term cell. Each variant owns its children.
#[derive(Clone)]
pub(crate) enum Node {
    Var(u32),
    Constant(Name, Vec<Level>),
    Sort(Level),
    /// Metavariable (`meta == true`) or free local.
    MLocal { meta: bool, name: Name, ty: Term },
    Macro(Rc<dyn MacroPayload>),
    Pair { first: Term, second: Term, ty: Term },
    /// `fst` (`first == true`) or `snd` projection.
    Proj { first: bool, arg: Term },
    App { fun: Term, arg: Term },
    Binder { kind: TermKind, name: Name, domain: Term, body: Term },
    Let { name: Name, ty: Term, value: Term, body: Term },
}

pub(crate) const HAS_METAVAR: u8 = 1;
pub(crate) const HAS_LOCAL: u8 = 2;

const ARROW_UNKNOWN: u8 = 0;
const ARROW_TRUE: u8 = 1;
const ARROW_FALSE: u8 = 2;

/// A term cell: payload plus metadata computed once at construction.
///
/// `arrow` is the only field written after construction. It memoizes
/// [`crate::is_arrow`], and every write stores the same value.
///
/// `TermCell` has no `Drop` impl, so teardown can move its
/// children out by value.
pub(crate) struct TermCell {
    pub(crate) node: Node,
    pub(crate) hash: u32,
    pub(crate) depth: u32,
    pub(crate) flags: u8,
    pub(crate) alloc_order: u32,
    pub(crate) arrow: Cell<u8>,
}

/// A shared handle to an immutable term cell.
///
/// Cloning a `Term` is cheap (a reference count increment). Dropping the
/// last handle to a subtree reclaims it without recursion, see
/// [`crate::live_cells`]. Handles are confined to the thread that built
/// them.
///
/// Terms are obtained through the `mk_*` constructors, one per kind, or
/// through [`crate::decode`]. `Term::default()` is `#0`, the variable with
/// de Bruijn index zero.
pub struct Term(pub(crate) ManuallyDrop<Rc<TermCell>>);

impl Clone for Term {
    #[inline]
    fn clone(&self) -> Self {
        Term(ManuallyDrop::new(Rc::clone(&self.0)))
    }
}

impl Default for Term {
    fn default() -> Self {
        mk_var(0)
    }
}

impl AsRef<Term> for Term {
    fn as_ref(&self) -> &Self {
        self
    }
}

impl Term {
    /// Allocates a cell for `node`, computing all cached metadata.
    pub(crate) fn alloc(node: Node) -> Self {
        let (hash, depth, flags) = match &node {
            Node::Var(idx) => (*idx, 1, 0),
            Node::Constant(name, levels) => {
                let meta = levels.iter().any(Level::has_meta);
                (mix(name.hash(), hash_levels(levels)), 1, if meta { HAS_METAVAR } else { 0 })
            }
            Node::Sort(level) => (level.hash(), 1, if level.has_meta() { HAS_METAVAR } else { 0 }),
            Node::MLocal { meta, name, ty } => {
                let flags = if *meta {
                    HAS_METAVAR | (ty.flags() & HAS_LOCAL)
                } else {
                    HAS_LOCAL | (ty.flags() & HAS_METAVAR)
                };
                (name.hash(), 1, flags)
            }
            Node::Macro(payload) => (payload.hash(), 1, 0),
            Node::Pair { first, second, ty } => (
                mix(first.hash(), second.hash()),
                composite_depth(&[first, second, ty]),
                first.flags() | second.flags() | ty.flags(),
            ),
            Node::Proj { arg, .. } => (mix(17, arg.hash()), arg.depth() + 1, arg.flags()),
            Node::App { fun, arg } => (
                mix(fun.hash(), arg.hash()),
                composite_depth(&[fun, arg]),
                fun.flags() | arg.flags(),
            ),
            Node::Binder { domain, body, .. } => (
                mix(domain.hash(), body.hash()),
                composite_depth(&[domain, body]),
                domain.flags() | body.flags(),
            ),
            Node::Let { ty, value, body, .. } => (
                mix(value.hash(), body.hash()),
                composite_depth(&[ty, value, body]),
                ty.flags() | value.flags() | body.flags(),
            ),
        };
        note_alloc();
        Term(ManuallyDrop::new(Rc::new(TermCell {
            node,
            hash,
            depth,
            flags,
            alloc_order: next_alloc_order(),
            arrow: Cell::new(ARROW_UNKNOWN),
        })))
    }

    #[inline]
    pub(crate) fn node(&self) -> &Node {
        &self.0.node
    }

    #[inline]
    pub(crate) fn flags(&self) -> u8 {
        self.0.flags
    }

    #[inline]
    pub(crate) fn as_ptr(&self) -> *const TermCell {
        Rc::as_ptr(&self.0)
    }

    pub(crate) fn arrow_cache(&self) -> Option<bool> {
        match self.0.arrow.get() {
            ARROW_TRUE => Some(true),
            ARROW_FALSE => Some(false),
            _ => None,
        }
    }

    pub(crate) fn set_arrow_cache(&self, flag: bool) {
        self.0.arrow.set(if flag { ARROW_TRUE } else { ARROW_FALSE });
    }

    /// Returns the kind of this term.
    pub fn kind(&self) -> TermKind {
        match self.node() {
            Node::Var(_) => TermKind::Var,
            Node::Constant(..) => TermKind::Constant,
            Node::Sort(_) => TermKind::Sort,
            Node::MLocal { meta: true, .. } => TermKind::Meta,
            Node::MLocal { meta: false, .. } => TermKind::Local,
            Node::Macro(_) => TermKind::Macro,
            Node::Pair { .. } => TermKind::Pair,
            Node::Proj { first: true, .. } => TermKind::Fst,
            Node::Proj { first: false, .. } => TermKind::Snd,
            Node::App { .. } => TermKind::App,
            Node::Binder { kind, .. } => *kind,
            Node::Let { .. } => TermKind::Let,
        }
    }

    /// Returns a string describing the kind of this term.
    #[inline]
    pub fn kind_name(&self) -> &'static str {
        self.kind().name()
    }

    /// Structural hash. Equal terms have equal hashes.
    #[inline]
    pub fn hash(&self) -> u32 {
        self.0.hash
    }

    /// 1 for leaf kinds, one more than the deepest child otherwise.
    #[inline]
    pub fn depth(&self) -> u32 {
        self.0.depth
    }

    /// True if the term contains a metavariable (in a subterm, a universe
    /// level, or the type of a free local).
    #[inline]
    pub fn has_metavar(&self) -> bool {
        self.0.flags & HAS_METAVAR != 0
    }

    /// True if the term contains a free local.
    #[inline]
    pub fn has_local(&self) -> bool {
        self.0.flags & HAS_LOCAL != 0
    }

    /// Per-thread allocation counter value of this cell. Only meaningful
    /// as a hash for identity-keyed tables.
    #[inline]
    pub fn alloc_order(&self) -> u32 {
        self.0.alloc_order
    }

    /// Returns `true` if both handles point to the same cell.
    #[inline]
    pub fn ptr_eq(&self, other: &Term) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Number of handles to this cell, including `self`.
    #[inline]
    pub fn ref_count(&self) -> usize {
        Rc::strong_count(&self.0)
    }

    /// Returns `true` if some other handle also points to this cell.
    #[inline]
    pub fn is_shared(&self) -> bool {
        self.ref_count() > 1
    }

    /// Returns `true` for kinds without term children.
    pub fn is_atomic(&self) -> bool {
        matches!(
            self.node(),
            Node::Var(_) | Node::Constant(..) | Node::Sort(_) | Node::Macro(_)
        )
    }

    /// Builds a new cell with the same payload. The copy is equal to `self`
    /// but not pointer-identical.
    pub fn shallow_copy(&self) -> Term {
        Term::alloc(self.node().clone())
    }

    #[inline]
    pub fn is_var(&self) -> bool {
        matches!(self.node(), Node::Var(_))
    }

    #[inline]
    pub fn is_app(&self) -> bool {
        matches!(self.node(), Node::App { .. })
    }

    #[inline]
    pub fn is_binder(&self) -> bool {
        matches!(self.node(), Node::Binder { .. })
    }

    #[inline]
    pub fn is_pi(&self) -> bool {
        self.kind() == TermKind::Pi
    }

    #[inline]
    pub fn is_sigma(&self) -> bool {
        self.kind() == TermKind::Sigma
    }

    #[inline]
    pub fn is_lambda(&self) -> bool {
        self.kind() == TermKind::Lambda
    }

    #[inline]
    pub fn is_metavar(&self) -> bool {
        matches!(self.node(), Node::MLocal { meta: true, .. })
    }

    #[inline]
    pub fn is_local(&self) -> bool {
        matches!(self.node(), Node::MLocal { meta: false, .. })
    }

    #[inline]
    pub fn is_macro(&self) -> bool {
        matches!(self.node(), Node::Macro(_))
    }

    fn mismatch(&self, expected: &'static str) -> TermError {
        TermError::UnexpectedKind {
            expected,
            found: self.kind_name(),
        }
    }

    pub fn try_var_idx(&self) -> Result<u32, TermError> {
        match self.node() {
            Node::Var(idx) => Ok(*idx),
            _ => Err(self.mismatch("var")),
        }
    }

    pub fn try_const_name(&self) -> Result<&Name, TermError> {
        match self.node() {
            Node::Constant(name, _) => Ok(name),
            _ => Err(self.mismatch("constant")),
        }
    }

    pub fn try_const_levels(&self) -> Result<&[Level], TermError> {
        match self.node() {
            Node::Constant(_, levels) => Ok(levels),
            _ => Err(self.mismatch("constant")),
        }
    }

    pub fn try_sort_level(&self) -> Result<&Level, TermError> {
        match self.node() {
            Node::Sort(level) => Ok(level),
            _ => Err(self.mismatch("sort")),
        }
    }

    pub fn try_mlocal_name(&self) -> Result<&Name, TermError> {
        match self.node() {
            Node::MLocal { name, .. } => Ok(name),
            _ => Err(self.mismatch("meta or local")),
        }
    }

    pub fn try_mlocal_type(&self) -> Result<&Term, TermError> {
        match self.node() {
            Node::MLocal { ty, .. } => Ok(ty),
            _ => Err(self.mismatch("meta or local")),
        }
    }

    pub fn try_macro_payload(&self) -> Result<&Rc<dyn MacroPayload>, TermError> {
        match self.node() {
            Node::Macro(payload) => Ok(payload),
            _ => Err(self.mismatch("macro")),
        }
    }

    pub fn try_app_fn(&self) -> Result<&Term, TermError> {
        match self.node() {
            Node::App { fun, .. } => Ok(fun),
            _ => Err(self.mismatch("app")),
        }
    }

    pub fn try_app_arg(&self) -> Result<&Term, TermError> {
        match self.node() {
            Node::App { arg, .. } => Ok(arg),
            _ => Err(self.mismatch("app")),
        }
    }

    pub fn try_pair_first(&self) -> Result<&Term, TermError> {
        match self.node() {
            Node::Pair { first, .. } => Ok(first),
            _ => Err(self.mismatch("pair")),
        }
    }

    pub fn try_pair_second(&self) -> Result<&Term, TermError> {
        match self.node() {
            Node::Pair { second, .. } => Ok(second),
            _ => Err(self.mismatch("pair")),
        }
    }

    pub fn try_pair_type(&self) -> Result<&Term, TermError> {
        match self.node() {
            Node::Pair { ty, .. } => Ok(ty),
            _ => Err(self.mismatch("pair")),
        }
    }

    pub fn try_proj_arg(&self) -> Result<&Term, TermError> {
        match self.node() {
            Node::Proj { arg, .. } => Ok(arg),
            _ => Err(self.mismatch("fst or snd")),
        }
    }

    pub fn try_binder_name(&self) -> Result<&Name, TermError> {
        match self.node() {
            Node::Binder { name, .. } => Ok(name),
            _ => Err(self.mismatch("binder")),
        }
    }

    pub fn try_binder_domain(&self) -> Result<&Term, TermError> {
        match self.node() {
            Node::Binder { domain, .. } => Ok(domain),
            _ => Err(self.mismatch("binder")),
        }
    }

    pub fn try_binder_body(&self) -> Result<&Term, TermError> {
        match self.node() {
            Node::Binder { body, .. } => Ok(body),
            _ => Err(self.mismatch("binder")),
        }
    }

    pub fn try_let_name(&self) -> Result<&Name, TermError> {
        match self.node() {
            Node::Let { name, .. } => Ok(name),
            _ => Err(self.mismatch("let")),
        }
    }

    pub fn try_let_type(&self) -> Result<&Term, TermError> {
        match self.node() {
            Node::Let { ty, .. } => Ok(ty),
            _ => Err(self.mismatch("let")),
        }
    }

    pub fn try_let_value(&self) -> Result<&Term, TermError> {
        match self.node() {
            Node::Let { value, .. } => Ok(value),
            _ => Err(self.mismatch("let")),
        }
    }

    pub fn try_let_body(&self) -> Result<&Term, TermError> {
        match self.node() {
            Node::Let { body, .. } => Ok(body),
            _ => Err(self.mismatch("let")),
        }
    }

    /// Immediate term children, in wire order.
    pub(crate) fn children(&self) -> impl DoubleEndedIterator<Item = &Term> {
        let slots: [Option<&Term>; 3] = match self.node() {
            Node::Var(_) | Node::Constant(..) | Node::Sort(_) | Node::Macro(_) => [None, None, None],
            Node::MLocal { ty, .. } => [Some(ty), None, None],
            Node::Pair { first, second, ty } => [Some(first), Some(second), Some(ty)],
            Node::Proj { arg, .. } => [Some(arg), None, None],
            Node::App { fun, arg } => [Some(fun), Some(arg), None],
            Node::Binder { domain, body, .. } => [Some(domain), Some(body), None],
            Node::Let { ty, value, body, .. } => [Some(ty), Some(value), Some(body)],
        };
        slots.into_iter().flatten()
    }
}

pub(crate) fn hash_levels(levels: &[Level]) -> u32 {
    levels.iter().fold(23, |r, l| mix(l.hash(), r))
}

fn composite_depth(children: &[&Term]) -> u32 {
    children.iter().map(|t| t.depth()).max().unwrap_or(0).saturating_add(1)
}

/// The variable with de Bruijn index `idx`.
pub fn mk_var(idx: u32) -> Term {
    Term::alloc(Node::Var(idx))
}

pub fn mk_constant(name: impl Into<Name>, levels: impl IntoIterator<Item = Level>) -> Term {
    Term::alloc(Node::Constant(name.into(), levels.into_iter().collect()))
}

pub fn mk_sort(level: Level) -> Term {
    Term::alloc(Node::Sort(level))
}

/// `Sort 0`.
pub fn mk_bool() -> Term {
    mk_sort(Level::zero())
}

/// `Sort 1`.
pub fn mk_type() -> Term {
    mk_sort(Level::one())
}

pub fn mk_mlocal(is_meta: bool, name: impl Into<Name>, ty: Term) -> Term {
    Term::alloc(Node::MLocal {
        meta: is_meta,
        name: name.into(),
        ty,
    })
}

pub fn mk_metavar(name: impl Into<Name>, ty: Term) -> Term {
    mk_mlocal(true, name, ty)
}

pub fn mk_local(name: impl Into<Name>, ty: Term) -> Term {
    mk_mlocal(false, name, ty)
}

/// Wraps a macro payload. The payload is shared, not copied.
pub fn mk_macro(payload: Rc<dyn MacroPayload>) -> Term {
    Term::alloc(Node::Macro(payload))
}

pub fn mk_pair(first: Term, second: Term, ty: Term) -> Term {
    Term::alloc(Node::Pair { first, second, ty })
}

/// `fst e` when `first` is set, `snd e` otherwise.
pub fn mk_proj(first: bool, arg: Term) -> Term {
    Term::alloc(Node::Proj { first, arg })
}

pub fn mk_fst(arg: Term) -> Term {
    mk_proj(true, arg)
}

pub fn mk_snd(arg: Term) -> Term {
    mk_proj(false, arg)
}

pub fn mk_app(fun: Term, arg: Term) -> Term {
    Term::alloc(Node::App { fun, arg })
}

/// Left-nested application `((fun a1) a2) ... an`. Needs at least one
/// argument.
pub fn mk_app_n(fun: Term, args: impl IntoIterator<Item = Term>) -> Term {
    let mut args = args.into_iter().peekable();
    check::require(args.peek().is_some(), || InvariantViolation::EmptyApplication);
    args.fold(fun, mk_app)
}

/// Builds a `Lambda`, `Pi` or `Sigma` cell.
pub fn mk_binder(kind: TermKind, name: impl Into<Name>, domain: Term, body: Term) -> Term {
    check::require(kind.is_binder(), || InvariantViolation::NotABinder { found: kind });
    Term::alloc(Node::Binder {
        kind,
        name: name.into(),
        domain,
        body,
    })
}

pub fn mk_lambda(name: impl Into<Name>, domain: Term, body: Term) -> Term {
    mk_binder(TermKind::Lambda, name, domain, body)
}

pub fn mk_pi(name: impl Into<Name>, domain: Term, body: Term) -> Term {
    mk_binder(TermKind::Pi, name, domain, body)
}

pub fn mk_sigma(name: impl Into<Name>, domain: Term, body: Term) -> Term {
    mk_binder(TermKind::Sigma, name, domain, body)
}

/// Name given to the bound variable of [`mk_arrow`] and
/// [`mk_cartesian_product`].
pub const DEFAULT_VAR_NAME: &str = "a";

/// Non-dependent function type `domain -> body`.
pub fn mk_arrow(domain: Term, body: Term) -> Term {
    mk_pi(DEFAULT_VAR_NAME, domain, body)
}

pub fn mk_cartesian_product(first: Term, second: Term) -> Term {
    mk_sigma(DEFAULT_VAR_NAME, first, second)
}

pub fn mk_let(name: impl Into<Name>, ty: Term, value: Term, body: Term) -> Term {
    Term::alloc(Node::Let {
        name: name.into(),
        ty,
        value,
        body,
    })
}

fn wrong_kind(e: &Term, expected: &'static str) -> ! {
    check::violated(InvariantViolation::KindMismatch {
        expected,
        found: e.kind(),
    })
}

/// Returns `e` itself when both children are unchanged, a new application
/// otherwise. The same holds for the other `update_*` functions.
pub fn update_app(e: &Term, new_fun: Term, new_arg: Term) -> Term {
    match e.node() {
        Node::App { fun, arg } if fun.ptr_eq(&new_fun) && arg.ptr_eq(&new_arg) => e.clone(),
        Node::App { .. } => mk_app(new_fun, new_arg),
        _ => wrong_kind(e, "app"),
    }
}

pub fn update_proj(e: &Term, new_arg: Term) -> Term {
    match e.node() {
        Node::Proj { arg, .. } if arg.ptr_eq(&new_arg) => e.clone(),
        Node::Proj { first, .. } => mk_proj(*first, new_arg),
        _ => wrong_kind(e, "fst or snd"),
    }
}

pub fn update_pair(e: &Term, new_first: Term, new_second: Term, new_ty: Term) -> Term {
    match e.node() {
        Node::Pair { first, second, ty }
            if first.ptr_eq(&new_first) && second.ptr_eq(&new_second) && ty.ptr_eq(&new_ty) =>
        {
            e.clone()
        }
        Node::Pair { .. } => mk_pair(new_first, new_second, new_ty),
        _ => wrong_kind(e, "pair"),
    }
}

/// Keeps the binder kind and the cosmetic name of `e`.
pub fn update_binder(e: &Term, new_domain: Term, new_body: Term) -> Term {
    match e.node() {
        Node::Binder { domain, body, .. } if domain.ptr_eq(&new_domain) && body.ptr_eq(&new_body) => {
            e.clone()
        }
        Node::Binder { kind, name, .. } => mk_binder(*kind, name.clone(), new_domain, new_body),
        _ => wrong_kind(e, "binder"),
    }
}

pub fn update_let(e: &Term, new_ty: Term, new_value: Term, new_body: Term) -> Term {
    match e.node() {
        Node::Let { ty, value, body, .. }
            if ty.ptr_eq(&new_ty) && value.ptr_eq(&new_value) && body.ptr_eq(&new_body) =>
        {
            e.clone()
        }
        Node::Let { name, .. } => mk_let(name.clone(), new_ty, new_value, new_body),
        _ => wrong_kind(e, "let"),
    }
}

pub fn update_mlocal(e: &Term, new_ty: Term) -> Term {
    match e.node() {
        Node::MLocal { ty, .. } if ty.ptr_eq(&new_ty) => e.clone(),
        Node::MLocal { meta, name, .. } => mk_mlocal(*meta, name.clone(), new_ty),
        _ => wrong_kind(e, "meta or local"),
    }
}

/// Implements the standard [`Debug`] formatter for [`Term`].
///
/// Leaf terms print their payload. Composite terms print their kind and
/// cached metadata only, so `{:?}` stays cheap on very large terms; use
/// [`fmt::Display`] for the full structure.
impl fmt::Debug for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.node() {
            Node::Var(idx) => f.debug_tuple("Var").field(idx).finish(),
            Node::Constant(name, levels) => f.debug_tuple("Constant").field(name).field(levels).finish(),
            Node::Sort(level) => f.debug_tuple("Sort").field(level).finish(),
            Node::Macro(payload) => f.debug_tuple("Macro").field(&payload.name()).finish(),
            Node::MLocal { name, .. } => f
                .debug_struct(if self.is_metavar() { "Meta" } else { "Local" })
                .field("name", name)
                .field("hash", &self.hash())
                .finish(),
            _ => f
                .debug_struct(self.kind_name())
                .field("hash", &self.hash())
                .field("depth", &self.depth())
                .field("refs", &self.ref_count())
                .finish(),
        }
    }
}

/// Builds a left-nested application, see [`mk_app_n`].
///
/// ```rust
/// # use kernel_terms::{app, mk_constant, mk_var};
/// let f = mk_constant("f", []);
/// let t = app!(f, mk_var(0), mk_var(1));
/// assert_eq!(t.to_string(), "(f #0 #1)");
/// ```
#[macro_export]
macro_rules! app {
    ($fun:expr, $($arg:expr),+ $(,)?) => {
        $crate::mk_app_n($fun, [$($arg),+])
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nat() -> Term {
        mk_constant("nat", [])
    }

    #[test]
    fn kinds_and_tags_agree() {
        for tag in 0..=13u8 {
            let kind = TermKind::from_u8(tag).unwrap();
            assert_eq!(kind as u8, tag);
        }
        assert!(TermKind::from_u8(14).is_none());
        assert!(TermKind::Pi.is_binder());
        assert!(!TermKind::Let.is_binder());
    }

    #[test]
    fn leaf_metadata() {
        let v = mk_var(4);
        assert_eq!(v.kind(), TermKind::Var);
        assert_eq!(v.hash(), 4);
        assert_eq!(v.depth(), 1);
        assert!(!v.has_metavar() && !v.has_local());

        let c = mk_constant("f", [Level::meta(0)]);
        assert!(c.has_metavar());
        assert_eq!(c.depth(), 1);

        let s = mk_sort(Level::param(2));
        assert!(!s.has_metavar());
        assert_eq!(s.hash(), Level::param(2).hash());
    }

    #[test]
    fn mlocal_flags() {
        let m = mk_metavar("m", nat());
        assert!(m.has_metavar());
        assert!(!m.has_local());
        assert_eq!(m.depth(), 1);

        let x = mk_local("x", m.clone());
        assert!(x.has_local());
        assert!(x.has_metavar());

        let y = mk_metavar("y", x);
        assert!(y.has_local());
        assert_eq!(y.kind(), TermKind::Meta);
    }

    #[test]
    fn composite_depth_and_flags() {
        let m = mk_metavar("m", nat());
        let x = mk_local("x", nat());
        let a = mk_app(m.clone(), mk_var(0));
        assert_eq!(a.depth(), 2);
        assert!(a.has_metavar());
        assert!(!a.has_local());

        let b = mk_app(a.clone(), x.clone());
        assert_eq!(b.depth(), 3);
        assert!(b.has_metavar() && b.has_local());

        let p = mk_pair(mk_var(0), mk_var(1), b.clone());
        assert_eq!(p.depth(), 4);
        assert!(p.has_local());

        let l = mk_let("z", nat(), mk_var(0), a);
        assert_eq!(l.depth(), 3);
        assert_eq!(mk_fst(p.clone()).depth(), 5);
        assert_eq!(mk_snd(p).kind(), TermKind::Snd);
    }

    #[test]
    fn hash_ignores_cosmetic_names() {
        let a = mk_lambda("x", nat(), mk_var(0));
        let b = mk_lambda("y", nat(), mk_var(0));
        assert_eq!(a.hash(), b.hash());
        let c = mk_pi("x", nat(), mk_var(0));
        assert_eq!(a.hash(), c.hash());
        assert_ne!(a.kind(), c.kind());
    }

    #[test]
    fn auxiliary_constructors() {
        let t = app!(nat(), mk_var(0), mk_var(1), mk_var(2));
        assert_eq!(t.try_app_arg().unwrap().try_var_idx().unwrap(), 2);
        assert_eq!(t.depth(), 4);
        let arrow = mk_arrow(nat(), nat());
        assert!(arrow.is_pi());
        assert_eq!(arrow.try_binder_name().unwrap(), &Name::new("a"));
        assert!(mk_cartesian_product(nat(), nat()).is_sigma());
        assert_eq!(mk_bool().try_sort_level().unwrap(), &Level::zero());
        assert_eq!(mk_type().try_sort_level().unwrap(), &Level::one());
        assert_eq!(Term::default().try_var_idx().unwrap(), 0);
    }

    #[test]
    fn checked_accessors_report_kind() {
        let v = mk_var(1);
        let err = v.try_app_fn().unwrap_err();
        assert!(matches!(
            err,
            TermError::UnexpectedKind {
                expected: "app",
                found: "var"
            }
        ));
        assert!(nat().try_const_levels().unwrap().is_empty());
    }

    #[test]
    fn update_preserves_identity() {
        let f = nat();
        let a = mk_var(0);
        let e = mk_app(f.clone(), a.clone());
        let same = update_app(&e, f.clone(), a.clone());
        assert!(same.ptr_eq(&e));
        let other = update_app(&e, f, mk_var(0));
        assert!(!other.ptr_eq(&e));
        assert!(other.is_app());

        let b = mk_sigma("p", nat(), mk_var(0));
        let dom = b.try_binder_domain().unwrap().clone();
        let rebuilt = update_binder(&b, dom, mk_var(1));
        assert!(rebuilt.is_sigma());
        assert_eq!(rebuilt.try_binder_name().unwrap(), &Name::new("p"));

        let m = mk_metavar("m", nat());
        let ty = m.try_mlocal_type().unwrap().clone();
        assert!(update_mlocal(&m, ty).ptr_eq(&m));
    }

    #[test]
    fn sharing_and_refcounts() {
        let x = mk_var(7);
        assert!(!x.is_shared());
        let y = x.clone();
        assert!(x.ptr_eq(&y));
        assert_eq!(x.ref_count(), 2);
        let z = x.shallow_copy();
        assert!(!z.ptr_eq(&x));
        assert_eq!(z.try_var_idx().unwrap(), 7);
        assert!(x.is_atomic());
        assert!(!mk_app(x, y).is_atomic());
    }

    #[test]
    #[cfg(any(debug_assertions, feature = "checked"))]
    #[should_panic(expected = "invariant violation")]
    fn binder_kind_is_checked() {
        let _ = mk_binder(TermKind::App, "x", nat(), nat());
    }
}
