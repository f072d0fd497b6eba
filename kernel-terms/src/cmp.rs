//! Structural equality, hashing and ordering for [`Term`].
//!
//! Equality ignores the cosmetic names of binders and `let`s but compares
//! the names of constants, metavariables and free locals. A hash mismatch
//! is used as a fast rejection only.

use crate::payload::cmp_payloads;
use crate::term::{Node, TermCell};
use crate::Term;
use std::cmp::Ordering;
use std::collections::HashSet;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

/// Iterative deep comparison of `a` and `b`.
fn term_eq(a: &Term, b: &Term) -> bool {
    let mut todo: Vec<(&Term, &Term)> = vec![(a, b)];
    let mut visited: HashSet<(*const TermCell, *const TermCell)> = HashSet::new();
    while let Some((a, b)) = todo.pop() {
        if a.ptr_eq(b) {
            continue;
        }
        if a.hash() != b.hash() || a.kind() != b.kind() {
            return false;
        }
        if a.is_shared() && b.is_shared() && !visited.insert((a.as_ptr(), b.as_ptr())) {
            continue;
        }
        match (a.node(), b.node()) {
            (Node::Var(i), Node::Var(j)) => {
                if i != j {
                    return false;
                }
            }
            (Node::Constant(n1, ls1), Node::Constant(n2, ls2)) => {
                if n1 != n2 || ls1 != ls2 {
                    return false;
                }
            }
            (Node::Sort(l1), Node::Sort(l2)) => {
                if l1 != l2 {
                    return false;
                }
            }
            (Node::MLocal { name: n1, ty: t1, .. }, Node::MLocal { name: n2, ty: t2, .. }) => {
                if n1 != n2 {
                    return false;
                }
                todo.push((t1, t2));
            }
            (Node::Macro(p1), Node::Macro(p2)) => {
                if !Rc::ptr_eq(p1, p2) && !p1.eq_payload(&**p2) {
                    return false;
                }
            }
            (
                Node::Pair { first: f1, second: s1, ty: t1 },
                Node::Pair { first: f2, second: s2, ty: t2 },
            ) => {
                todo.push((t1, t2));
                todo.push((s1, s2));
                todo.push((f1, f2));
            }
            (Node::Proj { arg: e1, .. }, Node::Proj { arg: e2, .. }) => todo.push((e1, e2)),
            (Node::App { fun: f1, arg: a1 }, Node::App { fun: f2, arg: a2 }) => {
                todo.push((a1, a2));
                todo.push((f1, f2));
            }
            (
                Node::Binder { domain: d1, body: b1, .. },
                Node::Binder { domain: d2, body: b2, .. },
            ) => {
                todo.push((b1, b2));
                todo.push((d1, d2));
            }
            (
                Node::Let { ty: t1, value: v1, body: b1, .. },
                Node::Let { ty: t2, value: v2, body: b2, .. },
            ) => {
                todo.push((b1, b2));
                todo.push((v1, v2));
                todo.push((t1, t2));
            }
            _ => return false,
        }
    }
    true
}

impl PartialEq for Term {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        term_eq(self, other)
    }
}

impl Eq for Term {}

/// Feeds the cached structural hash, so equal terms hash alike.
impl Hash for Term {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u32(Term::hash(self));
    }
}

/// Lexicographic order on level lists, shorter prefix first.
fn cmp_levels(a: &[crate::Level], b: &[crate::Level]) -> Ordering {
    for (x, y) in a.iter().zip(b) {
        if x != y {
            return x.cmp(y);
        }
    }
    a.len().cmp(&b.len())
}

/// Total order on terms except for macro payloads, which may be
/// unordered. Depth first, then kind, then (optionally) hash, then
/// structure. Each step descends into the first child pair that differs,
/// so the walk follows a single path.
pub(crate) fn term_cmp(a: &Term, b: &Term, use_hash: bool) -> Option<Ordering> {
    let (mut a, mut b) = (a, b);
    loop {
        if a.ptr_eq(b) {
            return Some(Ordering::Equal);
        }
        let ord = a.depth().cmp(&b.depth()).then_with(|| a.kind().cmp(&b.kind()));
        if ord != Ordering::Equal {
            return Some(ord);
        }
        if use_hash && a.hash() != b.hash() {
            return Some(a.hash().cmp(&b.hash()));
        }
        if a == b {
            return Some(Ordering::Equal);
        }
        let next = match (a.node(), b.node()) {
            (Node::Var(i), Node::Var(j)) => return Some(i.cmp(j)),
            (Node::Constant(n1, ls1), Node::Constant(n2, ls2)) => {
                return Some(n1.cmp(n2).then_with(|| cmp_levels(ls1, ls2)));
            }
            (Node::Sort(l1), Node::Sort(l2)) => return Some(l1.cmp(l2)),
            (Node::Macro(p1), Node::Macro(p2)) => {
                // unequal payloads must not compare as Equal
                return cmp_payloads(&**p1, &**p2).filter(|o| *o != Ordering::Equal);
            }
            (Node::MLocal { name: n1, ty: t1, .. }, Node::MLocal { name: n2, ty: t2, .. }) => {
                if n1 != n2 {
                    return Some(n1.cmp(n2));
                }
                (t1, t2)
            }
            (Node::App { fun: f1, arg: a1 }, Node::App { fun: f2, arg: a2 }) => {
                if f1 != f2 { (f1, f2) } else { (a1, a2) }
            }
            (
                Node::Pair { first: f1, second: s1, ty: t1 },
                Node::Pair { first: f2, second: s2, ty: t2 },
            ) => {
                if f1 != f2 {
                    (f1, f2)
                } else if s1 != s2 {
                    (s1, s2)
                } else {
                    (t1, t2)
                }
            }
            (Node::Proj { arg: e1, .. }, Node::Proj { arg: e2, .. }) => (e1, e2),
            (
                Node::Binder { domain: d1, body: b1, .. },
                Node::Binder { domain: d2, body: b2, .. },
            ) => {
                if d1 != d2 { (d1, d2) } else { (b1, b2) }
            }
            (
                Node::Let { ty: t1, value: v1, body: b1, .. },
                Node::Let { ty: t2, value: v2, body: b2, .. },
            ) => {
                if t1 != t2 {
                    (t1, t2)
                } else if v1 != v2 {
                    (v1, v2)
                } else {
                    (b1, b2)
                }
            }
            // kinds are equal here, so payload shapes match
            _ => return None,
        };
        (a, b) = next;
    }
}

impl Term {
    /// Strict order used to sort terms. `use_hash` compares hashes before
    /// structure, which is faster but not stable across payload changes.
    ///
    /// Returns `false` when the two terms are equal or unordered.
    pub fn is_lt(a: &Term, b: &Term, use_hash: bool) -> bool {
        term_cmp(a, b, use_hash) == Some(Ordering::Less)
    }
}

/// Partial order consistent with `==`: the order of [`Term::is_lt`]
/// without the hash step, so it does not depend on payload hashes.
///
/// `None` only when the comparison reaches two macro payloads that cannot
/// be ordered: different concrete types with the same name, or a type
/// without a tie-break.
impl PartialOrd for Term {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        term_cmp(self, other, false)
    }
}
