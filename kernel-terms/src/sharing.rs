//! Maximal sharing: rewrites a term so that structurally equal subterms
//! become one cell.
//!
//! The rewrite changes representation only. Since equality ignores the
//! names of binders and `let`s, two subterms that differ only in those
//! names are merged and one of the names is kept.

use crate::hash::TermPtr;
use crate::term::Node;
use crate::{update_app, update_binder, update_let, update_mlocal, update_pair, update_proj, Term};
use indexmap::IndexSet;
use std::collections::HashMap;
use std::fmt;

/// A maximal-sharing session.
///
/// The tables persist across [`apply`](MaxSharing::apply) calls, so
/// several terms rewritten by one session share their common subterms.
/// They also keep every visited cell alive until the session is cleared
/// or dropped.
#[derive(Default)]
pub struct MaxSharing {
    /// Visited cell to its representative.
    done: HashMap<TermPtr, Term>,
    /// Representatives, keyed by structure.
    intern: IndexSet<Term>,
}

impl MaxSharing {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct cells seen so far.
    #[inline]
    pub fn len(&self) -> usize {
        self.intern.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.intern.is_empty()
    }

    /// Forgets every cell seen so far.
    pub fn clear(&mut self) {
        self.done.clear();
        self.intern.clear();
    }

    fn representative(&self, t: &Term) -> Term {
        self.done
            .get(&TermPtr(t.clone()))
            .cloned()
            .unwrap_or_else(|| t.clone())
    }

    /// Rebuilds `t` over the representatives of its children.
    fn rebuild(&self, t: &Term) -> Term {
        let r = |c: &Term| self.representative(c);
        match t.node() {
            Node::Var(_) | Node::Constant(..) | Node::Sort(_) | Node::Macro(_) => t.clone(),
            Node::MLocal { ty, .. } => update_mlocal(t, r(ty)),
            Node::Pair { first, second, ty } => update_pair(t, r(first), r(second), r(ty)),
            Node::Proj { arg, .. } => update_proj(t, r(arg)),
            Node::App { fun, arg } => update_app(t, r(fun), r(arg)),
            Node::Binder { domain, body, .. } => update_binder(t, r(domain), r(body)),
            Node::Let { ty, value, body, .. } => update_let(t, r(ty), r(value), r(body)),
        }
    }

    /// Returns a term equal to `e` in which structurally equal subterms
    /// are pointer-identical.
    pub fn apply(&mut self, e: &Term) -> Term {
        enum Frame<'a> {
            Enter(&'a Term),
            Exit(&'a Term),
        }
        let mut stack = vec![Frame::Enter(e)];
        while let Some(frame) = stack.pop() {
            match frame {
                Frame::Enter(t) => {
                    if !self.done.contains_key(&TermPtr(t.clone())) {
                        stack.push(Frame::Exit(t));
                        stack.extend(t.children().rev().map(Frame::Enter));
                    }
                }
                Frame::Exit(t) => {
                    let key = TermPtr(t.clone());
                    // entered twice before its first exit
                    if self.done.contains_key(&key) {
                        continue;
                    }
                    let rebuilt = self.rebuild(t);
                    let shared = match self.intern.get(&rebuilt) {
                        Some(found) => found.clone(),
                        None => {
                            self.intern.insert(rebuilt.clone());
                            rebuilt
                        }
                    };
                    self.done
                        .entry(TermPtr(shared.clone()))
                        .or_insert_with(|| shared.clone());
                    self.done.insert(key, shared);
                }
            }
        }
        let out = self.representative(e);
        log::trace!(
            "max sharing: {} distinct cell(s) after a term of depth {}",
            self.intern.len(),
            out.depth()
        );
        out
    }
}

impl fmt::Debug for MaxSharing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MaxSharing")
            .field("visited", &self.done.len())
            .field("distinct", &self.intern.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{mk_app, mk_constant, mk_lambda, mk_pi, mk_var};

    fn nat() -> Term {
        mk_constant("nat", [])
    }

    #[test]
    fn equal_subterms_become_identical() {
        let t = mk_app(mk_app(nat(), nat()), mk_app(nat(), nat()));
        let mut ms = MaxSharing::new();
        let s = ms.apply(&t);
        assert_eq!(s, t);
        let (f, a) = (s.try_app_fn().unwrap(), s.try_app_arg().unwrap());
        assert!(f.ptr_eq(a));
        assert!(f.try_app_fn().unwrap().ptr_eq(f.try_app_arg().unwrap()));
        // nat, (nat nat), root
        assert_eq!(ms.len(), 3);
    }

    #[test]
    fn already_shared_terms_are_kept() {
        let x = mk_app(nat(), mk_var(0));
        let t = mk_app(x.clone(), mk_var(1));
        let mut ms = MaxSharing::new();
        let s = ms.apply(&t);
        assert!(s.ptr_eq(&t));
        assert!(ms.apply(&s).ptr_eq(&s));
    }

    #[test]
    fn session_spans_terms() {
        let mut ms = MaxSharing::new();
        let a = ms.apply(&mk_app(nat(), mk_var(0)));
        let b = ms.apply(&mk_lambda("x", nat(), mk_app(nat(), mk_var(0))));
        assert!(b.try_binder_body().unwrap().ptr_eq(&a));
        ms.clear();
        assert!(ms.is_empty());
        let c = ms.apply(&mk_app(nat(), mk_var(0)));
        assert!(!c.ptr_eq(&a));
    }

    #[test]
    fn binders_differing_in_name_merge() {
        let t = mk_app(mk_pi("x", nat(), nat()), mk_pi("y", nat(), nat()));
        let s = MaxSharing::new().apply(&t);
        assert!(s.try_app_fn().unwrap().ptr_eq(s.try_app_arg().unwrap()));
    }

    #[test]
    fn deep_input() {
        let mut t = mk_var(0);
        for i in 0..100_000u32 {
            t = mk_app(t, mk_var(i % 3));
        }
        let s = MaxSharing::new().apply(&t);
        assert_eq!(s.depth(), t.depth());
    }
}
