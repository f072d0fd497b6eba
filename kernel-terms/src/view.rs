//! Defines [`View`], a borrowed read-only representation of a [`Term`].
//!
//! A view exposes one cell's payload as a plain enum that callers can
//! `match` on, without allocating and without access to the cell layout.

use crate::term::Node;
use crate::{Level, MacroPayload, Name, Term, TermKind};
use core::fmt;

/// A borrowed view into one cell of a [`Term`].
///
/// Use [`Term::view`] to obtain a view. Child terms are returned as
/// borrowed handles; clone them to keep them beyond the lifetime of the
/// parent.
#[derive(Clone, Copy)]
pub enum View<'a> {
    /// A de Bruijn variable.
    Var(u32),
    /// A global constant with its universe level arguments.
    Constant(&'a Name, &'a [Level]),
    Sort(&'a Level),
    /// A metavariable: name and type.
    Meta(&'a Name, &'a Term),
    /// A free local: name and type.
    Local(&'a Name, &'a Term),
    Macro(&'a dyn MacroPayload),
    /// First component, second component and the pair's type.
    Pair(&'a Term, &'a Term, &'a Term),
    Fst(&'a Term),
    Snd(&'a Term),
    /// Function and argument.
    App(&'a Term, &'a Term),
    /// Binder name, domain and body.
    Lambda(&'a Name, &'a Term, &'a Term),
    Pi(&'a Name, &'a Term, &'a Term),
    Sigma(&'a Name, &'a Term, &'a Term),
    /// Binder name, type, value and body.
    Let(&'a Name, &'a Term, &'a Term, &'a Term),
}

impl Term {
    /// Produce a [`View`] of this term's top cell.
    #[inline]
    pub fn view(&self) -> View<'_> {
        match self.node() {
            Node::Var(idx) => View::Var(*idx),
            Node::Constant(name, levels) => View::Constant(name, levels),
            Node::Sort(level) => View::Sort(level),
            Node::MLocal { meta: true, name, ty } => View::Meta(name, ty),
            Node::MLocal { meta: false, name, ty } => View::Local(name, ty),
            Node::Macro(payload) => View::Macro(&**payload),
            Node::Pair { first, second, ty } => View::Pair(first, second, ty),
            Node::Proj { first: true, arg } => View::Fst(arg),
            Node::Proj { first: false, arg } => View::Snd(arg),
            Node::App { fun, arg } => View::App(fun, arg),
            Node::Binder { kind, name, domain, body } => match kind {
                TermKind::Lambda => View::Lambda(name, domain, body),
                TermKind::Pi => View::Pi(name, domain, body),
                _ => View::Sigma(name, domain, body),
            },
            Node::Let { name, ty, value, body } => View::Let(name, ty, value, body),
        }
    }
}

impl View<'_> {
    pub fn kind(&self) -> TermKind {
        match self {
            View::Var(_) => TermKind::Var,
            View::Constant(..) => TermKind::Constant,
            View::Sort(_) => TermKind::Sort,
            View::Meta(..) => TermKind::Meta,
            View::Local(..) => TermKind::Local,
            View::Macro(_) => TermKind::Macro,
            View::Pair(..) => TermKind::Pair,
            View::Fst(_) => TermKind::Fst,
            View::Snd(_) => TermKind::Snd,
            View::App(..) => TermKind::App,
            View::Lambda(..) => TermKind::Lambda,
            View::Pi(..) => TermKind::Pi,
            View::Sigma(..) => TermKind::Sigma,
            View::Let(..) => TermKind::Let,
        }
    }
}

impl fmt::Debug for View<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            View::Var(i) => f.debug_tuple("Var").field(i).finish(),
            View::Constant(n, ls) => f.debug_tuple("Constant").field(n).field(ls).finish(),
            View::Sort(l) => f.debug_tuple("Sort").field(l).finish(),
            View::Meta(n, t) => f.debug_tuple("Meta").field(n).field(t).finish(),
            View::Local(n, t) => f.debug_tuple("Local").field(n).field(t).finish(),
            View::Macro(p) => f.debug_tuple("Macro").field(&p.name()).finish(),
            View::Pair(a, b, t) => f.debug_tuple("Pair").field(a).field(b).field(t).finish(),
            View::Fst(e) => f.debug_tuple("Fst").field(e).finish(),
            View::Snd(e) => f.debug_tuple("Snd").field(e).finish(),
            View::App(g, a) => f.debug_tuple("App").field(g).field(a).finish(),
            View::Lambda(n, d, b) => f.debug_tuple("Lambda").field(n).field(d).field(b).finish(),
            View::Pi(n, d, b) => f.debug_tuple("Pi").field(n).field(d).field(b).finish(),
            View::Sigma(n, d, b) => f.debug_tuple("Sigma").field(n).field(d).field(b).finish(),
            View::Let(n, t, v, b) => f
                .debug_tuple("Let")
                .field(n)
                .field(t)
                .field(v)
                .field(b)
                .finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::tests::IntLit;
    use crate::{mk_app, mk_constant, mk_fst, mk_let, mk_local, mk_macro, mk_pair, mk_sigma, mk_var};
    use std::rc::Rc;

    #[test]
    fn view_matches_kind() {
        let nat = mk_constant("nat", [Level::param(0)]);
        let terms = [
            mk_var(3),
            nat.clone(),
            mk_local("x", nat.clone()),
            mk_app(nat.clone(), mk_var(0)),
            mk_sigma("p", nat.clone(), mk_var(0)),
            mk_fst(mk_pair(mk_var(0), mk_var(1), nat.clone())),
            mk_let("y", nat.clone(), mk_var(0), mk_var(0)),
            mk_macro(Rc::new(IntLit(2))),
        ];
        for t in &terms {
            assert_eq!(t.view().kind(), t.kind());
        }
    }

    #[test]
    fn view_borrows_children() {
        let nat = mk_constant("nat", []);
        let t = mk_app(nat.clone(), mk_var(5));
        match t.view() {
            View::App(f, a) => {
                assert!(f.ptr_eq(&nat));
                assert!(matches!(a.view(), View::Var(5)));
            }
            v => panic!("unexpected view {v:?}"),
        }
        match mk_constant("list", [Level::one()]).view() {
            View::Constant(name, levels) => {
                assert_eq!(name.to_string(), "list");
                assert_eq!(levels, &[Level::one()]);
            }
            v => panic!("unexpected view {v:?}"),
        }
        let lit = mk_macro(Rc::new(IntLit(9)));
        match lit.view() {
            View::Macro(p) => assert_eq!(p.downcast_ref::<IntLit>(), Some(&IntLit(9))),
            v => panic!("unexpected view {v:?}"),
        }
    }
}
