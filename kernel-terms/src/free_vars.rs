//! Loose bound variable queries, and the memoized arrow test built on them.
//!
//! A de Bruijn variable `#j` seen under `k` binders is *loose* when
//! `j >= k`; it then refers to index `j - k` of the enclosing context.
//! All walks here use an explicit stack and skip shared cells already
//! visited at the same binder depth.

use crate::term::Node;
use crate::{Term, TermKind};
use std::collections::HashSet;

/// Visits every loose variable of `e` (as an index into the enclosing
/// context) until `visit` returns `true`. Returns whether it stopped early.
fn scan_loose(e: &Term, mut visit: impl FnMut(u32) -> bool) -> bool {
    // binder depth can exceed any variable index, so it is kept wider
    let mut seen: HashSet<(*const crate::term::TermCell, u64)> = HashSet::new();
    let mut stack: Vec<(&Term, u64)> = vec![(e, 0)];
    while let Some((t, offset)) = stack.pop() {
        if t.is_shared() && !seen.insert((t.as_ptr(), offset)) {
            continue;
        }
        match t.node() {
            Node::Var(idx) => {
                let idx = u64::from(*idx);
                // `idx - offset` is at most `idx`, so it fits in a u32
                if idx >= offset && visit((idx - offset) as u32) {
                    return true;
                }
            }
            Node::Constant(..) | Node::Sort(_) | Node::Macro(_) => {}
            Node::Binder { domain, body, .. } => {
                stack.push((body, offset + 1));
                stack.push((domain, offset));
            }
            Node::Let { ty, value, body, .. } => {
                stack.push((body, offset + 1));
                stack.push((value, offset));
                stack.push((ty, offset));
            }
            _ => stack.extend(t.children().rev().map(|c| (c, offset))),
        }
    }
    false
}

/// Returns `true` if the loose variable with index `i` occurs in `e`.
pub fn has_free_var(e: &Term, i: u32) -> bool {
    scan_loose(e, |j| j == i)
}

/// Returns `true` if `e` has any loose variable.
pub fn has_free_vars(e: &Term) -> bool {
    scan_loose(e, |_| true)
}

/// Returns `true` if `e` has no loose variable.
#[inline]
pub fn is_closed(e: &Term) -> bool {
    !has_free_vars(e)
}

/// The smallest `r` such that every loose variable of `e` is below `r`.
///
/// Wider than a variable index: `#4294967295` has range `2^32`.
pub fn free_var_range(e: &Term) -> u64 {
    let mut range = 0;
    scan_loose(e, |j| {
        range = range.max(u64::from(j) + 1);
        false
    });
    range
}

/// Returns `true` if `t` is a `Pi` whose body does not use the bound
/// variable, i.e. a plain function type `A -> B`.
///
/// The answer is memoized in the cell on first query. This is the only
/// mutation a cell ever sees after construction.
pub fn is_arrow(t: &Term) -> bool {
    if let Some(flag) = t.arrow_cache() {
        return flag;
    }
    let flag = match t.node() {
        Node::Binder {
            kind: TermKind::Pi,
            body,
            ..
        } => !has_free_var(body, 0),
        _ => false,
    };
    t.set_arrow_cache(flag);
    flag
}

/// Returns `true` if `t` is a `Sigma` whose body does not use the bound
/// variable. Not memoized.
pub fn is_cartesian(t: &Term) -> bool {
    match t.node() {
        Node::Binder {
            kind: TermKind::Sigma,
            body,
            ..
        } => !has_free_var(body, 0),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        mk_app, mk_arrow, mk_cartesian_product, mk_constant, mk_lambda, mk_let, mk_local, mk_pi,
        mk_sigma, mk_var,
    };

    fn nat() -> Term {
        mk_constant("nat", [])
    }

    #[test]
    fn loose_variables_under_binders() {
        // fun x : nat, #0 #2
        let t = mk_lambda("x", nat(), mk_app(mk_var(0), mk_var(2)));
        assert!(has_free_var(&t, 1));
        assert!(!has_free_var(&t, 0));
        assert!(!has_free_var(&t, 2));
        assert_eq!(free_var_range(&t), 2);
        assert!(has_free_vars(&t));
        assert!(is_closed(&mk_lambda("x", nat(), mk_var(0))));
    }

    #[test]
    fn let_binds_in_body_only() {
        let t = mk_let("x", mk_var(0), mk_var(1), mk_var(0));
        assert!(has_free_var(&t, 0));
        assert!(has_free_var(&t, 1));
        assert_eq!(free_var_range(&t), 2);
        let closed = mk_let("x", nat(), nat(), mk_var(0));
        assert!(is_closed(&closed));
    }

    #[test]
    fn local_types_are_scanned() {
        let x = mk_local("x", mk_var(3));
        assert!(has_free_var(&x, 3));
        assert_eq!(free_var_range(&x), 4);
    }

    #[test]
    fn shared_subterms_at_different_depths() {
        let v = mk_var(1);
        // #1 outside the binder, and #1 under it (which is loose index 0)
        let t = mk_app(v.clone(), mk_lambda("x", nat(), v));
        assert!(has_free_var(&t, 1));
        assert!(has_free_var(&t, 0));
        assert_eq!(free_var_range(&t), 2);
    }

    #[test]
    fn arrow_is_memoized() {
        let arrow = mk_arrow(nat(), nat());
        assert_eq!(arrow.arrow_cache(), None);
        assert!(is_arrow(&arrow));
        assert_eq!(arrow.arrow_cache(), Some(true));
        assert!(is_arrow(&arrow));

        let dependent = mk_pi("n", nat(), mk_app(nat(), mk_var(0)));
        assert!(!is_arrow(&dependent));
        assert!(!is_arrow(&dependent));
        assert_eq!(dependent.arrow_cache(), Some(false));

        assert!(!is_arrow(&mk_lambda("x", nat(), nat())));
        assert!(!is_arrow(&nat()));
    }

    #[test]
    fn cartesian() {
        assert!(is_cartesian(&mk_cartesian_product(nat(), nat())));
        assert!(!is_cartesian(&mk_sigma("x", nat(), mk_var(0))));
        assert!(!is_cartesian(&mk_arrow(nat(), nat())));
    }

    #[test]
    fn largest_variable_index() {
        let top = mk_var(u32::MAX);
        assert_eq!(free_var_range(&top), 1 << 32);
        assert!(has_free_var(&top, u32::MAX));
        let t = mk_lambda("x", nat(), mk_app(top, mk_var(0)));
        assert_eq!(free_var_range(&t), u64::from(u32::MAX));
        assert!(has_free_var(&t, u32::MAX - 1));
        assert!(!has_free_var(&t, u32::MAX));
    }
}
