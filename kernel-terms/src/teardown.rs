//! Iterative reclamation of term cells.
//!
//! Dropping the last handle to a deep term must not recurse once per
//! level. [`Term`]'s `Drop` detaches the children of each dying cell and
//! pushes the ones that die with it onto a heap-allocated work-list, so
//! the call stack stays flat whatever the shape of the term.

use crate::term::{Node, TermCell};
use crate::Term;
use std::cell::Cell;
use std::mem::{self, ManuallyDrop};
use std::rc::Rc;

thread_local! {
    static LIVE_CELLS: Cell<usize> = const { Cell::new(0) };
}

/// Number of term cells currently allocated on this thread.
///
/// Cells leaked by an aborted teardown (see [`Term`]'s `Drop`) remain
/// counted.
pub fn live_cells() -> usize {
    LIVE_CELLS.try_with(Cell::get).unwrap_or(0)
}

#[inline]
pub(crate) fn note_alloc() {
    let _ = LIVE_CELLS.try_with(|c| c.set(c.get() + 1));
}

#[inline]
fn note_free() {
    let _ = LIVE_CELLS.try_with(|c| c.set(c.get().saturating_sub(1)));
}

impl Term {
    /// Gives up the handle without decrementing the reference count.
    #[inline]
    fn into_rc(self) -> Rc<TermCell> {
        let mut this = ManuallyDrop::new(self);
        // SAFETY: `this` is never used or dropped again.
        unsafe { ManuallyDrop::take(&mut this.0) }
    }
}

impl TermCell {
    /// Consumes the cell, returning its term children. Names, levels and
    /// macro payloads are released here; a payload shared with other
    /// macro cells only loses one reference.
    fn into_children(self) -> [Option<Term>; 3] {
        let TermCell { node, .. } = self;
        match node {
            Node::Var(_) | Node::Constant(..) | Node::Sort(_) | Node::Macro(_) => [None, None, None],
            Node::MLocal { ty, .. } => [Some(ty), None, None],
            Node::Pair { first, second, ty } => [Some(first), Some(second), Some(ty)],
            Node::Proj { arg, .. } => [Some(arg), None, None],
            Node::App { fun, arg } => [Some(fun), Some(arg), None],
            Node::Binder { domain, body, .. } => [Some(domain), Some(body), None],
            Node::Let { ty, value, body, .. } => [Some(ty), Some(value), Some(body)],
        }
    }
}

impl Drop for Term {
    fn drop(&mut self) {
        // SAFETY: `self.0` is not touched again after this point.
        let rc = unsafe { ManuallyDrop::take(&mut self.0) };
        let Ok(mut cell) = Rc::try_unwrap(rc) else {
            return;
        };
        let mut todo: Vec<Rc<TermCell>> = Vec::new();
        loop {
            note_free();
            let children = cell.into_children();
            if todo.try_reserve(children.len()).is_err() {
                log::warn!(
                    "term teardown: cannot grow work-list past {} entries, leaking the rest",
                    todo.len()
                );
                for child in children.into_iter().flatten() {
                    mem::forget(child.into_rc());
                }
                mem::forget(todo);
                return;
            }
            for child in children.into_iter().flatten() {
                let rc = child.into_rc();
                if Rc::strong_count(&rc) == 1 {
                    todo.push(rc);
                }
                // otherwise dropping `rc` only decrements the count
            }
            cell = loop {
                match todo.pop() {
                    None => return,
                    Some(rc) => {
                        if let Ok(cell) = Rc::try_unwrap(rc) {
                            break cell;
                        }
                    }
                }
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{mk_app, mk_lambda, mk_let, mk_var};

    #[test]
    fn counts_follow_allocation() {
        let base = live_cells();
        let x = mk_var(0);
        let y = mk_app(x.clone(), x.clone());
        assert_eq!(live_cells(), base + 2);
        drop(x);
        assert_eq!(live_cells(), base + 2);
        drop(y);
        assert_eq!(live_cells(), base);
    }

    #[test]
    fn shared_children_survive() {
        let base = live_cells();
        let shared = mk_lambda("x", mk_var(0), mk_var(1));
        let a = mk_app(shared.clone(), mk_var(2));
        let b = mk_let("y", mk_var(3), shared.clone(), a.clone());
        drop(a);
        drop(shared);
        // the lambda is still reachable from `b`
        assert_eq!(b.try_let_value().unwrap().depth(), 2);
        drop(b);
        assert_eq!(live_cells(), base);
    }

    #[test]
    fn deep_left_spine() {
        let base = live_cells();
        let mut t = mk_var(0);
        for i in 0..200_000 {
            t = mk_app(t, mk_var(i));
        }
        assert_eq!(t.depth(), 200_001);
        drop(t);
        assert_eq!(live_cells(), base);
    }
}
