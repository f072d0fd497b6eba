//! Internal consistency checks.
//!
//! Checks run when `debug_assertions` are on or the `checked` feature is
//! enabled. A failed check reports through the installed hook and then
//! panics. In other builds the preconditions are the caller's to uphold.

use crate::hash::mix;
use crate::term::{hash_levels, Node, TermCell, HAS_LOCAL, HAS_METAVAR};
use crate::{has_free_var, Level, Term, TermKind};
use core::fmt;
use std::collections::HashMap;
use std::sync::RwLock;

/// Whether construction preconditions are checked in this build.
pub const CHECKS_ENABLED: bool = cfg!(any(debug_assertions, feature = "checked"));

/// A broken internal invariant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvariantViolation {
    /// A binder constructor was given a non-binder kind.
    NotABinder { found: TermKind },
    /// An application spine was built with no arguments.
    EmptyApplication,
    /// An `update_*` function was applied to a term of the wrong kind.
    KindMismatch { expected: &'static str, found: TermKind },
    /// A cached field disagrees with a fresh recomputation.
    StaleMetadata { kind: TermKind, field: &'static str },
}

impl fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotABinder { found } => write!(f, "binder built with kind {}", found.name()),
            Self::EmptyApplication => f.write_str("application spine without arguments"),
            Self::KindMismatch { expected, found } => {
                write!(f, "expected {expected}, found {}", found.name())
            }
            Self::StaleMetadata { kind, field } => {
                write!(f, "cached {field} of a {} cell is stale", kind.name())
            }
        }
    }
}

fn log_violation(v: &InvariantViolation) {
    log::error!("invariant violation: {v}");
}

static HOOK: RwLock<fn(&InvariantViolation)> = RwLock::new(log_violation);

/// Installs the diagnostic hook called before a failed check panics and
/// returns the previous one. The default hook logs at `error` level.
pub fn set_invariant_hook(hook: fn(&InvariantViolation)) -> fn(&InvariantViolation) {
    let mut slot = HOOK.write().unwrap_or_else(|e| e.into_inner());
    std::mem::replace(&mut *slot, hook)
}

/// Reports `v` and aborts the current operation.
#[cold]
pub(crate) fn violated(v: InvariantViolation) -> ! {
    let hook = *HOOK.read().unwrap_or_else(|e| e.into_inner());
    hook(&v);
    panic!("invariant violation: {v}")
}

#[inline]
pub(crate) fn require(cond: bool, v: impl FnOnce() -> InvariantViolation) {
    if CHECKS_ENABLED && !cond {
        violated(v())
    }
}

#[derive(Clone, Copy)]
struct Recomputed {
    hash: u32,
    depth: u32,
    flags: u8,
}

impl Term {
    /// Recomputes hash, depth, closedness flags and any memoized arrow
    /// flag for every cell reachable from `self` and compares them with
    /// the cached values.
    pub fn check_metadata(&self) -> Result<(), InvariantViolation> {
        let mut done: HashMap<*const TermCell, Recomputed> = HashMap::new();
        let mut stack: Vec<(&Term, bool)> = vec![(self, false)];
        while let Some((t, expanded)) = stack.pop() {
            if done.contains_key(&t.as_ptr()) {
                continue;
            }
            if !expanded {
                stack.push((t, true));
                stack.extend(t.children().map(|c| (c, false)));
                continue;
            }
            let kids: Vec<Recomputed> = t.children().map(|c| done[&c.as_ptr()]).collect();
            let child_flags = kids.iter().fold(0, |f, r| f | r.flags);
            let (hash, own_flags, leaf) = match t.node() {
                Node::Var(idx) => (*idx, 0, true),
                Node::Constant(name, levels) => {
                    let meta = levels.iter().any(Level::has_meta);
                    (mix(name.hash(), hash_levels(levels)), if meta { HAS_METAVAR } else { 0 }, true)
                }
                Node::Sort(level) => (level.hash(), if level.has_meta() { HAS_METAVAR } else { 0 }, true),
                Node::MLocal { meta, name, .. } => {
                    (name.hash(), if *meta { HAS_METAVAR } else { HAS_LOCAL }, true)
                }
                Node::Macro(payload) => (payload.hash(), 0, true),
                Node::Proj { .. } => (mix(17, kids[0].hash), 0, false),
                Node::Pair { .. } | Node::App { .. } | Node::Binder { .. } => {
                    (mix(kids[0].hash, kids[1].hash), 0, false)
                }
                Node::Let { .. } => (mix(kids[1].hash, kids[2].hash), 0, false),
            };
            let depth = if leaf {
                1
            } else {
                kids.iter().map(|r| r.depth).max().unwrap_or(0) + 1
            };
            let flags = own_flags | child_flags;

            let stale = |field| InvariantViolation::StaleMetadata { kind: t.kind(), field };
            if hash != t.hash() {
                return Err(stale("hash"));
            }
            if depth != t.depth() {
                return Err(stale("depth"));
            }
            if flags & HAS_METAVAR != t.flags() & HAS_METAVAR {
                return Err(stale("has_metavar"));
            }
            if flags & HAS_LOCAL != t.flags() & HAS_LOCAL {
                return Err(stale("has_local"));
            }
            if let Some(cached) = t.arrow_cache() {
                let arrow = match t.node() {
                    Node::Binder { kind: TermKind::Pi, body, .. } => !has_free_var(body, 0),
                    _ => false,
                };
                if cached != arrow {
                    return Err(stale("arrow"));
                }
            }
            done.insert(t.as_ptr(), Recomputed { hash, depth, flags });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{is_arrow, mk_app, mk_constant, mk_let, mk_local, mk_metavar, mk_pi, mk_var, Level};

    #[test]
    fn fresh_terms_are_consistent() {
        let nat = mk_constant("nat", [Level::meta(1)]);
        let m = mk_metavar("m", nat.clone());
        let x = mk_local("x", m.clone());
        let pi = mk_pi("y", nat.clone(), mk_app(x.clone(), mk_var(0)));
        assert!(!is_arrow(&pi));
        let t = mk_let("z", nat, pi.clone(), mk_app(pi, x));
        assert_eq!(t.check_metadata(), Ok(()));
    }

    #[test]
    fn violation_messages() {
        let v = InvariantViolation::NotABinder { found: TermKind::App };
        assert_eq!(v.to_string(), "binder built with kind app");
        let v = InvariantViolation::StaleMetadata {
            kind: TermKind::Pi,
            field: "arrow",
        };
        assert_eq!(v.to_string(), "cached arrow of a pi cell is stale");
    }

    #[test]
    #[cfg(any(debug_assertions, feature = "checked"))]
    #[should_panic(expected = "application spine without arguments")]
    fn empty_spine_panics() {
        let _ = crate::mk_app_n(mk_var(0), []);
    }
}
