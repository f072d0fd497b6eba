//! Defines [`TermDisplay`], a formatter for rendering [`Term`] values.
//!
//! The output is a fully parenthesized, s-expression-like syntax:
//!
//! | term                 | rendering                  |
//! |----------------------|----------------------------|
//! | variable             | `#3`                       |
//! | constant             | `nat`, `list.{u}`          |
//! | sort                 | `(Sort 1)`                 |
//! | metavariable, local  | `?m`, `x`                  |
//! | application spine    | `(f a b)`                  |
//! | pair, projections    | `(pair a b : T)`, `(fst p)` |
//! | binders              | `(fun x : A, b)`, `(Pi x : A, B)`, `(Sigma x : A, B)` |
//! | let                  | `(let x : T := v in b)`    |
//!
//! Rendering never recurses, so arbitrarily deep terms can be printed.

use crate::payload::PayloadDisplay;
use crate::term::Node;
use crate::{Name, Term, TermKind};
use std::fmt;

/// A wrapper that renders a [`Term`] through [`fmt::Display`].
///
/// ### Example
/// ```rust
/// use kernel_terms::{mk_arrow, mk_constant};
/// let nat = mk_constant("nat", []);
/// let t = mk_arrow(nat.clone(), nat);
/// assert_eq!(t.display().to_string(), "(Pi a : nat, nat)");
/// ```
///
/// Construct instances via [`Term::display`]. `Term` itself also
/// implements [`fmt::Display`] with the same output.
pub struct TermDisplay<'a> {
    term: &'a Term,
}

impl Term {
    /// Return a [`TermDisplay`] suitable for formatting with [`fmt::Display`].
    #[inline]
    pub fn display(&self) -> TermDisplay<'_> {
        TermDisplay { term: self }
    }
}

/// Pending output of the renderer.
enum Item<'a> {
    Term(&'a Term),
    Text(&'static str),
    Name(&'a Name),
}

/// Pushes `items` so that they are popped in the given order.
fn push_seq<'a, const N: usize>(stack: &mut Vec<Item<'a>>, items: [Item<'a>; N]) {
    stack.extend(items.into_iter().rev());
}

impl fmt::Display for TermDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut stack = vec![Item::Term(self.term)];
        while let Some(item) = stack.pop() {
            let t = match item {
                Item::Text(s) => {
                    f.write_str(s)?;
                    continue;
                }
                Item::Name(n) => {
                    write!(f, "{n}")?;
                    continue;
                }
                Item::Term(t) => t,
            };
            match t.node() {
                Node::Var(idx) => write!(f, "#{idx}")?,
                Node::Constant(name, levels) => {
                    write!(f, "{name}")?;
                    if !levels.is_empty() {
                        f.write_str(".{")?;
                        for (i, l) in levels.iter().enumerate() {
                            if i > 0 {
                                f.write_str(" ")?;
                            }
                            write!(f, "{l}")?;
                        }
                        f.write_str("}")?;
                    }
                }
                Node::Sort(level) => write!(f, "(Sort {level})")?,
                Node::MLocal { meta, name, .. } => {
                    if *meta {
                        f.write_str("?")?;
                    }
                    write!(f, "{name}")?;
                }
                Node::Macro(payload) => write!(f, "{}", PayloadDisplay(&**payload))?,
                Node::App { .. } => {
                    let mut args = Vec::new();
                    let mut head = t;
                    while let Node::App { fun, arg } = head.node() {
                        args.push(arg);
                        head = fun;
                    }
                    f.write_str("(")?;
                    stack.push(Item::Text(")"));
                    for arg in args {
                        stack.push(Item::Term(arg));
                        stack.push(Item::Text(" "));
                    }
                    stack.push(Item::Term(head));
                }
                Node::Pair { first, second, ty } => {
                    f.write_str("(pair ")?;
                    push_seq(
                        &mut stack,
                        [
                            Item::Term(first),
                            Item::Text(" "),
                            Item::Term(second),
                            Item::Text(" : "),
                            Item::Term(ty),
                            Item::Text(")"),
                        ],
                    );
                }
                Node::Proj { first, arg } => {
                    f.write_str(if *first { "(fst " } else { "(snd " })?;
                    push_seq(&mut stack, [Item::Term(arg), Item::Text(")")]);
                }
                Node::Binder {
                    kind,
                    name,
                    domain,
                    body,
                } => {
                    f.write_str(match kind {
                        TermKind::Lambda => "(fun ",
                        TermKind::Pi => "(Pi ",
                        _ => "(Sigma ",
                    })?;
                    push_seq(
                        &mut stack,
                        [
                            Item::Name(name),
                            Item::Text(" : "),
                            Item::Term(domain),
                            Item::Text(", "),
                            Item::Term(body),
                            Item::Text(")"),
                        ],
                    );
                }
                Node::Let {
                    name,
                    ty,
                    value,
                    body,
                } => {
                    f.write_str("(let ")?;
                    push_seq(
                        &mut stack,
                        [
                            Item::Name(name),
                            Item::Text(" : "),
                            Item::Term(ty),
                            Item::Text(" := "),
                            Item::Term(value),
                            Item::Text(" in "),
                            Item::Term(body),
                            Item::Text(")"),
                        ],
                    );
                }
            }
        }
        Ok(())
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.display().fmt(f)
    }
}
