//! # Kernel Terms
//!
//! The term representation at the core of a dependently typed proof
//! kernel.
//!
//! This crate provides the [`Term`] handle: a reference-counted pointer to
//! an immutable cell holding one of fourteen kinds (de Bruijn variables,
//! constants, sorts, metavariables, free locals, applications, pairs and
//! projections, `fun`/`Pi`/`Sigma` binders, `let`, and macro cells that
//! carry an open-ended [`MacroPayload`]). Every cell caches its structural
//! hash, depth and the `has_metavar`/`has_local` flags at construction.
//!
//! Subterms are shared freely, so a term is a DAG. Dropping a term of any
//! depth never recurses; [`live_cells`] tracks how many cells a thread
//! holds. Structural equality ignores the names of bound variables.
//!
//! The [`Serializer`] writes terms in a structure-sharing binary format:
//! each distinct cell is written once and later occurrences become
//! back-references. Macro payloads are rebuilt on decode through a
//! [`MacroRegistry`] that maps payload tags to reader functions.
//!
//! ## Example
//! ```rust
//! # use kernel_terms::{app, decode, encode, is_arrow, mk_arrow, mk_constant, mk_lambda, mk_var};
//! # use kernel_terms::{MacroRegistry, View};
//! let nat = mk_constant("nat", []);
//! let succ = mk_constant("succ", []);
//!
//! // fun x : nat, succ (succ x)
//! let body = app!(succ.clone(), app!(succ, mk_var(0)));
//! let f = mk_lambda("x", nat.clone(), body);
//! assert_eq!(f.to_string(), "(fun x : nat, (succ (succ #0)))");
//!
//! // nat -> nat is a non-dependent Pi
//! let ty = mk_arrow(nat.clone(), nat);
//! assert!(is_arrow(&ty));
//!
//! // round trip through the binary format
//! let bytes = encode(&f).unwrap();
//! let back = decode(&bytes, &MacroRegistry::new()).unwrap();
//! assert_eq!(back, f);
//! match back.view() {
//!     View::Lambda(name, _, body) => {
//!         assert_eq!(name.to_string(), "x");
//!         assert!(body.is_app());
//!     }
//!     _ => unreachable!(),
//! }
//! ```
//!
//! ## License
//!
//! Copyright (c) 2005–2025 IKH Software, Inc.
//!
//! Released under the terms of the GNU Lesser General Public License, version 3.0 or
//! (at your option) any later version (LGPL-3.0-or-later).

mod check;
mod cmp;
mod display;
mod error;
mod free_vars;
mod hash;
mod level;
mod name;
mod payload;
mod registry;
mod serializer;
mod sharing;
mod teardown;
mod term;
mod view;
mod wire;

pub use check::{set_invariant_hook, InvariantViolation, CHECKS_ENABLED};
pub use display::TermDisplay;
pub(crate) use error::InternalTermError;
pub use error::TermError;
pub use free_vars::{free_var_range, has_free_var, has_free_vars, is_arrow, is_cartesian, is_closed};
pub use hash::{hash_str, mix};
pub use level::{Level, LevelKind, LevelNode};
pub use name::{Name, NamePart};
pub use payload::MacroPayload;
pub use registry::{MacroReader, MacroRegistry};
pub use serializer::{decode, encode, Deserializer, Serializer, SerializerOptions};
pub use sharing::MaxSharing;
pub use teardown::live_cells;
pub use term::{
    mk_app, mk_app_n, mk_arrow, mk_binder, mk_bool, mk_cartesian_product, mk_constant, mk_fst,
    mk_lambda, mk_let, mk_local, mk_macro, mk_metavar, mk_mlocal, mk_pair, mk_pi, mk_proj,
    mk_sigma, mk_snd, mk_sort, mk_type, mk_var, update_app, update_binder, update_let,
    update_mlocal, update_pair, update_proj, Term, TermKind, DEFAULT_VAR_NAME,
};
pub use view::View;
pub use wire::{Reader, Writer};
