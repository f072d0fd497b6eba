//! Structure-sharing binary encoding of terms.
//!
//! ## Format
//!
//! A term is written in prefix order: the kind tag byte (the
//! [`TermKind`] discriminant), the scalar payload of the cell, then its
//! children in order. Scalars per kind:
//!
//! | kind                  | payload                                       |
//! |-----------------------|-----------------------------------------------|
//! | `Var`                 | index `u32`                                   |
//! | `Constant`            | name, level list                              |
//! | `Sort`                | level                                         |
//! | `Meta`, `Local`       | name (then the type as child)                 |
//! | `Lambda`, `Pi`, `Sigma`, `Let` | bound name (then the children)       |
//! | `Macro`               | tag string, length-prefixed payload bytes    |
//! | `App`, `Pair`, `Fst`, `Snd` | nothing                                 |
//!
//! Every cell gets an index when its encoding is complete (after its
//! children), counted from zero for the whole session. A cell met again is
//! written as the byte `0xFF` followed by its index as `u32`, so the
//! output grows with the number of distinct cells, not with tree size.
//!
//! Scalars use the primitives of [`Writer`] and [`Reader`]: little-endian
//! integers, length-prefixed strings.

use crate::check::{self, CHECKS_ENABLED};
use crate::hash::TermPtr;
use crate::sharing::MaxSharing;
use crate::term::Node;
use crate::{
    mk_app, mk_binder, mk_constant, mk_let, mk_macro, mk_mlocal, mk_pair, mk_proj, mk_sort,
    mk_var, MacroRegistry, Name, Reader, Term, TermError, TermKind, Writer,
};
use indexmap::IndexSet;
use std::fmt;
use std::io;

/// Tag byte of a back-reference to an already written cell.
pub(crate) const BACKREF: u8 = 0xFF;

/// Options of a [`Serializer`] session.
#[derive(Debug, Clone, Copy)]
pub struct SerializerOptions {
    /// Run the maximal-sharing pass on every term before encoding it, so
    /// that structurally equal subterms are written once. Without it only
    /// pointer-identical cells are back-referenced.
    pub max_sharing: bool,
}

impl Default for SerializerOptions {
    fn default() -> Self {
        Self { max_sharing: true }
    }
}

/// Writes terms into one byte buffer, sharing cells across all terms of
/// the session.
pub struct Serializer {
    w: Writer,
    written: IndexSet<TermPtr>,
    sharing: Option<MaxSharing>,
    terms: usize,
}

impl Default for Serializer {
    fn default() -> Self {
        Self::new()
    }
}

impl Serializer {
    pub fn new() -> Self {
        Self::with_options(SerializerOptions::default())
    }

    pub fn with_options(options: SerializerOptions) -> Self {
        Self {
            w: Writer::new(),
            written: IndexSet::new(),
            sharing: options.max_sharing.then(MaxSharing::new),
            terms: 0,
        }
    }

    /// Preallocates room for `bytes` of output and `cells` distinct cells.
    pub fn with_capacity(bytes: usize, cells: usize) -> Self {
        Self {
            w: Writer::with_capacity(bytes),
            written: IndexSet::with_capacity(cells),
            ..Self::new()
        }
    }

    /// Bytes written so far.
    #[inline]
    pub fn bytes(&self) -> &[u8] {
        self.w.as_bytes()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.w.into_bytes()
    }

    /// Copies the bytes written so far into `sink`.
    pub fn write_to<W: io::Write>(&self, sink: &mut W) -> Result<(), TermError> {
        sink.write_all(self.w.as_bytes())?;
        Ok(())
    }

    /// Number of distinct cells written in this session.
    #[inline]
    pub fn cells_written(&self) -> usize {
        self.written.len()
    }

    /// Appends `e` to the stream.
    ///
    /// On error the stream and the back-reference table are rolled back to
    /// where they were before the call, so the session stays usable.
    pub fn write_term(&mut self, e: &Term) -> Result<(), TermError> {
        let root = match &mut self.sharing {
            Some(sharing) => sharing.apply(e),
            None => e.clone(),
        };
        let start = self.w.len();
        let cells = self.written.len();
        if let Err(err) = self.write_cells(&root) {
            log::debug!(
                "serializer: dropping {} byte(s) of a failed term: {err}",
                self.w.len() - start
            );
            self.w.truncate(start);
            self.written.truncate(cells);
            return Err(err);
        }
        self.terms += 1;
        log::debug!(
            "serializer: term #{} written in {} bytes, {} distinct cell(s) in session",
            self.terms,
            self.w.len() - start,
            self.written.len()
        );
        Ok(())
    }

    fn write_cells(&mut self, root: &Term) -> Result<(), TermError> {
        enum Frame<'a> {
            Enter(&'a Term),
            Exit(&'a Term),
        }
        let mut stack = vec![Frame::Enter(root)];
        while let Some(frame) = stack.pop() {
            match frame {
                Frame::Enter(t) => {
                    if let Some(index) = self.written.get_index_of(&TermPtr(t.clone())) {
                        log::trace!("serializer: back-reference to cell #{index}");
                        self.w.write_u8(BACKREF)?;
                        self.w.write_u32(cell_index(index)?)?;
                        continue;
                    }
                    self.w.write_u8(t.kind() as u8)?;
                    self.write_scalars(t)?;
                    stack.push(Frame::Exit(t));
                    stack.extend(t.children().rev().map(Frame::Enter));
                }
                Frame::Exit(t) => {
                    let (index, _) = self.written.insert_full(TermPtr(t.clone()));
                    log::trace!("serializer: {} cell #{index}", t.kind_name());
                }
            }
        }
        Ok(())
    }

    fn write_scalars(&mut self, t: &Term) -> Result<(), TermError> {
        match t.node() {
            Node::Var(idx) => self.w.write_u32(*idx),
            Node::Constant(name, levels) => {
                self.w.write_name(name)?;
                self.w.write_levels(levels)
            }
            Node::Sort(level) => self.w.write_level(level),
            Node::MLocal { name, .. } | Node::Binder { name, .. } | Node::Let { name, .. } => {
                self.w.write_name(name)
            }
            Node::Macro(payload) => {
                let mut bytes = Writer::new();
                payload.write(&mut bytes)?;
                self.w.write_str(payload.tag())?;
                self.w.write_bytes(bytes.as_bytes())
            }
            Node::Pair { .. } | Node::Proj { .. } | Node::App { .. } => Ok(()),
        }
    }
}

fn cell_index(index: usize) -> Result<u32, TermError> {
    u32::try_from(index).map_err(|_| {
        io::Error::new(io::ErrorKind::InvalidInput, "too many distinct cells for one stream").into()
    })
}

impl fmt::Debug for Serializer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Serializer")
            .field("bytes", &self.w.len())
            .field("cells", &self.written.len())
            .field("terms", &self.terms)
            .field("max_sharing", &self.sharing.is_some())
            .finish()
    }
}

/// A composite cell whose children are still being read.
struct Pending {
    shape: Shape,
    children: Vec<Term>,
}

enum Shape {
    MLocal(bool, Name),
    Pair,
    Proj(bool),
    App,
    Binder(TermKind, Name),
    Let(Name),
}

impl Shape {
    fn arity(&self) -> usize {
        match self {
            Shape::MLocal(..) | Shape::Proj(_) => 1,
            Shape::App | Shape::Binder(..) => 2,
            Shape::Pair | Shape::Let(_) => 3,
        }
    }
}

impl Pending {
    fn build(self) -> Term {
        let mut children = self.children.into_iter();
        // `children` holds exactly `arity` terms here
        let mut next = move || children.next().unwrap_or_default();
        match self.shape {
            Shape::MLocal(meta, name) => mk_mlocal(meta, name, next()),
            Shape::Pair => {
                let first = next();
                let second = next();
                mk_pair(first, second, next())
            }
            Shape::Proj(first) => mk_proj(first, next()),
            Shape::App => {
                let fun = next();
                mk_app(fun, next())
            }
            Shape::Binder(kind, name) => {
                let domain = next();
                mk_binder(kind, name, domain, next())
            }
            Shape::Let(name) => {
                let ty = next();
                let value = next();
                mk_let(name, ty, value, next())
            }
        }
    }
}

/// Reads terms written by a [`Serializer`] session, in the same order.
///
/// Macro payloads are rebuilt through `registry`; an unregistered tag
/// fails the read with [`TermError::UnknownMacroTag`].
pub struct Deserializer<'a> {
    r: Reader<'a>,
    registry: &'a MacroRegistry,
    table: Vec<Term>,
    terms: usize,
}

impl<'a> Deserializer<'a> {
    pub fn new(bytes: &'a [u8], registry: &'a MacroRegistry) -> Self {
        Self {
            r: Reader::new(bytes),
            registry,
            table: Vec::new(),
            terms: 0,
        }
    }

    /// Offset of the next byte to be read.
    #[inline]
    pub fn position(&self) -> usize {
        self.r.position()
    }

    #[inline]
    pub fn is_at_end(&self) -> bool {
        self.r.is_at_end()
    }

    /// Number of distinct cells decoded in this session.
    #[inline]
    pub fn cells_read(&self) -> usize {
        self.table.len()
    }

    fn back_reference(&mut self) -> Result<Term, TermError> {
        let index = self.r.read_u32()?;
        self.table
            .get(index as usize)
            .cloned()
            .ok_or(TermError::BadBackRef {
                index,
                len: self.table.len(),
            })
    }

    fn read_macro(&mut self) -> Result<Term, TermError> {
        let tag = self.r.read_str()?;
        let mut bytes = Reader::new(self.r.read_bytes()?);
        let payload = self.registry.read(tag, &mut bytes)?;
        if !bytes.is_at_end() {
            return Err(TermError::MacroPayload(
                format!("reader for {tag:?} left {} byte(s) unread", bytes.remaining()).into(),
            ));
        }
        Ok(mk_macro(payload))
    }

    /// Reads the next term of the stream.
    pub fn read_term(&mut self) -> Result<Term, TermError> {
        let start = self.r.position();
        let mut stack: Vec<Pending> = Vec::new();
        loop {
            let offset = self.r.position();
            let tag = self.r.read_u8()?;
            let mut done = if tag == BACKREF {
                let t = self.back_reference()?;
                log::trace!("deserializer: back-reference to a {} cell", t.kind_name());
                t
            } else {
                let kind = TermKind::from_u8(tag).ok_or(TermError::UnknownKindTag { tag, offset })?;
                let shape = match kind {
                    TermKind::Var | TermKind::Constant | TermKind::Sort | TermKind::Macro => None,
                    TermKind::Meta | TermKind::Local => {
                        Some(Shape::MLocal(kind == TermKind::Meta, self.r.read_name()?))
                    }
                    TermKind::Pair => Some(Shape::Pair),
                    TermKind::Fst | TermKind::Snd => Some(Shape::Proj(kind == TermKind::Fst)),
                    TermKind::App => Some(Shape::App),
                    TermKind::Lambda | TermKind::Pi | TermKind::Sigma => {
                        Some(Shape::Binder(kind, self.r.read_name()?))
                    }
                    TermKind::Let => Some(Shape::Let(self.r.read_name()?)),
                };
                if let Some(shape) = shape {
                    let children = Vec::with_capacity(shape.arity());
                    stack.push(Pending { shape, children });
                    continue;
                }
                let leaf = match kind {
                    TermKind::Var => mk_var(self.r.read_u32()?),
                    TermKind::Constant => {
                        let name = self.r.read_name()?;
                        mk_constant(name, self.r.read_levels()?)
                    }
                    TermKind::Sort => mk_sort(self.r.read_level()?),
                    _ => self.read_macro()?,
                };
                log::trace!("deserializer: {} cell #{}", leaf.kind_name(), self.table.len());
                self.table.push(leaf.clone());
                leaf
            };

            // attach `done` to its parent, completing ancestors as they fill up
            loop {
                let Some(mut parent) = stack.pop() else {
                    return self.finish(done, start);
                };
                parent.children.push(done);
                if parent.children.len() < parent.shape.arity() {
                    stack.push(parent);
                    break;
                }
                done = parent.build();
                log::trace!("deserializer: {} cell #{}", done.kind_name(), self.table.len());
                self.table.push(done.clone());
            }
        }
    }

    fn finish(&mut self, root: Term, start: usize) -> Result<Term, TermError> {
        self.terms += 1;
        log::debug!(
            "deserializer: term #{} read from {} bytes, {} distinct cell(s) in session",
            self.terms,
            self.r.position() - start,
            self.table.len()
        );
        if CHECKS_ENABLED {
            if let Err(v) = root.check_metadata() {
                check::violated(v);
            }
        }
        Ok(root)
    }
}

impl fmt::Debug for Deserializer<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Deserializer")
            .field("position", &self.r.position())
            .field("cells", &self.table.len())
            .field("terms", &self.terms)
            .finish()
    }
}

/// Encodes one term with maximal sharing.
pub fn encode(e: &Term) -> Result<Vec<u8>, TermError> {
    let mut s = Serializer::new();
    s.write_term(e)?;
    Ok(s.into_bytes())
}

/// Decodes a buffer holding exactly one term.
pub fn decode(bytes: &[u8], registry: &MacroRegistry) -> Result<Term, TermError> {
    let mut d = Deserializer::new(bytes, registry);
    let t = d.read_term()?;
    if !d.is_at_end() {
        return Err(TermError::TrailingBytes {
            offset: d.position(),
        });
    }
    Ok(t)
}
