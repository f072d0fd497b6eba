//! Hash mixing primitives and per-thread allocation ordering.
//!
//! Structural hashes are 32-bit and combined bottom-up, so they are cheap
//! to cache on every cell. [`TermPtr`] gives identity-keyed tables a hash
//! that is diverse across cells without depending on addresses.

use crate::Term;
use std::cell::Cell;
use std::hash::{Hash, Hasher};

/// Combines two 32-bit hash codes.
#[inline]
pub fn mix(h1: u32, h2: u32) -> u32 {
    let h2 = h2.wrapping_sub(h1);
    h2 ^ (h1 << 8)
}

#[inline]
fn jenkins(a: &mut u32, b: &mut u32, c: &mut u32) {
    *a = a.wrapping_sub(*b).wrapping_sub(*c) ^ (*c >> 13);
    *b = b.wrapping_sub(*c).wrapping_sub(*a) ^ (*a << 8);
    *c = c.wrapping_sub(*a).wrapping_sub(*b) ^ (*b >> 13);
    *a = a.wrapping_sub(*b).wrapping_sub(*c) ^ (*c >> 12);
    *b = b.wrapping_sub(*c).wrapping_sub(*a) ^ (*a << 16);
    *c = c.wrapping_sub(*a).wrapping_sub(*b) ^ (*b >> 5);
    *a = a.wrapping_sub(*b).wrapping_sub(*c) ^ (*c >> 3);
    *b = b.wrapping_sub(*c).wrapping_sub(*a) ^ (*a << 10);
    *c = c.wrapping_sub(*a).wrapping_sub(*b) ^ (*b >> 15);
}

/// Hashes a byte string, seeded with `init`.
///
/// Bob Jenkins' lookup2 function. Stable across runs and platforms, which
/// keeps name hashes (and therefore term hashes) reproducible.
pub fn hash_str(bytes: &[u8], init: u32) -> u32 {
    let word = |s: &[u8]| u32::from_le_bytes([s[0], s[1], s[2], s[3]]);
    let mut a: u32 = 0x9e37_79b9;
    let mut b: u32 = 0x9e37_79b9;
    let mut c: u32 = init;
    let mut rest = bytes;
    while rest.len() >= 12 {
        a = a.wrapping_add(word(&rest[0..4]));
        b = b.wrapping_add(word(&rest[4..8]));
        c = c.wrapping_add(word(&rest[8..12]));
        jenkins(&mut a, &mut b, &mut c);
        rest = &rest[12..];
    }
    c = c.wrapping_add(bytes.len() as u32);
    // the lowest byte of c is reserved for the length
    for (i, &byte) in rest.iter().enumerate() {
        let byte = byte as u32;
        match i {
            0..=3 => a = a.wrapping_add(byte << (8 * i)),
            4..=7 => b = b.wrapping_add(byte << (8 * (i - 4))),
            _ => c = c.wrapping_add(byte << (8 * (i - 7))),
        }
    }
    jenkins(&mut a, &mut b, &mut c);
    c
}

thread_local! {
    static ALLOC_COUNTER: Cell<u32> = const { Cell::new(0) };
}

/// Returns the next value of this thread's allocation counter.
///
/// The counter wraps silently; the value is only a hash diversifier.
#[inline]
pub(crate) fn next_alloc_order() -> u32 {
    ALLOC_COUNTER
        .try_with(|c| {
            let n = c.get();
            c.set(n.wrapping_add(1));
            n
        })
        .unwrap_or(0)
}

/// Identity key for a [`Term`]: equal only to handles of the same cell.
///
/// Holding the handle keeps the cell alive, so a key can never alias a
/// later allocation at the same address.
#[derive(Clone)]
pub(crate) struct TermPtr(pub(crate) Term);

impl PartialEq for TermPtr {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.0.ptr_eq(&other.0)
    }
}

impl Eq for TermPtr {}

impl Hash for TermPtr {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u32(self.0.alloc_order());
    }
}
