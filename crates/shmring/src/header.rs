use std::sync::atomic::AtomicU32;

/// Length-word value that marks "the rest of the data area is unused, jump to
/// index 0". No legitimate payload length ever reaches this value: callers
/// are bounded to `nb_words - 2` words, enforced at the API boundary.
pub(crate) const WRAP_SENTINEL: u32 = u32::MAX;

/// On-disk / in-mapping header, exactly as laid out in the module docs.
///
/// `AtomicU32` has the same in-memory representation as `u32`, so this
/// `#[repr(C)]` struct is bit-for-bit the six-word header multiple processes
/// agree on, while giving every field atomic load/store/CAS for free.
#[repr(C)]
pub(crate) struct Header {
    /// Capacity of the data area in words. Written once at `create()`.
    pub nb_words: AtomicU32,
    /// Runtime-only scratch mirroring the mapping size; ignored on attach.
    pub mapped_size: AtomicU32,
    pub prod_head: AtomicU32,
    pub prod_tail: AtomicU32,
    pub cons_head: AtomicU32,
    pub cons_tail: AtomicU32,
}

pub(crate) const HEADER_SIZE: usize = std::mem::size_of::<Header>();

/// `(a - b) mod n` for `a, b` already known to lie in `[0, n)`.
pub(crate) fn ring_mod_diff(a: u32, b: u32, n: u32) -> u32 {
    (i64::from(a) - i64::from(b)).rem_euclid(i64::from(n)) as u32
}

/// `(a - b - 1) mod n`, used for the `nb_free` computation.
pub(crate) fn ring_mod_diff_minus_one(a: u32, b: u32, n: u32) -> u32 {
    (i64::from(a) - i64::from(b) - 1).rem_euclid(i64::from(n)) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_size_is_six_words() {
        assert_eq!(HEADER_SIZE, 24);
    }

    #[test]
    fn ring_mod_diff_wraps_correctly() {
        assert_eq!(ring_mod_diff(3, 6, 8), 5);
        assert_eq!(ring_mod_diff(6, 3, 8), 3);
        assert_eq!(ring_mod_diff(0, 0, 8), 0);
    }

    #[test]
    fn ring_mod_diff_minus_one_handles_zero() {
        assert_eq!(ring_mod_diff_minus_one(0, 0, 8), 7);
        assert_eq!(ring_mod_diff_minus_one(3, 0, 8), 2);
    }
}
