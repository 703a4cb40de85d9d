//! Property-based tests for the core invariants of `RingBuffer`.

use proptest::prelude::*;
use shmring::RingBuffer;
use tempfile::NamedTempFile;

fn fresh_ring(nb_words: u32) -> (NamedTempFile, RingBuffer) {
    let file = NamedTempFile::new().unwrap();
    RingBuffer::create(file.path(), nb_words).unwrap();
    let ring = RingBuffer::attach(file.path()).unwrap();
    (file, ring)
}

proptest! {
    /// `nb_entries` + `nb_free` + 1 always equals `nb_words`, regardless of
    /// how many messages of whatever size have passed through.
    #[test]
    fn prop_bounded_count(msgs in prop::collection::vec(1usize..6, 0..40)) {
        let (_file, ring) = fresh_ring(64);

        for len in msgs {
            let data: Vec<u32> = (0..len as u32).collect();
            match ring.enqueue(&data) {
                Ok(()) => {
                    prop_assert_eq!(ring.nb_entries() + ring.nb_free() + 1, ring.nb_words());
                    let mut buf = vec![0u32; len];
                    let n = ring.dequeue(&mut buf).unwrap();
                    prop_assert_eq!(n, len);
                    prop_assert_eq!(&buf[..], &data[..]);
                }
                Err(_) => {
                    // ring was too full for this message; that's fine, skip it
                }
            }
            prop_assert_eq!(ring.nb_entries() + ring.nb_free() + 1, ring.nb_words());
        }
    }

    /// A message enqueued is dequeued byte-for-byte identical, across a range
    /// of lengths and wrap positions.
    #[test]
    fn prop_roundtrip_preserves_payload(
        prelude in prop::collection::vec(1usize..4, 0..10),
        payload in prop::collection::vec(any::<u32>(), 1..30),
    ) {
        let (_file, ring) = fresh_ring(48);

        // Churn the ring first so later reservations land at varying offsets,
        // including ones that wrap.
        for len in prelude {
            let data: Vec<u32> = vec![7; len];
            if ring.enqueue(&data).is_ok() {
                let mut buf = vec![0u32; len];
                let _ = ring.dequeue(&mut buf);
            }
        }

        if payload.len() <= ring.nb_words() as usize - 2 && ring.enqueue(&payload).is_ok() {
            let mut buf = vec![0u32; payload.len()];
            let n = ring.dequeue(&mut buf).unwrap();
            prop_assert_eq!(n, payload.len());
            prop_assert_eq!(buf, payload);
        }
    }

    /// FIFO ordering holds for any interleaving of same-size enqueues.
    #[test]
    fn prop_fifo_ordering(values in prop::collection::vec(any::<u32>(), 1..50)) {
        let (_file, ring) = fresh_ring(8);

        let mut produced = Vec::new();
        let mut consumed = Vec::new();
        let mut buf = [0u32; 1];

        for v in values {
            if ring.enqueue(&[v]).is_ok() {
                produced.push(v);
            }
            if ring.dequeue(&mut buf).is_ok() {
                consumed.push(buf[0]);
            }
        }
        while ring.dequeue(&mut buf).is_ok() {
            consumed.push(buf[0]);
        }

        prop_assert_eq!(consumed, produced);
    }
}
