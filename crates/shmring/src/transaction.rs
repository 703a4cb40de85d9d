use crate::backoff::Backoff;
use crate::ring::RingBuffer;
use std::sync::atomic::Ordering;

/// A producer's in-flight reservation, obtained from [`RingBuffer::enqueue_alloc`].
///
/// Write the payload into [`ProducerTx::payload_mut`], then call
/// [`ProducerTx::commit`] to publish it to consumers. The length word and, if
/// the reservation wrapped, the sentinel are already written by the time this
/// value is returned — only the payload is the caller's responsibility.
///
/// Dropping a `ProducerTx` without committing is a programming error: the
/// space was already claimed from `prod_head` and there is no way to give it
/// back, so the slot would be leaked for the lifetime of the ring. Debug
/// builds catch this with an assertion; release builds simply leak the
/// reservation (the ring keeps running, just permanently short that space).
pub struct ProducerTx<'a> {
    pub(crate) ring: &'a RingBuffer,
    pub(crate) cas_old: u32,
    pub(crate) cas_new: u32,
    pub(crate) payload_index: u32,
    pub(crate) len: u32,
    pub(crate) wrapped: bool,
    pub(crate) committed: bool,
}

impl<'a> ProducerTx<'a> {
    /// Start index of the reservation's length word within the data area.
    #[must_use]
    pub fn start_index(&self) -> u32 {
        self.payload_index.wrapping_sub(1) % self.ring.nb_words()
    }

    /// Number of payload words reserved.
    #[must_use]
    pub fn len(&self) -> u32 {
        self.len
    }

    /// Whether this reservation wrapped past the end of the data area.
    #[must_use]
    pub fn wrapped(&self) -> bool {
        self.wrapped
    }

    /// Mutable view of the payload words, for zero-copy writing.
    pub fn payload_mut(&mut self) -> &mut [u32] {
        unsafe {
            std::slice::from_raw_parts_mut(
                self.ring.data_ptr().add(self.payload_index as usize),
                self.len as usize,
            )
        }
    }

    /// Publishes the reservation by advancing `prod_tail` (protocol §4.1.3 step 7).
    ///
    /// Waits for `prod_tail` to reach this reservation's starting point first,
    /// so concurrent producers publish in the order they reserved in.
    pub fn commit(mut self) {
        self.committed = true;
        let header = self.ring.header();
        let mut backoff = Backoff::new();
        while header.prod_tail.load(Ordering::Relaxed) != self.cas_old {
            backoff.snooze();
        }
        header.prod_tail.store(self.cas_new, Ordering::Release);
        self.ring.metrics_ref().record_enqueue(self.wrapped);
    }
}

impl<'a> Drop for ProducerTx<'a> {
    fn drop(&mut self) {
        debug_assert!(
            self.committed,
            "ProducerTx dropped without commit: reserved {} word(s) at {} are leaked",
            self.len, self.payload_index
        );
    }
}

/// A consumer's in-flight reservation, obtained from [`RingBuffer::dequeue_alloc`].
///
/// Read the payload from [`ConsumerTx::payload`], then call
/// [`ConsumerTx::commit`] to release the slot back to producers. As with
/// [`ProducerTx`], dropping without committing is a programming error.
pub struct ConsumerTx<'a> {
    pub(crate) ring: &'a RingBuffer,
    pub(crate) cas_old: u32,
    pub(crate) cas_new: u32,
    pub(crate) payload_index: u32,
    pub(crate) len: u32,
    pub(crate) wrapped: bool,
    pub(crate) committed: bool,
}

impl<'a> ConsumerTx<'a> {
    /// Number of payload words available to read.
    #[must_use]
    pub fn len(&self) -> u32 {
        self.len
    }

    /// Whether reading this message required jumping over the wrap sentinel.
    #[must_use]
    pub fn wrapped(&self) -> bool {
        self.wrapped
    }

    /// View of the payload words.
    #[must_use]
    pub fn payload(&self) -> &[u32] {
        unsafe {
            std::slice::from_raw_parts(
                self.ring.data_ptr().add(self.payload_index as usize),
                self.len as usize,
            )
        }
    }

    /// Publishes the release by advancing `cons_tail` (protocol §4.1.4 step 7).
    ///
    /// Waits for `cons_tail` to reach this reservation's starting point first,
    /// so concurrent consumers release in the order they reserved in.
    pub fn commit(mut self) {
        self.committed = true;
        let header = self.ring.header();
        let mut backoff = Backoff::new();
        while header.cons_tail.load(Ordering::Relaxed) != self.cas_old {
            backoff.snooze();
        }
        header.cons_tail.store(self.cas_new, Ordering::Release);
        self.ring.metrics_ref().record_dequeue();
    }
}

impl<'a> Drop for ConsumerTx<'a> {
    fn drop(&mut self) {
        debug_assert!(
            self.committed,
            "ConsumerTx dropped without commit: {} reserved word(s) are stuck unreleased",
            self.len
        );
    }
}
