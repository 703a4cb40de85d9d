use crate::backoff::Backoff;
use crate::config::RingConfig;
use crate::error::RingError;
use crate::header::{ring_mod_diff, ring_mod_diff_minus_one, Header, HEADER_SIZE, WRAP_SENTINEL};
use crate::invariants::{
    debug_assert_bounded_count, debug_assert_index_in_bounds, debug_assert_length_in_range,
    debug_assert_no_consumer_overrun, debug_assert_no_producer_overrun,
};
use crate::metrics::{Metrics, MetricsSnapshot};
use crate::transaction::{ConsumerTx, ProducerTx};
use memmap2::{MmapMut, MmapOptions};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::atomic::Ordering;

/// A lock-free, file-backed ring buffer shared by any number of producer and
/// consumer processes or threads.
///
/// Messages are framed as a `u32` length word followed by that many `u32`
/// payload words. Capacity is fixed at [`RingBuffer::create`] time and lives
/// in the file's header, so every attaching process agrees on it without
/// further coordination.
pub struct RingBuffer {
    mmap: MmapMut,
    nb_words: u32,
    config: RingConfig,
    metrics: Metrics,
    path: PathBuf,
}

// SAFETY: the mapping is shared memory; every mutable access to it goes
// through the atomic header fields or through a `Transaction`'s exclusive
// claim on a data-area range, so concurrent access from multiple threads is
// sound by the same argument that makes it sound across processes.
unsafe impl Send for RingBuffer {}
unsafe impl Sync for RingBuffer {}

impl RingBuffer {
    /// Creates a new ring buffer file with room for `nb_words` data words.
    ///
    /// Overwrites any existing file at `path`. `nb_words` must be at least 2
    /// (one word for a length prefix, one for a payload) or no message could
    /// ever be framed.
    pub fn create<P: AsRef<Path>>(path: P, nb_words: u32) -> Result<(), RingError> {
        let path = path.as_ref();
        let create = |source| RingError::CreateFailed {
            path: path.to_path_buf(),
            source,
        };

        assert!(nb_words >= 2, "nb_words must be at least 2, got {nb_words}");

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)
            .map_err(create)?;
        let total_len = HEADER_SIZE as u64 + u64::from(nb_words) * 4;
        file.set_len(total_len).map_err(create)?;

        let mut mmap = unsafe { MmapOptions::new().map_mut(&file) }.map_err(create)?;
        let header = unsafe { &*mmap.as_mut_ptr().cast::<Header>() };
        header.nb_words.store(nb_words, Ordering::Relaxed);
        header.mapped_size.store(total_len as u32, Ordering::Relaxed);
        header.prod_head.store(0, Ordering::Relaxed);
        header.prod_tail.store(0, Ordering::Relaxed);
        header.cons_head.store(0, Ordering::Relaxed);
        header.cons_tail.store(0, Ordering::Relaxed);
        mmap.flush().map_err(create)?;

        Ok(())
    }

    /// Attaches to an existing ring buffer file with default configuration.
    pub fn attach<P: AsRef<Path>>(path: P) -> Result<Self, RingError> {
        Self::attach_with_config(path, RingConfig::default())
    }

    /// Attaches to an existing ring buffer file with the given configuration.
    pub fn attach_with_config<P: AsRef<Path>>(
        path: P,
        config: RingConfig,
    ) -> Result<Self, RingError> {
        let path = path.as_ref();
        let attach = |source| RingError::AttachFailed {
            path: path.to_path_buf(),
            source,
        };
        let corrupt = |reason: String| RingError::CorruptHeader {
            path: path.to_path_buf(),
            reason,
        };

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(attach)?;
        let file_len = file.metadata().map_err(attach)?.len();
        if file_len < HEADER_SIZE as u64 {
            return Err(corrupt(format!(
                "file is {file_len} byte(s), shorter than the {HEADER_SIZE}-byte header"
            )));
        }

        let mut mmap = unsafe { MmapOptions::new().map_mut(&file) }.map_err(attach)?;
        let header = unsafe { &*mmap.as_mut_ptr().cast::<Header>() };
        let nb_words = header.nb_words.load(Ordering::Relaxed);
        if nb_words < 2 {
            return Err(corrupt(format!("nb_words {nb_words} is below the minimum of 2")));
        }

        let expected_len = HEADER_SIZE as u64 + u64::from(nb_words) * 4;
        if config.strict_size_check && file_len != expected_len {
            return Err(corrupt(format!(
                "file is {file_len} byte(s), expected {expected_len} for nb_words {nb_words}"
            )));
        }

        for (name, value) in [
            ("prod_head", header.prod_head.load(Ordering::Relaxed)),
            ("prod_tail", header.prod_tail.load(Ordering::Relaxed)),
            ("cons_head", header.cons_head.load(Ordering::Relaxed)),
            ("cons_tail", header.cons_tail.load(Ordering::Relaxed)),
        ] {
            if value >= nb_words {
                return Err(corrupt(format!(
                    "{name} ({value}) is out of range for nb_words ({nb_words})"
                )));
            }
        }

        header.mapped_size.store(file_len as u32, Ordering::Relaxed);

        Ok(Self {
            mmap,
            nb_words,
            config,
            metrics: Metrics::new(config.enable_metrics),
            path: path.to_path_buf(),
        })
    }

    pub(crate) fn header(&self) -> &Header {
        unsafe { &*self.mmap.as_ptr().cast::<Header>() }
    }

    pub(crate) fn data_ptr(&self) -> *mut u32 {
        unsafe { self.mmap.as_ptr().add(HEADER_SIZE).cast::<u32>().cast_mut() }
    }

    unsafe fn word(&self, idx: u32) -> u32 {
        debug_assert_index_in_bounds!(idx, self.nb_words);
        std::ptr::read(self.data_ptr().add(idx as usize))
    }

    unsafe fn set_word(&self, idx: u32, value: u32) {
        debug_assert_index_in_bounds!(idx, self.nb_words);
        std::ptr::write(self.data_ptr().add(idx as usize), value);
    }

    /// Path this ring buffer was attached from.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Capacity of the data area, in words.
    #[must_use]
    pub fn nb_words(&self) -> u32 {
        self.nb_words
    }

    /// Number of words currently readable (published by producers, not yet
    /// claimed by a consumer reservation).
    #[must_use]
    pub fn nb_entries(&self) -> u32 {
        let header = self.header();
        let prod_tail = header.prod_tail.load(Ordering::Acquire);
        let cons_head = header.cons_head.load(Ordering::Acquire);
        ring_mod_diff(prod_tail, cons_head, self.nb_words)
    }

    /// Number of words currently free for a new producer reservation.
    #[must_use]
    pub fn nb_free(&self) -> u32 {
        let header = self.header();
        let cons_tail = header.cons_tail.load(Ordering::Acquire);
        let prod_head = header.prod_head.load(Ordering::Acquire);
        ring_mod_diff_minus_one(cons_tail, prod_head, self.nb_words)
    }

    /// Snapshot of this attachment's local operation counters.
    #[must_use]
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    pub(crate) fn metrics_ref(&self) -> &Metrics {
        &self.metrics
    }

    /// Reserves space for a `len`-word message without writing it.
    ///
    /// Returns a [`ProducerTx`] whose payload the caller fills in, then
    /// commits. `len` must be at least 1 and no more than `nb_words - 2`
    /// (one word is always needed for the length prefix, and capacity never
    /// reaches 100% full to keep `head == tail` an unambiguous empty marker).
    pub fn enqueue_alloc(&self, len: u32) -> Result<ProducerTx<'_>, RingError> {
        assert!(
            len >= 1 && len <= self.nb_words.saturating_sub(2),
            "message length {len} outside legal range [1, {}]",
            self.nb_words.saturating_sub(2)
        );
        debug_assert_length_in_range!(len, self.nb_words - 2);

        let header = self.header();
        let needed = len + 1;
        let mut backoff = Backoff::new();

        loop {
            let p_h = header.prod_head.load(Ordering::Relaxed);
            let c_t = header.cons_tail.load(Ordering::Acquire);
            let free = ring_mod_diff_minus_one(c_t, p_h, self.nb_words);
            debug_assert_bounded_count!(
                ring_mod_diff(p_h, c_t, self.nb_words),
                free,
                self.nb_words
            );

            if free < needed {
                return Err(RingError::NotEnoughSpace {
                    requested: needed,
                    free,
                });
            }

            let (write_index, new_head, wrapped) = if p_h + needed <= self.nb_words {
                (p_h, (p_h + needed) % self.nb_words, false)
            } else if free.saturating_sub(self.nb_words - p_h) >= needed {
                (0, needed % self.nb_words, true)
            } else {
                return Err(RingError::NotEnoughSpace {
                    requested: needed,
                    free,
                });
            };
            debug_assert_no_producer_overrun!(needed, free);

            if header
                .prod_head
                .compare_exchange_weak(p_h, new_head, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                unsafe {
                    if wrapped {
                        self.set_word(p_h, WRAP_SENTINEL);
                    }
                    self.set_word(write_index, len);
                }
                return Ok(ProducerTx {
                    ring: self,
                    cas_old: p_h,
                    cas_new: new_head,
                    payload_index: write_index + 1,
                    len,
                    wrapped,
                    committed: false,
                });
            }

            // Another producer's reservation won the race, not a space
            // shortage. Re-snapshot and retry; never give up here.
            self.metrics.record_cas_retry();
            backoff.snooze();
        }
    }

    /// Reserves the next message for reading without copying it out.
    ///
    /// Returns a [`ConsumerTx`] the caller reads from, then commits to
    /// release the slot back to producers.
    pub fn dequeue_alloc(&self) -> Result<ConsumerTx<'_>, RingError> {
        let header = self.header();
        let mut backoff = Backoff::new();

        loop {
            let c_h = header.cons_head.load(Ordering::Relaxed);
            let p_t = header.prod_tail.load(Ordering::Acquire);

            if c_h == p_t {
                return Err(RingError::Empty);
            }
            debug_assert_no_consumer_overrun!(c_h, p_t);

            let len = unsafe { self.word(c_h) };
            let (read_index, len, new_head, wrapped) = if len == WRAP_SENTINEL {
                let p_t = header.prod_tail.load(Ordering::Acquire);
                if p_t == 0 {
                    return Err(RingError::Empty);
                }
                let real_len = unsafe { self.word(0) };
                (0_u32, real_len, (real_len + 1) % self.nb_words, true)
            } else {
                (c_h, len, (c_h + len + 1) % self.nb_words, false)
            };
            debug_assert_length_in_range!(len, self.nb_words - 2);

            if header
                .cons_head
                .compare_exchange_weak(c_h, new_head, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                return Ok(ConsumerTx {
                    ring: self,
                    cas_old: c_h,
                    cas_new: new_head,
                    payload_index: read_index + 1,
                    len,
                    wrapped,
                    committed: false,
                });
            }

            // Another consumer's reservation won the race, not an empty
            // ring. Re-snapshot and retry; never give up here.
            self.metrics.record_cas_retry();
            backoff.snooze();
        }
    }

    /// Reserves, copies `data` in, and commits in one call.
    pub fn enqueue(&self, data: &[u32]) -> Result<(), RingError> {
        let mut tx = self.enqueue_alloc(data.len() as u32)?;
        tx.payload_mut().copy_from_slice(data);
        tx.commit();
        Ok(())
    }

    /// Reserves the next message, copies it into `buf`, and commits.
    ///
    /// Returns the number of words written. If `buf` is shorter than the
    /// message, the message is still consumed (there is no way to put a
    /// claimed reservation back), and [`RingError::BufferTooSmall`] is
    /// returned instead.
    pub fn dequeue(&self, buf: &mut [u32]) -> Result<usize, RingError> {
        let tx = self.dequeue_alloc()?;
        let len = tx.len() as usize;
        if buf.len() < len {
            tx.commit();
            return Err(RingError::BufferTooSmall {
                available: buf.len(),
                needed: len as u32,
            });
        }
        buf[..len].copy_from_slice(tx.payload());
        tx.commit();
        Ok(len)
    }
}
