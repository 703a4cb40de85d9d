//! shmring - a lock-free, file-backed ring buffer for inter-process communication.
//!
//! Any number of producer and consumer processes can [`RingBuffer::attach`] to
//! the same backing file and exchange `u32`-word messages without a broker,
//! a lock, or a blocking syscall on the hot path. Capacity is fixed at
//! [`RingBuffer::create`] time and travels with the file, so attaching
//! processes never need to agree on it out of band.
//!
//! # Example
//!
//! ```
//! use shmring::RingBuffer;
//! use tempfile::NamedTempFile;
//!
//! let file = NamedTempFile::new().unwrap();
//! RingBuffer::create(file.path(), 64).unwrap();
//!
//! let producer = RingBuffer::attach(file.path()).unwrap();
//! let consumer = RingBuffer::attach(file.path()).unwrap();
//!
//! producer.enqueue(&[1, 2, 3]).unwrap();
//!
//! let mut buf = [0u32; 3];
//! let n = consumer.dequeue(&mut buf).unwrap();
//! assert_eq!(&buf[..n], &[1, 2, 3]);
//! ```
//!
//! For zero-copy writes and reads, use [`RingBuffer::enqueue_alloc`] and
//! [`RingBuffer::dequeue_alloc`], which hand back a [`ProducerTx`] /
//! [`ConsumerTx`] pointing directly into the mapping.

mod backoff;
mod config;
mod error;
mod header;
mod invariants;
mod metrics;
mod ring;
mod transaction;

pub use backoff::Backoff;
pub use config::RingConfig;
pub use error::RingError;
pub use metrics::{Metrics, MetricsSnapshot};
pub use ring::RingBuffer;
pub use transaction::{ConsumerTx, ProducerTx};
