use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors produced by [`crate::create`], [`crate::attach`], and ring operations.
#[derive(Debug, Error)]
pub enum RingError {
    /// Backing file could not be created, sized, or initialized.
    #[error("cannot create ring buffer file '{path}': {source}")]
    CreateFailed {
        /// Path of the file that failed to be created.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// File could not be opened, sized, or mapped.
    #[error("cannot attach to ring buffer file '{path}': {source}")]
    AttachFailed {
        /// Path of the file that failed to attach.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// Attached file violates a header invariant.
    #[error("ring buffer file '{path}' has a corrupt header: {reason}")]
    CorruptHeader {
        /// Path of the offending file.
        path: PathBuf,
        /// Human-readable description of which invariant failed.
        reason: String,
    },

    /// Producer could not reserve the requested number of words.
    #[error("not enough space to reserve {requested} word(s) ({free} free)")]
    NotEnoughSpace {
        /// Words the caller asked to reserve.
        requested: u32,
        /// Words actually free at the time of the attempt.
        free: u32,
    },

    /// Consumer found no message to read.
    #[error("ring buffer is empty")]
    Empty,

    /// Consumer's destination buffer is shorter than the next message's payload.
    #[error("destination buffer has {available} word(s), message needs {needed}")]
    BufferTooSmall {
        /// Words the caller's buffer can hold.
        available: usize,
        /// Words the next message actually needs.
        needed: u32,
    },
}

impl RingError {
    /// Returns `true` for the two expected, commonly-retried signals
    /// (`NotEnoughSpace`, `Empty`), as opposed to the structural/environmental errors.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::NotEnoughSpace { .. } | Self::Empty)
    }
}
