use std::{collections::TryReserveError, io};

use thiserror::Error;

/// Errors reported by [`RingBuffer`](crate::RingBuffer) operations.
#[derive(Error, Debug)]
pub enum BufferError {
    /// The buffer was closed; no further writes are accepted.
    #[error("ring buffer is closed")]
    Closed,
    /// The buffer is closed and every byte has been consumed.
    #[error("end of stream")]
    EndOfStream,
    /// The buffer needed to grow but the allocation failed.
    #[error("ring buffer could not grow to {requested} bytes")]
    Grow {
        /// Capacity that was requested.
        requested: usize,
        /// Allocator failure.
        #[source]
        source: TryReserveError,
    },
}

impl From<BufferError> for io::Error {
    fn from(err: BufferError) -> Self {
        let kind = match err {
            BufferError::Closed => io::ErrorKind::BrokenPipe,
            BufferError::EndOfStream => io::ErrorKind::UnexpectedEof,
            BufferError::Grow { .. } => io::ErrorKind::OutOfMemory,
        };
        io::Error::new(kind, err)
    }
}

/// Outcome of a non-blocking read that produced no bytes.
#[derive(Error, Debug)]
pub enum ReadError {
    /// Nothing is available right now; the stream is still open.
    #[error("no new data")]
    NoNewData,
    /// The stream has ended.
    #[error("end of stream")]
    Eof,
    /// The underlying reader failed.
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Error a split function may return to stop scanning.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct SplitError(pub String);

/// Terminal scanner errors.
#[derive(Error, Debug)]
pub enum ScanError {
    /// A token did not fit in the maximum working buffer.
    #[error("token too long (limit is {limit} bytes)")]
    TooLong {
        /// Maximum token size in effect.
        limit: usize,
    },
    /// The split function asked to advance past the data it was given.
    #[error("split function returned advance count {advance} beyond input of {available} bytes")]
    AdvanceTooFar {
        /// Advance count returned by the split function.
        advance: usize,
        /// Bytes the split function was shown.
        available: usize,
    },
    /// The source kept returning zero bytes without reporting end-of-stream.
    #[error("source returned no data and no error {attempts} times in a row")]
    NoProgress {
        /// Number of consecutive empty reads.
        attempts: usize,
    },
    /// The source claimed to read more bytes than the buffer it was given.
    #[error("source reported reading {read} bytes into a buffer of {room}")]
    BadReadCount {
        /// Count returned by the source.
        read: usize,
        /// Space that was offered.
        room: usize,
    },
    /// The split function reported an error.
    #[error("split function failed: {0}")]
    Split(#[from] SplitError),
    /// The source failed.
    #[error("source read failed: {0}")]
    Source(#[from] io::Error),
}

/// Errors starting a [`Filter`](crate::Filter).
#[derive(Error, Debug)]
pub enum FilterError {
    /// The worker thread could not be spawned.
    #[error("failed to spawn filter worker: {0}")]
    Spawn(#[source] io::Error),
}
