//! A growable, thread-safe ring of bytes.
//!
//! The ring decouples a writer that produces bytes at its own pace (typically
//! the stdout or stderr of a child process) from a reader that parses them on
//! another thread. Writes never block and never overwrite unread data: when
//! the incoming bytes do not fit, the ring grows first. Reads never block
//! either; a reader learns that new data arrived through a coalescing
//! notification channel (see [`RingBuffer::notifications`]).
//!
//! Every public method takes the single internal mutex for its full duration,
//! so `capacity()` and `len()` are consistent snapshots.

use std::{io, sync::Arc};

use crossbeam::channel::{self, Receiver, Sender};
use parking_lot::Mutex;
use tracing::debug;

use crate::{
    error::{BufferError, ReadError},
    scanner::ScannerRead,
};

/// Rings at or below this capacity double when they grow; larger rings grow
/// by a quarter.
pub const DOUBLING_THRESHOLD: usize = 8192;

/// A thread-safe, auto-growing byte ring with a non-blocking read API.
///
/// # Examples
///
/// ```
/// use streamsift::RingBuffer;
///
/// let ring = RingBuffer::new(4);
/// ring.write(b"hello").unwrap();
/// assert!(ring.capacity() >= 5);
///
/// let mut out = [0u8; 8];
/// let n = ring.read(&mut out).unwrap();
/// assert_eq!(&out[..n], b"hello");
///
/// ring.close();
/// assert!(ring.read(&mut out).is_err());
/// ```
#[derive(Debug)]
pub struct RingBuffer {
    state: Mutex<State>,
    notify_rx: Receiver<()>,
}

#[derive(Debug)]
struct State {
    buf: Vec<u8>,
    len: usize,
    index: usize,
    closed: bool,
    // Dropped on close, which disconnects every receiver.
    notify_tx: Option<Sender<()>>,
}

impl RingBuffer {
    /// Creates a ring holding `capacity` bytes before its first growth.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (notify_tx, notify_rx) = channel::bounded(1);
        Self {
            state: Mutex::new(State {
                buf: vec![0; capacity],
                len: 0,
                index: 0,
                closed: false,
                notify_tx: Some(notify_tx),
            }),
            notify_rx,
        }
    }

    /// Appends all of `data`, growing the ring first if it does not fit.
    ///
    /// Partial writes never happen: either every byte is stored or an error is
    /// returned and the ring is unchanged.
    ///
    /// # Errors
    ///
    /// [`BufferError::Closed`] after [`close`](Self::close), or
    /// [`BufferError::Grow`] if the larger allocation fails.
    pub fn write(&self, data: &[u8]) -> Result<usize, BufferError> {
        let mut state = self.state.lock();
        if state.closed {
            return Err(BufferError::Closed);
        }
        if data.is_empty() {
            // Still a write: a nonempty ring signals again.
            state.notify();
            return Ok(0);
        }
        if data.len() > state.buf.len() - state.len {
            let required = state.len + data.len();
            state.grow(required)?;
        }

        let cap = state.buf.len();
        let at = (state.index + state.len) % cap;
        let before_end = cap - at;
        if data.len() <= before_end {
            state.buf[at..at + data.len()].copy_from_slice(data);
        } else {
            let (head, tail) = data.split_at(before_end);
            state.buf[at..].copy_from_slice(head);
            state.buf[..tail.len()].copy_from_slice(tail);
        }
        state.len += data.len();
        state.notify();
        Ok(data.len())
    }

    /// Copies up to `dst.len()` of the oldest unread bytes into `dst` without
    /// consuming them.
    ///
    /// # Errors
    ///
    /// [`BufferError::EndOfStream`] only when the ring is closed and empty.
    pub fn peek(&self, dst: &mut [u8]) -> Result<usize, BufferError> {
        self.state.lock().peek(dst)
    }

    /// Discards up to `n` unread bytes and returns how many were discarded.
    pub fn consume(&self, n: usize) -> usize {
        self.state.lock().consume(n)
    }

    /// Peeks and consumes in one locked step.
    ///
    /// Returns `Ok(0)` when the ring is momentarily empty but still open.
    ///
    /// # Errors
    ///
    /// [`BufferError::EndOfStream`] when the ring is closed and empty.
    pub fn read(&self, dst: &mut [u8]) -> Result<usize, BufferError> {
        let mut state = self.state.lock();
        let n = state.peek(dst)?;
        Ok(state.consume(n))
    }

    /// Like [`read`](Self::read), but reports an empty, still-open ring as
    /// [`ReadError::NoNewData`] instead of a zero-length read.
    ///
    /// # Errors
    ///
    /// [`ReadError::NoNewData`] when nothing was read, [`ReadError::Eof`] once
    /// the ring is closed and drained.
    pub fn non_blocking_read(&self, dst: &mut [u8]) -> Result<usize, ReadError> {
        match self.read(dst) {
            Ok(0) => Err(ReadError::NoNewData),
            Ok(n) => Ok(n),
            Err(BufferError::EndOfStream) => Err(ReadError::Eof),
            Err(err) => Err(ReadError::Io(err.into())),
        }
    }

    /// Marks the ring closed and disconnects the notification channel.
    ///
    /// Later writes fail; reads keep succeeding until the ring is drained.
    /// Closing twice has no further effect.
    pub fn close(&self) {
        let mut state = self.state.lock();
        if state.closed {
            return;
        }
        state.closed = true;
        state.notify_tx = None;
        debug!(unread = state.len, "ring buffer closed");
    }

    /// Returns a receiver that yields `()` whenever the ring becomes nonempty.
    ///
    /// Notifications coalesce: the channel holds at most one pending signal,
    /// so a woken reader must drain whatever is available rather than count
    /// signals. The channel disconnects when the ring is closed.
    #[must_use]
    pub fn notifications(&self) -> Receiver<()> {
        self.notify_rx.clone()
    }

    /// Current allocated size in bytes. It never decreases.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.state.lock().buf.len()
    }

    /// Number of unread bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.lock().len
    }

    /// Whether there are no unread bytes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether [`close`](Self::close) has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }
}

// Nothing below takes the lock; callers already hold it.
impl State {
    fn notify(&self) {
        if self.len == 0 {
            return;
        }
        if let Some(tx) = &self.notify_tx {
            // A full channel already carries the signal.
            let _ = tx.try_send(());
        }
    }

    fn peek(&self, dst: &mut [u8]) -> Result<usize, BufferError> {
        if self.len == 0 && self.closed {
            return Err(BufferError::EndOfStream);
        }
        let n = dst.len().min(self.len);
        if n == 0 {
            return Ok(0);
        }
        let before_end = self.buf.len() - self.index;
        if n <= before_end {
            dst[..n].copy_from_slice(&self.buf[self.index..self.index + n]);
        } else {
            dst[..before_end].copy_from_slice(&self.buf[self.index..]);
            dst[before_end..n].copy_from_slice(&self.buf[..n - before_end]);
        }
        Ok(n)
    }

    fn consume(&mut self, n: usize) -> usize {
        let n = n.min(self.len);
        if n == 0 {
            return 0;
        }
        self.index = (self.index + n) % self.buf.len();
        self.len -= n;
        self.notify();
        n
    }

    fn grow(&mut self, required: usize) -> Result<(), BufferError> {
        let cap = self.buf.len();
        let scaled = if cap <= DOUBLING_THRESHOLD {
            cap.saturating_mul(2)
        } else {
            cap.saturating_add(cap / 4)
        };
        self.grow_to(scaled.max(required))
    }

    /// Moves the unread bytes to the front of a new `new_cap` allocation. On
    /// failure nothing changes.
    fn grow_to(&mut self, new_cap: usize) -> Result<(), BufferError> {
        let mut grown = Vec::new();
        grown
            .try_reserve_exact(new_cap)
            .map_err(|source| BufferError::Grow {
                requested: new_cap,
                source,
            })?;
        grown.resize(new_cap, 0);
        let copied = self.peek(&mut grown)?;
        debug_assert_eq!(copied, self.len);

        debug!(from = self.buf.len(), to = new_cap, unread = self.len, "ring buffer grew");
        self.buf = grown;
        self.index = 0;
        Ok(())
    }
}

impl io::Write for RingBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        RingBuffer::write(self, buf).map_err(Into::into)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl io::Write for &RingBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        RingBuffer::write(self, buf).map_err(Into::into)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl io::Read for RingBuffer {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        io::Read::read(&mut &*self, buf)
    }
}

impl io::Read for &RingBuffer {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match RingBuffer::read(self, buf) {
            Err(BufferError::EndOfStream) => Ok(0),
            other => other.map_err(Into::into),
        }
    }
}

impl ScannerRead for RingBuffer {
    fn scanner_read(&mut self, buf: &mut [u8]) -> Result<usize, ReadError> {
        self.non_blocking_read(buf)
    }
}

impl ScannerRead for &RingBuffer {
    fn scanner_read(&mut self, buf: &mut [u8]) -> Result<usize, ReadError> {
        self.non_blocking_read(buf)
    }
}

impl ScannerRead for Arc<RingBuffer> {
    fn scanner_read(&mut self, buf: &mut [u8]) -> Result<usize, ReadError> {
        self.non_blocking_read(buf)
    }
}
