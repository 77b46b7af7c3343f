//! Scanner: pulls bytes from a non-blocking source and cuts them into tokens.
//!
//! Why this exists
//! - A plain reader-driven scanner treats a zero-length read as either end of
//!   input or a reason to spin. Neither is acceptable when the source is a
//!   [`RingBuffer`](crate::RingBuffer) filled by another thread: "nothing yet"
//!   is normal and must not end the scan, and retrying immediately wastes CPU.
//! - [`ScannerRead`] lets a source say [`ReadError::NoNewData`]. The scanner
//!   records that as a transient marker, gives the split function one more
//!   look at what it already holds, and then returns `false` so the caller can
//!   wait for a notification before calling [`Scanner::scan`] again.
//!
//! What it does
//! - Keeps a working buffer of bytes read but not yet consumed by a token,
//!   with `start`/`end` cursors. The split function only ever sees
//!   `buf[start..end]`.
//! - When the split function needs more data the buffer is compacted (unread
//!   bytes shifted to offset 0) and, if still full, doubled up to
//!   [`ScannerOptions::max_token_size`].
//! - Tokens that are sub-slices of the window are kept as a span into the
//!   working buffer; tokens the split function built itself are kept owned.
//!
//! Invariants
//! - `start <= end <= buf.len()`.
//! - The sticky state is empty, the transient marker, or a terminal stop
//!   (end-of-stream or a [`ScanError`]). A real failure replaces the transient
//!   marker or end-of-stream; the first failure wins.
//! - A token returned by [`Scanner::token`] is valid until the next call to
//!   [`Scanner::scan`], which may compact or reuse the working buffer.


use std::{borrow::Cow, io, ops::Range};

use tracing::{debug, trace};

use crate::{
    error::{ReadError, ScanError},
    options::ScannerOptions,
    split::Splitter,
};

/// A byte source that can report "no data right now" without blocking.
///
/// Implementations return `Ok(n)` with `n > 0` when bytes were copied,
/// [`ReadError::NoNewData`] when the stream is open but empty, and
/// [`ReadError::Eof`] once it has ended. `Ok(0)` is tolerated but treated as a
/// misbehaving source: the scanner retries a bounded number of times and then
/// fails with [`ScanError::NoProgress`].
pub trait ScannerRead {
    /// Copies available bytes into `buf`.
    ///
    /// # Errors
    ///
    /// See the trait documentation for the meaning of each [`ReadError`].
    fn scanner_read(&mut self, buf: &mut [u8]) -> Result<usize, ReadError>;
}

impl<R: ScannerRead + ?Sized> ScannerRead for &mut R {
    fn scanner_read(&mut self, buf: &mut [u8]) -> Result<usize, ReadError> {
        (**self).scanner_read(buf)
    }
}

/// Adapts a blocking [`io::Read`] to [`ScannerRead`].
///
/// `Ok(0)` from the reader means end of stream, `WouldBlock` means no new data
/// and `Interrupted` becomes an empty read that the scanner retries.
#[derive(Debug)]
pub struct IoSource<R> {
    inner: R,
}

impl<R: io::Read> IoSource<R> {
    /// Wraps `inner`.
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    /// Returns the wrapped reader.
    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: io::Read> ScannerRead for IoSource<R> {
    fn scanner_read(&mut self, buf: &mut [u8]) -> Result<usize, ReadError> {
        match self.inner.read(buf) {
            Ok(0) if !buf.is_empty() => Err(ReadError::Eof),
            Ok(n) => Ok(n),
            Err(err) if err.kind() == io::ErrorKind::WouldBlock => Err(ReadError::NoNewData),
            Err(err) if err.kind() == io::ErrorKind::Interrupted => Ok(0),
            Err(err) => Err(ReadError::Io(err)),
        }
    }
}

/// Why the scanner is not currently reading.
#[derive(Debug)]
enum Halt {
    /// The source had nothing; try again after it is refilled.
    NoNewData,
    Eof,
    Failed(ScanError),
}

impl Halt {
    fn is_terminal(&self) -> bool {
        !matches!(self, Halt::NoNewData)
    }
}

/// Where the last token lives.
#[derive(Debug)]
enum Capture {
    /// A span of the working buffer.
    Span(Range<usize>),
    /// Bytes the split function produced itself.
    Owned(Vec<u8>),
}

impl Capture {
    /// `window` is `buf[offset..]` as shown to the split function.
    fn of(window: &[u8], offset: usize, token: Cow<'_, [u8]>) -> Self {
        match token {
            Cow::Borrowed(tok) => {
                let outer = window.as_ptr_range();
                let inner = tok.as_ptr_range();
                if outer.start <= inner.start && inner.end <= outer.end {
                    let at = offset + (inner.start.addr() - outer.start.addr());
                    Capture::Span(at..at + tok.len())
                } else {
                    Capture::Owned(tok.to_vec())
                }
            }
            Cow::Owned(tok) => Capture::Owned(tok),
        }
    }
}

/// Cuts the bytes of a [`ScannerRead`] source into tokens with a
/// [`Splitter`].
///
/// # Examples
///
/// ```rust
/// use streamsift::{RingBuffer, Scanner, json_split};
///
/// let ring = RingBuffer::new(64);
/// ring.write(br#"{"a":1} noise {"b":2}"#).unwrap();
///
/// let mut scanner = Scanner::new(&ring, json_split);
/// let mut tokens = Vec::new();
/// while scanner.scan() {
///     tokens.push(String::from_utf8_lossy(scanner.token()).into_owned());
/// }
/// assert_eq!(tokens, [r#"{"a":1}"#, r#"{"_msg": "noise"}"#, r#"{"b":2}"#]);
/// assert!(scanner.last_error().is_none());
/// ```
pub struct Scanner<R, S> {
    source: R,
    splitter: S,
    options: ScannerOptions,
    buf: Vec<u8>,
    start: usize,
    end: usize,
    token: Option<Capture>,
    halt: Option<Halt>,
    // Consecutive tokens returned at end-of-stream without advancing.
    empties: usize,
}

impl<R: ScannerRead, S: Splitter> Scanner<R, S> {
    /// Creates a scanner with default [`ScannerOptions`].
    pub fn new(source: R, splitter: S) -> Self {
        Self::with_options(source, splitter, ScannerOptions::default())
    }

    /// Creates a scanner with explicit options.
    pub fn with_options(source: R, splitter: S, options: ScannerOptions) -> Self {
        Self {
            source,
            splitter,
            options,
            buf: Vec::new(),
            start: 0,
            end: 0,
            token: None,
            halt: None,
            empties: 0,
        }
    }

    /// Advances to the next token.
    ///
    /// Returns `true` when a token is available through [`token`](Self::token).
    /// Returns `false` either because the source has nothing right now (call
    /// again after it is refilled) or because scanning stopped; use
    /// [`last_error`](Self::last_error) and [`is_eof`](Self::is_eof) to tell
    /// which.
    ///
    /// # Panics
    ///
    /// Panics if the split function keeps returning tokens without advancing
    /// at end of stream, more than [`ScannerOptions::max_empty_reads`] times
    /// in a row. That is a bug in the split function, and continuing would
    /// loop forever.
    pub fn scan(&mut self) -> bool {
        loop {
            // Try what we already hold. After a stop, give the split function
            // a chance to return a final token from the remaining bytes.
            if self.end > self.start || self.halt.is_some() {
                let at_eof = self.halt.as_ref().is_some_and(Halt::is_terminal);
                let transient = matches!(self.halt, Some(Halt::NoNewData));

                let window = &self.buf[self.start..self.end];
                let available = window.len();
                let (advance, token) = match self.splitter.split(window, at_eof) {
                    Ok(split) => split,
                    Err(err) => {
                        self.fail(err.into());
                        return false;
                    }
                };
                let captured = token.map(|tok| Capture::of(window, self.start, tok));

                if advance > available {
                    self.fail(ScanError::AdvanceTooFar { advance, available });
                    return false;
                }
                self.start += advance;

                match captured {
                    Some(capture) => {
                        self.token = Some(capture);
                        if at_eof && advance == 0 {
                            self.empties += 1;
                            assert!(
                                self.empties <= self.options.max_empty_reads,
                                "split function returned too many empty tokens without progressing"
                            );
                        } else {
                            if transient {
                                self.halt = None;
                            }
                            self.empties = 0;
                        }
                        return true;
                    }
                    None if transient && advance == 0 => {
                        self.halt = None;
                        return false;
                    }
                    None => {}
                }
            }

            match &self.halt {
                Some(halt) if halt.is_terminal() => {
                    self.start = 0;
                    self.end = 0;
                    return false;
                }
                // The split function skipped bytes without a token; look again.
                Some(Halt::NoNewData) => continue,
                _ => {}
            }

            if !self.make_room() {
                return false;
            }
            self.fill();
        }
    }

    /// The most recent token. Empty before the first successful
    /// [`scan`](Self::scan).
    #[must_use]
    pub fn token(&self) -> &[u8] {
        match &self.token {
            Some(Capture::Span(range)) => &self.buf[range.clone()],
            Some(Capture::Owned(bytes)) => bytes,
            None => &[],
        }
    }

    /// The error that stopped the scanner, if any. End of stream and the
    /// transient "no new data" state are not errors.
    #[must_use]
    pub fn last_error(&self) -> Option<&ScanError> {
        match &self.halt {
            Some(Halt::Failed(err)) => Some(err),
            _ => None,
        }
    }

    /// Whether the source reported end of stream and no failure followed.
    #[must_use]
    pub fn is_eof(&self) -> bool {
        matches!(self.halt, Some(Halt::Eof))
    }

    /// Clears a recorded failure so scanning can resume, and returns it.
    ///
    /// Bytes held in the working buffer are discarded: they are the ones the
    /// failure was about. Returns `None`, and changes nothing, if the scanner
    /// has not failed.
    pub fn recover(&mut self) -> Option<ScanError> {
        match self.halt.take() {
            Some(Halt::Failed(err)) => {
                self.start = 0;
                self.end = 0;
                self.token = None;
                self.empties = 0;
                Some(err)
            }
            other => {
                self.halt = other;
                None
            }
        }
    }

    /// Returns a reference to the source.
    pub fn source(&self) -> &R {
        &self.source
    }

    fn fail(&mut self, err: ScanError) {
        if matches!(self.halt, Some(Halt::Failed(_))) {
            return;
        }
        debug!(error = %err, "scanner stopped");
        self.halt = Some(Halt::Failed(err));
    }

    /// Ensures there is free space after `end`. Returns `false` if the token
    /// cannot grow any further.
    fn make_room(&mut self) -> bool {
        let len = self.buf.len();
        if self.start > 0 && (self.end == len || self.start > len / 2) {
            self.buf.copy_within(self.start..self.end, 0);
            self.end -= self.start;
            self.start = 0;
        }

        if self.end == len {
            let limit = self.options.max_token_size;
            if len >= limit {
                self.fail(ScanError::TooLong { limit });
                return false;
            }
            let doubled = len.saturating_mul(2);
            let size = if doubled == 0 {
                self.options.initial_buffer_size.max(1)
            } else {
                doubled
            };
            let size = size.min(limit);
            trace!(from = len, to = size, "scanner buffer grew");
            self.buf.resize(size, 0);
        }
        true
    }

    fn fill(&mut self) {
        let mut attempts = 0;
        loop {
            match self.source.scanner_read(&mut self.buf[self.end..]) {
                Ok(0) => {
                    attempts += 1;
                    if attempts > self.options.max_empty_reads {
                        self.fail(ScanError::NoProgress { attempts });
                        return;
                    }
                }
                Ok(n) if n > self.buf.len() - self.end => {
                    self.fail(ScanError::BadReadCount {
                        read: n,
                        room: self.buf.len() - self.end,
                    });
                    return;
                }
                Ok(n) => {
                    self.end += n;
                    self.empties = 0;
                    return;
                }
                Err(ReadError::NoNewData) => {
                    self.halt = Some(Halt::NoNewData);
                    return;
                }
                Err(ReadError::Eof) => {
                    self.halt = Some(Halt::Eof);
                    return;
                }
                Err(ReadError::Io(err)) => {
                    self.fail(ScanError::Source(err));
                    return;
                }
            }
        }
    }
}
