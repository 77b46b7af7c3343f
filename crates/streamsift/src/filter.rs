//! A byte sink that turns a process's output into field records.
//!
//! [`Filter`] owns a [`RingBuffer`] that producers write into and a worker
//! thread that scans the buffer, runs each token through a [`Chain`] and
//! hands the resulting [`Fields`] to an output callback.
//!
//! Lifecycle
//! - Writes go straight into the ring and never wait for the worker.
//! - The worker sleeps on the ring's notification channel, an internal
//!   cancellation channel and an optional external `done` channel. Each
//!   wake-up drains every token currently available, since notifications
//!   coalesce.
//! - [`Filter::close`] (or dropping the filter) ends the input: the worker
//!   drains what is left and exits at end of stream.
//! - [`Filter::cancel`], or any message on or disconnection of `done`, stops
//!   the worker before its next token even if bytes remain.
//! - A scanner failure other than end of stream is reported once through the
//!   output as `{"module": <source>, "level": "error", "error": <text>}` and
//!   scanning resumes.

use std::{
    io,
    sync::Arc,
    thread::{self, JoinHandle},
};

use crossbeam::{
    channel::{self, Receiver, Sender, TryRecvError},
    select,
};
use tracing::{debug, warn};

use crate::{
    error::FilterError,
    interpret::Chain,
    options::FilterOptions,
    ring_buffer::RingBuffer,
    scanner::Scanner,
    split::{Splitter, json_split, scan_lines},
    value::{Fields, Value},
};

/// Streams written bytes through a split function and an interpreter chain on
/// a worker thread.
///
/// # Examples
///
/// ```rust
/// use std::io::Write;
///
/// use crossbeam::channel;
/// use streamsift::{Chain, Filter, FilterOptions, Value};
///
/// let (tx, rx) = channel::unbounded();
/// let mut filter = Filter::json(
///     move |fields| tx.send(fields).unwrap(),
///     Chain::json(),
///     FilterOptions::default(),
///     None,
/// )
/// .unwrap();
///
/// filter.write_all(br#"{"level":"info","#).unwrap();
/// filter.write_all(b"\"msg\":\"ready\"}\nstray text\n").unwrap();
/// filter.join().unwrap();
///
/// let records: Vec<_> = rx.iter().collect();
/// assert_eq!(records.len(), 2);
/// assert_eq!(records[0]["msg"], Value::from("ready"));
/// assert_eq!(records[1]["_msg"], Value::from("stray text"));
/// ```
#[derive(Debug)]
pub struct Filter {
    ring: Arc<RingBuffer>,
    cancel: Sender<()>,
    worker: Option<JoinHandle<()>>,
}

impl Filter {
    /// Starts a filter with an arbitrary split function.
    ///
    /// `output` is called on the worker thread once per token. If `done` is
    /// given, a message on it or its disconnection stops the worker.
    ///
    /// # Errors
    ///
    /// [`FilterError::Spawn`] if the worker thread cannot be started.
    pub fn spawn<S, O>(
        splitter: S,
        output: O,
        chain: Chain,
        options: FilterOptions,
        done: Option<Receiver<()>>,
    ) -> Result<Self, FilterError>
    where
        S: Splitter + Send + 'static,
        O: FnMut(Fields) + Send + 'static,
    {
        let ring = Arc::new(RingBuffer::new(options.initial_capacity));
        let (cancel, cancel_rx) = channel::bounded(1);

        let worker = Worker {
            scanner: Scanner::with_options(Arc::clone(&ring), splitter, options.scanner),
            notify: ring.notifications(),
            ring: Arc::clone(&ring),
            chain,
            output,
            source: options.source.clone(),
            cancel: cancel_rx,
            done: done.unwrap_or_else(channel::never),
        };
        let handle = thread::Builder::new()
            .name(format!("{}-filter", options.source))
            .spawn(move || worker.run())
            .map_err(FilterError::Spawn)?;

        Ok(Self {
            ring,
            cancel,
            worker: Some(handle),
        })
    }

    /// Starts a filter for output made of JSON objects, using
    /// [`json_split`].
    ///
    /// # Errors
    ///
    /// [`FilterError::Spawn`] if the worker thread cannot be started.
    pub fn json<O>(
        output: O,
        chain: Chain,
        options: FilterOptions,
        done: Option<Receiver<()>>,
    ) -> Result<Self, FilterError>
    where
        O: FnMut(Fields) + Send + 'static,
    {
        Self::spawn(json_split, output, chain, options, done)
    }

    /// Starts a filter for line-oriented output, using [`scan_lines`].
    ///
    /// # Errors
    ///
    /// [`FilterError::Spawn`] if the worker thread cannot be started.
    pub fn lines<O>(
        output: O,
        chain: Chain,
        options: FilterOptions,
        done: Option<Receiver<()>>,
    ) -> Result<Self, FilterError>
    where
        O: FnMut(Fields) + Send + 'static,
    {
        Self::spawn(scan_lines, output, chain, options, done)
    }

    /// The ring buffer behind the filter, e.g. to watch its occupancy.
    #[must_use]
    pub fn ring(&self) -> &RingBuffer {
        &self.ring
    }

    /// Marks the input finished. The worker emits the remaining records and
    /// exits.
    pub fn close(&self) {
        self.ring.close();
    }

    /// Stops the worker before its next token, discarding unread input.
    pub fn cancel(&self) {
        // A full channel means cancellation is already pending.
        let _ = self.cancel.try_send(());
    }

    /// Closes the input and waits until every record has been emitted.
    ///
    /// # Errors
    ///
    /// Returns the panic payload if the worker panicked, for instance inside
    /// the output callback.
    pub fn join(mut self) -> thread::Result<()> {
        self.close();
        match self.worker.take() {
            Some(handle) => handle.join(),
            None => Ok(()),
        }
    }

    /// Whether the worker thread has exited.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.worker.as_ref().is_none_or(JoinHandle::is_finished)
    }
}

impl Drop for Filter {
    fn drop(&mut self) {
        self.ring.close();
    }
}

impl io::Write for Filter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Ok(self.ring.write(buf)?)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl io::Write for &Filter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Ok(self.ring.write(buf)?)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

enum Wake {
    Data,
    Cancel,
    HandleDropped,
}

enum Drained {
    /// Nothing more right now.
    Waiting,
    Finished,
    Cancelled,
}

struct Worker<S, O> {
    scanner: Scanner<Arc<RingBuffer>, S>,
    notify: Receiver<()>,
    ring: Arc<RingBuffer>,
    chain: Chain,
    output: O,
    source: String,
    cancel: Receiver<()>,
    done: Receiver<()>,
}

impl<S: Splitter, O: FnMut(Fields)> Worker<S, O> {
    fn run(mut self) {
        debug!(source = %self.source, "filter worker started");
        loop {
            let wake = select! {
                recv(self.cancel) -> msg => match msg {
                    Ok(()) => Wake::Cancel,
                    Err(_) => Wake::HandleDropped,
                },
                recv(self.done) -> _ => Wake::Cancel,
                recv(self.notify) -> _ => Wake::Data,
            };
            let drained = match wake {
                Wake::Data => self.drain(),
                Wake::Cancel => Drained::Cancelled,
                // Dropping the handle closed the ring; the notification
                // channel reports that next.
                Wake::HandleDropped => {
                    self.cancel = channel::never();
                    Drained::Waiting
                }
            };
            match drained {
                Drained::Waiting => {}
                Drained::Finished => {
                    debug!(source = %self.source, "filter worker reached end of stream");
                    return;
                }
                Drained::Cancelled => {
                    debug!(source = %self.source, unread = self.ring.len(), "filter worker cancelled");
                    return;
                }
            }
        }
    }

    fn cancelled(&self) -> bool {
        self.cancel.try_recv().is_ok() || !matches!(self.done.try_recv(), Err(TryRecvError::Empty))
    }

    fn drain(&mut self) -> Drained {
        loop {
            while self.scanner.scan() {
                if self.cancelled() {
                    return Drained::Cancelled;
                }
                let fields = self.chain.run(self.scanner.token());
                (self.output)(fields);
            }

            if self.scanner.is_eof() {
                return Drained::Finished;
            }
            let Some(err) = self.scanner.recover() else {
                return Drained::Waiting;
            };

            warn!(source = %self.source, error = %err, "scanner failed, resuming");
            (self.output)(Fields::from([
                ("module".to_owned(), Value::from(self.source.as_str())),
                ("level".to_owned(), Value::from("error")),
                ("error".to_owned(), Value::from(err.to_string())),
            ]));
            if self.ring.is_closed() && self.ring.is_empty() {
                return Drained::Finished;
            }
        }
    }
}
