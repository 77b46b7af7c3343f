/// Maximum size of a token unless configured otherwise.
pub const MAX_SCAN_TOKEN_SIZE: usize = 1024 * 1024;

/// Configuration for a [`Scanner`](crate::Scanner).
///
/// # Examples
///
/// ```rust
/// use streamsift::{RingBuffer, Scanner, ScannerOptions, json_split};
///
/// let ring = RingBuffer::new(64);
/// let scanner = Scanner::with_options(
///     &ring,
///     json_split,
///     ScannerOptions {
///         max_token_size: 64 * 1024,
///         ..Default::default()
///     },
/// );
/// # drop(scanner);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScannerOptions {
    /// Size of the working buffer allocated on the first read.
    ///
    /// # Default
    ///
    /// `4096`
    pub initial_buffer_size: usize,

    /// Largest token the scanner will buffer. The working buffer doubles on
    /// demand up to this size; a token that still does not fit stops the
    /// scanner with [`ScanError::TooLong`](crate::ScanError::TooLong).
    ///
    /// # Default
    ///
    /// [`MAX_SCAN_TOKEN_SIZE`] (1 MiB)
    pub max_token_size: usize,

    /// How many consecutive zero-byte reads without an error or a
    /// "no new data" report are tolerated before the scanner gives up with
    /// [`ScanError::NoProgress`](crate::ScanError::NoProgress).
    ///
    /// # Default
    ///
    /// `100`
    pub max_empty_reads: usize,
}

impl Default for ScannerOptions {
    fn default() -> Self {
        Self {
            initial_buffer_size: 4096,
            max_token_size: MAX_SCAN_TOKEN_SIZE,
            max_empty_reads: 100,
        }
    }
}

/// Configuration for a [`Filter`](crate::Filter).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterOptions {
    /// Initial capacity of the filter's ring buffer.
    ///
    /// # Default
    ///
    /// `4096`
    pub initial_capacity: usize,

    /// Name reported in the `module` field of diagnostic records and used to
    /// name the worker thread.
    ///
    /// # Default
    ///
    /// `"filter"`
    pub source: String,

    /// Options for the scanner the worker runs.
    pub scanner: ScannerOptions,
}

impl Default for FilterOptions {
    fn default() -> Self {
        Self {
            initial_capacity: 4096,
            source: "filter".into(),
            scanner: ScannerOptions::default(),
        }
    }
}
