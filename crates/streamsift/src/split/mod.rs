//! Split functions decide where one token ends.
//!
//! A split function is handed the unconsumed window of the scanner's working
//! buffer and whether the source has ended. It answers with how many bytes to
//! advance and, optionally, a token. Returning `(0, None)` asks the scanner for
//! more data. Tokens may borrow from the window or be built fresh.

mod json;
mod lines;

use std::borrow::Cow;

pub use json::{MAX_OBJECT_LENGTH, json_split, wrap_message};
pub use lines::scan_lines;

use crate::error::SplitError;

/// Result of one split call: the advance count and an optional token.
pub type SplitResult<'a> = Result<(usize, Option<Cow<'a, [u8]>>), SplitError>;

/// Tokenization policy used by a [`Scanner`](crate::Scanner).
///
/// Any `FnMut(&[u8], bool) -> SplitResult<'_>` is a splitter, so plain
/// functions such as [`json_split`] and [`scan_lines`] can be passed directly.
/// Implement the trait by hand when the policy needs state.
pub trait Splitter {
    /// Splits the next token off `data`.
    ///
    /// `data` may be empty even before end of stream, for instance right
    /// after the source reported it had nothing new.
    ///
    /// # Errors
    ///
    /// A returned [`SplitError`] stops the scanner.
    fn split<'a>(&mut self, data: &'a [u8], at_eof: bool) -> SplitResult<'a>;
}

impl<F> Splitter for F
where
    F: for<'a> FnMut(&'a [u8], bool) -> SplitResult<'a>,
{
    fn split<'a>(&mut self, data: &'a [u8], at_eof: bool) -> SplitResult<'a> {
        self(data, at_eof)
    }
}
