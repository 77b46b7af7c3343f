//! Turn an unstructured byte stream, typically a child process's stdout or
//! stderr, into structured field records as it is written.
//!
//! The pipeline runs one way:
//!
//! 1. [`RingBuffer`] takes writes at any pace and never blocks the writer.
//! 2. [`Scanner`] pulls from it without blocking and cuts tokens with a
//!    [`Splitter`], usually [`json_split`], which extracts JSON objects and
//!    wraps any text between them as `{"_msg": "..."}`.
//! 3. A [`Chain`] of [`Interpreter`]s turns each token into [`Fields`].
//! 4. [`Filter`] runs steps 2 and 3 on a worker thread and passes every record
//!    to a callback.
//!
//! ```rust
//! use std::io::Write;
//!
//! use streamsift::{Chain, Filter, FilterOptions};
//!
//! let mut filter = Filter::json(
//!     |fields| println!("{}", streamsift::Value::Object(fields)),
//!     Chain::json(),
//!     FilterOptions::default(),
//!     None,
//! )
//! .unwrap();
//! writeln!(filter, r#"{{"level":"info","msg":"hello"}}"#).unwrap();
//! filter.join().unwrap();
//! ```

mod error;
mod filter;
mod interpret;
mod options;
mod ring_buffer;
mod scanner;
mod split;
mod value;

#[cfg(test)]
mod tests;

pub use error::{BufferError, FilterError, ReadError, ScanError, SplitError};
pub use filter::Filter;
pub use interpret::{
    Chain, DefaultFields, Interpreter, JsonInterpreter, KeyValueInterpreter, LastChance,
    RedisInterpreter,
};
pub use options::{FilterOptions, MAX_SCAN_TOKEN_SIZE, ScannerOptions};
pub use ring_buffer::{DOUBLING_THRESHOLD, RingBuffer};
pub use scanner::{IoSource, Scanner, ScannerRead};
pub use split::{MAX_OBJECT_LENGTH, SplitResult, Splitter, json_split, scan_lines, wrap_message};
pub use value::{Fields, Value, escape_bytes, escape_string};
