//! Path-addressed access to tool call arguments.
//!
//! Arguments may arrive incrementally: an external source feeds
//! progressively more complete snapshots into an [`ArgumentsWriter`],
//! and the tool implementation reads through the paired
//! [`ArgumentsReader`]. A reader offers three consumption modes for a
//! [`Path`] into the argument value:
//!
//! - [`get`] resolves the final value at the path;
//! - [`stream`] yields successively more complete partial values as
//!   data arrives;
//! - [`for_each`] yields the elements of an array one by one, as each
//!   element becomes complete.
//!
//! All modes respect the abort signal of the tool invocation they are
//! scoped to; cancellation is the only early-termination mechanism.
//!
//! [`get`]: ArgumentsReader::get
//! [`stream`]: ArgumentsReader::stream
//! [`for_each`]: ArgumentsReader::for_each

mod error;
mod path;
mod reader;
mod source;

pub use error::{Error, ErrorKind};
pub use path::{Path, PathSegment};
pub use reader::{ArgumentsReader, ElementStream, ValueStream};
pub use source::{ArgumentsWriter, channel};
