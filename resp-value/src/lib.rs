//! RESP2/RESP3 value engine: compact values, a streaming parser over
//! segmented input, and a version-aware streaming writer.
//!
//! RESP2 frames:
//! - Simple String: `+OK\r\n`
//! - Error: `-ERR message\r\n`
//! - Number: `:1000\r\n`
//! - Blob String: `$6\r\nfoobar\r\n` (null form `$-1\r\n`)
//! - Array: `*2\r\n$3\r\nfoo\r\n$3\r\nbar\r\n`
//!
//! RESP3 adds Null (`_\r\n`), Boolean (`#t\r\n`), Double (`,3.14\r\n`),
//! Big Number (`(…\r\n`), Blob Error (`!…`), Verbatim String (`=…`),
//! Map (`%…`), Set (`~…`), Push (`>…`), and Attribute (`|…`). The writer
//! downgrades the RESP3-only shapes when targeting a RESP2 peer.
//!
//! # Values
//!
//! [`RespValue`] is immutable and cheap to clone. Payloads up to
//! [`INLINE_SIZE`] bytes (and scalar payloads) are stored inside the value
//! itself; larger payloads are refcounted [`bytes::Bytes`] — either owned,
//! or zero-copy views into the parse input that [`RespValue::preserve`]
//! detaches. An aggregate holding exactly one inline-sized child stores
//! that child in its own header and allocates nothing.
//!
//! # Parsing and writing
//!
//! ```
//! use resp_value::{ByteRope, RespType, RespValue, RespVersion, try_parse};
//!
//! // parse a pipelined request off segmented input
//! let rope = ByteRope::from(bytes::Bytes::from_static(b"*1\r\n$4\r\nPING\r\n"));
//! let parsed = try_parse(&rope).unwrap().expect("complete frame");
//! assert_eq!(parsed.consumed, 14);
//! assert_eq!(parsed.value, RespValue::command("PING"));
//!
//! // encode a reply for a RESP2 peer: the double becomes a simple string
//! let reply = RespValue::double(1.5);
//! assert_eq!(reply.to_vec(RespVersion::Resp2), b"+1.5\r\n");
//! assert_eq!(reply.to_vec(RespVersion::Resp3), b",1.5\r\n");
//! # let _ = RespType::Double;
//! ```
//!
//! Partial input is a normal condition, not an error: [`try_parse`] returns
//! `Ok(None)` until a complete frame is buffered, and never moves the
//! caller's rope.

mod error;
mod lease;
mod parser;
mod rope;
mod sink;
mod tag;
mod value;
mod writer;

pub use error::RespError;
pub use lease::PayloadLease;
pub use parser::{
    try_parse, try_parse_with, ParseLimits, Parsed, DEFAULT_MAX_AGGREGATE_LEN,
    DEFAULT_MAX_BLOB_LEN, DEFAULT_MAX_DEPTH,
};
pub use rope::{ByteRope, RopePos, RopeReader};
pub use sink::{SliceSink, VecSink, WriteSink};
pub use tag::{RespType, RespVersion};
pub use value::{RespValue, Storage, SubItems, INLINE_SIZE};
pub use writer::RespWriter;
