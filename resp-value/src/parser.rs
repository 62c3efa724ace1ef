//! Streaming RESP frame parser.
//!
//! The parser walks a [`RopeReader`] over segmented input and assembles one
//! complete value frame, returning how many bytes it spans. Payloads are
//! zero-copy views into the input segments wherever they exceed the inline
//! size; callers that keep values past the input's lifetime use
//! [`RespValue::preserve`].
//!
//! Partial input is not an error: [`try_parse`] returns `Ok(None)` and the
//! caller's rope is left untouched, so the same bytes (plus whatever arrived
//! since) can be offered again.

use bytes::Bytes;

use crate::error::RespError;
use crate::rope::{ByteRope, RopePos, RopeReader, Taken};
use crate::tag::RespType;
use crate::value::RespValue;

/// Default maximum nesting depth for aggregates.
///
/// Parsing is recursive; bounding the depth bounds stack growth. Typical
/// command and reply shapes stay within 2-3 levels.
pub const DEFAULT_MAX_DEPTH: usize = 32;

/// Default maximum blob payload size (512 MiB, the classic server limit).
pub const DEFAULT_MAX_BLOB_LEN: usize = 512 * 1024 * 1024;

/// Default maximum child count for one aggregate frame.
pub const DEFAULT_MAX_AGGREGATE_LEN: usize = 1024 * 1024;

/// A length line (`-1`, `0`, a positive count) never needs more bytes than
/// this; longer lines are malformed.
const MAX_LENGTH_LINE: usize = 20;

/// Allocation and recursion clamps applied while parsing.
///
/// A hostile peer can claim arbitrarily large frames in a few bytes; these
/// limits cap what the parser will allocate or recurse into before the
/// payload actually arrives.
#[derive(Debug, Clone, Copy)]
pub struct ParseLimits {
    /// Maximum aggregate nesting depth.
    pub max_depth: usize,
    /// Maximum blob payload length in bytes.
    pub max_blob_len: usize,
    /// Maximum total child values in one aggregate frame.
    pub max_aggregate_len: usize,
}

impl Default for ParseLimits {
    fn default() -> Self {
        Self::new()
    }
}

impl ParseLimits {
    /// Limits with the default clamps.
    pub const fn new() -> Self {
        ParseLimits {
            max_depth: DEFAULT_MAX_DEPTH,
            max_blob_len: DEFAULT_MAX_BLOB_LEN,
            max_aggregate_len: DEFAULT_MAX_AGGREGATE_LEN,
        }
    }

    /// Set the maximum nesting depth.
    pub const fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Set the maximum blob payload length.
    pub const fn max_blob_len(mut self, len: usize) -> Self {
        self.max_blob_len = len;
        self
    }

    /// Set the maximum aggregate child count.
    pub const fn max_aggregate_len(mut self, len: usize) -> Self {
        self.max_aggregate_len = len;
        self
    }
}

/// A completely parsed frame.
#[derive(Debug, Clone)]
pub struct Parsed {
    /// The assembled value (possibly borrowing from the input rope).
    pub value: RespValue,
    /// Bytes the frame spans from the start of the rope.
    pub consumed: usize,
    /// Position of the first byte after the frame.
    pub end: RopePos,
}

/// Parse one frame from the front of `rope` with default limits.
///
/// Returns `Ok(None)` when the rope does not yet hold a complete frame.
pub fn try_parse(rope: &ByteRope) -> Result<Option<Parsed>, RespError> {
    try_parse_with(rope, &ParseLimits::new())
}

/// Parse one frame from the front of `rope` with explicit limits.
pub fn try_parse_with(rope: &ByteRope, limits: &ParseLimits) -> Result<Option<Parsed>, RespError> {
    let mut reader = rope.reader();
    match parse_frame(&mut reader, limits, 0) {
        Ok(value) => Ok(Some(Parsed {
            value,
            consumed: reader.consumed(),
            end: reader.position(),
        })),
        Err(err) if err.is_incomplete() => Ok(None),
        Err(err) => Err(err),
    }
}

impl RespValue {
    /// Parse one frame from contiguous bytes.
    ///
    /// Returns the value and the number of bytes consumed; partial input
    /// surfaces as [`RespError::Incomplete`].
    pub fn parse(data: impl Into<Bytes>) -> Result<(RespValue, usize), RespError> {
        let rope = ByteRope::from(data.into());
        match try_parse(&rope)? {
            Some(parsed) => Ok((parsed.value, parsed.consumed)),
            None => Err(RespError::Incomplete),
        }
    }
}

fn parse_frame(
    reader: &mut RopeReader<'_>,
    limits: &ParseLimits,
    depth: usize,
) -> Result<RespValue, RespError> {
    let prefix = reader.read_u8().ok_or(RespError::Incomplete)?;
    let tag = RespType::from_prefix(prefix).ok_or(RespError::TypeNotImplemented(prefix))?;
    if tag.is_aggregate() {
        parse_aggregate(reader, tag, limits, depth)
    } else if tag.is_blob() {
        parse_blob(reader, tag, limits)
    } else {
        parse_line(reader, tag)
    }
}

/// Line frames: everything up to CRLF is the payload.
fn parse_line(reader: &mut RopeReader<'_>, tag: RespType) -> Result<RespValue, RespError> {
    let line_len = match reader.find_crlf()? {
        Some(n) => n,
        None => return Err(RespError::Incomplete),
    };
    if tag == RespType::Null {
        if line_len != 0 {
            return Err(RespError::Invalid("null frame carries a payload"));
        }
        reader.advance(2);
        return Ok(RespValue::NULL);
    }
    let payload = reader.take(line_len);
    reader.advance(2);
    Ok(RespValue::from_wire_bytes(tag, payload))
}

/// Blob frames: `<len>\r\n<payload>\r\n`, with `-1` as the length-only null
/// form (no payload CRLF follows it).
fn parse_blob(
    reader: &mut RopeReader<'_>,
    tag: RespType,
    limits: &ParseLimits,
) -> Result<RespValue, RespError> {
    let len = read_length(reader)?;
    if len == -1 {
        return Ok(RespValue::null_of(tag));
    }
    let len = len as usize;
    if len > limits.max_blob_len {
        return Err(RespError::OutOfRange("blob length exceeds limit"));
    }
    if reader.remaining() < len + 2 {
        return Err(RespError::Incomplete);
    }
    let payload = reader.take(len);
    require_crlf(reader)?;
    Ok(RespValue::from_wire_bytes(tag, payload))
}

/// Aggregate frames: `<count>\r\n` then `count * multiplier` child frames.
fn parse_aggregate(
    reader: &mut RopeReader<'_>,
    tag: RespType,
    limits: &ParseLimits,
    depth: usize,
) -> Result<RespValue, RespError> {
    if depth >= limits.max_depth {
        return Err(RespError::Invalid("aggregate nesting too deep"));
    }
    let len = read_length(reader)?;
    if len == -1 {
        return Ok(RespValue::null_of(tag));
    }
    let total = (len as usize)
        .checked_mul(tag.multiplier())
        .ok_or(RespError::OutOfRange("aggregate length overflow"))?;
    if total > limits.max_aggregate_len {
        return Err(RespError::OutOfRange("aggregate length exceeds limit"));
    }
    if total == 0 {
        return Ok(RespValue::empty_of(tag));
    }
    if total == 1 {
        let child = parse_frame(reader, limits, depth + 1)?;
        if child.can_wrap() {
            return Ok(child.wrap(tag));
        }
        return Ok(RespValue::from_items(tag, vec![child]));
    }
    let mut children = Vec::with_capacity(total.min(1024));
    for _ in 0..total {
        children.push(parse_frame(reader, limits, depth + 1)?);
    }
    Ok(RespValue::from_items(tag, children))
}

/// Read a length line: signed ASCII decimal, `-1` meaning null. The line is
/// consumed including its CRLF.
fn read_length(reader: &mut RopeReader<'_>) -> Result<i64, RespError> {
    let line_len = match reader.find_crlf()? {
        Some(n) => n,
        None => return Err(RespError::Incomplete),
    };
    if line_len == 0 || line_len > MAX_LENGTH_LINE {
        return Err(RespError::Format("length line must be 1..=20 bytes"));
    }
    let taken = reader.take(line_len);
    reader.advance(2);
    let mut scratch = [0u8; MAX_LENGTH_LINE];
    let text: &[u8] = match &taken {
        Taken::Contig(bytes) => bytes,
        Taken::Split(parts) => {
            let mut at = 0;
            for part in parts {
                scratch[at..at + part.len()].copy_from_slice(part);
                at += part.len();
            }
            &scratch[..at]
        }
    };
    let (negative, digits) = match text.first() {
        Some(b'-') => (true, &text[1..]),
        _ => (false, text),
    };
    if digits.is_empty() {
        return Err(RespError::Format("length has no digits"));
    }
    let mut value: i64 = 0;
    for &byte in digits {
        if !byte.is_ascii_digit() {
            return Err(RespError::Format("length must be decimal digits"));
        }
        value = value
            .checked_mul(10)
            .and_then(|v| v.checked_add(i64::from(byte - b'0')))
            .ok_or(RespError::Format("length overflow"))?;
    }
    if negative {
        if value != 1 {
            return Err(RespError::Format("negative length must be -1"));
        }
        return Ok(-1);
    }
    Ok(value)
}

/// Consume a CRLF pair, or report what stood in its place.
fn require_crlf(reader: &mut RopeReader<'_>) -> Result<(), RespError> {
    if reader.remaining() < 2 {
        return Err(RespError::Incomplete);
    }
    for expected in [b'\r', b'\n'] {
        match reader.read_u8() {
            Some(byte) if byte == expected => {}
            Some(byte) => return Err(RespError::ExpectedNewLine(byte)),
            None => return Err(RespError::Incomplete),
        }
    }
    Ok(())
}
