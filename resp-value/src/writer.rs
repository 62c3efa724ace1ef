//! Streaming RESP encoder.
//!
//! The writer walks a value tree and emits wire frames into a
//! [`WriteSink`], chunking payload copies across span boundaries as
//! needed. The target [`RespVersion`] drives the downgrade of RESP3-only
//! tags when talking to an older peer:
//!
//! - Boolean / Double / BigNumber frames become simple strings
//! - verbatim strings become blob strings
//! - push / map / set frames become arrays (a downgraded map's element
//!   count is its raw child count)
//! - nulls fall back to the `<prefix>-1\r\n` form, with `$-1\r\n` for the
//!   untyped null

use crate::error::RespError;
use crate::sink::{VecSink, WriteSink};
use crate::tag::{RespType, RespVersion};
use crate::value::{RespValue, ScalarText};

/// A streaming encoder targeting one sink at one protocol version.
pub struct RespWriter<'a, S: WriteSink> {
    sink: &'a mut S,
    version: RespVersion,
    total: usize,
}

impl<'a, S: WriteSink> RespWriter<'a, S> {
    /// Create a writer over `sink` targeting `version`.
    pub fn new(sink: &'a mut S, version: RespVersion) -> Self {
        RespWriter {
            sink,
            version,
            total: 0,
        }
    }

    /// The protocol version frames are encoded for.
    #[inline]
    pub fn version(&self) -> RespVersion {
        self.version
    }

    /// Total bytes committed so far.
    #[inline]
    pub fn total(&self) -> usize {
        self.total
    }

    /// Encode one complete value frame (recursing through aggregates).
    pub fn write_value(&mut self, value: &RespValue) -> Result<(), RespError> {
        self.write_frame(value)
    }

    /// Finish writing and return the total number of bytes committed.
    pub fn finish(self) -> usize {
        self.total
    }

    fn write_frame(&mut self, value: &RespValue) -> Result<(), RespError> {
        if value.is_null() {
            return self.put_null(value.resp_type());
        }
        let tag = value.resp_type().downgrade(self.version);
        if value.can_unwrap() {
            // folded unit aggregate: count is 1, the child frame comes
            // straight out of the parent's storage
            self.put_prefix(tag)?;
            self.put_slice(b"1\r\n")?;
            return self.write_frame(&value.unwrap_unit());
        }
        if value.is_aggregate() {
            let count = value.child_count() / tag.multiplier();
            self.put_prefix(tag)?;
            self.put_slice(ScalarText::length(count).as_bytes())?;
            self.put_crlf()?;
            for child in value.sub_items() {
                self.write_frame(&child)?;
            }
            return Ok(());
        }
        let chunks = value.payload_chunks();
        self.put_prefix(tag)?;
        if tag.is_blob() {
            self.put_slice(ScalarText::length(chunks.total_len()).as_bytes())?;
            self.put_crlf()?;
            for chunk in chunks.iter() {
                self.put_slice(chunk)?;
            }
        } else {
            for chunk in chunks.iter() {
                self.put_slice(chunk)?;
            }
        }
        self.put_crlf()
    }

    /// Null frames: `_\r\n` for the untyped RESP3 null, `<prefix>-1\r\n`
    /// otherwise. The typed form is kept at RESP3 so a parsed `$-1\r\n`
    /// re-encodes to the same bytes.
    fn put_null(&mut self, tag: RespType) -> Result<(), RespError> {
        if self.version >= RespVersion::Resp3 {
            if tag == RespType::Null {
                return self.put_slice(b"_\r\n");
            }
            self.put_prefix(tag)?;
            return self.put_slice(b"-1\r\n");
        }
        self.put_prefix(tag.downgrade(self.version))?;
        self.put_slice(b"-1\r\n")
    }

    #[inline]
    fn put_prefix(&mut self, tag: RespType) -> Result<(), RespError> {
        debug_assert!(tag != RespType::Unknown, "cannot write the Unknown tag");
        self.put_slice(&[tag.prefix()])
    }

    #[inline]
    fn put_crlf(&mut self) -> Result<(), RespError> {
        self.put_slice(b"\r\n")
    }

    /// Copy `data` into the sink, spilling across as many spans as needed.
    /// Two consecutive empty spans mean the sink cannot absorb more bytes.
    fn put_slice(&mut self, mut data: &[u8]) -> Result<(), RespError> {
        let mut stalled = false;
        while !data.is_empty() {
            let span = self.sink.span(data.len());
            if span.is_empty() {
                if stalled {
                    return Err(RespError::Invalid("encode failed to complete"));
                }
                stalled = true;
                continue;
            }
            stalled = false;
            let n = span.len().min(data.len());
            span[..n].copy_from_slice(&data[..n]);
            self.sink.advance(n);
            self.total += n;
            data = &data[n..];
        }
        Ok(())
    }
}

impl RespValue {
    /// Encode this value into `sink` at `version`. Returns the number of
    /// bytes written.
    pub fn write<S: WriteSink>(
        &self,
        sink: &mut S,
        version: RespVersion,
    ) -> Result<usize, RespError> {
        let mut writer = RespWriter::new(sink, version);
        writer.write_value(self)?;
        Ok(writer.finish())
    }

    /// Encode this value into a fresh `Vec<u8>` at `version`.
    pub fn to_vec(&self, version: RespVersion) -> Vec<u8> {
        let mut sink = VecSink::with_capacity(64);
        self.write(&mut sink, version)
            .expect("growable sinks always make progress");
        sink.into_vec()
    }
}
