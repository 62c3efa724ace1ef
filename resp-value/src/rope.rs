//! Segmented input buffers and the cursor the parser walks over them.
//!
//! Network receive paths rarely hand the parser one contiguous allocation:
//! a frame may begin at the tail of one receive buffer and continue in the
//! next. [`ByteRope`] models that shape directly as an ordered run of
//! [`Bytes`] segments, and [`RopeReader`] is a cheap copyable cursor over it.
//! Payload extraction is zero-copy: slices are refcounted views into the
//! original segments.

use bytes::Bytes;
use memchr::memchr;

use crate::error::RespError;

/// A discontiguous byte sequence: an ordered run of [`Bytes`] segments.
///
/// Empty segments are dropped on insertion, so every stored segment holds at
/// least one byte.
#[derive(Debug, Clone, Default)]
pub struct ByteRope {
    segments: Vec<Bytes>,
    len: usize,
}

impl ByteRope {
    /// Create an empty rope.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a segment. Empty segments are ignored.
    pub fn push(&mut self, segment: Bytes) {
        if !segment.is_empty() {
            self.len += segment.len();
            self.segments.push(segment);
        }
    }

    /// Total byte length across all segments.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if the rope holds no bytes.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The backing segments.
    #[inline]
    pub fn segments(&self) -> &[Bytes] {
        &self.segments
    }

    /// A reader positioned at the start of the rope.
    #[inline]
    pub fn reader(&self) -> RopeReader<'_> {
        RopeReader {
            rope: self,
            seg: 0,
            off: 0,
            abs: 0,
        }
    }
}

impl From<Bytes> for ByteRope {
    fn from(segment: Bytes) -> Self {
        let mut rope = ByteRope::new();
        rope.push(segment);
        rope
    }
}

impl From<Vec<u8>> for ByteRope {
    fn from(bytes: Vec<u8>) -> Self {
        ByteRope::from(Bytes::from(bytes))
    }
}

impl FromIterator<Bytes> for ByteRope {
    fn from_iter<I: IntoIterator<Item = Bytes>>(iter: I) -> Self {
        let mut rope = ByteRope::new();
        for segment in iter {
            rope.push(segment);
        }
        rope
    }
}

/// A position within a [`ByteRope`], as reported by a [`RopeReader`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RopePos {
    /// Index of the segment the position falls in (may be one past the last
    /// segment when the rope is fully consumed).
    pub segment: usize,
    /// Byte offset within that segment.
    pub offset: usize,
    /// Absolute byte offset from the start of the rope.
    pub consumed: usize,
}

/// Zero-copy payload extracted by [`RopeReader::take`].
#[derive(Debug, Clone)]
pub(crate) enum Taken {
    /// The requested range fell inside one segment.
    Contig(Bytes),
    /// The range straddled segment boundaries; parts are in order.
    Split(Vec<Bytes>),
}

/// A copyable cursor over a [`ByteRope`].
///
/// Readers never mutate the rope; parsing works on a local copy and the
/// caller's reader observes no motion until a frame fully assembles.
#[derive(Debug, Clone, Copy)]
pub struct RopeReader<'a> {
    rope: &'a ByteRope,
    seg: usize,
    off: usize,
    abs: usize,
}

impl<'a> RopeReader<'a> {
    /// Bytes left between the cursor and the end of the rope.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.rope.len - self.abs
    }

    /// Absolute bytes consumed from the start of the rope.
    #[inline]
    pub fn consumed(&self) -> usize {
        self.abs
    }

    /// The cursor's current position.
    #[inline]
    pub fn position(&self) -> RopePos {
        RopePos {
            segment: self.seg,
            offset: self.off,
            consumed: self.abs,
        }
    }

    /// The byte under the cursor, if any.
    #[inline]
    pub fn peek(&self) -> Option<u8> {
        self.rope.segments.get(self.seg).map(|s| s[self.off])
    }

    /// Read and consume one byte.
    #[inline]
    pub fn read_u8(&mut self) -> Option<u8> {
        let byte = self.peek()?;
        self.advance(1);
        Some(byte)
    }

    /// Move the cursor forward by `n` bytes.
    ///
    /// # Panics (debug)
    /// Panics if `n` exceeds [`remaining`](Self::remaining).
    pub fn advance(&mut self, n: usize) {
        debug_assert!(
            n <= self.remaining(),
            "advance({n}) exceeds remaining {}",
            self.remaining()
        );
        let mut left = n;
        while left > 0 {
            let seg_len = self.rope.segments[self.seg].len();
            let avail = seg_len - self.off;
            if left < avail {
                self.off += left;
                break;
            }
            left -= avail;
            self.seg += 1;
            self.off = 0;
        }
        self.abs += n;
    }

    /// Locate the CRLF terminating the current line.
    ///
    /// Returns `Ok(Some(n))` where `n` is the line length (bytes before the
    /// `\r`), `Ok(None)` when either marker has not arrived yet, and
    /// [`RespError::ExpectedNewLine`] when the first `\r` is followed by
    /// anything other than `\n`. The cursor does not move.
    pub fn find_crlf(&self) -> Result<Option<usize>, RespError> {
        let segments = self.rope.segments();
        let mut scanned = 0usize;
        let mut seg = self.seg;
        let mut start = self.off;
        while seg < segments.len() {
            let hay = &segments[seg][start..];
            match memchr(b'\r', hay) {
                Some(i) => {
                    let after = if i + 1 < hay.len() {
                        Some(hay[i + 1])
                    } else {
                        segments.get(seg + 1).map(|s| s[0])
                    };
                    return match after {
                        Some(b'\n') => Ok(Some(scanned + i)),
                        Some(other) => Err(RespError::ExpectedNewLine(other)),
                        None => Ok(None),
                    };
                }
                None => {
                    scanned += hay.len();
                    seg += 1;
                    start = 0;
                }
            }
        }
        Ok(None)
    }

    /// Extract `n` bytes as refcounted slices of the backing segments and
    /// advance past them.
    ///
    /// # Panics (debug)
    /// Panics if `n` exceeds [`remaining`](Self::remaining).
    pub(crate) fn take(&mut self, n: usize) -> Taken {
        debug_assert!(
            n <= self.remaining(),
            "take({n}) exceeds remaining {}",
            self.remaining()
        );
        if n == 0 {
            return Taken::Contig(Bytes::new());
        }
        let segments = self.rope.segments();
        let first = &segments[self.seg];
        let avail = first.len() - self.off;
        if n <= avail {
            let contig = first.slice(self.off..self.off + n);
            self.advance(n);
            return Taken::Contig(contig);
        }
        let mut parts = Vec::with_capacity(2);
        parts.push(first.slice(self.off..));
        let mut left = n - avail;
        let mut seg = self.seg + 1;
        while left > 0 {
            let s = &segments[seg];
            if left <= s.len() {
                parts.push(s.slice(..left));
                left = 0;
            } else {
                parts.push(s.clone());
                left -= s.len();
            }
            seg += 1;
        }
        self.advance(n);
        Taken::Split(parts)
    }
}
