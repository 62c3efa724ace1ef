//! Output sinks for the writer.
//!
//! A sink vends mutable spans on demand and is told how many bytes were
//! committed into each. This decouples the encoder from the output's
//! allocation strategy: a growable vector, a fixed frame, or a pooled
//! segment all look the same to the writer.

/// A span-vending byte sink.
pub trait WriteSink {
    /// Return a writable span, ideally at least `hint` bytes long.
    ///
    /// A bounded sink that is out of capacity may return a shorter span —
    /// or an empty one, which the writer treats as failure to make progress
    /// after one retry.
    fn span(&mut self, hint: usize) -> &mut [u8];

    /// Commit the first `n` bytes of the most recently vended span.
    fn advance(&mut self, n: usize);
}

/// A growable sink backed by a `Vec<u8>`. Always honors the span hint.
#[derive(Debug, Default)]
pub struct VecSink {
    buf: Vec<u8>,
    committed: usize,
}

impl VecSink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a sink with pre-reserved capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        VecSink {
            buf: Vec::with_capacity(capacity),
            committed: 0,
        }
    }

    /// Number of committed bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.committed
    }

    /// Returns true if nothing has been committed.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.committed == 0
    }

    /// The committed bytes.
    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.buf[..self.committed]
    }

    /// Consume the sink, returning the committed bytes.
    pub fn into_vec(mut self) -> Vec<u8> {
        self.buf.truncate(self.committed);
        self.buf
    }
}

impl WriteSink for VecSink {
    fn span(&mut self, hint: usize) -> &mut [u8] {
        // over-provision small hints so byte-at-a-time writers don't
        // resize per call
        let want = hint.max(64);
        if self.buf.len() < self.committed + want {
            self.buf.resize(self.committed + want, 0);
        }
        &mut self.buf[self.committed..]
    }

    fn advance(&mut self, n: usize) {
        debug_assert!(
            self.committed + n <= self.buf.len(),
            "advance({n}) beyond vended span"
        );
        self.committed += n;
    }
}

/// A bounded sink writing into a caller-provided buffer.
///
/// Once the buffer fills, `span` returns empty slices and the writer
/// surfaces [`RespError::Invalid`](crate::RespError::Invalid).
#[derive(Debug)]
pub struct SliceSink<'a> {
    buf: &'a mut [u8],
    committed: usize,
}

impl<'a> SliceSink<'a> {
    /// Wrap a fixed buffer.
    pub fn new(buf: &'a mut [u8]) -> Self {
        SliceSink { buf, committed: 0 }
    }

    /// Number of committed bytes.
    #[inline]
    pub fn written(&self) -> usize {
        self.committed
    }

    /// The committed bytes.
    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.buf[..self.committed]
    }
}

impl WriteSink for SliceSink<'_> {
    fn span(&mut self, _hint: usize) -> &mut [u8] {
        &mut self.buf[self.committed..]
    }

    fn advance(&mut self, n: usize) {
        debug_assert!(
            self.committed + n <= self.buf.len(),
            "advance({n}) beyond vended span"
        );
        self.committed += n;
    }
}
