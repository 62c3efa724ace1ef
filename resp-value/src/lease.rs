//! Pooled payload buffers for building blob values.
//!
//! A lease hands out a zeroed scratch buffer from a thread-local pool. The
//! caller fills it (e.g. by receiving bytes straight into it) and commits it
//! into a value; buffers dropped without committing go back to the pool.
//! Ownership makes aliasing a leased buffer across disposals unrepresentable.

use std::cell::RefCell;
use std::mem;
use std::ops::{Deref, DerefMut};

use crate::error::RespError;
use crate::tag::RespType;
use crate::value::{RespValue, INLINE_SIZE};

/// Buffers retained per thread once released.
const POOL_KEEP: usize = 8;

thread_local! {
    static POOL: RefCell<Vec<Vec<u8>>> = const { RefCell::new(Vec::new()) };
}

fn release(buf: Vec<u8>) {
    POOL.with(|pool| {
        let mut pool = pool.borrow_mut();
        if pool.len() < POOL_KEEP {
            pool.push(buf);
        }
    });
}

/// A leased, zero-initialized payload buffer of fixed length.
///
/// Created by [`RespValue::lease`]; dereferences to `[u8]`.
pub struct PayloadLease {
    buf: Vec<u8>,
    len: usize,
}

impl RespValue {
    /// Lease a zeroed buffer of `len` bytes from the thread-local pool.
    pub fn lease(len: usize) -> PayloadLease {
        let mut buf = POOL
            .with(|pool| pool.borrow_mut().pop())
            .unwrap_or_default();
        buf.clear();
        buf.resize(len, 0);
        PayloadLease { buf, len }
    }
}

impl PayloadLease {
    /// The leased length.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true for a zero-length lease.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Turn the filled buffer into a leaf value of the given tag.
    ///
    /// Payloads up to [`INLINE_SIZE`] are packed inline and the buffer goes
    /// straight back to the pool; larger payloads take over the buffer's
    /// allocation without copying.
    pub fn commit(mut self, tag: RespType) -> Result<RespValue, RespError> {
        if tag.is_aggregate() || matches!(tag, RespType::Unknown | RespType::Null) {
            // the lease drops and the buffer is reclaimed
            return Err(RespError::Argument("payload factories require a leaf tag"));
        }
        let mut buf = mem::take(&mut self.buf);
        buf.truncate(self.len);
        if buf.len() <= INLINE_SIZE {
            let value = RespValue::copied_bytes(tag, &buf);
            release(buf);
            Ok(value)
        } else {
            Ok(RespValue::from_owned_bytes(tag, buf))
        }
    }
}

impl Deref for PayloadLease {
    type Target = [u8];

    #[inline]
    fn deref(&self) -> &[u8] {
        &self.buf[..self.len]
    }
}

impl DerefMut for PayloadLease {
    #[inline]
    fn deref_mut(&mut self) -> &mut [u8] {
        &mut self.buf[..self.len]
    }
}

impl Drop for PayloadLease {
    fn drop(&mut self) {
        if self.buf.capacity() > 0 {
            release(mem::take(&mut self.buf));
        }
    }
}
