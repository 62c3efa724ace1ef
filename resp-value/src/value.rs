//! The RESP value model.
//!
//! A [`RespValue`] is an immutable tagged value. Small payloads are packed
//! directly into the value (no allocation), scalar payloads are stored as
//! scalars and rendered to ASCII on demand, and larger payloads are
//! refcounted [`Bytes`] — either independently owned or zero-copy views into
//! the parse input. Aggregates hold a shared child slice, except for the
//! single-child case, which is folded into the parent (see
//! [`RespValue::wrap`]).
//!
//! Cloning a value never copies payload bytes.

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use bytes::Bytes;

use crate::error::RespError;
use crate::rope::Taken;
use crate::tag::RespType;

/// Maximum payload length packed directly into a value.
pub const INLINE_SIZE: usize = 12;

/// Storage classes a value's payload can occupy.
///
/// Reported by [`RespValue::storage`]; useful for tests and for callers that
/// care whether a value still references parse input (`Window`/`Chain`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Storage {
    /// Semantically null. Distinct from a zero-length payload.
    Null,
    /// Zero-length payload or zero-child aggregate.
    Empty,
    /// Up to [`INLINE_SIZE`] bytes packed into the value.
    Inline,
    /// Inline `i64` scalar.
    Int64,
    /// Inline `u32` scalar.
    UInt32,
    /// Inline `f64` scalar.
    Double,
    /// Independently owned contiguous bytes.
    Blob,
    /// Independently owned bytes known to be UTF-8.
    Text,
    /// Zero-copy view into a single parse-input segment.
    Window,
    /// Zero-copy view spanning multiple parse-input segments.
    Chain,
    /// Aggregate children.
    Items,
}

#[derive(Clone)]
pub(crate) enum Payload {
    Null,
    Empty,
    Inline { len: u8, buf: [u8; INLINE_SIZE] },
    Int64(i64),
    UInt32(u32),
    Double(f64),
    Blob(Bytes),
    Text(Bytes),
    Window(Bytes),
    Chain(Arc<[Bytes]>),
    Items(Arc<[RespValue]>),
}

impl Payload {
    /// Payloads eligible for the unit-aggregate fold.
    #[inline]
    fn is_inline(&self) -> bool {
        matches!(
            self,
            Payload::Inline { .. } | Payload::Int64(_) | Payload::UInt32(_) | Payload::Double(_)
        )
    }
}

fn inline_payload(data: &[u8]) -> Payload {
    debug_assert!(data.len() <= INLINE_SIZE);
    let mut buf = [0u8; INLINE_SIZE];
    buf[..data.len()].copy_from_slice(data);
    Payload::Inline {
        len: data.len() as u8,
        buf,
    }
}

/// Select Empty / Inline / owned Blob for a borrowed slice.
fn byte_payload_copied(data: &[u8]) -> Payload {
    if data.is_empty() {
        Payload::Empty
    } else if data.len() <= INLINE_SIZE {
        inline_payload(data)
    } else {
        Payload::Blob(Bytes::copy_from_slice(data))
    }
}

/// An immutable RESP value: a type tag plus payload storage.
///
/// Values produced by the parser may borrow from the input rope; call
/// [`preserve`](Self::preserve) before keeping one beyond the input's
/// lifetime. Equality is structural and storage-agnostic: a number parsed
/// off the wire equals the same number built from an `i64`.
#[derive(Clone)]
pub struct RespValue {
    tag: RespType,
    sub: RespType,
    payload: Payload,
}

impl RespValue {
    /// The canonical null value (RESP3 `_\r\n`, RESP2 `$-1\r\n`).
    pub const NULL: RespValue = RespValue {
        tag: RespType::Null,
        sub: RespType::Unknown,
        payload: Payload::Null,
    };

    #[inline]
    fn leaf(tag: RespType, payload: Payload) -> RespValue {
        RespValue {
            tag,
            sub: RespType::Unknown,
            payload,
        }
    }

    #[inline]
    fn with_payload(&self, payload: Payload) -> RespValue {
        RespValue {
            tag: self.tag,
            sub: self.sub,
            payload,
        }
    }

    fn require_scalar_tag(tag: RespType) -> Result<(), RespError> {
        if tag.is_aggregate() || matches!(tag, RespType::Unknown | RespType::Null) {
            return Err(RespError::Argument("payload factories require a leaf tag"));
        }
        Ok(())
    }

    // ========================================================================
    // Factories
    // ========================================================================

    /// A null value carrying the given tag (e.g. a null blob string, a null
    /// array).
    pub fn null_of(tag: RespType) -> RespValue {
        debug_assert!(tag != RespType::Unknown, "null values require a real tag");
        Self::leaf(tag, Payload::Null)
    }

    /// Build a leaf value from bytes.
    ///
    /// Zero-length input yields `Empty` storage, anything up to
    /// [`INLINE_SIZE`] is packed inline, larger payloads keep the given
    /// `Bytes` without copying.
    pub fn bytes_value(tag: RespType, data: impl Into<Bytes>) -> Result<RespValue, RespError> {
        Self::require_scalar_tag(tag)?;
        let data = data.into();
        let payload = if data.is_empty() {
            Payload::Empty
        } else if data.len() <= INLINE_SIZE {
            inline_payload(&data)
        } else {
            Payload::Blob(data)
        };
        Ok(Self::leaf(tag, payload))
    }

    /// Build a leaf value from a string. Large payloads keep the string's
    /// allocation and remember that it is valid UTF-8.
    pub fn string_value(tag: RespType, text: impl Into<String>) -> Result<RespValue, RespError> {
        Self::require_scalar_tag(tag)?;
        let text = text.into();
        let payload = if text.is_empty() {
            Payload::Empty
        } else if text.len() <= INLINE_SIZE {
            inline_payload(text.as_bytes())
        } else {
            Payload::Text(Bytes::from(text.into_bytes()))
        };
        Ok(Self::leaf(tag, payload))
    }

    /// Build a leaf value holding an `i64` scalar. The scalar is rendered to
    /// ASCII only when written or compared.
    pub fn int_value(tag: RespType, value: i64) -> Result<RespValue, RespError> {
        Self::require_scalar_tag(tag)?;
        Ok(Self::leaf(tag, Payload::Int64(value)))
    }

    /// Build a leaf value holding a `u32` scalar.
    pub fn uint_value(tag: RespType, value: u32) -> Result<RespValue, RespError> {
        Self::require_scalar_tag(tag)?;
        Ok(Self::leaf(tag, Payload::UInt32(value)))
    }

    /// Build a leaf value holding an `f64` scalar.
    ///
    /// Rendering uses the shortest round-trippable decimal form, with
    /// `+inf` / `-inf` / `nan` for the non-finite values.
    pub fn double_value(tag: RespType, value: f64) -> Result<RespValue, RespError> {
        Self::require_scalar_tag(tag)?;
        Ok(Self::leaf(tag, Payload::Double(value)))
    }

    /// Build an aggregate from child values.
    ///
    /// The child count must be a multiple of the tag's arity (so an odd
    /// number of children cannot form a map). A single eligible child is
    /// folded into the parent via [`wrap`](Self::wrap) and allocates nothing.
    pub fn aggregate(tag: RespType, children: Vec<RespValue>) -> Result<RespValue, RespError> {
        let multiplier = tag.multiplier();
        if multiplier == 0 {
            return Err(RespError::Argument("aggregate factory requires an aggregate tag"));
        }
        if children.len() % multiplier != 0 {
            return Err(RespError::Argument(
                "child count must be a multiple of the tag arity",
            ));
        }
        if children.is_empty() {
            return Ok(Self::leaf(tag, Payload::Empty));
        }
        if children.len() == 1 && children[0].can_wrap() {
            return Ok(children[0].wrap(tag));
        }
        Ok(Self::leaf(tag, Payload::Items(children.into())))
    }

    /// Pre-encode a fixed command as an array of one blob string.
    ///
    /// Short names (≤ [`INLINE_SIZE`] bytes) produce a fully inline value.
    /// Command names are expected to be ASCII.
    pub fn command(name: &str) -> RespValue {
        debug_assert!(name.is_ascii(), "command names must be ASCII");
        let child = Self::leaf(RespType::BlobString, byte_payload_copied(name.as_bytes()));
        if child.can_wrap() {
            child.wrap(RespType::Array)
        } else {
            Self::leaf(RespType::Array, Payload::Items(Arc::from(vec![child])))
        }
    }

    /// Shorthand for a simple string.
    pub fn simple_string(text: impl Into<String>) -> RespValue {
        Self::string_value(RespType::SimpleString, text).expect("simple string is a leaf tag")
    }

    /// Shorthand for a simple error.
    pub fn simple_error(text: impl Into<String>) -> RespValue {
        Self::string_value(RespType::SimpleError, text).expect("simple error is a leaf tag")
    }

    /// Shorthand for a blob string.
    pub fn blob_string(data: impl Into<Bytes>) -> RespValue {
        Self::bytes_value(RespType::BlobString, data).expect("blob string is a leaf tag")
    }

    /// Shorthand for a number.
    pub fn number(value: i64) -> RespValue {
        Self::int_value(RespType::Number, value).expect("number is a leaf tag")
    }

    /// Shorthand for a double.
    pub fn double(value: f64) -> RespValue {
        Self::double_value(RespType::Double, value).expect("double is a leaf tag")
    }

    /// Shorthand for a boolean (`#t` / `#f`).
    pub fn boolean(value: bool) -> RespValue {
        let text: &[u8] = if value { b"t" } else { b"f" };
        Self::leaf(RespType::Boolean, inline_payload(text))
    }

    /// Construct a value from bytes the parser pulled off a rope.
    pub(crate) fn from_wire_bytes(tag: RespType, taken: Taken) -> RespValue {
        let payload = match taken {
            Taken::Contig(data) => {
                if data.is_empty() {
                    Payload::Empty
                } else if data.len() <= INLINE_SIZE {
                    inline_payload(&data)
                } else {
                    Payload::Window(data)
                }
            }
            Taken::Split(parts) => {
                let total: usize = parts.iter().map(|p| p.len()).sum();
                if total <= INLINE_SIZE {
                    let mut buf = [0u8; INLINE_SIZE];
                    let mut at = 0;
                    for part in &parts {
                        buf[at..at + part.len()].copy_from_slice(part);
                        at += part.len();
                    }
                    Payload::Inline {
                        len: total as u8,
                        buf,
                    }
                } else {
                    Payload::Chain(parts.into())
                }
            }
        };
        Self::leaf(tag, payload)
    }

    pub(crate) fn empty_of(tag: RespType) -> RespValue {
        Self::leaf(tag, Payload::Empty)
    }

    pub(crate) fn from_items(tag: RespType, children: Vec<RespValue>) -> RespValue {
        Self::leaf(tag, Payload::Items(children.into()))
    }

    pub(crate) fn copied_bytes(tag: RespType, data: &[u8]) -> RespValue {
        Self::leaf(tag, byte_payload_copied(data))
    }

    pub(crate) fn from_owned_bytes(tag: RespType, data: Vec<u8>) -> RespValue {
        Self::leaf(
            tag,
            if data.is_empty() {
                Payload::Empty
            } else if data.len() <= INLINE_SIZE {
                inline_payload(&data)
            } else {
                Payload::Blob(Bytes::from(data))
            },
        )
    }

    // ========================================================================
    // Unit aggregate fold
    // ========================================================================

    /// True if this value can be folded into an aggregate parent: the payload
    /// is inline (bytes or scalar) and the value is not itself folded.
    #[inline]
    pub fn can_wrap(&self) -> bool {
        self.sub == RespType::Unknown && self.payload.is_inline()
    }

    /// True if this value is a folded unit aggregate.
    #[inline]
    pub fn can_unwrap(&self) -> bool {
        self.sub != RespType::Unknown && self.payload.is_inline()
    }

    /// Fold this value into a single-child aggregate of type `parent`
    /// without allocating: the parent remembers the child's tag and reuses
    /// its payload.
    ///
    /// # Panics (debug)
    /// Panics if [`can_wrap`](Self::can_wrap) is false or `parent` is not an
    /// arity-1 aggregate.
    pub fn wrap(&self, parent: RespType) -> RespValue {
        debug_assert!(self.can_wrap(), "wrap requires an inline, unfolded value");
        debug_assert_eq!(parent.multiplier(), 1, "wrap parent must have arity 1");
        RespValue {
            tag: parent,
            sub: self.tag,
            payload: self.payload.clone(),
        }
    }

    /// Reconstruct the single child of a folded unit aggregate.
    ///
    /// # Panics (debug)
    /// Panics if [`can_unwrap`](Self::can_unwrap) is false.
    pub fn unwrap_unit(&self) -> RespValue {
        debug_assert!(self.can_unwrap(), "unwrap_unit requires a folded value");
        RespValue {
            tag: self.sub,
            sub: RespType::Unknown,
            payload: self.payload.clone(),
        }
    }

    // ========================================================================
    // Inspection
    // ========================================================================

    /// The value's type tag.
    #[inline]
    pub fn resp_type(&self) -> RespType {
        self.tag
    }

    /// The folded child's tag for a unit aggregate, `Unknown` otherwise.
    #[inline]
    pub fn sub_type(&self) -> RespType {
        self.sub
    }

    /// The payload's storage class.
    pub fn storage(&self) -> Storage {
        match &self.payload {
            Payload::Null => Storage::Null,
            Payload::Empty => Storage::Empty,
            Payload::Inline { .. } => Storage::Inline,
            Payload::Int64(_) => Storage::Int64,
            Payload::UInt32(_) => Storage::UInt32,
            Payload::Double(_) => Storage::Double,
            Payload::Blob(_) => Storage::Blob,
            Payload::Text(_) => Storage::Text,
            Payload::Window(_) => Storage::Window,
            Payload::Chain(_) => Storage::Chain,
            Payload::Items(_) => Storage::Items,
        }
    }

    /// Semantically null (not merely empty).
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self.payload, Payload::Null)
    }

    /// True for error-carrying tags (simple error, blob error).
    #[inline]
    pub fn is_error(&self) -> bool {
        self.tag.is_error()
    }

    /// True for aggregate tags.
    #[inline]
    pub fn is_aggregate(&self) -> bool {
        self.tag.is_aggregate()
    }

    /// Number of child values. Zero for leaves, nulls, and empty aggregates.
    pub fn child_count(&self) -> usize {
        if !self.tag.is_aggregate() {
            return 0;
        }
        match &self.payload {
            Payload::Null | Payload::Empty => 0,
            Payload::Items(items) => items.len(),
            // folded unit aggregate
            _ => 1,
        }
    }

    /// Iterate the child values of an aggregate.
    ///
    /// A folded unit aggregate lazily reconstructs its single child; leaves,
    /// nulls, and empty aggregates yield nothing.
    pub fn sub_items(&self) -> SubItems<'_> {
        let inner = if !self.tag.is_aggregate() {
            SubItemsInner::Done
        } else {
            match &self.payload {
                Payload::Null | Payload::Empty => SubItemsInner::Done,
                Payload::Items(items) => SubItemsInner::Slice(items.iter()),
                _ => SubItemsInner::Unit(self),
            }
        };
        SubItems { inner }
    }

    /// Logical byte length of a leaf payload (scalars count their rendered
    /// digits). Zero for nulls and aggregates.
    pub fn payload_len(&self) -> usize {
        if self.tag.is_aggregate() {
            return 0;
        }
        self.payload_chunks().total_len()
    }

    /// Borrow the payload when it is contiguous in memory.
    ///
    /// Returns `None` for scalars, nulls, aggregates, and multi-segment
    /// views.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match &self.payload {
            Payload::Empty => Some(&[]),
            Payload::Inline { len, buf } => Some(&buf[..*len as usize]),
            Payload::Blob(b) | Payload::Text(b) | Payload::Window(b) => Some(b),
            _ => None,
        }
    }

    /// Borrow the payload as UTF-8 text, when contiguous and valid.
    pub fn as_str(&self) -> Option<&str> {
        std::str::from_utf8(self.as_bytes()?).ok()
    }

    /// The payload as one contiguous byte run, stitching multi-segment views
    /// together. `None` for scalars, nulls, and aggregates.
    pub fn to_contiguous(&self) -> Option<Cow<'_, [u8]>> {
        match &self.payload {
            Payload::Chain(parts) => {
                let total: usize = parts.iter().map(|p| p.len()).sum();
                let mut owned = Vec::with_capacity(total);
                for part in parts.iter() {
                    owned.extend_from_slice(part);
                }
                Some(Cow::Owned(owned))
            }
            _ => self.as_bytes().map(Cow::Borrowed),
        }
    }

    /// Interpret the payload as a signed integer.
    pub fn as_integer(&self) -> Option<i64> {
        match &self.payload {
            Payload::Int64(v) => Some(*v),
            Payload::UInt32(v) => Some(i64::from(*v)),
            _ => {
                let bytes = self.to_contiguous()?;
                if bytes.is_empty() {
                    return None;
                }
                std::str::from_utf8(&bytes).ok()?.parse().ok()
            }
        }
    }

    /// Interpret the payload as a double, honoring the `inf` / `+inf` /
    /// `-inf` / `nan` wire spellings.
    pub fn as_double(&self) -> Option<f64> {
        match &self.payload {
            Payload::Double(v) => Some(*v),
            Payload::Int64(v) => Some(*v as f64),
            Payload::UInt32(v) => Some(f64::from(*v)),
            _ => {
                let bytes = self.to_contiguous()?;
                match &*bytes {
                    b"inf" | b"+inf" => Some(f64::INFINITY),
                    b"-inf" => Some(f64::NEG_INFINITY),
                    b"nan" => Some(f64::NAN),
                    other => std::str::from_utf8(other).ok()?.parse().ok(),
                }
            }
        }
    }

    /// Surface an error reply as [`RespError::ErrorReply`].
    pub fn check_error(&self) -> Result<(), RespError> {
        if self.is_error() {
            Err(RespError::ErrorReply(self.to_string()))
        } else {
            Ok(())
        }
    }

    // ========================================================================
    // Preservation
    // ========================================================================

    /// True when no payload (at any depth) references parse input.
    pub fn is_detached(&self) -> bool {
        match &self.payload {
            Payload::Window(_) | Payload::Chain(_) => false,
            Payload::Items(items) => items.iter().all(RespValue::is_detached),
            _ => true,
        }
    }

    /// Detach this value from the parse input it may borrow from.
    ///
    /// Multi-segment and windowed payloads are copied into fresh owned
    /// storage; everything else (inline, scalars, owned blobs, text) is
    /// returned as a cheap clone. Aggregates preserve their children
    /// transitively, rebuilding the child slice only if some child actually
    /// changed — so a second `preserve` is a refcount bump and nothing more.
    pub fn preserve(&self) -> RespValue {
        match &self.payload {
            Payload::Window(data) => {
                self.with_payload(Payload::Blob(Bytes::copy_from_slice(data)))
            }
            Payload::Chain(parts) => {
                let total: usize = parts.iter().map(|p| p.len()).sum();
                let mut owned = Vec::with_capacity(total);
                for part in parts.iter() {
                    owned.extend_from_slice(part);
                }
                self.with_payload(Payload::Blob(Bytes::from(owned)))
            }
            Payload::Items(items) => {
                if items.iter().all(RespValue::is_detached) {
                    self.clone()
                } else {
                    self.with_payload(Payload::Items(
                        items.iter().map(RespValue::preserve).collect(),
                    ))
                }
            }
            _ => self.clone(),
        }
    }

    // ========================================================================
    // Payload views
    // ========================================================================

    pub(crate) fn payload_chunks(&self) -> Chunks<'_> {
        match &self.payload {
            Payload::Null | Payload::Empty | Payload::Items(_) => Chunks::Slice(&[]),
            Payload::Inline { len, buf } => Chunks::Slice(&buf[..*len as usize]),
            Payload::Int64(v) => Chunks::Scalar(ScalarText::int(*v)),
            Payload::UInt32(v) => Chunks::Scalar(ScalarText::uint(*v)),
            Payload::Double(v) => Chunks::Scalar(ScalarText::double(*v)),
            Payload::Blob(b) | Payload::Text(b) | Payload::Window(b) => Chunks::Slice(b),
            Payload::Chain(parts) => Chunks::Segmented(parts),
        }
    }

    /// ASCII case-insensitive payload comparison.
    ///
    /// When both payloads are packed inline the comparison is a masked
    /// compare of the fixed buffers (unused bytes are zeroed, so the whole
    /// buffer can be folded at once). The result is meaningful for ASCII
    /// payloads only.
    pub fn eq_ascii_ignore_case(&self, other: &RespValue) -> bool {
        if let (
            Payload::Inline { len: la, buf: ba },
            Payload::Inline { len: lb, buf: bb },
        ) = (&self.payload, &other.payload)
        {
            return la == lb && ba.iter().zip(bb).all(|(x, y)| x | 0x20 == y | 0x20);
        }
        match (self.is_null(), other.is_null()) {
            (true, true) => return true,
            (false, false) => {}
            _ => return false,
        }
        payload_text_eq(self, other, true)
    }
}

impl PartialEq for RespValue {
    fn eq(&self, other: &Self) -> bool {
        if self.tag != other.tag {
            return false;
        }
        match (self.is_null(), other.is_null()) {
            (true, true) => return true,
            (false, false) => {}
            _ => return false,
        }
        if self.tag.is_aggregate() {
            self.child_count() == other.child_count()
                && self.sub_items().zip(other.sub_items()).all(|(a, b)| a == b)
        } else {
            payload_text_eq(self, other, false)
        }
    }
}

/// Lockstep comparison of two payload byte streams.
///
/// Total lengths are compared first, so chunk exhaustion on one side implies
/// exhaustion on the other.
fn payload_text_eq(a: &RespValue, b: &RespValue, fold_case: bool) -> bool {
    let ca = a.payload_chunks();
    let cb = b.payload_chunks();
    if ca.total_len() != cb.total_len() {
        return false;
    }
    let mut ia = ca.iter();
    let mut ib = cb.iter();
    let mut ra: &[u8] = &[];
    let mut rb: &[u8] = &[];
    loop {
        if ra.is_empty() {
            ra = match ia.next() {
                Some(chunk) => chunk,
                None => break,
            };
            continue;
        }
        if rb.is_empty() {
            rb = match ib.next() {
                Some(chunk) => chunk,
                None => break,
            };
            continue;
        }
        let n = ra.len().min(rb.len());
        let (ha, ta) = ra.split_at(n);
        let (hb, tb) = rb.split_at(n);
        let matched = if fold_case {
            ha.iter().zip(hb).all(|(x, y)| x | 0x20 == y | 0x20)
        } else {
            ha == hb
        };
        if !matched {
            return false;
        }
        ra = ta;
        rb = tb;
    }
    true
}

impl fmt::Display for RespValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            return f.write_str("(nil)");
        }
        if self.tag.is_aggregate() {
            let mut first = true;
            for item in self.sub_items() {
                if !first {
                    f.write_str(" ")?;
                }
                first = false;
                write!(f, "{item}")?;
            }
            return Ok(());
        }
        let chunks = self.payload_chunks();
        for chunk in chunks.iter() {
            f.write_str(&String::from_utf8_lossy(chunk))?;
        }
        Ok(())
    }
}

impl fmt::Debug for RespValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            return write!(f, "{:?}(null)", self.tag);
        }
        if self.tag.is_aggregate() {
            write!(f, "{:?}[", self.tag)?;
            for (i, item) in self.sub_items().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{item:?}")?;
            }
            return f.write_str("]");
        }
        match &self.payload {
            Payload::Int64(v) => write!(f, "{:?}({v})", self.tag),
            Payload::UInt32(v) => write!(f, "{:?}({v})", self.tag),
            Payload::Double(v) => write!(f, "{:?}({v})", self.tag),
            _ => write!(f, "{:?}({:?})", self.tag, self.to_string()),
        }
    }
}

/// Iterator over an aggregate's children. See [`RespValue::sub_items`].
pub struct SubItems<'a> {
    inner: SubItemsInner<'a>,
}

enum SubItemsInner<'a> {
    Done,
    Unit(&'a RespValue),
    Slice(std::slice::Iter<'a, RespValue>),
}

impl Iterator for SubItems<'_> {
    type Item = RespValue;

    fn next(&mut self) -> Option<RespValue> {
        match &mut self.inner {
            SubItemsInner::Done => None,
            SubItemsInner::Unit(parent) => {
                let child = parent.unwrap_unit();
                self.inner = SubItemsInner::Done;
                Some(child)
            }
            SubItemsInner::Slice(items) => items.next().cloned(),
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = match &self.inner {
            SubItemsInner::Done => 0,
            SubItemsInner::Unit(_) => 1,
            SubItemsInner::Slice(items) => items.len(),
        };
        (n, Some(n))
    }
}

impl ExactSizeIterator for SubItems<'_> {}

// ============================================================================
// Scalar rendering
// ============================================================================

/// A scalar rendered to ASCII in a fixed buffer.
///
/// Holds any `i64` (20 digits + sign) and any `ryu`-formatted `f64`.
#[derive(Clone, Copy)]
pub(crate) struct ScalarText {
    buf: [u8; 24],
    len: u8,
}

impl ScalarText {
    fn copied(text: &[u8]) -> ScalarText {
        debug_assert!(text.len() <= 24);
        let mut buf = [0u8; 24];
        buf[..text.len()].copy_from_slice(text);
        ScalarText {
            buf,
            len: text.len() as u8,
        }
    }

    pub(crate) fn int(value: i64) -> ScalarText {
        let mut itoa = itoa::Buffer::new();
        Self::copied(itoa.format(value).as_bytes())
    }

    pub(crate) fn uint(value: u32) -> ScalarText {
        let mut itoa = itoa::Buffer::new();
        Self::copied(itoa.format(value).as_bytes())
    }

    pub(crate) fn length(value: usize) -> ScalarText {
        let mut itoa = itoa::Buffer::new();
        Self::copied(itoa.format(value).as_bytes())
    }

    pub(crate) fn double(value: f64) -> ScalarText {
        if value.is_nan() {
            Self::copied(b"nan")
        } else if value == f64::INFINITY {
            Self::copied(b"+inf")
        } else if value == f64::NEG_INFINITY {
            Self::copied(b"-inf")
        } else {
            let mut ryu = ryu::Buffer::new();
            Self::copied(ryu.format_finite(value).as_bytes())
        }
    }

    #[inline]
    pub(crate) fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len as usize]
    }
}

/// Borrowed view of a leaf payload as a sequence of byte chunks.
pub(crate) enum Chunks<'a> {
    Slice(&'a [u8]),
    Segmented(&'a [Bytes]),
    Scalar(ScalarText),
}

impl Chunks<'_> {
    pub(crate) fn total_len(&self) -> usize {
        match self {
            Chunks::Slice(s) => s.len(),
            Chunks::Segmented(parts) => parts.iter().map(|p| p.len()).sum(),
            Chunks::Scalar(s) => s.as_bytes().len(),
        }
    }

    pub(crate) fn iter(&self) -> ChunkIter<'_> {
        match self {
            Chunks::Slice(s) => ChunkIter::One(Some(s)),
            Chunks::Segmented(parts) => ChunkIter::Many(parts.iter()),
            Chunks::Scalar(s) => ChunkIter::One(Some(s.as_bytes())),
        }
    }
}

pub(crate) enum ChunkIter<'a> {
    One(Option<&'a [u8]>),
    Many(std::slice::Iter<'a, Bytes>),
}

impl<'a> Iterator for ChunkIter<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<&'a [u8]> {
        match self {
            ChunkIter::One(slot) => slot.take(),
            ChunkIter::Many(parts) => parts.next().map(|p| &p[..]),
        }
    }
}
