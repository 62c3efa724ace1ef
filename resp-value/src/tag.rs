//! RESP type tags and the protocol version lattice.
//!
//! Each value type owns a single-byte wire prefix:
//!
//! - Blob family (length-prefixed payload): `$` blob string, `!` blob error,
//!   `=` verbatim string
//! - Line family (payload runs to CRLF): `+` simple string, `-` simple error,
//!   `:` number, `,` double, `#` boolean, `(` big number, `_` null
//! - Aggregates: `*` array, `~` set, `>` push (one value per counted element);
//!   `%` map, `|` attribute (two values per counted element)

/// RESP wire protocol versions.
///
/// RESP3 is a superset of RESP2; the derived ordering makes
/// `RespVersion::Resp3 > RespVersion::Resp2` hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RespVersion {
    /// The classic protocol: simple/bulk strings, errors, integers, arrays.
    Resp2 = 2,
    /// Adds doubles, booleans, big numbers, verbatim strings, maps, sets,
    /// push messages, attributes, and the dedicated null frame.
    Resp3 = 3,
}

/// A RESP value type tag. Discriminants are the wire prefix bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum RespType {
    /// Sentinel; never produced by the parser and never written.
    Unknown = 0,
    /// `+OK\r\n`
    SimpleString = b'+',
    /// `-ERR message\r\n`
    SimpleError = b'-',
    /// `:1000\r\n`
    Number = b':',
    /// `,3.14\r\n` (RESP3)
    Double = b',',
    /// `#t\r\n` / `#f\r\n` (RESP3)
    Boolean = b'#',
    /// `(3141592653589793238462643383279\r\n` (RESP3)
    BigNumber = b'(',
    /// `_\r\n` (RESP3)
    Null = b'_',
    /// `$6\r\nfoobar\r\n`
    BlobString = b'$',
    /// `!21\r\nSYNTAX invalid syntax\r\n` (RESP3)
    BlobError = b'!',
    /// `=15\r\ntxt:Some string\r\n` (RESP3)
    VerbatimString = b'=',
    /// `*2\r\n...`
    Array = b'*',
    /// `~3\r\n...` (RESP3)
    Set = b'~',
    /// `>2\r\n...` (RESP3)
    Push = b'>',
    /// `%2\r\n...` (RESP3)
    Map = b'%',
    /// `|1\r\n...` (RESP3)
    Attribute = b'|',
}

impl RespType {
    /// Map a wire prefix byte to its tag. Returns `None` for unknown prefixes.
    #[inline]
    pub fn from_prefix(byte: u8) -> Option<RespType> {
        Some(match byte {
            b'+' => RespType::SimpleString,
            b'-' => RespType::SimpleError,
            b':' => RespType::Number,
            b',' => RespType::Double,
            b'#' => RespType::Boolean,
            b'(' => RespType::BigNumber,
            b'_' => RespType::Null,
            b'$' => RespType::BlobString,
            b'!' => RespType::BlobError,
            b'=' => RespType::VerbatimString,
            b'*' => RespType::Array,
            b'~' => RespType::Set,
            b'>' => RespType::Push,
            b'%' => RespType::Map,
            b'|' => RespType::Attribute,
            _ => return None,
        })
    }

    /// The wire prefix byte for this tag.
    #[inline]
    pub fn prefix(self) -> u8 {
        self as u8
    }

    /// Length-prefixed payload types.
    #[inline]
    pub fn is_blob(self) -> bool {
        matches!(
            self,
            RespType::BlobString | RespType::BlobError | RespType::VerbatimString
        )
    }

    /// Payload-to-CRLF types, including the RESP3 null frame.
    #[inline]
    pub fn is_line(self) -> bool {
        matches!(
            self,
            RespType::SimpleString
                | RespType::SimpleError
                | RespType::Number
                | RespType::Double
                | RespType::Boolean
                | RespType::BigNumber
                | RespType::Null
        )
    }

    /// Container types carrying child frames.
    #[inline]
    pub fn is_aggregate(self) -> bool {
        self.multiplier() != 0
    }

    /// Child values per counted wire element: 1 for array-likes, 2 for
    /// map-likes, 0 for everything else.
    #[inline]
    pub fn multiplier(self) -> usize {
        match self {
            RespType::Array | RespType::Set | RespType::Push => 1,
            RespType::Map | RespType::Attribute => 2,
            _ => 0,
        }
    }

    /// Error-carrying tags (`-` and `!`).
    #[inline]
    pub fn is_error(self) -> bool {
        matches!(self, RespType::SimpleError | RespType::BlobError)
    }

    /// The tag actually written when targeting `version`.
    ///
    /// At RESP3 every tag passes through. Below RESP3 the richer types fold
    /// onto their closest RESP2 shape:
    ///
    /// - Boolean, Double, BigNumber become SimpleString
    /// - VerbatimString becomes BlobString
    /// - Push, Map, Set become Array
    /// - Null becomes BlobString (the `$-1` null form)
    ///
    /// The mapping is idempotent: downgrading a downgraded tag is a no-op.
    #[inline]
    pub fn downgrade(self, version: RespVersion) -> RespType {
        if version >= RespVersion::Resp3 {
            return self;
        }
        match self {
            RespType::Boolean | RespType::Double | RespType::BigNumber => RespType::SimpleString,
            RespType::VerbatimString => RespType::BlobString,
            RespType::Push | RespType::Map | RespType::Set => RespType::Array,
            RespType::Null => RespType::BlobString,
            other => other,
        }
    }
}
