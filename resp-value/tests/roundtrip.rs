//! End-to-end frame scenarios and round-trip laws at both protocol levels.

use bytes::Bytes;
use resp_value::{
    try_parse, ByteRope, ParseLimits, RespError, RespType, RespValue, RespVersion, SliceSink,
    Storage, VecSink, WriteSink,
};

fn parse_one(frame: &[u8]) -> (RespValue, usize) {
    RespValue::parse(Bytes::copy_from_slice(frame)).expect("scenario frames are complete")
}

/// A growable sink that vends fixed tiny spans, forcing every write through
/// the cross-span chunking path.
struct TrickleSink {
    buf: Vec<u8>,
    committed: usize,
    span: usize,
}

impl TrickleSink {
    fn new(span: usize) -> Self {
        TrickleSink {
            buf: Vec::new(),
            committed: 0,
            span,
        }
    }

    fn into_vec(mut self) -> Vec<u8> {
        self.buf.truncate(self.committed);
        self.buf
    }
}

impl WriteSink for TrickleSink {
    fn span(&mut self, _hint: usize) -> &mut [u8] {
        if self.buf.len() < self.committed + self.span {
            self.buf.resize(self.committed + self.span, 0);
        }
        &mut self.buf[self.committed..self.committed + self.span]
    }

    fn advance(&mut self, n: usize) {
        self.committed += n;
    }
}

// ============================================================================
// Scenario table
// ============================================================================

#[test]
fn scenario_blob_string_ok() {
    let value = RespValue::blob_string(&b"OK"[..]);
    assert_eq!(value.to_vec(RespVersion::Resp2), b"$2\r\nOK\r\n");
}

#[test]
fn scenario_get_command_array() {
    let value = RespValue::aggregate(
        RespType::Array,
        vec![
            RespValue::blob_string(&b"GET"[..]),
            RespValue::blob_string(&b"key"[..]),
        ],
    )
    .unwrap();
    assert_eq!(
        value.to_vec(RespVersion::Resp2),
        b"*2\r\n$3\r\nGET\r\n$3\r\nkey\r\n"
    );
}

#[test]
fn scenario_parse_unit_ping() {
    let (value, consumed) = parse_one(b"*1\r\n$4\r\nPING\r\n");
    assert_eq!(consumed, 14);
    assert_eq!(value.resp_type(), RespType::Array);
    assert_eq!(value.sub_type(), RespType::BlobString);
    assert_eq!(value.storage(), Storage::Inline);
    let children: Vec<_> = value.sub_items().collect();
    assert_eq!(children, vec![RespValue::blob_string(&b"PING"[..])]);
}

#[test]
fn scenario_double_by_version() {
    let value = RespValue::double(1.5);
    assert_eq!(value.to_vec(RespVersion::Resp3), b",1.5\r\n");
    assert_eq!(value.to_vec(RespVersion::Resp2), b"+1.5\r\n");
}

#[test]
fn scenario_null_by_version() {
    assert_eq!(RespValue::NULL.to_vec(RespVersion::Resp3), b"_\r\n");
    assert_eq!(RespValue::NULL.to_vec(RespVersion::Resp2), b"$-1\r\n");
}

#[test]
fn scenario_map_downgrades_to_raw_count_array() {
    let map = RespValue::aggregate(
        RespType::Map,
        vec![
            RespValue::blob_string(&b"a"[..]),
            RespValue::number(1),
            RespValue::blob_string(&b"b"[..]),
            RespValue::number(2),
        ],
    )
    .unwrap();
    assert_eq!(
        map.to_vec(RespVersion::Resp3),
        b"%2\r\n$1\r\na\r\n:1\r\n$1\r\nb\r\n:2\r\n"
    );
    assert_eq!(
        map.to_vec(RespVersion::Resp2),
        b"*4\r\n$1\r\na\r\n:1\r\n$1\r\nb\r\n:2\r\n"
    );
}

#[test]
fn scenario_null_blob_has_no_payload_crlf() {
    let (value, consumed) = parse_one(b"$-1\r\n");
    assert!(value.is_null());
    assert_eq!(value.resp_type(), RespType::BlobString);
    assert_eq!(consumed, 5);
}

// ============================================================================
// Round-trip laws
// ============================================================================

fn law_corpus() -> Vec<RespValue> {
    vec![
        RespValue::NULL,
        RespValue::null_of(RespType::Array),
        RespValue::simple_string(""),
        RespValue::simple_string("OK"),
        RespValue::simple_error("ERR unknown command"),
        RespValue::number(0),
        RespValue::number(i64::MIN),
        RespValue::number(i64::MAX),
        RespValue::uint_value(RespType::Number, u32::MAX).unwrap(),
        RespValue::double(0.0),
        RespValue::double(-0.0),
        RespValue::double(1.5),
        RespValue::double(f64::INFINITY),
        RespValue::double(f64::NEG_INFINITY),
        RespValue::double(f64::NAN),
        RespValue::double(1e308),
        RespValue::double(5e-324),
        RespValue::boolean(true),
        RespValue::boolean(false),
        RespValue::blob_string(Bytes::new()),
        RespValue::blob_string(&b"x"[..]),
        RespValue::blob_string(&b"elevenbytes"[..]),
        RespValue::blob_string(&b"twelve-bytes"[..]),
        RespValue::blob_string(&b"thirteen-byte"[..]),
        RespValue::bytes_value(RespType::BlobError, &b"SYNTAX bad expr"[..]).unwrap(),
        RespValue::bytes_value(RespType::BigNumber, &b"3492890328409238509324850943850943825024385"[..])
            .unwrap(),
        RespValue::command("PING"),
        RespValue::aggregate(RespType::Array, vec![]).unwrap(),
        RespValue::aggregate(RespType::Array, vec![RespValue::number(1)]).unwrap(),
        RespValue::aggregate(
            RespType::Array,
            vec![
                RespValue::blob_string(&b"SET"[..]),
                RespValue::blob_string(&b"key"[..]),
                RespValue::blob_string(&b"a value that is long enough to stay external"[..]),
            ],
        )
        .unwrap(),
        RespValue::aggregate(
            RespType::Map,
            vec![
                RespValue::blob_string(&b"a"[..]),
                RespValue::number(1),
                RespValue::blob_string(&b"b"[..]),
                RespValue::number(2),
            ],
        )
        .unwrap(),
        RespValue::aggregate(
            RespType::Set,
            vec![RespValue::number(1), RespValue::number(2)],
        )
        .unwrap(),
        RespValue::aggregate(
            RespType::Array,
            vec![
                RespValue::number(1),
                RespValue::aggregate(
                    RespType::Array,
                    vec![RespValue::number(2), RespValue::number(3)],
                )
                .unwrap(),
            ],
        )
        .unwrap(),
    ]
}

/// At RESP3 every factory-built value survives write→parse exactly.
#[test]
fn law_resp3_roundtrip_is_exact() {
    for value in law_corpus() {
        let wire = value.to_vec(RespVersion::Resp3);
        let (back, consumed) = parse_one(&wire);
        assert_eq!(consumed, wire.len(), "{value:?}");
        assert_eq!(back, value, "wire {:?}", String::from_utf8_lossy(&wire));
    }
}

/// At RESP2 the reparsed value carries the downgraded tag; payloads and
/// child sequences survive unchanged.
#[test]
fn law_resp2_roundtrip_modulo_downgrade() {
    for value in law_corpus() {
        let wire = value.to_vec(RespVersion::Resp2);
        let (back, consumed) = parse_one(&wire);
        assert_eq!(consumed, wire.len(), "{value:?}");
        assert_eq!(
            back.resp_type(),
            value.resp_type().downgrade(RespVersion::Resp2),
            "{value:?}"
        );
        assert_eq!(back.is_null(), value.is_null());
        // the downgrade rewrites counts, never the children themselves
        assert_eq!(back.child_count(), value.child_count());
        assert_eq!(back.payload_len(), value.payload_len());
    }
}

/// Parsed frames re-encode to the identical byte sequence at RESP3.
#[test]
fn law_reencode_is_byte_identical() {
    let frames: &[&[u8]] = &[
        b"+OK\r\n",
        b"+\r\n",
        b"-ERR unknown command\r\n",
        b":0\r\n",
        b":-9223372036854775808\r\n",
        b":9223372036854775807\r\n",
        b",1.5\r\n",
        b",nan\r\n",
        b",+inf\r\n",
        b",-inf\r\n",
        b"#f\r\n",
        b"(123456789012345678901234567890\r\n",
        b"_\r\n",
        b"$-1\r\n",
        b"*-1\r\n",
        b"%-1\r\n",
        b"$0\r\n\r\n",
        b"$4\r\nPING\r\n",
        b"$13\r\nthirteen-byte\r\n",
        b"!9\r\nWRONGTYPE\r\n",
        b"=15\r\ntxt:Some string\r\n",
        b"*0\r\n",
        b"*1\r\n$4\r\nPING\r\n",
        b"*1\r\n$16\r\nsixteen-byte-val\r\n",
        b"*2\r\n$3\r\nGET\r\n$3\r\nkey\r\n",
        b"%2\r\n$1\r\na\r\n:1\r\n$1\r\nb\r\n:2\r\n",
        b"~2\r\n:1\r\n:2\r\n",
        b">3\r\n$7\r\nmessage\r\n$4\r\nchan\r\n$5\r\nhello\r\n",
        b"|1\r\n$3\r\nttl\r\n:3600\r\n",
        b"*2\r\n*2\r\n:1\r\n:2\r\n*1\r\n:3\r\n",
    ];
    for frame in frames {
        let (value, consumed) = parse_one(frame);
        assert_eq!(consumed, frame.len());
        let rewritten = value.to_vec(RespVersion::Resp3);
        assert_eq!(
            rewritten,
            *frame,
            "reparse of {:?}",
            String::from_utf8_lossy(frame)
        );
        // and parsing the rewrite consumes the same byte count
        let (again, reconsumed) = parse_one(&rewritten);
        assert_eq!(reconsumed, consumed);
        assert_eq!(again, value);
    }
}

#[test]
fn law_preserve_idempotent_on_parsed_values() {
    let (value, _) = parse_one(b"*2\r\n$42\r\na blob string long enough to stay external\r\n$3\r\nkey\r\n");
    assert!(!value.is_detached());
    let once = value.preserve();
    assert!(once.is_detached());
    assert_eq!(once, value);
    let twice = once.preserve();
    assert_eq!(twice, once);
    assert!(twice.is_detached());
    // preserved values re-encode identically
    assert_eq!(
        once.to_vec(RespVersion::Resp3),
        value.to_vec(RespVersion::Resp3)
    );
}

#[test]
fn law_wrap_unwrap_inverts() {
    let candidates = vec![
        RespValue::blob_string(&b"PING"[..]),
        RespValue::number(7),
        RespValue::double(2.5),
        RespValue::simple_string("OK"),
    ];
    for child in candidates {
        for parent in [RespType::Array, RespType::Set, RespType::Push] {
            assert!(child.can_wrap());
            let wrapped = child.wrap(parent);
            assert_eq!(wrapped.resp_type(), parent);
            assert_eq!(wrapped.unwrap_unit(), child, "{parent:?}");
        }
    }
}

// ============================================================================
// Boundary sweeps
// ============================================================================

#[test]
fn boundary_payload_sizes_roundtrip() {
    for len in [0usize, 1, 11, 12, 13] {
        let data = vec![b'a'; len];
        let value = RespValue::bytes_value(RespType::BlobString, data.clone()).unwrap();
        let expected_storage = match len {
            0 => Storage::Empty,
            1..=12 => Storage::Inline,
            _ => Storage::Blob,
        };
        assert_eq!(value.storage(), expected_storage, "len {len}");
        let wire = value.to_vec(RespVersion::Resp3);
        let (back, consumed) = parse_one(&wire);
        assert_eq!(consumed, wire.len());
        assert_eq!(back, value);
        assert_eq!(back.payload_len(), len);
    }
}

#[test]
fn boundary_scalars_roundtrip() {
    for n in [i64::MIN, -1, 0, 1, i64::MAX, i64::from(u32::MAX)] {
        let value = RespValue::number(n);
        let wire = value.to_vec(RespVersion::Resp3);
        let (back, _) = parse_one(&wire);
        assert_eq!(back.as_integer(), Some(n), "{n}");
    }
    for d in [0.0, -0.0, 1.5, 1e308, 5e-324, f64::INFINITY, f64::NEG_INFINITY] {
        let value = RespValue::double(d);
        let wire = value.to_vec(RespVersion::Resp3);
        let (back, _) = parse_one(&wire);
        let reparsed = back.as_double().unwrap();
        assert_eq!(reparsed.to_bits(), d.to_bits(), "{d}");
    }
    // nan compares equal structurally and reparses as nan
    let (back, _) = parse_one(&RespValue::double(f64::NAN).to_vec(RespVersion::Resp3));
    assert!(back.as_double().unwrap().is_nan());
    assert_eq!(back, RespValue::double(f64::NAN));
}

// ============================================================================
// Segmented input and bounded output
// ============================================================================

#[test]
fn parsing_survives_any_segment_split() {
    let frames: &[&[u8]] = &[
        b"*2\r\n$3\r\nGET\r\n$3\r\nkey\r\n",
        b"%2\r\n$1\r\na\r\n:1\r\n$1\r\nb\r\n:2\r\n",
        b"$13\r\nthirteen-byte\r\n",
        b",1.5\r\n",
        b"_\r\n",
    ];
    for frame in frames {
        let (expected, _) = parse_one(frame);
        for split in 1..frame.len() {
            let rope: ByteRope = [
                Bytes::copy_from_slice(&frame[..split]),
                Bytes::copy_from_slice(&frame[split..]),
            ]
            .into_iter()
            .collect();
            let parsed = try_parse(&rope)
                .unwrap()
                .unwrap_or_else(|| panic!("split {split} of {frame:?} must complete"));
            assert_eq!(parsed.value, expected, "split {split}");
            assert_eq!(parsed.consumed, frame.len());
        }
    }
}

#[test]
fn every_prefix_of_a_frame_is_incomplete() {
    let frames: &[&[u8]] = &[
        b"*2\r\n$3\r\nGET\r\n$3\r\nkey\r\n",
        b"$5\r\nhello\r\n",
        b"$-1\r\n",
        b"+OK\r\n",
        b"_\r\n",
    ];
    for frame in frames {
        for cut in 0..frame.len() {
            let rope = ByteRope::from(Bytes::copy_from_slice(&frame[..cut]));
            assert!(
                try_parse(&rope).unwrap().is_none(),
                "prefix {cut} of {frame:?}"
            );
        }
    }
}

#[test]
fn writing_through_tiny_spans_matches_growable_sink() {
    for value in law_corpus() {
        let want = value.to_vec(RespVersion::Resp3);
        for span in [1usize, 3, 7] {
            let mut sink = TrickleSink::new(span);
            let n = value.write(&mut sink, RespVersion::Resp3).unwrap();
            assert_eq!(n, want.len());
            assert_eq!(sink.into_vec(), want, "{value:?} span {span}");
        }
    }
}

#[test]
fn bounded_sink_overflow_is_surfaced() {
    let value = RespValue::blob_string(&b"this frame needs more room"[..]);
    let mut buf = [0u8; 16];
    let mut sink = SliceSink::new(&mut buf);
    assert_eq!(
        value.write(&mut sink, RespVersion::Resp3),
        Err(RespError::Invalid("encode failed to complete"))
    );

    // the same frame fits a big enough buffer
    let mut buf = [0u8; 64];
    let mut sink = SliceSink::new(&mut buf);
    let n = value.write(&mut sink, RespVersion::Resp3).unwrap();
    assert_eq!(&buf[..n], &value.to_vec(RespVersion::Resp3)[..]);
}

#[test]
fn pipelined_frames_parse_in_sequence() {
    let wire = b"+OK\r\n:42\r\n$-1\r\n*1\r\n$4\r\nPING\r\n";
    let mut rest: &[u8] = wire;
    let mut values = Vec::new();
    while !rest.is_empty() {
        let (value, consumed) = parse_one(rest);
        values.push(value);
        rest = &rest[consumed..];
    }
    assert_eq!(
        values,
        vec![
            RespValue::simple_string("OK"),
            RespValue::number(42),
            RespValue::null_of(RespType::BlobString),
            RespValue::command("PING"),
        ]
    );
}

#[test]
fn hostile_headers_are_clamped() {
    // a four-byte header claiming a gigantic aggregate
    let rope = ByteRope::from(Bytes::from_static(b"*99999999\r\n"));
    assert!(matches!(
        try_parse(&rope),
        Err(RespError::OutOfRange(_))
    ));
    let tight = ParseLimits::new().max_blob_len(1024);
    let rope = ByteRope::from(Bytes::from_static(b"$1048576\r\n"));
    assert!(matches!(
        resp_value::try_parse_with(&rope, &tight),
        Err(RespError::OutOfRange(_))
    ));
}

#[test]
fn error_replies_surface_via_check_error() {
    let (reply, _) = parse_one(b"-ERR wrong number of arguments\r\n");
    assert_eq!(
        reply.check_error(),
        Err(RespError::ErrorReply(
            "ERR wrong number of arguments".to_string()
        ))
    );
    let (ok, _) = parse_one(b"+OK\r\n");
    assert!(ok.check_error().is_ok());
}

#[test]
fn odd_map_children_cannot_be_built() {
    let odd = vec![
        RespValue::blob_string(&b"a"[..]),
        RespValue::number(1),
        RespValue::blob_string(&b"b"[..]),
    ];
    assert!(matches!(
        RespValue::aggregate(RespType::Map, odd),
        Err(RespError::Argument(_))
    ));
}

#[test]
fn vec_sink_reports_written_bytes() {
    let value = RespValue::command("PING");
    let mut sink = VecSink::new();
    let n = value.write(&mut sink, RespVersion::Resp2).unwrap();
    assert_eq!(n, sink.len());
    assert_eq!(sink.as_slice(), b"*1\r\n$4\r\nPING\r\n");
}
