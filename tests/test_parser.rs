use restline::http::parser::{ParseError, ParserLimits, Phase, ResponseParser};
use restline::http::response::{Response, ResponseBuilder, StatusCode};
use restline::http::writer::{serialize_event, serialize_response};

fn drain(parser: &mut ResponseParser) -> Vec<Response> {
    let mut out = Vec::new();
    while parser.has_ready() {
        out.push(parser.take_ready().unwrap());
    }
    out
}

fn parse_all(bytes: &[u8]) -> Vec<Response> {
    let mut parser = ResponseParser::start(bytes).unwrap();
    drain(&mut parser)
}

#[test]
fn test_parse_simple_response() {
    let responses = parse_all(b"HTTP/1.1 200 OK\r\nContent-Length: 5\r\nX-Id: 1\r\n\r\nhello");
    assert_eq!(responses.len(), 1);

    let r = &responses[0];
    assert_eq!(r.status, StatusCode::OK);
    assert_eq!(r.status_line.as_deref(), Some("HTTP/1.1 200 OK"));
    assert_eq!(r.header("x-id"), Some("1"));
    assert_eq!(r.body_bytes(), b"hello");
}

#[test]
fn test_parse_serialized_response_round_trip() {
    let original = ResponseBuilder::new(StatusCode::CREATED)
        .header("Content-Type", "application/json")
        .header("Location", "/res/1")
        .body(r#"{"id":1}"#)
        .build();
    let responses = parse_all(&serialize_response(&original));

    assert_eq!(responses.len(), 1);
    assert_eq!(responses[0].status, original.status);
    assert_eq!(responses[0].headers, original.headers);
    assert_eq!(responses[0].body, original.body);
}

#[test]
fn test_parse_is_independent_of_fragmentation() {
    let mut wire = serialize_response(&Response::ok("first body"));
    wire.extend(b"HTTP/1.1 204 No Content\r\nServer: x\r\n\r\n");
    wire.extend(b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n3\r\nabc\r\n2\r\nde\r\n0\r\n\r\n");
    let whole = parse_all(&wire);
    assert_eq!(whole.len(), 3);

    for split in 0..=wire.len() {
        let mut parser = ResponseParser::default();
        parser.feed(&wire[..split]).unwrap();
        parser.feed(&wire[split..]).unwrap();
        assert_eq!(drain(&mut parser), whole, "split at {split}");
    }

    let mut parser = ResponseParser::default();
    for byte in &wire {
        parser.feed(std::slice::from_ref(byte)).unwrap();
    }
    assert_eq!(drain(&mut parser), whole);
}

#[test]
fn test_parse_pipelined_responses_in_order() {
    let mut wire = Vec::new();
    for i in 0..4 {
        wire.extend(serialize_response(&Response::ok(format!("body {i}"))));
    }
    let responses = parse_all(&wire);
    let bodies: Vec<_> = responses.iter().map(Response::body_text).collect();
    assert_eq!(bodies, vec!["body 0", "body 1", "body 2", "body 3"]);
}

#[test]
fn test_parse_waits_for_exact_body_length() {
    let mut parser = ResponseParser::start(b"HTTP/1.1 200 OK\r\nContent-Length: 4\r\n\r\nabc").unwrap();
    assert!(!parser.has_ready());
    assert_eq!(parser.phase(), Phase::AwaitingBody);

    parser.feed(b"dHTTP/1.1 404 Not Found\r\n").unwrap();
    assert_eq!(parser.ready_len(), 1);
    assert_eq!(parser.take_ready().unwrap().body_bytes(), b"abcd");
    assert_eq!(parser.phase(), Phase::AwaitingHeaders);
}

#[test]
fn test_parse_zero_length_body_is_none() {
    let responses = parse_all(b"HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\n\r\n");
    assert_eq!(responses[0].status, StatusCode::NOT_FOUND);
    assert!(responses[0].body.is_none());
}

#[test]
fn test_parse_no_body_statuses_ignore_length() {
    let mut parser =
        ResponseParser::start(b"HTTP/1.1 304 Not Modified\r\nContent-Length: 10\r\n\r\n").unwrap();
    let responses = drain(&mut parser);
    assert_eq!(responses.len(), 1);
    assert!(responses[0].body.is_none());
    assert_eq!(parser.phase(), Phase::AwaitingStatusLine);
}

#[test]
fn test_parse_header_edge_cases() {
    let responses = parse_all(
        b"HTTP/1.1 200 OK\r\nX-Empty:\r\ncontent-LENGTH: 2\r\nVary: a\r\nVary: b\r\nX-Pad:   v  \r\n\r\nok",
    );
    let r = &responses[0];
    assert_eq!(r.header("X-Empty"), Some(""));
    assert_eq!(r.header("Content-Length"), Some("2"));
    assert_eq!(r.header("vary"), Some("a, b"));
    assert_eq!(r.header("X-Pad"), Some("v"));
    assert_eq!(r.body_bytes(), b"ok");
}

#[test]
fn test_parse_tolerates_bare_lf_and_leading_blank_lines() {
    let responses = parse_all(b"\r\n\nHTTP/1.0 200 OK\nContent-Length: 1\n\nx");
    assert_eq!(responses.len(), 1);
    assert_eq!(responses[0].status_line.as_deref(), Some("HTTP/1.0 200 OK"));
    assert_eq!(responses[0].body_bytes(), b"x");
}

#[test]
fn test_parse_rejects_malformed_status_line_and_replays() {
    let mut parser = ResponseParser::default();
    let err = parser.feed(b"HTTX/1.1 200 OK\r\n\r\n").unwrap_err();
    assert!(matches!(err, ParseError::MalformedStatusLine(_)));

    assert_eq!(parser.feed(b"HTTP/1.1 200 OK\r\n\r\n").unwrap_err(), err);
    assert_eq!(parser.close().unwrap_err(), err);
    assert!(!parser.has_ready());
}

#[test]
fn test_parse_rejects_malformed_headers() {
    let cases: [&[u8]; 3] = [
        b"HTTP/1.1 200 OK\r\nNoColon\r\n\r\n",
        b"HTTP/1.1 200 OK\r\nBad Name: v\r\n\r\n",
        b"HTTP/1.1 200 OK\r\nA: b\r\n folded\r\n\r\n",
    ];
    for case in cases {
        assert!(matches!(
            ResponseParser::start(case),
            Err(ParseError::MalformedHeader(_))
        ));
    }
}

#[test]
fn test_parse_rejects_conflicting_content_length() {
    let err = ResponseParser::start(b"HTTP/1.1 200 OK\r\nContent-Length: 2\r\nContent-Length: 3\r\n\r\n")
        .unwrap_err();
    assert!(matches!(err, ParseError::InvalidContentLength(_)));

    let responses = parse_all(b"HTTP/1.1 200 OK\r\nContent-Length: 2\r\nContent-Length: 2\r\n\r\nok");
    assert_eq!(responses[0].body_bytes(), b"ok");
}

#[test]
fn test_parse_chunked_with_trailers() {
    let responses = parse_all(
        b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n4;ext=1\r\nWiki\r\n5\r\npedia\r\n0\r\nX-Checksum: abc\r\n\r\n",
    );
    assert_eq!(responses[0].body_bytes(), b"Wikipedia");
    assert_eq!(responses[0].header("X-Checksum"), Some("abc"));
}

#[test]
fn test_parse_chunked_errors() {
    let err = ResponseParser::start(b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\nzz\r\n")
        .unwrap_err();
    assert!(matches!(err, ParseError::InvalidChunkSize(_)));

    let err = ResponseParser::start(b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n2\r\nabX")
        .unwrap_err();
    assert_eq!(err, ParseError::MalformedChunk);
}

#[test]
fn test_parse_close_delimited_body() {
    let mut parser = ResponseParser::start(b"HTTP/1.0 200 OK\r\nServer: old\r\n\r\npart one, ").unwrap();
    parser.feed(b"part two").unwrap();
    assert!(!parser.has_ready());

    parser.close().unwrap();
    let responses = drain(&mut parser);
    assert_eq!(responses[0].body_bytes(), b"part one, part two");
}

#[test]
fn test_parse_close_mid_message_is_eof() {
    let mut parser = ResponseParser::start(b"HTTP/1.1 200 OK\r\nContent-Length: 10\r\n\r\nabc").unwrap();
    assert_eq!(parser.close(), Err(ParseError::UnexpectedEof));

    let mut parser = ResponseParser::start(b"HTTP/1.1 200 OK\r\nContent-").unwrap();
    assert_eq!(parser.close(), Err(ParseError::UnexpectedEof));

    let mut parser = ResponseParser::start(&serialize_response(&Response::ok("x"))).unwrap();
    assert!(parser.close().is_ok());
    assert_eq!(parser.ready_len(), 1);
}

#[test]
fn test_parse_take_ready_when_empty() {
    let mut parser = ResponseParser::default();
    assert_eq!(parser.take_ready().unwrap_err(), ParseError::NoResponseReady);
}

#[test]
fn test_parse_event_stream_switches_to_events() {
    let mut wire = b"HTTP/1.1 200 OK\r\nContent-Type: text/event-stream\r\n\r\n".to_vec();
    wire.extend(serialize_event("one"));
    wire.extend(b"\n");
    wire.extend(serialize_event("two\nlines"));
    wire.extend(b"data: partial");

    let mut parser = ResponseParser::start(&wire).unwrap();
    assert!(parser.is_streaming());
    let responses = drain(&mut parser);
    assert_eq!(responses.len(), 3);

    assert_eq!(responses[0].header("Content-Type"), Some("text/event-stream"));
    assert!(responses[0].body.is_none());
    assert_eq!(responses[1].status, StatusCode::OK);
    assert_eq!(responses[1].body_bytes(), b"data: one\n\n");
    assert!(responses[1].headers.is_empty());
    assert_eq!(responses[2].body_bytes(), b"data: two\ndata: lines\n\n");

    assert_eq!(parser.buffered_len(), b"data: partial".len());
    parser.feed(b"\r\n\r\n").unwrap();
    assert_eq!(parser.take_ready().unwrap().body_bytes(), b"data: partial\r\n\r\n");
    assert!(parser.close().is_ok());
}

#[test]
fn test_parse_body_only_events() {
    let mut parser = ResponseParser::start_body_only(b"data: a\n\ndata: b\n").unwrap();
    assert_eq!(parser.phase(), Phase::AwaitingBody);
    assert_eq!(parser.ready_len(), 1);
    parser.feed(b"\n").unwrap();
    let bodies: Vec<_> = drain(&mut parser).iter().map(Response::body_text).collect();
    assert_eq!(bodies, vec!["data: a\n\n", "data: b\n\n"]);
}

#[test]
fn test_parse_head_size_limit() {
    let limits = ParserLimits {
        max_head_bytes: 64,
        max_headers: 100,
    };
    let mut parser = ResponseParser::new(limits);
    parser.feed(b"HTTP/1.1 200 OK\r\n").unwrap();
    let err = parser.feed(&[b'a'; 80]).unwrap_err();
    assert_eq!(err, ParseError::HeadTooLarge { limit: 64 });
}

#[test]
fn test_parse_event_size_limit() {
    let limits = ParserLimits {
        max_head_bytes: 64,
        max_headers: 100,
    };
    let mut parser = ResponseParser::body_only(limits);
    parser.feed(&[b'a'; 60]).unwrap();
    let err = parser.feed(&[b'a'; 1000]).unwrap_err();
    assert_eq!(err, ParseError::EventTooLarge { limit: 64 });
    assert_eq!(parser.feed(b"\n\n").unwrap_err(), err);

    // Terminated events under the limit keep flowing.
    let mut parser = ResponseParser::body_only(limits);
    for _ in 0..100 {
        parser.feed(b"data: tick\n\n").unwrap();
    }
    assert_eq!(parser.ready_len(), 100);
}

#[test]
fn test_parse_event_stream_head_then_oversized_event() {
    let limits = ParserLimits {
        max_head_bytes: 128,
        max_headers: 100,
    };
    let mut parser = ResponseParser::new(limits);
    parser
        .feed(b"HTTP/1.1 200 OK\r\nContent-Type: text/event-stream\r\n\r\n")
        .unwrap();
    assert_eq!(parser.ready_len(), 1);
    assert_eq!(
        parser.feed(&[b'x'; 200]).unwrap_err(),
        ParseError::EventTooLarge { limit: 128 }
    );
}

#[test]
fn test_parse_trailer_fields_count_toward_limit() {
    let limits = ParserLimits {
        max_head_bytes: 1024,
        max_headers: 2,
    };
    let mut parser = ResponseParser::new(limits);
    let err = parser
        .feed(b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n0\r\nA: 1\r\nB: 2\r\n\r\n")
        .unwrap_err();
    assert_eq!(err, ParseError::TooManyHeaders { limit: 2 });

    let mut parser = ResponseParser::new(limits);
    parser
        .feed(b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n0\r\nA: 1\r\n\r\n")
        .unwrap();
    assert_eq!(parser.take_ready().unwrap().header("A"), Some("1"));
}

#[test]
fn test_parse_header_count_limit() {
    let limits = ParserLimits {
        max_head_bytes: 1024,
        max_headers: 2,
    };
    let mut parser = ResponseParser::new(limits);
    let err = parser
        .feed(b"HTTP/1.1 200 OK\r\nA: 1\r\nB: 2\r\nC: 3\r\n\r\n")
        .unwrap_err();
    assert_eq!(err, ParseError::TooManyHeaders { limit: 2 });
}
