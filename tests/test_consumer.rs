use std::sync::{Arc, Mutex};

use restline::channel::{BufferPool, Framing, ResponseChannelConsumer};
use restline::http::parser::{ParseError, ParserLimits};
use restline::http::response::{Response, StatusCode};
use restline::http::writer::{serialize_event, serialize_response};

type Seen = Arc<Mutex<Vec<Response>>>;

fn recording() -> (Seen, impl FnMut(Response) + Send + 'static) {
    let seen: Seen = Arc::default();
    let sink = Arc::clone(&seen);
    (seen, move |response: Response| sink.lock().unwrap().push(response))
}

#[test]
fn test_consumer_forwards_in_order_across_buffers() {
    let pool = BufferPool::new(8, 4);
    let (seen, sink) = recording();
    let mut consumer = ResponseChannelConsumer::new(sink);

    let mut wire = serialize_response(&Response::ok("one"));
    wire.extend(serialize_response(&Response::of(StatusCode::NO_CONTENT)));
    wire.extend(serialize_response(&Response::ok("three")));

    let mut forwarded = 0;
    for piece in wire.chunks(5) {
        forwarded += consumer.consume(pool.filled(piece)).unwrap();
    }

    assert_eq!(forwarded, 3);
    assert_eq!(consumer.forwarded(), 3);
    let seen = seen.lock().unwrap();
    let statuses: Vec<_> = seen.iter().map(|r| r.status.as_u16()).collect();
    assert_eq!(statuses, vec![200, 204, 200]);
    assert_eq!(seen[2].body_text(), "three");
}

#[test]
fn test_consumer_releases_every_buffer() {
    let pool = BufferPool::new(16, 2);
    let (_seen, sink) = recording();
    let mut consumer = ResponseChannelConsumer::new(sink);

    let wire = serialize_response(&Response::ok("released"));
    for piece in wire.chunks(3) {
        consumer.consume(pool.filled(piece)).unwrap();
        assert_eq!(pool.outstanding(), 0);
    }
    assert!(pool.available() <= 2);
}

#[test]
fn test_consumer_forwards_completed_responses_before_error() {
    let pool = BufferPool::new(64, 4);
    let (seen, sink) = recording();
    let mut consumer = ResponseChannelConsumer::new(sink);

    let mut wire = serialize_response(&Response::ok("good"));
    wire.extend(b"garbage\r\n");
    let err = consumer.consume(pool.filled(&wire)).unwrap_err();

    assert!(matches!(err, ParseError::MalformedStatusLine(_)));
    assert_eq!(seen.lock().unwrap().len(), 1);
    assert_eq!(pool.outstanding(), 0);

    // The failure sticks, and later buffers are still released.
    let again = consumer.consume(pool.filled(b"HTTP/1.1 200 OK\r\n\r\n")).unwrap_err();
    assert_eq!(again, err);
    assert_eq!(pool.outstanding(), 0);
}

#[test]
fn test_consumer_close_completes_open_body() {
    let pool = BufferPool::new(64, 4);
    let (seen, sink) = recording();
    let mut consumer = ResponseChannelConsumer::new(sink);

    consumer
        .consume(pool.filled(b"HTTP/1.0 200 OK\r\n\r\nuntil close"))
        .unwrap();
    assert!(seen.lock().unwrap().is_empty());

    assert_eq!(consumer.close().unwrap(), 1);
    assert_eq!(seen.lock().unwrap()[0].body_text(), "until close");
}

#[test]
fn test_consumer_close_without_data_is_clean() {
    let (_seen, sink) = recording();
    let mut consumer = ResponseChannelConsumer::new(sink);
    assert_eq!(consumer.close().unwrap(), 0);
    assert!(consumer.parser().is_none());
}

#[test]
fn test_consumer_body_only_framing() {
    let pool = BufferPool::new(64, 4);
    let (seen, sink) = recording();
    let mut consumer = ResponseChannelConsumer::with_framing(sink, Framing::BodyOnly, ParserLimits::default());

    let mut wire = serialize_event("tick 1");
    wire.extend(serialize_event("tick 2"));
    consumer.consume(pool.filled(&wire)).unwrap();

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 2);
    assert_eq!(seen[0].body_text(), "data: tick 1\n\n");
    assert!(consumer.parser().is_some_and(|p| p.is_streaming()));
}

#[test]
fn test_consumer_forward_and_discard() {
    let pool = BufferPool::new(64, 4);
    let (seen, sink) = recording();
    let mut consumer = ResponseChannelConsumer::new(sink);

    consumer.forward(Response::ok("direct"));
    consumer
        .consume(pool.filled(b"HTTP/1.1 200 OK\r\nContent-Length: 9\r\n\r\npart"))
        .unwrap();

    assert_eq!(consumer.forwarded(), 1);
    assert_eq!(consumer.discard(), 4);
    assert!(consumer.parser().is_none());
    assert_eq!(seen.lock().unwrap()[0].body_text(), "direct");
}
