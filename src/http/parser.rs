//! Incremental HTTP/1.x response parser.
//!
//! Bytes may arrive split at any position. [`ResponseParser::feed`] appends
//! them to an internal buffer and advances the state machine as far as the
//! buffered bytes allow; whatever cannot be consumed yet stays buffered for
//! the next call.
//!
//! ```text
//!  AwaitingStatusLine ──► AwaitingHeaders ──► AwaitingBody ──► Complete
//!          ▲                                                      │
//!          └──────────────── next response on the stream ─────────┘
//! ```
//!
//! # Body framing
//!
//! - 1xx, 204 and 304 responses have no body.
//! - `Transfer-Encoding: chunked` is decoded; trailer fields are merged
//!   into the headers.
//! - `Content-Length: n` completes after exactly `n` bytes.
//! - `Content-Type: text/event-stream` without a length delivers the head on
//!   its own and switches the parser to event mode.
//! - Anything else is close-delimited and only completes on [`ResponseParser::close`].
//!
//! # Event mode
//!
//! Used after an event-stream head and by [`ResponseParser::start_body_only`].
//! Every event ends at the first empty line (`\n\n` or `\r\n\r\n`) and is
//! delivered as a response carrying the stream status, no headers, and the
//! event bytes (terminator included) as its body. An event still unterminated
//! after `max_head_bytes` is a [`ParseError::EventTooLarge`].

use bytes::{Buf, Bytes, BytesMut};
use std::collections::VecDeque;

use crate::http::headers::Headers;
use crate::http::request::media_type;
use crate::http::response::{Response, StatusCode};

/// Default cap on the size of a status line plus header section.
pub const DEFAULT_MAX_HEAD_BYTES: usize = 64 * 1024;

/// Default cap on the number of header fields in one response.
pub const DEFAULT_MAX_HEADERS: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("malformed status line: {0:?}")]
    MalformedStatusLine(String),
    #[error("malformed header line: {0:?}")]
    MalformedHeader(String),
    #[error("invalid Content-Length: {0:?}")]
    InvalidContentLength(String),
    #[error("invalid chunk size line: {0:?}")]
    InvalidChunkSize(String),
    #[error("chunk data not followed by a line break")]
    MalformedChunk,
    #[error("response head exceeds {limit} bytes")]
    HeadTooLarge { limit: usize },
    #[error("response has more than {limit} header fields")]
    TooManyHeaders { limit: usize },
    #[error("event exceeds {limit} bytes without a terminating empty line")]
    EventTooLarge { limit: usize },
    #[error("stream ended in the middle of a response")]
    UnexpectedEof,
    #[error("no complete response is ready")]
    NoResponseReady,
}

/// Position of the parser within the current response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    AwaitingStatusLine,
    AwaitingHeaders,
    AwaitingBody,
    Complete,
}

/// Size limits applied while waiting for line terminators.
///
/// `max_head_bytes` also bounds a single event in event mode, and
/// `max_headers` counts trailer fields of a chunked body too.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserLimits {
    pub max_head_bytes: usize,
    pub max_headers: usize,
}

impl Default for ParserLimits {
    fn default() -> Self {
        Self {
            max_head_bytes: DEFAULT_MAX_HEAD_BYTES,
            max_headers: DEFAULT_MAX_HEADERS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Framing {
    Empty,
    Length(usize),
    Chunked(Chunk),
    Open,
    Events,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Chunk {
    Size,
    Data(usize),
    DataEnd,
    Trailer,
}

#[derive(Debug)]
struct Partial {
    status: StatusCode,
    status_line: String,
    headers: Headers,
    fields: usize,
    body: BytesMut,
}

/// Reassembles responses from a byte stream belonging to one context.
#[derive(Debug)]
pub struct ResponseParser {
    buffer: BytesMut,
    phase: Phase,
    framing: Framing,
    partial: Option<Partial>,
    head_bytes: usize,
    streaming: bool,
    stream_status: StatusCode,
    ready: VecDeque<Response>,
    limits: ParserLimits,
    failure: Option<ParseError>,
}

impl Default for ResponseParser {
    fn default() -> Self {
        Self::new(ParserLimits::default())
    }
}

impl ResponseParser {
    /// A parser expecting a full response, starting at the status line.
    pub fn new(limits: ParserLimits) -> Self {
        Self {
            buffer: BytesMut::new(),
            phase: Phase::AwaitingStatusLine,
            framing: Framing::Empty,
            partial: None,
            head_bytes: 0,
            streaming: false,
            stream_status: StatusCode::OK,
            ready: VecDeque::new(),
            limits,
            failure: None,
        }
    }

    /// A parser for a stream whose head was already consumed elsewhere.
    pub fn body_only(limits: ParserLimits) -> Self {
        let mut parser = Self::new(limits);
        parser.enter_stream(StatusCode::OK);
        parser
    }

    /// Creates a full-response parser and feeds it `bytes`.
    pub fn start(bytes: &[u8]) -> Result<Self, ParseError> {
        let mut parser = Self::default();
        parser.feed(bytes)?;
        Ok(parser)
    }

    /// Creates an event-mode parser and feeds it `bytes`.
    pub fn start_body_only(bytes: &[u8]) -> Result<Self, ParseError> {
        let mut parser = Self::body_only(ParserLimits::default());
        parser.feed(bytes)?;
        Ok(parser)
    }

    /// Appends `bytes` and extracts every response they complete.
    ///
    /// A parser that failed once keeps returning the same error.
    pub fn feed(&mut self, bytes: &[u8]) -> Result<(), ParseError> {
        if let Some(err) = &self.failure {
            return Err(err.clone());
        }
        self.buffer.extend_from_slice(bytes);
        let result = self.advance();
        self.record(result)
    }

    /// Signals the end of the stream.
    ///
    /// Completes a close-delimited body. Ending between responses, or with an
    /// unterminated event pending, is not an error; ending anywhere else is.
    pub fn close(&mut self) -> Result<(), ParseError> {
        if let Some(err) = &self.failure {
            return Err(err.clone());
        }
        let result = match (self.phase, self.framing) {
            (Phase::AwaitingStatusLine, _) if is_blank(&self.buffer) => {
                self.buffer.clear();
                Ok(())
            }
            (Phase::AwaitingBody, Framing::Open) => {
                let rest = self.buffer.split();
                if let Some(partial) = self.partial.as_mut() {
                    partial.body.unsplit(rest);
                }
                self.complete();
                Ok(())
            }
            (Phase::AwaitingBody, Framing::Events) => {
                if !is_blank(&self.buffer) {
                    tracing::debug!(
                        discarded = self.buffer.len(),
                        "Stream closed with an unterminated event"
                    );
                }
                self.buffer.clear();
                Ok(())
            }
            _ => Err(ParseError::UnexpectedEof),
        };
        self.record(result)
    }

    /// True iff at least one complete response is waiting.
    pub fn has_ready(&self) -> bool {
        !self.ready.is_empty()
    }

    /// Number of complete responses waiting.
    pub fn ready_len(&self) -> usize {
        self.ready.len()
    }

    /// Dequeues the oldest complete response.
    pub fn take_ready(&mut self) -> Result<Response, ParseError> {
        self.ready.pop_front().ok_or(ParseError::NoResponseReady)
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Bytes received but not yet part of a completed response.
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    /// True once the parser reads events rather than full responses.
    pub fn is_streaming(&self) -> bool {
        self.streaming
    }

    fn record(&mut self, result: Result<(), ParseError>) -> Result<(), ParseError> {
        if let Err(err) = &result {
            tracing::warn!(error = %err, phase = ?self.phase, "Response parsing failed");
            self.failure = Some(err.clone());
        }
        result
    }

    fn advance(&mut self) -> Result<(), ParseError> {
        loop {
            let progressed = match self.phase {
                Phase::AwaitingStatusLine => self.read_status_line()?,
                Phase::AwaitingHeaders => self.read_header_line()?,
                Phase::AwaitingBody => self.read_body()?,
                Phase::Complete => {
                    self.complete();
                    true
                }
            };
            if !progressed {
                return Ok(());
            }
        }
    }

    fn read_status_line(&mut self) -> Result<bool, ParseError> {
        let Some(line) = self.take_head_line()? else {
            return Ok(false);
        };
        if line.is_empty() {
            // Stray line breaks between responses.
            self.head_bytes = 0;
            return Ok(true);
        }

        let (status, status_line) = parse_status_line(&line)?;
        self.partial = Some(Partial {
            status,
            status_line,
            headers: Headers::new(),
            fields: 0,
            body: BytesMut::new(),
        });
        self.phase = Phase::AwaitingHeaders;
        Ok(true)
    }

    fn read_header_line(&mut self) -> Result<bool, ParseError> {
        let Some(line) = self.take_head_line()? else {
            return Ok(false);
        };
        let Some(partial) = self.partial.as_mut() else {
            self.phase = Phase::AwaitingStatusLine;
            return Ok(true);
        };

        if !line.is_empty() {
            let (name, value) = parse_header_line(&line)?;
            partial.fields += 1;
            if partial.fields > self.limits.max_headers {
                return Err(ParseError::TooManyHeaders {
                    limit: self.limits.max_headers,
                });
            }
            partial.headers.append(name, value);
            return Ok(true);
        }

        self.head_bytes = 0;
        self.framing = framing_for(partial.status, &partial.headers)?;
        if self.framing == Framing::Events {
            let status = partial.status;
            self.complete();
            self.enter_stream(status);
        } else {
            self.phase = Phase::AwaitingBody;
        }
        Ok(true)
    }

    fn read_body(&mut self) -> Result<bool, ParseError> {
        match self.framing {
            Framing::Empty => {
                self.phase = Phase::Complete;
                Ok(true)
            }
            Framing::Length(len) => {
                if self.buffer.len() < len {
                    return Ok(false);
                }
                let body = self.buffer.split_to(len);
                if let Some(partial) = self.partial.as_mut() {
                    partial.body.unsplit(body);
                }
                self.phase = Phase::Complete;
                Ok(true)
            }
            Framing::Chunked(chunk) => self.read_chunked(chunk),
            Framing::Open => Ok(false),
            Framing::Events => self.read_event(),
        }
    }

    fn read_chunked(&mut self, chunk: Chunk) -> Result<bool, ParseError> {
        match chunk {
            Chunk::Size => {
                let Some(line) = self.take_head_line()? else {
                    return Ok(false);
                };
                self.head_bytes = 0;
                let size = parse_chunk_size(&line)?;
                self.framing = if size == 0 {
                    Framing::Chunked(Chunk::Trailer)
                } else {
                    Framing::Chunked(Chunk::Data(size))
                };
                Ok(true)
            }
            Chunk::Data(remaining) => {
                if self.buffer.is_empty() {
                    return Ok(false);
                }
                let n = remaining.min(self.buffer.len());
                let data = self.buffer.split_to(n);
                if let Some(partial) = self.partial.as_mut() {
                    partial.body.extend_from_slice(&data);
                }
                self.framing = if n == remaining {
                    Framing::Chunked(Chunk::DataEnd)
                } else {
                    Framing::Chunked(Chunk::Data(remaining - n))
                };
                Ok(true)
            }
            Chunk::DataEnd => match self.buffer.first() {
                None => Ok(false),
                Some(b'\n') => {
                    self.buffer.advance(1);
                    self.framing = Framing::Chunked(Chunk::Size);
                    Ok(true)
                }
                Some(b'\r') => match self.buffer.get(1) {
                    None => Ok(false),
                    Some(b'\n') => {
                        self.buffer.advance(2);
                        self.framing = Framing::Chunked(Chunk::Size);
                        Ok(true)
                    }
                    Some(_) => Err(ParseError::MalformedChunk),
                },
                Some(_) => Err(ParseError::MalformedChunk),
            },
            Chunk::Trailer => {
                let Some(line) = self.take_head_line()? else {
                    return Ok(false);
                };
                if line.is_empty() {
                    self.head_bytes = 0;
                    self.phase = Phase::Complete;
                    return Ok(true);
                }
                let (name, value) = parse_header_line(&line)?;
                if let Some(partial) = self.partial.as_mut() {
                    partial.fields += 1;
                    if partial.fields > self.limits.max_headers {
                        return Err(ParseError::TooManyHeaders {
                            limit: self.limits.max_headers,
                        });
                    }
                    partial.headers.append(name, value);
                }
                Ok(true)
            }
        }
    }

    fn read_event(&mut self) -> Result<bool, ParseError> {
        let Some(end) = event_boundary(&self.buffer) else {
            let limit = self.limits.max_head_bytes;
            if self.buffer.len() > limit {
                return Err(ParseError::EventTooLarge { limit });
            }
            return Ok(false);
        };
        let event = self.buffer.split_to(end).freeze();
        if !is_blank(&event) {
            self.ready.push_back(Response {
                status: self.stream_status,
                headers: Headers::new(),
                body: Some(event),
                status_line: None,
            });
            tracing::trace!(ready = self.ready.len(), "Event ready");
        }
        Ok(true)
    }

    fn complete(&mut self) {
        if let Some(partial) = self.partial.take() {
            let body = partial.body.freeze();
            self.ready.push_back(Response {
                status: partial.status,
                headers: partial.headers,
                body: (!body.is_empty()).then_some(body),
                status_line: Some(partial.status_line),
            });
            tracing::trace!(
                status = partial.status.as_u16(),
                ready = self.ready.len(),
                "Response ready"
            );
        }
        self.head_bytes = 0;
        if self.streaming {
            self.phase = Phase::AwaitingBody;
            self.framing = Framing::Events;
        } else {
            self.phase = Phase::AwaitingStatusLine;
            self.framing = Framing::Empty;
        }
    }

    fn enter_stream(&mut self, status: StatusCode) {
        self.streaming = true;
        self.stream_status = status;
        self.phase = Phase::AwaitingBody;
        self.framing = Framing::Events;
    }

    /// Takes one line (terminator stripped), enforcing the head size limit.
    fn take_head_line(&mut self) -> Result<Option<Bytes>, ParseError> {
        let limit = self.limits.max_head_bytes;
        let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') else {
            if self.head_bytes + self.buffer.len() > limit {
                return Err(ParseError::HeadTooLarge { limit });
            }
            return Ok(None);
        };

        self.head_bytes += pos + 1;
        if self.head_bytes > limit {
            return Err(ParseError::HeadTooLarge { limit });
        }

        let mut line = self.buffer.split_to(pos + 1);
        line.truncate(pos);
        if line.last() == Some(&b'\r') {
            line.truncate(pos - 1);
        }
        Ok(Some(line.freeze()))
    }
}

/// `HTTP/DIGIT.DIGIT SP 3DIGIT [SP reason-phrase]`
fn parse_status_line(line: &[u8]) -> Result<(StatusCode, String), ParseError> {
    let text = String::from_utf8_lossy(line).into_owned();
    let malformed = || ParseError::MalformedStatusLine(text.clone());

    let rest = text.strip_prefix("HTTP/").ok_or_else(malformed)?;
    let (version, rest) = rest.split_once(' ').ok_or_else(malformed)?;
    let version = version.as_bytes();
    if version.len() != 3
        || !version[0].is_ascii_digit()
        || version[1] != b'.'
        || !version[2].is_ascii_digit()
    {
        return Err(malformed());
    }

    let code = rest.split_once(' ').map_or(rest, |(code, _reason)| code);
    if code.len() != 3 || !code.bytes().all(|b| b.is_ascii_digit()) {
        return Err(malformed());
    }
    let status = code
        .parse::<u16>()
        .ok()
        .and_then(StatusCode::from_u16)
        .ok_or_else(malformed)?;

    Ok((status, text))
}

fn parse_header_line(line: &[u8]) -> Result<(String, String), ParseError> {
    let malformed = || ParseError::MalformedHeader(String::from_utf8_lossy(line).into_owned());

    // Obsolete line folding is rejected rather than unfolded.
    if matches!(line.first(), Some(b' ' | b'\t')) {
        return Err(malformed());
    }
    let colon = line.iter().position(|&b| b == b':').ok_or_else(malformed)?;
    let name = &line[..colon];
    if name.is_empty() || !name.iter().all(|&b| is_token(b)) {
        return Err(malformed());
    }

    let value = trim_ows(&line[colon + 1..]);
    Ok((
        String::from_utf8_lossy(name).into_owned(),
        String::from_utf8_lossy(value).into_owned(),
    ))
}

fn parse_chunk_size(line: &[u8]) -> Result<usize, ParseError> {
    let invalid = || ParseError::InvalidChunkSize(String::from_utf8_lossy(line).into_owned());
    let size = line.split(|&b| b == b';').next().unwrap_or_default();
    let size = trim_ows(size);
    if size.is_empty() || !size.iter().all(u8::is_ascii_hexdigit) {
        return Err(invalid());
    }
    let digits = std::str::from_utf8(size).map_err(|_| invalid())?;
    usize::from_str_radix(digits, 16).map_err(|_| invalid())
}

fn parse_content_length(value: &str) -> Result<usize, ParseError> {
    let invalid = || ParseError::InvalidContentLength(value.to_string());
    let mut length = None;
    for part in value.split(',') {
        let part = part.trim();
        if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let n: usize = part.parse().map_err(|_| invalid())?;
        match length {
            Some(prev) if prev != n => return Err(invalid()),
            _ => length = Some(n),
        }
    }
    length.ok_or_else(invalid)
}

fn framing_for(status: StatusCode, headers: &Headers) -> Result<Framing, ParseError> {
    if status.forbids_body() {
        return Ok(Framing::Empty);
    }

    if let Some(te) = headers.get("Transfer-Encoding") {
        let chunked = te
            .rsplit(',')
            .next()
            .is_some_and(|coding| coding.trim().eq_ignore_ascii_case("chunked"));
        return Ok(if chunked {
            Framing::Chunked(Chunk::Size)
        } else {
            Framing::Open
        });
    }

    if let Some(value) = headers.get("Content-Length") {
        return Ok(match parse_content_length(value)? {
            0 => Framing::Empty,
            n => Framing::Length(n),
        });
    }

    let event_stream = headers
        .get("Content-Type")
        .is_some_and(|ct| media_type(ct) == "text/event-stream");
    Ok(if event_stream {
        Framing::Events
    } else {
        Framing::Open
    })
}

/// End offset of the first event, i.e. just past its terminating empty line.
fn event_boundary(buf: &[u8]) -> Option<usize> {
    let mut line_start = 0;
    for (i, &b) in buf.iter().enumerate() {
        if b == b'\n' {
            let line = &buf[line_start..i];
            let line = line.strip_suffix(b"\r").unwrap_or(line);
            if line.is_empty() {
                return Some(i + 1);
            }
            line_start = i + 1;
        }
    }
    None
}

fn is_blank(bytes: &[u8]) -> bool {
    bytes.iter().all(|&b| b == b'\r' || b == b'\n')
}

fn is_token(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b)
}

fn trim_ows(mut bytes: &[u8]) -> &[u8] {
    while let [b' ' | b'\t', rest @ ..] = bytes {
        bytes = rest;
    }
    while let [rest @ .., b' ' | b'\t'] = bytes {
        bytes = rest;
    }
    bytes
}
