//! HTTP protocol types.
//!
//! # Architecture
//!
//! - **`headers`**: Ordered, case-insensitive header fields
//! - **`request`**: Request representation handed to the dispatcher
//! - **`response`**: Response representation with builder pattern
//! - **`parser`**: Incremental response parser (one per context)
//! - **`writer`**: Serializes responses and server-sent events to bytes
//!
//! # Parser State Machine
//!
//! ```text
//!        ┌──────────────────────┐
//!        │  AwaitingStatusLine  │ ← Wait for `HTTP/1.1 200 OK`
//!        └──────────┬───────────┘
//!                   │ Status line parsed
//!                   ▼
//!        ┌──────────────────────┐
//!        │   AwaitingHeaders    │ ← One field per line until an empty line
//!        └──────────┬───────────┘
//!                   │ Framing decided
//!                   ▼
//!        ┌──────────────────────┐
//!        │    AwaitingBody      │ ← Length, chunked, open or events
//!        └──────────┬───────────┘
//!                   │ Body complete
//!                   ▼
//!        ┌──────────────────────┐
//!        │      Complete        │ ← Response queued
//!        └──────────┬───────────┘
//!                   └─ Persistent connection → AwaitingStatusLine
//! ```
//!
//! # Example
//!
//! ```
//! use restline::http::parser::ResponseParser;
//!
//! let mut parser = ResponseParser::start(b"HTTP/1.1 200 OK\r\nContent-")?;
//! parser.feed(b"Length: 2\r\n\r\nhi")?;
//!
//! let response = parser.take_ready()?;
//! assert_eq!(response.status.as_u16(), 200);
//! assert_eq!(response.body_bytes(), b"hi");
//! # Ok::<(), restline::http::parser::ParseError>(())
//! ```

pub mod headers;
pub mod parser;
pub mod request;
pub mod response;
pub mod writer;

pub use headers::Headers;
pub use parser::{ParseError, ParserLimits, Phase, ResponseParser};
pub use request::{Method, Request, RequestBuilder};
pub use response::{Response, ResponseBuilder, StatusCode};
