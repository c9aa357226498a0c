use crate::channel::buffer::ConsumerBuffer;
use crate::http::parser::{ParseError, ParserLimits, ResponseParser};
use crate::http::response::Response;

/// Downstream receiver of completed responses.
pub trait ResponseConsumer: Send + 'static {
    fn consume(&mut self, response: Response);
}

impl<F> ResponseConsumer for F
where
    F: FnMut(Response) + Send + 'static,
{
    fn consume(&mut self, response: Response) {
        self(response)
    }
}

/// How the first buffer of a context is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Framing {
    /// Full responses, starting with a status line.
    Full,
    /// Event continuation of a stream whose head was already consumed.
    BodyOnly,
}

/// Feeds arriving buffers to the context's parser and forwards every
/// completed response downstream, in order, exactly once.
pub struct ResponseChannelConsumer<C> {
    parser: Option<ResponseParser>,
    limits: ParserLimits,
    framing: Framing,
    downstream: C,
    forwarded: usize,
}

impl<C: ResponseConsumer> ResponseChannelConsumer<C> {
    pub fn new(downstream: C) -> Self {
        Self::with_framing(downstream, Framing::Full, ParserLimits::default())
    }

    pub fn with_framing(downstream: C, framing: Framing, limits: ParserLimits) -> Self {
        Self {
            parser: None,
            limits,
            framing,
            downstream,
            forwarded: 0,
        }
    }

    /// Parses `buffer`, releases it, then drains every ready response.
    ///
    /// Returns how many responses were forwarded. Responses completed before
    /// a parse failure are still forwarded before the error is returned.
    pub fn consume(&mut self, buffer: ConsumerBuffer) -> Result<usize, ParseError> {
        let (framing, limits) = (self.framing, self.limits);
        let parser = self.parser.get_or_insert_with(|| match framing {
            Framing::Full => ResponseParser::new(limits),
            Framing::BodyOnly => ResponseParser::body_only(limits),
        });
        let fed = parser.feed(buffer.to_array());
        buffer.release();

        let drained = self.drain();
        fed.map(|()| drained)
    }

    /// Forwards a response that did not come through the parser.
    pub fn forward(&mut self, response: Response) {
        self.downstream.consume(response);
        self.forwarded += 1;
    }

    /// End of stream: completes a close-delimited body, then drains.
    pub fn close(&mut self) -> Result<usize, ParseError> {
        let closed = match self.parser.as_mut() {
            Some(parser) => parser.close(),
            None => Ok(()),
        };
        let drained = self.drain();
        closed.map(|()| drained)
    }

    /// Drops the parser along with any bytes it still buffers.
    pub fn discard(&mut self) -> usize {
        self.parser
            .take()
            .map(|parser| parser.buffered_len())
            .unwrap_or(0)
    }

    /// Total responses forwarded so far.
    pub fn forwarded(&self) -> usize {
        self.forwarded
    }

    pub fn parser(&self) -> Option<&ResponseParser> {
        self.parser.as_ref()
    }

    pub fn downstream(&self) -> &C {
        &self.downstream
    }

    fn drain(&mut self) -> usize {
        let Some(parser) = self.parser.as_mut() else {
            return 0;
        };
        let mut drained = 0;
        while parser.has_ready() {
            match parser.take_ready() {
                Ok(response) => {
                    self.downstream.consume(response);
                    drained += 1;
                }
                Err(_) => break,
            }
        }
        self.forwarded += drained;
        drained
    }
}
