//! Response sinks.
//!
//! A [`ResponseSink`] is the transport side of dispatch: it receives the
//! finished [`Response`] and reports how many body bytes reached the
//! client, which is what the access log records.

use std::io::{self, Write};

use conduit_core::Response;

/// Writes a response to the client.
pub trait ResponseSink {
    /// Sends `response` and returns the number of body bytes written.
    fn send(&mut self, response: Response) -> io::Result<u64>;
}

/// Keeps every response in memory.
#[derive(Debug, Default)]
pub struct BufferedSink {
    responses: Vec<Response>,
}

impl BufferedSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Responses received so far, oldest first.
    pub fn responses(&self) -> &[Response] {
        &self.responses
    }

    /// The most recent response.
    pub fn last(&self) -> Option<&Response> {
        self.responses.last()
    }

    /// Takes the received responses.
    pub fn into_responses(self) -> Vec<Response> {
        self.responses
    }
}

impl ResponseSink for BufferedSink {
    fn send(&mut self, response: Response) -> io::Result<u64> {
        let bytes = response.content_length();
        self.responses.push(response);
        Ok(bytes)
    }
}

/// Serializes responses as HTTP/1.1 onto a writer.
///
/// A `Content-Length` header is added when the response has none.
#[derive(Debug)]
pub struct WriterSink<W> {
    writer: W,
}

impl<W: Write> WriterSink<W> {
    /// Wraps a writer.
    pub const fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Returns the inner writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> ResponseSink for WriterSink<W> {
    fn send(&mut self, response: Response) -> io::Result<u64> {
        let status = response.status();
        write!(
            self.writer,
            "HTTP/1.1 {} {}\r\n",
            status.as_str(),
            status.canonical_reason().unwrap_or("")
        )?;

        for (name, value) in response.headers() {
            self.writer.write_all(name.as_str().as_bytes())?;
            self.writer.write_all(b": ")?;
            self.writer.write_all(value.as_bytes())?;
            self.writer.write_all(b"\r\n")?;
        }
        if !response.headers().contains_key(http::header::CONTENT_LENGTH) {
            write!(self.writer, "content-length: {}\r\n", response.content_length())?;
        }
        self.writer.write_all(b"\r\n")?;

        self.writer.write_all(response.body())?;
        self.writer.flush()?;
        Ok(response.content_length())
    }
}
