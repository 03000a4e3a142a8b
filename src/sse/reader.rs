//! Frame reader for the database event stream.
//!
//! Each call to [`FrameReader::read_frame`] consumes exactly three lines.
//! Any anomaly ends the stream: the reader never resynchronizes.

use bytes::Bytes;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt};
use tokio_util::io::StreamReader;

use super::events::{Event, EventType};
use crate::traits::ByteStream;

const EVENT_PREFIX: &[u8] = b"event: ";
const DATA_PREFIX: &[u8] = b"data: ";

/// Longest accepted line, newline excluded. A `put` carries a whole subtree
/// on one line, so this is generous.
pub const DEFAULT_MAX_LINE_LEN: usize = 64 * 1024 * 1024;

/// Why a frame could not be read. Every variant is terminal for the stream.
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("connection closed")]
    Closed,

    #[error("{0}")]
    Transport(#[from] std::io::Error),

    #[error("missing event prefix: {0}")]
    MalformedEvent(String),

    #[error("missing data prefix: {0}")]
    MalformedData(String),

    #[error("expected empty line, got: {0}")]
    UnexpectedLine(String),

    #[error("line exceeds {0} bytes")]
    LineTooLong(usize),
}

impl FrameError {
    /// Synthesized event type reporting this failure.
    pub fn event_type(&self) -> EventType {
        match self {
            FrameError::Closed => EventType::Closed,
            FrameError::Transport(_)
            | FrameError::UnexpectedLine(_)
            | FrameError::LineTooLong(_) => EventType::UnknownError,
            FrameError::MalformedEvent(_) => EventType::MalformedEventError,
            FrameError::MalformedData(_) => EventType::MalformedDataError,
        }
    }
}

impl From<FrameError> for Event {
    fn from(err: FrameError) -> Self {
        Event::new(err.event_type(), err.to_string())
    }
}

/// Reads `event:` / `data:` / blank-line frames from a buffered source.
#[derive(Debug)]
pub struct FrameReader<R> {
    reader: R,
    line: Vec<u8>,
    max_line_len: usize,
}

impl FrameReader<StreamReader<ByteStream, Bytes>> {
    /// Read frames from an HTTP response body.
    pub fn from_stream(stream: ByteStream) -> Self {
        Self::new(StreamReader::new(stream))
    }
}

impl<R: AsyncBufRead + Unpin> FrameReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: Vec::with_capacity(256),
            max_line_len: DEFAULT_MAX_LINE_LEN,
        }
    }

    pub fn with_max_line_len(mut self, max_line_len: usize) -> Self {
        self.max_line_len = max_line_len;
        self
    }

    /// Read the next complete frame.
    pub async fn read_frame(&mut self) -> Result<Event, FrameError> {
        self.read_line().await?;
        let event_type = match self.line.strip_prefix(EVENT_PREFIX) {
            Some(name) => EventType::from(String::from_utf8_lossy(trim(name)).as_ref()),
            None => return Err(FrameError::MalformedEvent(self.line_text())),
        };

        self.read_line().await?;
        let data = match self.line.strip_prefix(DATA_PREFIX) {
            Some(data) => Bytes::copy_from_slice(trim(data)),
            None => return Err(FrameError::MalformedData(self.line_text())),
        };

        self.read_line().await?;
        if !trim(&self.line).is_empty() {
            return Err(FrameError::UnexpectedLine(self.line_text()));
        }

        Ok(Event { event_type, data })
    }

    pub fn into_inner(self) -> R {
        self.reader
    }

    /// Read one newline-terminated line into the buffer.
    ///
    /// A partial line at end of stream counts as a closed connection.
    async fn read_line(&mut self) -> Result<(), FrameError> {
        self.line.clear();
        let limit = (self.max_line_len as u64).saturating_add(1);
        let n = (&mut self.reader)
            .take(limit)
            .read_until(b'\n', &mut self.line)
            .await?;
        if self.line.last() == Some(&b'\n') {
            return Ok(());
        }
        if n as u64 >= limit {
            return Err(FrameError::LineTooLong(self.max_line_len));
        }
        Err(FrameError::Closed)
    }

    fn line_text(&self) -> String {
        String::from_utf8_lossy(trim(&self.line)).into_owned()
    }
}

fn trim(bytes: &[u8]) -> &[u8] {
    let start = bytes
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(bytes.len());
    let end = bytes
        .iter()
        .rposition(|b| !b.is_ascii_whitespace())
        .map_or(start, |i| i + 1);
    &bytes[start..end]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::HttpError;

    fn reader(input: &'static str) -> FrameReader<&'static [u8]> {
        FrameReader::new(input.as_bytes())
    }

    #[tokio::test]
    async fn test_reads_well_formed_frame() {
        let mut frames = reader("event: put\ndata: {\"a\":1}\n\n");
        let event = frames.read_frame().await.unwrap();
        assert_eq!(event.event_type, EventType::Put);
        assert_eq!(event.data, Bytes::from(r#"{"a":1}"#));
    }

    #[tokio::test]
    async fn test_reads_consecutive_frames_then_closed() {
        let mut frames = reader(
            "event: put\ndata: {\"path\":\"/\",\"data\":null}\n\n\
             event: keep-alive\ndata: null\n\n",
        );
        assert_eq!(frames.read_frame().await.unwrap().event_type, EventType::Put);
        let keep_alive = frames.read_frame().await.unwrap();
        assert_eq!(keep_alive.event_type, EventType::KeepAlive);
        assert_eq!(keep_alive.data, Bytes::from("null"));
        assert!(matches!(frames.read_frame().await, Err(FrameError::Closed)));
    }

    #[tokio::test]
    async fn test_trims_whitespace_and_crlf() {
        let mut frames = reader("event:  patch \r\ndata:   {\"b\":2}  \r\n\r\n");
        let event = frames.read_frame().await.unwrap();
        assert_eq!(event.event_type, EventType::Patch);
        assert_eq!(event.data, Bytes::from(r#"{"b":2}"#));
    }

    #[tokio::test]
    async fn test_missing_event_line() {
        let mut frames = reader("data: {}\n\n");
        let err = frames.read_frame().await.unwrap_err();
        assert!(matches!(err, FrameError::MalformedEvent(_)));
        assert_eq!(Event::from(err).event_type, EventType::MalformedEventError);
    }

    #[tokio::test]
    async fn test_missing_data_line() {
        let mut frames = reader("event: put\n\n\n");
        let err = frames.read_frame().await.unwrap_err();
        assert_eq!(err.event_type(), EventType::MalformedDataError);
    }

    #[tokio::test]
    async fn test_non_blank_terminator() {
        let mut frames = reader("event: put\ndata: {}\nevent: patch\n");
        let event: Event = frames.read_frame().await.unwrap_err().into();
        assert_eq!(event.event_type, EventType::UnknownError);
        assert_eq!(event.data_str(), "expected empty line, got: event: patch");
    }

    #[tokio::test]
    async fn test_eof_on_each_line_is_closed() {
        for input in ["", "event: put\n", "event: put\ndata: {}\n"] {
            let mut frames = reader(input);
            let event: Event = frames.read_frame().await.unwrap_err().into();
            assert_eq!(event.event_type, EventType::Closed, "input {:?}", input);
            assert_eq!(event.data_str(), "connection closed");
        }
    }

    #[tokio::test]
    async fn test_partial_line_at_eof_is_closed() {
        let mut frames = reader("event: pu");
        assert!(matches!(frames.read_frame().await, Err(FrameError::Closed)));
    }

    #[tokio::test]
    async fn test_frames_split_across_chunks() {
        let chunks: Vec<Result<Bytes, HttpError>> = vec![
            Ok(Bytes::from("eve")),
            Ok(Bytes::from("nt: put\nda")),
            Ok(Bytes::from("ta: {\"x\":true}\n")),
            Ok(Bytes::from("\n")),
        ];
        let stream: ByteStream = Box::pin(futures::stream::iter(chunks));
        let mut frames = FrameReader::from_stream(stream);
        let event = frames.read_frame().await.unwrap();
        assert_eq!(event.event_type, EventType::Put);
        assert_eq!(event.data, Bytes::from(r#"{"x":true}"#));
    }

    #[tokio::test]
    async fn test_transport_error_is_unknown_error() {
        let chunks: Vec<Result<Bytes, HttpError>> = vec![
            Ok(Bytes::from("event: put\n")),
            Err(HttpError::Io("connection reset".to_string())),
        ];
        let stream: ByteStream = Box::pin(futures::stream::iter(chunks));
        let mut frames = FrameReader::from_stream(stream);
        let event: Event = frames.read_frame().await.unwrap_err().into();
        assert_eq!(event.event_type, EventType::UnknownError);
        assert!(event.data_str().contains("connection reset"));
    }

    #[tokio::test]
    async fn test_unterminated_long_line_is_unknown_error() {
        let mut frames = FrameReader::new(&b"event: put\ndata: 0123456789abcdef"[..])
            .with_max_line_len(12);
        let event: Event = frames.read_frame().await.unwrap_err().into();
        assert_eq!(event.event_type, EventType::UnknownError);
        assert_eq!(event.data_str(), "line exceeds 12 bytes");
    }

    #[tokio::test]
    async fn test_line_at_limit_is_accepted() {
        let mut frames = reader("event: put\ndata: 12345\n\n").with_max_line_len(11);
        let event = frames.read_frame().await.unwrap();
        assert_eq!(event.data, Bytes::from("12345"));
    }

    #[test]
    fn test_trim() {
        assert_eq!(trim(b"  a b \r\n"), b"a b");
        assert_eq!(trim(b" \n"), b"");
        assert_eq!(trim(b""), b"");
    }
}
