//! Demultiplexing of the streaming chat response.
//!
//! The backend streams the assistant reply as plain text, with the token
//! counts for the exchange embedded once, in band, as
//! `[TOKEN_USAGE]{...}[/TOKEN_USAGE]`. This module converts the raw byte
//! stream into a stream of [`StreamEvent`]s, separating visible text from
//! the usage marker. Marker bytes never appear in a `Text` event, no matter
//! how the response is split into chunks.

use bytes::Bytes;
use futures::stream::{self, Stream, StreamExt};

use crate::error::{Error, Result};
use crate::observability::{STREAM_CHUNKS, STREAM_ERRORS, STREAM_EVENTS, USAGE_MARKERS, USAGE_MARKER_ERRORS};
use crate::types::TokenUsage;

/// Opening tag of the in-band usage marker.
pub const USAGE_OPEN: &str = "[TOKEN_USAGE]";

/// Closing tag of the in-band usage marker.
pub const USAGE_CLOSE: &str = "[/TOKEN_USAGE]";

/// One demultiplexed piece of a streaming chat response.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// A run of visible assistant text.
    Text(String),
    /// The decoded usage marker.
    Usage(TokenUsage),
}

/// Convert a stream of response bytes into a stream of [`StreamEvent`]s.
///
/// Chunks are decoded incrementally (a code point split across chunks is
/// held until completed) and scanned for the usage marker. Text preceding
/// the marker flows immediately; once an opening tag, or a trailing prefix
/// that could still become one, is seen, text is withheld until the marker
/// resolves. Marker JSON that fails to parse is counted and dropped without
/// interrupting the visible text.
///
/// # Examples
///
/// ```
/// use bytes::Bytes;
/// use futures::{StreamExt, stream};
///
/// use ragchat::stream::{StreamEvent, demux_stream};
///
/// let chunks: Vec<ragchat::Result<Bytes>> = vec![Ok(Bytes::from_static(
///     b"Hi[TOKEN_USAGE]{\"input_tokens\":1,\"output_tokens\":2,\"total_tokens\":3}[/TOKEN_USAGE]",
/// ))];
/// let events = tokio_test::block_on(demux_stream(stream::iter(chunks)).collect::<Vec<_>>());
/// assert_eq!(
///     events[0].as_ref().unwrap(),
///     &StreamEvent::Text("Hi".to_string()),
/// );
/// ```
pub fn demux_stream<S>(byte_stream: S) -> impl Stream<Item = Result<StreamEvent>>
where
    S: Stream<Item = Result<Bytes>> + Unpin + 'static,
{
    stream::unfold(
        (byte_stream, MarkerBuffer::default(), false),
        move |(mut stream, mut buffer, mut done)| async move {
            loop {
                if let Some(event) = buffer.take_event(done) {
                    STREAM_EVENTS.click();
                    return Some((Ok(event), (stream, buffer, done)));
                }
                if done {
                    return None;
                }
                match stream.next().await {
                    Some(Ok(bytes)) => {
                        STREAM_CHUNKS.click();
                        if let Err(err) = buffer.push_bytes(&bytes) {
                            STREAM_ERRORS.click();
                            return Some((Err(err), (stream, buffer, done)));
                        }
                    }
                    Some(Err(err)) => {
                        STREAM_ERRORS.click();
                        return Some((Err(err), (stream, buffer, done)));
                    }
                    None => {
                        done = true;
                    }
                }
            }
        },
    )
}

/// Cross-chunk buffer for the marker scan.
#[derive(Debug, Default)]
struct MarkerBuffer {
    /// Raw bytes not yet decoded (at most one split code point).
    pending: Vec<u8>,
    /// Decoded text not yet released as events.
    text: String,
}

impl MarkerBuffer {
    /// Append raw bytes, decoding as much UTF-8 as is complete so far.
    fn push_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.pending.extend_from_slice(bytes);
        match std::str::from_utf8(&self.pending) {
            Ok(decoded) => {
                self.text.push_str(decoded);
                self.pending.clear();
                Ok(())
            }
            Err(err) if err.error_len().is_none() => {
                // A code point is split across the chunk boundary: release
                // the valid prefix and keep the tail for the next chunk.
                let tail = self.pending.split_off(err.valid_up_to());
                if let Ok(decoded) = std::str::from_utf8(&self.pending) {
                    self.text.push_str(decoded);
                }
                self.pending = tail;
                Ok(())
            }
            Err(err) => Err(Error::encoding(
                format!("Invalid UTF-8 in stream: {err}"),
                Some(Box::new(err)),
            )),
        }
    }

    /// Extract the next ready event from the decoded text.
    ///
    /// With `at_end` set, the holdback rules relax: a trailing partial
    /// opening tag that can no longer complete is released as ordinary
    /// text, while an unterminated complete opening tag is dropped so that
    /// marker bytes are never rendered.
    fn take_event(&mut self, at_end: bool) -> Option<StreamEvent> {
        loop {
            if self.text.is_empty() {
                return None;
            }
            match self.text.find(USAGE_OPEN) {
                Some(0) => {
                    let json_start = USAGE_OPEN.len();
                    if let Some(close) = self.text[json_start..].find(USAGE_CLOSE) {
                        let json_end = json_start + close;
                        let marker_end = json_end + USAGE_CLOSE.len();
                        let usage =
                            serde_json::from_str::<TokenUsage>(&self.text[json_start..json_end]);
                        self.text.drain(..marker_end);
                        match usage {
                            Ok(usage) => {
                                USAGE_MARKERS.click();
                                return Some(StreamEvent::Usage(usage));
                            }
                            Err(_) => {
                                // Malformed marker JSON: drop the marker,
                                // text keeps flowing.
                                USAGE_MARKER_ERRORS.click();
                                continue;
                            }
                        }
                    } else if at_end {
                        USAGE_MARKER_ERRORS.click();
                        self.text.clear();
                        return None;
                    } else {
                        return None;
                    }
                }
                Some(open) => {
                    let text: String = self.text.drain(..open).collect();
                    return Some(StreamEvent::Text(text));
                }
                None => {
                    let holdback = if at_end {
                        0
                    } else {
                        partial_open_suffix(&self.text)
                    };
                    let release = self.text.len() - holdback;
                    if release == 0 {
                        return None;
                    }
                    let text: String = self.text.drain(..release).collect();
                    return Some(StreamEvent::Text(text));
                }
            }
        }
    }
}

/// Length of the longest buffer suffix that is a proper prefix of the
/// opening tag, i.e. text that might still turn into a marker.
fn partial_open_suffix(text: &str) -> usize {
    let max = USAGE_OPEN.len().min(text.len());
    for len in (1..=max).rev() {
        if len < USAGE_OPEN.len() && text.ends_with(&USAGE_OPEN[..len]) {
            return len;
        }
    }
    0
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = concat!(
        "Hello",
        "[TOKEN_USAGE]{\"input_tokens\":3,\"output_tokens\":5,\"total_tokens\":8}[/TOKEN_USAGE]",
        " world"
    );

    /// Run a byte stream, pre-split into the given chunks, through the
    /// demultiplexer and collect the results.
    fn run_chunks(chunks: &[&[u8]]) -> (String, Vec<TokenUsage>) {
        let items: Vec<Result<Bytes>> = chunks
            .iter()
            .map(|c| Ok(Bytes::copy_from_slice(c)))
            .collect();
        let stream = demux_stream(stream::iter(items));
        let events = futures::executor::block_on(stream.collect::<Vec<_>>());

        let mut text = String::new();
        let mut usages = Vec::new();
        for event in events {
            match event.unwrap() {
                StreamEvent::Text(t) => text.push_str(&t),
                StreamEvent::Usage(u) => usages.push(u),
            }
        }
        (text, usages)
    }

    #[test]
    fn marker_stripped_single_chunk() {
        let (text, usages) = run_chunks(&[SAMPLE.as_bytes()]);
        assert_eq!(text, "Hello world");
        assert_eq!(usages, vec![TokenUsage::new(3, 5, 8)]);
    }

    #[test]
    fn marker_stripped_under_all_splits() {
        let bytes = SAMPLE.as_bytes();
        for split in 0..=bytes.len() {
            let (text, usages) = run_chunks(&[&bytes[..split], &bytes[split..]]);
            assert_eq!(text, "Hello world", "split at {split}");
            assert_eq!(usages, vec![TokenUsage::new(3, 5, 8)], "split at {split}");
        }
    }

    #[test]
    fn marker_stripped_byte_at_a_time() {
        let chunks: Vec<&[u8]> = SAMPLE.as_bytes().chunks(1).collect();
        let (text, usages) = run_chunks(&chunks);
        assert_eq!(text, "Hello world");
        assert_eq!(usages, vec![TokenUsage::new(3, 5, 8)]);
    }

    #[test]
    fn multiple_markers_stripped_under_all_splits() {
        const TWO: &str = concat!(
            "one",
            "[TOKEN_USAGE]{\"input_tokens\":1,\"output_tokens\":2,\"total_tokens\":3}[/TOKEN_USAGE]",
            " two",
            "[TOKEN_USAGE]{\"input_tokens\":4,\"output_tokens\":5,\"total_tokens\":9}[/TOKEN_USAGE]",
            " three"
        );
        let bytes = TWO.as_bytes();
        for split in 0..=bytes.len() {
            let (text, usages) = run_chunks(&[&bytes[..split], &bytes[split..]]);
            assert_eq!(text, "one two three", "split at {split}");
            assert_eq!(
                usages,
                vec![TokenUsage::new(1, 2, 3), TokenUsage::new(4, 5, 9)],
                "split at {split}"
            );
        }
    }

    #[test]
    fn plain_text_passes_through() {
        let (text, usages) = run_chunks(&[b"no markers", b" here"]);
        assert_eq!(text, "no markers here");
        assert!(usages.is_empty());
    }

    #[test]
    fn malformed_marker_json_is_dropped() {
        let (text, usages) = run_chunks(&[b"a[TOKEN_USAGE]{not json}[/TOKEN_USAGE]b"]);
        assert_eq!(text, "ab");
        assert!(usages.is_empty());
    }

    #[test]
    fn partial_prefix_at_end_is_released_as_text() {
        let (text, usages) = run_chunks(&[b"array[TOKEN"]);
        assert_eq!(text, "array[TOKEN");
        assert!(usages.is_empty());
    }

    #[test]
    fn unterminated_marker_at_end_is_dropped() {
        let (text, usages) = run_chunks(&[b"done[TOKEN_USAGE]{\"input_tokens\":1"]);
        assert_eq!(text, "done");
        assert!(usages.is_empty());
    }

    #[test]
    fn lookalike_text_is_not_withheld_forever() {
        // "[TOKEN_USAGX" rules out the marker as soon as the X arrives.
        let (text, usages) = run_chunks(&[b"a[TOKEN_USAG", b"X]b"]);
        assert_eq!(text, "a[TOKEN_USAGX]b");
        assert!(usages.is_empty());
    }

    #[test]
    fn split_code_point_decodes() {
        let s = "héllo[TOKEN_USAGE]{\"input_tokens\":1,\"output_tokens\":2,\"total_tokens\":3}[/TOKEN_USAGE]";
        let bytes = s.as_bytes();
        // Split inside the two-byte 'é'.
        let (text, usages) = run_chunks(&[&bytes[..2], &bytes[2..]]);
        assert_eq!(text, "héllo");
        assert_eq!(usages, vec![TokenUsage::new(1, 2, 3)]);
    }

    #[test]
    fn invalid_utf8_is_an_error() {
        let items: Vec<Result<Bytes>> = vec![Ok(Bytes::from_static(&[0xff, 0xfe]))];
        let stream = demux_stream(stream::iter(items));
        let events = futures::executor::block_on(stream.collect::<Vec<_>>());
        assert!(matches!(events[0], Err(Error::Encoding { .. })));
    }

    #[test]
    fn mid_stream_error_is_forwarded() {
        let items: Vec<Result<Bytes>> = vec![
            Ok(Bytes::from_static(b"partial")),
            Err(Error::streaming("connection reset", None)),
        ];
        let stream = demux_stream(stream::iter(items));
        let events = futures::executor::block_on(stream.collect::<Vec<_>>());
        assert_eq!(events[0].as_ref().unwrap(), &StreamEvent::Text("partial".to_string()));
        assert!(matches!(events[1], Err(Error::Streaming { .. })));
    }

    #[test]
    fn partial_open_suffix_lengths() {
        assert_eq!(partial_open_suffix("hello"), 0);
        assert_eq!(partial_open_suffix("hello["), 1);
        assert_eq!(partial_open_suffix("hello[TOKEN"), 6);
        assert_eq!(partial_open_suffix("hello[TOKEN_USAGE"), 12);
        // A complete tag is not a partial prefix.
        assert_eq!(partial_open_suffix("[TOKEN_USAGE]"), 0);
        assert_eq!(partial_open_suffix("x[y"), 1);
    }
}
