//! Incremental decoding of streamed answer bytes.
//!
//! The backend streams an answer as one continuous UTF-8 document split
//! across arbitrary byte frames, with no framing or delimiters. Frame
//! boundaries do not respect character boundaries, so a multi-byte
//! character may arrive half in one frame and half in the next. This
//! module turns such a byte stream into a lazy sequence of fully-decoded
//! text chunks.

use bytes::Bytes;
use futures::stream::{self, Stream, StreamExt};

use crate::error::{Error, Result};
use crate::observability;

/// A stateful UTF-8 decoder that tolerates frames split mid-character.
///
/// Any incomplete trailing byte sequence is carried over and prepended to
/// the next frame, so the decoder only ever yields fully-decoded text and
/// never substitutes replacement characters for a split sequence. Byte
/// sequences that are invalid outright (not merely incomplete) are
/// reported as [`Error::Encoding`].
#[derive(Debug, Default)]
pub struct Utf8Decoder {
    carry: Vec<u8>,
}

/// A UTF-8 sequence is at most four bytes, so an incomplete tail can
/// never exceed three.
const MAX_CARRY: usize = 3;

impl Utf8Decoder {
    /// Creates a decoder with no pending state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes one byte frame, yielding all text that is complete so far.
    ///
    /// Returns an empty string when the frame ends mid-character and no
    /// complete text is available yet.
    pub fn decode(&mut self, frame: &[u8]) -> Result<String> {
        self.carry.extend_from_slice(frame);
        match std::str::from_utf8(&self.carry) {
            Ok(_) => {
                let complete = std::mem::take(&mut self.carry);
                String::from_utf8(complete).map_err(|e| {
                    Error::encoding(format!("Invalid UTF-8 in stream: {e}"), Some(Box::new(e)))
                })
            }
            Err(e) => {
                if e.error_len().is_some() {
                    // An invalid sequence, not a split one. Drop the
                    // buffered bytes so a caller that keeps going does not
                    // see the same error forever.
                    self.carry.clear();
                    return Err(Error::encoding(
                        format!("Invalid UTF-8 in stream: {e}"),
                        Some(Box::new(e)),
                    ));
                }
                let valid_up_to = e.valid_up_to();
                if self.carry.len() - valid_up_to > MAX_CARRY {
                    self.carry.clear();
                    return Err(Error::encoding(
                        "Invalid UTF-8 in stream: oversized incomplete sequence",
                        None,
                    ));
                }
                let tail = self.carry.split_off(valid_up_to);
                let complete = std::mem::replace(&mut self.carry, tail);
                String::from_utf8(complete).map_err(|e| {
                    Error::encoding(format!("Invalid UTF-8 in stream: {e}"), Some(Box::new(e)))
                })
            }
        }
    }

    /// Flushes terminal decoder state after the stream has ended.
    ///
    /// Returns the number of bytes discarded. A well-formed stream leaves
    /// nothing behind; a stream truncated mid-character loses its final
    /// partial sequence, which is counted but not fatal.
    pub fn finish(&mut self) -> usize {
        let dropped = self.carry.len();
        if dropped > 0 {
            observability::DECODER_TAIL_BYTES_DROPPED.count(dropped as u64);
        }
        self.carry.clear();
        dropped
    }

    /// Returns the number of bytes currently awaiting completion.
    pub fn pending(&self) -> usize {
        self.carry.len()
    }
}

/// Converts a response byte stream into a lazy stream of text chunks.
///
/// The returned stream is finite and non-restartable: it yields decoded,
/// non-empty chunks in receipt order and terminates when the transport
/// signals end-of-stream or the consumer drops it. No chunk is emitted
/// after the terminal transition. Transport errors surface as
/// [`Error::Streaming`] items; decode faults as [`Error::Encoding`].
///
/// # Example
///
/// ```
/// # use bytes::Bytes;
/// # use futures::StreamExt;
/// # use kodeks::decode::text_chunks;
/// #
/// # tokio_test::block_on(async {
/// // "Вітаю" split mid-character across two frames.
/// let bytes = "Вітаю".as_bytes();
/// let frames: Vec<Result<Bytes, reqwest::Error>> = vec![
///     Ok(Bytes::copy_from_slice(&bytes[..3])),
///     Ok(Bytes::copy_from_slice(&bytes[3..])),
/// ];
///
/// let mut chunks = Box::pin(text_chunks(Box::pin(futures::stream::iter(frames))));
/// let mut answer = String::new();
/// while let Some(chunk) = chunks.next().await {
///     answer.push_str(&chunk.unwrap());
/// }
/// assert_eq!(answer, "Вітаю");
/// # });
/// ```
pub fn text_chunks<S>(byte_stream: S) -> impl Stream<Item = Result<String>>
where
    S: Stream<Item = std::result::Result<Bytes, reqwest::Error>> + Unpin + 'static,
{
    // Convert reqwest errors to our error type.
    let stream = byte_stream.map(|result| {
        result
            .map_err(|e| Error::streaming(format!("Error in HTTP stream: {e}"), Some(Box::new(e))))
    });

    let decoder = Utf8Decoder::new();

    stream::unfold(
        (stream, decoder, false),
        move |(mut stream, mut decoder, done)| async move {
            if done {
                return None;
            }
            loop {
                match stream.next().await {
                    Some(Ok(bytes)) => {
                        observability::STREAM_BYTES.count(bytes.len() as u64);
                        match decoder.decode(&bytes) {
                            // A frame that ends mid-character may decode to
                            // nothing yet; keep reading.
                            Ok(text) if text.is_empty() => continue,
                            Ok(text) => {
                                observability::STREAM_CHUNKS.click();
                                return Some((Ok(text), (stream, decoder, false)));
                            }
                            Err(e) => {
                                observability::STREAM_ERRORS.click();
                                return Some((Err(e), (stream, decoder, true)));
                            }
                        }
                    }
                    Some(Err(e)) => {
                        observability::STREAM_ERRORS.click();
                        return Some((Err(e), (stream, decoder, true)));
                    }
                    None => {
                        decoder.finish();
                        return None;
                    }
                }
            }
        },
    )
}
