//! Streaming filter implementations for PDF stream data.
//!
//! A filter is a pair of chunk codecs (decode and encode). Codecs are pushed
//! one input chunk at a time, buffer any incomplete trailing group across
//! calls, and hand back whatever output that chunk completed. [`Chunked`]
//! couples a codec to a chunk source so callers can drain output lazily.
//!
//! Only ASCII85Decode is registered; any other name in a `/Filter` chain is
//! reported as [`Error::UnsupportedFilter`].

use crate::error::{Error, Result};
use bytes::Bytes;

mod ascii85;

pub use ascii85::{Ascii85Decoder, Ascii85Encoder, Ascii85Filter};

/// Incremental codec state for one decode or encode pass.
pub trait ChunkCodec {
    /// Consume one input chunk and return the output it completed.
    ///
    /// The returned buffer may be empty when the chunk only extended a
    /// partial group.
    fn feed(&mut self, chunk: &[u8]) -> Result<Bytes>;

    /// Signal the end of input and flush any buffered partial group.
    fn finish(&mut self) -> Result<Bytes>;
}

/// A named stream filter.
pub trait StreamFilter {
    /// Filter name as used in a `/Filter` entry (e.g. "ASCII85Decode").
    fn name(&self) -> &'static str;

    /// Fresh decoder state.
    fn decoder(&self) -> Box<dyn ChunkCodec>;

    /// Fresh encoder state.
    fn encoder(&self) -> Box<dyn ChunkCodec>;

    /// Decode a complete buffer in one pass.
    fn decode(&self, input: &[u8]) -> Result<Vec<u8>> {
        run_codec(self.decoder(), input)
    }

    /// Encode a complete buffer in one pass.
    fn encode(&self, input: &[u8]) -> Result<Vec<u8>> {
        run_codec(self.encoder(), input)
    }
}

fn run_codec(mut codec: Box<dyn ChunkCodec>, input: &[u8]) -> Result<Vec<u8>> {
    let mut output = codec.feed(input)?.to_vec();
    output.extend_from_slice(&codec.finish()?);
    Ok(output)
}

/// Lazy output of a codec driven by a chunk source.
///
/// Each call to `next` pulls source chunks until one of them produces
/// output; once the source is exhausted the codec is finished exactly once.
/// An error ends the sequence.
pub struct Chunked<I> {
    source: I,
    codec: Box<dyn ChunkCodec>,
    done: bool,
}

impl<I> Chunked<I> {
    /// Drive `codec` with chunks from `source`.
    pub fn new(source: I, codec: Box<dyn ChunkCodec>) -> Self {
        Self {
            source,
            codec,
            done: false,
        }
    }
}

impl<I, B> Iterator for Chunked<I>
where
    I: Iterator<Item = B>,
    B: AsRef<[u8]>,
{
    type Item = Result<Bytes>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        for chunk in self.source.by_ref() {
            match self.codec.feed(chunk.as_ref()) {
                Ok(out) if out.is_empty() => continue,
                Ok(out) => return Some(Ok(out)),
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                },
            }
        }

        self.done = true;
        match self.codec.finish() {
            Ok(out) if out.is_empty() => None,
            result => Some(result),
        }
    }
}

/// Decode a chunked source lazily with `filter`.
pub fn decoder<I>(filter: &dyn StreamFilter, source: I) -> Chunked<I::IntoIter>
where
    I: IntoIterator,
    I::Item: AsRef<[u8]>,
{
    Chunked::new(source.into_iter(), filter.decoder())
}

/// Encode a chunked source lazily with `filter`.
pub fn encoder<I>(filter: &dyn StreamFilter, source: I) -> Chunked<I::IntoIter>
where
    I: IntoIterator,
    I::Item: AsRef<[u8]>,
{
    Chunked::new(source.into_iter(), filter.encoder())
}

/// Drain a chunk sequence into one buffer, stopping at the first error.
pub fn collect_chunks<I>(chunks: I) -> Result<Vec<u8>>
where
    I: IntoIterator<Item = Result<Bytes>>,
{
    let mut output = Vec::new();
    for chunk in chunks {
        output.extend_from_slice(&chunk?);
    }
    Ok(output)
}

static ASCII85: Ascii85Filter = Ascii85Filter;

/// Look up a registered filter by its `/Filter` name or abbreviation.
pub fn filter_for(name: &str) -> Result<&'static dyn StreamFilter> {
    match name {
        "ASCII85Decode" | "A85" => Ok(&ASCII85),
        _ => Err(Error::UnsupportedFilter(name.to_string())),
    }
}

/// Decode stream data using a filter pipeline.
///
/// PDF streams can have multiple filters applied in sequence. This function
/// applies each filter in order to decode the data.
pub fn decode_stream(data: &[u8], filters: &[String]) -> Result<Vec<u8>> {
    let mut current = data.to_vec();

    for filter_name in filters {
        let filter = filter_for(filter_name)?;
        current = filter.decode(&current)?;
        log::trace!("{} produced {} bytes", filter.name(), current.len());
    }

    Ok(current)
}

/// PDF whitespace: null (0), tab (9), LF (10), FF (12), CR (13), space (32)
pub(crate) fn is_pdf_whitespace(byte: u8) -> bool {
    matches!(byte, 0x00 | 0x09 | 0x0A | 0x0C | 0x0D | 0x20)
}
