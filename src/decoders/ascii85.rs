//! ASCII85Decode (Base85) implementation.
//!
//! This encoding represents 4 bytes as 5 ASCII characters in the range
//! '!' to 'u'. Special case: 'z' represents 4 zero bytes. The optional
//! end-of-data marker is `~>`; anything after it is ignored.

use super::{is_pdf_whitespace, ChunkCodec, StreamFilter};
use crate::error::{Error, Result};
use bytes::Bytes;

/// Value of the padding character 'u' (117 - 33).
const PAD: u64 = 84;

/// ASCII85Decode filter.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ascii85Filter;

impl StreamFilter for Ascii85Filter {
    fn name(&self) -> &'static str {
        "ASCII85Decode"
    }

    fn decoder(&self) -> Box<dyn ChunkCodec> {
        Box::new(Ascii85Decoder::default())
    }

    fn encoder(&self) -> Box<dyn ChunkCodec> {
        Box::new(Ascii85Encoder::default())
    }
}

/// Incremental ASCII85 decoder.
///
/// A partial group is carried across `feed` calls, so the output does not
/// depend on how the input is split into chunks.
#[derive(Debug, Default)]
pub struct Ascii85Decoder {
    acc: u64,
    count: usize,
    /// Saw '~', expecting '>'
    tilde: bool,
    /// Saw the complete end-of-data marker
    eod: bool,
}

impl Ascii85Decoder {
    fn push_digit(&mut self, byte: u8, out: &mut Vec<u8>) -> Result<()> {
        self.acc = self.acc * 85 + u64::from(byte - b'!');
        self.count += 1;

        if self.count == 5 {
            if self.acc > u64::from(u32::MAX) {
                return Err(Error::MalformedInput(
                    "ASCII85Decode: group value exceeds 32 bits".to_string(),
                ));
            }
            out.extend_from_slice(&(self.acc as u32).to_be_bytes());
            self.acc = 0;
            self.count = 0;
        }
        Ok(())
    }
}

impl ChunkCodec for Ascii85Decoder {
    fn feed(&mut self, chunk: &[u8]) -> Result<Bytes> {
        let mut out = Vec::with_capacity(chunk.len() / 5 * 4 + 4);

        for &byte in chunk {
            if self.eod {
                break;
            }

            if self.tilde {
                match byte {
                    b'>' => {
                        self.tilde = false;
                        self.eod = true;
                    },
                    _ if is_pdf_whitespace(byte) => {},
                    _ => {
                        return Err(Error::MalformedInput(format!(
                            "ASCII85Decode: '~' followed by '{}' instead of '>'",
                            byte as char
                        )));
                    },
                }
                continue;
            }

            match byte {
                b'~' => self.tilde = true,
                b'z' => {
                    if self.count != 0 {
                        return Err(Error::MalformedInput(
                            "ASCII85Decode: 'z' must not appear in the middle of a group"
                                .to_string(),
                        ));
                    }
                    out.extend_from_slice(&[0, 0, 0, 0]);
                },
                b'!'..=b'u' => self.push_digit(byte, &mut out)?,
                _ if is_pdf_whitespace(byte) => {},
                _ => {
                    return Err(Error::MalformedInput(format!(
                        "ASCII85Decode: invalid character '{}'",
                        byte as char
                    )));
                },
            }
        }

        Ok(Bytes::from(out))
    }

    fn finish(&mut self) -> Result<Bytes> {
        if self.tilde {
            return Err(Error::MalformedInput(
                "ASCII85Decode: incomplete end-of-data marker".to_string(),
            ));
        }

        let count = std::mem::take(&mut self.count);
        let mut acc = std::mem::take(&mut self.acc);
        if count == 0 {
            return Ok(Bytes::new());
        }

        // n trailing characters carry n - 1 bytes; pad with 'u'
        for _ in count..5 {
            acc = acc * 85 + PAD;
        }
        if acc > u64::from(u32::MAX) {
            return Err(Error::MalformedInput(
                "ASCII85Decode: trailing group value exceeds 32 bits".to_string(),
            ));
        }

        let bytes = (acc as u32).to_be_bytes();
        Ok(Bytes::copy_from_slice(&bytes[..count - 1]))
    }
}

/// Incremental ASCII85 encoder.
#[derive(Debug, Default)]
pub struct Ascii85Encoder {
    pending: [u8; 4],
    len: usize,
}

fn encode_group(group: [u8; 4]) -> [u8; 5] {
    let mut value = u32::from_be_bytes(group);
    let mut chars = [0u8; 5];
    for slot in chars.iter_mut().rev() {
        *slot = (value % 85) as u8 + b'!';
        value /= 85;
    }
    chars
}

impl ChunkCodec for Ascii85Encoder {
    fn feed(&mut self, chunk: &[u8]) -> Result<Bytes> {
        let mut out = Vec::with_capacity((chunk.len() + self.len) / 4 * 5);

        for &byte in chunk {
            self.pending[self.len] = byte;
            self.len += 1;

            if self.len == 4 {
                if self.pending == [0, 0, 0, 0] {
                    out.push(b'z');
                } else {
                    let chars = encode_group(self.pending);
                    out.extend_from_slice(&chars);
                }
                self.len = 0;
            }
        }

        Ok(Bytes::from(out))
    }

    fn finish(&mut self) -> Result<Bytes> {
        let mut out = Vec::with_capacity(7);
        let len = std::mem::take(&mut self.len);

        if len > 0 {
            let mut group = [0u8; 4];
            group[..len].copy_from_slice(&self.pending[..len]);
            let chars = encode_group(group);
            out.extend_from_slice(&chars[..len + 1]);
        }
        out.extend_from_slice(b"~>");

        Ok(Bytes::from(out))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(input: &[u8]) -> Result<Vec<u8>> {
        Ascii85Filter.decode(input)
    }

    #[test]
    fn test_ascii85_decode_simple() {
        // "Test" encoded in ASCII85 (4 bytes = 1 complete group)
        assert_eq!(decode(b"<+U,m").unwrap(), b"Test");
    }

    #[test]
    fn test_ascii85_decode_z_special_case() {
        assert_eq!(decode(b"z").unwrap(), b"\x00\x00\x00\x00");
        assert_eq!(decode(b"zz").unwrap(), [0u8; 8]);
    }

    #[test]
    fn test_ascii85_decode_with_whitespace() {
        assert_eq!(decode(b"<+U ,m").unwrap(), b"Test");
    }

    #[test]
    fn test_ascii85_decode_with_end_marker() {
        assert_eq!(decode(b"<+U,m~>").unwrap(), b"Test");
        assert_eq!(decode(b"<+U,m~ >").unwrap(), b"Test");
    }

    #[test]
    fn test_ascii85_decode_empty() {
        assert_eq!(decode(b"").unwrap(), b"");
        assert_eq!(decode(b"~>").unwrap(), b"");
    }

    #[test]
    fn test_ascii85_decode_single_trailing_char() {
        // One trailing character carries no bytes
        assert_eq!(decode(b"<+U,m!").unwrap(), b"Test");
    }

    #[test]
    fn test_ascii85_decode_invalid_character() {
        assert!(matches!(decode(b":2bwx!"), Err(Error::MalformedInput(_))));
    }

    #[test]
    fn test_ascii85_decode_z_in_middle() {
        assert!(decode(b"!z").is_err());
        assert!(decode(b"uuz").is_err());
    }

    #[test]
    fn test_ascii85_decode_overflow() {
        assert!(decode(b"uuuuu").is_err());
        assert!(decode(b"uuu>").is_err());
    }

    #[test]
    fn test_ascii85_decode_dangling_tilde() {
        assert!(decode(b"uu~").is_err());
        assert!(decode(b"<+U,m~x").is_err());
    }

    #[test]
    fn test_ascii85_encode_groups() {
        assert_eq!(Ascii85Filter.encode(b"Test").unwrap(), b"<+U,m~>");
        assert_eq!(Ascii85Filter.encode(b"\0\0\0\0").unwrap(), b"z~>");
        assert_eq!(Ascii85Filter.encode(b"").unwrap(), b"~>");
    }

    #[test]
    fn test_ascii85_encode_partial_zero_group_is_not_z() {
        let encoded = Ascii85Filter.encode(b"\0\0").unwrap();
        assert_eq!(encoded, b"!!!~>");
        assert_eq!(decode(&encoded).unwrap(), b"\0\0");
    }

    #[test]
    fn test_ascii85_filter_name() {
        assert_eq!(Ascii85Filter.name(), "ASCII85Decode");
    }
}
