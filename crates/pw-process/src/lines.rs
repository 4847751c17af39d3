//! Splits backend output into lines.
//!
//! Backends terminate status lines with a bare `\r` so they overwrite each
//! other on a terminal, so both `\r` and `\n` end a line. Bytes are decoded
//! as UTF-8, replacing invalid sequences.

use bytes::BytesMut;
use tokio_util::codec::Decoder;

/// Longest line kept before it is cut and emitted as-is.
const MAX_LINE: usize = 64 * 1024;

#[derive(Debug, Clone, Copy, Default)]
pub struct LineCodec;

impl LineCodec {
    fn take(buf: &mut BytesMut, len: usize, skip: usize) -> String {
        let chunk = buf.split_to(len + skip);
        String::from_utf8_lossy(&chunk[..len]).trim().to_string()
    }
}

impl Decoder for LineCodec {
    type Item = String;
    type Error = std::io::Error;

    fn decode(&mut self, buf: &mut BytesMut) -> Result<Option<String>, Self::Error> {
        loop {
            match buf.iter().position(|b| *b == b'\n' || *b == b'\r') {
                Some(pos) => {
                    let line = Self::take(buf, pos, 1);
                    if !line.is_empty() {
                        return Ok(Some(line));
                    }
                }
                None if buf.len() >= MAX_LINE => {
                    return Ok(Some(Self::take(buf, MAX_LINE, 0)));
                }
                None => return Ok(None),
            }
        }
    }

    fn decode_eof(&mut self, buf: &mut BytesMut) -> Result<Option<String>, Self::Error> {
        if let Some(line) = self.decode(buf)? {
            return Ok(Some(line));
        }
        if buf.is_empty() {
            return Ok(None);
        }
        let line = Self::take(buf, buf.len(), 0);
        Ok((!line.is_empty()).then_some(line))
    }
}
