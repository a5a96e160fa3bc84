use bytes::{BufMut, BytesMut};

use crate::proto::frame::Frame;

/// A RESP encoder that converts [`Frame`] values to bytes.
///
/// The encoder accumulates data in an internal buffer; call
/// [`take`](Encoder::take) to drain it once the frames are written.
///
/// # Example
///
/// ```
/// use tandem::proto::codec::Encoder;
/// use tandem::proto::frame::Frame;
///
/// let mut encoder = Encoder::new();
/// encoder.encode(&Frame::SimpleString(b"OK".to_vec()));
/// assert_eq!(encoder.take().as_ref(), b"+OK\r\n");
/// ```
#[derive(Debug)]
pub struct Encoder {
    buf: BytesMut,
}

impl Encoder {
    /// Creates a new encoder with an empty buffer.
    pub fn new() -> Self {
        Self {
            buf: BytesMut::new(),
        }
    }

    /// Encodes a frame into the internal buffer.
    pub fn encode(&mut self, frame: &Frame) {
        match frame {
            Frame::SimpleString(s) => self.put_line(b'+', s),
            Frame::Error(e) => self.put_line(b'-', e),
            Frame::Integer(n) => self.put_line(b':', n.to_string().as_bytes()),
            Frame::BulkString(Some(data)) => {
                self.put_line(b'$', data.len().to_string().as_bytes());
                self.buf.extend_from_slice(data);
                self.buf.extend_from_slice(b"\r\n");
            }
            Frame::BulkString(None) => self.buf.extend_from_slice(b"$-1\r\n"),
            Frame::Array(items) => {
                self.put_line(b'*', items.len().to_string().as_bytes());
                for item in items {
                    self.encode(item);
                }
            }
            Frame::Null => self.buf.extend_from_slice(b"*-1\r\n"),
        }
    }

    /// Takes the encoded data from the buffer, leaving it empty.
    pub fn take(&mut self) -> BytesMut {
        self.buf.split()
    }

    fn put_line(&mut self, prefix: u8, body: &[u8]) {
        self.buf.put_u8(prefix);
        self.buf.extend_from_slice(body);
        self.buf.extend_from_slice(b"\r\n");
    }
}

impl Default for Encoder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    #[test]
    fn test_encode_simple_string() {
        let mut encoder = Encoder::new();
        encoder.encode(&Frame::SimpleString(b"OK".to_vec()));
        assert_eq!(encoder.take().as_ref(), b"+OK\r\n");
    }

    #[test]
    fn test_encode_error() {
        let mut encoder = Encoder::new();
        encoder.encode(&Frame::Error(b"ERR".to_vec()));
        assert_eq!(encoder.take().as_ref(), b"-ERR\r\n");
    }

    #[test]
    fn test_encode_integer() {
        let mut encoder = Encoder::new();
        encoder.encode(&Frame::Integer(-42));
        assert_eq!(encoder.take().as_ref(), b":-42\r\n");
    }

    #[test]
    fn test_encode_bulk_string() {
        let mut encoder = Encoder::new();
        encoder.encode(&Frame::BulkString(Some(Bytes::from("hello"))));
        assert_eq!(encoder.take().as_ref(), b"$5\r\nhello\r\n");
    }

    #[test]
    fn test_encode_nulls() {
        let mut encoder = Encoder::new();
        encoder.encode(&Frame::BulkString(None));
        encoder.encode(&Frame::Null);
        assert_eq!(encoder.take().as_ref(), b"$-1\r\n*-1\r\n");
    }

    #[test]
    fn test_encode_command_array() {
        let mut encoder = Encoder::new();
        encoder.encode(&Frame::Array(vec![
            Frame::bulk("GET"),
            Frame::bulk("key"),
        ]));
        assert_eq!(encoder.take().as_ref(), b"*2\r\n$3\r\nGET\r\n$3\r\nkey\r\n");
    }

    #[test]
    fn test_take_resets_buffer() {
        let mut encoder = Encoder::new();
        encoder.encode(&Frame::Integer(1));
        let _ = encoder.take();
        encoder.encode(&Frame::Integer(2));
        assert_eq!(encoder.take().as_ref(), b":2\r\n");
    }
}
