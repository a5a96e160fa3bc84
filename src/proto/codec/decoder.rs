use bytes::{Bytes, BytesMut};

use crate::proto::error::{Error, Result};
use crate::proto::frame::Frame;

const DEFAULT_MAX_FRAME_SIZE: usize = 512 * 1024 * 1024; // 512 MB default

/// Deepest array nesting accepted in a reply.
pub const MAX_DEPTH: usize = 64;

/// A RESP decoder that converts bytes to [`Frame`] values.
///
/// The decoder handles streaming input. Call [`append`](Decoder::append) to
/// add data, then [`decode`](Decoder::decode) to parse frames. Nothing is
/// consumed from the buffer until a complete frame is available, so a frame
/// split across several socket reads decodes correctly once its last byte
/// arrives.
///
/// Completeness is checked incrementally: elements already known to be whole
/// are not scanned again when more data arrives, so a large reply costs time
/// linear in its size however it is split.
///
/// # Example
///
/// ```
/// use tandem::proto::codec::Decoder;
/// use tandem::proto::frame::Frame;
///
/// let mut decoder = Decoder::new();
/// decoder.append(b"+OK\r\n");
/// let frame = decoder.decode().unwrap().unwrap();
/// assert_eq!(frame, Frame::SimpleString(b"OK".to_vec()));
/// ```
#[derive(Debug)]
pub struct Decoder {
    buf: BytesMut,
    max_frame_size: usize,
    scan: Scan,
}

/// How far the first buffered frame has been checked.
#[derive(Debug, Default)]
struct Scan {
    /// Offset of the next element to check.
    pos: usize,
    /// Where the CRLF search for the element at `pos` resumes.
    line_from: usize,
    /// Elements still expected by each open array, innermost last.
    open: Vec<usize>,
}

impl Decoder {
    /// Creates a new decoder with an empty buffer.
    pub fn new() -> Self {
        Self::with_max_frame_size(DEFAULT_MAX_FRAME_SIZE)
    }

    /// Creates a new decoder with a custom maximum frame size.
    ///
    /// # Arguments
    ///
    /// * `max_frame_size` - Maximum size in bytes for a single frame
    pub fn with_max_frame_size(max_frame_size: usize) -> Self {
        Self {
            buf: BytesMut::new(),
            max_frame_size,
            scan: Scan::default(),
        }
    }

    /// Appends raw bytes to the internal buffer.
    ///
    /// Buffer size limits are checked during decode, not append.
    pub fn append(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
    }

    /// Number of buffered bytes not yet decoded.
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// Attempts to decode a frame from the buffer.
    ///
    /// Returns `Ok(Some(frame))` if a complete frame was decoded,
    /// `Ok(None)` if more data is needed, and `Err` if the data is malformed
    /// or nests arrays deeper than [`MAX_DEPTH`].
    pub fn decode(&mut self) -> Result<Option<Frame>> {
        if self.buf.is_empty() {
            return Ok(None);
        }

        if self.buf.len() > self.max_frame_size {
            return Err(protocol("buffer size exceeded maximum frame size"));
        }

        let Some(end) = self.check()? else {
            return Ok(None);
        };
        self.scan = Scan::default();
        let data = self.buf.split_to(end).freeze();
        let (frame, _) = parse(&data, 0)?;
        Ok(Some(frame))
    }

    /// Walks forward from the saved scan position over complete elements.
    ///
    /// Returns the end offset of the first frame once all of it is buffered.
    fn check(&mut self) -> Result<Option<usize>> {
        loop {
            let pos = self.scan.pos;
            let Some(&tag) = self.buf.get(pos) else {
                return Ok(None);
            };
            let from = self.scan.line_from.max(pos + 1);
            let Some(cr) = find_crlf(&self.buf, from) else {
                // A trailing '\r' may still pair with the next read.
                self.scan.line_from = self.buf.len().saturating_sub(1).max(pos + 1);
                return Ok(None);
            };
            self.scan.line_from = 0;
            let line = &self.buf[pos + 1..cr];
            let next = cr + 2;

            let end = match tag {
                b'+' | b'-' => next,
                b':' => {
                    parse_int(line)?;
                    next
                }
                b'$' => match bulk_len(line, self.max_frame_size)? {
                    None => next,
                    Some(len) => {
                        let end = next + len;
                        if self.buf.len() < end + 2 {
                            return Ok(None);
                        }
                        if &self.buf[end..end + 2] != b"\r\n" {
                            return Err(protocol("bulk string is not terminated by CRLF"));
                        }
                        end + 2
                    }
                },
                b'*' => match array_len(line, self.max_frame_size)? {
                    Some(len) if len > 0 => {
                        if self.scan.open.len() >= MAX_DEPTH {
                            return Err(protocol("array nesting exceeds maximum depth"));
                        }
                        self.scan.open.push(len);
                        self.scan.pos = next;
                        continue;
                    }
                    _ => next,
                },
                other => return Err(protocol(format!("unknown frame type: {}", other as char))),
            };

            self.scan.pos = end;
            loop {
                match self.scan.open.last_mut() {
                    None => return Ok(Some(end)),
                    Some(left) if *left > 1 => {
                        *left -= 1;
                        break;
                    }
                    Some(_) => {
                        self.scan.open.pop();
                    }
                }
            }
        }
    }
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builds the frame starting at `pos` from data already known to be complete.
///
/// Returns the frame and the offset just past it.
fn parse(buf: &Bytes, pos: usize) -> Result<(Frame, usize)> {
    let tag = *buf.get(pos).ok_or_else(|| protocol("truncated frame"))?;
    let cr = find_crlf(buf, pos + 1).ok_or_else(|| protocol("truncated frame"))?;
    let line = &buf[pos + 1..cr];
    let next = cr + 2;

    match tag {
        b'+' => Ok((Frame::SimpleString(line.to_vec()), next)),
        b'-' => Ok((Frame::Error(line.to_vec()), next)),
        b':' => Ok((Frame::Integer(parse_int(line)?), next)),
        b'$' => match bulk_len(line, usize::MAX)? {
            None => Ok((Frame::BulkString(None), next)),
            Some(len) => {
                let end = next + len;
                if buf.len() < end + 2 {
                    return Err(protocol("truncated frame"));
                }
                Ok((Frame::BulkString(Some(buf.slice(next..end))), end + 2))
            }
        },
        b'*' => match array_len(line, usize::MAX)? {
            None => Ok((Frame::Null, next)),
            Some(len) => {
                let mut items = Vec::with_capacity(len.min(1024));
                let mut cursor = next;
                for _ in 0..len {
                    let (frame, after) = parse(buf, cursor)?;
                    items.push(frame);
                    cursor = after;
                }
                Ok((Frame::Array(items), cursor))
            }
        },
        other => Err(protocol(format!("unknown frame type: {}", other as char))),
    }
}

/// Payload length of a bulk string header, `None` for a nil bulk.
fn bulk_len(line: &[u8], max_frame_size: usize) -> Result<Option<usize>> {
    let Ok(len) = usize::try_from(parse_int(line)?) else {
        return Ok(None);
    };
    if len > max_frame_size {
        return Err(protocol("bulk string length exceeds maximum frame size"));
    }
    Ok(Some(len))
}

/// Element count of an array header, `None` for a nil array.
fn array_len(line: &[u8], max_frame_size: usize) -> Result<Option<usize>> {
    let Ok(len) = usize::try_from(parse_int(line)?) else {
        return Ok(None);
    };
    // Every element needs at least 3 bytes ("+\r\n").
    if len > max_frame_size / 3 {
        return Err(protocol("array length exceeds reasonable maximum"));
    }
    Ok(Some(len))
}

/// Offset of the first CRLF at or after `from`.
fn find_crlf(buf: &[u8], from: usize) -> Option<usize> {
    buf.get(from..)?
        .windows(2)
        .position(|w| w == b"\r\n")
        .map(|i| from + i)
}

fn parse_int(line: &[u8]) -> Result<i64> {
    std::str::from_utf8(line)
        .ok()
        .and_then(|s| s.parse::<i64>().ok())
        .ok_or_else(|| protocol(format!("invalid integer: {}", String::from_utf8_lossy(line))))
}

fn protocol(message: impl Into<String>) -> Error {
    Error::Protocol {
        message: message.into(),
    }
}
