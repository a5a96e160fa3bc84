use bytes::Bytes;

/// A RESP (Redis Serialization Protocol) frame.
///
/// Commands travel to the server as an `Array` of `BulkString`s; replies can
/// be any of the variants below.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    /// Simple string (+OK).
    SimpleString(Vec<u8>),
    /// Error (-ERR).
    Error(Vec<u8>),
    /// Integer (:1000).
    Integer(i64),
    /// Bulk string ($6\r\nfoobar). `None` is the null bulk string `$-1`.
    BulkString(Option<Bytes>),
    /// Array (*2\r\n...).
    Array(Vec<Frame>),
    /// Null array (*-1).
    Null,
}

impl Frame {
    /// Returns true for both null encodings (`$-1` and `*-1`).
    pub fn is_null(&self) -> bool {
        matches!(self, Frame::Null | Frame::BulkString(None))
    }

    /// Short name of the frame kind, used in conversion error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Frame::SimpleString(_) => "simple string",
            Frame::Error(_) => "error",
            Frame::Integer(_) => "integer",
            Frame::BulkString(Some(_)) => "bulk string",
            Frame::BulkString(None) | Frame::Null => "nil",
            Frame::Array(_) => "array",
        }
    }

    /// Builds a bulk string frame from anything byte-like.
    pub fn bulk(data: impl AsRef<[u8]>) -> Self {
        Frame::BulkString(Some(Bytes::copy_from_slice(data.as_ref())))
    }
}

#[cfg(test)]
impl Frame {
    /// Converts the frame to a human-readable string representation.
    pub fn to_string(&self) -> Option<String> {
        match self {
            Frame::SimpleString(s) => String::from_utf8(s.clone()).ok(),
            Frame::Error(e) => String::from_utf8(e.clone()).ok(),
            Frame::Integer(i) => Some(i.to_string()),
            Frame::BulkString(b) => b.as_ref().map(|s| String::from_utf8_lossy(s).into_owned()),
            Frame::Array(a) => Some(format!(
                "[{}]",
                a.iter()
                    .filter_map(|f| f.to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            )),
            Frame::Null => Some("nil".to_string()),
        }
    }
}
