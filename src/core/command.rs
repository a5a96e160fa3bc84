use std::collections::HashMap;
use std::fmt;

use bytes::Bytes;

use crate::proto::frame::Frame;
use crate::{Error, Result};

/// A command ready to be sent to the server.
///
/// Commands are built with the builder pattern and converted to a RESP
/// array of bulk strings for transmission.
///
/// # Example
///
/// ```
/// use tandem::Cmd;
///
/// let cmd = Cmd::new("SET").arg("key").arg("value").arg("EX").arg_num(60);
/// assert_eq!(cmd.name(), "SET");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Cmd {
    name: &'static str,
    args: Vec<Bytes>,
}

impl Cmd {
    /// Creates a new command with the given name.
    #[inline]
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            args: Vec::new(),
        }
    }

    /// Appends a binary-safe argument.
    #[inline]
    pub fn arg(mut self, arg: impl AsRef<[u8]>) -> Self {
        self.args.push(Bytes::copy_from_slice(arg.as_ref()));
        self
    }

    /// Appends a numeric argument in its decimal text form.
    #[inline]
    pub fn arg_num<T: fmt::Display>(self, n: T) -> Self {
        self.arg(n.to_string())
    }

    /// Appends every argument of an iterator.
    #[inline]
    pub fn args<I>(mut self, args: I) -> Self
    where
        I: IntoIterator,
        I::Item: AsRef<[u8]>,
    {
        self.args
            .extend(args.into_iter().map(|a| Bytes::copy_from_slice(a.as_ref())));
        self
    }

    /// Appends `arg` only when `cond` holds.
    #[inline]
    pub fn arg_if(self, cond: bool, arg: impl AsRef<[u8]>) -> Self {
        if cond {
            self.arg(arg)
        } else {
            self
        }
    }

    /// The command name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Arguments after the command name.
    pub fn arguments(&self) -> &[Bytes] {
        &self.args
    }

    /// Converts the command to a RESP Array frame.
    #[inline]
    pub fn into_frame(self) -> Frame {
        let mut items = Vec::with_capacity(self.args.len() + 1);
        items.push(Frame::BulkString(Some(Bytes::from_static(
            self.name.as_bytes(),
        ))));
        items.extend(self.args.into_iter().map(|b| Frame::BulkString(Some(b))));
        Frame::Array(items)
    }
}

/// Formats a score for the wire, spelling infinities the way the server does.
pub(crate) fn score_arg(score: f64) -> String {
    if score == f64::INFINITY {
        "+inf".to_string()
    } else if score == f64::NEG_INFINITY {
        "-inf".to_string()
    } else {
        score.to_string()
    }
}

/// Fails with `InvalidArgument` when a variadic command got no arguments.
pub(crate) fn ensure_non_empty<T>(items: &[T], command: &str) -> Result<()> {
    if items.is_empty() {
        return Err(Error::invalid(format!(
            "{command} needs at least one argument"
        )));
    }
    Ok(())
}

/// Creates a PING command.
#[inline]
pub fn ping() -> Cmd {
    Cmd::new("PING")
}

/// Creates an AUTH command with password only.
#[inline]
pub fn auth(password: impl AsRef<[u8]>) -> Cmd {
    Cmd::new("AUTH").arg(password)
}

/// Creates a SELECT command.
#[inline]
pub fn select(db: u8) -> Cmd {
    Cmd::new("SELECT").arg_num(db)
}

/// Creates an INFO command for one section.
#[inline]
pub fn info(section: crate::Section) -> Cmd {
    Cmd::new("INFO").arg(section.as_str())
}

fn unexpected(frame: &Frame, expected: &str) -> Error {
    Error::protocol(format!("expected {expected}, got {}", frame.kind()))
}

fn parse_text<T: std::str::FromStr>(raw: &[u8], what: &str) -> Result<T> {
    std::str::from_utf8(raw)
        .ok()
        .and_then(|s| s.parse::<T>().ok())
        .ok_or_else(|| {
            Error::protocol(format!("invalid {what}: {}", String::from_utf8_lossy(raw)))
        })
}

/// Accepts any status reply (`+OK`, `+Background saving started`, ...).
#[inline]
pub fn frame_to_unit(frame: Frame) -> Result<()> {
    match frame {
        Frame::SimpleString(_) => Ok(()),
        other => Err(unexpected(&other, "status reply")),
    }
}

/// Converts a status reply to `true` and a nil reply to `false`.
///
/// Used by commands such as `SET ... NX` that answer nil when the condition
/// blocked the write.
#[inline]
pub fn frame_to_status_flag(frame: Frame) -> Result<bool> {
    match frame {
        Frame::SimpleString(_) => Ok(true),
        f if f.is_null() => Ok(false),
        other => Err(unexpected(&other, "status or nil")),
    }
}

/// Converts a frame to an integer.
#[inline]
pub fn frame_to_int(frame: Frame) -> Result<i64> {
    match frame {
        Frame::Integer(i) => Ok(i),
        Frame::BulkString(Some(b)) => parse_text(&b, "integer"),
        other => Err(unexpected(&other, "integer")),
    }
}

/// Converts a frame to an integer, mapping nil to `None`.
#[inline]
pub fn frame_to_opt_int(frame: Frame) -> Result<Option<i64>> {
    if frame.is_null() {
        return Ok(None);
    }
    frame_to_int(frame).map(Some)
}

/// Converts an integer reply to a boolean (non-zero is `true`).
#[inline]
pub fn frame_to_bool(frame: Frame) -> Result<bool> {
    frame_to_int(frame).map(|n| n != 0)
}

/// Converts a frame to bytes, mapping nil to `None`.
#[inline]
pub fn frame_to_bytes(frame: Frame) -> Result<Option<Bytes>> {
    match frame {
        Frame::BulkString(b) => Ok(b),
        Frame::SimpleString(s) => Ok(Some(Bytes::from(s))),
        Frame::Null => Ok(None),
        other => Err(unexpected(&other, "bulk string")),
    }
}

/// Converts a frame to bytes that must be present.
#[inline]
pub fn frame_to_value(frame: Frame) -> Result<Bytes> {
    match frame {
        Frame::BulkString(Some(b)) => Ok(b),
        other => Err(unexpected(&other, "bulk string")),
    }
}

/// Converts a frame to a string.
#[inline]
pub fn frame_to_string(frame: Frame) -> Result<String> {
    match frame {
        Frame::SimpleString(s) => Ok(String::from_utf8_lossy(&s).into_owned()),
        Frame::BulkString(Some(b)) => Ok(String::from_utf8_lossy(&b).into_owned()),
        Frame::Integer(i) => Ok(i.to_string()),
        other => Err(unexpected(&other, "string")),
    }
}

/// Converts a frame to a string, mapping nil to `None`.
#[inline]
pub fn frame_to_opt_string(frame: Frame) -> Result<Option<String>> {
    if frame.is_null() {
        return Ok(None);
    }
    frame_to_string(frame).map(Some)
}

/// Converts a frame to a float.
///
/// Accepts `inf`, `-inf` and `+inf` as the server writes them.
#[inline]
pub fn frame_to_float(frame: Frame) -> Result<f64> {
    match frame {
        Frame::BulkString(Some(b)) => parse_text(&b, "float"),
        Frame::SimpleString(s) => parse_text(&s, "float"),
        Frame::Integer(i) => Ok(i as f64),
        other => Err(unexpected(&other, "float")),
    }
}

/// Converts a frame to a float, mapping nil to `None`.
#[inline]
pub fn frame_to_opt_float(frame: Frame) -> Result<Option<f64>> {
    if frame.is_null() {
        return Ok(None);
    }
    frame_to_float(frame).map(Some)
}

/// Unwraps an array reply. A nil array becomes an empty vector.
#[inline]
pub fn frame_to_array(frame: Frame) -> Result<Vec<Frame>> {
    match frame {
        Frame::Array(items) => Ok(items),
        Frame::Null => Ok(Vec::new()),
        other => Err(unexpected(&other, "array")),
    }
}

/// Converts a frame array to a vector of optional bytes.
#[inline]
pub fn frame_to_vec_bytes(frame: Frame) -> Result<Vec<Option<Bytes>>> {
    frame_to_array(frame)?
        .into_iter()
        .map(frame_to_bytes)
        .collect()
}

/// Converts a frame array to a vector of present values.
#[inline]
pub fn frame_to_vec_value(frame: Frame) -> Result<Vec<Bytes>> {
    frame_to_array(frame)?
        .into_iter()
        .map(frame_to_value)
        .collect()
}

/// Converts a frame array to a vector of strings.
#[inline]
pub fn frame_to_vec_string(frame: Frame) -> Result<Vec<String>> {
    frame_to_array(frame)?
        .into_iter()
        .map(frame_to_string)
        .collect()
}

/// Converts a frame array to a vector of optional integers.
#[inline]
pub fn frame_to_vec_opt_int(frame: Frame) -> Result<Vec<Option<i64>>> {
    frame_to_array(frame)?
        .into_iter()
        .map(frame_to_opt_int)
        .collect()
}

/// Converts a flat `[field, value, field, value, ...]` array into pairs.
#[inline]
pub fn frame_to_pairs(frame: Frame) -> Result<Vec<(String, Bytes)>> {
    let items = frame_to_array(frame)?;
    if items.len() % 2 != 0 {
        return Err(Error::protocol(
            "field/value reply must have an even number of elements",
        ));
    }

    let mut pairs = Vec::with_capacity(items.len() / 2);
    let mut iter = items.into_iter();
    while let (Some(field), Some(value)) = (iter.next(), iter.next()) {
        pairs.push((frame_to_string(field)?, frame_to_value(value)?));
    }
    Ok(pairs)
}

/// Converts a frame array to a hashmap (HGETALL response).
#[inline]
pub fn frame_to_hashmap(frame: Frame) -> Result<HashMap<String, Bytes>> {
    Ok(frame_to_pairs(frame)?.into_iter().collect())
}

/// Converts a flat `[member, score, ...]` array (WITHSCORES) into pairs.
#[inline]
pub fn frame_to_scored(frame: Frame) -> Result<Vec<(String, f64)>> {
    let items = frame_to_array(frame)?;
    if items.len() % 2 != 0 {
        return Err(Error::protocol(
            "member/score reply must have an even number of elements",
        ));
    }

    let mut scored = Vec::with_capacity(items.len() / 2);
    let mut iter = items.into_iter();
    while let (Some(member), Some(score)) = (iter.next(), iter.next()) {
        scored.push((frame_to_string(member)?, frame_to_float(score)?));
    }
    Ok(scored)
}

/// Splits a SCAN-family reply into the next cursor and the raw page.
#[inline]
pub fn frame_to_scan_page(frame: Frame) -> Result<(u64, Frame)> {
    let mut items = frame_to_array(frame)?;
    if items.len() != 2 {
        return Err(Error::protocol("SCAN response must have 2 elements"));
    }
    let page = items.pop().unwrap_or(Frame::Null);
    let cursor = match items.pop() {
        Some(Frame::BulkString(Some(b))) => parse_text(&b, "cursor")?,
        Some(Frame::Integer(i)) if i >= 0 => i as u64,
        Some(other) => return Err(unexpected(&other, "cursor")),
        None => return Err(Error::protocol("missing SCAN cursor")),
    };
    Ok((cursor, page))
}
