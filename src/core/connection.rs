use std::fmt;
use std::future::Future;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;

use crate::core::command::Cmd;
use crate::proto::codec::{Decoder, Encoder};
use crate::proto::frame::Frame;
use crate::{Error, Result};

const READ_CHUNK: usize = 4096;

/// A single connection to a server.
///
/// Wraps an underlying stream and handles RESP frame encoding and decoding.
/// Read and write deadlines apply per frame. Once an I/O, timeout or protocol
/// failure happens the connection is marked broken and the pool discards it
/// instead of handing it out again.
///
/// # Example
///
/// ```no_run
/// use tandem::{Cmd, Connection};
/// use tokio::net::TcpStream;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let stream = TcpStream::connect("127.0.0.1:6379").await?;
///     let mut conn = Connection::new(stream);
///
///     let reply = conn.execute(Cmd::new("PING")).await?;
///     println!("{:?}", reply);
///
///     Ok(())
/// }
/// ```
pub struct Connection<S = TcpStream> {
    stream: S,
    decoder: Decoder,
    encoder: Encoder,
    read_timeout: Option<Duration>,
    write_timeout: Option<Duration>,
    broken: bool,
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Creates a new connection with no timeouts configured.
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            decoder: Decoder::new(),
            encoder: Encoder::new(),
            read_timeout: None,
            write_timeout: None,
            broken: false,
        }
    }

    /// Configures read and write timeouts for this connection.
    ///
    /// `None` (or a zero duration) disables the deadline.
    pub fn with_timeouts(
        mut self,
        read_timeout: Option<Duration>,
        write_timeout: Option<Duration>,
    ) -> Self {
        self.read_timeout = read_timeout.filter(|d| !d.is_zero());
        self.write_timeout = write_timeout.filter(|d| !d.is_zero());
        self
    }

    /// Whether a previous failure left the stream in an unknown state.
    pub fn is_broken(&self) -> bool {
        self.broken
    }

    /// Writes a frame to the connection.
    pub async fn write_frame(&mut self, frame: &Frame) -> Result<()> {
        self.encoder.encode(frame);
        let data = self.encoder.take();
        let deadline = self.write_timeout;
        let stream = &mut self.stream;
        let res = with_deadline(deadline, async move {
            stream.write_all(&data).await?;
            stream.flush().await?;
            Ok(())
        })
        .await;
        self.mark(res)
    }

    /// Reads a frame from the connection.
    ///
    /// Handles partial reads internally and keeps reading until a complete
    /// frame is buffered or an error occurs.
    pub async fn read_frame(&mut self) -> Result<Frame> {
        let deadline = self.read_timeout;
        self.read_frame_within(deadline).await
    }

    async fn read_frame_within(&mut self, deadline: Option<Duration>) -> Result<Frame> {
        let decoder = &mut self.decoder;
        let stream = &mut self.stream;
        let res = with_deadline(deadline, async move {
            let mut buf = [0u8; READ_CHUNK];
            loop {
                if let Some(frame) = decoder.decode()? {
                    return Ok(frame);
                }
                let n = stream.read(&mut buf).await?;
                if n == 0 {
                    return Err(Error::protocol("connection closed"));
                }
                decoder.append(&buf[..n]);
            }
        })
        .await;
        self.mark(res)
    }

    /// Sends a command and waits for its reply.
    ///
    /// An error reply becomes [`Error::Server`]; the connection stays usable.
    pub async fn execute(&mut self, cmd: Cmd) -> Result<Frame> {
        let deadline = self.read_timeout;
        self.round_trip(cmd, deadline).await
    }

    /// Sends a blocking command (`BLPOP`, `BRPOPLPUSH`, ...).
    ///
    /// The read deadline is extended by `block`, the server-side timeout of
    /// the command. A zero `block` blocks forever, so no read deadline is set;
    /// the same goes for a `block` too large to add to the read timeout.
    pub async fn execute_blocking(&mut self, cmd: Cmd, block: Duration) -> Result<Frame> {
        let deadline = if block.is_zero() {
            None
        } else {
            self.read_timeout.and_then(|d| d.checked_add(block))
        };
        self.round_trip(cmd, deadline).await
    }

    async fn round_trip(&mut self, cmd: Cmd, deadline: Option<Duration>) -> Result<Frame> {
        if self.broken {
            return Err(Error::protocol("connection is broken"));
        }
        // Cleared only once the reply is read. A caller dropping this future
        // midway leaves the reply on the wire, so the pool must not reuse it.
        self.broken = true;
        self.write_frame(&cmd.into_frame()).await?;
        let reply = self.read_frame_within(deadline).await?;
        self.broken = false;
        match reply {
            Frame::Error(msg) => Err(Error::Server {
                message: String::from_utf8_lossy(&msg).into_owned(),
            }),
            frame => Ok(frame),
        }
    }

    fn mark<T>(&mut self, res: Result<T>) -> Result<T> {
        if res.is_err() {
            self.broken = true;
        }
        res
    }
}

async fn with_deadline<T, F>(deadline: Option<Duration>, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match deadline {
        Some(d) => tokio::time::timeout(d, fut)
            .await
            .map_err(|_| Error::Timeout)?,
        None => fut.await,
    }
}

impl<S> fmt::Debug for Connection<S>
where
    S: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("stream", &self.stream)
            .field("read_timeout", &self.read_timeout)
            .field("write_timeout", &self.write_timeout)
            .field("broken", &self.broken)
            .finish()
    }
}
