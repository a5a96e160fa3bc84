//! In-process mock server for integration tests.
//!
//! Answers `PING` and `INFO` on its own (reporting a configurable server
//! version), records every other command it receives, and asks a handler
//! for the reply.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use tandem::{ConnPool, Connection, Frame, PoolOptions};
use tokio::net::TcpListener;

type Handler = Arc<dyn Fn(&[String]) -> Frame + Send + Sync>;

pub struct MockServer {
    pub addr: String,
    log: Arc<Mutex<Vec<Vec<String>>>>,
}

impl MockServer {
    pub async fn start<F>(version: &str, handler: F) -> Self
    where
        F: Fn(&[String]) -> Frame + Send + Sync + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        let log = Arc::new(Mutex::new(Vec::new()));
        let handler: Handler = Arc::new(handler);
        let info = format!("# Server\r\nredis_version:{version}\r\nredis_mode:standalone\r\n");

        let accept_log = Arc::clone(&log);
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let log = Arc::clone(&accept_log);
                let handler = Arc::clone(&handler);
                let info = info.clone();
                tokio::spawn(async move {
                    let mut conn = Connection::new(stream);
                    while let Ok(frame) = conn.read_frame().await {
                        let args = words(frame);
                        let reply = match args.first().map(String::as_str) {
                            Some("PING") => Frame::SimpleString(b"PONG".to_vec()),
                            Some("INFO") => Frame::bulk(&info),
                            _ => {
                                log.lock().unwrap().push(args.clone());
                                handler(&args)
                            }
                        };
                        if conn.write_frame(&reply).await.is_err() {
                            break;
                        }
                    }
                });
            }
        });

        Self { addr, log }
    }

    /// Every recorded command, `PING` and `INFO` excluded.
    pub fn commands(&self) -> Vec<Vec<String>> {
        self.log.lock().unwrap().clone()
    }

    /// The last recorded command.
    pub fn last(&self) -> Vec<String> {
        self.commands().pop().unwrap_or_default()
    }

    /// How many recorded commands are named `name`.
    pub fn count(&self, name: &str) -> usize {
        self.commands()
            .iter()
            .filter(|c| c.first().map(String::as_str) == Some(name))
            .count()
    }
}

fn words(frame: Frame) -> Vec<String> {
    match frame {
        Frame::Array(items) => items
            .into_iter()
            .map(|f| match f {
                Frame::BulkString(Some(b)) => String::from_utf8_lossy(&b).into_owned(),
                other => format!("{other:?}"),
            })
            .collect(),
        other => vec![format!("{other:?}")],
    }
}

pub fn ok() -> Frame {
    Frame::SimpleString(b"OK".to_vec())
}

pub fn int(n: i64) -> Frame {
    Frame::Integer(n)
}

pub fn bulk(s: &str) -> Frame {
    Frame::bulk(s)
}

pub fn nil() -> Frame {
    Frame::BulkString(None)
}

pub fn array(items: Vec<Frame>) -> Frame {
    Frame::Array(items)
}

pub fn args(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

pub fn options() -> PoolOptions {
    PoolOptions {
        max_active: 4,
        ..PoolOptions::default()
    }
}

/// A mock master replying with `handler`, and a master-only pool on it.
pub async fn pool_with<F>(version: &str, handler: F) -> (MockServer, ConnPool)
where
    F: Fn(&[String]) -> Frame + Send + Sync + 'static,
{
    let server = MockServer::start(version, handler).await;
    let pool = ConnPool::connect::<&str>(&server.addr, &[], &options())
        .await
        .unwrap();
    (server, pool)
}

/// A mock master that replies `reply` to everything.
pub async fn pool_replying(version: &str, reply: Frame) -> (MockServer, ConnPool) {
    pool_with(version, move |_| reply.clone()).await
}
