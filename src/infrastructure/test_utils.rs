//! Helpers shared by unit tests.

use std::io;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tracing_subscriber::fmt::MakeWriter;

/// In-memory log sink for asserting on emitted events.
#[derive(Clone, Default)]
pub struct LogSink(Arc<Mutex<Vec<u8>>>);

impl LogSink {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }

    pub fn subscriber(&self) -> impl tracing::Subscriber + Send + Sync {
        tracing_subscriber::fmt()
            .with_writer(self.clone())
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .finish()
    }
}

impl io::Write for LogSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogSink {
    type Writer = LogSink;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Minimal RESP server on a random local port.
///
/// Answers `PING` with `+PONG` and every other command, including the
/// `CLIENT SETINFO` pair sent during connection setup, with `+OK`.
pub async fn spawn_redis_stub() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            tokio::spawn(serve_resp(stream));
        }
    });

    addr
}

async fn serve_resp(stream: TcpStream) {
    let (read, mut write) = stream.into_split();
    let mut reader = BufReader::new(read);
    let mut line = String::new();

    loop {
        line.clear();
        if reader.read_line(&mut line).await.unwrap_or(0) == 0 {
            return;
        }
        let Some(count) = line.trim_end().strip_prefix('*').and_then(|n| n.parse().ok()) else {
            return;
        };

        let mut args: Vec<String> = Vec::with_capacity(count);
        for _ in 0..count {
            line.clear();
            if reader.read_line(&mut line).await.unwrap_or(0) == 0 {
                return;
            }
            let Some(len) = line
                .trim_end()
                .strip_prefix('$')
                .and_then(|n| n.parse::<usize>().ok())
            else {
                return;
            };
            let mut buf = vec![0u8; len + 2];
            if reader.read_exact(&mut buf).await.is_err() {
                return;
            }
            buf.truncate(len);
            args.push(String::from_utf8_lossy(&buf).to_uppercase());
        }

        let reply: &[u8] = match args.first().map(String::as_str) {
            Some("PING") => b"+PONG\r\n",
            _ => b"+OK\r\n",
        };
        if write.write_all(reply).await.is_err() {
            return;
        }
    }
}

/// Minimal PostgreSQL backend on a random local port.
///
/// Declines TLS, accepts any startup message without authentication and
/// answers every `Sync` with `ReadyForQuery`, which is all a ping needs.
pub async fn spawn_postgres_stub() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            tokio::spawn(serve_pg(stream));
        }
    });

    addr
}

const PG_SSL_REQUEST: u32 = 80_877_103;
const PG_AUTH_OK: &[u8] = &[b'R', 0, 0, 0, 8, 0, 0, 0, 0];
const PG_READY_IDLE: &[u8] = &[b'Z', 0, 0, 0, 5, b'I'];

async fn serve_pg(mut stream: TcpStream) {
    // Untyped startup phase: optional SSLRequest, then StartupMessage
    loop {
        let Ok(len) = stream.read_u32().await else {
            return;
        };
        let mut body = vec![0u8; (len as usize).saturating_sub(4)];
        if stream.read_exact(&mut body).await.is_err() {
            return;
        }
        if body[..] != PG_SSL_REQUEST.to_be_bytes() {
            break;
        }
        if stream.write_all(b"N").await.is_err() {
            return;
        }
    }

    if stream.write_all(&[PG_AUTH_OK, PG_READY_IDLE].concat()).await.is_err() {
        return;
    }

    // Typed messages: one tag byte, then a length that includes itself
    loop {
        let Ok(tag) = stream.read_u8().await else {
            return;
        };
        let Ok(len) = stream.read_u32().await else {
            return;
        };
        let mut body = vec![0u8; (len as usize).saturating_sub(4)];
        if stream.read_exact(&mut body).await.is_err() {
            return;
        }
        match tag {
            b'S' => {
                if stream.write_all(PG_READY_IDLE).await.is_err() {
                    return;
                }
            }
            b'X' => return,
            _ => {}
        }
    }
}
