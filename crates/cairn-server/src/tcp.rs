//! TCP server implementation.
//!
//! Messages are framed with a 2-byte length prefix (RFC 1035 §4.2.2). A
//! connection stays open for further queries until it has been idle for
//! the configured timeout or the client closes it.

use super::handler::{QueryContext, QueryHandler, Respond};
use super::{Protocol, Result, ServerError};
use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use cairn_proto::Message;
use socket2::{Domain, Socket, Type};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use tracing::{debug, error, info, trace};

/// Default idle timeout for client connections.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(10);

/// Connection ID counter.
static CONNECTION_ID: AtomicU64 = AtomicU64::new(0);

/// TCP DNS server.
pub struct TcpServer {
    listener: TcpListener,
    handler: Arc<dyn QueryHandler>,
    local_addr: SocketAddr,
    idle_timeout: Duration,
}

impl TcpServer {
    /// Binds a new TCP server to the given address.
    pub async fn bind(addr: SocketAddr, handler: Arc<dyn QueryHandler>) -> Result<Self> {
        let domain = if addr.is_ipv4() {
            Domain::IPV4
        } else {
            Domain::IPV6
        };

        let socket = Socket::new(domain, Type::STREAM, None)?;
        socket.set_reuse_address(true)?;
        socket.set_nonblocking(true)?;
        socket.bind(&addr.into())?;
        socket.listen(1024)?;

        let std_listener: std::net::TcpListener = socket.into();
        let listener = TcpListener::from_std(std_listener)?;
        let local_addr = listener.local_addr()?;

        info!(addr = %local_addr, "TCP server listening");

        Ok(Self {
            listener,
            handler,
            local_addr,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
        })
    }

    /// Returns the local address.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Sets the idle timeout.
    pub fn set_idle_timeout(&mut self, timeout: Duration) {
        self.idle_timeout = timeout;
    }

    /// Runs the TCP server.
    pub async fn run(&self) -> Result<()> {
        loop {
            match self.listener.accept().await {
                Ok((stream, peer)) => {
                    let handler = self.handler.clone();
                    let idle_timeout = self.idle_timeout;
                    let conn_id = CONNECTION_ID.fetch_add(1, Ordering::Relaxed);

                    tokio::spawn(async move {
                        if let Err(e) =
                            handle_connection(stream, peer, handler, idle_timeout, conn_id).await
                        {
                            debug!(error = %e, client = %peer, "TCP connection error");
                        }
                    });
                }
                Err(e) => {
                    error!(error = %e, "Error accepting TCP connection");
                }
            }
        }
    }
}

/// Writes each response as one length-prefixed frame.
struct TcpResponder<'a> {
    stream: &'a mut TcpStream,
    failed: bool,
}

#[async_trait]
impl Respond for TcpResponder<'_> {
    async fn respond(&mut self, response: Message, _keep_open: bool) -> Result<()> {
        let wire = response.to_wire()?;
        let result = write_message(&mut *self.stream, &wire).await;
        if result.is_err() {
            self.failed = true;
        }
        result
    }
}

async fn handle_connection(
    mut stream: TcpStream,
    peer: SocketAddr,
    handler: Arc<dyn QueryHandler>,
    idle_timeout: Duration,
    conn_id: u64,
) -> Result<()> {
    trace!(client = %peer, conn_id, "New TCP connection");

    let mut buf = BytesMut::with_capacity(4096);

    loop {
        match timeout(idle_timeout, read_message(&mut stream, &mut buf)).await {
            Ok(Ok(query_bytes)) => {
                let query = match Message::parse(&query_bytes) {
                    Ok(msg) => msg,
                    Err(e) => {
                        debug!(error = %e, client = %peer, "Failed to parse TCP query");
                        continue;
                    }
                };

                let ctx = QueryContext::new(peer, Protocol::Tcp);
                let mut responder = TcpResponder {
                    stream: &mut stream,
                    failed: false,
                };
                handler.handle(query, &mut responder, ctx).await;

                if responder.failed {
                    trace!(client = %peer, conn_id, "TCP client gone");
                    break;
                }
            }
            Ok(Err(e)) => {
                if e.kind() == std::io::ErrorKind::UnexpectedEof {
                    trace!(client = %peer, conn_id, "TCP connection closed by client");
                } else {
                    debug!(error = %e, client = %peer, "TCP read error");
                }
                break;
            }
            Err(_) => {
                trace!(client = %peer, conn_id, "TCP connection idle timeout");
                break;
            }
        }
    }

    Ok(())
}

/// Reads one length-prefixed DNS message.
pub async fn read_message<R>(stream: &mut R, buf: &mut BytesMut) -> std::io::Result<Bytes>
where
    R: AsyncRead + Unpin,
{
    let mut len_buf = [0u8; 2];
    stream.read_exact(&mut len_buf).await?;
    let len = usize::from(u16::from_be_bytes(len_buf));

    if len == 0 {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            "Invalid TCP message length",
        ));
    }

    buf.clear();
    buf.resize(len, 0);
    stream.read_exact(buf).await?;

    Ok(buf.split().freeze())
}

/// Writes one length-prefixed DNS message.
pub async fn write_message<W>(stream: &mut W, data: &[u8]) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let len = u16::try_from(data.len()).map_err(|_| {
        ServerError::Protocol(cairn_proto::Error::MessageTooLarge {
            size: data.len(),
            max_size: usize::from(u16::MAX),
        })
    })?;

    let mut frame = Vec::with_capacity(data.len() + 2);
    frame.extend_from_slice(&len.to_be_bytes());
    frame.extend_from_slice(data);
    stream.write_all(&frame).await?;
    stream.flush().await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::RefusedHandler;
    use cairn_proto::{Name, Question, RecordClass, RecordType, ResponseCode};
    use std::str::FromStr;

    #[tokio::test]
    async fn test_tcp_server_bind() {
        let handler = Arc::new(RefusedHandler);
        let server = TcpServer::bind("127.0.0.1:0".parse().unwrap(), handler)
            .await
            .unwrap();

        assert!(server.local_addr().port() > 0);
    }

    #[tokio::test]
    async fn test_framing() {
        let (mut client, mut server) = tokio::io::duplex(1024);
        write_message(&mut client, b"\x12\x34hello").await.unwrap();

        let mut buf = BytesMut::new();
        let frame = read_message(&mut server, &mut buf).await.unwrap();
        assert_eq!(&frame[..], b"\x12\x34hello");
    }

    #[tokio::test]
    async fn test_zero_length_rejected() {
        let (mut client, mut server) = tokio::io::duplex(16);
        client.write_all(&[0, 0]).await.unwrap();

        let mut buf = BytesMut::new();
        let err = read_message(&mut server, &mut buf).await.unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidData);
    }

    #[tokio::test]
    async fn test_connection_serves_several_queries() {
        let server = TcpServer::bind("127.0.0.1:0".parse().unwrap(), Arc::new(RefusedHandler))
            .await
            .unwrap();
        let addr = server.local_addr();
        tokio::spawn(async move { server.run().await });

        let mut stream = TcpStream::connect(addr).await.unwrap();
        let mut buf = BytesMut::new();
        for id in [1u16, 2, 3] {
            let query = Message::query(
                id,
                Question::new(Name::from_str("example.com").unwrap(), RecordType::A, RecordClass::IN),
            );
            write_message(&mut stream, &query.to_wire().unwrap()).await.unwrap();

            let reply = read_message(&mut stream, &mut buf).await.unwrap();
            let reply = Message::parse(&reply).unwrap();
            assert_eq!(reply.id(), id);
            assert_eq!(reply.rcode(), ResponseCode::Refused);
        }
    }
}
