//! UDP server implementation.

use super::handler::{QueryContext, QueryHandler, Respond};
use super::{Protocol, Result};
use async_trait::async_trait;
use bytes::Bytes;
use cairn_proto::{Message, MAX_UDP_MESSAGE_SIZE};
use socket2::{Domain, Socket, Type};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::UdpSocket;
use tracing::{debug, error, info, trace};

/// UDP DNS server.
pub struct UdpServer {
    socket: Arc<UdpSocket>,
    handler: Arc<dyn QueryHandler>,
    local_addr: SocketAddr,
}

impl UdpServer {
    /// Binds a new UDP server to the given address.
    pub async fn bind(addr: SocketAddr, handler: Arc<dyn QueryHandler>) -> Result<Self> {
        let domain = if addr.is_ipv4() {
            Domain::IPV4
        } else {
            Domain::IPV6
        };

        let socket = Socket::new(domain, Type::DGRAM, None)?;
        socket.set_reuse_address(true)?;
        socket.set_nonblocking(true)?;
        socket.bind(&addr.into())?;

        let std_socket: std::net::UdpSocket = socket.into();
        let socket = UdpSocket::from_std(std_socket)?;
        let local_addr = socket.local_addr()?;

        info!(addr = %local_addr, "UDP server listening");

        Ok(Self {
            socket: Arc::new(socket),
            handler,
            local_addr,
        })
    }

    /// Returns the local address.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Runs the UDP server.
    pub async fn run(&self) -> Result<()> {
        let mut buf = vec![0u8; 65535];

        loop {
            match self.socket.recv_from(&mut buf).await {
                Ok((len, src)) => {
                    let data = Bytes::copy_from_slice(&buf[..len]);
                    let socket = self.socket.clone();
                    let handler = self.handler.clone();

                    tokio::spawn(async move {
                        process_query(socket, handler, data, src).await;
                    });
                }
                Err(e) => {
                    error!(error = %e, "Error receiving UDP packet");
                }
            }
        }
    }
}

/// Sends each response as one datagram, truncated to the client's limit.
struct UdpResponder {
    socket: Arc<UdpSocket>,
    peer: SocketAddr,
    max_size: usize,
}

#[async_trait]
impl Respond for UdpResponder {
    async fn respond(&mut self, response: Message, _keep_open: bool) -> Result<()> {
        let wire = response.truncated(self.max_size)?;
        self.socket.send_to(&wire, self.peer).await?;
        Ok(())
    }
}

/// Largest response the client accepts over UDP.
fn max_response_size(query: &Message) -> usize {
    query
        .edns()
        .map_or(MAX_UDP_MESSAGE_SIZE, |edns| usize::from(edns.udp_size))
        .max(MAX_UDP_MESSAGE_SIZE)
}

async fn process_query(
    socket: Arc<UdpSocket>,
    handler: Arc<dyn QueryHandler>,
    data: Bytes,
    src: SocketAddr,
) {
    let query = match Message::parse(&data) {
        Ok(msg) => msg,
        Err(e) => {
            trace!(error = %e, client = %src, "Dropping malformed UDP query");
            return;
        }
    };
    if query.header.is_response() {
        trace!(client = %src, "Dropping UDP response packet");
        return;
    }

    let mut responder = UdpResponder {
        socket,
        peer: src,
        max_size: max_response_size(&query),
    };
    let ctx = QueryContext::new(src, Protocol::Udp);
    handler.handle(query, &mut responder, ctx).await;
    debug!(client = %src, "UDP query handled");
}
