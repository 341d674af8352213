//! Query handler interface.
//!
//! Transports parse a query, hand it to a [`QueryHandler`] together with a
//! [`Respond`] sink, and write out whatever the handler sends. Most queries
//! produce exactly one response; AXFR produces a stream of them.

use async_trait::async_trait;
use cairn_metrics::QueryTimer;
use cairn_proto::{Message, ResponseCode};
use std::net::SocketAddr;
use std::time::Instant;
use tracing::debug;

use super::{Protocol, Result};

/// Context for a DNS query.
#[derive(Debug, Clone)]
pub struct QueryContext {
    /// Client address.
    pub peer: SocketAddr,

    /// Transport the query arrived on.
    pub protocol: Protocol,

    /// When the query was received.
    pub received_at: Instant,
}

impl QueryContext {
    /// Creates a new query context.
    pub fn new(peer: SocketAddr, protocol: Protocol) -> Self {
        Self {
            peer,
            protocol,
            received_at: Instant::now(),
        }
    }

    /// Returns the elapsed time since the query was received.
    pub fn elapsed(&self) -> std::time::Duration {
        self.received_at.elapsed()
    }
}

/// Sink for the responses to one query.
#[async_trait]
pub trait Respond: Send {
    /// Sends one response.
    ///
    /// `keep_open == false` marks the last message for the query. An error
    /// means the client can no longer be reached; callers stop sending.
    async fn respond(&mut self, response: Message, keep_open: bool) -> Result<()>;
}

/// Query handler trait.
///
/// Implementations call [`Respond::respond`] zero or more times. Not
/// calling it at all drops the query.
#[async_trait]
pub trait QueryHandler: Send + Sync {
    /// Handles a DNS query.
    async fn handle(&self, query: Message, respond: &mut dyn Respond, ctx: QueryContext);
}

/// A handler that returns REFUSED for every query.
pub struct RefusedHandler;

#[async_trait]
impl QueryHandler for RefusedHandler {
    async fn handle(&self, query: Message, respond: &mut dyn Respond, ctx: QueryContext) {
        let mut response = Message::response_from_request(&query);
        response.set_rcode(ResponseCode::Refused);
        if let Err(error) = respond.respond(response, false).await {
            debug!(%error, peer = %ctx.peer, "failed to send response");
        }
    }
}

/// Wraps a handler and records query, response and latency metrics.
pub struct MeteredHandler<H> {
    inner: H,
}

impl<H: QueryHandler> MeteredHandler<H> {
    /// Wraps `inner`.
    pub fn new(inner: H) -> Self {
        Self { inner }
    }

    /// Returns the wrapped handler.
    pub fn inner(&self) -> &H {
        &self.inner
    }
}

struct MeteredRespond<'a> {
    inner: &'a mut dyn Respond,
    protocol: &'static str,
}

#[async_trait]
impl Respond for MeteredRespond<'_> {
    async fn respond(&mut self, response: Message, keep_open: bool) -> Result<()> {
        cairn_metrics::metrics().record_response(self.protocol, response.rcode().name());
        self.inner.respond(response, keep_open).await
    }
}

#[async_trait]
impl<H: QueryHandler> QueryHandler for MeteredHandler<H> {
    async fn handle(&self, query: Message, respond: &mut dyn Respond, ctx: QueryContext) {
        let protocol = ctx.protocol.name();
        let qtype = query
            .question()
            .map_or_else(|| "NONE".to_string(), |q| q.qtype.to_string());
        cairn_metrics::metrics().record_query(protocol, &qtype);

        let timer = QueryTimer::start(protocol);
        let mut metered = MeteredRespond {
            inner: respond,
            protocol,
        };
        self.inner.handle(query, &mut metered, ctx).await;
        timer.finish();
    }
}

/// Collects responses in memory.
#[derive(Debug, Default)]
pub struct BufferedResponder {
    /// Responses in send order, with their `keep_open` flag.
    pub responses: Vec<(Message, bool)>,
}

impl BufferedResponder {
    /// Creates an empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns just the messages.
    pub fn messages(&self) -> Vec<&Message> {
        self.responses.iter().map(|(m, _)| m).collect()
    }
}

#[async_trait]
impl Respond for BufferedResponder {
    async fn respond(&mut self, response: Message, keep_open: bool) -> Result<()> {
        self.responses.push((response, keep_open));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cairn_proto::{Name, Question, RecordClass, RecordType};
    use std::str::FromStr;

    fn query() -> Message {
        Message::query(
            7,
            Question::new(Name::from_str("example.com").unwrap(), RecordType::A, RecordClass::IN),
        )
    }

    #[tokio::test]
    async fn test_refused_handler() {
        let mut sink = BufferedResponder::new();
        let ctx = QueryContext::new("127.0.0.1:5353".parse().unwrap(), Protocol::Udp);
        RefusedHandler.handle(query(), &mut sink, ctx).await;

        assert_eq!(sink.responses.len(), 1);
        let (response, keep_open) = &sink.responses[0];
        assert!(!keep_open);
        assert_eq!(response.id(), 7);
        assert_eq!(response.rcode(), ResponseCode::Refused);
        assert!(response.header.is_response());
    }

    /// A sink whose client has gone away.
    #[derive(Default)]
    struct ClosedResponder {
        attempts: usize,
    }

    #[async_trait]
    impl Respond for ClosedResponder {
        async fn respond(&mut self, _response: Message, _keep_open: bool) -> Result<()> {
            self.attempts += 1;
            Err(std::io::Error::from(std::io::ErrorKind::BrokenPipe).into())
        }
    }

    #[tokio::test]
    async fn test_refused_handler_survives_send_failure() {
        let mut sink = ClosedResponder::default();
        let ctx = QueryContext::new("127.0.0.1:5353".parse().unwrap(), Protocol::Udp);
        RefusedHandler.handle(query(), &mut sink, ctx).await;
        assert_eq!(sink.attempts, 1);
    }

    #[tokio::test]
    async fn test_metered_handler_passes_through() {
        let handler = MeteredHandler::new(RefusedHandler);
        let mut sink = BufferedResponder::new();
        let ctx = QueryContext::new("127.0.0.1:5353".parse().unwrap(), Protocol::Tcp);
        let before = cairn_metrics::metrics().queries_total();

        handler.handle(query(), &mut sink, ctx).await;

        assert_eq!(sink.responses.len(), 1);
        assert!(cairn_metrics::metrics().queries_total() > before);
    }
}
