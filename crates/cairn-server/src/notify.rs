//! Zone change notification (NOTIFY, RFC 1996).
//!
//! After a zone changes, each configured secondary gets a NOTIFY for the
//! zone SOA over UDP. Every target is bounded by its own timeout and runs
//! concurrently; a slow or dead secondary never holds up the rest.

use cairn_proto::{
    HeaderFlags, Message, Name, OpCode, Question, RecordClass, RecordType, ResponseCode,
};
use cairn_zone::{ZoneBackend, ZoneStore};
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;
use thiserror::Error;
use tokio::net::UdpSocket;
use tokio::task::JoinSet;
use tracing::{debug, error, info, instrument, warn};

/// Default time to wait for each secondary.
pub const DEFAULT_NOTIFY_TIMEOUT: Duration = Duration::from_secs(5);

/// Why a NOTIFY exchange failed.
#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("no reply within {0:?}")]
    Timeout(Duration),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed reply: {0}")]
    Malformed(#[from] cairn_proto::Error),

    #[error("reply id {actual:#06x} does not match query id {expected:#06x}")]
    IdMismatch { expected: u16, actual: u16 },
}

impl NotifyError {
    /// Short label for logs and metrics.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Timeout(_) => "timeout",
            Self::Io(_) => "io",
            Self::Malformed(_) => "malformed",
            Self::IdMismatch { .. } => "id_mismatch",
        }
    }
}

/// Per-target outcome of a NOTIFY round.
#[derive(Debug)]
pub struct NotifyReport {
    /// The zone that was announced.
    pub zone: Name,
    /// One entry per target, in the order the targets were given.
    pub results: Vec<(SocketAddr, Result<ResponseCode, NotifyError>)>,
}

impl NotifyReport {
    /// Targets that answered NOERROR.
    pub fn acknowledged(&self) -> usize {
        self.results
            .iter()
            .filter(|(_, r)| matches!(r, Ok(ResponseCode::NoError)))
            .count()
    }

    /// Targets that did not answer NOERROR.
    pub fn failed(&self) -> usize {
        self.results.len() - self.acknowledged()
    }
}

/// Sends NOTIFY messages to secondaries.
#[derive(Debug, Clone)]
pub struct Notifier {
    timeout: Duration,
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new(DEFAULT_NOTIFY_TIMEOUT)
    }
}

impl Notifier {
    /// Creates a notifier with a per-target timeout.
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Returns the per-target timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Builds the NOTIFY query for `zone`.
    pub fn notify_message(zone: &Name, id: u16) -> Message {
        let mut message = Message::query(
            id,
            Question::new(zone.clone(), RecordType::SOA, RecordClass::IN),
        );
        message.header.opcode = OpCode::Notify;
        message.header.set_flag(HeaderFlags::AA, true);
        message
    }

    /// Notifies every target about `zone`.
    #[instrument(skip(self, targets), fields(zone = %zone, targets = targets.len()))]
    pub async fn send_notify(&self, zone: &Name, targets: &[SocketAddr]) -> NotifyReport {
        let mut tasks = JoinSet::new();
        for (index, &target) in targets.iter().enumerate() {
            let zone = zone.clone();
            let timeout = self.timeout;
            tasks.spawn(async move { (index, target, exchange(&zone, target, timeout).await) });
        }

        let mut results = Vec::with_capacity(targets.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(entry) => results.push(entry),
                Err(e) => error!(error = %e, "NOTIFY task failed"),
            }
        }
        results.sort_by_key(|(index, _, _)| *index);

        let results: Vec<_> = results
            .into_iter()
            .map(|(_, target, result)| {
                let outcome = match &result {
                    Ok(ResponseCode::NoError) => {
                        debug!(%target, "NOTIFY acknowledged");
                        "ok"
                    }
                    Ok(rcode) => {
                        warn!(%target, %rcode, "NOTIFY rejected");
                        "rejected"
                    }
                    Err(e) => {
                        warn!(%target, error = %e, "NOTIFY failed");
                        e.kind()
                    }
                };
                cairn_metrics::metrics().record_notify(outcome);
                (target, result)
            })
            .collect();

        let report = NotifyReport {
            zone: zone.clone(),
            results,
        };
        info!(
            acknowledged = report.acknowledged(),
            failed = report.failed(),
            "NOTIFY round finished"
        );
        report
    }
}

/// Runs one NOTIFY exchange with `target`.
async fn exchange(
    zone: &Name,
    target: SocketAddr,
    timeout: Duration,
) -> Result<ResponseCode, NotifyError> {
    let id = rand::random::<u16>();
    let wire = Notifier::notify_message(zone, id).to_wire()?;

    let exchange = async {
        let local: SocketAddr = if target.is_ipv4() {
            (Ipv4Addr::UNSPECIFIED, 0).into()
        } else {
            (Ipv6Addr::UNSPECIFIED, 0).into()
        };
        let socket = UdpSocket::bind(local).await?;
        socket.connect(target).await?;
        socket.send(&wire).await?;

        let mut buf = vec![0u8; 4096];
        let len = socket.recv(&mut buf).await?;
        Ok::<_, NotifyError>(Message::parse(&buf[..len])?)
    };

    let reply = tokio::time::timeout(timeout, exchange)
        .await
        .map_err(|_| NotifyError::Timeout(timeout))??;

    if reply.id() != id {
        return Err(NotifyError::IdMismatch {
            expected: id,
            actual: reply.id(),
        });
    }
    Ok(reply.rcode())
}

/// Notifies the registered secondaries of `zone`.
pub async fn notify_zone<B: ZoneBackend>(
    notifier: &Notifier,
    store: &ZoneStore<B>,
    zone: &Name,
) -> NotifyReport {
    let targets = store.secondaries(zone).notify_targets();
    notifier.send_notify(zone, &targets).await
}
