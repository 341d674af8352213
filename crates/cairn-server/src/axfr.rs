//! Full zone transfer (AXFR, RFC 5936).
//!
//! A transfer is a stream of responses over one connection: the apex SOA,
//! one message per remaining record, then the SOA again. All of them come
//! from a single snapshot of the zone.

use cairn_proto::{HeaderFlags, Message, Name, ResourceRecord, ResponseCode};
use cairn_zone::RecordSource;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;
use tracing::{debug, info, instrument, warn};

use crate::handler::Respond;
use crate::Result;

/// What to do with a transfer request from an unauthorized peer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AxfrRefusal {
    /// Send a single REFUSED response.
    #[default]
    Refuse,
    /// Send nothing.
    Drop,
}

/// How a transfer request ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxfrOutcome {
    /// Every message was sent.
    Completed {
        /// Messages sent, both SOAs included.
        messages: usize,
    },
    /// The peer is not allowed to transfer the zone.
    Refused,
    /// The zone has no SOA; a single NXDOMAIN was sent.
    NoSoa,
    /// The client went away mid-transfer.
    Aborted {
        /// Messages sent before the failure.
        sent: usize,
    },
}

impl AxfrOutcome {
    /// Short label for logs and metrics.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Completed { .. } => "completed",
            Self::Refused => "refused",
            Self::NoSoa => "no_soa",
            Self::Aborted { .. } => "aborted",
        }
    }
}

impl fmt::Display for AxfrOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Builds one transfer message: `base` with `record` as its only answer.
fn transfer_message(base: &Message, record: &ResourceRecord) -> Message {
    let mut message = base.clone();
    message.header.set_flag(HeaderFlags::AA, true);
    message.answers = vec![record.clone()];
    message.authorities.clear();
    message.additionals.clear();
    message
}

/// Runs an AXFR for `zone` on behalf of `peer`.
///
/// `base` is the response skeleton; its question class tags every record.
/// Errors come only from the record source. A failed send is reported as
/// [`AxfrOutcome::Aborted`], not as an error.
#[instrument(skip(source, base, respond), fields(zone = %zone, peer = %peer))]
pub async fn transfer<S>(
    source: &S,
    zone: &Name,
    peer: IpAddr,
    base: &Message,
    refusal: AxfrRefusal,
    respond: &mut dyn Respond,
) -> Result<AxfrOutcome>
where
    S: RecordSource + ?Sized,
{
    if !source.is_transfer_allowed(zone, peer) {
        warn!(policy = ?refusal, "zone transfer refused");
        if refusal == AxfrRefusal::Refuse {
            let mut refused = base.clone();
            refused.set_rcode(ResponseCode::Refused);
            if let Err(error) = respond.respond(refused, false).await {
                debug!(%error, "could not deliver REFUSED");
            }
        }
        return Ok(AxfrOutcome::Refused);
    }

    let class = base.question().map(|q| q.qclass).unwrap_or_default();
    let records: Vec<ResourceRecord> = source
        .get_all_records_for_zone(zone)
        .await?
        .into_iter()
        .map(|mut record| {
            record.class = class;
            record
        })
        .collect();

    let Some(soa) = records
        .iter()
        .find(|r| r.is_type(cairn_proto::RecordType::SOA))
        .cloned()
    else {
        let mut missing = base.clone();
        missing.set_rcode(ResponseCode::NXDomain);
        if let Err(error) = respond.respond(missing, false).await {
            debug!(%error, "could not deliver NXDOMAIN");
        }
        return Ok(AxfrOutcome::NoSoa);
    };

    info!(records = records.len(), "zone transfer started");

    let body = records
        .iter()
        .filter(|r| !r.is_type(cairn_proto::RecordType::SOA));
    let messages = std::iter::once(&soa)
        .chain(body)
        .chain(std::iter::once(&soa));
    let total = records.len() + 1;

    let mut sent = 0;
    for record in messages {
        let keep_open = sent + 1 < total;
        if let Err(error) = respond
            .respond(transfer_message(base, record), keep_open)
            .await
        {
            warn!(%error, sent, "zone transfer aborted");
            return Ok(AxfrOutcome::Aborted { sent });
        }
        sent += 1;
        debug!(rtype = %record.rtype(), owner = %record.name, sent, "transfer message sent");
    }

    info!(messages = sent, "zone transfer finished");
    Ok(AxfrOutcome::Completed { messages: sent })
}
