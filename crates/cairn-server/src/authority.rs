//! Authoritative request handling.
//!
//! [`AuthoritativeHandler`] answers from a [`RecordSource`]: exact answers
//! with AA set, NXDOMAIN with the zone SOA when nothing matches, and AXFR
//! streams for authorized secondaries. It never recurses, so RA is always
//! clear.

use async_trait::async_trait;
use cairn_proto::{Edns, HeaderFlags, Message, RecordType, ResponseCode, DEFAULT_EDNS_UDP_SIZE};
use cairn_zone::RecordSource;
use std::sync::Arc;
use tracing::{debug, trace, warn};

use crate::axfr::{self, AxfrRefusal};
use crate::handler::{QueryContext, QueryHandler, Respond};
use crate::Result;

/// Handler settings.
#[derive(Debug, Clone)]
pub struct HandlerConfig {
    /// UDP payload size advertised in our OPT record.
    pub edns_udp_size: u16,
    /// Log lookup failures at `warn`.
    pub log_errors: bool,
    /// Reply policy for unauthorized transfers.
    pub axfr_refusal: AxfrRefusal,
}

impl Default for HandlerConfig {
    fn default() -> Self {
        Self {
            edns_udp_size: DEFAULT_EDNS_UDP_SIZE,
            log_errors: true,
            axfr_refusal: AxfrRefusal::Refuse,
        }
    }
}

/// Whether the handler still owes the client a response.
enum Reply {
    Pending,
    Sent,
}

/// Answers queries for the zones of a record source.
pub struct AuthoritativeHandler<S: ?Sized> {
    source: Arc<S>,
    config: HandlerConfig,
}

impl<S: RecordSource + ?Sized> AuthoritativeHandler<S> {
    /// Creates a handler over `source`.
    pub fn new(source: Arc<S>, config: HandlerConfig) -> Self {
        Self { source, config }
    }

    /// Returns the handler settings.
    pub fn config(&self) -> &HandlerConfig {
        &self.config
    }

    /// Fills `response` for `query`. AXFR sends its own messages.
    async fn resolve(
        &self,
        query: &Message,
        response: &mut Message,
        respond: &mut dyn Respond,
        ctx: &QueryContext,
    ) -> Result<Reply> {
        if query.header.opcode.is_unknown() {
            debug!(opcode = %query.header.opcode, "unassigned opcode");
            response.set_rcode(ResponseCode::NotImp);
            return Ok(Reply::Pending);
        }

        let Some(question) = query.question().cloned() else {
            response.set_rcode(ResponseCode::FormErr);
            return Ok(Reply::Pending);
        };
        let qname = question.qname.to_lowercase();

        if !question.qclass.is_internet() {
            trace!(class = %question.qclass, "non-IN query, answering empty");
            response.answers.clear();
            response.authorities.clear();
            response.additionals.clear();
            return Ok(Reply::Pending);
        }

        let is_axfr = question.is_type(RecordType::AXFR);
        if !is_axfr && (question.is_type(RecordType::OPT) || query.edns().is_some()) {
            response.set_edns(Some(&Edns::new(self.config.edns_udp_size)));
        }

        if is_axfr {
            let outcome = axfr::transfer(
                self.source.as_ref(),
                &qname,
                ctx.peer.ip(),
                response,
                self.config.axfr_refusal,
                respond,
            )
            .await?;
            cairn_metrics::metrics().record_transfer(&qname.to_string(), outcome.as_str());
            return Ok(Reply::Sent);
        }

        let lookup = self.source.get_records(&qname, question.qtype).await?;

        if lookup.answers.is_empty() {
            response.set_rcode(ResponseCode::NXDomain);
            let authority = self.source.get_authority(&qname).await?;
            if let Some(mut soa) = authority.into_iter().find(|r| r.is_type(RecordType::SOA)) {
                soa.class = question.qclass;
                response.authorities.push(soa);
                response.header.set_flag(HeaderFlags::AA, true);
            }
        } else {
            response.header.set_flag(HeaderFlags::AA, true);
            response
                .answers
                .extend(lookup.answers.into_iter().map(|mut record| {
                    record.name = question.qname.clone();
                    record.class = question.qclass;
                    record
                }));
        }

        response
            .authorities
            .extend(lookup.authorities.into_iter().map(|mut record| {
                record.class = question.qclass;
                record
            }));
        response
            .additionals
            .extend(lookup.additionals.into_iter().map(|mut record| {
                record.class = question.qclass;
                record
            }));

        Ok(Reply::Pending)
    }
}

#[async_trait]
impl<S: RecordSource + ?Sized + 'static> QueryHandler for AuthoritativeHandler<S> {
    async fn handle(&self, query: Message, respond: &mut dyn Respond, ctx: QueryContext) {
        let mut response = Message::response_from_request(&query);
        response.header.set_flag(HeaderFlags::RA, false);

        match self.resolve(&query, &mut response, respond, &ctx).await {
            Ok(Reply::Sent) => return,
            Ok(Reply::Pending) => {}
            Err(error) => {
                if self.config.log_errors {
                    warn!(%error, peer = %ctx.peer, id = query.id(), "error handling query");
                }
            }
        }

        if let Err(error) = respond.respond(response, false).await {
            debug!(%error, peer = %ctx.peer, "failed to send response");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::BufferedResponder;
    use crate::Protocol;
    use cairn_proto::rdata::A;
    use cairn_proto::{Class, Name, OpCode, Question, RData, RecordClass};
    use cairn_zone::{ZoneSettings, ZoneStore};
    use std::net::Ipv4Addr;
    use std::str::FromStr;

    fn name(s: &str) -> Name {
        Name::from_str(s).unwrap()
    }

    async fn handler() -> AuthoritativeHandler<ZoneStore> {
        let store = ZoneStore::new(
            Default::default(),
            ZoneSettings::new(name("ns.example.com"), name("hostmaster.example.com")),
        );
        let mut zone = store.create_zone(&name("domain.tld")).await.unwrap();
        zone.set_record(
            &name("domain.tld"),
            RData::A(A::new(Ipv4Addr::new(192, 0, 2, 1))),
            None,
        )
        .unwrap();
        store.update_zone(&mut zone).await.unwrap();
        AuthoritativeHandler::new(Arc::new(store), HandlerConfig::default())
    }

    async fn ask(handler: &AuthoritativeHandler<ZoneStore>, query: Message) -> Vec<(Message, bool)> {
        let mut sink = BufferedResponder::new();
        let ctx = QueryContext::new("127.0.0.1:40000".parse().unwrap(), Protocol::Udp);
        handler.handle(query, &mut sink, ctx).await;
        sink.responses
    }

    fn query(qname: &str, qtype: RecordType) -> Message {
        let mut query = Message::query(
            0xBEEF,
            Question::new(name(qname), qtype, RecordClass::IN),
        );
        query.header.set_flag(HeaderFlags::RD, true);
        query
    }

    #[tokio::test]
    async fn test_a_answer() {
        let handler = handler().await;
        let responses = ask(&handler, query("Domain.TLD", RecordType::A)).await;

        assert_eq!(responses.len(), 1);
        let (response, keep_open) = &responses[0];
        assert!(!keep_open);
        assert_eq!(response.rcode(), ResponseCode::NoError);
        assert!(response.header.is_authoritative());
        assert!(!response.header.flags.contains(HeaderFlags::RA));
        assert!(response.header.flags.contains(HeaderFlags::RD));
        assert_eq!(response.answers.len(), 1);

        let answer = &response.answers[0];
        assert_eq!(answer.rdata, RData::A(A::new(Ipv4Addr::new(192, 0, 2, 1))));
        assert_eq!(answer.class, Class::IN);
        assert_eq!(answer.ttl, 3600);
        // Owner is the question name as asked.
        assert_eq!(answer.name.as_wire(), response.questions[0].qname.as_wire());
        assert!(response.edns().is_none());
    }

    #[tokio::test]
    async fn test_missing_type_is_nxdomain_with_soa() {
        let handler = handler().await;
        let responses = ask(&handler, query("domain.tld", RecordType::AAAA)).await;

        let (response, _) = &responses[0];
        assert_eq!(response.rcode(), ResponseCode::NXDomain);
        assert!(response.answers.is_empty());
        assert_eq!(response.authorities.len(), 1);
        assert!(response.authorities[0].is_type(RecordType::SOA));
        assert!(response.header.is_authoritative());
    }

    #[tokio::test]
    async fn test_unknown_zone_is_nxdomain_without_authority() {
        let handler = handler().await;
        let responses = ask(&handler, query("nowhere.example", RecordType::A)).await;

        let (response, _) = &responses[0];
        assert_eq!(response.rcode(), ResponseCode::NXDomain);
        assert!(response.authorities.is_empty());
        assert!(!response.header.is_authoritative());
    }

    #[tokio::test]
    async fn test_edns_echoed_only_when_requested() {
        let handler = handler().await;
        let mut with_edns = query("domain.tld", RecordType::A);
        with_edns.set_edns(Some(&Edns::new(4096)));

        let responses = ask(&handler, with_edns).await;
        let edns = responses[0].0.edns().unwrap();
        assert_eq!(edns.udp_size, DEFAULT_EDNS_UDP_SIZE);
        assert!(edns.options.is_empty());
    }

    #[tokio::test]
    async fn test_no_question_is_formerr() {
        let handler = handler().await;
        let responses = ask(&handler, Message::default()).await;
        assert_eq!(responses.len(), 1);
        assert_eq!(responses[0].0.rcode(), ResponseCode::FormErr);
    }

    #[tokio::test]
    async fn test_unassigned_opcode_is_notimp() {
        let handler = handler().await;
        let mut odd = query("domain.tld", RecordType::A);
        odd.header.opcode = OpCode::Unknown(3);

        let responses = ask(&handler, odd).await;
        assert_eq!(responses.len(), 1);
        let (response, _) = &responses[0];
        assert_eq!(response.rcode(), ResponseCode::NotImp);
        assert_eq!(response.header.opcode, OpCode::Unknown(3));
        assert!(response.answers.is_empty());
    }

    #[tokio::test]
    async fn test_non_internet_class_is_empty() {
        let handler = handler().await;
        let mut chaos = query("domain.tld", RecordType::A);
        chaos.questions[0].qclass = Class::from_u16(3);
        chaos.set_edns(Some(&Edns::new(4096)));

        let responses = ask(&handler, chaos).await;
        let (response, _) = &responses[0];
        assert_eq!(response.rcode(), ResponseCode::NoError);
        assert!(response.answers.is_empty());
        assert!(response.authorities.is_empty());
        assert!(response.additionals.is_empty());
    }

    #[tokio::test]
    async fn test_refused_axfr_is_not_nxdomain() {
        let handler = handler().await;
        let responses = ask(&handler, query("domain.tld", RecordType::AXFR)).await;
        assert_eq!(responses.len(), 1);
        assert_eq!(responses[0].0.rcode(), ResponseCode::Refused);
    }
}
