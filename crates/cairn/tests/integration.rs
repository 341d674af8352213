//! Full-stack integration tests for the cairn server.
//!
//! These tests load zones from YAML the way the binary does, serve them on
//! real sockets and check:
//! - UDP and TCP answers, NXDOMAIN with the zone SOA
//! - AXFR streams and refusals
//! - NOTIFY to live and unreachable secondaries

use std::net::{Ipv4Addr, SocketAddr};
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::BytesMut;
use tokio::net::{TcpStream, UdpSocket};
use tokio::time::timeout;

use cairn::{build_store, handler_config, sync_zones, Store};
use cairn_config::Config;
use cairn_proto::{Message, Name, OpCode, Question, RData, RecordClass, RecordType, ResponseCode};
use cairn_server::tcp::{read_message, write_message};
use cairn_server::{
    notify_zone, AuthoritativeHandler, MeteredHandler, Notifier, NotifyError, QueryHandler,
    TcpServer, UdpServer,
};

// ============================================================================
// Test Helpers
// ============================================================================

const ZONES: &str = r#"
store:
  ns_domain: ns1.domain.tld
  ns_admin_email: hostmaster@domain.tld
zones:
  - name: domain.tld
    allow_transfer: ["127.0.0.0/8"]
    records:
      - { name: "@", type: A, address: 192.0.2.1 }
      - { name: www, ttl: 60, type: A, address: 192.0.2.2 }
      - { name: alias, type: CNAME, domain: www.domain.tld. }
      - { name: "@", type: MX, priority: 10, exchange: mail.domain.tld. }
      - { name: "@", type: TXT, data: "v=spf1 -all" }
  - name: locked.tld
    records:
      - { name: www, type: A, address: 192.0.2.9 }
"#;

struct TestServer {
    udp: SocketAddr,
    tcp: SocketAddr,
    store: Arc<Store>,
}

/// Loads `yaml` and serves it on ephemeral localhost ports.
async fn start(yaml: &str) -> TestServer {
    let config = Config::from_yaml(yaml).unwrap();
    config.validate().unwrap();

    let store = Arc::new(build_store(&config).unwrap());
    sync_zones(&store, &config.zones).await.unwrap();

    let handler: Arc<dyn QueryHandler> = Arc::new(MeteredHandler::new(
        AuthoritativeHandler::new(store.clone(), handler_config(&config)),
    ));

    let udp = UdpServer::bind("127.0.0.1:0".parse().unwrap(), handler.clone())
        .await
        .unwrap();
    let tcp = TcpServer::bind("127.0.0.1:0".parse().unwrap(), handler)
        .await
        .unwrap();
    let server = TestServer {
        udp: udp.local_addr(),
        tcp: tcp.local_addr(),
        store,
    };

    tokio::spawn(async move {
        let _ = udp.run().await;
    });
    tokio::spawn(async move {
        let _ = tcp.run().await;
    });

    server
}

fn name(s: &str) -> Name {
    Name::from_str(s).unwrap()
}

fn make_query(id: u16, qname: &str, qtype: RecordType) -> Message {
    Message::query(id, Question::new(name(qname), qtype, RecordClass::IN))
}

/// Sends a UDP DNS query and returns the response.
async fn udp_query(addr: SocketAddr, query: &Message) -> Message {
    let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    socket
        .send_to(&query.to_wire().unwrap(), addr)
        .await
        .unwrap();

    let mut buf = vec![0u8; 65535];
    let (len, _) = timeout(Duration::from_secs(5), socket.recv_from(&mut buf))
        .await
        .unwrap()
        .unwrap();
    Message::parse(&buf[..len]).unwrap()
}

/// Reads one framed message, or `None` if nothing arrives in time.
async fn tcp_read(stream: &mut TcpStream, buf: &mut BytesMut) -> Option<Message> {
    match timeout(Duration::from_millis(500), read_message(stream, buf)).await {
        Ok(Ok(wire)) => Some(Message::parse(&wire).unwrap()),
        _ => None,
    }
}

/// Sends an AXFR query and collects messages until the closing SOA.
async fn axfr(addr: SocketAddr, zone: &str) -> Vec<Message> {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    let query = make_query(7, zone, RecordType::AXFR);
    write_message(&mut stream, &query.to_wire().unwrap())
        .await
        .unwrap();

    let mut buf = BytesMut::new();
    let mut messages = Vec::new();
    while let Some(message) = tcp_read(&mut stream, &mut buf).await {
        let done = !messages.is_empty()
            && message
                .answers
                .first()
                .is_some_and(|rr| rr.is_type(RecordType::SOA));
        messages.push(message);
        if done {
            break;
        }
    }
    messages
}

// ============================================================================
// Queries
// ============================================================================

#[tokio::test]
async fn test_udp_answer() {
    let server = start(ZONES).await;

    let response = udp_query(server.udp, &make_query(1, "www.domain.tld", RecordType::A)).await;
    assert_eq!(response.id(), 1);
    assert_eq!(response.rcode(), ResponseCode::NoError);
    assert!(response.header.is_authoritative());
    assert!(!response.header.flags.contains(cairn_proto::HeaderFlags::RA));
    assert_eq!(response.answers.len(), 1);

    let answer = &response.answers[0];
    assert_eq!(answer.ttl, 60);
    match &answer.rdata {
        RData::A(a) => assert_eq!(a.address(), Ipv4Addr::new(192, 0, 2, 2)),
        other => panic!("expected A record, got {other:?}"),
    }

    // Apex record without an explicit TTL gets the zone default.
    let response = udp_query(server.udp, &make_query(2, "domain.tld", RecordType::A)).await;
    assert_eq!(response.answers.len(), 1);
    assert_eq!(response.answers[0].ttl, 3600);
}

#[tokio::test]
async fn test_udp_nxdomain_carries_soa() {
    let server = start(ZONES).await;

    let response =
        udp_query(server.udp, &make_query(3, "www.domain.tld", RecordType::AAAA)).await;
    assert_eq!(response.rcode(), ResponseCode::NXDomain);
    assert!(response.header.is_authoritative());
    assert!(response.answers.is_empty());
    assert_eq!(response.authorities.len(), 1);
    assert!(response.authorities[0].is_type(RecordType::SOA));
    assert_eq!(response.authorities[0].name, name("domain.tld"));
}

#[tokio::test]
async fn test_unknown_zone_is_nxdomain_without_soa() {
    let server = start(ZONES).await;

    let response = udp_query(server.udp, &make_query(4, "www.other.tld", RecordType::A)).await;
    assert_eq!(response.rcode(), ResponseCode::NXDomain);
    assert!(response.authorities.is_empty());
}

#[tokio::test]
async fn test_tcp_queries_share_connection() {
    let server = start(ZONES).await;
    let mut stream = TcpStream::connect(server.tcp).await.unwrap();
    let mut buf = BytesMut::new();

    for (id, qname, qtype) in [
        (10, "alias.domain.tld", RecordType::CNAME),
        (11, "domain.tld", RecordType::MX),
        (12, "domain.tld", RecordType::TXT),
    ] {
        let query = make_query(id, qname, qtype);
        write_message(&mut stream, &query.to_wire().unwrap())
            .await
            .unwrap();

        let response = tcp_read(&mut stream, &mut buf).await.unwrap();
        assert_eq!(response.id(), id);
        assert_eq!(response.rcode(), ResponseCode::NoError);
        assert_eq!(response.answers.len(), 1);
        assert!(response.answers[0].is_type(qtype));
    }
}

// ============================================================================
// Zone Transfer
// ============================================================================

#[tokio::test]
async fn test_axfr_over_tcp() {
    let server = start(ZONES).await;
    let zone = server
        .store
        .zone_snapshot(&name("domain.tld"))
        .await
        .unwrap()
        .unwrap();

    let messages = axfr(server.tcp, "domain.tld").await;

    // Every record once, plus the closing SOA.
    assert_eq!(messages.len(), zone.record_count() + 1);
    assert!(messages[0].answers[0].is_type(RecordType::SOA));
    assert!(messages.last().unwrap().answers[0].is_type(RecordType::SOA));
    for message in &messages {
        assert_eq!(message.id(), 7);
        assert_eq!(message.rcode(), ResponseCode::NoError);
        assert!(message.header.is_authoritative());
        assert_eq!(message.answers.len(), 1);
    }

    let soas = messages
        .iter()
        .filter(|m| m.answers[0].is_type(RecordType::SOA))
        .count();
    assert_eq!(soas, 2);
}

#[tokio::test]
async fn test_axfr_refused_without_allow_list() {
    let server = start(ZONES).await;

    let messages = axfr(server.tcp, "locked.tld").await;
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].rcode(), ResponseCode::Refused);
    assert!(messages[0].answers.is_empty());
}

#[tokio::test]
async fn test_axfr_dropped_when_configured() {
    let yaml = format!("handler:\n  axfr_refusal: drop\n{ZONES}");
    let server = start(&yaml).await;

    let messages = axfr(server.tcp, "locked.tld").await;
    assert!(messages.is_empty());
}

// ============================================================================
// NOTIFY
// ============================================================================

/// A secondary that acknowledges one NOTIFY.
async fn secondary() -> SocketAddr {
    let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let addr = socket.local_addr().unwrap();
    tokio::spawn(async move {
        let mut buf = vec![0u8; 512];
        let (len, peer) = socket.recv_from(&mut buf).await.unwrap();
        let query = Message::parse(&buf[..len]).unwrap();
        assert_eq!(query.header.opcode, OpCode::Notify);

        let reply = Message::response_from_request(&query);
        socket
            .send_to(&reply.to_wire().unwrap(), peer)
            .await
            .unwrap();
    });
    addr
}

/// An address nothing listens on.
async fn unreachable() -> SocketAddr {
    let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    socket.local_addr().unwrap()
}

#[tokio::test]
async fn test_notify_from_config() {
    let live = secondary().await;
    let dead = unreachable().await;
    let yaml = format!(
        "{ZONES}  - name: notified.tld\n    notify: [\"{live}\", \"{dead}\"]\n"
    );
    let server = start(&yaml).await;

    let notifier = Notifier::new(Duration::from_millis(300));
    let started = Instant::now();
    let report = notify_zone(&notifier, &server.store, &name("notified.tld")).await;

    assert!(started.elapsed() < Duration::from_secs(2));
    assert_eq!(report.results.len(), 2);
    assert_eq!(report.acknowledged(), 1);
    assert_eq!(report.failed(), 1);

    assert_eq!(report.results[0].0, live);
    assert!(matches!(report.results[0].1, Ok(ResponseCode::NoError)));
    assert_eq!(report.results[1].0, dead);
    assert!(matches!(
        report.results[1].1,
        Err(NotifyError::Timeout(_) | NotifyError::Io(_))
    ));
}

#[tokio::test]
async fn test_notify_without_secondaries() {
    let server = start(ZONES).await;
    let report = notify_zone(&Notifier::default(), &server.store, &name("domain.tld")).await;
    assert!(report.results.is_empty());
    assert_eq!(report.failed(), 0);
}
