//! DNS message parsing benchmarks.

use cairn_proto::name::read_name;
use cairn_proto::rdata::{RData, A, MX, SOA};
use cairn_proto::wire::WireReader;
use cairn_proto::{Message, Name, Question, RecordClass, RecordType, ResourceRecord};
use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use std::net::Ipv4Addr;
use std::str::FromStr;

fn name(s: &str) -> Name {
    Name::from_str(s).unwrap()
}

fn response_wire() -> Vec<u8> {
    let question = Question::new(name("www.example.com"), RecordType::A, RecordClass::IN);
    let mut msg = Message::response_from_request(&Message::query(0xBEEF, question));
    for i in 1..=8 {
        msg.answers.push(ResourceRecord::new(
            name("www.example.com"),
            3600,
            RData::A(A::new(Ipv4Addr::new(192, 0, 2, i))),
        ));
    }
    msg.answers.push(ResourceRecord::new(
        name("example.com"),
        3600,
        RData::MX(MX::new(10, name("mail.example.com"))),
    ));
    msg.authorities.push(ResourceRecord::new(
        name("example.com"),
        3600,
        RData::SOA(SOA {
            primary: name("ns1.example.com"),
            admin: name("hostmaster.example.com"),
            serial: 2_024_010_100,
            refresh: 3600,
            retry: 1800,
            expiration: 604_800,
            minimum: 3600,
        }),
    ));
    msg.to_wire().unwrap().to_vec()
}

fn parsing_benchmarks(c: &mut Criterion) {
    let wire = response_wire();
    let mut group = c.benchmark_group("parse");
    group.throughput(Throughput::Bytes(wire.len() as u64));
    group.bench_function("message", |b| {
        b.iter(|| Message::parse(black_box(&wire)).unwrap());
    });
    group.finish();

    // "www.example.com" followed by a pointer back to it.
    let mut names = b"\x03www\x07example\x03com\x00".to_vec();
    names.extend_from_slice(&[0x04, b'm', b'a', b'i', b'l', 0xC0, 0x04]);
    c.bench_function("parse/name_uncompressed", |b| {
        b.iter(|| read_name(&mut WireReader::new(black_box(&names))).unwrap());
    });
    c.bench_function("parse/name_compressed", |b| {
        b.iter(|| read_name(&mut WireReader::at(black_box(&names), 17)).unwrap());
    });
}

criterion_group!(benches, parsing_benchmarks);
criterion_main!(benches);
