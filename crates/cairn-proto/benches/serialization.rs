//! DNS message serialization benchmarks.

use cairn_proto::rdata::{RData, A, TXT};
use cairn_proto::{Edns, Message, Name, Question, RecordClass, RecordType, ResourceRecord};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::net::Ipv4Addr;
use std::str::FromStr;

fn response(answers: u8) -> Message {
    let owner = Name::from_str("www.example.com").unwrap();
    let question = Question::new(owner.clone(), RecordType::A, RecordClass::IN);
    let mut msg = Message::response_from_request(&Message::query(1, question));
    for i in 0..answers {
        msg.answers.push(ResourceRecord::new(
            owner.clone(),
            300,
            RData::A(A::new(Ipv4Addr::new(10, 0, 0, i))),
        ));
    }
    msg.set_edns(Some(&Edns::new(1232)));
    msg
}

fn serialization_benchmarks(c: &mut Criterion) {
    let small = response(1);
    c.bench_function("serialize/one_answer", |b| {
        b.iter(|| black_box(&small).to_wire().unwrap());
    });

    let large = response(200);
    c.bench_function("serialize/truncate_to_512", |b| {
        b.iter(|| black_box(&large).truncated(512).unwrap());
    });

    let mut txt = response(0);
    txt.answers.push(ResourceRecord::new(
        Name::from_str("example.com").unwrap(),
        300,
        RData::TXT(TXT::new("v".repeat(2000))),
    ));
    c.bench_function("serialize/long_txt", |b| {
        b.iter(|| black_box(&txt).to_wire().unwrap());
    });
}

criterion_group!(benches, serialization_benchmarks);
criterion_main!(benches);
