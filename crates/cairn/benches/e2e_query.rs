//! End-to-end query benchmarks through the authoritative handler.

use cairn::{build_store, handler_config, sync_zones};
use cairn_config::Config;
use cairn_proto::{Message, Name, Question, RecordClass, RecordType};
use cairn_server::{AuthoritativeHandler, BufferedResponder, Protocol, QueryContext, QueryHandler};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::str::FromStr;
use std::sync::Arc;

const CONFIG: &str = r#"
zones:
  - name: bench.test
    records:
      - { name: www, type: A, address: 192.0.2.1 }
      - { name: www, type: AAAA, address: "2001:db8::1" }
      - { name: mail, type: MX, priority: 10, exchange: mx.bench.test. }
"#;

fn e2e_benchmarks(c: &mut Criterion) {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();

    let config = Config::from_yaml(CONFIG).unwrap();
    let store = Arc::new(build_store(&config).unwrap());
    rt.block_on(sync_zones(&store, &config.zones)).unwrap();
    let handler = AuthoritativeHandler::new(store, handler_config(&config));
    let ctx = QueryContext::new("127.0.0.1:5353".parse().unwrap(), Protocol::Udp);

    let mut group = c.benchmark_group("handler");
    for (label, qname, qtype) in [
        ("answer", "www.bench.test", RecordType::A),
        ("nxdomain", "missing.bench.test", RecordType::A),
        ("no_zone", "www.elsewhere.test", RecordType::A),
    ] {
        let query = Message::query(
            1,
            Question::new(Name::from_str(qname).unwrap(), qtype, RecordClass::IN),
        );
        group.bench_function(label, |b| {
            b.iter(|| {
                let mut responder = BufferedResponder::new();
                rt.block_on(handler.handle(black_box(query.clone()), &mut responder, ctx.clone()));
                black_box(responder)
            })
        });
    }
    group.finish();
}

criterion_group!(benches, e2e_benchmarks);
criterion_main!(benches);
