//! Criterion benchmarks for the relay JSON codec.
//!
//! Every scan is decoded once and encoded once per broadcast, so both paths
//! sit on the hot loop of the hub.
//!
//! Run with:
//! ```bash
//! cargo bench --package rfid-relay-core --bench codec_bench
//! ```

use chrono::Utc;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rfid_relay_core::{decode_inbound, encode_outbound, OutboundMessage, ScanEvent};

// ── Frame fixtures ────────────────────────────────────────────────────────────

const SCAN: &str = r#"{"type":"rfid_scan","cardId":"04A2B3C4D5E6F7","deviceId":"esp32-001"}"#;
const SCAN_WITH_READER: &str =
    r#"{"type":"rfid_scan","cardId":"04A2B3C4D5E6F7","deviceId":"esp32-003","readerId":"R7"}"#;
const CONNECT: &str = r#"{"type":"device_connect","deviceId":"web-1","deviceType":"react_client"}"#;
const UNKNOWN: &str = r#"{"type":"heartbeat","uptime":123456}"#;
const GARBAGE: &str = r#"{"type":"rfid_scan","cardId":"#;

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_inbound");
    for (name, frame) in [
        ("rfid_scan", SCAN),
        ("rfid_scan_reader", SCAN_WITH_READER),
        ("device_connect", CONNECT),
        ("unrecognized", UNKNOWN),
        ("malformed", GARBAGE),
    ] {
        group.bench_with_input(BenchmarkId::from_parameter(name), frame, |b, frame| {
            b.iter(|| {
                let _ = decode_inbound(black_box(frame));
            })
        });
    }
    group.finish();
}

fn bench_encode(c: &mut Criterion) {
    let event = ScanEvent::received("04A2B3C4D5E6F7", "esp32-003", Some("R7".into()), Utc::now());
    let scan = OutboundMessage::scan(&event);
    let catch_up = OutboundMessage::catch_up(&event, "web-1", Utc::now());

    let mut group = c.benchmark_group("encode_outbound");
    group.bench_function("rfid_scan", |b| {
        b.iter(|| encode_outbound(black_box(&scan)))
    });
    group.bench_function("last_rfid_scan", |b| {
        b.iter(|| encode_outbound(black_box(&catch_up)))
    });
    group.finish();
}

criterion_group!(benches, bench_decode, bench_encode);
criterion_main!(benches);
