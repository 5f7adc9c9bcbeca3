// Copyright (c) 2020 Ivaylo Petrov
//
// Licensed under the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.
//
// author: Ivaylo Petrov <ivajloip@gmail.com>

use criterion::{criterion_group, criterion_main, Criterion};
use std::alloc::System;
use std::sync::atomic::{AtomicU64, Ordering};

use lorawan_codec::default_crypto::DefaultFactory;
use lorawan_codec::keys::*;
use lorawan_codec::maccommands::*;
use lorawan_codec::parser::*;
use lorawan_codec::securityhelpers::*;

#[global_allocator]
static GLOBAL: trallocator::Trallocator = trallocator::Trallocator::new(System);

fn report(name: &str, cnt: &AtomicU64) {
    let n = cnt.load(Ordering::SeqCst).max(1);
    println!("{}: approximate memory usage per iteration: {} from {}", name, GLOBAL.get_sum() / n, n);
}

fn bench_data_payload_decode(c: &mut Criterion) {
    let cnt = AtomicU64::new(0);
    GLOBAL.reset();
    c.bench_function("data_payload_decode", |b| {
        b.iter(|| {
            cnt.fetch_add(1u64, Ordering::SeqCst);
            let data = data_payload();
            let phy = decode(&data).unwrap();

            if let Payload::Data(mac) = &phy.payload {
                assert_eq!(phy.mhdr.mtype, MType::UnconfirmedDataUp);
                assert_eq!(mac.fhdr.f_cnt, 1u16);
                assert_eq!(mac.fopts_commands::<UplinkMacCommand>().count(), 0);
                assert!(mac.fhdr.f_ctrl.adr, "ADR");
            } else {
                panic!("failed to decode data frame");
            }
        })
    });
    report("data_payload_decode", &cnt);
}

fn bench_data_payload_encode(c: &mut Criterion) {
    let cnt = AtomicU64::new(0);
    let phy = decode(&data_payload()).unwrap();
    GLOBAL.reset();
    c.bench_function("data_payload_encode", |b| {
        b.iter(|| {
            cnt.fetch_add(1u64, Ordering::SeqCst);
            let mut buf = [0u8; 32];
            let len = phy.encode_to_slice(&mut buf).unwrap();
            assert_eq!(&buf[..len], &data_payload()[..]);
        })
    });
    report("data_payload_encode", &cnt);
}

fn bench_data_payload_mic(c: &mut Criterion) {
    let key = AES128([2; 16]);
    let cnt = AtomicU64::new(0);
    GLOBAL.reset();
    c.bench_function("data_payload_mic", |b| {
        b.iter(|| {
            cnt.fetch_add(1u64, Ordering::SeqCst);
            let data = data_payload();
            let (msg, mic) = data.split_at(data.len() - 4);
            let params = UplinkMicParams { f_cnt: 1, ..Default::default() };
            let input = assemble_uplink_mic_input(msg, &params).unwrap();
            assert_eq!(input.compute(&DefaultFactory, &key, &key).0, mic);
        })
    });
    report("data_payload_mic", &cnt);
}

fn bench_mac_commands(c: &mut Criterion) {
    let cnt = AtomicU64::new(0);
    GLOBAL.reset();
    c.bench_function("mac_commands_parse", |b| {
        b.iter(|| {
            cnt.fetch_add(1u64, Ordering::SeqCst);
            let data = [0x03, 0x52, 0x04, 0x02, 0x11, 0x0d, 0xff, 0xff, 0xff, 0x42, 0x42, 0x06];
            assert_eq!(parse_downlink_mac_commands(&data).filter(Result::is_ok).count(), 3);
        })
    });
    report("mac_commands_parse", &cnt);
}

criterion_group!(
    benches,
    bench_data_payload_decode,
    bench_data_payload_encode,
    bench_data_payload_mic,
    bench_mac_commands
);
criterion_main!(benches);

fn data_payload() -> [u8; 18] {
    [
        0x40, 0x04, 0x03, 0x02, 0x01, 0x80, 0x01, 0x00, 0x01, 0xa6, 0x94, 0x64, 0x26, 0x15, 0xd6,
        0xc3, 0xb5, 0x82,
    ]
}
