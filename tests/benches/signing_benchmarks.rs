//! # Signed Request Benchmarks
//!
//! | Stage | Path |
//! |-------|------|
//! | Digest | keccak256 over 1 KiB .. 1 MiB bodies |
//! | Sign | client side, per request |
//! | Verify | server side, per request |
//! | Middleware | header parse + body read + verify + dispatch |

use axum::body::Body;
use axum::http::Request;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use settle_auth::{signing_digest, AuthenticatedHandler, SignatureHeaders};
use settle_crypto::{keccak256, sign, verify, PrivateKey};
use settle_tests::fixtures::{pay_out_request, provider_rpc, PAY_OUT};
use std::time::Duration;
use tower::ServiceExt;

fn bench_digest(c: &mut Criterion) {
    let mut group = c.benchmark_group("digest");

    for size in [1024usize, 64 * 1024, 1024 * 1024] {
        let body = vec![0xABu8; size];
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::new("keccak256", size), &body, |b, body| {
            b.iter(|| black_box(keccak256(body)))
        });
    }

    group.finish();
}

fn bench_sign_verify(c: &mut Criterion) {
    let mut group = c.benchmark_group("ecdsa");
    group.measurement_time(Duration::from_secs(10));

    let key = PrivateKey::random();
    let public_key = key.public_key();
    let digest = signing_digest(Some(1_700_000_000_000), b"{\"amount\":\"100\"}");
    let signed = sign(&key, &digest).unwrap();

    group.bench_function("sign", |b| b.iter(|| black_box(sign(&key, &digest).unwrap())));
    group.bench_function("verify", |b| {
        b.iter(|| black_box(verify(&public_key, &digest, signed.signature.as_bytes())))
    });

    group.finish();
}

fn bench_middleware(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let network = PrivateKey::random();
    let router = AuthenticatedHandler::builder()
        .expected_public_key(network.public_key().to_hex())
        .build(provider_rpc())
        .unwrap();

    let body = serde_json::to_vec(&pay_out_request("pay-1", "100")).unwrap();

    c.bench_function("middleware/verified_call", |b| {
        b.iter(|| {
            let timestamp = now_millis();
            let signed = sign(&network, &signing_digest(Some(timestamp), &body)).unwrap();
            let mut req = Request::builder()
                .method("POST")
                .uri(PAY_OUT)
                .body(Body::from(body.clone()))
                .unwrap();
            SignatureHeaders::from_signed(&signed, Some(timestamp))
                .write(req.headers_mut())
                .unwrap();

            let response = rt.block_on(router.clone().oneshot(req)).unwrap();
            assert!(response.status().is_success());
        })
    });
}

fn now_millis() -> i64 {
    use settle_auth::Clock;
    settle_auth::SystemClock.now_millis()
}

criterion_group!(benches, bench_digest, bench_sign_verify, bench_middleware);
criterion_main!(benches);
