use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use sms_1nce::{Credentials, OnceClient};
use sms_core::*;
use sms_middleware::config::AppConfig;
use sms_web_generic::{GatewayProcessor, ServiceInfo, SmsParams};
use std::sync::Arc;
use tokio::runtime::Runtime;

fn processor() -> GatewayProcessor {
    // Unroutable origin: only paths that never reach the network are measured.
    let client = Arc::new(OnceClient::with_base_url(
        Credentials::new("bench", "bench"),
        "http://127.0.0.1:1".to_string(),
    ));
    let tokens = client.tokens();
    GatewayProcessor::new(
        client,
        tokens,
        ServiceInfo {
            username: "bench".to_string(),
            password_set: true,
            version: "bench".to_string(),
        },
    )
}

fn benchmark_request_validation(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let processor = processor();

    let message_sizes = vec![0, 160, 1600];
    let mut group = c.benchmark_group("request_validation");

    for size in message_sizes {
        // Empty recipient keeps every iteration on the rejection path.
        let params = SmsParams {
            to: String::new(),
            message: "x".repeat(size),
        };

        group.bench_with_input(BenchmarkId::new("send_sms", size), &size, |b, &_size| {
            b.to_async(&rt)
                .iter(|| async { black_box(processor.send_sms(&params).await) })
        });
    }
    group.finish();
}

fn benchmark_token_freshness(c: &mut Criterion) {
    let now = time::OffsetDateTime::now_utc();
    let token = BearerToken::new("bench-token", now + time::Duration::hours(1));

    c.bench_function("token_is_fresh", |b| {
        b.iter(|| black_box(token.is_fresh(black_box(now), sms_1nce::REFRESH_BUFFER)))
    });
}

fn benchmark_responses(c: &mut Criterion) {
    let processor = processor();
    let mut group = c.benchmark_group("responses");

    group.bench_function("home", |b| b.iter(|| black_box(processor.home())));
    group.bench_function("deployment_test", |b| {
        b.iter(|| black_box(processor.deployment_test()))
    });
    group.bench_function("error_body", |b| {
        b.iter(|| {
            black_box(GatewayResponse::error_with_details(
                HttpStatus::INTERNAL_SERVER_ERROR,
                "1NCE SMS API error: 500",
                "details",
            ))
        })
    });

    group.finish();
}

fn benchmark_configuration_loading(c: &mut Criterion) {
    let mut group = c.benchmark_group("configuration");

    group.bench_function("create_default", |b| {
        b.iter(|| black_box(AppConfig::default()))
    });
    group.bench_function("client_options", |b| {
        let config = AppConfig::default();
        b.iter(|| black_box(config.once.options()))
    });

    group.finish();
}

criterion_group!(
    benches,
    benchmark_request_validation,
    benchmark_token_freshness,
    benchmark_responses,
    benchmark_configuration_loading
);

criterion_main!(benches);
