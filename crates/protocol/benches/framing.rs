//! Benchmarks for report framing
//!
//! Measures encoding performance for the three message kinds:
//! - Handshake (header only)
//! - Configuration push (header + JSON)
//! - Telemetry push (header + JSON), the hot path hit once per tick
//! - Raw frame encoding across payload sizes

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use protocol::{
    Command, ConfigDocument, HostSpec, Message, ScreenProfile, ScreenSettings, TelemetrySnapshot,
    WaterBlockScreen, encode_frame,
};

fn sample_config() -> ConfigDocument {
    ConfigDocument {
        temperature: "Celsius".to_string(),
        water_block_screen: WaterBlockScreen {
            enable: true,
            display_in_sleep: true,
            brightness: 100,
            id: ScreenProfile {
                id: "Customization".to_string(),
                screen_mode: "Full Screen".to_string(),
                play_mode: "Single".to_string(),
                media: ScreenProfile::default_media(),
                settings: ScreenSettings::default(),
                sysinfo_display: vec!["CPU_USAGE".to_string(), "GPU_USAGE".to_string()],
                timezone: "Europe/Amsterdam".to_string(),
            },
        },
        spec: HostSpec::new("AMD Ryzen 7 7800X3D", Some("NVIDIA GeForce RTX 4080".to_string())),
    }
}

fn benchmark_messages(c: &mut Criterion) {
    let mut group = c.benchmark_group("messages");

    group.bench_function("handshake_payload", |b| {
        b.iter(|| Message::Handshake.payload(black_box(1), black_box(1_700_000_000_000)))
    });

    let config = Message::Config(sample_config());
    group.bench_function("config_payload", |b| {
        b.iter(|| config.payload(black_box(1), black_box(1_700_000_000_000)))
    });

    let telemetry = Message::Telemetry(TelemetrySnapshot::default());
    group.bench_function("telemetry_frame", |b| {
        b.iter(|| {
            let payload = telemetry
                .payload(black_box(2), black_box(1_700_000_000_000))
                .unwrap();
            encode_frame(Command::TELEMETRY, &payload).unwrap()
        })
    });

    group.finish();
}

fn benchmark_payload_sizes(c: &mut Criterion) {
    let mut group = c.benchmark_group("frame_payload_sizes");

    for size in [0usize, 64, 512, 1019].iter() {
        let payload = vec![0xABu8; *size];
        group.throughput(Throughput::Bytes(*size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| encode_frame(Command::TELEMETRY, black_box(&payload)))
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_messages, benchmark_payload_sizes);
criterion_main!(benches);
