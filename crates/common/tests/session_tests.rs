//! Integration tests for the device session
//!
//! Drives full handshake → configure → stream sequences against an in-memory
//! transport and checks what actually went over the wire:
//! - Sequence numbers across mixed message kinds
//! - Telemetry schema completeness with and without a GPU
//! - Fatal write failures
//!
//! Run with: `cargo test -p common --test session_tests`

use common::sensors::{CpuReading, GpuReading, MemoryReading};
use common::test_utils::{
    FixedClock, MemoryTransport, StaticCpu, StaticGpu, StaticMemory, frame_body, frame_header,
    sample_config, seq_number,
};
use common::{Error, SensorHub, Session, SessionSettings, SessionState};
use proptest::prelude::*;
use protocol::{MAGIC_BYTE, REPORT_SIZE, checksum, Command};
use serde_json::Value;

fn hub(gpu: bool) -> SensorHub {
    let cpu = CpuReading {
        load: 3.0,
        usage: 17.6,
        clock_mhz: 4950.2,
        core_temp: Some(51.0),
        package_temp: Some(55.4),
    };
    let memory = MemoryReading {
        total_bytes: 64 * 1024 * 1024 * 1024,
        used_bytes: 12 * 1024 * 1024 * 1024,
        load: 18.75,
    };
    let gpu_source = gpu.then(|| {
        Box::new(StaticGpu::new(
            "NVIDIA GeForce RTX 4080",
            GpuReading {
                utilization: 40.0,
                temperature: 60.0,
                fan: 35.0,
                clock_mhz: 2610.0,
                power_mw: 102_400.0,
            },
        )) as Box<dyn common::sensors::GpuSource>
    });
    SensorHub::new(Box::new(StaticCpu(cpu)), Box::new(StaticMemory(memory)), gpu_source)
}

fn streaming_session() -> Session<MemoryTransport, FixedClock> {
    let mut session = Session::new(
        MemoryTransport::new(),
        FixedClock::new(1_700_000_000_000),
        SessionSettings::default(),
    );
    session.connect().unwrap();
    session.configure(sample_config()).unwrap();
    session.start_streaming().unwrap();
    session
}

fn telemetry_json(frame: &[u8]) -> Value {
    serde_json::from_slice(frame_body(frame).expect("telemetry body")).unwrap()
}

mod sequencing {
    use super::*;

    #[test]
    fn test_sequence_spans_all_message_kinds() {
        let mut session = streaming_session();
        let mut sensors = hub(false);
        for _ in 0..5 {
            session.tick(&mut sensors).unwrap();
        }

        let seqs: Vec<u64> = session
            .transport()
            .written
            .iter()
            .map(|f| seq_number(f).unwrap())
            .collect();
        assert_eq!(seqs, (0..7).collect::<Vec<u64>>());
        assert_eq!(session.sequence(), 7);
        assert_eq!(session.state(), SessionState::Streaming);
    }

    #[test]
    fn test_every_frame_is_well_formed() {
        let mut session = streaming_session();
        session.tick(&mut hub(true)).unwrap();

        for frame in &session.transport().written {
            assert_eq!(frame.len(), REPORT_SIZE);
            assert_eq!(frame[0], MAGIC_BYTE);

            let command = Command([frame[1], frame[2]]);
            let header = frame_header(frame).unwrap();
            let body_len = frame_body(frame).map(<[u8]>::len).unwrap_or(0);
            let payload_len = header.len() + 4 + body_len;
            let payload = &frame[3..3 + payload_len];

            assert_eq!(frame[3 + payload_len], checksum(command, payload));
            assert_eq!(frame[4 + payload_len], MAGIC_BYTE);
            assert!(frame[5 + payload_len..].iter().all(|b| *b == 0));
        }
    }

    #[test]
    fn test_write_failure_while_streaming_is_fatal() {
        let mut session = Session::new(
            MemoryTransport::new().fail_writes_after(3),
            FixedClock::new(0),
            SessionSettings::default(),
        );
        session.connect().unwrap();
        session.configure(sample_config()).unwrap();
        session.start_streaming().unwrap();
        let mut sensors = hub(false);
        session.tick(&mut sensors).unwrap();

        let err = session.tick(&mut sensors).unwrap_err();
        assert!(matches!(err, Error::TransportWrite(_)));
        assert_eq!(session.sequence(), 3);
    }
}

mod snapshots {
    use super::*;

    #[test]
    fn test_telemetry_without_gpu_keeps_full_schema() {
        let mut session = streaming_session();
        session.tick(&mut hub(false)).unwrap();

        let json = telemetry_json(session.transport().written.last().unwrap());
        let gpu = &json["gpu"];
        assert_eq!(gpu["hasDedicated"], false);
        for field in ["load", "temperature", "fan", "speed", "power", "voltage"] {
            assert!(gpu[field].is_i64(), "gpu.{} missing or not numeric", field);
        }
        assert_eq!(json["disk"]["readSpeed"], 0);
        assert_eq!(json["network"]["upload"], 0);
        assert_eq!(json["motherboard"]["chipsetTemperature"], 0);
        assert_eq!(json["fans"], Value::Array(Vec::new()));
    }

    #[test]
    fn test_telemetry_with_gpu() {
        let mut session = streaming_session();
        let snapshot = session.tick(&mut hub(true)).unwrap();

        let json = telemetry_json(session.transport().written.last().unwrap());
        assert_eq!(json["gpu"]["hasDedicated"], true);
        assert_eq!(json["gpu"]["power"], 100);
        assert_eq!(json["cpu"]["temperaturePackage"], 55);
        assert_eq!(json["cpu"]["speedAverage"], 4950);
        assert_eq!(json["cpu"]["usage"], 18);
        assert_eq!(json["memory"]["total"], 65536);
        assert_eq!(json["memory"]["used"], 12288);
        assert_eq!(json["memory"]["load"], 19);
        assert_eq!(json["timestamp"], snapshot.timestamp);
    }

    #[test]
    fn test_header_date_matches_snapshot_timestamp() {
        let mut session = streaming_session();
        let snapshot = session.tick(&mut hub(false)).unwrap();

        let frame = session.transport().written.last().unwrap();
        let header = frame_header(frame).unwrap();
        assert!(header.contains(&format!("Date={}", snapshot.timestamp)));
    }
}

proptest! {
    #[test]
    fn prop_sequence_is_contiguous(ticks in 0usize..40) {
        let mut session = streaming_session();
        let mut sensors = hub(ticks % 2 == 0);
        for _ in 0..ticks {
            session.tick(&mut sensors).unwrap();
        }

        let written = &session.transport().written;
        prop_assert_eq!(written.len(), ticks + 2);
        for (expected, frame) in written.iter().enumerate() {
            prop_assert_eq!(seq_number(frame), Some(expected as u64));
        }
    }
}
