//! End-to-end scans against the in-memory broker, through the public API
//! only: build a request, bind it, drive the scanner, check the rows.

use std::io::Write;
use std::sync::Arc;

use chrono::{TimeZone, Utc};
use jetscan::{
    ColumnType, MemoryBroker, Range, ScalarValue, ScanError, ScanPlan, ScanRequest,
};

const TELEMETRY_PROTO: &str = r#"
syntax = "proto3";

package telemetry;

message Location {
  string zone = 1;
  uint32 rack = 2;
}

message Telemetry {
  string device_id = 1;
  double reading = 2;
  Location location = 3;
}
"#;

fn write_proto() -> (tempfile::TempDir, std::path::PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("telemetry.proto");
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(TELEMETRY_PROTO.as_bytes()).unwrap();
    (dir, path)
}

/// Hand-encoded Telemetry payload. Field 1 (device_id) and field 3
/// (location { zone }) use plain length-delimited wire format, which keeps
/// the fixture independent of any encoder.
fn telemetry_payload(device_id: &str, zone: Option<&str>) -> Vec<u8> {
    let mut out = Vec::new();
    out.push(0x0a); // field 1, wire type 2
    out.push(device_id.len() as u8);
    out.extend_from_slice(device_id.as_bytes());
    if let Some(zone) = zone {
        let mut location = Vec::new();
        location.push(0x0a); // Location field 1, wire type 2
        location.push(zone.len() as u8);
        location.extend_from_slice(zone.as_bytes());
        out.push(0x1a); // field 3, wire type 2
        out.push(location.len() as u8);
        out.extend_from_slice(&location);
    }
    out
}

#[tokio::test]
async fn test_time_bounded_json_scan() {
    let broker = MemoryBroker::new();
    for (seq, ts) in [(1, 100), (2, 200), (3, 200), (4, 400), (5, 500)] {
        broker.publish_at(
            "telemetry",
            seq,
            "t.dc1.sensor",
            ts,
            serde_json::json!({ "kw": seq }).to_string(),
        );
    }

    let start = Utc.timestamp_opt(0, 250).unwrap();
    let request = ScanRequest::builder("telemetry")
        .start_time(start)
        .extract_json(["kw"])
        .build()
        .unwrap();
    assert_eq!(
        request.range,
        Range::ByTime {
            start_ns: Some(250),
            end_ns: None
        }
    );

    let plan = ScanPlan::bind(request).unwrap();
    let mut scanner = plan.scan_with(Arc::new(broker));
    let rows = scanner.collect_rows().await.unwrap();

    let seqs: Vec<u64> = rows.iter().map(|r| r.seq).collect();
    assert_eq!(seqs, vec![4, 5]);
    assert_eq!(rows[0].extracted[0], ScalarValue::Text("4".to_string()));
}

#[tokio::test]
async fn test_structured_scan_with_nested_path() {
    let broker = MemoryBroker::new();
    broker.publish(
        "telemetry",
        "t.dc1.a",
        100,
        telemetry_payload("sensor-1", Some("dc1")),
    );
    broker.publish(
        "telemetry",
        "t.dc1.b",
        200,
        telemetry_payload("sensor-2", None), // location unset
    );
    broker.publish("telemetry", "t.dc1.c", 300, &b"\xff\xff garbage"[..]);

    let (_dir, proto) = write_proto();
    let request = ScanRequest::builder("telemetry")
        .proto_schema(&proto, "Telemetry")
        .extract_proto(["device_id", "location.zone"])
        .build()
        .unwrap();
    let plan = ScanPlan::bind(request).unwrap();

    let schema = plan.schema();
    let names: Vec<&str> = schema.columns().iter().map(|c| c.name.as_str()).collect();
    assert_eq!(
        names,
        vec!["stream", "subject", "seq", "timestamp", "payload", "device_id", "location_zone"]
    );
    assert_eq!(schema.columns()[4].column_type, ColumnType::Blob);

    let mut scanner = plan.scan_with(Arc::new(broker));
    let rows = scanner.collect_rows().await.unwrap();
    assert_eq!(rows.len(), 3);

    assert_eq!(
        rows[0].extracted,
        vec![
            ScalarValue::Text("sensor-1".to_string()),
            ScalarValue::Text("dc1".to_string()),
        ]
    );
    // Unset nested message extracts NULL, scalar still present.
    assert_eq!(
        rows[1].extracted,
        vec![ScalarValue::Text("sensor-2".to_string()), ScalarValue::Null]
    );
    // Undecodable payload: all extracted columns NULL, metadata and raw
    // payload intact.
    assert_eq!(
        rows[2].extracted,
        vec![ScalarValue::Null, ScalarValue::Null]
    );
    assert_eq!(rows[2].seq, 3);
    assert!(matches!(rows[2].payload, ScalarValue::Blob(ref b) if !b.is_empty()));
}

#[tokio::test]
async fn test_validation_failures_before_any_fetch() {
    let broker = MemoryBroker::new();
    broker.publish("telemetry", "t.x", 100, "{}");

    // Unknown field path fails at bind, with zero fetches issued.
    let (_dir, proto) = write_proto();
    let request = ScanRequest::builder("telemetry")
        .proto_schema(&proto, "Telemetry")
        .extract_proto(["nope"])
        .build()
        .unwrap();
    let err = ScanPlan::bind(request).unwrap_err();
    assert!(matches!(
        err,
        ScanError::Schema(jetscan::SchemaError::FieldNotFound { .. })
    ));
    assert_eq!(broker.fetch_count(), 0);
}

#[tokio::test]
async fn test_subject_filter_end_to_end() {
    let broker = MemoryBroker::new();
    broker.publish("telemetry", "t.dc1.x", 100, "{}");
    broker.publish("telemetry", "t.dc2.x", 200, "{}");
    broker.publish("telemetry", "t.dc1.y", 300, "{}");

    let request = ScanRequest::builder("telemetry")
        .subject("dc1")
        .build()
        .unwrap();
    let mut scanner = ScanPlan::bind(request).unwrap().scan_with(Arc::new(broker));
    let rows = scanner.collect_rows().await.unwrap();

    let seqs: Vec<u64> = rows.iter().map(|r| r.seq).collect();
    assert_eq!(seqs, vec![1, 3]);
}

#[tokio::test]
async fn test_empty_time_range_yields_zero_rows_without_error() {
    let broker = MemoryBroker::new();
    broker.publish("telemetry", "t.x", 100, "{}");

    let start = Utc.timestamp_opt(10, 0).unwrap(); // far past the newest
    let request = ScanRequest::builder("telemetry")
        .start_time(start)
        .build()
        .unwrap();
    let mut scanner = ScanPlan::bind(request).unwrap().scan_with(Arc::new(broker));
    assert!(scanner.next_batch().await.unwrap().is_none());
}
