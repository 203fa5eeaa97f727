//! Shared test fixtures: an on-disk `.proto` schema in the shape the worked
//! examples use (`Telemetry { location: Location { zone: string } }`).

use std::io::Write;
use std::path::PathBuf;

pub(crate) const TELEMETRY_PROTO: &str = r#"
syntax = "proto3";

package telemetry;

enum Status {
  STATUS_UNKNOWN = 0;
  STATUS_OK = 1;
  STATUS_DEGRADED = 2;
}

message Location {
  string zone = 1;
  uint32 rack = 2;
}

message Telemetry {
  string device_id = 1;
  double reading = 2;
  int64 count = 3;
  bool active = 4;
  bytes raw = 5;
  Status status = 6;
  Location location = 7;
  float gain = 8;
  uint64 total = 9;
  int32 delta = 10;
  uint32 slot = 11;
}
"#;

/// Write `contents` to `telemetry.proto` in a fresh temp dir.
///
/// The dir handle must stay alive for the duration of the test.
pub(crate) fn write_proto(contents: &str) -> (tempfile::TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("telemetry.proto");
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    (dir, path)
}

/// Load the telemetry fixture schema.
pub(crate) fn telemetry_schema() -> (tempfile::TempDir, crate::MessageSchema) {
    let (dir, path) = write_proto(TELEMETRY_PROTO);
    let schema = crate::MessageSchema::load(&path, "telemetry.Telemetry").unwrap();
    (dir, schema)
}
