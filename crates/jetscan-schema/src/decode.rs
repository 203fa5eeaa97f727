//! Payload decoding.
//!
//! Both decoders share one contract: given raw bytes and the extraction
//! request, produce one [`ScalarValue`] per requested column. A payload
//! that fails to decode as a whole yields NULL for every requested column;
//! the row is still emitted by the caller with its metadata and raw
//! payload attached.

use jetscan_core::ScalarValue;
use prost_reflect::{DynamicMessage, Kind, MessageDescriptor, Value};

use crate::descriptor::MessageSchema;
use crate::resolve::ResolvedPath;

/// Decode a JSON payload and extract `fields` by top-level key lookup.
///
/// Values are coerced to text: strings pass through, numbers keep their
/// canonical decimal form, booleans become `"true"`/`"false"`, JSON null
/// becomes NULL, and compound values are re-serialized compactly. A
/// document that does not parse as a JSON object yields NULL for every
/// field.
pub fn decode_dynamic(payload: &[u8], fields: &[String]) -> Vec<ScalarValue> {
    let root: serde_json::Value = match serde_json::from_slice(payload) {
        Ok(value) => value,
        Err(_) => return vec![ScalarValue::Null; fields.len()],
    };
    let object = match root.as_object() {
        Some(object) => object,
        None => return vec![ScalarValue::Null; fields.len()],
    };

    fields
        .iter()
        .map(|field| match object.get(field) {
            Some(value) => json_to_text(value),
            None => ScalarValue::Null,
        })
        .collect()
}

fn json_to_text(value: &serde_json::Value) -> ScalarValue {
    match value {
        serde_json::Value::Null => ScalarValue::Null,
        serde_json::Value::String(s) => ScalarValue::Text(s.clone()),
        serde_json::Value::Number(n) => ScalarValue::Text(n.to_string()),
        serde_json::Value::Bool(b) => {
            ScalarValue::Text(if *b { "true" } else { "false" }.to_string())
        }
        compound => match serde_json::to_string(compound) {
            Ok(text) => ScalarValue::Text(text),
            Err(_) => ScalarValue::Null,
        },
    }
}

/// Decode a protobuf payload against `schema` and extract each resolved
/// path.
///
/// On decode failure every column is NULL. On success, navigation mirrors
/// path resolution: an unset intermediate message yields NULL for that
/// column, and the terminal value is converted per the fixed type mapping.
pub fn decode_structured(
    schema: &MessageSchema,
    payload: &[u8],
    paths: &[ResolvedPath],
) -> Vec<ScalarValue> {
    let message = match DynamicMessage::decode(schema.root().clone(), payload) {
        Ok(message) => message,
        Err(_) => return vec![ScalarValue::Null; paths.len()],
    };

    paths
        .iter()
        .map(|resolved| extract_path(&message, schema.root(), resolved))
        .collect()
}

/// Iterative walk from the decoded root to the path's terminal field.
fn extract_path(
    root: &DynamicMessage,
    root_descriptor: &MessageDescriptor,
    resolved: &ResolvedPath,
) -> ScalarValue {
    let segments = resolved.path.segments();
    let mut message = root.clone();
    let mut descriptor = root_descriptor.clone();

    for (i, segment) in segments.iter().enumerate() {
        // Paths were validated at bind time, but the walk stays defensive
        // only where the *data* can legitimately be absent: unset nested
        // messages yield NULL.
        let field = match descriptor.get_field_by_name(segment) {
            Some(field) => field,
            None => return ScalarValue::Null,
        };

        if i + 1 == segments.len() {
            return extract_terminal(&message, &field);
        }

        let nested_descriptor = match field.kind() {
            Kind::Message(nested) => nested,
            _ => return ScalarValue::Null,
        };
        if !message.has_field(&field) {
            return ScalarValue::Null;
        }
        match message.get_field(&field).into_owned() {
            Value::Message(nested) => {
                message = nested;
                descriptor = nested_descriptor;
            }
            _ => return ScalarValue::Null,
        }
    }

    ScalarValue::Null
}

fn extract_terminal(message: &DynamicMessage, field: &prost_reflect::FieldDescriptor) -> ScalarValue {
    let value = message.get_field(field).into_owned();
    match (field.kind(), value) {
        (Kind::String, Value::String(s)) => ScalarValue::Text(s),
        (Kind::Bytes, Value::Bytes(b)) => ScalarValue::Blob(b),
        (Kind::Int32 | Kind::Sint32 | Kind::Sfixed32, Value::I32(v)) => ScalarValue::Int32(v),
        (Kind::Int64 | Kind::Sint64 | Kind::Sfixed64, Value::I64(v)) => ScalarValue::Int64(v),
        (Kind::Uint32 | Kind::Fixed32, Value::U32(v)) => ScalarValue::UInt32(v),
        (Kind::Uint64 | Kind::Fixed64, Value::U64(v)) => ScalarValue::UInt64(v),
        (Kind::Float, Value::F32(v)) => ScalarValue::Float32(v),
        (Kind::Double, Value::F64(v)) => ScalarValue::Float64(v),
        (Kind::Bool, Value::Bool(v)) => ScalarValue::Bool(v),
        (Kind::Enum(descriptor), Value::EnumNumber(number)) => match descriptor.get_value(number)
        {
            Some(value) => ScalarValue::Text(value.name().to_string()),
            None => ScalarValue::Text(number.to_string()),
        },
        // Nested messages are not extractable as terminal values; repeated
        // and map fields fall through here as well.
        _ => ScalarValue::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::resolve_path;
    use crate::testutil::telemetry_schema;
    use jetscan_core::FieldPath;
    use prost::Message;

    fn resolved(schema: &MessageSchema, paths: &[&str]) -> Vec<ResolvedPath> {
        paths
            .iter()
            .map(|p| resolve_path(schema, &FieldPath::parse(p).unwrap()).unwrap())
            .collect()
    }

    fn sample_payload(schema: &MessageSchema, with_location: bool) -> Vec<u8> {
        let pool = schema.pool();
        let telemetry_desc = pool.get_message_by_name("telemetry.Telemetry").unwrap();
        let location_desc = pool.get_message_by_name("telemetry.Location").unwrap();

        let mut message = DynamicMessage::new(telemetry_desc);
        message.set_field_by_name("device_id", Value::String("sensor-7".to_string()));
        message.set_field_by_name("reading", Value::F64(21.5));
        message.set_field_by_name("count", Value::I64(-3));
        message.set_field_by_name("active", Value::Bool(true));
        message.set_field_by_name("status", Value::EnumNumber(1));
        message.set_field_by_name("total", Value::U64(9001));

        if with_location {
            let mut location = DynamicMessage::new(location_desc);
            location.set_field_by_name("zone", Value::String("dc1".to_string()));
            location.set_field_by_name("rack", Value::U32(42));
            message.set_field_by_name("location", Value::Message(location));
        }

        message.encode_to_vec()
    }

    #[test]
    fn test_dynamic_number_renders_canonical() {
        let values = decode_dynamic(br#"{"kw": 42.5}"#, &["kw".to_string()]);
        assert_eq!(values, vec![ScalarValue::Text("42.5".to_string())]);
    }

    #[test]
    fn test_dynamic_missing_key_is_null() {
        let values = decode_dynamic(br#"{"other": 1}"#, &["kw".to_string()]);
        assert_eq!(values, vec![ScalarValue::Null]);
    }

    #[test]
    fn test_dynamic_scalar_coercions() {
        let payload = br#"{"s": "x", "i": 17, "b": true, "n": null, "o": {"a": 1}, "l": [1, 2]}"#;
        let fields: Vec<String> = ["s", "i", "b", "n", "o", "l"]
            .iter()
            .map(|f| f.to_string())
            .collect();
        let values = decode_dynamic(payload, &fields);
        assert_eq!(
            values,
            vec![
                ScalarValue::Text("x".to_string()),
                ScalarValue::Text("17".to_string()),
                ScalarValue::Text("true".to_string()),
                ScalarValue::Null,
                ScalarValue::Text(r#"{"a":1}"#.to_string()),
                ScalarValue::Text("[1,2]".to_string()),
            ]
        );
    }

    #[test]
    fn test_dynamic_unparseable_document_all_null() {
        let fields = vec!["a".to_string(), "b".to_string()];
        assert_eq!(
            decode_dynamic(b"not json at all", &fields),
            vec![ScalarValue::Null, ScalarValue::Null]
        );
        // A valid document that is not an object behaves the same.
        assert_eq!(
            decode_dynamic(b"[1,2,3]", &fields),
            vec![ScalarValue::Null, ScalarValue::Null]
        );
    }

    #[test]
    fn test_structured_scalars_and_enum() {
        let (_dir, schema) = telemetry_schema();
        let payload = sample_payload(&schema, true);
        let paths = resolved(
            &schema,
            &["device_id", "reading", "count", "active", "status", "total"],
        );

        let values = decode_structured(&schema, &payload, &paths);
        assert_eq!(
            values,
            vec![
                ScalarValue::Text("sensor-7".to_string()),
                ScalarValue::Float64(21.5),
                ScalarValue::Int64(-3),
                ScalarValue::Bool(true),
                ScalarValue::Text("STATUS_OK".to_string()),
                ScalarValue::UInt64(9001),
            ]
        );
    }

    #[test]
    fn test_structured_nested_path() {
        let (_dir, schema) = telemetry_schema();
        let payload = sample_payload(&schema, true);
        let paths = resolved(&schema, &["location.zone", "location.rack"]);

        let values = decode_structured(&schema, &payload, &paths);
        assert_eq!(
            values,
            vec![
                ScalarValue::Text("dc1".to_string()),
                ScalarValue::UInt32(42),
            ]
        );
    }

    #[test]
    fn test_structured_unset_nested_message_is_null() {
        let (_dir, schema) = telemetry_schema();
        let payload = sample_payload(&schema, false);
        let paths = resolved(&schema, &["location.zone", "device_id"]);

        let values = decode_structured(&schema, &payload, &paths);
        assert_eq!(
            values,
            vec![ScalarValue::Null, ScalarValue::Text("sensor-7".to_string())]
        );
    }

    #[test]
    fn test_structured_message_terminal_is_null() {
        let (_dir, schema) = telemetry_schema();
        let payload = sample_payload(&schema, true);
        let paths = resolved(&schema, &["location"]);

        let values = decode_structured(&schema, &payload, &paths);
        assert_eq!(values, vec![ScalarValue::Null]);
    }

    #[test]
    fn test_structured_decode_failure_all_null() {
        let (_dir, schema) = telemetry_schema();
        // A truncated varint field is not decodable as Telemetry.
        let garbage = vec![0x0a, 0xff];
        let paths = resolved(&schema, &["device_id", "location.zone"]);

        let values = decode_structured(&schema, &garbage, &paths);
        assert_eq!(values, vec![ScalarValue::Null, ScalarValue::Null]);
    }

    #[test]
    fn test_structured_proto3_scalar_defaults() {
        let (_dir, schema) = telemetry_schema();
        // Empty payload decodes to an all-defaults message.
        let paths = resolved(&schema, &["device_id", "reading", "active"]);

        let values = decode_structured(&schema, &[], &paths);
        assert_eq!(
            values,
            vec![
                ScalarValue::Text(String::new()),
                ScalarValue::Float64(0.0),
                ScalarValue::Bool(false),
            ]
        );
    }
}
