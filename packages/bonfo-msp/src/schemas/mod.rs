//! Payload schemas for the messages this crate understands.
//!
//! Each schema is a `static` [`Schema`] listing its fields in wire order.
//! Fields that newer firmware appends are gated with [`Field::since`](crate::field::Field::since). Most
//! schemas also have a typed view that can be built from a decoded
//! [`Record`](crate::field::Record) with `TryFrom`.

pub mod config;
pub mod identity;
pub mod status;

pub use config::*;
pub use identity::*;
pub use status::*;

use crate::registry::Schema;

/// Every schema registered by [`Registry::standard`](crate::registry::Registry::standard).
pub static ALL: &[&Schema] = &[
    // identity
    &API_VERSION,
    &FC_VARIANT,
    &FC_VERSION,
    &BOARD_INFO,
    &BUILD_INFO,
    &UID,
    &NAME,
    // status
    &STATUS,
    &STATUS_EX,
    &ATTITUDE,
    &RAW_IMU,
    // config
    &RC_TUNING,
    &PID,
    &PID_ADVANCED,
    &FEATURE_CONFIG,
    &RX_CONFIG,
    &SENSOR_ALIGNMENT,
    // commands
    &SELECT_SETTING,
    &COPY_PROFILE,
    &EEPROM_WRITE,
];

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::{string::ToString, vec, vec::Vec};

    use crate::{
        field::{Record, Scalar, Value, WireType},
        version::ProtocolVersion,
    };

    const VERSIONS: [ProtocolVersion; 5] = [
        ProtocolVersion::V1_40,
        ProtocolVersion::V1_41,
        ProtocolVersion::V1_42,
        ProtocolVersion::V1_43,
        ProtocolVersion::V1_44,
    ];

    /// Decoding what was encoded gives back the record, for every schema and version.
    #[test]
    fn defaults_survive_a_round_trip() {
        for schema in ALL {
            for version in VERSIONS {
                let bytes = schema.encode(&Record::new(), version).unwrap();
                let record = schema.decode(&bytes, version).unwrap();
                let again = schema.encode(&record, version).unwrap();

                assert_eq!(bytes, again, "{} at {version}", schema.name);
                assert_eq!(record.len(), schema.fields.len(), "{}", schema.name);
            }
        }
    }

    fn sample_scalar(scalar: Scalar) -> Value {
        match scalar {
            Scalar::U8 => Value::U8(0x2A),
            Scalar::U16 => Value::U16(0x1234),
            Scalar::U32 => Value::U32(0x0102_0304),
            Scalar::I16 => Value::I16(-42),
        }
    }

    /// A value for `wire` that differs from its default.
    fn sample(wire: WireType) -> Value {
        match wire {
            WireType::U8 => sample_scalar(Scalar::U8),
            WireType::U16 => sample_scalar(Scalar::U16),
            WireType::U32 => sample_scalar(Scalar::U32),
            WireType::I16 => sample_scalar(Scalar::I16),
            WireType::ProfileIndex => Value::U8(3),
            WireType::Str(n) => Value::Str("btf"[..n.min(3)].to_string()),
            WireType::PrefixedStr => Value::Str("pilot".to_string()),
            WireType::RestStr => Value::Str("tiny whoop".to_string()),
            WireType::Bytes(n) => Value::Bytes(vec![0x5A; n]),
            WireType::PrefixedBytes => Value::Bytes(vec![1, 2, 3]),
            WireType::Array(n, scalar) => Value::List(vec![sample_scalar(scalar); n]),
        }
    }

    /// Every present field keeps a non-default value through encode and decode.
    #[test]
    fn sample_values_survive_a_round_trip() {
        for schema in ALL {
            for version in VERSIONS {
                let present: Vec<_> = schema
                    .fields
                    .iter()
                    .filter(|f| f.is_present(version))
                    .collect();

                let mut record = Record::new();
                for field in &present {
                    record.set(field.name, sample(field.wire));
                }

                let bytes = schema.encode(&record, version).unwrap();
                let decoded = schema.decode(&bytes, version).unwrap();

                for field in &present {
                    assert_ne!(
                        Some(&field.default_value()),
                        record.get(field.name),
                        "{}.{}",
                        schema.name,
                        field.name
                    );
                    assert_eq!(
                        decoded.get(field.name),
                        record.get(field.name),
                        "{}.{} at {version}",
                        schema.name,
                        field.name
                    );
                }
            }
        }
    }

    #[test]
    fn gated_fields_only_grow_payloads() {
        for schema in ALL {
            let sizes = VERSIONS.map(|v| schema.encode(&Record::new(), v).unwrap().len());
            assert!(sizes.is_sorted(), "{}: {sizes:?}", schema.name);
        }
    }
}
