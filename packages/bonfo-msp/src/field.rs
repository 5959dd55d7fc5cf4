//! Payload field descriptions and the dynamically typed records they decode into.

use alloc::{string::String, vec::Vec};
use core::str;

use crate::{
    decode::{Decode, DecodeError, take},
    registry::RegistryError,
    version::ProtocolVersion,
};

/// Fixed-width integer types that can appear inside a [`WireType::Array`].
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Scalar {
    U8,
    U16,
    U32,
    I16,
}

impl Scalar {
    fn decode(self, data: &mut &[u8]) -> Result<Value, DecodeError> {
        Ok(match self {
            Scalar::U8 => Value::U8(u8::decode(data)?),
            Scalar::U16 => Value::U16(u16::decode(data)?),
            Scalar::U32 => Value::U32(u32::decode(data)?),
            Scalar::I16 => Value::I16(i16::decode(data)?),
        })
    }

    fn encode(self, value: &Value, out: &mut Vec<u8>) -> bool {
        match (self, value) {
            (Scalar::U8, Value::U8(v)) => out.push(*v),
            (Scalar::U16, Value::U16(v)) => out.extend_from_slice(&v.to_le_bytes()),
            (Scalar::U32, Value::U32(v)) => out.extend_from_slice(&v.to_le_bytes()),
            (Scalar::I16, Value::I16(v)) => out.extend_from_slice(&v.to_le_bytes()),
            _ => return false,
        }
        true
    }

    const fn zero(self) -> Value {
        match self {
            Scalar::U8 => Value::U8(0),
            Scalar::U16 => Value::U16(0),
            Scalar::U32 => Value::U32(0),
            Scalar::I16 => Value::I16(0),
        }
    }
}

/// How a single payload field is laid out on the wire.
///
/// Multi-byte integers are little-endian.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum WireType {
    U8,
    U16,
    U32,
    I16,

    /// A profile index. Zero-based on the wire, one-based in a [`Record`].
    ProfileIndex,

    /// A string padded with NUL bytes to exactly `n` bytes.
    Str(usize),

    /// A string prefixed by its length as a `u8`.
    PrefixedStr,

    /// Exactly `n` raw bytes.
    Bytes(usize),

    /// Raw bytes prefixed by their length as a `u8`.
    PrefixedBytes,

    /// A string taking up the remainder of the payload. Only valid as the last field.
    RestStr,

    /// `n` consecutive scalars.
    Array(usize, Scalar),
}

/// A decoded field value.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Value {
    U8(u8),
    U16(u16),
    U32(u32),
    I16(i16),
    Str(String),
    Bytes(Vec<u8>),
    List(Vec<Value>),
}

impl Value {
    pub fn as_u8(&self) -> Option<u8> {
        match self {
            Value::U8(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_u16(&self) -> Option<u16> {
        match self {
            Value::U16(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_i16(&self) -> Option<i16> {
        match self {
            Value::I16(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns any unsigned integer value widened to `u32`.
    pub fn as_u32(&self) -> Option<u32> {
        match self {
            Value::U8(v) => Some(*v as u32),
            Value::U16(v) => Some(*v as u32),
            Value::U32(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(l) => Some(l),
            _ => None,
        }
    }
}

macro_rules! impl_value_from {
    ($($t:ty => $variant:ident),*) => {
        $(
            impl From<$t> for Value {
                fn from(value: $t) -> Self {
                    Value::$variant(value.into())
                }
            }
        )*
    };
}

impl_value_from!(
    u8 => U8,
    u16 => U16,
    u32 => U32,
    i16 => I16,
    String => Str,
    &str => Str,
    Vec<u8> => Bytes,
    &[u8] => Bytes,
    Vec<Value> => List
);

/// Conversion from a [`Value`] into a concrete Rust type.
pub trait FromValue: Sized {
    fn from_value(value: &Value) -> Option<Self>;
}

impl FromValue for u8 {
    fn from_value(value: &Value) -> Option<Self> {
        value.as_u8()
    }
}

impl FromValue for u16 {
    fn from_value(value: &Value) -> Option<Self> {
        value.as_u16()
    }
}

impl FromValue for u32 {
    fn from_value(value: &Value) -> Option<Self> {
        value.as_u32()
    }
}

impl FromValue for i16 {
    fn from_value(value: &Value) -> Option<Self> {
        value.as_i16()
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> Option<Self> {
        value.as_str().map(String::from)
    }
}

impl FromValue for Vec<u8> {
    fn from_value(value: &Value) -> Option<Self> {
        value.as_bytes().map(<[u8]>::to_vec)
    }
}

impl<T: FromValue, const N: usize> FromValue for [T; N] {
    fn from_value(value: &Value) -> Option<Self> {
        let items = value
            .as_list()?
            .iter()
            .map(T::from_value)
            .collect::<Option<Vec<T>>>()?;
        items.try_into().ok()
    }
}

/// A named payload field and the API version it first appeared in.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct Field {
    pub name: &'static str,
    pub wire: WireType,
    /// The first API version that sends this field. `None` means always present.
    pub introduced_in: Option<ProtocolVersion>,
    /// Default for integer fields that are absent from a payload or a record.
    pub default: u32,
}

impl Field {
    pub const fn new(name: &'static str, wire: WireType) -> Self {
        Self {
            name,
            wire,
            introduced_in: None,
            default: 0,
        }
    }

    /// Marks the field as only present from `version` onwards.
    pub const fn since(mut self, version: ProtocolVersion) -> Self {
        self.introduced_in = Some(version);
        self
    }

    pub const fn with_default(mut self, default: u32) -> Self {
        self.default = default;
        self
    }

    /// Whether this field is on the wire for a device speaking `version`.
    pub fn is_present(&self, version: ProtocolVersion) -> bool {
        self.introduced_in
            .is_none_or(|introduced_in| version >= introduced_in)
    }

    /// The value assigned to this field when it is not on the wire.
    pub fn default_value(&self) -> Value {
        match self.wire {
            WireType::U8 => Value::U8(self.default as u8),
            WireType::U16 => Value::U16(self.default as u16),
            WireType::U32 => Value::U32(self.default),
            WireType::I16 => Value::I16(self.default as i16),
            WireType::ProfileIndex => Value::U8((self.default as u8).max(1)),
            WireType::Str(_) | WireType::PrefixedStr | WireType::RestStr => {
                Value::Str(String::new())
            }
            WireType::Bytes(n) => Value::Bytes(alloc::vec![0; n]),
            WireType::PrefixedBytes => Value::Bytes(Vec::new()),
            WireType::Array(n, scalar) => Value::List(alloc::vec![scalar.zero(); n]),
        }
    }

    pub(crate) fn decode(&self, data: &mut &[u8]) -> Result<Value, DecodeError> {
        Ok(match self.wire {
            WireType::U8 => Value::U8(u8::decode(data)?),
            WireType::U16 => Value::U16(u16::decode(data)?),
            WireType::U32 => Value::U32(u32::decode(data)?),
            WireType::I16 => Value::I16(i16::decode(data)?),
            WireType::ProfileIndex => Value::U8(u8::decode(data)?.saturating_add(1)),
            WireType::Str(n) => {
                let raw = take::<Field>(data, n)?;
                let end = raw.iter().position(|&b| b == 0).unwrap_or(n);
                Value::Str(decode_str(&raw[..end])?)
            }
            WireType::PrefixedStr => {
                let len = u8::decode(data)? as usize;
                Value::Str(decode_str(take::<Field>(data, len)?)?)
            }
            WireType::Bytes(n) => Value::Bytes(take::<Field>(data, n)?.to_vec()),
            WireType::PrefixedBytes => {
                let len = u8::decode(data)? as usize;
                Value::Bytes(take::<Field>(data, len)?.to_vec())
            }
            WireType::RestStr => {
                let rest = take::<Field>(data, data.len())?;
                Value::Str(decode_str(rest)?)
            }
            WireType::Array(n, scalar) => Value::List(
                (0..n)
                    .map(|_| scalar.decode(data))
                    .collect::<Result<Vec<_>, _>>()?,
            ),
        })
    }

    pub(crate) fn encode(&self, value: &Value, out: &mut Vec<u8>) -> Result<(), RegistryError> {
        let mismatch = || RegistryError::TypeMismatch {
            field: self.name,
            expected: self.wire,
        };

        match (self.wire, value) {
            (WireType::U8, Value::U8(v)) => out.push(*v),
            (WireType::U16, Value::U16(v)) => out.extend_from_slice(&v.to_le_bytes()),
            (WireType::U32, Value::U32(v)) => out.extend_from_slice(&v.to_le_bytes()),
            (WireType::I16, Value::I16(v)) => out.extend_from_slice(&v.to_le_bytes()),
            (WireType::ProfileIndex, Value::U8(v)) => {
                let index = v.checked_sub(1).ok_or(RegistryError::OutOfRange {
                    field: self.name,
                    value: *v as u32,
                })?;
                out.push(index);
            }
            (WireType::Str(n), Value::Str(s)) => {
                self.check_len(s.len(), n)?;
                out.extend_from_slice(s.as_bytes());
                out.resize(out.len() + (n - s.len()), 0);
            }
            (WireType::PrefixedStr, Value::Str(s)) => {
                self.check_len(s.len(), u8::MAX as usize)?;
                out.push(s.len() as u8);
                out.extend_from_slice(s.as_bytes());
            }
            (WireType::Bytes(n), Value::Bytes(b)) => {
                self.check_len(b.len(), n)?;
                out.extend_from_slice(b);
                out.resize(out.len() + (n - b.len()), 0);
            }
            (WireType::PrefixedBytes, Value::Bytes(b)) => {
                self.check_len(b.len(), u8::MAX as usize)?;
                out.push(b.len() as u8);
                out.extend_from_slice(b);
            }
            (WireType::RestStr, Value::Str(s)) => out.extend_from_slice(s.as_bytes()),
            (WireType::Array(n, scalar), Value::List(items)) => {
                if items.len() != n {
                    return Err(RegistryError::LengthMismatch {
                        field: self.name,
                        len: items.len(),
                        expected: n,
                    });
                }
                for item in items {
                    if !scalar.encode(item, out) {
                        return Err(mismatch());
                    }
                }
            }
            _ => return Err(mismatch()),
        }

        Ok(())
    }

    fn check_len(&self, len: usize, max: usize) -> Result<(), RegistryError> {
        if len > max {
            return Err(RegistryError::ValueTooLarge {
                field: self.name,
                len,
                max,
            });
        }
        Ok(())
    }
}

fn decode_str(bytes: &[u8]) -> Result<String, DecodeError> {
    str::from_utf8(bytes)
        .map(String::from)
        .map_err(|e| DecodeError::new::<String>(e.into()))
}

/// An ordered collection of named field values.
///
/// Records are produced by decoding a payload against its schema and consumed
/// when encoding one. Fields missing from a record are encoded with their
/// schema default.
#[derive(Debug, Default, Clone, Eq, PartialEq)]
pub struct Record {
    fields: Vec<(&'static str, Value)>,
}

impl Record {
    pub const fn new() -> Self {
        Self { fields: Vec::new() }
    }

    /// Builder form of [`Record::set`].
    pub fn with(mut self, name: &'static str, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    /// Sets a field, replacing any previous value with the same name.
    pub fn set(&mut self, name: &'static str, value: impl Into<Value>) {
        let value = value.into();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v)
    }

    /// Reads a field as `T`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::MissingField`] if the field is absent or holds a
    /// value of a different type.
    pub fn require<T: FromValue>(&self, name: &'static str) -> Result<T, RegistryError> {
        self.get(name)
            .and_then(T::from_value)
            .ok_or(RegistryError::MissingField(name))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &Value)> {
        self.fields.iter().map(|(n, v)| (*n, v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use alloc::{string::ToString, vec};

    use super::*;

    #[test]
    fn padded_string() {
        let field = Field::new("git_hash", WireType::Str(7));
        let mut out = Vec::new();

        field.encode(&Value::from("85c6"), &mut out).unwrap();
        assert_eq!(out, b"85c6\0\0\0");
        assert_eq!(
            field.decode(&mut out.as_slice()).unwrap(),
            Value::Str("85c6".to_string())
        );

        let err = field.encode(&Value::from("85c6fdf0"), &mut out).unwrap_err();
        assert!(matches!(err, RegistryError::ValueTooLarge { max: 7, .. }));
    }

    #[test]
    fn profile_index_is_one_based() {
        let field = Field::new("pid_profile", WireType::ProfileIndex);

        assert_eq!(field.decode(&mut [0u8].as_slice()).unwrap(), Value::U8(1));

        let mut out = Vec::new();
        field.encode(&Value::U8(3), &mut out).unwrap();
        assert_eq!(out, [2]);

        assert!(field.encode(&Value::U8(0), &mut out).is_err());
    }

    #[test]
    fn prefixed_bytes() {
        let field = Field::new("additional_mode", WireType::PrefixedBytes);
        let mut data: &[u8] = &[2, 0xAA, 0xBB, 0xCC];

        assert_eq!(
            field.decode(&mut data).unwrap(),
            Value::Bytes(vec![0xAA, 0xBB])
        );
        assert_eq!(data, &[0xCC]);
    }

    #[test]
    fn array_of_words() {
        let field = Field::new("uid", WireType::Array(3, Scalar::U32));
        let value = Value::List(vec![Value::U32(1), Value::U32(2), Value::U32(0xDEADBEEF)]);
        let mut out = Vec::new();

        field.encode(&value, &mut out).unwrap();
        assert_eq!(out.len(), 12);
        assert_eq!(field.decode(&mut out.as_slice()).unwrap(), value);
        assert_eq!(<[u32; 3]>::from_value(&value), Some([1, 2, 0xDEADBEEF]));
    }

    #[test]
    fn type_mismatch() {
        let field = Field::new("cycle_time", WireType::U16);
        let err = field.encode(&Value::U8(1), &mut Vec::new()).unwrap_err();

        assert_eq!(
            err,
            RegistryError::TypeMismatch {
                field: "cycle_time",
                expected: WireType::U16
            }
        );
    }

    #[test]
    fn gating() {
        let always = Field::new("roll_rate", WireType::U8);
        let gated = Field::new("rates_type", WireType::U8).since(ProtocolVersion::V1_43);

        assert!(always.is_present(ProtocolVersion::V1_40));
        assert!(!gated.is_present(ProtocolVersion::V1_42));
        assert!(gated.is_present(ProtocolVersion::V1_43));
        assert!(gated.is_present(ProtocolVersion::V1_44));
    }

    #[test]
    fn record_set_replaces() {
        let mut record = Record::new().with("pid", 1u8).with("rate", 2u8);
        record.set("pid", 3u8);

        assert_eq!(record.len(), 2);
        assert_eq!(record.require::<u8>("pid"), Ok(3));
        assert_eq!(
            record.require::<u16>("pid"),
            Err(RegistryError::MissingField("pid"))
        );
    }
}
