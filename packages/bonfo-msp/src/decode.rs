use core::str::Utf8Error;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub struct DecodeError {
    kind: DecodeErrorKind,
    type_name: &'static str,
}

impl DecodeError {
    pub fn new<T>(kind: DecodeErrorKind) -> Self {
        Self {
            kind,
            type_name: core::any::type_name::<T>(),
        }
    }

    pub const fn kind(&self) -> DecodeErrorKind {
        self.kind
    }

    /// Returns `true` if this error means the reader has lost track of frame boundaries.
    ///
    /// Framing errors can only be recovered from by resetting the link. A checksum
    /// failure on an otherwise well-framed message is *not* a framing error.
    pub const fn is_framing(&self) -> bool {
        matches!(
            self.kind,
            DecodeErrorKind::InvalidHeader
                | DecodeErrorKind::UnsupportedFrameVersion
                | DecodeErrorKind::UnexpectedByte { .. }
        )
    }

    /// Returns `true` if this error is a checksum mismatch on a well-framed message.
    pub const fn is_checksum(&self) -> bool {
        matches!(self.kind, DecodeErrorKind::Checksum { .. })
    }
}

impl core::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "Failed to decode {}: {}", self.type_name, self.kind)
    }
}

#[derive(Error, Clone, Copy, Debug, PartialEq, Eq)]
pub enum DecodeErrorKind {
    #[error("Packet was too short.")]
    UnexpectedEnd,

    #[error(
        "Could not decode {name} with unexpected byte. Found {value:x}, expected one of: {expected:x?}."
    )]
    UnexpectedByte {
        name: &'static str,
        value: u8,
        expected: &'static [u8],
    },

    #[error("XOR checksum mismatch. Found {value:x}, expected {expected:x}.")]
    Checksum { value: u8, expected: u8 },

    #[error("Packet did not start with the `$M` signature.")]
    InvalidHeader,

    #[error("Packet uses the extended `$X` frame format, which is not supported.")]
    UnsupportedFrameVersion,

    #[error(transparent)]
    Utf8Error(#[from] Utf8Error),
}

/// Reads a value off the front of a byte slice, advancing the slice past it.
///
/// The integer impls leave the slice where it was on failure. Composite impls
/// such as [`Frame`](crate::frame::Frame) may already have consumed the parts
/// they read before failing.
pub trait Decode {
    fn decode(data: &mut &[u8]) -> Result<Self, DecodeError>
    where
        Self: Sized;
}

// MSP payloads are little-endian on the wire.
macro_rules! impl_decode_for_primitive {
    ($($t:ty),*) => {
        $(
            impl Decode for $t {
                fn decode(data: &mut &[u8]) -> Result<Self, DecodeError> {
                    let (bytes, rest) = data
                        .split_first_chunk::<{ size_of::<$t>() }>()
                        .ok_or_else(|| DecodeError::new::<Self>(DecodeErrorKind::UnexpectedEnd))?;
                    *data = rest;
                    Ok(Self::from_le_bytes(*bytes))
                }
            }
        )*
    };
}

impl_decode_for_primitive!(u8, u16, u32, i16);

/// Splits `len` bytes off the front of `data`.
pub(crate) fn take<'a, T>(data: &mut &'a [u8], len: usize) -> Result<&'a [u8], DecodeError> {
    if data.len() < len {
        return Err(DecodeError::new::<T>(DecodeErrorKind::UnexpectedEnd));
    }
    let (head, rest) = data.split_at(len);
    *data = rest;
    Ok(head)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primitives_are_little_endian() {
        let mut data: &[u8] = &[0xCE, 0x07, 0x04, 0x01, 0x01, 0x00, 0xFF];

        assert_eq!(u16::decode(&mut data).unwrap(), 1998);
        assert_eq!(u32::decode(&mut data).unwrap(), 0x0001_0104);
        assert_eq!(data, &[0xFF]);
    }

    #[test]
    fn short_input() {
        let mut data: &[u8] = &[0x01];
        let err = u16::decode(&mut data).unwrap_err();

        assert_eq!(err.kind(), DecodeErrorKind::UnexpectedEnd);
        // Nothing is consumed on failure.
        assert_eq!(data, &[0x01]);
    }
}
