//! MSP v1 framing.
//!
//! Every message on the wire is wrapped in the same envelope:
//!
//! | Field       | Size | Description |
//! |-------------|------|-------------|
//! | `signature` | 1    | Always `$`. |
//! | `version`   | 1    | `M` for MSP v1. `X` marks the extended v2 format, which is not supported. |
//! | `direction` | 1    | A [`Direction`] byte. |
//! | `length`    | 1    | Size of `payload` (0–255). |
//! | `code`      | 1    | The message code (see [`codes`](crate::codes)). |
//! | `payload`   | n    | `length` bytes of payload. |
//! | `checksum`  | 1    | XOR of `length`, `code` and every payload byte. |
//!
//! Codes of 256 and above only exist in the extended format, which carries a
//! two-byte code and a two-byte length. Building a v1 frame for such a code
//! fails with [`FrameError::ExtendedCode`].

use alloc::vec::Vec;
use thiserror::Error;

use crate::{
    checksum::frame_checksum,
    decode::{Decode, DecodeError, DecodeErrorKind, take},
    encode::{Encode, MessageEncoder},
};

/// First byte of every frame.
pub const SIGNATURE: u8 = b'$';

/// Version marker of the baseline (v1) frame format.
pub const VERSION_V1: u8 = b'M';

/// Version marker of the extended (v2) frame format.
pub const VERSION_V2: u8 = b'X';

/// Size of the fixed frame preamble: signature, version, direction, length and code.
pub const PREAMBLE_SIZE: usize = 5;

/// Largest payload that fits in a v1 frame.
pub const MAX_PAYLOAD_SIZE: usize = u8::MAX as usize;

/// Which way a frame is travelling.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
#[repr(u8)]
pub enum Direction {
    /// Host to device (`<`).
    Request = b'<',
    /// Device to host (`>`).
    Response = b'>',
    /// Device reply to a code it does not support (`!`).
    Unsupported = b'!',
}

impl Decode for Direction {
    fn decode(data: &mut &[u8]) -> Result<Self, DecodeError> {
        match u8::decode(data)? {
            b'<' => Ok(Self::Request),
            b'>' => Ok(Self::Response),
            b'!' => Ok(Self::Unsupported),
            v => Err(DecodeError::new::<Self>(DecodeErrorKind::UnexpectedByte {
                name: "Direction",
                value: v,
                expected: b"<>!",
            })),
        }
    }
}

/// How checksum mismatches are handled when decoding.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ChecksumMode {
    /// Reject frames whose checksum does not validate.
    #[default]
    Strict,

    /// Accept frames whose checksum does not validate, flagging them as
    /// [corrupted](Frame::is_corrupted).
    Lenient,
}

/// Returned when a frame cannot be represented in the v1 format.
#[derive(Error, Debug, Clone, Copy, Eq, PartialEq)]
pub enum FrameError {
    #[error("Message code {0} requires the extended frame format.")]
    ExtendedCode(u16),

    #[error("Payload of {0} bytes does not fit in a v1 frame (max 255).")]
    PayloadTooLarge(usize),
}

/// The fixed-size head of a frame.
///
/// Reading a frame off a byte stream is a two step process: read
/// [`PREAMBLE_SIZE`] bytes and decode them into a [`Preamble`], then read
/// [`Preamble::body_size`] more bytes and hand them to [`Frame::from_parts`].
/// The trailing checksum byte is always part of the body, even when the
/// payload is empty.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct Preamble {
    pub direction: Direction,
    pub length: u8,
    pub code: u8,
}

impl Preamble {
    /// Number of bytes following the preamble: the payload plus the checksum.
    pub const fn body_size(&self) -> usize {
        self.length as usize + 1
    }
}

impl Decode for Preamble {
    fn decode(data: &mut &[u8]) -> Result<Self, DecodeError> {
        if u8::decode(data)? != SIGNATURE {
            return Err(DecodeError::new::<Self>(DecodeErrorKind::InvalidHeader));
        }

        match u8::decode(data)? {
            VERSION_V1 => {}
            VERSION_V2 => {
                return Err(DecodeError::new::<Self>(
                    DecodeErrorKind::UnsupportedFrameVersion,
                ));
            }
            _ => return Err(DecodeError::new::<Self>(DecodeErrorKind::InvalidHeader)),
        }

        let direction = Direction::decode(data)?;
        let length = u8::decode(data)?;
        let code = u8::decode(data)?;

        Ok(Self {
            direction,
            length,
            code,
        })
    }
}

/// A complete MSP v1 frame.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Frame {
    direction: Direction,
    code: u8,
    payload: Vec<u8>,
    checksum: u8,
    corrupted: bool,
}

impl Frame {
    /// Creates a frame, computing its checksum.
    ///
    /// # Errors
    ///
    /// Fails if `code` does not fit in one byte or if the payload is longer than
    /// [`MAX_PAYLOAD_SIZE`].
    pub fn new(direction: Direction, code: u16, payload: Option<&[u8]>) -> Result<Self, FrameError> {
        let code = u8::try_from(code).map_err(|_| FrameError::ExtendedCode(code))?;
        let payload = payload.unwrap_or_default();
        let length =
            u8::try_from(payload.len()).map_err(|_| FrameError::PayloadTooLarge(payload.len()))?;

        Ok(Self {
            direction,
            code,
            checksum: frame_checksum(length, code, payload),
            payload: payload.to_vec(),
            corrupted: false,
        })
    }

    /// Creates a host-to-device frame.
    pub fn request(code: u16, payload: Option<&[u8]>) -> Result<Self, FrameError> {
        Self::new(Direction::Request, code, payload)
    }

    /// Creates a device-to-host frame.
    pub fn response(code: u16, payload: Option<&[u8]>) -> Result<Self, FrameError> {
        Self::new(Direction::Response, code, payload)
    }

    /// Reassembles a frame from its preamble and the `length + 1` bytes that follow it.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeErrorKind::UnexpectedEnd`] if `body` is shorter than
    /// [`Preamble::body_size`], and [`DecodeErrorKind::Checksum`] if the
    /// checksum does not validate in [`ChecksumMode::Strict`].
    pub fn from_parts(
        preamble: Preamble,
        mut body: &[u8],
        mode: ChecksumMode,
    ) -> Result<Self, DecodeError> {
        let payload = take::<Self>(&mut body, preamble.length as usize)?;
        let checksum = u8::decode(&mut body)?;
        let expected = frame_checksum(preamble.length, preamble.code, payload);

        let corrupted = checksum != expected;
        if corrupted && mode == ChecksumMode::Strict {
            return Err(DecodeError::new::<Self>(DecodeErrorKind::Checksum {
                value: checksum,
                expected,
            }));
        }

        Ok(Self {
            direction: preamble.direction,
            code: preamble.code,
            payload: payload.to_vec(),
            checksum,
            corrupted,
        })
    }

    /// Decodes a whole frame from a buffer, advancing it past the frame.
    pub fn decode_with_mode(data: &mut &[u8], mode: ChecksumMode) -> Result<Self, DecodeError> {
        let preamble = Preamble::decode(data)?;
        let body = take::<Self>(data, preamble.body_size())?;
        Self::from_parts(preamble, body, mode)
    }

    pub const fn direction(&self) -> Direction {
        self.direction
    }

    pub const fn code(&self) -> u8 {
        self.code
    }

    /// The frame payload, or `None` if the frame carried zero bytes.
    pub fn payload(&self) -> Option<&[u8]> {
        if self.payload.is_empty() {
            None
        } else {
            Some(&self.payload)
        }
    }

    pub const fn checksum(&self) -> u8 {
        self.checksum
    }

    /// Whether the frame failed checksum validation and was kept anyway.
    ///
    /// Always `false` for frames decoded in [`ChecksumMode::Strict`].
    pub const fn is_corrupted(&self) -> bool {
        self.corrupted
    }
}

impl Encode for Frame {
    fn size(&self) -> usize {
        PREAMBLE_SIZE + self.payload.len() + 1
    }

    fn encode(&self, data: &mut [u8]) {
        let mut enc = MessageEncoder::new(data);

        enc.write(&[SIGNATURE, VERSION_V1, self.direction as u8]);
        enc.write(&(self.payload.len() as u8));
        enc.write(&self.code);
        enc.write(&self.payload.as_slice());
        enc.write(&self.checksum);
    }
}

impl Decode for Frame {
    fn decode(data: &mut &[u8]) -> Result<Self, DecodeError> {
        Self::decode_with_mode(data, ChecksumMode::Strict)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codes;

    #[test]
    fn variant_request() {
        let frame = Frame::request(codes::FC_VARIANT, None).unwrap();
        assert_eq!(frame.to_bytes(), b"$M<\x00\x02\x02");
    }

    #[test]
    fn select_setting_request() {
        let frame = Frame::request(codes::SELECT_SETTING, Some(&[0x01])).unwrap();
        assert_eq!(frame.to_bytes(), b"$M<\x01\xd2\x01\xd2");
    }

    #[test]
    fn variant_reply() {
        let mut data: &[u8] = b"$M>\x04\x02BTFL\x1a";
        let frame = Frame::decode(&mut data).unwrap();

        assert!(data.is_empty());
        assert_eq!(frame.direction(), Direction::Response);
        assert_eq!(frame.code(), 2);
        assert_eq!(frame.payload(), Some(&b"BTFL"[..]));
        assert!(!frame.is_corrupted());
    }

    #[test]
    fn empty_ack_still_has_checksum() {
        let mut data: &[u8] = b"$M>\x00\xd2\xd2trailing";
        let frame = Frame::decode(&mut data).unwrap();

        assert_eq!(frame.code(), codes::SELECT_SETTING as u8);
        assert_eq!(frame.payload(), None);
        assert_eq!(data, b"trailing");
    }

    #[test]
    fn truncated_body_leaves_the_preamble_consumed() {
        let mut data: &[u8] = b"$M>\x04\x02BT";
        let err = Frame::decode(&mut data).unwrap_err();

        assert_eq!(err.kind(), DecodeErrorKind::UnexpectedEnd);
        assert_eq!(data, b"BT");
    }

    #[test]
    fn any_flipped_payload_byte_fails_checksum() {
        let good = b"$M>\x04\x02BTFL\x1a";

        for index in PREAMBLE_SIZE..PREAMBLE_SIZE + 4 {
            let mut corrupt = *good;
            corrupt[index] ^= 0x10;

            let err = Frame::decode(&mut corrupt.as_slice()).unwrap_err();
            assert!(err.is_checksum(), "byte {index}: {err}");
            assert!(!err.is_framing());
        }
    }

    #[test]
    fn lenient_mode_flags_corruption() {
        let data = b"$M>\x04\x02BTFX\x1a";
        let frame = Frame::decode_with_mode(&mut data.as_slice(), ChecksumMode::Lenient).unwrap();

        assert!(frame.is_corrupted());
        assert_eq!(frame.payload(), Some(&b"BTFX"[..]));
    }

    #[test]
    fn lost_sync_is_a_framing_error() {
        let err = Frame::decode(&mut b"TFL\x1a$M>\x00".as_slice()).unwrap_err();
        assert_eq!(err.kind(), DecodeErrorKind::InvalidHeader);
        assert!(err.is_framing());

        let err = Frame::decode(&mut b"$M?\x00\x02\x02".as_slice()).unwrap_err();
        assert!(err.is_framing());
    }

    #[test]
    fn extended_format_is_reported() {
        let err = Preamble::decode(&mut b"$X<\x00\x03\x10".as_slice()).unwrap_err();
        assert_eq!(err.kind(), DecodeErrorKind::UnsupportedFrameVersion);
    }

    #[test]
    fn unbuildable_frames() {
        assert_eq!(
            Frame::request(0x1003, None),
            Err(FrameError::ExtendedCode(0x1003))
        );
        assert_eq!(
            Frame::request(codes::SET_NAME, Some(&[0; 256])),
            Err(FrameError::PayloadTooLarge(256))
        );
    }

    #[test]
    fn two_phase_read() {
        let bytes = Frame::response(codes::API_VERSION, Some(&[0, 1, 43]))
            .unwrap()
            .to_bytes();
        let (head, body) = bytes.split_at(PREAMBLE_SIZE);

        let preamble = Preamble::decode(&mut &head[..]).unwrap();
        assert_eq!(preamble.body_size(), body.len());

        let frame = Frame::from_parts(preamble, body, ChecksumMode::Strict).unwrap();
        assert_eq!(frame.payload(), Some(&[0, 1, 43][..]));
    }
}
