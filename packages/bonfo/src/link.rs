//! The byte stream a session talks over.

use std::future::Future;

use bonfo_msp::{
    ChecksumMode, Decode, Encode, Frame, Preamble,
    frame::PREAMBLE_SIZE,
};
use log::{error, trace};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::BoardError;

/// Something that can be opened into a duplex byte stream to a flight controller.
///
/// A session may open its device more than once: after a failed attempt and on
/// every reconnect.
pub trait Device: Send + Sync + 'static {
    type Stream: AsyncRead + AsyncWrite + Send + Unpin + 'static;

    /// Opens a fresh stream to the device.
    fn open(&self) -> impl Future<Output = Result<Self::Stream, BoardError>> + Send;
}

/// Writes one frame and flushes it.
pub async fn write_frame<W: AsyncWrite + Unpin>(
    writer: &mut W,
    frame: &Frame,
) -> Result<(), BoardError> {
    let encoded = frame.to_bytes();
    trace!("sent frame: {:x?}", encoded);

    writer.write_all(&encoded).await?;
    writer.flush().await?;

    Ok(())
}

/// Reads exactly one frame.
///
/// The preamble is read first to learn the payload length, then the payload
/// and checksum. Bytes are never skipped looking for a signature. A bad
/// preamble is returned as [`BoardError::Framing`].
pub async fn read_frame<R: AsyncRead + Unpin>(
    reader: &mut R,
    mode: ChecksumMode,
) -> Result<Frame, BoardError> {
    let mut header = [0u8; PREAMBLE_SIZE];
    reader.read_exact(&mut header).await?;

    let preamble = Preamble::decode(&mut header.as_slice())?;

    let mut body = vec![0; preamble.body_size()];
    reader.read_exact(&mut body).await?;

    trace!("received frame: {:x?} {:x?}", header, body);

    let frame = Frame::from_parts(preamble, &body, mode)?;
    if frame.is_corrupted() {
        error!(
            "Accepting reply to code {} with a bad checksum ({:x})",
            frame.code(),
            frame.checksum()
        );
    }

    Ok(frame)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bonfo_msp::{DecodeErrorKind, Direction};

    #[tokio::test]
    async fn reads_one_frame_at_a_time() {
        let mut data: &[u8] = b"$M>\x00\xd2\xd2$M>\x04\x02BTFL\x1a";

        let ack = read_frame(&mut data, ChecksumMode::Strict).await.unwrap();
        assert_eq!(ack.code(), 210);
        assert_eq!(ack.payload(), None);

        let variant = read_frame(&mut data, ChecksumMode::Strict).await.unwrap();
        assert_eq!(variant.direction(), Direction::Response);
        assert_eq!(variant.payload(), Some(&b"BTFL"[..]));
        assert!(data.is_empty());
    }

    #[tokio::test]
    async fn checksum_failures_consume_the_frame() {
        let mut data: &[u8] = b"$M>\x04\x02BTFX\x1a$M>\x00\xd2\xd2";

        let err = read_frame(&mut data, ChecksumMode::Strict).await.unwrap_err();
        assert!(matches!(err, BoardError::Checksum(_)));

        // The next frame is still readable.
        assert!(read_frame(&mut data, ChecksumMode::Strict).await.is_ok());
    }

    #[tokio::test]
    async fn bad_signature_is_a_framing_error() {
        let mut data: &[u8] = b"FL\x1a$M>\x00\xd2\xd2";

        match read_frame(&mut data, ChecksumMode::Strict).await {
            Err(BoardError::Framing(err)) => {
                assert_eq!(err.kind(), DecodeErrorKind::InvalidHeader)
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn truncated_stream() {
        let mut data: &[u8] = b"$M>\x04\x02BT";

        let err = read_frame(&mut data, ChecksumMode::Strict).await.unwrap_err();
        assert!(matches!(err, BoardError::Io(_)));
    }

    #[tokio::test]
    async fn writes_whole_frames() {
        let mut out = Vec::new();
        let frame = Frame::request(bonfo_msp::codes::FC_VARIANT, None).unwrap();

        write_frame(&mut out, &frame).await.unwrap();
        assert_eq!(out, b"$M<\x00\x02\x02");
    }
}
