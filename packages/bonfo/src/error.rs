use bonfo_msp::{DecodeError, Direction, FrameError, ProfileRangeError, RegistryError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BoardError {
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "serial")]
    #[error("Serialport Error: {0}")]
    Serial(#[from] tokio_serial::Error),

    /// The reader no longer knows where frames start. Only a reconnect recovers from this.
    #[error("Lost frame synchronization: {0}")]
    Framing(DecodeError),

    /// A well-framed reply failed its checksum. The link is still usable.
    #[error("Corrupt frame: {0}")]
    Checksum(DecodeError),

    #[error(transparent)]
    Frame(#[from] FrameError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Range(#[from] ProfileRangeError),

    /// A lenient-mode reply failed its checksum where the data has to be trusted.
    #[error("Reply to message code {0} failed its checksum")]
    CorruptReply(u16),

    #[error("Device does not support message code {0}")]
    Unsupported(u16),

    #[error("Expected a reply to message code {expected}, got one for {found}")]
    CodeMismatch { expected: u16, found: u16 },

    #[error("Unexpected {0:?} frame from device")]
    UnexpectedDirection(Direction),

    #[error("The link is not open")]
    NotConnected,

    #[error("Could not open the link after {0} attempts")]
    Unconnected(u32),

    #[error("Identity bring-up failed: {0}")]
    BringUp(String),

    #[error("Timed out waiting for a reply")]
    Timeout,
}

impl From<DecodeError> for BoardError {
    fn from(err: DecodeError) -> Self {
        if err.is_checksum() {
            Self::Checksum(err)
        } else {
            Self::Framing(err)
        }
    }
}
