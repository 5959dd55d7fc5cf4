//! Crate for configuring and querying MSP flight controllers such as Betaflight boards.
//!
//! A [`BoardSession`] owns the link to one flight controller. It brings the link
//! up in the background, serializes request/response exchanges, and tracks the
//! device's active PID and rate profiles. Message framing and payload layouts
//! live in the [`protocol`] crate.
//!
//! ```no_run
//! # async fn run() -> Result<(), bonfo::BoardError> {
//! use bonfo::{protocol::schemas, BoardSession, SessionConfig};
//!
//! let session = BoardSession::serial(SessionConfig::new("/dev/ttyACM0"));
//! session.wait_ready().await?;
//!
//! let tuning = session.get(&schemas::RC_TUNING).await?;
//! println!("{:?}", tuning.record.get("rc_rate"));
//! # Ok(())
//! # }
//! ```

pub use bonfo_msp as protocol;

pub mod config;
pub mod error;
pub mod link;
pub mod profile;
#[cfg(feature = "serial")]
pub mod serial;
pub mod session;

pub use config::SessionConfig;
pub use error::BoardError;
pub use link::Device;
pub use profile::{ProfileLink, ProfileScope, ProfileSelector, SyncState};
#[cfg(feature = "serial")]
pub use serial::SerialDevice;
pub use session::{BoardSession, Identity, Reply};
