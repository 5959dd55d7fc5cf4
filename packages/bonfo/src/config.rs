use std::time::Duration;

use bonfo_msp::ChecksumMode;

/// Baud rate used by flight controllers' USB VCP ports.
pub const DEFAULT_BAUD_RATE: u32 = 115200;

/// Number of times the link is opened before giving up.
pub const DEFAULT_TRIALS: u32 = 100;

pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(500);

pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_millis(100);

/// Settings for a [`BoardSession`](crate::session::BoardSession).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SessionConfig {
    /// Path of the serial device, e.g. `/dev/ttyACM0`.
    pub device: String,
    pub baud_rate: u32,
    /// How many times to try opening the link. Zero is treated as one.
    pub trials: u32,
    /// Delay between failed attempts to open the link.
    pub retry_delay: Duration,
    /// Serial port read timeout.
    pub read_timeout: Duration,
    pub checksum_mode: ChecksumMode,
    /// Query the device's identity and active profiles before signalling ready.
    pub initial_data: bool,
}

impl SessionConfig {
    pub fn new(device: impl Into<String>) -> Self {
        Self {
            device: device.into(),
            ..Default::default()
        }
    }

    pub fn with_baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }

    pub fn with_trials(mut self, trials: u32) -> Self {
        self.trials = trials;
        self
    }

    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    pub fn with_read_timeout(mut self, read_timeout: Duration) -> Self {
        self.read_timeout = read_timeout;
        self
    }

    pub fn with_checksum_mode(mut self, checksum_mode: ChecksumMode) -> Self {
        self.checksum_mode = checksum_mode;
        self
    }

    pub fn with_initial_data(mut self, initial_data: bool) -> Self {
        self.initial_data = initial_data;
        self
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            device: String::new(),
            baud_rate: DEFAULT_BAUD_RATE,
            trials: DEFAULT_TRIALS,
            retry_delay: DEFAULT_RETRY_DELAY,
            read_timeout: DEFAULT_READ_TIMEOUT,
            checksum_mode: ChecksumMode::Strict,
            initial_data: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder() {
        let config = SessionConfig::new("/dev/ttyACM0")
            .with_trials(3)
            .with_checksum_mode(ChecksumMode::Lenient);

        assert_eq!(config.device, "/dev/ttyACM0");
        assert_eq!(config.trials, 3);
        assert_eq!(config.baud_rate, DEFAULT_BAUD_RATE);
        assert_eq!(config.retry_delay, Duration::from_millis(500));
        assert_eq!(config.checksum_mode, ChecksumMode::Lenient);
        assert!(config.initial_data);
    }
}
