//! Flight controllers connected over a USB virtual COM port or a UART adapter.

use std::time::Duration;

use log::debug;
use tokio_serial::{DataBits, FlowControl, Parity, SerialStream, StopBits};

use crate::{BoardError, config::SessionConfig, link::Device};

/// A serial port a flight controller is attached to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialDevice {
    path: String,
    baud_rate: u32,
    timeout: Duration,
}

impl SerialDevice {
    pub fn new(path: impl Into<String>, baud_rate: u32, timeout: Duration) -> Self {
        Self {
            path: path.into(),
            baud_rate,
            timeout,
        }
    }

    pub fn from_config(config: &SessionConfig) -> Self {
        Self::new(&config.device, config.baud_rate, config.read_timeout)
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

impl Device for SerialDevice {
    type Stream = SerialStream;

    /// Opens the port as 8N1 without flow control.
    async fn open(&self) -> Result<SerialStream, BoardError> {
        debug!("Opening serial port {} at {} baud", self.path, self.baud_rate);

        let stream = SerialStream::open(
            &tokio_serial::new(&self.path, self.baud_rate)
                .data_bits(DataBits::Eight)
                .parity(Parity::None)
                .stop_bits(StopBits::One)
                .flow_control(FlowControl::None)
                .timeout(self.timeout),
        )?;

        Ok(stream)
    }
}
