//! A scripted flight controller on the far end of an in-memory duplex stream.

#![allow(dead_code)]

use std::{
    collections::HashSet,
    io,
    sync::{
        atomic::{AtomicU32, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use bonfo::{
    link::{read_frame, Device},
    protocol::{
        codes, schemas, ChecksumMode, Direction, Encode, Frame, ProfileSelection,
        ProtocolVersion, Record,
    },
    BoardError, BoardSession, SessionConfig,
};
use tokio::io::{AsyncReadExt, AsyncWriteExt, DuplexStream};

pub struct Firmware {
    /// `None` makes the board reject the API version query.
    pub api_minor: Option<u8>,
    pub pid: u8,
    pub rate: u8,
    pub ignore_selects: bool,
    /// Codes the board reads but never answers.
    pub silent: HashSet<u16>,
    /// The next reply to this code has its checksum flipped.
    pub corrupt_next: Option<u16>,
    pub reply_delay: Duration,
    /// Every request received, in order.
    pub log: Vec<(u16, Vec<u8>)>,
    /// Set if a request arrived while a reply was still owed.
    pub overlapped: bool,
}

impl Default for Firmware {
    fn default() -> Self {
        Self {
            api_minor: Some(44),
            pid: 1,
            rate: 1,
            ignore_selects: false,
            silent: HashSet::new(),
            corrupt_next: None,
            reply_delay: Duration::ZERO,
            log: Vec::new(),
            overlapped: false,
        }
    }
}

impl Firmware {
    fn respond(&mut self, code: u16, payload: &[u8]) -> Option<Vec<u8>> {
        if self.silent.contains(&code) {
            return None;
        }

        let version = ProtocolVersion::V1_44;
        let body = match code {
            codes::API_VERSION => self.api_minor.map(|minor| {
                let record = Record::new()
                    .with("protocol", 0u8)
                    .with("api_major", 1u8)
                    .with("api_minor", minor);
                schemas::API_VERSION.encode(&record, version).unwrap()
            }),
            codes::FC_VARIANT => {
                let record = Record::new().with("variant", "BTFL");
                Some(schemas::FC_VARIANT.encode(&record, version).unwrap())
            }
            codes::FC_VERSION => {
                let record = Record::new()
                    .with("major", 4u8)
                    .with("minor", 5u8)
                    .with("patch", 1u8);
                Some(schemas::FC_VERSION.encode(&record, version).unwrap())
            }
            codes::NAME => {
                let record = Record::new().with("name", "whoop");
                Some(schemas::NAME.encode(&record, version).unwrap())
            }
            codes::STATUS_EX => {
                let record = Record::new()
                    .with("pid_profile", self.pid)
                    .with("rate_profile", self.rate);
                Some(schemas::STATUS_EX.encode(&record, version).unwrap())
            }
            codes::SELECT_SETTING => {
                if !self.ignore_selects {
                    match ProfileSelection::from_byte(payload[0]).unwrap() {
                        ProfileSelection::Pid(pid) => self.pid = pid,
                        ProfileSelection::Rate(rate) => self.rate = rate,
                    }
                }
                Some(Vec::new())
            }
            codes::COPY_PROFILE | codes::EEPROM_WRITE => Some(Vec::new()),
            _ => None,
        };

        let frame = match &body {
            Some(body) => Frame::response(code, (!body.is_empty()).then_some(body.as_slice())),
            None => Frame::new(Direction::Unsupported, code, None),
        }
        .unwrap();

        let mut bytes = frame.to_bytes();
        if self.corrupt_next == Some(code) {
            self.corrupt_next = None;
            *bytes.last_mut().unwrap() ^= 0xFF;
        }

        Some(bytes)
    }

    /// Requests received with the given code.
    pub fn requests(&self, code: u16) -> Vec<Vec<u8>> {
        self.log
            .iter()
            .filter(|(c, _)| *c == code)
            .map(|(_, payload)| payload.clone())
            .collect()
    }
}

async fn serve(stream: DuplexStream, firmware: Arc<Mutex<Firmware>>) {
    let (mut rx, mut tx) = tokio::io::split(stream);

    loop {
        let Ok(request) = read_frame(&mut rx, ChecksumMode::Strict).await else {
            return;
        };
        let code = u16::from(request.code());
        let payload = request.payload().unwrap_or_default().to_vec();

        let delay = {
            let mut firmware = firmware.lock().unwrap();
            firmware.log.push((code, payload.clone()));
            firmware.reply_delay
        };

        if !delay.is_zero() {
            let mut byte = [0u8];
            if let Ok(Ok(1..)) = tokio::time::timeout(delay, rx.read(&mut byte)).await {
                firmware.lock().unwrap().overlapped = true;
                return;
            }
        }

        let reply = firmware.lock().unwrap().respond(code, &payload);
        if let Some(reply) = reply {
            if tx.write_all(&reply).await.is_err() {
                return;
            }
        }
    }
}

pub struct FakeBoard {
    pub firmware: Arc<Mutex<Firmware>>,
    /// Number of opens that fail before one succeeds.
    pub failures: AtomicU32,
    pub opens: Arc<AtomicU32>,
}

impl FakeBoard {
    pub fn new(firmware: Firmware) -> Self {
        Self {
            firmware: Arc::new(Mutex::new(firmware)),
            failures: AtomicU32::new(0),
            opens: Arc::new(AtomicU32::new(0)),
        }
    }

    pub fn failing(mut self, failures: u32) -> Self {
        self.failures = AtomicU32::new(failures);
        self
    }
}

impl Device for FakeBoard {
    type Stream = DuplexStream;

    async fn open(&self) -> Result<DuplexStream, BoardError> {
        self.opens.fetch_add(1, Ordering::SeqCst);

        let remaining = self.failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failures.store(remaining - 1, Ordering::SeqCst);
            return Err(io::Error::new(io::ErrorKind::NotFound, "no such device").into());
        }

        let (client, board) = tokio::io::duplex(1024);
        tokio::spawn(serve(board, Arc::clone(&self.firmware)));
        Ok(client)
    }
}

pub fn config() -> SessionConfig {
    SessionConfig::new("fake")
        .with_trials(3)
        .with_retry_delay(Duration::from_millis(1))
}

/// Starts a session and returns handles to inspect the board with.
pub fn start(
    board: FakeBoard,
    config: SessionConfig,
) -> (BoardSession<FakeBoard>, Arc<Mutex<Firmware>>, Arc<AtomicU32>) {
    let firmware = Arc::clone(&board.firmware);
    let opens = Arc::clone(&board.opens);
    (BoardSession::new(board, config), firmware, opens)
}

/// A session that has finished bring-up, with the bring-up traffic cleared.
pub async fn ready(firmware: Firmware) -> (BoardSession<FakeBoard>, Arc<Mutex<Firmware>>) {
    let (session, firmware, _) = start(FakeBoard::new(firmware), config());
    session.wait_ready().await.unwrap();
    firmware.lock().unwrap().log.clear();
    (session, firmware)
}
