//! A connection to one flight controller.

use std::{
    future::Future,
    sync::{Arc, Mutex as StdMutex, OnceLock},
    time::Duration,
};

use bonfo_msp::{
    Access, Direction, Frame, ProfileKind, ProfileSelection, Profiles, ProtocolVersion, Record,
    Registry, RegistryError, Schema,
    schemas::{self, ApiVersion, BoardInfo, BuildInfo, FcVariant, FcVersion, Uid},
};
use log::{debug, error, info, warn};
use tokio::{
    io::{ReadHalf, WriteHalf},
    sync::{Mutex, watch},
    task::JoinHandle,
    time::sleep,
};

use crate::{
    BoardError,
    config::SessionConfig,
    link::{Device, read_frame, write_frame},
    profile::{ProfileLink, ProfileScope, ProfileSelector},
};

/// What the device told us about itself during bring-up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub api_version: ProtocolVersion,
    pub variant: Option<FcVariant>,
    pub firmware: Option<FcVersion>,
    pub build: Option<BuildInfo>,
    pub board: Option<BoardInfo>,
    pub uid: Option<Uid>,
    /// The craft name.
    pub name: Option<String>,
}

/// A decoded reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub code: u16,
    pub record: Record,
    /// Set when the reply failed its checksum and was accepted in lenient mode.
    pub corrupted: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Failure {
    Unconnected(u32),
    BringUp(String),
    Disconnected,
}

impl From<&Failure> for BoardError {
    fn from(failure: &Failure) -> Self {
        match failure {
            Failure::Unconnected(trials) => BoardError::Unconnected(*trials),
            Failure::BringUp(reason) => BoardError::BringUp(reason.clone()),
            Failure::Disconnected => BoardError::NotConnected,
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
struct Signals {
    connected: bool,
    ready: bool,
    failure: Option<Failure>,
}

struct Inner<D: Device> {
    device: D,
    config: SessionConfig,
    registry: Registry,

    /// Held for a whole request/response exchange.
    exchange: Mutex<()>,
    writer: Mutex<Option<WriteHalf<D::Stream>>>,
    reader: Mutex<Option<ReadHalf<D::Stream>>>,

    version: OnceLock<ProtocolVersion>,
    identity: OnceLock<Identity>,
    profile: Mutex<ProfileSelector>,

    signals: watch::Sender<Signals>,
    bring_up: StdMutex<Option<JoinHandle<()>>>,
}

/// A session with one flight controller.
///
/// Creating a session starts a background task that opens the link and, if
/// [`SessionConfig::initial_data`] is set, queries the device's identity and
/// active profiles. [`BoardSession::wait_connected`] and
/// [`BoardSession::wait_ready`] wait for the two stages.
///
/// Only one request/response exchange is on the wire at a time. Sessions are
/// cheap to clone and every clone shares the same link.
pub struct BoardSession<D: Device> {
    inner: Arc<Inner<D>>,
}

impl<D: Device> Clone for BoardSession<D> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

#[cfg(feature = "serial")]
impl BoardSession<crate::serial::SerialDevice> {
    /// Starts a session with the serial device named in `config`.
    pub fn serial(config: SessionConfig) -> Self {
        Self::new(crate::serial::SerialDevice::from_config(&config), config)
    }
}

impl<D: Device> BoardSession<D> {
    /// Creates a session and starts bringing it up in the background.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a Tokio runtime.
    pub fn new(device: D, config: SessionConfig) -> Self {
        let (signals, _) = watch::channel(Signals::default());
        let session = Self {
            inner: Arc::new(Inner {
                device,
                config,
                registry: Registry::standard(),
                exchange: Mutex::new(()),
                writer: Mutex::new(None),
                reader: Mutex::new(None),
                version: OnceLock::new(),
                identity: OnceLock::new(),
                profile: Mutex::new(ProfileSelector::new()),
                signals,
                bring_up: StdMutex::new(None),
            }),
        };

        let task = tokio::spawn(session.clone().bring_up());
        if let Ok(mut slot) = session.inner.bring_up.lock() {
            *slot = Some(task);
        }

        session
    }

    pub fn config(&self) -> &SessionConfig {
        &self.inner.config
    }

    pub fn registry(&self) -> &Registry {
        &self.inner.registry
    }

    async fn bring_up(self) {
        let trials = self.inner.config.trials.max(1);
        if let Err(err) = self.open_link(trials).await {
            error!("Giving up on {}: {err}", self.inner.config.device);
            self.inner
                .signals
                .send_modify(|s| s.failure = Some(Failure::Unconnected(trials)));
            return;
        }

        self.initialize().await;
    }

    /// Runs the identity queries, then signals ready.
    async fn initialize(self) {
        if self.inner.config.initial_data {
            match self.fetch_identity().await {
                Ok(identity) => {
                    info!(
                        "Connected to {} (API {})",
                        identity
                            .variant
                            .as_ref()
                            .map_or("unknown firmware", |v| v.0.as_str()),
                        identity.api_version
                    );
                    _ = self.inner.identity.set(identity);
                }
                Err(err) => {
                    error!("Identity bring-up failed: {err}");
                    self.inner
                        .signals
                        .send_modify(|s| s.failure = Some(Failure::BringUp(err.to_string())));
                    return;
                }
            }

            match self.fetch_profiles().await {
                Ok(profiles) => self.inner.profile.lock().await.observe(profiles),
                Err(err) => warn!("Could not fetch the active profiles: {err}"),
            }
        }

        debug!("Session ready");
        self.inner.signals.send_modify(|s| s.ready = true);
    }

    /// Opens the device, retrying up to `trials` times.
    async fn open_link(&self, trials: u32) -> Result<(), BoardError> {
        for attempt in 1..=trials {
            match self.inner.device.open().await {
                Ok(stream) => {
                    let (reader, writer) = tokio::io::split(stream);
                    *self.inner.reader.lock().await = Some(reader);
                    *self.inner.writer.lock().await = Some(writer);

                    info!("Opened {}", self.inner.config.device);
                    self.inner.signals.send_modify(|s| {
                        s.connected = true;
                        s.failure = None;
                    });
                    return Ok(());
                }
                Err(err) => {
                    warn!(
                        "Unable to open {} (attempt {attempt}/{trials}): {err}",
                        self.inner.config.device
                    );
                    if attempt < trials {
                        sleep(self.inner.config.retry_delay).await;
                    }
                }
            }
        }

        Err(BoardError::Unconnected(trials))
    }

    async fn fetch_identity(&self) -> Result<Identity, BoardError> {
        let reply = self.get(&schemas::API_VERSION).await?;
        if reply.corrupted {
            return Err(BoardError::CorruptReply(reply.code));
        }
        let api_version = ProtocolVersion::from(ApiVersion::try_from(&reply.record)?);

        if self.inner.version.set(api_version).is_err() {
            debug!("API version already negotiated");
        }
        debug!("Negotiated API version {api_version}");

        let variant = self.query(&schemas::FC_VARIANT).await;
        let firmware = self.query(&schemas::FC_VERSION).await;
        let build = self.query(&schemas::BUILD_INFO).await;
        let board = self.query(&schemas::BOARD_INFO).await;
        let uid = self.query(&schemas::UID).await;
        let name = self.query(&schemas::NAME).await;

        Ok(Identity {
            api_version,
            variant: view(&schemas::FC_VARIANT, variant),
            firmware: view(&schemas::FC_VERSION, firmware),
            build: view(&schemas::BUILD_INFO, build),
            board: view(&schemas::BOARD_INFO, board),
            uid: view(&schemas::UID, uid),
            name: name.and_then(|record| record.require("name").ok()),
        })
    }

    /// Reads a schema, logging failures.
    async fn query(&self, schema: &Schema) -> Option<Record> {
        self.get(schema)
            .await
            .inspect_err(|err| warn!("Could not read {}: {err}", schema.name))
            .ok()
            .map(|reply| reply.record)
    }

    pub fn is_connected(&self) -> bool {
        self.inner.signals.borrow().connected
    }

    pub fn is_ready(&self) -> bool {
        self.inner.signals.borrow().ready
    }

    /// Waits until the link has been opened.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::Unconnected`] if every attempt to open the link failed.
    pub async fn wait_connected(&self) -> Result<(), BoardError> {
        self.wait_for(|s| s.connected).await
    }

    /// Waits until the link is open and the identity queries have completed.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError::Unconnected`] if the link could not be opened and
    /// [`BoardError::BringUp`] if the device's API version could not be read.
    pub async fn wait_ready(&self) -> Result<(), BoardError> {
        self.wait_for(|s| s.ready).await
    }

    async fn wait_for(&self, done: impl Fn(&Signals) -> bool) -> Result<(), BoardError> {
        let mut signals = self.inner.signals.subscribe();
        let signals = signals
            .wait_for(|s| done(s) || s.failure.is_some())
            .await
            .map_err(|_| BoardError::NotConnected)?;

        match &signals.failure {
            Some(failure) if !done(&signals) => Err(failure.into()),
            _ => Ok(()),
        }
    }

    /// The API version payloads are encoded for.
    ///
    /// Before bring-up completes this is [`ProtocolVersion::MAX_SUPPORTED`].
    pub fn version(&self) -> ProtocolVersion {
        self.negotiated_version()
            .unwrap_or(ProtocolVersion::MAX_SUPPORTED)
    }

    /// The API version the device reported, if it has been read yet.
    pub fn negotiated_version(&self) -> Option<ProtocolVersion> {
        self.inner.version.get().copied()
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.inner.identity.get()
    }

    fn request_frame(&self, code: u16, record: Option<&Record>) -> Result<Frame, BoardError> {
        let schema = self.inner.registry.schema(code)?;
        let payload = record
            .map(|record| schema.encode(record, self.version()))
            .transpose()?;

        Ok(Frame::request(code, payload.as_deref())?)
    }

    async fn write(&self, frame: &Frame) -> Result<(), BoardError> {
        let mut writer = self.inner.writer.lock().await;
        let writer = writer.as_mut().ok_or(BoardError::NotConnected)?;
        write_frame(writer, frame).await
    }

    async fn read(&self) -> Result<Frame, BoardError> {
        let mut reader = self.inner.reader.lock().await;
        let reader = reader.as_mut().ok_or(BoardError::NotConnected)?;
        read_frame(reader, self.inner.config.checksum_mode).await
    }

    /// Sends a message without waiting for a reply.
    pub async fn send(&self, code: u16, record: Option<&Record>) -> Result<(), BoardError> {
        let frame = self.request_frame(code, record)?;
        debug!("Sending code {code}");
        self.write(&frame).await
    }

    /// Sends a message and reads the reply.
    ///
    /// Nothing else is written to the link between this request and its
    /// reply. A checksum or framing error is returned to the caller and the
    /// link is left for the next exchange. After a framing error the stream
    /// position is unknown and [`BoardSession::reconnect`] should be called.
    pub async fn request(&self, code: u16, record: Option<&Record>) -> Result<Reply, BoardError> {
        let frame = self.request_frame(code, record)?;

        let reply = {
            let _exchange = self.inner.exchange.lock().await;
            debug!("Requesting code {code}");

            self.write(&frame).await?;
            self.read().await?
        };

        self.decode_reply(code, reply)
    }

    /// Like [`BoardSession::request`], but gives up after `timeout`.
    ///
    /// A reply may still arrive after the deadline, so the link is reset
    /// before returning [`BoardError::Timeout`].
    pub async fn request_within(
        &self,
        code: u16,
        record: Option<&Record>,
        timeout: Duration,
    ) -> Result<Reply, BoardError> {
        match tokio::time::timeout(timeout, self.request(code, record)).await {
            Ok(result) => result,
            Err(_) => {
                warn!("No reply to code {code} within {timeout:?}, resetting the link");
                if let Err(err) = self.reconnect().await {
                    error!("Reconnect after timeout failed: {err}");
                }
                Err(BoardError::Timeout)
            }
        }
    }

    fn decode_reply(&self, code: u16, frame: Frame) -> Result<Reply, BoardError> {
        match frame.direction() {
            Direction::Response => {}
            Direction::Unsupported => return Err(BoardError::Unsupported(code)),
            direction => return Err(BoardError::UnexpectedDirection(direction)),
        }

        let found = u16::from(frame.code());
        if found != code {
            return Err(BoardError::CodeMismatch {
                expected: code,
                found,
            });
        }

        let record = match frame.payload() {
            Some(payload) => self.inner.registry.decode(code, payload, self.version())?,
            None => Record::new(),
        };

        Ok(Reply {
            code,
            record,
            corrupted: frame.is_corrupted(),
        })
    }

    /// Reads a schema from the device.
    ///
    /// In [`ChecksumMode::Lenient`](bonfo_msp::ChecksumMode::Lenient) check
    /// [`Reply::corrupted`] before trusting the record.
    ///
    /// # Errors
    ///
    /// Fails with a [`RegistryError::Direction`] before any I/O if the schema
    /// cannot be read.
    pub async fn get(&self, schema: &Schema) -> Result<Reply, BoardError> {
        let code = schema.code_for(Access::Read)?;
        self.request(code, None).await
    }

    /// Writes a schema to the device and returns its acknowledgement.
    ///
    /// # Errors
    ///
    /// Fails with a [`RegistryError::Direction`] before any I/O if the schema
    /// cannot be written.
    pub async fn set(&self, schema: &Schema, record: &Record) -> Result<Reply, BoardError> {
        let code = schema.code_for(Access::Write)?;
        self.request(code, Some(record)).await
    }

    /// Persists the device's settings to EEPROM.
    pub async fn save(&self) -> Result<(), BoardError> {
        info!("Saving settings to EEPROM");
        self.set(&schemas::EEPROM_WRITE, &Record::new()).await?;
        Ok(())
    }

    /// Copies profile `source` over profile `destination`. Both are one-based.
    pub async fn copy_profile(
        &self,
        kind: ProfileKind,
        source: i32,
        destination: i32,
    ) -> Result<(), BoardError> {
        let source = kind.check(source)?;
        let destination = kind.check(destination)?;

        let record = Record::new()
            .with(
                "kind",
                match kind {
                    ProfileKind::Pid => 0u8,
                    ProfileKind::Rate => 1u8,
                },
            )
            .with("destination", destination)
            .with("source", source);

        debug!("Copying {kind} profile {source} to {destination}");
        self.set(&schemas::COPY_PROFILE, &record).await?;
        Ok(())
    }

    /// Closes the link.
    ///
    /// Waits for an exchange in progress to finish first.
    pub async fn disconnect(&self) {
        if let Some(task) = self.inner.bring_up.lock().ok().and_then(|mut t| t.take()) {
            task.abort();
        }

        let _exchange = self.inner.exchange.lock().await;
        self.close().await;
        self.inner
            .signals
            .send_modify(|s| s.failure = Some(Failure::Disconnected));
        info!("Disconnected from {}", self.inner.config.device);
    }

    async fn close(&self) {
        *self.inner.writer.lock().await = None;
        *self.inner.reader.lock().await = None;
        self.inner.signals.send_modify(|s| s.connected = false);
    }

    /// Closes and reopens the link.
    ///
    /// This is the only way to recover from a framing error or a timed out
    /// request. Bring-up is only repeated if it never finished.
    pub async fn reconnect(&self) -> Result<(), BoardError> {
        let _exchange = self.inner.exchange.lock().await;

        self.close().await;
        debug!("Reconnecting to {}", self.inner.config.device);

        let trials = self.inner.config.trials.max(1);
        if let Err(err) = self.open_link(trials).await {
            self.inner
                .signals
                .send_modify(|s| s.failure = Some(Failure::Unconnected(trials)));
            return Err(err);
        }

        if !self.is_ready() {
            debug!("Resuming bring-up");
            let task = tokio::spawn(self.clone().initialize());
            if let Ok(mut slot) = self.inner.bring_up.lock() {
                if let Some(previous) = slot.replace(task) {
                    previous.abort();
                }
            }
        }

        Ok(())
    }

    /// Queries the profiles the device has selected.
    ///
    /// Corrupt replies accepted in lenient mode are refused here, as are
    /// profile numbers outside the valid ranges.
    pub async fn fetch_profiles(&self) -> Result<Profiles, BoardError> {
        let reply = self.get(&schemas::STATUS_EX).await?;
        if reply.corrupted {
            return Err(BoardError::CorruptReply(reply.code));
        }

        let reported = Profiles::try_from(&reply.record)?;
        Ok(Profiles::new(reported.pid.into(), reported.rate.into())?)
    }

    /// A snapshot of the profile selector.
    pub async fn profiles(&self) -> ProfileSelector {
        self.inner.profile.lock().await.clone()
    }

    /// Stages a PID profile switch. See [`BoardSession::apply_profiles`].
    pub async fn set_pid(&self, pid: i32) -> Result<(), BoardError> {
        Ok(self.inner.profile.lock().await.set_pid(pid)?)
    }

    /// Stages a rate profile switch. See [`BoardSession::apply_profiles`].
    pub async fn set_rate(&self, rate: i32) -> Result<(), BoardError> {
        Ok(self.inner.profile.lock().await.set_rate(rate)?)
    }

    /// Sends staged profile switches. See [`ProfileSelector::apply_changes`].
    pub async fn apply_profiles(&self) -> Result<bool, BoardError> {
        let mut selector = self.inner.profile.lock().await;
        selector.apply_changes(self).await
    }

    /// Re-reads the active profiles from the device.
    pub async fn refresh_profiles(&self) -> Result<Profiles, BoardError> {
        let mut selector = self.inner.profile.lock().await;
        selector.refresh(self).await
    }

    /// Runs `body` with the given profiles selected.
    ///
    /// Waits for the session to be ready, then switches to `pid` and `rate`
    /// (either may be `None` to leave it alone) before calling `body`. If
    /// `revert_on_exit` is set the previous profiles are restored afterwards,
    /// whether or not `body` succeeded. An error from `body` takes precedence
    /// over one from restoring.
    pub async fn with_profile<F, Fut, T>(
        &self,
        pid: Option<i32>,
        rate: Option<i32>,
        revert_on_exit: bool,
        body: F,
    ) -> Result<T, BoardError>
    where
        F: FnOnce(BoardSession<D>) -> Fut,
        Fut: Future<Output = Result<T, BoardError>>,
    {
        self.wait_ready().await?;

        let scope = {
            let mut selector = self.inner.profile.lock().await;
            ProfileScope::enter(&mut selector, self, pid, rate, revert_on_exit).await?
        };

        let result = body(self.clone()).await;

        let restored = {
            let mut selector = self.inner.profile.lock().await;
            scope.exit(&mut selector, self).await
        };

        match (result, restored) {
            (Ok(value), Ok(_)) => Ok(value),
            (Ok(_), Err(err)) => Err(err),
            (Err(err), Ok(_)) => Err(err),
            (Err(err), Err(restore_err)) => {
                error!("Could not restore profiles: {restore_err}");
                Err(err)
            }
        }
    }
}

/// Converts a record into its typed view, logging failures.
fn view<T>(schema: &Schema, record: Option<Record>) -> Option<T>
where
    T: for<'a> TryFrom<&'a Record, Error = RegistryError>,
{
    T::try_from(&record?)
        .inspect_err(|err| warn!("Unexpected {} reply: {err}", schema.name))
        .ok()
}

impl<D: Device> ProfileLink for BoardSession<D> {
    type Error = BoardError;

    async fn select(&self, selection: ProfileSelection) -> Result<(), BoardError> {
        self.set(&schemas::SELECT_SETTING, &selection.to_record()?)
            .await?;
        Ok(())
    }

    async fn fetch_profiles(&self) -> Result<Profiles, BoardError> {
        BoardSession::fetch_profiles(self).await
    }
}
