//! Update poller.

use super::check::{CheckError, CheckOutcome, UpdateInfo, check_for_update};
use super::config::{Config, ConfigError};
use super::download::{BlockDownloader, DownloadError, DownloadReport};
use super::identity::DeviceIdentity;
use super::listener::{ListenerError, Listeners, MAX_LISTENERS, UpdateListener};
use crate::network::Connect;
use crate::network::application::http::Client;
use crate::storage::ota::OtaStorage;
use crate::system::{Clock, Delay};

/// What one call to [`Agent::iterate`] or [`Agent::check_now`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cycle {
    /// The poll period has not elapsed yet.
    NotDue,
    /// The HTTP client could not be initialized; retried next period.
    ClientUnavailable,
    /// The running image is current.
    UpToDate,
    /// The check failed; retried next period.
    CheckFailed(CheckError),
    /// An update is available but automatic updates are disabled.
    Declined(UpdateInfo),
    /// The download failed; the device keeps its current image.
    DownloadFailed(DownloadError),
    /// The image was committed and the reboot requested.
    Updated(DownloadReport),
}

/// The firmware-update agent.
///
/// Owns everything a cycle touches: identity, listener table, HTTP client,
/// storage backend and the block buffer. Every operation takes `&mut self`,
/// so at most one check or download is ever in flight.
pub struct Agent<'a, N, S, C, D, const L: usize = MAX_LISTENERS>
where
    N: Connect,
    S: OtaStorage,
    C: Clock,
    D: Delay,
{
    config: Config<'a>,
    identity: DeviceIdentity,
    listeners: Listeners<'a, L>,
    client: Client<N>,
    storage: S,
    clock: C,
    delay: D,
    downloader: BlockDownloader,
    last_check_ms: u64,
}

impl<N, S, C, D, const L: usize> core::fmt::Debug for Agent<'_, N, S, C, D, L>
where
    N: Connect,
    S: OtaStorage,
    C: Clock,
    D: Delay,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Agent")
            .field("config", &self.config)
            .field("identity", &self.identity)
            .field("listeners", &self.listeners)
            .field("client", &self.client)
            .field("last_check_ms", &self.last_check_ms)
            .finish()
    }
}

impl<'a, N, S, C, D, const L: usize> Agent<'a, N, S, C, D, L>
where
    N: Connect,
    S: OtaStorage,
    C: Clock,
    D: Delay,
{
    /// Creates the agent. The poll period starts counting now; the HTTP
    /// client is initialized on the first cycle.
    pub fn new(
        config: Config<'a>,
        identity: DeviceIdentity,
        connector: N,
        storage: S,
        clock: C,
        delay: D,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let client = Client::new(connector, config.hostname, config.port)
            .map_err(|_| ConfigError::InvalidHostname)?;
        let last_check_ms = clock.now_ms();

        info!(
            "ota: agent for firmware {} polling {}:{} every {} ms",
            identity.firmware_uuid(),
            config.hostname,
            config.port,
            config.poll_period_ms
        );

        Ok(Self {
            config,
            identity,
            listeners: Listeners::new(),
            client,
            storage,
            clock,
            delay,
            downloader: BlockDownloader::new(),
            last_check_ms,
        })
    }

    /// Adds a listener; listeners are called in registration order.
    pub fn register_listener(&mut self, listener: &'a dyn UpdateListener) -> Result<(), ListenerError> {
        self.listeners.register(listener)
    }

    /// Runs a cycle if the poll period has elapsed, otherwise returns
    /// [`Cycle::NotDue`] immediately.
    pub fn iterate(&mut self) -> Cycle {
        let now = self.clock.now_ms();
        if now.wrapping_sub(self.last_check_ms) < u64::from(self.config.poll_period_ms) {
            return Cycle::NotDue;
        }
        self.last_check_ms = now;
        self.cycle()
    }

    /// Runs a cycle now and restarts the poll period.
    pub fn check_now(&mut self) -> Cycle {
        self.last_check_ms = self.clock.now_ms();
        self.cycle()
    }

    /// Dedicated-task variant: check, sleep for the poll period, repeat.
    pub fn run(&mut self) -> ! {
        loop {
            self.check_now();
            self.delay.delay_ms(self.config.poll_period_ms);
        }
    }

    fn cycle(&mut self) -> Cycle {
        if !self.client.is_initialized() && self.client.init().is_err() {
            error!("ota: error initializing http client, will retry next polling period");
            return Cycle::ClientUnavailable;
        }

        info!("ota: checking for updates now");
        let update = match check_for_update(&mut self.client, &self.config, &self.identity) {
            CheckOutcome::UpToDate => return Cycle::UpToDate,
            CheckOutcome::Error(e) => return Cycle::CheckFailed(e),
            CheckOutcome::Available(update) => update,
        };

        self.listeners.notify_update_available(&update.target_uuid);

        if !self.config.auto_update {
            info!("ota: automatic updates disabled, not downloading");
            return Cycle::Declined(update);
        }

        self.listeners.notify_will_update();

        match self.downloader.download(
            &mut self.client,
            &mut self.storage,
            &mut self.delay,
            &self.config,
            &update,
        ) {
            Ok(report) => Cycle::Updated(report),
            Err(e) => Cycle::DownloadFailed(e),
        }
    }

    /// Active configuration.
    pub fn config(&self) -> &Config<'a> {
        &self.config
    }

    /// Identity reported to the service.
    pub fn identity(&self) -> &DeviceIdentity {
        &self.identity
    }

    /// Storage backend.
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Tears the agent down and returns the collaborators it owned.
    pub fn into_parts(self) -> (N, S, C, D) {
        (self.client.into_inner(), self.storage, self.clock, self.delay)
    }
}
