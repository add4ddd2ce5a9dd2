use alloc::boxed::Box;
use log::{error, info, warn};

use super::driver::{LinkRuntime, SharedDriver, StationDriver};
use super::state::WifiState;
use super::types::{prefix_len_from_mask, IpSetup, StaticIpSetup, WifiCredentials, WifiError};

/// Keeps the radio joined to one declared network. `enable` arms the
/// retry timer and worker and returns without waiting for the join;
/// progress is reported through the connected/disconnected hooks.
///
/// `enable` and `disable` are meant to be called from a single control
/// context (the main flow); hooks and `is_connected` are safe anywhere.
pub struct WifiSupervisor<D: StationDriver + 'static, R: LinkRuntime> {
    state: &'static WifiState,
    driver: &'static SharedDriver<D>,
    runtime: R,
}

impl<D: StationDriver + 'static, R: LinkRuntime> WifiSupervisor<D, R> {
    pub fn new(state: &'static WifiState, driver: &'static SharedDriver<D>, runtime: R) -> Self {
        Self {
            state,
            driver,
            runtime,
        }
    }

    /// Declare the network to keep joined and arm the reconnect loop.
    /// Calling while already enabled is a no-op; the credentials in
    /// effect stay unchanged until a disable/enable cycle.
    pub fn enable(&mut self, ssid: &str, passphrase: &str) -> Result<(), WifiError> {
        if self.state.enabled() {
            warn!("wifi: already enabled");
            return Ok(());
        }

        let credentials = WifiCredentials::from_parts(ssid, passphrase)?;

        self.driver
            .lock(|d| d.borrow_mut().enter_station_mode())
            .map_err(|fault| {
                error!("wifi: station mode switch failed: {fault}");
                WifiError::ModeSwitch
            })?;

        self.state.set_credentials(credentials);
        self.state.reset_attempts();
        self.state.set_enabled(true);

        if let Err(fault) = self.runtime.start_retry_timer() {
            error!("wifi: retry timer start failed: {fault}");
            self.state.set_enabled(false);
            return Err(WifiError::TimerControl);
        }
        if let Err(fault) = self.runtime.resume_worker() {
            error!("wifi: worker resume failed: {fault}");
            let _ = self.runtime.stop_retry_timer();
            self.state.drain_wake();
            self.state.set_enabled(false);
            return Err(WifiError::WorkerControl);
        }

        info!("wifi: enabled for {ssid}");
        Ok(())
    }

    /// Tear the managed link down. Best-effort: even when an underlying
    /// step fails the supervisor is left disabled (never stuck half-on)
    /// and the first failure is reported.
    pub fn disable(&mut self) -> Result<(), WifiError> {
        if !self.state.enabled() {
            warn!("wifi: already disabled");
            return Ok(());
        }

        self.state.set_enabled(false);
        let mut first_error = None;

        if let Err(fault) = self.runtime.stop_retry_timer() {
            error!("wifi: retry timer stop failed: {fault}");
            first_error.get_or_insert(WifiError::TimerControl);
        }
        if let Err(fault) = self.runtime.suspend_worker() {
            error!("wifi: worker suspend failed: {fault}");
            first_error.get_or_insert(WifiError::WorkerControl);
        }
        self.state.drain_wake();

        let disconnect = self.driver.lock(|d| {
            let mut d = d.borrow_mut();
            d.request_disconnect()?;
            d.leave_station_mode()
        });
        if let Err(fault) = disconnect {
            error!("wifi: disconnect failed: {fault}");
            first_error.get_or_insert(WifiError::Disconnect);
        }

        self.state.set_link_up(false);
        match first_error {
            None => {
                info!("wifi: disabled");
                Ok(())
            }
            Some(error) => Err(error),
        }
    }

    /// Pin a static address; takes effect on the next connection
    /// attempt. The netmask must be contiguous.
    pub fn set_static_ip(&mut self, setup: StaticIpSetup) -> Result<(), WifiError> {
        if prefix_len_from_mask(setup.mask).is_none() {
            warn!("wifi: rejected non-contiguous netmask {}", setup.mask);
            return Err(WifiError::ConfigRejected);
        }
        self.apply_ip_setup(IpSetup::Static(setup))
    }

    /// Return to DHCP; takes effect on the next connection attempt.
    pub fn set_dynamic_ip(&mut self) -> Result<(), WifiError> {
        self.apply_ip_setup(IpSetup::Dhcp)
    }

    fn apply_ip_setup(&mut self, setup: IpSetup) -> Result<(), WifiError> {
        self.driver
            .lock(|d| d.borrow_mut().apply_ip_setup(&setup))
            .map_err(|fault| {
                warn!("wifi: ip setup rejected: {fault}");
                WifiError::ConfigRejected
            })
    }

    /// Install the hook fired on every got-IP event. Survives
    /// disable/enable cycles; last writer wins.
    pub fn on_connected<F: Fn() + Send + Sync + 'static>(&self, hook: F) {
        self.state.set_on_connected(Box::new(hook));
    }

    /// Install the hook fired on every lost-IP/disconnect/stop event.
    pub fn on_disconnected<F: Fn() + Send + Sync + 'static>(&self, hook: F) {
        self.state.set_on_disconnected(Box::new(hook));
    }

    pub fn is_connected(&self) -> bool {
        self.state.is_link_up()
    }
}
