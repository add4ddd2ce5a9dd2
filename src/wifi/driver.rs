use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;

use super::types::{IpSetup, WifiCredentials};

pub type DriverFault = &'static str;

/// Contract the supervisor needs from the radio/IP stack. Every method
/// is a quick synchronous request; connect and disconnect outcomes are
/// observed later through [`StationEvent`](super::StationEvent)
/// delivery, never through these return values.
pub trait StationDriver {
    fn enter_station_mode(&mut self) -> Result<(), DriverFault>;
    fn leave_station_mode(&mut self) -> Result<(), DriverFault>;
    fn request_connect(&mut self, credentials: &WifiCredentials) -> Result<(), DriverFault>;
    fn request_disconnect(&mut self) -> Result<(), DriverFault>;
    fn apply_ip_setup(&mut self, setup: &IpSetup) -> Result<(), DriverFault>;
}

/// One driver instance is shared between the supervisor (mode, ip and
/// disconnect requests) and the worker (connect requests).
pub type SharedDriver<D> = Mutex<CriticalSectionRawMutex, RefCell<D>>;

/// Scheduler-side collaborator: owns starting/stopping the retry timer
/// and resuming/suspending the worker. The esp implementation spawns
/// the two tasks lazily and afterwards only toggles gates; test doubles
/// inject failures to exercise the enable/disable rollback paths.
pub trait LinkRuntime {
    fn start_retry_timer(&mut self) -> Result<(), DriverFault>;
    fn stop_retry_timer(&mut self) -> Result<(), DriverFault>;
    fn resume_worker(&mut self) -> Result<(), DriverFault>;
    fn suspend_worker(&mut self) -> Result<(), DriverFault>;
}
