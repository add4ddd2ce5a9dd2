//! Supervised wifi station link. A [`WifiSupervisor`] keeps the radio
//! joined to one declared network. A retry timer wakes a background
//! worker through a coalescing signal and the worker issues
//! fire-and-forget connect requests; stack events fold into a single
//! connected flag plus user hooks.

pub mod driver;
#[cfg(feature = "esp-hal-runtime")]
pub mod esp;
mod events;
pub mod retry;
mod state;
mod supervisor;
pub mod types;
mod worker;

pub use driver::{DriverFault, LinkRuntime, SharedDriver, StationDriver};
pub use retry::RetryPolicy;
pub use state::{LinkHook, WifiState};
pub use supervisor::WifiSupervisor;
pub use types::{
    IpSetup, StaticIpSetup, StationEvent, WifiCredentials, WifiError, WIFI_PASSPHRASE_MAX,
    WIFI_SSID_MAX,
};
pub use worker::{connection_worker, retry_timer};
