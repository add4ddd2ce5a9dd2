use core::fmt;
use core::net::Ipv4Addr;

use heapless::String;

pub const WIFI_SSID_MAX: usize = 32;
pub const WIFI_PASSPHRASE_MAX: usize = 64;

/// Network the supervisor is asked to keep joined. Replaced only by
/// `enable()`; the worker reads a clone on every wake.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WifiCredentials {
    pub ssid: String<WIFI_SSID_MAX>,
    pub passphrase: String<WIFI_PASSPHRASE_MAX>,
}

impl WifiCredentials {
    pub fn from_parts(ssid: &str, passphrase: &str) -> Result<Self, WifiError> {
        if ssid.is_empty() {
            return Err(WifiError::ConfigRejected);
        }
        let mut stored_ssid = String::new();
        stored_ssid
            .push_str(ssid)
            .map_err(|_| WifiError::ConfigRejected)?;
        let mut stored_passphrase = String::new();
        stored_passphrase
            .push_str(passphrase)
            .map_err(|_| WifiError::ConfigRejected)?;
        Ok(Self {
            ssid: stored_ssid,
            passphrase: stored_passphrase,
        })
    }
}

/// Station-side notifications delivered by the network stack, in the
/// order the stack emits them. Only `GotIp` means the link is usable.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StationEvent {
    Started,
    Connected,
    AuthModeChanged,
    GotIp,
    LostIp,
    Disconnected,
    Stopped,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StaticIpSetup {
    pub ip: Ipv4Addr,
    pub gateway: Ipv4Addr,
    pub mask: Ipv4Addr,
    pub dns1: Option<Ipv4Addr>,
    pub dns2: Option<Ipv4Addr>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IpSetup {
    Dhcp,
    Static(StaticIpSetup),
}

/// Failures surfaced synchronously from supervisor calls. Asynchronous
/// connect outcomes are never reported here; they arrive as events.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WifiError {
    ModeSwitch,
    TimerControl,
    WorkerControl,
    Disconnect,
    ConfigRejected,
}

impl fmt::Display for WifiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = match self {
            WifiError::ModeSwitch => "station mode switch failed",
            WifiError::TimerControl => "retry timer control failed",
            WifiError::WorkerControl => "connection worker control failed",
            WifiError::Disconnect => "disconnect request failed",
            WifiError::ConfigRejected => "configuration rejected",
        };
        f.write_str(message)
    }
}

pub(crate) fn prefix_len_from_mask(mask: Ipv4Addr) -> Option<u8> {
    let bits = u32::from_be_bytes(mask.octets());
    let ones = bits.leading_ones();
    if ones == 0 {
        return None;
    }
    if ones < 32 && bits << ones != 0 {
        return None;
    }
    Some(ones as u8)
}
