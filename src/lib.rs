//! Board support for the EduBase ESP32 classroom board: serial terminal
//! access, power queries with timed deep sleep, and a supervised wifi
//! station link that reconnects in the background.

#![cfg_attr(not(test), no_std)]

extern crate alloc;

#[cfg(feature = "esp-hal-runtime")]
pub mod board;
#[cfg(feature = "esp-hal-runtime")]
pub mod power;
pub mod wifi;
