//! Power state queries and deep-sleep entry for the board.

use core::time::Duration;

use esp_hal::peripherals::LPWR;
use esp_hal::rtc_cntl::{
    reset_reason, sleep::TimerWakeupSource, wakeup_cause, Rtc, SleepSource, SocResetReason,
};
use esp_hal::system::{software_reset, Cpu};
use log::warn;

/// Reset and wake causes are captured once at construction, so they
/// keep answering for the boot that actually happened.
pub struct Power {
    rtc: Rtc<'static>,
    boot_reset_reason: Option<SocResetReason>,
    boot_wakeup_cause: SleepSource,
}

impl Power {
    pub fn new(lpwr: LPWR<'static>) -> Self {
        Self {
            rtc: Rtc::new(lpwr),
            boot_reset_reason: reset_reason(Cpu::ProCpu),
            boot_wakeup_cause: wakeup_cause(),
        }
    }

    pub fn reset_reason(&self) -> Option<SocResetReason> {
        self.boot_reset_reason
    }

    pub fn wakeup_cause(&self) -> SleepSource {
        self.boot_wakeup_cause
    }

    pub fn restart(&mut self) -> ! {
        warn!("power: --- restarting board ---");
        software_reset()
    }

    /// Arm a timer wake source and enter deep sleep. Execution resumes
    /// from reset, so this never returns.
    pub fn timed_deep_sleep(&mut self, duration: Duration) -> ! {
        warn!("power: deep sleep for {}s, goodbye", duration.as_secs());
        let timer = TimerWakeupSource::new(duration);
        self.rtc.sleep_deep(&[&timer])
    }
}
