use embassy_futures::select::{select, Either};
use embassy_time::{Duration, Timer};
use log::{info, warn};

use super::driver::{SharedDriver, StationDriver};
use super::retry::RetryPolicy;
use super::state::WifiState;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum WakeVerdict {
    Ignore,
    AlreadyLinked,
    Exhausted,
    Connect,
}

pub(crate) fn wake_verdict(
    enabled: bool,
    link_up: bool,
    attempts: u16,
    policy: &RetryPolicy,
) -> WakeVerdict {
    if !enabled {
        WakeVerdict::Ignore
    } else if link_up {
        WakeVerdict::AlreadyLinked
    } else if policy.attempts_exhausted(attempts) {
        WakeVerdict::Exhausted
    } else {
        WakeVerdict::Connect
    }
}

/// Connection worker: blocks on the wake signal, and on each wake issues
/// at most one fire-and-forget connect request. Coalesced wakes while
/// the link is already up are cheap no-ops.
pub async fn connection_worker<D: StationDriver>(
    state: &'static WifiState,
    driver: &'static SharedDriver<D>,
    policy: RetryPolicy,
) -> ! {
    loop {
        state.wait_wake().await;
        match wake_verdict(state.enabled(), state.is_link_up(), state.attempts(), &policy) {
            WakeVerdict::Ignore | WakeVerdict::AlreadyLinked => {}
            WakeVerdict::Exhausted => {
                warn!("wifi: retry attempts exhausted, waiting for re-enable");
            }
            WakeVerdict::Connect => {
                let Some(credentials) = state.credentials() else {
                    warn!("wifi: woken without credentials");
                    continue;
                };
                state.bump_attempts();
                info!("wifi: connecting to {}", credentials.ssid.as_str());
                let request = driver.lock(|d| d.borrow_mut().request_connect(&credentials));
                if let Err(fault) = request {
                    warn!("wifi: connect request failed: {fault}");
                }
            }
        }
    }
}

/// Retry timer: parked on its gate while the link is disabled; while
/// enabled it sleeps one policy delay per cycle and then wakes the
/// worker. A gate flip interrupts the in-flight delay, so a stopped
/// timer produces no further wakes.
pub async fn retry_timer(state: &'static WifiState, policy: RetryPolicy) -> ! {
    let mut running = false;
    loop {
        if !running {
            running = state.wait_timer_gate().await;
            continue;
        }
        let delay = policy.delay_for_attempt(state.attempts());
        match select(
            state.wait_timer_gate(),
            Timer::after(Duration::from_millis(delay as u64)),
        )
        .await
        {
            Either::First(run) => running = run,
            Either::Second(()) => {
                if state.enabled() {
                    state.signal_wake();
                }
            }
        }
    }
}
