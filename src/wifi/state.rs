use core::cell::RefCell;
use core::sync::atomic::{AtomicBool, AtomicU16, Ordering};

use alloc::boxed::Box;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::signal::Signal;
use log::{info, warn};

use super::events::{fold_station_event, HookKind};
use super::types::{StationEvent, WifiCredentials};

pub type LinkHook = Box<dyn Fn() + Send + Sync>;

type HookSlot = Mutex<CriticalSectionRawMutex, RefCell<Option<LinkHook>>>;

/// Shared record behind one supervised link. One instance is wired into
/// the supervisor, the retry timer, the worker, and the driver's event
/// context; everything cross-context goes through the atomics and the
/// two coalescing signals in here.
pub struct WifiState {
    wake: Signal<CriticalSectionRawMutex, ()>,
    timer_gate: Signal<CriticalSectionRawMutex, bool>,
    enabled: AtomicBool,
    link_up: AtomicBool,
    attempts: AtomicU16,
    credentials: Mutex<CriticalSectionRawMutex, RefCell<Option<WifiCredentials>>>,
    on_connected: HookSlot,
    on_disconnected: HookSlot,
}

impl WifiState {
    pub const fn new() -> Self {
        Self {
            wake: Signal::new(),
            timer_gate: Signal::new(),
            enabled: AtomicBool::new(false),
            link_up: AtomicBool::new(false),
            attempts: AtomicU16::new(0),
            credentials: Mutex::new(RefCell::new(None)),
            on_connected: Mutex::new(RefCell::new(None)),
            on_disconnected: Mutex::new(RefCell::new(None)),
        }
    }

    pub fn is_link_up(&self) -> bool {
        self.link_up.load(Ordering::Acquire)
    }

    pub(crate) fn enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    pub(crate) fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Release);
    }

    pub(crate) fn set_link_up(&self, up: bool) {
        self.link_up.store(up, Ordering::Release);
    }

    pub(crate) fn attempts(&self) -> u16 {
        self.attempts.load(Ordering::Relaxed)
    }

    pub(crate) fn bump_attempts(&self) {
        let _ = self
            .attempts
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| {
                Some(n.saturating_add(1))
            });
    }

    pub(crate) fn reset_attempts(&self) {
        self.attempts.store(0, Ordering::Relaxed);
    }

    pub(crate) fn credentials(&self) -> Option<WifiCredentials> {
        self.credentials.lock(|slot| slot.borrow().clone())
    }

    pub(crate) fn set_credentials(&self, credentials: WifiCredentials) {
        self.credentials
            .lock(|slot| *slot.borrow_mut() = Some(credentials));
    }

    pub(crate) fn signal_wake(&self) {
        self.wake.signal(());
    }

    pub(crate) fn drain_wake(&self) {
        self.wake.reset();
    }

    pub(crate) async fn wait_wake(&self) {
        self.wake.wait().await;
    }

    pub(crate) fn set_timer_running(&self, running: bool) {
        self.timer_gate.signal(running);
    }

    pub(crate) async fn wait_timer_gate(&self) -> bool {
        self.timer_gate.wait().await
    }

    pub fn set_on_connected(&self, hook: LinkHook) {
        self.on_connected.lock(|slot| *slot.borrow_mut() = Some(hook));
    }

    pub fn set_on_disconnected(&self, hook: LinkHook) {
        self.on_disconnected
            .lock(|slot| *slot.borrow_mut() = Some(hook));
    }

    /// Fold one stack notification into the shared record. Callers must
    /// deliver events serialized; hooks run in the caller's context.
    pub fn handle_station_event(&self, event: StationEvent) {
        match event {
            StationEvent::Started => info!("wifi: station started"),
            StationEvent::Connected => info!("wifi: link associated"),
            StationEvent::AuthModeChanged => info!("wifi: auth mode changed"),
            StationEvent::GotIp => info!("wifi: got ip"),
            StationEvent::LostIp => warn!("wifi: lost ip"),
            StationEvent::Disconnected => warn!("wifi: disconnected"),
            StationEvent::Stopped => warn!("wifi: station stopped"),
        }

        let outcome = fold_station_event(event);
        match outcome.link_up {
            Some(true) => {
                // A connect issued before disable() may still resolve
                // afterwards; a disabled link must never report up.
                if !self.enabled() {
                    warn!("wifi: got ip while disabled, ignoring");
                    return;
                }
                self.set_link_up(true);
                self.reset_attempts();
            }
            Some(false) => self.set_link_up(false),
            None => {}
        }

        if !self.enabled() {
            return;
        }
        match outcome.hook {
            Some(HookKind::Connected) => self.fire(&self.on_connected),
            Some(HookKind::Disconnected) => self.fire(&self.on_disconnected),
            None => {}
        }
    }

    // Take the hook out of its slot for the call so the hook itself may
    // install a replacement; restore it only if the slot is still empty.
    fn fire(&self, slot: &HookSlot) {
        let Some(hook) = slot.lock(|cell| cell.borrow_mut().take()) else {
            return;
        };
        hook();
        slot.lock(|cell| {
            let mut cell = cell.borrow_mut();
            if cell.is_none() {
                *cell = Some(hook);
            }
        });
    }
}

impl Default for WifiState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use alloc::sync::Arc;
    use core::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    fn fresh_state() -> &'static WifiState {
        Box::leak(Box::new(WifiState::new()))
    }

    fn counting_hook(hits: &Arc<AtomicUsize>) -> LinkHook {
        let hits = hits.clone();
        Box::new(move || {
            hits.fetch_add(1, Ordering::Relaxed);
        })
    }

    #[test]
    fn got_ip_raises_link_and_fires_hook_once() {
        let state = fresh_state();
        state.set_enabled(true);
        let hits = Arc::new(AtomicUsize::new(0));
        state.set_on_connected(counting_hook(&hits));

        state.handle_station_event(StationEvent::GotIp);

        assert!(state.is_link_up());
        assert_eq!(hits.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn each_down_event_fires_disconnected_hook() {
        let state = fresh_state();
        state.set_enabled(true);
        let hits = Arc::new(AtomicUsize::new(0));
        state.set_on_disconnected(counting_hook(&hits));

        state.handle_station_event(StationEvent::GotIp);
        state.handle_station_event(StationEvent::LostIp);
        state.handle_station_event(StationEvent::Disconnected);
        state.handle_station_event(StationEvent::Stopped);

        assert!(!state.is_link_up());
        assert_eq!(hits.load(Ordering::Relaxed), 3);
    }

    #[test]
    fn neutral_events_touch_nothing() {
        let state = fresh_state();
        state.set_enabled(true);
        let connected = Arc::new(AtomicUsize::new(0));
        let disconnected = Arc::new(AtomicUsize::new(0));
        state.set_on_connected(counting_hook(&connected));
        state.set_on_disconnected(counting_hook(&disconnected));

        state.handle_station_event(StationEvent::Started);
        state.handle_station_event(StationEvent::Connected);
        state.handle_station_event(StationEvent::AuthModeChanged);

        assert!(!state.is_link_up());
        assert_eq!(connected.load(Ordering::Relaxed), 0);
        assert_eq!(disconnected.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn got_ip_is_suppressed_while_disabled() {
        let state = fresh_state();
        let hits = Arc::new(AtomicUsize::new(0));
        state.set_on_connected(counting_hook(&hits));

        state.handle_station_event(StationEvent::GotIp);

        assert!(!state.is_link_up());
        assert_eq!(hits.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn down_event_while_disabled_clears_flag_silently() {
        let state = fresh_state();
        state.set_link_up(true);
        let hits = Arc::new(AtomicUsize::new(0));
        state.set_on_disconnected(counting_hook(&hits));

        state.handle_station_event(StationEvent::Disconnected);

        assert!(!state.is_link_up());
        assert_eq!(hits.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn got_ip_resets_attempt_counter() {
        let state = fresh_state();
        state.set_enabled(true);
        state.bump_attempts();
        state.bump_attempts();
        assert_eq!(state.attempts(), 2);

        state.handle_station_event(StationEvent::GotIp);

        assert_eq!(state.attempts(), 0);
    }

    #[test]
    fn hook_replacement_is_last_writer_wins() {
        let state = fresh_state();
        state.set_enabled(true);
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));
        state.set_on_connected(counting_hook(&first));
        state.set_on_connected(counting_hook(&second));

        state.handle_station_event(StationEvent::GotIp);

        assert_eq!(first.load(Ordering::Relaxed), 0);
        assert_eq!(second.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn hook_may_install_its_replacement() {
        let state = fresh_state();
        state.set_enabled(true);
        let replacement_hits = Arc::new(AtomicUsize::new(0));
        let replacement = std::sync::Mutex::new(Some(counting_hook(&replacement_hits)));
        let state_ref: &'static WifiState = state;
        state.set_on_connected(Box::new(move || {
            if let Some(hook) = replacement.lock().unwrap().take() {
                state_ref.set_on_connected(hook);
            }
        }));

        state.handle_station_event(StationEvent::GotIp);
        state.handle_station_event(StationEvent::LostIp);
        state.handle_station_event(StationEvent::GotIp);

        assert_eq!(replacement_hits.load(Ordering::Relaxed), 1);
    }
}
