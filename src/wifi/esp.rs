//! esp-radio / embassy-net binding for the supervised link on the ESP32.
//! Link-layer notifications from the radio and address notifications
//! from the network stack are funneled into one static channel so the
//! shared state sees a serialized event stream.

use core::cell::RefCell;

use embassy_executor::Spawner;
use embassy_net::{
    ConfigV4, DhcpConfig, Ipv4Cidr, Runner, Stack, StackResources, StaticConfigV4,
};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::channel::Channel;
use esp_hal::peripherals::WIFI;
use esp_hal::rng::Rng;
use esp_radio::wifi::{
    event::{self, EventExt},
    ClientConfig, Config as WifiRuntimeConfig, ModeConfig, WifiController, WifiDevice,
};
use log::warn;
use static_cell::StaticCell;

use super::driver::{DriverFault, LinkRuntime, SharedDriver, StationDriver};
use super::retry::RetryPolicy;
use super::state::WifiState;
use super::types::{prefix_len_from_mask, IpSetup, StationEvent, WifiCredentials};
use super::worker::{connection_worker, retry_timer};

const WIFI_RX_QUEUE_SIZE: usize = 3;
const WIFI_TX_QUEUE_SIZE: usize = 2;
const WIFI_STATIC_RX_BUF_NUM: u8 = 4;
const WIFI_DYNAMIC_RX_BUF_NUM: u16 = 8;
const WIFI_DYNAMIC_TX_BUF_NUM: u16 = 8;
const WIFI_RX_BA_WIN: u8 = 3;
const LINK_EVENT_QUEUE: usize = 8;

static LINK_EVENTS: Channel<CriticalSectionRawMutex, StationEvent, LINK_EVENT_QUEUE> =
    Channel::new();

pub struct WifiParts {
    pub driver: &'static SharedDriver<EspStationDriver>,
    pub runtime: EspLinkRuntime,
    pub net_runner: Runner<'static, WifiDevice<'static>>,
    pub stack: Stack<'static>,
}

/// Bring the radio and network stack up and return the pieces the
/// application wires into its executor: spawn [`net_stack_task`],
/// [`link_events_task`] and [`ip_watch_task`], then hand `driver` and
/// `runtime` to a [`WifiSupervisor`](super::WifiSupervisor).
pub fn setup(
    state: &'static WifiState,
    wifi: WIFI<'static>,
    spawner: Spawner,
) -> Result<WifiParts, DriverFault> {
    static RADIO_CTRL: StaticCell<esp_radio::Controller<'static>> = StaticCell::new();
    static STACK_RESOURCES: StaticCell<StackResources<3>> = StaticCell::new();
    static DRIVER: StaticCell<SharedDriver<EspStationDriver>> = StaticCell::new();

    let radio_ctrl = esp_radio::init().map_err(|_| "radio controller init failed")?;
    let radio_ctrl = RADIO_CTRL.init(radio_ctrl);
    let (controller, ifaces) = esp_radio::wifi::new(radio_ctrl, wifi, wifi_runtime_config())
        .map_err(|_| "wifi peripheral init failed")?;

    install_station_event_handlers();

    let rng = Rng::new();
    let seed = (rng.random() as u64) << 32 | rng.random() as u64;
    let (stack, net_runner) = embassy_net::new(
        ifaces.sta,
        embassy_net::Config::dhcpv4(Default::default()),
        STACK_RESOURCES.init(StackResources::<3>::new()),
        seed,
    );

    let driver = DRIVER.init(Mutex::new(RefCell::new(EspStationDriver { controller, stack })));
    let runtime = EspLinkRuntime::new(spawner, state, driver);

    Ok(WifiParts {
        driver,
        runtime,
        net_runner,
        stack,
    })
}

fn wifi_runtime_config() -> WifiRuntimeConfig {
    WifiRuntimeConfig::default()
        .with_rx_queue_size(WIFI_RX_QUEUE_SIZE)
        .with_tx_queue_size(WIFI_TX_QUEUE_SIZE)
        .with_static_rx_buf_num(WIFI_STATIC_RX_BUF_NUM)
        .with_dynamic_rx_buf_num(WIFI_DYNAMIC_RX_BUF_NUM)
        .with_dynamic_tx_buf_num(WIFI_DYNAMIC_TX_BUF_NUM)
        .with_ampdu_rx_enable(false)
        .with_ampdu_tx_enable(false)
        .with_rx_ba_win(WIFI_RX_BA_WIN)
}

// The radio delivers these from its own context; queue instead of
// touching shared state here so events stay serialized with the ip
// notifications from `ip_watch_task`.
fn install_station_event_handlers() {
    event::StaStart::update_handler(|_| enqueue(StationEvent::Started));
    event::StaStop::update_handler(|_| enqueue(StationEvent::Stopped));
    event::StaConnected::update_handler(|_| enqueue(StationEvent::Connected));
    event::StaDisconnected::update_handler(|_| enqueue(StationEvent::Disconnected));
    event::StaAuthmodeChange::update_handler(|_| enqueue(StationEvent::AuthModeChanged));
}

fn enqueue(event: StationEvent) {
    if LINK_EVENTS.try_send(event).is_err() {
        warn!("wifi: link event queue full, dropping {:?}", event);
    }
}

pub struct EspStationDriver {
    controller: WifiController<'static>,
    stack: Stack<'static>,
}

impl StationDriver for EspStationDriver {
    fn enter_station_mode(&mut self) -> Result<(), DriverFault> {
        let mode = ModeConfig::Client(ClientConfig::default());
        self.controller
            .set_config(&mode)
            .map_err(|_| "station config failed")?;
        if !matches!(self.controller.is_started(), Ok(true)) {
            self.controller.start().map_err(|_| "station start failed")?;
        }
        Ok(())
    }

    fn leave_station_mode(&mut self) -> Result<(), DriverFault> {
        self.controller.stop().map_err(|_| "station stop failed")
    }

    fn request_connect(&mut self, credentials: &WifiCredentials) -> Result<(), DriverFault> {
        let client = ClientConfig::default()
            .with_ssid(credentials.ssid.as_str().into())
            .with_password(credentials.passphrase.as_str().into());
        self.controller
            .set_config(&ModeConfig::Client(client))
            .map_err(|_| "station config failed")?;
        self.controller
            .connect()
            .map_err(|_| "connect request failed")
    }

    fn request_disconnect(&mut self) -> Result<(), DriverFault> {
        self.controller
            .disconnect()
            .map_err(|_| "disconnect request failed")
    }

    fn apply_ip_setup(&mut self, setup: &IpSetup) -> Result<(), DriverFault> {
        match setup {
            IpSetup::Dhcp => {
                self.stack
                    .set_config_v4(ConfigV4::Dhcp(DhcpConfig::default()));
            }
            IpSetup::Static(setup) => {
                let prefix =
                    prefix_len_from_mask(setup.mask).ok_or("netmask is not contiguous")?;
                let mut dns_servers = heapless::Vec::new();
                if let Some(dns) = setup.dns1 {
                    let _ = dns_servers.push(dns);
                }
                if let Some(dns) = setup.dns2 {
                    let _ = dns_servers.push(dns);
                }
                self.stack.set_config_v4(ConfigV4::Static(StaticConfigV4 {
                    address: Ipv4Cidr::new(setup.ip, prefix),
                    gateway: Some(setup.gateway),
                    dns_servers,
                }));
            }
        }
        Ok(())
    }
}

/// Timer/worker control backed by the embassy executor. The two tasks
/// are spawned on first use; afterwards start/stop only flips the timer
/// gate and suspend drains any pending wake.
pub struct EspLinkRuntime {
    spawner: Spawner,
    state: &'static WifiState,
    driver: &'static SharedDriver<EspStationDriver>,
    policy: RetryPolicy,
    timer_spawned: bool,
    worker_spawned: bool,
}

impl EspLinkRuntime {
    fn new(
        spawner: Spawner,
        state: &'static WifiState,
        driver: &'static SharedDriver<EspStationDriver>,
    ) -> Self {
        Self {
            spawner,
            state,
            driver,
            policy: RetryPolicy::defaults(),
            timer_spawned: false,
            worker_spawned: false,
        }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy.sanitized();
        self
    }
}

impl LinkRuntime for EspLinkRuntime {
    fn start_retry_timer(&mut self) -> Result<(), DriverFault> {
        if !self.timer_spawned {
            self.spawner
                .spawn(retry_timer_task(self.state, self.policy))
                .map_err(|_| "retry timer spawn failed")?;
            self.timer_spawned = true;
        }
        self.state.set_timer_running(true);
        Ok(())
    }

    fn stop_retry_timer(&mut self) -> Result<(), DriverFault> {
        self.state.set_timer_running(false);
        Ok(())
    }

    fn resume_worker(&mut self) -> Result<(), DriverFault> {
        if !self.worker_spawned {
            self.spawner
                .spawn(connection_worker_task(
                    self.state,
                    self.driver,
                    self.policy,
                ))
                .map_err(|_| "worker spawn failed")?;
            self.worker_spawned = true;
        }
        Ok(())
    }

    fn suspend_worker(&mut self) -> Result<(), DriverFault> {
        self.state.drain_wake();
        Ok(())
    }
}

#[embassy_executor::task]
async fn retry_timer_task(state: &'static WifiState, policy: RetryPolicy) -> ! {
    retry_timer(state, policy).await
}

#[embassy_executor::task]
async fn connection_worker_task(
    state: &'static WifiState,
    driver: &'static SharedDriver<EspStationDriver>,
    policy: RetryPolicy,
) -> ! {
    connection_worker(state, driver, policy).await
}

#[embassy_executor::task]
pub async fn net_stack_task(mut runner: Runner<'static, WifiDevice<'static>>) -> ! {
    runner.run().await
}

#[embassy_executor::task]
pub async fn link_events_task(state: &'static WifiState) -> ! {
    loop {
        let event = LINK_EVENTS.receive().await;
        state.handle_station_event(event);
    }
}

#[embassy_executor::task]
pub async fn ip_watch_task(stack: Stack<'static>) -> ! {
    loop {
        stack.wait_config_up().await;
        enqueue(StationEvent::GotIp);
        stack.wait_config_down().await;
        enqueue(StationEvent::LostIp);
    }
}
