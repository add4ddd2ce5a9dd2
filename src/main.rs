#![no_std]
#![no_main]

use edubase::board::EduBoard;
use edubase::wifi::{
    self,
    esp::{EspLinkRuntime, EspStationDriver},
    WifiState, WifiSupervisor,
};
use embassy_time::{Duration, Ticker};
use esp_backtrace as _;
use esp_hal::timer::timg::TimerGroup;
use log::{error, info, warn, LevelFilter};

static WIFI_STATE: WifiState = WifiState::new();

#[esp_hal::main]
fn main() -> ! {
    esp_println::logger::init_logger(LevelFilter::Info);

    let peripherals = esp_hal::init(esp_hal::Config::default());
    let timg0 = TimerGroup::new(peripherals.TIMG0);
    esp_rtos::start(timg0.timer0);

    // esp-radio needs a heap; hook boxes live there too.
    esp_alloc::heap_allocator!(size: 72 * 1024);

    let board = EduBoard::new(
        peripherals.UART0,
        peripherals.GPIO3,
        peripherals.GPIO1,
        peripherals.LPWR,
    )
    .expect("failed to init board");

    let mut executor = esp_rtos::embassy::Executor::new();
    let executor = unsafe { make_static(&mut executor) };
    executor.run(move |spawner| {
        let parts =
            wifi::esp::setup(&WIFI_STATE, peripherals.WIFI, spawner).expect("wifi setup failed");
        spawner.must_spawn(wifi::esp::net_stack_task(parts.net_runner));
        spawner.must_spawn(wifi::esp::link_events_task(&WIFI_STATE));
        spawner.must_spawn(wifi::esp::ip_watch_task(parts.stack));

        let supervisor = WifiSupervisor::new(&WIFI_STATE, parts.driver, parts.runtime);
        spawner.must_spawn(control_task(supervisor, board));
    });
}

#[embassy_executor::task]
async fn control_task(
    mut supervisor: WifiSupervisor<EspStationDriver, EspLinkRuntime>,
    mut board: EduBoard,
) {
    info!(
        "boot: reset_reason={:?} wakeup_cause={:?}",
        board.power().reset_reason(),
        board.power().wakeup_cause()
    );

    supervisor.on_connected(|| info!("demo: network up"));
    supervisor.on_disconnected(|| info!("demo: network down"));

    match demo_credentials() {
        Some((ssid, passphrase)) => {
            if let Err(err) = supervisor.enable(ssid, passphrase) {
                error!("demo: wifi enable failed: {err}");
            }
        }
        None => warn!("demo: set EDUBASE_WIFI_SSID / EDUBASE_WIFI_PASSWORD at build time"),
    }

    let mut ticker = Ticker::every(Duration::from_secs(30));
    loop {
        ticker.next().await;
        let line: &[u8] = if supervisor.is_connected() {
            b"wifi: link up\r\n"
        } else {
            b"wifi: link down\r\n"
        };
        let _ = board.terminal().write_async(line).await;
    }
}

fn demo_credentials() -> Option<(&'static str, &'static str)> {
    let ssid = option_env!("EDUBASE_WIFI_SSID").or(option_env!("SSID"))?;
    let passphrase = option_env!("EDUBASE_WIFI_PASSWORD")
        .or(option_env!("PASSWORD"))
        .unwrap_or("");
    Some((ssid, passphrase))
}

unsafe fn make_static<T>(value: &mut T) -> &'static mut T {
    unsafe { core::mem::transmute(value) }
}
