//! Board façade: owns the serial terminal and the power block.

use esp_hal::peripherals::{GPIO1, GPIO3, LPWR, UART0};
use esp_hal::uart::{Config as UartConfig, Uart};
use esp_hal::Async;

use crate::power::Power;

pub const UART_BAUD: u32 = 115_200;

pub type Terminal = Uart<'static, Async>;

pub struct EduBoard {
    terminal: Terminal,
    power: Power,
}

impl EduBoard {
    pub fn new(
        uart: UART0<'static>,
        rx: GPIO3<'static>,
        tx: GPIO1<'static>,
        lpwr: LPWR<'static>,
    ) -> Result<Self, &'static str> {
        let uart_cfg = UartConfig::default().with_baudrate(UART_BAUD);
        let terminal = Uart::new(uart, uart_cfg)
            .map_err(|_| "failed to init UART0")?
            .with_rx(rx)
            .with_tx(tx)
            .into_async();
        Ok(Self {
            terminal,
            power: Power::new(lpwr),
        })
    }

    /// Monitor UART, e.g. `board.terminal().write_async(...)`.
    pub fn terminal(&mut self) -> &mut Terminal {
        &mut self.terminal
    }

    pub fn power(&mut self) -> &mut Power {
        &mut self.power
    }
}
