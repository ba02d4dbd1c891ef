//! The display interface for COG driven e-Paper displays.
//!
//! Unlike command/data controllers, the COG has no D/C line: every transfer is
//! framed by chip select, and pixel data is clocked out one byte at a time with
//! the busy line gating each byte.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};
use embedded_hal::spi::SpiBus;

/// Settle time after chip select is released.
const CS_SETTLE_US: u32 = 10;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DisplayError {
    /// Width not a multiple of 8 or height not a multiple of 4
    InvalidGeometry,
    InvalidBufferLength,
    /// Frame buffer allocation failed
    OutOfMemory,
    /// `begin` has not been called
    NotInitialized,
    BusWriteError,
    CSError,
    PinError,
    BUSYError,
    /// Busy line still asserted after the bounded wait elapsed
    BusyTimeout,
}

/// Control lines driven by the host.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ControlLine {
    PanelOn,
    Border,
    Discharge,
    Reset,
    ChipSelect,
}

/// How long to wait for the COG busy line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BusyWait {
    /// Hardware handshake, an unresponsive panel blocks forever.
    #[default]
    Forever,
    /// Give up after `timeout_us`, polling once per microsecond.
    Bounded { timeout_us: u32 },
}

/// Trait implemented by displays to provide implemenation of core functionality.
pub trait DisplayInterface {
    /// Shift one byte out and return the byte clocked in.
    fn transfer_byte(&mut self, byte: u8) -> Result<u8, DisplayError>;

    /// Send a chip-select framed packet, then hold the settle delay.
    fn send(&mut self, data: &[u8]) -> Result<(), DisplayError>;

    fn set_line(&mut self, line: ControlLine, high: bool) -> Result<(), DisplayError>;

    fn is_busy_on(&mut self) -> Result<bool, DisplayError>;

    /// Block until the busy line is released.
    fn wait_ready(&mut self) -> Result<(), DisplayError>;

    fn delay_ms(&mut self, ms: u32);

    fn delay_us(&mut self, us: u32);

    fn set_busy_wait(&mut self, busy_wait: BusyWait);

    /// Drive every output low, the idle state of the connector.
    fn begin(&mut self) -> Result<(), DisplayError> {
        self.set_line(ControlLine::Reset, false)?;
        self.set_line(ControlLine::PanelOn, false)?;
        self.set_line(ControlLine::Discharge, false)?;
        self.set_line(ControlLine::Border, false)?;
        self.set_line(ControlLine::ChipSelect, false)?;
        Ok(())
    }

    /// Shift one byte out, then wait for the COG to take it.
    fn put_wait(&mut self, byte: u8) -> Result<(), DisplayError> {
        self.transfer_byte(byte)?;
        self.wait_ready()
    }

    /// Finish any in-flight transfer, so chip select may be released.
    fn flush(&mut self) -> Result<(), DisplayError> {
        Ok(())
    }
}

/// Control lines of the panel connector, besides chip select.
pub struct ControlPins<ON, BORDER, DISCHARGE, RST, BUSY> {
    pub panel_on: ON,
    pub border: BORDER,
    pub discharge: DISCHARGE,
    pub reset: RST,
    pub busy: BUSY,
}

/// EPaperDisplay SPI display interface for a G1 COG.
///
/// The bus must be configured as SPI mode 0, MSB first. The COG accepts up to
/// 12MHz, 4MHz is a safe choice.
pub struct CogInterface<SPI, CS, ON, BORDER, DISCHARGE, RST, BUSY, DELAY> {
    spi: SPI,
    cs: CS,
    pins: ControlPins<ON, BORDER, DISCHARGE, RST, BUSY>,
    delay: DELAY,
    busy_wait: BusyWait,
}

impl<SPI, CS, ON, BORDER, DISCHARGE, RST, BUSY, DELAY>
    CogInterface<SPI, CS, ON, BORDER, DISCHARGE, RST, BUSY, DELAY>
where
    SPI: SpiBus<u8>,
    CS: OutputPin,
    ON: OutputPin,
    BORDER: OutputPin,
    DISCHARGE: OutputPin,
    RST: OutputPin,
    BUSY: InputPin,
    DELAY: DelayNs,
{
    pub fn new(
        spi: SPI,
        cs: CS,
        pins: ControlPins<ON, BORDER, DISCHARGE, RST, BUSY>,
        delay: DELAY,
    ) -> Self {
        CogInterface {
            spi,
            cs,
            pins,
            delay,
            busy_wait: BusyWait::Forever,
        }
    }

    /// Consume the display interface and return
    /// the underlying peripherial driver and GPIO pins used by it
    #[allow(clippy::type_complexity)]
    pub fn release(
        self,
    ) -> (
        SPI,
        CS,
        ControlPins<ON, BORDER, DISCHARGE, RST, BUSY>,
        DELAY,
    ) {
        (self.spi, self.cs, self.pins, self.delay)
    }
}

impl<SPI, CS, ON, BORDER, DISCHARGE, RST, BUSY, DELAY> DisplayInterface
    for CogInterface<SPI, CS, ON, BORDER, DISCHARGE, RST, BUSY, DELAY>
where
    SPI: SpiBus<u8>,
    CS: OutputPin,
    ON: OutputPin,
    BORDER: OutputPin,
    DISCHARGE: OutputPin,
    RST: OutputPin,
    BUSY: InputPin,
    DELAY: DelayNs,
{
    fn transfer_byte(&mut self, byte: u8) -> Result<u8, DisplayError> {
        let mut buf = [byte];
        self.spi
            .transfer_in_place(&mut buf)
            .map_err(|_| DisplayError::BusWriteError)?;
        Ok(buf[0])
    }

    fn send(&mut self, data: &[u8]) -> Result<(), DisplayError> {
        // Assert chip select pin
        self.cs.set_low().map_err(|_| DisplayError::CSError)?;

        let ret = self
            .spi
            .write(data)
            .and_then(|_| self.spi.flush())
            .map_err(|_| DisplayError::BusWriteError);

        // Deassert chip select pin, even if the write failed
        self.cs.set_high().map_err(|_| DisplayError::CSError)?;
        ret?;

        self.delay.delay_us(CS_SETTLE_US);
        Ok(())
    }

    fn set_line(&mut self, line: ControlLine, high: bool) -> Result<(), DisplayError> {
        fn drive<P: OutputPin>(pin: &mut P, high: bool) -> Result<(), P::Error> {
            if high {
                pin.set_high()
            } else {
                pin.set_low()
            }
        }

        match line {
            ControlLine::ChipSelect => drive(&mut self.cs, high).map_err(|_| DisplayError::CSError),
            ControlLine::PanelOn => {
                drive(&mut self.pins.panel_on, high).map_err(|_| DisplayError::PinError)
            }
            ControlLine::Border => {
                drive(&mut self.pins.border, high).map_err(|_| DisplayError::PinError)
            }
            ControlLine::Discharge => {
                drive(&mut self.pins.discharge, high).map_err(|_| DisplayError::PinError)
            }
            ControlLine::Reset => {
                drive(&mut self.pins.reset, high).map_err(|_| DisplayError::PinError)
            }
        }
    }

    fn is_busy_on(&mut self) -> Result<bool, DisplayError> {
        self.pins
            .busy
            .is_high()
            .map_err(|_| DisplayError::BUSYError)
    }

    fn wait_ready(&mut self) -> Result<(), DisplayError> {
        match self.busy_wait {
            BusyWait::Forever => {
                while self.is_busy_on()? {
                    core::hint::spin_loop();
                }
                Ok(())
            }
            BusyWait::Bounded { timeout_us } => {
                let mut waited = 0;
                while self.is_busy_on()? {
                    if waited >= timeout_us {
                        warn!("COG busy for more than {}us", timeout_us);
                        return Err(DisplayError::BusyTimeout);
                    }
                    self.delay.delay_us(1);
                    waited += 1;
                }
                Ok(())
            }
        }
    }

    fn delay_ms(&mut self, ms: u32) {
        self.delay.delay_ms(ms);
    }

    fn delay_us(&mut self, us: u32) {
        self.delay.delay_us(us);
    }

    fn set_busy_wait(&mut self, busy_wait: BusyWait) {
        self.busy_wait = busy_wait;
    }

    fn flush(&mut self) -> Result<(), DisplayError> {
        self.spi.flush().map_err(|_| DisplayError::BusWriteError)
    }
}
