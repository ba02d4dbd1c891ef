//! Recording fakes for the COG bus.
//!
//! Every byte, control line change, delay and busy poll lands in one shared
//! log, so tests can check the order of everything the driver does.
#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{self, InputPin, OutputPin};
use embedded_hal::spi::{self, SpiBus};
use epd_cog::interface::ControlLine;
use epd_cog::{BusyWait, CogInterface, ControlPins, Epd, PanelConfig, PanelGeometry, PanelSize};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Event {
    Byte(u8),
    Line(ControlLine, bool),
    DelayUs(u32),
    DelayMs(u32),
    BusyPoll,
}

pub type Log = Rc<RefCell<Vec<Event>>>;

#[derive(Debug)]
pub struct FakeError;

impl spi::Error for FakeError {
    fn kind(&self) -> spi::ErrorKind {
        spi::ErrorKind::Other
    }
}

impl digital::Error for FakeError {
    fn kind(&self) -> digital::ErrorKind {
        digital::ErrorKind::Other
    }
}

/// Bus that accepts `fail_after` writes, then fails every one after that.
pub struct FakeSpi {
    log: Log,
    writes: usize,
    fail_after: Option<usize>,
}

impl spi::ErrorType for FakeSpi {
    type Error = FakeError;
}

impl SpiBus for FakeSpi {
    fn read(&mut self, words: &mut [u8]) -> Result<(), FakeError> {
        words.fill(0);
        Ok(())
    }

    fn write(&mut self, words: &[u8]) -> Result<(), FakeError> {
        self.writes += 1;
        if matches!(self.fail_after, Some(n) if self.writes > n) {
            return Err(FakeError);
        }
        let mut log = self.log.borrow_mut();
        log.extend(words.iter().map(|&b| Event::Byte(b)));
        Ok(())
    }

    fn transfer(&mut self, read: &mut [u8], write: &[u8]) -> Result<(), FakeError> {
        self.write(write)?;
        read.fill(0);
        Ok(())
    }

    fn transfer_in_place(&mut self, words: &mut [u8]) -> Result<(), FakeError> {
        self.write(words)?;
        words.fill(0);
        Ok(())
    }

    fn flush(&mut self) -> Result<(), FakeError> {
        Ok(())
    }
}

pub struct FakePin(Log, ControlLine);

impl digital::ErrorType for FakePin {
    type Error = FakeError;
}

impl OutputPin for FakePin {
    fn set_low(&mut self) -> Result<(), FakeError> {
        self.0.borrow_mut().push(Event::Line(self.1, false));
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), FakeError> {
        self.0.borrow_mut().push(Event::Line(self.1, true));
        Ok(())
    }
}

/// Busy line that is released on every poll, until `stuck_after` polls have
/// been made; after that it stays asserted.
pub struct FakeBusy {
    log: Log,
    polls: usize,
    stuck_after: Option<usize>,
}

impl digital::ErrorType for FakeBusy {
    type Error = FakeError;
}

impl InputPin for FakeBusy {
    fn is_high(&mut self) -> Result<bool, FakeError> {
        self.log.borrow_mut().push(Event::BusyPoll);
        self.polls += 1;
        Ok(matches!(self.stuck_after, Some(n) if self.polls > n))
    }

    fn is_low(&mut self) -> Result<bool, FakeError> {
        self.is_high().map(|high| !high)
    }
}

pub struct FakeDelay(Log);

impl DelayNs for FakeDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.0.borrow_mut().push(Event::DelayUs(ns / 1_000));
    }

    fn delay_us(&mut self, us: u32) {
        self.0.borrow_mut().push(Event::DelayUs(us));
    }

    fn delay_ms(&mut self, ms: u32) {
        self.0.borrow_mut().push(Event::DelayMs(ms));
    }
}

pub type TestInterface =
    CogInterface<FakeSpi, FakePin, FakePin, FakePin, FakePin, FakePin, FakeBusy, FakeDelay>;

pub fn interface(stuck_after: Option<usize>) -> (TestInterface, Log) {
    failing_interface(stuck_after, None)
}

pub fn failing_interface(
    stuck_after: Option<usize>,
    spi_fail_after: Option<usize>,
) -> (TestInterface, Log) {
    let log: Log = Rc::new(RefCell::new(Vec::new()));
    let pins = ControlPins {
        panel_on: FakePin(log.clone(), ControlLine::PanelOn),
        border: FakePin(log.clone(), ControlLine::Border),
        discharge: FakePin(log.clone(), ControlLine::Discharge),
        reset: FakePin(log.clone(), ControlLine::Reset),
        busy: FakeBusy {
            log: log.clone(),
            polls: 0,
            stuck_after,
        },
    };
    let di = CogInterface::new(
        FakeSpi {
            log: log.clone(),
            writes: 0,
            fail_after: spi_fail_after,
        },
        FakePin(log.clone(), ControlLine::ChipSelect),
        pins,
        FakeDelay(log.clone()),
    );
    (di, log)
}

/// Clock that moves `step` ms forward on every read.
pub fn stepping_clock(start: u32, step: u32) -> impl FnMut() -> u32 {
    let mut now = start;
    move || {
        let t = now;
        now = now.wrapping_add(step);
        t
    }
}

pub type TestEpd = Epd<TestInterface, Box<dyn FnMut() -> u32>>;

/// 32 x 8 panel: 4 bytes per line, 2 scan bytes, so a line packet is 11 bytes
/// and cannot be mistaken for a register packet.
pub fn small_geometry() -> PanelGeometry {
    PanelGeometry::new(32, 8).unwrap()
}

pub fn small_config() -> PanelConfig {
    PanelConfig {
        filler: false,
        ..PanelSize::Epd270.config()
    }
    .with_busy_wait(BusyWait::Forever)
    .with_stage_time(630)
}

pub const PAYLOAD_LEN: usize = 10;

/// A begun driver whose clock advances `step` ms per read.
pub fn epd(config: PanelConfig, step: u32) -> (TestEpd, Log) {
    let (di, log) = interface(None);
    let clock: Box<dyn FnMut() -> u32> = Box::new(stepping_clock(0, step));
    let mut epd = Epd::new(di, clock, small_geometry(), config).unwrap();
    epd.begin().unwrap();
    log.borrow_mut().clear();
    (epd, log)
}

/// Bytes sent between each chip select assert and release, empty ones dropped.
pub fn packets(log: &Log) -> Vec<Vec<u8>> {
    let mut packets = Vec::new();
    let mut current = Vec::new();
    for event in log.borrow().iter() {
        match *event {
            Event::Line(ControlLine::ChipSelect, false) => current.clear(),
            Event::Line(ControlLine::ChipSelect, true) => {
                if !current.is_empty() {
                    packets.push(std::mem::take(&mut current));
                }
            }
            Event::Byte(b) => current.push(b),
            _ => (),
        }
    }
    packets
}

/// Line data packets: the 0x72 header plus `payload_len` bytes.
pub fn line_packets(log: &Log, payload_len: usize) -> Vec<Vec<u8>> {
    packets(log)
        .into_iter()
        .filter(|p| p[0] == 0x72 && p.len() == payload_len + 1)
        .collect()
}

pub fn delays_ms(log: &Log) -> Vec<u32> {
    log.borrow()
        .iter()
        .filter_map(|e| match *e {
            Event::DelayMs(ms) => Some(ms),
            _ => None,
        })
        .collect()
}

pub fn busy_polls(log: &Log) -> usize {
    log.borrow()
        .iter()
        .filter(|e| **e == Event::BusyPoll)
        .count()
}
