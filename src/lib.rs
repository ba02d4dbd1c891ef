//! Driver for Pervasive Displays e-paper panels with the G1 COG (chip on glass).
//!
//! The COG has no waveform tables of its own: the host drives every stage of
//! the image transition line by line, for a temperature dependent time.
//!
//! ```ignore
//! let interface = CogInterface::new(spi, cs, pins, delay);
//! let mut epd = Epd::for_size(interface, millis, PanelSize::Epd270)?;
//! epd.begin()?;
//! epd.set_temperature(18);
//! epd.clear()?;
//!
//! let mut frame = FrameBuffer::new(PanelSize::Epd270.geometry())?;
//! Text::new("Hello", Point::new(10, 20), style).draw(&mut frame)?;
//! epd.update(frame.as_bytes())?;
//! ```
#![cfg_attr(not(test), no_std)]

extern crate alloc;

#[macro_use]
mod fmt;

pub mod command;
pub mod config;
pub mod display;
pub mod geometry;
pub mod interface;
pub mod line;
pub mod power;
pub mod stage;
pub mod temperature;

use alloc::vec::Vec;

pub use config::{PanelConfig, PanelSize};
pub use display::FrameBuffer;
pub use geometry::PanelGeometry;
pub use interface::{BusyWait, CogInterface, ControlPins, DisplayError, DisplayInterface};
pub use line::Stage;
pub use stage::{FrameReader, Monotonic};

use line::LineEncoder;
use stage::{run_stage_for_budget, FrameSource};
use temperature::{StageTiming, DEFAULT_TEMPERATURE};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PanelState {
    Uninitialized,
    Idle,
    PoweredOn,
}

/// Everything but the committed image.
struct Panel<DI, CLK> {
    interface: DI,
    clock: CLK,
    geometry: PanelGeometry,
    config: PanelConfig,
    encoder: LineEncoder,
    timing: StageTiming,
    state: PanelState,
}

impl<DI: DisplayInterface, CLK: Monotonic> Panel<DI, CLK> {
    /// Power on, run all four stages, power off.
    ///
    /// Compensate and White read `old`, Inverse and Normal read `new`. Power
    /// off runs whenever power on was attempted; the first error wins.
    fn refresh<'a>(
        &mut self,
        old: &mut FrameSource<'a>,
        new: &mut FrameSource<'a>,
    ) -> Result<(), DisplayError> {
        if self.state != PanelState::Idle {
            return Err(DisplayError::NotInitialized);
        }

        self.state = PanelState::PoweredOn;
        let ret = self.waveform(old, new);
        let off = power::power_off(
            &mut self.interface,
            &self.config,
            &self.encoder,
            self.geometry.height(),
        );
        self.state = PanelState::Idle;

        if let Err(e) = ret {
            error!("refresh aborted: {:?}", e);
        }
        ret.and(off)
    }

    fn waveform<'a>(
        &mut self,
        old: &mut FrameSource<'a>,
        new: &mut FrameSource<'a>,
    ) -> Result<(), DisplayError> {
        power::power_on(&mut self.interface, &self.config)?;

        let budget = self.timing.effective_ms();
        for stage in Stage::ALL {
            let source = match stage {
                Stage::Compensate | Stage::White => &mut *old,
                Stage::Inverse | Stage::Normal => &mut *new,
            };
            run_stage_for_budget(
                &mut self.interface,
                &mut self.clock,
                &self.encoder,
                &self.config.gate_source,
                self.geometry.height(),
                budget,
                source,
                stage,
            )?;
        }
        Ok(())
    }
}

/// A G1 COG panel and the image it currently shows.
///
/// One `Epd` owns one panel. Every operation blocks until the panel is done,
/// and none may be interrupted: a half-run waveform leaves the panel in an
/// undefined state.
pub struct Epd<DI, CLK> {
    panel: Panel<DI, CLK>,
    /// Last image committed to the panel
    framebuf: Vec<u8>,
}

impl<DI: DisplayInterface, CLK: Monotonic> Epd<DI, CLK> {
    pub fn new(
        mut interface: DI,
        clock: CLK,
        geometry: PanelGeometry,
        config: PanelConfig,
    ) -> Result<Self, DisplayError> {
        let len = geometry.frame_len();
        let mut framebuf = Vec::new();
        framebuf
            .try_reserve_exact(len)
            .map_err(|_| DisplayError::OutOfMemory)?;
        framebuf.resize(len, 0x00);

        interface.set_busy_wait(config.busy_wait);

        Ok(Self {
            panel: Panel {
                interface,
                clock,
                geometry,
                encoder: LineEncoder::new(&geometry, config.filler),
                timing: StageTiming::new(config.stage_time_ms),
                config,
                state: PanelState::Uninitialized,
            },
            framebuf,
        })
    }

    pub fn for_size(interface: DI, clock: CLK, size: PanelSize) -> Result<Self, DisplayError> {
        Self::new(interface, clock, size.geometry(), size.config())
    }

    /// Put the control lines in their idle state.
    pub fn begin(&mut self) -> Result<(), DisplayError> {
        self.panel.interface.begin()?;
        self.panel.state = PanelState::Idle;
        Ok(())
    }

    /// Scale the stage time for the ambient temperature, in °C.
    pub fn set_temperature(&mut self, temperature: i16) {
        self.panel.timing.set_temperature(temperature);
        debug!(
            "{}°C: stage time {}ms",
            temperature,
            self.panel.timing.effective_ms()
        );
    }

    pub fn reset_temperature(&mut self) {
        self.set_temperature(DEFAULT_TEMPERATURE);
    }

    /// Time budget of each stage, in ms.
    pub fn stage_time_ms(&self) -> u32 {
        self.panel.timing.effective_ms()
    }

    /// Drive the whole panel white, from whatever it shows.
    pub fn clear(&mut self) -> Result<(), DisplayError> {
        self.framebuf.fill(0x00);

        self.panel
            .refresh(&mut FrameSource::Fixed(0xff), &mut FrameSource::Fixed(0xaa))
    }

    /// Replace the panel content with `image`, 1 bit per pixel, row-major,
    /// MSB first, 1 is black.
    pub fn update(&mut self, image: &[u8]) -> Result<(), DisplayError> {
        if image.len() != self.framebuf.len() {
            return Err(DisplayError::InvalidBufferLength);
        }

        self.panel.refresh(
            &mut FrameSource::Image(&self.framebuf),
            &mut FrameSource::Image(image),
        )?;

        self.framebuf.copy_from_slice(image);
        Ok(())
    }

    /// Like [`Epd::update`], with the new image read row by row from `reader`,
    /// starting at `address`.
    ///
    /// `scratch` holds one row and must be at least `bytes_per_line` long.
    pub fn update_from_reader<R: FrameReader>(
        &mut self,
        address: u32,
        reader: &mut R,
        scratch: &mut [u8],
    ) -> Result<(), DisplayError> {
        let bytes_per_line = self.panel.geometry.bytes_per_line();
        if scratch.len() < bytes_per_line {
            return Err(DisplayError::InvalidBufferLength);
        }

        self.panel.refresh(
            &mut FrameSource::Image(&self.framebuf),
            &mut FrameSource::Reader {
                address,
                reader: &mut *reader,
                scratch,
            },
        )?;

        for (row, line) in self.framebuf.chunks_exact_mut(bytes_per_line).enumerate() {
            reader.read(address.wrapping_add((row * bytes_per_line) as u32), line);
        }
        Ok(())
    }

    /// The image the panel currently shows.
    pub fn frame_buffer(&self) -> &[u8] {
        &self.framebuf
    }

    pub fn geometry(&self) -> &PanelGeometry {
        &self.panel.geometry
    }

    pub fn config(&self) -> &PanelConfig {
        &self.panel.config
    }

    pub fn state(&self) -> PanelState {
        self.panel.state
    }

    pub fn release(self) -> (DI, CLK) {
        (self.panel.interface, self.panel.clock)
    }
}
