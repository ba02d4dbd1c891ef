//! Line encoding.
//!
//! A line packet is: even pixels (right to left), one scan-select byte per four
//! gate lines, odd pixels (left to right), then an optional filler byte. Each
//! pixel occupies 2 bits on the wire:
//!
//! - `0b11`: black
//! - `0b10`: white
//! - `0b01`/`0b00`: nothing, keep the particle where it is

use crate::command::{Register, HEADER_DATA};
use crate::config::GateSource;
use crate::geometry::PanelGeometry;
use crate::interface::{ControlLine, DisplayError, DisplayInterface};

/// Row index whose scan-select group is all zero, strobing no gate line.
pub const DUMMY_LINE: u16 = 0x7fff;

/// Output latched line data to the panel.
const OUTPUT_LINE: [u8; 2] = [HEADER_DATA, 0x2f];

/// One pass of the image transition waveform.
///
/// The four stages always run in declaration order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Stage {
    /// B -> W, W -> B (current image)
    Compensate,
    /// B -> N, W -> W (current image)
    White,
    /// B -> N, W -> B (new image)
    Inverse,
    /// B -> B, W -> W (new image)
    Normal,
}

impl Stage {
    pub const ALL: [Stage; 4] = [Stage::Compensate, Stage::White, Stage::Inverse, Stage::Normal];
}

/// Pixels of one line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LineSource<'a> {
    /// Every pixel byte is the given value, sent as-is
    Fixed(u8),
    /// One packed image row, `bytes_per_line` long
    Row(&'a [u8]),
}

/// Encode the pixels at even bit positions of `data`.
pub const fn even_byte(stage: Stage, data: u8) -> u8 {
    let pixels = data & 0x55;
    let pixels = match stage {
        Stage::Compensate => 0xaa | (pixels ^ 0x55),
        Stage::White => 0x55 + (pixels ^ 0x55),
        Stage::Inverse => 0x55 | ((pixels ^ 0x55) << 1),
        Stage::Normal => 0xaa | pixels,
    };
    // pixel pairs go out in reverse order
    let p1 = pixels & 0x03;
    let p2 = (pixels >> 2) & 0x03;
    let p3 = (pixels >> 4) & 0x03;
    let p4 = (pixels >> 6) & 0x03;
    (p1 << 6) | (p2 << 4) | (p3 << 2) | p4
}

/// Encode the pixels at odd bit positions of `data`.
pub const fn odd_byte(stage: Stage, data: u8) -> u8 {
    let pixels = data & 0xaa;
    match stage {
        Stage::Compensate => 0xaa | ((pixels ^ 0xaa) >> 1),
        Stage::White => 0x55 + ((pixels ^ 0xaa) >> 1),
        Stage::Inverse => 0x55 | (pixels ^ 0xaa),
        Stage::Normal => 0xaa | (pixels >> 1),
    }
}

/// Scan-select byte `index` of `row`: only byte `row / 4` is set, to the
/// 2-bit field of `row % 4`.
pub const fn scan_byte(row: u16, index: usize) -> u8 {
    if (row / 4) as usize == index {
        0xc0 >> (2 * (row & 0x03))
    } else {
        0x00
    }
}

/// Turns image rows into COG line packets.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LineEncoder {
    bytes_per_line: usize,
    bytes_per_scan: usize,
    filler: bool,
}

impl LineEncoder {
    pub const fn new(geometry: &PanelGeometry, filler: bool) -> Self {
        Self {
            bytes_per_line: geometry.bytes_per_line(),
            bytes_per_scan: geometry.bytes_per_scan(),
            filler,
        }
    }

    pub const fn bytes_per_line(&self) -> usize {
        self.bytes_per_line
    }

    pub const fn bytes_per_scan(&self) -> usize {
        self.bytes_per_scan
    }

    /// Number of payload bytes per line, excluding the data header.
    pub const fn payload_len(&self) -> usize {
        2 * self.bytes_per_line + self.bytes_per_scan + self.filler as usize
    }

    /// The line payload, in wire order.
    ///
    /// A `Row` source shorter than `bytes_per_line` is a programming error and
    /// panics.
    pub fn payload<'a>(
        &self,
        row: u16,
        source: LineSource<'a>,
        stage: Stage,
    ) -> impl Iterator<Item = u8> + 'a {
        let pixel = move |b: usize, encode: fn(Stage, u8) -> u8| match source {
            LineSource::Fixed(value) => value,
            LineSource::Row(data) => encode(stage, data[b]),
        };

        let even = (0..self.bytes_per_line)
            .rev()
            .map(move |b| pixel(b, even_byte));
        let scan = (0..self.bytes_per_scan).map(move |b| scan_byte(row, b));
        let odd = (0..self.bytes_per_line).map(move |b| pixel(b, odd_byte));
        let filler = self.filler.then_some(0x00);

        even.chain(scan).chain(odd).chain(filler)
    }
}

/// Write a register, index packet then data packet.
pub(crate) fn write_register<DI: DisplayInterface>(
    di: &mut DI,
    register: Register,
    data: &[u8],
) -> Result<(), DisplayError> {
    di.send(&register.index())?;
    di.send(data)
}

/// Send one line to the COG and latch it to the panel.
pub fn write_line<DI: DisplayInterface>(
    di: &mut DI,
    encoder: &LineEncoder,
    gate_source: &GateSource,
    row: u16,
    source: LineSource<'_>,
    stage: Stage,
) -> Result<(), DisplayError> {
    // the COG needs the voltage levels before every line
    write_register(di, Register::ChargePumpVoltage, gate_source)?;

    di.send(&Register::LineData.index())?;

    di.set_line(ControlLine::ChipSelect, false)?;
    let ret = di
        .put_wait(HEADER_DATA)
        .and_then(|_| {
            encoder
                .payload(row, source, stage)
                .try_for_each(|byte| di.put_wait(byte))
        })
        .and_then(|_| di.flush());
    di.set_line(ControlLine::ChipSelect, true)?;
    ret?;

    write_register(di, Register::OutputEnable, &OUTPUT_LINE)
}
