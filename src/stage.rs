//! Stage passes: full-frame sweeps repeated until the stage time is used up.

use crate::config::GateSource;
use crate::interface::{DisplayError, DisplayInterface};
use crate::line::{write_line, LineEncoder, LineSource, Stage};

/// Free running millisecond counter, allowed to wrap.
pub trait Monotonic {
    fn now_ms(&mut self) -> u32;
}

impl<F: FnMut() -> u32> Monotonic for F {
    fn now_ms(&mut self) -> u32 {
        self()
    }
}

/// Milliseconds from `start` to `end`, across a counter wrap.
pub const fn elapsed_ms(start: u32, end: u32) -> u32 {
    end.wrapping_sub(start)
}

/// Reads image rows from storage outside the MCU RAM, e.g. SPI flash.
pub trait FrameReader {
    /// Fill `buf` with the bytes at `address`.
    fn read(&mut self, address: u32, buf: &mut [u8]);
}

impl<F: FnMut(u32, &mut [u8])> FrameReader for F {
    fn read(&mut self, address: u32, buf: &mut [u8]) {
        self(address, buf)
    }
}

/// Where the lines of a sweep come from.
pub enum FrameSource<'a> {
    Fixed(u8),
    /// Packed image, `bytes_per_line * height` long
    Image(&'a [u8]),
    /// Rows read one at a time into `scratch`, starting at `address`
    Reader {
        address: u32,
        reader: &'a mut dyn FrameReader,
        scratch: &'a mut [u8],
    },
}

/// Write every line of the panel once.
pub fn sweep<DI: DisplayInterface>(
    di: &mut DI,
    encoder: &LineEncoder,
    gate_source: &GateSource,
    height: u16,
    source: &mut FrameSource<'_>,
    stage: Stage,
) -> Result<(), DisplayError> {
    let bytes_per_line = encoder.bytes_per_line();

    for row in 0..height {
        let offset = row as usize * bytes_per_line;
        let line = match source {
            FrameSource::Fixed(value) => LineSource::Fixed(*value),
            FrameSource::Image(image) => LineSource::Row(&image[offset..offset + bytes_per_line]),
            FrameSource::Reader {
                address,
                reader,
                scratch,
            } => {
                let buf = &mut scratch[..bytes_per_line];
                reader.read(address.wrapping_add(offset as u32), buf);
                LineSource::Row(buf)
            }
        };
        write_line(di, encoder, gate_source, row, line, stage)?;
    }
    Ok(())
}

/// Repeat full sweeps until `budget_ms` has elapsed.
///
/// At least one sweep always runs, however small the budget. Returns the
/// number of sweeps.
#[allow(clippy::too_many_arguments)]
pub fn run_stage_for_budget<DI: DisplayInterface, CLK: Monotonic>(
    di: &mut DI,
    clock: &mut CLK,
    encoder: &LineEncoder,
    gate_source: &GateSource,
    height: u16,
    budget_ms: u32,
    source: &mut FrameSource<'_>,
    stage: Stage,
) -> Result<u32, DisplayError> {
    let mut remaining = budget_ms as i64;
    let mut sweeps = 0;
    loop {
        let start = clock.now_ms();
        sweep(di, encoder, gate_source, height, source, stage)?;
        let end = clock.now_ms();

        sweeps += 1;
        remaining -= elapsed_ms(start, end) as i64;
        if remaining <= 0 {
            break;
        }
    }
    trace!("stage {:?}: {} sweeps in {}ms", stage, sweeps, budget_ms);
    Ok(sweeps)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn elapsed_without_wrap() {
        assert_eq!(elapsed_ms(1_000, 1_630), 630);
        assert_eq!(elapsed_ms(5, 5), 0);
    }

    #[test]
    fn elapsed_across_wrap() {
        assert_eq!(elapsed_ms(u32::MAX - 9, 20), 30);
        assert_eq!(elapsed_ms(u32::MAX, 0), 1);
    }

    #[test]
    fn closures_are_clocks_and_readers() {
        let mut t = 41;
        let mut clock = move || {
            t += 1;
            t
        };
        assert_eq!(Monotonic::now_ms(&mut clock), 42);

        let mut reader = |address: u32, buf: &mut [u8]| buf.fill(address as u8);
        let mut buf = [0u8; 3];
        FrameReader::read(&mut reader, 7, &mut buf);
        assert_eq!(buf, [7, 7, 7]);
    }
}
