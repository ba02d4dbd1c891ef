//! Frame buffer for embedded-graphics.
//!
//! Draw into a [`FrameBuffer`], then hand [`FrameBuffer::as_bytes`] to
//! [`crate::Epd::update`]. The flush is not part of embedded-graphics API.

use alloc::vec::Vec;

use embedded_graphics::{
    draw_target::DrawTarget,
    pixelcolor::BinaryColor,
    prelude::*,
};

use crate::geometry::PanelGeometry;
use crate::interface::DisplayError;

/// Rotation of the display.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum DisplayRotation {
    /// No rotation, normal display
    #[default]
    Rotate0,
    /// Rotate by 90 degress clockwise
    Rotate90,
    /// Rotate by 180 degress clockwise
    Rotate180,
    /// Rotate 270 degress clockwise
    Rotate270,
}

/// 1 bit per pixel, row-major, MSB first. `BinaryColor::On` is black.
#[derive(Clone)]
pub struct FrameBuffer {
    buf: Vec<u8>,
    geometry: PanelGeometry,
    rotation: DisplayRotation,
}

impl FrameBuffer {
    /// A white frame.
    pub fn new(geometry: PanelGeometry) -> Result<Self, DisplayError> {
        let len = geometry.frame_len();
        let mut buf = Vec::new();
        buf.try_reserve_exact(len)
            .map_err(|_| DisplayError::OutOfMemory)?;
        buf.resize(len, 0x00);

        Ok(Self {
            buf,
            geometry,
            rotation: DisplayRotation::Rotate0,
        })
    }

    pub fn clear(&mut self) {
        self.fill(BinaryColor::Off);
    }

    pub fn fill(&mut self, color: BinaryColor) {
        let raw = match color {
            BinaryColor::On => 0xff,
            BinaryColor::Off => 0x00,
        };
        self.buf.fill(raw)
    }

    pub fn set_rotation(&mut self, rotation: DisplayRotation) {
        self.rotation = rotation;
    }

    pub fn rotation(&self) -> DisplayRotation {
        self.rotation
    }

    pub fn geometry(&self) -> &PanelGeometry {
        &self.geometry
    }

    fn set_pixel(&mut self, x: usize, y: usize, black: bool) {
        let width = self.geometry.width() as usize;
        let height = self.geometry.height() as usize;

        let (w, h) = match self.rotation {
            DisplayRotation::Rotate0 | DisplayRotation::Rotate180 => (width, height),
            _ => (height, width),
        };
        if x >= w || y >= h {
            return;
        }

        let (x, y) = match self.rotation {
            DisplayRotation::Rotate0 => (x, y),
            DisplayRotation::Rotate90 => (width - y - 1, x),
            DisplayRotation::Rotate180 => (width - x - 1, height - y - 1),
            DisplayRotation::Rotate270 => (y, height - x - 1),
        };

        let byte_offset = y * self.geometry.bytes_per_line() + x / 8;
        if black {
            self.buf[byte_offset] |= 0x80 >> (x % 8);
        } else {
            self.buf[byte_offset] &= !(0x80 >> (x % 8));
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }
}

impl OriginDimensions for FrameBuffer {
    fn size(&self) -> Size {
        let (w, h) = (self.geometry.width() as u32, self.geometry.height() as u32);
        match self.rotation {
            DisplayRotation::Rotate0 | DisplayRotation::Rotate180 => Size::new(w, h),
            _ => Size::new(h, w),
        }
    }
}

impl DrawTarget for FrameBuffer {
    type Color = BinaryColor;
    type Error = core::convert::Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(coord, color) in pixels.into_iter() {
            if let Ok((x, y)) = TryInto::<(u32, u32)>::try_into(coord) {
                self.set_pixel(x as _, y as _, color.is_on());
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_graphics::primitives::{PrimitiveStyle, Rectangle};

    fn frame() -> FrameBuffer {
        FrameBuffer::new(PanelGeometry::new(16, 8).unwrap()).unwrap()
    }

    #[test]
    fn starts_white() {
        let fb = frame();
        assert_eq!(fb.as_bytes().len(), 16);
        assert!(fb.as_bytes().iter().all(|&b| b == 0));
    }

    #[test]
    fn pixels_are_msb_first() {
        let mut fb = frame();
        Pixel(Point::new(0, 0), BinaryColor::On).draw(&mut fb).unwrap();
        Pixel(Point::new(9, 1), BinaryColor::On).draw(&mut fb).unwrap();
        assert_eq!(fb.as_bytes()[0], 0x80);
        assert_eq!(fb.as_bytes()[3], 0x40);

        Pixel(Point::new(0, 0), BinaryColor::Off).draw(&mut fb).unwrap();
        assert_eq!(fb.as_bytes()[0], 0x00);
    }

    #[test]
    fn out_of_bounds_is_ignored() {
        let mut fb = frame();
        Pixel(Point::new(16, 0), BinaryColor::On).draw(&mut fb).unwrap();
        Pixel(Point::new(-1, 0), BinaryColor::On).draw(&mut fb).unwrap();
        assert!(fb.as_bytes().iter().all(|&b| b == 0));
    }

    #[test]
    fn rotation_swaps_axes() {
        let mut fb = frame();
        fb.set_rotation(DisplayRotation::Rotate90);
        assert_eq!(fb.size(), Size::new(8, 16));

        // logical (0, 0) is the top right corner of the panel
        Pixel(Point::new(0, 0), BinaryColor::On).draw(&mut fb).unwrap();
        assert_eq!(fb.as_bytes()[1], 0x01);
    }

    #[test]
    fn draws_primitives() {
        let mut fb = frame();
        Rectangle::new(Point::new(0, 2), Size::new(16, 1))
            .into_styled(PrimitiveStyle::with_fill(BinaryColor::On))
            .draw(&mut fb)
            .unwrap();
        assert_eq!(&fb.as_bytes()[4..6], &[0xff, 0xff]);
        assert_eq!(fb.as_bytes().iter().filter(|&&b| b != 0).count(), 2);
    }
}
