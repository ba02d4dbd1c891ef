use crate::interface::DisplayError;

/// Panel resolution and the byte counts derived from it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PanelGeometry {
    width: u16,
    height: u16,
}

impl PanelGeometry {
    /// Width must be a multiple of 8 (one byte of pixels), height a multiple
    /// of 4 (one scan-select byte).
    pub const fn new(width: u16, height: u16) -> Result<Self, DisplayError> {
        if width == 0 || height == 0 || width % 8 != 0 || height % 4 != 0 {
            return Err(DisplayError::InvalidGeometry);
        }
        Ok(Self { width, height })
    }

    pub const fn width(&self) -> u16 {
        self.width
    }

    pub const fn height(&self) -> u16 {
        self.height
    }

    pub const fn bytes_per_line(&self) -> usize {
        (self.width as usize + 7) / 8
    }

    /// Scan-select bytes per line, 2 bits per gate line.
    pub const fn bytes_per_scan(&self) -> usize {
        (self.height as usize + 3) / 4
    }

    /// Size of a packed 1-bit image.
    pub const fn frame_len(&self) -> usize {
        self.bytes_per_line() * self.height as usize
    }
}
