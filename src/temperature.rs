//! Temperature compensation of the stage time.
//!
//! The electrophoretic particles move slower in the cold, so each stage is
//! repeated for longer.

pub const DEFAULT_TEMPERATURE: i16 = 25;

/// Stage time scale factor, in tenths.
pub const fn factor_10x(temperature: i16) -> u16 {
    match temperature {
        i16::MIN..=-10 => 170,
        -9..=-5 => 120,
        -4..=5 => 80,
        6..=10 => 40,
        11..=15 => 30,
        16..=20 => 20,
        21..=40 => 10,
        _ => 7,
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StageTiming {
    base_ms: u16,
    factor_10x: u16,
    effective_ms: u32,
}

impl StageTiming {
    pub const fn new(base_ms: u16) -> Self {
        let factor_10x = factor_10x(DEFAULT_TEMPERATURE);
        Self {
            base_ms,
            factor_10x,
            effective_ms: base_ms as u32 * factor_10x as u32 / 10,
        }
    }

    pub fn set_temperature(&mut self, temperature: i16) {
        self.factor_10x = factor_10x(temperature);
        self.effective_ms = self.base_ms as u32 * self.factor_10x as u32 / 10;
    }

    pub const fn base_ms(&self) -> u16 {
        self.base_ms
    }

    pub const fn factor_10x(&self) -> u16 {
        self.factor_10x
    }

    /// Time budget of one stage pass.
    pub const fn effective_ms(&self) -> u32 {
        self.effective_ms
    }
}
