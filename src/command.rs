//! Register Table
//!
//! Every COG register write is two chip-select framed packets:
//! `<<0x70, index:u8>>` selects the register, `<<0x72, data..>>` writes it.

/// Header byte of a register index packet.
pub const HEADER_INDEX: u8 = 0x70;
/// Header byte of a register data packet.
pub const HEADER_DATA: u8 = 0x72;

#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Register {
    /// Channel select, 8 bytes of source channel mask
    ChannelSelect = 0x01,
    /// Output enable
    ///
    /// - 0x24: enable, after power on
    /// - 0x2f: output latched line data to the panel
    /// - 0x05: disable, before power off
    OutputEnable = 0x02,
    /// Driver latch
    ///
    /// <<0:b7, A:b1>>, A=1 latch on / latch reset
    DriverLatch = 0x03,
    /// Gate and source voltage levels (charge pump voltage)
    ///
    /// Also used for the internal discharge steps on power off.
    ChargePumpVoltage = 0x04,
    /// Charge pump control
    ///
    /// - 0x01: positive voltage on
    /// - 0x03: negative voltage on
    /// - 0x0f: Vcom driver on
    /// - 0x0e: Vcom off
    /// - 0x02: negative charge pump off
    /// - 0x00: all charge pumps off
    ChargePumpControl = 0x05,
    /// DC/DC frequency
    DcDcFrequency = 0x06,
    /// Oscillator mode
    ///
    /// - 0x9d: high power mode osc
    /// - 0x0d: osc off
    Oscillator = 0x07,
    /// ADC, 0x00 disables
    Adc = 0x08,
    /// Vcom level, 2 bytes
    VcomLevel = 0x09,
    /// Line data, pixel bytes follow busy-gated
    LineData = 0x0a,
}

impl Register {
    /// The register index packet.
    pub const fn index(self) -> [u8; 2] {
        [HEADER_INDEX, self as u8]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_packet() {
        assert_eq!(Register::LineData.index(), [0x70, 0x0a]);
        assert_eq!(Register::ChannelSelect.index(), [0x70, 0x01]);
    }
}
