//! Panel variant configuration.
//!
//! G1 COG panels share one driving sequence; sizes differ only in the
//! channel-select mask, the gate/source voltage level, whether a trailing
//! filler byte ends each line, and the base stage time.
// https://github.com/repaper/gratis/blob/master/PlatformWithOS/driver-common/EPD.c

use crate::geometry::PanelGeometry;
use crate::interface::BusyWait;

/// Data packet written to the channel select register, header included.
pub type ChannelSelect = [u8; 9];
/// Data packet written to the gate/source voltage register, header included.
pub type GateSource = [u8; 2];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PanelConfig {
    pub channel_select: ChannelSelect,
    pub gate_source: GateSource,
    /// Send an extra 0x00 after the odd pixels of each line
    pub filler: bool,
    /// Stage time at 25°C, in ms
    pub stage_time_ms: u16,
    pub busy_wait: BusyWait,
}

impl PanelConfig {
    pub const fn with_busy_wait(mut self, busy_wait: BusyWait) -> Self {
        self.busy_wait = busy_wait;
        self
    }

    pub const fn with_stage_time(mut self, stage_time_ms: u16) -> Self {
        self.stage_time_ms = stage_time_ms;
        self
    }
}

/// Known G1 COG panel sizes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PanelSize {
    /// 1.44", 128 x 96
    Epd144,
    /// 2.0", 200 x 96
    Epd200,
    /// 2.7", 264 x 176
    Epd270,
}

impl PanelSize {
    pub const fn config(self) -> PanelConfig {
        match self {
            PanelSize::Epd144 => PanelConfig {
                channel_select: [0x72, 0x00, 0x00, 0x00, 0x00, 0x00, 0x0f, 0xff, 0x00],
                gate_source: [0x72, 0x03],
                filler: false,
                stage_time_ms: 480,
                busy_wait: BusyWait::Forever,
            },
            PanelSize::Epd200 => PanelConfig {
                channel_select: [0x72, 0x00, 0x00, 0x00, 0x00, 0x01, 0xff, 0xe0, 0x00],
                gate_source: [0x72, 0x03],
                filler: false,
                stage_time_ms: 480,
                busy_wait: BusyWait::Forever,
            },
            PanelSize::Epd270 => PanelConfig {
                channel_select: [0x72, 0x00, 0x00, 0x00, 0x7f, 0xff, 0xfe, 0x00, 0x00],
                gate_source: [0x72, 0x00],
                filler: true,
                stage_time_ms: 630,
                busy_wait: BusyWait::Forever,
            },
        }
    }

    pub const fn geometry(self) -> PanelGeometry {
        let (width, height) = match self {
            PanelSize::Epd144 => (128, 96),
            PanelSize::Epd200 => (200, 96),
            PanelSize::Epd270 => (264, 176),
        };
        match PanelGeometry::new(width, height) {
            Ok(g) => g,
            Err(_) => unreachable!(),
        }
    }
}
