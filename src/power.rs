//! COG power sequencing.
//!
//! Order and delays are fixed by the COG.

use crate::command::{Register, HEADER_DATA};
use crate::config::PanelConfig;
use crate::interface::{ControlLine, DisplayError, DisplayInterface};
use crate::line::{write_line, write_register, LineEncoder, LineSource, Stage, DUMMY_LINE};
use crate::stage::{sweep, FrameSource};

/// Energize the COG and bring up its charge pumps.
pub fn power_on<DI: DisplayInterface>(di: &mut DI, config: &PanelConfig) -> Result<(), DisplayError> {
    debug!("COG power on");
    di.transfer_byte(0x00)?;

    // initial state
    di.set_line(ControlLine::Reset, false)?;
    di.set_line(ControlLine::PanelOn, false)?;
    di.set_line(ControlLine::Discharge, false)?;
    di.set_line(ControlLine::Border, false)?;
    di.set_line(ControlLine::ChipSelect, false)?;

    // power up
    di.set_line(ControlLine::PanelOn, true)?;
    di.set_line(ControlLine::ChipSelect, true)?;
    di.set_line(ControlLine::Border, true)?;
    di.delay_ms(5);

    di.set_line(ControlLine::Reset, false)?;
    di.delay_ms(5);
    di.set_line(ControlLine::Reset, true)?;

    di.wait_ready()?;

    write_register(di, Register::ChannelSelect, &config.channel_select)?;
    write_register(di, Register::DcDcFrequency, &[HEADER_DATA, 0xff])?;
    // high power mode osc
    write_register(di, Register::Oscillator, &[HEADER_DATA, 0x9d])?;
    // disable ADC
    write_register(di, Register::Adc, &[HEADER_DATA, 0x00])?;
    write_register(di, Register::VcomLevel, &[HEADER_DATA, 0xd0, 0x00])?;
    write_register(di, Register::ChargePumpVoltage, &config.gate_source)?;
    di.delay_ms(5);

    // driver latch on, then off
    write_register(di, Register::DriverLatch, &[HEADER_DATA, 0x01])?;
    write_register(di, Register::DriverLatch, &[HEADER_DATA, 0x00])?;
    di.delay_ms(5);

    // charge pump positive voltage on, then negative
    write_register(di, Register::ChargePumpControl, &[HEADER_DATA, 0x01])?;
    write_register(di, Register::ChargePumpControl, &[HEADER_DATA, 0x03])?;
    di.delay_ms(30);

    // Vcom driver on
    write_register(di, Register::ChargePumpControl, &[HEADER_DATA, 0x0f])?;
    di.delay_ms(30);

    write_register(di, Register::OutputEnable, &[HEADER_DATA, 0x24])?;
    Ok(())
}

/// Discharge the panel and shut the COG down.
///
/// Every step runs even when an earlier one fails, so the control lines always
/// end low and the discharge pulse is always given. Returns the first error.
pub fn power_off<DI: DisplayInterface>(
    di: &mut DI,
    config: &PanelConfig,
    encoder: &LineEncoder,
    height: u16,
) -> Result<(), DisplayError> {
    debug!("COG power off");

    // dummy frame and dummy line prime the discharge
    let primer = sweep(
        di,
        encoder,
        &config.gate_source,
        height,
        &mut FrameSource::Fixed(0x55),
        Stage::Normal,
    )
    .and_then(|_| {
        write_line(
            di,
            encoder,
            &config.gate_source,
            DUMMY_LINE,
            LineSource::Fixed(0x55),
            Stage::Normal,
        )
    });
    if let Err(e) = primer {
        warn!("dummy frame failed: {:?}", e);
    }
    di.delay_ms(25);

    let teardown = shutdown_cog(di);
    if let Err(e) = teardown {
        warn!("COG shutdown failed: {:?}", e);
    }

    // power and all signals off
    let mut ret = primer.and(teardown);
    for line in [
        ControlLine::Reset,
        ControlLine::PanelOn,
        ControlLine::Border,
        ControlLine::ChipSelect,
    ] {
        ret = ret.and(di.set_line(line, false));
    }

    ret = ret.and(di.set_line(ControlLine::Discharge, true));
    ret = ret.and(di.transfer_byte(0x00).map(|_| ()));
    di.delay_ms(150);
    ret.and(di.set_line(ControlLine::Discharge, false))
}

/// Border pulse, then switch off the drivers, the charge pumps and the
/// oscillator.
fn shutdown_cog<DI: DisplayInterface>(di: &mut DI) -> Result<(), DisplayError> {
    di.set_line(ControlLine::Border, false)?;
    di.delay_ms(30);
    di.set_line(ControlLine::Border, true)?;

    // latch reset on
    write_register(di, Register::DriverLatch, &[HEADER_DATA, 0x01])?;
    // output enable off
    write_register(di, Register::OutputEnable, &[HEADER_DATA, 0x05])?;
    // Vcom off
    write_register(di, Register::ChargePumpControl, &[HEADER_DATA, 0x0e])?;
    // negative charge pump off
    write_register(di, Register::ChargePumpControl, &[HEADER_DATA, 0x02])?;
    // discharge
    write_register(di, Register::ChargePumpVoltage, &[HEADER_DATA, 0x0c])?;
    di.delay_ms(120);

    // all charge pumps off
    write_register(di, Register::ChargePumpControl, &[HEADER_DATA, 0x00])?;
    // osc off
    write_register(di, Register::Oscillator, &[HEADER_DATA, 0x0d])?;

    // internal discharge
    write_register(di, Register::ChargePumpVoltage, &[HEADER_DATA, 0x50])?;
    di.delay_ms(40);
    write_register(di, Register::ChargePumpVoltage, &[HEADER_DATA, 0xa0])?;
    di.delay_ms(40);
    write_register(di, Register::ChargePumpVoltage, &[HEADER_DATA, 0x00])
}
