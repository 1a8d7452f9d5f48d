use crate::config::GpioConfig;
use anyhow::{Context, Result};
use linux_embedded_hal::gpio_cdev::{Chip, LineRequestFlags};
use linux_embedded_hal::CdevPin;
use log::{debug, info};
use psx_link::sim::{SimulatedPad, DIGITAL_IDLE};
use psx_link::{HalLines, Pad};

const CONSUMER: &str = "psx-pad-daemon";

pub type CdevLines = HalLines<CdevPin, CdevPin>;
pub type RppalLines = HalLines<rppal::gpio::OutputPin, rppal::gpio::InputPin>;

/// Request the link's lines from a GPIO character device.
pub fn open_cdev(config: &GpioConfig) -> Result<CdevLines> {
    let mut chip = Chip::new(&config.chip)
        .context(format!("Failed to open GPIO chip: {}", config.chip))?;
    info!("Using GPIO chip {}", config.chip);

    let clock = cdev_output(&mut chip, config.clock, 1)?;
    let command = cdev_output(&mut chip, config.command, 0)?;
    let data = cdev_input(&mut chip, config.data)?;
    let attention1 = cdev_output(&mut chip, config.attention1, 1)?;

    let mut lines = HalLines::new(clock, command, data, attention1);
    if let Some(offset) = config.attention2 {
        lines = lines.with_attention2(cdev_output(&mut chip, offset, 1)?);
    }
    if let Some(offset) = config.acknowledge {
        lines = lines.with_acknowledge(cdev_input(&mut chip, offset)?);
    }
    Ok(lines)
}

fn cdev_output(chip: &mut Chip, offset: u32, initial: u8) -> Result<CdevPin> {
    debug!("Requesting output line {}", offset);
    let handle = chip
        .get_line(offset)
        .context(format!("Failed to get GPIO line {}", offset))?
        .request(LineRequestFlags::OUTPUT, initial, CONSUMER)
        .context(format!("Failed to request GPIO line {} as output", offset))?;
    CdevPin::new(handle).context(format!("Failed to wrap GPIO line {}", offset))
}

fn cdev_input(chip: &mut Chip, offset: u32) -> Result<CdevPin> {
    debug!("Requesting input line {}", offset);
    let handle = chip
        .get_line(offset)
        .context(format!("Failed to get GPIO line {}", offset))?
        .request(LineRequestFlags::INPUT, 0, CONSUMER)
        .context(format!("Failed to request GPIO line {} as input", offset))?;
    CdevPin::new(handle).context(format!("Failed to wrap GPIO line {}", offset))
}

/// Claim the link's lines on a Raspberry Pi. Inputs get the internal
/// pull-up in addition to the external one the data line needs.
pub fn open_rppal(config: &GpioConfig) -> Result<RppalLines> {
    let gpio = rppal::gpio::Gpio::new().context("Failed to open Raspberry Pi GPIO")?;

    let pin = |n: u32| -> Result<rppal::gpio::Pin> {
        let bcm = u8::try_from(n).context(format!("GPIO {} out of range", n))?;
        gpio.get(bcm).context(format!("Failed to claim GPIO {}", bcm))
    };

    let clock = pin(config.clock)?.into_output_high();
    let command = pin(config.command)?.into_output_low();
    let data = pin(config.data)?.into_input_pullup();
    let attention1 = pin(config.attention1)?.into_output_high();

    let mut lines = HalLines::new(clock, command, data, attention1);
    if let Some(n) = config.attention2 {
        lines = lines.with_attention2(pin(n)?.into_output_high());
    }
    if let Some(n) = config.acknowledge {
        lines = lines.with_acknowledge(pin(n)?.into_input_pullup());
    }
    Ok(lines)
}

/// Software pads standing in for the wiring in `config`. Every pad with an
/// attention line is plugged in and idle.
pub fn open_simulated(config: &GpioConfig) -> SimulatedPad {
    let mut sim = SimulatedPad::new();
    if config.attention2.is_none() {
        sim = sim.without_attention2();
    }
    for pad in Pad::ALL {
        if pad == Pad::One || config.attention2.is_some() {
            sim.connect(pad, DIGITAL_IDLE);
        }
    }
    sim
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Backend;
    use psx_link::LinePort;

    fn gpio(attention2: Option<u32>) -> GpioConfig {
        GpioConfig {
            backend: Backend::Simulated,
            chip: "/dev/null".to_string(),
            clock: 4,
            command: 3,
            data: 2,
            attention1: 5,
            attention2,
            acknowledge: None,
        }
    }

    #[test]
    fn test_simulated_follows_wiring() {
        let sim = open_simulated(&gpio(None));
        assert!(sim.has_attention(Pad::One));
        assert!(!sim.has_attention(Pad::Two));

        let sim = open_simulated(&gpio(Some(6)));
        assert!(sim.has_attention(Pad::Two));
    }

    #[test]
    fn test_cdev_missing_chip() {
        let mut config = gpio(None);
        config.chip = "/nonexistent/gpiochip".to_string();
        assert!(open_cdev(&config).is_err());
    }
}
