//! Single-byte exchange over the clock, command and data lines.

use embedded_hal::delay::DelayNs;

use crate::lines::{LinePort, OutputLine};

/// Clock one byte out on the command line and one byte in from the data
/// line, least significant bit first in both directions.
///
/// For each bit: drive command, pulse clock low then high for one
/// `half_cycle_ns` each, and sample data after the rising edge. A pad that
/// does not answer just leaves the data line at its idle level, which comes
/// back as garbage bits rather than an error.
pub fn transfer_byte<L, D>(
    lines: &mut L,
    delay: &mut D,
    half_cycle_ns: u32,
    mut out: u8,
) -> Result<u8, L::Error>
where
    L: LinePort,
    D: DelayNs,
{
    let mut received = 0u8;

    for _ in 0..8 {
        lines.set_level(OutputLine::Command, out & 0x01 != 0)?;
        out >>= 1;

        lines.set_low(OutputLine::Clock)?;
        delay.delay_ns(half_cycle_ns);

        lines.set_high(OutputLine::Clock)?;
        delay.delay_ns(half_cycle_ns);

        received >>= 1;
        if lines.read_data()? {
            received |= 0x80;
        }
    }

    Ok(received)
}
