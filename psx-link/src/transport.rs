//! Frames one 9-byte exchange around an attention assertion.

use embedded_hal::delay::DelayNs;
use log::trace;

use crate::bitclock;
use crate::error::Error;
use crate::frame::{Frame, FRAME_LEN};
use crate::lines::{LinePort, OutputLine, Pad};
use crate::timing::{as_nanos, TimingProfile};

/// Owns the lines and the delay source, and runs whole frames over them.
///
/// Pads share clock, command and data, so only one frame may be on the
/// wire at a time; `&mut self` on [`FrameTransport::transact`] enforces it.
pub struct FrameTransport<L, D> {
    lines: L,
    delay: D,
    timing: TimingProfile,
}

impl<L, D> FrameTransport<L, D>
where
    L: LinePort,
    D: DelayNs,
{
    /// Take the lines and park them idle: clock high, command low and every
    /// wired attention line released.
    pub fn new(mut lines: L, delay: D, timing: TimingProfile) -> Result<Self, Error<L::Error>> {
        lines.set_high(OutputLine::Clock)?;
        lines.set_low(OutputLine::Command)?;
        for pad in Pad::ALL {
            if lines.has_attention(pad) {
                lines.set_high(OutputLine::Attention(pad))?;
            }
        }

        Ok(FrameTransport {
            lines,
            delay,
            timing,
        })
    }

    pub fn timing(&self) -> &TimingProfile {
        &self.timing
    }

    pub fn lines(&self) -> &L {
        &self.lines
    }

    pub fn lines_mut(&mut self) -> &mut L {
        &mut self.lines
    }

    pub fn delay_mut(&mut self) -> &mut D {
        &mut self.delay
    }

    pub fn release(self) -> (L, D) {
        (self.lines, self.delay)
    }

    /// Exchange one frame with `pad`.
    ///
    /// `command` may be shorter than a frame; the remaining positions are
    /// sent as `0x00`. Bytes past the ninth are ignored. Once attention is
    /// asserted it is always released again, so a host line failure part
    /// way through leaves the pad deselected and ready for the next frame.
    pub fn transact(&mut self, pad: Pad, command: &[u8]) -> Result<Frame, Error<L::Error>> {
        if !self.lines.has_attention(pad) {
            return Err(Error::PadNotWired(pad));
        }

        let attention = OutputLine::Attention(pad);
        let half_cycle = as_nanos(self.timing.clock_half_cycle);
        let ack_wait = as_nanos(self.timing.ack_wait);

        self.lines.set_low(attention)?;
        self.delay.delay_ns(as_nanos(self.timing.attention_settle));

        // attention is released even when clocking fails part way
        let clocked = self.clock_frame(command, half_cycle, ack_wait);
        let released = self.lines.set_high(attention);
        self.delay.delay_ns(as_nanos(self.timing.command_interval));

        let response = clocked?;
        released?;

        trace!("{} cmd={:02X?} -> {:?}", pad, command, response);
        Ok(response)
    }

    fn clock_frame(
        &mut self,
        command: &[u8],
        half_cycle: u32,
        ack_wait: u32,
    ) -> Result<Frame, L::Error> {
        let mut response = [0u8; FRAME_LEN];
        for (i, slot) in response.iter_mut().enumerate() {
            let out = command.get(i).copied().unwrap_or(0x00);
            *slot = bitclock::transfer_byte(&mut self.lines, &mut self.delay, half_cycle, out)?;
            self.delay.delay_ns(ack_wait);
        }
        Ok(Frame(response))
    }
}
