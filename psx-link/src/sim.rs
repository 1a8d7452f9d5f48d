//! Software stand-ins for a pad and for real time.
//!
//! [`SimulatedPad`] answers the bit-level protocol the way a controller
//! does, so the full stack can run without hardware. [`VirtualDelay`]
//! records requested delays instead of sleeping.

use std::collections::VecDeque;

use embedded_hal::delay::DelayNs;
use thiserror::Error;

use crate::command;
use crate::frame::{Frame, FRAME_LEN};
use crate::lines::{LinePort, OutputLine, Pad};

/// What a connected digital pad with nothing held sends back.
pub const DIGITAL_IDLE: [u8; FRAME_LEN] = [0xFF, 0x41, 0x5A, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF];
/// What a connected analog pad with centred sticks sends back.
pub const ANALOG_IDLE: [u8; FRAME_LEN] = [0xFF, 0x73, 0x5A, 0xFF, 0xFF, 0x80, 0x80, 0x80, 0x80];
/// An unplugged pad: the data line sits at its pull-up.
pub const DISCONNECTED: [u8; FRAME_LEN] = [0xFF; FRAME_LEN];

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SimError {
    #[error("attention line for {0} is not wired")]
    NotWired(Pad),
}

/// One completed exchange as seen by the pad.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exchange {
    pub pad: Pad,
    /// Command bytes latched from the command line, one per full byte clocked.
    pub command: Vec<u8>,
}

#[derive(Debug, Default)]
struct PadSlot {
    scripted: VecDeque<Frame>,
    /// Reply when nothing is scripted. `None` behaves as unplugged.
    idle: Option<[u8; FRAME_LEN]>,
    motors: (u8, u8),
}

/// A controller on the far side of the lines.
///
/// Pulling attention low starts a frame. On every falling clock edge the
/// pad drives the next response bit, LSB first; on every rising edge it
/// latches the command bit. Responses come from a per-pad script, then from
/// the pad's idle frame. Set-mode commands switch the idle frame between
/// the digital and analog ids, and poll commands update the motor levels.
#[derive(Debug)]
pub struct SimulatedPad {
    slots: [PadSlot; 2],
    attention2_wired: bool,
    clock: bool,
    command: bool,
    data: bool,
    active: Option<Pad>,
    response: [u8; FRAME_LEN],
    rx: Vec<u8>,
    rx_byte: u8,
    bit: u8,
    exchanges: Vec<Exchange>,
}

impl SimulatedPad {
    /// Both attention lines wired, no pad plugged in until a response is
    /// scripted or [`SimulatedPad::connect`] is called.
    pub fn new() -> Self {
        SimulatedPad {
            slots: Default::default(),
            attention2_wired: true,
            clock: true,
            command: false,
            data: true,
            active: None,
            response: DISCONNECTED,
            rx: Vec::with_capacity(FRAME_LEN),
            rx_byte: 0,
            bit: 0,
            exchanges: Vec::new(),
        }
    }

    /// Drop the second attention line, as on single-port hosts.
    pub fn without_attention2(mut self) -> Self {
        self.attention2_wired = false;
        self
    }

    /// Plug a pad in, answering with `idle` whenever nothing is scripted.
    pub fn connect(&mut self, pad: Pad, idle: [u8; FRAME_LEN]) {
        self.slots[pad.index()].idle = Some(idle);
    }

    pub fn disconnect(&mut self, pad: Pad) {
        self.slots[pad.index()].idle = None;
    }

    /// Script pad 1's next response.
    pub fn queue_response(&mut self, frame: [u8; FRAME_LEN]) {
        self.queue_response_for(Pad::One, frame);
    }

    pub fn queue_response_for(&mut self, pad: Pad, frame: [u8; FRAME_LEN]) {
        self.slots[pad.index()].scripted.push_back(Frame(frame));
    }

    pub fn exchanges(&self) -> &[Exchange] {
        &self.exchanges
    }

    /// Command bytes of every completed exchange, oldest first.
    pub fn received(&self) -> Vec<&[u8]> {
        self.exchanges.iter().map(|e| e.command.as_slice()).collect()
    }

    /// Motor levels carried by the pad's most recent poll.
    pub fn motor_levels(&self, pad: Pad) -> (u8, u8) {
        self.slots[pad.index()].motors
    }

    /// Idle level of each output as last driven: (clock, command).
    pub fn output_levels(&self) -> (bool, bool) {
        (self.clock, self.command)
    }

    pub fn is_selected(&self) -> bool {
        self.active.is_some()
    }

    fn begin(&mut self, pad: Pad) {
        let slot = &mut self.slots[pad.index()];
        self.response = match slot.scripted.pop_front() {
            Some(frame) => frame.0,
            None => slot.idle.unwrap_or(DISCONNECTED),
        };
        self.active = Some(pad);
        self.rx.clear();
        self.rx_byte = 0;
        self.bit = 0;
        self.data = true;
    }

    fn end(&mut self, pad: Pad) {
        let command = std::mem::take(&mut self.rx);
        self.apply(pad, &command);
        self.exchanges.push(Exchange { pad, command });
        self.active = None;
        self.data = true;
    }

    fn apply(&mut self, pad: Pad, cmd: &[u8]) {
        let slot = &mut self.slots[pad.index()];
        match cmd {
            [command::START, command::POLL, _, m1, m2, ..] => slot.motors = (*m1, *m2),
            [command::START, command::SET_MODE, _, mode, ..] => {
                if let Some(idle) = slot.idle.as_mut() {
                    idle[1] = if *mode == command::Mode::Analog as u8 {
                        ANALOG_IDLE[1]
                    } else {
                        DIGITAL_IDLE[1]
                    };
                }
            }
            _ => {}
        }
    }

    fn falling_edge(&mut self) {
        let byte = self.rx.len();
        self.data = byte >= FRAME_LEN || (self.response[byte] >> self.bit) & 0x01 != 0;
    }

    fn rising_edge(&mut self) {
        if self.command {
            self.rx_byte |= 1 << self.bit;
        }
        self.bit += 1;
        if self.bit == 8 {
            self.rx.push(self.rx_byte);
            self.rx_byte = 0;
            self.bit = 0;
        }
    }

    fn drive(&mut self, line: OutputLine, high: bool) -> Result<(), SimError> {
        match line {
            OutputLine::Clock => {
                let was = self.clock;
                self.clock = high;
                if self.active.is_some() {
                    match (was, high) {
                        (true, false) => self.falling_edge(),
                        (false, true) => self.rising_edge(),
                        _ => {}
                    }
                }
            }
            OutputLine::Command => self.command = high,
            OutputLine::Attention(pad) => {
                if !self.has_attention(pad) {
                    return Err(SimError::NotWired(pad));
                }
                match (self.active, high) {
                    (None, false) => self.begin(pad),
                    (Some(p), true) if p == pad => self.end(pad),
                    _ => {}
                }
            }
        }
        Ok(())
    }
}

impl Default for SimulatedPad {
    fn default() -> Self {
        Self::new()
    }
}

impl LinePort for SimulatedPad {
    type Error = SimError;

    fn set_high(&mut self, line: OutputLine) -> Result<(), SimError> {
        self.drive(line, true)
    }

    fn set_low(&mut self, line: OutputLine) -> Result<(), SimError> {
        self.drive(line, false)
    }

    fn read_data(&mut self) -> Result<bool, SimError> {
        Ok(self.active.is_none() || self.data)
    }

    fn has_attention(&self, pad: Pad) -> bool {
        pad == Pad::One || self.attention2_wired
    }
}

/// Delay source that only keeps count.
#[derive(Debug, Default, Clone)]
pub struct VirtualDelay {
    elapsed_ns: u64,
}

impl VirtualDelay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total nanoseconds requested so far.
    pub fn elapsed_ns(&self) -> u64 {
        self.elapsed_ns
    }

    pub fn reset(&mut self) {
        self.elapsed_ns = 0;
    }
}

impl DelayNs for VirtualDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.elapsed_ns += u64::from(ns);
    }

    fn delay_us(&mut self, us: u32) {
        self.elapsed_ns += u64::from(us) * 1_000;
    }

    fn delay_ms(&mut self, ms: u32) {
        self.elapsed_ns += u64::from(ms) * 1_000_000;
    }
}
