//! Line-level capability consumed by the link.
//!
//! The link never touches hardware registers. Everything it needs from the
//! host is the ability to drive three kinds of output line and to sample
//! the data (and optionally acknowledge) input.

use std::fmt;

use embedded_hal::digital::{Error as _, ErrorKind, InputPin, OutputPin};

/// Pad selector. Both pads share clock, command and data lines and differ
/// only in their attention line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Pad {
    One,
    Two,
}

impl Pad {
    pub const ALL: [Pad; 2] = [Pad::One, Pad::Two];

    /// Zero-based slot used to index per-pad state.
    pub const fn index(self) -> usize {
        match self {
            Pad::One => 0,
            Pad::Two => 1,
        }
    }

    /// Pad for a 1-based number as printed on a multitap or in config files.
    pub fn from_number(n: u8) -> Option<Pad> {
        match n {
            1 => Some(Pad::One),
            2 => Some(Pad::Two),
            _ => None,
        }
    }
}

impl fmt::Display for Pad {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pad::One => write!(f, "pad 1"),
            Pad::Two => write!(f, "pad 2"),
        }
    }
}

/// Host-driven lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputLine {
    Clock,
    Command,
    Attention(Pad),
}

/// Capability to drive and sample the controller's lines.
///
/// `set_high`/`set_low`/`read_data` are the whole contract the protocol
/// needs. The acknowledge input is exposed for completeness; the transport
/// paces itself with fixed delays and never waits on it.
pub trait LinePort {
    type Error: fmt::Debug;

    fn set_high(&mut self, line: OutputLine) -> Result<(), Self::Error>;

    fn set_low(&mut self, line: OutputLine) -> Result<(), Self::Error>;

    /// Sample the data line. `true` is a high level.
    fn read_data(&mut self) -> Result<bool, Self::Error>;

    /// Sample the acknowledge line, `None` when it is not wired.
    fn read_acknowledge(&mut self) -> Result<Option<bool>, Self::Error> {
        Ok(None)
    }

    /// Whether `pad` has an attention line and can be addressed at all.
    fn has_attention(&self, pad: Pad) -> bool;

    fn set_level(&mut self, line: OutputLine, high: bool) -> Result<(), Self::Error> {
        if high {
            self.set_high(line)
        } else {
            self.set_low(line)
        }
    }
}

/// [`LinePort`] over `embedded-hal` digital pins.
///
/// All outputs share one pin type and all inputs another, which is how
/// GPIO backends hand out pins. Pin errors are reduced to their
/// [`ErrorKind`] so that output and input failures share one type.
pub struct HalLines<O, I> {
    clock: O,
    command: O,
    data: I,
    attention1: O,
    attention2: Option<O>,
    acknowledge: Option<I>,
}

impl<O, I> HalLines<O, I>
where
    O: OutputPin,
    I: InputPin,
{
    pub fn new(clock: O, command: O, data: I, attention1: O) -> Self {
        HalLines {
            clock,
            command,
            data,
            attention1,
            attention2: None,
            acknowledge: None,
        }
    }

    /// Wire a second pad's attention line.
    pub fn with_attention2(mut self, pin: O) -> Self {
        self.attention2 = Some(pin);
        self
    }

    /// Wire the acknowledge input.
    pub fn with_acknowledge(mut self, pin: I) -> Self {
        self.acknowledge = Some(pin);
        self
    }

    fn output(&mut self, line: OutputLine) -> Result<&mut O, ErrorKind> {
        match line {
            OutputLine::Clock => Ok(&mut self.clock),
            OutputLine::Command => Ok(&mut self.command),
            OutputLine::Attention(Pad::One) => Ok(&mut self.attention1),
            OutputLine::Attention(Pad::Two) => self.attention2.as_mut().ok_or(ErrorKind::Other),
        }
    }
}

impl<O, I> LinePort for HalLines<O, I>
where
    O: OutputPin,
    I: InputPin,
{
    type Error = ErrorKind;

    fn set_high(&mut self, line: OutputLine) -> Result<(), ErrorKind> {
        self.output(line)?.set_high().map_err(|e| e.kind())
    }

    fn set_low(&mut self, line: OutputLine) -> Result<(), ErrorKind> {
        self.output(line)?.set_low().map_err(|e| e.kind())
    }

    fn read_data(&mut self) -> Result<bool, ErrorKind> {
        self.data.is_high().map_err(|e| e.kind())
    }

    fn read_acknowledge(&mut self) -> Result<Option<bool>, ErrorKind> {
        match self.acknowledge.as_mut() {
            Some(pin) => pin.is_high().map(Some).map_err(|e| e.kind()),
            None => Ok(None),
        }
    }

    fn has_attention(&self, pad: Pad) -> bool {
        match pad {
            Pad::One => true,
            Pad::Two => self.attention2.is_some(),
        }
    }
}
