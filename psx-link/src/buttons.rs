//! Button catalogue and decoded views over a pad's response.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::frame::{KeyState, BUTTONS_HIGH, BUTTONS_LOW};

/// A digital button: the response byte it lives in and its bit.
///
/// Bits are active-low, so a cleared bit means the button is held.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Button {
    index: u8,
    mask: u8,
}

impl Button {
    pub const LEFT: Button = Button::low(7);
    pub const DOWN: Button = Button::low(6);
    pub const RIGHT: Button = Button::low(5);
    pub const UP: Button = Button::low(4);
    pub const START: Button = Button::low(3);
    /// R3, right stick click.
    pub const STICK_RIGHT: Button = Button::low(2);
    /// L3, left stick click.
    pub const STICK_LEFT: Button = Button::low(1);
    pub const SELECT: Button = Button::low(0);

    pub const SQUARE: Button = Button::high(7);
    pub const CROSS: Button = Button::high(6);
    pub const CIRCLE: Button = Button::high(5);
    pub const TRIANGLE: Button = Button::high(4);
    pub const R1: Button = Button::high(3);
    pub const L1: Button = Button::high(2);
    pub const R2: Button = Button::high(1);
    pub const L2: Button = Button::high(0);

    pub const ALL: [Button; 16] = [
        Button::LEFT,
        Button::DOWN,
        Button::RIGHT,
        Button::UP,
        Button::START,
        Button::STICK_RIGHT,
        Button::STICK_LEFT,
        Button::SELECT,
        Button::SQUARE,
        Button::CROSS,
        Button::CIRCLE,
        Button::TRIANGLE,
        Button::R1,
        Button::L1,
        Button::R2,
        Button::L2,
    ];

    const NAMES: [&'static str; 16] = [
        "left", "down", "right", "up", "start", "r3", "l3", "select", "square", "cross", "circle",
        "triangle", "r1", "l1", "r2", "l2",
    ];

    const fn low(bit: u8) -> Button {
        Button {
            index: BUTTONS_LOW as u8,
            mask: 1 << bit,
        }
    }

    const fn high(bit: u8) -> Button {
        Button {
            index: BUTTONS_HIGH as u8,
            mask: 1 << bit,
        }
    }

    /// Byte index within a frame.
    pub fn index(&self) -> usize {
        self.index as usize
    }

    pub fn mask(&self) -> u8 {
        self.mask
    }

    pub fn name(&self) -> &'static str {
        let pos = Button::ALL
            .iter()
            .position(|b| b == self)
            .unwrap_or_default();
        Button::NAMES[pos]
    }

    /// Held right now.
    pub fn is_down(&self, state: &KeyState) -> bool {
        state.current().byte(self.index()) & self.mask == 0
    }

    /// Went down on the latest poll.
    pub fn pressed(&self, state: &KeyState) -> bool {
        state.changes(self.index()) & self.mask != 0 && self.is_down(state)
    }

    /// Came up on the latest poll.
    pub fn released(&self, state: &KeyState) -> bool {
        state.changes(self.index()) & self.mask != 0 && !self.is_down(state)
    }
}

impl fmt::Display for Button {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown button name: {0}")]
pub struct UnknownButton(pub String);

impl FromStr for Button {
    type Err = UnknownButton;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        let alias = match lower.as_str() {
            "x" => "cross",
            "o" => "circle",
            "stick_right" => "r3",
            "stick_left" => "l3",
            other => other,
        };
        Button::NAMES
            .iter()
            .position(|n| *n == alias)
            .map(|pos| Button::ALL[pos])
            .ok_or_else(|| UnknownButton(s.to_string()))
    }
}

/// Analog stick axes and the response byte each is carried in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(usize)]
pub enum Axis {
    RightX = 5,
    RightY = 6,
    LeftX = 7,
    LeftY = 8,
}

impl Axis {
    pub const ALL: [Axis; 4] = [Axis::RightX, Axis::RightY, Axis::LeftX, Axis::LeftY];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Raw sample, meaningful only while the pad reports [`PadMode::Analog`].
    pub fn value(self, state: &KeyState) -> u8 {
        state.current().byte(self.index())
    }
}

/// Mode the pad reported in its latest response.
///
/// Anything other than the two known nibbles is indeterminate: a missing
/// pad, a desynchronised one, or a device type this crate does not decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PadMode {
    Digital,
    Analog,
    Indeterminate(u8),
}

impl PadMode {
    pub fn from_nibble(nibble: u8) -> PadMode {
        match nibble {
            0x4 => PadMode::Digital,
            0x7 => PadMode::Analog,
            other => PadMode::Indeterminate(other),
        }
    }

    pub fn of(state: &KeyState) -> PadMode {
        PadMode::from_nibble(state.current().mode_nibble())
    }
}
