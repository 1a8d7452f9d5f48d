//! Raw response frames and the per-pad double buffer built from them.

use std::fmt;

/// Every exchange is exactly this many bytes, command and response alike.
pub const FRAME_LEN: usize = 9;

/// Response byte 1: device type in the high nibble, payload words in the low.
pub const ID_BYTE: usize = 1;
/// Response byte 2: `0x5A` once the pad has started answering.
pub const MARKER_BYTE: usize = 2;
/// First digital button byte (d-pad and system buttons).
pub const BUTTONS_LOW: usize = 3;
/// Second digital button byte (face and shoulder buttons).
pub const BUTTONS_HIGH: usize = 4;

pub const DATA_START_MARKER: u8 = 0x5A;

/// One 9-byte response.
#[derive(Clone, Copy, PartialEq, Eq, Default)]
pub struct Frame(pub [u8; FRAME_LEN]);

impl Frame {
    pub const fn zeroed() -> Frame {
        Frame([0; FRAME_LEN])
    }

    pub fn bytes(&self) -> &[u8; FRAME_LEN] {
        &self.0
    }

    /// Byte at `index`.
    ///
    /// # Panics
    ///
    /// If `index` is not below [`FRAME_LEN`]. Use [`Frame::get`] for
    /// indices that come from outside the crate.
    pub fn byte(&self, index: usize) -> u8 {
        self.0[index]
    }

    pub fn get(&self, index: usize) -> Option<u8> {
        self.0.get(index).copied()
    }

    /// High nibble of byte 1, which reports digital or analog mode.
    pub fn mode_nibble(&self) -> u8 {
        self.0[ID_BYTE] >> 4
    }

    /// Whether the frame looks like it came from a pad.
    ///
    /// A pad always answers `0x5A` in byte 2. An absent pad leaves the
    /// data line floating at its pull-up or stuck low, and neither pattern
    /// matches. This only inspects a frame already received.
    pub fn is_present(&self) -> bool {
        self.0[MARKER_BYTE] == DATA_START_MARKER
    }
}

impl From<[u8; FRAME_LEN]> for Frame {
    fn from(bytes: [u8; FRAME_LEN]) -> Self {
        Frame(bytes)
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Frame[")?;
        for (i, b) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{:02X}", b)?;
        }
        write!(f, "]")
    }
}

/// Per-pad button state across two polls.
///
/// The device reports buttons active-low. After each poll `current` holds
/// the live frame, `previous` the frame before it, and `changes` the XOR of
/// their two digital button bytes: a set bit means that button changed on
/// the latest poll. Keeping the change mask in its own field replaces the
/// old trick of XOR-ing it into `previous` in place; queries behave the same.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KeyState {
    current: Frame,
    previous: Frame,
    changes: [u8; 2],
}

impl KeyState {
    pub const fn new() -> KeyState {
        KeyState {
            current: Frame::zeroed(),
            previous: Frame::zeroed(),
            changes: [0; 2],
        }
    }

    /// Shift `current` into `previous`, install `response` and recompute
    /// the change mask.
    pub fn update(&mut self, response: Frame) {
        self.previous = self.current;
        self.current = response;
        self.changes = [
            self.previous.0[BUTTONS_LOW] ^ self.current.0[BUTTONS_LOW],
            self.previous.0[BUTTONS_HIGH] ^ self.current.0[BUTTONS_HIGH],
        ];
    }

    pub fn current(&self) -> &Frame {
        &self.current
    }

    pub fn previous(&self) -> &Frame {
        &self.previous
    }

    /// Change mask for a digital button byte (`BUTTONS_LOW` or
    /// `BUTTONS_HIGH`). Any other index has no edge tracking and reads 0.
    pub fn changes(&self, index: usize) -> u8 {
        match index {
            BUTTONS_LOW => self.changes[0],
            BUTTONS_HIGH => self.changes[1],
            _ => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_tracks_changes() {
        let mut state = KeyState::new();
        state.update(Frame([0xFF, 0x41, 0x5A, 0xFF, 0xFF, 0, 0, 0, 0]));
        // zeroed start -> everything changed
        assert_eq!(state.changes(BUTTONS_LOW), 0xFF);

        state.update(Frame([0xFF, 0x41, 0x5A, 0x7F, 0xFE, 0, 0, 0, 0]));
        assert_eq!(state.changes(BUTTONS_LOW), 0x80);
        assert_eq!(state.changes(BUTTONS_HIGH), 0x01);
        assert_eq!(state.previous().byte(BUTTONS_LOW), 0xFF);
        assert_eq!(state.current().byte(BUTTONS_LOW), 0x7F);
        assert_eq!(state.changes(5), 0);
    }

    #[test]
    fn test_presence_marker() {
        assert!(Frame([0xFF, 0x73, 0x5A, 0xFF, 0xFF, 0x80, 0x80, 0x80, 0x80]).is_present());
        assert!(!Frame([0xFF; FRAME_LEN]).is_present());
        assert!(!Frame::zeroed().is_present());
    }

    #[test]
    fn test_checked_byte_access() {
        let frame = Frame([0xFF, 0x41, 0x5A, 0, 1, 2, 3, 4, 0x99]);
        assert_eq!(frame.get(8), Some(0x99));
        assert_eq!(frame.get(FRAME_LEN), None);
        assert_eq!(frame.byte(2), DATA_START_MARKER);
    }

    #[test]
    #[should_panic]
    fn test_byte_past_frame_panics() {
        Frame::zeroed().byte(FRAME_LEN);
    }

    #[test]
    fn test_debug_format() {
        let frame = Frame([0xFF, 0x41, 0x5A, 0, 1, 2, 3, 4, 5]);
        assert_eq!(format!("{:?}", frame), "Frame[FF 41 5A 00 01 02 03 04 05]");
    }
}
