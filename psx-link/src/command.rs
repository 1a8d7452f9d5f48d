//! Command vocabulary. Byte layouts are fixed by the pads and must go out
//! exactly as written here.

/// First byte of every command frame.
pub const START: u8 = 0x01;

pub const POLL: u8 = 0x42;
pub const CONFIG: u8 = 0x43;
pub const SET_MODE: u8 = 0x44;
pub const MOTOR_MAP: u8 = 0x4D;

pub const ENTER_CONFIG: [u8; 4] = [START, CONFIG, 0x00, 0x01];
pub const EXIT_CONFIG: [u8; 9] = [START, CONFIG, 0x00, 0x00, 0x5A, 0x5A, 0x5A, 0x5A, 0x5A];

/// Analog/digital selection for [`set_mode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
#[repr(u8)]
pub enum Mode {
    Digital = 0x00,
    Analog = 0x01,
}

/// Whether the pad's own analog button may change the mode afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ModeLock {
    Unlock = 0x02,
    Lock = 0x03,
}

impl From<bool> for ModeLock {
    fn from(lock: bool) -> Self {
        if lock {
            ModeLock::Lock
        } else {
            ModeLock::Unlock
        }
    }
}

/// Small motor level sent with each poll. It is either fully on or off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum Motor1 {
    #[default]
    Off = 0x00,
    On = 0xFF,
}

impl From<bool> for Motor1 {
    fn from(on: bool) -> Self {
        if on {
            Motor1::On
        } else {
            Motor1::Off
        }
    }
}

/// Maps the small motor to poll byte 3, or leaves it unmapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Motor1Enable {
    Enable = 0x00,
    Disable = 0xFF,
}

/// Maps the large motor to poll byte 4, or leaves it unmapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Motor2Enable {
    Enable = 0x01,
    Disable = 0xFF,
}

impl From<bool> for Motor1Enable {
    fn from(enable: bool) -> Self {
        if enable {
            Motor1Enable::Enable
        } else {
            Motor1Enable::Disable
        }
    }
}

impl From<bool> for Motor2Enable {
    fn from(enable: bool) -> Self {
        if enable {
            Motor2Enable::Enable
        } else {
            Motor2Enable::Disable
        }
    }
}

/// Poll command carrying this cycle's motor levels.
pub fn poll(motor1: u8, motor2: u8) -> [u8; 5] {
    [START, POLL, 0x00, motor1, motor2]
}

pub fn set_mode(mode: Mode, lock: ModeLock) -> [u8; 9] {
    [START, SET_MODE, 0x00, mode as u8, lock as u8, 0x00, 0x00, 0x00, 0x00]
}

pub fn enable_motors(motor1: Motor1Enable, motor2: Motor2Enable) -> [u8; 9] {
    [START, MOTOR_MAP, 0x00, motor1 as u8, motor2 as u8, 0xFF, 0xFF, 0xFF, 0xFF]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_layouts() {
        assert_eq!(poll(0xFF, 0x80), [0x01, 0x42, 0x00, 0xFF, 0x80]);
        assert_eq!(
            set_mode(Mode::Analog, ModeLock::Lock),
            [0x01, 0x44, 0x00, 0x01, 0x03, 0x00, 0x00, 0x00, 0x00]
        );
        assert_eq!(
            enable_motors(Motor1Enable::Enable, Motor2Enable::Enable),
            [0x01, 0x4D, 0x00, 0x00, 0x01, 0xFF, 0xFF, 0xFF, 0xFF]
        );
        assert_eq!(
            enable_motors(false.into(), false.into()),
            [0x01, 0x4D, 0x00, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF]
        );
    }

    #[test]
    fn test_flag_conversions() {
        assert_eq!(ModeLock::from(true), ModeLock::Lock);
        assert_eq!(ModeLock::from(false) as u8, 0x02);
        assert_eq!(Motor1::from(true) as u8, 0xFF);
        assert_eq!(Motor1::default() as u8, 0x00);
    }
}
