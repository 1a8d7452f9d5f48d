use psx_link::{Button, Mode, Pad, Platform};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

/// Poll pacing pads tolerate; outside it they may lose protocol sync.
pub const RECOMMENDED_INTERVAL_MS: std::ops::RangeInclusive<u64> = 10..=60;

/// Stick travel from centre ignored when no `deadzone` is configured.
pub const DEFAULT_DEADZONE: u8 = 28;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub platform: Platform,
    pub gpio: GpioConfig,
    #[serde(default)]
    pub polling: PollingConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub pads: Vec<PadConfig>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Linux GPIO character device through linux-embedded-hal.
    Cdev,
    /// Raspberry Pi GPIO through rppal.
    Rppal,
    /// In-process simulated pads, for dry runs.
    Simulated,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GpioConfig {
    pub backend: Backend,
    /// GPIO chip for the cdev backend, e.g. /dev/gpiochip0
    #[serde(default = "default_chip")]
    pub chip: String,
    pub clock: u32,
    pub command: u32,
    /// Needs an external pull-up.
    pub data: u32,
    pub attention1: u32,
    pub attention2: Option<u32>,
    pub acknowledge: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollingConfig {
    pub interval_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogTarget {
    #[default]
    Stderr,
    Syslog,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub target: LogTarget,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PadConfig {
    /// 1 or 2
    pub pad: u8,
    pub mode: Option<Mode>,
    #[serde(default)]
    pub lock: bool,
    pub motors: Option<MotorEnableConfig>,
    /// Stick travel from centre that still counts as resting.
    #[serde(default = "default_deadzone")]
    pub deadzone: u8,
    #[serde(default)]
    pub bindings: Vec<ButtonBinding>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MotorEnableConfig {
    pub motor1: bool,
    pub motor2: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Edge {
    Pressed,
    Released,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ButtonBinding {
    pub button: String,
    pub on: Edge,
    pub description: Option<String>,
    pub command: Option<String>,
    pub motor: Option<MotorAction>,
}

/// Motor levels to stage for the next poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MotorAction {
    pub motor1: bool,
    #[serde(default)]
    pub motor2: u8,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("pad number must be 1 or 2, got {0}")]
    BadPadNumber(u8),
    #[error("{0} is configured more than once")]
    DuplicatePad(Pad),
    #[error("{0} is configured but gpio.attention2 is not set")]
    NoAttention2(Pad),
    #[error("{pad}: {source}")]
    UnknownButton {
        pad: Pad,
        source: psx_link::buttons::UnknownButton,
    },
    #[error("{pad}: binding for {button} needs exactly one of `command` or `motor`")]
    BindingAction { pad: Pad, button: String },
    #[error("polling.interval_ms must be greater than zero")]
    ZeroInterval,
}

fn default_chip() -> String {
    "/dev/gpiochip0".to_string()
}

fn default_deadzone() -> u8 {
    DEFAULT_DEADZONE
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self { interval_ms: 16 }
    }
}

impl PadConfig {
    /// Pad selector; only meaningful after [`Config::validate`].
    pub fn pad(&self) -> Pad {
        Pad::from_number(self.pad).unwrap_or(Pad::One)
    }
}

impl ButtonBinding {
    pub fn resolve(&self) -> Result<Button, psx_link::buttons::UnknownButton> {
        self.button.parse()
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.polling.interval_ms == 0 {
            return Err(ConfigError::ZeroInterval);
        }

        let mut seen = HashSet::new();
        for pad_cfg in &self.pads {
            let pad = Pad::from_number(pad_cfg.pad).ok_or(ConfigError::BadPadNumber(pad_cfg.pad))?;
            if !seen.insert(pad) {
                return Err(ConfigError::DuplicatePad(pad));
            }
            if pad == Pad::Two && self.gpio.attention2.is_none() {
                return Err(ConfigError::NoAttention2(pad));
            }
            for binding in &pad_cfg.bindings {
                binding
                    .resolve()
                    .map_err(|source| ConfigError::UnknownButton { pad, source })?;
                if binding.command.is_some() == binding.motor.is_some() {
                    return Err(ConfigError::BindingAction {
                        pad,
                        button: binding.button.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    pub fn interval_in_guidance(&self) -> bool {
        RECOMMENDED_INTERVAL_MS.contains(&self.polling.interval_ms)
    }
}
