use std::time::Duration;

/// Console the pad is timed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Platform {
    Ps1,
    #[default]
    Ps2,
}

/// Fixed pacing of the link. Pads need these gaps for their own internal
/// processing; they are chosen once per session and never renegotiated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimingProfile {
    /// Settle time after attention is pulled low.
    pub attention_settle: Duration,
    /// Idle time after attention is released, before the next frame.
    pub command_interval: Duration,
    /// Half a clock cycle.
    pub clock_half_cycle: Duration,
    /// Gap after each byte, standing in for waiting on acknowledge.
    pub ack_wait: Duration,
}

impl TimingProfile {
    pub const PS1: TimingProfile = TimingProfile {
        attention_settle: Duration::from_micros(50),
        command_interval: Duration::from_millis(16),
        clock_half_cycle: Duration::from_micros(2),
        ack_wait: Duration::from_micros(15),
    };

    pub const PS2: TimingProfile = TimingProfile {
        attention_settle: Duration::from_micros(15),
        command_interval: Duration::from_millis(10),
        clock_half_cycle: Duration::from_micros(1),
        ack_wait: Duration::from_micros(15),
    };

    pub const fn for_platform(platform: Platform) -> TimingProfile {
        match platform {
            Platform::Ps1 => TimingProfile::PS1,
            Platform::Ps2 => TimingProfile::PS2,
        }
    }

    /// Wall time one 9-byte frame occupies on the link, including the
    /// settle and interval gaps around it.
    pub fn frame_duration(&self) -> Duration {
        let per_byte = self.clock_half_cycle * 16 + self.ack_wait;
        self.attention_settle + per_byte * crate::frame::FRAME_LEN as u32 + self.command_interval
    }
}

impl From<Platform> for TimingProfile {
    fn from(platform: Platform) -> Self {
        TimingProfile::for_platform(platform)
    }
}

/// Duration as whole nanoseconds for `DelayNs`, saturating.
pub(crate) fn as_nanos(d: Duration) -> u32 {
    u32::try_from(d.as_nanos()).unwrap_or(u32::MAX)
}
