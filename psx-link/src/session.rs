//! Per-pad controller state and the operations that drive it.

use embedded_hal::delay::DelayNs;
use log::debug;

use crate::buttons::{Axis, Button, PadMode};
use crate::command::{self, Mode, ModeLock, Motor1, Motor1Enable, Motor2Enable};
use crate::error::Error;
use crate::frame::KeyState;
use crate::lines::{LinePort, Pad};
use crate::timing::{Platform, TimingProfile};
use crate::transport::FrameTransport;

/// Motor levels carried by a pad's next poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MotorLevels {
    pub motor1: u8,
    pub motor2: u8,
}

/// Host side of the link for up to two pads.
///
/// One session owns the shared lines and both pads' state. Every operation
/// takes `&mut self` and blocks for the full length of its frames, so
/// operations are serialised by construction; a multi-threaded host wraps
/// the session in a single mutex.
///
/// Nothing here detects a missing or confused pad. Such a pad produces
/// frames of arbitrary content that the queries decode like any other;
/// [`Session::is_present`] is an opt-in sanity check on the latest frame.
pub struct Session<L, D> {
    transport: FrameTransport<L, D>,
    platform: Platform,
    states: [KeyState; 2],
    motors: [MotorLevels; 2],
}

impl<L, D> Session<L, D>
where
    L: LinePort,
    D: DelayNs,
{
    pub fn new(platform: Platform, lines: L, delay: D) -> Result<Self, Error<L::Error>> {
        let transport = FrameTransport::new(lines, delay, TimingProfile::for_platform(platform))?;
        debug!("PSX session created for {:?}", platform);

        Ok(Session {
            transport,
            platform,
            states: [KeyState::new(); 2],
            motors: [MotorLevels::default(); 2],
        })
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn timing(&self) -> &TimingProfile {
        self.transport.timing()
    }

    pub fn lines(&self) -> &L {
        self.transport.lines()
    }

    pub fn lines_mut(&mut self) -> &mut L {
        self.transport.lines_mut()
    }

    pub fn release(self) -> (L, D) {
        self.transport.release()
    }

    /// Read the pad and send it the pending motor levels in one frame.
    ///
    /// Afterwards every query reflects this poll, and edge queries report
    /// what changed since the one before. Pads expect to be polled at a
    /// steady pace, roughly every 10 to 60 ms.
    pub fn poll(&mut self, pad: Pad) -> Result<(), Error<L::Error>> {
        let levels = self.motors[pad.index()];
        let response = self
            .transport
            .transact(pad, &command::poll(levels.motor1, levels.motor2))?;
        self.states[pad.index()].update(response);
        Ok(())
    }

    /// Select digital or analog reporting and whether the pad's analog
    /// button may override it.
    pub fn set_mode(&mut self, pad: Pad, mode: Mode, lock: ModeLock) -> Result<(), Error<L::Error>> {
        debug!("{}: set mode {:?} ({:?})", pad, mode, lock);
        self.configure(pad, &command::set_mode(mode, lock))
    }

    /// Map the motors onto the poll frame so that motor levels take effect.
    pub fn enable_motors(
        &mut self,
        pad: Pad,
        motor1: Motor1Enable,
        motor2: Motor2Enable,
    ) -> Result<(), Error<L::Error>> {
        debug!("{}: motors {:?} {:?}", pad, motor1, motor2);
        self.configure(pad, &command::enable_motors(motor1, motor2))
    }

    /// Stage motor levels for the pad's next poll. Nothing is sent now.
    pub fn set_motor_levels(&mut self, pad: Pad, motor1: Motor1, motor2: u8) {
        self.motors[pad.index()] = MotorLevels {
            motor1: motor1 as u8,
            motor2,
        };
    }

    pub fn motor_levels(&self, pad: Pad) -> MotorLevels {
        self.motors[pad.index()]
    }

    /// Run `cmd` inside an enter/exit configuration bracket.
    fn configure(&mut self, pad: Pad, cmd: &[u8]) -> Result<(), Error<L::Error>> {
        self.transport.transact(pad, &command::ENTER_CONFIG)?;
        self.transport.transact(pad, cmd)?;
        self.transport.transact(pad, &command::EXIT_CONFIG)?;
        Ok(())
    }

    pub fn key_state(&self, pad: Pad) -> &KeyState {
        &self.states[pad.index()]
    }

    pub fn is_down(&self, pad: Pad, button: Button) -> bool {
        button.is_down(self.key_state(pad))
    }

    pub fn pressed(&self, pad: Pad, button: Button) -> bool {
        button.pressed(self.key_state(pad))
    }

    pub fn released(&self, pad: Pad, button: Button) -> bool {
        button.released(self.key_state(pad))
    }

    pub fn axis(&self, pad: Pad, axis: Axis) -> u8 {
        axis.value(self.key_state(pad))
    }

    pub fn mode(&self, pad: Pad) -> PadMode {
        PadMode::of(self.key_state(pad))
    }

    pub fn is_analog(&self, pad: Pad) -> bool {
        self.mode(pad) == PadMode::Analog
    }

    pub fn is_digital(&self, pad: Pad) -> bool {
        self.mode(pad) == PadMode::Digital
    }

    /// Whether the latest poll of `pad` carried the pad's data-start marker.
    pub fn is_present(&self, pad: Pad) -> bool {
        self.key_state(pad).current().is_present()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::FRAME_LEN;
    use crate::sim::{SimulatedPad, VirtualDelay, ANALOG_IDLE, DIGITAL_IDLE};

    fn with_buttons(low: u8, high: u8) -> [u8; FRAME_LEN] {
        let mut f = DIGITAL_IDLE;
        f[3] = low;
        f[4] = high;
        f
    }

    fn session(pad: SimulatedPad) -> Session<SimulatedPad, VirtualDelay> {
        Session::new(Platform::Ps2, pad, VirtualDelay::new()).unwrap()
    }

    #[test]
    fn test_first_poll_nothing_held() {
        let mut pad = SimulatedPad::new();
        pad.queue_response(with_buttons(0xFF, 0xFF));
        let mut s = session(pad);

        s.poll(Pad::One).unwrap();
        for b in Button::ALL.iter().filter(|b| b.index() == 3) {
            assert!(!s.is_down(Pad::One, *b));
        }
    }

    #[test]
    fn test_press_is_single_cycle() {
        let mut pad = SimulatedPad::new();
        pad.queue_response(with_buttons(0xFF, 0xFF));
        pad.queue_response(with_buttons(0x7F, 0xFF));
        pad.queue_response(with_buttons(0x7F, 0xFF));
        let mut s = session(pad);

        s.poll(Pad::One).unwrap();
        s.poll(Pad::One).unwrap();
        assert!(s.pressed(Pad::One, Button::LEFT));
        assert!(!s.released(Pad::One, Button::LEFT));
        // stale until the next poll
        assert!(s.pressed(Pad::One, Button::LEFT));

        s.poll(Pad::One).unwrap();
        assert!(!s.pressed(Pad::One, Button::LEFT));
        assert!(!s.released(Pad::One, Button::LEFT));
        assert!(s.is_down(Pad::One, Button::LEFT));
        assert!(s.is_down(Pad::One, Button::LEFT));
    }

    #[test]
    fn test_release_edge() {
        let mut pad = SimulatedPad::new();
        pad.queue_response(with_buttons(0xFF, 0xBF));
        pad.queue_response(with_buttons(0xFF, 0xFF));
        let mut s = session(pad);

        s.poll(Pad::One).unwrap();
        s.poll(Pad::One).unwrap();
        assert!(s.released(Pad::One, Button::CROSS));
        assert!(!s.pressed(Pad::One, Button::CROSS));
        assert!(!s.is_down(Pad::One, Button::CROSS));
    }

    #[test]
    fn test_every_button_edges() {
        for b in Button::ALL {
            let mut held = with_buttons(0xFF, 0xFF);
            held[b.index()] &= !b.mask();

            let mut pad = SimulatedPad::new();
            pad.queue_response(with_buttons(0xFF, 0xFF));
            pad.queue_response(held);
            pad.queue_response(with_buttons(0xFF, 0xFF));
            let mut s = session(pad);

            s.poll(Pad::One).unwrap();
            s.poll(Pad::One).unwrap();
            assert!(s.pressed(Pad::One, b), "{} pressed", b);
            assert!(!s.released(Pad::One, b), "{} released", b);
            for other in Button::ALL.iter().filter(|o| **o != b) {
                assert!(!s.pressed(Pad::One, *other));
            }

            s.poll(Pad::One).unwrap();
            assert!(s.released(Pad::One, b), "{} released", b);
            assert!(!s.pressed(Pad::One, b), "{} pressed", b);
        }
    }

    #[test]
    fn test_motor_levels_ride_next_poll() {
        let mut pad = SimulatedPad::new();
        pad.connect(Pad::One, DIGITAL_IDLE);
        let mut s = session(pad);

        s.poll(Pad::One).unwrap();
        s.set_motor_levels(Pad::One, Motor1::On, 0x80);
        // staged only
        assert_eq!(s.lines().exchanges().len(), 1);
        assert_eq!(s.lines().motor_levels(Pad::One), (0x00, 0x00));

        s.poll(Pad::One).unwrap();
        let sent = s.lines().received();
        assert_eq!(&sent[1][..5], &[0x01, 0x42, 0x00, 0xFF, 0x80]);
        assert_eq!(s.lines().motor_levels(Pad::One), (0xFF, 0x80));
        assert_eq!(s.motor_levels(Pad::Two), MotorLevels::default());
    }

    #[test]
    fn test_set_mode_sequence() {
        let mut pad = SimulatedPad::new();
        pad.connect(Pad::One, DIGITAL_IDLE);
        let mut s = session(pad);

        s.set_mode(Pad::One, Mode::Analog, ModeLock::Lock).unwrap();
        let sent = s.lines().received();
        assert_eq!(sent.len(), 3);
        assert_eq!(sent[0], &[0x01, 0x43, 0x00, 0x01, 0, 0, 0, 0, 0]);
        assert_eq!(sent[1], &[0x01, 0x44, 0x00, 0x01, 0x03, 0, 0, 0, 0]);
        assert_eq!(sent[2], &command::EXIT_CONFIG);

        s.poll(Pad::One).unwrap();
        assert!(s.is_analog(Pad::One));
        assert!(!s.is_digital(Pad::One));
    }

    #[test]
    fn test_enable_motors_sequence() {
        let mut s = session(SimulatedPad::new());
        s.enable_motors(Pad::Two, Motor1Enable::Enable, Motor2Enable::Disable)
            .unwrap();

        let sent = s.lines().received();
        assert_eq!(sent[1], &[0x01, 0x4D, 0x00, 0x00, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF]);
        assert!(s.lines().exchanges().iter().all(|e| e.pad == Pad::Two));
    }

    #[test]
    fn test_analog_axes_and_presence() {
        let mut pad = SimulatedPad::new();
        let mut frame = ANALOG_IDLE;
        frame[5..].copy_from_slice(&[0x00, 0x40, 0xC0, 0xFF]);
        pad.queue_response(frame);
        let mut s = session(pad);

        assert!(!s.is_present(Pad::One));
        s.poll(Pad::One).unwrap();
        assert!(s.is_present(Pad::One));
        assert!(s.is_analog(Pad::One));
        assert_eq!(s.axis(Pad::One, Axis::RightX), 0x00);
        assert_eq!(s.axis(Pad::One, Axis::RightY), 0x40);
        assert_eq!(s.axis(Pad::One, Axis::LeftX), 0xC0);
        assert_eq!(s.axis(Pad::One, Axis::LeftY), 0xFF);
    }

    #[test]
    fn test_disconnected_pad_is_silent() {
        let mut s = session(SimulatedPad::new());
        s.poll(Pad::One).unwrap();

        assert!(!s.is_present(Pad::One));
        assert_eq!(s.mode(Pad::One), PadMode::Indeterminate(0xF));
        assert!(!s.is_analog(Pad::One) && !s.is_digital(Pad::One));
        assert!(!s.is_down(Pad::One, Button::START));
    }

    #[test]
    fn test_pad_two_requires_attention_line() {
        let mut s = session(SimulatedPad::new().without_attention2());
        assert_eq!(s.poll(Pad::Two), Err(Error::PadNotWired(Pad::Two)));
        assert_eq!(
            s.set_mode(Pad::Two, Mode::Digital, ModeLock::Unlock),
            Err(Error::PadNotWired(Pad::Two))
        );
        assert!(s.lines().exchanges().is_empty());
        s.poll(Pad::One).unwrap();
    }

    #[test]
    fn test_pads_keep_separate_state() {
        let mut pad = SimulatedPad::new();
        pad.queue_response_for(Pad::One, with_buttons(0xFF, 0xFF));
        pad.queue_response_for(Pad::Two, with_buttons(0xFF, 0xEF));
        let mut s = session(pad);

        s.poll(Pad::One).unwrap();
        s.poll(Pad::Two).unwrap();
        assert!(!s.is_down(Pad::One, Button::TRIANGLE));
        assert!(s.is_down(Pad::Two, Button::TRIANGLE));
    }
}
