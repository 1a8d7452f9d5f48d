use crate::command::CommandExecutor;
use crate::config::{Config, Edge, MotorAction, DEFAULT_DEADZONE};
use anyhow::{Context, Result};
use log::{debug, info, warn};
use psx_link::embedded_hal::delay::DelayNs;
use psx_link::{Axis, Button, LinePort, ModeLock, Motor1, Pad, PadMode, Session};
use std::fmt::Debug;
use std::time::Duration;
use tokio::time::sleep;

/// Stick centre as reported by analog pads.
const STICK_CENTRE: u8 = 0x80;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Command(String),
    Motor(MotorAction),
}

#[derive(Debug, Clone)]
struct Binding {
    pad: Pad,
    button: Button,
    edge: Edge,
    action: Action,
    label: String,
}

/// A binding that fired on the latest poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fired {
    pub pad: Pad,
    pub label: String,
    pub action: Action,
}

pub struct Daemon<L: LinePort, D> {
    session: Session<L, D>,
    config: Config,
    bindings: Vec<Binding>,
    present: [Option<bool>; 2],
}

impl<L, D> Daemon<L, D>
where
    L: LinePort,
    L::Error: Debug + Send + Sync + 'static,
    D: DelayNs,
{
    pub fn new(config: Config, lines: L, delay: D) -> Result<Self> {
        config.validate().context("Invalid configuration")?;

        let session = Session::new(config.platform, lines, delay)
            .context("Failed to initialise controller lines")?;
        info!("Platform: {:?}", config.platform);
        info!("Polling interval: {}ms", config.polling.interval_ms);
        if !config.interval_in_guidance() {
            warn!(
                "Polling interval {}ms is outside the 10-60ms range pads expect",
                config.polling.interval_ms
            );
        }

        let mut daemon = Daemon {
            session,
            bindings: Vec::new(),
            config,
            present: [None; 2],
        };
        daemon.init()?;
        Ok(daemon)
    }

    /// Resolve bindings, push mode and motor settings to every configured
    /// pad, then poll once so the first real poll has a baseline for edges.
    fn init(&mut self) -> Result<()> {
        self.bindings = Self::resolve_bindings(&self.config);
        info!("Monitoring {} binding(s)", self.bindings.len());

        for pad_cfg in &self.config.pads {
            let pad = pad_cfg.pad();
            if let Some(mode) = pad_cfg.mode {
                self.session
                    .set_mode(pad, mode, ModeLock::from(pad_cfg.lock))
                    .context(format!("Failed to set mode on {}", pad))?;
                info!("  - {}: mode {:?}, lock {}", pad, mode, pad_cfg.lock);
            }
            if let Some(motors) = pad_cfg.motors {
                self.session
                    .enable_motors(pad, motors.motor1.into(), motors.motor2.into())
                    .context(format!("Failed to enable motors on {}", pad))?;
                info!(
                    "  - {}: motor1 {}, motor2 {}",
                    pad, motors.motor1, motors.motor2
                );
            }
        }

        for pad in self.pads() {
            self.session
                .poll(pad)
                .context(format!("Failed to poll {}", pad))?;
        }
        Ok(())
    }

    fn resolve_bindings(config: &Config) -> Vec<Binding> {
        let mut bindings = Vec::new();
        for pad_cfg in &config.pads {
            for b in &pad_cfg.bindings {
                // validate() has already rejected unknown names
                let Ok(button) = b.resolve() else { continue };
                let action = match (&b.command, b.motor) {
                    (Some(cmd), _) => Action::Command(cmd.clone()),
                    (None, Some(motor)) => Action::Motor(motor),
                    (None, None) => continue,
                };
                let label = match &b.description {
                    Some(desc) => format!("{} {} {:?} ({})", pad_cfg.pad(), button, b.on, desc),
                    None => format!("{} {} {:?}", pad_cfg.pad(), button, b.on),
                };
                debug!("Binding: {}", label);
                bindings.push(Binding {
                    pad: pad_cfg.pad(),
                    button,
                    edge: b.on,
                    action,
                    label,
                });
            }
        }
        bindings
    }

    /// Pads to poll: every configured pad, or pad 1 alone when none are.
    pub fn pads(&self) -> Vec<Pad> {
        if self.config.pads.is_empty() {
            vec![Pad::One]
        } else {
            self.config.pads.iter().map(|p| p.pad()).collect()
        }
    }

    #[cfg(test)]
    pub fn session(&self) -> &Session<L, D> {
        &self.session
    }

    pub async fn poll(&mut self) -> Result<()> {
        for fired in self.poll_pads()? {
            if let Action::Command(cmd) = fired.action {
                CommandExecutor::spawn(cmd, fired.label);
            }
        }

        // Sleep for the configured polling interval
        sleep(Duration::from_millis(self.config.polling.interval_ms)).await;

        Ok(())
    }

    /// Poll every pad once and evaluate bindings. Motor actions are staged
    /// immediately; command actions are returned for the caller to run.
    pub fn poll_pads(&mut self) -> Result<Vec<Fired>> {
        let mut fired = Vec::new();

        for pad in self.pads() {
            self.session
                .poll(pad)
                .context(format!("Failed to poll {}", pad))?;
            self.track_presence(pad);
            self.log_sticks(pad);

            for b in self.bindings.iter().filter(|b| b.pad == pad) {
                let hit = match b.edge {
                    Edge::Pressed => self.session.pressed(pad, b.button),
                    Edge::Released => self.session.released(pad, b.button),
                };
                if !hit {
                    continue;
                }
                info!("Triggered: {}", b.label);
                fired.push(Fired {
                    pad,
                    label: b.label.clone(),
                    action: b.action.clone(),
                });
            }
        }

        for f in &fired {
            if let Action::Motor(motor) = f.action {
                self.session
                    .set_motor_levels(f.pad, Motor1::from(motor.motor1), motor.motor2);
            }
        }

        Ok(fired)
    }

    fn track_presence(&mut self, pad: Pad) {
        let now = self.session.is_present(pad);
        let slot = &mut self.present[pad.index()];
        if *slot == Some(now) {
            return;
        }
        if now {
            info!("{} connected, mode {:?}", pad, self.session.mode(pad));
        } else {
            warn!("{} not responding", pad);
        }
        *slot = Some(now);
    }

    fn log_sticks(&self, pad: Pad) {
        if self.session.mode(pad) != PadMode::Analog {
            return;
        }
        let deadzone = self
            .config
            .pads
            .iter()
            .find(|p| p.pad() == pad)
            .map(|p| p.deadzone)
            .unwrap_or(DEFAULT_DEADZONE);
        for axis in Axis::ALL {
            let value = self.session.axis(pad, axis);
            if value.abs_diff(STICK_CENTRE) > deadzone {
                debug!("{} {:?} = {}", pad, axis, value);
            }
        }
    }

    pub fn reload_config(&mut self, new_config: Config) -> Result<()> {
        new_config.validate().context("Invalid configuration")?;
        if new_config.gpio != self.config.gpio || new_config.platform != self.config.platform {
            warn!("GPIO and platform changes take effect only after a restart");
        }
        let platform = self.config.platform;
        let gpio = self.config.gpio.clone();
        self.config = Config {
            platform,
            gpio,
            ..new_config
        };
        self.init()?;
        info!("Configuration reloaded successfully");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use psx_link::sim::{SimulatedPad, VirtualDelay, ANALOG_IDLE, DIGITAL_IDLE};

    const CONFIG: &str = r#"
gpio:
  backend: simulated
  clock: 4
  command: 3
  data: 2
  attention1: 5
pads:
  - pad: 1
    mode: analog
    lock: true
    motors: { motor1: true, motor2: true }
    bindings:
      - button: circle
        on: pressed
        motor: { motor1: true, motor2: 200 }
      - button: circle
        on: released
        motor: { motor1: false }
      - button: start
        on: pressed
        command: "echo start"
"#;

    fn config() -> Config {
        serde_yaml::from_str(CONFIG).unwrap()
    }

    fn circle_held() -> [u8; 9] {
        let mut f = ANALOG_IDLE;
        f[4] &= !Button::CIRCLE.mask();
        f
    }

    fn daemon(sim: SimulatedPad) -> Daemon<SimulatedPad, VirtualDelay> {
        Daemon::new(config(), sim.without_attention2(), VirtualDelay::new()).unwrap()
    }

    #[test]
    fn test_init_configures_pad() {
        let mut sim = SimulatedPad::new();
        sim.connect(Pad::One, DIGITAL_IDLE);
        let d = daemon(sim);

        let sent = d.session().lines().received();
        // mode bracket, motor bracket, seeding poll
        assert_eq!(sent.len(), 7);
        assert_eq!(&sent[1][..5], &[0x01, 0x44, 0x00, 0x01, 0x03]);
        assert_eq!(&sent[4][..5], &[0x01, 0x4D, 0x00, 0x00, 0x01]);
        assert!(d.session().is_analog(Pad::One));
    }

    #[test]
    fn test_motor_bindings_follow_edges() {
        let mut sim = SimulatedPad::new();
        sim.connect(Pad::One, DIGITAL_IDLE);
        let mut d = daemon(sim);

        d.session.lines_mut().queue_response(circle_held());
        let fired = d.poll_pads().unwrap();
        assert_eq!(fired.len(), 1);
        assert_eq!(
            d.session().motor_levels(Pad::One),
            psx_link::session::MotorLevels {
                motor1: 0xFF,
                motor2: 200
            }
        );

        // held, no new edge
        d.session.lines_mut().queue_response(circle_held());
        assert!(d.poll_pads().unwrap().is_empty());
        assert_eq!(d.session().lines().motor_levels(Pad::One), (0xFF, 200));

        let fired = d.poll_pads().unwrap();
        assert_eq!(
            fired[0].action,
            Action::Motor(MotorAction {
                motor1: false,
                motor2: 0
            })
        );
        assert_eq!(d.session().motor_levels(Pad::One).motor1, 0x00);
    }

    #[test]
    fn test_command_binding_returned() {
        let mut sim = SimulatedPad::new();
        sim.connect(Pad::One, DIGITAL_IDLE);
        let mut d = daemon(sim);

        let mut start = ANALOG_IDLE;
        start[3] &= !Button::START.mask();
        d.session.lines_mut().queue_response(start);
        let fired = d.poll_pads().unwrap();
        assert_eq!(fired[0].action, Action::Command("echo start".to_string()));
    }

    #[test]
    fn test_presence_tracking() {
        let mut d = daemon(SimulatedPad::new());
        d.poll_pads().unwrap();
        assert_eq!(d.present[0], Some(false));

        d.session.lines_mut().connect(Pad::One, DIGITAL_IDLE);
        d.poll_pads().unwrap();
        assert_eq!(d.present[0], Some(true));
    }

    #[test]
    fn test_reload_keeps_wiring() {
        let mut sim = SimulatedPad::new();
        sim.connect(Pad::One, DIGITAL_IDLE);
        let mut d = daemon(sim);

        let mut new_config = config();
        new_config.gpio.clock = 17;
        new_config.pads[0].bindings.clear();
        d.reload_config(new_config).unwrap();

        assert_eq!(d.config.gpio.clock, 4);
        assert!(d.bindings.is_empty());
    }

    #[test]
    fn test_defaults_to_pad_one() {
        let mut config = config();
        config.pads.clear();
        let d = Daemon::new(config, SimulatedPad::new(), VirtualDelay::new()).unwrap();
        assert_eq!(d.pads(), vec![Pad::One]);
        assert_eq!(d.session().lines().exchanges().len(), 1);
    }
}
