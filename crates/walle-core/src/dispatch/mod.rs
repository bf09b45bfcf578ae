//! Command dispatcher
//!
//! The façade between producers and the device. The dispatcher is the
//! sole owner of the [`ActuatorRegistry`] and the [`SerialLink`]; every
//! request is turned into registry updates followed by protocol writes.
//!
//! # Example
//!
//! ```no_run
//! use walle_core::{ActuatorId, BridgeConfig, Dispatcher};
//!
//! let config = BridgeConfig::new("/dev/ttyUSB0");
//! let mut bridge = Dispatcher::connect(config)?;
//!
//! let outcome = bridge.send_position(ActuatorId::NeckTop, 80);
//! println!("{}", outcome);
//!
//! let _ = bridge.send_velocity(0.5, 0.0, 100);
//! bridge.shutdown();
//! # Ok::<(), walle_core::Error>(())
//! ```
//!
//! Registry updates are never rolled back: if a write fails, the
//! intended value stays recorded and the next successful command
//! re-synchronizes the device.

mod outcome;

pub use outcome::{CommandOutcome, Echo, PresetReport, VelocityOutcome};

use std::thread;

use crate::actuator::{ActuatorId, ActuatorRegistry, ActuatorState, Preset};
use crate::config::{BridgeConfig, DispatchConfig, EchoPolicy};
use crate::link::{ConnectionState, Connector, SerialConnector, SerialLink};
use crate::protocol::{codec, Command};
use crate::Result;

/// Scale a normalized velocity by a percentage cap
///
/// Truncates toward zero and clamps to the drive range. `max_speed`
/// above 100 is treated as 100; NaN maps to 0.
pub fn scale_velocity(velocity: f64, max_speed: u8) -> i32 {
    let cap = f64::from(max_speed.min(BridgeConfig::MAX_SPEED_LIMIT));
    ((velocity * cap).trunc() as i32).clamp(-100, 100)
}

/// Translates requests into protocol writes
pub struct Dispatcher<C: Connector = SerialConnector> {
    registry: ActuatorRegistry,
    link: SerialLink<C>,
    config: DispatchConfig,
    home: Preset,
    shut_down: bool,
}

impl Dispatcher<SerialConnector> {
    /// Open the configured serial device and start the bridge
    ///
    /// Fails with [`crate::Error::Connection`] if the device cannot be
    /// opened; the bridge cannot run without a link.
    pub fn connect(config: BridgeConfig) -> Result<Self> {
        Self::with_connector(config, SerialConnector)
    }
}

impl<C: Connector> Dispatcher<C> {
    /// Start the bridge on a custom connector
    pub fn with_connector(config: BridgeConfig, connector: C) -> Result<Self> {
        config.validate()?;
        let BridgeConfig {
            link, dispatch, home, ..
        } = config;

        let mut link = SerialLink::new(link, connector);
        link.open()?;

        let mut dispatcher = Self {
            registry: ActuatorRegistry::new(),
            link,
            config: dispatch,
            home,
            shut_down: false,
        };

        if dispatcher.config.probe_on_connect {
            let _ = dispatcher.probe();
        }
        Ok(dispatcher)
    }

    /// Commanded positions
    pub fn registry(&self) -> &ActuatorRegistry {
        &self.registry
    }

    /// Copy of the commanded positions
    pub fn state(&self) -> ActuatorState {
        self.registry.snapshot()
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.link.state()
    }

    /// Whether [`Dispatcher::shutdown`] has run
    pub fn is_shut_down(&self) -> bool {
        self.shut_down
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// Pose applied by [`Dispatcher::home`]
    pub fn home_preset(&self) -> &Preset {
        &self.home
    }

    /// Re-send the head rotation's current value and report the echo
    pub fn probe(&mut self) -> CommandOutcome {
        tracing::info!("Testing controller connection...");
        let id = ActuatorId::HeadRotation;
        let outcome = self.send_with(id, self.registry.get(id), EchoPolicy::Capture);
        match &outcome {
            CommandOutcome::Sent {
                echo: Echo::Received(text),
                ..
            } => tracing::info!("Controller echo: {}", text),
            CommandOutcome::Sent { .. } => {
                tracing::warn!("No response from controller - check connection!")
            }
            CommandOutcome::Failed { .. } => {}
        }
        outcome
    }

    /// Move an actuator to an absolute position
    pub fn send_position(&mut self, actuator: ActuatorId, value: i32) -> CommandOutcome {
        self.send_with(actuator, value, self.config.position_echo)
    }

    /// Move an actuator relative to its commanded position
    pub fn step(&mut self, actuator: ActuatorId, delta: i32) -> CommandOutcome {
        let stored = self.registry.step(actuator, delta);
        self.send_stored(actuator, stored, self.config.position_echo)
    }

    /// Move an actuator back to its default
    pub fn reset(&mut self, actuator: ActuatorId) -> CommandOutcome {
        let stored = self.registry.reset(actuator);
        self.send_stored(actuator, stored, self.config.position_echo)
    }

    /// Drive with normalized linear/angular velocities in [-1.0, 1.0]
    ///
    /// Sends the linear channel, then the turn channel, each followed by
    /// the drive spacing.
    pub fn send_velocity(&mut self, linear: f64, angular: f64, max_speed: u8) -> VelocityOutcome {
        let policy = self.config.velocity_echo;
        let spacing = self.config.drive_spacing();

        let linear = self.send_with(
            ActuatorId::DriveLinear,
            scale_velocity(linear, max_speed),
            policy,
        );
        thread::sleep(spacing);
        let angular = self.send_with(
            ActuatorId::DriveTurn,
            scale_velocity(angular, max_speed),
            policy,
        );
        thread::sleep(spacing);

        tracing::debug!("Sent: {}, {}", linear.command(), angular.command());
        VelocityOutcome { linear, angular }
    }

    /// Apply a preset as a sequence of individual moves
    ///
    /// A failed step does not stop the sequence; the report lists every
    /// outcome.
    pub fn apply_preset(&mut self, preset: &Preset) -> PresetReport {
        if preset.is_empty() {
            tracing::warn!("Preset '{}' has no targets", preset.name);
            return PresetReport {
                name: preset.name.clone(),
                outcomes: Vec::new(),
            };
        }
        tracing::info!(
            "Applying preset '{}' ({} actuators)",
            preset.name,
            preset.len()
        );
        let spacing = self.config.preset_spacing();

        let mut outcomes = Vec::with_capacity(preset.len());
        for (actuator, value) in preset.iter() {
            outcomes.push(self.send_position(actuator, value));
            thread::sleep(spacing);
        }

        let report = PresetReport {
            name: preset.name.clone(),
            outcomes,
        };
        if report.is_complete() {
            tracing::info!("Preset '{}' applied", report.name);
        } else {
            tracing::warn!(
                "Preset '{}' partially applied: {} of {} commands failed",
                report.name,
                report.failures().count(),
                report.outcomes.len()
            );
        }
        report
    }

    /// Every actuator to its default
    pub fn center_all(&mut self) -> PresetReport {
        self.apply_preset(&Preset::center())
    }

    /// Move to the configured rest pose
    pub fn home(&mut self) -> PresetReport {
        let home = self.home.clone();
        self.apply_preset(&home)
    }

    /// Command zero on every drive channel
    pub fn stop_all_drive(&mut self) -> Vec<CommandOutcome> {
        let policy = self.config.velocity_echo;
        let spacing = self.config.drive_spacing();
        ActuatorId::DRIVES
            .into_iter()
            .map(|id| {
                let outcome = self.send_with(id, 0, policy);
                thread::sleep(spacing);
                outcome
            })
            .collect()
    }

    /// Reopen a faulted link
    pub fn reopen(&mut self) -> Result<ConnectionState> {
        self.link.reopen()
    }

    /// Stop the drives and close the link
    ///
    /// Runs at most once; also run from `Drop`.
    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.shut_down = true;

        tracing::info!("Shutting down bridge");
        let _ = self.stop_all_drive();
        self.link.close();
    }

    fn send_with(&mut self, actuator: ActuatorId, value: i32, policy: EchoPolicy) -> CommandOutcome {
        let stored = self.registry.set(actuator, value);
        self.send_stored(actuator, stored, policy)
    }

    /// Write a value the registry already holds
    fn send_stored(&mut self, actuator: ActuatorId, stored: i32, policy: EchoPolicy) -> CommandOutcome {
        let command = Command::for_actuator(actuator, stored);

        match self.transmit(command, policy) {
            Ok(echo) => {
                tracing::debug!("{}: {}", actuator, stored);
                CommandOutcome::Sent {
                    actuator,
                    command,
                    echo,
                }
            }
            Err(e) => {
                tracing::error!("Command {} for {} failed: {}", command, actuator, e);
                CommandOutcome::Failed {
                    actuator,
                    command,
                    reason: e.to_string(),
                }
            }
        }
    }

    fn transmit(&mut self, command: Command, policy: EchoPolicy) -> Result<Echo> {
        if policy == EchoPolicy::Capture {
            self.link.discard_input()?;
        }

        tracing::debug!("Sending: {}", command);
        self.link.write_command(&command.to_bytes())?;

        if policy == EchoPolicy::Skip {
            return Ok(Echo::Skipped);
        }

        thread::sleep(self.config.echo_delay());
        let echo = match self.link.read_line(self.config.echo_timeout())? {
            Some(line) => match codec::decode_echo(&line) {
                Ok(text) => {
                    tracing::debug!("Controller: {}", text);
                    Echo::Received(text)
                }
                Err(e) => {
                    tracing::debug!("Unreadable echo after {}: {}", command, e);
                    Echo::Missing
                }
            },
            None => {
                tracing::debug!("No echo after {}", command);
                Echo::Missing
            }
        };
        Ok(echo)
    }
}

impl<C: Connector> Drop for Dispatcher<C> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::link::mock::{MockConnector, MockEvent, MockHandle};
    use crate::Error;

    fn config() -> BridgeConfig {
        BridgeConfig::new("/dev/mock")
            .with_settle_delay(Duration::ZERO)
            .with_dispatch(DispatchConfig::immediate())
    }

    fn dispatcher(handle: &MockHandle) -> Dispatcher<MockConnector> {
        let d = Dispatcher::with_connector(config(), handle.connector()).unwrap();
        handle.clear_events();
        d
    }

    #[test]
    fn test_scale_velocity() {
        assert_eq!(scale_velocity(1.0, 100), 100);
        assert_eq!(scale_velocity(-0.5, 50), -25);
        assert_eq!(scale_velocity(0.5, 50), 25);
        assert_eq!(scale_velocity(0.29, 100), 28);
        assert_eq!(scale_velocity(-0.999, 10), -9);
        assert_eq!(scale_velocity(3.0, 100), 100);
        assert_eq!(scale_velocity(-3.0, 100), -100);
        assert_eq!(scale_velocity(1.0, 200), 100);
        assert_eq!(scale_velocity(f64::NAN, 100), 0);
        assert_eq!(scale_velocity(0.7, 0), 0);
    }

    #[test]
    fn test_connect_failure_is_fatal() {
        let handle = MockHandle::new();
        handle.fail_open(true);
        let result = Dispatcher::with_connector(config(), handle.connector());
        assert!(matches!(result, Err(Error::Connection(_))));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let handle = MockHandle::new();
        let result =
            Dispatcher::with_connector(config().with_max_speed(150), handle.connector());
        assert!(matches!(result, Err(Error::Config(_))));
        assert!(!handle.is_open());
    }

    #[test]
    fn test_probe_on_connect() {
        let handle = MockHandle::new();
        handle.set_auto_echo(true);
        let mut dispatch = DispatchConfig::immediate();
        dispatch.probe_on_connect = true;
        let _d = Dispatcher::with_connector(config().with_dispatch(dispatch), handle.connector())
            .unwrap();
        assert_eq!(handle.writes(), vec!["G50"]);
    }

    #[test]
    fn test_send_position_captures_echo() {
        let handle = MockHandle::new();
        handle.set_auto_echo(true);
        let mut d = dispatcher(&handle);

        let outcome = d.send_position(ActuatorId::NeckTop, 80);
        assert!(outcome.is_sent());
        assert_eq!(outcome.value(), 80);
        assert_eq!(outcome.echo(), Some("T80"));
        assert_eq!(
            handle.events(),
            vec![MockEvent::DiscardInput, MockEvent::Write(b"T80\n".to_vec())]
        );
    }

    #[test]
    fn test_send_position_missing_echo_is_not_an_error() {
        let handle = MockHandle::new();
        let mut d = dispatcher(&handle);
        let outcome = d.send_position(ActuatorId::EyeLeft, 30);
        assert!(matches!(
            outcome,
            CommandOutcome::Sent {
                echo: Echo::Missing,
                ..
            }
        ));
        assert_eq!(d.connection_state(), ConnectionState::Connected);
    }

    #[test]
    fn test_stale_input_is_not_taken_as_echo() {
        let handle = MockHandle::new();
        let mut d = dispatcher(&handle);
        handle.push_incoming(b"stale\n");
        let outcome = d.send_position(ActuatorId::EyeLeft, 30);
        assert!(outcome.is_sent());
        assert_eq!(outcome.echo(), None);
    }

    #[test]
    fn test_send_position_clamps_before_encoding() {
        let handle = MockHandle::new();
        let mut d = dispatcher(&handle);
        let outcome = d.send_position(ActuatorId::ArmRight, 140);
        assert_eq!(outcome.value(), 100);
        assert_eq!(d.registry().get(ActuatorId::ArmRight), 100);
        assert_eq!(handle.writes(), vec!["R100"]);
    }

    #[test]
    fn test_skip_policy_does_not_read() {
        let handle = MockHandle::new();
        handle.set_auto_echo(true);
        let mut d = dispatcher(&handle);
        d.config.position_echo = EchoPolicy::Skip;
        let outcome = d.send_position(ActuatorId::HeadRotation, 10);
        assert!(matches!(
            outcome,
            CommandOutcome::Sent {
                echo: Echo::Skipped,
                ..
            }
        ));
        assert_eq!(handle.events(), vec![MockEvent::Write(b"G10\n".to_vec())]);
    }

    #[test]
    fn test_failure_keeps_intended_value() {
        let handle = MockHandle::new();
        let mut d = dispatcher(&handle);
        handle.fail_writes(true);

        let outcome = d.send_position(ActuatorId::NeckBottom, 15);
        assert!(outcome.is_failed());
        assert_eq!(outcome.value(), 15);
        assert_eq!(d.registry().get(ActuatorId::NeckBottom), 15);
        assert_eq!(d.connection_state(), ConnectionState::Faulted);

        // Still failing until reopened, still not raising
        handle.fail_writes(false);
        assert!(d.send_position(ActuatorId::NeckBottom, 16).is_failed());
        assert_eq!(d.reopen().unwrap(), ConnectionState::Connected);
        assert!(d.send_position(ActuatorId::NeckBottom, 17).is_sent());
    }

    #[test]
    fn test_step_and_reset() {
        let handle = MockHandle::new();
        let mut d = dispatcher(&handle);
        assert_eq!(d.step(ActuatorId::ArmLeft, 5).value(), 55);
        assert_eq!(d.step(ActuatorId::ArmLeft, -1).value(), 54);
        assert_eq!(d.reset(ActuatorId::ArmLeft).value(), 50);
        assert_eq!(handle.writes(), vec!["L55", "L54", "L50"]);
    }

    #[test]
    fn test_send_velocity_order_and_values() {
        let handle = MockHandle::new();
        let mut d = dispatcher(&handle);

        let outcome = d.send_velocity(1.0, 0.0, 100);
        assert!(outcome.is_sent());
        assert_eq!(handle.writes(), vec!["Y100", "X0"]);

        handle.clear_events();
        let _ = d.send_velocity(-0.5, 0.5, 50);
        assert_eq!(handle.writes(), vec!["Y-25", "X25"]);
        assert_eq!(d.registry().get(ActuatorId::DriveLinear), -25);
        assert_eq!(d.registry().get(ActuatorId::DriveTurn), 25);
    }

    #[test]
    fn test_send_velocity_skips_echo_by_default() {
        let handle = MockHandle::new();
        handle.set_auto_echo(true);
        let mut d = dispatcher(&handle);
        let outcome = d.send_velocity(0.2, -0.2, 100);
        assert_eq!(outcome.linear.echo(), None);
        assert!(!handle.events().contains(&MockEvent::DiscardInput));
    }

    #[test]
    fn test_send_velocity_spacing() {
        let handle = MockHandle::new();
        let mut d = dispatcher(&handle);
        d.config.drive_spacing_ms = 15;

        let start = std::time::Instant::now();
        let _ = d.send_velocity(0.3, 0.3, 100);
        let elapsed = start.elapsed();

        let times = handle.write_times();
        assert_eq!(times.len(), 2);
        assert!(times[1].duration_since(times[0]) >= Duration::from_millis(15));
        assert!(elapsed >= Duration::from_millis(30));
    }

    #[test]
    fn test_home_preset_in_declared_order() {
        let handle = MockHandle::new();
        let mut d = dispatcher(&handle);
        let report = d.home();
        assert!(report.is_complete());
        assert_eq!(
            handle.writes(),
            vec!["G50", "T80", "B20", "U40", "E40", "L50", "R50"]
        );
        for (id, value) in Preset::home().iter() {
            assert_eq!(d.registry().get(id), value);
        }
    }

    #[test]
    fn test_center_all_covers_drives() {
        let handle = MockHandle::new();
        let mut d = dispatcher(&handle);
        let _ = d.send_velocity(0.5, 0.5, 100);
        let _ = d.send_position(ActuatorId::NeckTop, 90);
        handle.clear_events();

        let report = d.center_all();
        assert_eq!(report.outcomes.len(), ActuatorId::ALL.len());
        assert_eq!(
            handle.writes(),
            vec!["G50", "T50", "B50", "U50", "E50", "L50", "R50", "Y0", "X0"]
        );
    }

    #[test]
    fn test_partial_preset_is_reported() {
        let handle = MockHandle::new();
        let mut d = dispatcher(&handle);
        handle.fail_writes(true);
        let report = d.home();
        assert!(!report.is_complete());
        assert_eq!(report.outcomes.len(), 7);
        assert_eq!(report.failures().count(), 7);
        // Intended pose is still recorded
        assert_eq!(d.registry().get(ActuatorId::NeckTop), 80);
    }

    #[test]
    fn test_custom_home() {
        let handle = MockHandle::new();
        let home = Preset::new("rest").with(ActuatorId::ArmLeft, 5);
        let mut d =
            Dispatcher::with_connector(config().with_home(home), handle.connector()).unwrap();
        let _ = d.home();
        assert_eq!(handle.writes(), vec!["L5"]);
    }

    #[test]
    fn test_empty_preset_writes_nothing() {
        let handle = MockHandle::new();
        let mut d = dispatcher(&handle);
        let report = d.apply_preset(&Preset::new("nothing"));
        assert!(report.outcomes.is_empty());
        assert!(report.is_complete());
        assert!(handle.writes().is_empty());
    }

    #[test]
    fn test_stop_all_drive() {
        let handle = MockHandle::new();
        let mut d = dispatcher(&handle);
        let _ = d.send_velocity(0.8, -0.4, 100);
        let outcomes = d.stop_all_drive();
        assert!(outcomes.iter().all(CommandOutcome::is_sent));
        assert_eq!(handle.writes(), vec!["Y80", "X-40", "Y0", "X0"]);
        assert_eq!(d.registry().get(ActuatorId::DriveLinear), 0);
        assert_eq!(d.registry().get(ActuatorId::DriveTurn), 0);
    }

    #[test]
    fn test_shutdown_stops_then_releases() {
        let handle = MockHandle::new();
        let mut d = dispatcher(&handle);
        let _ = d.send_velocity(1.0, 1.0, 100);
        d.shutdown();

        let events = handle.events();
        assert_eq!(events.last(), Some(&MockEvent::Released));
        let writes = handle.writes();
        assert_eq!(&writes[..2], &["Y100", "X100"]);
        assert!(writes[2..].iter().all(|w| w == "Y0" || w == "X0"));
        assert_eq!(d.connection_state(), ConnectionState::Disconnected);

        // Second shutdown is a no-op
        d.shutdown();
        assert_eq!(handle.events(), events);
    }

    #[test]
    fn test_drop_stops_drives() {
        let handle = MockHandle::new();
        {
            let mut d = dispatcher(&handle);
            let _ = d.send_velocity(0.6, 0.0, 100);
        }
        let events = handle.events();
        let released = events
            .iter()
            .position(|e| *e == MockEvent::Released)
            .unwrap();
        let before: Vec<_> = events[..released].to_vec();
        assert!(before.contains(&MockEvent::Write(b"Y0\n".to_vec())));
        assert!(before.contains(&MockEvent::Write(b"X0\n".to_vec())));
        assert!(!handle.is_open());
    }
}
