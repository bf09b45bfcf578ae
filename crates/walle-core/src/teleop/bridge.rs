//! Dispatch loop
//!
//! The [`Bridge`] is the single consumer of [`BridgeRequest`]s. It owns
//! the dispatcher, so every write to the link happens on the thread that
//! calls [`Bridge::run`].
//!
//! Velocity requests that queue up while a slow command (a preset, an
//! echo wait) is in flight are collapsed to the newest one; actions are
//! never dropped.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::comm::Receiver;
use crate::config::BridgeConfig;
use crate::dispatch::{Dispatcher, VelocityOutcome};
use crate::link::{ConnectionState, Connector, SerialConnector};
use crate::Result;

use super::action::{Action, ActionOutcome};
use super::session::OperatorSession;
use super::velocity::VelocityCommand;

/// How often the loop re-checks the running flag while idle
pub const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Request from a producer
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BridgeRequest {
    Velocity(VelocityCommand),
    Action(Action),
    /// Stop the drives, close the link and leave the loop
    Shutdown,
}

/// What handling a request did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeEvent {
    Velocity(VelocityOutcome),
    Action(ActionOutcome),
    Stopped,
}

/// Owner of the dispatcher and operator session
pub struct Bridge<C: Connector = SerialConnector> {
    dispatcher: Dispatcher<C>,
    session: OperatorSession,
    max_speed: u8,
    /// Non-velocity request read while coalescing
    deferred: Option<BridgeRequest>,
}

impl Bridge<SerialConnector> {
    /// Connect to the configured serial device
    pub fn connect(config: BridgeConfig) -> Result<Self> {
        Self::with_connector(config, SerialConnector)
    }
}

impl<C: Connector> Bridge<C> {
    pub fn with_connector(config: BridgeConfig, connector: C) -> Result<Self> {
        let max_speed = config.max_speed;
        let dispatcher = Dispatcher::with_connector(config, connector)?;
        Ok(Self::new(dispatcher, max_speed))
    }

    pub fn new(dispatcher: Dispatcher<C>, max_speed: u8) -> Self {
        Self {
            dispatcher,
            session: OperatorSession::new(),
            max_speed: max_speed.min(BridgeConfig::MAX_SPEED_LIMIT),
            deferred: None,
        }
    }

    pub fn dispatcher(&self) -> &Dispatcher<C> {
        &self.dispatcher
    }

    pub fn dispatcher_mut(&mut self) -> &mut Dispatcher<C> {
        &mut self.dispatcher
    }

    pub fn session(&self) -> &OperatorSession {
        &self.session
    }

    pub fn max_speed(&self) -> u8 {
        self.max_speed
    }

    /// Handle one request on the calling thread
    ///
    /// A faulted link, or one whose last reopen failed, is reopened
    /// before a velocity or action request is dispatched. If the reopen fails the request is still dispatched
    /// and reported as failed.
    pub fn handle(&mut self, request: BridgeRequest) -> BridgeEvent {
        if request != BridgeRequest::Shutdown {
            self.recover_link();
        }
        match request {
            BridgeRequest::Velocity(v) => BridgeEvent::Velocity(self.dispatcher.send_velocity(
                v.linear,
                v.angular,
                self.max_speed,
            )),
            BridgeRequest::Action(action) => {
                BridgeEvent::Action(self.session.apply(&mut self.dispatcher, action))
            }
            BridgeRequest::Shutdown => {
                self.dispatcher.shutdown();
                BridgeEvent::Stopped
            }
        }
    }

    /// Serve requests until shutdown
    ///
    /// Leaves the loop on a [`BridgeRequest::Shutdown`], when every sender
    /// is dropped, or when `running` is cleared. The dispatcher is shut
    /// down in all three cases. `on_event` sees every handled request.
    pub fn run<F>(
        &mut self,
        requests: &Receiver<BridgeRequest>,
        running: &AtomicBool,
        mut on_event: F,
    ) -> Result<()>
    where
        F: FnMut(&Self, &BridgeEvent),
    {
        tracing::info!("Bridge running (max speed {}%)", self.max_speed);

        while running.load(Ordering::Relaxed) {
            let request = match self.next_request(requests) {
                Ok(Some(request)) => request,
                Ok(None) => continue,
                Err(e) => {
                    tracing::info!("Request channel closed: {}", e);
                    break;
                }
            };

            let event = self.handle(request);
            on_event(self, &event);
            if event == BridgeEvent::Stopped {
                break;
            }
        }

        self.dispatcher.shutdown();
        tracing::info!("Bridge stopped");
        Ok(())
    }

    fn recover_link(&mut self) {
        let state = self.dispatcher.connection_state();
        if state == ConnectionState::Connected || self.dispatcher.is_shut_down() {
            return;
        }
        tracing::warn!("Link {}, reopening before next command", state);
        match self.dispatcher.reopen() {
            Ok(state) => tracing::info!("Link recovered ({})", state),
            Err(e) => tracing::error!("Reopen failed: {}", e),
        }
    }

    fn next_request(
        &mut self,
        requests: &Receiver<BridgeRequest>,
    ) -> Result<Option<BridgeRequest>> {
        let first = match self.deferred.take() {
            Some(request) => request,
            None => match requests.recv_timeout(POLL_INTERVAL)? {
                Some(request) => request,
                None => return Ok(None),
            },
        };

        let BridgeRequest::Velocity(mut latest) = first else {
            return Ok(Some(first));
        };

        let mut skipped = 0usize;
        loop {
            match requests.try_recv() {
                Ok(Some(BridgeRequest::Velocity(v))) => {
                    latest = v;
                    skipped += 1;
                }
                Ok(Some(other)) => {
                    self.deferred = Some(other);
                    break;
                }
                // A closed channel is noticed on the next receive
                Ok(None) | Err(_) => break,
            }
        }
        if skipped > 0 {
            tracing::trace!("Dropped {} stale velocity requests", skipped);
        }
        Ok(Some(BridgeRequest::Velocity(latest)))
    }
}
