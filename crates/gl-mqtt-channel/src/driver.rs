//! MQTT event loop driver.
//!
//! Polls the rumqttc event loop, translates what it sees into lifecycle
//! events for the [`ConnectionMonitor`], and waits the fixed reconnect
//! interval after every connection failure before polling again.

use std::time::Duration;

use rumqttc::{
    ConnectReturnCode, ConnectionError, Event, EventLoop, Outgoing, Packet, SubscribeReasonCode,
};

use crate::lifecycle::{ConnectionMonitor, ConnectionState, TransportEvent};

/// What the driver loop should do after observing a poll result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Continue,
    /// Connection lost; wait the reconnect interval, then poll again.
    Backoff,
    Stop,
}

/// Owns the event loop and the connection state.
///
/// Must be polled via [`ConnectionDriver::run`] for the client to make any
/// progress: requests from `BrokerClient` are only sent while it runs.
pub struct ConnectionDriver {
    eventloop: EventLoop,
    monitor: ConnectionMonitor,
    reconnect_interval: Duration,
}

impl ConnectionDriver {
    pub fn new(eventloop: EventLoop, reconnect_interval: Duration) -> Self {
        Self {
            eventloop,
            monitor: ConnectionMonitor::new(),
            reconnect_interval,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.monitor.state()
    }

    pub fn reconnect_interval(&self) -> Duration {
        self.reconnect_interval
    }

    pub fn monitor(&self) -> &ConnectionMonitor {
        &self.monitor
    }

    /// Process one poll result.
    ///
    /// On a lost connection this waits the reconnect interval and moves to
    /// `Reconnecting` before returning `Step::Backoff`.
    pub async fn handle(&mut self, result: Result<Event, ConnectionError>) -> Step {
        let step = observe(&mut self.monitor, result);
        if step == Step::Backoff {
            tokio::time::sleep(self.reconnect_interval).await;
            self.monitor.apply(TransportEvent::Reconnect);
        }
        step
    }

    /// Drive the connection until it is closed.
    ///
    /// Reconnects indefinitely at the fixed interval; there is no attempt cap.
    pub async fn run(mut self) {
        loop {
            let result = self.eventloop.poll().await;
            if self.handle(result).await == Step::Stop {
                break;
            }
        }
        tracing::debug!("MQTT connection driver stopped");
    }
}

/// Map a rumqttc event onto a lifecycle event, if it is one.
pub fn classify(event: &Event) -> Option<TransportEvent> {
    match event {
        Event::Incoming(Packet::ConnAck(ack)) => {
            if ack.code == ConnectReturnCode::Success {
                Some(TransportEvent::Connect)
            } else {
                Some(TransportEvent::Error(format!(
                    "connection refused: {:?}",
                    ack.code
                )))
            }
        }
        Event::Incoming(Packet::Disconnect) | Event::Outgoing(Outgoing::Disconnect) => {
            Some(TransportEvent::Close)
        }
        _ => None,
    }
}

/// Feed one poll result into the monitor.
pub fn observe(
    monitor: &mut ConnectionMonitor,
    result: Result<Event, ConnectionError>,
) -> Step {
    match result {
        Ok(event) => {
            if let Event::Incoming(Packet::SubAck(ack)) = &event {
                log_suback(ack.pkid, &ack.return_codes);
            }

            match classify(&event) {
                Some(TransportEvent::Error(message)) => {
                    monitor.apply(TransportEvent::Error(message));
                    monitor.apply(TransportEvent::Offline);
                    Step::Backoff
                }
                Some(lifecycle) => {
                    monitor.apply(lifecycle);
                    if monitor.is_closed() {
                        Step::Stop
                    } else {
                        Step::Continue
                    }
                }
                None => Step::Continue,
            }
        }
        // Every client handle was dropped; nothing can use the connection anymore.
        Err(ConnectionError::RequestsDone) => {
            monitor.apply(TransportEvent::Close);
            Step::Stop
        }
        Err(e) => {
            monitor.apply(TransportEvent::Error(e.to_string()));
            monitor.apply(TransportEvent::Offline);
            Step::Backoff
        }
    }
}

fn log_suback(pkid: u16, codes: &[SubscribeReasonCode]) {
    let rejected = codes
        .iter()
        .filter(|c| matches!(c, SubscribeReasonCode::Failure))
        .count();
    if rejected == 0 {
        tracing::info!(pkid, granted = ?codes, "successfully subscribed");
    } else {
        tracing::error!(pkid, granted = ?codes, rejected, "failed to subscribe to MQTT topic");
    }
}
