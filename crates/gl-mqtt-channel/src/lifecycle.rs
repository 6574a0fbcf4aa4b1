//! Connection lifecycle state machine.
//!
//! Every transport event goes through [`ConnectionMonitor::apply`], which
//! decides the next state and emits the matching log line. Events that make
//! no sense in the current state are dropped.

use std::fmt;

/// Observable state of the broker connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Connected,
    Offline,
    Reconnecting,
    /// A transport or protocol error surfaced. Not terminal.
    Errored,
    /// Terminal for this handle.
    Closed,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Offline => "offline",
            Self::Reconnecting => "reconnecting",
            Self::Errored => "errored",
            Self::Closed => "closed",
        };
        f.write_str(s)
    }
}

/// Lifecycle events reported by the transport layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// Handshake and authentication succeeded.
    Connect,
    /// Broker unreachable.
    Offline,
    /// Reconnect interval elapsed; a new attempt starts.
    Reconnect,
    Error(String),
    Close,
}

/// Tracks the connection state and logs each transition.
#[derive(Debug)]
pub struct ConnectionMonitor {
    state: ConnectionState,
    connects: u64,
}

impl ConnectionMonitor {
    pub fn new() -> Self {
        Self {
            state: ConnectionState::Connecting,
            connects: 0,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Number of times the connection reached `Connected`.
    pub fn connects(&self) -> u64 {
        self.connects
    }

    pub fn is_closed(&self) -> bool {
        self.state == ConnectionState::Closed
    }

    /// Apply an event. Returns the new state if a transition happened.
    pub fn apply(&mut self, event: TransportEvent) -> Option<ConnectionState> {
        let Some(next) = next_state(self.state, &event) else {
            tracing::debug!(state = %self.state, event = ?event, "ignoring lifecycle event");
            return None;
        };

        match &event {
            TransportEvent::Connect => {
                self.connects += 1;
                tracing::info!(connects = self.connects, "connected to MQTT broker");
            }
            TransportEvent::Offline => tracing::warn!("MQTT broker is currently offline"),
            TransportEvent::Reconnect => tracing::info!("reconnecting to MQTT broker"),
            TransportEvent::Error(message) => {
                tracing::error!(error = %message, "MQTT connection error");
            }
            TransportEvent::Close => tracing::info!("MQTT connection closed"),
        }

        self.state = next;
        Some(next)
    }
}

impl Default for ConnectionMonitor {
    fn default() -> Self {
        Self::new()
    }
}

fn next_state(current: ConnectionState, event: &TransportEvent) -> Option<ConnectionState> {
    use ConnectionState::*;

    match (current, event) {
        (Closed, _) => None,
        (Connecting | Reconnecting, TransportEvent::Connect) => Some(Connected),
        (Connected | Connecting | Reconnecting | Errored, TransportEvent::Offline) => Some(Offline),
        (Offline, TransportEvent::Reconnect) => Some(Reconnecting),
        (_, TransportEvent::Error(_)) => Some(Errored),
        (_, TransportEvent::Close) => Some(Closed),
        _ => None,
    }
}
