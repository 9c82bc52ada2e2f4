//! In-memory communicator for tests.

use crate::communicator::{
    Communicator, DisconnectionInfo, DisconnectionType, ReconnectionInfo, ReconnectionType,
    TransportStreams,
};
use crate::error::{ClientError, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// A communicator that records outbound frames and lets the test push
/// inbound ones.
#[derive(Debug, Default)]
pub struct FakeCommunicator {
    name: String,
    running: AtomicBool,
    fail_sends: AtomicBool,
    sent: Mutex<Vec<String>>,
    streams: TransportStreams,
}

impl FakeCommunicator {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Convenience for registering with a relay client.
    pub fn shared(name: impl Into<String>) -> Arc<Self> {
        Arc::new(Self::new(name))
    }

    /// Deliver an inbound frame to every observer.
    pub fn push_frame(&self, text: impl Into<String>) {
        self.streams.message_received.publish(&text.into());
    }

    /// Frames passed to `send`, oldest first.
    pub fn sent_messages(&self) -> Vec<String> {
        self.sent.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn clear_sent(&self) {
        self.sent.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }

    /// Make subsequent sends fail with a transport error.
    pub fn set_fail_sends(&self, fail: bool) {
        self.fail_sends.store(fail, Ordering::SeqCst);
    }

    /// Simulate a dropped connection followed by a reconnect.
    pub fn simulate_reconnect(&self) {
        self.streams.disconnection_happened.publish(&DisconnectionInfo {
            kind: DisconnectionType::Lost,
        });
        self.streams.reconnection_happened.publish(&ReconnectionInfo {
            kind: ReconnectionType::Lost,
        });
    }
}

impl Communicator for FakeCommunicator {
    fn name(&self) -> &str {
        &self.name
    }

    fn start(&self) -> Result<()> {
        if !self.running.swap(true, Ordering::SeqCst) {
            self.streams.reconnection_happened.publish(&ReconnectionInfo {
                kind: ReconnectionType::Initial,
            });
        }
        Ok(())
    }

    fn stop(&self) -> Result<()> {
        if self.running.swap(false, Ordering::SeqCst) {
            self.streams.disconnection_happened.publish(&DisconnectionInfo {
                kind: DisconnectionType::ByUser,
            });
        }
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    fn send(&self, text: &str) -> Result<()> {
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(ClientError::Transport(format!("{} refused the frame", self.name)));
        }
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(text.to_string());
        Ok(())
    }

    fn streams(&self) -> &TransportStreams {
        &self.streams
    }
}
