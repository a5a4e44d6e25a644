//! Runtime configuration for the group update service.

use crate::identity::PubKey;

/// Settings shared by the orchestrator and the key rotation coordinator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServiceConfig {
    /// Our own standard account id.
    pub our_pubkey: PubKey,
    /// Offset between local clock and network time, in milliseconds.
    pub network_offset_ms: i64,
}

impl ServiceConfig {
    pub fn new(our_pubkey: PubKey) -> Self {
        Self {
            our_pubkey,
            network_offset_ms: 0,
        }
    }

    pub fn with_network_offset(mut self, offset_ms: i64) -> Self {
        self.network_offset_ms = offset_ms;
        self
    }

    /// Local wall clock in milliseconds.
    pub fn now_ms(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }

    /// Network-corrected clock used for outgoing message timestamps.
    pub fn network_now_ms(&self) -> i64 {
        self.now_ms() + self.network_offset_ms
    }
}
