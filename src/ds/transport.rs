//! Outbound dispatch interface for legacy group traffic.
use async_trait::async_trait;

use crate::ds::DeliveryServiceError;
use crate::identity::PubKey;
use crate::message::ControlMessage;

/// Storage namespace a message is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Namespace {
    /// One-to-one traffic, including group invitations.
    Default,
    /// Group-addressed traffic of legacy closed groups.
    LegacyClosedGroup,
}

impl Namespace {
    /// Numeric tag understood by the swarm layer.
    pub fn as_i16(&self) -> i16 {
        match self {
            Namespace::Default => 0,
            Namespace::LegacyClosedGroup => -10,
        }
    }
}

/// Sends control messages to the network.
///
/// A returned future resolves once the transport has confirmed the send;
/// `Ok` carries the transport message id. Follow-up work that must only run
/// after delivery is sequenced on that resolution.
#[async_trait]
pub trait MessageDispatcher: Send + Sync {
    /// Send a message addressed to the group's own public key.
    async fn send_to_group(
        &self,
        group_id: &PubKey,
        message: ControlMessage,
        namespace: Namespace,
    ) -> Result<String, DeliveryServiceError>;

    /// Send a message to a single member.
    async fn send_to_member(
        &self,
        member: &PubKey,
        message: ControlMessage,
        namespace: Namespace,
    ) -> Result<String, DeliveryServiceError>;
}
