/// Errors reported by the outbound dispatch layer.
///
/// String payloads carry the transport's own message. Callers should treat
/// them as opaque diagnostic text, not match on their content.
#[derive(Debug, thiserror::Error)]
pub enum DeliveryServiceError {
    #[error("Failed to send to group {group}: {reason}")]
    GroupSendFailed { group: String, reason: String },
    #[error("Failed to send to member {member}: {reason}")]
    MemberSendFailed { member: String, reason: String },
    #[error("Transport unavailable: {0}")]
    Unavailable(String),

    #[error("An unknown error occurred: {0}")]
    Other(anyhow::Error),
}
