use thiserror::Error;

/// Reasons a single delivery record cannot be turned into an [`InboundMessage`].
///
/// [`InboundMessage`]: crate::contract::InboundMessage
#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("delivery record has no message id")]
    MissingMessageId,

    #[error("delivery record {id} has no body")]
    MissingBody { id: String },

    #[error("malformed payload for record {id}: {source}")]
    Malformed {
        id: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("json serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl PayloadError {
    /// Message id of the offending record, when the transport supplied one.
    pub fn message_id(&self) -> Option<&str> {
        match self {
            Self::MissingBody { id } | Self::Malformed { id, .. } => Some(id),
            Self::MissingMessageId | Self::Serialization(_) => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, PayloadError>;
