use serde::{Deserialize, Serialize};

use crate::error::{PayloadError, Result};

/// One message unit as handed over by the delivery transport.
///
/// Both fields are optional on the wire; a record missing either one is
/// rejected by [`parse_delivery_record`].
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeliveryRecord {
    pub id: Option<String>,
    pub body: Option<String>,
}

impl DeliveryRecord {
    pub fn new(id: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            body: Some(body.into()),
        }
    }
}

/// JSON document carried in a delivery record body.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct MessagePayload {
    #[serde(rename = "Subject")]
    pub subject: String,
    #[serde(rename = "Message")]
    pub message: String,
}

/// Normalized record persisted per message and echoed in the response.
///
/// Field order is part of the stored object format.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InboundMessage {
    pub id: String,
    pub subject: String,
    pub message: String,
}

/// Decoded form of the response body. Encoding goes through
/// [`response_body_json`], which borrows the records instead.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct RelayResponseBody {
    pub messages: Vec<InboundMessage>,
}

/// Outcome of parsing a whole batch. `messages` keeps input order.
#[derive(Debug, Default)]
pub struct ParsedBatch {
    pub messages: Vec<InboundMessage>,
    pub rejected: Vec<PayloadError>,
}

pub fn parse_delivery_record(record: &DeliveryRecord) -> Result<InboundMessage> {
    let id = match record.id.as_deref().map(str::trim) {
        Some(id) if !id.is_empty() => id.to_string(),
        _ => return Err(PayloadError::MissingMessageId),
    };

    let Some(body) = record.body.as_deref() else {
        return Err(PayloadError::MissingBody { id });
    };

    let payload: MessagePayload = match serde_json::from_str(body) {
        Ok(value) => value,
        Err(source) => return Err(PayloadError::Malformed { id, source }),
    };

    Ok(InboundMessage {
        id,
        subject: payload.subject,
        message: payload.message,
    })
}

pub fn parse_batch(records: &[DeliveryRecord]) -> ParsedBatch {
    let mut batch = ParsedBatch {
        messages: Vec::with_capacity(records.len()),
        rejected: Vec::new(),
    };
    for record in records {
        match parse_delivery_record(record) {
            Ok(message) => batch.messages.push(message),
            Err(error) => batch.rejected.push(error),
        }
    }
    batch
}

/// Bytes written to the durable store for `message`.
pub fn stored_object_body(message: &InboundMessage) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec(message)?)
}

pub fn response_body_json(messages: &[InboundMessage]) -> Result<String> {
    #[derive(Serialize)]
    struct Body<'a> {
        messages: &'a [InboundMessage],
    }

    Ok(serde_json::to_string(&Body { messages })?)
}
