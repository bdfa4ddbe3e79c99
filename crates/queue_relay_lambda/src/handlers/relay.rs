use std::time::SystemTime;

use aws_lambda_events::event::sqs::{SqsEvent, SqsMessage};
use futures::stream::{self, StreamExt};
use queue_relay_core::contract::{
    parse_batch, response_body_json, stored_object_body, DeliveryRecord, InboundMessage,
};
use queue_relay_core::storage_keys::message_object_key;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, error, info, warn};

use crate::adapters::compute::ComputeControl;
use crate::adapters::object_store::ObjectStore;
use crate::config::RelayConfig;
use crate::deadline::remaining_until;
use crate::error::RelayError;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiGatewayResponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub headers: Value,
    pub body: String,
}

/// Per-invocation tally, logged once the batch has been handled.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub received: usize,
    pub rejected: usize,
    pub stored: usize,
    pub storage_failures: usize,
    pub compute_started: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RelayOutcome {
    pub response: ApiGatewayResponse,
    pub report: BatchReport,
}

/// Entry point for a queue batch delivered by the Lambda runtime.
pub async fn handle_queue_event(
    event: SqsEvent,
    config: &RelayConfig,
    object_store: &impl ObjectStore,
    compute: &impl ComputeControl,
) -> ApiGatewayResponse {
    let records: Vec<DeliveryRecord> = event.records.into_iter().map(delivery_record).collect();
    relay_batch(&records, config, object_store, compute)
        .await
        .response
}

/// Runs [`handle_queue_event`] inside the runtime deadline (epoch ms, `0` for
/// none). Overrunning fails the invocation so the batch is redelivered.
pub async fn relay_with_deadline(
    event: SqsEvent,
    deadline_epoch_ms: u64,
    config: &RelayConfig,
    object_store: &impl ObjectStore,
    compute: &impl ComputeControl,
) -> Result<ApiGatewayResponse, RelayError> {
    let relay = handle_queue_event(event, config, object_store, compute);
    let Some(budget) = remaining_until(deadline_epoch_ms, SystemTime::now()) else {
        return Ok(relay.await);
    };
    tokio::time::timeout(budget, relay)
        .await
        .map_err(|_| RelayError::DeadlineExceeded { budget })
}

pub fn delivery_record(message: SqsMessage) -> DeliveryRecord {
    DeliveryRecord {
        id: message.message_id,
        body: message.body,
    }
}

/// Persists every parsable record, then starts the configured instances once.
///
/// Malformed records are logged and left out of the response. Storage and
/// compute failures are logged and never change the 200 status.
pub async fn relay_batch(
    records: &[DeliveryRecord],
    config: &RelayConfig,
    object_store: &impl ObjectStore,
    compute: &impl ComputeControl,
) -> RelayOutcome {
    let batch = parse_batch(records);
    for rejection in &batch.rejected {
        warn!(
            error.kind = "malformed_payload",
            message_id = rejection.message_id(),
            error = %rejection,
            "payload rejected"
        );
    }

    let write_results: Vec<bool> = stream::iter(&batch.messages)
        .map(|message| persist_message(message, &config.bucket, object_store))
        .buffered(config.max_concurrent_writes)
        .collect()
        .await;
    let stored = write_results.iter().filter(|stored| **stored).count();

    let compute_started = start_instances(&config.instance_ids, compute).await;

    let report = BatchReport {
        received: records.len(),
        rejected: batch.rejected.len(),
        stored,
        storage_failures: write_results.len() - stored,
        compute_started,
    };

    let response = match response_body_json(&batch.messages) {
        Ok(body) => {
            info!(messages = %body, "relayed messages");
            success_response(body)
        }
        // Records hold only strings, so serialization cannot fail here.
        Err(error) => error_response(
            500,
            json!({
                "error": "serialization_error",
                "message": error.to_string(),
            }),
        ),
    };

    info!(
        received = report.received,
        rejected = report.rejected,
        stored = report.stored,
        storage_failures = report.storage_failures,
        compute_started = report.compute_started,
        "batch relayed"
    );

    RelayOutcome { response, report }
}

async fn persist_message(
    message: &InboundMessage,
    bucket: &str,
    object_store: &impl ObjectStore,
) -> bool {
    debug!(record = ?message, "message received");

    let key = message_object_key(&message.id);
    let body = match stored_object_body(message) {
        Ok(value) => value,
        Err(error) => {
            error!(error.kind = "storage", key = %key, error = %error, "object write failed");
            return false;
        }
    };

    info!(key = %key, bucket = %bucket, "writing object");
    match object_store.put_object(&key, body).await {
        Ok(()) => true,
        Err(error) => {
            error!(
                error.kind = "storage",
                key = %error.key,
                bucket = %bucket,
                error = %error,
                "object write failed"
            );
            false
        }
    }
}

async fn start_instances(instance_ids: &[String], compute: &impl ComputeControl) -> bool {
    if instance_ids.is_empty() {
        error!(
            error.kind = "compute_control",
            "no instances configured, skipping start request"
        );
        return false;
    }

    info!(instance_ids = ?instance_ids, "starting instances");
    match compute.start_instances(instance_ids).await {
        Ok(transitions) => {
            for transition in &transitions {
                info!(
                    instance_id = %transition.instance_id,
                    previous_state = transition.previous_state.as_deref(),
                    current_state = transition.current_state.as_deref(),
                    "instance state changed"
                );
            }
            true
        }
        Err(error) => {
            error!(error.kind = "compute_control", error = %error, "start instances failed");
            false
        }
    }
}

fn success_response(body: String) -> ApiGatewayResponse {
    ApiGatewayResponse {
        status_code: 200,
        headers: json!({"Content-Type": "application/json"}),
        body,
    }
}

fn error_response(status_code: u16, payload: Value) -> ApiGatewayResponse {
    ApiGatewayResponse {
        status_code,
        headers: json!({"Content-Type": "application/json"}),
        body: payload.to_string(),
    }
}
