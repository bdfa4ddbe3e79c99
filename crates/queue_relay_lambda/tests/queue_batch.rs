use std::collections::BTreeMap;
use std::sync::Mutex;
use std::time::Duration;

use aws_lambda_events::event::sqs::SqsEvent;
use queue_relay_core::contract::{InboundMessage, RelayResponseBody};
use queue_relay_lambda::adapters::compute::{ComputeControl, InstanceTransition};
use queue_relay_lambda::adapters::object_store::ObjectStore;
use queue_relay_lambda::config::RelayConfig;
use queue_relay_lambda::error::{ComputeControlError, StorageError};
use queue_relay_lambda::handlers::relay::handle_queue_event;
use serde_json::json;

#[derive(Default)]
struct InMemoryBucket {
    objects: Mutex<BTreeMap<String, Vec<u8>>>,
    put_count: Mutex<usize>,
}

impl ObjectStore for InMemoryBucket {
    async fn put_object(&self, key: &str, body: Vec<u8>) -> Result<(), StorageError> {
        *self.put_count.lock().expect("poisoned mutex") += 1;
        self.objects
            .lock()
            .expect("poisoned mutex")
            .insert(key.to_string(), body);
        Ok(())
    }
}

#[derive(Default)]
struct CountingCompute {
    starts: Mutex<usize>,
}

impl ComputeControl for CountingCompute {
    async fn start_instances(
        &self,
        _instance_ids: &[String],
    ) -> Result<Vec<InstanceTransition>, ComputeControlError> {
        *self.starts.lock().expect("poisoned mutex") += 1;
        Ok(Vec::new())
    }
}

fn config() -> RelayConfig {
    RelayConfig::from_vars([
        ("BUCKET_NAME", "relay-bucket"),
        ("INSTANCE_IDS", "i-0123456789abcdef0"),
    ])
    .expect("config should load")
}

fn queue_event(records: serde_json::Value) -> SqsEvent {
    serde_json::from_value(json!({ "Records": records })).expect("event should parse")
}

#[tokio::test]
async fn persists_batch_and_echoes_messages() {
    let bucket = InMemoryBucket::default();
    let compute = CountingCompute::default();
    let event = queue_event(json!([
        {
            "messageId": "m1",
            "receiptHandle": "handle-1",
            "eventSource": "aws:sqs",
            "body": "{\"Subject\":\"s\",\"Message\":\"hello\"}"
        },
        {
            "messageId": "m2",
            "receiptHandle": "handle-2",
            "eventSource": "aws:sqs",
            "body": "{\"Subject\":\"alert\",\"Message\":\"disk full\"}"
        }
    ]));

    let response = handle_queue_event(event, &config(), &bucket, &compute).await;

    assert_eq!(response.status_code, 200);
    let body: RelayResponseBody = serde_json::from_str(&response.body).expect("body decodes");
    assert_eq!(
        body.messages,
        vec![
            InboundMessage {
                id: "m1".to_string(),
                subject: "s".to_string(),
                message: "hello".to_string(),
            },
            InboundMessage {
                id: "m2".to_string(),
                subject: "alert".to_string(),
                message: "disk full".to_string(),
            },
        ]
    );

    let objects = bucket.objects.lock().expect("poisoned mutex").clone();
    assert_eq!(
        objects.get("m1.json").map(Vec::as_slice),
        Some(br#"{"id":"m1","subject":"s","message":"hello"}"#.as_slice())
    );
    assert!(objects.contains_key("m2.json"));
    assert_eq!(*compute.starts.lock().expect("poisoned mutex"), 1);
}

#[tokio::test]
async fn redelivered_batch_overwrites_with_same_content() {
    let bucket = InMemoryBucket::default();
    let compute = CountingCompute::default();
    let records = json!([
        { "messageId": "m1", "body": "{\"Subject\":\"s\",\"Message\":\"one\"}" },
        { "messageId": "m2", "body": "{\"Subject\":\"s\",\"Message\":\"two\"}" }
    ]);

    handle_queue_event(queue_event(records.clone()), &config(), &bucket, &compute).await;
    let after_first = bucket.objects.lock().expect("poisoned mutex").clone();
    handle_queue_event(queue_event(records), &config(), &bucket, &compute).await;
    let after_second = bucket.objects.lock().expect("poisoned mutex").clone();

    assert_eq!(after_first, after_second);
    assert_eq!(after_second.len(), 2);
    assert_eq!(*bucket.put_count.lock().expect("poisoned mutex"), 4);
    assert_eq!(*compute.starts.lock().expect("poisoned mutex"), 2);
}

#[tokio::test]
async fn malformed_payload_never_fails_the_invocation() {
    let bucket = InMemoryBucket::default();
    let compute = CountingCompute::default();
    let event = queue_event(json!([
        { "messageId": "bad", "body": "plain text, not json" },
        { "messageId": "partial", "body": "{\"Subject\":\"s\"}" }
    ]));

    let response = tokio::time::timeout(
        Duration::from_secs(5),
        handle_queue_event(event, &config(), &bucket, &compute),
    )
    .await
    .expect("relay should finish");

    assert_eq!(response.status_code, 200);
    assert_eq!(response.body, r#"{"messages":[]}"#);
    assert!(bucket.objects.lock().expect("poisoned mutex").is_empty());
    assert_eq!(*compute.starts.lock().expect("poisoned mutex"), 1);
}
