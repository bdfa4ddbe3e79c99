use aws_config::timeout::TimeoutConfig;
use aws_config::BehaviorVersion;
use aws_lambda_events::event::sqs::SqsEvent;
use aws_sdk_s3::primitives::ByteStream;
use lambda_runtime::{service_fn, Error, LambdaEvent};
use queue_relay_lambda::adapters::compute::{ComputeControl, InstanceTransition};
use queue_relay_lambda::adapters::object_store::ObjectStore;
use queue_relay_lambda::config::RelayConfig;
use queue_relay_lambda::error::{ComputeControlError, StorageError};
use queue_relay_lambda::handlers::relay::{relay_with_deadline, ApiGatewayResponse};
use queue_relay_lambda::telemetry::init_tracing;
use tracing::{error, info};

struct S3ObjectStore {
    bucket: String,
    s3_client: aws_sdk_s3::Client,
}

impl ObjectStore for S3ObjectStore {
    async fn put_object(&self, key: &str, body: Vec<u8>) -> Result<(), StorageError> {
        self.s3_client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type("application/json")
            .body(ByteStream::from(body))
            .send()
            .await
            .map(|_| ())
            .map_err(|error| {
                StorageError::new(
                    key,
                    aws_sdk_s3::error::DisplayErrorContext(&error).to_string(),
                )
            })
    }
}

struct Ec2ComputeControl {
    ec2_client: aws_sdk_ec2::Client,
}

impl ComputeControl for Ec2ComputeControl {
    async fn start_instances(
        &self,
        instance_ids: &[String],
    ) -> Result<Vec<InstanceTransition>, ComputeControlError> {
        let output = self
            .ec2_client
            .start_instances()
            .set_instance_ids(Some(instance_ids.to_vec()))
            .dry_run(false)
            .send()
            .await
            .map_err(|error| {
                ComputeControlError::new(
                    instance_ids,
                    aws_sdk_ec2::error::DisplayErrorContext(&error).to_string(),
                )
            })?;

        Ok(output
            .starting_instances()
            .iter()
            .map(|change| InstanceTransition {
                instance_id: change.instance_id().unwrap_or_default().to_string(),
                previous_state: change
                    .previous_state()
                    .and_then(|state| state.name())
                    .map(|name| name.as_str().to_string()),
                current_state: change
                    .current_state()
                    .and_then(|state| state.name())
                    .map(|name| name.as_str().to_string()),
            })
            .collect())
    }
}

async fn handle_request(
    event: LambdaEvent<SqsEvent>,
    config: &RelayConfig,
    object_store: &S3ObjectStore,
    compute: &Ec2ComputeControl,
) -> Result<ApiGatewayResponse, Error> {
    let (payload, context) = event.into_parts();
    relay_with_deadline(payload, context.deadline, config, object_store, compute)
        .await
        .map_err(|error| {
            error!(request_id = %context.request_id, error = %error, "invocation failed");
            Error::from(error)
        })
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_tracing()?;

    let config = RelayConfig::from_env()?;
    let aws_config = aws_config::defaults(BehaviorVersion::latest())
        .timeout_config(
            TimeoutConfig::builder()
                .operation_timeout(config.call_timeout)
                .build(),
        )
        .load()
        .await;

    // Clients live for the whole process and are shared by every invocation.
    let object_store = S3ObjectStore {
        bucket: config.bucket.clone(),
        s3_client: aws_sdk_s3::Client::new(&aws_config),
    };
    let compute = Ec2ComputeControl {
        ec2_client: aws_sdk_ec2::Client::new(&aws_config),
    };

    info!(
        bucket = %config.bucket,
        instance_ids = ?config.instance_ids,
        max_concurrent_writes = config.max_concurrent_writes,
        call_timeout = ?config.call_timeout,
        "relay configured"
    );

    lambda_runtime::run(service_fn(|event: LambdaEvent<SqsEvent>| {
        handle_request(event, &config, &object_store, &compute)
    }))
    .await
}
