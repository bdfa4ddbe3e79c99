use std::future::Future;

use crate::error::ComputeControlError;

/// State change reported for one instance by a start request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceTransition {
    pub instance_id: String,
    pub previous_state: Option<String>,
    pub current_state: Option<String>,
}

pub trait ComputeControl: Sync {
    /// Requests that every instance in `instance_ids` move to running.
    /// Never a dry run.
    fn start_instances(
        &self,
        instance_ids: &[String],
    ) -> impl Future<Output = Result<Vec<InstanceTransition>, ComputeControlError>> + Send;
}
