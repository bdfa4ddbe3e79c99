use std::future::Future;

use crate::error::StorageError;

/// Key-addressed durable store the relay writes messages into.
///
/// Implementations must be safe to share across concurrent writes within one
/// invocation; the relay issues writes for distinct keys in parallel.
pub trait ObjectStore: Sync {
    fn put_object(
        &self,
        key: &str,
        body: Vec<u8>,
    ) -> impl Future<Output = Result<(), StorageError>> + Send;
}
