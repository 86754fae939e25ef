use std::future::Future;

use crate::Result;
use crate::types::{Container, ObjectPayload, Released, StoredObject};

/// Object storage organised in named containers.
pub trait ObjectStore {
    /// # Errors
    ///
    /// Returns an error if the container cannot be created.
    fn create_container(&self, name: &str) -> impl Future<Output = Result<Container>>;

    /// # Errors
    ///
    /// Returns an error if the container does not exist or cannot be deleted.
    fn delete_container(&self, name: &str) -> impl Future<Output = Result<Released>>;

    /// # Errors
    ///
    /// Returns an error if the container is missing or the upload is rejected.
    fn upload_object(
        &self,
        container: &str,
        payload: &ObjectPayload,
    ) -> impl Future<Output = Result<StoredObject>>;

    /// # Errors
    ///
    /// Returns an error if the object does not exist or cannot be deleted.
    fn delete_object(
        &self,
        container: &str,
        object_id: &str,
    ) -> impl Future<Output = Result<Released>>;
}
