use crate::types::{Container, StoredObject, UserRecord};

/// Resources held after the container stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionedContainer {
    pub record: UserRecord,
    pub container: Container,
}

/// Resources held after the upload stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedObject {
    pub record: UserRecord,
    pub container: Container,
    pub object: StoredObject,
}

/// Everything a successful provisioning run created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionReceipt {
    pub user_id: String,
    pub container: String,
    pub object_id: String,
    pub message: String,
}
