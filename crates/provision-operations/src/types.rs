use serde::{Deserialize, Serialize};

/// Details of the user to provision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserData {
    pub name: String,
    pub email: String,
}

impl UserData {
    #[must_use]
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }
}

/// A user record held by the record store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub user_id: String,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Container {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub object_id: String,
}

/// Acknowledgement returned by release and publish calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Released {
    pub message: String,
}

impl Released {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Body uploaded to the user's container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectPayload {
    pub user_id: String,
    pub data: UserData,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub user_id: String,
    pub object_id: String,
}

/// Name of the container provisioned for `user_id`.
#[must_use]
pub fn container_name(user_id: &str) -> String {
    format!("user-{user_id}-bucket")
}
