mod error;
pub mod operations;
pub mod providers;
pub mod traits;
mod types;

pub use error::{ProvisionError, ProvisionFault, ProvisionStage, Result};
pub use types::{
    Container, Notification, ObjectPayload, Released, StoredObject, UserData, UserRecord,
    container_name,
};
