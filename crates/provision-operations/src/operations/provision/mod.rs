mod context;
mod operation;
mod saga_data;
mod saga_steps;

pub use context::ProvisionContext;
pub use operation::{ProvisionSaga, ProvisionSagaBuilder, provision_user};
pub use saga_data::{ProvisionReceipt, ProvisionedContainer, UploadedObject};
pub use saga_steps::{
    CreateContainerStep, CreateRecordStep, PublishNotificationStep, UploadObjectStep,
};
