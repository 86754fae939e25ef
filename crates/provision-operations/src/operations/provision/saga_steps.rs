use std::marker::PhantomData;

use provision_saga::SagaStep;
use tracing::debug;

use super::context::ProvisionContext;
use super::saga_data::{ProvisionReceipt, ProvisionedContainer, UploadedObject};
use crate::error::{ProvisionFault, ProvisionStage};
use crate::traits::{Notifier, ObjectStore, RecordStore};
use crate::types::{Notification, ObjectPayload, UserData, UserRecord, container_name};

pub struct CreateRecordStep<R, O, N> {
    _marker: PhantomData<(R, O, N)>,
}

impl<R, O, N> CreateRecordStep<R, O, N> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<R, O, N> Default for CreateRecordStep<R, O, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R, O, N> SagaStep for CreateRecordStep<R, O, N>
where
    R: RecordStore,
    O: ObjectStore,
    N: Notifier,
{
    type Input = UserData;
    type Output = UserRecord;
    type Context = ProvisionContext<R, O, N>;
    type Error = ProvisionFault;
    type Stage = ProvisionStage;

    fn name(&self) -> &'static str {
        "create_record"
    }

    fn stage(&self) -> ProvisionStage {
        ProvisionStage::RecordCreate
    }

    async fn execute(
        &self,
        ctx: &Self::Context,
        input: Self::Input,
    ) -> Result<Self::Output, Self::Error> {
        let record = ctx.records().create_record(&input).await?;
        debug!(user_id = %record.user_id, email = %record.email, "created user record");
        Ok(record)
    }

    async fn compensate(
        &self,
        ctx: &Self::Context,
        record: Self::Output,
    ) -> Result<(), Self::Error> {
        debug!(user_id = %record.user_id, "rolling back user record");
        let released = ctx.records().delete_record(&record.user_id).await?;
        debug!(user_id = %record.user_id, message = %released.message, "released user record");
        Ok(())
    }

    fn compensation_description(&self) -> String {
        "delete the user record".to_string()
    }
}

pub struct CreateContainerStep<R, O, N> {
    _marker: PhantomData<(R, O, N)>,
}

impl<R, O, N> CreateContainerStep<R, O, N> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<R, O, N> Default for CreateContainerStep<R, O, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R, O, N> SagaStep for CreateContainerStep<R, O, N>
where
    R: RecordStore,
    O: ObjectStore,
    N: Notifier,
{
    type Input = UserRecord;
    type Output = ProvisionedContainer;
    type Context = ProvisionContext<R, O, N>;
    type Error = ProvisionFault;
    type Stage = ProvisionStage;

    fn name(&self) -> &'static str {
        "create_container"
    }

    fn stage(&self) -> ProvisionStage {
        ProvisionStage::Resource
    }

    async fn execute(
        &self,
        ctx: &Self::Context,
        record: Self::Input,
    ) -> Result<Self::Output, Self::Error> {
        let name = container_name(&record.user_id);
        let container = ctx.objects().create_container(&name).await?;
        debug!(container = %container.name, user_id = %record.user_id, "created container");
        Ok(ProvisionedContainer { record, container })
    }

    async fn compensate(
        &self,
        ctx: &Self::Context,
        provisioned: Self::Output,
    ) -> Result<(), Self::Error> {
        let name = &provisioned.container.name;
        debug!(container = %name, "rolling back container");
        let released = ctx.objects().delete_container(name).await?;
        debug!(container = %name, message = %released.message, "released container");
        Ok(())
    }

    fn compensation_description(&self) -> String {
        "delete the user's container".to_string()
    }
}

pub struct UploadObjectStep<R, O, N> {
    _marker: PhantomData<(R, O, N)>,
}

impl<R, O, N> UploadObjectStep<R, O, N> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<R, O, N> Default for UploadObjectStep<R, O, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R, O, N> SagaStep for UploadObjectStep<R, O, N>
where
    R: RecordStore,
    O: ObjectStore,
    N: Notifier,
{
    type Input = ProvisionedContainer;
    type Output = UploadedObject;
    type Context = ProvisionContext<R, O, N>;
    type Error = ProvisionFault;
    type Stage = ProvisionStage;

    fn name(&self) -> &'static str {
        "upload_object"
    }

    fn stage(&self) -> ProvisionStage {
        ProvisionStage::Resource
    }

    async fn execute(
        &self,
        ctx: &Self::Context,
        input: Self::Input,
    ) -> Result<Self::Output, Self::Error> {
        let ProvisionedContainer { record, container } = input;
        let payload = ObjectPayload {
            user_id: record.user_id.clone(),
            data: UserData::new(record.name.clone(), record.email.clone()),
        };
        let object = ctx
            .objects()
            .upload_object(&container.name, &payload)
            .await?;
        debug!(
            container = %container.name,
            object_id = %object.object_id,
            "uploaded user data"
        );
        Ok(UploadedObject {
            record,
            container,
            object,
        })
    }

    async fn compensate(
        &self,
        ctx: &Self::Context,
        uploaded: Self::Output,
    ) -> Result<(), Self::Error> {
        let container = &uploaded.container.name;
        let object_id = &uploaded.object.object_id;
        debug!(container = %container, object_id = %object_id, "rolling back upload");
        let released = ctx.objects().delete_object(container, object_id).await?;
        debug!(object_id = %object_id, message = %released.message, "released object");
        Ok(())
    }

    fn compensation_description(&self) -> String {
        "delete the uploaded user data".to_string()
    }
}

/// Final stage. A published notification cannot be recalled, so this step
/// has nothing to compensate.
pub struct PublishNotificationStep<R, O, N> {
    _marker: PhantomData<(R, O, N)>,
}

impl<R, O, N> PublishNotificationStep<R, O, N> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<R, O, N> Default for PublishNotificationStep<R, O, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R, O, N> SagaStep for PublishNotificationStep<R, O, N>
where
    R: RecordStore,
    O: ObjectStore,
    N: Notifier,
{
    type Input = UploadedObject;
    type Output = ProvisionReceipt;
    type Context = ProvisionContext<R, O, N>;
    type Error = ProvisionFault;
    type Stage = ProvisionStage;

    fn name(&self) -> &'static str {
        "publish_notification"
    }

    fn stage(&self) -> ProvisionStage {
        ProvisionStage::Notification
    }

    async fn execute(
        &self,
        ctx: &Self::Context,
        input: Self::Input,
    ) -> Result<Self::Output, Self::Error> {
        let notification = Notification {
            user_id: input.record.user_id.clone(),
            object_id: input.object.object_id.clone(),
        };
        let released = ctx.notifier().publish(&notification).await?;
        debug!(user_id = %notification.user_id, message = %released.message, "sent notification");
        Ok(ProvisionReceipt {
            user_id: input.record.user_id,
            container: input.container.name,
            object_id: input.object.object_id,
            message: released.message,
        })
    }

    fn compensation_description(&self) -> String {
        "nothing to undo for a sent notification".to_string()
    }
}
