use std::rc::Rc;

use provision_saga::{
    CompensationPolicy, Empty, Saga, SagaBuilder, SagaObserver, TracingObserver,
};

use super::context::ProvisionContext;
use super::saga_data::ProvisionReceipt;
use super::saga_steps::{
    CreateContainerStep, CreateRecordStep, PublishNotificationStep, UploadObjectStep,
};
use crate::error::{ProvisionError, ProvisionFault, ProvisionStage};
use crate::traits::{Notifier, ObjectStore, RecordStore};
use crate::types::UserData;

/// The four-stage provisioning saga: record, container, upload, notification.
pub type ProvisionSaga<R, O, N> =
    Saga<UserData, ProvisionReceipt, ProvisionContext<R, O, N>, ProvisionFault, ProvisionStage>;

type EmptyBuilder<R, O, N> =
    SagaBuilder<(), (), ProvisionContext<R, O, N>, ProvisionFault, ProvisionStage, Empty>;

/// Assembles a [`ProvisionSaga`] with a policy and observers.
#[derive(Default)]
pub struct ProvisionSagaBuilder {
    policy: CompensationPolicy,
    observers: Vec<Rc<dyn SagaObserver>>,
}

impl ProvisionSagaBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn compensation_policy(mut self, policy: CompensationPolicy) -> Self {
        self.policy = policy;
        self
    }

    #[must_use]
    pub fn observer(mut self, observer: Rc<dyn SagaObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    #[must_use]
    pub fn build<R, O, N>(self) -> ProvisionSaga<R, O, N>
    where
        R: RecordStore + 'static,
        O: ObjectStore + 'static,
        N: Notifier + 'static,
    {
        let builder: EmptyBuilder<R, O, N> = self
            .observers
            .into_iter()
            .fold(SagaBuilder::new(), SagaBuilder::observer);

        builder
            .compensation_policy(self.policy)
            .first_step(CreateRecordStep::new())
            .then(CreateContainerStep::new())
            .then(UploadObjectStep::new())
            .then(PublishNotificationStep::new())
            .build()
    }
}

/// Provision `user` against the collaborators in `ctx`.
///
/// Progress is reported through [`TracingObserver`].
///
/// # Errors
///
/// Returns the [`ProvisionError`] of the first stage that fails. With
/// [`CompensationPolicy::Deferred`] the caller is responsible for calling
/// [`rollback`](provision_saga::StageError::rollback).
pub async fn provision_user<'a, R, O, N>(
    ctx: &'a ProvisionContext<R, O, N>,
    user: UserData,
    policy: CompensationPolicy,
) -> Result<ProvisionReceipt, ProvisionError<'a>>
where
    R: RecordStore + 'static,
    O: ObjectStore + 'static,
    N: Notifier + 'static,
{
    let saga = ProvisionSagaBuilder::new()
        .compensation_policy(policy)
        .observer(Rc::new(TracingObserver))
        .build();
    saga.execute(ctx, user).await
}
