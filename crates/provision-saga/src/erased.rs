use std::any::Any;
use std::rc::Rc;

use crate::acquire::{AcquireReleaseError, LocalBoxFuture, acquire_release};
use crate::error::Compensation;
use crate::step::SagaStep;

pub(crate) struct ErasedAcquired<'a, Err> {
    pub(crate) resource: Box<dyn Any>,
    pub(crate) compensation: Compensation<'a, Err>,
}

pub(crate) type ErasedResult<'a, Err> =
    Result<ErasedAcquired<'a, Err>, AcquireReleaseError<Err>>;

pub(crate) trait ErasedStep<Ctx, Err, St> {
    fn name(&self) -> &'static str;

    fn stage(&self) -> St;

    /// The returned compensation borrows only the context, so it may
    /// outlive the saga that produced it.
    fn acquire_erased<'a>(
        &self,
        ctx: &'a Ctx,
        input: Box<dyn Any>,
    ) -> LocalBoxFuture<'a, ErasedResult<'a, Err>>;
}

pub(crate) struct StepWrapper<S> {
    step: Rc<S>,
}

impl<S> StepWrapper<S> {
    pub(crate) fn new(step: S) -> Self {
        Self {
            step: Rc::new(step),
        }
    }
}

impl<S> ErasedStep<S::Context, S::Error, S::Stage> for StepWrapper<S>
where
    S: SagaStep + 'static,
{
    fn name(&self) -> &'static str {
        self.step.name()
    }

    fn stage(&self) -> S::Stage {
        self.step.stage()
    }

    fn acquire_erased<'a>(
        &self,
        ctx: &'a S::Context,
        input: Box<dyn Any>,
    ) -> LocalBoxFuture<'a, ErasedResult<'a, S::Error>> {
        let typed_input = input
            .downcast::<S::Input>()
            .expect("type-state builder guarantees correct input type");
        let step = Rc::clone(&self.step);

        Box::pin(async move {
            let releasing = Rc::clone(&step);
            let acquired = acquire_release(
                || step.execute(ctx, *typed_input),
                move |resource| async move { releasing.compensate(ctx, resource).await },
            )
            .await?;

            let (resource, release) = acquired.into_parts();
            let resource: Box<dyn Any> = Box::new(resource);
            Ok(ErasedAcquired {
                resource,
                compensation: Compensation::new(
                    step.name(),
                    step.compensation_description(),
                    release,
                ),
            })
        })
    }
}
