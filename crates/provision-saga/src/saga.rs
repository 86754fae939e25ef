use std::any::Any;
use std::fmt::Debug;
use std::marker::PhantomData;
use std::rc::Rc;

use crate::audit::SagaAuditLog;
use crate::erased::ErasedStep;
use crate::error::{Compensations, StageError};
use crate::observer::{Observers, SagaEvent, SagaObserver};
use crate::policy::CompensationPolicy;
use crate::tag::Tagged;

/// A compiled saga ready for execution.
///
/// Sagas execute a sequence of steps, where each step's output becomes the
/// next step's input. Every step acquires a resource; its release is kept
/// at the front of a compensation list, so a failure hands back the
/// releases of all earlier steps in reverse order (LIFO).
pub struct Saga<Input, Output, Ctx, Err, St> {
    steps: Vec<Box<dyn ErasedStep<Ctx, Err, St>>>,
    policy: CompensationPolicy,
    observers: Observers,
    _phantom: PhantomData<(Input, Output)>,
}

impl<Input, Output, Ctx, Err, St> Saga<Input, Output, Ctx, Err, St>
where
    Input: 'static,
    Output: 'static,
{
    pub(crate) fn from_parts(
        steps: Vec<Box<dyn ErasedStep<Ctx, Err, St>>>,
        policy: CompensationPolicy,
        observers: Observers,
    ) -> Self {
        Self {
            steps,
            policy,
            observers,
            _phantom: PhantomData,
        }
    }

    #[must_use]
    pub fn policy(&self) -> CompensationPolicy {
        self.policy
    }

    /// Step names in execution order.
    #[must_use]
    pub fn step_names(&self) -> Vec<&'static str> {
        self.steps.iter().map(|step| step.name()).collect()
    }
}

impl<Input, Output, Ctx, Err, St> Saga<Input, Output, Ctx, Err, St>
where
    Input: 'static,
    Output: 'static,
    Err: Tagged + Debug,
    St: Tagged + Copy,
{
    /// Execute the saga, returning the final output on success.
    ///
    /// # Errors
    ///
    /// Returns a [`StageError`] for the first step that fails. Under
    /// [`CompensationPolicy::Deferred`] it holds every earlier step's
    /// compensation, still pending; under [`CompensationPolicy::Eager`] they
    /// have already run and their outcomes are in the error's report.
    pub async fn execute<'a>(
        &self,
        ctx: &'a Ctx,
        input: Input,
    ) -> Result<Output, StageError<'a, St, Err>> {
        self.execute_internal(ctx, input, self.observers.clone())
            .await
    }

    /// Execute the saga and return both the result and an audit log.
    ///
    /// The audit log keeps tracking the run after this returns, so a
    /// deferred rollback shows up in it as well.
    pub async fn execute_with_audit<'a>(
        &self,
        ctx: &'a Ctx,
        input: Input,
    ) -> (Result<Output, StageError<'a, St, Err>>, Rc<SagaAuditLog>) {
        let audit_log = Rc::new(SagaAuditLog::new());
        let mut observers = self.observers.clone();
        observers.push(Rc::clone(&audit_log) as Rc<dyn SagaObserver>);

        let result = self.execute_internal(ctx, input, observers).await;
        (result, audit_log)
    }

    async fn execute_internal<'a>(
        &self,
        ctx: &'a Ctx,
        input: Input,
        observers: Observers,
    ) -> Result<Output, StageError<'a, St, Err>> {
        let mut pending = Compensations::new();
        let mut current_input: Box<dyn Any> = Box::new(input);
        let last = self.steps.len() - 1;

        for (index, step) in self.steps.iter().enumerate() {
            let name = step.name();
            observers.emit(&SagaEvent::StepStarted { step: name, index });

            match step.acquire_erased(ctx, current_input).await {
                Ok(acquired) => {
                    observers.emit(&SagaEvent::StepSucceeded {
                        step: name,
                        index,
                        compensation_description: acquired.compensation.description(),
                    });
                    pending.push_front(acquired.compensation);

                    if index == last {
                        observers.emit(&SagaEvent::SagaCompleted {
                            steps: self.steps.len(),
                        });
                        let typed_output = acquired
                            .resource
                            .downcast::<Output>()
                            .expect("type-state builder guarantees final output type");
                        return Ok(*typed_output);
                    }

                    current_input = acquired.resource;
                }
                Err(reason) => {
                    let stage = step.stage();
                    observers.emit(&SagaEvent::StepFailed {
                        step: name,
                        index,
                        tag: reason.tag(),
                        reason: &reason,
                    });
                    observers.emit(&SagaEvent::SagaFailed {
                        step: name,
                        tag: stage.tag(),
                        pending_compensations: pending.len(),
                    });

                    let mut error = StageError::new(stage, name, reason, pending, observers);
                    if self.policy == CompensationPolicy::Eager {
                        error.rollback().await;
                    }
                    return Err(error);
                }
            }
        }

        unreachable!("saga must have at least one step")
    }
}
