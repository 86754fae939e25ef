use std::marker::PhantomData;
use std::rc::Rc;

use crate::erased::{ErasedStep, StepWrapper};
use crate::observer::{Observers, SagaObserver};
use crate::policy::CompensationPolicy;
use crate::saga::Saga;
use crate::step::SagaStep;

/// Marker type for a builder with no steps.
pub struct Empty;

/// Marker type for a builder with at least one step.
pub struct HasSteps<LastOutput>(PhantomData<LastOutput>);

/// Type-state builder for sagas.
///
/// Each step's input must be the previous step's output, so a resource
/// acquired by one step is exactly what the next step receives. The saga's
/// input and output types follow from its first and last steps.
///
/// A step that expects a different resource than the one before it
/// produced is rejected at compile time:
///
/// ```compile_fail
/// use provision_saga::{SagaBuilder, SagaStep};
///
/// struct OpenAccount;
/// impl SagaStep for OpenAccount {
///     type Input = String;
///     type Output = u64; // account number
///     type Context = ();
///     type Error = ();
///     type Stage = ();
///     fn name(&self) -> &'static str { "open_account" }
///     fn stage(&self) {}
///     async fn execute(&self, _: &(), _owner: String) -> Result<u64, ()> {
///         Ok(1)
///     }
/// }
///
/// struct IssueCard;
/// impl SagaStep for IssueCard {
///     type Input = String; // wants an owner, not an account number
///     type Output = String;
///     type Context = ();
///     type Error = ();
///     type Stage = ();
///     fn name(&self) -> &'static str { "issue_card" }
///     fn stage(&self) {}
///     async fn execute(&self, _: &(), owner: String) -> Result<String, ()> {
///         Ok(owner)
///     }
/// }
///
/// let saga = SagaBuilder::new()
///     .first_step(OpenAccount)
///     .then(IssueCard)
///     .build();
/// ```
///
/// A saga without steps has no `build`:
///
/// ```compile_fail
/// use provision_saga::SagaBuilder;
///
/// let saga = SagaBuilder::<(), (), (), (), (), _>::new().build();
/// ```
pub struct SagaBuilder<Input, Output, Ctx, Err, St, State> {
    steps: Vec<Box<dyn ErasedStep<Ctx, Err, St>>>,
    policy: CompensationPolicy,
    observers: Observers,
    _phantom: PhantomData<(Input, Output, State)>,
}

impl<Ctx, Err, St> SagaBuilder<(), (), Ctx, Err, St, Empty> {
    /// Create a new saga builder in the empty state.
    #[must_use]
    pub fn new() -> Self {
        Self {
            steps: Vec::new(),
            policy: CompensationPolicy::default(),
            observers: Observers::default(),
            _phantom: PhantomData,
        }
    }

    /// Add the first step to the saga.
    ///
    /// This establishes the saga's input type from the step's input type.
    #[must_use]
    pub fn first_step<S>(
        self,
        step: S,
    ) -> SagaBuilder<S::Input, S::Output, Ctx, Err, St, HasSteps<S::Output>>
    where
        S: SagaStep<Context = Ctx, Error = Err, Stage = St> + 'static,
    {
        let mut steps = self.steps;
        steps.push(Box::new(StepWrapper::new(step)));
        SagaBuilder {
            steps,
            policy: self.policy,
            observers: self.observers,
            _phantom: PhantomData,
        }
    }
}

impl<Ctx, Err, St> Default for SagaBuilder<(), (), Ctx, Err, St, Empty> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Input, Output, Ctx, Err, St, State> SagaBuilder<Input, Output, Ctx, Err, St, State> {
    /// Choose when compensations run after a failure.
    #[must_use]
    pub fn compensation_policy(mut self, policy: CompensationPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Attach an observer. Observers are notified in attachment order.
    #[must_use]
    pub fn observer(mut self, observer: Rc<dyn SagaObserver>) -> Self {
        self.observers.push(observer);
        self
    }
}

impl<Input, CurrentOutput, Ctx, Err, St>
    SagaBuilder<Input, CurrentOutput, Ctx, Err, St, HasSteps<CurrentOutput>>
{
    /// Add another step to the saga.
    ///
    /// The step's input type must match the current output type.
    #[must_use]
    pub fn then<S>(
        self,
        step: S,
    ) -> SagaBuilder<Input, S::Output, Ctx, Err, St, HasSteps<S::Output>>
    where
        S: SagaStep<Input = CurrentOutput, Context = Ctx, Error = Err, Stage = St> + 'static,
    {
        let mut steps = self.steps;
        steps.push(Box::new(StepWrapper::new(step)));
        SagaBuilder {
            steps,
            policy: self.policy,
            observers: self.observers,
            _phantom: PhantomData,
        }
    }

    /// Build the saga from the accumulated steps.
    #[must_use]
    pub fn build(self) -> Saga<Input, CurrentOutput, Ctx, Err, St>
    where
        Input: 'static,
        CurrentOutput: 'static,
    {
        Saga::from_parts(self.steps, self.policy, self.observers)
    }
}
