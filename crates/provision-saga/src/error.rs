use std::collections::VecDeque;
use std::fmt::{self, Debug, Display};

use crate::acquire::{AcquireReleaseError, Release, catch_defect};
use crate::observer::{Observers, SagaEvent};
use crate::tag::Tagged;

/// Error from a failed compensation operation.
#[derive(Debug, thiserror::Error)]
#[error("compensation failed for step '{step}': {description}")]
pub struct CompensationError<E> {
    /// Name of the step whose compensation failed.
    pub step: String,
    /// Description of what the compensation was trying to do.
    pub description: String,
    /// The underlying error.
    #[source]
    pub error: AcquireReleaseError<E>,
}

/// A pending release action for one acquired resource.
pub struct Compensation<'a, E> {
    step: &'static str,
    description: String,
    release: Release<'a, (), E>,
}

impl<'a, E> Compensation<'a, E> {
    pub(crate) fn new(step: &'static str, description: String, release: Release<'a, (), E>) -> Self {
        Self {
            step,
            description,
            release,
        }
    }

    /// Name of the step that acquired the resource.
    #[must_use]
    pub fn step(&self) -> &'static str {
        self.step
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    pub(crate) async fn run(self) -> Result<(), AcquireReleaseError<E>> {
        catch_defect(self.release)
            .await?
            .map_err(AcquireReleaseError::Failed)
    }
}

impl<E> Debug for Compensation<'_, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Compensation")
            .field("step", &self.step)
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

/// Pending compensations, most recently acquired first.
pub struct Compensations<'a, E>(VecDeque<Compensation<'a, E>>);

impl<'a, E> Compensations<'a, E> {
    pub(crate) fn new() -> Self {
        Self(VecDeque::new())
    }

    pub(crate) fn push_front(&mut self, compensation: Compensation<'a, E>) {
        self.0.push_front(compensation);
    }

    fn pop_front(&mut self) -> Option<Compensation<'a, E>> {
        self.0.pop_front()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate in the order rollback will run them.
    pub fn iter(&self) -> impl Iterator<Item = &Compensation<'a, E>> {
        self.0.iter()
    }

    /// Step names in the order rollback will run them.
    #[must_use]
    pub fn steps(&self) -> Vec<&'static str> {
        self.0.iter().map(Compensation::step).collect()
    }
}

impl<E> Debug for Compensations<'_, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.0.iter()).finish()
    }
}

/// Outcome of one compensation run during rollback.
#[derive(Debug)]
pub struct CompensationOutcome<E> {
    pub step: &'static str,
    pub description: String,
    pub result: Result<(), AcquireReleaseError<E>>,
}

/// Outcomes of every compensation that has run, in execution order.
#[derive(Debug)]
pub struct RollbackReport<E> {
    outcomes: Vec<CompensationOutcome<E>>,
}

impl<E> RollbackReport<E> {
    fn new() -> Self {
        Self {
            outcomes: Vec::new(),
        }
    }

    #[must_use]
    pub fn outcomes(&self) -> &[CompensationOutcome<E>] {
        &self.outcomes
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// True when no compensation failed or panicked.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.outcomes.iter().all(|outcome| outcome.result.is_ok())
    }

    pub fn failures(&self) -> impl Iterator<Item = &CompensationOutcome<E>> {
        self.outcomes.iter().filter(|outcome| outcome.result.is_err())
    }

    /// Consume the report, keeping only the failed compensations.
    #[must_use]
    pub fn into_errors(self) -> Vec<CompensationError<E>> {
        self.outcomes
            .into_iter()
            .filter_map(|outcome| match outcome.result {
                Ok(()) => None,
                Err(error) => Some(CompensationError {
                    step: outcome.step.to_string(),
                    description: outcome.description,
                    error,
                }),
            })
            .collect()
    }
}

/// A saga stopped at a step.
///
/// Carries the stage discriminant of the failing step, the root cause and
/// the compensations for every step that acquired its resource before it.
/// Depending on the saga's [`CompensationPolicy`](crate::CompensationPolicy),
/// those compensations are either still pending or already recorded in
/// [`report`](StageError::report).
pub struct StageError<'a, St, E> {
    stage: St,
    step: &'static str,
    reason: AcquireReleaseError<E>,
    pending: Compensations<'a, E>,
    report: RollbackReport<E>,
    observers: Observers,
}

impl<'a, St: Copy, E: Debug> StageError<'a, St, E> {
    pub(crate) fn new(
        stage: St,
        step: &'static str,
        reason: AcquireReleaseError<E>,
        pending: Compensations<'a, E>,
        observers: Observers,
    ) -> Self {
        Self {
            stage,
            step,
            reason,
            pending,
            report: RollbackReport::new(),
            observers,
        }
    }

    #[must_use]
    pub fn stage(&self) -> St {
        self.stage
    }

    /// Name of the step that failed.
    #[must_use]
    pub fn step(&self) -> &'static str {
        self.step
    }

    /// The root cause.
    #[must_use]
    pub fn reason(&self) -> &AcquireReleaseError<E> {
        &self.reason
    }

    /// Compensations not yet run, in the order rollback will run them.
    #[must_use]
    pub fn pending(&self) -> &Compensations<'a, E> {
        &self.pending
    }

    /// Compensations already run.
    #[must_use]
    pub fn report(&self) -> &RollbackReport<E> {
        &self.report
    }

    #[must_use]
    pub fn is_rolled_back(&self) -> bool {
        self.pending.is_empty()
    }

    #[must_use]
    pub fn into_reason(self) -> AcquireReleaseError<E> {
        self.reason
    }

    /// Consume the error, keeping the outcomes of the compensations run so
    /// far. Compensations still pending are dropped without running.
    #[must_use]
    pub fn into_report(self) -> RollbackReport<E> {
        self.report
    }

    /// Run every pending compensation, one at a time, in list order.
    ///
    /// A failing or panicking compensation does not stop the ones after it.
    /// Compensations run at most once: calling this again only returns the
    /// report.
    pub async fn rollback(&mut self) -> &RollbackReport<E> {
        while let Some(compensation) = self.pending.pop_front() {
            let step = compensation.step();
            let description = compensation.description().to_string();
            self.observers.emit(&SagaEvent::CompensationStarted {
                step,
                description: &description,
            });

            let result = compensation.run().await;
            match &result {
                Ok(()) => self.observers.emit(&SagaEvent::Compensated { step }),
                Err(error) => self
                    .observers
                    .emit(&SagaEvent::CompensationFailed { step, error }),
            }

            self.report.outcomes.push(CompensationOutcome {
                step,
                description,
                result,
            });
        }
        &self.report
    }
}

impl<St: Tagged, E> Tagged for StageError<'_, St, E> {
    fn tag(&self) -> &'static str {
        self.stage.tag()
    }
}

impl<St: Debug, E: Debug> Debug for StageError<'_, St, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StageError")
            .field("stage", &self.stage)
            .field("step", &self.step)
            .field("reason", &self.reason)
            .field("pending", &self.pending)
            .field("report", &self.report)
            .finish_non_exhaustive()
    }
}

impl<St: Tagged, E> Display for StageError<'_, St, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: step '{}' failed", self.stage.tag(), self.step)
    }
}

impl<St, E> std::error::Error for StageError<'_, St, E>
where
    St: Tagged + Debug,
    E: std::error::Error + 'static,
{
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.reason)
    }
}
