use std::fmt::Debug;
use std::rc::Rc;

/// Progress of a saga, reported to [`SagaObserver`]s.
#[derive(Debug, Clone, Copy)]
#[non_exhaustive]
pub enum SagaEvent<'e> {
    /// A step is about to acquire its resource.
    StepStarted { step: &'static str, index: usize },
    /// A step acquired its resource; its release is now pending.
    StepSucceeded {
        step: &'static str,
        index: usize,
        compensation_description: &'e str,
    },
    /// A step failed, either with a modeled error or a defect.
    StepFailed {
        step: &'static str,
        index: usize,
        tag: &'static str,
        reason: &'e dyn Debug,
    },
    /// A pending compensation is about to run.
    CompensationStarted {
        step: &'static str,
        description: &'e str,
    },
    /// A compensation finished successfully.
    Compensated { step: &'static str },
    /// A compensation failed or panicked.
    CompensationFailed {
        step: &'static str,
        error: &'e dyn Debug,
    },
    /// Every step succeeded.
    SagaCompleted { steps: usize },
    /// The saga stopped at `step` with compensations still to run.
    SagaFailed {
        step: &'static str,
        tag: &'static str,
        pending_compensations: usize,
    },
}

/// Hook for external observability.
///
/// The saga engine performs no logging of its own; it reports every
/// transition here instead.
pub trait SagaObserver {
    fn on_event(&self, event: &SagaEvent<'_>);
}

impl<F> SagaObserver for F
where
    F: Fn(&SagaEvent<'_>),
{
    fn on_event(&self, event: &SagaEvent<'_>) {
        self(event);
    }
}

/// No-op observer
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpObserver;

impl SagaObserver for NoOpObserver {
    fn on_event(&self, _event: &SagaEvent<'_>) {}
}

/// Tracing-based observer
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl SagaObserver for TracingObserver {
    fn on_event(&self, event: &SagaEvent<'_>) {
        match *event {
            SagaEvent::StepStarted { step, index } => {
                tracing::info!(step = %step, index, "Step started");
            }
            SagaEvent::StepSucceeded {
                step,
                index,
                compensation_description,
            } => {
                tracing::info!(
                    step = %step,
                    index,
                    compensation = %compensation_description,
                    "Step completed"
                );
            }
            SagaEvent::StepFailed {
                step,
                index,
                tag,
                reason,
            } => {
                tracing::warn!(step = %step, index, tag = %tag, reason = ?reason, "Step failed");
            }
            SagaEvent::CompensationStarted { step, description } => {
                tracing::info!(step = %step, description = %description, "Compensation started");
            }
            SagaEvent::Compensated { step } => {
                tracing::info!(step = %step, "Compensation completed");
            }
            SagaEvent::CompensationFailed { step, error } => {
                tracing::error!(step = %step, error = ?error, "Compensation failed");
            }
            SagaEvent::SagaCompleted { steps } => {
                tracing::info!(steps, "Saga completed");
            }
            SagaEvent::SagaFailed {
                step,
                tag,
                pending_compensations,
            } => {
                tracing::error!(
                    step = %step,
                    tag = %tag,
                    pending_compensations,
                    "Saga failed"
                );
            }
        }
    }
}

/// The observers attached to one saga.
#[derive(Clone, Default)]
pub(crate) struct Observers(Vec<Rc<dyn SagaObserver>>);

impl Observers {
    pub(crate) fn push(&mut self, observer: Rc<dyn SagaObserver>) {
        self.0.push(observer);
    }

    pub(crate) fn emit(&self, event: &SagaEvent<'_>) {
        for observer in &self.0 {
            observer.on_event(event);
        }
    }
}

impl std::fmt::Debug for Observers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Observers")
            .field("count", &self.0.len())
            .finish()
    }
}
