use std::cell::RefCell;
use std::fmt;
use std::time::Instant;

use crate::observer::{SagaEvent, SagaObserver};

/// Where a step ended up in a saga run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum StepStatus {
    /// Running, or holding its acquired resource.
    Executed,
    /// Acquisition failed; nothing to release.
    Failed,
    /// The resource was released.
    Compensated,
    /// Releasing the resource failed or panicked.
    CompensationFailed,
}

impl StepStatus {
    const fn marker(self) -> &'static str {
        match self {
            Self::Executed => "✓",
            Self::Failed => "✗",
            Self::Compensated => "↩",
            Self::CompensationFailed => "⚠",
        }
    }
}

/// One step of an audited saga run.
#[derive(Debug, Clone)]
pub struct StepRecord {
    pub name: &'static str,
    /// Position of the step in the saga.
    pub index: usize,
    pub status: StepStatus,
    pub started_at: Instant,
    /// Set when acquisition finishes, then again when the release runs.
    pub completed_at: Option<Instant>,
    /// How the step's resource is released, once it was acquired.
    pub compensation_description: Option<String>,
    /// Tag of the failure reason, for the step that stopped the saga.
    pub failure_tag: Option<&'static str>,
}

impl fmt::Display for StepRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.status.marker(), self.name)?;
        if let Some(tag) = self.failure_tag {
            write!(f, " [{tag}]")?;
        }
        Ok(())
    }
}

/// Records every step of a saga run, including compensations that the
/// caller runs later through a deferred rollback.
///
/// Attach it with [`SagaBuilder::observer`](crate::SagaBuilder::observer) or
/// let [`Saga::execute_with_audit`](crate::Saga::execute_with_audit) create
/// one per run.
#[derive(Debug, Default)]
pub struct SagaAuditLog {
    records: RefCell<Vec<StepRecord>>,
}

impl SagaAuditLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn update(&self, index: usize, apply: impl FnOnce(&mut StepRecord)) {
        let mut records = self.records.borrow_mut();
        if let Some(record) = records.iter_mut().rev().find(|r| r.index == index) {
            apply(record);
        }
    }

    fn release(&self, step: &str, status: StepStatus) {
        let mut records = self.records.borrow_mut();
        let held = records
            .iter_mut()
            .rev()
            .find(|r| r.name == step && r.status == StepStatus::Executed);
        if let Some(record) = held {
            record.status = status;
            record.completed_at = Some(Instant::now());
        }
    }

    /// Snapshot of the records, in start order.
    #[must_use]
    pub fn records(&self) -> Vec<StepRecord> {
        self.records.borrow().clone()
    }

    /// Status of the latest record for `step`.
    #[must_use]
    pub fn status_of(&self, step: &str) -> Option<StepStatus> {
        self.records
            .borrow()
            .iter()
            .rev()
            .find(|r| r.name == step)
            .map(|r| r.status)
    }

    /// One line per step, e.g. `↩ create_record` or `✗ upload_object [UploadRejected]`.
    #[must_use]
    pub fn summary(&self) -> String {
        self.records
            .borrow()
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl SagaObserver for SagaAuditLog {
    fn on_event(&self, event: &SagaEvent<'_>) {
        match *event {
            SagaEvent::StepStarted { step, index } => {
                self.records.borrow_mut().push(StepRecord {
                    name: step,
                    index,
                    status: StepStatus::Executed,
                    started_at: Instant::now(),
                    completed_at: None,
                    compensation_description: None,
                    failure_tag: None,
                });
            }
            SagaEvent::StepSucceeded {
                index,
                compensation_description,
                ..
            } => self.update(index, |record| {
                record.completed_at = Some(Instant::now());
                record.compensation_description = Some(compensation_description.to_string());
            }),
            SagaEvent::StepFailed { index, tag, .. } => self.update(index, |record| {
                record.status = StepStatus::Failed;
                record.completed_at = Some(Instant::now());
                record.failure_tag = Some(tag);
            }),
            SagaEvent::Compensated { step } => self.release(step, StepStatus::Compensated),
            SagaEvent::CompensationFailed { step, .. } => {
                self.release(step, StepStatus::CompensationFailed);
            }
            SagaEvent::CompensationStarted { .. }
            | SagaEvent::SagaCompleted { .. }
            | SagaEvent::SagaFailed { .. } => {}
        }
    }
}
