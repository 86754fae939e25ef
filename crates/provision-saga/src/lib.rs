//! Resource-safe sagas for multi-step operations.
//!
//! Each step acquires a resource and binds the action that releases it.
//! The output of a step is the input of the next one. When a step fails,
//! the releases of every earlier step are handed back in reverse order
//! inside a [`StageError`] tagged with the failing stage, to be run
//! immediately or later depending on the [`CompensationPolicy`].
//!
//! Results are plain [`Result`] values. [`Tagged`] gives failures a
//! discriminant and [`TagMatch`] dispatches on it.

mod acquire;
mod audit;
mod builder;
mod erased;
mod error;
mod observer;
mod policy;
mod saga;
mod step;
mod tag;

pub use acquire::{
    AcquireReleaseError, Acquired, DEFECT_TAG, Defect, LocalBoxFuture, Release, acquire_release,
};
pub use audit::{SagaAuditLog, StepRecord, StepStatus};
pub use builder::{Empty, HasSteps, SagaBuilder};
pub use error::{
    Compensation, CompensationError, CompensationOutcome, Compensations, RollbackReport,
    StageError,
};
pub use observer::{NoOpObserver, SagaEvent, SagaObserver, TracingObserver};
pub use policy::{CompensationPolicy, UnknownPolicy};
pub use saga::Saga;
pub use step::SagaStep;
pub use tag::{SUCCESS_TAG, TagMatch, Tagged, UnhandledTag, result_tag};
