use std::future::Future;

/// A step in a saga that acquires a resource and can release it again.
///
/// Each step transforms an input into an output. The output is the acquired
/// resource: it becomes the next step's input, and a copy of it is handed
/// back to [`compensate`](SagaStep::compensate) if a later step fails.
///
/// # Type Parameters
///
/// - `Input`: Data received from the previous step (or saga entry point)
/// - `Output`: The acquired resource, passed to the next step
/// - `Context`: Shared dependencies (injected, not passed between steps)
/// - `Error`: The modeled error type for step failures
/// - `Stage`: Discriminant identifying which failure class this step reports
pub trait SagaStep {
    /// Data received from the previous step or saga entry point.
    type Input: 'static;

    /// The acquired resource.
    type Output: Clone + 'static;

    /// Shared context providing dependencies.
    type Context;

    /// Error type for step failures.
    type Error;

    /// Failure class reported when this step fails.
    type Stage: Copy;

    /// Human-readable name for events and error messages.
    fn name(&self) -> &'static str;

    /// The failure class this step belongs to.
    fn stage(&self) -> Self::Stage;

    /// Acquire the step's resource.
    ///
    /// Expected failures must be returned as `Err`. A panic is treated as a
    /// defect and reported as such.
    fn execute(
        &self,
        ctx: &Self::Context,
        input: Self::Input,
    ) -> impl Future<Output = Result<Self::Output, Self::Error>>;

    /// Release a resource previously returned by `execute`.
    ///
    /// Called at most once per successful `execute`, only when a later step
    /// fails and the saga is rolled back.
    ///
    /// The default implementation is a no-op, suitable for steps that leave
    /// nothing behind.
    fn compensate(
        &self,
        ctx: &Self::Context,
        resource: Self::Output,
    ) -> impl Future<Output = Result<(), Self::Error>> {
        let _ = (ctx, resource);
        async { Ok(()) }
    }

    /// Human-readable description of what compensation will do.
    fn compensation_description(&self) -> String {
        format!("undo {}", self.name())
    }
}
