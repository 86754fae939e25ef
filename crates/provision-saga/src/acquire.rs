use std::any::Any;
use std::fmt;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::pin::Pin;
use std::task::{Context, Poll};

use crate::tag::Tagged;

/// A boxed, possibly `!Send`, future.
pub type LocalBoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// A release action bound to one acquired resource.
pub type Release<'a, R, E> = Box<dyn FnOnce() -> LocalBoxFuture<'a, Result<R, E>> + 'a>;

/// Tag carried by [`AcquireReleaseError::Defect`].
pub const DEFECT_TAG: &str = "AcquireReleaseError";

/// An unexpected failure that broke a step's total-result contract.
///
/// Steps report expected failures as `Err` values. A panic while creating
/// or polling a step future is a defect; it is captured here instead of
/// unwinding through the saga.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("defect: {message}")]
pub struct Defect {
    message: String,
}

impl Defect {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub(crate) fn from_panic(payload: &(dyn Any + Send)) -> Self {
        let message = payload
            .downcast_ref::<&str>()
            .map(ToString::to_string)
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        Self { message }
    }

    /// The panic message, or `"unknown panic"` for non-string payloads.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Tagged for Defect {
    fn tag(&self) -> &'static str {
        DEFECT_TAG
    }
}

/// Failure of an acquire or release action.
#[derive(Debug, thiserror::Error)]
pub enum AcquireReleaseError<E> {
    /// The action reported a modeled failure.
    #[error(transparent)]
    Failed(E),

    /// The action panicked.
    #[error(transparent)]
    Defect(#[from] Defect),
}

impl<E> AcquireReleaseError<E> {
    #[must_use]
    pub fn is_defect(&self) -> bool {
        matches!(self, Self::Defect(_))
    }

    /// The modeled failure, if this is not a defect.
    #[must_use]
    pub fn failure(&self) -> Option<&E> {
        match self {
            Self::Failed(error) => Some(error),
            Self::Defect(_) => None,
        }
    }

    #[must_use]
    pub fn defect(&self) -> Option<&Defect> {
        match self {
            Self::Failed(_) => None,
            Self::Defect(defect) => Some(defect),
        }
    }
}

impl<E: Tagged> Tagged for AcquireReleaseError<E> {
    fn tag(&self) -> &'static str {
        match self {
            Self::Failed(error) => error.tag(),
            Self::Defect(defect) => defect.tag(),
        }
    }
}

impl<E: PartialEq> PartialEq for AcquireReleaseError<E> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Failed(a), Self::Failed(b)) => a == b,
            (Self::Defect(a), Self::Defect(b)) => a == b,
            _ => false,
        }
    }
}

/// A resource together with the action that releases it.
pub struct Acquired<'a, T, R, E> {
    resource: T,
    release: Release<'a, R, E>,
}

impl<'a, T, R, E> Acquired<'a, T, R, E> {
    #[must_use]
    pub fn resource(&self) -> &T {
        &self.resource
    }

    /// Release the resource. Failures are returned as reported.
    ///
    /// # Errors
    ///
    /// Returns whatever error the release action produced.
    pub async fn release(self) -> Result<R, E> {
        (self.release)().await
    }

    #[must_use]
    pub fn into_parts(self) -> (T, Release<'a, R, E>) {
        (self.resource, self.release)
    }
}

impl<T: fmt::Debug, R, E> fmt::Debug for Acquired<'_, T, R, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Acquired")
            .field("resource", &self.resource)
            .finish_non_exhaustive()
    }
}

/// Acquire a resource and bind its release action to it.
///
/// `release` is never invoked by this function. If `acquire` fails, the
/// failure is returned as is and nothing is bound. If `acquire` panics,
/// the panic is returned as [`AcquireReleaseError::Defect`].
///
/// # Errors
///
/// Returns [`AcquireReleaseError::Failed`] with the acquire error, or
/// [`AcquireReleaseError::Defect`] if acquiring panicked.
pub async fn acquire_release<'a, T, R, E, A, AFut, Rel, RFut>(
    acquire: A,
    release: Rel,
) -> Result<Acquired<'a, T, R, E>, AcquireReleaseError<E>>
where
    A: FnOnce() -> AFut,
    AFut: Future<Output = Result<T, E>>,
    T: Clone + 'a,
    Rel: FnOnce(T) -> RFut + 'a,
    RFut: Future<Output = Result<R, E>> + 'a,
{
    let resource = catch_defect(acquire)
        .await?
        .map_err(AcquireReleaseError::Failed)?;

    let bound = resource.clone();
    let release: Release<'a, R, E> =
        Box::new(move || -> LocalBoxFuture<'a, Result<R, E>> { Box::pin(release(bound)) });

    Ok(Acquired { resource, release })
}

/// Call `start` and drive its future, turning any panic into a [`Defect`].
pub(crate) async fn catch_defect<F, Fut>(start: F) -> Result<Fut::Output, Defect>
where
    F: FnOnce() -> Fut,
    Fut: Future,
{
    let future = panic::catch_unwind(AssertUnwindSafe(start))
        .map_err(|payload| Defect::from_panic(payload.as_ref()))?;
    CatchUnwind(Box::pin(future))
        .await
        .map_err(|payload| Defect::from_panic(payload.as_ref()))
}

struct CatchUnwind<F>(Pin<Box<F>>);

impl<F: Future> Future for CatchUnwind<F> {
    type Output = std::thread::Result<F::Output>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let inner = self.0.as_mut();
        match panic::catch_unwind(AssertUnwindSafe(|| inner.poll(cx))) {
            Ok(Poll::Pending) => Poll::Pending,
            Ok(Poll::Ready(value)) => Poll::Ready(Ok(value)),
            Err(payload) => Poll::Ready(Err(payload)),
        }
    }
}
