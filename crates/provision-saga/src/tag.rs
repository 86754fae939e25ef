use std::fmt;

/// Discriminant reported for the success side of a result.
pub const SUCCESS_TAG: &str = "Success";

/// A failure value that carries its own discriminant tag.
///
/// Tags let a boundary that consumes results branch per failure class.
/// Closed error sets should still be matched exhaustively with `match`;
/// tags exist for dispatch tables, logging and observers.
pub trait Tagged {
    /// The discriminant of this value.
    fn tag(&self) -> &'static str;
}

impl<T: Tagged + ?Sized> Tagged for &T {
    fn tag(&self) -> &'static str {
        (**self).tag()
    }
}

impl<T: Tagged + ?Sized> Tagged for Box<T> {
    fn tag(&self) -> &'static str {
        (**self).tag()
    }
}

/// Returns [`SUCCESS_TAG`] for `Ok`, or the error's own tag for `Err`.
#[must_use]
pub fn result_tag<T, E: Tagged>(result: &Result<T, E>) -> &'static str {
    match result {
        Ok(_) => SUCCESS_TAG,
        Err(error) => error.tag(),
    }
}

/// No handler was registered for the active discriminant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unhandled tag: {tag}")]
pub struct UnhandledTag {
    /// The discriminant that had no handler.
    pub tag: &'static str,
}

type SuccessHandler<'h, T, Out> = Box<dyn FnOnce(T) -> Out + 'h>;
type FailureHandler<'h, E, Out> = Box<dyn FnOnce(E) -> Out + 'h>;

/// Dispatches a result on its discriminant.
///
/// ```
/// use provision_saga::{TagMatch, Tagged};
///
/// #[derive(Debug)]
/// struct Timeout;
///
/// impl Tagged for Timeout {
///     fn tag(&self) -> &'static str {
///         "Timeout"
///     }
/// }
///
/// let result: Result<u32, Timeout> = Err(Timeout);
/// let rendered = TagMatch::new(result)
///     .on_success(|n| format!("got {n}"))
///     .on("Timeout", |_| "timed out".to_string())
///     .run();
///
/// assert_eq!(rendered.ok().as_deref(), Some("timed out"));
/// ```
pub struct TagMatch<'h, T, E, Out> {
    result: Result<T, E>,
    on_success: Option<SuccessHandler<'h, T, Out>>,
    handlers: Vec<(&'static str, FailureHandler<'h, E, Out>)>,
}

impl<'h, T, E: Tagged, Out> TagMatch<'h, T, E, Out> {
    #[must_use]
    pub fn new(result: Result<T, E>) -> Self {
        Self {
            result,
            on_success: None,
            handlers: Vec::new(),
        }
    }

    /// Handler for the `"Success"` discriminant.
    #[must_use]
    pub fn on_success(mut self, handler: impl FnOnce(T) -> Out + 'h) -> Self {
        self.on_success = Some(Box::new(handler));
        self
    }

    /// Handler for failures tagged `tag`. The first registration wins.
    #[must_use]
    pub fn on(mut self, tag: &'static str, handler: impl FnOnce(E) -> Out + 'h) -> Self {
        self.handlers.push((tag, Box::new(handler)));
        self
    }

    /// Runs the handler registered for the active discriminant.
    ///
    /// # Errors
    ///
    /// Returns [`UnhandledTag`] if no handler matches.
    pub fn run(self) -> Result<Out, UnhandledTag> {
        match self.result {
            Ok(data) => match self.on_success {
                Some(handler) => Ok(handler(data)),
                None => Err(UnhandledTag { tag: SUCCESS_TAG }),
            },
            Err(error) => {
                let tag = error.tag();
                let handler = self
                    .handlers
                    .into_iter()
                    .find_map(|(candidate, handler)| (candidate == tag).then_some(handler));
                match handler {
                    Some(handler) => Ok(handler(error)),
                    None => Err(UnhandledTag { tag }),
                }
            }
        }
    }
}

impl<T, E, Out> fmt::Debug for TagMatch<'_, T, E, Out> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tags: Vec<&str> = self.handlers.iter().map(|(tag, _)| *tag).collect();
        f.debug_struct("TagMatch")
            .field("is_ok", &self.result.is_ok())
            .field("on_success", &self.on_success.is_some())
            .field("handlers", &tags)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    enum TestError {
        First(String),
        Second(String),
        Unhandled,
    }

    impl Tagged for TestError {
        fn tag(&self) -> &'static str {
            match self {
                Self::First(_) => "TestError1",
                Self::Second(_) => "TestError2",
                Self::Unhandled => "UnhandledError",
            }
        }
    }

    fn render(result: Result<i32, TestError>) -> Result<String, UnhandledTag> {
        TagMatch::new(result)
            .on_success(|data| format!("Success: {data}"))
            .on("TestError1", |error| match error {
                TestError::First(msg) => format!("Error1: {msg}"),
                other => format!("unexpected {other:?}"),
            })
            .on("TestError2", |error| match error {
                TestError::Second(msg) => format!("Error2: {msg}"),
                other => format!("unexpected {other:?}"),
            })
            .run()
    }

    #[test]
    fn result_tag_reports_success_and_failure_discriminants() {
        let ok: Result<i32, TestError> = Ok(42);
        let err: Result<i32, TestError> = Err(TestError::Second("x".into()));

        assert_eq!(result_tag(&ok), "Success");
        assert_eq!(result_tag(&err), "TestError2");
    }

    #[test]
    fn matches_success_case() {
        assert_eq!(render(Ok(42)), Ok("Success: 42".to_string()));
    }

    #[test]
    fn matches_failure_case_by_tag() {
        let output = render(Err(TestError::First("Test error".into())));

        assert_eq!(output, Ok("Error1: Test error".to_string()));
    }

    #[test]
    fn unhandled_failure_tag_is_reported() {
        let output = render(Err(TestError::Unhandled));

        let err = output.expect_err("tag has no handler");
        assert_eq!(err.tag, "UnhandledError");
        assert_eq!(err.to_string(), "unhandled tag: UnhandledError");
    }

    #[test]
    fn missing_success_handler_is_unhandled() {
        let result: Result<i32, TestError> = Ok(1);

        let output = TagMatch::new(result)
            .on("TestError1", |_| ())
            .run();

        assert_eq!(output, Err(UnhandledTag { tag: SUCCESS_TAG }));
    }

    #[test]
    fn only_the_first_matching_handler_runs() {
        let calls = Cell::new(0);

        let output = TagMatch::new(Err::<(), _>(TestError::First("a".into())))
            .on("TestError1", |_| {
                calls.set(calls.get() + 1);
                "first"
            })
            .on("TestError1", |_| {
                calls.set(calls.get() + 1);
                "second"
            })
            .run();

        assert_eq!(output, Ok("first"));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn map_and_then_leave_failures_untouched() {
        let invoked = Cell::new(false);
        let failure: Result<i32, TestError> = Err(TestError::First("boom".into()));

        let mapped = failure.clone().map(|x| {
            invoked.set(true);
            x * 2
        });
        let chained = failure.and_then(|x| {
            invoked.set(true);
            Ok::<_, TestError>(x * 2)
        });

        assert!(!invoked.get());
        assert_eq!(mapped, Err(TestError::First("boom".into())));
        assert_eq!(chained, Err(TestError::First("boom".into())));
    }

    #[test]
    fn success_never_equals_failure() {
        let ok: Result<i32, i32> = Ok(42);
        let err: Result<i32, i32> = Err(42);

        assert_ne!(ok, err);
        assert_eq!(ok, Ok(42));
        assert_eq!(err, Err(42));
    }

    #[test]
    #[should_panic(expected = "cannot read data from a failure")]
    fn reading_data_from_a_failure_is_a_usage_violation() {
        let failure: Result<i32, &str> = Err("nope");
        let _ = failure.expect("cannot read data from a failure");
    }
}
