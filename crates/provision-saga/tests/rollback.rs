//! Integration tests for compensation order, rollback policies and defects.

use std::cell::RefCell;

use provision_saga::{
    AcquireReleaseError, CompensationPolicy, DEFECT_TAG, SagaBuilder, SagaStep, Tagged,
};

#[derive(Default)]
struct Ledger {
    acquired: RefCell<Vec<String>>,
    released: RefCell<Vec<String>>,
}

impl Ledger {
    fn released(&self) -> Vec<String> {
        self.released.borrow().clone()
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
enum LedgerError {
    #[error("acquire of {0} rejected")]
    AcquireRejected(&'static str),
    #[error("release of {0} rejected")]
    ReleaseRejected(String),
}

impl Tagged for LedgerError {
    fn tag(&self) -> &'static str {
        match self {
            Self::AcquireRejected(_) => "AcquireRejected",
            Self::ReleaseRejected(_) => "ReleaseRejected",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Open,
    Close,
}

impl Tagged for Stage {
    fn tag(&self) -> &'static str {
        match self {
            Self::Open => "OpenError",
            Self::Close => "CloseError",
        }
    }
}

#[derive(Clone, Copy)]
enum Behaviour {
    Succeed,
    Fail,
    Panic,
    FailRelease,
    PanicRelease,
}

struct Resource {
    name: &'static str,
    stage: Stage,
    behaviour: Behaviour,
}

impl Resource {
    fn ok(name: &'static str) -> Self {
        Self {
            name,
            stage: Stage::Open,
            behaviour: Behaviour::Succeed,
        }
    }

    fn with(name: &'static str, stage: Stage, behaviour: Behaviour) -> Self {
        Self {
            name,
            stage,
            behaviour,
        }
    }
}

impl SagaStep for Resource {
    type Input = Vec<String>;
    type Output = Vec<String>;
    type Context = Ledger;
    type Error = LedgerError;
    type Stage = Stage;

    fn name(&self) -> &'static str {
        self.name
    }

    fn stage(&self) -> Stage {
        self.stage
    }

    async fn execute(
        &self,
        ctx: &Ledger,
        mut held: Vec<String>,
    ) -> Result<Vec<String>, LedgerError> {
        match self.behaviour {
            Behaviour::Fail => return Err(LedgerError::AcquireRejected(self.name)),
            Behaviour::Panic => panic!("{} exploded", self.name),
            Behaviour::Succeed | Behaviour::FailRelease | Behaviour::PanicRelease => {}
        }
        ctx.acquired.borrow_mut().push(self.name.to_string());
        held.push(self.name.to_string());
        Ok(held)
    }

    async fn compensate(&self, ctx: &Ledger, held: Vec<String>) -> Result<(), LedgerError> {
        match self.behaviour {
            Behaviour::FailRelease => Err(LedgerError::ReleaseRejected(held.join("+"))),
            Behaviour::PanicRelease => panic!("release of {} exploded", self.name),
            Behaviour::Succeed | Behaviour::Fail | Behaviour::Panic => {
                ctx.released.borrow_mut().push(held.join("+"));
                Ok(())
            }
        }
    }

    fn compensation_description(&self) -> String {
        format!("release {}", self.name)
    }
}

#[tokio::test]
async fn compensations_run_in_lifo_order() {
    let ledger = Ledger::default();

    let saga = SagaBuilder::new()
        .first_step(Resource::ok("a"))
        .then(Resource::ok("b"))
        .then(Resource::ok("c"))
        .then(Resource::with("d", Stage::Close, Behaviour::Fail))
        .build();

    let mut err = saga
        .execute(&ledger, Vec::new())
        .await
        .expect_err("d should fail");

    assert_eq!(err.pending().steps(), vec!["c", "b", "a"]);
    assert!(ledger.released().is_empty());

    let report = err.rollback().await;

    assert!(report.is_clean());
    assert_eq!(ledger.released(), vec!["a+b+c", "a+b", "a"]);
}

#[tokio::test]
async fn failure_at_step_k_leaves_k_minus_one_compensations() {
    for failing_at in 0..4 {
        let ledger = Ledger::default();
        let names = ["a", "b", "c", "d"];
        let step = |index: usize| {
            if index == failing_at {
                Resource::with(names[index], Stage::Close, Behaviour::Fail)
            } else {
                Resource::ok(names[index])
            }
        };

        let saga = SagaBuilder::new()
            .first_step(step(0))
            .then(step(1))
            .then(step(2))
            .then(step(3))
            .build();

        let err = saga
            .execute(&ledger, Vec::new())
            .await
            .expect_err("one step fails");

        assert_eq!(err.pending().len(), failing_at);
        assert_eq!(err.step(), names[failing_at]);
        assert_eq!(ledger.acquired.borrow().len(), failing_at);
    }
}

#[tokio::test]
async fn deferred_policy_leaves_resources_in_place_until_rollback() {
    let ledger = Ledger::default();

    let saga = SagaBuilder::new()
        .compensation_policy(CompensationPolicy::Deferred)
        .first_step(Resource::ok("a"))
        .then(Resource::with("b", Stage::Close, Behaviour::Fail))
        .build();

    let mut err = saga
        .execute(&ledger, Vec::new())
        .await
        .expect_err("b should fail");

    assert!(!err.is_rolled_back());
    assert!(err.report().is_empty());
    assert!(ledger.released().is_empty());

    err.rollback().await;

    assert!(err.is_rolled_back());
    assert_eq!(ledger.released(), vec!["a"]);
}

#[tokio::test]
async fn eager_policy_releases_before_returning() {
    let ledger = Ledger::default();

    let saga = SagaBuilder::new()
        .compensation_policy(CompensationPolicy::Eager)
        .first_step(Resource::ok("a"))
        .then(Resource::ok("b"))
        .then(Resource::with("c", Stage::Close, Behaviour::Fail))
        .build();

    let mut err = saga
        .execute(&ledger, Vec::new())
        .await
        .expect_err("c should fail");

    assert!(err.is_rolled_back());
    assert_eq!(ledger.released(), vec!["a+b", "a"]);

    let report = err.rollback().await;
    assert_eq!(report.len(), 2);
    assert_eq!(ledger.released().len(), 2);
}

#[tokio::test]
async fn stage_error_carries_tag_and_root_cause() {
    let ledger = Ledger::default();

    let saga = SagaBuilder::new()
        .first_step(Resource::ok("a"))
        .then(Resource::with("b", Stage::Close, Behaviour::Fail))
        .build();

    let err = saga
        .execute(&ledger, Vec::new())
        .await
        .expect_err("b should fail");

    assert_eq!(err.stage(), Stage::Close);
    assert_eq!(err.tag(), "CloseError");
    assert_eq!(err.to_string(), "CloseError: step 'b' failed");
    assert_eq!(err.reason().tag(), "AcquireRejected");
    assert_eq!(
        err.into_reason(),
        AcquireReleaseError::Failed(LedgerError::AcquireRejected("b"))
    );
}

#[tokio::test]
async fn panicking_step_becomes_defect_under_its_stage() {
    let ledger = Ledger::default();

    let saga = SagaBuilder::new()
        .first_step(Resource::ok("a"))
        .then(Resource::with("b", Stage::Close, Behaviour::Panic))
        .build();

    let mut err = saga
        .execute(&ledger, Vec::new())
        .await
        .expect_err("b should panic");

    assert_eq!(err.tag(), "CloseError");
    assert!(err.reason().is_defect());
    assert_eq!(err.reason().tag(), DEFECT_TAG);
    assert_eq!(
        err.reason().defect().map(|defect| defect.message().to_string()),
        Some("b exploded".to_string())
    );

    err.rollback().await;
    assert_eq!(ledger.released(), vec!["a"]);
}

#[tokio::test]
async fn failing_and_panicking_releases_are_reported_and_do_not_stop_rollback() {
    let ledger = Ledger::default();

    let saga = SagaBuilder::new()
        .first_step(Resource::ok("a"))
        .then(Resource::with("b", Stage::Open, Behaviour::FailRelease))
        .then(Resource::with("c", Stage::Open, Behaviour::PanicRelease))
        .then(Resource::with("d", Stage::Close, Behaviour::Fail))
        .build();

    let mut err = saga
        .execute(&ledger, Vec::new())
        .await
        .expect_err("d should fail");
    let report = err.rollback().await;

    assert_eq!(report.len(), 3);
    assert!(!report.is_clean());
    assert_eq!(ledger.released(), vec!["a"]);

    let outcomes = report.outcomes();
    assert_eq!(outcomes[0].step, "c");
    assert!(
        outcomes[0]
            .result
            .as_ref()
            .is_err_and(AcquireReleaseError::is_defect)
    );
    assert_eq!(outcomes[1].step, "b");
    assert_eq!(
        outcomes[1].result,
        Err(AcquireReleaseError::Failed(LedgerError::ReleaseRejected(
            "a+b".to_string()
        )))
    );
    assert!(outcomes[2].result.is_ok());
}

#[tokio::test]
async fn rollback_failures_convert_into_compensation_errors() {
    let ledger = Ledger::default();

    let saga = SagaBuilder::new()
        .compensation_policy(CompensationPolicy::Eager)
        .first_step(Resource::with("a", Stage::Open, Behaviour::FailRelease))
        .then(Resource::ok("b"))
        .then(Resource::with("c", Stage::Close, Behaviour::Fail))
        .build();

    let err = saga
        .execute(&ledger, Vec::new())
        .await
        .expect_err("c should fail");

    let errors = err.into_report().into_errors();

    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].step, "a");
    assert_eq!(errors[0].description, "release a");
    assert_eq!(
        errors[0].to_string(),
        "compensation failed for step 'a': release a"
    );
    assert_eq!(ledger.released(), vec!["a+b"]);
}
