use std::rc::Rc;

use provision_operations::operations::provision::{
    ProvisionContext, ProvisionReceipt, ProvisionSagaBuilder,
};
use provision_operations::providers::InMemoryBackend;
use provision_operations::{ProvisionError, ProvisionStage, UserData};
use provision_saga::{TagMatch, Tagged, TracingObserver};
use tracing::info;

use super::RunArgs;
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::output;

enum Outcome<'a> {
    Provisioned(ProvisionReceipt),
    Stopped {
        headline: &'static str,
        error: ProvisionError<'a>,
    },
}

fn stopped<'a>(headline: &'static str) -> impl FnOnce(ProvisionError<'a>) -> Outcome<'a> {
    move |error| Outcome::Stopped { headline, error }
}

pub(super) async fn run(args: RunArgs, config: Config) -> Result<()> {
    let config = config.with_overrides(args.saga.overrides());
    let simulation = &config.simulation;

    let mut backend = InMemoryBackend::new().with_latency(simulation.latency());
    if let Some(stage) = simulation.fail_at {
        backend = backend.with_fault(stage.operation(), simulation.fault);
    }
    let ctx = ProvisionContext::new(
        Rc::new(backend.record_store()),
        Rc::new(backend.object_store()),
        Rc::new(backend.notifier()),
    );

    let policy = config.saga.compensation_policy;
    let saga = ProvisionSagaBuilder::new()
        .compensation_policy(policy)
        .observer(Rc::new(TracingObserver))
        .build();

    info!(email = %args.email, %policy, "provisioning user");
    let user = UserData::new(args.name, args.email);
    let (result, audit) = saga.execute_with_audit(&ctx, user).await;

    let outcome = TagMatch::new(result)
        .on_success(Outcome::Provisioned)
        .on(
            ProvisionStage::RecordCreate.tag(),
            stopped("could not create the user record"),
        )
        .on(
            ProvisionStage::Resource.tag(),
            stopped("could not provision storage"),
        )
        .on(
            ProvisionStage::Notification.tag(),
            stopped("could not send the welcome notification"),
        )
        .run()?;

    match outcome {
        Outcome::Provisioned(receipt) => {
            print!("{}", output::format_receipt(&receipt));
            print!("{}", output::format_audit(&audit));
            Ok(())
        }
        Outcome::Stopped {
            headline,
            mut error,
        } => {
            println!("{headline}: {}", error.reason());
            if !error.is_rolled_back() {
                println!("Rolling back {} step(s)", error.pending().len());
                error.rollback().await;
            }
            print!("{}", output::format_report(error.report()));
            print!("{}", output::format_audit(&audit));

            let failed = error.report().failures().count();
            if failed > 0 {
                return Err(CliError::RollbackIncomplete { failed });
            }
            Err(CliError::Provisioning {
                tag: error.tag(),
                step: error.step(),
                reason: error.reason().to_string(),
            })
        }
    }
}
