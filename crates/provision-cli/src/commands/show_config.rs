use super::SagaArgs;
use crate::config::Config;
use crate::error::Result;

pub(super) fn run(args: &SagaArgs, config: Config) -> Result<()> {
    let config = config.with_overrides(args.overrides());
    print!("{}", config.to_toml()?);
    Ok(())
}
