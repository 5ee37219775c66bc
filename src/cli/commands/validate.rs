use std::process;
use std::sync::Arc;

use anyhow::Result;
use log::info;

use crate::config::Config;
use crate::validator::Validator;

/// Validate CLI command handler; prints one line per finding and exits
/// with the number of validation errors found.
pub async fn run(config: &Arc<Config>) -> Result<()> {
    let validator = Arc::new(Validator::new(Arc::clone(config))?);
    let mut findings = validator.validate()?;

    let mut count = 0;
    while let Some(finding) = findings.recv().await {
        count += 1;
        println!("{finding}");
    }

    if count == 0 {
        info!("site is valid");
    } else {
        info!("found {count} validation errors");
    }
    process::exit(count as i32);
}
