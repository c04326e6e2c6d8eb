use std::path::Path;

use anyhow::Context;
use armap_core::AppConfig;
use armap_register::{harvest, HarvestConfig, HarvestTable, RegisterClient, RegisterCredentials};

const REGISTER_TIMEOUT_SECS: u64 = 30;

/// Print the firms a harvest would fetch, without calling the register.
///
/// # Errors
///
/// Returns an error if the input table cannot be read.
pub(crate) fn run_harvest_dry_run(input: &Path, settings: HarvestConfig) -> anyhow::Result<()> {
    let table = HarvestTable::load(input)
        .with_context(|| format!("failed to read harvest input {}", input.display()))?;
    let (jobs, skipped) = table.plan(settings.min_ar_count);

    for job in &jobs {
        println!("{:<8}{:<12}{}", job.row, job.frn, job.reported_ars);
    }
    println!(
        "dry-run: would fetch {} firms ({skipped} skipped, min {} ARs)",
        jobs.len(),
        settings.min_ar_count
    );
    Ok(())
}

/// Fetch AR lists from the register and write the enriched table.
///
/// # Errors
///
/// Returns an error if credentials are missing, the client cannot be built,
/// or the input/output files cannot be read or written. Individual register
/// failures are counted, not propagated.
pub(crate) async fn run_harvest(
    config: &AppConfig,
    input: &Path,
    output: &Path,
    settings: HarvestConfig,
) -> anyhow::Result<()> {
    let (Some(email), Some(key)) = (
        config.register_auth_email.clone(),
        config.register_auth_key.clone(),
    ) else {
        anyhow::bail!(
            "ARMAP_REGISTER_AUTH_EMAIL and ARMAP_REGISTER_AUTH_KEY are required for harvest"
        );
    };

    let client = RegisterClient::new(
        &config.register_base_url,
        RegisterCredentials { email, key },
        REGISTER_TIMEOUT_SECS,
        &config.user_agent,
    )
    .context("failed to build register client")?;

    let summary = harvest(&client, input, output, settings).await?;
    println!(
        "harvest: {} attempted, {} stored, {} failed, {} skipped -> {}",
        summary.attempted,
        summary.succeeded,
        summary.failed,
        summary.skipped,
        output.display()
    );

    if summary.attempted > 0 && summary.succeeded == 0 {
        anyhow::bail!("all {} register lookups failed", summary.attempted);
    }
    Ok(())
}
