//! Read-only commands over the firm table: principals, stats and map.

use std::path::Path;

use anyhow::Context;
use armap_core::{
    aggregate, consolidate, AppConfig, CoordinateResolver, FirmTable, MaybeCached,
    RelationshipFilter,
};
use armap_geocode::PostcodeClient;

type Resolver = CoordinateResolver<MaybeCached<PostcodeClient>>;

fn build_resolver(config: &AppConfig) -> anyhow::Result<Resolver> {
    let client = PostcodeClient::with_base_url(
        config.geocoder_timeout_secs,
        &config.user_agent,
        &config.geocoder_base_url,
    )
    .context("failed to build postcode client")?;
    Ok(CoordinateResolver::with_policy(
        MaybeCached::new(client, config.geocoder_cache),
        config.gps_policy,
    ))
}

fn load_table(csv: &Path) -> anyhow::Result<FirmTable> {
    FirmTable::load(csv).with_context(|| format!("failed to load firm table {}", csv.display()))
}

/// Print each distinct principal name on its own line.
///
/// # Errors
///
/// Returns an error if the firm table cannot be loaded.
pub(crate) fn run_principals(csv: &Path) -> anyhow::Result<()> {
    let names = load_table(csv)?.principal_names();
    if names.is_empty() {
        println!("no principal firms found in {}", csv.display());
        return Ok(());
    }
    for name in &names {
        println!("{name}");
    }
    Ok(())
}

/// Print relationship counts for `principal` (every firm when blank).
///
/// # Errors
///
/// Returns an error if the firm table cannot be loaded or the geocoder
/// cannot be built.
pub(crate) async fn run_stats(
    config: &AppConfig,
    csv: &Path,
    principal: &str,
    json: bool,
) -> anyhow::Result<()> {
    let table = load_table(csv)?;
    let resolver = build_resolver(config)?;
    let result = consolidate(&table, principal, &resolver).await;
    let stats = aggregate(&result.ar_locations);

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    if result.is_show_all() {
        println!("All companies");
    } else {
        match result.principal() {
            Ok(record) => println!("{} (FCA {})", record.name, record.regulatory_number),
            Err(e) => println!("{}: {e}", result.query),
        }
    }
    println!("{:<12}{}", "TOTAL", stats.total);
    println!("{:<12}{}", "FULL", stats.full_count);
    println!("{:<12}{}", "INTRODUCER", stats.introducer_count);
    Ok(())
}

/// Render the map for `principal` and `filter` to `output`.
///
/// # Errors
///
/// Returns an error if the firm table cannot be loaded, the geocoder cannot
/// be built, or the map cannot be written.
pub(crate) async fn run_map(
    config: &AppConfig,
    csv: &Path,
    principal: &str,
    filter: RelationshipFilter,
    output: &Path,
) -> anyhow::Result<()> {
    let table = load_table(csv)?;
    let resolver = build_resolver(config)?;
    let result = consolidate(&table, principal, &resolver).await;

    if result.is_empty() {
        println!("No locations found for this principal company name.");
    }

    let locations = result.map_locations(filter);
    armap_map::render(&locations, output)?;
    println!(
        "wrote {} markers ({} filter) to {}",
        locations.len(),
        filter,
        output.display()
    );
    Ok(())
}
