//! DCIM Audit
//!
//! Loads a YAML inventory snapshot into an in-memory store and runs the
//! rack, device, module, component and virtual chassis validations over
//! every record. Exits non-zero when any record fails.
//!
//! Configuration comes from the environment:
//! - `DCIM_SNAPSHOT` (required): path to the snapshot file
//! - `DCIM_PREFER_IPV4`, `DCIM_RACK_U_HEIGHT_MAX`, `DCIM_BULK_CREATE`: core settings
//! - `RUST_LOG`: log filter (default `info`)

mod audit;
mod snapshot;

use anyhow::{Context, Result, bail};
use dcim_core::Settings;
use snapshot::Snapshot;
use std::env;
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting DCIM audit");

    let snapshot_path = env::var("DCIM_SNAPSHOT")
        .map(PathBuf::from)
        .context("DCIM_SNAPSHOT environment variable is required")?;
    let settings = Settings::from_env().context("Invalid DCIM settings")?;

    info!("Configuration:");
    info!("  Snapshot: {}", snapshot_path.display());
    info!("  Prefer IPv4: {}", settings.prefer_ipv4);
    info!("  Max rack height: {}U", settings.rack_u_height_max);

    let store = Snapshot::from_file(&snapshot_path)?.into_store()?;
    let report = audit::audit(&store, &settings).await.context("Audit aborted")?;

    for violation in &report.violations {
        error!("{}", violation);
    }
    if !report.violations.is_empty() {
        bail!(
            "{} of {} records failed validation",
            report.violations.len(),
            report.checked
        );
    }
    info!("All {} records passed validation", report.checked);
    Ok(())
}
