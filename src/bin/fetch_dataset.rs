//! Download or refresh the boundary dataset.
//!
//! Reads the same configuration as the server (`dataset.path`,
//! `dataset.source_url`, `dataset.max_age_days`). Safe to run while the
//! server is up: the file is replaced by rename.

use wof_reverse::config::Config;
use wof_reverse::dataset::{DatasetRefresher, RefreshOutcome};
use wof_reverse::logger;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cfg = Config::load()?;
    logger::init(&cfg.logging).map_err(|e| e as Box<dyn std::error::Error>)?;

    let refresher = DatasetRefresher::new(&cfg.dataset)?;
    match refresher.run() {
        Ok(RefreshOutcome::Downloaded { bytes }) => {
            tracing::info!("Dataset updated ({bytes} bytes): {}", cfg.dataset.path);
        }
        Ok(RefreshOutcome::NotModified | RefreshOutcome::Skipped { .. }) => {
            tracing::info!("Dataset is up to date: {}", cfg.dataset.path);
        }
        Err(e) => {
            logger::log_error(&format!("Dataset refresh failed: {e}"));
            return Err(e.into());
        }
    }
    Ok(())
}
