// src/pipeline.rs

use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDateTime};
use tracing::{info, instrument};

use crate::config::Config;
use crate::error::PipelineError;
use crate::export::export_table;
use crate::fetch::{PeriodSource, SidraClient};
use crate::periods::build_period_table;

/// Fetch, filter against the current local time, and write `config.output`.
pub fn run(config: &Config) -> Result<PathBuf, PipelineError> {
    let client = SidraClient::new(config)?;
    let now = Local::now().naive_local();
    run_with(&client, now, &config.output)?;
    Ok(config.output.clone())
}

/// The three stages in order. The first failure aborts the run.
#[instrument(level = "debug", skip(source), fields(output = %output.display()))]
pub fn run_with<S: PeriodSource>(
    source: &S,
    now: NaiveDateTime,
    output: &Path,
) -> Result<(), PipelineError> {
    info!("fetching IPCA periods");
    let response = source.fetch_index_periods()?;

    info!("processing periods");
    let table = build_period_table(&response, now)?;

    info!(rows = table.len(), "saving parquet file");
    export_table(&table, output)?;

    Ok(())
}
