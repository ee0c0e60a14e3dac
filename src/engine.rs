//! End-to-end orchestration of the summary pipeline.
//!
//! Raw rows go in, the five views and a populated diagnostics log come out.
//! Row errors and reconciliation warnings never abort a run; only
//! structurally empty input does.

use anyhow::{Result, bail};
use serde::Serialize;

use crate::diagnostics::DiagnosticLog;
use crate::metrics::{ReconciledModel, finalize};
use crate::records::{RawRideCheck, RawStopRow, StopRow, normalize_ride_checks, normalize_stop_rows};
use crate::summaries::{
    DetailBlock, MaxLoadRow, OnTimeBlock, RouteTotalsRow, StopTotalsRow, detail, max_load, on_time,
    route_totals, stop_totals,
};
use crate::topology::build_topologies;
use crate::trips::group_trips;

/// The five ordered row-sets of one run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryReport {
    pub route_totals: Vec<RouteTotalsRow>,
    pub max_loads: Vec<MaxLoadRow>,
    pub stop_totals: Vec<StopTotalsRow>,
    pub on_time: Vec<OnTimeBlock>,
    pub detail: Vec<DetailBlock>,
}

/// Runs stages 1–4: normalization, topology, grouping, metrics.
///
/// # Errors
///
/// Fails only on structurally empty input: an empty ride-check dataset or a
/// stop dataset with no route tables.
pub fn build_model(
    ride_checks: &[RawRideCheck],
    stop_sheets: &[Vec<RawStopRow>],
    log: &DiagnosticLog,
) -> Result<ReconciledModel> {
    if ride_checks.is_empty() {
        bail!("the ride check dataset is empty");
    }

    log.general("Parsing bus stop data");
    let sheets: Vec<Vec<StopRow>> = stop_sheets
        .iter()
        .map(|sheet| normalize_stop_rows(sheet, log))
        .collect();
    let topologies = build_topologies(&sheets, log)?;

    log.general("Parsing ride check data");
    let entries = normalize_ride_checks(ride_checks, log);

    let grouped = group_trips(&entries, &topologies, log);
    Ok(finalize(topologies, grouped, log))
}

/// Runs the whole pipeline and builds all five views.
pub fn generate_summary(
    ride_checks: &[RawRideCheck],
    stop_sheets: &[Vec<RawStopRow>],
    log: &DiagnosticLog,
) -> Result<SummaryReport> {
    let model = build_model(ride_checks, stop_sheets, log)?;

    log.general("Generating route totals");
    let route_totals = route_totals::build(&model);
    log.general("Generating max load rows");
    let max_loads = max_load::build(&model);
    log.general("Generating route totals per stop");
    let stop_totals = stop_totals::build(&model);
    log.general("Generating on-time detail");
    let on_time = on_time::build(&model);
    log.general("Generating detail report");
    let detail = detail::build(&model);
    log.general("Generation complete");

    Ok(SummaryReport {
        route_totals,
        max_loads,
        stop_totals,
        on_time,
        detail,
    })
}
