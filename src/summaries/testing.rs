//! Shared fixtures for the view builder tests.

use chrono::{NaiveDate, NaiveTime};

use crate::diagnostics::DiagnosticLog;
use crate::metrics::{ReconciledModel, finalize};
use crate::records::{Direction, RideCheckEntry, StopRow};
use crate::topology::build_topologies;
use crate::trips::group_trips;

pub fn time(s: &str) -> NaiveTime {
    NaiveTime::parse_from_str(s, "%H:%M").unwrap()
}

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

/// One sheet holding one table of untimed stops.
pub fn stops(route: u32, direction: Direction, stop_numbers: &[u32]) -> Vec<StopRow> {
    stops_timed(
        route,
        direction,
        &stop_numbers.iter().map(|n| (*n, false)).collect::<Vec<_>>(),
    )
}

/// One sheet holding one table with explicit timed flags.
pub fn stops_timed(route: u32, direction: Direction, entries: &[(u32, bool)]) -> Vec<StopRow> {
    let mut rows = vec![StopRow::Header {
        route,
        direction,
        project: Some("University".to_string()),
    }];
    for (n, timed) in entries {
        rows.push(StopRow::Stop {
            street: format!("Street {n}"),
            cross_street: format!("Cross {n}"),
            stop_number: *n,
            timed: *timed,
        });
    }
    rows
}

/// A ride-check entry on 2022-03-14, run "A", no onboard carryover.
pub fn ride(
    route: u32,
    direction: Direction,
    start: &str,
    stop_number: u32,
    ons: u32,
    offs: u32,
) -> RideCheckEntry {
    RideCheckEntry {
        sequence: 1,
        date: date("2022-03-14"),
        route,
        direction,
        run: "A".to_string(),
        start_time: time(start),
        onboard: 0,
        stop_number,
        arrival_time: None,
        schedule_time: None,
        offs,
        ons,
    }
}

pub fn model_from(sheets: &[Vec<StopRow>], entries: &[RideCheckEntry]) -> ReconciledModel {
    let log = DiagnosticLog::new();
    let topologies = build_topologies(sheets, &log).unwrap();
    let grouped = group_trips(entries, &topologies, &log);
    finalize(topologies, grouped, &log)
}
