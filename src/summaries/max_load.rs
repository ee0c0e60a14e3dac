//! Max Load view: one row per trip with its peak passenger load.

use chrono::NaiveTime;
use serde::Serialize;

use crate::metrics::ReconciledModel;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MaxLoadRow {
    pub route: u32,
    pub label: String,
    pub start_time: NaiveTime,
    pub ons: u32,
    pub offs: u32,
    pub max_load: u32,
}

/// One row per trip, grouped by (route, direction); within a pair, trips
/// order by start time, then date, then run.
pub fn build(model: &ReconciledModel) -> Vec<MaxLoadRow> {
    let mut rows = Vec::new();
    for (topology, route) in model.pairs() {
        let mut trips: Vec<_> = route.trips.iter().collect();
        trips.sort_by(|a, b| {
            (a.start_time, a.date, &a.run).cmp(&(b.start_time, b.date, &b.run))
        });
        for trip in trips {
            rows.push(MaxLoadRow {
                route: topology.route,
                label: topology.label(),
                start_time: trip.start_time,
                ons: trip.total_ons(),
                offs: trip.total_offs(),
                max_load: trip.max_load,
            });
        }
    }
    rows
}
