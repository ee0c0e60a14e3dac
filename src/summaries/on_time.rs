//! On-Time Detail view: schedule deviation at timed stops, per trip.

use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;

use crate::metrics::ReconciledModel;

/// Column header for one timed stop, in topology order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimedStopColumn {
    pub stop_number: u32,
    pub street: String,
    pub cross_street: String,
}

/// One trip's deviations, aligned with the block's columns. A cell is
/// `Some(signed whole minutes late)` when both the arrival and schedule
/// times were recorded at that stop, `None` otherwise.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OnTimeRow {
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub run: String,
    pub minutes_late: Vec<Option<i64>>,
}

/// The on-time table for one (route, direction) with at least one timed
/// stop. Pairs without timed stops contribute no block.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OnTimeBlock {
    pub route: u32,
    pub label: String,
    pub columns: Vec<TimedStopColumn>,
    pub rows: Vec<OnTimeRow>,
}

pub fn build(model: &ReconciledModel) -> Vec<OnTimeBlock> {
    let mut blocks = Vec::new();
    for (topology, route) in model.pairs() {
        let timed = topology.timed_stops();
        if timed.is_empty() {
            continue;
        }

        let columns = timed
            .iter()
            .map(|(_, def)| TimedStopColumn {
                stop_number: def.stop_number,
                street: def.street.clone(),
                cross_street: def.cross_street.clone(),
            })
            .collect();

        // A trip keeps its row even when every cell is blank.
        let rows = route
            .trips
            .iter()
            .map(|trip| OnTimeRow {
                date: trip.date,
                start_time: trip.start_time,
                run: trip.run.clone(),
                minutes_late: timed
                    .iter()
                    .map(|(index, _)| trip.stops[*index].minutes_late())
                    .collect(),
            })
            .collect();

        blocks.push(OnTimeBlock {
            route: topology.route,
            label: topology.label(),
            columns,
            rows,
        });
    }
    blocks
}
