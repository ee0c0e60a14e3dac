//! Detail Report view: the full stop-by-trip activity matrix per pair.

use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;

use crate::metrics::ReconciledModel;
use crate::trips::Trip;

/// Column header: one trip, ordered by start time then date then run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetailColumn {
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub run: String,
    pub onboard: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DetailCell {
    pub ons: u32,
    pub offs: u32,
    pub load: u32,
}

/// One topology stop's activity across every column of the block.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetailRow {
    pub stop_number: u32,
    pub street: String,
    pub cross_street: String,
    pub cells: Vec<DetailCell>,
}

/// Per-column ons/offs summed over all stop rows.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DetailColumnTotal {
    pub ons: u32,
    pub offs: u32,
}

/// One table per (route, direction) that has any trips.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetailBlock {
    pub route: u32,
    pub label: String,
    pub project: String,
    pub columns: Vec<DetailColumn>,
    pub rows: Vec<DetailRow>,
    pub totals: Vec<DetailColumnTotal>,
}

pub fn build(model: &ReconciledModel) -> Vec<DetailBlock> {
    let mut blocks = Vec::new();
    for (topology, route) in model.pairs() {
        if route.trips.is_empty() {
            continue;
        }

        let mut trips: Vec<&Trip> = route.trips.iter().collect();
        trips.sort_by(|a, b| {
            (a.start_time, a.date, &a.run).cmp(&(b.start_time, b.date, &b.run))
        });

        let columns = trips
            .iter()
            .map(|trip| DetailColumn {
                date: trip.date,
                start_time: trip.start_time,
                run: trip.run.clone(),
                onboard: trip.onboard,
            })
            .collect();

        let mut totals = vec![DetailColumnTotal { ons: 0, offs: 0 }; trips.len()];
        let rows = topology
            .stops
            .iter()
            .enumerate()
            .map(|(index, def)| DetailRow {
                stop_number: def.stop_number,
                street: def.street.clone(),
                cross_street: def.cross_street.clone(),
                cells: trips
                    .iter()
                    .enumerate()
                    .map(|(column, trip)| {
                        let stop = &trip.stops[index];
                        totals[column].ons += stop.ons;
                        totals[column].offs += stop.offs;
                        DetailCell {
                            ons: stop.ons,
                            offs: stop.offs,
                            load: stop.load,
                        }
                    })
                    .collect(),
            })
            .collect();

        blocks.push(DetailBlock {
            route: topology.route,
            label: topology.label(),
            project: topology.project.clone(),
            columns,
            rows,
            totals,
        });
    }
    blocks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::Direction;
    use crate::summaries::testing::{model_from, ride, stops, time};

    #[test]
    fn test_matrix_shape_and_cells() {
        let mut boarding = ride(1, Direction::OB, "08:00", 1, 5, 0);
        boarding.onboard = 1;
        let model = model_from(
            &[stops(1, Direction::OB, &[1, 2])],
            &[
                boarding,
                ride(1, Direction::OB, "08:00", 2, 0, 6),
                ride(1, Direction::OB, "07:00", 1, 2, 2),
            ],
        );
        let blocks = build(&model);

        assert_eq!(blocks.len(), 1);
        let block = &blocks[0];
        assert_eq!(block.project, "University");
        assert_eq!(block.label, "University OB");

        // Columns sorted by start time.
        assert_eq!(block.columns.len(), 2);
        assert_eq!(block.columns[0].start_time, time("07:00"));
        assert_eq!(block.columns[1].onboard, 1);

        assert_eq!(block.rows.len(), 2);
        let first_stop = &block.rows[0];
        assert_eq!(first_stop.stop_number, 1);
        assert_eq!(first_stop.cells[0], DetailCell { ons: 2, offs: 2, load: 0 });
        assert_eq!(first_stop.cells[1], DetailCell { ons: 5, offs: 0, load: 6 });

        let second_stop = &block.rows[1];
        assert_eq!(second_stop.cells[1], DetailCell { ons: 0, offs: 6, load: 0 });
    }

    #[test]
    fn test_totals_sum_each_column() {
        let model = model_from(
            &[stops(1, Direction::OB, &[1, 2])],
            &[
                ride(1, Direction::OB, "08:00", 1, 5, 0),
                ride(1, Direction::OB, "08:00", 2, 1, 6),
                ride(1, Direction::OB, "09:00", 1, 3, 3),
            ],
        );
        let blocks = build(&model);

        let totals = &blocks[0].totals;
        assert_eq!(totals.len(), 2);
        assert_eq!(totals[0].ons, 6);
        assert_eq!(totals[0].offs, 6);
        assert_eq!(totals[1].ons, 3);
        assert_eq!(totals[1].offs, 3);
    }

    #[test]
    fn test_pair_without_trips_has_no_block() {
        let model = model_from(&[stops(1, Direction::OB, &[1])], &[]);
        assert!(build(&model).is_empty());
    }
}
