//! Grouping of ride-check entries into trips, reconciled against topology.
//!
//! A trip is one traversal of a (route, direction) on a given date, run,
//! and start time. Raw rows arrive in no particular stop order and may skip
//! stops entirely; each trip comes out with exactly one [`TripStop`] per
//! topology stop, in topology order, zero-activity stops synthesized.

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveTime};

use crate::diagnostics::DiagnosticLog;
use crate::records::{Direction, RideCheckEntry};
use crate::topology::{RouteKey, TopologySet};

/// Identity of a trip within one (route, direction).
///
/// The derived ordering (date, then start time, then run) is the trip sort
/// order everywhere in the model.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct TripKey {
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub run: String,
}

/// Activity at one topology stop during one trip.
#[derive(Debug, Clone, PartialEq)]
pub struct TripStop {
    /// Index into the owning topology's stop list.
    pub stop: usize,
    pub offs: u32,
    pub ons: u32,
    /// Passengers aboard after this stop; computed by the metrics pass.
    pub load: u32,
    pub arrival_time: Option<NaiveTime>,
    pub schedule_time: Option<NaiveTime>,
}

impl TripStop {
    fn empty(stop: usize) -> Self {
        TripStop {
            stop,
            offs: 0,
            ons: 0,
            load: 0,
            arrival_time: None,
            schedule_time: None,
        }
    }

    /// Signed whole minutes behind schedule (negative = ahead), when both
    /// the arrival and schedule times were recorded.
    pub fn minutes_late(&self) -> Option<i64> {
        let arrival = self.arrival_time?;
        let schedule = self.schedule_time?;
        let seconds = arrival.signed_duration_since(schedule).num_seconds();
        Some((seconds as f64 / 60.0).round() as i64)
    }
}

/// One vehicle trip with its stop activity in topology order.
#[derive(Debug, Clone, PartialEq)]
pub struct Trip {
    pub date: NaiveDate,
    pub route: u32,
    pub direction: Direction,
    pub run: String,
    pub start_time: NaiveTime,
    /// Passengers carried over from a previous trip.
    pub onboard: u32,
    /// One entry per topology stop, in topology order.
    pub stops: Vec<TripStop>,
    /// Maximum cumulative load over the trip; computed by the metrics pass.
    pub max_load: u32,
}

impl Trip {
    pub fn key(&self) -> TripKey {
        TripKey {
            date: self.date,
            start_time: self.start_time,
            run: self.run.clone(),
        }
    }

    pub fn total_ons(&self) -> u32 {
        self.stops.iter().map(|s| s.ons).sum()
    }

    pub fn total_offs(&self) -> u32 {
        self.stops.iter().map(|s| s.offs).sum()
    }
}

/// Everything grouped for one (route, direction): its trips plus the
/// ons/offs that referenced stop numbers missing from the topology. Those
/// counts stay out of per-stop aggregation but must still reach the route
/// totals.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupedRoute {
    pub trips: Vec<Trip>,
    pub orphan_ons: u32,
    pub orphan_offs: u32,
}

#[derive(Default)]
struct StopAccumulator {
    ons: u32,
    offs: u32,
    arrival_time: Option<NaiveTime>,
    schedule_time: Option<NaiveTime>,
}

struct TripAccumulator {
    onboard: u32,
    stops: BTreeMap<u32, StopAccumulator>,
}

/// Buckets normalized entries into trips, one [`GroupedRoute`] per pair
/// that has a topology. Every topology pair appears in the result, with an
/// empty trip list if no entry referenced it.
pub fn group_trips(
    entries: &[RideCheckEntry],
    topologies: &TopologySet,
    log: &DiagnosticLog,
) -> BTreeMap<RouteKey, GroupedRoute> {
    let mut grouped: BTreeMap<RouteKey, GroupedRoute> = BTreeMap::new();
    let mut accumulators: BTreeMap<RouteKey, BTreeMap<TripKey, TripAccumulator>> = BTreeMap::new();
    for key in topologies.routes.keys() {
        grouped.insert(*key, GroupedRoute::default());
        accumulators.insert(*key, BTreeMap::new());
    }

    for entry in entries {
        let key = (entry.route, entry.direction);
        let Some(topology) = topologies.get(&key) else {
            log.warning(
                None,
                format!(
                    "Tried to add data to nonexistent route: {} {}",
                    entry.route, entry.direction
                ),
            );
            continue;
        };

        let trips = accumulators.get_mut(&key).expect("initialized above");
        let trip_key = TripKey {
            date: entry.date,
            start_time: entry.start_time,
            run: entry.run.clone(),
        };
        let acc = trips.entry(trip_key).or_insert_with(|| TripAccumulator {
            onboard: entry.onboard,
            stops: BTreeMap::new(),
        });

        // First observed onboard wins for the whole trip.
        if entry.onboard != acc.onboard {
            log.warning(
                None,
                format!(
                    "Route {} {} {} {}: conflicting onboard value {} (keeping {})",
                    entry.route,
                    entry.direction,
                    entry.date,
                    entry.start_time.format("%H:%M"),
                    entry.onboard,
                    acc.onboard
                ),
            );
        }

        if topology.stop_index(entry.stop_number).is_none() {
            log.warning(
                None,
                format!(
                    "Tried to add data to stop {} in route {} {} when stop does not exist",
                    entry.stop_number, entry.route, entry.direction
                ),
            );
            let route = grouped.get_mut(&key).expect("initialized above");
            route.orphan_ons += entry.ons;
            route.orphan_offs += entry.offs;
            continue;
        }

        // Repeated rows for one stop are additive; checkers re-enter a stop
        // to correct a miscount rather than replacing the row.
        let stop = acc.stops.entry(entry.stop_number).or_default();
        stop.ons += entry.ons;
        stop.offs += entry.offs;
        if stop.arrival_time.is_none() {
            stop.arrival_time = entry.arrival_time;
            stop.schedule_time = entry.schedule_time;
        }
    }

    for (key, trips) in accumulators {
        let topology = topologies.get(&key).expect("only topology keys inserted");
        let route = grouped.get_mut(&key).expect("initialized above");
        for (trip_key, acc) in trips {
            let stops = topology
                .stops
                .iter()
                .enumerate()
                .map(|(index, def)| match acc.stops.get(&def.stop_number) {
                    Some(s) => TripStop {
                        stop: index,
                        offs: s.offs,
                        ons: s.ons,
                        load: 0,
                        arrival_time: s.arrival_time,
                        schedule_time: s.schedule_time,
                    },
                    None => TripStop::empty(index),
                })
                .collect();
            route.trips.push(Trip {
                date: trip_key.date,
                route: key.0,
                direction: key.1,
                run: trip_key.run,
                start_time: trip_key.start_time,
                onboard: acc.onboard,
                stops,
                max_load: 0,
            });
        }
    }

    let trip_count: usize = grouped.values().map(|g| g.trips.len()).sum();
    log.general(format!("Grouped ride checks into {trip_count} trips"));

    grouped
}
