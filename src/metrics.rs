//! Load computation and per-route accumulation.
//!
//! Consumes the grouped trips, walks each trip's stops once in topology
//! order to compute cumulative loads and the per-trip maximum, then fills
//! the per-pair accumulators every view reads. The result is the
//! [`ReconciledModel`], the sole input of the view builders.

use std::collections::BTreeMap;

use crate::diagnostics::DiagnosticLog;
use crate::topology::{RouteKey, RouteTopology, TopologySet};
use crate::trips::{GroupedRoute, Trip};

/// Accumulated activity at one topology stop across all trips of a pair.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StopTotals {
    pub ons: u32,
    pub offs: u32,
    pub total: u32,
    /// Sum of post-stop cumulative loads across trips.
    pub load: u32,
}

/// All reconciled data for one (route, direction).
#[derive(Debug, Clone, PartialEq)]
pub struct RouteTrips {
    /// Sorted by date, then start time, then run.
    pub trips: Vec<Trip>,
    /// Ons/offs from rows whose stop number is not in the topology. Kept
    /// out of `stop_totals` but included in `total_ons`/`total_offs`.
    pub orphan_ons: u32,
    pub orphan_offs: u32,
    /// Route totals computed from every member row, orphans included.
    pub total_ons: u32,
    pub total_offs: u32,
    /// Sum of onboard carryover across trips.
    pub onboard_total: u32,
    /// Parallel to the topology's stop list.
    pub stop_totals: Vec<StopTotals>,
}

/// The immutable output of the normalization, topology, grouping, and
/// metrics stages; everything the five views need.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconciledModel {
    pub topologies: TopologySet,
    pub routes: BTreeMap<RouteKey, RouteTrips>,
}

impl ReconciledModel {
    /// Pairs in key order, with topology and reconciled data side by side.
    pub fn pairs(&self) -> impl Iterator<Item = (&RouteTopology, &RouteTrips)> {
        self.routes
            .iter()
            .map(|(key, route)| (&self.topologies.routes[key], route))
    }
}

/// Computes loads and accumulators, consuming the grouped trips.
pub fn finalize(
    topologies: TopologySet,
    grouped: BTreeMap<RouteKey, GroupedRoute>,
    log: &DiagnosticLog,
) -> ReconciledModel {
    log.general("Building load data");

    let mut routes = BTreeMap::new();
    for (key, group) in grouped {
        let topology = &topologies.routes[&key];
        routes.insert(key, finalize_route(topology, group, log));
    }

    ReconciledModel { topologies, routes }
}

fn finalize_route(
    topology: &RouteTopology,
    group: GroupedRoute,
    log: &DiagnosticLog,
) -> RouteTrips {
    let GroupedRoute {
        mut trips,
        orphan_ons,
        orphan_offs,
    } = group;

    let mut stop_totals = vec![StopTotals::default(); topology.stops.len()];
    let mut total_ons = orphan_ons;
    let mut total_offs = orphan_offs;
    let mut onboard_total = 0u32;

    for trip in &mut trips {
        compute_loads(trip, topology, log);
        onboard_total += trip.onboard;
        for trip_stop in &trip.stops {
            let totals = &mut stop_totals[trip_stop.stop];
            totals.ons += trip_stop.ons;
            totals.offs += trip_stop.offs;
            totals.total += trip_stop.ons + trip_stop.offs;
            totals.load += trip_stop.load;
            total_ons += trip_stop.ons;
            total_offs += trip_stop.offs;
        }
    }

    RouteTrips {
        trips,
        orphan_ons,
        orphan_offs,
        total_ons,
        total_offs,
        onboard_total,
        stop_totals,
    }
}

/// One walk over the trip's stops: `load = onboard`, then
/// `load = load + ons - offs` at each stop, clamped at zero.
fn compute_loads(trip: &mut Trip, topology: &RouteTopology, log: &DiagnosticLog) {
    let mut load = i64::from(trip.onboard);
    let mut max_load = 0u32;

    for trip_stop in &mut trip.stops {
        load += i64::from(trip_stop.ons);
        load -= i64::from(trip_stop.offs);
        if load < 0 {
            log.warning(
                None,
                format!(
                    "Route {} {} {} {} stop {}: The load has dropped below 0 (check for bad data)",
                    trip.route,
                    trip.direction,
                    trip.date,
                    trip.start_time.format("%H:%M"),
                    topology.stops[trip_stop.stop].stop_number
                ),
            );
            load = 0;
        }
        trip_stop.load = load as u32;
        max_load = max_load.max(trip_stop.load);
    }

    trip.max_load = max_load;
}
