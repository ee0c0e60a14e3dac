//! Route Totals view: one row of ons/offs per (route, direction).

use serde::Serialize;

use crate::metrics::ReconciledModel;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteTotalsRow {
    pub route: u32,
    pub label: String,
    pub ons: u32,
    pub offs: u32,
    pub total: u32,
}

/// One row per pair, sorted by route then direction. Ons/offs are the
/// route-level totals, so rows referencing unknown stops still count here.
pub fn build(model: &ReconciledModel) -> Vec<RouteTotalsRow> {
    model
        .pairs()
        .map(|(topology, route)| RouteTotalsRow {
            route: topology.route,
            label: topology.label(),
            ons: route.total_ons,
            offs: route.total_offs,
            total: route.total_ons + route.total_offs,
        })
        .collect()
}
