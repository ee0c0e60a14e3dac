//! Ons/Offs/Total/Load view: per-stop accumulations for each pair, framed
//! by an ONBOARD row and a TOTAL row.

use serde::Serialize;

use crate::metrics::ReconciledModel;

/// What a [`StopTotalsRow`] represents within its pair's block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum StopTotalsKind {
    /// Leading row carrying the pair's onboard carryover sum in `load`.
    Onboard,
    Stop,
    /// Trailing row summing the four numeric columns over the stop rows.
    Total,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StopTotalsRow {
    pub route: u32,
    pub label: String,
    pub kind: StopTotalsKind,
    pub stop_number: Option<u32>,
    pub street: Option<String>,
    pub cross_street: Option<String>,
    pub ons: Option<u32>,
    pub offs: Option<u32>,
    pub total: Option<u32>,
    pub load: Option<u32>,
    /// Timed stops are flagged for downstream highlighting.
    pub timed: bool,
}

impl StopTotalsRow {
    fn marker(route: u32, label: String, kind: StopTotalsKind) -> Self {
        StopTotalsRow {
            route,
            label,
            kind,
            stop_number: None,
            street: None,
            cross_street: None,
            ons: None,
            offs: None,
            total: None,
            load: None,
            timed: false,
        }
    }
}

/// Per pair: an ONBOARD row, one row per topology stop, and a TOTAL row.
pub fn build(model: &ReconciledModel) -> Vec<StopTotalsRow> {
    let mut rows = Vec::new();
    for (topology, route) in model.pairs() {
        let label = topology.label();

        let mut onboard = StopTotalsRow::marker(topology.route, label.clone(), StopTotalsKind::Onboard);
        onboard.load = Some(route.onboard_total);
        rows.push(onboard);

        let mut sum = [0u32; 4];
        for (def, totals) in topology.stops.iter().zip(&route.stop_totals) {
            sum[0] += totals.ons;
            sum[1] += totals.offs;
            sum[2] += totals.total;
            sum[3] += totals.load;
            rows.push(StopTotalsRow {
                route: topology.route,
                label: label.clone(),
                kind: StopTotalsKind::Stop,
                stop_number: Some(def.stop_number),
                street: Some(def.street.clone()),
                cross_street: Some(def.cross_street.clone()),
                ons: Some(totals.ons),
                offs: Some(totals.offs),
                total: Some(totals.total),
                load: Some(totals.load),
                timed: def.timed,
            });
        }

        let mut total = StopTotalsRow::marker(topology.route, label, StopTotalsKind::Total);
        total.ons = Some(sum[0]);
        total.offs = Some(sum[1]);
        total.total = Some(sum[2]);
        total.load = Some(sum[3]);
        rows.push(total);
    }
    rows
}
