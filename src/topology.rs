//! Canonical stop order per route and direction.
//!
//! The stop dataset arrives as a flat scan of table headers and stop rows.
//! This module folds that scan into one [`RouteTopology`] per
//! (route, direction) pair and pulls the project name out of the first
//! header that carries one.

use std::collections::BTreeMap;

use anyhow::{Result, bail};
use serde::Serialize;

use crate::diagnostics::DiagnosticLog;
use crate::records::{Direction, StopRow};

/// Key of every per-route-direction collection in the engine.
pub type RouteKey = (u32, Direction);

/// One stop on a route, in canonical topology order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StopDefinition {
    pub route: u32,
    pub direction: Direction,
    pub street: String,
    pub cross_street: String,
    /// Unique within a (route, direction) topology; defines stop order.
    pub stop_number: u32,
    /// Carries a published schedule time, used for on-time measurement.
    pub timed: bool,
}

/// The ordered, canonical stop list for one (route, direction).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteTopology {
    pub route: u32,
    pub direction: Direction,
    /// Shared across all topologies of a run; scraped from the first table
    /// header of the stop dataset.
    pub project: String,
    /// Sorted ascending by stop number.
    pub stops: Vec<StopDefinition>,
}

impl RouteTopology {
    /// Label used by every view, e.g. "University OB".
    pub fn label(&self) -> String {
        format!("{} {}", self.project, self.direction)
    }

    /// Position of a stop number in topology order, if the stop exists.
    pub fn stop_index(&self, stop_number: u32) -> Option<usize> {
        self.stops
            .iter()
            .position(|s| s.stop_number == stop_number)
    }

    /// Timed stops with their topology positions, in topology order.
    pub fn timed_stops(&self) -> Vec<(usize, &StopDefinition)> {
        self.stops
            .iter()
            .enumerate()
            .filter(|(_, s)| s.timed)
            .collect()
    }
}

/// All topologies of a run plus the shared project name.
#[derive(Debug, Clone, PartialEq)]
pub struct TopologySet {
    pub project: String,
    pub routes: BTreeMap<RouteKey, RouteTopology>,
}

impl TopologySet {
    pub fn get(&self, key: &RouteKey) -> Option<&RouteTopology> {
        self.routes.get(key)
    }
}

/// Folds normalized stop rows, grouped by sheet, into one topology per
/// distinct (route, direction).
///
/// Duplicate stop numbers within a pair keep the first occurrence with a
/// warning. A dataset with no table headers at all is a structural error.
pub fn build_topologies(sheets: &[Vec<StopRow>], log: &DiagnosticLog) -> Result<TopologySet> {
    let mut stops_per_key: BTreeMap<RouteKey, Vec<StopDefinition>> = BTreeMap::new();
    let mut project: Option<String> = None;

    for sheet in sheets {
        // The current table carries forward until the next header; rows
        // before any header on a sheet belong to no table and are skipped.
        let mut current: Option<RouteKey> = None;

        for stop_row in sheet {
            match stop_row {
                StopRow::Header {
                    route,
                    direction,
                    project: header_project,
                } => {
                    current = Some((*route, *direction));
                    stops_per_key.entry((*route, *direction)).or_default();
                    if project.is_none() {
                        project = header_project.clone();
                    }
                }
                StopRow::Stop {
                    street,
                    cross_street,
                    stop_number,
                    timed,
                } => {
                    let Some((route, direction)) = current else {
                        continue;
                    };
                    let stops = stops_per_key.entry((route, direction)).or_default();
                    if stops.iter().any(|s| s.stop_number == *stop_number) {
                        log.warning(
                            None,
                            format!(
                                "Tried to add stop {stop_number} to route {route} {direction} when it already exists"
                            ),
                        );
                        continue;
                    }
                    stops.push(StopDefinition {
                        route,
                        direction,
                        street: street.clone(),
                        cross_street: cross_street.clone(),
                        stop_number: *stop_number,
                        timed: *timed,
                    });
                }
            }
        }
    }

    if stops_per_key.is_empty() {
        bail!("the stop dataset contains no route tables");
    }

    let project = match project {
        Some(p) => p,
        None => {
            log.warning(None, "No project name found in the stop dataset");
            String::new()
        }
    };

    let mut routes = BTreeMap::new();
    for ((route, direction), mut stops) in stops_per_key {
        stops.sort_by_key(|s| s.stop_number);
        routes.insert(
            (route, direction),
            RouteTopology {
                route,
                direction,
                project: project.clone(),
                stops,
            },
        );
    }

    log.general(format!("Built {} route topologies", routes.len()));

    Ok(TopologySet { project, routes })
}
