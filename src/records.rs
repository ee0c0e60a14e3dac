//! Raw row validation and typing for both input datasets.
//!
//! The two readers at the shell boundary hand over rows of optional strings
//! exactly as they appear in the sheets. This module is the single place
//! where cells become typed values; malformed rows are dropped here with a
//! diagnostic instead of leaking missing-field checks into later stages.

use std::fmt;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::diagnostics::DiagnosticLog;

/// Travel direction of a route, as recorded in both datasets.
///
/// The declaration order is the sort order used for route keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Direction {
    IB,
    OB,
    NB,
    SB,
    EB,
    WB,
}

impl Direction {
    /// Parses the two-letter mnemonic used in the sheets.
    pub fn parse(s: &str) -> Option<Direction> {
        match s.trim() {
            "IB" => Some(Direction::IB),
            "OB" => Some(Direction::OB),
            "NB" => Some(Direction::NB),
            "SB" => Some(Direction::SB),
            "EB" => Some(Direction::EB),
            "WB" => Some(Direction::WB),
            _ => None,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Direction::IB => "IB",
            Direction::OB => "OB",
            Direction::NB => "NB",
            Direction::SB => "SB",
            Direction::EB => "EB",
            Direction::WB => "WB",
        };
        write!(f, "{s}")
    }
}

/// One unvalidated ride-check row. Every field arrives as the cell's text,
/// `None` and `""` both meaning blank. Manual load / time-check columns in
/// the source sheet are not represented; they are recomputed, never read.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawRideCheck {
    pub sequence: Option<String>,
    pub date: Option<String>,
    pub route: Option<String>,
    pub direction: Option<String>,
    pub run: Option<String>,
    pub start_time: Option<String>,
    pub onboard: Option<String>,
    pub stop_number: Option<String>,
    pub arrival_time: Option<String>,
    pub schedule_time: Option<String>,
    pub offs: Option<String>,
    pub ons: Option<String>,
}

/// One unvalidated row of the stop dataset. A row carrying `route` and
/// `direction` is a table header; a row carrying `stop_number` is a stop.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawStopRow {
    pub route: Option<String>,
    pub direction: Option<String>,
    pub project: Option<String>,
    pub street: Option<String>,
    pub cross_street: Option<String>,
    pub stop_number: Option<String>,
    pub timed: Option<String>,
}

/// A fully typed ride-check entry, one per stop visit.
#[derive(Debug, Clone, PartialEq)]
pub struct RideCheckEntry {
    /// Advisory ordering only; never used in calculations.
    pub sequence: u32,
    pub date: NaiveDate,
    pub route: u32,
    pub direction: Direction,
    pub run: String,
    pub start_time: NaiveTime,
    /// Passengers already aboard at the trip's first recorded stop.
    pub onboard: u32,
    pub stop_number: u32,
    pub arrival_time: Option<NaiveTime>,
    pub schedule_time: Option<NaiveTime>,
    pub offs: u32,
    pub ons: u32,
}

/// A typed row of the stop dataset.
#[derive(Debug, Clone, PartialEq)]
pub enum StopRow {
    /// Starts a new table for a (route, direction); the first header of the
    /// dataset may also carry the project name.
    Header {
        route: u32,
        direction: Direction,
        project: Option<String>,
    },
    /// One stop within the current table.
    Stop {
        street: String,
        cross_street: String,
        stop_number: u32,
        timed: bool,
    },
}

fn cell(v: &Option<String>) -> Option<&str> {
    match v.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(s) => Some(s),
    }
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(s, "%m/%d/%Y"))
        .ok()
}

fn parse_time(s: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(s, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M"))
        .ok()
}

/// Blank counts as zero; anything else must be a non-negative integer.
fn parse_count(v: &Option<String>) -> Result<u32, String> {
    match cell(v) {
        None => Ok(0),
        Some(s) => s.parse::<u32>().map_err(|_| s.to_string()),
    }
}

fn parse_flag(v: &Option<String>) -> bool {
    matches!(
        cell(v).map(str::to_ascii_lowercase).as_deref(),
        Some("1" | "true" | "yes" | "y" | "x")
    )
}

/// Validates and types the ride-check dataset.
///
/// Rows that fail validation are dropped with an error; the survivors come
/// back in input order. Row references in diagnostics are 1-based positions
/// in `rows`.
pub fn normalize_ride_checks(rows: &[RawRideCheck], log: &DiagnosticLog) -> Vec<RideCheckEntry> {
    let mut entries = Vec::new();
    let mut prev_sequence: Option<u32> = None;
    let mut total_ons = 0u64;
    let mut total_offs = 0u64;

    for (idx, raw) in rows.iter().enumerate() {
        let row = idx + 1;
        if let Some(entry) = normalize_ride_check(raw, row, &mut prev_sequence, log) {
            total_ons += u64::from(entry.ons);
            total_offs += u64::from(entry.offs);
            entries.push(entry);
        }
    }

    if total_ons != total_offs {
        log.warning(
            None,
            format!(
                "Total ons and offs are not equal ({total_ons} ons, {total_offs} offs). Check for bad data"
            ),
        );
    }

    entries
}

fn normalize_ride_check(
    raw: &RawRideCheck,
    row: usize,
    prev_sequence: &mut Option<u32>,
    log: &DiagnosticLog,
) -> Option<RideCheckEntry> {
    macro_rules! drop_row {
        ($($arg:tt)*) => {{
            log.error(Some(row), format!($($arg)*));
            return None;
        }};
    }

    let sequence = match cell(&raw.sequence) {
        Some(s) => match s.parse::<u32>() {
            Ok(n) => n,
            Err(_) => drop_row!("Sequence '{s}' is not an integer. Skipping row."),
        },
        None => drop_row!("Sequence is blank. Skipping row."),
    };

    // Out-of-order sequence numbers are worth flagging but nothing downstream
    // depends on them.
    if let Some(prev) = *prev_sequence {
        if sequence != prev + 1 {
            log.warning(Some(row), "Out-of-order sequence number".to_string());
        }
    }
    *prev_sequence = Some(sequence);

    let date = match cell(&raw.date) {
        Some(s) => match parse_date(s) {
            Some(d) => d,
            None => drop_row!("Date '{s}' is not a recognized date. Skipping row."),
        },
        None => drop_row!("Date is blank. Skipping row."),
    };

    let route = match cell(&raw.route) {
        Some(s) => match s.parse::<u32>() {
            Ok(n) => n,
            Err(_) => drop_row!("Route '{s}' is not an integer. Skipping row."),
        },
        None => drop_row!("Route is blank. Skipping row."),
    };

    let direction = match cell(&raw.direction) {
        Some(s) => match Direction::parse(s) {
            Some(d) => d,
            None => drop_row!("Direction '{s}' is not a valid input. Skipping row."),
        },
        None => drop_row!("Direction is blank. Skipping row."),
    };

    let run = cell(&raw.run).unwrap_or("").to_string();

    let start_time = match cell(&raw.start_time) {
        Some(s) => match parse_time(s) {
            Some(t) => t,
            None => drop_row!("Start time '{s}' is not a recognized time. Skipping row."),
        },
        None => drop_row!("Start time is blank. Skipping row."),
    };

    let onboard = match parse_count(&raw.onboard) {
        Ok(n) => n,
        Err(s) => drop_row!("Onboard '{s}' is not a non-negative integer. Skipping row."),
    };

    let stop_number = match cell(&raw.stop_number) {
        Some(s) => match s.parse::<u32>() {
            Ok(n) => n,
            Err(_) => drop_row!("Stop number '{s}' is not an integer. Skipping row."),
        },
        None => drop_row!("Stop number is blank. Skipping row."),
    };

    let mut arrival_time = match cell(&raw.arrival_time) {
        Some(s) => match parse_time(s) {
            Some(t) => Some(t),
            None => drop_row!("Arrival time '{s}' is not a recognized time. Skipping row."),
        },
        None => None,
    };
    let mut schedule_time = match cell(&raw.schedule_time) {
        Some(s) => match parse_time(s) {
            Some(t) => Some(t),
            None => drop_row!("Scheduled time '{s}' is not a recognized time. Skipping row."),
        },
        None => None,
    };

    // The pair is only meaningful together; a half-filled pair is treated as
    // absent so on-time cells stay blank instead of guessing.
    if arrival_time.is_some() != schedule_time.is_some() {
        log.warning(
            Some(row),
            "Arrival time and schedule time must be filled in together; ignoring both",
        );
        arrival_time = None;
        schedule_time = None;
    }

    let offs = match parse_count(&raw.offs) {
        Ok(n) => n,
        Err(s) => drop_row!("Offs value '{s}' is not a non-negative integer. Skipping row."),
    };
    let ons = match parse_count(&raw.ons) {
        Ok(n) => n,
        Err(s) => drop_row!("Ons value '{s}' is not a non-negative integer. Skipping row."),
    };

    Some(RideCheckEntry {
        sequence,
        date,
        route,
        direction,
        run,
        start_time,
        onboard,
        stop_number,
        arrival_time,
        schedule_time,
        offs,
        ons,
    })
}

/// Validates and types the stop dataset.
///
/// Rows that are neither a table header nor a stop are skipped silently;
/// sheets tend to carry decorative rows between tables.
pub fn normalize_stop_rows(rows: &[RawStopRow], log: &DiagnosticLog) -> Vec<StopRow> {
    let mut out = Vec::new();

    for (idx, raw) in rows.iter().enumerate() {
        let row = idx + 1;

        if let (Some(route), Some(direction)) = (cell(&raw.route), cell(&raw.direction)) {
            let route = match route.parse::<u32>() {
                Ok(n) => n,
                Err(_) => {
                    log.error(
                        Some(row),
                        format!("Route '{route}' is not an integer. Skipping table header."),
                    );
                    continue;
                }
            };
            let direction = match Direction::parse(direction) {
                Some(d) => d,
                None => {
                    log.error(
                        Some(row),
                        format!("Direction '{direction}' is not a valid input. Skipping table header."),
                    );
                    continue;
                }
            };
            out.push(StopRow::Header {
                route,
                direction,
                project: cell(&raw.project).map(str::to_string),
            });
            continue;
        }

        match cell(&raw.stop_number) {
            Some(s) => match s.parse::<u32>() {
                Ok(stop_number) => out.push(StopRow::Stop {
                    street: cell(&raw.street).unwrap_or("").to_string(),
                    cross_street: cell(&raw.cross_street).unwrap_or("").to_string(),
                    stop_number,
                    timed: parse_flag(&raw.timed),
                }),
                Err(_) => {
                    log.error(
                        Some(row),
                        format!("Stop number '{s}' is not an integer. Skipping row."),
                    );
                }
            },
            None => {} // decorative row
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(fields: &[(&str, &str)]) -> RawRideCheck {
        let mut r = RawRideCheck::default();
        for (k, v) in fields {
            let v = Some(v.to_string());
            match *k {
                "sequence" => r.sequence = v,
                "date" => r.date = v,
                "route" => r.route = v,
                "direction" => r.direction = v,
                "run" => r.run = v,
                "start_time" => r.start_time = v,
                "onboard" => r.onboard = v,
                "stop_number" => r.stop_number = v,
                "arrival_time" => r.arrival_time = v,
                "schedule_time" => r.schedule_time = v,
                "offs" => r.offs = v,
                "ons" => r.ons = v,
                other => panic!("unknown field {other}"),
            }
        }
        r
    }

    fn valid_raw(seq: &str) -> RawRideCheck {
        raw(&[
            ("sequence", seq),
            ("date", "2022-03-14"),
            ("route", "1"),
            ("direction", "OB"),
            ("run", "A"),
            ("start_time", "08:00"),
            ("stop_number", "1"),
            ("ons", "5"),
            ("offs", "5"),
        ])
    }

    #[test]
    fn test_direction_parse() {
        assert_eq!(Direction::parse("OB"), Some(Direction::OB));
        assert_eq!(Direction::parse(" NB "), Some(Direction::NB));
        assert_eq!(Direction::parse("XX"), None);
        assert_eq!(Direction::parse(""), None);
    }

    #[test]
    fn test_valid_row_normalizes() {
        let log = DiagnosticLog::new();
        let entries = normalize_ride_checks(&[valid_raw("1")], &log);

        assert_eq!(entries.len(), 1);
        let e = &entries[0];
        assert_eq!(e.route, 1);
        assert_eq!(e.direction, Direction::OB);
        assert_eq!(e.start_time, NaiveTime::from_hms_opt(8, 0, 0).unwrap());
        assert_eq!(e.onboard, 0);
        assert_eq!(e.ons, 5);
        assert_eq!(log.error_count(), 0);
    }

    #[test]
    fn test_bad_date_drops_row() {
        let log = DiagnosticLog::new();
        let mut bad = valid_raw("1");
        bad.date = Some("yesterday".to_string());
        let entries = normalize_ride_checks(&[bad], &log);

        assert!(entries.is_empty());
        assert_eq!(log.error_count(), 1);
        assert_eq!(log.entries()[0].row, Some(1));
    }

    #[test]
    fn test_bad_direction_drops_row() {
        let log = DiagnosticLog::new();
        let mut bad = valid_raw("1");
        bad.direction = Some("LOOP".to_string());
        let entries = normalize_ride_checks(&[bad], &log);

        assert!(entries.is_empty());
        assert_eq!(log.error_count(), 1);
    }

    #[test]
    fn test_blank_counts_coerce_to_zero() {
        let log = DiagnosticLog::new();
        let mut r = valid_raw("1");
        r.ons = None;
        r.offs = Some("".to_string());
        let entries = normalize_ride_checks(&[r], &log);

        assert_eq!(entries[0].ons, 0);
        assert_eq!(entries[0].offs, 0);
    }

    #[test]
    fn test_half_filled_time_pair_warns_and_blanks_both() {
        let log = DiagnosticLog::new();
        let mut r = valid_raw("1");
        r.arrival_time = Some("08:07".to_string());
        let entries = normalize_ride_checks(&[r], &log);

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].arrival_time, None);
        assert_eq!(entries[0].schedule_time, None);
        assert_eq!(log.warning_count(), 1);
    }

    #[test]
    fn test_out_of_order_sequence_warns() {
        let log = DiagnosticLog::new();
        let entries = normalize_ride_checks(&[valid_raw("1"), valid_raw("5")], &log);

        assert_eq!(entries.len(), 2);
        assert_eq!(log.warning_count(), 1);
        assert_eq!(log.entries()[0].row, Some(2));
    }

    #[test]
    fn test_unbalanced_ons_offs_warns() {
        let log = DiagnosticLog::new();
        let mut r = valid_raw("1");
        r.offs = Some("2".to_string());
        normalize_ride_checks(&[r], &log);

        let warnings: Vec<_> = log
            .entries()
            .into_iter()
            .filter(|d| d.severity == crate::diagnostics::Severity::Warning)
            .collect();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].message.contains("5 ons"));
        assert!(warnings[0].message.contains("2 offs"));
    }

    #[test]
    fn test_stop_rows_header_and_stop() {
        let log = DiagnosticLog::new();
        let rows = vec![
            RawStopRow {
                route: Some("1".to_string()),
                direction: Some("OB".to_string()),
                project: Some("University".to_string()),
                ..Default::default()
            },
            RawStopRow {
                street: Some("Main St".to_string()),
                cross_street: Some("1st Ave".to_string()),
                stop_number: Some("1".to_string()),
                timed: Some("yes".to_string()),
                ..Default::default()
            },
            // decorative spacer
            RawStopRow::default(),
        ];
        let normalized = normalize_stop_rows(&rows, &log);

        assert_eq!(normalized.len(), 2);
        assert_eq!(
            normalized[0],
            StopRow::Header {
                route: 1,
                direction: Direction::OB,
                project: Some("University".to_string()),
            }
        );
        assert_eq!(
            normalized[1],
            StopRow::Stop {
                street: "Main St".to_string(),
                cross_street: "1st Ave".to_string(),
                stop_number: 1,
                timed: true,
            }
        );
        assert_eq!(log.error_count(), 0);
    }

    #[test]
    fn test_stop_row_bad_stop_number_errors() {
        let log = DiagnosticLog::new();
        let rows = vec![RawStopRow {
            stop_number: Some("abc".to_string()),
            ..Default::default()
        }];
        let normalized = normalize_stop_rows(&rows, &log);

        assert!(normalized.is_empty());
        assert_eq!(log.error_count(), 1);
    }
}
