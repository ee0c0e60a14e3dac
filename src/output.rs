//! Rendering of the five views and the diagnostics log.
//!
//! The engine only produces ordered row-sets; this module turns them into
//! CSV files (one per view), a JSON dump of the whole report, and a plain
//! text log. Sheet-level presentation (column widths, highlighting) stays
//! with downstream consumers.

use std::fs;
use std::path::Path;

use anyhow::Result;
use csv::WriterBuilder;
use tracing::debug;

use crate::diagnostics::Diagnostic;
use crate::engine::SummaryReport;
use crate::summaries::{DetailBlock, OnTimeBlock};

/// Writes all five views under `dir`, creating it if needed.
pub fn write_report(dir: impl AsRef<Path>, report: &SummaryReport) -> Result<()> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir)?;
    debug!(?dir, "Writing report");

    serialize_rows(&dir.join("route_totals.csv"), &report.route_totals)?;
    serialize_rows(&dir.join("max_load.csv"), &report.max_loads)?;
    serialize_rows(&dir.join("ons_offs_total_load.csv"), &report.stop_totals)?;
    write_on_time(&dir.join("on_time_detail.csv"), &report.on_time)?;
    write_detail(&dir.join("detail_report.csv"), &report.detail)?;

    Ok(())
}

/// Writes the whole report as pretty-printed JSON.
pub fn write_json_report(path: impl AsRef<Path>, report: &SummaryReport) -> Result<()> {
    fs::write(path, serde_json::to_string_pretty(report)?)?;
    Ok(())
}

/// Writes the drained diagnostics as one line per record.
pub fn write_log(path: impl AsRef<Path>, entries: &[Diagnostic]) -> Result<()> {
    let mut lines: String = entries
        .iter()
        .map(|d| d.to_string())
        .collect::<Vec<_>>()
        .join("\n");
    lines.push('\n');
    fs::write(path, lines)?;
    Ok(())
}

/// Fixed-schema views serialize straight off their row structs; the struct
/// field names become the header line.
fn serialize_rows<S: serde::Serialize>(path: &Path, rows: &[S]) -> Result<()> {
    let mut writer = WriterBuilder::new().from_path(path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// On-time blocks have one column per timed stop, so widths vary per block.
fn write_on_time(path: &Path, blocks: &[OnTimeBlock]) -> Result<()> {
    let mut writer = WriterBuilder::new().flexible(true).from_path(path)?;

    for block in blocks {
        let mut header = vec![
            "Route #".to_string(),
            "Route Name".to_string(),
            "Date".to_string(),
            "Time".to_string(),
            "Run".to_string(),
        ];
        let mut cross = vec![String::new(); 5];
        for column in &block.columns {
            header.push(column.street.clone());
            cross.push(column.cross_street.clone());
        }
        writer.write_record(&header)?;
        writer.write_record(&cross)?;

        for row in &block.rows {
            let mut record = vec![
                block.route.to_string(),
                block.label.clone(),
                row.date.to_string(),
                row.start_time.format("%H:%M").to_string(),
                row.run.clone(),
            ];
            for cell in &row.minutes_late {
                record.push(cell.map(|m| m.to_string()).unwrap_or_default());
            }
            writer.write_record(&record)?;
        }
        writer.write_record([""])?;
    }

    writer.flush()?;
    Ok(())
}

/// Detail blocks are stop-by-trip matrices; each trip expands to three
/// subcolumns (On, Off, Load).
fn write_detail(path: &Path, blocks: &[DetailBlock]) -> Result<()> {
    let mut writer = WriterBuilder::new().flexible(true).from_path(path)?;

    for block in blocks {
        writer.write_record([block.project.as_str()])?;
        writer.write_record([format!("Route #{}", block.route), block.label.clone()])?;

        let mut dates = vec![String::new(); 3];
        let mut subheads = vec![
            "Stop".to_string(),
            "Street".to_string(),
            "Cross Street".to_string(),
        ];
        let mut onboard = vec![String::new(), String::new(), "Onboard".to_string()];
        for column in &block.columns {
            dates.push(format!(
                "{} {} run {}",
                column.date,
                column.start_time.format("%H:%M"),
                column.run
            ));
            dates.push(String::new());
            dates.push(String::new());
            subheads.push("On".to_string());
            subheads.push("Off".to_string());
            subheads.push("Load".to_string());
            onboard.push(String::new());
            onboard.push(String::new());
            onboard.push(column.onboard.to_string());
        }
        writer.write_record(&dates)?;
        writer.write_record(&subheads)?;
        writer.write_record(&onboard)?;

        for row in &block.rows {
            let mut record = vec![
                row.stop_number.to_string(),
                row.street.clone(),
                row.cross_street.clone(),
            ];
            for cell in &row.cells {
                record.push(cell.ons.to_string());
                record.push(cell.offs.to_string());
                record.push(cell.load.to_string());
            }
            writer.write_record(&record)?;
        }

        let mut totals = vec![String::new(), String::new(), "Totals".to_string()];
        for column in &block.totals {
            totals.push(column.ons.to_string());
            totals.push(column.offs.to_string());
            totals.push(String::new());
        }
        writer.write_record(&totals)?;
        writer.write_record([""])?;
    }

    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    use crate::diagnostics::DiagnosticLog;
    use crate::engine::generate_summary;
    use crate::records::{RawRideCheck, RawStopRow};

    fn temp_dir(name: &str) -> std::path::PathBuf {
        env::temp_dir().join(format!("route_summaries_{name}"))
    }

    fn sample_report() -> SummaryReport {
        let log = DiagnosticLog::new();
        let stop_sheet = vec![
            RawStopRow {
                route: Some("1".to_string()),
                direction: Some("OB".to_string()),
                project: Some("University".to_string()),
                ..Default::default()
            },
            RawStopRow {
                street: Some("Main".to_string()),
                cross_street: Some("First".to_string()),
                stop_number: Some("1".to_string()),
                timed: Some("1".to_string()),
                ..Default::default()
            },
        ];
        let ride = RawRideCheck {
            sequence: Some("1".to_string()),
            date: Some("2022-03-14".to_string()),
            route: Some("1".to_string()),
            direction: Some("OB".to_string()),
            run: Some("A".to_string()),
            start_time: Some("08:00".to_string()),
            stop_number: Some("1".to_string()),
            arrival_time: Some("08:07".to_string()),
            schedule_time: Some("08:05".to_string()),
            ons: Some("4".to_string()),
            offs: Some("4".to_string()),
            ..Default::default()
        };
        generate_summary(&[ride], &[stop_sheet], &log).unwrap()
    }

    #[test]
    fn test_write_report_creates_all_views() {
        let dir = temp_dir("all_views");
        let _ = fs::remove_dir_all(&dir);

        write_report(&dir, &sample_report()).unwrap();

        for name in [
            "route_totals.csv",
            "max_load.csv",
            "ons_offs_total_load.csv",
            "on_time_detail.csv",
            "detail_report.csv",
        ] {
            assert!(dir.join(name).exists(), "{name} missing");
        }

        let totals = fs::read_to_string(dir.join("route_totals.csv")).unwrap();
        let mut lines = totals.lines();
        assert_eq!(lines.next(), Some("route,label,ons,offs,total"));
        assert_eq!(lines.next(), Some("1,University OB,4,4,8"));

        let on_time = fs::read_to_string(dir.join("on_time_detail.csv")).unwrap();
        assert!(on_time.contains("Main"));
        assert!(on_time.lines().any(|l| l.ends_with(",2")));

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_write_log_one_line_per_entry() {
        let dir = temp_dir("log");
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();

        let log = DiagnosticLog::new();
        log.general("Output document created");
        log.warning(Some(2), "odd row");
        let path = dir.join("log.txt");
        write_log(&path, &log.entries()).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("[General]"));
        assert!(lines[1].contains("Row 2"));

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_write_json_report_round_trips_as_json() {
        let dir = temp_dir("json");
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();

        let path = dir.join("report.json");
        write_json_report(&path, &sample_report()).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["route_totals"][0]["route"], 1);
        assert_eq!(value["on_time"][0]["rows"][0]["minutes_late"][0], 2);

        fs::remove_dir_all(&dir).unwrap();
    }
}
