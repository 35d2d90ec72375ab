//! CSV export for evaluation telemetry and training progress.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::agent::{EpisodeRecord, StepTelemetry};
use crate::error::Result;

/// Column header for step telemetry export.
const TELEMETRY_HEADER: &str = "episode,step,interval,voltage_pu,p_pu,q_pu,kvar_setpoint,\
                                reward,nameplate,standard,voltage_term,served_kw,terminated";

/// Column header for training progress export.
const PROGRESS_HEADER: &str = "episode,timesteps,reward,length,epsilon,\
                               voltage_violations,q_violations,loop_rejections";

/// Exports evaluation step telemetry to a CSV file at the given path.
///
/// Produces deterministic output for identical inputs. Quantities an
/// environment does not measure are written as empty cells.
///
/// # Errors
///
/// Returns `Error::Io` if the file cannot be created and `Error::Csv` if
/// writing fails.
pub fn export_telemetry_csv(rows: &[StepTelemetry], path: &Path) -> Result<()> {
    let file = File::create(path)?;
    write_telemetry_csv(rows, io::BufWriter::new(file))
}

/// Writes evaluation step telemetry as CSV to any writer.
///
/// # Errors
///
/// Returns `Error::Csv` or `Error::Io` if writing fails.
pub fn write_telemetry_csv(rows: &[StepTelemetry], writer: impl Write) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record(TELEMETRY_HEADER.split(',').map(str::trim))?;

    for r in rows {
        wtr.write_record(&[
            r.episode.to_string(),
            r.step.to_string(),
            r.interval.map(|i| i.to_string()).unwrap_or_default(),
            cell(r.voltage_pu, 6),
            cell(r.p_pu, 5),
            cell(r.q_pu, 5),
            cell(r.kvar_setpoint, 4),
            format!("{:.6}", r.reward),
            cell(r.nameplate, 6),
            cell(r.standard, 6),
            cell(r.voltage_term, 6),
            cell(r.served_kw, 3),
            r.terminated.to_string(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

/// Exports one row per completed training episode.
///
/// # Errors
///
/// Returns `Error::Io` if the file cannot be created and `Error::Csv` if
/// writing fails.
pub fn export_progress_csv(episodes: &[EpisodeRecord], path: &Path) -> Result<()> {
    let file = File::create(path)?;
    write_progress_csv(episodes, io::BufWriter::new(file))
}

/// Writes training progress as CSV to any writer.
///
/// # Errors
///
/// Returns `Error::Csv` or `Error::Io` if writing fails.
pub fn write_progress_csv(episodes: &[EpisodeRecord], writer: impl Write) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record(PROGRESS_HEADER.split(',').map(str::trim))?;

    for e in episodes {
        wtr.write_record(&[
            e.episode.to_string(),
            e.timesteps.to_string(),
            format!("{:.6}", e.kpi.reward),
            e.kpi.length.to_string(),
            format!("{:.4}", e.epsilon),
            e.kpi.voltage_violations.to_string(),
            e.kpi.q_violations.to_string(),
            e.kpi.loop_rejections.to_string(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

fn cell(value: Option<f64>, precision: usize) -> String {
    value.map(|v| format!("{v:.precision$}")).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::EpisodeKpi;

    fn make_row(step: usize) -> StepTelemetry {
        StepTelemetry {
            episode: 1,
            step,
            interval: Some(step - 1),
            voltage_pu: Some(1.012),
            p_pu: Some(0.45),
            q_pu: Some(-0.1),
            kvar_setpoint: Some(-55.0),
            reward: -0.000144,
            nameplate: Some(0.0),
            standard: Some(0.0),
            voltage_term: Some(-0.000144),
            served_kw: None,
            terminated: step == 4,
        }
    }

    fn make_episode(n: usize) -> EpisodeRecord {
        EpisodeRecord {
            episode: n,
            timesteps: n * 5,
            epsilon: 0.5,
            kpi: EpisodeKpi {
                reward: 3.2,
                length: 5,
                loop_rejections: 1,
                ..EpisodeKpi::default()
            },
        }
    }

    fn to_string(f: impl FnOnce(&mut Vec<u8>)) -> String {
        let mut buf = Vec::new();
        f(&mut buf);
        String::from_utf8(buf).unwrap_or_default()
    }

    #[test]
    fn telemetry_header_and_rows() {
        let rows: Vec<StepTelemetry> = (1..=4).map(make_row).collect();
        let out = to_string(|buf| write_telemetry_csv(&rows, buf).unwrap());
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(
            lines[0],
            "episode,step,interval,voltage_pu,p_pu,q_pu,kvar_setpoint,\
             reward,nameplate,standard,voltage_term,served_kw,terminated"
        );
        assert_eq!(lines.len(), 5);
        assert_eq!(
            lines[1],
            "1,1,0,1.012000,0.45000,-0.10000,-55.0000,-0.000144,0.000000,0.000000,-0.000144,,false"
        );
        assert!(lines[4].ends_with(",true"));
    }

    #[test]
    fn progress_rows_parse() {
        let episodes: Vec<EpisodeRecord> = (1..=3).map(make_episode).collect();
        let out = to_string(|buf| write_progress_csv(&episodes, buf).unwrap());

        let mut rdr = csv::ReaderBuilder::new().from_reader(out.as_bytes());
        assert_eq!(rdr.headers().map(csv::StringRecord::len).ok(), Some(8));
        let records: Vec<csv::StringRecord> = rdr.records().filter_map(|r| r.ok()).collect();
        assert_eq!(records.len(), 3);
        assert_eq!(&records[2][1], "15");
        assert_eq!(records[0][2].parse::<f64>().ok(), Some(3.2));
        assert_eq!(&records[0][7], "1");
    }

    #[test]
    fn deterministic_output() {
        let rows: Vec<StepTelemetry> = (1..=4).map(make_row).collect();
        let a = to_string(|buf| write_telemetry_csv(&rows, buf).unwrap());
        let b = to_string(|buf| write_telemetry_csv(&rows, buf).unwrap());
        assert_eq!(a, b);
    }

    #[test]
    fn export_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("progress.csv");
        export_progress_csv(&[make_episode(1)], &path).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 2);
    }
}
