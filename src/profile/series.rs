use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime, TimeDelta};

use crate::error::{Error, Result};

/// Accepted timestamp layouts, tried in order.
///
/// Two-digit years come before four-digit ones so `01/01/06` is not read
/// as year 6.
const TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%m/%d/%y %H:%M",
    "%m/%d/%Y %H:%M",
];

/// An ordered series of timestamped values.
///
/// Series loaded from disk may be irregular; [`TimeSeries::resample`]
/// puts them on a fixed grid. Once built for a run a series is only read.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    name: String,
    timestamps: Vec<NaiveDateTime>,
    values: Vec<f64>,
}

impl TimeSeries {
    /// Builds a regular series from raw values.
    ///
    /// # Errors
    ///
    /// Returns `Error::Profile` when `values` is empty or `interval_minutes` is zero.
    pub fn from_values(
        name: impl Into<String>,
        start: NaiveDateTime,
        interval_minutes: u32,
        values: Vec<f64>,
    ) -> Result<Self> {
        let name = name.into();
        if values.is_empty() {
            return Err(Error::profile(name, "series has no samples"));
        }
        if interval_minutes == 0 {
            return Err(Error::profile(name, "interval must be > 0 minutes"));
        }
        let step = TimeDelta::minutes(i64::from(interval_minutes));
        let timestamps = (0..values.len())
            .map(|i| start + step * i as i32)
            .collect();
        Ok(Self {
            name,
            timestamps,
            values,
        })
    }

    /// A one-sample series; with wrapping lookups it is constant.
    pub fn constant(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            timestamps: vec![NaiveDateTime::default()],
            values: vec![value],
        }
    }

    /// Reads one value column of a CSV file keyed by a timestamp column.
    ///
    /// # Errors
    ///
    /// Returns `Error::ReadFile` if the file cannot be opened, otherwise
    /// the errors of [`TimeSeries::from_csv_reader`].
    pub fn from_csv_path(path: &Path, timestamp_column: &str, value_column: &str) -> Result<Self> {
        let file = File::open(path).map_err(|source| Error::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_csv_reader(
            path.display().to_string(),
            file,
            timestamp_column,
            value_column,
        )
    }

    /// Reads one value column of CSV data keyed by a timestamp column.
    ///
    /// Rows must be strictly increasing in time.
    ///
    /// # Errors
    ///
    /// Returns `Error::Profile` for missing columns, unparsable cells,
    /// out-of-order rows or an empty table, and `Error::Csv` for malformed CSV.
    pub fn from_csv_reader(
        name: impl Into<String>,
        reader: impl Read,
        timestamp_column: &str,
        value_column: &str,
    ) -> Result<Self> {
        let name = name.into();
        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = rdr.headers()?.clone();
        let column = |wanted: &str| {
            headers
                .iter()
                .position(|h| h == wanted)
                .ok_or_else(|| Error::profile(&name, format!("missing column \"{wanted}\"")))
        };
        let ts_idx = column(timestamp_column)?;
        let val_idx = column(value_column)?;

        let mut timestamps = Vec::new();
        let mut values = Vec::new();
        for (row, record) in rdr.records().enumerate() {
            let record = record?;
            let raw_ts = record.get(ts_idx).unwrap_or_default();
            let ts = parse_timestamp(raw_ts).ok_or_else(|| {
                Error::profile(&name, format!("row {}: bad timestamp \"{raw_ts}\"", row + 1))
            })?;
            let raw_val = record.get(val_idx).unwrap_or_default();
            let value: f64 = raw_val.parse().map_err(|_| {
                Error::profile(&name, format!("row {}: bad number \"{raw_val}\"", row + 1))
            })?;
            if timestamps.last().is_some_and(|prev| *prev >= ts) {
                return Err(Error::profile(
                    &name,
                    format!("row {}: timestamps must be strictly increasing", row + 1),
                ));
            }
            timestamps.push(ts);
            values.push(value);
        }

        if values.is_empty() {
            return Err(Error::profile(name, "series has no samples"));
        }
        Ok(Self {
            name,
            timestamps,
            values,
        })
    }

    /// Places the series on a regular grid starting at its first timestamp.
    ///
    /// Grid points between two source samples are linearly interpolated in
    /// time. The grid stops at the last source timestamp.
    ///
    /// # Errors
    ///
    /// Returns `Error::Profile` if `interval_minutes` is zero.
    pub fn resample(&self, interval_minutes: u32) -> Result<Self> {
        if interval_minutes == 0 {
            return Err(Error::profile(&self.name, "interval must be > 0 minutes"));
        }
        let step = TimeDelta::minutes(i64::from(interval_minutes));
        let first = self.timestamps[0];
        let last = self.timestamps[self.timestamps.len() - 1];

        let mut timestamps = Vec::new();
        let mut values = Vec::new();
        let mut seg = 0;
        let mut t = first;
        while t <= last {
            while seg + 1 < self.timestamps.len() && self.timestamps[seg + 1] < t {
                seg += 1;
            }
            values.push(self.interpolate(seg, t));
            timestamps.push(t);
            t += step;
        }

        Ok(Self {
            name: self.name.clone(),
            timestamps,
            values,
        })
    }

    fn interpolate(&self, seg: usize, t: NaiveDateTime) -> f64 {
        let t0 = self.timestamps[seg];
        if t <= t0 || seg + 1 >= self.timestamps.len() {
            return self.values[seg];
        }
        let t1 = self.timestamps[seg + 1];
        let span = (t1 - t0).num_seconds() as f64;
        let frac = (t - t0).num_seconds() as f64 / span;
        self.values[seg] + frac * (self.values[seg + 1] - self.values[seg])
    }

    /// Removes the trailing sample; a single-sample series is left unchanged.
    pub fn drop_last(mut self) -> Self {
        if self.values.len() > 1 {
            self.values.pop();
            self.timestamps.pop();
        }
        self
    }

    /// Keeps samples whose calendar date falls in `[start, end]`.
    ///
    /// # Errors
    ///
    /// Returns `Error::Profile` for an inverted window or one that selects nothing.
    pub fn slice_dates(&self, start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(Error::profile(
                &self.name,
                format!("window start {start} is after end {end}"),
            ));
        }
        let (timestamps, values): (Vec<_>, Vec<_>) = self
            .timestamps
            .iter()
            .zip(&self.values)
            .filter(|(ts, _)| (start..=end).contains(&ts.date()))
            .map(|(ts, v)| (*ts, *v))
            .unzip();
        if values.is_empty() {
            return Err(Error::profile(
                &self.name,
                format!("window {start}..={end} selects no samples"),
            ));
        }
        Ok(Self {
            name: self.name.clone(),
            timestamps,
            values,
        })
    }

    /// Divides every value by the largest absolute value.
    pub fn normalized(&self) -> Self {
        let peak = self.values.iter().fold(0.0_f64, |m, v| m.max(v.abs()));
        let mut out = self.clone();
        if peak > 0.0 {
            out.values.iter_mut().for_each(|v| *v /= peak);
        }
        out
    }

    /// Value at `index`, wrapping around past the end.
    pub fn value_at(&self, index: usize) -> f64 {
        self.values[index % self.values.len()]
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn timestamps(&self) -> &[NaiveDateTime] {
        &self.timestamps
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Parses a timestamp in any of the accepted layouts.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(s: &str) -> NaiveDateTime {
        parse_timestamp(s).unwrap()
    }

    fn hourly_csv() -> &'static str {
        "LocalTime,Power(MW)\n\
         2006-06-01 00:00,0.0\n\
         2006-06-01 01:00,4.0\n\
         2006-06-01 02:00,8.0\n\
         2006-06-02 00:00,2.0\n"
    }

    #[test]
    fn parses_known_timestamp_layouts() {
        assert_eq!(ts("2006-06-01 05:30"), ts("2006-06-01T05:30:00"));
        assert_eq!(ts("06/01/06 05:30"), ts("2006-06-01 05:30"));
        assert_eq!(ts("06/01/2006 05:30"), ts("2006-06-01 05:30"));
        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn reads_selected_columns() {
        let s = TimeSeries::from_csv_reader("pv", hourly_csv().as_bytes(), "LocalTime", "Power(MW)")
            .unwrap();
        assert_eq!(s.len(), 4);
        assert_eq!(s.values(), &[0.0, 4.0, 8.0, 2.0]);
    }

    #[test]
    fn missing_column_is_an_error() {
        let err = TimeSeries::from_csv_reader("pv", hourly_csv().as_bytes(), "LocalTime", "kW")
            .unwrap_err();
        assert!(err.to_string().contains("missing column"));
    }

    #[test]
    fn bad_number_reports_row() {
        let data = "LocalTime,v\n2006-06-01 00:00,1.0\n2006-06-01 01:00,abc\n";
        let err = TimeSeries::from_csv_reader("x", data.as_bytes(), "LocalTime", "v").unwrap_err();
        assert!(err.to_string().contains("row 2"));
    }

    #[test]
    fn out_of_order_rows_rejected() {
        let data = "LocalTime,v\n2006-06-01 01:00,1.0\n2006-06-01 00:00,2.0\n";
        assert!(TimeSeries::from_csv_reader("x", data.as_bytes(), "LocalTime", "v").is_err());
    }

    #[test]
    fn empty_table_rejected() {
        let data = "LocalTime,v\n";
        assert!(TimeSeries::from_csv_reader("x", data.as_bytes(), "LocalTime", "v").is_err());
    }

    #[test]
    fn resample_interpolates_linearly() {
        let s = TimeSeries::from_csv_reader("pv", hourly_csv().as_bytes(), "LocalTime", "Power(MW)")
            .unwrap();
        let r = s.resample(15).unwrap();
        // 00:00 through 2006-06-02 00:00 at 15 minutes
        assert_eq!(r.len(), 24 * 4 + 1);
        assert_eq!(r.values()[0], 0.0);
        assert!((r.values()[1] - 1.0).abs() < 1e-12);
        assert!((r.values()[2] - 2.0).abs() < 1e-12);
        assert!((r.values()[4] - 4.0).abs() < 1e-12);
        assert_eq!(*r.values().last().unwrap(), 2.0);
        // between 02:00 (8.0) and next day 00:00 (2.0): 22 h span
        assert!((r.values()[8 + 44] - 5.0).abs() < 1e-9);
    }

    #[test]
    fn drop_last_and_slice_window() {
        let s = TimeSeries::from_csv_reader("pv", hourly_csv().as_bytes(), "LocalTime", "Power(MW)")
            .unwrap()
            .resample(60)
            .unwrap()
            .drop_last();
        assert_eq!(s.len(), 24);
        let day = NaiveDate::from_ymd_opt(2006, 6, 1).unwrap();
        let sliced = s.slice_dates(day, day).unwrap();
        assert_eq!(sliced.len(), 24);
        let next = NaiveDate::from_ymd_opt(2006, 6, 2).unwrap();
        assert!(s.slice_dates(next, next).is_err());
        assert!(s.slice_dates(next, day).is_err());
    }

    #[test]
    fn normalized_uses_absolute_peak() {
        let start = ts("2006-06-01 00:00");
        let s = TimeSeries::from_values("x", start, 15, vec![1.0, -4.0, 2.0]).unwrap();
        assert_eq!(s.normalized().values(), &[0.25, -1.0, 0.5]);
        let zeros = TimeSeries::from_values("z", start, 15, vec![0.0, 0.0]).unwrap();
        assert_eq!(zeros.normalized().values(), &[0.0, 0.0]);
    }

    #[test]
    fn value_at_wraps() {
        let start = ts("2006-06-01 00:00");
        let s = TimeSeries::from_values("x", start, 60, vec![1.0, 2.0, 3.0]).unwrap();
        assert_eq!(s.value_at(4), 2.0);
        assert_eq!(s.timestamps()[2], ts("2006-06-01 02:00"));
    }

    #[test]
    fn reads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("load.csv");
        std::fs::write(&path, hourly_csv()).unwrap();
        let s = TimeSeries::from_csv_path(&path, "LocalTime", "Power(MW)").unwrap();
        assert_eq!(s.len(), 4);
        let missing = dir.path().join("nope.csv");
        assert!(matches!(
            TimeSeries::from_csv_path(&missing, "LocalTime", "v"),
            Err(Error::ReadFile { .. })
        ));
    }
}
