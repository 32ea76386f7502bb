//! Light-curve CSV and catalog JSON ingest.
//!
//! The light-curve reader turns a `time,flux[,flux_err]` CSV into
//! [`RawLightCurve`] columns; cleaning happens later in `data::prepare`.
//!
//! - required columns are checked up front (clear errors, exit code 2)
//! - bad rows are skipped and reported with their line numbers
//! - no rows left is a data error (exit code 3)

use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::StringRecord;

use crate::data::RawLightCurve;
use crate::domain::CatalogValue;
use crate::error::NumaxError;

/// A row-level error encountered during ingest.
#[derive(Debug, Clone, PartialEq)]
pub struct RowError {
    pub line: usize,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct IngestedLightCurve {
    pub raw: RawLightCurve,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
}

/// Load a light-curve CSV from disk.
pub fn load_light_curve(path: &Path) -> Result<IngestedLightCurve, NumaxError> {
    let file = File::open(path)
        .map_err(|e| NumaxError::io(format!("failed to open light curve '{}'", path.display()), e))?;
    read_light_curve(file)
}

/// Parse light-curve CSV from any reader.
pub fn read_light_curve<R: Read>(reader: R) -> Result<IngestedLightCurve, NumaxError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .comment(Some(b'#'))
        .from_reader(reader);

    let headers = reader
        .headers()
        .map_err(|e| NumaxError::Csv(format!("failed to read CSV headers: {e}")))?
        .clone();
    let header_map = build_header_map(&headers);
    let column = |name: &str| {
        header_map
            .get(name)
            .copied()
            .ok_or_else(|| NumaxError::Csv(format!("missing required column: `{name}`")))
    };
    let time_col = column("time")?;
    let flux_col = column("flux")?;
    let err_col = header_map.get("flux_err").copied();

    let mut raw = RawLightCurve {
        flux_err: err_col.map(|_| Vec::new()),
        ..RawLightCurve::default()
    };
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;

    for (idx, result) in reader.records().enumerate() {
        // Line 1 is the header.
        let line = idx + 2;
        rows_read += 1;

        let record = match result {
            Ok(r) => r,
            Err(e) => {
                row_errors.push(RowError {
                    line,
                    message: format!("CSV parse error: {e}"),
                });
                continue;
            }
        };

        let parsed = parse_field(&record, time_col, "time").and_then(|t| {
            let f = parse_field(&record, flux_col, "flux")?;
            // A blank or unparseable error is a missing error, not a bad row.
            let e = err_col.map(|c| parse_field(&record, c, "flux_err").unwrap_or(f64::NAN));
            Ok((t, f, e))
        });
        match parsed {
            Ok((t, f, e)) => {
                raw.time.push(t);
                raw.flux.push(f);
                if let (Some(errs), Some(e)) = (raw.flux_err.as_mut(), e) {
                    errs.push(e);
                }
            }
            Err(message) => row_errors.push(RowError { line, message }),
        }
    }

    for err in row_errors.iter().take(5) {
        log::warn!("skipped line {}: {}", err.line, err.message);
    }
    if row_errors.len() > 5 {
        log::warn!("... and {} more skipped lines", row_errors.len() - 5);
    }
    if raw.time.is_empty() {
        return Err(NumaxError::invalid_input("no valid rows in light-curve CSV"));
    }
    log::info!("read {} of {rows_read} light-curve rows", raw.time.len());

    Ok(IngestedLightCurve {
        raw,
        row_errors,
        rows_read,
    })
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (name.trim().trim_start_matches('\u{feff}').to_ascii_lowercase(), idx))
        .collect()
}

fn parse_field(record: &StringRecord, col: usize, name: &str) -> Result<f64, String> {
    let text = record.get(col).unwrap_or("").trim();
    if text.is_empty() {
        return Err(format!("empty `{name}`"));
    }
    text.parse::<f64>()
        .map_err(|_| format!("invalid `{name}` value '{text}'"))
}

/// Read a catalog record: a JSON object mapping column names to
/// `{ "value", "lower", "upper", "uncertainty" }`.
pub fn load_catalog_json(path: &Path) -> Result<BTreeMap<String, CatalogValue>, NumaxError> {
    let file = File::open(path)
        .map_err(|e| NumaxError::io(format!("failed to open catalog '{}'", path.display()), e))?;
    serde_json::from_reader(file).map_err(|e| NumaxError::Json(format!("invalid catalog JSON: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_columns_and_reports_bad_lines() {
        let csv = "\u{feff}Time,Flux,flux_err\n0.0,1.0,0.001\n0.1,oops,0.001\n0.2,1.1,\n# note\n0.3,0.9,0.002\n";
        let ingested = read_light_curve(csv.as_bytes()).unwrap();
        assert_eq!(ingested.raw.time, vec![0.0, 0.2, 0.3]);
        assert_eq!(ingested.raw.flux, vec![1.0, 1.1, 0.9]);
        let errs = ingested.raw.flux_err.unwrap();
        assert_eq!(errs[0], 0.001);
        assert!(errs[1].is_nan());
        assert_eq!(ingested.row_errors.len(), 1);
        assert_eq!(ingested.row_errors[0].line, 3);
        assert!(ingested.row_errors[0].message.contains("flux"));
    }

    #[test]
    fn error_column_is_optional() {
        let ingested = read_light_curve("time,flux\n0,1\n1,2\n".as_bytes()).unwrap();
        assert!(ingested.raw.flux_err.is_none());
        assert_eq!(ingested.rows_read, 2);
    }

    #[test]
    fn missing_column_is_a_schema_error() {
        let err = read_light_curve("time,mag\n0,1\n".as_bytes()).unwrap_err();
        assert!(matches!(err, NumaxError::Csv(_)));
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn no_valid_rows_is_a_data_error() {
        let err = read_light_curve("time,flux\nx,y\n".as_bytes()).unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }
}
