//! CSV files as positioned raw records.

use std::io;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord};
use tracing::debug;

use crate::decode::RawRecord;

/// Read every record of a headed CSV file.
///
/// Short rows are accepted (missing columns surface later as decode faults).
/// Each record carries the line it starts on.
pub fn read_records(path: impl AsRef<Path>) -> csv::Result<Vec<RawRecord>> {
    let path = path.as_ref();
    let reader = ReaderBuilder::new().flexible(true).from_path(path)?;
    let records = collect(reader)?;
    debug!("Read {} records from {}", records.len(), path.display());
    Ok(records)
}

/// Same as [`read_records`] over any reader.
pub fn parse_records<R: io::Read>(input: R) -> csv::Result<Vec<RawRecord>> {
    collect(ReaderBuilder::new().flexible(true).from_reader(input))
}

fn collect<R: io::Read>(mut reader: csv::Reader<R>) -> csv::Result<Vec<RawRecord>> {
    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut records = Vec::new();
    for result in reader.records() {
        let record: StringRecord = result?;
        let position = record.position().map(|p| p.line()).unwrap_or(0);
        let fields = headers
            .iter()
            .cloned()
            .zip(record.iter().map(str::to_string))
            .collect();
        records.push(RawRecord::new(position, fields));
    }
    Ok(records)
}
