//! Reading and parsing the CSV source.
//!
//! This side of the run is synchronous; the loader drives it from a
//! blocking task.

use std::io::Read;

use gscores_core::{
  parse::{RawRow, parse_row},
  record::NewStudentRecord,
};

use crate::{error::LoadError, report::RowRejection};

/// Log a progress line every this many rows.
const PROGRESS_EVERY: u64 = 1000;

/// A parsed record and the source line it came from.
#[derive(Debug, Clone)]
pub struct SourceRecord {
  pub line:   u64,
  pub record: NewStudentRecord,
}

/// Everything read from one source.
#[derive(Debug, Default)]
pub struct ReadOutcome {
  pub rows_read: u64,
  pub records:   Vec<SourceRecord>,
  pub rejected:  Vec<RowRejection>,
}

/// Read every data row of `reader`, parsing as it goes.
///
/// The header row drives column mapping and must name `sbd`. Malformed rows
/// (bad UTF-8, wrong field count, no registration number) are rejected and
/// reading continues; I/O errors end the read.
pub fn read_source<R: Read>(reader: R) -> Result<ReadOutcome, LoadError> {
  let mut rdr = csv::ReaderBuilder::new().from_reader(reader);
  let headers = rdr.headers()?.clone();
  if !headers.iter().any(|h| h == "sbd") {
    return Err(LoadError::MissingColumn("sbd"));
  }

  let mut out = ReadOutcome::default();
  let mut row = csv::StringRecord::new();

  loop {
    let line = match rdr.read_record(&mut row) {
      Ok(false) => break,
      Ok(true) => row.position().map_or(0, |p| p.line()),
      Err(e) if e.is_io_error() => return Err(e.into()),
      Err(e) => {
        out.rows_read += 1;
        let line = e.position().map_or(0, |p| p.line());
        tracing::warn!(line, "row rejected: {e}");
        out.rejected.push(RowRejection { line, reason: e.to_string() });
        continue;
      }
    };
    out.rows_read += 1;

    let parsed = row
      .deserialize::<RawRow>(Some(&headers))
      .map_err(|e| e.to_string())
      .and_then(|raw| parse_row(raw).map_err(|e| e.to_string()));

    match parsed {
      Ok(record) => out.records.push(SourceRecord { line, record }),
      Err(reason) => {
        tracing::warn!(line, "row rejected: {reason}");
        out.rejected.push(RowRejection { line, reason });
      }
    }

    if out.rows_read % PROGRESS_EVERY == 0 {
      tracing::info!(rows = out.rows_read, "read progress");
    }
  }

  tracing::info!(
    rows = out.rows_read,
    parsed = out.records.len(),
    rejected = out.rejected.len(),
    "csv parsing completed"
  );
  Ok(out)
}

#[cfg(test)]
mod tests {
  use rust_decimal::Decimal;

  use super::*;

  const HEADER: &str =
    "sbd,toan,ngu_van,ngoai_ngu,vat_li,hoa_hoc,sinh_hoc,lich_su,dia_li,gdcd,ma_ngoai_ngu\n";

  fn read(body: &str) -> ReadOutcome {
    read_source(format!("{HEADER}{body}").as_bytes()).unwrap()
  }

  #[test]
  fn parses_rows_and_keeps_line_numbers() {
    let out = read(
      "01000001,8.4,6.75,8.0,6.0,5.25,5.0,,,,N1\n\
       01000002,,7,,7.0,6.0,,,,,\n",
    );
    assert_eq!(out.rows_read, 2);
    assert!(out.rejected.is_empty());

    let first = &out.records[0];
    assert_eq!(first.line, 2);
    assert_eq!(first.record.scores.mathematics, Some(Decimal::new(84, 1)));
    assert_eq!(first.record.scores.history, None);
    assert_eq!(first.record.foreign_language_variant.as_deref(), Some("N1"));

    let second = &out.records[1];
    assert_eq!(second.line, 3);
    assert_eq!(second.record.scores.mathematics, None);
    assert_eq!(second.record.foreign_language_variant, None);
  }

  #[test]
  fn rows_without_sbd_are_rejected_not_fatal() {
    let out = read(",9,9,9,9,9,9,9,9,9,\n01000003,1,,,,,,,,,\n");
    assert_eq!(out.rows_read, 2);
    assert_eq!(out.records.len(), 1);
    assert_eq!(out.rejected.len(), 1);
    assert_eq!(out.rejected[0].line, 2);
  }

  #[test]
  fn short_rows_are_rejected() {
    let out = read("01000004,1,2\n01000005,,,,,,,,,,\n");
    assert_eq!(out.rows_read, 2);
    assert_eq!(out.records.len(), 1);
    assert_eq!(out.records[0].record.registration_number.as_str(), "01000005");
    assert_eq!(out.rejected.len(), 1);
  }

  #[test]
  fn column_order_follows_header() {
    let out = read_source("toan,sbd\n9.5,01000006\n".as_bytes()).unwrap();
    let rec = &out.records[0].record;
    assert_eq!(rec.registration_number.as_str(), "01000006");
    assert_eq!(rec.scores.mathematics, Some(Decimal::new(95, 1)));
    assert_eq!(rec.scores.physics, None);
  }

  #[test]
  fn header_without_sbd_is_fatal() {
    let err = read_source("toan,vat_li\n1,2\n".as_bytes()).unwrap_err();
    assert!(matches!(err, LoadError::MissingColumn("sbd")));
  }

  #[test]
  fn quoted_fields_are_supported() {
    let out = read("\"01000007\",\"8.25\",,,,,,,,,\"N1\"\n");
    assert_eq!(out.records[0].record.scores.mathematics, Some(Decimal::new(825, 2)));
  }
}
