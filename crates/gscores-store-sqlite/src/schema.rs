//! SQL schema for the G-Scores SQLite store.
//!
//! Executed once at connection startup. `PRAGMA user_version` records the
//! schema revision for future migrations.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
///
/// Scores are stored as integer hundredths (DECIMAL(4,2)), so `8.4` is
/// `840`. NULL means the candidate did not sit the subject.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

CREATE TABLE IF NOT EXISTS students (
    sbd          TEXT    PRIMARY KEY NOT NULL CHECK (length(sbd) BETWEEN 1 AND 20),
    toan         INTEGER CHECK (toan      BETWEEN 0 AND 9999),
    ngu_van      INTEGER CHECK (ngu_van   BETWEEN 0 AND 9999),
    ngoai_ngu    INTEGER CHECK (ngoai_ngu BETWEEN 0 AND 9999),
    vat_li       INTEGER CHECK (vat_li    BETWEEN 0 AND 9999),
    hoa_hoc      INTEGER CHECK (hoa_hoc   BETWEEN 0 AND 9999),
    sinh_hoc     INTEGER CHECK (sinh_hoc  BETWEEN 0 AND 9999),
    lich_su      INTEGER CHECK (lich_su   BETWEEN 0 AND 9999),
    dia_li       INTEGER CHECK (dia_li    BETWEEN 0 AND 9999),
    gdcd         INTEGER CHECK (gdcd      BETWEEN 0 AND 9999),
    ma_ngoai_ngu TEXT    CHECK (length(ma_ngoai_ngu) <= 10),
    created_at   TEXT    NOT NULL   -- ISO 8601 UTC; set on first insert only
);

PRAGMA user_version = 1;
";

/// Columns in the order read by [`crate::encode::RawStudent::from_row`].
pub const STUDENT_COLUMNS: &str = "sbd, toan, ngu_van, ngoai_ngu, vat_li, hoa_hoc, \
   sinh_hoc, lich_su, dia_li, gdcd, ma_ngoai_ngu, created_at";
