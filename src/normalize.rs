//! Turns a raw score sheet into the canonical, deduplicated classroom list.

use std::cmp::Ordering;
use std::collections::HashSet;

use tracing::debug;

use crate::config::{
    COL_EMAIL, COL_FINAL, COL_INSTRUCTOR_ID, COL_NRC, COL_PHASE1, COL_PHASE2, COL_PROGRAM,
    COL_REVIEW, COL_SUBJECT, ColumnLayout, NameColumn, REQUIRED_COLUMNS,
};
use crate::error::SchemaError;
use crate::records::{Cell, ClassroomRecord, RawTable};

/// Column positions resolved once against the header row.
struct ColumnMap {
    program: usize,
    instructor_id: usize,
    email: usize,
    phase1: usize,
    phase2: usize,
    final_score: usize,
    nrc: usize,
    review: usize,
    name: usize,
    subject: Option<usize>,
}

impl ColumnMap {
    fn resolve(table: &RawTable, layout: &ColumnLayout) -> Result<Self, SchemaError> {
        for column in REQUIRED_COLUMNS {
            if table.column_index(column).is_none() {
                return Err(SchemaError::MissingColumn(column.to_string()));
            }
        }

        let name = match &layout.name_column {
            NameColumn::Position(position) => {
                let required = position + 1;
                if table.headers.len() < required {
                    return Err(SchemaError::TooFewColumns {
                        found: table.headers.len(),
                        required,
                    });
                }
                *position
            }
            NameColumn::Header(header) => table
                .column_index(header)
                .ok_or_else(|| SchemaError::UnknownNameColumn(header.clone()))?,
        };

        let required = |column: &str| {
            table
                .column_index(column)
                .ok_or_else(|| SchemaError::MissingColumn(column.to_string()))
        };

        Ok(Self {
            program: required(COL_PROGRAM)?,
            instructor_id: required(COL_INSTRUCTOR_ID)?,
            email: required(COL_EMAIL)?,
            phase1: required(COL_PHASE1)?,
            phase2: required(COL_PHASE2)?,
            final_score: required(COL_FINAL)?,
            nrc: required(COL_NRC)?,
            review: required(COL_REVIEW)?,
            name,
            subject: table.column_index(COL_SUBJECT),
        })
    }
}

/// Validates the sheet layout, builds one record per row and drops duplicate
/// `(instructor, nrc)` entries keeping the highest final score.
///
/// # Errors
///
/// Returns a [`SchemaError`] if a required column is missing or the configured
/// name column does not exist. No records are produced in that case.
pub fn normalize(table: &RawTable, layout: &ColumnLayout) -> Result<Vec<ClassroomRecord>, SchemaError> {
    let columns = ColumnMap::resolve(table, layout)?;

    let records: Vec<ClassroomRecord> = (0..table.rows.len())
        .map(|row| ClassroomRecord {
            instructor_id: canonical_identifier(table.cell(row, columns.instructor_id)),
            instructor_name: table.cell(row, columns.name).as_text(),
            email: table.cell(row, columns.email).as_text(),
            program: table.cell(row, columns.program).as_text(),
            nrc: canonical_identifier(table.cell(row, columns.nrc)),
            subject: columns
                .subject
                .map(|c| table.cell(row, c).as_text())
                .unwrap_or_default(),
            phase1_score: table.cell(row, columns.phase1).as_score(),
            phase2_score: table.cell(row, columns.phase2).as_score(),
            final_score: table.cell(row, columns.final_score).as_score(),
            review_flag: table.cell(row, columns.review).as_text(),
        })
        .collect();

    Ok(deduplicate(records))
}

/// Keeps the best-scored record per `(instructor_id, nrc)`.
///
/// Output is ordered by final score, highest first. Among equal scores the
/// original row order is preserved, so the first-seen row wins a tie.
pub fn deduplicate(mut records: Vec<ClassroomRecord>) -> Vec<ClassroomRecord> {
    let before = records.len();
    records.sort_by(|a, b| {
        b.final_score
            .partial_cmp(&a.final_score)
            .unwrap_or(Ordering::Equal)
    });

    let mut seen: HashSet<(String, String)> = HashSet::new();
    records.retain(|r| seen.insert((r.instructor_id.clone(), r.nrc.clone())));

    let removed = before - records.len();
    if removed > 0 {
        debug!(removed, kept = records.len(), "Dropped duplicate classroom rows");
    }
    records
}

/// Renders numeric-looking identifiers as integers (`"2031.0"` → `"2031"`).
///
/// Anything that is not digits with at most one decimal point passes through trimmed.
pub fn canonical_identifier(cell: &Cell) -> String {
    match cell {
        Cell::Number(n) if n.is_finite() => format!("{}", n.trunc() as i64),
        other => canonical_identifier_text(&other.as_text()),
    }
}

fn canonical_identifier_text(text: &str) -> String {
    let (int_part, frac_part) = match text.split_once('.') {
        Some((int_part, frac_part)) => (int_part, frac_part),
        None => (text, ""),
    };
    let digits_only = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    let has_digit = !int_part.is_empty() || !frac_part.is_empty();

    if !has_digit || !digits_only(int_part) || !digits_only(frac_part) {
        return text.to_string();
    }

    let trimmed = int_part.trim_start_matches('0');
    if trimmed.is_empty() {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADERS: [&str; 10] = [
        "PROGRAMA",
        "ID DOCENTE",
        "CORREO",
        "NRC",
        "DOCENTE",
        "ASIGNATURA",
        "CALIFICACION",
        "CALIFICACION 2",
        "CALIFICACION FINAL",
        "OBSERVACION",
    ];

    fn row(program: &str, id: Cell, nrc: Cell, name: &str, final_score: Cell) -> Vec<Cell> {
        vec![
            Cell::from(program),
            id,
            Cell::from("docente@uni.edu"),
            nrc,
            Cell::from(name),
            Cell::from("Cálculo"),
            Cell::from(40.0),
            Cell::from(45.0),
            final_score,
            Cell::from("No seleccionada"),
        ]
    }

    fn table(rows: Vec<Vec<Cell>>) -> RawTable {
        RawTable::new(HEADERS.iter().map(|h| h.to_string()).collect(), rows)
    }

    #[test]
    fn test_missing_nrc_column_is_schema_error() {
        let headers: Vec<String> = HEADERS
            .iter()
            .filter(|h| **h != "NRC")
            .map(|h| h.to_string())
            .collect();
        let t = RawTable::new(headers, vec![]);
        let err = normalize(&t, &ColumnLayout::default()).unwrap_err();
        assert_eq!(err, SchemaError::MissingColumn("NRC".to_string()));
    }

    #[test]
    fn test_name_position_out_of_range() {
        let layout = ColumnLayout {
            name_column: NameColumn::Position(12),
        };
        let err = normalize(&table(vec![]), &layout).unwrap_err();
        assert_eq!(
            err,
            SchemaError::TooFewColumns {
                found: 10,
                required: 13
            }
        );
    }

    #[test]
    fn test_unknown_name_header() {
        let layout = ColumnLayout {
            name_column: NameColumn::Header("NOMBRE".into()),
        };
        let err = normalize(&table(vec![]), &layout).unwrap_err();
        assert_eq!(err, SchemaError::UnknownNameColumn("NOMBRE".into()));
    }

    #[test]
    fn test_name_by_header_matches_default_position() {
        let rows = vec![row("A", Cell::from("7"), Cell::from("100"), " Ana ", Cell::from(90.0))];
        let by_position = normalize(&table(rows.clone()), &ColumnLayout::default()).unwrap();
        let by_header = normalize(
            &table(rows),
            &ColumnLayout {
                name_column: NameColumn::Header("DOCENTE".into()),
            },
        )
        .unwrap();
        assert_eq!(by_position, by_header);
        assert_eq!(by_position[0].instructor_name, "Ana");
    }

    #[test]
    fn test_dedup_keeps_highest_final() {
        let rows = vec![
            row("A", Cell::from("7"), Cell::from("100"), "Ana", Cell::from(80.0)),
            row("A", Cell::from("7"), Cell::from("100"), "Ana", Cell::from(95.0)),
        ];
        let records = normalize(&table(rows), &ColumnLayout::default()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].final_score, 95.0);
    }

    #[test]
    fn test_dedup_tie_keeps_first_seen() {
        let rows = vec![
            row("A", Cell::from("7"), Cell::from("100"), "first", Cell::from(88.0)),
            row("A", Cell::from("7"), Cell::from("100"), "second", Cell::from(88.0)),
        ];
        let records = normalize(&table(rows), &ColumnLayout::default()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].instructor_name, "first");
    }

    #[test]
    fn test_float_ids_collapse_before_dedup() {
        let rows = vec![
            row("A", Cell::from(7.0), Cell::from("2031.0"), "Ana", Cell::from(70.0)),
            row("A", Cell::from("7"), Cell::from(2031.0), "Ana", Cell::from(75.0)),
        ];
        let records = normalize(&table(rows), &ColumnLayout::default()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].instructor_id, "7");
        assert_eq!(records[0].nrc, "2031");
        assert_eq!(records[0].final_score, 75.0);
    }

    #[test]
    fn test_bad_scores_become_zero() {
        let rows = vec![row("A", Cell::from("7"), Cell::from("1"), "Ana", Cell::from("pendiente"))];
        let records = normalize(&table(rows), &ColumnLayout::default()).unwrap();
        assert_eq!(records[0].final_score, 0.0);
        assert_eq!(records[0].phase1_score, 40.0);
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let rows = vec![
            row("A", Cell::from("7"), Cell::from("100"), "Ana", Cell::from(80.0)),
            row("A", Cell::from("7"), Cell::from("100"), "Ana", Cell::from(95.0)),
            row("B", Cell::from("8"), Cell::from("SEC-A"), "Luis", Cell::from(65.0)),
        ];
        let once = normalize(&table(rows), &ColumnLayout::default()).unwrap();

        let again_rows = once
            .iter()
            .map(|r| {
                let mut cells = row(
                    &r.program,
                    Cell::from(r.instructor_id.as_str()),
                    Cell::from(r.nrc.as_str()),
                    &r.instructor_name,
                    Cell::from(r.final_score),
                );
                cells[9] = Cell::from(r.review_flag.as_str());
                cells
            })
            .collect();
        let twice = normalize(&table(again_rows), &ColumnLayout::default()).unwrap();
        assert_eq!(once, twice);
        assert_eq!(deduplicate(once.clone()), once);
    }

    #[test]
    fn test_canonical_identifier() {
        assert_eq!(canonical_identifier(&Cell::from("2031.0")), "2031");
        assert_eq!(canonical_identifier(&Cell::from(" 2031 ")), "2031");
        assert_eq!(canonical_identifier(&Cell::from("SEC-A")), "SEC-A");
        assert_eq!(canonical_identifier(&Cell::from("1.2.3")), "1.2.3");
        assert_eq!(canonical_identifier(&Cell::from("007")), "7");
        assert_eq!(canonical_identifier(&Cell::from(".5")), "0");
        assert_eq!(canonical_identifier(&Cell::from(".")), ".");
        assert_eq!(canonical_identifier(&Cell::Empty), "");
        assert_eq!(canonical_identifier(&Cell::Number(123.0)), "123");
    }
}
