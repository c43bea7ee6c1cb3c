//! Immutable report configuration shared by the classifier, layout and composer.

use crate::analyzers::tier::{TierBands, TierStyles};

/// Required named columns of the score sheet.
pub const COL_PROGRAM: &str = "PROGRAMA";
pub const COL_INSTRUCTOR_ID: &str = "ID DOCENTE";
pub const COL_EMAIL: &str = "CORREO";
pub const COL_PHASE1: &str = "CALIFICACION";
pub const COL_PHASE2: &str = "CALIFICACION 2";
pub const COL_FINAL: &str = "CALIFICACION FINAL";
pub const COL_NRC: &str = "NRC";
pub const COL_REVIEW: &str = "OBSERVACION";

/// Optional subject column.
pub const COL_SUBJECT: &str = "ASIGNATURA";

pub const REQUIRED_COLUMNS: [&str; 8] = [
    COL_PROGRAM,
    COL_INSTRUCTOR_ID,
    COL_EMAIL,
    COL_PHASE1,
    COL_PHASE2,
    COL_FINAL,
    COL_NRC,
    COL_REVIEW,
];

/// Where the instructor display name is read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameColumn {
    /// Zero-based column position. The institutional sheet keeps names in column E.
    Position(usize),
    Header(String),
}

impl Default for NameColumn {
    fn default() -> Self {
        NameColumn::Position(4)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnLayout {
    pub name_column: NameColumn,
}

#[derive(Debug, Clone, Default)]
pub struct ReportConfig {
    pub bands: TierBands,
    pub styles: TierStyles,
    pub columns: ColumnLayout,
}

impl ReportConfig {
    pub fn with_name_column(mut self, name_column: NameColumn) -> Self {
        self.columns.name_column = name_column;
        self
    }

    pub fn with_bands(mut self, bands: TierBands) -> Self {
        self.bands = bands;
        self
    }
}
